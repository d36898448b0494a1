//! Key identity, raw contact samples and logical state

mod contact;
mod state;

pub use contact::Contact;
pub use state::{Key, KeyState, NO_KEY, UNSET_CODE};
