//! Keypad State - debounced per-key state tracking for keypad firmware
//!
//! Each physical key is a [`Key`] cycling through Idle, Pressed, Hold and
//! Released. A matrix scanner samples raw contacts and feeds each key once per
//! scan cycle, either deciding transitions itself or via [`TransitionPolicy`].

pub mod clock;
pub mod config;
pub mod keyboard;
pub mod policy;

pub use clock::{Clock, ManualClock, Millis, MonotonicClock};
pub use config::{Config, ConfigError, TimingConfig};
pub use keyboard::{Contact, Key, KeyState, NO_KEY, UNSET_CODE};
pub use policy::{ContactHistory, Transition, TransitionPolicy};
