//! Per-key logical state tracking

use crate::clock::{Clock, Millis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Character meaning "no key bound to this slot"
pub const NO_KEY: char = '\0';

/// Numeric identifier of a key whose position has not been assigned
pub const UNSET_CODE: i32 = -1;

/// Logical state of a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyState {
    /// No contact, settled
    #[default]
    Idle,
    /// Contact detected and debounced
    Pressed,
    /// Contact sustained past the hold threshold
    Hold,
    /// Contact broken and debounced
    Released,
}

impl KeyState {
    /// Whether the key is physically down in this state
    pub fn is_active(self) -> bool {
        matches!(self, KeyState::Pressed | KeyState::Hold)
    }

    pub fn name(self) -> &'static str {
        match self {
            KeyState::Idle => "idle",
            KeyState::Pressed => "pressed",
            KeyState::Hold => "hold",
            KeyState::Released => "released",
        }
    }
}

impl fmt::Display for KeyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One physical key's identity and current logical state.
///
/// A `Key` records what it is told and when. Deciding *which* state comes next
/// (debounce, hold promotion) belongs to the caller, see
/// [`TransitionPolicy`](crate::policy::TransitionPolicy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    kchar: char,
    kcode: i32,
    kstate: KeyState,
    state_changed: bool,
    start_time: Millis,
}

impl Key {
    /// Create an unassigned, idle key
    pub fn new(clock: &impl Clock) -> Self {
        Self {
            kchar: NO_KEY,
            kcode: UNSET_CODE,
            kstate: KeyState::Idle,
            state_changed: false,
            start_time: clock.now_ms(),
        }
    }

    /// Create an idle key already bound to `kchar`.
    ///
    /// `kchar` should not be [`NO_KEY`]; if it is, the result is simply an
    /// unassigned key.
    pub fn with_char(kchar: char, clock: &impl Clock) -> Self {
        Self {
            kchar,
            ..Self::new(clock)
        }
    }

    /// Record the outcome of one scan cycle.
    ///
    /// `kstate` and `changed` are stored verbatim. The state-entry time moves
    /// to "now" only when `changed` is true.
    pub fn update(&mut self, kchar: char, kstate: KeyState, changed: bool, clock: &impl Clock) {
        self.kchar = kchar;
        self.kstate = kstate;
        self.state_changed = changed;
        if changed {
            self.start_time = clock.now_ms();
        }
    }

    pub fn kchar(&self) -> char {
        self.kchar
    }

    pub fn code(&self) -> i32 {
        self.kcode
    }

    /// Rebind the positional identifier without touching state
    pub fn set_code(&mut self, kcode: i32) {
        self.kcode = kcode;
    }

    pub fn state(&self) -> KeyState {
        self.kstate
    }

    /// Whether the last update moved the key into a new state
    pub fn state_changed(&self) -> bool {
        self.state_changed
    }

    /// Time the current state was entered
    pub fn start_time(&self) -> Millis {
        self.start_time
    }

    pub fn is_assigned(&self) -> bool {
        self.kchar != NO_KEY
    }

    /// Milliseconds spent in the current state as of `now`.
    ///
    /// Uses wrapping subtraction so a counter rollover still yields the
    /// short elapsed time.
    pub fn dwell(&self, now: Millis) -> Millis {
        now.wrapping_sub(self.start_time)
    }
}
