//! Raw contact readings supplied by the matrix scanner

/// Electrical state of a key switch as sampled, before debouncing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contact {
    /// Switch open (pin reads low)
    Open,
    /// Switch closed (pin reads high)
    Closed,
}

impl Contact {
    pub fn is_closed(self) -> bool {
        self == Contact::Closed
    }

    /// Reading from an active-low input, where a pulled-up pin reads high
    /// while the switch is open.
    pub fn from_active_low(level: bool) -> Self {
        Self::from(!level)
    }
}

impl From<bool> for Contact {
    /// `true` (high) is closed, `false` (low) is open
    fn from(level: bool) -> Self {
        if level {
            Contact::Closed
        } else {
            Contact::Open
        }
    }
}
