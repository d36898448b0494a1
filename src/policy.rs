//! Debounce and hold policy for driving keys from raw samples
//!
//! [`Key`] only records what it is told. This module is the scanner-side
//! decision of what to tell it. Each key slot pairs its [`Key`] with a
//! [`ContactHistory`] remembering when the raw reading last flipped; the
//! policy combines the two with the latest sample to pick the next state.
//!
//! Transitions:
//!
//! | From | Contact | Condition | To |
//! |------|---------|-----------|----|
//! | Idle | Closed | contact stable >= debounce | Pressed |
//! | Pressed | Closed | time in Pressed >= hold | Hold |
//! | Pressed / Hold | Open | contact stable >= debounce | Released |
//! | Released | any | next cycle | Idle |
//!
//! Anything else keeps the current state with `changed = false`.

use crate::clock::{Clock, Millis};
use crate::config::TimingConfig;
use crate::keyboard::{Contact, Key, KeyState, NO_KEY};
use std::fmt;

/// Decision for one scan cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: KeyState,
    pub changed: bool,
}

impl Transition {
    fn to(state: KeyState) -> Self {
        Self {
            state,
            changed: true,
        }
    }

    fn stay(state: KeyState) -> Self {
        Self {
            state,
            changed: false,
        }
    }
}

/// Last raw reading of one key and when it started reading that way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactHistory {
    level: Contact,
    since: Millis,
}

impl ContactHistory {
    /// Start out open, as of now
    pub fn new(clock: &impl Clock) -> Self {
        Self {
            level: Contact::Open,
            since: clock.now_ms(),
        }
    }

    /// Record a sample taken at `now`. Only a flip restarts the stable timer.
    pub fn observe(&mut self, contact: Contact, now: Millis) {
        if contact != self.level {
            self.level = contact;
            self.since = now;
        }
    }

    pub fn level(&self) -> Contact {
        self.level
    }

    /// Time of the last flip
    pub fn since(&self) -> Millis {
        self.since
    }

    /// How long the reading has held its current level, rollover safe
    pub fn stable_for(&self, now: Millis) -> Millis {
        now.wrapping_sub(self.since)
    }
}

/// Debounce and hold thresholds applied to raw contact samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPolicy {
    debounce_ms: Millis,
    hold_ms: Millis,
}

impl TransitionPolicy {
    /// `hold_ms` must exceed `debounce_ms`, the same rule
    /// [`Config::validate`](crate::config::Config::validate) enforces.
    pub fn new(debounce_ms: Millis, hold_ms: Millis) -> Self {
        debug_assert!(
            hold_ms > debounce_ms,
            "hold_ms ({}) must be greater than debounce_ms ({})",
            hold_ms,
            debounce_ms
        );
        Self {
            debounce_ms,
            hold_ms,
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(timing.debounce_ms, timing.hold_ms)
    }

    pub fn debounce_ms(&self) -> Millis {
        self.debounce_ms
    }

    pub fn hold_ms(&self) -> Millis {
        self.hold_ms
    }

    /// Whether the raw reading has been steady long enough to trust
    pub fn debounced(&self, history: &ContactHistory, now: Millis) -> bool {
        history.stable_for(now) >= self.debounce_ms
    }

    /// Decide the next state for `key` from its contact `history` at `now`
    pub fn next(&self, key: &Key, history: &ContactHistory, now: Millis) -> Transition {
        let settled = self.debounced(history, now);

        match (key.state(), history.level()) {
            (KeyState::Idle, Contact::Closed) if settled => Transition::to(KeyState::Pressed),
            (KeyState::Pressed, Contact::Closed) if key.dwell(now) >= self.hold_ms => {
                Transition::to(KeyState::Hold)
            }
            (KeyState::Pressed | KeyState::Hold, Contact::Open) if settled => {
                Transition::to(KeyState::Released)
            }
            (KeyState::Released, _) => Transition::to(KeyState::Idle),
            (state, contact) => {
                let wants_change = match state {
                    KeyState::Idle => contact.is_closed(),
                    KeyState::Pressed | KeyState::Hold => !contact.is_closed(),
                    KeyState::Released => false,
                };
                if wants_change {
                    log::trace!(
                        "'{}' {:?} for {}ms, not yet stable (debounce {}ms)",
                        key.kchar().escape_default(),
                        contact,
                        history.stable_for(now),
                        self.debounce_ms
                    );
                }
                Transition::stay(state)
            }
        }
    }

    /// Sample-to-update step for one key slot and one scan cycle.
    ///
    /// `kchar` is the character bound to this slot. A key settling back to
    /// Idle is unbound to [`NO_KEY`].
    pub fn apply(
        &self,
        key: &mut Key,
        history: &mut ContactHistory,
        kchar: char,
        contact: Contact,
        clock: &impl Clock,
    ) -> Transition {
        let now = clock.now_ms();
        history.observe(contact, now);
        let transition = self.next(key, history, now);

        if transition.changed {
            log::debug!("{}", StateChange::new(key, kchar, transition.state, now));
        }

        let stored = if transition.changed && transition.state == KeyState::Idle {
            NO_KEY
        } else {
            kchar
        };
        key.update(stored, transition.state, transition.changed, clock);
        transition
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        Self::from_config(&TimingConfig::default())
    }
}

/// Log line for one transition, naming the slot's character even when the
/// key is about to be unbound
struct StateChange {
    kchar: char,
    code: i32,
    from: KeyState,
    to: KeyState,
    after_ms: Millis,
}

impl StateChange {
    fn new(key: &Key, kchar: char, to: KeyState, now: Millis) -> Self {
        Self {
            kchar,
            code: key.code(),
            from: key.state(),
            to,
            after_ms: key.dwell(now),
        }
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key '{}' (code {}): {} -> {} after {}ms",
            self.kchar.escape_default(),
            self.code,
            self.from,
            self.to,
            self.after_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn policy() -> TransitionPolicy {
        TransitionPolicy::new(10, 100)
    }

    /// One key slot as a scanner would hold it
    struct Slot {
        key: Key,
        history: ContactHistory,
    }

    impl Slot {
        fn new(clock: &ManualClock) -> Self {
            Self {
                key: Key::new(clock),
                history: ContactHistory::new(clock),
            }
        }
    }

    /// Feed `(time, contact)` samples and collect the resulting transitions
    fn feed(
        slot: &mut Slot,
        clock: &ManualClock,
        samples: &[(Millis, Contact)],
    ) -> Vec<Transition> {
        let policy = policy();
        samples
            .iter()
            .map(|&(t, contact)| {
                clock.set(t);
                policy.apply(&mut slot.key, &mut slot.history, '5', contact, clock)
            })
            .collect()
    }

    /// Samples every `step` ms over `[from, to]` with a fixed contact
    fn steady(
        from: Millis,
        to: Millis,
        step: Millis,
        contact: Contact,
    ) -> Vec<(Millis, Contact)> {
        (from..=to).step_by(step as usize).map(|t| (t, contact)).collect()
    }

    fn changes(out: &[Transition]) -> Vec<KeyState> {
        out.iter().filter(|t| t.changed).map(|t| t.state).collect()
    }

    #[test]
    fn default_policy_matches_default_config() {
        let p = TransitionPolicy::default();
        assert_eq!(p.debounce_ms(), 10);
        assert_eq!(p.hold_ms(), 500);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "must be greater than debounce_ms")]
    fn new_rejects_hold_not_above_debounce() {
        let _ = TransitionPolicy::new(50, 50);
    }

    #[test]
    fn history_restarts_only_on_flip() {
        let clock = ManualClock::new(0);
        let mut history = ContactHistory::new(&clock);

        history.observe(Contact::Open, 5);
        assert_eq!(history.since(), 0);

        history.observe(Contact::Closed, 8);
        history.observe(Contact::Closed, 12);
        assert_eq!(history.level(), Contact::Closed);
        assert_eq!(history.since(), 8);
        assert_eq!(history.stable_for(20), 12);
    }

    #[test]
    fn idle_open_stays_idle() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);
        let out = feed(&mut slot, &clock, &steady(0, 1000, 50, Contact::Open));
        assert!(changes(&out).is_empty());
        assert_eq!(slot.key.state(), KeyState::Idle);
    }

    #[test]
    fn press_needs_contact_stable_for_debounce_window() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);

        // Closed from t=1000; stable for 9ms at t=1009, 10ms at t=1010
        let out = feed(&mut slot, &clock, &steady(1000, 1009, 1, Contact::Closed));
        assert!(changes(&out).is_empty());

        let out = feed(&mut slot, &clock, &[(1010, Contact::Closed)]);
        assert_eq!(out, vec![Transition::to(KeyState::Pressed)]);
        assert_eq!(slot.key.start_time(), 1010);
    }

    #[test]
    fn single_sample_glitch_is_not_a_press() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);

        let mut samples = vec![(1000, Contact::Closed)];
        samples.extend(steady(1001, 1100, 1, Contact::Open));

        let out = feed(&mut slot, &clock, &samples);
        assert!(changes(&out).is_empty());
        assert_eq!(slot.key.state(), KeyState::Idle);
        assert_eq!(slot.key.start_time(), 0);
    }

    #[test]
    fn full_cycle_through_hold() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);

        let mut samples = steady(20, 200, 10, Contact::Closed);
        samples.extend(steady(210, 230, 10, Contact::Open));

        let out = feed(&mut slot, &clock, &samples);
        assert_eq!(
            changes(&out),
            vec![
                KeyState::Pressed,
                KeyState::Hold,
                KeyState::Released,
                KeyState::Idle
            ]
        );
        // Pressed at 30, Hold at 130, Released at 220, Idle at 230
        assert_eq!(slot.key.kchar(), NO_KEY);
        assert_eq!(slot.key.start_time(), 230);
    }

    #[test]
    fn short_tap_skips_hold() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);

        let mut samples = steady(20, 60, 10, Contact::Closed);
        samples.extend(steady(70, 90, 10, Contact::Open));

        let out = feed(&mut slot, &clock, &samples);
        assert_eq!(
            changes(&out),
            vec![KeyState::Pressed, KeyState::Released, KeyState::Idle]
        );
    }

    #[test]
    fn release_chatter_is_filtered() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);
        feed(&mut slot, &clock, &steady(0, 20, 10, Contact::Closed));
        assert_eq!(slot.key.state(), KeyState::Pressed);

        let out = feed(
            &mut slot,
            &clock,
            &[
                (41, Contact::Open),
                (42, Contact::Closed),
                (43, Contact::Open),
                (44, Contact::Closed),
            ],
        );
        assert!(changes(&out).is_empty());
        assert_eq!(slot.key.state(), KeyState::Pressed);
    }

    #[test]
    fn hold_promotion_measured_from_press() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);
        feed(&mut slot, &clock, &[(40, Contact::Closed), (50, Contact::Closed)]);
        assert_eq!(slot.key.start_time(), 50);

        assert_eq!(
            policy().next(&slot.key, &slot.history, 149),
            Transition::stay(KeyState::Pressed)
        );
        assert_eq!(
            policy().next(&slot.key, &slot.history, 150),
            Transition::to(KeyState::Hold)
        );
    }

    #[test]
    fn hold_stays_while_closed() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);
        slot.key.update('5', KeyState::Hold, true, &clock);
        slot.history.observe(Contact::Closed, 0);
        assert_eq!(
            policy().next(&slot.key, &slot.history, 10_000),
            Transition::stay(KeyState::Hold)
        );
    }

    #[test]
    fn released_returns_to_idle_regardless_of_contact() {
        let clock = ManualClock::new(0);
        let mut slot = Slot::new(&clock);
        slot.key.update('5', KeyState::Released, true, &clock);
        slot.history.observe(Contact::Closed, 0);
        assert_eq!(
            policy().next(&slot.key, &slot.history, 0),
            Transition::to(KeyState::Idle)
        );
    }

    #[test]
    fn apply_keeps_char_while_active() {
        let clock = ManualClock::new(100);
        let mut slot = Slot::new(&clock);
        clock.set(200);
        policy().apply(&mut slot.key, &mut slot.history, 'B', Contact::Closed, &clock);
        clock.set(210);
        let t = policy().apply(&mut slot.key, &mut slot.history, 'B', Contact::Closed, &clock);
        assert!(t.changed);
        assert_eq!(slot.key.kchar(), 'B');
        assert!(slot.key.state_changed());
    }

    #[test]
    fn state_change_names_released_key() {
        let clock = ManualClock::new(0);
        let mut key = Key::with_char('5', &clock);
        key.set_code(4);
        clock.set(120);
        key.update('5', KeyState::Released, true, &clock);

        let line = StateChange::new(&key, '5', KeyState::Idle, 125).to_string();
        assert_eq!(line, "key '5' (code 4): released -> idle after 5ms");
    }

    #[test]
    fn debounce_across_clock_rollover() {
        let clock = ManualClock::new(u32::MAX - 5);
        let mut history = ContactHistory::new(&clock);
        history.observe(Contact::Closed, u32::MAX - 5);
        assert!(!policy().debounced(&history, 2));
        assert!(policy().debounced(&history, 4));
    }
}
