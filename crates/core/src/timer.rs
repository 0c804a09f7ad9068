//! Timer slots - cancelable one-shot deadlines on the session clock.
//!
//! A slot holds at most one armed deadline. Arming replaces (cancels) whatever
//! was armed before and bumps the slot generation, so a [`TimerToken`] handed
//! out for an earlier deadline can never fire again.

/// Identifies one arming of a [`TimerSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Armed {
    due_ms: u64,
    token: TimerToken,
}

/// Single cancelable deadline
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TimerSlot {
    armed: Option<Armed>,
    generation: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot for `due_ms`, canceling any previous deadline.
    pub fn arm(&mut self, due_ms: u64) -> TimerToken {
        self.generation = self.generation.wrapping_add(1);
        let token = TimerToken(self.generation);
        self.armed = Some(Armed { due_ms, token });
        token
    }

    /// Cancel the armed deadline. Returns true if one was armed.
    pub fn cancel(&mut self) -> bool {
        self.armed.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.armed.map(|a| a.due_ms)
    }

    /// Token of the armed deadline if it is due at or before `now_ms`.
    pub fn due(&self, now_ms: u64) -> Option<(u64, TimerToken)> {
        self.armed
            .filter(|a| a.due_ms <= now_ms)
            .map(|a| (a.due_ms, a.token))
    }

    /// Consume the deadline identified by `token`.
    ///
    /// Returns false (and leaves the slot untouched) for stale or canceled tokens.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        match self.armed {
            Some(a) if a.token == token => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_fire() {
        let mut slot = TimerSlot::new();
        let token = slot.arm(1000);
        assert!(slot.is_armed());
        assert_eq!(slot.deadline(), Some(1000));
        assert_eq!(slot.due(999), None);
        assert_eq!(slot.due(1000), Some((1000, token)));
        assert!(slot.fire(token));
        assert!(!slot.is_armed());
        assert!(!slot.fire(token));
    }

    #[test]
    fn test_rearm_invalidates_previous_token() {
        let mut slot = TimerSlot::new();
        let old = slot.arm(100);
        let new = slot.arm(200);
        assert_ne!(old, new);
        assert!(!slot.fire(old));
        assert_eq!(slot.deadline(), Some(200));
        assert!(slot.fire(new));
    }

    #[test]
    fn test_cancel() {
        let mut slot = TimerSlot::new();
        let token = slot.arm(50);
        assert!(slot.cancel());
        assert!(!slot.cancel());
        assert!(!slot.fire(token));
        assert_eq!(slot.due(u64::MAX), None);
    }
}
