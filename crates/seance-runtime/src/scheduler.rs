use seance_core::actions::TimerKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TimerEntry {
    key: TimerKey,
    due_at_ms: u64,
}

/// The controller's one timer set. Keys are purposes, not handles: arming a
/// key that is already pending replaces its deadline, and `cancel_all`
/// drops everything at once so nothing survives a session reset.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    entries: Vec<TimerEntry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, key: TimerKey, due_at_ms: u64) {
        self.cancel(key);
        self.entries.push(TimerEntry { key, due_at_ms });
    }

    pub fn cancel(&mut self, key: TimerKey) {
        self.entries.retain(|entry| entry.key != key);
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_armed(&self, key: TimerKey) -> bool {
        self.entries.iter().any(|entry| entry.key == key)
    }

    /// Earliest outstanding deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|entry| entry.due_at_ms).min()
    }

    /// Remove and return every key due at or before `now_ms`, earliest
    /// first. Ties resolve in arming order, which keeps firing
    /// deterministic for tests.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<TimerKey> {
        let mut due: Vec<TimerEntry> = self
            .entries
            .iter()
            .copied()
            .filter(|entry| entry.due_at_ms <= now_ms)
            .collect();
        self.entries.retain(|entry| entry.due_at_ms > now_ms);
        due.sort_by_key(|entry| entry.due_at_ms);
        due.into_iter().map(|entry| entry.key).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn arming_a_key_replaces_its_deadline() {
        let mut scheduler = Scheduler::new();
        scheduler.arm(TimerKey::Flicker, 100);
        scheduler.arm(TimerKey::Flicker, 500);

        assert_eq!(scheduler.pop_due(100), Vec::<TimerKey>::new());
        assert_eq!(scheduler.pop_due(500), vec![TimerKey::Flicker]);
    }

    #[test]
    fn pop_due_returns_earliest_first_and_removes() {
        let mut scheduler = Scheduler::new();
        scheduler.arm(TimerKey::Glitch, 300);
        scheduler.arm(TimerKey::LockExpiry, 100);
        scheduler.arm(TimerKey::SideMessage, 200);

        assert_eq!(
            scheduler.pop_due(250),
            vec![TimerKey::LockExpiry, TimerKey::SideMessage]
        );
        assert!(scheduler.is_armed(TimerKey::Glitch));
        assert_eq!(scheduler.pop_due(250), Vec::<TimerKey>::new());
    }

    #[test]
    fn cancel_all_leaves_nothing_behind() {
        let mut scheduler = Scheduler::new();
        scheduler.arm(TimerKey::AutonomousTick, 10);
        scheduler.arm(TimerKey::Flicker, 20);
        scheduler.cancel_all();

        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(scheduler.pop_due(u64::MAX), Vec::<TimerKey>::new());
    }

    #[test]
    fn next_deadline_tracks_the_minimum() {
        let mut scheduler = Scheduler::new();
        assert_eq!(scheduler.next_deadline(), None);
        scheduler.arm(TimerKey::Glitch, 300);
        scheduler.arm(TimerKey::Flicker, 150);
        assert_eq!(scheduler.next_deadline(), Some(150));
        scheduler.cancel(TimerKey::Flicker);
        assert_eq!(scheduler.next_deadline(), Some(300));
    }
}
