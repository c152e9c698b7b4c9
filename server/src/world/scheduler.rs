//! Deadline-ordered delayed actions with owner-wide cancellation.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Entity a scheduled action belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Owner {
    Monster(u64),
    Site(String),
    Loot(u64),
}

/// Delayed effect fired by the world
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledAction {
    RecoverFromHit(u64),
    Despawn(u64),
    Respawn(String),
    FinishLoot(u64),
    ExpireLoot(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Timer {
    owner: Owner,
    action: ScheduledAction,
}

/// Pending actions keyed by `(deadline, id)`; ids increase, so ties fire in
/// scheduling order.
#[derive(Debug, Default)]
pub struct Scheduler {
    timers: BTreeMap<(Duration, TimerId), Timer>,
    deadlines: HashMap<TimerId, Duration>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        deadline: Duration,
        owner: Owner,
        action: ScheduledAction,
    ) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert((deadline, id), Timer { owner, action });
        self.deadlines.insert(id, deadline);
        id
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.timers.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    /// Cancel every pending action of `owner`, returning how many were removed
    pub fn cancel_owner(&mut self, owner: &Owner) -> usize {
        let doomed: Vec<(Duration, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, timer)| &timer.owner == owner)
            .map(|(key, _)| *key)
            .collect();
        for key in &doomed {
            self.timers.remove(key);
            self.deadlines.remove(&key.1);
        }
        doomed.len()
    }

    /// Remove and return every action with `deadline <= now`, earliest first
    pub fn drain_due(&mut self, now: Duration) -> Vec<ScheduledAction> {
        let mut due = Vec::new();
        while let Some(entry) = self.timers.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, id), timer) = entry.remove_entry();
            self.deadlines.remove(&id);
            due.push(timer.action);
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn pending_for(&self, owner: &Owner) -> usize {
        self.timers.values().filter(|timer| &timer.owner == owner).count()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn test_drain_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(at(300), Owner::Monster(1), ScheduledAction::Despawn(1));
        scheduler.schedule(at(100), Owner::Monster(2), ScheduledAction::RecoverFromHit(2));
        scheduler.schedule(at(100), Owner::Site("a".into()), ScheduledAction::Respawn("a".into()));
        scheduler.schedule(at(900), Owner::Loot(5), ScheduledAction::ExpireLoot(5));

        assert_eq!(scheduler.next_deadline(), Some(at(100)));
        assert!(scheduler.drain_due(at(50)).is_empty());

        let due = scheduler.drain_due(at(300));
        assert_eq!(
            due,
            vec![
                ScheduledAction::RecoverFromHit(2),
                ScheduledAction::Respawn("a".into()),
                ScheduledAction::Despawn(1),
            ]
        );
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.next_deadline(), Some(at(900)));
    }

    #[test]
    fn test_cancel_owner_only_touches_owner() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(at(100), Owner::Monster(1), ScheduledAction::RecoverFromHit(1));
        scheduler.schedule(at(200), Owner::Monster(1), ScheduledAction::Despawn(1));
        scheduler.schedule(at(150), Owner::Monster(2), ScheduledAction::Despawn(2));
        scheduler.schedule(at(150), Owner::Loot(1), ScheduledAction::ExpireLoot(1));

        assert_eq!(scheduler.cancel_owner(&Owner::Monster(1)), 2);
        assert_eq!(scheduler.pending_for(&Owner::Monster(1)), 0);
        assert_eq!(scheduler.pending_for(&Owner::Monster(2)), 1);
        assert_eq!(scheduler.pending_for(&Owner::Loot(1)), 1);
        assert_eq!(scheduler.cancel_owner(&Owner::Monster(1)), 0);

        let due = scheduler.drain_due(at(1000));
        assert_eq!(
            due,
            vec![ScheduledAction::Despawn(2), ScheduledAction::ExpireLoot(1)]
        );
    }

    #[test]
    fn test_cancel_single_timer() {
        let mut scheduler = Scheduler::new();
        let finish = scheduler.schedule(at(2000), Owner::Loot(3), ScheduledAction::FinishLoot(3));
        scheduler.schedule(at(30000), Owner::Loot(3), ScheduledAction::ExpireLoot(3));

        assert!(scheduler.cancel(finish));
        assert!(!scheduler.cancel(finish));
        assert_eq!(scheduler.pending_for(&Owner::Loot(3)), 1);

        let fired = scheduler.schedule(at(10), Owner::Loot(4), ScheduledAction::FinishLoot(4));
        assert_eq!(scheduler.drain_due(at(10)), vec![ScheduledAction::FinishLoot(4)]);
        assert!(!scheduler.cancel(fired));
    }
}
