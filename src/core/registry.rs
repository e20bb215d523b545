//! # Alarm registry - the shared, ordered collection of pending alarms.
//!
//! All pending alarms live in one lock-guarded sequence ordered by
//! **ascending id** (not by expiration time; the dispatcher only ever looks
//! at the head of this order). Insertion splices a new alarm before the
//! first element whose id is not smaller, so an alarm with a duplicate id
//! lands in front of the older ones and `find` returns the newest.
//!
//! ## Rules
//! - Every operation acquires the registry lock for the duration of the
//!   call and never sleeps while holding it.
//! - Mutations wake the dispatcher through a [`Notify`], so a freshly
//!   submitted or replaced alarm is re-examined immediately instead of
//!   after the current sleep expires.
//! - `replace` performs its find → remove → rebuild → re-insert sequence
//!   under a **single** lock acquisition; no observer can see the old and
//!   new instance together, or neither.
//! - The registry publishes [`EventKind::Inserted`] itself for every
//!   insertion, including the re-insertion done by `replace`.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, Notify};
use tokio::time::Instant;

use crate::config::SchedulerConfig;
use crate::core::alarm::{clip_message, Alarm, AlarmId, GroupId};
use crate::events::{Bus, Event, EventKind};

/// Outcome of a successful [`AlarmRegistry::remove`].
#[derive(Debug)]
pub(crate) struct Removed {
    /// The alarm that was taken out of the registry.
    pub alarm: Alarm,
    /// True when no surviving alarm shares the removed alarm's group.
    pub group_now_empty: bool,
}

/// Outcome of a successful [`AlarmRegistry::replace`].
#[derive(Debug)]
pub(crate) struct Replaced {
    /// Group of the discarded instance.
    pub old_group: GroupId,
    /// The rebuilt alarm (same id, new delay/message/group).
    pub new: Alarm,
}

/// What the dispatcher found at the head of the registry.
pub(crate) enum HeadState {
    /// Registry is empty.
    Empty,
    /// The head was due; it has been removed and is handed to the caller.
    Fired(Alarm),
    /// The head expires at the given instant.
    Pending(Instant),
}

/// Shared, ordered registry of pending alarms.
pub(crate) struct AlarmRegistry {
    alarms: Mutex<Vec<Alarm>>,
    changed: Notify,
    bus: Bus,
    cfg: SchedulerConfig,
}

/// Read view over the locked alarm sequence.
///
/// Holding a `RegistryGuard` keeps the registry lock; it exists so that
/// check-then-act sequences (group emptiness followed by a reporter stop)
/// run as one critical section, and so that the pool can demand proof of
/// registry-before-pool lock order in its signatures.
pub(crate) struct RegistryGuard<'a> {
    alarms: MutexGuard<'a, Vec<Alarm>>,
}

impl RegistryGuard<'_> {
    /// True iff no pending alarm belongs to `group`.
    pub fn group_is_empty(&self, group: GroupId) -> bool {
        !self.alarms.iter().any(|a| a.group == group)
    }

    /// All pending alarms of `group`, in registry order.
    pub fn group_members(&self, group: GroupId) -> Vec<Alarm> {
        self.alarms
            .iter()
            .filter(|a| a.group == group)
            .cloned()
            .collect()
    }
}

impl AlarmRegistry {
    pub fn new(cfg: SchedulerConfig, bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            alarms: Mutex::new(Vec::new()),
            changed: Notify::new(),
            bus,
            cfg,
        })
    }

    /// Builds an alarm from a request and splices it into id order.
    ///
    /// Stamps `expires_at = now + delay`, derives the group from the delay,
    /// clips the message to the configured byte cap, publishes `Inserted`,
    /// and wakes the dispatcher. Returns the inserted alarm.
    pub async fn insert(&self, id: AlarmId, delay_secs: u64, message: &str) -> Alarm {
        let mut alarms = self.alarms.lock().await;
        let alarm = self.build(id, delay_secs, message);
        Self::splice(&mut alarms, alarm.clone());
        drop(alarms);
        self.publish_inserted(&alarm);
        self.changed.notify_one();
        alarm
    }

    /// Removes the first alarm matching `id`, reporting whether its group
    /// emptied. `None` if no alarm has that id.
    pub async fn remove(&self, id: AlarmId) -> Option<Removed> {
        let mut alarms = self.alarms.lock().await;
        let idx = alarms.iter().position(|a| a.id == id)?;
        let alarm = alarms.remove(idx);
        let group_now_empty = !alarms.iter().any(|a| a.group == alarm.group);
        drop(alarms);
        self.changed.notify_one();
        Some(Removed {
            alarm,
            group_now_empty,
        })
    }

    /// Swaps the first alarm matching `id` for a rebuilt one, under a
    /// single lock acquisition. `None` if no alarm has that id.
    ///
    /// The rebuilt alarm keeps the id; delay, message, expiration, and
    /// group are derived afresh. Publishes `Inserted` for the re-insertion.
    pub async fn replace(&self, id: AlarmId, delay_secs: u64, message: &str) -> Option<Replaced> {
        let mut alarms = self.alarms.lock().await;
        let idx = alarms.iter().position(|a| a.id == id)?;
        let old = alarms.remove(idx);
        let new = self.build(id, delay_secs, message);
        Self::splice(&mut alarms, new.clone());
        drop(alarms);
        self.publish_inserted(&new);
        self.changed.notify_one();
        Some(Replaced {
            old_group: old.group,
            new,
        })
    }

    /// First alarm matching `id`, in registry order.
    pub async fn find(&self, id: AlarmId) -> Option<Alarm> {
        let alarms = self.alarms.lock().await;
        alarms.iter().find(|a| a.id == id).cloned()
    }

    /// Examines the head of the id order; a due head is removed and
    /// returned in the same critical section.
    pub async fn take_due_head(&self) -> HeadState {
        let mut alarms = self.alarms.lock().await;
        let now = Instant::now();
        let (due, expires_at) = match alarms.first() {
            None => return HeadState::Empty,
            Some(head) => (head.is_due(now), head.expires_at),
        };
        if due {
            HeadState::Fired(alarms.remove(0))
        } else {
            HeadState::Pending(expires_at)
        }
    }

    /// Locks the registry and returns a read view for compound
    /// check-then-act sequences.
    pub async fn guard(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            alarms: self.alarms.lock().await,
        }
    }

    /// Copy of the current sequence, in registry (ascending id) order.
    pub async fn snapshot(&self) -> Vec<Alarm> {
        self.alarms.lock().await.clone()
    }

    /// Resolves when the registry has been mutated since the last wait.
    ///
    /// Backed by a single-permit [`Notify`]: a mutation that happens while
    /// nobody waits is not lost, the next waiter returns immediately.
    pub async fn changed(&self) {
        self.changed.notified().await;
    }

    fn build(&self, id: AlarmId, delay_secs: u64, message: &str) -> Alarm {
        let delay = std::time::Duration::from_secs(delay_secs);
        Alarm {
            id,
            delay,
            expires_at: Instant::now() + delay,
            message: Arc::from(clip_message(message, self.cfg.max_message)),
            group: self.cfg.group_for_delay(delay_secs),
        }
    }

    /// Splices before the first element with `id >= alarm.id`, so a
    /// duplicate id lands in front of the older instances.
    fn splice(alarms: &mut Vec<Alarm>, alarm: Alarm) {
        let at = alarms.partition_point(|a| a.id < alarm.id);
        alarms.insert(at, alarm);
    }

    fn publish_inserted(&self, alarm: &Alarm) {
        self.bus.publish(
            Event::now(EventKind::Inserted)
                .with_actor("scheduler")
                .with_id(alarm.id)
                .with_group(alarm.group)
                .with_delay(alarm.delay)
                .with_message(Arc::clone(&alarm.message)),
        );
    }
}
