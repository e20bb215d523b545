//! # Runtime events emitted by the scheduler, dispatcher, and reporters.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Alarm events**: registry mutations and firings (inserted, fired,
//!   replaced, failed cancel/replace)
//! - **Reporter events**: group reporter lifecycle and periodic announcements
//! - **Runtime events**: shutdown progression
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! acting component, the alarm id/group, and the alarm message.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use alarmvisor::{Event, EventKind};
//!
//! let ev = Event::now(EventKind::Fired)
//!     .with_actor("dispatcher")
//!     .with_id(3)
//!     .with_delay(Duration::from_secs(10))
//!     .with_message("backup finished");
//!
//! assert_eq!(ev.kind, EventKind::Fired);
//! assert_eq!(ev.id, Some(3));
//! assert_eq!(ev.message.as_deref(), Some("backup finished"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::{AlarmId, GroupId};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Alarm events ===
    /// An alarm entered the registry (on submit, and on the re-insertion a
    /// replace performs).
    ///
    /// Sets:
    /// - `id`, `group`, `delay`, `message`
    /// - `actor`, `at`, `seq`
    Inserted,

    /// An alarm reached its expiration and was removed by the dispatcher.
    ///
    /// Sets:
    /// - `id`, `group`, `delay`, `message`
    /// - `actor`, `at`, `seq`
    Fired,

    /// An existing alarm was swapped for a rebuilt one with the same id.
    ///
    /// Sets:
    /// - `id`, `group` (the new group), `delay` (the new delay), `message`
    /// - `actor`, `at`, `seq`
    Replaced,

    /// A cancel request named an id with no pending alarm.
    ///
    /// Sets:
    /// - `id`
    /// - `actor`, `at`, `seq`
    CancelFailed,

    /// A replace request named an id with no pending alarm.
    ///
    /// Sets:
    /// - `id`
    /// - `actor`, `at`, `seq`
    ReplaceFailed,

    // === Reporter events ===
    /// A reporter task was started for a group that had none.
    ///
    /// Sets:
    /// - `group`
    /// - `actor`, `at`, `seq`
    ReporterCreated,

    /// A group's reporter task was cancelled and its slot vacated.
    ///
    /// Sets:
    /// - `group`
    /// - `actor`, `at`, `seq`
    ReporterTerminated,

    /// A reporter re-announced one still-pending alarm of its group.
    ///
    /// Emitted once per matching alarm, once per report cycle.
    ///
    /// Sets:
    /// - `id`, `group`, `message`
    /// - `actor`, `at`, `seq`
    Reported,

    // === Runtime events ===
    /// Shutdown requested (OS signal observed or `shutdown` called).
    ///
    /// Sets:
    /// - `at`, `seq`
    ShutdownRequested,

    /// Dispatcher and all reporters stopped within the grace period.
    ///
    /// Sets:
    /// - `at`, `seq`
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not stop in time.
    ///
    /// Sets:
    /// - `at`, `seq`
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Identity of the emitting component ("scheduler", "dispatcher",
    /// "reporter-<group>").
    pub actor: Option<Arc<str>>,
    /// Alarm id, if applicable.
    pub id: Option<AlarmId>,
    /// Group id, if applicable.
    pub group: Option<GroupId>,
    /// Requested delay of the alarm, if applicable.
    pub delay: Option<Duration>,
    /// Alarm message, if applicable.
    pub message: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            actor: None,
            id: None,
            group: None,
            delay: None,
            message: None,
        }
    }

    /// Attaches the emitting component's identity.
    #[inline]
    pub fn with_actor(mut self, actor: impl Into<Arc<str>>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Attaches an alarm id.
    #[inline]
    pub fn with_id(mut self, id: AlarmId) -> Self {
        self.id = Some(id);
        self
    }

    /// Attaches a group id.
    #[inline]
    pub fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Attaches the alarm's requested delay.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Attaches the alarm message.
    #[inline]
    pub fn with_message(mut self, message: impl Into<Arc<str>>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Seconds since the Unix epoch at emission time, for console-style
    /// output. Saturates to 0 for pre-epoch clocks.
    pub fn unix_secs(&self) -> u64 {
        self.at
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_strictly_increasing() {
        let a = Event::now(EventKind::Inserted);
        let b = Event::now(EventKind::Fired);
        let c = Event::now(EventKind::Reported);
        assert!(a.seq < b.seq);
        assert!(b.seq < c.seq);
    }

    #[test]
    fn builders_set_payload_fields() {
        let ev = Event::now(EventKind::Replaced)
            .with_actor("scheduler")
            .with_id(-4)
            .with_group(2)
            .with_delay(Duration::from_secs(9))
            .with_message("m");
        assert_eq!(ev.actor.as_deref(), Some("scheduler"));
        assert_eq!(ev.id, Some(-4));
        assert_eq!(ev.group, Some(2));
        assert_eq!(ev.delay, Some(Duration::from_secs(9)));
        assert_eq!(ev.message.as_deref(), Some("m"));
    }
}
