//! # Alarm data model.
//!
//! An [`Alarm`] is one pending timed notification: a caller-supplied id, a
//! requested delay, an absolute expiration instant, a bounded message, and
//! the group bucket derived from the delay.
//!
//! Ids are lookup keys, not unique identifiers: submitting two alarms with
//! the same id is legal, and lookups return the first match in registry
//! order.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

/// Caller-supplied alarm identifier.
pub type AlarmId = i64;

/// Derived group identifier (`ceil(delay / group_width)`).
pub type GroupId = u64;

/// One pending timed notification, exclusively owned by the registry once
/// inserted.
#[derive(Clone, Debug)]
pub struct Alarm {
    /// Caller-supplied id (non-unique lookup key).
    pub id: AlarmId,
    /// Requested delay.
    pub delay: Duration,
    /// Absolute expiration (`insertion instant + delay`).
    pub expires_at: Instant,
    /// Notification text, capped at the configured byte length.
    pub message: Arc<str>,
    /// Group bucket derived from the requested delay.
    pub group: GroupId,
}

impl Alarm {
    /// True once the alarm's expiration has passed.
    #[inline]
    pub fn is_due(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Cuts `message` to at most `max` bytes without splitting a UTF-8 scalar.
pub(crate) fn clip_message(message: &str, max: usize) -> &str {
    if message.len() <= max {
        return message;
    }
    let mut end = max;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}
