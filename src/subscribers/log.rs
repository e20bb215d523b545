//! # Console subscriber for debugging and demos.
//!
//! [`ConsoleWriter`] prints events to stdout in a human-readable format,
//! one line per event, with the Unix timestamp and the acting component:
//! the classic console alarm service output, labeled.
//!
//! ## Output format
//! ```text
//! [inserted] id=3 group=2 by=scheduler at=1731000000 msg="pick up laundry"
//! [reported] id=3 group=2 by=reporter-2 at=1731000001 msg="pick up laundry"
//! [fired] id=3 delay=10s by=dispatcher at=1731000010 msg="pick up laundry"
//! [reporter-terminated] group=2 by=dispatcher at=1731000010
//! ```
//!
//! Not intended for production use - implement a custom
//! [`Subscribe`](crate::Subscribe) for structured logging or metrics.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature.
#[derive(Default)]
pub struct ConsoleWriter;

impl ConsoleWriter {
    fn line(e: &Event) -> String {
        let by = e.actor.as_deref().unwrap_or("?");
        let at = e.unix_secs();
        match e.kind {
            EventKind::Inserted => format!(
                "[inserted] id={} group={} delay={:?} by={by} at={at} msg={:?}",
                e.id.unwrap_or_default(),
                e.group.unwrap_or_default(),
                e.delay.unwrap_or_default(),
                e.message.as_deref().unwrap_or_default(),
            ),
            EventKind::Fired => format!(
                "[fired] id={} delay={:?} by={by} at={at} msg={:?}",
                e.id.unwrap_or_default(),
                e.delay.unwrap_or_default(),
                e.message.as_deref().unwrap_or_default(),
            ),
            EventKind::Reported => format!(
                "[reported] id={} group={} by={by} at={at} msg={:?}",
                e.id.unwrap_or_default(),
                e.group.unwrap_or_default(),
                e.message.as_deref().unwrap_or_default(),
            ),
            EventKind::Replaced => format!(
                "[replaced] id={} group={} delay={:?} by={by} at={at} msg={:?}",
                e.id.unwrap_or_default(),
                e.group.unwrap_or_default(),
                e.delay.unwrap_or_default(),
                e.message.as_deref().unwrap_or_default(),
            ),
            EventKind::CancelFailed => {
                format!("[cancel-failed] id={} by={by} at={at}", e.id.unwrap_or_default())
            }
            EventKind::ReplaceFailed => {
                format!("[replace-failed] id={} by={by} at={at}", e.id.unwrap_or_default())
            }
            EventKind::ReporterCreated => format!(
                "[reporter-created] group={} by={by} at={at}",
                e.group.unwrap_or_default()
            ),
            EventKind::ReporterTerminated => format!(
                "[reporter-terminated] group={} by={by} at={at}",
                e.group.unwrap_or_default()
            ),
            EventKind::ShutdownRequested => format!("[shutdown-requested] at={at}"),
            EventKind::AllStoppedWithin => format!("[all-stopped] at={at}"),
            EventKind::GraceExceeded => format!("[grace-exceeded] at={at}"),
        }
    }
}

#[async_trait]
impl Subscribe for ConsoleWriter {
    async fn on_event(&self, event: &Event) {
        println!("{}", Self::line(event));
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn lines_carry_the_alarm_payload() {
        let ev = Event::now(EventKind::Fired)
            .with_actor("dispatcher")
            .with_id(3)
            .with_delay(Duration::from_secs(10))
            .with_message("pick up laundry");
        let line = ConsoleWriter::line(&ev);
        assert!(line.starts_with("[fired] id=3 delay=10s by=dispatcher"));
        assert!(line.ends_with("msg=\"pick up laundry\""));
    }

    #[test]
    fn reporter_lifecycle_lines_name_the_group() {
        let ev = Event::now(EventKind::ReporterTerminated)
            .with_actor("dispatcher")
            .with_group(7);
        assert!(ConsoleWriter::line(&ev).starts_with("[reporter-terminated] group=7 by=dispatcher"));
    }
}
