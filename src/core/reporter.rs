//! # Group reporter - periodic re-announcement of one group's alarms.
//!
//! A [`GroupReporter`] is a long-lived task bound to a single group id. Each
//! cycle it scans the shared registry under its lock and publishes one
//! [`EventKind::Reported`] per still-pending alarm of its group, then waits
//! one report interval.
//!
//! ## Rules
//! - The reporter only reads the registry; it never mutates it.
//! - Cancellation is cooperative and checked at cycle boundaries: an
//!   in-progress scan completes before the task exits.
//! - The reporter never sleeps while holding the registry lock.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::alarm::GroupId;
use crate::core::registry::AlarmRegistry;
use crate::events::{Bus, Event, EventKind};

/// Periodic announcer for one group.
pub(crate) struct GroupReporter {
    group: GroupId,
    registry: Arc<AlarmRegistry>,
    bus: Bus,
    interval: Duration,
    actor: Arc<str>,
}

impl GroupReporter {
    pub fn new(
        group: GroupId,
        registry: Arc<AlarmRegistry>,
        bus: Bus,
        interval: Duration,
    ) -> Self {
        Self {
            group,
            registry,
            bus,
            interval,
            actor: Arc::from(format!("reporter-{group}")),
        }
    }

    /// Runs until cancelled: scan, announce, wait, repeat.
    pub async fn run(self, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                break;
            }
            self.announce().await;
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// One scan cycle: collect the group's members under the registry lock,
    /// publish outside of it.
    async fn announce(&self) {
        let members = self.registry.guard().await.group_members(self.group);
        for alarm in members {
            self.bus.publish(
                Event::now(EventKind::Reported)
                    .with_actor(Arc::clone(&self.actor))
                    .with_id(alarm.id)
                    .with_group(self.group)
                    .with_message(alarm.message),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;

    #[tokio::test(start_paused = true)]
    async fn announces_every_group_member_each_cycle() {
        let bus = Bus::new(64);
        let reg = AlarmRegistry::new(SchedulerConfig::default(), bus.clone());
        reg.insert(1, 3, "a").await; // group 1
        reg.insert(2, 4, "b").await; // group 1
        reg.insert(3, 9, "c").await; // group 2, not ours

        let mut rx = bus.subscribe();
        let token = CancellationToken::new();
        let reporter = GroupReporter::new(1, Arc::clone(&reg), bus.clone(), Duration::from_secs(1));
        let handle = tokio::spawn(reporter.run(token.clone()));

        // First cycle runs immediately; two members, two events.
        let mut seen = Vec::new();
        for _ in 0..2 {
            let ev = rx.recv().await.unwrap();
            assert_eq!(ev.kind, EventKind::Reported);
            assert_eq!(ev.group, Some(1));
            seen.push(ev.id.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2]);

        // Next cycle after one interval.
        tokio::time::advance(Duration::from_secs(1)).await;
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::Reported);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_cycle() {
        let bus = Bus::new(64);
        let reg = AlarmRegistry::new(SchedulerConfig::default(), bus.clone());
        reg.insert(7, 2, "x").await;

        let token = CancellationToken::new();
        let reporter = GroupReporter::new(1, Arc::clone(&reg), bus.clone(), Duration::from_secs(1));
        let handle = tokio::spawn(reporter.run(token.clone()));
        tokio::task::yield_now().await;

        token.cancel();
        handle.await.unwrap();

        // No announcements arrive once the task has exited.
        let mut rx = bus.subscribe();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(rx.try_recv().is_err());
    }
}
