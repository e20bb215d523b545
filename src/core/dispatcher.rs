//! # Dispatcher - the single task that fires due alarms.
//!
//! The dispatcher repeatedly inspects the head of the registry's id order:
//!
//! - empty registry → wait for a mutation or one idle poll interval;
//! - head due → the registry hands it over (already removed), the
//!   dispatcher publishes [`EventKind::Fired`] and tears down the group's
//!   reporter if the group emptied, then loops immediately to drain any
//!   other already-due alarms;
//! - head pending → sleep until its expiration **or** until a mutation
//!   changes the head.
//!
//! The head is the lowest id, not the earliest expiration; the sleep is
//! computed from the head even when a later id expires sooner. The wait is
//! interruptible (registry mutations wake it), so the staleness this
//! ordering introduces is bounded by the head's own expiration.
//!
//! All waits happen outside both locks.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::core::alarm::Alarm;
use crate::core::pool::ReporterPool;
use crate::core::registry::{AlarmRegistry, HeadState};
use crate::events::{Bus, Event, EventKind};

const ACTOR: &str = "dispatcher";

/// The firing task. One instance per scheduler.
pub(crate) struct Dispatcher {
    registry: Arc<AlarmRegistry>,
    pool: Arc<ReporterPool>,
    bus: Bus,
    idle_poll: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<AlarmRegistry>,
        pool: Arc<ReporterPool>,
        bus: Bus,
        idle_poll: Duration,
    ) -> Self {
        Self {
            registry,
            pool,
            bus,
            idle_poll,
        }
    }

    /// Runs until cancelled.
    pub async fn run(self, token: CancellationToken) {
        loop {
            if token.is_cancelled() {
                break;
            }
            match self.registry.take_due_head().await {
                HeadState::Fired(alarm) => {
                    self.fire(alarm).await;
                    // Drain further due alarms without waiting.
                }
                HeadState::Empty => {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = self.registry.changed() => {}
                        _ = sleep(self.idle_poll) => {}
                    }
                }
                HeadState::Pending(expires_at) => {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = self.registry.changed() => {}
                        _ = sleep_until(expires_at) => {}
                    }
                }
            }
        }
    }

    /// Publishes the firing, then retires the group's reporter if this was
    /// its last alarm. The emptiness check and the stop share one registry
    /// critical section.
    async fn fire(&self, alarm: Alarm) {
        self.bus.publish(
            Event::now(EventKind::Fired)
                .with_actor(ACTOR)
                .with_id(alarm.id)
                .with_group(alarm.group)
                .with_delay(alarm.delay)
                .with_message(Arc::clone(&alarm.message)),
        );
        let guard = self.registry.guard().await;
        self.pool.stop_if_unused(&guard, alarm.group, ACTOR).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;

    struct Fixture {
        registry: Arc<AlarmRegistry>,
        pool: Arc<ReporterPool>,
        bus: Bus,
        token: CancellationToken,
    }

    fn fixture() -> Fixture {
        let cfg = SchedulerConfig::default();
        let bus = Bus::new(128);
        let registry = AlarmRegistry::new(cfg.clone(), bus.clone());
        let token = CancellationToken::new();
        let pool = ReporterPool::new(&cfg, Arc::clone(&registry), bus.clone(), token.clone());
        let dispatcher = Dispatcher::new(
            Arc::clone(&registry),
            Arc::clone(&pool),
            bus.clone(),
            Duration::from_secs(1),
        );
        tokio::spawn(dispatcher.run(token.clone()));
        Fixture {
            registry,
            pool,
            bus,
            token,
        }
    }

    async fn drain_kinds(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    #[tokio::test(start_paused = true)]
    async fn fires_at_expiration_and_not_before() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        f.registry.insert(5, 3, "a").await;
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(
            !drain_kinds(&mut rx).await.contains(&EventKind::Fired),
            "must not fire before expiration"
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(drain_kinds(&mut rx).await.contains(&EventKind::Fired));
        assert!(f.registry.snapshot().await.is_empty());
        f.token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn drains_every_due_alarm_without_extra_waits() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        f.registry.insert(1, 2, "a").await;
        f.registry.insert(2, 2, "b").await;
        f.registry.insert(3, 2, "c").await;
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(2)).await;
        // Let the dispatcher spin through all three.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        let fired = drain_kinds(&mut rx)
            .await
            .into_iter()
            .filter(|k| *k == EventKind::Fired)
            .count();
        assert_eq!(fired, 3);
        f.token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn firing_the_last_group_member_stops_its_reporter() {
        let f = fixture();
        f.registry.insert(9, 2, "only").await; // group 1
        f.pool.ensure(1, "scheduler").await.unwrap();
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(2)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(f.pool.active_groups().await.is_empty());
        f.token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn reporter_survives_while_group_has_other_members() {
        let f = fixture();
        f.registry.insert(1, 2, "first").await; // group 1
        f.registry.insert(2, 4, "second").await; // group 1
        f.pool.ensure(1, "scheduler").await.unwrap();
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(2)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert_eq!(f.pool.active_groups().await, vec![1]);

        tokio::time::advance(Duration::from_secs(2)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(f.pool.active_groups().await.is_empty());
        f.token.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn an_insert_wakes_an_idle_dispatcher() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        tokio::task::yield_now().await;

        // Dispatcher is parked on the empty-registry wait; an insert with a
        // zero delay must fire promptly without waiting out the idle poll.
        f.registry.insert(1, 0, "now").await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(drain_kinds(&mut rx).await.contains(&EventKind::Fired));
        f.token.cancel();
    }
}
