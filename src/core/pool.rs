//! # Reporter pool - lifecycle manager for per-group reporter tasks.
//!
//! The pool owns a fixed table of slots, one per concurrently active group.
//! `ensure` starts a reporter for a group that has none; `stop` cancels a
//! group's reporter and vacates its slot. The pool owns the task handles
//! (`JoinHandle` + `CancellationToken`), mirroring how running tasks are
//! tracked and torn down elsewhere in this runtime.
//!
//! ## Rules
//! - All slot reads and writes happen under the pool lock.
//! - The existence probe examines only the first `probe_window` slots; the
//!   allocation scan covers the whole table. With the default configuration
//!   a group whose slot sits past the probe window can therefore receive a
//!   second reporter (see `SchedulerConfig::probe_window`).
//! - Teardown is cooperative: `stop` cancels the reporter's token and
//!   returns without joining; the reporter may finish one more scan.
//! - Compound "stop if the group emptied" checks go through
//!   [`ReporterPool::stop_if_unused`], which takes the registry guard as
//!   proof that the registry lock is already held (registry before pool,
//!   never the reverse).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::core::alarm::GroupId;
use crate::core::registry::{AlarmRegistry, RegistryGuard};
use crate::core::reporter::GroupReporter;
use crate::error::SchedulerError;
use crate::events::{Bus, Event, EventKind};

/// Handle to a running reporter task.
struct Slot {
    group: GroupId,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

/// Bounded table of running group reporters.
pub(crate) struct ReporterPool {
    slots: Mutex<Vec<Option<Slot>>>,
    probe_window: usize,
    report_interval: Duration,
    registry: Arc<AlarmRegistry>,
    bus: Bus,
    runtime: CancellationToken,
}

impl ReporterPool {
    pub fn new(
        cfg: &SchedulerConfig,
        registry: Arc<AlarmRegistry>,
        bus: Bus,
        runtime: CancellationToken,
    ) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new((0..cfg.max_groups).map(|_| None).collect()),
            probe_window: cfg.probe_window_clamped(),
            report_interval: cfg.report_interval,
            registry,
            bus,
            runtime,
        })
    }

    /// Starts a reporter for `group` unless the existence probe finds one.
    ///
    /// Returns `Ok(true)` when a reporter was created, `Ok(false)` when the
    /// probe found an existing one, and `CapacityExceeded` when the whole
    /// table is occupied.
    pub async fn ensure(&self, group: GroupId, actor: &'static str) -> Result<bool, SchedulerError> {
        let mut slots = self.slots.lock().await;

        let probed = &slots[..self.probe_window];
        if probed.iter().flatten().any(|s| s.group == group) {
            return Ok(false);
        }

        let vacant = slots.iter().position(Option::is_none).ok_or(
            SchedulerError::CapacityExceeded {
                group,
                capacity: slots.len(),
            },
        )?;

        let cancel = self.runtime.child_token();
        let reporter = GroupReporter::new(
            group,
            Arc::clone(&self.registry),
            self.bus.clone(),
            self.report_interval,
        );
        let join = tokio::spawn(reporter.run(cancel.clone()));
        slots[vacant] = Some(Slot {
            group,
            cancel,
            join,
        });
        drop(slots);

        self.bus.publish(
            Event::now(EventKind::ReporterCreated)
                .with_actor(actor)
                .with_group(group),
        );
        Ok(true)
    }

    /// Cancels the first reporter found for `group` and vacates its slot.
    ///
    /// No-op (returns false) when the group has no reporter. Does not join:
    /// the reporter may complete one more scan before exiting.
    pub async fn stop(&self, group: GroupId, actor: &'static str) -> bool {
        let mut slots = self.slots.lock().await;
        let Some(idx) = slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| s.group == group))
        else {
            return false;
        };
        let slot = slots[idx].take().expect("slot occupied at found index");
        slot.cancel.cancel();
        drop(slots);

        self.bus.publish(
            Event::now(EventKind::ReporterTerminated)
                .with_actor(actor)
                .with_group(group),
        );
        true
    }

    /// Stops `group`'s reporter only if the registry (whose lock the caller
    /// proves to hold via `guard`) has no alarm left in that group.
    ///
    /// The emptiness check and the stop form one critical section, so a
    /// concurrent submit into the group cannot slip between them.
    pub async fn stop_if_unused(&self, guard: &RegistryGuard<'_>, group: GroupId, actor: &'static str) -> bool {
        if !guard.group_is_empty(group) {
            return false;
        }
        self.stop(group, actor).await
    }

    /// Groups that currently own a reporter slot, in table order.
    pub async fn active_groups(&self) -> Vec<GroupId> {
        let slots = self.slots.lock().await;
        slots.iter().flatten().map(|s| s.group).collect()
    }

    /// Cancels every reporter and hands their join handles to the caller.
    ///
    /// Used by shutdown: the caller joins within its grace period and can
    /// name the groups that did not finish.
    pub async fn drain(&self) -> Vec<(GroupId, JoinHandle<()>)> {
        let mut slots = self.slots.lock().await;
        let drained: Vec<Slot> = slots.iter_mut().filter_map(Option::take).collect();
        drop(slots);

        for slot in &drained {
            slot.cancel.cancel();
        }
        drained.into_iter().map(|s| (s.group, s.join)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(cfg: SchedulerConfig) -> (Arc<ReporterPool>, Arc<AlarmRegistry>, Bus) {
        let bus = Bus::new(64);
        let registry = AlarmRegistry::new(cfg.clone(), bus.clone());
        let pool = ReporterPool::new(
            &cfg,
            Arc::clone(&registry),
            bus.clone(),
            CancellationToken::new(),
        );
        (pool, registry, bus)
    }

    #[tokio::test(start_paused = true)]
    async fn second_ensure_for_same_group_is_a_no_op() {
        let (pool, _reg, bus) = fixture(SchedulerConfig::default());
        let mut rx = bus.subscribe();

        assert!(pool.ensure(1, "scheduler").await.unwrap());
        assert!(!pool.ensure(1, "scheduler").await.unwrap());
        assert_eq!(pool.active_groups().await, vec![1]);

        // Exactly one creation event.
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::ReporterCreated);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn full_table_reports_capacity_exceeded() {
        let cfg = SchedulerConfig {
            max_groups: 2,
            probe_window: 2,
            ..SchedulerConfig::default()
        };
        let (pool, _reg, _bus) = fixture(cfg);
        pool.ensure(1, "scheduler").await.unwrap();
        pool.ensure(2, "scheduler").await.unwrap();
        let err = pool.ensure(3, "scheduler").await.unwrap_err();
        assert_eq!(err.as_label(), "reporter_capacity_exceeded");
    }

    #[tokio::test(start_paused = true)]
    async fn narrow_probe_window_can_double_allocate_a_group() {
        // Probe sees only slot 0; group 2 lives in slot 1, invisible to the
        // probe, so a second reporter is allocated for it. Legacy table
        // behavior, reproduced by the default configuration shape.
        let cfg = SchedulerConfig {
            max_groups: 3,
            probe_window: 1,
            ..SchedulerConfig::default()
        };
        let (pool, _reg, _bus) = fixture(cfg);
        assert!(pool.ensure(1, "scheduler").await.unwrap());
        assert!(pool.ensure(2, "scheduler").await.unwrap());
        assert!(pool.ensure(2, "scheduler").await.unwrap());
        assert_eq!(pool.active_groups().await, vec![1, 2, 2]);

        // Each stop clears one slot, first match in table order.
        assert!(pool.stop(2, "scheduler").await);
        assert_eq!(pool.active_groups().await, vec![1, 2]);
        assert!(pool.stop(2, "scheduler").await);
        assert!(!pool.stop(2, "scheduler").await);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_if_unused_respects_live_members() {
        let (pool, reg, _bus) = fixture(SchedulerConfig::default());
        reg.insert(1, 3, "a").await; // group 1
        pool.ensure(1, "scheduler").await.unwrap();

        let guard = reg.guard().await;
        assert!(!pool.stop_if_unused(&guard, 1, "scheduler").await);
        drop(guard);

        reg.remove(1).await.unwrap();
        let guard = reg.guard().await;
        assert!(pool.stop_if_unused(&guard, 1, "scheduler").await);
        assert!(pool.active_groups().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_cancels_and_returns_all_handles() {
        let (pool, _reg, _bus) = fixture(SchedulerConfig::default());
        pool.ensure(1, "scheduler").await.unwrap();
        pool.ensure(2, "scheduler").await.unwrap();

        let handles = pool.drain().await;
        assert_eq!(handles.len(), 2);
        for (_, join) in handles {
            join.await.unwrap();
        }
        assert!(pool.active_groups().await.is_empty());
    }
}
