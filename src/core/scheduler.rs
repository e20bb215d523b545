//! # Scheduler: request entry points, task wiring, and graceful shutdown.
//!
//! The [`Scheduler`] owns the event bus, the alarm registry, the reporter
//! pool, and a [`SubscriberSet`]. It exposes the three request operations
//! (`submit`, `cancel`, `replace`), spawns the dispatcher and the
//! subscriber listener, and drives graceful shutdown.
//!
//! ## High-level architecture
//! ```text
//! Requests:
//!   submit / cancel / replace ──► AlarmRegistry (mutate, id order)
//!                                      │
//!                                      └──► ReporterPool (ensure / stop group reporter)
//!
//! Background tasks (spawned by start()):
//!   Dispatcher ──► take_due_head() ──► Fired ──► stop_if_unused(group)
//!   GroupReporter×N ──► scan group ──► Reported (one per member, per second)
//!
//! Event flow:
//!   registry / dispatcher / pool / reporters ── publish ──► Bus
//!       Bus ──► subscriber_listener ──► SubscriberSet ──► sub.on_event(&Event)
//!
//! Shutdown path:
//!   run(): wait_for_shutdown_signal()
//!     └─► publish(ShutdownRequested)
//!     └─► runtime_token.cancel()      → dispatcher + all reporters
//!     └─► join everything within cfg.grace:
//!           ├─ Ok            → publish(AllStoppedWithin)
//!           └─ overrun       → publish(GraceExceeded), Err(RuntimeError)
//! ```
//!
//! ## Locking
//! Registry lock first, pool lock second, everywhere. Compound sequences
//! that must see a consistent group state (the "stop the reporter iff the
//! group emptied" step of cancel, replace, and firing) hold a
//! [`RegistryGuard`](crate::core::registry::RegistryGuard) across the pool
//! call.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::SchedulerConfig;
use crate::core::alarm::{Alarm, AlarmId, GroupId};
use crate::core::dispatcher::Dispatcher;
use crate::core::pool::ReporterPool;
use crate::core::registry::AlarmRegistry;
use crate::core::shutdown;
use crate::error::{RuntimeError, SchedulerError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};

const ACTOR: &str = "scheduler";

/// Coordinates the alarm registry, the dispatcher, per-group reporters,
/// and event delivery.
pub struct Scheduler {
    cfg: SchedulerConfig,
    bus: Bus,
    registry: Arc<AlarmRegistry>,
    pool: Arc<ReporterPool>,
    subs: Arc<SubscriberSet>,
    runtime: CancellationToken,
    dispatcher: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Creates a scheduler with the given config and subscribers.
    ///
    /// Nothing runs yet; call [`Scheduler::start`] (or [`Scheduler::run`])
    /// to spawn the dispatcher and the subscriber listener.
    pub fn new(cfg: SchedulerConfig, subscribers: Vec<Arc<dyn Subscribe>>) -> Arc<Self> {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let registry = AlarmRegistry::new(cfg.clone(), bus.clone());
        let runtime = CancellationToken::new();
        let pool = ReporterPool::new(&cfg, Arc::clone(&registry), bus.clone(), runtime.clone());
        Arc::new(Self {
            cfg,
            bus,
            registry,
            pool,
            subs: Arc::new(SubscriberSet::new(subscribers)),
            runtime,
            dispatcher: std::sync::Mutex::new(None),
        })
    }

    /// Spawns the subscriber listener and the dispatcher. Idempotent.
    pub fn start(&self) {
        let mut slot = self.dispatcher.lock().expect("dispatcher slot lock");
        if slot.is_some() {
            return;
        }
        self.subscriber_listener();
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.pool),
            self.bus.clone(),
            self.cfg.idle_poll,
        );
        *slot = Some(tokio::spawn(dispatcher.run(self.runtime.clone())));
    }

    /// Runs until a termination signal arrives, then shuts down gracefully.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        self.start();
        let _ = shutdown::wait_for_shutdown_signal().await;
        self.shutdown().await
    }

    /// Registers a new alarm and makes sure its group has a reporter.
    ///
    /// The message is stored clipped to the configured byte cap. A
    /// [`SchedulerError::CapacityExceeded`] means the alarm is pending and
    /// will fire, but its group could not get a reporter.
    pub async fn submit(
        &self,
        id: AlarmId,
        delay_secs: u64,
        message: &str,
    ) -> Result<(), SchedulerError> {
        let alarm = self.registry.insert(id, delay_secs, message).await;
        // The guard spans the emptiness check and the ensure: the dispatcher
        // cannot fire the alarm in between, so a reporter is never created
        // for a group that already emptied.
        let guard = self.registry.guard().await;
        if !guard.group_is_empty(alarm.group) {
            self.pool.ensure(alarm.group, ACTOR).await?;
        }
        Ok(())
    }

    /// Removes the first pending alarm with `id`; stops its group's
    /// reporter when the group emptied.
    pub async fn cancel(&self, id: AlarmId) -> Result<(), SchedulerError> {
        let Some(removed) = self.registry.remove(id).await else {
            self.bus
                .publish(Event::now(EventKind::CancelFailed).with_actor(ACTOR).with_id(id));
            return Err(SchedulerError::NotFound { id });
        };
        if removed.group_now_empty {
            let guard = self.registry.guard().await;
            self.pool
                .stop_if_unused(&guard, removed.alarm.group, ACTOR)
                .await;
        }
        Ok(())
    }

    /// Swaps the first pending alarm with `id` for one with a new delay and
    /// message (the group is re-derived from the new delay).
    ///
    /// The registry swap is atomic: no observer sees the old and new
    /// instance together, or neither. Reporter lifecycle follows - the old
    /// group's reporter stops if the swap emptied it, the new group gets
    /// one if it had none.
    pub async fn replace(
        &self,
        id: AlarmId,
        delay_secs: u64,
        message: &str,
    ) -> Result<(), SchedulerError> {
        let Some(outcome) = self.registry.replace(id, delay_secs, message).await else {
            self.bus
                .publish(Event::now(EventKind::ReplaceFailed).with_actor(ACTOR).with_id(id));
            return Err(SchedulerError::NotFound { id });
        };
        self.bus.publish(
            Event::now(EventKind::Replaced)
                .with_actor(ACTOR)
                .with_id(id)
                .with_group(outcome.new.group)
                .with_delay(outcome.new.delay)
                .with_message(Arc::clone(&outcome.new.message)),
        );
        let guard = self.registry.guard().await;
        if outcome.old_group != outcome.new.group {
            self.pool
                .stop_if_unused(&guard, outcome.old_group, ACTOR)
                .await;
        }
        if !guard.group_is_empty(outcome.new.group) {
            self.pool.ensure(outcome.new.group, ACTOR).await?;
        }
        Ok(())
    }

    /// Copy of the pending alarms, in registry (ascending id) order.
    pub async fn pending(&self) -> Vec<Alarm> {
        self.registry.snapshot().await
    }

    /// First pending alarm with `id`, in registry order (for duplicate ids
    /// this is the most recently inserted instance).
    pub async fn find(&self, id: AlarmId) -> Option<Alarm> {
        self.registry.find(id).await
    }

    /// Groups that currently own a running reporter.
    pub async fn active_reporters(&self) -> Vec<GroupId> {
        self.pool.active_groups().await
    }

    /// New receiver observing all subsequently published events.
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Cancels the dispatcher and every reporter, then waits up to the
    /// configured grace for them to exit.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::now(EventKind::ShutdownRequested).with_actor(ACTOR));
        self.runtime.cancel();

        let deadline = Instant::now() + self.cfg.grace;
        let mut all_stopped = true;

        let dispatcher = self.dispatcher.lock().expect("dispatcher slot lock").take();
        if let Some(join) = dispatcher {
            all_stopped &= timeout_at(deadline, join).await.is_ok();
        }

        let mut stuck = Vec::new();
        for (group, join) in self.pool.drain().await {
            if timeout_at(deadline, join).await.is_err() {
                stuck.push(group);
            }
        }
        all_stopped &= stuck.is_empty();

        if all_stopped {
            self.bus
                .publish(Event::now(EventKind::AllStoppedWithin).with_actor(ACTOR));
            Ok(())
        } else {
            self.bus
                .publish(Event::now(EventKind::GraceExceeded).with_actor(ACTOR));
            Err(RuntimeError::GraceExceeded {
                grace: self.cfg.grace,
                stuck,
            })
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget). A lagging listener skips the overwritten events
    /// and keeps going.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}
