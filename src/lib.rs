//! # alarmvisor
//!
//! **Alarmvisor** is a time-ordered alarm scheduling library for Rust.
//!
//! Clients submit, cancel, or replace timed notifications; a background
//! dispatcher fires each notification at its expiration; notifications are
//! partitioned into groups (buckets of requested delay), and each active
//! group owns a reporter task that re-announces the group's still-pending
//! alarms once per second - started on the group's first alarm, stopped
//! when the group empties.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   submit / cancel / replace
//!            │
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                        │
//! │  - AlarmRegistry (id-ordered pending alarms, one lock)            │
//! │  - ReporterPool  (group → reporter task, bounded slot table)      │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────────┬───────────────────────┬─────────────┘
//!        ▼                      ▼                       ▼
//! ┌──────────────┐   ┌────────────────────┐   ┌────────────────────┐
//! │  Dispatcher  │   │ GroupReporter (G1) │   │ GroupReporter (GN) │
//! │ (fires due   │   │ (announces group   │   │                    │
//! │  head alarm) │   │  members, 1/sec)   │   │                    │
//! └┬─────────────┘   └┬───────────────────┘   └┬───────────────────┘
//!  │ Fired,           │ Reported               │ Reported
//!  │ ReporterTerm.    │                        │
//!  ▼                  ▼                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       │    (in Scheduler)      │
//!                       └───┬────────────────┬───┘
//!                           ▼                ▼
//!                    [queue S1]          [queue SN]
//!                        ▼                   ▼
//!                   sub1.on_event()    subN.on_event()
//! ```
//!
//! ### Ordering
//! The registry orders alarms by **ascending id**, and the dispatcher only
//! ever inspects the head of that order - the lowest id, not the earliest
//! expiration. A pending head is slept on; any mutation of the registry
//! wakes the dispatcher so a new head is picked up immediately.
//!
//! ### Group lifecycle
//! ```text
//! submit(id, delay, msg)
//!   ├─► group = ceil(delay / 5)
//!   ├─► registry insert (id order)            ─► Inserted
//!   └─► pool.ensure(group)
//!         ├─ reporter exists ─► no-op
//!         ├─ vacant slot     ─► spawn GroupReporter ─► ReporterCreated
//!         └─ table full      ─► Err(CapacityExceeded)
//!
//! firing / cancel / replace removing a group's last alarm
//!   └─► pool.stop_if_unused(group)            ─► ReporterTerminated
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                   |
//! |-------------------|-----------------------------------------------------------|--------------------------------------|
//! | **Requests**      | Submit, cancel, replace pending alarms.                   | [`Scheduler`]                        |
//! | **Subscriber API**| Hook into runtime events (console, metrics, tests).       | [`Subscribe`], [`SubscriberSet`]     |
//! | **Events**        | Sequenced, timestamped runtime events.                    | [`Event`], [`EventKind`]             |
//! | **Errors**        | Typed errors for requests and the runtime.                | [`SchedulerError`], [`RuntimeError`] |
//! | **Configuration** | Centralized runtime settings.                             | [`SchedulerConfig`]                  |
//!
//! ## Optional features
//! - `logging` (default): exports [`ConsoleWriter`], a stdout subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use alarmvisor::{Scheduler, SchedulerConfig, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(alarmvisor::ConsoleWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn Subscribe>> = Vec::new();
//!
//!     let scheduler = Scheduler::new(SchedulerConfig::default(), subs);
//!     scheduler.start();
//!
//!     scheduler.submit(1, 3, "kettle").await?;
//!     scheduler.submit(2, 4, "toast").await?;   // same group as id 1
//!     scheduler.replace(2, 12, "toast, but later").await?;
//!     scheduler.cancel(1).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod subscribers;

// ---- Public re-exports ----

pub use config::SchedulerConfig;
pub use crate::core::{Alarm, AlarmId, GroupId, Scheduler};
pub use error::{RuntimeError, SchedulerError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose the built-in console subscriber.
// Enable with: `--features logging` (on by default).
#[cfg(feature = "logging")]
pub use subscribers::ConsoleWriter;
