//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the registry, dispatcher,
//! group reporters, and the scheduler itself.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] - event classification and payload metadata
//! - [`Bus`] - thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `AlarmRegistry` (insertions), `Dispatcher` (firings),
//!   `ReporterPool` (reporter lifecycle), `GroupReporter` (announcements),
//!   `Scheduler` (request failures, replace, shutdown progression).
//! - **Consumer**: `Scheduler::subscriber_listener()` (fans out to the
//!   `SubscriberSet`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
