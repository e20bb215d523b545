//! # Event subscribers for the alarmvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and the fan-out machinery
//! for handling runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   registry / dispatcher / reporters ── publish(Event) ──► Bus
//!                                              │
//!                                    subscriber_listener
//!                                              │
//!                                       SubscriberSet::emit
//!                                    ┌─────────┼─────────┐
//!                                    ▼         ▼         ▼
//!                              ConsoleWriter  Metrics  Custom ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use alarmvisor::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct FiredMetric;
//!
//! #[async_trait]
//! impl Subscribe for FiredMetric {
//!     async fn on_event(&self, event: &Event) {
//!         if matches!(event.kind, EventKind::Fired) {
//!             // increment a counter
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::ConsoleWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
