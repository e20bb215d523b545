//! Error types used by the alarmvisor runtime.
//!
//! This module defines two error enums:
//!
//! - [`SchedulerError`] - failures of individual scheduling requests
//!   (submit/cancel/replace).
//! - [`RuntimeError`] - failures of the runtime itself, such as a shutdown
//!   sequence exceeding its grace period.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::core::{AlarmId, GroupId};

/// # Errors produced by scheduling requests.
///
/// These are returned to the caller of `submit`/`cancel`/`replace` and never
/// cross a task boundary. All of them are recoverable: the registry and the
/// reporter pool stay consistent.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Cancel/replace named an id with no pending alarm.
    #[error("no pending alarm with id {id}")]
    NotFound {
        /// The id the request named.
        id: AlarmId,
    },

    /// The reporter pool has no vacant slot for a new group.
    ///
    /// The submitted alarm is already registered and will still fire; only
    /// the periodic group announcements are missing until a slot frees up.
    #[error("reporter pool exhausted ({capacity} slots), group {group} has no reporter")]
    CapacityExceeded {
        /// The group that could not get a reporter.
        group: GroupId,
        /// Total number of reporter slots.
        capacity: usize,
    },
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use alarmvisor::SchedulerError;
    ///
    /// let err = SchedulerError::NotFound { id: 7 };
    /// assert_eq!(err.as_label(), "alarm_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::NotFound { .. } => "alarm_not_found",
            SchedulerError::CapacityExceeded { .. } => "reporter_capacity_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SchedulerError::NotFound { id } => format!("alarm id {id} not found"),
            SchedulerError::CapacityExceeded { group, capacity } => {
                format!("no reporter slot for group {group} (capacity {capacity})")
            }
        }
    }
}

/// # Errors produced by the runtime.
///
/// These represent failures in the scheduling runtime itself rather than in
/// any single request.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some reporter tasks remained
    /// stuck and were abandoned mid-join.
    #[error("shutdown timeout {grace:?} exceeded; stuck groups: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Groups whose reporters did not shut down in time.
        stuck: Vec<GroupId>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck groups={stuck:?}")
            }
        }
    }
}
