//! # Global runtime configuration.
//!
//! Provides [`SchedulerConfig`], centralized settings for the scheduler
//! runtime.
//!
//! The config is consumed once, at [`Scheduler::new`](crate::Scheduler::new);
//! the defaults reproduce the behavior of the classic console alarm service
//! this crate models (one-second cycles, five-second group buckets, a
//! 100-slot reporter table probed through its first 10 slots).

use std::time::Duration;

/// Global configuration for the scheduler runtime.
///
/// ## Field semantics
/// - `group_width`: seconds of requested delay per group bucket
/// - `report_interval`: pause between two announcement scans of a reporter
/// - `idle_poll`: how long the dispatcher waits when no alarm is pending
///   (it also wakes immediately on any registry mutation)
/// - `max_groups`: total reporter slots; one slot per concurrently active group
/// - `probe_window`: leading slots examined by the reporter existence probe
/// - `max_message`: bytes kept of a submitted message (longer input is cut
///   on a UTF-8 boundary)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `grace`: maximum wait for reporters/dispatcher to stop on shutdown
///
/// ## Notes
/// All fields are public for flexibility. A `probe_window` smaller than
/// `max_groups` means a group whose slot sits past the window is invisible
/// to the probe, and a second reporter can be allocated for it; set
/// `probe_window = max_groups` for a strict at-most-one-reporter table.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Width of one group bucket, in seconds of requested delay.
    ///
    /// An alarm with delay `d` belongs to group `ceil(d / group_width)`.
    pub group_width: u64,

    /// Interval between two announcement scans of a group reporter.
    pub report_interval: Duration,

    /// Dispatcher wait while the registry is empty.
    ///
    /// Insertions wake the dispatcher early, so this only bounds how long
    /// an idle dispatcher sleeps between checks.
    pub idle_poll: Duration,

    /// Number of slots in the reporter table.
    ///
    /// Submitting an alarm whose group needs a reporter when every slot is
    /// taken yields [`SchedulerError::CapacityExceeded`](crate::SchedulerError::CapacityExceeded).
    pub max_groups: usize,

    /// Number of leading slots the existence probe examines before a new
    /// reporter is allocated. Clamped to `max_groups`.
    pub probe_window: usize,

    /// Maximum stored message length in bytes.
    pub max_message: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events
    /// skip the oldest ones. Minimum value is 1 (enforced by the bus).
    pub bus_capacity: usize,

    /// Maximum time to wait for graceful shutdown before abandoning tasks.
    ///
    /// When shutdown is requested:
    /// - dispatcher and reporters are cancelled via their tokens
    /// - the scheduler waits up to `grace` for them to exit
    /// - on overrun it returns [`RuntimeError::GraceExceeded`](crate::RuntimeError::GraceExceeded)
    pub grace: Duration,
}

impl SchedulerConfig {
    /// Returns the probe window clamped to the table size.
    #[inline]
    pub fn probe_window_clamped(&self) -> usize {
        self.probe_window.min(self.max_groups)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Derives the group id for a requested delay.
    ///
    /// # Example
    /// ```
    /// use alarmvisor::SchedulerConfig;
    ///
    /// let cfg = SchedulerConfig::default();
    /// assert_eq!(cfg.group_for_delay(1), 1);
    /// assert_eq!(cfg.group_for_delay(5), 1);
    /// assert_eq!(cfg.group_for_delay(6), 2);
    /// ```
    #[inline]
    pub fn group_for_delay(&self, delay_secs: u64) -> u64 {
        delay_secs.div_ceil(self.group_width.max(1))
    }
}

impl Default for SchedulerConfig {
    /// Default configuration:
    ///
    /// - `group_width = 5` (five seconds of delay per bucket)
    /// - `report_interval = 1s`, `idle_poll = 1s` (one-second granularity)
    /// - `max_groups = 100`, `probe_window = 10` (legacy table shape)
    /// - `max_message = 127` bytes
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            group_width: 5,
            report_interval: Duration::from_secs(1),
            idle_poll: Duration::from_secs(1),
            max_groups: 100,
            probe_window: 10,
            max_message: 127,
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_buckets_are_ceiling_division() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.group_for_delay(1), 1);
        assert_eq!(cfg.group_for_delay(4), 1);
        assert_eq!(cfg.group_for_delay(5), 1);
        assert_eq!(cfg.group_for_delay(6), 2);
        assert_eq!(cfg.group_for_delay(10), 2);
        assert_eq!(cfg.group_for_delay(11), 3);
    }

    #[test]
    fn zero_delay_maps_to_group_zero() {
        let cfg = SchedulerConfig::default();
        assert_eq!(cfg.group_for_delay(0), 0);
    }

    #[test]
    fn probe_window_never_exceeds_table() {
        let cfg = SchedulerConfig {
            probe_window: 500,
            max_groups: 100,
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.probe_window_clamped(), 100);
    }

    #[test]
    fn degenerate_group_width_does_not_divide_by_zero() {
        let cfg = SchedulerConfig {
            group_width: 0,
            ..SchedulerConfig::default()
        };
        assert_eq!(cfg.group_for_delay(7), 7);
    }
}
