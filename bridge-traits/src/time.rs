//! Injectable time source.
//!
//! Simulated adapters stamp locations, events and tokens through a [`Clock`]
//! so tests can pin the instant the "device" reports.

use chrono::{DateTime, Utc};

use crate::platform::PlatformSendSync;

/// Wall-clock source for adapters.
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn stamp(clock: &dyn Clock) -> String {
///     clock.now().to_rfc3339()
/// }
/// ```
pub trait Clock: PlatformSendSync {
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the epoch, the unit native location timestamps use.
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let clock = FixedClock(instant);

        assert_eq!(clock.now(), instant);
        assert_eq!(clock.unix_timestamp_millis(), 1_714_564_800_000);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
