//! Time sources for message generation times

use core::cell::Cell;

use crate::Time64;

/// Source of the current ITS time in microseconds since 2004-01-01 00:00:00 TAI
pub trait Runtime {
    fn now(&self) -> Time64;
}

/// Clock that only advances when told to, for tests and simulations
#[derive(Debug, Default)]
pub struct ManualRuntime {
    now: Cell<Time64>,
}

impl ManualRuntime {
    #[must_use]
    pub fn new(now: Time64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn reset(&self, now: Time64) {
        self.now.set(now);
    }

    /// Advances the clock by `microseconds`
    pub fn trigger(&self, microseconds: u64) {
        self.now.set(self.now.get().saturating_add(microseconds));
    }
}

impl Runtime for ManualRuntime {
    fn now(&self) -> Time64 {
        self.now.get()
    }
}

#[cfg(feature = "std")]
pub use system::SystemRuntime;

#[cfg(feature = "std")]
mod system {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use super::Runtime;
    use crate::Time64;

    /// 2004-01-01 00:00:00 UTC as UNIX timestamp
    const ITS_EPOCH: Duration = Duration::from_secs(1_072_915_200);

    /// Leap seconds inserted since the ITS epoch
    const LEAP_SECONDS: Duration = Duration::from_secs(5);

    /// Wall clock of the host system
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemRuntime;

    impl Runtime for SystemRuntime {
        fn now(&self) -> Time64 {
            let unix = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            let its = unix.saturating_sub(ITS_EPOCH) + LEAP_SECONDS;
            u64::try_from(its.as_micros()).unwrap_or(u64::MAX)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn counts_from_its_epoch() {
            // 2020-01-01 00:00:00 UTC
            let since_epoch = 1_577_836_800 - ITS_EPOCH.as_secs();
            assert!(SystemRuntime.now() > since_epoch * 1_000_000);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_on_trigger_only() {
        let runtime = ManualRuntime::new(1_000);
        assert_eq!(runtime.now(), 1_000);
        runtime.trigger(500);
        assert_eq!(runtime.now(), 1_500);
        runtime.reset(42);
        assert_eq!(runtime.now(), 42);
        runtime.trigger(u64::MAX);
        assert_eq!(runtime.now(), u64::MAX);
    }
}
