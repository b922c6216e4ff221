//! Time source abstraction.

use chrono::{DateTime, Utc};

/// Supplies "now" for age computation.
///
/// Injected into the sweeper so tests can drive sweeps with a fixed clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time source used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
