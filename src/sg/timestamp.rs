use std::sync::atomic::{AtomicU64, Ordering};

static GLOBAL_CLOCK: AtomicU64 = AtomicU64::new(1);

/// Process-wide monotonically increasing modification stamp
///
/// Stamps are only compared against each other; zero means "never".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeStamp(u64);

impl TimeStamp {
    /// Takes the next stamp from the global clock
    pub fn now() -> Self {
        TimeStamp(GLOBAL_CLOCK.fetch_add(1, Ordering::Relaxed))
    }

    /// The stamp that precedes every issued stamp
    pub const fn never() -> Self {
        TimeStamp(0)
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Self {
        TimeStamp(raw)
    }
}
