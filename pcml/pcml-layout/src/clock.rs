//! Process-wide logical clock ordering value updates.

use std::sync::atomic::{AtomicI64, Ordering};

/// Timestamp of values that never change (literal counts, `init` values).
pub(crate) const NEVER: i64 = i64::MIN;

static CLOCK: AtomicI64 = AtomicI64::new(0);

/// Next timestamp; strictly greater than every earlier one.
pub(crate) fn tick() -> i64 {
    CLOCK.fetch_add(1, Ordering::Relaxed) + 1
}
