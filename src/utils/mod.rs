//! Project-specific utilities live here.

use time::{Duration, OffsetDateTime};

/// Milliseconds since the Unix epoch.
pub fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Epoch milliseconds `minutes` before `now`.
pub fn millis_ago(now: OffsetDateTime, minutes: i64) -> i64 {
    epoch_millis(now - Duration::minutes(minutes))
}
