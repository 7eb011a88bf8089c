// ABOUTME: Creation timestamps for posts and comments.
// ABOUTME: Truncates to microseconds so persisted and in-memory values compare equal.

use chrono::{DateTime, SubsecRound, Utc};

/// Current UTC time at microsecond precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
