//! Per-account brute-force protection.
//!
//! Failures are counted per account. The 4th failure locks the account for
//! one minute, the 6th for five, and every failure from the 8th on for
//! fifteen. A successful login resets the counter.

use time::{Duration, OffsetDateTime};

pub const FIRST_LOCKOUT_AT: i32 = 4;
pub const SECOND_LOCKOUT_AT: i32 = 6;
pub const LONG_LOCKOUT_FROM: i32 = 8;

pub const FIRST_LOCKOUT: Duration = Duration::minutes(1);
pub const SECOND_LOCKOUT: Duration = Duration::minutes(5);
pub const LONG_LOCKOUT: Duration = Duration::minutes(15);

/// Counter fields stored on the account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoginAttempts {
    pub attempts: i32,
    pub lockout_until: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unlocked,
    Accumulating { attempts: i32 },
    Locked { until: OffsetDateTime },
}

impl LoginState {
    pub fn of(record: &LoginAttempts, now: OffsetDateTime) -> Self {
        match record.lockout_until {
            Some(until) if until > now => LoginState::Locked { until },
            _ if record.attempts > 0 => LoginState::Accumulating {
                attempts: record.attempts,
            },
            _ => LoginState::Unlocked,
        }
    }
}

/// Lockout triggered by reaching `attempts` failures, if any.
pub fn lockout_for(attempts: i32) -> Option<Duration> {
    match attempts {
        a if a >= LONG_LOCKOUT_FROM => Some(LONG_LOCKOUT),
        SECOND_LOCKOUT_AT => Some(SECOND_LOCKOUT),
        FIRST_LOCKOUT_AT => Some(FIRST_LOCKOUT),
        _ => None,
    }
}

/// Failures left before the next lockout threshold is reached.
pub fn attempts_before_lockout(attempts: i32) -> i32 {
    [FIRST_LOCKOUT_AT, SECOND_LOCKOUT_AT, LONG_LOCKOUT_FROM]
        .into_iter()
        .find(|threshold| attempts < *threshold)
        .map(|threshold| threshold - attempts)
        .unwrap_or(1)
}

/// Whole minutes until `until`, rounded up. `None` once it has passed.
pub fn remaining_minutes(until: OffsetDateTime, now: OffsetDateTime) -> Option<i64> {
    let remaining_ms = (until - now).whole_milliseconds();
    if remaining_ms <= 0 {
        return None;
    }
    Some(((remaining_ms + 59_999) / 60_000) as i64)
}

/// Counter after one more failure at `now`. `PgLoginAttemptStore` applies
/// the same transition as a single atomic `UPDATE`; this is the model its
/// tests compare against.
#[cfg(test)]
pub fn apply_failure(record: LoginAttempts, now: OffsetDateTime) -> LoginAttempts {
    let attempts = record.attempts + 1;
    LoginAttempts {
        attempts,
        lockout_until: lockout_for(attempts)
            .map(|d| now + d)
            .or(record.lockout_until),
    }
}
