//! Retry policy with capped exponential backoff.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::queue::QueueRecord;

// One year; keeps chrono arithmetic in range for absurd configs.
const DELAY_CLAMP_SECS: i64 = 365 * 24 * 60 * 60;

/// When a failed record may be submitted again, and when to give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Failed attempts after which a record is no longer submitted
    pub max_attempts: u32,
    /// Delay after the first failure, in seconds
    pub base_delay_secs: u64,
    /// Upper bound for the delay, in seconds
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 5,
            max_delay_secs: 300,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempts` failures.
    ///
    /// Zero failures means no delay; after that the delay doubles from
    /// `base_delay_secs` up to `max_delay_secs`.
    #[must_use]
    pub fn delay_for(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::zero();
        }

        let exponent = (attempts - 1).min(32);
        let secs = self
            .base_delay_secs
            .saturating_mul(1_u64 << exponent)
            .min(self.max_delay_secs);

        Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX).min(DELAY_CLAMP_SECS))
    }

    /// Whether a record has used up its attempts.
    #[must_use]
    pub const fn is_exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }

    /// Earliest time the record may be submitted again. `None` means now.
    #[must_use]
    pub fn next_attempt_at(&self, record: &QueueRecord) -> Option<DateTime<Utc>> {
        record
            .last_attempt
            .map(|last| last + self.delay_for(record.attempts))
    }

    /// Whether the record's backoff has elapsed at `now`.
    #[must_use]
    pub fn is_due(&self, record: &QueueRecord, now: DateTime<Utc>) -> bool {
        self.next_attempt_at(record).map_or(true, |at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{QueueName, SyncState};

    fn record(attempts: u32, last_attempt: Option<DateTime<Utc>>) -> QueueRecord {
        QueueRecord {
            id: 1,
            queue: QueueName::Sales,
            payload: serde_json::json!({}),
            state: SyncState::Pending,
            created_at: Utc::now(),
            entry_date: None,
            attempts,
            last_attempt,
            last_error: None,
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(0), Duration::zero());
        assert_eq!(policy.delay_for(1), Duration::seconds(5));
        assert_eq!(policy.delay_for(2), Duration::seconds(10));
        assert_eq!(policy.delay_for(5), Duration::seconds(80));
        assert_eq!(policy.delay_for(7), Duration::seconds(300));
        assert_eq!(policy.delay_for(u32::MAX), Duration::seconds(300));
    }

    #[test]
    fn test_huge_config_does_not_overflow() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_secs: u64::MAX,
            max_delay_secs: u64::MAX,
        };
        assert_eq!(policy.delay_for(40), Duration::seconds(DELAY_CLAMP_SECS));
    }

    #[test]
    fn test_exhausted() {
        let policy = RetryPolicy::default();
        assert!(!policy.is_exhausted(4));
        assert!(policy.is_exhausted(5));
    }

    #[test]
    fn test_is_due() {
        let policy = RetryPolicy::default();
        let now = Utc::now();

        assert!(policy.is_due(&record(0, None), now));

        let failed = record(1, Some(now));
        assert!(!policy.is_due(&failed, now + Duration::seconds(4)));
        assert!(policy.is_due(&failed, now + Duration::seconds(5)));
        assert_eq!(policy.next_attempt_at(&failed), Some(now + Duration::seconds(5)));
    }
}
