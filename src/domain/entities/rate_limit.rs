use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// How a client identifier is composed from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientKeyMode {
    #[default]
    Ip,
    IpUserAgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: u32,
    /// When set, exceeding the window promotes the key to a block of this length.
    pub block_for: Option<Duration>,
    pub key_mode: ClientKeyMode,
}

/// Fixed-window counter for one client identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub window_start: DateTime<Utc>,
    pub blocked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admitted { remaining: u32 },
    Limited { retry_after: Duration },
    Blocked { until: DateTime<Utc>, retry_after: Duration },
}

impl RateLimitEntry {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        RateLimitEntry {
            count: 0,
            window_start: now,
            blocked_until: None,
        }
    }

    /// Decides whether one more request is admitted and returns the entry to store.
    ///
    /// Expired blocks and elapsed windows are cleared here, on access, so no
    /// timer ever has to touch the map.
    pub fn evaluate(
        current: Option<&RateLimitEntry>,
        now: DateTime<Utc>,
        policy: &RateLimitPolicy,
    ) -> (RateLimitEntry, RateDecision) {
        let mut entry = match current {
            Some(existing) => match existing.blocked_until {
                Some(until) if now < until => {
                    return (
                        existing.clone(),
                        RateDecision::Blocked {
                            until,
                            retry_after: until - now,
                        },
                    );
                }
                Some(_) => RateLimitEntry::fresh(now),
                None if now - existing.window_start >= policy.window => RateLimitEntry::fresh(now),
                None => existing.clone(),
            },
            None => RateLimitEntry::fresh(now),
        };

        if entry.count < policy.max_requests {
            entry.count += 1;
            let remaining = policy.max_requests - entry.count;
            return (entry, RateDecision::Admitted { remaining });
        }

        match policy.block_for {
            Some(block_for) => {
                let until = now + block_for;
                entry.blocked_until = Some(until);
                (
                    entry,
                    RateDecision::Blocked {
                        until,
                        retry_after: block_for,
                    },
                )
            }
            None => {
                let retry_after = entry.window_start + policy.window - now;
                (entry, RateDecision::Limited { retry_after })
            }
        }
    }

    /// True once the entry carries no information worth keeping.
    pub fn is_stale(&self, now: DateTime<Utc>, policy: &RateLimitPolicy) -> bool {
        let block_over = self.blocked_until.is_none_or(|until| now >= until);
        block_over && now - self.window_start >= policy.window
    }
}

impl RateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateDecision::Admitted { .. })
    }

    /// Denials become the 429 error returned to the client.
    pub fn into_error(self) -> Option<AppError> {
        match self {
            RateDecision::Admitted { .. } => None,
            RateDecision::Limited { retry_after } => Some(AppError::RateExceeded {
                retry_after_secs: Some(ceil_secs(retry_after)),
                blocked_until: None,
            }),
            RateDecision::Blocked { until, retry_after } => Some(AppError::RateExceeded {
                retry_after_secs: Some(ceil_secs(retry_after)),
                blocked_until: Some(until),
            }),
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let millis = duration.num_milliseconds().max(0) as u64;
    millis.div_ceil(1000).max(1)
}
