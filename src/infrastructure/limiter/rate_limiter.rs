use std::sync::Arc;

use crate::{
    entities::rate_limit::{RateDecision, RateLimitEntry, RateLimitPolicy},
    errors::AppError,
    repositories::store::{modify, KeyValueStore, Mutation},
    utils::clock::Clock,
};

/// Fixed-window limiter with optional temporary blocking, keyed by client identifier.
#[derive(Clone)]
pub struct RateLimiter<S>
where
    S: KeyValueStore<RateLimitEntry>,
{
    store: S,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl<S> RateLimiter<S>
where
    S: KeyValueStore<RateLimitEntry>,
{
    pub fn new(store: S, policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        RateLimiter { store, policy, clock }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Counts one request against `client_key` and reports whether it may proceed.
    pub async fn check(&self, client_key: &str) -> Result<RateDecision, AppError> {
        let now = self.clock.now();
        let policy = self.policy;

        modify(&self.store, client_key, |current| {
            let (next, decision) = RateLimitEntry::evaluate(current, now, &policy);
            let mutation = if current == Some(&next) {
                Mutation::Keep
            } else {
                Mutation::Put(next)
            };
            (mutation, decision)
        })
        .await
    }

    /// Drops entries whose window and block have both run out.
    pub async fn purge_stale(&self) -> Result<usize, AppError> {
        let now = self.clock.now();
        let policy = self.policy;
        self.store
            .purge(&move |entry: &RateLimitEntry| entry.is_stale(now, &policy))
            .await
    }
}
