use async_trait::async_trait;

use crate::errors::AppError;

/// Upper bound on compare-and-swap retries before a write is abandoned.
pub const MAX_CAS_RETRIES: usize = 16;

/// Keyed state behind the verification and rate-limit gates.
///
/// Implementations must make `compare_and_swap` atomic per key; that is the
/// only coordination the gate logic relies on.
#[async_trait]
pub trait KeyValueStore<V>: Send + Sync
where
    V: Clone + PartialEq + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>, AppError>;

    async fn set(&self, key: &str, value: V) -> Result<(), AppError>;

    /// Removes the key, returning the previous value.
    async fn delete(&self, key: &str) -> Result<Option<V>, AppError>;

    /// Writes `new` only if the current value equals `expected`.
    /// `None` as `expected` means the key must be absent; `None` as `new` deletes it.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&V>,
        new: Option<V>,
    ) -> Result<bool, AppError>;

    /// Removes every value matching `predicate`, returning how many were dropped.
    async fn purge(&self, predicate: &(dyn for<'a> Fn(&'a V) -> bool + Send + Sync)) -> Result<usize, AppError>;

    async fn count(&self) -> Result<usize, AppError>;
}

/// What a read-modify-write step wants done with the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<V> {
    Keep,
    Put(V),
    Remove,
}

/// Runs `decide` against the current value and applies its mutation with CAS,
/// re-reading and retrying when another writer got there first.
pub async fn modify<V, S, F, R>(store: &S, key: &str, mut decide: F) -> Result<R, AppError>
where
    V: Clone + PartialEq + Send + Sync + 'static,
    S: KeyValueStore<V> + ?Sized,
    F: FnMut(Option<&V>) -> (Mutation<V>, R),
{
    for _ in 0..MAX_CAS_RETRIES {
        let current = store.get(key).await?;
        let (mutation, outcome) = decide(current.as_ref());

        let applied = match mutation {
            Mutation::Keep => true,
            Mutation::Put(next) => store.compare_and_swap(key, current.as_ref(), Some(next)).await?,
            Mutation::Remove => store.compare_and_swap(key, current.as_ref(), None).await?,
        };

        if applied {
            return Ok(outcome);
        }

        tracing::debug!(key, "compare-and-swap lost a race, retrying");
    }

    Err(AppError::InternalError(format!(
        "gave up updating {} after {} conflicting writes",
        key, MAX_CAS_RETRIES
    )))
}
