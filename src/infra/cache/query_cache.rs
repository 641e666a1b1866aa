use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use backoff::ExponentialBackoff;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::domain::model::{AppError, AppResult};
use crate::infra::cache::invalidation::MutationEvent;
use crate::infra::cache::scope::ScopeKey;

/// Transport-classified loader failures are retried at most this many
/// attempts in total; everything else surfaces immediately.
const MAX_LOAD_ATTEMPTS: u32 = 3;

const RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(20);

type JsonLoader = Arc<dyn Fn() -> BoxFuture<'static, AppResult<Value>> + Send + Sync>;

struct Entry {
    value: Value,
    stale: bool,
    loaded_at: Instant,
    loader: JsonLoader,
}

#[derive(Default)]
struct State {
    entries: HashMap<ScopeKey, Entry>,
    tombstones: Vec<ScopeKey>,
}

impl State {
    fn is_tombstoned(&self, key: &ScopeKey) -> bool {
        self.tombstones.iter().any(|prefix| key.starts_with(prefix))
    }
}

/// Keyed store of query results with dependency-aware invalidation.
/// Values are held as `serde_json::Value` together with the loader that
/// produced them, so an invalidation round can eagerly reload every
/// registered view. One instance per session; reset on sign-out.
pub struct QueryCache {
    state: Mutex<State>,
    /// Cosmetic only: lets a dialog-close transition land together with the
    /// refetch round. Correctness never depends on it.
    refetch_delay: Duration,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        Self::with_refetch_delay(Duration::ZERO)
    }

    pub fn with_refetch_delay(refetch_delay: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            refetch_delay,
        }
    }

    /// Return the cached value for `key` unless it is stale or missing, in
    /// which case the loader runs (with the bounded transport retry) and
    /// the result is stored together with the loader for later eager
    /// refetches. A failing loader propagates and leaves any previous
    /// entry exactly as it was.
    pub async fn fetch<T, F, Fut>(&self, key: ScopeKey, loader: F) -> AppResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        {
            let state = self.state.lock().await;
            if let Some(entry) = state.entries.get(&key) {
                if !entry.stale {
                    debug!(key = %key, age = ?entry.loaded_at.elapsed(), "cache hit");
                    return decode(entry.value.clone());
                }
            }
        }
        debug!(key = %key, "cache miss, loading");
        let json_loader = into_json_loader(loader);
        let value = load_with_retry(&json_loader).await?;
        self.store(key, value.clone(), json_loader).await;
        decode(value)
    }

    /// Mark every entry under `prefix` stale. Idempotent: repeating it
    /// changes nothing a reader could observe.
    pub async fn invalidate(&self, prefix: &ScopeKey) {
        let mut state = self.state.lock().await;
        let mut hit = 0usize;
        for (key, entry) in state.entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.stale = true;
                hit += 1;
            }
        }
        debug!(prefix = %prefix, entries = hit, "invalidated scope");
    }

    /// Invalidate all `prefixes`, then eagerly reload every registered
    /// entry they cover. Invalidation is fully applied before the first
    /// reload is issued, so a refetch can never observe its own
    /// pre-invalidation value; concurrent readers see the old snapshot or
    /// the new one, never a mix that a later read would contradict.
    pub async fn invalidate_and_refetch(&self, prefixes: &[ScopeKey]) -> AppResult<()> {
        let to_reload: Vec<(ScopeKey, JsonLoader)> = {
            let mut state = self.state.lock().await;
            let mut matched = Vec::new();
            for (key, entry) in state.entries.iter_mut() {
                if prefixes.iter().any(|p| key.starts_with(p)) {
                    entry.stale = true;
                    matched.push((key.clone(), entry.loader.clone()));
                }
            }
            matched
        };

        if !self.refetch_delay.is_zero() {
            tokio::time::sleep(self.refetch_delay).await;
        }

        let mut first_err = None;
        for (key, loader) in to_reload {
            match load_with_retry(&loader).await {
                Ok(value) => self.store(key, value, loader).await,
                Err(err) => {
                    // The entry stays stale; the next read reloads it.
                    error!(key = %key, error = %err, "refetch failed");
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply a mutation's invalidation plan: tombstone first so a racing
    /// response cannot revive a deleted entity, then the
    /// invalidate-then-refetch round.
    pub async fn apply(&self, event: &MutationEvent) -> AppResult<()> {
        let plan = event.plan();
        debug!(?event, scopes = plan.invalidate.len(), "applying mutation event");
        if let Some(prefix) = &plan.tombstone {
            self.mark_deleted(prefix).await;
        }
        self.invalidate_and_refetch(&plan.invalidate).await
    }

    /// Drop every entry under `prefix` and refuse future writes beneath
    /// it. Used for entity-detail prefixes once a delete has gone through.
    pub async fn mark_deleted(&self, prefix: &ScopeKey) {
        let mut state = self.state.lock().await;
        state.entries.retain(|key, _| !key.starts_with(prefix));
        if !state.tombstones.contains(prefix) {
            state.tombstones.push(prefix.clone());
        }
        debug!(prefix = %prefix, "tombstoned scope");
    }

    /// Full session reset (sign-out).
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.entries.clear();
        state.tombstones.clear();
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// `None` when the key was never registered.
    pub async fn is_stale(&self, key: &ScopeKey) -> Option<bool> {
        self.state.lock().await.entries.get(key).map(|e| e.stale)
    }

    async fn store(&self, key: ScopeKey, value: Value, loader: JsonLoader) {
        let mut state = self.state.lock().await;
        if state.is_tombstoned(&key) {
            warn!(key = %key, "discarding cache write under tombstone");
            return;
        }
        state.entries.insert(
            key,
            Entry {
                value,
                stale: false,
                loaded_at: Instant::now(),
                loader,
            },
        );
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(AppError::from)
}

fn into_json_loader<T, F, Fut>(loader: F) -> JsonLoader
where
    T: Serialize + DeserializeOwned,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<T>> + Send + 'static,
{
    Arc::new(move || {
        let fut = loader();
        async move {
            let value = fut.await?;
            serde_json::to_value(value).map_err(AppError::from)
        }
        .boxed()
    })
}

async fn load_with_retry(loader: &JsonLoader) -> AppResult<Value> {
    let mut attempts = 0u32;
    let policy = ExponentialBackoff {
        initial_interval: RETRY_INITIAL_INTERVAL,
        max_elapsed_time: None,
        ..ExponentialBackoff::default()
    };
    backoff::future::retry(policy, || {
        attempts += 1;
        let attempt = attempts;
        let fut = loader();
        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(err) if err.is_retryable() && attempt < MAX_LOAD_ATTEMPTS => {
                    warn!(error = %err, attempt, "transport error, retrying load");
                    Err(backoff::Error::transient(err))
                }
                Err(err) => Err(backoff::Error::permanent(err)),
            }
        }
    })
    .await
}
