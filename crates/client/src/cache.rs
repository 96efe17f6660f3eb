//! Single-flight reference-data cache.
//!
//! A [`ReferenceCache`] holds at most one value and at most one in-flight
//! load. Callers that arrive while a load is running await the same shared
//! future instead of issuing their own request, and all of them see the same
//! success or the same failure.
//!
//! Failures are never cached. [`ReferenceCache::invalidate`] drops both the
//! value and the in-flight load; a load that finishes after an invalidation
//! still answers its waiters but leaves the cache untouched.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::debug;

use crate::error::{ApiError, Result};

type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;
type SharedLoad<T> = Shared<BoxFuture<'static, std::result::Result<Arc<T>, Arc<ApiError>>>>;

struct State<T> {
    value: Option<Arc<T>>,
    pending: Option<(u64, SharedLoad<T>)>,
    generation: u64,
}

/// Caches the result of an async loader and collapses concurrent loads.
pub struct ReferenceCache<T> {
    name: &'static str,
    loader: Loader<T>,
    state: Mutex<State<T>>,
}

impl<T> fmt::Debug for ReferenceCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ReferenceCache")
            .field("name", &self.name)
            .field("cached", &state.value.is_some())
            .field("pending", &state.pending.is_some())
            .finish()
    }
}

impl<T> ReferenceCache<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Send + Sync + 'static> ReferenceCache<T> {
    /// Empty cache named `name` (used in logs) that loads with `loader`.
    #[must_use]
    pub fn new<F, Fut>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            name,
            loader: Arc::new(move || loader().boxed()),
            state: Mutex::new(State {
                value: None,
                pending: None,
                generation: 0,
            }),
        }
    }

    /// Seed the cache with a value, e.g. one restored from storage.
    #[must_use]
    pub fn with_value(self, value: T) -> Self {
        self.lock().value = Some(Arc::new(value));
        self
    }

    /// The cached value, without loading.
    #[must_use]
    pub fn peek(&self) -> Option<Arc<T>> {
        self.lock().value.clone()
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// The cached value, loading it if necessary.
    ///
    /// # Errors
    ///
    /// Returns the loader's error as `ApiError::Shared`; every caller that
    /// joined the same load gets the same error.
    pub async fn get(&self) -> Result<Arc<T>> {
        let (generation, load) = {
            let mut state = self.lock();
            if let Some(value) = &state.value {
                return Ok(Arc::clone(value));
            }
            if let Some((generation, load)) = &state.pending {
                debug!(cache = self.name, "Joining in-flight load");
                (*generation, load.clone())
            } else {
                state.generation += 1;
                let load = (self.loader)()
                    .map(|outcome| outcome.map(Arc::new).map_err(Arc::new))
                    .boxed()
                    .shared();
                state.pending = Some((state.generation, load.clone()));
                debug!(cache = self.name, "Starting load");
                (state.generation, load)
            }
        };

        let outcome = load.await;

        {
            let mut state = self.lock();
            if state
                .pending
                .as_ref()
                .is_some_and(|(pending, _)| *pending == generation)
            {
                state.pending = None;
                if let Ok(value) = &outcome {
                    state.value = Some(Arc::clone(value));
                }
            }
        }

        outcome.map_err(ApiError::Shared)
    }

    /// Drop the cached value and any in-flight load.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.value = None;
        state.pending = None;
        state.generation += 1;
        debug!(cache = self.name, "Invalidated");
    }
}
