//! Machining coefficients: finish, cover and tolerance options.

use std::sync::Arc;

use order_portal_core::{Coefficients, RawCoefficients};
use tracing::{debug, info};

use crate::cache::ReferenceCache;
use crate::error::Result;
use crate::storage::{self, Storage, keys};
use crate::transport::{ApiRequest, Transport};

const COEFFICIENTS_ENDPOINT: &str = "/coefficients";

/// Coefficient lists, cached in memory and in durable storage.
pub struct CoefficientsStore {
    cache: ReferenceCache<Coefficients>,
    storage: Arc<dyn Storage>,
}

impl std::fmt::Debug for CoefficientsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoefficientsStore")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl CoefficientsStore {
    /// Build the store, adopting a stored copy if any of its lists is
    /// non-empty.
    #[must_use]
    pub fn new(transport: Transport, storage: Arc<dyn Storage>) -> Self {
        let loader_storage = Arc::clone(&storage);
        let cache = ReferenceCache::new("coefficients", move || {
            let transport = transport.clone();
            let storage = Arc::clone(&loader_storage);
            async move {
                let raw: RawCoefficients = transport
                    .fetch_json(&ApiRequest::get(COEFFICIENTS_ENDPOINT))
                    .await?;
                let coefficients = Coefficients::from(raw);
                info!(
                    finish = coefficients.finish.len(),
                    cover = coefficients.cover.len(),
                    tolerance = coefficients.tolerance.len(),
                    "Coefficients loaded"
                );
                storage::persist_json(storage.as_ref(), keys::COEFFICIENTS, &coefficients);
                Ok(coefficients)
            }
        });

        let cache = match storage::load_json::<Coefficients>(storage.as_ref(), keys::COEFFICIENTS)
        {
            Some(Ok(stored)) if !stored.is_empty() => {
                debug!("Using stored coefficients");
                cache.with_value(stored)
            }
            _ => cache,
        };

        Self { cache, storage }
    }

    /// Coefficient lists, loading them on first use.
    ///
    /// # Errors
    ///
    /// Returns the shared load error; the next call retries.
    pub async fn get(&self) -> Result<Arc<Coefficients>> {
        self.cache.get().await
    }

    /// Cached lists, without loading.
    #[must_use]
    pub fn cached(&self) -> Option<Arc<Coefficients>> {
        self.cache.peek()
    }

    /// Drop the in-memory copy; the next `get` goes to the network.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// Drop both the in-memory and the stored copy.
    pub fn purge(&self) {
        self.cache.invalidate();
        storage::forget(self.storage.as_ref(), keys::COEFFICIENTS);
    }
}
