//! Materials, per manufacturing process and as one combined catalogue.
//!
//! Every process gets its own [`ReferenceCache`], kept in a `moka` map, so
//! concurrent loads for the same process collapse into one request. When a
//! load fails the process's built-in fallback list is returned instead and
//! nothing is cached, so the next call tries the backend again.
//!
//! Materials are fetched with the user's token. The store drops every list,
//! in-flight loads included, whenever the session ends.

use std::sync::{Arc, Weak};

use futures::future::join_all;
use moka::future::Cache;
use order_portal_core::{ManufacturingProcess, RawMaterials, ReferenceOption, dedup_by_value};
use tracing::{debug, info, warn};

use crate::cache::ReferenceCache;
use crate::error::{ApiError, Result};
use crate::storage::{self, Storage, keys};
use crate::transport::{ApiRequest, Transport};

const MATERIALS_ENDPOINT: &str = "/materials";

type Materials = Arc<Vec<ReferenceOption>>;
type ProcessCache = Arc<ReferenceCache<Vec<ReferenceOption>>>;

/// Per-process caches shared by the store and the catalogue loader.
#[derive(Clone)]
struct ProcessLoader {
    transport: Transport,
    by_process: Cache<ManufacturingProcess, ProcessCache>,
}

impl ProcessLoader {
    async fn cache_for(&self, process: &ManufacturingProcess) -> ProcessCache {
        let transport = self.transport.clone();
        let endpoint = format!(
            "{MATERIALS_ENDPOINT}?process={}",
            urlencoding::encode(process.as_str())
        );

        self.by_process
            .get_with(process.clone(), async move {
                Arc::new(ReferenceCache::new("materials", move || {
                    let transport = transport.clone();
                    let request = ApiRequest::get(endpoint.clone()).authenticated();
                    async move {
                        let raw: RawMaterials = transport.fetch_json(&request).await?;
                        Ok(Vec::<ReferenceOption>::from(raw))
                    }
                }))
            })
            .await
    }

    async fn try_load(&self, process: &ManufacturingProcess) -> Result<Materials> {
        self.cache_for(process).await.get().await
    }

    async fn load(&self, process: &ManufacturingProcess) -> Materials {
        match self.try_load(process).await {
            Ok(materials) => {
                debug!(process = %process, count = materials.len(), "Materials loaded");
                materials
            }
            Err(e) => {
                warn!(process = %process, error = %e, "Using fallback materials");
                Arc::new(process.fallback_materials())
            }
        }
    }

    fn invalidate(&self) {
        for (_, cache) in &self.by_process {
            cache.invalidate();
        }
        self.by_process.invalidate_all();
    }
}

struct Inner {
    loader: ProcessLoader,
    catalogue: ReferenceCache<Vec<ReferenceOption>>,
    storage: Arc<dyn Storage>,
}

impl Inner {
    fn invalidate(&self) {
        self.loader.invalidate();
        self.catalogue.invalidate();
    }
}

/// Material option lists.
#[derive(Clone)]
pub struct MaterialsStore {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for MaterialsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialsStore")
            .field("processes_cached", &self.inner.loader.by_process.entry_count())
            .field("catalogue", &self.inner.catalogue)
            .finish_non_exhaustive()
    }
}

impl MaterialsStore {
    /// Build the store, adopting a stored non-empty catalogue.
    ///
    /// The store registers itself with the transport's session so that
    /// ending the session, by logout or by a rejected token, drops every
    /// cached list.
    #[must_use]
    pub fn new(transport: Transport, storage: Arc<dyn Storage>) -> Self {
        let session = Arc::clone(transport.session());
        let loader = ProcessLoader {
            transport,
            by_process: Cache::new(32),
        };

        let catalogue_loader = loader.clone();
        let catalogue_storage = Arc::clone(&storage);
        let catalogue = ReferenceCache::new("materials", move || {
            let loader = catalogue_loader.clone();
            let storage = Arc::clone(&catalogue_storage);
            async move {
                let sets = join_all(
                    ManufacturingProcess::CATALOGUE
                        .iter()
                        .map(|process| loader.load(process)),
                )
                .await;
                let combined = dedup_by_value(
                    sets.iter()
                        .flat_map(|set| set.iter().cloned())
                        .collect(),
                );
                if combined.is_empty() {
                    return Err(ApiError::EmptyReference("materials"));
                }

                info!(count = combined.len(), "Materials catalogue loaded");
                storage::persist_json(storage.as_ref(), keys::MATERIALS, &combined);
                Ok(combined)
            }
        });

        let catalogue = match storage::load_json::<Vec<ReferenceOption>>(
            storage.as_ref(),
            keys::MATERIALS,
        ) {
            Some(Ok(stored)) if !stored.is_empty() => {
                debug!(count = stored.len(), "Using stored materials catalogue");
                catalogue.with_value(stored)
            }
            _ => catalogue,
        };

        let inner = Arc::new(Inner {
            loader,
            catalogue,
            storage,
        });

        let on_end: Weak<Inner> = Arc::downgrade(&inner);
        session.on_end(move || {
            if let Some(inner) = on_end.upgrade() {
                inner.invalidate();
            }
        });

        Self { inner }
    }

    /// Materials for one process; the built-in fallback when the backend
    /// cannot provide them.
    pub async fn for_process(&self, process: &ManufacturingProcess) -> Materials {
        self.inner.loader.load(process).await
    }

    /// Materials for one process, without the fallback.
    ///
    /// # Errors
    ///
    /// Returns the shared load error.
    pub async fn try_for_process(&self, process: &ManufacturingProcess) -> Result<Materials> {
        self.inner.loader.try_load(process).await
    }

    /// Every catalogue process's materials, de-duplicated by value.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::EmptyReference` (shared) if nothing was found.
    pub async fn all(&self) -> Result<Materials> {
        self.inner.catalogue.get().await
    }

    /// Cached catalogue, without loading.
    #[must_use]
    pub fn cached(&self) -> Option<Materials> {
        self.inner.catalogue.peek()
    }

    /// Drop every in-memory list and abandon in-flight loads.
    pub fn invalidate(&self) {
        self.inner.invalidate();
    }

    /// Drop every in-memory list and the stored catalogue.
    pub fn purge(&self) {
        self.invalidate();
        storage::forget(self.inner.storage.as_ref(), keys::MATERIALS);
    }
}
