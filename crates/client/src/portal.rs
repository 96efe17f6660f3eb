//! One object wiring every store to a shared session and transport.

use std::sync::Arc;

use tracing::info;

use crate::auth::AuthStore;
use crate::coefficients::CoefficientsStore;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::files::FilesApi;
use crate::materials::MaterialsStore;
use crate::notify::{Navigator, Notifier};
use crate::profile::ProfileStore;
use crate::retry::Sleeper;
use crate::session::Session;
use crate::storage::Storage;
use crate::transport::{Transport, TransportBuilder};

/// The portal client.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use order_portal_client::{ClientConfig, Credentials, FileStorage, PortalClient};
///
/// let config = ClientConfig::from_env()?;
/// let storage = Arc::new(FileStorage::open(&config.storage_path)?);
/// let client = PortalClient::builder(config, storage).build()?;
///
/// client.auth().login(&Credentials::new("buyer", "secret")).await?;
/// let coefficients = client.coefficients().get().await?;
/// ```
#[derive(Debug)]
pub struct PortalClient {
    session: Arc<Session>,
    transport: Transport,
    auth: AuthStore,
    profile: ProfileStore,
    coefficients: CoefficientsStore,
    materials: MaterialsStore,
    files: FilesApi,
}

/// Builder for [`PortalClient`].
pub struct PortalClientBuilder {
    storage: Arc<dyn Storage>,
    transport: TransportBuilder,
}

impl PortalClientBuilder {
    /// Where user-facing notices go (default: `tracing`).
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.transport = self.transport.notifier(notifier);
        self
    }

    /// What handles "go home" after a forced logout (default: `tracing`).
    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.transport = self.transport.navigator(navigator);
        self
    }

    /// How backoff delays elapse (default: tokio timer).
    #[must_use]
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.transport = self.transport.sleeper(sleeper);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be initialized.
    pub fn build(self) -> Result<PortalClient> {
        let transport = self.transport.build()?;
        let session = Arc::clone(transport.session());
        let profile = ProfileStore::new(transport.clone());

        Ok(PortalClient {
            auth: AuthStore::new(transport.clone(), profile.clone()),
            coefficients: CoefficientsStore::new(transport.clone(), Arc::clone(&self.storage)),
            materials: MaterialsStore::new(transport.clone(), self.storage),
            files: FilesApi::new(transport.clone()),
            profile,
            session,
            transport,
        })
    }
}

impl PortalClient {
    /// Start building a client. The session is restored from `storage`.
    #[must_use]
    pub fn builder(config: ClientConfig, storage: Arc<dyn Storage>) -> PortalClientBuilder {
        let session = Arc::new(Session::restore(Arc::clone(&storage)));
        PortalClientBuilder {
            transport: Transport::builder(config, session),
            storage,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[must_use]
    pub const fn transport(&self) -> &Transport {
        &self.transport
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthStore {
        &self.auth
    }

    #[must_use]
    pub const fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    #[must_use]
    pub const fn coefficients(&self) -> &CoefficientsStore {
        &self.coefficients
    }

    #[must_use]
    pub const fn materials(&self) -> &MaterialsStore {
        &self.materials
    }

    #[must_use]
    pub const fn files(&self) -> &FilesApi {
        &self.files
    }

    /// End the session. Per-user materials are dropped by the session's
    /// end hook.
    pub fn logout(&self) {
        self.auth.logout();
        info!("Logged out");
    }
}
