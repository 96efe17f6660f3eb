//! Profile store.
//!
//! The profile lives in the shared [`Session`] so that ending the session
//! clears it too. This store adds the network side: fetching, updating and
//! restoring the durable copy on start.

use std::sync::Arc;

use order_portal_core::Profile;
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::notify::{Notice, messages};
use crate::session::Session;
use crate::storage::{self, Storage, keys};
use crate::transport::{ApiRequest, Transport};

const PROFILE_ENDPOINT: &str = "/profile";

/// Load the durable profile and re-derive its sub-fields.
///
/// A copy that no longer parses is removed without telling anyone.
pub(crate) fn restore(storage: &dyn Storage) -> Option<Profile> {
    match storage::load_json::<Profile>(storage, keys::PROFILE)? {
        Ok(profile) => Some(profile.with_derived_fields()),
        Err(e) => {
            debug!(error = %e, "Discarding unreadable stored profile");
            storage::forget(storage, keys::PROFILE);
            None
        }
    }
}

/// Fetches and updates the current user's profile.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    transport: Transport,
}

impl ProfileStore {
    #[must_use]
    pub const fn new(transport: Transport) -> Self {
        Self { transport }
    }

    fn session(&self) -> &Arc<Session> {
        self.transport.session()
    }

    /// Current profile, if one is loaded.
    #[must_use]
    pub fn current(&self) -> Option<Profile> {
        self.session().profile()
    }

    /// Watch the profile.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Profile>> {
        self.session().subscribe_profile()
    }

    /// Load the profile from the backend, derive its sub-fields, keep it and
    /// persist it.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; the held profile is unchanged then.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<Profile> {
        let profile: Profile = self
            .transport
            .fetch_json(&ApiRequest::get(PROFILE_ENDPOINT).authenticated())
            .await?;
        let profile = profile.with_derived_fields();

        debug!(username = %profile.username, "Profile fetched");
        self.session().set_profile(profile.clone());
        Ok(profile)
    }

    /// Send an edited profile.
    ///
    /// `full_name` is rebuilt from the name parts before sending. The
    /// backend's answer replaces the held profile and a success notice is
    /// shown.
    ///
    /// # Errors
    ///
    /// Propagates transport errors; the held profile is unchanged and no
    /// notice beyond the transport's own is shown.
    #[instrument(skip(self, profile), fields(username = %profile.username))]
    pub async fn update(&self, mut profile: Profile) -> Result<Profile> {
        profile.rebuild_full_name();

        let request = ApiRequest::put(PROFILE_ENDPOINT)
            .authenticated()
            .json(&profile)?;
        let updated: Profile = self.transport.fetch_json(&request).await?;
        let updated = updated.with_derived_fields();

        self.session().set_profile(updated.clone());
        self.transport.notify(Notice::success(messages::PROFILE_UPDATED));
        info!("Profile updated");
        Ok(updated)
    }

    /// Drop the profile from memory and storage.
    pub fn clear(&self) {
        self.session().clear_profile();
    }
}
