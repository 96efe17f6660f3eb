//! Shared session state.
//!
//! [`Session`] owns the two observable values every store agrees on: the
//! bearer token and the current user's profile. Both are published through
//! `tokio::sync::watch` so front ends can react to changes, and both are
//! written through to durable storage.
//!
//! Consumers get read-only access. Mutation is reserved to the stores in
//! this crate and to the transport, which ends the session on a rejected
//! authenticated call. Stores holding per-user data register an end hook so
//! every way of ending the session drops that data.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use order_portal_core::Profile;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::profile;
use crate::storage::{self, Storage, keys};

type EndHook = Arc<dyn Fn() + Send + Sync>;

/// Token and profile, observable and durable.
pub struct Session {
    storage: Arc<dyn Storage>,
    token: watch::Sender<Option<SecretString>>,
    profile: watch::Sender<Option<Profile>>,
    end_hooks: Mutex<Vec<EndHook>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field(
                "profile",
                &self.profile.borrow().as_ref().map(|p| p.username.clone()),
            )
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Restore a session from durable storage.
    ///
    /// A stored profile that no longer parses is discarded without notice.
    #[must_use]
    pub fn restore(storage: Arc<dyn Storage>) -> Self {
        let token = storage
            .get(keys::TOKEN)
            .filter(|t| !t.is_empty())
            .map(SecretString::from);
        let profile = profile::restore(storage.as_ref());
        debug!(
            authenticated = token.is_some(),
            has_profile = profile.is_some(),
            "Session restored"
        );

        Self {
            storage,
            token: watch::Sender::new(token),
            profile: watch::Sender::new(profile),
            end_hooks: Mutex::new(Vec::new()),
        }
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.token.borrow().clone()
    }

    /// Whether a token is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.borrow().is_some()
    }

    /// Watch the token.
    #[must_use]
    pub fn subscribe_token(&self) -> watch::Receiver<Option<SecretString>> {
        self.token.subscribe()
    }

    /// Current profile.
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        self.profile.borrow().clone()
    }

    /// Watch the profile.
    #[must_use]
    pub fn subscribe_profile(&self) -> watch::Receiver<Option<Profile>> {
        self.profile.subscribe()
    }

    pub(crate) fn set_token(&self, token: SecretString) {
        if let Err(e) = self.storage.set(keys::TOKEN, token.expose_secret()) {
            warn!(error = %e, "Failed to persist token");
        }
        self.token.send_replace(Some(token));
    }

    pub(crate) fn set_profile(&self, profile: Profile) {
        storage::persist_json(self.storage.as_ref(), keys::PROFILE, &profile);
        self.profile.send_replace(Some(profile));
    }

    pub(crate) fn clear_profile(&self) {
        storage::forget(self.storage.as_ref(), keys::PROFILE);
        self.profile.send_replace(None);
    }

    /// Run `hook` every time the session ends.
    pub(crate) fn on_end(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.end_hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(hook));
    }

    /// Drop the token and the profile, in memory and on disk, then run the
    /// end hooks.
    pub(crate) fn end(&self) {
        storage::forget(self.storage.as_ref(), keys::TOKEN);
        self.token.send_replace(None);
        self.clear_profile();

        let hooks = self
            .end_hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for hook in hooks {
            hook();
        }
        info!("Session ended");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn profile(username: &str) -> Profile {
        Profile {
            username: username.to_owned(),
            ..Profile::default()
        }
    }

    #[test]
    fn test_restore_empty() {
        let session = Session::restore(Arc::new(MemoryStorage::new()));
        assert!(!session.is_authenticated());
        assert!(session.profile().is_none());
    }

    #[test]
    fn test_restore_token_and_profile() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::TOKEN, "abc").unwrap();
        storage
            .set(keys::PROFILE, r#"{"username":"buyer","address":"101000, Москва"}"#)
            .unwrap();

        let session = Session::restore(storage);
        assert_eq!(session.token().unwrap().expose_secret(), "abc");
        let restored = session.profile().unwrap();
        assert_eq!(restored.username, "buyer");
        assert_eq!(restored.address_parts.region, "Москва");
    }

    #[test]
    fn test_corrupt_profile_is_discarded() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::PROFILE, "{oops").unwrap();

        let session = Session::restore(storage.clone());
        assert!(session.profile().is_none());
        assert!(storage.get(keys::PROFILE).is_none());
    }

    #[test]
    fn test_set_token_persists_and_notifies() {
        let storage = Arc::new(MemoryStorage::new());
        let session = Session::restore(storage.clone());
        let mut rx = session.subscribe_token();

        session.set_token(SecretString::from("t1"));

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().expose_secret(), "t1");
        assert_eq!(storage.get(keys::TOKEN).as_deref(), Some("t1"));
    }

    #[test]
    fn test_end_clears_everything() {
        let storage = Arc::new(MemoryStorage::new());
        let session = Session::restore(storage.clone());
        session.set_token(SecretString::from("t1"));
        session.set_profile(profile("buyer"));

        session.end();
        session.end();

        assert!(!session.is_authenticated());
        assert!(session.profile().is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_end_runs_hooks_every_time() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let session = Session::restore(Arc::new(MemoryStorage::new()));
        let ended = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ended);
        session.on_end(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        session.end();
        session.end();

        assert_eq!(ended.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::restore(Arc::new(MemoryStorage::new()));
        session.set_token(SecretString::from("super-secret"));
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("authenticated: true"));
    }
}
