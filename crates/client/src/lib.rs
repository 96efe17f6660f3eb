//! Order Portal Client - data access for the manufacturing order portal.
//!
//! Talks to the portal's REST backend and keeps the state a front end needs
//! between calls:
//!
//! - [`transport`] - base URL, body encoding, bearer auth, retry with
//!   backoff and failure classification
//! - [`session`] / [`auth`] - token lifecycle (login, registration, logout)
//! - [`profile`] - current user's profile with derived address and name parts
//! - [`coefficients`] / [`materials`] - single-flight reference-data caches
//!   backed by durable storage
//! - [`files`] - CAD model and document uploads
//!
//! [`PortalClient`] wires them together. Front ends observe state through
//! `tokio::sync::watch` receivers and plug in a [`Notifier`] and a
//! [`Navigator`] for user-facing side effects.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cache;
pub mod coefficients;
pub mod config;
pub mod error;
pub mod files;
pub mod materials;
pub mod notify;
pub mod portal;
pub mod profile;
pub mod retry;
pub mod session;
pub mod storage;
pub mod transport;

pub use auth::{AuthStore, Credentials, Registration};
pub use cache::ReferenceCache;
pub use coefficients::CoefficientsStore;
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use files::{FilesApi, UploadedDocument, UploadedFile};
pub use materials::MaterialsStore;
pub use notify::{Navigator, Notice, NoticeLevel, Notifier, status_message};
pub use portal::{PortalClient, PortalClientBuilder};
pub use profile::ProfileStore;
pub use retry::{RetryPolicy, Sleeper, retry};
pub use session::Session;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use transport::{ApiRequest, ApiResponse, Auth, Transport};
