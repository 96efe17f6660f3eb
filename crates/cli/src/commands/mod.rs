//! Subcommand implementations.
//!
//! Results are reported through `tracing`; the client's notices go through
//! the same subscriber.

pub mod profile;
pub mod reference;
pub mod session;
pub mod upload;
pub mod version;

use order_portal_core::{EmailError, PhoneError};
use thiserror::Error;

/// Errors in command input, caught before anything is sent.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid phone: {0}")]
    Phone(#[from] PhoneError),

    #[error("Not logged in. Run `portal-cli login` first")]
    NotLoggedIn,

    #[error("Nothing to update")]
    NoChanges,
}
