//! Login, registration and logout.

use std::fmt;

use order_portal_core::{Email, Phone};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{ApiError, Result};
use crate::notify::{Notice, messages, status_message};
use crate::profile::ProfileStore;
use crate::transport::{ApiRequest, ApiResponse, Transport};

const LOGIN_ENDPOINT: &str = "/login";
const REGISTER_ENDPOINT: &str = "/register";

/// Phrases in a registration error that mean the username is taken.
const DUPLICATE_MARKERS: &[&str] = &["exist", "already", "уже существует"];

/// Username and password.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub credentials: Credentials,
    pub email: Option<Email>,
    pub phone: Option<Phone>,
}

impl Registration {
    #[must_use]
    pub const fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            email: None,
            phone: None,
        }
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Session lifecycle: anonymous ⇄ authenticated.
#[derive(Debug, Clone)]
pub struct AuthStore {
    transport: Transport,
    profile: ProfileStore,
}

impl AuthStore {
    #[must_use]
    pub const fn new(transport: Transport, profile: ProfileStore) -> Self {
        Self { transport, profile }
    }

    /// Current bearer token.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.transport.session().token()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.transport.session().is_authenticated()
    }

    /// Exchange credentials for a token, then load the profile.
    ///
    /// A failed profile load is logged and does not undo the login.
    ///
    /// # Errors
    ///
    /// Returns the transport's error (`Http`, `NoResponse`) or `Decode` if
    /// the answer carries no token. The session stays anonymous then.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let request = ApiRequest::post(LOGIN_ENDPOINT).form([
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
        ]);
        let response: TokenResponse = self.transport.fetch_json(&request).await?;

        self.transport
            .session()
            .set_token(SecretString::from(response.access_token));
        info!("Logged in");

        if let Err(e) = self.profile.fetch().await {
            warn!(error = %e, "Profile fetch after login failed");
        }
        Ok(())
    }

    /// Create an account and keep the returned token.
    ///
    /// The profile is not fetched.
    ///
    /// # Errors
    ///
    /// - `ApiError::DuplicateUser` on 409 or a "user exists" detail
    /// - `ApiError::Registration` with the backend detail otherwise
    /// - `ApiError::NoResponse` if the backend could not be reached
    #[instrument(skip(self, registration), fields(username = %registration.credentials.username))]
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        let body = RegisterBody {
            username: &registration.credentials.username,
            password: registration.credentials.password.expose_secret(),
            email: registration.email.as_ref().map(Email::as_str),
            phone: registration.phone.as_ref().map(Phone::as_str),
        };
        let request = ApiRequest::post(REGISTER_ENDPOINT).json(&body)?;

        let response = match self.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.transport.report_unreachable(&e);
                return Err(ApiError::NoResponse);
            }
        };

        if !response.is_success() {
            let error = registration_error(&response);
            warn!(status = response.status.as_u16(), error = %error, "Registration failed");
            self.transport.notify(Notice::error(error.to_string()));
            return Err(error);
        }

        let token: TokenResponse = response.json()?;
        self.transport
            .session()
            .set_token(SecretString::from(token.access_token));
        info!("Registered");
        Ok(())
    }

    /// Forget the token and the profile. Never fails, never hits the network.
    pub fn logout(&self) {
        self.transport.session().end();
    }
}

fn registration_error(response: &ApiResponse) -> ApiError {
    let detail = response.error_detail();
    let duplicate = response.status == StatusCode::CONFLICT
        || detail.as_deref().is_some_and(is_duplicate_detail);

    if duplicate {
        ApiError::DuplicateUser(detail.unwrap_or_else(|| messages::USER_EXISTS.to_owned()))
    } else {
        ApiError::Registration(detail.unwrap_or_else(|| {
            format!(
                "{}: {}",
                messages::REGISTRATION_FAILED,
                status_message(response.status)
            )
        }))
    }
}

fn is_duplicate_detail(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    DUPLICATE_MARKERS.iter().any(|marker| lower.contains(marker))
}
