//! HTTP transport.
//!
//! Every backend call goes through [`Transport`]. It adds the base URL,
//! encodes the body, attaches the bearer token when asked to, retries 5xx
//! and network failures with backoff, and turns whatever is left into a
//! classified [`ApiError`] after telling the user about it exactly once.
//!
//! Classification, in priority order:
//!
//! 1. 401 on an authenticated call ends the session, navigates home and
//!    fails with [`ApiError::Authentication`]
//! 2. Any other non-2xx fails with [`ApiError::Http`]
//! 3. A network failure is swallowed for anonymous calls (`Ok(None)`) and
//!    rethrown for authenticated ones

use std::fmt;
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::notify::{
    Navigator, Notice, Notifier, TracingNavigator, TracingNotifier, messages, status_message,
};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper, retry};
use crate::session::Session;

// =============================================================================
// Requests
// =============================================================================

/// Whether a request carries the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Anonymous,
    /// `Authorization: Bearer <token>` when a token is held; nothing otherwise.
    Bearer,
}

/// One multipart field holding a file.
#[derive(Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Request body encodings.
#[derive(Clone)]
pub enum RequestBody {
    Empty,
    /// `application/x-www-form-urlencoded`, keys and values percent-encoded.
    Form(Vec<(String, String)>),
    Json(Value),
    /// Rebuilt from the stored bytes on every attempt.
    Multipart(Vec<FilePart>),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Form and JSON bodies may hold credentials.
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Form(pairs) => write!(f, "Form({} fields)", pairs.len()),
            Self::Json(_) => f.write_str("Json(..)"),
            Self::Multipart(parts) => f.debug_tuple("Multipart").field(parts).finish(),
        }
    }
}

/// A backend call: endpoint relative to the base path, method, body, auth.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: RequestBody,
    pub auth: Auth,
}

impl ApiRequest {
    /// Anonymous POST with no body.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            endpoint: endpoint.into(),
            body: RequestBody::Empty,
            auth: Auth::Anonymous,
        }
    }

    #[must_use]
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint).method(Method::GET)
    }

    #[must_use]
    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint)
    }

    #[must_use]
    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint).method(Method::PUT)
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Send the token with this request.
    #[must_use]
    pub const fn authenticated(mut self) -> Self {
        self.auth = Auth::Bearer;
        self
    }

    /// URL-encoded form body.
    #[must_use]
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if `payload` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Multipart body.
    #[must_use]
    pub fn multipart(mut self, parts: Vec<FilePart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }
}

/// Percent-encode a form body.
#[must_use]
pub fn encode_form(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

// =============================================================================
// Responses
// =============================================================================

/// A fully read response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserialize the body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Human readable detail from an error body.
    ///
    /// Understands `{"detail": "..."}`, validation lists
    /// `{"detail": [{"msg": "..."}, ...]}` and `{"message": "..."}`.
    #[must_use]
    pub fn error_detail(&self) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        match value.get("detail") {
            Some(Value::String(detail)) => return Some(detail.clone()),
            Some(Value::Array(items)) if !items.is_empty() => {
                let messages: Vec<String> = items
                    .iter()
                    .map(|item| {
                        item.get("msg")
                            .and_then(Value::as_str)
                            .map_or_else(|| item.to_string(), str::to_owned)
                    })
                    .collect();
                return Some(messages.join("; "));
            }
            _ => {}
        }
        value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Shared HTTP transport. Cloning is cheap.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    client: reqwest::Client,
    endpoint_base: String,
    retry: RetryPolicy,
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    sleeper: Arc<dyn Sleeper>,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("endpoint_base", &self.inner.endpoint_base)
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Transport`].
pub struct TransportBuilder {
    config: ClientConfig,
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    sleeper: Arc<dyn Sleeper>,
}

impl TransportBuilder {
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    #[must_use]
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be initialized.
    pub fn build(self) -> Result<Transport> {
        let client = reqwest::Client::builder()
            .timeout(self.config.request_timeout)
            .build()?;

        Ok(Transport {
            inner: Arc::new(TransportInner {
                client,
                endpoint_base: self.config.endpoint_base(),
                retry: self.config.retry,
                session: self.session,
                notifier: self.notifier,
                navigator: self.navigator,
                sleeper: self.sleeper,
            }),
        })
    }
}

impl Transport {
    /// Start building a transport with tracing-backed hooks and real sleeps.
    #[must_use]
    pub fn builder(config: ClientConfig, session: Arc<Session>) -> TransportBuilder {
        TransportBuilder {
            config,
            session,
            notifier: Arc::new(TracingNotifier),
            navigator: Arc::new(TracingNavigator),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Session this transport reads the token from.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.inner.session
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.inner.notifier.notify(notice);
    }

    pub(crate) fn report_unreachable(&self, error: &reqwest::Error) {
        error!(error = %error, "Server unreachable");
        self.notify(Notice::error(messages::SERVER_UNREACHABLE));
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.inner.endpoint_base)
    }

    /// Send with retries and return the raw response, whatever its status.
    ///
    /// Nothing is classified or reported here.
    ///
    /// # Errors
    ///
    /// Returns the last network error if every attempt failed to get a
    /// response.
    pub async fn send(
        &self,
        request: &ApiRequest,
    ) -> std::result::Result<ApiResponse, reqwest::Error> {
        retry(
            &self.inner.retry,
            self.inner.sleeper.as_ref(),
            |attempt| self.attempt(request, attempt),
            |outcome| match outcome {
                Ok(response) => response.status.is_server_error(),
                Err(_) => true,
            },
        )
        .await
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        attempt: u32,
    ) -> std::result::Result<ApiResponse, reqwest::Error> {
        let mut builder = self
            .inner
            .client
            .request(request.method.clone(), self.url(&request.endpoint));

        if request.auth == Auth::Bearer
            && let Some(token) = self.inner.session.token()
        {
            builder = builder.bearer_auth(token.expose_secret());
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(pairs) => builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encode_form(pairs)),
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        debug!(attempt, "Sending request");
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(attempt, status = status.as_u16(), "Response received");

        Ok(ApiResponse { status, body })
    }

    /// Send with retries and classify the outcome.
    ///
    /// Returns `Ok(None)` only for an anonymous call whose network failure
    /// was already reported to the user.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Authentication`, `ApiError::Http` or
    /// `ApiError::Network` as described in the module docs.
    #[instrument(
        skip(self, request),
        fields(method = %request.method, endpoint = %request.endpoint)
    )]
    pub async fn execute(&self, request: &ApiRequest) -> Result<Option<ApiResponse>> {
        let response = match self.send(request).await {
            Ok(response) => response,
            Err(e) => {
                self.report_unreachable(&e);
                return match request.auth {
                    Auth::Anonymous => Ok(None),
                    Auth::Bearer => Err(ApiError::Network(e)),
                };
            }
        };

        let status = response.status;
        if response.is_success() {
            debug!(status = status.as_u16(), "Request succeeded");
            return Ok(Some(response));
        }

        if status == StatusCode::UNAUTHORIZED && request.auth == Auth::Bearer {
            warn!("Authenticated request rejected, ending session");
            self.inner.session.end();
            self.inner.navigator.navigate_home();
            self.notify(Notice::error(messages::SESSION_EXPIRED));
            return Err(ApiError::Authentication);
        }

        let message = status_message(status);
        let detail = response.error_detail();
        warn!(status = status.as_u16(), detail = ?detail, "Request failed");
        self.notify(Notice::error(message.clone()));
        Err(ApiError::Http {
            status,
            message,
            detail,
        })
    }

    /// [`Transport::execute`] and deserialize the body.
    ///
    /// # Errors
    ///
    /// As [`Transport::execute`]; a swallowed network failure becomes
    /// `ApiError::NoResponse`, an unexpected body `ApiError::Decode`.
    pub async fn fetch_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        self.execute(request)
            .await?
            .ok_or(ApiError::NoResponse)?
            .json()
    }
}

fn multipart_form(parts: &[FilePart]) -> std::result::Result<Form, reqwest::Error> {
    parts.iter().try_fold(Form::new(), |form, part| {
        let file = Part::bytes(part.bytes.clone())
            .file_name(part.file_name.clone())
            .mime_str(&part.mime)?;
        Ok(form.part(part.field.clone(), file))
    })
}
