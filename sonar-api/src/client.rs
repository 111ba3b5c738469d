use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, Method, Request, Response, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Default request timeout of the reqwest-backed sender.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Complete `Authorization` header value, `Basic base64(username:password)`.
    pub fn header_value(&self) -> String {
        let credentials = format!("{}:{}", self.username, self.password);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());
        format!("Basic {}", encoded)
    }
}

// The username is the API token for token-based logins, so neither part is printed.
impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sends a prepared request and hands back the raw response.
///
/// Retry, timeout, TLS and proxy policy belong to the implementation.
#[async_trait]
pub trait Sender: Send + Sync + fmt::Debug {
    async fn send(&self, request: Request) -> Result<Response>;
}

#[derive(Debug, Clone)]
pub struct ReqwestSender {
    client: Client,
}

impl ReqwestSender {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Unexpected(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Sender for ReqwestSender {
    async fn send(&self, request: Request) -> Result<Response> {
        let response = self.client.execute(request).await?;
        Ok(response)
    }
}

/// Builds authenticated requests against one API root and sends them through a [`Sender`].
#[derive(Debug, Clone)]
pub struct Requester {
    host: String,
    auth: BasicAuth,
    sender: Arc<dyn Sender>,
}

impl Requester {
    pub fn new(auth: BasicAuth, host: impl Into<String>, sender: Arc<dyn Sender>) -> Self {
        Self {
            host: host.into(),
            auth,
            sender,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Builds `scheme://host/<base-path><path>?<query>` with Basic credentials attached.
    pub fn create(&self, method: Method, path: &str, query: &[(String, String)]) -> Result<Request> {
        let base = Url::parse(&self.host).map_err(|e| {
            Error::InvalidConfiguration(format!("Invalid host '{}': {}", self.host, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidConfiguration(format!(
                "Invalid host '{}': not a hierarchical URL",
                self.host
            )));
        }

        let mut url = base.clone();
        url.set_path(&format!("{}{}", base.path(), path.trim_start_matches('/')));
        url.set_query(None);
        url.set_fragment(None);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut authorization = header::HeaderValue::from_str(&self.auth.header_value())
            .map_err(|_| Error::InvalidConfiguration("Invalid auth header".to_string()))?;
        authorization.set_sensitive(true);

        let mut request = Request::new(method, url);
        let headers = request.headers_mut();
        headers.insert(header::AUTHORIZATION, authorization);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(request)
    }

    pub async fn send(&self, request: Request) -> Result<Response> {
        debug!(method = %request.method(), path = %request.url().path(), "Sending request");
        self.sender.send(request).await
    }

    /// Strictly decodes the body into `T`; the response is consumed on every path.
    /// A body that cannot be read is reported as [`Error::Decode`] as well.
    pub async fn decode<T>(&self, operation: &str, response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let decode_error =
            |source: Box<dyn std::error::Error + Send + Sync>, headers: header::HeaderMap| {
                Error::Decode {
                    operation: operation.to_string(),
                    status,
                    headers,
                    source,
                }
            };

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => return Err(decode_error(Box::new(err), headers)),
        };

        serde_json::from_slice(&body).map_err(|err| decode_error(Box::new(err), headers))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    msg: String,
}

/// Passes 2xx responses through and turns everything else into an
/// [`Error::ApiError`] naming `operation`.
pub async fn check_response(operation: &str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if !body.errors.is_empty() => body
            .errors
            .into_iter()
            .map(|e| e.msg)
            .collect::<Vec<_>>()
            .join("; "),
        _ => text,
    };

    warn!(operation, status, message = %message, "API request failed");
    Err(Error::ApiError {
        operation: operation.to_string(),
        status,
        message,
    })
}
