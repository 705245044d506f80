use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("HTTP request timed out")]
    Timeout,
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("API returned {status}: {body}")]
    ApiResponse { status: u16, body: String },
    #[error("Access token contains invalid characters (non-visible ASCII)")]
    InvalidAccessToken,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Request(err)
        }
    }
}

impl ApiError {
    /// True when the request never completed because its deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout)
    }
}

/// Thin JSON-over-HTTP client the typed API clients build on.
///
/// Wraps [`reqwest::Client`] with a base URL, an optional `Authorization`
/// header and a per-request timeout. Cloning is cheap; clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a new client for the given base URL.
    ///
    /// When `authorization` is set it is sent verbatim as the
    /// `Authorization` header on every request.
    pub fn new(
        base_url: &str,
        authorization: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(auth) = authorization {
            let mut value =
                HeaderValue::from_str(auth).map_err(|_| ApiError::InvalidAccessToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build()?;

        Ok(Self { inner, base_url })
    }

    /// GET `{base_url}/{path}` and deserialize the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.base_url.join(path)?;
        let resp = self.inner.get(url).send().await?;
        Self::handle_response(resp).await
    }

    /// PATCH `{base_url}/{path}` with a JSON body and deserialize the response.
    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.base_url.join(path)?;
        let resp = self.inner.patch(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    /// Return the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::ApiResponse { status, body });
        }
        Ok(resp.json().await?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}
