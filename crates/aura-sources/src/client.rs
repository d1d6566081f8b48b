//! HTTP client for the API proxy.

use std::time::Duration;

use aura_core::{Config, Error, HttpError, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

const DEFAULT_USER_AGENT: &str = concat!("Aura/", env!("CARGO_PKG_VERSION"));

/// A decoded response body together with the response headers.
#[derive(Debug)]
pub struct ProxyResponse<T> {
    pub body: T,
    pub headers: HeaderMap,
}

/// Thin JSON client over the API proxy.
#[derive(Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base: Url,
}

impl ProxyClient {
    /// Create a client from the proxy settings in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.proxy_base_url, config.request_timeout())
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| Error::Http(HttpError::InvalidUrl(format!("{base_url}: {e}"))))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http, base })
    }

    /// Build an absolute URL for a proxy path.
    pub fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Http(HttpError::InvalidUrl(format!("{path}: {e}"))))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET a proxy path and decode the JSON body.
    pub async fn get_json<R>(&self, path: &str, query: &[(&str, &str)]) -> Result<ProxyResponse<R>>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path, query)?;
        debug!("GET {url}");
        let response = self.http.get(url).send().await.map_err(map_send_error)?;
        decode(response).await
    }

    /// POST a JSON body to a proxy path and decode the JSON response.
    pub async fn post_json<T, R>(&self, path: &str, body: &T) -> Result<ProxyResponse<R>>
    where
        T: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path, &[])?;
        debug!("POST {url}");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;
        decode(response).await
    }

    /// Download raw bytes from an absolute URL (image CDNs).
    pub async fn get_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self.http.get(url).send().await.map_err(map_send_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(HttpError::StatusError {
                status: status.as_u16(),
                message: format!("GET {url}"),
            }));
        }
        response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response body: {e}")))
    }
}

fn map_send_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Http(HttpError::Timeout)
    } else if e.is_connect() {
        Error::Http(HttpError::ConnectionFailed(e.to_string()))
    } else {
        Error::Network(e.to_string())
    }
}

async fn decode<R: DeserializeOwned>(response: reqwest::Response) -> Result<ProxyResponse<R>> {
    let status = response.status();
    let headers = response.headers().clone();
    let header_retry = headers
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());
    let remaining = quota_remaining(&headers);

    let text = response
        .text()
        .await
        .map_err(|e| Error::Network(format!("Failed to read response body: {e}")))?;
    let value: Option<Value> = serde_json::from_str(&text).ok();

    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(Error::RateLimited {
            retry_after_secs: header_retry.or_else(|| value.as_ref().and_then(body_retry_after)),
            remaining,
        });
    }

    if !status.is_success() {
        return Err(Error::Http(HttpError::StatusError {
            status: status.as_u16(),
            message: text,
        }));
    }

    let value = value.ok_or_else(|| Error::Parse("response is not JSON".to_string()))?;
    if is_rate_limit_body(&value) {
        return Err(Error::RateLimited {
            retry_after_secs: body_retry_after(&value),
            remaining,
        });
    }

    let body = serde_json::from_value(value).map_err(|e| Error::Parse(e.to_string()))?;
    Ok(ProxyResponse { body, headers })
}

/// Remaining-quota value from any `*-ratelimit-remaining` header.
fn quota_remaining(headers: &HeaderMap) -> Option<u32> {
    headers
        .iter()
        .find(|(name, _)| name.as_str().ends_with("ratelimit-remaining"))
        .and_then(|(_, v)| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Some upstreams report throttling in a 200 body.
fn is_rate_limit_body(value: &Value) -> bool {
    value.get("rateLimited").and_then(Value::as_bool) == Some(true)
        || value
            .get("error")
            .and_then(Value::as_str)
            .is_some_and(|e| e.to_lowercase().contains("rate limit"))
}

fn body_retry_after(value: &Value) -> Option<u64> {
    value.get("retryAfter").and_then(|v| {
        v.as_u64()
            .or_else(|| v.as_f64().map(|f| f.ceil() as u64))
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
    })
}
