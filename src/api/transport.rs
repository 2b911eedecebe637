use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Url;

use crate::config::{ClientConfig, Credentials};
use crate::{GraphiteError, Result};

/// Status and body of a finished GET.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Outbound HTTP used by render queries.
///
/// Implementations only move bytes; status interpretation happens in
/// [`crate::api::render`]. Timeouts and cancellation are the implementation's.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url, credentials: Option<&Credentials>) -> Result<RawResponse>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| GraphiteError::InvalidConfig(format!("invalid header name {key:?}: {e}")))?;
            headers.append(name, header_value(value)?);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(invalid_client)?;

        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn invalid_client(err: reqwest::Error) -> GraphiteError {
    GraphiteError::InvalidConfig(format!("failed to build http client: {err}"))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| GraphiteError::InvalidConfig(format!("invalid header value {value:?}: {e}")))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url, credentials: Option<&Credentials>) -> Result<RawResponse> {
        let mut request = self.client.get(url);
        if let Some(credentials) = credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(RawResponse { status, body })
    }
}
