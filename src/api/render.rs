use bytes::Bytes;
use reqwest::Url;
use tracing::{debug, warn};

use crate::api::transport::{RawResponse, Transport};
use crate::config::Credentials;
use crate::metrics::{self, RequestTimer};
use crate::models::Series;
use crate::wire::{self, Format};
use crate::{GraphiteError, Result};

/// A `/render/` range fetch over named targets.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderQuery {
    pub base: String,
    pub targets: Vec<String>,
    pub from: String,
    pub until: String,
    /// Omitted from the request when zero.
    pub max_data_points: u32,
    pub format: Format,
    pub credentials: Option<Credentials>,
}

impl RenderQuery {
    pub fn new(
        base: impl Into<String>,
        from: impl Into<String>,
        until: impl Into<String>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            base: base.into(),
            targets,
            from: from.into(),
            until: until.into(),
            max_data_points: 0,
            format: Format::default(),
            credentials: None,
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    pub fn with_until(mut self, until: impl Into<String>) -> Self {
        self.until = until.into();
        self
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    pub fn add_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn with_max_data_points(mut self, max_data_points: u32) -> Self {
        self.max_data_points = max_data_points;
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn url(&self) -> Result<Url> {
        let raw = format!("{}/render/", self.base.trim_end_matches('/'));
        let mut url = Url::parse(&raw)
            .map_err(|e| GraphiteError::InvalidConfig(format!("invalid base url {:?}: {e}", self.base)))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("format", self.format.as_str());
            for target in &self.targets {
                pairs.append_pair("target", target);
            }
            if !self.from.is_empty() {
                pairs.append_pair("from", &self.from);
            }
            if !self.until.is_empty() {
                pairs.append_pair("until", &self.until);
            }
            if self.max_data_points != 0 {
                pairs.append_pair("maxDataPoints", &self.max_data_points.to_string());
            }
        }

        Ok(url)
    }

    /// One round trip. A 404 comes back as an empty body.
    pub async fn fetch(&self, transport: &dyn Transport) -> Result<Bytes> {
        let url = self.url()?;
        debug!(%url, targets = self.targets.len(), "sending render request");

        let result = {
            let _timer = RequestTimer::new();
            transport.get(url, self.credentials.as_ref()).await
        }
        .and_then(check_status);

        if let Err(e) = &result {
            metrics::record_failure(e.kind());
            warn!(error = %e, retryable = e.is_retryable(), "render request failed");
        }
        result
    }

    /// Fetches and decodes, all or nothing.
    pub async fn request(&self, transport: &dyn Transport) -> Result<Vec<Series>> {
        let body = self.fetch(transport).await?;
        wire::decode(self.format, &body).map_err(|e| {
            metrics::record_failure(e.kind());
            e
        })
    }
}

pub(crate) fn check_status(response: RawResponse) -> Result<Bytes> {
    match response.status {
        200..=299 => Ok(response.body),
        404 => {
            debug!("render returned 404, treating as no series");
            Ok(Bytes::new())
        }
        status => Err(GraphiteError::BackendStatus {
            status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
        }),
    }
}
