//! Render response decoding.

pub mod json;
pub mod protobuf;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::models::Series;
use crate::{metrics, GraphiteError, Result};

/// Body format requested through the `format` query parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    Json,
    #[default]
    Protobuf,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Protobuf => "protobuf",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = GraphiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Format::Json),
            "protobuf" => Ok(Format::Protobuf),
            other => Err(GraphiteError::InvalidConfig(format!(
                "unsupported format: {other}"
            ))),
        }
    }
}

/// Decodes a whole render body. On error nothing is returned.
pub fn decode(format: Format, body: &[u8]) -> Result<Vec<Series>> {
    let decoded = match format {
        Format::Json => json::decode(body),
        Format::Protobuf => protobuf::decode(body),
    };

    match &decoded {
        Ok(series) => {
            debug!(format = %format, bytes = body.len(), series = series.len(), "decoded render body");
            metrics::record_series_decoded(series.len());
        }
        Err(e) => debug!(format = %format, bytes = body.len(), error = %e, "failed to decode render body"),
    }
    decoded
}

/// Encodes series in `format`, the inverse of [`decode`].
pub fn encode(format: Format, series: &[Series]) -> Result<Vec<u8>> {
    match format {
        Format::Json => json::encode(series),
        Format::Protobuf => protobuf::encode(series),
    }
}
