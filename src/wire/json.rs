//! `format=json` render bodies:
//! `[{"target": "a.b", "datapoints": [[1.0, 1468339853], [null, 1468339913]]}]`

use serde::{Deserialize, Serialize};

use crate::models::{Sample, Series};
use crate::Result;

#[derive(Debug, Serialize, Deserialize)]
struct JsonSeries {
    target: String,
    datapoints: Vec<(Option<f64>, i64)>,
}

impl From<JsonSeries> for Series {
    fn from(raw: JsonSeries) -> Self {
        let samples = raw
            .datapoints
            .into_iter()
            .map(|(value, timestamp)| Sample::new(timestamp, value))
            .collect();
        Series::new(raw.target, samples)
    }
}

impl From<&Series> for JsonSeries {
    fn from(series: &Series) -> Self {
        Self {
            target: series.name.clone(),
            datapoints: series
                .samples
                .iter()
                .map(|s| (s.value.get(), s.timestamp))
                .collect(),
        }
    }
}

pub fn decode(body: &[u8]) -> Result<Vec<Series>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let raw: Vec<JsonSeries> = serde_json::from_slice(body)?;
    Ok(raw.into_iter().map(Series::from).collect())
}

pub fn encode(series: &[Series]) -> Result<Vec<u8>> {
    let raw: Vec<JsonSeries> = series.iter().map(JsonSeries::from).collect();
    Ok(serde_json::to_vec(&raw)?)
}
