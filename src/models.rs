use serde::{Deserialize, Serialize};

/// A sample value that may be missing on the backend.
///
/// Decoders normalize both wire representations of "missing" (a JSON `null`
/// or a protobuf absence flag) to `Absent`, so nothing downstream has to
/// look at NaN bit patterns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Value {
    Present(f64),
    Absent,
}

impl Value {
    /// Maps NaN to `Absent`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            Value::Absent
        } else {
            Value::Present(value)
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn get(&self) -> Option<f64> {
        match self {
            Value::Present(v) => Some(*v),
            Value::Absent => None,
        }
    }

    /// The value as a float, NaN when absent.
    pub fn as_f64(&self) -> f64 {
        self.get().unwrap_or(f64::NAN)
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Value::Absent, Value::from_f64)
    }
}

impl From<Value> for Option<f64> {
    fn from(value: Value) -> Self {
        value.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: i64,
    pub value: Value,
}

impl Sample {
    pub fn new(timestamp: i64, value: impl Into<Value>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }

    pub fn present(timestamp: i64, value: f64) -> Self {
        Self::new(timestamp, Value::from_f64(value))
    }

    pub fn absent(timestamp: i64) -> Self {
        Self::new(timestamp, Value::Absent)
    }
}

/// One named series as returned by the backend for a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub samples: Vec<Sample>,
}

impl Series {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }

    /// Builds a series from `start` spaced by `step`, in the shape the
    /// protobuf render format carries it.
    pub fn from_step(
        name: impl Into<String>,
        start: i64,
        step: i64,
        values: impl IntoIterator<Item = Value>,
    ) -> Self {
        let samples = values
            .into_iter()
            .enumerate()
            .map(|(i, value)| Sample::new(start + i as i64 * step, value))
            .collect();
        Self::new(name, samples)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// Outcome of checking one series against an expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalResult {
    pub name: String,
    pub timestamp: i64,
    /// NaN when `is_absent`.
    pub value: f64,
    pub success: bool,
    pub is_absent: bool,
}
