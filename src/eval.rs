use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::api::{RenderQuery, Transport};
use crate::config::Credentials;
use crate::expr::Expression;
use crate::metrics;
use crate::models::{EvalResult, Series};
use crate::resolver::resolve;
use crate::wire::{self, Format};
use crate::Result;

/// An expression bound to a render query, ready to fetch once.
///
/// `fetch` and `eval` consume the evaluator; to retry after a failure build a
/// new one.
pub struct RenderEval {
    expression: Expression,
    query: RenderQuery,
    max_null_points: usize,
    transport: Arc<dyn Transport>,
}

impl RenderEval {
    /// Parses `eval` and prepares a single-target protobuf query for its
    /// target.
    pub fn new(
        transport: Arc<dyn Transport>,
        base: impl Into<String>,
        from: impl Into<String>,
        until: impl Into<String>,
        eval: &str,
        max_null_points: usize,
    ) -> Result<Self> {
        let expression = Expression::parse(eval)?;
        let query = RenderQuery::new(base, from, until, vec![expression.target.clone()]);
        Ok(Self {
            expression,
            query,
            max_null_points,
            transport,
        })
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.query.format = format;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.query.credentials = Some(credentials);
        self
    }

    pub fn with_max_data_points(mut self, max_data_points: u32) -> Self {
        self.query.max_data_points = max_data_points;
        self
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub fn query(&self) -> &RenderQuery {
        &self.query
    }

    pub async fn fetch(self) -> Result<FetchedEval> {
        let body = self.query.fetch(self.transport.as_ref()).await?;
        Ok(FetchedEval {
            expression: self.expression,
            format: self.query.format,
            max_null_points: self.max_null_points,
            body,
        })
    }

    /// Fetch, decode and compare in one go.
    pub async fn eval(self) -> Result<Vec<EvalResult>> {
        self.fetch().await?.evaluate()
    }
}

/// A render body that has arrived but not been decoded yet.
pub struct FetchedEval {
    expression: Expression,
    format: Format,
    max_null_points: usize,
    body: Bytes,
}

impl FetchedEval {
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn evaluate(self) -> Result<Vec<EvalResult>> {
        let series = wire::decode(self.format, &self.body).map_err(|e| {
            metrics::record_failure(e.kind());
            e
        })?;
        let results = evaluate_series(&self.expression, &series, self.max_null_points);
        info!(
            expression = %self.expression,
            series = results.len(),
            succeeded = results.iter().filter(|r| r.success).count(),
            "evaluated expression"
        );
        Ok(results)
    }
}

/// Resolves and compares every series, keeping response order.
pub fn evaluate_series(
    expression: &Expression,
    series: &[Series],
    max_null_points: usize,
) -> Vec<EvalResult> {
    series
        .iter()
        .map(|s| {
            let sample = resolve(s, max_null_points);
            let is_absent = sample.value.is_absent();
            let value = sample.value.as_f64();
            let success = !is_absent && expression.matches(value);
            debug!(name = %s.name, timestamp = sample.timestamp, value, is_absent, success, "resolved series");
            metrics::record_evaluation(success, is_absent);
            EvalResult {
                name: s.name.clone(),
                timestamp: sample.timestamp,
                value,
                success,
                is_absent,
            }
        })
        .collect()
}
