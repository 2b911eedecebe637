//! Graphite `/render/` client with threshold evaluation.
//!
//! Fetch series for a target, decode JSON or protobuf render bodies into
//! [`models::Series`], and check the newest present value of each series
//! against an expression such as `servers.*.load >= 4`.

pub mod api;
pub mod config;
pub mod error;
pub mod eval;
pub mod expr;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod proto;
pub mod resolver;
pub mod wire;

pub use api::{HttpTransport, RenderQuery, Transport};
pub use config::{ClientConfig, Credentials};
pub use error::{GraphiteError, Result};
pub use eval::{evaluate_series, FetchedEval, RenderEval};
pub use expr::{Comparator, Expression};
pub use models::{EvalResult, Sample, Series, Value};
pub use wire::Format;
