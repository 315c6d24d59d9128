pub mod error;
pub mod metric;
pub mod params;
pub mod parse;

pub use error::{ErrorKind, ModelError};
pub use metric::{CounterMetric, GaugeMetric, Metric, MetricKind, COUNTER_TYPE, GAUGE_TYPE};
pub use params::Params;
pub use parse::{check_name, check_values, parse_json, parse_json_batch, parse_uri};
