use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ModelError;
use crate::params::Params;

type HmacSha256 = Hmac<Sha256>;

pub const GAUGE_TYPE: &str = "gauge";
pub const COUNTER_TYPE: &str = "counter";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => GAUGE_TYPE,
            MetricKind::Counter => COUNTER_TYPE,
        }
    }

    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            GAUGE_TYPE => Ok(MetricKind::Gauge),
            COUNTER_TYPE => Ok(MetricKind::Counter),
            other => Err(ModelError::InvalidType(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GaugeMetric {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterMetric {
    pub name: String,
    pub value: i64,
}

/// A single metric observation, tagged by kind. Dispatch on kind at every boundary
/// rather than modeling gauge/counter as subclasses of a shared base.
#[derive(Debug, Clone, PartialEq)]
pub enum Metric {
    Gauge(GaugeMetric),
    Counter(CounterMetric),
}

impl Metric {
    pub fn gauge(name: impl Into<String>, value: f64) -> Self {
        Metric::Gauge(GaugeMetric {
            name: name.into(),
            value,
        })
    }

    pub fn counter(name: impl Into<String>, value: i64) -> Self {
        Metric::Counter(CounterMetric {
            name: name.into(),
            value,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Metric::Gauge(g) => &g.name,
            Metric::Counter(c) => &c.name,
        }
    }

    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Counter(_) => MetricKind::Counter,
        }
    }

    pub fn string_value(&self) -> String {
        match self {
            Metric::Gauge(g) => format!("{}", g.value),
            Metric::Counter(c) => format!("{}", c.value),
        }
    }

    /// Canonical byte form hashed for the metric-integrity signature:
    /// `"{name}:gauge:{%f}"` or `"{name}:counter:{%d}"`.
    pub fn canonical(&self) -> String {
        match self {
            Metric::Gauge(g) => format!("{}:gauge:{}", g.name, g.value),
            Metric::Counter(c) => format!("{}:counter:{}", c.name, c.value),
        }
    }

    /// hex(HMAC-SHA256(key, canonical(self))). Computed regardless of whether `key`
    /// is empty; acceptance policy (whether an empty key means "accept any hash")
    /// lives in the controller, not here.
    pub fn hash(&self, key: &[u8]) -> String {
        let mut mac =
            HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
        mac.update(self.canonical().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    pub fn to_params(&self, hash: Option<String>) -> Params {
        match self {
            Metric::Gauge(g) => Params {
                name: g.name.clone(),
                kind: GAUGE_TYPE.to_owned(),
                gauge_value: Some(g.value),
                counter_delta: None,
                hash,
            },
            Metric::Counter(c) => Params {
                name: c.name.clone(),
                kind: COUNTER_TYPE.to_owned(),
                gauge_value: None,
                counter_delta: Some(c.value),
                hash,
            },
        }
    }

    pub fn from_params(params: &Params) -> Result<Self, ModelError> {
        let kind = MetricKind::parse(&params.kind)?;
        if params.name.is_empty() {
            return Err(ModelError::InvalidValue {
                name: params.name.clone(),
            });
        }
        match kind {
            MetricKind::Gauge => match params.gauge_value {
                Some(v) if params.counter_delta.is_none() => {
                    Ok(Metric::gauge(params.name.clone(), v))
                }
                _ => Err(ModelError::InvalidValue {
                    name: params.name.clone(),
                }),
            },
            MetricKind::Counter => match params.counter_delta {
                Some(d) if params.gauge_value.is_none() => {
                    Ok(Metric::counter(params.name.clone(), d))
                }
                _ => Err(ModelError::InvalidValue {
                    name: params.name.clone(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_matches_spec() {
        let g = Metric::gauge("WaterPercent", 0.8);
        assert_eq!(g.canonical(), "WaterPercent:gauge:0.8");
        let c = Metric::counter("Dog", 3);
        assert_eq!(c.canonical(), "Dog:counter:3");
    }

    #[test]
    fn hash_is_reproducible_from_same_key() {
        let m = Metric::counter("Dog", 3);
        assert_eq!(m.hash(b"k"), m.hash(b"k"));
        assert_ne!(m.hash(b"k"), m.hash(b"other"));
    }

    #[test]
    fn round_trip_through_params_preserves_identity() {
        let m = Metric::gauge("Foo", 1.5);
        let params = m.to_params(None);
        let back = Metric::from_params(&params).unwrap();
        assert_eq!(m, back);
    }

    #[test]
    fn counter_with_gauge_value_is_rejected() {
        let params = Params {
            name: "Dog".into(),
            kind: COUNTER_TYPE.into(),
            gauge_value: Some(1.0),
            counter_delta: None,
            hash: None,
        };
        let err = Metric::from_params(&params).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn empty_name_is_rejected() {
        let params = Params {
            name: String::new(),
            kind: GAUGE_TYPE.into(),
            gauge_value: Some(1.0),
            counter_delta: None,
            hash: None,
        };
        assert!(Metric::from_params(&params).is_err());
    }

    #[test]
    fn unknown_kind_is_invalid_type() {
        let params = Params {
            name: "X".into(),
            kind: "fruit".into(),
            gauge_value: Some(1.0),
            counter_delta: None,
            hash: None,
        };
        let err = Metric::from_params(&params).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidType);
    }
}
