use std::io::Read;

use crate::error::ModelError;
use crate::metric::MetricKind;
use crate::params::Params;

pub fn check_name(name: &str) -> Result<(), ModelError> {
    if name.is_empty() {
        return Err(ModelError::InvalidValue {
            name: name.to_owned(),
        });
    }
    Ok(())
}

pub fn check_values(gauge_value: Option<f64>, counter_delta: Option<i64>) -> Result<(), ModelError> {
    if gauge_value.is_none() && counter_delta.is_none() {
        return Err(ModelError::InvalidValue {
            name: String::new(),
        });
    }
    Ok(())
}

/// Builds a `Params` from individually-extracted URI path segments (`/update/{kind}/{name}/{value}`
/// style routes where value parsing depends on kind).
pub fn parse_uri(kind: &str, name: &str, value: Option<&str>) -> Result<Params, ModelError> {
    let parsed_kind = MetricKind::parse(kind)?;
    check_name(name)?;

    let (gauge_value, counter_delta) = match (parsed_kind, value) {
        (MetricKind::Gauge, Some(raw)) => {
            let v: f64 = raw
                .parse()
                .map_err(|_| ModelError::ParseUri(format!("value {raw} is not a valid gauge")))?;
            (Some(v), None)
        }
        (MetricKind::Counter, Some(raw)) => {
            let d: i64 = raw
                .parse()
                .map_err(|_| ModelError::ParseUri(format!("value {raw} is not a valid counter")))?;
            (None, Some(d))
        }
        (_, None) => (None, None),
    };

    Ok(Params {
        name: name.to_owned(),
        kind: kind.to_owned(),
        gauge_value,
        counter_delta,
        hash: None,
    })
}

/// Decodes a single `Params` JSON object, validating presence of name/type and,
/// when `require_value` is set, of exactly one value field.
pub fn parse_json(reader: impl Read, require_value: bool) -> Result<Params, ModelError> {
    let params: Params = serde_json::from_reader(reader)?;
    check_name(&params.name)?;
    MetricKind::parse(&params.kind)?;
    if require_value {
        check_values(params.gauge_value, params.counter_delta)?;
    }
    Ok(params)
}

/// Decodes a JSON array of `Params`, applying the same per-element validation as
/// [`parse_json`].
pub fn parse_json_batch(reader: impl Read, require_value: bool) -> Result<Vec<Params>, ModelError> {
    let batch: Vec<Params> = serde_json::from_reader(reader)?;
    for params in &batch {
        check_name(&params.name)?;
        MetricKind::parse(&params.kind)?;
        if require_value {
            check_values(params.gauge_value, params.counter_delta)?;
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uri_parses_gauge_value() {
        let params = parse_uri("gauge", "WaterPercent", Some("0.8")).unwrap();
        assert_eq!(params.gauge_value, Some(0.8));
    }

    #[test]
    fn parse_uri_parses_counter_value() {
        let params = parse_uri("counter", "Dog", Some("3")).unwrap();
        assert_eq!(params.counter_delta, Some(3));
    }

    #[test]
    fn parse_uri_rejects_unknown_kind() {
        assert!(parse_uri("fruit", "X", Some("1")).is_err());
    }

    #[test]
    fn parse_uri_rejects_empty_name() {
        assert!(parse_uri("gauge", "", Some("1")).is_err());
    }

    #[test]
    fn parse_json_rejects_missing_value_when_required() {
        let raw = r#"{"id":"Dog","type":"counter"}"#;
        let err = parse_json(raw.as_bytes(), true).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parse_json_allows_missing_value_for_reads() {
        let raw = r#"{"id":"Dog","type":"counter"}"#;
        assert!(parse_json(raw.as_bytes(), false).is_ok());
    }
}
