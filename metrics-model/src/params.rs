use serde::{Deserialize, Serialize};

/// Wire/transport record. Field names match the JSON contract exactly:
/// `{"id", "type", "value"?, "delta"?, "hash"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Params {
    #[serde(rename = "id")]
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(rename = "value", skip_serializing_if = "Option::is_none", default)]
    pub gauge_value: Option<f64>,

    #[serde(rename = "delta", skip_serializing_if = "Option::is_none", default)]
    pub counter_delta: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let p = Params {
            name: "Dog".into(),
            kind: "counter".into(),
            gauge_value: None,
            counter_delta: Some(3),
            hash: None,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["id"], "Dog");
        assert_eq!(json["type"], "counter");
        assert_eq!(json["delta"], 3);
        assert!(json.get("value").is_none());
        assert!(json.get("hash").is_none());
    }

    #[test]
    fn deserializes_batch_array() {
        let raw = r#"[{"id":"A","type":"gauge","value":0.5},{"id":"B","type":"counter","delta":2}]"#;
        let batch: Vec<Params> = serde_json::from_str(raw).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].gauge_value, Some(0.5));
        assert_eq!(batch[1].counter_delta, Some(2));
    }
}
