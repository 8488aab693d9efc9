//! Conversion between plain JSON and Firestore's typed value encoding
//! (`{"stringValue": "..."}`, `{"mapValue": {"fields": {...}}}`, ...).

use serde_json::{json, Map, Number, Value};

use crate::backend::{as_timestamp, Fields};
use crate::error::{Result, VitalWatchError};

pub fn encode_fields(fields: &Fields) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    Value::Object(encoded)
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => match as_timestamp(value) {
            Some(ts) => json!({ "timestampValue": ts }),
            None => json!({ "mapValue": { "fields": encode_fields(map) } }),
        },
    }
}

/// Decode a document's `fields` object. A missing or null `fields` is an
/// empty document.
pub fn decode_fields(fields: Option<&Value>) -> Result<Fields> {
    match fields {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| decode_value(v).map(|decoded| (k.clone(), decoded)))
            .collect(),
        Some(other) => Err(VitalWatchError::Store(format!(
            "Expected a fields object, got {}",
            other
        ))),
    }
}

/// Timestamps, references and bytes come back as strings.
pub fn decode_value(value: &Value) -> Result<Value> {
    let (kind, inner) = value
        .as_object()
        .and_then(|obj| obj.iter().next())
        .ok_or_else(|| VitalWatchError::Store(format!("Malformed Firestore value: {}", value)))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| malformed(kind, inner)),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(|i| Value::Number(i.into()))
                .ok_or_else(|| malformed(kind, inner))
        }
        "doubleValue" => {
            let parsed = match inner {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.parse::<f64>().ok(),
                _ => None,
            };
            let f = parsed.ok_or_else(|| malformed(kind, inner))?;
            // NaN and infinities have no JSON form.
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| malformed(kind, inner)),
        "geoPointValue" => Ok(inner.clone()),
        "arrayValue" => {
            let values = match inner.get("values") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>>>()?,
                Some(_) => return Err(malformed(kind, inner)),
            };
            Ok(Value::Array(values))
        }
        "mapValue" => decode_fields(inner.get("fields")).map(Value::Object),
        other => Err(VitalWatchError::Store(format!(
            "Unsupported Firestore value type: {}",
            other
        ))),
    }
}

fn malformed(kind: &str, inner: &Value) -> VitalWatchError {
    VitalWatchError::Store(format!("Malformed {}: {}", kind, inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_profile_document() {
        let fields = json!({
            "firstName": "Ada",
            "preferences": { "notifications": true, "threshold": 5 }
        });
        let encoded = encode_fields(fields.as_object().unwrap());

        assert_eq!(encoded["firstName"], json!({ "stringValue": "Ada" }));
        assert_eq!(
            encoded["preferences"]["mapValue"]["fields"]["threshold"],
            json!({ "integerValue": "5" })
        );
        assert_eq!(
            encoded["preferences"]["mapValue"]["fields"]["notifications"],
            json!({ "booleanValue": true })
        );
    }

    #[test]
    fn test_encode_double_and_array() {
        assert_eq!(encode_value(&json!(2.5)), json!({ "doubleValue": 2.5 }));
        assert_eq!(
            encode_value(&json!(["a", null])),
            json!({ "arrayValue": { "values": [ { "stringValue": "a" }, { "nullValue": null } ] } })
        );
    }

    #[test]
    fn test_decode_seeded_alert() {
        let raw = json!({
            "title": { "stringValue": "Oxygen saturation warning" },
            "status": { "stringValue": "warning" },
            "timestamp": { "timestampValue": "2025-07-28T15:40:00Z" }
        });
        let fields = decode_fields(Some(&raw)).unwrap();
        assert_eq!(fields["title"], json!("Oxygen saturation warning"));
        assert_eq!(fields["timestamp"], json!("2025-07-28T15:40:00Z"));
    }

    #[test]
    fn test_encode_timestamp_field() {
        let at = "2025-07-29T08:30:00Z".parse().unwrap();
        let fields = json!({ "title": "BP", "timestamp": crate::backend::timestamp_value(at) });
        let encoded = encode_fields(fields.as_object().unwrap());
        assert_eq!(
            encoded["timestamp"],
            json!({ "timestampValue": "2025-07-29T08:30:00Z" })
        );

        let decoded = decode_fields(Some(&encoded)).unwrap();
        assert_eq!(decoded["timestamp"], json!("2025-07-29T08:30:00Z"));
    }

    #[test]
    fn test_decode_empty_containers() {
        assert_eq!(decode_value(&json!({ "arrayValue": {} })).unwrap(), json!([]));
        assert_eq!(decode_value(&json!({ "mapValue": {} })).unwrap(), json!({}));
        assert!(decode_fields(None).unwrap().is_empty());
    }

    #[test]
    fn test_decode_numbers() {
        assert_eq!(decode_value(&json!({ "integerValue": "42" })).unwrap(), json!(42));
        assert_eq!(decode_value(&json!({ "doubleValue": 7.5 })).unwrap(), json!(7.5));
        assert_eq!(decode_value(&json!({ "doubleValue": "NaN" })).unwrap(), Value::Null);
        assert!(decode_value(&json!({ "integerValue": "four" })).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let err = decode_value(&json!({ "vectorValue": {} })).unwrap_err();
        assert!(err.to_string().contains("vectorValue"));
        assert!(decode_value(&json!("bare")).is_err());
    }
}
