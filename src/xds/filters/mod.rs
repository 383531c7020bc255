//! Filter utilities for Envoy HTTP filters.
//!
//! Shared helpers for turning high-level filter configuration into Envoy
//! protobuf payloads: `Any` wrapping and JSON <-> `google.protobuf.Struct`
//! conversion for filters whose configuration is an opaque document.

pub mod http;

use envoy_types::pb::google::protobuf::Any as EnvoyAny;
use prost::Message;
use prost_types::{value::Kind, ListValue, Struct, Value};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Helper for building Envoy `Any` values from prost messages.
pub fn any_from_message<M: Message>(type_url: impl Into<String>, msg: &M) -> EnvoyAny {
    EnvoyAny { type_url: type_url.into(), value: msg.encode_to_vec() }
}

/// Convert a JSON object to a protobuf Struct.
///
/// Fails for non-object documents and for numbers that have no `f64`
/// representation.
pub fn json_to_struct(json: &JsonValue) -> crate::Result<Struct> {
    match json {
        JsonValue::Object(map) => {
            let mut fields = BTreeMap::new();
            for (key, value) in map {
                fields.insert(key.clone(), json_to_proto_value(value)?);
            }
            Ok(Struct { fields })
        }
        _ => Err(crate::Error::encoding("Filter configuration must be a JSON object")),
    }
}

fn json_to_proto_value(json: &JsonValue) -> crate::Result<Value> {
    let kind = match json {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(b) => Kind::BoolValue(*b),
        JsonValue::Number(n) => {
            // Protobuf only has double for numbers
            let num = n.as_f64().ok_or_else(|| {
                crate::Error::encoding(format!("Cannot convert number {} to f64", n))
            })?;
            Kind::NumberValue(num)
        }
        JsonValue::String(s) => Kind::StringValue(s.clone()),
        JsonValue::Array(arr) => {
            let values: crate::Result<Vec<Value>> = arr.iter().map(json_to_proto_value).collect();
            Kind::ListValue(ListValue { values: values? })
        }
        JsonValue::Object(_) => Kind::StructValue(json_to_struct(json)?),
    };

    Ok(Value { kind: Some(kind) })
}

/// Convert a protobuf Struct back to JSON.
pub fn struct_to_json(s: &Struct) -> JsonValue {
    let mut map = serde_json::Map::new();
    for (key, value) in &s.fields {
        map.insert(key.clone(), proto_value_to_json(value));
    }
    JsonValue::Object(map)
}

fn proto_value_to_json(value: &Value) -> JsonValue {
    match &value.kind {
        Some(Kind::NullValue(_)) | None => JsonValue::Null,
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::NumberValue(n)) => serde_json::Number::from_f64(*n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(proto_value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => struct_to_json(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone, PartialEq, Eq, Message)]
    struct TestMessage {
        #[prost(string, tag = "1")]
        field: String,
    }

    #[test]
    fn any_wraps_message() {
        let any = any_from_message("type.googleapis.com/test.Message", &TestMessage {
            field: "hello".into(),
        });
        assert_eq!(any.type_url, "type.googleapis.com/test.Message");
        let decoded = TestMessage::decode(any.value.as_slice()).unwrap();
        assert_eq!(decoded.field, "hello");
    }

    #[test]
    fn nested_document_converts_both_ways() {
        let doc = json!({
            "spec": {
                "match_request": true,
                "attachment": {"pod": "{{ POD_NAME }}"},
                "tags": ["a", "b"],
                "weight": 2.5
            }
        });
        let s = json_to_struct(&doc).unwrap();
        assert_eq!(struct_to_json(&s), doc);
    }

    #[test]
    fn rejects_non_object_document() {
        let err = json_to_struct(&json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, crate::Error::Encoding(_)));
    }
}
