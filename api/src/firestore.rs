/// Wire types for the Firestore REST v1 document API.
/// Endpoint: {firestore_url}/projects/{project}/databases/(default)/documents/{collection}
///
/// Firestore wraps every field in a one-key object naming its type
/// (`{"stringValue": "x"}`). Domain types never see that; documents are
/// flattened to plain JSON here and decoded with serde afterwards.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as Json};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name; the document id is the last path segment.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    pub next_page_token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    NullValue(Json),
    BooleanValue(bool),
    /// int64 travels as a decimal string.
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(Json),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct MapValue {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

/// Error-body shape shared by Firestore and Identity Toolkit.
#[derive(Deserialize, Default, Debug)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: ErrorBody,
}

#[derive(Deserialize, Default, Debug)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl Document {
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Build a write payload from any serializable value. Non-object values
    /// produce an empty field map.
    pub fn from_value<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let fields = match serde_json::to_value(value)? {
            Json::Object(map) => map.into_iter().map(|(k, v)| (k, to_field(v))).collect(),
            _ => BTreeMap::new(),
        };
        Ok(Self { fields, ..Self::default() })
    }

    /// Flatten into plain JSON with the document id under `"id"`.
    pub fn to_json(&self) -> Json {
        let mut map: Map<String, Json> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), from_field(v)))
            .collect();
        map.insert("id".to_string(), Json::String(self.id().to_string()));
        Json::Object(map)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

pub fn to_field(value: Json) -> FieldValue {
    match value {
        Json::Null => FieldValue::NullValue(Json::Null),
        Json::Bool(b) => FieldValue::BooleanValue(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::IntegerValue(i.to_string()),
            None => FieldValue::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Json::String(s) => FieldValue::StringValue(s),
        Json::Array(items) => FieldValue::ArrayValue(ArrayValue {
            values: items.into_iter().map(to_field).collect(),
        }),
        Json::Object(map) => FieldValue::MapValue(MapValue {
            fields: map.into_iter().map(|(k, v)| (k, to_field(v))).collect(),
        }),
    }
}

pub fn from_field(value: &FieldValue) -> Json {
    match value {
        FieldValue::NullValue(_) => Json::Null,
        FieldValue::BooleanValue(b) => Json::Bool(*b),
        FieldValue::IntegerValue(s) => s
            .parse::<i64>()
            .map(|i| Json::Number(i.into()))
            .unwrap_or_else(|_| Json::String(s.clone())),
        FieldValue::DoubleValue(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        FieldValue::TimestampValue(s)
        | FieldValue::StringValue(s)
        | FieldValue::BytesValue(s)
        | FieldValue::ReferenceValue(s) => Json::String(s.clone()),
        FieldValue::GeoPointValue(v) => v.clone(),
        FieldValue::ArrayValue(a) => Json::Array(a.values.iter().map(from_field).collect()),
        FieldValue::MapValue(m) => Json::Object(
            m.fields
                .iter()
                .map(|(k, v)| (k.clone(), from_field(v)))
                .collect(),
        ),
    }
}
