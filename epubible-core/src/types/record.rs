//! Raw tagged records as returned by the record service

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A single tag value on a raw record.
///
/// On the wire this is either `{"value": ...}` or an opaque reference
/// `{"value-type": "image/png", "size": 1234}`.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// A primitive value (string, number, bool or null)
    Scalar(serde_json::Value),

    /// A set of strings
    List(Vec<String>),

    /// Binary content stored on the service, known only by its MIME type
    Opaque { value_type: String },
}

impl TagValue {
    /// Create a string scalar
    pub fn text(s: impl Into<String>) -> Self {
        TagValue::Scalar(serde_json::Value::String(s.into()))
    }

    /// Create a list value
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Create an opaque reference
    pub fn opaque(value_type: impl Into<String>) -> Self {
        TagValue::Opaque {
            value_type: value_type.into(),
        }
    }

    /// The string content of a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Scalar(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireTagValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(
        rename = "value-type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    value_type: Option<String>,
}

impl<'de> Deserialize<'de> for TagValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireTagValue::deserialize(deserializer)?;
        Ok(match (wire.value, wire.value_type) {
            (Some(serde_json::Value::Array(items)), _) => TagValue::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            (Some(value), _) => TagValue::Scalar(value),
            (None, Some(value_type)) => TagValue::Opaque { value_type },
            (None, None) => TagValue::Opaque {
                value_type: String::new(),
            },
        })
    }
}

impl Serialize for TagValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wire = match self {
            TagValue::Scalar(value) => WireTagValue {
                value: Some(value.clone()),
                value_type: None,
            },
            TagValue::List(items) => WireTagValue {
                value: Some(serde_json::Value::Array(
                    items
                        .iter()
                        .cloned()
                        .map(serde_json::Value::String)
                        .collect(),
                )),
                value_type: None,
            },
            TagValue::Opaque { value_type } => WireTagValue {
                value: None,
                value_type: Some(value_type.clone()),
            },
        };
        wire.serialize(serializer)
    }
}

/// One object's tags, keyed by tag path
pub type RawRecord = BTreeMap<String, TagValue>;

/// Records keyed by the service's opaque object id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(rename = "id", default)]
    pub objects: BTreeMap<String, RawRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record under an object id
    pub fn insert(&mut self, object_id: impl Into<String>, record: RawRecord) {
        self.objects.insert(object_id.into(), record);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// The `/values` response envelope: `{"results": {"id": {...}}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuesEnvelope {
    #[serde(default)]
    pub results: RecordSet,
}
