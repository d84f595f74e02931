use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Wire representation of one stored attribute.
///
/// Exactly one variant is active. Serializes in the store's JSON shape:
/// `{"S": "x"}`, `{"N": "42"}`, `{"B": "<base64>"}`, `{"BOOL": true}`,
/// `{"SS": [..]}`, `{"NS": [..]}`, `{"BS": [..]}`, `{"L": [..]}`, `{"M": {..}}`.
///
/// Sets are never empty and hold one element kind by construction.
/// Numbers travel as their canonical base-10 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "B")]
    B(#[serde(with = "base64_bytes")] Vec<u8>),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(#[serde(with = "base64_list")] Vec<Vec<u8>>),
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    #[serde(rename = "M")]
    M(BTreeMap<String, AttributeValue>),
}

/// A stored item: the flat top-level attribute map handed to the store.
pub type Item = BTreeMap<String, AttributeValue>;

impl AttributeValue {
    /// Wire tag of the active variant.
    pub fn tag(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Ss(_) => "SS",
            AttributeValue::Ns(_) => "NS",
            AttributeValue::Bs(_) => "BS",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
        }
    }

    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_m(&self) -> Option<&BTreeMap<String, AttributeValue>> {
        match self {
            AttributeValue::M(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::L(l) => Some(l),
            _ => None,
        }
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod base64_list {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&STANDARD.encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_store_json_shape() {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), AttributeValue::S("u1".into()));
        fields.insert("n".to_string(), AttributeValue::N("42".into()));
        fields.insert("b".to_string(), AttributeValue::B(b"hi".to_vec()));
        let json = serde_json::to_value(AttributeValue::M(fields)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "M": {
                "b": { "B": "aGk=" },
                "id": { "S": "u1" },
                "n": { "N": "42" },
            }})
        );
    }

    #[test]
    fn parses_store_json_shape() {
        let json = r#"{ "BS": ["aGk="] }"#;
        let av: AttributeValue = serde_json::from_str(json).unwrap();
        assert_eq!(av, AttributeValue::Bs(vec![b"hi".to_vec()]));
        assert_eq!(av.tag(), "BS");
    }
}
