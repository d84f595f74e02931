use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical location of an item (or of one index entry): partition + sort token.
///
/// Both tokens are opaque strings composed by the schema author, e.g.
/// `("user#42", "user")`. The engine only requires them to be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyTuple {
    pub partition: String,
    pub sort: String,
}

impl KeyTuple {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

impl fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.partition, self.sort)
    }
}

/// Attribute names under which a table stores its primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexKeyNames {
    pub name: String,
    pub partition_key: String,
    pub sort_key: String,
}

/// Key attribute layout of a table: primary key names plus one pair per
/// secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchema {
    #[serde(default = "default_partition_key")]
    pub partition_key: String,
    #[serde(default = "default_sort_key")]
    pub sort_key: String,
    #[serde(default)]
    pub indexes: Vec<IndexKeyNames>,
}

fn default_partition_key() -> String {
    "pk".to_string()
}

fn default_sort_key() -> String {
    "sk".to_string()
}

impl Default for KeySchema {
    fn default() -> Self {
        Self {
            partition_key: default_partition_key(),
            sort_key: default_sort_key(),
            indexes: Vec::new(),
        }
    }
}

impl KeySchema {
    pub fn index(&self, name: &str) -> Option<&IndexKeyNames> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Every attribute name reserved for keys, primary first.
    pub fn key_attributes(&self) -> impl Iterator<Item = &str> {
        [self.partition_key.as_str(), self.sort_key.as_str()]
            .into_iter()
            .chain(
                self.indexes
                    .iter()
                    .flat_map(|i| [i.partition_key.as_str(), i.sort_key.as_str()]),
            )
    }

    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.key_attributes().any(|k| k == name)
    }
}
