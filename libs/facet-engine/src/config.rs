use serde::Deserialize;

use facet_api::{FacetError, KeySchema, Result};

/// Table configuration, parsed from TOML.
///
/// ```toml
/// name = "Facet"
/// partition_key = "pk"
/// sort_key = "sk"
///
/// [[indexes]]
/// name = "gsi1"
/// partition_key = "gsi1pk"
/// sort_key = "gsi1sk"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub name: String,

    /// Key attribute layout; `pk`/`sk` when omitted.
    #[serde(flatten)]
    pub keys: KeySchema,
}

impl TableConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: KeySchema::default(),
        }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| FacetError::Config(format!("{path}: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| FacetError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Add a secondary index.
    pub fn with_index(
        mut self,
        name: impl Into<String>,
        partition_key: impl Into<String>,
        sort_key: impl Into<String>,
    ) -> Self {
        self.keys.indexes.push(facet_api::IndexKeyNames {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        });
        self
    }

    /// Names must be non-empty; index names and key attribute names unique.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(FacetError::Config("table name is empty".into()));
        }
        let attributes: Vec<&str> = self.keys.key_attributes().collect();
        for (i, attr) in attributes.iter().enumerate() {
            if attr.is_empty() {
                return Err(FacetError::Config(format!(
                    "table '{}': key attribute name is empty",
                    self.name
                )));
            }
            if attributes[..i].contains(attr) {
                return Err(FacetError::Config(format!(
                    "table '{}': key attribute '{attr}' used twice",
                    self.name
                )));
            }
        }
        for (i, index) in self.keys.indexes.iter().enumerate() {
            if self.keys.indexes[..i].iter().any(|other| other.name == index.name) {
                return Err(FacetError::Config(format!(
                    "table '{}': index '{}' declared twice",
                    self.name, index.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_api::ErrorKind;

    #[test]
    fn parses_with_default_key_names() {
        let config = TableConfig::parse(r#"name = "Facet""#).unwrap();
        assert_eq!(config.name, "Facet");
        assert_eq!(config.keys.partition_key, "pk");
        assert_eq!(config.keys.sort_key, "sk");
        assert!(config.keys.indexes.is_empty());
    }

    #[test]
    fn parses_indexes() {
        let config = TableConfig::parse(
            r#"
            name = "Facet"
            partition_key = "PK"
            sort_key = "SK"

            [[indexes]]
            name = "gsi1"
            partition_key = "GSI1PK"
            sort_key = "GSI1SK"
            "#,
        )
        .unwrap();
        assert_eq!(config.keys.partition_key, "PK");
        let gsi = config.keys.index("gsi1").unwrap();
        assert_eq!(gsi.partition_key, "GSI1PK");
    }

    #[test]
    fn rejects_reused_key_attribute() {
        let err = TableConfig::parse(
            r#"
            name = "Facet"

            [[indexes]]
            name = "gsi1"
            partition_key = "pk"
            sort_key = "gsi1sk"
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = TableConfig::parse("name = ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
