use std::sync::Arc;

use facet_api::{FacetError, KeySchema, KeyTuple, Result};

use crate::attribute::{Attr, MapAttribute};
use crate::config::TableConfig;
use crate::entity::Entity;
use crate::key::{IndexKey, PrimaryKey};
use crate::mask::{Mask, Projection};

type PrimaryFn = Arc<dyn Fn(&Projection) -> Result<KeyTuple> + Send + Sync>;
type IndexFn = Arc<dyn Fn(&Projection) -> Result<Option<KeyTuple>> + Send + Sync>;

/// A single physical table shared by every entity defined on it.
///
/// Cheap to clone; entities keep a handle to read the key layout.
#[derive(Debug, Clone)]
pub struct Table {
    config: Arc<TableConfig>,
}

impl Table {
    pub fn new(config: TableConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            tracing::warn!(table = %config.name, error = %e, "table configuration rejected");
            return Err(e);
        }
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn keys(&self) -> &KeySchema {
        &self.config.keys
    }

    /// Start defining an entity whose items live in this table.
    pub fn entity(&self, name: impl Into<String>, schema: Attr) -> EntityBuilder {
        EntityBuilder {
            table: self.clone(),
            name: name.into(),
            schema,
            primary: None,
            indexes: Vec::new(),
        }
    }
}

/// Collects the key derivations of an entity; [`EntityBuilder::build`]
/// checks everything against the schema and the table.
pub struct EntityBuilder {
    table: Table,
    name: String,
    schema: Attr,
    primary: Option<(Mask, PrimaryFn)>,
    indexes: Vec<(String, Mask, IndexFn)>,
}

impl EntityBuilder {
    /// The one primary key derivation. A second call replaces the first.
    pub fn primary_key<F>(mut self, mask: Mask, compute: F) -> Self
    where
        F: Fn(&Projection) -> Result<KeyTuple> + Send + Sync + 'static,
    {
        self.primary = Some((mask, Arc::new(compute)));
        self
    }

    /// A secondary index derivation, keyed by the table's index name.
    pub fn index<F>(mut self, name: impl Into<String>, mask: Mask, compute: F) -> Self
    where
        F: Fn(&Projection) -> Result<Option<KeyTuple>> + Send + Sync + 'static,
    {
        self.indexes.push((name.into(), mask, Arc::new(compute)));
        self
    }

    pub fn build(self) -> Result<Entity> {
        let ctx = format!("entity '{}'", self.name);
        let schema = self
            .schema
            .as_map()
            .cloned()
            .ok_or_else(|| {
                FacetError::SchemaMismatch(format!(
                    "schema must be a map, found {}",
                    self.schema.describe()
                ))
            })
            .map_err(|e| e.with_context(&ctx))?;

        let keys = self.table.keys();
        if let Some((name, _)) = schema
            .fields()
            .iter()
            .find(|(name, _)| keys.is_key_attribute(name))
        {
            return Err(FacetError::SchemaMismatch(format!(
                "field '{name}' collides with a key attribute of table '{}'",
                self.table.name()
            ))
            .with_context(&ctx));
        }

        let Some((mask, compute)) = self.primary else {
            return Err(FacetError::SchemaMismatch("no primary key declared".into()).with_context(&ctx));
        };
        let primary = PrimaryKey::new(&schema, mask, move |p| compute(p))
            .map_err(|e| e.with_context(&ctx))?;

        let mut indexes: Vec<(String, IndexKey)> = Vec::with_capacity(self.indexes.len());
        for (name, mask, compute) in self.indexes {
            if keys.index(&name).is_none() {
                return Err(FacetError::SchemaMismatch(format!(
                    "index '{name}' is not configured on table '{}'",
                    self.table.name()
                ))
                .with_context(&ctx));
            }
            if indexes.iter().any(|(n, _)| *n == name) {
                return Err(FacetError::SchemaMismatch(format!("index '{name}' declared twice"))
                    .with_context(&ctx));
            }
            let derivation = IndexKey::new(&schema, mask, move |p| compute(p))
                .map_err(|e| e.with_context(&ctx))?;
            indexes.push((name, derivation));
        }

        tracing::debug!(
            entity = %self.name,
            table = %self.table.name(),
            fields = schema.fields().len(),
            indexes = indexes.len(),
            "entity defined"
        );
        Ok(Entity::new(self.name, self.table, schema, primary, indexes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::f;
    use facet_api::ErrorKind;

    fn table() -> Table {
        Table::new(TableConfig::new("Facet").with_index("gsi1", "gsi1pk", "gsi1sk")).unwrap()
    }

    fn pk(p: &Projection) -> Result<KeyTuple> {
        Ok(KeyTuple::new(p.str("id")?, "x"))
    }

    #[test]
    fn missing_primary_key_is_rejected() {
        let err = table()
            .entity("user", f::map([("id", f::string().read_only())]))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn unknown_index_is_rejected() {
        let err = table()
            .entity("user", f::map([("id", f::string().read_only())]))
            .primary_key(Mask::new().select("id"), pk)
            .index("gsi9", Mask::new(), |_| Ok(None))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn field_named_like_a_key_attribute_is_rejected() {
        let err = table()
            .entity(
                "user",
                f::map([("id", f::string().read_only()), ("gsi1pk", f::string())]),
            )
            .primary_key(Mask::new().select("id"), pk)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn non_map_schema_is_rejected() {
        let err = table()
            .entity("user", f::string())
            .primary_key(Mask::new(), |_| Ok(KeyTuple::new("a", "b")))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn mask_violation_surfaces_at_build_time() {
        let err = table()
            .entity("user", f::map([("id", f::string())]))
            .primary_key(Mask::new().select("id"), pk)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MaskViolation);
        assert_eq!(err.path(), Some("entity 'user'.id"));
    }
}
