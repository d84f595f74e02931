use std::marker::PhantomData;

use facet_api::{
    AttributeValue, FacetError, Item, ItemStore, KeyTuple, Record, Result, Value,
};

use crate::attribute::{Attribute, MapAttribute};
use crate::key::{IndexKey, PrimaryKey};
use crate::table::Table;

/// An entity kind stored in a table: its map schema plus key derivations.
///
/// Built through [`Table::entity`]. Converts application values to stored
/// items (data attributes + primary key + any index keys) and back.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    table: Table,
    schema: MapAttribute,
    primary: PrimaryKey,
    indexes: Vec<(String, IndexKey)>,
}

impl Entity {
    pub(crate) fn new(
        name: String,
        table: Table,
        schema: MapAttribute,
        primary: PrimaryKey,
        indexes: Vec<(String, IndexKey)>,
    ) -> Self {
        Self {
            name,
            table,
            schema,
            primary,
            indexes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn schema(&self) -> &MapAttribute {
        &self.schema
    }

    /// Convert to a stored item. Async default providers fail here; use
    /// [`Entity::to_item_async`] for schemas that have them.
    pub fn to_item(&self, value: &Value) -> Result<Item> {
        let resolved = self
            .schema
            .fill_defaults(value.clone())
            .map_err(|e| e.with_context(&self.name))?;
        self.build_item(&resolved)
    }

    /// Convert to a stored item after awaiting every default provider.
    pub async fn to_item_async(&self, value: Value) -> Result<Item> {
        let resolved = self
            .schema
            .resolve_defaults(value)
            .await
            .map_err(|e| e.with_context(&self.name))?;
        self.build_item(&resolved)
    }

    fn build_item(&self, resolved: &Value) -> Result<Item> {
        let mut item = match self.schema.serialize(resolved) {
            Ok(Some(AttributeValue::M(fields))) => fields,
            Ok(_) => {
                return Err(FacetError::type_mismatch("M", "non-map entity output")
                    .with_context(&self.name));
            }
            Err(e) => return Err(e.with_context(&self.name)),
        };

        let keys = self.table.keys();
        let primary = self
            .primary
            .derive(resolved)
            .map_err(|e| e.with_context(format!("{}.primary_key", self.name)))?;
        item.insert(keys.partition_key.clone(), AttributeValue::S(primary.partition.clone()));
        item.insert(keys.sort_key.clone(), AttributeValue::S(primary.sort.clone()));

        for (index, derivation) in &self.indexes {
            let Some(names) = keys.index(index) else {
                continue;
            };
            match derivation
                .derive(resolved)
                .map_err(|e| e.with_context(format!("{}.{index}", self.name)))?
            {
                Some(key) => {
                    item.insert(names.partition_key.clone(), AttributeValue::S(key.partition));
                    item.insert(names.sort_key.clone(), AttributeValue::S(key.sort));
                }
                None => {
                    tracing::debug!(entity = %self.name, index = %index, "index declined, entry omitted");
                }
            }
        }

        tracing::debug!(
            entity = %self.name,
            pk = %primary.partition,
            sk = %primary.sort,
            attributes = item.len(),
            "item serialized"
        );
        Ok(item)
    }

    /// Convert a stored item back, ignoring the table's key attributes.
    pub fn from_item(&self, item: &Item) -> Result<Value> {
        let keys = self.table.keys();
        let data = item
            .iter()
            .filter(|(name, _)| !keys.is_key_attribute(name))
            .map(|(name, av)| (name.clone(), av.clone()))
            .collect();
        self.schema
            .deserialize(&AttributeValue::M(data))
            .map_err(|e| e.with_context(&self.name))
    }

    /// Primary key of `value`, for lookups. Only defaults of fields the key
    /// selects are filled.
    pub fn primary_key(&self, value: &Value) -> Result<KeyTuple> {
        let resolved = self
            .primary
            .mask()
            .fill_defaults(&self.schema, value.clone())
            .map_err(|e| e.with_context(&self.name))?;
        self.primary.derive(&resolved)
    }

    /// Key of `value` in a secondary index, `None` if it declines.
    pub fn index_key(&self, index: &str, value: &Value) -> Result<Option<KeyTuple>> {
        let Some((_, derivation)) = self.indexes.iter().find(|(name, _)| name == index) else {
            return Err(FacetError::SchemaMismatch(format!(
                "entity '{}' has no index '{index}'",
                self.name
            )));
        };
        let resolved = derivation
            .mask()
            .fill_defaults(&self.schema, value.clone())
            .map_err(|e| e.with_context(&self.name))?;
        derivation.derive(&resolved)
    }

    /// Serialize and write. Returns the stored item.
    pub async fn put(&self, store: &dyn ItemStore, value: Value) -> Result<Item> {
        let item = self.to_item_async(value).await?;
        store.put(item.clone()).await?;
        Ok(item)
    }

    pub async fn get(&self, store: &dyn ItemStore, key: &KeyTuple) -> Result<Option<Value>> {
        store
            .get(key)
            .await?
            .map(|item| self.from_item(&item))
            .transpose()
    }

    pub async fn delete(&self, store: &dyn ItemStore, key: &KeyTuple) -> Result<bool> {
        store.delete(key).await
    }
}

/// An [`Entity`] paired with a hand-declared record type.
///
/// Construction checks the record's declared fields against the schema:
/// same names, and optionality that agrees (an optional record field needs
/// an optional or defaulted converter; a required one a non-optional
/// converter).
pub struct TypedEntity<T> {
    entity: Entity,
    _record: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for TypedEntity<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedEntity")
            .field("entity", &self.entity)
            .finish()
    }
}

impl<T> Clone for TypedEntity<T> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> TypedEntity<T> {
    pub fn new(entity: Entity) -> Result<Self> {
        check_record_fields(T::FIELDS, entity.schema())
            .map_err(|e| e.with_context(entity.name()))?;
        Ok(Self {
            entity,
            _record: PhantomData,
        })
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn to_item(&self, record: T) -> Result<Item> {
        self.entity.to_item(&record.into_value())
    }

    pub async fn to_item_async(&self, record: T) -> Result<Item> {
        self.entity.to_item_async(record.into_value()).await
    }

    pub fn from_item(&self, item: &Item) -> Result<T> {
        T::from_value(self.entity.from_item(item)?)
    }

    pub fn primary_key(&self, record: T) -> Result<KeyTuple> {
        self.entity.primary_key(&record.into_value())
    }

    pub async fn put(&self, store: &dyn ItemStore, record: T) -> Result<Item> {
        self.entity.put(store, record.into_value()).await
    }

    pub async fn get(&self, store: &dyn ItemStore, key: &KeyTuple) -> Result<Option<T>> {
        self.entity
            .get(store, key)
            .await?
            .map(T::from_value)
            .transpose()
    }
}

fn check_record_fields(fields: &[facet_api::FieldDecl], schema: &MapAttribute) -> Result<()> {
    let mut problems = Vec::new();
    for (i, decl) in fields.iter().enumerate() {
        if fields[..i].iter().any(|d| d.name == decl.name) {
            problems.push(format!("record field '{}' declared twice", decl.name));
            continue;
        }
        let Some(attr) = schema.field(decl.name) else {
            problems.push(format!("record field '{}' is not in the schema", decl.name));
            continue;
        };
        let may_be_omitted = attr.is_optional() || attr.default_value().is_some();
        if decl.optional && !may_be_omitted {
            problems.push(format!(
                "record field '{}' is optional but the schema requires it",
                decl.name
            ));
        }
        if !decl.optional && attr.is_optional() {
            problems.push(format!(
                "record field '{}' is required but the schema marks it optional",
                decl.name
            ));
        }
    }
    for (name, _) in schema.fields() {
        if !fields.iter().any(|d| d.name == name.as_str()) {
            problems.push(format!("schema field '{name}' is missing from the record"));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(FacetError::SchemaMismatch(problems.join("; ")))
    }
}
