use std::collections::BTreeMap;

use tokio::sync::RwLock;

use facet_api::{
    AttributeValue, FacetError, Item, ItemStore, KeySchema, KeyTuple, Result, StoreFuture,
};

// ═══════════════════════════════════════════════════════════════
//  MemoryItemStore
// ═══════════════════════════════════════════════════════════════

/// In-memory single-table store. Items are kept ordered by primary key, so
/// scans and index queries are deterministic.
pub struct MemoryItemStore {
    keys: KeySchema,
    items: RwLock<BTreeMap<KeyTuple, Item>>,
}

impl MemoryItemStore {
    pub fn new(keys: KeySchema) -> Self {
        Self {
            keys,
            items: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn keys(&self) -> &KeySchema {
        &self.keys
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn string_attr<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
        item.get(name).and_then(AttributeValue::as_s)
    }

    fn primary_key(&self, item: &Item) -> Result<KeyTuple> {
        let partition = Self::string_attr(item, &self.keys.partition_key).ok_or_else(|| {
            FacetError::Storage(format!(
                "item has no string attribute '{}'",
                self.keys.partition_key
            ))
        })?;
        let sort = Self::string_attr(item, &self.keys.sort_key).ok_or_else(|| {
            FacetError::Storage(format!("item has no string attribute '{}'", self.keys.sort_key))
        })?;
        Ok(KeyTuple::new(partition, sort))
    }
}

impl ItemStore for MemoryItemStore {
    fn put(&self, item: Item) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let key = self.primary_key(&item)?;
            tracing::debug!(key = %key, attributes = item.len(), "put");
            self.items.write().await.insert(key, item);
            Ok(())
        })
    }

    fn get(&self, key: &KeyTuple) -> StoreFuture<'_, Option<Item>> {
        let key = key.clone();
        Box::pin(async move { Ok(self.items.read().await.get(&key).cloned()) })
    }

    fn delete(&self, key: &KeyTuple) -> StoreFuture<'_, bool> {
        let key = key.clone();
        Box::pin(async move {
            let existed = self.items.write().await.remove(&key).is_some();
            tracing::debug!(key = %key, existed, "delete");
            Ok(existed)
        })
    }

    fn query_index(&self, index: &str, partition: &str) -> StoreFuture<'_, Vec<Item>> {
        let index = index.to_string();
        let partition = partition.to_string();
        Box::pin(async move {
            let names = self
                .keys
                .index(&index)
                .ok_or_else(|| FacetError::Storage(format!("unknown index '{index}'")))?;

            let items = self.items.read().await;
            let mut matched: Vec<(&str, &Item)> = items
                .values()
                .filter(|item| Self::string_attr(item, &names.partition_key) == Some(partition.as_str()))
                .filter_map(|item| {
                    Self::string_attr(item, &names.sort_key).map(|sort| (sort, item))
                })
                .collect();
            matched.sort_by(|a, b| a.0.cmp(b.0));

            tracing::debug!(index = %index, partition = %partition, found = matched.len(), "query_index");
            Ok(matched.into_iter().map(|(_, item)| item.clone()).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_api::{ErrorKind, IndexKeyNames};

    fn store() -> MemoryItemStore {
        let mut keys = KeySchema::default();
        keys.indexes.push(IndexKeyNames {
            name: "gsi1".into(),
            partition_key: "gsi1pk".into(),
            sort_key: "gsi1sk".into(),
        });
        MemoryItemStore::new(keys)
    }

    fn item(pairs: &[(&str, &str)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::S(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = store();
        store
            .put(item(&[("pk", "user#1"), ("sk", "user"), ("name", "Ann")]))
            .await
            .unwrap();

        let key = KeyTuple::new("user#1", "user");
        let got = store.get(&key).await.unwrap().unwrap();
        assert_eq!(got["name"], AttributeValue::S("Ann".into()));

        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_item_at_same_key() {
        let store = store();
        store.put(item(&[("pk", "a"), ("sk", "b"), ("v", "1")])).await.unwrap();
        store.put(item(&[("pk", "a"), ("sk", "b"), ("v", "2")])).await.unwrap();
        assert_eq!(store.len().await, 1);
        let got = store.get(&KeyTuple::new("a", "b")).await.unwrap().unwrap();
        assert_eq!(got["v"], AttributeValue::S("2".into()));
    }

    #[tokio::test]
    async fn put_without_primary_key_fails() {
        let err = store().put(item(&[("pk", "a")])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[tokio::test]
    async fn query_index_skips_sparse_items_and_orders_by_sort_key() {
        let store = store();
        store
            .put(item(&[("pk", "u#1"), ("sk", "u"), ("gsi1pk", "org#1"), ("gsi1sk", "b")]))
            .await
            .unwrap();
        store
            .put(item(&[("pk", "u#2"), ("sk", "u"), ("gsi1pk", "org#1"), ("gsi1sk", "a")]))
            .await
            .unwrap();
        store.put(item(&[("pk", "u#3"), ("sk", "u")])).await.unwrap();
        store
            .put(item(&[("pk", "u#4"), ("sk", "u"), ("gsi1pk", "org#2"), ("gsi1sk", "a")]))
            .await
            .unwrap();

        let found = store.query_index("gsi1", "org#1").await.unwrap();
        let pks: Vec<&str> = found.iter().map(|i| i["pk"].as_s().unwrap()).collect();
        assert_eq!(pks, vec!["u#2", "u#1"]);
    }

    #[tokio::test]
    async fn query_unknown_index_fails() {
        let err = store().query_index("gsi9", "x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }
}
