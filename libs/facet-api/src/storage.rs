use std::future::Future;
use std::pin::Pin;

use crate::attribute_value::Item;
use crate::error::Result;
use crate::key::KeyTuple;

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Storage collaborator.
///
/// The engine hands it fully formed items and receives the same shape back.
/// Network I/O, retries and request framing all live behind this trait; the
/// engine never talks to a store directly.
///
/// Implementations are constructed explicitly (with their key layout and any
/// client/credential state) and passed in.
pub trait ItemStore: Send + Sync {
    /// Write an item, replacing any item at the same primary key.
    fn put(&self, item: Item) -> StoreFuture<'_, ()>;

    /// Read the item at `key`.
    fn get(&self, key: &KeyTuple) -> StoreFuture<'_, Option<Item>>;

    /// Remove the item at `key`. Returns whether an item existed.
    fn delete(&self, key: &KeyTuple) -> StoreFuture<'_, bool>;

    /// Items whose `index` partition attribute equals `partition`, ordered by
    /// the index sort attribute. Items without the index attributes (sparse
    /// entries) are never returned.
    fn query_index(&self, index: &str, partition: &str) -> StoreFuture<'_, Vec<Item>>;
}
