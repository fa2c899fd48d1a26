// In-memory document store for prototyping handlers

use crate::RuntimeError;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A named collection of JSON documents keyed by string id.
///
/// Documents are plain JSON objects; the `id` field is the primary key and is
/// minted as a UUID when the caller does not supply one. Clones share the
/// same underlying data.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    docs: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document. The document must be a JSON object; an existing
    /// `id` field is honored, otherwise one is generated. Inserting an id
    /// that already exists is an error.
    pub fn insert(&self, mut document: Value) -> Result<Value, RuntimeError> {
        let fields = document.as_object_mut().ok_or_else(|| {
            RuntimeError::new("INVALID_DOCUMENT").message("documents must be JSON objects")
        })?;

        let id = match fields.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                fields.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        };

        let mut docs = self.docs.write();
        if docs.contains_key(&id) {
            return Err(RuntimeError::new("DUPLICATE_ID").info(json!({ "id": id })));
        }
        docs.insert(id, document.clone());
        Ok(document)
    }

    /// Insert or shallow-merge into an existing document. Unlike `insert`,
    /// the caller must supply the `id`.
    pub fn upsert(&self, document: Value) -> Result<Value, RuntimeError> {
        let fields = document.as_object().ok_or_else(|| {
            RuntimeError::new("INVALID_DOCUMENT").message("documents must be JSON objects")
        })?;
        let id = fields
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RuntimeError::new("UPSERT_REQUIRES_ID"))?;

        let mut docs = self.docs.write();
        let merged = match docs.get(&id) {
            Some(existing) => shallow_merge(existing, fields),
            None => document,
        };
        docs.insert(id, merged.clone());
        Ok(merged)
    }

    /// Shallow-merge `changes` into the document with `id`. Returns the
    /// updated document, or None when the id is unknown.
    pub fn update(&self, id: &str, changes: &Value) -> Option<Value> {
        let changes = changes.as_object()?;
        let mut docs = self.docs.write();
        let existing = docs.get(id)?;
        let merged = shallow_merge(existing, changes);
        docs.insert(id.to_string(), merged.clone());
        Some(merged)
    }

    pub fn find_by_id(&self, id: &str) -> Option<Value> {
        self.docs.read().get(id).cloned()
    }

    /// All documents matching the predicate, in id order
    pub fn find<P: Fn(&Value) -> bool>(&self, predicate: P) -> Vec<Value> {
        self.docs
            .read()
            .values()
            .filter(|doc| predicate(doc))
            .cloned()
            .collect()
    }

    /// Remove a document, returning it when present
    pub fn delete(&self, id: &str) -> Option<Value> {
        self.docs.write().remove(id)
    }

    pub fn all(&self) -> Vec<Value> {
        self.docs.read().values().cloned().collect()
    }

    pub fn count(&self) -> usize {
        self.docs.read().len()
    }

    pub fn clear(&self) {
        self.docs.write().clear();
    }
}

fn shallow_merge(existing: &Value, changes: &Map<String, Value>) -> Value {
    let mut merged = existing
        .as_object()
        .cloned()
        .unwrap_or_default();
    for (key, value) in changes {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

/// A set of named collections, created on demand
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the named collection, creating it if absent
    pub fn collection(&self, name: &str) -> Collection {
        let mut collections = self.collections.write();
        collections.entry(name.to_string()).or_default().clone()
    }

    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<_> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every collection and its contents
    pub fn reset(&self) {
        self.collections.write().clear();
    }
}
