//! Schema Registry
//!
//! Per-session mapping from object model type identity to the schema built
//! for it. A record is registered before any of its fields are built, so a
//! type that refers to itself (directly or through other types) resolves to
//! its name instead of recursing.

use std::collections::HashMap;

use tracing::debug;

use crate::schema::Schema;

/// Schemas defined so far in one build session
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the schema for a type, returning whatever was registered before
    ///
    /// Entries are never removed. A polymorphic type reached again through one
    /// of its own subtypes can be registered twice; the outer registration wins.
    pub fn register(&mut self, type_id: impl Into<String>, schema: Schema) -> Option<Schema> {
        let type_id = type_id.into();
        debug!(type_id = %type_id, kind = %schema.kind(), "registered schema");
        self.schemas.insert(type_id, schema)
    }

    /// Replace an in-progress entry with the finished schema
    pub fn complete(&mut self, type_id: &str, schema: &Schema) {
        if let Some(entry) = self.schemas.get_mut(type_id) {
            *entry = schema.clone();
        }
    }

    pub fn get(&self, type_id: &str) -> Option<&Schema> {
        self.schemas.get(type_id)
    }

    /// The schema a later use of `type_id` should embed
    ///
    /// Named schemas come back as references, so each name is defined once
    /// and in-progress records are never copied.
    pub fn reference(&self, type_id: &str) -> Option<Schema> {
        self.schemas.get(type_id).map(Schema::to_reference)
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.schemas.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered type identities, sorted
    pub fn type_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.schemas.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
