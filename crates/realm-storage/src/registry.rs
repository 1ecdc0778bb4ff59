//! Registry of named schemas.
//!
//! Multi-schema deployments register each schema under an identifier; realms
//! pick theirs with the `schema_name` setting.

use std::sync::Arc;

use dashmap::DashMap;

use crate::schema::Schema;

/// Identifier used when a realm does not name a schema.
pub const DEFAULT_SCHEMA: &str = "default";

/// Registry mapping schema identifiers to schemas.
#[derive(Default)]
pub struct SchemaRegistry {
    schemas: DashMap<String, Arc<dyn Schema>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding a single schema under [`DEFAULT_SCHEMA`].
    #[must_use]
    pub fn single(schema: Arc<dyn Schema>) -> Self {
        let registry = Self::new();
        registry.register(DEFAULT_SCHEMA, schema);
        registry
    }

    /// Registers (or replaces) a schema.
    pub fn register(&self, name: impl Into<String>, schema: Arc<dyn Schema>) {
        self.schemas.insert(name.into(), schema);
    }

    /// Gets a schema by identifier; `None` selects [`DEFAULT_SCHEMA`].
    #[must_use]
    pub fn get(&self, name: Option<&str>) -> Option<Arc<dyn Schema>> {
        self.schemas
            .get(name.unwrap_or(DEFAULT_SCHEMA))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Lists registered identifiers.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("schemas", &self.names())
            .finish()
    }
}
