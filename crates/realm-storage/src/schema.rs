//! Schema access facade.
//!
//! The provider never talks to a database directly. It addresses entities by
//! resultset name and reads or writes [`Record`]s through a [`Schema`]
//! implementation supplied by the embedding application.

use async_trait::async_trait;
use realm_model::{Filter, Record, Relationship};

use crate::error::StorageResult;

/// Options attached to a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Relationship paths to prefetch (`"user_roles.role"`). A hint only.
    pub prefetch: Vec<String>,
    /// Maximum rows to return.
    pub rows: Option<usize>,
}

impl SearchOptions {
    /// Creates empty search options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a prefetch path.
    #[must_use]
    pub fn prefetch(mut self, path: impl Into<String>) -> Self {
        self.prefetch.push(path.into());
        self
    }

    /// Limits the number of returned rows.
    #[must_use]
    pub const fn rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }
}

/// A single write operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert a row.
    Create {
        /// Target entity.
        entity: String,
        /// Column values.
        fields: Record,
    },
    /// Update every row matching the filter.
    Update {
        /// Target entity.
        entity: String,
        /// Rows to update.
        filter: Filter,
        /// Column values to set.
        fields: Record,
    },
    /// Delete every row matching the filter.
    Delete {
        /// Target entity.
        entity: String,
        /// Rows to delete.
        filter: Filter,
    },
}

impl Change {
    /// Returns the entity this change targets.
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::Create { entity, .. } | Self::Update { entity, .. } | Self::Delete { entity, .. } => {
                entity
            }
        }
    }
}

/// An ordered batch of writes committed atomically by [`Schema::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an insert.
    pub fn create(&mut self, entity: impl Into<String>, fields: Record) {
        self.changes.push(Change::Create {
            entity: entity.into(),
            fields,
        });
    }

    /// Queues an update.
    pub fn update(&mut self, entity: impl Into<String>, filter: Filter, fields: Record) {
        self.changes.push(Change::Update {
            entity: entity.into(),
            filter,
            fields,
        });
    }

    /// Queues a delete.
    pub fn delete(&mut self, entity: impl Into<String>, filter: Filter) {
        self.changes.push(Change::Delete {
            entity: entity.into(),
            filter,
        });
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns the number of queued changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Generic relational access used by realm providers.
///
/// Implementations must be thread-safe and support concurrent access. Every
/// call is a fresh query; nothing is cached across calls by the provider.
#[async_trait]
pub trait Schema: Send + Sync {
    /// Lists the relationships declared on an entity.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::UnknownEntity` if the entity does not exist.
    fn relationships(&self, entity: &str) -> StorageResult<Vec<Relationship>>;

    /// Returns the rows of `entity` matching `filter`, in storage order.
    async fn search(
        &self,
        entity: &str,
        filter: &Filter,
        options: &SearchOptions,
    ) -> StorageResult<Vec<Record>>;

    /// Returns the first row matching `filter`.
    async fn find(
        &self,
        entity: &str,
        filter: &Filter,
        options: &SearchOptions,
    ) -> StorageResult<Option<Record>> {
        let options = options.clone().rows(1);
        Ok(self.search(entity, filter, &options).await?.into_iter().next())
    }

    /// Inserts a row and returns it as stored (including generated keys).
    async fn create(&self, entity: &str, fields: Record) -> StorageResult<Record>;

    /// Sets `fields` on every row matching `filter`; returns the affected count.
    async fn update(&self, entity: &str, filter: &Filter, fields: Record) -> StorageResult<u64>;

    /// Deletes every row matching `filter`; returns the affected count.
    async fn delete(&self, entity: &str, filter: &Filter) -> StorageResult<u64>;

    /// Applies all changes atomically: either every change is committed or none is.
    async fn apply(&self, changes: ChangeSet) -> StorageResult<()>;
}
