//! In-memory schema.
//!
//! A complete [`Schema`] implementation over process memory: entities with an
//! auto-increment primary key, optional unique columns, declared
//! relationships, and insertion-ordered rows. Change sets are applied to a
//! copy of the tables and swapped in only if every change succeeds.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use realm_model::{Filter, Record, Relationship, Value};

use crate::error::{StorageError, StorageResult};
use crate::schema::{Change, ChangeSet, Schema, SearchOptions};

/// Declaration of an in-memory entity.
#[derive(Debug, Clone)]
pub struct EntityDefinition {
    name: String,
    primary_key: String,
    unique: Vec<String>,
    relationships: Vec<Relationship>,
}

impl EntityDefinition {
    /// Declares an entity with an integer `id` primary key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: "id".to_string(),
            unique: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Sets the primary key column.
    #[must_use]
    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    /// Declares a unique column.
    #[must_use]
    pub fn unique(mut self, column: impl Into<String>) -> Self {
        self.unique.push(column.into());
        self
    }

    /// Declares a relationship.
    #[must_use]
    pub fn relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Declares a `has_many` relationship.
    #[must_use]
    pub fn has_many(self, name: &str, target: &str, foreign: &str, local: &str) -> Self {
        self.relationship(Relationship::has_many(name, target, foreign, local))
    }

    /// Declares a `belongs_to` relationship.
    #[must_use]
    pub fn belongs_to(self, name: &str, target: &str, foreign: &str, local: &str) -> Self {
        self.relationship(Relationship::belongs_to(name, target, foreign, local))
    }
}

#[derive(Debug, Clone)]
struct Table {
    definition: EntityDefinition,
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    fn new(definition: EntityDefinition) -> Self {
        Self {
            definition,
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn check_unique(&self, candidate: &Record, skip: Option<usize>) -> StorageResult<()> {
        let keys = std::iter::once(&self.definition.primary_key).chain(&self.definition.unique);
        for column in keys {
            let Some(value) = candidate.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = self
                .rows
                .iter()
                .enumerate()
                .any(|(i, row)| Some(i) != skip && row.get(column) == Some(value));
            if clash {
                return Err(StorageError::constraint(
                    &self.definition.name,
                    format!("duplicate {column} '{value}'"),
                ));
            }
        }
        Ok(())
    }

    fn insert(&mut self, mut fields: Record) -> StorageResult<Record> {
        let pk = self.definition.primary_key.clone();
        match fields.get(&pk) {
            Some(Value::Integer(id)) => self.next_id = self.next_id.max(id + 1),
            Some(value) if !value.is_null() => {}
            _ => {
                fields.insert(pk, Value::Integer(self.next_id));
                self.next_id += 1;
            }
        }
        self.check_unique(&fields, None)?;
        self.rows.push(fields.clone());
        Ok(fields)
    }

    fn update(&mut self, filter: &Filter, fields: &Record) -> StorageResult<u64> {
        let matching: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(i, _)| i)
            .collect();

        for &i in &matching {
            let mut updated = self.rows[i].clone();
            updated.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
            self.check_unique(&updated, Some(i))?;
            self.rows[i] = updated;
        }
        Ok(matching.len() as u64)
    }

    fn delete(&mut self, filter: &Filter) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|row| !filter.matches(row));
        (before - self.rows.len()) as u64
    }
}

type Tables = BTreeMap<String, Table>;

fn table_mut<'a>(tables: &'a mut Tables, entity: &str) -> StorageResult<&'a mut Table> {
    tables
        .get_mut(entity)
        .ok_or_else(|| StorageError::unknown_entity(entity))
}

fn apply_change(tables: &mut Tables, change: Change) -> StorageResult<()> {
    match change {
        Change::Create { entity, fields } => {
            table_mut(tables, &entity)?.insert(fields)?;
        }
        Change::Update {
            entity,
            filter,
            fields,
        } => {
            table_mut(tables, &entity)?.update(&filter, &fields)?;
        }
        Change::Delete { entity, filter } => {
            table_mut(tables, &entity)?.delete(&filter);
        }
    }
    Ok(())
}

/// In-memory [`Schema`] implementation.
#[derive(Debug, Default)]
pub struct MemorySchema {
    tables: RwLock<Tables>,
}

impl MemorySchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity (builder style).
    #[must_use]
    pub fn with_entity(self, definition: EntityDefinition) -> Self {
        self.define(definition);
        self
    }

    /// Adds or replaces an entity. Existing rows of a replaced entity are dropped.
    pub fn define(&self, definition: EntityDefinition) {
        self.tables
            .write()
            .insert(definition.name.clone(), Table::new(definition));
    }

    /// Returns a snapshot of every row of an entity.
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::UnknownEntity` if the entity does not exist.
    pub fn rows(&self, entity: &str) -> StorageResult<Vec<Record>> {
        self.tables
            .read()
            .get(entity)
            .map(|t| t.rows.clone())
            .ok_or_else(|| StorageError::unknown_entity(entity))
    }

    /// Inserts a row synchronously (fixture loading).
    ///
    /// ## Errors
    ///
    /// Returns `StorageError::UnknownEntity` or `StorageError::Constraint`.
    pub fn insert(&self, entity: &str, fields: Record) -> StorageResult<Record> {
        table_mut(&mut self.tables.write(), entity)?.insert(fields)
    }
}

#[async_trait]
impl Schema for MemorySchema {
    fn relationships(&self, entity: &str) -> StorageResult<Vec<Relationship>> {
        self.tables
            .read()
            .get(entity)
            .map(|t| t.definition.relationships.clone())
            .ok_or_else(|| StorageError::unknown_entity(entity))
    }

    async fn search(
        &self,
        entity: &str,
        filter: &Filter,
        options: &SearchOptions,
    ) -> StorageResult<Vec<Record>> {
        let tables = self.tables.read();
        let table = tables
            .get(entity)
            .ok_or_else(|| StorageError::unknown_entity(entity))?;

        let limit = options.rows.unwrap_or(usize::MAX);
        Ok(table
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create(&self, entity: &str, fields: Record) -> StorageResult<Record> {
        self.insert(entity, fields)
    }

    async fn update(&self, entity: &str, filter: &Filter, fields: Record) -> StorageResult<u64> {
        let mut tables = self.tables.write();
        let mut staged = table_mut(&mut tables, entity)?.clone();
        let count = staged.update(filter, &fields)?;
        tables.insert(entity.to_string(), staged);
        Ok(count)
    }

    async fn delete(&self, entity: &str, filter: &Filter) -> StorageResult<u64> {
        Ok(table_mut(&mut self.tables.write(), entity)?.delete(filter))
    }

    async fn apply(&self, changes: ChangeSet) -> StorageResult<()> {
        let count = changes.len();
        let mut tables = self.tables.write();
        let mut staged = tables.clone();
        for change in changes {
            let entity = change.entity().to_string();
            if let Err(e) = apply_change(&mut staged, change) {
                tracing::debug!(error = %e, %entity, changes = count, "change set rolled back");
                return Err(e);
            }
        }
        *tables = staged;
        tracing::trace!(changes = count, "change set committed");
        Ok(())
    }
}
