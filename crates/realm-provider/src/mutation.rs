//! User creation, field updates and role reconciliation.
//!
//! All writes made by one [`UserMutator::set_user_details`] call, the user
//! row update and every join row created or deleted, go to the schema as a
//! single [`ChangeSet`], so a failure leaves the stored roles unchanged.
//! [`UserMutator::create_user`] validates everything before the row is
//! written and removes the row if its role links cannot be committed.

use std::collections::BTreeSet;

use realm_model::{Filter, Record, RecordExt, Relationship, Value};
use realm_storage::{ChangeSet, Schema, SearchOptions, StorageError};

use crate::config::RealmConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::lookup::{LookupField, UserLookup};
use crate::roles::RoleResolver;

/// Generic key callers use for the username, whatever the column is called.
pub const USERNAME_KEY: &str = "username";
/// Generic key callers use for the reset code, whatever the column is called.
pub const RESET_CODE_KEY: &str = "pw_reset_code";

/// What a successful update changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailsUpdate {
    /// Username after the update.
    pub username: String,
    /// Columns written on the user row.
    pub columns: Vec<String>,
    /// Roles newly assigned.
    pub assigned: Vec<String>,
    /// Roles removed.
    pub removed: Vec<String>,
}

/// Writes user rows and role assignments for one realm.
pub struct UserMutator<'a> {
    config: &'a RealmConfig,
    schema: &'a dyn Schema,
}

fn rename(fields: &mut Record, generic: &str, column: &str) {
    if generic == column {
        return;
    }
    if let Some(value) = fields.remove(generic) {
        fields.entry(column.to_string()).or_insert(value);
    }
}

fn link_values(relationship: &Relationship, row: &Record, entity: &str) -> ProviderResult<Record> {
    relationship.link_values(row).ok_or_else(|| {
        StorageError::InvalidData(format!(
            "{entity} row lacks a key for relationship '{}'",
            relationship.name
        ))
        .into()
    })
}

impl<'a> UserMutator<'a> {
    /// Creates a mutator over `schema`.
    #[must_use]
    pub const fn new(config: &'a RealmConfig, schema: &'a dyn Schema) -> Self {
        Self { config, schema }
    }

    /// Creates a user row carrying the username, the remaining fields and the
    /// columns the valid-user predicate pins, then links the requested roles
    /// in one change set. If linking fails the new row is removed again.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Validation` if no username is given, if the
    /// roles value is not a map or list, or if the new row would not satisfy
    /// the valid-user predicate. Nothing is written in those cases. Schema
    /// errors (for example a duplicate username) are propagated.
    pub async fn create_user(&self, mut fields: Record) -> ProviderResult<DetailsUpdate> {
        let generic = fields.remove(USERNAME_KEY);
        let given = fields.remove(self.config.username_column()).or(generic);
        let username = given
            .as_ref()
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ProviderError::validation("username must be specified to create a user"))?
            .to_string();

        let desired = self.take_desired_roles(&mut fields)?;
        rename(&mut fields, RESET_CODE_KEY, self.config.pwresetcode_column());

        let mut update = DetailsUpdate {
            username: username.clone(),
            columns: fields.keys().cloned().collect(),
            ..DetailsUpdate::default()
        };

        let mut row = self.config.valid_user_filter().equalities();
        row.append(&mut fields);
        row.insert(self.config.username_column().to_string(), Value::from(username));
        if !self.config.valid_user_filter().matches(&row) {
            return Err(ProviderError::validation(format!(
                "new user '{}' would not satisfy the valid-user conditions",
                update.username
            )));
        }

        let user = self.schema.create(self.config.users_resultset(), row).await?;

        if let Some(desired) = desired {
            if let Err(e) = self.link_new_user(&user, &desired, &mut update).await {
                self.discard(&user).await;
                return Err(e);
            }
        }
        Ok(update)
    }

    async fn link_new_user(
        &self,
        user: &Record,
        desired: &BTreeSet<String>,
        update: &mut DetailsUpdate,
    ) -> ProviderResult<()> {
        let mut changes = ChangeSet::new();
        self.reconcile_roles(user, desired, &mut changes, update).await?;
        if !changes.is_empty() {
            self.schema.apply(changes).await?;
        }
        Ok(())
    }

    async fn discard(&self, user: &Record) {
        let filter = user
            .iter()
            .fold(Filter::new(), |filter, (column, value)| filter.and_eq(column.clone(), value.clone()));
        match self.schema.delete(self.config.users_resultset(), &filter).await {
            Ok(removed) => tracing::debug!(removed, "discarded partially created user"),
            Err(e) => tracing::warn!(error = %e, "could not discard partially created user"),
        }
    }

    /// Updates a user's columns and, if the roles key is present, reconciles
    /// their role assignments. Returns `None` if no valid user has that name.
    ///
    /// The generic `username` and `pw_reset_code` keys are written to the
    /// configured columns.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Validation` for an empty username or a roles
    /// value that is not a map, and propagates schema errors.
    pub async fn set_user_details(
        &self,
        username: &str,
        mut fields: Record,
    ) -> ProviderResult<Option<DetailsUpdate>> {
        if username.is_empty() {
            return Err(ProviderError::validation("username must be specified"));
        }

        let user_filter =
            UserLookup::new(self.config, self.schema).user_filter(&LookupField::Username, username);
        let Some(user) = self
            .schema
            .find(self.config.users_resultset(), &user_filter, &SearchOptions::new())
            .await?
        else {
            tracing::debug!(%username, "no such user to update");
            return Ok(None);
        };

        let desired = self.take_desired_roles(&mut fields)?;
        rename(&mut fields, RESET_CODE_KEY, self.config.pwresetcode_column());
        rename(&mut fields, USERNAME_KEY, self.config.username_column());

        let mut update = DetailsUpdate {
            username: fields
                .text(self.config.username_column())
                .unwrap_or(username)
                .to_string(),
            columns: fields.keys().cloned().collect(),
            ..DetailsUpdate::default()
        };

        let mut changes = ChangeSet::new();
        if !fields.is_empty() {
            changes.update(self.config.users_resultset(), user_filter, fields);
        }
        if let Some(desired) = desired {
            self.reconcile_roles(&user, &desired, &mut changes, &mut update)
                .await?;
        }
        if !changes.is_empty() {
            self.schema.apply(changes).await?;
        }
        Ok(Some(update))
    }

    fn take_desired_roles(&self, fields: &mut Record) -> ProviderResult<Option<BTreeSet<String>>> {
        let Some(key) = self.config.roles_key() else {
            return Ok(None);
        };
        match fields.remove(key) {
            Some(Value::Map(roles)) => Ok(Some(
                roles
                    .into_iter()
                    .filter(|(_, flag)| flag.is_truthy())
                    .map(|(role, _)| role)
                    .collect(),
            )),
            Some(Value::List(names)) => names
                .into_iter()
                .map(|name| match name {
                    Value::Text(name) => Ok(name),
                    other => Err(ProviderError::validation(format!(
                        "'{key}' lists a role that is not a name: {other}"
                    ))),
                })
                .collect::<ProviderResult<BTreeSet<_>>>()
                .map(Some),
            Some(value) if value.is_truthy() => Err(ProviderError::validation(format!(
                "'{key}' must map role names to flags or list them"
            ))),
            _ => Ok(None),
        }
    }

    /// Stages the join rows to create and delete so the user holds exactly
    /// `desired` (restricted to roles that exist).
    async fn reconcile_roles(
        &self,
        user: &Record,
        desired: &BTreeSet<String>,
        changes: &mut ChangeSet,
        update: &mut DetailsUpdate,
    ) -> ProviderResult<()> {
        let resolver = RoleResolver::new(self.config, self.schema);
        let universe = resolver.all_role_rows().await?;
        let current: BTreeSet<String> = resolver.roles_for_user(user).await?.into_iter().collect();

        let known: BTreeSet<String> = universe.iter().filter_map(|r| resolver.role_name(r)).collect();
        for unknown in desired.difference(&known) {
            tracing::warn!(role = %unknown, username = %update.username, "ignoring unknown role");
        }

        let users = self.config.users_resultset();
        let roles = self.config.roles_resultset();
        let join = self.config.user_roles_resultset();
        let user_link = link_values(self.config.user_user_roles(), user, users)?;

        let mut seen = BTreeSet::new();
        for role in &universe {
            let Some(name) = resolver.role_name(role) else {
                continue;
            };
            if !seen.insert(name.clone()) {
                continue;
            }

            match (desired.contains(&name), current.contains(&name)) {
                (true, false) => {
                    let mut row = user_link.clone();
                    row.extend(link_values(self.config.role_user_roles(), role, roles)?);
                    changes.create(join, row);
                    update.assigned.push(name);
                }
                (false, true) => {
                    let role_link = link_values(self.config.role_user_roles(), role, roles)?;
                    let filter = user_link
                        .iter()
                        .chain(&role_link)
                        .fold(Filter::new(), |filter, (column, value)| {
                            filter.and_eq(column.clone(), value.clone())
                        });
                    changes.delete(join, filter);
                    update.removed.push(name);
                }
                _ => {}
            }
        }
        Ok(())
    }
}
