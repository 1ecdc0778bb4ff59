//! Role resolution.
//!
//! Roles reach a user through the join entity: user rows link to join rows
//! via the user relationship, and each join row links to one role row.

use realm_model::{Condition, Filter, Record, RecordExt, Value};
use realm_storage::{Schema, SearchOptions};

use crate::config::RealmConfig;
use crate::error::ProviderResult;
use crate::lookup::{LookupField, UserLookup};

/// Resolves role memberships for one realm.
pub struct RoleResolver<'a> {
    config: &'a RealmConfig,
    schema: &'a dyn Schema,
}

impl<'a> RoleResolver<'a> {
    /// Creates a resolver over `schema`.
    #[must_use]
    pub const fn new(config: &'a RealmConfig, schema: &'a dyn Schema) -> Self {
        Self { config, schema }
    }

    /// Returns the role names of a user, or `None` if no valid user has that name.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn get_user_roles(&self, username: &str) -> ProviderResult<Option<Vec<String>>> {
        let options = SearchOptions::new().prefetch(format!(
            "{}.{}",
            self.config.user_user_roles().name,
            self.config.user_roles_role().name
        ));
        let lookup = UserLookup::new(self.config, self.schema);
        let Some(user) = lookup
            .find_user(&LookupField::Username, username, &options)
            .await?
        else {
            tracing::debug!(%username, "no such user");
            return Ok(None);
        };
        self.roles_for_user(&user).await.map(Some)
    }

    /// Returns the role names linked to a user row, in join-row order.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn roles_for_user(&self, user: &Record) -> ProviderResult<Vec<String>> {
        let roles = self.role_rows_for_user(user).await?;
        Ok(roles
            .iter()
            .filter_map(|role| self.role_name(role))
            .collect())
    }

    /// Returns the role rows linked to a user row, in join-row order.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn role_rows_for_user(&self, user: &Record) -> ProviderResult<Vec<Record>> {
        let Some(link_filter) = self.config.user_user_roles().related_filter(user) else {
            return Ok(Vec::new());
        };
        let links = self
            .schema
            .search(
                self.config.user_roles_resultset(),
                &link_filter,
                &SearchOptions::new(),
            )
            .await?;
        if links.is_empty() {
            return Ok(Vec::new());
        }

        let to_role = self.config.user_roles_role();
        let Some(column) = to_role.single_column() else {
            // Compound keys: one query per link.
            let mut roles = Vec::with_capacity(links.len());
            for link in &links {
                if let Some(filter) = to_role.related_filter(link) {
                    if let Some(role) = self
                        .schema
                        .find(self.config.roles_resultset(), &filter, &SearchOptions::new())
                        .await?
                    {
                        roles.push(role);
                    }
                }
            }
            return Ok(roles);
        };

        let keys: Vec<Value> = links
            .iter()
            .filter_map(|link| link.value(&column.local).cloned())
            .collect();
        let filter = Filter::new().with(column.foreign.clone(), Condition::In(keys));
        let candidates = self
            .schema
            .search(self.config.roles_resultset(), &filter, &SearchOptions::new())
            .await?;

        Ok(links
            .iter()
            .filter_map(|link| {
                let key = link.value(&column.local)?;
                candidates
                    .iter()
                    .find(|role| role.value(&column.foreign).is_some_and(|v| v.loosely_eq(key)))
                    .cloned()
            })
            .collect())
    }

    /// Returns every role row, in store order.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn all_role_rows(&self) -> ProviderResult<Vec<Record>> {
        Ok(self
            .schema
            .search(self.config.roles_resultset(), &Filter::new(), &SearchOptions::new())
            .await?)
    }

    /// Returns every role name, in store order.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn all_roles(&self) -> ProviderResult<Vec<String>> {
        let rows = self.all_role_rows().await?;
        Ok(rows.iter().filter_map(|role| self.role_name(role)).collect())
    }

    /// Reads the role name column of a role row. Text names are used as
    /// stored and integer names are rendered in decimal; any other value
    /// does not name a role.
    #[must_use]
    pub fn role_name(&self, role: &Record) -> Option<String> {
        let value = role.value(self.config.role_column())?;
        match value.as_str() {
            Some(name) => Some(name.to_string()),
            None => value.as_i64().map(|id| id.to_string()),
        }
    }
}
