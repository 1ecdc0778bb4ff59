//! User lookup.

use realm_model::{Filter, Record, Value};
use realm_storage::{Schema, SearchOptions, StorageResult};

use crate::config::RealmConfig;

/// Column a user lookup matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupField {
    /// The realm's username column.
    Username,
    /// The realm's reset code column.
    ResetCode,
    /// Any other column, by literal name.
    Column(String),
}

impl LookupField {
    fn column<'a>(&'a self, config: &'a RealmConfig) -> &'a str {
        match self {
            Self::Username => config.username_column(),
            Self::ResetCode => config.pwresetcode_column(),
            Self::Column(column) => column,
        }
    }
}

impl From<&str> for LookupField {
    fn from(field: &str) -> Self {
        match field {
            "username" => Self::Username,
            "pw_reset_code" => Self::ResetCode,
            other => Self::Column(other.to_string()),
        }
    }
}

/// Builds and runs user queries for one realm.
///
/// Every call is a fresh query; nothing is cached.
pub struct UserLookup<'a> {
    config: &'a RealmConfig,
    schema: &'a dyn Schema,
}

impl<'a> UserLookup<'a> {
    /// Creates a lookup over `schema`.
    #[must_use]
    pub const fn new(config: &'a RealmConfig, schema: &'a dyn Schema) -> Self {
        Self { config, schema }
    }

    /// Builds the filter selecting valid users whose `field` equals `value`.
    ///
    /// The lookup equality replaces any valid-user condition on the same column.
    #[must_use]
    pub fn user_filter(&self, field: &LookupField, value: impl Into<Value>) -> Filter {
        self.config
            .valid_user_filter()
            .clone()
            .merge(&Filter::equals(field.column(self.config), value))
    }

    /// Finds every valid user whose `field` equals `value`.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn find_users(
        &self,
        field: &LookupField,
        value: impl Into<Value>,
        options: &SearchOptions,
    ) -> StorageResult<Vec<Record>> {
        let filter = self.user_filter(field, value);
        self.schema
            .search(self.config.users_resultset(), &filter, options)
            .await
    }

    /// Finds the first valid user whose `field` equals `value`.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn find_user(
        &self,
        field: &LookupField,
        value: impl Into<Value>,
        options: &SearchOptions,
    ) -> StorageResult<Option<Record>> {
        let filter = self.user_filter(field, value);
        self.schema
            .find(self.config.users_resultset(), &filter, options)
            .await
    }
}
