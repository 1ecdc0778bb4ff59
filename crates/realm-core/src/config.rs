//! Realm settings.
//!
//! [`RealmSettings`] is the sparse, as-written form of one realm's options.
//! Every field is optional; defaults and relationship discovery are applied
//! when a provider resolves the settings against a schema.
//!
//! Settings are usually loaded from TOML:
//!
//! ```toml
//! [realms.staff]
//! users_source = "person"
//! users_username_column = "login"
//! roles_key = "roles"
//! password_expiry_days = 90
//! users_pwchanged_column = "pw_changed"
//!
//! [realms.staff.user_valid_conditions]
//! deleted = 0
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sparse settings for a single realm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmSettings {
    /// Schema identifier for multi-schema deployments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,

    /// Source name of the users entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_source: Option<String>,
    /// Source name of the roles entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_source: Option<String>,
    /// Source name of the user/role join entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_roles_source: Option<String>,

    /// Legacy alias for `users_source`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_table: Option<String>,
    /// Legacy alias for `roles_source`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_table: Option<String>,
    /// Legacy alias for `user_roles_source`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_roles_table: Option<String>,

    /// Resultset identifier of the users entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_resultset: Option<String>,
    /// Resultset identifier of the roles entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_resultset: Option<String>,
    /// Resultset identifier of the join entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_roles_resultset: Option<String>,

    /// Username column on the users entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_username_column: Option<String>,
    /// Password digest column on the users entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_password_column: Option<String>,
    /// Role name column on the roles entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_role_column: Option<String>,
    /// Last-login column on the users entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_lastlogin_column: Option<String>,
    /// Password reset code column on the users entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_pwresetcode_column: Option<String>,
    /// Password-changed timestamp column. No default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_pwchanged_column: Option<String>,

    /// Relationship from users to the join entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_user_roles_relationship: Option<String>,
    /// Relationship from roles to the join entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_user_roles_relationship: Option<String>,
    /// Relationship from the join entity back to users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_roles_user_relationship: Option<String>,
    /// Relationship from the join entity back to roles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_roles_role_relationship: Option<String>,

    /// Extra conditions a user row must satisfy to be visible,
    /// as `column => value` or `column => { op => value }`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_valid_conditions: Option<BTreeMap<String, serde_json::Value>>,

    /// Key under which user details carry a `{ role => true }` map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_key: Option<String>,

    /// Days after which a password counts as expired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_expiry_days: Option<u32>,

    /// Algorithm new passwords are hashed with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_algorithm: Option<String>,
}

macro_rules! string_setters {
    ($($(#[$doc:meta])* $name:ident;)*) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.$name = Some(value.into());
                self
            }
        )*
    };
}

impl RealmSettings {
    /// Creates empty settings; every option takes its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses settings for a single realm from TOML.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Parse` if the document is not valid TOML or has
    /// values of the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    string_setters! {
        /// Sets the schema identifier.
        schema_name;
        /// Sets the users source name.
        users_source;
        /// Sets the roles source name.
        roles_source;
        /// Sets the join entity source name.
        user_roles_source;
        /// Sets the legacy users table name.
        users_table;
        /// Sets the legacy roles table name.
        roles_table;
        /// Sets the legacy join table name.
        user_roles_table;
        /// Overrides the users resultset identifier.
        users_resultset;
        /// Overrides the roles resultset identifier.
        roles_resultset;
        /// Overrides the join resultset identifier.
        user_roles_resultset;
        /// Sets the username column.
        users_username_column;
        /// Sets the password column.
        users_password_column;
        /// Sets the role name column.
        roles_role_column;
        /// Sets the last-login column.
        users_lastlogin_column;
        /// Sets the reset code column.
        users_pwresetcode_column;
        /// Sets the password-changed column.
        users_pwchanged_column;
        /// Names the users to join relationship.
        user_user_roles_relationship;
        /// Names the roles to join relationship.
        role_user_roles_relationship;
        /// Names the join to users relationship.
        user_roles_user_relationship;
        /// Names the join to roles relationship.
        user_roles_role_relationship;
        /// Sets the roles container key.
        roles_key;
        /// Sets the hashing algorithm name.
        encryption_algorithm;
    }

    /// Adds one valid-user condition.
    #[must_use]
    pub fn user_valid_condition(
        mut self,
        column: impl Into<String>,
        condition: impl Into<serde_json::Value>,
    ) -> Self {
        self.user_valid_conditions
            .get_or_insert_with(BTreeMap::new)
            .insert(column.into(), condition.into());
        self
    }

    /// Sets the password expiry window in days.
    #[must_use]
    pub const fn password_expiry_days(mut self, days: u32) -> Self {
        self.password_expiry_days = Some(days);
        self
    }
}

/// Settings for every realm a process serves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Realm settings keyed by realm name.
    #[serde(default)]
    pub realms: BTreeMap<String, RealmSettings>,
}

impl ProviderSettings {
    /// Parses provider settings from TOML.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Parse` if the document is invalid.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads provider settings from a TOML file.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Parse`
    /// if it is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), realms = settings.realms.len(), "loaded realm settings");
        Ok(settings)
    }

    /// Gets the settings for one realm.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Config` if the realm is not configured.
    pub fn realm(&self, name: &str) -> Result<&RealmSettings> {
        self.realms
            .get(name)
            .ok_or_else(|| Error::config(format!("unknown realm: {name}")))
    }

    /// Adds or replaces a realm.
    #[must_use]
    pub fn with_realm(mut self, name: impl Into<String>, settings: RealmSettings) -> Self {
        self.realms.insert(name.into(), settings);
        self
    }
}
