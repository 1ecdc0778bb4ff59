//! Realm configuration resolution.
//!
//! [`RealmConfig::resolve`] turns sparse [`RealmSettings`] into a complete,
//! validated mapping of the realm onto its schema: entity identifiers,
//! column names, the four relationships linking users, roles and their join
//! entity, the valid-user predicate and the credential policy. The result is
//! immutable and shared by every engine of the realm.

use std::collections::BTreeMap;

use realm_auth::HashAlgorithm;
use realm_core::RealmSettings;
use realm_model::{Filter, JoinType, Multiplicity, Relationship};
use realm_storage::{Schema, StorageError, DEFAULT_SCHEMA};

use crate::error::{ProviderError, ProviderResult};
use crate::naming::camelize;

const DEFAULT_USERS_SOURCE: &str = "user";
const DEFAULT_ROLES_SOURCE: &str = "role";
const DEFAULT_USER_ROLES_SOURCE: &str = "user_role";
const DEFAULT_USERNAME_COLUMN: &str = "username";
const DEFAULT_PASSWORD_COLUMN: &str = "password";
const DEFAULT_ROLE_COLUMN: &str = "role";
const DEFAULT_LASTLOGIN_COLUMN: &str = "lastlogin";
const DEFAULT_PWRESETCODE_COLUMN: &str = "pw_reset_code";

/// Fully resolved realm configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RealmConfig {
    schema_name: String,
    users_source: String,
    roles_source: String,
    user_roles_source: String,
    users_resultset: String,
    roles_resultset: String,
    user_roles_resultset: String,
    username_column: String,
    password_column: String,
    role_column: String,
    lastlogin_column: String,
    pwresetcode_column: String,
    pwchanged_column: Option<String>,
    user_user_roles: Relationship,
    role_user_roles: Relationship,
    user_roles_user: Relationship,
    user_roles_role: Relationship,
    valid_user_conditions: Option<BTreeMap<String, serde_json::Value>>,
    valid_user_filter: Filter,
    roles_key: Option<String>,
    password_expiry_days: Option<u32>,
    algorithm: HashAlgorithm,
}

fn pick(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .find_map(|c| c.as_deref().filter(|s| !s.is_empty()))
        .map(str::to_string)
}

fn relationships_of(schema: &dyn Schema, entity: &str) -> ProviderResult<Vec<Relationship>> {
    schema.relationships(entity).map_err(|e| match e {
        StorageError::UnknownEntity(name) => {
            ProviderError::config(format!("schema has no entity named '{name}'"))
        }
        other => other.into(),
    })
}

/// Finds the relationship leading from `source` to the join entity.
fn forward_relationship(
    schema: &dyn Schema,
    source: &str,
    join: &str,
    explicit: Option<&str>,
    setting: &str,
) -> ProviderResult<Relationship> {
    let declared = relationships_of(schema, source)?;

    if let Some(name) = explicit {
        let rel = declared.into_iter().find(|r| r.name == name).ok_or_else(|| {
            ProviderError::config(format!("{setting}: '{source}' has no relationship '{name}'"))
        })?;
        if rel.target != join {
            return Err(ProviderError::config(format!(
                "{setting}: relationship '{name}' targets '{}', not '{join}'",
                rel.target
            )));
        }
        return Ok(rel);
    }

    let mut candidates: Vec<Relationship> = declared
        .into_iter()
        .filter(|r| {
            r.target == join
                && r.multiplicity == Multiplicity::Many
                && r.join_type == JoinType::Left
                && r.single_column().is_some()
        })
        .collect();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(ProviderError::config(format!(
            "no has-many relationship from '{source}' to '{join}'; set {setting}"
        ))),
        _ => Err(ProviderError::config(format!(
            "ambiguous relationship from '{source}' to '{join}' ({}); set {setting}",
            candidates
                .iter()
                .map(|r| r.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Finds the relationship leading from the join entity back to `target`.
///
/// A schema that does not declare one gets it synthesised from `forward`.
fn inverse_relationship(
    schema: &dyn Schema,
    join: &str,
    target: &str,
    forward: &Relationship,
    explicit: Option<&str>,
    default_name: &str,
    setting: &str,
) -> ProviderResult<Relationship> {
    let declared = relationships_of(schema, join)?;

    if let Some(name) = explicit {
        return match declared.into_iter().find(|r| r.name == name) {
            Some(rel) if rel.target == target => Ok(rel),
            Some(rel) => Err(ProviderError::config(format!(
                "{setting}: relationship '{name}' targets '{}', not '{target}'",
                rel.target
            ))),
            None => Ok(forward.inverse(name, target)),
        };
    }

    let mut candidates: Vec<Relationship> = declared
        .into_iter()
        .filter(|r| r.is_inverse_of(forward, target))
        .collect();

    match candidates.len() {
        0 => Ok(forward.inverse(default_name, target)),
        1 => Ok(candidates.remove(0)),
        _ => Err(ProviderError::config(format!(
            "ambiguous relationship from '{join}' to '{target}'; set {setting}"
        ))),
    }
}

impl RealmConfig {
    /// Resolves realm settings against a schema.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Config` if an entity or named relationship is
    /// missing, relationship discovery is ambiguous, the valid-user predicate
    /// does not parse, the algorithm is unknown, or password expiry is set
    /// without a password-changed column.
    pub fn resolve(settings: &RealmSettings, schema: &dyn Schema) -> ProviderResult<Self> {
        let users_source = pick(&[&settings.users_source, &settings.users_table])
            .unwrap_or_else(|| DEFAULT_USERS_SOURCE.to_string());
        let roles_source = pick(&[&settings.roles_source, &settings.roles_table])
            .unwrap_or_else(|| DEFAULT_ROLES_SOURCE.to_string());
        let user_roles_source = pick(&[&settings.user_roles_source, &settings.user_roles_table])
            .unwrap_or_else(|| DEFAULT_USER_ROLES_SOURCE.to_string());

        let users_resultset =
            pick(&[&settings.users_resultset]).unwrap_or_else(|| camelize(&users_source));
        let roles_resultset =
            pick(&[&settings.roles_resultset]).unwrap_or_else(|| camelize(&roles_source));
        let user_roles_resultset = pick(&[&settings.user_roles_resultset])
            .unwrap_or_else(|| camelize(&user_roles_source));

        let user_user_roles = forward_relationship(
            schema,
            &users_resultset,
            &user_roles_resultset,
            settings.user_user_roles_relationship.as_deref(),
            "user_user_roles_relationship",
        )?;
        let role_user_roles = forward_relationship(
            schema,
            &roles_resultset,
            &user_roles_resultset,
            settings.role_user_roles_relationship.as_deref(),
            "role_user_roles_relationship",
        )?;
        let user_roles_user = inverse_relationship(
            schema,
            &user_roles_resultset,
            &users_resultset,
            &user_user_roles,
            settings.user_roles_user_relationship.as_deref(),
            &users_source,
            "user_roles_user_relationship",
        )?;
        let user_roles_role = inverse_relationship(
            schema,
            &user_roles_resultset,
            &roles_resultset,
            &role_user_roles,
            settings.user_roles_role_relationship.as_deref(),
            &roles_source,
            "user_roles_role_relationship",
        )?;

        let valid_user_filter = settings
            .user_valid_conditions
            .as_ref()
            .map(Filter::from_json_map)
            .transpose()?
            .unwrap_or_default();

        let pwchanged_column = pick(&[&settings.users_pwchanged_column]);
        if settings.password_expiry_days.is_some() && pwchanged_column.is_none() {
            return Err(ProviderError::config(
                "password_expiry_days requires users_pwchanged_column",
            ));
        }

        let algorithm = match settings.encryption_algorithm.as_deref() {
            Some(name) if !name.is_empty() => name
                .parse::<HashAlgorithm>()
                .map_err(|e| ProviderError::config(e.to_string()))?,
            _ => HashAlgorithm::default(),
        };

        let config = Self {
            schema_name: pick(&[&settings.schema_name]).unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            users_source,
            roles_source,
            user_roles_source,
            users_resultset,
            roles_resultset,
            user_roles_resultset,
            username_column: pick(&[&settings.users_username_column])
                .unwrap_or_else(|| DEFAULT_USERNAME_COLUMN.to_string()),
            password_column: pick(&[&settings.users_password_column])
                .unwrap_or_else(|| DEFAULT_PASSWORD_COLUMN.to_string()),
            role_column: pick(&[&settings.roles_role_column])
                .unwrap_or_else(|| DEFAULT_ROLE_COLUMN.to_string()),
            lastlogin_column: pick(&[&settings.users_lastlogin_column])
                .unwrap_or_else(|| DEFAULT_LASTLOGIN_COLUMN.to_string()),
            pwresetcode_column: pick(&[&settings.users_pwresetcode_column])
                .unwrap_or_else(|| DEFAULT_PWRESETCODE_COLUMN.to_string()),
            pwchanged_column,
            user_user_roles,
            role_user_roles,
            user_roles_user,
            user_roles_role,
            valid_user_conditions: settings.user_valid_conditions.clone(),
            valid_user_filter,
            roles_key: pick(&[&settings.roles_key]),
            password_expiry_days: settings.password_expiry_days,
            algorithm,
        };

        tracing::debug!(
            users = %config.users_resultset,
            roles = %config.roles_resultset,
            user_roles = %config.user_roles_resultset,
            user_user_roles = %config.user_user_roles.name,
            user_roles_role = %config.user_roles_role.name,
            "resolved realm configuration"
        );
        Ok(config)
    }

    /// Returns settings with every option filled in from this configuration.
    ///
    /// Resolving them against the same schema yields an equal configuration.
    #[must_use]
    pub fn to_settings(&self) -> RealmSettings {
        RealmSettings {
            schema_name: Some(self.schema_name.clone()),
            users_source: Some(self.users_source.clone()),
            roles_source: Some(self.roles_source.clone()),
            user_roles_source: Some(self.user_roles_source.clone()),
            users_table: None,
            roles_table: None,
            user_roles_table: None,
            users_resultset: Some(self.users_resultset.clone()),
            roles_resultset: Some(self.roles_resultset.clone()),
            user_roles_resultset: Some(self.user_roles_resultset.clone()),
            users_username_column: Some(self.username_column.clone()),
            users_password_column: Some(self.password_column.clone()),
            roles_role_column: Some(self.role_column.clone()),
            users_lastlogin_column: Some(self.lastlogin_column.clone()),
            users_pwresetcode_column: Some(self.pwresetcode_column.clone()),
            users_pwchanged_column: self.pwchanged_column.clone(),
            user_user_roles_relationship: Some(self.user_user_roles.name.clone()),
            role_user_roles_relationship: Some(self.role_user_roles.name.clone()),
            user_roles_user_relationship: Some(self.user_roles_user.name.clone()),
            user_roles_role_relationship: Some(self.user_roles_role.name.clone()),
            user_valid_conditions: self.valid_user_conditions.clone(),
            roles_key: self.roles_key.clone(),
            password_expiry_days: self.password_expiry_days,
            encryption_algorithm: Some(self.algorithm.name().to_string()),
        }
    }

    /// Schema identifier.
    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Users entity identifier.
    #[must_use]
    pub fn users_resultset(&self) -> &str {
        &self.users_resultset
    }

    /// Roles entity identifier.
    #[must_use]
    pub fn roles_resultset(&self) -> &str {
        &self.roles_resultset
    }

    /// Join entity identifier.
    #[must_use]
    pub fn user_roles_resultset(&self) -> &str {
        &self.user_roles_resultset
    }

    /// Username column.
    #[must_use]
    pub fn username_column(&self) -> &str {
        &self.username_column
    }

    /// Password digest column.
    #[must_use]
    pub fn password_column(&self) -> &str {
        &self.password_column
    }

    /// Role name column.
    #[must_use]
    pub fn role_column(&self) -> &str {
        &self.role_column
    }

    /// Last-login column.
    #[must_use]
    pub fn lastlogin_column(&self) -> &str {
        &self.lastlogin_column
    }

    /// Reset code column.
    #[must_use]
    pub fn pwresetcode_column(&self) -> &str {
        &self.pwresetcode_column
    }

    /// Password-changed column, if configured.
    #[must_use]
    pub fn pwchanged_column(&self) -> Option<&str> {
        self.pwchanged_column.as_deref()
    }

    /// Relationship from users to the join entity.
    #[must_use]
    pub const fn user_user_roles(&self) -> &Relationship {
        &self.user_user_roles
    }

    /// Relationship from roles to the join entity.
    #[must_use]
    pub const fn role_user_roles(&self) -> &Relationship {
        &self.role_user_roles
    }

    /// Relationship from the join entity to users.
    #[must_use]
    pub const fn user_roles_user(&self) -> &Relationship {
        &self.user_roles_user
    }

    /// Relationship from the join entity to roles.
    #[must_use]
    pub const fn user_roles_role(&self) -> &Relationship {
        &self.user_roles_role
    }

    /// Predicate every visible user row satisfies.
    #[must_use]
    pub const fn valid_user_filter(&self) -> &Filter {
        &self.valid_user_filter
    }

    /// Roles container key, if configured.
    #[must_use]
    pub fn roles_key(&self) -> Option<&str> {
        self.roles_key.as_deref()
    }

    /// Password expiry window in days, if configured.
    #[must_use]
    pub const fn password_expiry_days(&self) -> Option<u32> {
        self.password_expiry_days
    }

    /// Algorithm new passwords are hashed with.
    #[must_use]
    pub const fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}
