//! Realm provider facade.
//!
//! [`RealmProvider`] is the single entry point an authentication framework
//! talks to. It owns the resolved configuration of one realm and its
//! collaborators (schema, password hasher, session store) and composes the
//! lookup, role, credential and mutation engines into one API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use realm_auth::{PasswordHasher, SessionStore};
use realm_core::{Event, EventType, ProviderSettings, RealmSettings};
use realm_model::{Record, RecordExt, Value};
use realm_storage::{Schema, SchemaRegistry, SearchOptions};

use crate::config::RealmConfig;
use crate::credential::Credentials;
use crate::error::{ProviderError, ProviderResult};
use crate::lookup::{LookupField, UserLookup};
use crate::mutation::{DetailsUpdate, UserMutator};
use crate::roles::RoleResolver;

/// Options for [`RealmProvider::authenticate`].
#[derive(Debug, Clone, Default)]
pub struct AuthOptions {
    /// Session key to receive the previous last-login time; also turns on
    /// last-login tracking.
    pub lastlogin: Option<String>,
}

impl AuthOptions {
    /// Creates default options (no last-login tracking).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks last login, writing the previous value under `session_key`.
    #[must_use]
    pub fn lastlogin(mut self, session_key: impl Into<String>) -> Self {
        self.lastlogin = Some(session_key.into());
        self
    }
}

/// User and role provider for one realm.
pub struct RealmProvider {
    name: String,
    config: Arc<RealmConfig>,
    schema: Arc<dyn Schema>,
    hasher: Arc<dyn PasswordHasher>,
    session: Option<Arc<dyn SessionStore>>,
}

impl std::fmt::Debug for RealmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmProvider")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("session", &self.session.is_some())
            .finish_non_exhaustive()
    }
}

impl RealmProvider {
    /// Creates a provider from an already resolved configuration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        config: RealmConfig,
        schema: Arc<dyn Schema>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            schema,
            hasher,
            session: None,
        }
    }

    /// Resolves realm settings against the schema they name and builds a provider.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Config` if the schema is not registered or the
    /// settings do not resolve.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &RealmSettings,
        registry: &SchemaRegistry,
        hasher: Arc<dyn PasswordHasher>,
    ) -> ProviderResult<Self> {
        let name = name.into();
        let schema = registry.get(settings.schema_name.as_deref()).ok_or_else(|| {
            ProviderError::config(format!(
                "realm '{name}': schema '{}' is not registered",
                settings.schema_name.as_deref().unwrap_or(realm_storage::DEFAULT_SCHEMA)
            ))
        })?;
        let config = RealmConfig::resolve(settings, schema.as_ref())?;
        tracing::info!(realm = %name, schema = %config.schema_name(), "realm provider ready");
        Ok(Self::new(name, config, schema, hasher))
    }

    /// Builds the provider for a realm named in provider settings.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Config` if the realm is not configured or
    /// does not resolve.
    pub fn for_realm(
        name: &str,
        settings: &ProviderSettings,
        registry: &SchemaRegistry,
        hasher: Arc<dyn PasswordHasher>,
    ) -> ProviderResult<Self> {
        Self::from_settings(name, settings.realm(name)?, registry, hasher)
    }

    /// Attaches the session store that receives last-login times.
    #[must_use]
    pub fn with_session_store(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Realm name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    fn lookup(&self) -> UserLookup<'_> {
        UserLookup::new(&self.config, self.schema.as_ref())
    }

    fn roles(&self) -> RoleResolver<'_> {
        RoleResolver::new(&self.config, self.schema.as_ref())
    }

    fn credentials(&self) -> Credentials<'_> {
        Credentials::new(&self.config, self.hasher.as_ref())
    }

    fn mutator(&self) -> UserMutator<'_> {
        UserMutator::new(&self.config, self.schema.as_ref())
    }

    async fn find_user(&self, username: &str) -> ProviderResult<Option<Record>> {
        Ok(self
            .lookup()
            .find_user(&LookupField::Username, username, &SearchOptions::new())
            .await?)
    }

    /// Checks a username and password.
    ///
    /// Returns `false` for an unknown user or a wrong password. On success
    /// with `options.lastlogin` set, the previous last-login time (if any)
    /// is written to the session store under that key and the last-login
    /// column is set to now.
    ///
    /// ## Errors
    ///
    /// Propagates schema, hasher and session store failures.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        options: &AuthOptions,
    ) -> ProviderResult<bool> {
        let Some(user) = self.find_user(username).await? else {
            tracing::debug!(realm = %self.name, %username, "authentication for unknown user");
            self.event(EventType::LoginError, username)
                .failure("user_not_found")
                .emit();
            return Ok(false);
        };

        if !self.credentials().matches(&user, password)? {
            self.event(EventType::LoginError, username)
                .failure("invalid_credentials")
                .emit();
            return Ok(false);
        }

        if let Some(session_key) = &options.lastlogin {
            self.track_login(&user, username, session_key).await?;
        }
        self.event(EventType::Login, username).emit();
        Ok(true)
    }

    async fn track_login(&self, user: &Record, username: &str, session_key: &str) -> ProviderResult<()> {
        let column = self.config.lastlogin_column();
        if let Some(previous) = user.value(column).and_then(Value::as_timestamp) {
            match &self.session {
                Some(session) => session.write(session_key, previous).await?,
                None => tracing::debug!(realm = %self.name, "no session store for last login"),
            }
        }

        let filter = self.lookup().user_filter(&LookupField::Username, username);
        let mut fields = Record::new();
        fields.insert(column.to_string(), Value::from(Utc::now()));
        self.schema
            .update(self.config.users_resultset(), &filter, fields)
            .await?;
        Ok(())
    }

    /// Hashes and stores a new password, stamping the password-changed
    /// column if one is configured. Returns the updated details, or `None`
    /// for an unknown user.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Validation` for an empty username and
    /// propagates hasher and schema failures.
    pub async fn set_user_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> ProviderResult<Option<Record>> {
        let mut fields = Record::new();
        fields.insert(
            self.config.password_column().to_string(),
            Value::from(self.credentials().hash(new_password)?),
        );
        if let Some(column) = self.config.pwchanged_column() {
            fields.insert(column.to_string(), Value::from(Utc::now()));
        }

        let Some(update) = self.mutator().set_user_details(username, fields).await? else {
            return Ok(None);
        };
        self.event(EventType::UpdatePassword, &update.username).emit();
        self.get_user_details(&update.username).await
    }

    /// Returns a user's row, with the password-changed column parsed to a
    /// timestamp and, if a roles key is configured, a `{ role => true }` map
    /// under that key. `None` for an unknown user.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn get_user_details(&self, username: &str) -> ProviderResult<Option<Record>> {
        let Some(mut user) = self.find_user(username).await? else {
            tracing::debug!(realm = %self.name, %username, "no such user");
            return Ok(None);
        };

        if let Some(column) = self.config.pwchanged_column() {
            if let Some(changed) = user.value(column).and_then(Value::as_timestamp) {
                user.insert(column.to_string(), Value::Timestamp(changed));
            }
        }

        if let Some(key) = self.config.roles_key() {
            let roles = self
                .roles()
                .roles_for_user(&user)
                .await?
                .into_iter()
                .map(|role| (role, Value::Bool(true)))
                .collect();
            user.insert(key.to_string(), Value::Map(roles));
        }
        Ok(Some(user))
    }

    /// Returns the username holding a password reset code.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Validation` for an empty code and propagates
    /// schema errors.
    pub async fn get_user_by_code(&self, code: &str) -> ProviderResult<Option<String>> {
        if code.is_empty() {
            return Err(ProviderError::validation("reset code must be specified"));
        }
        let user = self
            .lookup()
            .find_user(&LookupField::ResetCode, code, &SearchOptions::new())
            .await?;
        Ok(user.and_then(|u| u.text(self.config.username_column()).map(str::to_string)))
    }

    /// Creates a user from `fields` (which must carry `username`) and
    /// returns their details.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Validation` without a username, for a
    /// malformed roles value, or when the new user would fall outside the
    /// valid-user conditions. Schema errors are propagated. No user is left
    /// behind on any error.
    pub async fn create_user(&self, fields: Record) -> ProviderResult<Option<Record>> {
        let update = self.mutator().create_user(fields).await?;
        self.event(EventType::UserCreated, &update.username).emit();
        self.emit_role_events(&update);
        self.get_user_details(&update.username).await
    }

    /// Updates a user's fields and roles and returns their details as
    /// re-read after the update. `None` for an unknown user.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Validation` for an empty username or a
    /// malformed roles value, and propagates schema errors.
    pub async fn set_user_details(
        &self,
        username: &str,
        fields: Record,
    ) -> ProviderResult<Option<Record>> {
        let Some(update) = self.mutator().set_user_details(username, fields).await? else {
            return Ok(None);
        };
        if !update.columns.is_empty() {
            self.event(EventType::UserUpdated, &update.username)
                .detail("columns", update.columns.join(","))
                .emit();
        }
        self.emit_role_events(&update);
        self.get_user_details(&update.username).await
    }

    /// Returns a user's role names in store order, or `None` for an unknown user.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn get_user_roles(&self, username: &str) -> ProviderResult<Option<Vec<String>>> {
        self.roles().get_user_roles(username).await
    }

    /// Returns every role name in store order.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn get_all_roles(&self) -> ProviderResult<Vec<String>> {
        self.roles().all_roles().await
    }

    /// Returns true if a valid user has this name.
    ///
    /// ## Errors
    ///
    /// Propagates schema errors.
    pub async fn user_exists(&self, username: &str) -> ProviderResult<bool> {
        Ok(self.find_user(username).await?.is_some())
    }

    /// Decides whether a user's password has expired.
    ///
    /// ## Errors
    ///
    /// Returns `ProviderError::Config` if expiry is configured without a
    /// password-changed column.
    pub fn password_expired(&self, user: &Record) -> ProviderResult<bool> {
        self.password_expired_at(user, Utc::now())
    }

    /// Decides whether a user's password has expired as of `now`.
    ///
    /// ## Errors
    ///
    /// See [`Self::password_expired`].
    pub fn password_expired_at(&self, user: &Record, now: DateTime<Utc>) -> ProviderResult<bool> {
        self.credentials().password_expired_at(user, now)
    }

    /// Returns true if the user's stored digest should be upgraded to the
    /// realm's algorithm.
    #[must_use]
    pub fn needs_rehash(&self, user: &Record) -> bool {
        self.credentials().needs_rehash(user)
    }

    fn event(&self, event_type: EventType, username: &str) -> realm_core::EventBuilder {
        Event::builder(event_type).realm(&self.name).user(username)
    }

    fn emit_role_events(&self, update: &DetailsUpdate) {
        for role in &update.assigned {
            self.event(EventType::RoleAssignedToUser, &update.username)
                .detail("role", role)
                .emit();
        }
        for role in &update.removed {
            self.event(EventType::RoleUnassignedFromUser, &update.username)
                .detail("role", role)
                .emit();
        }
    }
}
