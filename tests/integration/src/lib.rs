//! Test fixtures for end-to-end provider scenarios.
//!
//! Two schemas are provided: one with the conventional `User`/`Role`/
//! `UserRole` layout, and one where every entity, column and relationship
//! has a different name.

use std::sync::Arc;

use realm_auth::{CryptPasswordHasher, HashAlgorithm, MemorySessionStore, PasswordHasher};
use realm_core::RealmSettings;
use realm_model::{record, Record};
use realm_provider::RealmProvider;
use realm_storage::{EntityDefinition, MemorySchema, Schema, SchemaRegistry};

/// A provider wired to an in-memory schema and session store.
pub struct TestEnv {
    /// The schema behind the provider.
    pub schema: Arc<MemorySchema>,
    /// Session store receiving last-login times.
    pub session: Arc<MemorySessionStore>,
    /// The provider under test.
    pub provider: RealmProvider,
}

impl TestEnv {
    /// Builds a provider over the conventional schema holding dave and bob.
    pub fn new(settings: &RealmSettings) -> anyhow::Result<Self> {
        Self::with_schema(default_schema()?, settings)
    }

    /// Builds a provider over the renamed schema holding dave and bob.
    pub fn custom() -> anyhow::Result<Self> {
        Self::with_schema(custom_schema()?, &custom_settings())
    }

    /// Builds a provider over any schema.
    pub fn with_schema(schema: MemorySchema, settings: &RealmSettings) -> anyhow::Result<Self> {
        init_tracing();

        let schema = Arc::new(schema);
        let session = Arc::new(MemorySessionStore::new());
        let provider = build_provider(schema.clone(), settings)?.with_session_store(session.clone());
        Ok(Self {
            schema,
            session,
            provider,
        })
    }
}

/// Resolves `settings` against `schema` and builds a provider without a session store.
pub fn build_provider(schema: Arc<dyn Schema>, settings: &RealmSettings) -> anyhow::Result<RealmProvider> {
    let registry = SchemaRegistry::new();
    registry.register(
        settings
            .schema_name
            .as_deref()
            .unwrap_or(realm_storage::DEFAULT_SCHEMA),
        schema,
    );
    Ok(RealmProvider::from_settings(
        "test",
        settings,
        &registry,
        Arc::new(CryptPasswordHasher::default()),
    )?)
}

/// Installs a test subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("realm_provider=debug,realm=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Hashes a fixture password with the default algorithm.
pub fn digest(password: &str) -> anyhow::Result<String> {
    Ok(CryptPasswordHasher::default().hash(password, HashAlgorithm::Sha512)?)
}

/// `User`/`Role`/`UserRole` with dave (beer: BeerDrinker, Motorcyclist),
/// bob (cider: CiderDrinker) and a soft-deleted mark.
pub fn default_schema() -> anyhow::Result<MemorySchema> {
    let schema = MemorySchema::new()
        .with_entity(
            EntityDefinition::new("User")
                .unique("username")
                .has_many("user_roles", "UserRole", "user_id", "id"),
        )
        .with_entity(
            EntityDefinition::new("Role")
                .unique("role")
                .has_many("user_roles", "UserRole", "role_id", "id"),
        )
        .with_entity(
            EntityDefinition::new("UserRole")
                .belongs_to("user", "User", "id", "user_id")
                .belongs_to("role", "Role", "id", "role_id"),
        );

    for role in ["BeerDrinker", "Motorcyclist", "CiderDrinker"] {
        schema.insert("Role", record! { "role" => role })?;
    }
    let users: [Record; 3] = [
        record! { "username" => "dave", "password" => digest("beer")?, "name" => "David Precious", "deleted" => 0 },
        record! { "username" => "bob", "password" => digest("cider")?, "name" => "Bob Smith", "deleted" => 0 },
        record! { "username" => "mark", "password" => digest("wantscider")?, "name" => "Mark", "deleted" => 1 },
    ];
    for user in users {
        schema.insert("User", user)?;
    }
    for (user_id, role_id) in [(1, 1), (1, 2), (2, 3)] {
        schema.insert("UserRole", record! { "user_id" => user_id, "role_id" => role_id })?;
    }
    Ok(schema)
}

/// The same people and roles in a schema where nothing has its default name:
/// `Person`/`Team`/`Membership`, custom columns, custom relationship names,
/// and extra relationships discovery must skip.
pub fn custom_schema() -> anyhow::Result<MemorySchema> {
    let schema = MemorySchema::new()
        .with_entity(
            EntityDefinition::new("Person")
                .primary_key("person_id")
                .unique("login")
                .has_many("memberships", "Membership", "member", "person_id")
                .has_many("notes", "AuditNote", "author", "person_id")
                .belongs_to("manager", "Person", "person_id", "manager_id"),
        )
        .with_entity(
            EntityDefinition::new("Team")
                .primary_key("team_id")
                .unique("team_name")
                .has_many("rosters", "Membership", "team", "team_id"),
        )
        .with_entity(
            EntityDefinition::new("Membership")
                .belongs_to("member_person", "Person", "person_id", "member")
                .belongs_to("member_team", "Team", "team_id", "team"),
        )
        .with_entity(EntityDefinition::new("AuditNote"));

    for team in ["BeerDrinker", "Motorcyclist", "CiderDrinker"] {
        schema.insert("Team", record! { "team_name" => team })?;
    }
    let people: [Record; 3] = [
        record! { "login" => "dave", "passphrase" => digest("beer")?, "active" => true },
        record! { "login" => "bob", "passphrase" => digest("cider")?, "active" => true },
        record! { "login" => "mark", "passphrase" => digest("wantscider")?, "active" => false },
    ];
    for person in people {
        schema.insert("Person", person)?;
    }
    for (member, team) in [(1, 1), (1, 2), (2, 3)] {
        schema.insert("Membership", record! { "member" => member, "team" => team })?;
    }
    Ok(schema)
}

/// Settings mapping the realm onto [`custom_schema`].
pub fn custom_settings() -> RealmSettings {
    RealmSettings::new()
        .users_source("person")
        .roles_source("team")
        .user_roles_source("membership")
        .users_username_column("login")
        .users_password_column("passphrase")
        .roles_role_column("team_name")
        .users_lastlogin_column("last_seen")
        .users_pwresetcode_column("reset_token")
        .users_pwchanged_column("passphrase_changed")
        .user_roles_user_relationship("member_person")
        .user_roles_role_relationship("member_team")
        .user_valid_condition("active", true)
        .roles_key("teams")
        .password_expiry_days(30)
        .encryption_algorithm("SHA-384")
}
