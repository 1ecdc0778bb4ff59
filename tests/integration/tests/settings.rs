//! Settings loading and resolution.

use std::sync::Arc;

use realm_auth::CryptPasswordHasher;
use realm_core::{ProviderSettings, RealmSettings};
use realm_integration_tests::{custom_schema, custom_settings, default_schema};
use realm_provider::{RealmConfig, RealmProvider};
use realm_storage::{MemorySchema, SchemaRegistry};

const SETTINGS: &str = r#"
[realms.staff]
schema_name = "people"
users_source = "person"
roles_source = "team"
user_roles_source = "membership"
users_username_column = "login"
users_password_column = "passphrase"
roles_role_column = "team_name"
user_roles_user_relationship = "member_person"
user_roles_role_relationship = "member_team"
roles_key = "teams"

[realms.staff.user_valid_conditions]
active = true

[realms.legacy]
users_table = "user"
roles_table = "role"
user_roles_table = "user_role"
password_expiry_days = 90
"#;

fn registry() -> anyhow::Result<SchemaRegistry> {
    let registry = SchemaRegistry::single(Arc::new(default_schema()?));
    registry.register("people", Arc::new(custom_schema()?));
    Ok(registry)
}

#[tokio::test]
async fn test_realms_from_toml() -> anyhow::Result<()> {
    let settings = ProviderSettings::from_toml_str(SETTINGS)?;
    let registry = registry()?;
    let hasher = Arc::new(CryptPasswordHasher::default());

    let staff = RealmProvider::for_realm("staff", &settings, &registry, hasher.clone())?;
    assert_eq!(staff.name(), "staff");
    assert_eq!(staff.config().schema_name(), "people");
    assert_eq!(
        staff.get_user_roles("bob").await?,
        Some(vec!["CiderDrinker".to_string()])
    );

    // Expiry without a password-changed column fails at startup.
    let err = RealmProvider::for_realm("legacy", &settings, &registry, hasher.clone())
        .expect_err("misconfigured realm");
    assert!(err.is_config());

    let err = RealmProvider::for_realm("missing", &settings, &registry, hasher)
        .expect_err("unknown realm");
    assert!(err.is_config());
    Ok(())
}

#[test]
fn test_resolution_is_idempotent() -> anyhow::Result<()> {
    let default = default_schema()?;
    let custom = custom_schema()?;
    let cases: [(&MemorySchema, RealmSettings); 3] = [
        (&default, RealmSettings::new()),
        (&default, RealmSettings::new().users_table("user").roles_key("roles")),
        (&custom, custom_settings()),
    ];

    for (schema, settings) in cases {
        let first = RealmConfig::resolve(&settings, schema)?;
        let second = RealmConfig::resolve(&first.to_settings(), schema)?;
        assert_eq!(first, second);
    }
    Ok(())
}
