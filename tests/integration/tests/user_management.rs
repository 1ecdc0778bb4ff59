//! User creation, updates, reset codes and password expiry.

use chrono::{Duration, Utc};
use realm_core::RealmSettings;
use realm_integration_tests::TestEnv;
use realm_model::{record, Record, RecordExt, Value};
use realm_provider::AuthOptions;

fn settings() -> RealmSettings {
    RealmSettings::new()
        .roles_key("roles")
        .users_pwchanged_column("pw_changed")
        .password_expiry_days(2)
        .user_valid_condition("deleted", 0)
}

#[tokio::test]
async fn test_create_user_then_details() -> anyhow::Result<()> {
    let env = TestEnv::new(&settings())?;

    let created = env
        .provider
        .create_user(record! {
            "username" => "carol",
            "name" => "Carol Jones",
            "email" => "carol@example.com",
            "roles" => Value::Map([("Motorcyclist".to_string(), Value::from(true))].into()),
        })
        .await?
        .expect("created user is visible");
    assert_eq!(created.text("username"), Some("carol"));

    let carol = env
        .provider
        .get_user_details("carol")
        .await?
        .expect("carol exists");
    assert_eq!(carol.text("name"), Some("Carol Jones"));
    assert_eq!(carol.text("email"), Some("carol@example.com"));
    assert_eq!(carol.value("deleted"), Some(&Value::Integer(0)));
    assert_eq!(
        carol["roles"],
        Value::Map([("Motorcyclist".to_string(), Value::Bool(true))].into())
    );

    env.provider.set_user_password("carol", "lemonade").await?;
    assert!(env.provider.authenticate("carol", "lemonade", &AuthOptions::new()).await?);
    Ok(())
}

#[tokio::test]
async fn test_create_outside_range_predicate_is_rejected() -> anyhow::Result<()> {
    let settings = RealmSettings::new().user_valid_condition("deleted", serde_json::json!({"<": 1}));
    let env = TestEnv::new(&settings)?;

    let err = env
        .provider
        .create_user(record! { "username" => "carol", "email" => "carol@example.com" })
        .await
        .expect_err("carol would be invisible");
    assert!(err.is_validation());
    assert_eq!(env.schema.rows("User")?.len(), 3);

    let carol = env
        .provider
        .create_user(record! { "username" => "carol", "email" => "carol@example.com", "deleted" => 0 })
        .await?
        .expect("carol visible");
    assert_eq!(carol.text("email"), Some("carol@example.com"));
    Ok(())
}

#[tokio::test]
async fn test_create_user_requires_username() -> anyhow::Result<()> {
    let env = TestEnv::new(&settings())?;

    let err = env
        .provider
        .create_user(record! { "name" => "Nobody" })
        .await
        .expect_err("username required");
    assert!(err.is_validation());

    let err = env
        .provider
        .create_user(record! { "username" => "" })
        .await
        .expect_err("username required");
    assert!(err.is_validation());

    let err = env
        .provider
        .set_user_details("", record! { "name" => "x" })
        .await
        .expect_err("username required");
    assert!(err.is_validation());
    Ok(())
}

#[tokio::test]
async fn test_update_unknown_user_is_noop() -> anyhow::Result<()> {
    let env = TestEnv::new(&settings())?;
    let before = env.schema.rows("User")?;

    let result = env
        .provider
        .set_user_details("nouser", record! { "name" => "Ghost" })
        .await?;
    assert!(result.is_none());
    assert_eq!(env.schema.rows("User")?, before);
    Ok(())
}

#[tokio::test]
async fn test_rename_user() -> anyhow::Result<()> {
    let env = TestEnv::new(&settings())?;

    let renamed = env
        .provider
        .set_user_details("bob", record! { "username" => "robert" })
        .await?
        .expect("re-read under new name");
    assert_eq!(renamed.text("username"), Some("robert"));
    assert_eq!(renamed["roles"].as_map().map(|m| m.len()), Some(1));

    assert!(!env.provider.user_exists("bob").await?);
    assert!(env.provider.authenticate("robert", "cider", &AuthOptions::new()).await?);
    Ok(())
}

#[tokio::test]
async fn test_reset_code_lifecycle() -> anyhow::Result<()> {
    let env = TestEnv::new(&settings())?;

    env.provider
        .set_user_details("dave", record! { "pw_reset_code" => "qwerty" })
        .await?;
    assert_eq!(env.provider.get_user_by_code("qwerty").await?.as_deref(), Some("dave"));

    // The code follows whoever set it last.
    env.provider
        .set_user_details("dave", record! { "pw_reset_code" => Value::Null })
        .await?;
    env.provider
        .set_user_details("bob", record! { "pw_reset_code" => "qwerty" })
        .await?;
    assert_eq!(env.provider.get_user_by_code("qwerty").await?.as_deref(), Some("bob"));

    env.provider
        .set_user_details("bob", record! { "pw_reset_code" => "asdfgh" })
        .await?;
    assert_eq!(env.provider.get_user_by_code("qwerty").await?, None);
    assert_eq!(env.provider.get_user_by_code("asdfgh").await?.as_deref(), Some("bob"));
    Ok(())
}

#[tokio::test]
async fn test_password_expiry() -> anyhow::Result<()> {
    let env = TestEnv::new(&settings())?;

    // Never changed: expired.
    let dave = env.provider.get_user_details("dave").await?.expect("dave");
    assert!(env.provider.password_expired(&dave)?);

    let dave = env
        .provider
        .set_user_password("dave", "stout")
        .await?
        .expect("dave");
    assert!(matches!(dave.get("pw_changed"), Some(Value::Timestamp(_))));
    assert!(!env.provider.password_expired(&dave)?);

    let now = Utc::now();
    let aged = |days: i64| -> Record { record! { "pw_changed" => now - Duration::days(days) } };
    assert!(!env.provider.password_expired_at(&aged(2), now)?);
    assert!(env.provider.password_expired_at(&aged(3), now)?);
    Ok(())
}

#[tokio::test]
async fn test_expiry_disabled() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new())?;
    let dave = env.provider.get_user_details("dave").await?.expect("dave");
    assert!(!env.provider.password_expired(&dave)?);
    Ok(())
}
