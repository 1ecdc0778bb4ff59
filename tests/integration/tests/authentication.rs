//! Authentication scenarios.

use realm_core::RealmSettings;
use realm_integration_tests::TestEnv;
use realm_model::{record, RecordExt, Value};
use realm_provider::AuthOptions;

#[tokio::test]
async fn test_dave_and_bob_authenticate() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new())?;
    let options = AuthOptions::new();

    assert!(env.provider.authenticate("dave", "beer", &options).await?);
    assert!(env.provider.authenticate("bob", "cider", &options).await?);
    assert!(!env.provider.authenticate("dave", "wrong", &options).await?);
    assert!(!env.provider.authenticate("dave", "cider", &options).await?);
    assert!(!env.provider.authenticate("nouser", "beer", &options).await?);
    Ok(())
}

#[tokio::test]
async fn test_valid_user_predicate_blocks_login() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new())?;
    assert!(
        env.provider
            .authenticate("mark", "wantscider", &AuthOptions::new())
            .await?,
        "without a predicate soft-deleted users are still visible"
    );

    let env = TestEnv::new(&RealmSettings::new().user_valid_condition("deleted", 0))?;
    assert!(
        !env.provider
            .authenticate("mark", "wantscider", &AuthOptions::new())
            .await?
    );
    assert!(env.provider.get_user_details("mark").await?.is_none());
    assert!(env.provider.get_user_roles("mark").await?.is_none());
    assert!(!env.provider.user_exists("mark").await?);
    Ok(())
}

#[tokio::test]
async fn test_lastlogin_tracking() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new())?;
    let options = AuthOptions::new().lastlogin("logged_in_user_lastlogin");

    // Failed logins leave no trace.
    assert!(!env.provider.authenticate("dave", "wrong", &options).await?);
    assert!(env.schema.rows("User")?[0].value("lastlogin").is_none());

    assert!(env.provider.authenticate("dave", "beer", &options).await?);
    let first = env.schema.rows("User")?[0]
        .value("lastlogin")
        .and_then(Value::as_timestamp)
        .expect("lastlogin stamped");
    assert!(env.session.get("logged_in_user_lastlogin").is_none());

    assert!(env.provider.authenticate("dave", "beer", &options).await?);
    assert_eq!(env.session.get("logged_in_user_lastlogin"), Some(first));

    // Without the option nothing is tracked.
    let before = env.schema.rows("User")?[1].clone();
    assert!(env.provider.authenticate("bob", "cider", &AuthOptions::new()).await?);
    assert_eq!(env.schema.rows("User")?[1], before);
    Ok(())
}

#[tokio::test]
async fn test_lastlogin_stored_as_text_is_parsed() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new())?;
    env.provider
        .set_user_details("bob", record! { "lastlogin" => "2023-11-05 08:15:00" })
        .await?;

    let options = AuthOptions::new().lastlogin("previous_login");
    assert!(env.provider.authenticate("bob", "cider", &options).await?);

    let previous = env.session.get("previous_login").expect("previous login recorded");
    assert_eq!(previous.to_rfc3339(), "2023-11-05T08:15:00+00:00");
    Ok(())
}

#[tokio::test]
async fn test_plaintext_legacy_passwords() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new())?;
    env.schema.insert(
        "User",
        record! { "username" => "legacy", "password" => "hunter2" },
    )?;

    assert!(env.provider.authenticate("legacy", "hunter2", &AuthOptions::new()).await?);
    assert!(!env.provider.authenticate("legacy", "hunter3", &AuthOptions::new()).await?);

    let legacy = env
        .provider
        .get_user_details("legacy")
        .await?
        .expect("legacy user exists");
    assert!(env.provider.needs_rehash(&legacy));

    let upgraded = env
        .provider
        .set_user_password("legacy", "hunter2")
        .await?
        .expect("legacy user exists");
    assert!(!env.provider.needs_rehash(&upgraded));
    assert!(upgraded.text("password").is_some_and(|p| p.starts_with("{SSHA512}")));
    assert!(env.provider.authenticate("legacy", "hunter2", &AuthOptions::new()).await?);
    Ok(())
}
