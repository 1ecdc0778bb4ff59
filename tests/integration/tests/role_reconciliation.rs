//! Role lookup and reconciliation scenarios.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use realm_core::RealmSettings;
use realm_integration_tests::{build_provider, default_schema, TestEnv};
use realm_model::{record, Filter, Record, Relationship, Value};
use realm_storage::{ChangeSet, MemorySchema, Schema, SearchOptions, StorageResult};

fn roles(names: &[&str]) -> Value {
    Value::Map(
        names
            .iter()
            .map(|name| ((*name).to_string(), Value::from(1)))
            .collect(),
    )
}

fn as_set(roles: Option<Vec<String>>) -> BTreeSet<String> {
    roles.unwrap_or_default().into_iter().collect()
}

#[tokio::test]
async fn test_role_lookup() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new())?;

    assert_eq!(
        env.provider.get_user_roles("dave").await?,
        Some(vec!["BeerDrinker".to_string(), "Motorcyclist".to_string()])
    );
    assert_eq!(
        env.provider.get_user_roles("bob").await?,
        Some(vec!["CiderDrinker".to_string()])
    );
    assert_eq!(env.provider.get_user_roles("nouser").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_bob_gains_motorcyclist() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new().roles_key("roles"))?;

    let bob = env
        .provider
        .set_user_details("bob", record! { "roles" => roles(&["CiderDrinker", "Motorcyclist"]) })
        .await?
        .expect("bob exists");

    let expected: BTreeSet<String> = ["CiderDrinker", "Motorcyclist"].map(String::from).into();
    assert_eq!(as_set(env.provider.get_user_roles("bob").await?), expected);

    let reported: BTreeSet<String> = bob["roles"]
        .as_map()
        .expect("roles map")
        .keys()
        .cloned()
        .collect();
    assert_eq!(reported, expected);
    Ok(())
}

#[tokio::test]
async fn test_reconciliation_reaches_any_subset() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new().roles_key("roles"))?;
    let all = env.provider.get_all_roles().await?;

    for mask in 0..(1u32 << all.len()) {
        let desired: Vec<&str> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, role)| role.as_str())
            .collect();

        env.provider
            .set_user_details("dave", record! { "roles" => roles(&desired) })
            .await?;

        let expected: BTreeSet<String> = desired.iter().map(|r| (*r).to_string()).collect();
        assert_eq!(as_set(env.provider.get_user_roles("dave").await?), expected);
    }

    // bob is never touched
    assert_eq!(
        env.provider.get_user_roles("bob").await?,
        Some(vec!["CiderDrinker".to_string()])
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_username_change_keeps_roles() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new().roles_key("roles"))?;

    let err = env
        .provider
        .set_user_details(
            "bob",
            record! { "username" => "dave", "roles" => roles(&["Motorcyclist"]) },
        )
        .await
        .expect_err("duplicate username");
    assert!(err.is_store());

    assert_eq!(
        env.provider.get_user_roles("bob").await?,
        Some(vec!["CiderDrinker".to_string()])
    );
    Ok(())
}

/// Delegates to a memory schema but fails every change set after staging it.
struct FailingCommit(MemorySchema);

#[async_trait]
impl Schema for FailingCommit {
    fn relationships(&self, entity: &str) -> StorageResult<Vec<Relationship>> {
        self.0.relationships(entity)
    }

    async fn search(
        &self,
        entity: &str,
        filter: &Filter,
        options: &SearchOptions,
    ) -> StorageResult<Vec<Record>> {
        self.0.search(entity, filter, options).await
    }

    async fn create(&self, entity: &str, fields: Record) -> StorageResult<Record> {
        self.0.create(entity, fields).await
    }

    async fn update(&self, entity: &str, filter: &Filter, fields: Record) -> StorageResult<u64> {
        self.0.update(entity, filter, fields).await
    }

    async fn delete(&self, entity: &str, filter: &Filter) -> StorageResult<u64> {
        self.0.delete(entity, filter).await
    }

    async fn apply(&self, mut changes: ChangeSet) -> StorageResult<()> {
        changes.delete("NoSuchEntity", Filter::new());
        self.0.apply(changes).await
    }
}

#[tokio::test]
async fn test_reconciliation_is_atomic() -> anyhow::Result<()> {
    let schema = Arc::new(FailingCommit(default_schema()?));
    let provider = build_provider(schema.clone(), &RealmSettings::new().roles_key("roles"))?;

    let err = provider
        .set_user_details(
            "dave",
            record! { "name" => "Dave", "roles" => roles(&["CiderDrinker"]) },
        )
        .await
        .expect_err("commit fails");
    assert!(err.is_store());

    assert_eq!(
        provider.get_user_roles("dave").await?,
        Some(vec!["BeerDrinker".to_string(), "Motorcyclist".to_string()])
    );
    assert_eq!(schema.0.rows("UserRole")?.len(), 3);
    assert_eq!(
        schema.0.rows("User")?[0].get("name"),
        Some(&Value::from("David Precious"))
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_roles_are_ignored() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new().roles_key("roles"))?;

    env.provider
        .set_user_details("bob", record! { "roles" => roles(&["CiderDrinker", "Astronaut"]) })
        .await?;
    assert_eq!(
        env.provider.get_user_roles("bob").await?,
        Some(vec!["CiderDrinker".to_string()])
    );
    assert_eq!(env.schema.rows("Role")?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_roles_ignored_without_roles_key() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new())?;

    // With no roles key configured, "roles" is just another column.
    env.provider
        .set_user_details("bob", record! { "roles" => "admin" })
        .await?;
    assert_eq!(
        env.provider.get_user_roles("bob").await?,
        Some(vec!["CiderDrinker".to_string()])
    );
    assert_eq!(env.schema.rows("User")?[1].get("roles"), Some(&Value::from("admin")));
    Ok(())
}

#[tokio::test]
async fn test_create_with_failing_links_leaves_no_user() -> anyhow::Result<()> {
    let schema = Arc::new(FailingCommit(default_schema()?));
    let provider = build_provider(schema.clone(), &RealmSettings::new().roles_key("roles"))?;

    let err = provider
        .create_user(record! { "username" => "carol", "roles" => roles(&["BeerDrinker"]) })
        .await
        .expect_err("commit fails");
    assert!(err.is_store());

    assert_eq!(schema.0.rows("User")?.len(), 3);
    assert_eq!(schema.0.rows("UserRole")?.len(), 3);
    assert!(!provider.user_exists("carol").await?);
    Ok(())
}

#[tokio::test]
async fn test_roles_given_as_json_list() -> anyhow::Result<()> {
    let env = TestEnv::new(&RealmSettings::new().roles_key("roles"))?;

    let listed = Value::from(serde_json::json!(["BeerDrinker", "Motorcyclist", "CiderDrinker"]));
    env.provider
        .set_user_details("dave", record! { "roles" => listed })
        .await?;

    let expected: BTreeSet<String> = ["BeerDrinker", "CiderDrinker", "Motorcyclist"]
        .map(String::from)
        .into();
    assert_eq!(as_set(env.provider.get_user_roles("dave").await?), expected);

    let err = env
        .provider
        .set_user_details("dave", record! { "roles" => Value::from(serde_json::json!([{"name": "x"}])) })
        .await
        .expect_err("list entries must be names");
    assert!(err.is_validation());
    assert_eq!(as_set(env.provider.get_user_roles("dave").await?), expected);
    Ok(())
}
