//! Shared test schemas.

use realm_auth::{CryptPasswordHasher, HashAlgorithm, PasswordHasher};
use realm_model::record;
use realm_storage::{EntityDefinition, MemorySchema};

/// User/Role/UserRole with conventional names and no rows.
pub fn default_schema() -> MemorySchema {
    MemorySchema::new()
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
        )
}

/// The default schema holding dave (beer) and bob (cider), plus a deleted user.
pub fn populated_schema() -> MemorySchema {
    let schema = default_schema();
    let hasher = CryptPasswordHasher::default();
    let digest = |pw: &str| hasher.hash(pw, HashAlgorithm::Sha512).unwrap();

    for role in ["BeerDrinker", "Motorcyclist", "CiderDrinker"] {
        schema.insert("Role", record! { "role" => role }).unwrap();
    }
    schema
        .insert("User", record! { "username" => "dave", "password" => digest("beer"), "deleted" => 0 })
        .unwrap();
    schema
        .insert("User", record! { "username" => "bob", "password" => digest("cider"), "deleted" => 0 })
        .unwrap();
    schema
        .insert("User", record! { "username" => "mark", "password" => "wantscider", "deleted" => 1 })
        .unwrap();

    for (user_id, role_id) in [(1, 1), (1, 2), (2, 3)] {
        schema
            .insert("UserRole", record! { "user_id" => user_id, "role_id" => role_id })
            .unwrap();
    }
    schema
}
