//! Roles and role lookup

use common::{Filter, RowStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Table holding one profile row per user
pub const PROFILES_TABLE: &str = "profiles";

/// Authorization role of a profile, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Editor,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Editor => "editor",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }

    /// Parse a stored role; unknown strings are no role at all
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            "super_admin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// Whether this role meets `required`
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up a user's role in the profile table
///
/// Never fails: errors, missing rows and unknown roles all mean no role.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn RowStore>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn get_role(&self, user_id: &str) -> Option<Role> {
        let rows = match self
            .store
            .select(PROFILES_TABLE, &Filter::all().eq("id", user_id))
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Role lookup for {} failed: {}", user_id, e);
                return None;
            }
        };

        let role = rows
            .first()
            .and_then(|row| row.get("role"))
            .and_then(Value::as_str)
            .and_then(Role::parse);

        debug!("Resolved role for {}: {:?}", user_id, role);
        role
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MemoryRowStore;
    use serde_json::json;

    async fn store_with(profile: Value) -> Arc<MemoryRowStore> {
        let store = Arc::new(MemoryRowStore::new());
        store
            .insert(PROFILES_TABLE, profile.as_object().cloned().unwrap())
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_role_ordering() {
        assert!(Role::SuperAdmin.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(!Role::Editor.satisfies(Role::Admin));
        assert_eq!(Role::parse("super_admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("owner"), None);
    }

    #[tokio::test]
    async fn test_get_role_reads_profile() {
        let store = store_with(json!({"id": "u-1", "role": "admin"})).await;
        let resolver = RoleResolver::new(store);
        assert_eq!(resolver.get_role("u-1").await, Some(Role::Admin));
    }

    #[tokio::test]
    async fn test_missing_row_and_unknown_role_are_none() {
        let store = store_with(json!({"id": "u-1", "role": "owner"})).await;
        let resolver = RoleResolver::new(store);
        assert_eq!(resolver.get_role("u-1").await, None);
        assert_eq!(resolver.get_role("u-2").await, None);
    }

    #[tokio::test]
    async fn test_store_error_is_none() {
        let store = store_with(json!({"id": "u-1", "role": "super_admin"})).await;
        store.set_unavailable(true);
        let resolver = RoleResolver::new(store);
        assert_eq!(resolver.get_role("u-1").await, None);
    }
}
