//! Startup provisioning of the first console account

use anyhow::Result;
use common::{Filter, Row, RowStore};
use console::role::PROFILES_TABLE;
use serde_json::Value;
use tracing::info;

use crate::{
    config::BootstrapConfig,
    models::{NewUser, User},
    repositories::UserRepository,
    validation::{validate_email, validate_password},
};

/// Make sure the configured account and its profile row exist
///
/// Returns the user when it had to be created. An existing account keeps its
/// password; only a missing profile row is filled in.
pub async fn ensure_account(
    users: &UserRepository,
    profiles: &dyn RowStore,
    config: &BootstrapConfig,
) -> Result<Option<User>> {
    validate_email(&config.email).map_err(|e| anyhow::anyhow!("AUTH_BOOTSTRAP_EMAIL: {}", e))?;

    let (user, created) = match users.find_by_email(&config.email).await? {
        Some(user) => (user, false),
        None => {
            validate_password(&config.password)
                .map_err(|e| anyhow::anyhow!("AUTH_BOOTSTRAP_PASSWORD: {}", e))?;
            let user = users
                .create(&NewUser {
                    email: config.email.clone(),
                    password: config.password.clone(),
                })
                .await?;
            info!("Provisioned account {}", user.email);
            (user, true)
        }
    };

    let user_id = user.id.to_string();
    let existing = profiles
        .select(PROFILES_TABLE, &Filter::all().eq("id", user_id.as_str()))
        .await?;
    if existing.is_empty() {
        let full_name = user.email.split('@').next().unwrap_or_default().to_string();
        let mut profile = Row::new();
        profile.insert("id".to_string(), Value::from(user_id));
        profile.insert("full_name".to_string(), Value::from(full_name));
        profile.insert("role".to_string(), Value::from(config.role.as_str()));
        profiles.insert(PROFILES_TABLE, profile).await?;
        info!("Created {} profile for {}", config.role, user.email);
    }

    Ok(created.then_some(user))
}
