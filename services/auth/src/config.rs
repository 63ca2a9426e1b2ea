//! Service configuration read from the environment

use anyhow::Result;
use common::token::TokenConfig;
use console::Role;
use std::env;

/// Account provisioned at startup
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Authentication service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Listen address (default: 0.0.0.0:3000)
    pub bind_addr: String,
    pub token: TokenConfig,
    pub bootstrap: Option<BootstrapConfig>,
}

impl AuthConfig {
    /// Create a new AuthConfig from environment variables
    ///
    /// # Environment Variables
    /// - `AUTH_BIND_ADDR`: listen address (default: "0.0.0.0:3000")
    /// - `JWT_SECRET`, `JWT_ACCESS_TOKEN_EXPIRY`: see [`TokenConfig::from_env`]
    /// - `AUTH_BOOTSTRAP_EMAIL`, `AUTH_BOOTSTRAP_PASSWORD`: account created at
    ///   startup when both are set
    /// - `AUTH_BOOTSTRAP_ROLE`: role of that account (default: "super_admin")
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("AUTH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let token = TokenConfig::from_env()?;

        let bootstrap = match (
            env::var("AUTH_BOOTSTRAP_EMAIL"),
            env::var("AUTH_BOOTSTRAP_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) if !email.is_empty() => {
                let role_name =
                    env::var("AUTH_BOOTSTRAP_ROLE").unwrap_or_else(|_| "super_admin".to_string());
                let role = Role::parse(&role_name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown AUTH_BOOTSTRAP_ROLE: {}", role_name))?;
                Some(BootstrapConfig {
                    email,
                    password,
                    role,
                })
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            token,
            bootstrap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        unsafe {
            env::remove_var("AUTH_BIND_ADDR");
            env::remove_var("AUTH_BOOTSTRAP_EMAIL");
            env::remove_var("AUTH_BOOTSTRAP_PASSWORD");
            env::remove_var("AUTH_BOOTSTRAP_ROLE");
            env::remove_var("JWT_SECRET");
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        unsafe {
            env::set_var("JWT_SECRET", "s3cret");
        }

        let config = AuthConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.bootstrap.is_none());

        clear();
    }

    #[test]
    #[serial]
    fn test_missing_secret_fails() {
        clear();
        assert!(AuthConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_bootstrap_account() {
        clear();
        unsafe {
            env::set_var("JWT_SECRET", "s3cret");
            env::set_var("AUTH_BOOTSTRAP_EMAIL", "owner@site.io");
            env::set_var("AUTH_BOOTSTRAP_PASSWORD", "correct horse");
        }

        let bootstrap = AuthConfig::from_env().unwrap().bootstrap.unwrap();
        assert_eq!(bootstrap.email, "owner@site.io");
        assert_eq!(bootstrap.role, Role::SuperAdmin);

        unsafe {
            env::set_var("AUTH_BOOTSTRAP_ROLE", "editor");
        }
        let bootstrap = AuthConfig::from_env().unwrap().bootstrap.unwrap();
        assert_eq!(bootstrap.role, Role::Editor);

        unsafe {
            env::set_var("AUTH_BOOTSTRAP_ROLE", "owner");
        }
        assert!(AuthConfig::from_env().is_err());

        clear();
    }
}
