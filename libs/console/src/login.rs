//! Admin sign-in page

use tracing::{info, warn};

use crate::nav::ADMIN_PATH;
use crate::session::SessionResolver;

/// What the login page should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Keep showing the form
    Stay,
    Redirect { to: String },
    /// Keep showing the form with this message
    Error { message: String },
}

#[derive(Clone)]
pub struct LoginController {
    sessions: SessionResolver,
}

impl LoginController {
    pub fn new(sessions: SessionResolver) -> Self {
        Self { sessions }
    }

    /// Already signed-in visitors go straight to the console
    pub async fn on_mount(&self) -> LoginOutcome {
        match self.sessions.get_session().await {
            Some(_) => LoginOutcome::Redirect {
                to: ADMIN_PATH.to_string(),
            },
            None => LoginOutcome::Stay,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> LoginOutcome {
        if email.trim().is_empty() || password.is_empty() {
            return LoginOutcome::Error {
                message: "Email and password are required".to_string(),
            };
        }

        match self.sessions.sign_in(email.trim(), password).await {
            Ok(session) => {
                info!("Login succeeded for {}", session.email);
                LoginOutcome::Redirect {
                    to: ADMIN_PATH.to_string(),
                }
            }
            Err(e) => {
                warn!("Login failed: {}", e);
                LoginOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityProvider, Session};
    use crate::memory::InMemoryIdentityProvider;
    use std::sync::Arc;

    async fn controller() -> (Arc<InMemoryIdentityProvider>, LoginController) {
        let provider = Arc::new(InMemoryIdentityProvider::new());
        provider
            .add_account("admin@site.io", "correct horse", "u-1")
            .await;
        let controller = LoginController::new(SessionResolver::new(provider.clone()));
        (provider, controller)
    }

    #[tokio::test]
    async fn test_mount_without_session_stays() {
        let (_, controller) = controller().await;
        assert_eq!(controller.on_mount().await, LoginOutcome::Stay);
    }

    #[tokio::test]
    async fn test_mount_with_session_redirects() {
        let (provider, controller) = controller().await;
        provider
            .restore_session(Session {
                user_id: "u-1".to_string(),
                email: "admin@site.io".to_string(),
                access_token: "t".to_string(),
                expires_at: None,
            })
            .await;

        assert_eq!(
            controller.on_mount().await,
            LoginOutcome::Redirect {
                to: "/admin".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_sign_in() {
        let (provider, controller) = controller().await;

        assert_eq!(
            controller.sign_in("admin@site.io", "wrong").await,
            LoginOutcome::Error {
                message: "Invalid login credentials".to_string()
            }
        );
        assert_eq!(
            controller.sign_in("admin@site.io", "correct horse").await,
            LoginOutcome::Redirect {
                to: "/admin".to_string()
            }
        );
        assert!(provider.get_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_credentials_never_reach_provider() {
        let (provider, controller) = controller().await;
        let outcome = controller.sign_in("  ", "pw").await;
        assert!(matches!(outcome, LoginOutcome::Error { .. }));
        assert!(provider.get_session().await.unwrap().is_none());
    }
}
