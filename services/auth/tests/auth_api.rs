//! Authentication endpoints served in-process

use auth::{AppState, bootstrap, config::BootstrapConfig, routes, routes::TokenResponse};
use common::SqliteRowStore;
use common::database::{DatabaseConfig, init_pool};
use common::token::TokenConfig;
use console::{
    AdminSection, GuardConfig, GuardState, HttpIdentityConfig, HttpIdentityProvider,
    LoginController, LoginOutcome, Role, RoleResolver, RouteGuard, SessionResolver,
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

const EMAIL: &str = "owner@site.io";
const PASSWORD: &str = "correct horse";

struct TestServer {
    base_url: String,
    profiles: Arc<SqliteRowStore>,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(role: Role) -> Self {
        let pool = init_pool(&DatabaseConfig::in_memory()).await.unwrap();
        let state = AppState::init(
            pool.clone(),
            TokenConfig {
                secret: "test-secret".to_string(),
                access_token_expiry: 3600,
            },
        )
        .await
        .unwrap();

        let profiles = Arc::new(SqliteRowStore::new(pool));
        profiles.migrate().await.unwrap();
        bootstrap::ensure_account(
            &state.users,
            profiles.as_ref(),
            &BootstrapConfig {
                email: EMAIL.to_string(),
                password: PASSWORD.to_string(),
                role,
            },
        )
        .await
        .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes::create_router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            profiles,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn sign_in(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/token"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .unwrap()
    }

    async fn access_token(&self) -> String {
        let response = self.sign_in(EMAIL, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.json::<TokenResponse>().await.unwrap().access_token
    }

    async fn current_user(&self, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url("/auth/user"));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::start(Role::Editor).await;
    let body: Value = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_sign_in_returns_token_and_user() {
    let server = TestServer::start(Role::Editor).await;

    let response = server.sign_in("Owner@Site.io", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["user"]["email"], EMAIL);
    assert!(body["access_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_bad_credentials() {
    let server = TestServer::start(Role::Editor).await;

    for (email, password) in [(EMAIL, "wrong"), ("nobody@site.io", PASSWORD)] {
        let response = server.sign_in(email, password).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"error": "Invalid login credentials"}));
    }

    let response = server
        .client
        .post(server.url("/auth/token"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_current_user_requires_valid_token() {
    let server = TestServer::start(Role::Editor).await;
    let token = server.access_token().await;

    let response = server.current_user(Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], EMAIL);

    let response = server.current_user(None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "No authorization header"}));

    let response = server.current_user(Some("garbage")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "Invalid token"}));
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let server = TestServer::start(Role::Editor).await;
    let token = server.access_token().await;

    let response = server
        .client
        .post(server.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server.current_user(Some(&token)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_console_against_service() {
    let server = TestServer::start(Role::SuperAdmin).await;
    let provider = Arc::new(HttpIdentityProvider::new(HttpIdentityConfig::new(
        server.base_url.clone(),
    )));
    let sessions = SessionResolver::new(provider);
    let login = LoginController::new(sessions.clone());

    assert_eq!(login.on_mount().await, LoginOutcome::Stay);
    assert_eq!(
        login.sign_in(EMAIL, "wrong").await,
        LoginOutcome::Error {
            message: "Invalid login credentials".to_string()
        }
    );
    assert_eq!(
        login.sign_in(EMAIL, PASSWORD).await,
        LoginOutcome::Redirect {
            to: "/admin".to_string()
        }
    );

    let guard = RouteGuard::new(
        sessions.clone(),
        RoleResolver::new(server.profiles.clone()),
        GuardConfig::for_section(AdminSection::Users),
    );
    let mut handle = guard.mount();
    assert_eq!(handle.settled().await, GuardState::Authorized);

    handle.sign_out().await.unwrap();
    assert_eq!(handle.changed().await, GuardState::Unauthorized);
    assert_eq!(login.on_mount().await, LoginOutcome::Stay);
}
