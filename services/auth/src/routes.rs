//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    middleware::{AuthSession, auth_middleware},
    models::{LoginCredentials, UserResponse},
};

/// Response for token generation
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let session_routes = Router::new()
        .route("/auth/user", get(current_user))
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/token", post(token))
        .merge(session_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Password sign-in
pub async fn token(
    State(state): State<AppState>,
    payload: Result<Json<LoginCredentials>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let Json(credentials) = payload.map_err(|e| {
        warn!("Malformed token request: {}", e);
        AuthError::BadRequest("Invalid request body".to_string())
    })?;
    info!("Sign-in attempt for {}", credentials.email);

    let user = state
        .users
        .find_by_email(&credentials.email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid = state
        .users
        .verify_password(&user, &credentials.password)
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            AuthError::InternalServerError
        })?;
    if !valid {
        return Err(AuthError::InvalidCredentials);
    }

    let session = state
        .sessions
        .create(user.id, state.jwt_service.access_token_expiry())
        .await
        .map_err(|e| {
            error!("Failed to open session: {}", e);
            AuthError::InternalServerError
        })?;

    let access_token = state
        .jwt_service
        .generate_access_token(&user, &session)
        .map_err(|e| {
            error!("Failed to generate access token: {}", e);
            AuthError::InternalServerError
        })?;

    let response = TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.jwt_service.access_token_expiry(),
        user: UserResponse::from(&user),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// The signed-in user
pub async fn current_user(Extension(auth): Extension<AuthSession>) -> Json<UserResponse> {
    Json(UserResponse::from(&auth.user))
}

/// End the caller's session
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
) -> AuthResult<StatusCode> {
    state
        .sessions
        .delete(auth.session.id)
        .await
        .map_err(|e| {
            error!("Failed to close session: {}", e);
            AuthError::InternalServerError
        })?;

    info!("User {} signed out", auth.user.email);
    Ok(StatusCode::NO_CONTENT)
}
