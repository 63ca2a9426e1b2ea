//! Bearer token authentication for session-bound endpoints

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{error, warn};

use crate::{
    AppState,
    error::AuthError,
    models::{Session, User},
};

/// The caller behind a validated bearer token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub session: Session,
}

/// Validate the bearer token and its server-side session
///
/// The token alone is not enough: its session must still exist, so a signed
/// out token is refused even before it expires.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or(AuthError::Unauthorized("No authorization header"))?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            warn!("Rejected access token: {}", e);
            AuthError::Unauthorized("Invalid token")
        })?;

    let session = state
        .sessions
        .find_active(claims.sid)
        .await
        .map_err(|e| {
            error!("Failed to load session: {}", e);
            AuthError::InternalServerError
        })?
        .filter(|session| session.user_id == claims.sub)
        .ok_or(AuthError::Unauthorized("Invalid token"))?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to load user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthorized("Invalid token"))?;

    req.extensions_mut().insert(AuthSession { user, session });

    Ok(next.run(req).await)
}
