//! Blog service routes

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderName, Method, StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth_middleware},
    models::{CreatedResponse, NewBlogPost},
    state::AppState,
};

/// Create the router for the blog service
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ]);

    let publish = post(create_blog).route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth_middleware,
    ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/blogs", get(list_blogs).merge(publish))
        .route("/api/blogs/:id", get(get_blog))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Every post, newest first
pub async fn list_blogs(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let posts = state.blogs.list().await.map_err(|e| {
        error!("Failed to fetch blogs: {}", e);
        ApiError::Internal("Failed to fetch blogs")
    })?;

    Ok(Json(posts))
}

/// One post by id
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let post = state
        .blogs
        .find_by_id(&id)
        .await
        .map_err(|e| {
            error!("Failed to fetch blog post {}: {}", id, e);
            ApiError::Internal("Failed to fetch blog post")
        })?
        .ok_or(ApiError::NotFound("Blog post not found"))?;

    Ok(Json(post))
}

/// Publish a post; requires a bearer token
pub async fn create_blog(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthUser>,
    payload: Result<Json<NewBlogPost>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(new_post) = payload.map_err(|e| {
        error!("Rejected blog post body from {}: {}", user.email, e);
        ApiError::Internal("Failed to create blog post")
    })?;

    let id = state.blogs.create(new_post).await.map_err(|e| {
        error!("Failed to create blog post: {}", e);
        ApiError::Internal("Failed to create blog post")
    })?;

    tracing::info!("Blog post {} published by {}", id, user.id);
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { success: true, id }),
    ))
}
