use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    dto::auth::{CreateUserRequest, CreateUserResponse, MessageResponse, UsersResponse},
    errors::AppError,
    services::{account, session},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All accounts", body = UsersResponse),
        (status = 403, description = "Role not allowed"),
    ),
    tag = "admin"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersResponse>, AppError> {
    Ok(Json(UsersResponse {
        users: account::list_users(&state).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = CreateUserResponse),
        (status = 409, description = "Username taken"),
    ),
    tag = "admin"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), AppError> {
    let user = account::create_user(&state, req).await?;
    Ok((StatusCode::CREATED, Json(CreateUserResponse { user })))
}

#[utoipa::path(
    delete,
    path = "/admin/sessions/{username}",
    params(("username" = String, Path, description = "Account whose session to revoke")),
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 404, description = "No such account"),
    ),
    tag = "admin"
)]
pub async fn revoke_session(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    session::revoke_session(&state, &username).await?;
    tracing::info!(%username, "session revoked by admin");
    Ok(Json(MessageResponse {
        message: format!("session for '{username}' invalidated"),
    }))
}
