use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::{
    auth::guard::{AuthPrincipal, ClientMeta, TokenIdentity},
    dto::auth::{
        ForcedLoginResponse, LoginRequest, LoginResponse, MeResponse, MessageResponse,
        SessionConflictResponse, SessionInfo,
    },
    errors::AppError,
    models::user::UserPublic,
    services::session::{self, LoginContext, LoginOutcome},
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 401, description = "Bad credentials"),
        (status = 409, description = "Another device holds the session", body = SessionConflictResponse),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    client: ClientMeta,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let device_name = req
        .device_name
        .clone()
        .or_else(|| client.user_agent.clone())
        .unwrap_or_else(|| "unknown device".to_string());
    let ctx = LoginContext {
        device_name,
        ip_address: client.ip_address,
    };

    match session::attempt_login(&state, &req, ctx).await? {
        LoginOutcome::Success {
            token,
            user,
            session,
        } => Ok(Json(LoginResponse {
            token,
            user: UserPublic::from(&user),
            session_info: SessionInfo::from(&session),
        })
        .into_response()),
        LoginOutcome::Forced {
            token,
            user,
            session,
            previous,
        } => {
            tracing::info!(
                username = %user.username,
                displaced_device = %previous.device_name,
                "forced login"
            );
            Ok(Json(ForcedLoginResponse {
                token,
                message: format!("previous session on '{}' was signed out", previous.device_name),
                user: UserPublic::from(&user),
                session_info: SessionInfo::from(&session),
                previous_session: SessionInfo::from(&previous),
            })
            .into_response())
        }
        LoginOutcome::Conflict { active } => Ok((
            StatusCode::CONFLICT,
            Json(SessionConflictResponse {
                message: format!("account is already signed in on '{}'", active.device_name),
                code: "ACTIVE_SESSION".to_string(),
                session_info: SessionInfo::from(&active),
            }),
        )
            .into_response()),
    }
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    TokenIdentity(user): TokenIdentity,
) -> Result<Json<MessageResponse>, AppError> {
    session::logout(&state, user.id).await?;
    Ok(Json(MessageResponse {
        message: "logged out".into(),
    }))
}

pub async fn me(AuthPrincipal(user): AuthPrincipal) -> Json<MeResponse> {
    Json(MeResponse {
        session_info: user.live_session().map(SessionInfo::from),
        user: UserPublic::from(&user),
    })
}
