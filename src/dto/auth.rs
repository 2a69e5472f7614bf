use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::user::{bson_to_rfc3339, Role, SessionState, UserPublic};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Displace an existing live session instead of conflicting.
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub device_name: Option<String>,
}

/// Session metadata as shown to clients, timestamps in RFC 3339.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub device_name: String,
    pub ip_address: String,
    pub login_time: String,
    pub last_activity: String,
}

impl From<&SessionState> for SessionInfo {
    fn from(s: &SessionState) -> Self {
        Self {
            device_name: s.device_name.clone(),
            ip_address: s.ip_address.clone(),
            login_time: bson_to_rfc3339(s.login_time),
            last_activity: bson_to_rfc3339(s.last_activity),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserPublic,
    pub session_info: SessionInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForcedLoginResponse {
    pub token: String,
    pub message: String,
    pub user: UserPublic,
    pub session_info: SessionInfo,
    pub previous_session: SessionInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionConflictResponse {
    pub message: String,
    pub code: String,
    pub session_info: SessionInfo,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserPublic,
    pub session_info: Option<SessionInfo>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateUserResponse {
    pub user: UserPublic,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<UserPublic>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
