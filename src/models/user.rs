use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Fixed role set of the Atelier suite. Stored as lowercase strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Staff,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::Staff];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }
}

/// The one live-session record of an account, embedded in the user
/// document. Created/overwritten on login, flipped invalid on logout,
/// never mutated anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Increases by one on every successful login; tokens carry the
    /// version they were issued under.
    pub version: i64,
    pub is_valid: bool,

    pub device_name: String,
    pub ip_address: String,

    pub login_time: BsonDateTime,
    pub last_activity: BsonDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub username: String,
    pub password_hash: String,
    pub role: Role,

    pub created_at: BsonDateTime,

    // absent until the first login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionState>,
}

impl UserDoc {
    /// The session that currently authorizes tokens, if any.
    pub fn live_session(&self) -> Option<&SessionState> {
        self.session.as_ref().filter(|s| s.is_valid)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&UserDoc> for UserPublic {
    fn from(u: &UserDoc) -> Self {
        Self {
            id: u.id.to_hex(),
            username: u.username.clone(),
            role: u.role,
            created_at: bson_to_rfc3339(u.created_at),
        }
    }
}

pub fn bson_to_rfc3339(dt: BsonDateTime) -> String {
    // bson::DateTime хранит миллисекунды от epoch; можно перевести в chrono
    let ms = dt.timestamp_millis();
    let secs = ms / 1000;
    let nsec = ((ms % 1000) * 1_000_000) as u32;
    let chrono_dt = chrono::DateTime::<chrono::Utc>::from_timestamp(secs, nsec)
        .unwrap_or_else(|| chrono::DateTime::<chrono::Utc>::from_timestamp(0, 0).unwrap());
    chrono_dt.to_rfc3339()
}
