//! Per-request token validation. A token is only as good as the
//! session record behind it, so every check re-reads the account and
//! compares the embedded session version against the stored one.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts},
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use mongodb::bson::oid::ObjectId;
use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use crate::{
    auth::jwt::{decode_token, Keys},
    errors::AppError,
    models::user::UserDoc,
    state::AppState,
    store::UserStore,
};

/// Validate a bearer token against the live session state.
///
/// Order matters: a signed token for a logged-out session reports
/// `SessionInvalidated`, while a stale token competing with a newer
/// session reports `TokenInvalidated`. Lookups never trust the claims
/// beyond the subject id.
pub async fn authorize(
    store: &dyn UserStore,
    keys: &Keys,
    token: &str,
) -> Result<UserDoc, AppError> {
    let data = decode_token(token, keys)?;

    let user_id = ObjectId::parse_str(&data.claims.sub).map_err(|_| AppError::InvalidToken)?;
    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::InvalidToken)?;

    let session = user.session.as_ref().ok_or(AppError::SessionInvalidated)?;
    if !session.is_valid {
        return Err(AppError::SessionInvalidated);
    }
    if data.claims.sv != session.version {
        return Err(AppError::TokenInvalidated);
    }

    Ok(user)
}

/// The fully validated caller: signature, account and session all
/// checked. The route policy layer runs `authorize` once and stashes
/// the user in request extensions, so handlers extract for free.
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub UserDoc);

impl FromRequestParts<Arc<AppState>> for AuthPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<UserDoc>() {
            return Ok(Self(user.clone()));
        }

        let token = bearer_token(parts).await?;
        let user = authorize(state.users.as_ref(), &state.keys, &token).await?;
        Ok(Self(user))
    }
}

/// Proof of identity without session checks: signature plus account
/// lookup only. Logout uses this so a second logout with the same
/// token still succeeds instead of bouncing off its own invalidation.
#[derive(Debug, Clone)]
pub struct TokenIdentity(pub UserDoc);

impl FromRequestParts<Arc<AppState>> for TokenIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).await?;
        let data = decode_token(&token, &state.keys)?;
        let user_id = ObjectId::parse_str(&data.claims.sub).map_err(|_| AppError::InvalidToken)?;
        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;
        Ok(Self(user))
    }
}

async fn bearer_token(parts: &mut Parts) -> Result<String, AppError> {
    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|_| AppError::InvalidToken)?;
    Ok(bearer.token().to_string())
}

/// Where the request came from, for session metadata. The service runs
/// behind a reverse proxy, so forwarded headers win over the socket
/// address.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip_address: String,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Self {
            ip_address: client_ip(parts),
            user_agent,
        })
    }
}

fn client_ip(parts: &Parts) -> String {
    if let Some(forwarded) = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = parts.headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        return real_ip.trim().to_string();
    }
    if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::jwt::{make_token, new_session_claims},
        config::Config,
        dto::auth::{CreateUserRequest, LoginRequest},
        models::user::Role,
        services::{account, session},
        store::MemoryUserStore,
    };

    fn test_state() -> AppState {
        let cfg = Config {
            mongodb_uri: "mongodb://unused".into(),
            db_name: "test".into(),
            jwt_secret: "guard-test-secret".into(),
            jwt_ttl_seconds: 3600,
            admin_username: "admin".into(),
            admin_password: "admin123".into(),
        };
        AppState::with_store(Arc::new(MemoryUserStore::new()), cfg)
    }

    async fn login(state: &AppState, force: bool) -> String {
        let req = LoginRequest {
            username: "admin".into(),
            password: "admin123".into(),
            force,
            device_name: None,
        };
        let ctx = session::LoginContext {
            device_name: "test".into(),
            ip_address: "192.0.2.1".into(),
        };
        match session::attempt_login(state, &req, ctx).await.unwrap() {
            session::LoginOutcome::Success { token, .. }
            | session::LoginOutcome::Forced { token, .. } => token,
            session::LoginOutcome::Conflict { .. } => panic!("unexpected conflict"),
        }
    }

    async fn seeded_state() -> AppState {
        let state = test_state();
        account::create_user(
            &state,
            CreateUserRequest {
                username: "admin".into(),
                password: "admin123".into(),
                role: Role::Admin,
            },
        )
        .await
        .unwrap();
        state
    }

    #[tokio::test]
    async fn live_token_authorizes() {
        let state = seeded_state().await;
        let token = login(&state, false).await;

        let user = authorize(state.users.as_ref(), &state.keys, &token)
            .await
            .unwrap();
        assert_eq!(user.username, "admin");
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let state = seeded_state().await;
        assert!(matches!(
            authorize(state.users.as_ref(), &state.keys, "not-a-token").await,
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn token_for_unknown_account_is_invalid() {
        let state = seeded_state().await;
        let ghost = UserDoc {
            id: ObjectId::new(),
            username: "ghost".into(),
            password_hash: String::new(),
            role: Role::Staff,
            created_at: mongodb::bson::DateTime::now(),
            session: None,
        };
        let claims = new_session_claims(&ghost, 1, 3600);
        let token = make_token(&claims, &state.keys).unwrap();

        assert!(matches!(
            authorize(state.users.as_ref(), &state.keys, &token).await,
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn superseded_token_reports_token_invalidated() {
        let state = seeded_state().await;
        let old = login(&state, false).await;
        let new = login(&state, true).await;

        assert!(matches!(
            authorize(state.users.as_ref(), &state.keys, &old).await,
            Err(AppError::TokenInvalidated)
        ));
        assert!(authorize(state.users.as_ref(), &state.keys, &new)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn logged_out_token_reports_session_invalidated() {
        let state = seeded_state().await;
        let token = login(&state, false).await;
        let user = state.users.find_by_username("admin").await.unwrap().unwrap();
        session::logout(&state, user.id).await.unwrap();

        assert!(matches!(
            authorize(state.users.as_ref(), &state.keys, &token).await,
            Err(AppError::SessionInvalidated)
        ));
    }
}
