//! Session authority: the only code that creates or invalidates live
//! sessions. At most one device holds a valid session per account;
//! `force` preempts the current holder.

use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

use crate::{
    auth::jwt::{make_token, new_session_claims},
    dto::auth::LoginRequest,
    errors::AppError,
    models::user::{SessionState, UserDoc},
    password::verify_password,
    state::AppState,
    store::NewSession,
};

/// Request-side metadata recorded on the session being installed.
#[derive(Debug, Clone)]
pub struct LoginContext {
    pub device_name: String,
    pub ip_address: String,
}

pub enum LoginOutcome {
    /// No live session stood in the way.
    Success {
        token: String,
        user: UserDoc,
        session: SessionState,
    },
    /// A live session existed and `force` displaced it.
    Forced {
        token: String,
        user: UserDoc,
        session: SessionState,
        previous: SessionState,
    },
    /// A live session exists and `force` was not given. Carries the
    /// holder's metadata so the client can ask "sign them out?".
    /// Nothing was written.
    Conflict { active: SessionState },
}

pub async fn attempt_login(
    state: &AppState,
    req: &LoginRequest,
    ctx: LoginContext,
) -> Result<LoginOutcome, AppError> {
    let username = req.username.trim().to_lowercase();

    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let previous = user.live_session().cloned();
    if let Some(active) = &previous {
        if !req.force {
            return Ok(LoginOutcome::Conflict {
                active: active.clone(),
            });
        }
    }

    let session = NewSession {
        device_name: ctx.device_name,
        ip_address: ctx.ip_address,
        at: BsonDateTime::now(),
    };

    // The store install is conditional (no live session) unless forced;
    // losing the condition means another device logged in between our
    // read and the write, which is a conflict like any other. A raced
    // logout frees the slot again, so retry a couple of times.
    let mut attempts = 0;
    let updated = loop {
        match state
            .users
            .install_session(user.id, req.force, session.clone())
            .await?
        {
            Some(doc) => break doc,
            None => {
                let Some(current) = state.users.find_by_id(user.id).await? else {
                    // account deleted mid-login; fail closed
                    return Err(AppError::InvalidCredentials);
                };
                if let Some(active) = current.live_session() {
                    return Ok(LoginOutcome::Conflict {
                        active: active.clone(),
                    });
                }
                attempts += 1;
                if attempts >= 3 {
                    return Err(AppError::Internal("login kept racing, giving up".into()));
                }
            }
        }
    };

    let installed = updated
        .session
        .clone()
        .ok_or_else(|| AppError::Internal("session missing after install".into()))?;

    let claims = new_session_claims(&updated, installed.version, state.cfg.jwt_ttl_seconds);
    let token = make_token(&claims, &state.keys)?;

    Ok(match previous {
        Some(prev) if req.force => LoginOutcome::Forced {
            token,
            user: updated,
            session: installed,
            previous: prev,
        },
        _ => LoginOutcome::Success {
            token,
            user: updated,
            session: installed,
        },
    })
}

/// Invalidate the caller's session. Safe to call when no session is
/// live; the version is left alone so re-login works without `force`.
pub async fn logout(state: &AppState, user_id: ObjectId) -> Result<(), AppError> {
    state.users.invalidate_session(user_id).await
}

/// Admin-side variant of `logout`, addressed by username.
pub async fn revoke_session(state: &AppState, username: &str) -> Result<(), AppError> {
    let username = username.trim().to_lowercase();
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;
    state.users.invalidate_session(user.id).await
}
