use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

use crate::{
    dto::auth::CreateUserRequest,
    errors::AppError,
    models::user::{Role, UserDoc, UserPublic},
    password::hash_password,
    state::AppState,
};

pub async fn create_user(
    state: &AppState,
    req: CreateUserRequest,
) -> Result<UserPublic, AppError> {
    let username = req.username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }

    if state.users.find_by_username(&username).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "user '{username}' already exists"
        )));
    }

    let user = UserDoc {
        id: ObjectId::new(),
        username,
        password_hash: hash_password(&req.password)?,
        role: req.role,
        created_at: BsonDateTime::now(),
        session: None,
    };
    state.users.insert(&user).await?;
    Ok(UserPublic::from(&user))
}

pub async fn list_users(state: &AppState) -> Result<Vec<UserPublic>, AppError> {
    Ok(state
        .users
        .list()
        .await?
        .iter()
        .map(UserPublic::from)
        .collect())
}

/// Seed the bootstrap admin account on first start so the instance is
/// reachable before anyone has provisioned real users.
pub async fn ensure_default_admin(state: &AppState) -> Result<(), AppError> {
    let username = state.cfg.admin_username.trim().to_lowercase();
    if state.users.find_by_username(&username).await?.is_some() {
        return Ok(());
    }

    let admin = UserDoc {
        id: ObjectId::new(),
        username,
        password_hash: hash_password(&state.cfg.admin_password)?,
        role: Role::Admin,
        created_at: BsonDateTime::now(),
        session: None,
    };
    state.users.insert(&admin).await?;

    tracing::warn!(
        username = %admin.username,
        "seeded default admin account, change its password"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, store::MemoryUserStore};
    use std::sync::Arc;

    fn test_state() -> AppState {
        let cfg = Config {
            mongodb_uri: "mongodb://unused".into(),
            db_name: "test".into(),
            jwt_secret: "account-test-secret".into(),
            jwt_ttl_seconds: 3600,
            admin_username: "admin".into(),
            admin_password: "admin123".into(),
        };
        AppState::with_store(Arc::new(MemoryUserStore::new()), cfg)
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let state = test_state();
        let req = || CreateUserRequest {
            username: "paula".into(),
            password: "paula-pass1".into(),
            role: Role::Staff,
        };

        create_user(&state, req()).await.unwrap();
        assert!(matches!(
            create_user(&state, req()).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn usernames_are_normalized() {
        let state = test_state();
        let created = create_user(
            &state,
            CreateUserRequest {
                username: "  Paula ".into(),
                password: "paula-pass1".into(),
                role: Role::Manager,
            },
        )
        .await
        .unwrap();

        assert_eq!(created.username, "paula");
        assert!(state
            .users
            .find_by_username("paula")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn default_admin_seed_is_idempotent() {
        let state = test_state();
        ensure_default_admin(&state).await.unwrap();
        ensure_default_admin(&state).await.unwrap();

        let users = list_users(&state).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "admin");
        assert_eq!(users[0].role, Role::Admin);
    }
}
