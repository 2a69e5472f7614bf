use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::{
    errors::AppError,
    models::user::{SessionState, UserDoc},
};

use super::{NewSession, UserStore};

/// HashMap-backed store. Backs the test suites and `cargo run` smoke
/// setups; the write lock spans each check-and-write, giving it the
/// same atomicity the Mongo impl gets from conditional updates.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<ObjectId, UserDoc>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserDoc>, AppError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>, AppError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn insert(&self, user: &UserDoc) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("user already exists".into()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<UserDoc>, AppError> {
        let users = self.users.read().await;
        let mut all: Vec<UserDoc> = users.values().cloned().collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(all)
    }

    async fn install_session(
        &self,
        id: ObjectId,
        force: bool,
        session: NewSession,
    ) -> Result<Option<UserDoc>, AppError> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        if !force && user.live_session().is_some() {
            return Ok(None);
        }

        let version = user.session.as_ref().map(|s| s.version).unwrap_or(0) + 1;
        user.session = Some(SessionState {
            version,
            is_valid: true,
            device_name: session.device_name,
            ip_address: session.ip_address,
            login_time: session.at,
            last_activity: session.at,
        });

        Ok(Some(user.clone()))
    }

    async fn invalidate_session(&self, id: ObjectId) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(&id) {
            if let Some(session) = user.session.as_mut() {
                session.is_valid = false;
            }
        }
        Ok(())
    }
}
