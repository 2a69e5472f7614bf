//! User persistence behind a trait so the session authority and the
//! request guard can run against Mongo in production and an in-memory
//! store in tests.

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

use crate::{errors::AppError, models::user::UserDoc};

pub mod memory;
pub mod mongo;

pub use memory::MemoryUserStore;
pub use mongo::MongoUserStore;

/// Metadata of a session about to be installed. The store allocates the
/// version itself (previous + 1) inside the same atomic update.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub device_name: String,
    pub ip_address: String,
    pub at: BsonDateTime,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserDoc>, AppError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>, AppError>;

    async fn insert(&self, user: &UserDoc) -> Result<(), AppError>;

    async fn list(&self) -> Result<Vec<UserDoc>, AppError>;

    /// Atomically install `session` as the live session of `id`:
    /// version is incremented, `is_valid` set, metadata overwritten.
    ///
    /// Unless `force` is set the write is conditional on no live session
    /// existing; `None` means the condition failed (a live session held
    /// the slot) and nothing was written. With `force` the write is
    /// unconditional and `None` only means the user is gone.
    ///
    /// Returns the document as it is after the update, so callers read
    /// the authoritative new version from it.
    async fn install_session(
        &self,
        id: ObjectId,
        force: bool,
        session: NewSession,
    ) -> Result<Option<UserDoc>, AppError>;

    /// Flip the live session of `id` to invalid. A user without a
    /// session record is left untouched; the call still succeeds.
    /// The version is never changed here.
    async fn invalidate_session(&self, id: ObjectId) -> Result<(), AppError>;
}
