use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson},
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Collection,
};

use crate::{errors::AppError, models::user::UserDoc};

use super::{NewSession, UserStore};

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<UserDoc>,
}

impl MongoUserStore {
    pub fn new(users: Collection<UserDoc>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserDoc>, AppError> {
        Ok(self.users.find_one(doc! { "username": username }).await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>, AppError> {
        Ok(self.users.find_one(doc! { "_id": id }).await?)
    }

    async fn insert(&self, user: &UserDoc) -> Result<(), AppError> {
        self.users.insert_one(user).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<UserDoc>, AppError> {
        let cursor = self.users.find(doc! {}).sort(doc! { "username": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn install_session(
        &self,
        id: ObjectId,
        force: bool,
        session: NewSession,
    ) -> Result<Option<UserDoc>, AppError> {
        // Conflict check and write are one conditional update, so two
        // concurrent non-forced logins can never both pass. `session:
        // null` also matches documents without the field.
        let filter = if force {
            doc! { "_id": id }
        } else {
            doc! {
                "_id": id,
                "$or": [
                    { "session": Bson::Null },
                    { "session.is_valid": false },
                ],
            }
        };

        let update = doc! {
            "$inc": { "session.version": 1i64 },
            "$set": {
                "session.is_valid": true,
                "session.device_name": &session.device_name,
                "session.ip_address": &session.ip_address,
                "session.login_time": session.at,
                "session.last_activity": session.at,
            },
        };

        let updated = self
            .users
            .find_one_and_update(filter, update)
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;

        Ok(updated)
    }

    async fn invalidate_session(&self, id: ObjectId) -> Result<(), AppError> {
        // Guarded so a user that never logged in does not end up with a
        // half-built session sub-document.
        self.users
            .update_one(
                doc! { "_id": id, "session": { "$ne": Bson::Null } },
                doc! { "$set": { "session.is_valid": false } },
            )
            .await?;
        Ok(())
    }
}
