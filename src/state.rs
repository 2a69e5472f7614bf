use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions},
    Client, IndexModel,
};
use std::sync::Arc;

use crate::{
    auth::jwt::Keys,
    config::Config,
    models::user::UserDoc,
    store::{MongoUserStore, UserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub cfg: Arc<Config>,
    pub keys: Keys,
}

impl AppState {
    pub async fn new(cfg: Config) -> mongodb::error::Result<Self> {
        let mut opts = ClientOptions::parse(&cfg.mongodb_uri).await?;
        opts.app_name = Some("atelier-auth".to_string());
        let client = Client::with_options(opts)?;
        let users: mongodb::Collection<UserDoc> =
            client.database(&cfg.db_name).collection("users");

        let username_unique = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(username_unique).await?;

        Ok(Self::with_store(Arc::new(MongoUserStore::new(users)), cfg))
    }

    /// Assemble state over any store. The session logic never touches
    /// Mongo directly, so tests run this with `MemoryUserStore`.
    pub fn with_store(users: Arc<dyn UserStore>, cfg: Config) -> Self {
        let keys = Keys::from_secret(&cfg.jwt_secret);
        Self {
            users,
            cfg: Arc::new(cfg),
            keys,
        }
    }
}
