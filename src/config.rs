#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub db_name: String,

    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,

    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Self {
        let mongodb_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI is required");
        let db_name = std::env::var("DB_NAME").unwrap_or_else(|_| "atelier".to_string());

        let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET is required");

        // dashboard users stay signed in for a working day
        let jwt_ttl_seconds = std::env::var("JWT_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24 * 60 * 60);

        let admin_username =
            std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let admin_password =
            std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        Self {
            mongodb_uri,
            db_name,
            jwt_secret,
            jwt_ttl_seconds,
            admin_username,
            admin_password,
        }
    }
}
