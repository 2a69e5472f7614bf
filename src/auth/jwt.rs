use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    errors::AppError,
    models::user::{Role, UserDoc},
};

/// Claims of a session token. `sv` is the session version the token was
/// issued under; validation re-checks it against the stored session on
/// every request, so a token dies the moment a newer login lands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub sv: i64,

    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    pub fn from_secret(secret: &str) -> Self {
        let secret = secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

pub fn new_session_claims(user: &UserDoc, session_version: i64, ttl_seconds: i64) -> Claims {
    let now = Utc::now();
    Claims {
        sub: user.id.to_hex(),
        role: user.role,
        sv: session_version,
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(ttl_seconds)).timestamp() as usize,
    }
}

pub fn make_token(claims: &Claims, keys: &Keys) -> Result<String, AppError> {
    encode(&Header::default(), claims, &keys.encoding).map_err(|_| AppError::InvalidToken)
}

pub fn decode_token(token: &str, keys: &Keys) -> Result<TokenData<Claims>, AppError> {
    decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};

    fn test_user() -> UserDoc {
        UserDoc {
            id: ObjectId::new(),
            username: "admin".into(),
            password_hash: String::new(),
            role: Role::Admin,
            created_at: BsonDateTime::now(),
            session: None,
        }
    }

    #[test]
    fn claims_roundtrip() {
        let keys = Keys::from_secret("unit-test-secret");
        let user = test_user();

        let claims = new_session_claims(&user, 7, 3600);
        let token = make_token(&claims, &keys).unwrap();
        let decoded = decode_token(&token, &keys).unwrap().claims;

        assert_eq!(decoded.sub, user.id.to_hex());
        assert_eq!(decoded.role, Role::Admin);
        assert_eq!(decoded.sv, 7);
    }

    #[test]
    fn wrong_secret_rejected() {
        let user = test_user();
        let claims = new_session_claims(&user, 1, 3600);
        let token = make_token(&claims, &Keys::from_secret("secret-a")).unwrap();

        assert!(matches!(
            decode_token(&token, &Keys::from_secret("secret-b")),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_rejected() {
        let keys = Keys::from_secret("unit-test-secret");
        let user = test_user();

        // expired an hour ago, well past the default leeway
        let claims = new_session_claims(&user, 1, -3600);
        let token = make_token(&claims, &keys).unwrap();

        assert!(matches!(
            decode_token(&token, &keys),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn tampered_token_rejected() {
        let keys = Keys::from_secret("unit-test-secret");
        let user = test_user();
        let token = make_token(&new_session_claims(&user, 1, 3600), &keys).unwrap();

        let tampered = format!("{token}x");
        assert!(decode_token(&tampered, &keys).is_err());
    }
}
