use crate::error::{AppError, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims of access tokens issued by the identity service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub email: String,
    pub role: String,
    pub exp: i64,
}

/// Verify JWT token and extract claims
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

#[cfg(test)]
pub fn issue_test_token(user_id: uuid::Uuid, role: &str, secret: &str, ttl_minutes: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: user_id.to_string(),
        email: "test@example.com".to_string(),
        role: role.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::minutes(ttl_minutes)).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_verify_round_trip() {
        let user_id = Uuid::new_v4();
        let token = issue_test_token(user_id, "admin", "mysecretkey", 15);
        let claims = verify_jwt(&token, "mysecretkey").unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_test_token(Uuid::new_v4(), "user", "mysecretkey", 15);
        assert!(matches!(verify_jwt(&token, "other"), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = issue_test_token(Uuid::new_v4(), "user", "mysecretkey", -10);
        assert!(verify_jwt(&token, "mysecretkey").is_err());
    }
}
