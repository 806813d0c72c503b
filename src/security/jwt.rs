use anyhow::{anyhow, Result};
/// JWT token generation and validation using HS256.
/// Token lifetime is configured via `JWT_EXPIRY_SECS`.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use lazy_static::lazy_static;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id, ObjectId hex)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type, always "access"
    pub token_type: String,
    /// Email address
    pub email: String,
    /// Username
    pub username: String,
}

struct JwtState {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_secs: i64,
}

// Thread-safe mutable storage for the JWT secret loaded at startup
lazy_static! {
    static ref JWT_STATE: RwLock<Option<JwtState>> = RwLock::new(None);
}

/// Initialize the signing secret. Must be called during application
/// startup before any JWT operations.
pub fn initialize(secret: &str, expiry_secs: i64) -> Result<()> {
    let mut state = JWT_STATE
        .write()
        .map_err(|e| anyhow!("Failed to acquire write lock on JWT state: {}", e))?;
    *state = Some(JwtState {
        encoding: EncodingKey::from_secret(secret.as_bytes()),
        decoding: DecodingKey::from_secret(secret.as_bytes()),
        expiry_secs,
    });
    Ok(())
}

/// Generate an access token for a user.
pub fn generate_token(user_id: ObjectId, email: &str, username: &str) -> Result<String> {
    let state = JWT_STATE
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT state: {}", e))?;
    let state = state
        .as_ref()
        .ok_or_else(|| anyhow!("JWT state not initialized. Call initialize() during startup"))?;

    let now = Utc::now();
    let expiry = now + Duration::seconds(state.expiry_secs);

    let claims = Claims {
        sub: user_id.to_hex(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        token_type: "access".to_string(),
        email: email.to_string(),
        username: username.to_string(),
    };

    encode(&Header::default(), &claims, &state.encoding)
        .map_err(|e| anyhow!("Failed to generate access token: {}", e))
}

/// Validate a token and return its decoded claims.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let state = JWT_STATE
        .read()
        .map_err(|e| anyhow!("Failed to acquire read lock on JWT state: {}", e))?;
    let state = state
        .as_ref()
        .ok_or_else(|| anyhow!("JWT state not initialized. Call initialize() during startup"))?;

    decode::<Claims>(token, &state.decoding, &Validation::default())
        .map_err(|e| anyhow!("Invalid token: {}", e))
}

/// Parse the token subject into an ObjectId.
pub fn subject_id(claims: &Claims) -> Result<ObjectId> {
    ObjectId::parse_str(&claims.sub).map_err(|e| anyhow!("Invalid user id in token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        initialize("test-secret-for-unit-tests", 3600).expect("initialize jwt");
    }

    #[test]
    fn token_round_trips_claims() {
        init();
        let user_id = ObjectId::new();
        let token = generate_token(user_id, "a@b.dev", "alice").expect("generate");

        let data = validate_token(&token).expect("validate");
        assert_eq!(data.claims.sub, user_id.to_hex());
        assert_eq!(data.claims.email, "a@b.dev");
        assert_eq!(data.claims.username, "alice");
        assert_eq!(data.claims.token_type, "access");
        assert_eq!(subject_id(&data.claims).expect("subject"), user_id);
    }

    #[test]
    fn tampered_token_is_rejected() {
        init();
        let token = generate_token(ObjectId::new(), "a@b.dev", "alice").expect("generate");
        let mut tampered = token.clone();
        tampered.truncate(token.len() - 2);
        assert!(validate_token(&tampered).is_err());
    }
}
