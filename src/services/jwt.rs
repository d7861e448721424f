// Session authority: JWT mint/verify with per-token jti tracking and a
// Redis-backed revocation blacklist.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::services::cache::{cache_keys, ttl, CacheService};

const TOKEN_ISSUER: &str = "idler";

/// Access token lifetime: one hour.
pub const TOKEN_TTL_SECONDS: u64 = 3600;

#[derive(Error, Debug)]
pub enum JwtError {
    /// The one error clients ever see. Parse failures, bad signatures,
    /// issuer mismatches, expiry and blacklist hits all collapse into it.
    #[error("Token invalid")]
    Invalid,

    #[error("JWT encoding error: {0}")]
    EncodingError(String),

    #[error("Blacklist check failed: {0}")]
    BlacklistCheck(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cache: Option<CacheService>,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            cache: None,
        }
    }

    pub fn with_cache(secret: &str, cache: CacheService) -> Self {
        Self {
            cache: Some(cache),
            ..Self::new(secret)
        }
    }

    /// Mint a session token. Every call generates a fresh jti, which is the
    /// revocation handle for this token.
    pub fn make_jwt(&self, user_id: Uuid) -> Result<(String, String), JwtError> {
        self.make_jwt_with_ttl(user_id, TOKEN_TTL_SECONDS)
    }

    pub fn make_jwt_with_ttl(
        &self,
        user_id: Uuid,
        ttl_seconds: u64,
    ) -> Result<(String, String), JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?
            .as_secs();

        let jti = Uuid::new_v4().to_string();
        let claims = Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp: now + ttl_seconds,
            jti: jti.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))?;

        Ok((token, jti))
    }

    /// Verify signature, expiry and issuer. No blacklist lookup.
    pub fn validate_jwt(&self, token: &str) -> Result<Uuid, JwtError> {
        let claims = self.decode_claims(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| JwtError::Invalid)
    }

    /// Full validation for mutating requests: signature, expiry, issuer,
    /// then assert the jti has not been revoked.
    pub async fn validate_jwt_with_blacklist(&self, token: &str) -> Result<Uuid, JwtError> {
        let claims = self.validate_claims_with_blacklist(token).await?;
        Uuid::parse_str(&claims.sub).map_err(|_| JwtError::Invalid)
    }

    /// Same as [`validate_jwt_with_blacklist`] but keeps the claims, for
    /// callers that need the jti (the WebSocket hub keys clients by it).
    pub async fn validate_claims_with_blacklist(&self, token: &str) -> Result<Claims, JwtError> {
        let claims = self.decode_claims(token)?;

        if let Some(cache) = &self.cache {
            let blacklisted = cache
                .exists(&cache_keys::blacklist_token(&claims.jti))
                .await
                .map_err(|e| JwtError::BlacklistCheck(e.to_string()))?;
            if blacklisted {
                return Err(JwtError::Invalid);
            }
        }

        Ok(claims)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| JwtError::Invalid)
    }

    /// Record the jti in the user's live-token set so a later login can
    /// revoke every outstanding session.
    pub async fn track_user_token(&self, user_id: Uuid, jti: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.sadd(&cache_keys::user_tokens(user_id), jti).await {
                tracing::warn!("Failed to track token for user {}: {}", user_id, e);
            }
        }
    }

    /// Blacklist every tracked jti for the user and clear the set. The TTL
    /// outlives any remaining JWT lifetime. Returns the jtis so the caller
    /// can disconnect live WebSocket sessions holding them.
    pub async fn blacklist_all_user_tokens(&self, user_id: Uuid) -> Result<Vec<String>, JwtError> {
        let Some(cache) = &self.cache else {
            return Ok(Vec::new());
        };

        let set_key = cache_keys::user_tokens(user_id);
        let jtis = cache
            .smembers(&set_key)
            .await
            .map_err(|e| JwtError::BlacklistCheck(e.to_string()))?;

        if !jtis.is_empty() {
            cache
                .blacklist_tokens(&set_key, &jtis, ttl::BLACKLIST)
                .await
                .map_err(|e| JwtError::BlacklistCheck(e.to_string()))?;
        }

        Ok(jtis)
    }

    /// Opaque refresh token: 32 random bytes as lowercase hex.
    pub fn make_refresh_token() -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-with-enough-length-0123456789";

    #[test]
    fn mint_and_validate_roundtrip() {
        let service = JwtService::new(TEST_SECRET);
        let user_id = Uuid::new_v4();

        let (token, jti) = service.make_jwt(user_id).unwrap();
        assert!(!jti.is_empty());

        let subject = service.validate_jwt(&token).unwrap();
        assert_eq!(subject, user_id);
    }

    #[test]
    fn every_mint_gets_a_fresh_jti() {
        let service = JwtService::new(TEST_SECRET);
        let user_id = Uuid::new_v4();

        let (_, first) = service.make_jwt(user_id).unwrap();
        let (_, second) = service.make_jwt(user_id).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let service = JwtService::new(TEST_SECRET);
        let other = JwtService::new("another-secret-that-is-long-enough-too");

        let (token, _) = service.make_jwt(Uuid::new_v4()).unwrap();
        assert!(matches!(other.validate_jwt(&token), Err(JwtError::Invalid)));
    }

    #[test]
    fn expired_token_is_invalid() {
        let service = JwtService::new(TEST_SECRET);
        let (token, _) = service.make_jwt_with_ttl(Uuid::new_v4(), 0).unwrap();

        // exp == iat and leeway is zero
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(matches!(service.validate_jwt(&token), Err(JwtError::Invalid)));
    }

    #[test]
    fn garbage_token_is_invalid() {
        let service = JwtService::new(TEST_SECRET);
        assert!(matches!(
            service.validate_jwt("not.a.token"),
            Err(JwtError::Invalid)
        ));
    }

    #[test]
    fn refresh_tokens_are_64_hex_chars_and_unique() {
        let first = JwtService::make_refresh_token();
        let second = JwtService::make_refresh_token();

        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(first.chars().all(|c| !c.is_ascii_uppercase()));
        assert_ne!(first, second);
    }
}
