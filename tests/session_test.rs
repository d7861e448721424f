// Session authority behavior that needs no live database or cache:
// JWT lifecycle, refresh-token shape, password hashing.

use idler_server::services::jwt::{JwtError, JwtService};
use idler_server::utils::{hash_password, verify_password};
use uuid::Uuid;

const SECRET: &str = "integration-test-secret-0123456789abcdef";

#[test]
fn jwt_roundtrip_preserves_subject() {
    let service = JwtService::new(SECRET);
    let user_id = Uuid::new_v4();

    let (token, jti) = service.make_jwt(user_id).unwrap();
    assert_eq!(jti.len(), 36); // uuid text form

    assert_eq!(service.validate_jwt(&token).unwrap(), user_id);
}

#[test]
fn jti_is_fresh_per_token() {
    let service = JwtService::new(SECRET);
    let user_id = Uuid::new_v4();

    let (token_a, jti_a) = service.make_jwt(user_id).unwrap();
    let (token_b, jti_b) = service.make_jwt(user_id).unwrap();

    assert_ne!(jti_a, jti_b);
    assert_ne!(token_a, token_b);
}

#[test]
fn tampered_token_collapses_to_invalid() {
    let service = JwtService::new(SECRET);
    let (token, _) = service.make_jwt(Uuid::new_v4()).unwrap();

    // Flip a character in the signature segment
    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    assert!(matches!(
        service.validate_jwt(&tampered),
        Err(JwtError::Invalid)
    ));
}

#[test]
fn foreign_issuer_and_garbage_are_invalid() {
    let service = JwtService::new(SECRET);

    assert!(matches!(service.validate_jwt(""), Err(JwtError::Invalid)));
    assert!(matches!(
        service.validate_jwt("a.b.c"),
        Err(JwtError::Invalid)
    ));
}

#[tokio::test]
async fn blacklist_is_skipped_without_cache() {
    // Without a cache the service still validates signature and expiry;
    // the blacklist assertion only applies when Redis is wired in.
    let service = JwtService::new(SECRET);
    let user_id = Uuid::new_v4();

    let (token, _) = service.make_jwt(user_id).unwrap();
    assert_eq!(
        service.validate_jwt_with_blacklist(&token).await.unwrap(),
        user_id
    );
}

#[test]
fn refresh_tokens_are_opaque_hex() {
    let token = JwtService::make_refresh_token();

    assert_eq!(token.len(), 64);
    assert!(token
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

    // 256 bits of randomness should never collide in a test run
    assert_ne!(token, JwtService::make_refresh_token());
}

#[test]
fn password_hash_verifies_and_rejects() {
    let hash = hash_password("StrongPass1").unwrap();

    assert!(hash.starts_with("$2"));
    assert!(verify_password("StrongPass1", &hash).unwrap());
    assert!(!verify_password("StrongPass2", &hash).unwrap());
}
