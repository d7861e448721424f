// Syntactic input validation. Every check is pure and returns a single
// sentinel error per violation; handlers surface the message verbatim as 400.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("email is required")]
    EmailRequired,
    #[error("email is invalid")]
    EmailInvalid,
    #[error("password is required")]
    PasswordRequired,
    #[error("password must be at least 8 characters")]
    PasswordTooShort,
    #[error("password must be at most 72 characters")]
    PasswordTooLong,
    #[error("password must contain at least one uppercase letter, one lowercase letter, and one number")]
    PasswordWeak,
    #[error("surname is required")]
    SurnameRequired,
    #[error("surname must be at least 3 characters")]
    SurnameTooShort,
    #[error("surname must be at most 20 characters")]
    SurnameTooLong,
    #[error("surname can only contain letters, numbers, and underscores")]
    SurnameInvalid,
    #[error("name is required")]
    NameRequired,
    #[error("name must be at least 3 characters")]
    NameTooShort,
    #[error("name must be at most 20 characters")]
    NameTooLong,
    #[error("name can only contain letters, numbers, and underscores")]
    NameInvalid,
    #[error("target is required")]
    TargetRequired,
    #[error("target is invalid")]
    TargetInvalid,
    #[error("amount must be greater than 0")]
    AmountInvalid,
    #[error("item name is required")]
    ItemNameRequired,
    #[error("item name is invalid")]
    ItemNameInvalid,
    #[error("quantity must be greater than 0")]
    QuantityInvalid,
}

static NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").unwrap());
static GAME_ITEM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9 ]+$").unwrap());

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::EmailRequired);
    }

    if !validator::validate_email(email) {
        return Err(ValidationError::EmailInvalid);
    }

    if !email.contains('@') || !email.contains('.') {
        return Err(ValidationError::EmailInvalid);
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }

    if password.len() < 8 {
        return Err(ValidationError::PasswordTooShort);
    }

    if password.len() > 72 {
        return Err(ValidationError::PasswordTooLong);
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_upper || !has_lower || !has_digit {
        return Err(ValidationError::PasswordWeak);
    }

    Ok(())
}

pub fn validate_surname(surname: &str) -> Result<(), ValidationError> {
    let surname = surname.trim();
    if surname.is_empty() {
        return Err(ValidationError::SurnameRequired);
    }

    if surname.len() < 3 {
        return Err(ValidationError::SurnameTooShort);
    }

    if surname.len() > 20 {
        return Err(ValidationError::SurnameTooLong);
    }

    if !NAME_REGEX.is_match(surname) {
        return Err(ValidationError::SurnameInvalid);
    }

    Ok(())
}

pub fn validate_character_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }

    if name.len() < 3 {
        return Err(ValidationError::NameTooShort);
    }

    if name.len() > 20 {
        return Err(ValidationError::NameTooLong);
    }

    if !NAME_REGEX.is_match(name) {
        return Err(ValidationError::NameInvalid);
    }

    Ok(())
}

/// Action targets are node names in the catalog's uppercase alphabet, with
/// "IDLE" accepted as the stop-working sentinel.
pub fn validate_target(target: &str) -> Result<(), ValidationError> {
    if target.is_empty() {
        return Err(ValidationError::TargetRequired);
    }

    if target == "IDLE" {
        return Ok(());
    }

    if target.len() > 50 {
        return Err(ValidationError::TargetInvalid);
    }

    if !GAME_ITEM_REGEX.is_match(target) {
        return Err(ValidationError::TargetInvalid);
    }

    Ok(())
}

pub fn validate_amount(amount: Option<i32>) -> Result<(), ValidationError> {
    match amount {
        Some(amount) if amount <= 0 => Err(ValidationError::AmountInvalid),
        _ => Ok(()),
    }
}

pub fn validate_item_name(item_name: &str) -> Result<(), ValidationError> {
    if item_name.is_empty() {
        return Err(ValidationError::ItemNameRequired);
    }

    if item_name.len() > 50 {
        return Err(ValidationError::ItemNameInvalid);
    }

    if !GAME_ITEM_REGEX.is_match(item_name) {
        return Err(ValidationError::ItemNameInvalid);
    }

    Ok(())
}

pub fn validate_quantity(quantity: i32) -> Result<(), ValidationError> {
    if quantity <= 0 {
        return Err(ValidationError::QuantityInvalid);
    }
    Ok(())
}

/// Trim and clamp a string to at most `max_length` characters.
pub fn sanitize_string(s: &str, max_length: usize) -> String {
    let trimmed = s.trim();
    match trimmed.char_indices().nth(max_length) {
        Some((idx, _)) => trimmed[..idx].to_string(),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailRequired));
        assert_eq!(validate_email("   "), Err(ValidationError::EmailRequired));
        assert_eq!(
            validate_email("not-an-email"),
            Err(ValidationError::EmailInvalid)
        );
        assert_eq!(
            validate_email("user@localhost"),
            Err(ValidationError::EmailInvalid)
        );
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email("  padded@example.com  ").is_ok());
    }

    #[test]
    fn password_rules() {
        assert_eq!(
            validate_password(""),
            Err(ValidationError::PasswordRequired)
        );
        assert_eq!(
            validate_password("Ab1"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_password(&format!("Ab1{}", "x".repeat(70))),
            Err(ValidationError::PasswordTooLong)
        );
        assert_eq!(
            validate_password("alllowercase1"),
            Err(ValidationError::PasswordWeak)
        );
        assert_eq!(
            validate_password("NoDigitsHere"),
            Err(ValidationError::PasswordWeak)
        );
        assert!(validate_password("StrongPass1").is_ok());
    }

    #[test]
    fn name_rules() {
        assert_eq!(
            validate_character_name("ab"),
            Err(ValidationError::NameTooShort)
        );
        assert_eq!(
            validate_character_name(&"a".repeat(21)),
            Err(ValidationError::NameTooLong)
        );
        assert_eq!(
            validate_character_name("bad name"),
            Err(ValidationError::NameInvalid)
        );
        assert!(validate_character_name("hero_99").is_ok());
        assert!(validate_surname("alice").is_ok());
        assert_eq!(
            validate_surname("no-dashes"),
            Err(ValidationError::SurnameInvalid)
        );
    }

    #[test]
    fn target_rules() {
        assert!(validate_target("IDLE").is_ok());
        assert!(validate_target("OAK TREE").is_ok());
        assert_eq!(
            validate_target("lowercase"),
            Err(ValidationError::TargetInvalid)
        );
        assert_eq!(validate_target(""), Err(ValidationError::TargetRequired));
        assert_eq!(
            validate_target(&"A".repeat(51)),
            Err(ValidationError::TargetInvalid)
        );
    }

    #[test]
    fn amount_and_quantity_rules() {
        assert!(validate_amount(None).is_ok());
        assert!(validate_amount(Some(3)).is_ok());
        assert_eq!(
            validate_amount(Some(0)),
            Err(ValidationError::AmountInvalid)
        );
        assert_eq!(validate_quantity(-1), Err(ValidationError::QuantityInvalid));
        assert!(validate_quantity(1).is_ok());
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize_string("  WOOD  ", 50);
        let twice = sanitize_string(&once, 50);
        assert_eq!(once, "WOOD");
        assert_eq!(once, twice);

        let clamped = sanitize_string("ABCDEFG", 3);
        assert_eq!(clamped, "ABC");
        assert_eq!(sanitize_string(&clamped, 3), clamped);
    }
}
