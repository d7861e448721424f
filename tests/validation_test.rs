// Input validation contract: one sentinel per violation, pure and
// repeatable.

use idler_server::utils::validation::*;

#[test]
fn validators_are_pure() {
    // Repeat calls must produce identical results
    for _ in 0..3 {
        assert!(validate_email("a@b.c").is_ok());
        assert_eq!(validate_email("nope"), Err(ValidationError::EmailInvalid));
        assert!(validate_password("StrongPass1").is_ok());
        assert!(validate_character_name("hero").is_ok());
        assert!(validate_target("TREE").is_ok());
    }
}

#[test]
fn signup_field_rules() {
    assert_eq!(validate_email(""), Err(ValidationError::EmailRequired));
    assert_eq!(
        validate_email("missing-at.example.com"),
        Err(ValidationError::EmailInvalid)
    );

    assert_eq!(
        validate_password("short1A"),
        Err(ValidationError::PasswordTooShort)
    );
    assert_eq!(
        validate_password("nouppercase1"),
        Err(ValidationError::PasswordWeak)
    );
    assert_eq!(
        validate_password("NOLOWERCASE1"),
        Err(ValidationError::PasswordWeak)
    );

    assert_eq!(validate_surname(""), Err(ValidationError::SurnameRequired));
    assert_eq!(
        validate_surname("x"),
        Err(ValidationError::SurnameTooShort)
    );
    assert_eq!(
        validate_surname("has space"),
        Err(ValidationError::SurnameInvalid)
    );
    assert!(validate_surname("alice_01").is_ok());
}

#[test]
fn game_field_rules() {
    // Targets are uppercase with spaces, or the IDLE sentinel
    assert!(validate_target("IDLE").is_ok());
    assert!(validate_target("COPPER VEIN 2").is_ok());
    assert_eq!(validate_target("tree"), Err(ValidationError::TargetInvalid));
    assert_eq!(validate_target(""), Err(ValidationError::TargetRequired));

    assert!(validate_item_name("WOOD").is_ok());
    assert_eq!(
        validate_item_name("wood"),
        Err(ValidationError::ItemNameInvalid)
    );
    assert_eq!(
        validate_item_name(""),
        Err(ValidationError::ItemNameRequired)
    );

    assert!(validate_amount(None).is_ok());
    assert_eq!(
        validate_amount(Some(-5)),
        Err(ValidationError::AmountInvalid)
    );
    assert_eq!(validate_quantity(0), Err(ValidationError::QuantityInvalid));
}

#[test]
fn sanitize_string_is_idempotent_and_bounded() {
    let cases = [
        ("  TREE  ", 50, "TREE"),
        ("ABCDEFGHIJ", 4, "ABCD"),
        ("", 10, ""),
        ("  spaced out  ", 6, "spaced"),
    ];

    for (input, max, expected) in cases {
        let once = sanitize_string(input, max);
        assert_eq!(once, expected);
        assert_eq!(sanitize_string(&once, max), once);
        assert!(once.chars().count() <= max);
    }
}
