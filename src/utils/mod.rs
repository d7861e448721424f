// Utility modules for the idler backend

pub mod errors;
pub mod password;
pub mod validation;

pub use errors::{ApiError, ApiJson};
pub use password::{hash_password, verify_password, PasswordError};
pub use validation::{
    sanitize_string, validate_amount, validate_character_name, validate_email, validate_item_name,
    validate_password, validate_quantity, validate_surname, validate_target, ValidationError,
};
