// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Unique login.
    pub login: String,

    /// Hex-encoded SHA-256 of (password + salt).
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    /// Hex-encoded 16-byte random salt, generated at registration.
    #[serde(skip)]
    pub salt: String,

    /// User role: 'teacher' or 'student'.
    pub role: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be blank."))]
    pub name: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Login length must be between 3 and 50 characters."
    ))]
    pub login: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    #[validate(custom(function = validate_role))]
    pub role: String,
}

/// DTO for a teacher adding a student account (role is implied).
#[derive(Debug, Deserialize, Validate)]
pub struct AddStudentRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be blank."))]
    pub name: String,
    #[validate(length(min = 3, max = 50))]
    pub login: String,
    #[validate(length(min = 4, max = 128))]
    pub password: String,
}

/// DTO for login. Role is part of the lookup key.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub login: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[validate(custom(function = validate_role))]
    pub role: String,
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    match role {
        "teacher" | "student" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_role")),
    }
}
