// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{AddStudentRequest, LoginRequest, RegisterRequest, User},
    utils::{
        hash::{generate_salt, hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Inserts a new user with a fresh salt. A login collision on the unique
/// column maps to 409, everything else to 500.
pub async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    login: &str,
    password: &str,
    role: &str,
) -> Result<i64, AppError> {
    let salt = generate_salt();
    let password_hash = hash_password(password, &salt);

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (name, login, password_hash, salt, role)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(login)
    .bind(&password_hash)
    .bind(&salt)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            AppError::Conflict(format!("Login '{}' already exists", login))
        } else {
            tracing::error!("Failed to insert user: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok(id)
}

/// Registers a new user (teacher or student).
///
/// Stores a per-user random salt and SHA-256(password + salt).
/// Returns 201 Created with the new user id.
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = insert_user(
        &pool,
        &payload.name,
        &payload.login,
        &payload.password,
        &payload.role,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Adds a student account. Teacher only; role is fixed server-side.
pub async fn add_student(
    State(pool): State<SqlitePool>,
    Json(payload): Json<AddStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = insert_user(
        &pool,
        &payload.name,
        &payload.login,
        &payload.password,
        "student",
    )
    .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Authenticates a user and returns a JWT token.
///
/// Role is part of the lookup key. Unknown login and wrong password surface
/// as the same generic message; the distinction lives only in server logs.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, name, login, password_hash, salt, role, created_at
        FROM users
        WHERE login = ? AND role = ?
        "#,
    )
    .bind(&payload.login)
    .bind(&payload.role)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = match user {
        Some(user) => user,
        None => {
            tracing::debug!("Login failed: unknown login '{}'", payload.login);
            return Err(AppError::AuthError("authentication failed".to_string()));
        }
    };

    if !verify_password(&payload.password, &user.salt, &user.password_hash) {
        tracing::debug!("Login failed: bad password for '{}'", payload.login);
        return Err(AppError::AuthError("authentication failed".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "id": user.id,
        "name": user.name,
        "role": user.role
    })))
}
