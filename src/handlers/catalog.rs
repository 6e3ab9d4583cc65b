// src/handlers/catalog.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{AddQuestionsRequest, Question},
        test::{AvailableTest, CreateTestRequest, Test},
    },
    utils::jwt::Claims,
};

/// Creates a new test owned by the calling teacher.
///
/// The declared question count must be at least 1; `add_questions` later
/// requires exactly that many questions, so the count is never advisory-only.
pub async fn create_test(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let teacher_id = claims.user_id()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO tests (name, teacher_id, question_count)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(teacher_id)
    .bind(payload.question_count)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create test: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Loads a test and checks the caller owns it. Foreign tests are reported as
/// not found rather than forbidden.
async fn owned_test(pool: &SqlitePool, test_id: i64, teacher_id: i64) -> Result<Test, AppError> {
    let test = sqlx::query_as::<_, Test>(
        "SELECT id, name, teacher_id, question_count, created_at FROM tests WHERE id = ?",
    )
    .bind(test_id)
    .fetch_optional(pool)
    .await?
    .filter(|t| t.teacher_id == teacher_id)
    .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;

    Ok(test)
}

/// Saves a test's full question list in one batch.
///
/// The batch is validated as a whole before anything is written, then inserted
/// in a single transaction: one blank field anywhere means zero rows persist.
/// The batch size must equal the declared question count, and a test's
/// questions can only be saved once.
pub async fn add_questions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(payload): Json<AddQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.user_id()?;
    let test = owned_test(&pool, test_id, teacher_id).await?;

    if payload.questions.is_empty() {
        return Err(AppError::BadRequest(
            "A test needs at least one question".to_string(),
        ));
    }

    if payload.questions.len() as i64 != test.question_count {
        return Err(AppError::BadRequest(format!(
            "Test '{}' declares {} questions but {} were provided",
            test.name,
            test.question_count,
            payload.questions.len()
        )));
    }

    for (i, draft) in payload.questions.iter().enumerate() {
        if let Err(validation_errors) = draft.validate() {
            return Err(AppError::BadRequest(format!(
                "Question {}: {}",
                i + 1,
                validation_errors
            )));
        }
    }

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE test_id = ?")
        .bind(test_id)
        .fetch_one(&pool)
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict(format!(
            "Test '{}' already has its questions",
            test.name
        )));
    }

    // Insertion order defines presentation and scoring order.
    let mut tx = pool.begin().await?;
    for draft in &payload.questions {
        sqlx::query(
            r#"
            INSERT INTO questions (test_id, text, option_a, option_b, option_c, option_d, correct)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(test_id)
        .bind(&draft.text)
        .bind(&draft.option_a)
        .bind(&draft.option_b)
        .bind(&draft.option_c)
        .bind(&draft.option_d)
        .bind(&draft.correct)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert question: {:?}", e);
            AppError::from(e)
        })?;
    }
    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "saved": payload.questions.len() })),
    ))
}

/// Lists a test's questions in presentation order. Teacher authoring view,
/// so the correct options are included.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.user_id()?;
    owned_test(&pool, test_id, teacher_id).await?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, test_id, text, option_a, option_b, option_c, option_d, correct
        FROM questions
        WHERE test_id = ?
        ORDER BY id
        "#,
    )
    .bind(test_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(questions))
}

/// Lists the tests the calling student has not attempted yet.
pub async fn available_tests(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let tests = sqlx::query_as::<_, AvailableTest>(
        r#"
        SELECT id, name, question_count
        FROM tests
        WHERE id NOT IN (
            SELECT test_id FROM attempts WHERE student_id = ?
        )
        ORDER BY id
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list available tests: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(tests))
}
