// src/handlers/results.rs

use axum::{
    Json,
    extract::{Extension, State},
    http::header,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{error::AppError, models::result::{ExportRow, ResultRow}, utils::jwt::Claims};

/// Results on all tests owned by the calling teacher, oldest first.
pub async fn teacher_results(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.user_id()?;

    let rows = sqlx::query_as::<_, ResultRow>(
        r#"
        SELECT t.name AS test_name, r.correct_count, r.percentage, r.passed, r.created_at
        FROM results r
        JOIN tests t ON r.test_id = t.id
        WHERE t.teacher_id = ?
        ORDER BY r.created_at, r.id
        "#,
    )
    .bind(teacher_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch teacher results: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(rows))
}

/// The calling student's own results, oldest first.
pub async fn student_results(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let rows = sqlx::query_as::<_, ResultRow>(
        r#"
        SELECT t.name AS test_name, r.correct_count, r.percentage, r.passed, r.created_at
        FROM results r
        JOIN tests t ON r.test_id = t.id
        WHERE r.student_id = ?
        ORDER BY r.created_at, r.id
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch student results: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(rows))
}

/// Exports the teacher's result view as a CSV attachment:
/// Student, Test, CorrectCount, QuestionCount, Percentage, PassFail, Timestamp.
pub async fn export_results(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = claims.user_id()?;

    let rows = sqlx::query_as::<_, ExportRow>(
        r#"
        SELECT
            u.name AS student_name,
            t.name AS test_name,
            r.correct_count,
            t.question_count,
            r.percentage,
            r.passed,
            r.created_at
        FROM results r
        JOIN users u ON r.student_id = u.id
        JOIN tests t ON r.test_id = t.id
        WHERE t.teacher_id = ?
        ORDER BY r.created_at, r.id
        "#,
    )
    .bind(teacher_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch export rows: {:?}", e);
        AppError::from(e)
    })?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Student",
        "Test",
        "CorrectCount",
        "QuestionCount",
        "Percentage",
        "PassFail",
        "Timestamp",
    ])?;

    for row in &rows {
        let timestamp = row
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        writer.write_record([
            row.student_name.as_str(),
            row.test_name.as_str(),
            &row.correct_count.to_string(),
            &row.question_count.to_string(),
            &format!("{:.1}", row.percentage),
            if row.passed { "passed" } else { "failed" },
            &timestamp,
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    let body = String::from_utf8(bytes)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"results.csv\"",
            ),
        ],
        body,
    ))
}
