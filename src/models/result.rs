// src/models/result.rs

use serde::Serialize;
use sqlx::FromRow;

/// Projection row for the teacher and student result views.
/// Joined from `results` and `tests`.
#[derive(Debug, Serialize, FromRow)]
pub struct ResultRow {
    pub test_name: String,
    pub correct_count: i64,
    pub percentage: f64,
    pub passed: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row shape for the CSV export: the teacher view joined with the student's
/// display name and the test's declared question count.
#[derive(Debug, FromRow)]
pub struct ExportRow {
    pub student_name: String,
    pub test_name: String,
    pub correct_count: i64,
    pub question_count: i64,
    pub percentage: f64,
    pub passed: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
