// src/handlers/exam.rs
//
// HTTP adapter around the exam session state machine, plus the attempt
// tracker. The state machine itself lives in `crate::session` and knows
// nothing about axum or sqlx.

use axum::{Json, extract::{Extension, State}, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::question::Question,
    session::{Choice, ExamSession, LoadedQuestion, Score, Step},
    state::SessionMap,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct StartExamRequest {
    pub test_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// The selected option label. There is no skip: absent or unrecognized
    /// values are rejected.
    pub choice: Option<String>,
}

/// Returns true if the student has already consumed their attempt.
async fn has_attempted(pool: &SqlitePool, student_id: i64, test_id: i64) -> Result<bool, AppError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM attempts WHERE student_id = ? AND test_id = ?")
            .bind(student_id)
            .bind(test_id)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

/// Starts an exam session for the calling student.
///
/// Fails if the test does not exist, the student has already attempted it, or
/// the test has no questions. The full question list is loaded here once; the
/// session never re-queries it. Starting a new exam discards any unfinished
/// session the student had (nothing of it was persisted).
pub async fn start_exam(
    State(pool): State<SqlitePool>,
    State(sessions): State<SessionMap>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;
    let test_id = payload.test_id;

    if has_attempted(&pool, student_id, test_id).await? {
        return Err(AppError::Conflict("Test already attempted".to_string()));
    }

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tests WHERE id = ?")
        .bind(test_id)
        .fetch_one(&pool)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Test not found".to_string()));
    }

    let rows = sqlx::query_as::<_, Question>(
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
        tracing::error!("Failed to load questions for test {}: {:?}", test_id, e);
        AppError::from(e)
    })?;

    let questions = rows
        .into_iter()
        .map(|q| {
            let correct = Choice::parse(&q.correct).ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "question {} has invalid correct option '{}'",
                    q.id, q.correct
                ))
            })?;
            Ok(LoadedQuestion {
                text: q.text,
                options: [q.option_a, q.option_b, q.option_c, q.option_d],
                correct,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let session = ExamSession::new(student_id, test_id, questions)?;
    let first = session.current_question();

    sessions.lock().await.insert(student_id, session);

    tracing::info!("Student {} started test {}", student_id, test_id);

    Ok(Json(json!({
        "status": "in_progress",
        "question": first
    })))
}

/// Submits an answer for the current question of the student's live session.
///
/// Returns the next question, or the final score once the last question is
/// answered. Completion commits the result row and the attempt record in one
/// transaction; if that commit fails, nothing is persisted and the student may
/// start the test again.
pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    State(sessions): State<SessionMap>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims.user_id()?;

    let choice = payload
        .choice
        .as_deref()
        .and_then(Choice::parse)
        .ok_or_else(|| AppError::BadRequest("No answer selected".to_string()))?;

    let mut sessions = sessions.lock().await;
    let session = sessions
        .get_mut(&student_id)
        .ok_or_else(|| AppError::NotFound("No active exam session".to_string()))?;

    match session.submit_answer(choice)? {
        Step::Next(view) => Ok(Json(json!({
            "status": "in_progress",
            "question": view
        }))),
        Step::Finished(score) => {
            let test_id = session.test_id();
            // The session is one-shot: drop it before committing. On commit
            // failure no attempt row exists, so the student can start over.
            sessions.remove(&student_id);
            drop(sessions);

            commit_result(&pool, student_id, test_id, &score).await?;

            tracing::info!(
                "Student {} completed test {}: {}/{} ({:.1}%)",
                student_id,
                test_id,
                score.correct_count,
                score.total_questions,
                score.percentage
            );

            Ok(Json(json!({
                "status": "completed",
                "correct_count": score.correct_count,
                "total_questions": score.total_questions,
                "percentage": score.percentage,
                "passed": score.passed
            })))
        }
    }
}

/// Writes the result row and the attempt record as a single transaction.
/// Attempt uniqueness is enforced by the table's primary key, so two racing
/// completions of the same (student, test) pair cannot both commit.
async fn commit_result(
    pool: &SqlitePool,
    student_id: i64,
    test_id: i64,
    score: &Score,
) -> Result<(), AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::CommitFailure(e.to_string()))?;

    sqlx::query("INSERT INTO attempts (student_id, test_id) VALUES (?, ?)")
        .bind(student_id)
        .bind(test_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                AppError::Conflict("Test already attempted".to_string())
            } else {
                AppError::CommitFailure(e.to_string())
            }
        })?;

    sqlx::query(
        r#"
        INSERT INTO results (student_id, test_id, correct_count, percentage, passed)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(student_id)
    .bind(test_id)
    .bind(score.correct_count as i64)
    .bind(score.percentage)
    .bind(score.passed)
    .execute(&mut *tx)
    .await
    .map_err(|e| AppError::CommitFailure(e.to_string()))?;

    tx.commit()
        .await
        .map_err(|e| AppError::CommitFailure(e.to_string()))
}
