// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
/// Presentation and scoring order is insertion order (ascending id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub test_id: i64,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,

    /// The correct option: 'A', 'B', 'C' or 'D'.
    pub correct: String,
}

/// One question in an authoring batch. Validated before anything is written.
#[derive(Debug, Deserialize, Validate)]
pub struct QuestionDraft {
    #[validate(length(min = 1, max = 1000, message = "Question text must not be blank."))]
    pub text: String,
    #[validate(length(min = 1, max = 500, message = "Option A must not be blank."))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500, message = "Option B must not be blank."))]
    pub option_b: String,
    #[validate(length(min = 1, max = 500, message = "Option C must not be blank."))]
    pub option_c: String,
    #[validate(length(min = 1, max = 500, message = "Option D must not be blank."))]
    pub option_d: String,
    #[validate(custom(function = validate_correct))]
    pub correct: String,
}

/// DTO for saving a test's full question list in one batch.
#[derive(Debug, Deserialize)]
pub struct AddQuestionsRequest {
    pub questions: Vec<QuestionDraft>,
}

fn validate_correct(correct: &str) -> Result<(), validator::ValidationError> {
    match correct {
        "A" | "B" | "C" | "D" => Ok(()),
        _ => Err(validator::ValidationError::new("correct_must_be_a_to_d")),
    }
}
