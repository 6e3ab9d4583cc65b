// src/session.rs
//
// The exam session state machine. Pure in-memory logic: questions are loaded
// once at start and the machine hands back the next question to display (or the
// final score) as a return value. Persistence and HTTP live in the handlers.

use serde::Serialize;

use crate::config::PASS_THRESHOLD;
use crate::error::AppError;

/// One of the four answer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
}

impl Choice {
    /// Parses a submitted option label. Strict: exactly "A".."D".
    pub fn parse(s: &str) -> Option<Choice> {
        match s {
            "A" => Some(Choice::A),
            "B" => Some(Choice::B),
            "C" => Some(Choice::C),
            "D" => Some(Choice::D),
            _ => None,
        }
    }

}

/// A question as loaded from the catalog at session start.
#[derive(Debug, Clone)]
pub struct LoadedQuestion {
    pub text: String,
    pub options: [String; 4],
    pub correct: Choice,
}

/// What the caller should display next: question number (1-based), total
/// question count, the question text and its four options. Never includes the
/// correct answer.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub options: [String; 4],
}

/// Final outcome of a completed session.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Score {
    pub correct_count: usize,
    pub total_questions: usize,
    pub percentage: f64,
    pub passed: bool,
}

/// Result of a successful answer submission.
#[derive(Debug)]
pub enum Step {
    /// More questions remain; display this one next.
    Next(QuestionView),
    /// That was the last question; the session is now completed.
    Finished(Score),
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The test has no questions; a session cannot start.
    EmptyTest,
    /// The session already completed; no further answers are accepted.
    SessionClosed,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::EmptyTest => write!(f, "test has no questions"),
            SessionError::SessionClosed => write!(f, "exam session already completed"),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::EmptyTest => AppError::BadRequest(err.to_string()),
            SessionError::SessionClosed => AppError::Conflict(err.to_string()),
        }
    }
}

/// A single student's pass through a single test: strictly sequential, one
/// answer per question, completed exactly once. One-shot: a finished session is
/// discarded, never restarted.
#[derive(Debug)]
pub struct ExamSession {
    student_id: i64,
    test_id: i64,
    questions: Vec<LoadedQuestion>,
    answers: Vec<Choice>,
    completed: bool,
}

impl ExamSession {
    /// Starts a session over the test's questions in presentation order.
    /// Rejects empty tests; every later index into `questions` is in bounds.
    pub fn new(
        student_id: i64,
        test_id: i64,
        questions: Vec<LoadedQuestion>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyTest);
        }
        Ok(Self {
            student_id,
            test_id,
            questions,
            answers: Vec::new(),
            completed: false,
        })
    }

    pub fn student_id(&self) -> i64 {
        self.student_id
    }

    pub fn test_id(&self) -> i64 {
        self.test_id
    }

    /// The question the student should answer next.
    pub fn current_question(&self) -> QuestionView {
        self.view(self.answers.len())
    }

    fn view(&self, index: usize) -> QuestionView {
        let q = &self.questions[index];
        QuestionView {
            number: index + 1,
            total: self.questions.len(),
            text: q.text.clone(),
            options: q.options.clone(),
        }
    }

    /// Records an answer for the current question and advances. Returns the
    /// next question to display, or the final score once the last question has
    /// been answered.
    pub fn submit_answer(&mut self, choice: Choice) -> Result<Step, SessionError> {
        if self.completed {
            return Err(SessionError::SessionClosed);
        }

        self.answers.push(choice);

        if self.answers.len() == self.questions.len() {
            self.completed = true;
            Ok(Step::Finished(self.score()))
        } else {
            Ok(Step::Next(self.view(self.answers.len())))
        }
    }

    fn score(&self) -> Score {
        let total = self.questions.len();
        let correct_count = self
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| q.correct == **a)
            .count();

        let percentage = (correct_count as f64 / total as f64) * 100.0;

        Score {
            correct_count,
            total_questions: total,
            percentage,
            passed: percentage >= PASS_THRESHOLD,
        }
    }
}
