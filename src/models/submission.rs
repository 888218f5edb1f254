// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'submissions' table: one student's timed attempt at a quiz.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub is_completed: bool,
    /// Aggregate score; written together with `total_points` at finalize.
    pub score: Option<f64>,
    pub total_points: Option<i64>,
}

/// Represents the 'question_submissions' table: one answer to one question
/// within a submission. Created lazily on first answer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionSubmission {
    pub id: i64,
    pub submission_id: i64,
    pub question_id: i64,
    pub code: Option<String>,
    pub language: Option<String>,
    pub score: f64,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'test_results' table: the outcome of running submitted code
/// against one test case. Upserted per (question_submission, test_case).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestResult {
    pub id: i64,
    pub question_submission_id: i64,
    pub test_case_id: i64,
    pub passed: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub execution_time: f64,
    pub compile_error: bool,
    pub runtime_error: bool,
}

/// DTO for submitting a code answer.
#[derive(Debug, Deserialize, Validate)]
pub struct CodeAnswerRequest {
    #[validate(length(min = 1, max = 50000))]
    pub code: String,
    #[validate(length(min = 1, max = 20))]
    pub language: String,
}

/// DTO for submitting a choice answer. Exactly one of the two fields is
/// expected: `selected_option_ids` for multiple-choice questions, `answer`
/// for true/false questions.
#[derive(Debug, Deserialize)]
pub struct ChoiceAnswerRequest {
    pub selected_option_ids: Option<Vec<i64>>,
    pub answer: Option<bool>,
}

/// DTO for the ad-hoc run-code endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct RunCodeRequest {
    #[validate(length(min = 1, max = 50000))]
    pub code: String,
    #[validate(length(min = 1, max = 20))]
    pub language: String,
    pub stdin: Option<String>,
}
