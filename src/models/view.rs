// src/models/view.rs
//
// DTOs returned by the progression engine. These are what a front end
// renders; correctness flags and hidden test cases never appear here.

use serde::Serialize;

use crate::models::question::{Question, QuestionOption};
use crate::models::submission::Submission;

/// Outcome of `start_quiz`. Starting twice never creates two submissions.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartQuiz {
    /// A fresh submission was created.
    Started { submission_id: i64 },
    /// An in-progress submission already existed and was resumed.
    Resumed { submission_id: i64 },
    /// The student already completed this quiz; navigate to its results.
    AlreadyCompleted { submission_id: i64 },
}

/// One row of the question navigation strip.
#[derive(Debug, Serialize)]
pub struct QuestionSummary {
    pub id: i64,
    pub title: String,
    pub points: i64,
    pub position: i64,
    pub answered: bool,
}

/// A question option as shown to a student (no correctness flag).
#[derive(Debug, Serialize)]
pub struct OptionView {
    pub id: i64,
    pub text: String,
    pub position: i64,
    pub image_path: Option<String>,
}

impl From<QuestionOption> for OptionView {
    fn from(opt: QuestionOption) -> Self {
        Self {
            id: opt.id,
            text: opt.text,
            position: opt.position,
            image_path: opt.image_path,
        }
    }
}

/// A graded test result for a non-hidden test case.
/// Materialized directly from the test_results/test_cases join.
#[derive(Debug, Serialize, sqlx::prelude::FromRow)]
pub struct TestResultView {
    pub test_case_id: i64,
    pub input_data: Option<String>,
    pub expected_output: String,
    pub passed: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub execution_time: f64,
    pub compile_error: bool,
    pub runtime_error: bool,
}

/// The answer previously saved for the current question, returned verbatim.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriorAnswer {
    Code {
        code: Option<String>,
        language: Option<String>,
    },
    Choice {
        selected_option_ids: Vec<i64>,
    },
}

/// Everything a front end needs to render the current question.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub submission_id: i64,
    pub time_remaining_seconds: i64,
    pub formatted_time: String,
    pub questions: Vec<QuestionSummary>,
    pub current: Question,
    pub options: Vec<OptionView>,
    pub prior_answer: Option<PriorAnswer>,
    pub test_results: Vec<TestResultView>,
}

/// Outcome of accessing an in-progress quiz: either the current question, or
/// the submission was (or just got) finalized.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TakeQuiz {
    InProgress(QuestionView),
    Completed {
        submission: Submission,
        /// True when this access tripped the time limit and auto-submitted.
        auto_submitted: bool,
    },
}

/// Outcome of saving an answer.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Saved {
        question_id: i64,
        question_score: f64,
        all_answered: bool,
        /// First unanswered question over the full ordered list, if any.
        next_question_id: Option<i64>,
    },
    /// The time limit elapsed before the answer arrived; the submission was
    /// auto-finalized and the answer discarded.
    TimedOut { submission: Submission },
}

/// Per-question block of the results view.
#[derive(Debug, Serialize)]
pub struct QuestionResult {
    pub question: Question,
    pub score: Option<f64>,
    pub answered: bool,
    pub prior_answer: Option<PriorAnswer>,
    pub test_results: Vec<TestResultView>,
    pub options: Vec<OptionView>,
}

/// Full review of a (usually completed) submission.
#[derive(Debug, Serialize)]
pub struct ResultsView {
    pub submission: Submission,
    pub quiz_title: String,
    pub questions: Vec<QuestionResult>,
}

/// Remaining wall-clock time for an attempt.
#[derive(Debug, Serialize)]
pub struct RemainingTime {
    pub seconds: i64,
    pub formatted: String,
}
