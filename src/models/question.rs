// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Question discriminant.
/// Stored as TEXT in the database ('code', 'multiple_choice', 'true_false').
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Code,
    MultipleChoice,
    TrueFalse,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: i64,

    pub title: String,

    pub description: Option<String>,

    pub problem_statement: String,

    pub question_type: QuestionType,

    /// Pre-filled editor content for code questions.
    pub starter_code: Option<String>,

    /// Target language key for code questions (e.g., "python").
    pub language: Option<String>,

    pub points: i64,

    /// Order index, unique within the owning quiz.
    pub position: i64,
}

/// Represents the 'question_options' table.
/// Choice-type questions own an ordered list of these; true/false questions
/// own exactly two ("True"/"False") with one marked correct.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
    pub position: i64,
    pub image_path: Option<String>,
}

/// Represents the 'test_cases' table for code questions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    pub question_id: i64,
    pub input_data: Option<String>,
    pub expected_output: String,
    /// Hidden test cases still grade but are not shown to students.
    pub is_hidden: bool,
    pub position: i64,
}

/// DTO for one option when authoring a choice-type question.
#[derive(Debug, Deserialize, Validate)]
pub struct OptionInput {
    #[validate(length(min = 1, max = 500))]
    pub text: String,
    pub is_correct: bool,
    #[validate(length(max = 500))]
    pub image_path: Option<String>,
}

/// DTO for creating a new question.
/// Options are required for multiple-choice questions and rejected for code
/// questions; true/false questions take `correct_answer` instead.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub problem_statement: String,
    pub question_type: QuestionType,
    #[validate(length(max = 50000))]
    pub starter_code: Option<String>,
    #[validate(length(max = 20))]
    pub language: Option<String>,
    #[validate(range(min = 0, max = 1000))]
    pub points: Option<i64>,
    pub position: Option<i64>,
    #[validate(nested)]
    pub options: Option<Vec<OptionInput>>,
    /// For true/false questions: the correct answer.
    pub correct_answer: Option<bool>,
}

/// DTO for creating a test case on a code question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTestCaseRequest {
    #[validate(length(max = 20000))]
    pub input_data: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub expected_output: String,
    pub is_hidden: Option<bool>,
    pub position: Option<i64>,
}
