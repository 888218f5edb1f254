// src/store/questions.rs

use sqlx::SqliteExecutor;

use crate::models::question::{Question, QuestionOption, QuestionType, TestCase};

#[allow(clippy::too_many_arguments)]
pub async fn insert_question(
    ex: impl SqliteExecutor<'_>,
    quiz_id: i64,
    title: &str,
    description: Option<&str>,
    problem_statement: &str,
    question_type: QuestionType,
    starter_code: Option<&str>,
    language: Option<&str>,
    points: i64,
    position: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO questions
            (quiz_id, title, description, problem_statement, question_type,
             starter_code, language, points, position)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        RETURNING id
        "#,
    )
    .bind(quiz_id)
    .bind(title)
    .bind(description)
    .bind(problem_statement)
    .bind(question_type)
    .bind(starter_code)
    .bind(language)
    .bind(points)
    .bind(position)
    .fetch_one(ex)
    .await
}

/// Next free order index within a quiz.
pub async fn next_position(
    ex: impl SqliteExecutor<'_>,
    quiz_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM questions WHERE quiz_id = ?1",
    )
    .bind(quiz_id)
    .fetch_one(ex)
    .await
}

pub async fn fetch_question(
    ex: impl SqliteExecutor<'_>,
    id: i64,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = ?1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn list_questions(
    ex: impl SqliteExecutor<'_>,
    quiz_id: i64,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(
        "SELECT * FROM questions WHERE quiz_id = ?1 ORDER BY position, id",
    )
    .bind(quiz_id)
    .fetch_all(ex)
    .await
}

pub async fn delete_question(ex: impl SqliteExecutor<'_>, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?1")
        .bind(id)
        .execute(ex)
        .await?;
    Ok(result.rows_affected())
}

/// Sum of points over all questions currently belonging to the quiz.
/// Evaluated at finalize time, so later point edits move the denominator.
pub async fn quiz_total_points(
    ex: impl SqliteExecutor<'_>,
    quiz_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(points), 0) FROM questions WHERE quiz_id = ?1",
    )
    .bind(quiz_id)
    .fetch_one(ex)
    .await
}

pub async fn insert_option(
    ex: impl SqliteExecutor<'_>,
    question_id: i64,
    text: &str,
    is_correct: bool,
    position: i64,
    image_path: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO question_options (question_id, text, is_correct, position, image_path)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(question_id)
    .bind(text)
    .bind(is_correct)
    .bind(position)
    .bind(image_path)
    .fetch_one(ex)
    .await
}

pub async fn list_options(
    ex: impl SqliteExecutor<'_>,
    question_id: i64,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(
        "SELECT * FROM question_options WHERE question_id = ?1 ORDER BY position, id",
    )
    .bind(question_id)
    .fetch_all(ex)
    .await
}

pub async fn insert_test_case(
    ex: impl SqliteExecutor<'_>,
    question_id: i64,
    input_data: Option<&str>,
    expected_output: &str,
    is_hidden: bool,
    position: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO test_cases (question_id, input_data, expected_output, is_hidden, position)
        VALUES (?1, ?2, ?3, ?4, ?5)
        RETURNING id
        "#,
    )
    .bind(question_id)
    .bind(input_data)
    .bind(expected_output)
    .bind(is_hidden)
    .bind(position)
    .fetch_one(ex)
    .await
}

pub async fn list_test_cases(
    ex: impl SqliteExecutor<'_>,
    question_id: i64,
) -> Result<Vec<TestCase>, sqlx::Error> {
    sqlx::query_as::<_, TestCase>(
        "SELECT * FROM test_cases WHERE question_id = ?1 ORDER BY position, id",
    )
    .bind(question_id)
    .fetch_all(ex)
    .await
}

pub async fn delete_test_case(ex: impl SqliteExecutor<'_>, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM test_cases WHERE id = ?1")
        .bind(id)
        .execute(ex)
        .await?;
    Ok(result.rows_affected())
}
