// src/store/submissions.rs

use sqlx::SqliteExecutor;

use crate::grading::judge::TestVerdict;
use crate::models::submission::{QuestionSubmission, Submission};
use crate::models::view::TestResultView;

pub async fn insert_submission(
    ex: impl SqliteExecutor<'_>,
    user_id: i64,
    quiz_id: i64,
    started_at: chrono::DateTime<chrono::Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO submissions (user_id, quiz_id, started_at, is_completed)
        VALUES (?1, ?2, ?3, 0)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(started_at)
    .fetch_one(ex)
    .await
}

pub async fn fetch_submission(
    ex: impl SqliteExecutor<'_>,
    id: i64,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = ?1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

/// The at-most-one in-progress attempt for this (user, quiz) pair.
pub async fn find_incomplete(
    ex: impl SqliteExecutor<'_>,
    user_id: i64,
    quiz_id: i64,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions WHERE user_id = ?1 AND quiz_id = ?2 AND is_completed = 0 LIMIT 1",
    )
    .bind(user_id)
    .bind(quiz_id)
    .fetch_optional(ex)
    .await
}

pub async fn find_completed(
    ex: impl SqliteExecutor<'_>,
    user_id: i64,
    quiz_id: i64,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions WHERE user_id = ?1 AND quiz_id = ?2 AND is_completed = 1 LIMIT 1",
    )
    .bind(user_id)
    .bind(quiz_id)
    .fetch_optional(ex)
    .await
}

pub async fn list_for_user(
    ex: impl SqliteExecutor<'_>,
    user_id: i64,
) -> Result<Vec<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        "SELECT * FROM submissions WHERE user_id = ?1 ORDER BY started_at DESC",
    )
    .bind(user_id)
    .fetch_all(ex)
    .await
}

/// Marks a submission completed. Score and total_points are written in the
/// same statement so a crash cannot leave one without the other.
pub async fn finalize(
    ex: impl SqliteExecutor<'_>,
    id: i64,
    completed_at: chrono::DateTime<chrono::Utc>,
    score: f64,
    total_points: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE submissions
        SET is_completed = 1, completed_at = ?1, score = ?2, total_points = ?3
        WHERE id = ?4 AND is_completed = 0
        "#,
    )
    .bind(completed_at)
    .bind(score)
    .bind(total_points)
    .bind(id)
    .execute(ex)
    .await?;
    Ok(result.rows_affected())
}

pub async fn fetch_question_submission(
    ex: impl SqliteExecutor<'_>,
    submission_id: i64,
    question_id: i64,
) -> Result<Option<QuestionSubmission>, sqlx::Error> {
    sqlx::query_as::<_, QuestionSubmission>(
        "SELECT * FROM question_submissions WHERE submission_id = ?1 AND question_id = ?2",
    )
    .bind(submission_id)
    .bind(question_id)
    .fetch_optional(ex)
    .await
}

pub async fn list_question_submissions(
    ex: impl SqliteExecutor<'_>,
    submission_id: i64,
) -> Result<Vec<QuestionSubmission>, sqlx::Error> {
    sqlx::query_as::<_, QuestionSubmission>(
        "SELECT * FROM question_submissions WHERE submission_id = ?1",
    )
    .bind(submission_id)
    .fetch_all(ex)
    .await
}

/// Creates or replaces the answer row for (submission, question).
pub async fn upsert_question_submission(
    ex: impl SqliteExecutor<'_>,
    submission_id: i64,
    question_id: i64,
    code: Option<&str>,
    language: Option<&str>,
    submitted_at: chrono::DateTime<chrono::Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO question_submissions (submission_id, question_id, code, language, submitted_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(submission_id, question_id) DO UPDATE SET
            code = excluded.code,
            language = excluded.language,
            submitted_at = excluded.submitted_at
        RETURNING id
        "#,
    )
    .bind(submission_id)
    .bind(question_id)
    .bind(code)
    .bind(language)
    .bind(submitted_at)
    .fetch_one(ex)
    .await
}

pub async fn update_question_score(
    ex: impl SqliteExecutor<'_>,
    question_submission_id: i64,
    score: f64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE question_submissions SET score = ?1 WHERE id = ?2")
        .bind(score)
        .bind(question_submission_id)
        .execute(ex)
        .await?;
    Ok(())
}

/// Re-grading replaces the prior result for the same test case, never
/// duplicating it.
pub async fn upsert_test_result(
    ex: impl SqliteExecutor<'_>,
    question_submission_id: i64,
    test_case_id: i64,
    verdict: &TestVerdict,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO test_results
            (question_submission_id, test_case_id, passed, output, error,
             execution_time, compile_error, runtime_error)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(question_submission_id, test_case_id) DO UPDATE SET
            passed = excluded.passed,
            output = excluded.output,
            error = excluded.error,
            execution_time = excluded.execution_time,
            compile_error = excluded.compile_error,
            runtime_error = excluded.runtime_error
        "#,
    )
    .bind(question_submission_id)
    .bind(test_case_id)
    .bind(verdict.passed)
    .bind(verdict.output.as_deref())
    .bind(verdict.error.as_deref())
    .bind(verdict.execution_time)
    .bind(verdict.compile_error)
    .bind(verdict.runtime_error)
    .execute(ex)
    .await?;
    Ok(())
}

/// Graded results joined to their non-hidden test cases, in case order.
pub async fn list_visible_test_results(
    ex: impl SqliteExecutor<'_>,
    question_submission_id: i64,
) -> Result<Vec<TestResultView>, sqlx::Error> {
    sqlx::query_as::<_, TestResultView>(
        r#"
        SELECT
            r.test_case_id,
            c.input_data,
            c.expected_output,
            r.passed,
            r.output,
            r.error,
            r.execution_time,
            r.compile_error,
            r.runtime_error
        FROM test_results r
        JOIN test_cases c ON c.id = r.test_case_id
        WHERE r.question_submission_id = ?1 AND c.is_hidden = 0
        ORDER BY c.position, c.id
        "#,
    )
    .bind(question_submission_id)
    .fetch_all(ex)
    .await
}

pub async fn delete_selected_options(
    ex: impl SqliteExecutor<'_>,
    question_submission_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM selected_options WHERE question_submission_id = ?1")
        .bind(question_submission_id)
        .execute(ex)
        .await?;
    Ok(())
}

pub async fn insert_selected_option(
    ex: impl SqliteExecutor<'_>,
    question_submission_id: i64,
    option_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO selected_options (question_submission_id, option_id) VALUES (?1, ?2)",
    )
    .bind(question_submission_id)
    .bind(option_id)
    .execute(ex)
    .await?;
    Ok(())
}

pub async fn list_selected_option_ids(
    ex: impl SqliteExecutor<'_>,
    question_submission_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT option_id FROM selected_options WHERE question_submission_id = ?1 ORDER BY option_id",
    )
    .bind(question_submission_id)
    .fetch_all(ex)
    .await
}

/// Earned points across every answered question of a submission.
pub async fn sum_question_scores(
    ex: impl SqliteExecutor<'_>,
    submission_id: i64,
) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT CAST(COALESCE(SUM(score), 0) AS REAL) FROM question_submissions WHERE submission_id = ?1",
    )
    .bind(submission_id)
    .fetch_one(ex)
    .await
}
