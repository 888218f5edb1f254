// src/store/quizzes.rs

use sqlx::SqliteExecutor;

use crate::models::quiz::Quiz;

pub async fn insert_quiz(
    ex: impl SqliteExecutor<'_>,
    title: &str,
    description: Option<&str>,
    time_limit: i64,
    is_active: bool,
    author_id: i64,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO quizzes (title, description, time_limit, is_active, author_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(time_limit)
    .bind(is_active)
    .bind(author_id)
    .bind(now)
    .fetch_one(ex)
    .await
}

pub async fn fetch_quiz(
    ex: impl SqliteExecutor<'_>,
    id: i64,
) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?1")
        .bind(id)
        .fetch_optional(ex)
        .await
}

pub async fn list_quizzes(ex: impl SqliteExecutor<'_>) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes ORDER BY id DESC")
        .fetch_all(ex)
        .await
}

pub async fn list_active_quizzes(ex: impl SqliteExecutor<'_>) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE is_active = 1 ORDER BY id DESC")
        .fetch_all(ex)
        .await
}

/// Partial update; absent fields keep their current values.
pub async fn update_quiz(
    ex: impl SqliteExecutor<'_>,
    id: i64,
    title: Option<&str>,
    description: Option<&str>,
    time_limit: Option<i64>,
    is_active: Option<bool>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE quizzes SET
            title = COALESCE(?1, title),
            description = COALESCE(?2, description),
            time_limit = COALESCE(?3, time_limit),
            is_active = COALESCE(?4, is_active),
            updated_at = ?5
        WHERE id = ?6
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(time_limit)
    .bind(is_active)
    .bind(now)
    .bind(id)
    .execute(ex)
    .await?;
    Ok(result.rows_affected())
}

/// Cascades to questions, options, test cases and historical submissions.
pub async fn delete_quiz(ex: impl SqliteExecutor<'_>, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = ?1")
        .bind(id)
        .execute(ex)
        .await?;
    Ok(result.rows_affected())
}
