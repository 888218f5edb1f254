// src/handlers/quiz.rs
//
// Student-facing handlers. Thin: parse, validate, delegate to the engine.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    engine::QuizEngine,
    error::AppError,
    models::submission::{ChoiceAnswerRequest, CodeAnswerRequest, RunCodeRequest},
    store,
    utils::auth::CurrentUser,
};

/// Lists quizzes currently open for taking.
pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = store::quizzes::list_active_quizzes(&pool).await?;
    Ok(Json(quizzes))
}

/// The caller's own attempts, newest first.
pub async fn my_submissions(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let submissions = store::submissions::list_for_user(&pool, user.id).await?;
    Ok(Json(submissions))
}

/// Starts (or resumes) an attempt at a quiz.
pub async fn start_quiz(
    State(engine): State<QuizEngine>,
    user: CurrentUser,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = engine.start_quiz(user.id, quiz_id).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct TakeQuizParams {
    pub question_id: Option<i64>,
}

/// The current-question view for an in-progress attempt.
pub async fn take_quiz(
    State(engine): State<QuizEngine>,
    user: CurrentUser,
    Path((quiz_id, submission_id)): Path<(i64, i64)>,
    Query(params): Query<TakeQuizParams>,
) -> Result<impl IntoResponse, AppError> {
    let view = engine
        .question_view(user.id, quiz_id, submission_id, params.question_id)
        .await?;
    Ok(Json(view))
}

/// Saves and grades a code answer.
pub async fn submit_code_answer(
    State(engine): State<QuizEngine>,
    user: CurrentUser,
    Path((submission_id, question_id)): Path<(i64, i64)>,
    Json(payload): Json<CodeAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let outcome = engine
        .submit_code_answer(
            user.id,
            submission_id,
            question_id,
            &payload.code,
            &payload.language,
        )
        .await?;
    Ok(Json(outcome))
}

/// Saves a multiple-choice or true/false answer.
pub async fn submit_choice_answer(
    State(engine): State<QuizEngine>,
    user: CurrentUser,
    Path((submission_id, question_id)): Path<(i64, i64)>,
    Json(payload): Json<ChoiceAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = engine
        .submit_choice_answer(user.id, submission_id, question_id, &payload)
        .await?;
    Ok(Json(outcome))
}

/// Explicit submit of the whole attempt.
pub async fn submit_quiz(
    State(engine): State<QuizEngine>,
    user: CurrentUser,
    Path(submission_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let submission = engine.finalize_submission(user.id, submission_id).await?;
    Ok(Json(submission))
}

/// Per-question review of an attempt.
pub async fn submission_results(
    State(engine): State<QuizEngine>,
    user: CurrentUser,
    Path(submission_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let results = engine.submission_results(user.id, submission_id).await?;
    Ok(Json(results))
}

/// Countdown endpoint polled by the front end.
pub async fn time_remaining(
    State(engine): State<QuizEngine>,
    user: CurrentUser,
    Path(submission_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let remaining = engine.remaining_time(user.id, submission_id).await?;
    Ok(Json(remaining))
}

/// Ad-hoc "run" button: executes code without touching any grading state.
/// Execution failures come back as `success: false` payloads, not HTTP
/// errors, so the editor can display them inline.
pub async fn run_code(
    State(engine): State<QuizEngine>,
    _user: CurrentUser,
    Json(payload): Json<RunCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let stdin = payload.stdin.as_deref().unwrap_or("");
    let body = match engine.run_code(&payload.language, &payload.code, stdin).await {
        Ok(outcome) => serde_json::json!({
            "success": true,
            "stdout": outcome.run_stdout,
            "stderr": outcome.run_stderr,
            "exit_code": outcome.exit_code,
            "compile_stderr": outcome.compile_stderr,
            "execution_time": outcome.duration_seconds,
        }),
        Err(err) => serde_json::json!({
            "success": false,
            "error": err.to_string(),
        }),
    };
    Ok(Json(body))
}

/// Languages the execution service will accept.
pub async fn supported_languages(
    State(engine): State<QuizEngine>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(engine.executor().supported_languages()))
}
