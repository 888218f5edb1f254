// src/handlers/admin.rs
//
// Authoring endpoints: enough JSON CRUD to build every question type and to
// exercise the store's cascade deletes. The authoring UI itself is a
// separate front end.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::question::{CreateQuestionRequest, CreateTestCaseRequest, QuestionType},
    models::quiz::{CreateQuizRequest, UpdateQuizRequest},
    store,
    utils::auth::AdminUser,
};

pub async fn list_quizzes(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = store::quizzes::list_quizzes(&pool).await?;
    Ok(Json(quizzes))
}

pub async fn create_quiz(
    State(pool): State<SqlitePool>,
    admin: AdminUser,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = store::quizzes::insert_quiz(
        &pool,
        &payload.title,
        payload.description.as_deref(),
        payload.time_limit.unwrap_or(30),
        payload.is_active.unwrap_or(true),
        admin.id,
        Utc::now(),
    )
    .await?;

    tracing::info!(quiz_id = id, author_id = admin.id, "quiz created");
    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn update_quiz(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let affected = store::quizzes::update_quiz(
        &pool,
        id,
        payload.title.as_deref(),
        payload.description.as_deref(),
        payload.time_limit,
        payload.is_active,
        Utc::now(),
    )
    .await?;
    if affected == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let quiz = store::quizzes::fetch_quiz(&pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;
    Ok(Json(quiz))
}

/// Deletes a quiz and, through the cascade, its questions, options, test
/// cases and all historical submissions.
pub async fn delete_quiz(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let affected = store::quizzes::delete_quiz(&pool, id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    Ok(Json(serde_json::json!({"deleted": id})))
}

pub async fn create_question(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    store::quizzes::fetch_quiz(&pool, quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    // Per-type shape checks before anything is written.
    match payload.question_type {
        QuestionType::Code => {
            if payload.language.is_none() {
                return Err(AppError::BadRequest(
                    "Code questions require a language".to_string(),
                ));
            }
            if payload.options.is_some() {
                return Err(AppError::BadRequest(
                    "Code questions do not take options".to_string(),
                ));
            }
        }
        QuestionType::MultipleChoice => {
            let options = payload.options.as_deref().unwrap_or_default();
            if options.len() < 2 {
                return Err(AppError::BadRequest(
                    "Multiple-choice questions need at least two options".to_string(),
                ));
            }
            if !options.iter().any(|o| o.is_correct) {
                return Err(AppError::BadRequest(
                    "At least one option must be marked correct".to_string(),
                ));
            }
        }
        QuestionType::TrueFalse => {
            if payload.correct_answer.is_none() {
                return Err(AppError::BadRequest(
                    "True/false questions require correct_answer".to_string(),
                ));
            }
        }
    }

    let mut tx = pool.begin().await?;

    let position = match payload.position {
        Some(p) => p,
        None => store::questions::next_position(&mut *tx, quiz_id).await?,
    };

    let question_id = store::questions::insert_question(
        &mut *tx,
        quiz_id,
        &payload.title,
        payload.description.as_deref(),
        &payload.problem_statement,
        payload.question_type,
        payload.starter_code.as_deref(),
        payload.language.as_deref(),
        payload.points.unwrap_or(10),
        position,
    )
    .await?;

    match payload.question_type {
        QuestionType::Code => {}
        QuestionType::MultipleChoice => {
            for (idx, option) in payload.options.as_deref().unwrap_or_default().iter().enumerate() {
                store::questions::insert_option(
                    &mut *tx,
                    question_id,
                    &option.text,
                    option.is_correct,
                    idx as i64,
                    option.image_path.as_deref(),
                )
                .await?;
            }
        }
        QuestionType::TrueFalse => {
            // Exactly two options, one correct, mirroring the stored shape
            // choice grading expects.
            let correct_answer = payload.correct_answer.unwrap_or(true);
            store::questions::insert_option(&mut *tx, question_id, "True", correct_answer, 0, None)
                .await?;
            store::questions::insert_option(
                &mut *tx,
                question_id,
                "False",
                !correct_answer,
                1,
                None,
            )
            .await?;
        }
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"id": question_id})),
    ))
}

pub async fn delete_question(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let affected = store::questions::delete_question(&pool, id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(Json(serde_json::json!({"deleted": id})))
}

pub async fn create_test_case(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
    Path(question_id): Path<i64>,
    Json(payload): Json<CreateTestCaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let question = store::questions::fetch_question(&pool, question_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
    if question.question_type != QuestionType::Code {
        return Err(AppError::BadRequest(
            "Only code questions take test cases".to_string(),
        ));
    }

    let position = match payload.position {
        Some(p) => p,
        None => store::questions::list_test_cases(&pool, question_id).await?.len() as i64,
    };

    let id = store::questions::insert_test_case(
        &pool,
        question_id,
        payload.input_data.as_deref(),
        &payload.expected_output,
        payload.is_hidden.unwrap_or(false),
        position,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

pub async fn delete_test_case(
    State(pool): State<SqlitePool>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let affected = store::questions::delete_test_case(&pool, id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("Test case not found".to_string()));
    }
    Ok(Json(serde_json::json!({"deleted": id})))
}
