// src/routes.rs

use axum::{
    Router,
    http::Method,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{admin, quiz};
use crate::state::AppState;

/// Assembles the main application router.
///
/// * Student routes: take quizzes, answer questions, review results.
/// * Admin routes: author quizzes, questions and test cases.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let student_routes = Router::new()
        .route("/quizzes", get(quiz::list_quizzes))
        .route("/quizzes/{quiz_id}/start", post(quiz::start_quiz))
        .route(
            "/quizzes/{quiz_id}/submissions/{submission_id}",
            get(quiz::take_quiz),
        )
        .route("/submissions", get(quiz::my_submissions))
        .route(
            "/submissions/{submission_id}/questions/{question_id}/code",
            post(quiz::submit_code_answer),
        )
        .route(
            "/submissions/{submission_id}/questions/{question_id}/choice",
            post(quiz::submit_choice_answer),
        )
        .route("/submissions/{submission_id}/submit", post(quiz::submit_quiz))
        .route(
            "/submissions/{submission_id}/results",
            get(quiz::submission_results),
        )
        .route(
            "/submissions/{submission_id}/time-remaining",
            get(quiz::time_remaining),
        )
        .route("/run-code", post(quiz::run_code))
        .route("/languages", get(quiz::supported_languages));

    let admin_routes = Router::new()
        .route(
            "/quizzes",
            get(admin::list_quizzes).post(admin::create_quiz),
        )
        .route(
            "/quizzes/{id}",
            put(admin::update_quiz).delete(admin::delete_quiz),
        )
        .route(
            "/quizzes/{quiz_id}/questions",
            post(admin::create_question),
        )
        .route("/questions/{id}", delete(admin::delete_question))
        .route(
            "/questions/{question_id}/test-cases",
            post(admin::create_test_case),
        )
        .route("/test-cases/{id}", delete(admin::delete_test_case));

    Router::new()
        .nest("/api", student_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
