// tests/api_tests.rs

use std::str::FromStr;
use std::sync::Arc;

use codequiz::config::Config;
use codequiz::engine::QuizEngine;
use codequiz::executor::{PistonClient, languages::LanguageRegistry};
use codequiz::routes;
use codequiz::state::AppState;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app(piston_url: &str) -> String {
    // 1. Create an in-memory pool. One connection, so every request sees the
    // same database.
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to open in-memory database");

    // 2. Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        rust_log: "error".to_string(),
        piston_url: piston_url.to_string(),
        exec_request_timeout_secs: 5,
        exec_compile_timeout_ms: 10_000,
        exec_run_timeout_ms: 3_000,
        exec_rate_limit_per_minute: 60,
        exec_cache_enabled: false,
    };

    let executor = Arc::new(PistonClient::new(&config, LanguageRegistry::default()));
    let engine = QuizEngine::new(pool.clone(), executor);
    let state = AppState {
        pool,
        config,
        engine,
    };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Mounts a Piston mock that answers every execution with the given stdout.
async fn mock_piston(stdout: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "run": {"stdout": stdout, "stderr": "", "code": 0}
        })))
        .mount(&server)
        .await;
    server
}

async fn create_quiz(client: &reqwest::Client, address: &str) -> i64 {
    let response = client
        .post(format!("{}/api/admin/quizzes", address))
        .header("X-User-Id", "1")
        .header("X-User-Role", "admin")
        .json(&serde_json::json!({
            "title": "Integration Quiz",
            "description": "End to end",
            "time_limit": 30,
            "is_active": true
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

async fn create_code_question(client: &reqwest::Client, address: &str, quiz_id: i64) -> i64 {
    let response = client
        .post(format!("{}/api/admin/quizzes/{}/questions", address, quiz_id))
        .header("X-User-Id", "1")
        .header("X-User-Role", "admin")
        .json(&serde_json::json!({
            "title": "Double it",
            "problem_statement": "Read a number and print its double.",
            "question_type": "code",
            "language": "python",
            "points": 10
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

async fn create_test_case(client: &reqwest::Client, address: &str, question_id: i64) {
    let response = client
        .post(format!(
            "{}/api/admin/questions/{}/test-cases",
            address, question_id
        ))
        .header("X-User-Id", "1")
        .header("X-User-Role", "admin")
        .json(&serde_json::json!({
            "input_data": "21",
            "expected_output": "42"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn unknown_route_404() {
    // Arrange
    let address = spawn_app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
    let address = spawn_app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_routes_require_the_admin_role() {
    let address = spawn_app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    // A plain user id without the role header is not enough.
    let response = client
        .post(format!("{}/api/admin/quizzes", address))
        .header("X-User-Id", "7")
        .json(&serde_json::json!({"title": "Nope"}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn full_code_quiz_flow() {
    // Arrange: a Piston mock that always prints the right answer.
    let piston = mock_piston("42\n").await;
    let address = spawn_app(&piston.uri()).await;
    let client = reqwest::Client::new();

    let quiz_id = create_quiz(&client, &address).await;
    let question_id = create_code_question(&client, &address, quiz_id).await;
    create_test_case(&client, &address, question_id).await;

    // The quiz shows up in the student listing.
    let response = client
        .get(format!("{}/api/quizzes", address))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let quizzes: serde_json::Value = response.json().await.unwrap();
    assert_eq!(quizzes.as_array().unwrap().len(), 1);

    // Start the attempt.
    let response = client
        .post(format!("{}/api/quizzes/{}/start", address, quiz_id))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let started: serde_json::Value = response.json().await.unwrap();
    assert_eq!(started["status"], "started");
    let submission_id = started["submission_id"].as_i64().unwrap();

    // The take view serves the code question.
    let response = client
        .get(format!(
            "{}/api/quizzes/{}/submissions/{}",
            address, quiz_id, submission_id
        ))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let view: serde_json::Value = response.json().await.unwrap();
    assert_eq!(view["state"], "in_progress");
    assert_eq!(view["current"]["id"].as_i64().unwrap(), question_id);
    assert!(view["time_remaining_seconds"].as_i64().unwrap() > 0);

    // The clock is running.
    let response = client
        .get(format!(
            "{}/api/submissions/{}/time-remaining",
            address, submission_id
        ))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    let remaining: serde_json::Value = response.json().await.unwrap();
    assert!(remaining["seconds"].as_i64().unwrap() > 0);

    // Answer the question; the mock passes the only test case.
    let code = "print(int(input()) * 2)";
    let response = client
        .post(format!(
            "{}/api/submissions/{}/questions/{}/code",
            address, submission_id, question_id
        ))
        .header("X-User-Id", "7")
        .json(&serde_json::json!({"code": code, "language": "python"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["state"], "saved");
    assert_eq!(outcome["question_score"].as_f64().unwrap(), 10.0);
    assert_eq!(outcome["all_answered"], true);

    // Submit and check the final score.
    let response = client
        .post(format!("{}/api/submissions/{}/submit", address, submission_id))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let submission: serde_json::Value = response.json().await.unwrap();
    assert_eq!(submission["is_completed"], true);
    assert_eq!(submission["score"].as_f64().unwrap(), 10.0);
    assert_eq!(submission["total_points"].as_i64().unwrap(), 10);

    // The review page returns the answer verbatim with its test results.
    let response = client
        .get(format!(
            "{}/api/submissions/{}/results",
            address, submission_id
        ))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let results: serde_json::Value = response.json().await.unwrap();
    let block = &results["questions"][0];
    assert_eq!(block["answered"], true);
    assert_eq!(block["prior_answer"]["code"], code);
    assert_eq!(block["test_results"][0]["passed"], true);
}

#[tokio::test]
async fn answering_again_is_a_conflict_after_submit() {
    let piston = mock_piston("42\n").await;
    let address = spawn_app(&piston.uri()).await;
    let client = reqwest::Client::new();

    let quiz_id = create_quiz(&client, &address).await;
    let question_id = create_code_question(&client, &address, quiz_id).await;

    let response = client
        .post(format!("{}/api/quizzes/{}/start", address, quiz_id))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    let started: serde_json::Value = response.json().await.unwrap();
    let submission_id = started["submission_id"].as_i64().unwrap();

    client
        .post(format!("{}/api/submissions/{}/submit", address, submission_id))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!(
            "{}/api/submissions/{}/questions/{}/code",
            address, submission_id, question_id
        ))
        .header("X-User-Id", "7")
        .json(&serde_json::json!({"code": "print(42)", "language": "python"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["submission_id"].as_i64().unwrap(), submission_id);
}

#[tokio::test]
async fn multiple_choice_flow_scores_the_exact_set() {
    let address = spawn_app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    let quiz_id = create_quiz(&client, &address).await;
    let response = client
        .post(format!("{}/api/admin/quizzes/{}/questions", address, quiz_id))
        .header("X-User-Id", "1")
        .header("X-User-Role", "admin")
        .json(&serde_json::json!({
            "title": "Pick both",
            "problem_statement": "Which are even?",
            "question_type": "multiple_choice",
            "points": 10,
            "options": [
                {"text": "2", "is_correct": true},
                {"text": "3", "is_correct": false},
                {"text": "4", "is_correct": true}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let question_id = body["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/api/quizzes/{}/start", address, quiz_id))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    let started: serde_json::Value = response.json().await.unwrap();
    let submission_id = started["submission_id"].as_i64().unwrap();

    // Option ids come from the take view (correctness flags never do).
    let response = client
        .get(format!(
            "{}/api/quizzes/{}/submissions/{}",
            address, quiz_id, submission_id
        ))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    let view: serde_json::Value = response.json().await.unwrap();
    let options = view["options"].as_array().unwrap();
    assert_eq!(options.len(), 3);
    assert!(options.iter().all(|o| o.get("is_correct").is_none()));
    let id_of = |text: &str| {
        options
            .iter()
            .find(|o| o["text"] == text)
            .unwrap()["id"]
            .as_i64()
            .unwrap()
    };

    let response = client
        .post(format!(
            "{}/api/submissions/{}/questions/{}/choice",
            address, submission_id, question_id
        ))
        .header("X-User-Id", "7")
        .json(&serde_json::json!({"selected_option_ids": [id_of("2"), id_of("4")]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["state"], "saved");
    assert_eq!(outcome["question_score"].as_f64().unwrap(), 10.0);
}

#[tokio::test]
async fn true_false_flow() {
    let address = spawn_app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    let quiz_id = create_quiz(&client, &address).await;
    let response = client
        .post(format!("{}/api/admin/quizzes/{}/questions", address, quiz_id))
        .header("X-User-Id", "1")
        .header("X-User-Role", "admin")
        .json(&serde_json::json!({
            "title": "Sky check",
            "problem_statement": "The sky is green.",
            "question_type": "true_false",
            "points": 5,
            "correct_answer": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    let question_id = body["id"].as_i64().unwrap();

    let response = client
        .post(format!("{}/api/quizzes/{}/start", address, quiz_id))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    let started: serde_json::Value = response.json().await.unwrap();
    let submission_id = started["submission_id"].as_i64().unwrap();

    let response = client
        .post(format!(
            "{}/api/submissions/{}/questions/{}/choice",
            address, submission_id, question_id
        ))
        .header("X-User-Id", "7")
        .json(&serde_json::json!({"answer": false}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["question_score"].as_f64().unwrap(), 5.0);
}

#[tokio::test]
async fn run_code_reports_failures_inline() {
    // No Piston behind this URL, so the call fails below HTTP.
    let address = spawn_app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/run-code", address))
        .header("X-User-Id", "7")
        .json(&serde_json::json!({"code": "print(1)", "language": "python"}))
        .send()
        .await
        .unwrap();

    // Execution failures are payloads, not HTTP errors.
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn run_code_returns_program_output() {
    let piston = mock_piston("hello\n").await;
    let address = spawn_app(&piston.uri()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/run-code", address))
        .header("X-User-Id", "7")
        .json(&serde_json::json!({"code": "print('hello')", "language": "python"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["stdout"], "hello\n");
    assert_eq!(body["exit_code"].as_i64().unwrap(), 0);
}

#[tokio::test]
async fn supported_languages_are_listed() {
    let address = spawn_app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/languages", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let languages: Vec<String> = response.json().await.unwrap();
    assert!(languages.contains(&"python".to_string()));
}

#[tokio::test]
async fn deleting_a_quiz_takes_its_submissions_with_it() {
    let address = spawn_app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    let quiz_id = create_quiz(&client, &address).await;
    let question_id = create_code_question(&client, &address, quiz_id).await;
    create_test_case(&client, &address, question_id).await;

    let response = client
        .post(format!("{}/api/quizzes/{}/start", address, quiz_id))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    let started: serde_json::Value = response.json().await.unwrap();
    let submission_id = started["submission_id"].as_i64().unwrap();

    let response = client
        .delete(format!("{}/api/admin/quizzes/{}", address, quiz_id))
        .header("X-User-Id", "1")
        .header("X-User-Role", "admin")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // The cascade removed the attempt along with the quiz.
    let response = client
        .get(format!(
            "{}/api/submissions/{}/results",
            address, submission_id
        ))
        .header("X-User-Id", "7")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
