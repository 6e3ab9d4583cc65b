// tests/exam_flow_tests.rs
//
// End-to-end exam flow: authoring, taking a test once, scoring, the
// single-attempt invariant and the CSV export.

use edu_eval::{config::Config, routes, state::AppState};
use sqlx::sqlite::SqlitePoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Each call gets its own in-memory SQLite database, so tests are hermetic.
async fn spawn_app() -> String {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_login: None,
        admin_password: None,
    };

    let state = AppState::new(pool, config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registers a teacher and a student, creates the "Math1" test (3 questions,
/// correct answers A, B, C) and returns (teacher_token, student_token, test_id).
async fn setup_math1(client: &reqwest::Client, address: &str) -> (String, String, i64) {
    for (name, login, password, role) in [
        ("Karim", "karim01", "password123", "teacher"),
        ("Salima", "salima02", "password456", "student"),
    ] {
        let response = client
            .post(format!("{}/api/auth/register", address))
            .json(&serde_json::json!({
                "name": name,
                "login": login,
                "password": password,
                "role": role
            }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);
    }

    let teacher_token = token(client, address, "karim01", "password123", "teacher").await;
    let student_token = token(client, address, "salima02", "password456", "student").await;

    let response = client
        .post(format!("{}/api/tests", address))
        .bearer_auth(&teacher_token)
        .json(&serde_json::json!({ "name": "Math1", "question_count": 3 }))
        .send()
        .await
        .expect("Create test failed");
    assert_eq!(response.status().as_u16(), 201);
    let test_id = response.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    let response = client
        .post(format!("{}/api/tests/{}/questions", address, test_id))
        .bearer_auth(&teacher_token)
        .json(&serde_json::json!({
            "questions": [
                {
                    "text": "2 + 2?",
                    "option_a": "4", "option_b": "5",
                    "option_c": "6", "option_d": "7",
                    "correct": "A"
                },
                {
                    "text": "3 * 3?",
                    "option_a": "6", "option_b": "9",
                    "option_c": "12", "option_d": "27",
                    "correct": "B"
                },
                {
                    "text": "10 / 2?",
                    "option_a": "2", "option_b": "4",
                    "option_c": "5", "option_d": "8",
                    "correct": "C"
                }
            ]
        }))
        .send()
        .await
        .expect("Add questions failed");
    assert_eq!(response.status().as_u16(), 201);

    (teacher_token, student_token, test_id)
}

async fn token(
    client: &reqwest::Client,
    address: &str,
    login: &str,
    password: &str,
    role: &str,
) -> String {
    let body: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({
            "login": login,
            "password": password,
            "role": role
        }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    body["token"].as_str().expect("Token not found").to_string()
}

async fn start_exam(
    client: &reqwest::Client,
    address: &str,
    student_token: &str,
    test_id: i64,
) -> reqwest::Response {
    client
        .post(format!("{}/api/exam/start", address))
        .bearer_auth(student_token)
        .json(&serde_json::json!({ "test_id": test_id }))
        .send()
        .await
        .expect("Start exam failed")
}

async fn answer(
    client: &reqwest::Client,
    address: &str,
    student_token: &str,
    choice: &str,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/api/exam/answer", address))
        .bearer_auth(student_token)
        .json(&serde_json::json!({ "choice": choice }))
        .send()
        .await
        .expect("Submit answer failed");
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.expect("Failed to parse answer json")
}

#[tokio::test]
async fn two_of_three_scores_66_7_and_passes() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, student_token, test_id) = setup_math1(&client, &address).await;

    let response = start_exam(&client, &address, &student_token, test_id).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["question"]["number"], 1);
    assert_eq!(body["question"]["total"], 3);
    assert_eq!(body["question"]["text"], "2 + 2?");
    // The correct answer never leaks mid-exam.
    assert!(body["question"].get("correct").is_none());

    let body = answer(&client, &address, &student_token, "A").await;
    assert_eq!(body["question"]["number"], 2);
    assert_eq!(body["question"]["text"], "3 * 3?");

    let body = answer(&client, &address, &student_token, "B").await;
    assert_eq!(body["question"]["number"], 3);

    let body = answer(&client, &address, &student_token, "D").await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["correct_count"], 2);
    assert_eq!(body["total_questions"], 3);
    assert!((body["percentage"].as_f64().unwrap() - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(body["passed"], true);

    // Exactly one result row for the student, matching the outcome.
    let results: serde_json::Value = client
        .get(format!("{}/api/results/student", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["test_name"], "Math1");
    assert_eq!(results[0]["correct_count"], 2);
    assert_eq!(results[0]["passed"], true);
}

#[tokio::test]
async fn all_wrong_scores_zero_and_fails() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (teacher_token, student_token, test_id) = setup_math1(&client, &address).await;

    start_exam(&client, &address, &student_token, test_id).await;
    answer(&client, &address, &student_token, "D").await;
    answer(&client, &address, &student_token, "D").await;
    let body = answer(&client, &address, &student_token, "D").await;

    assert_eq!(body["status"], "completed");
    assert_eq!(body["correct_count"], 0);
    assert_eq!(body["percentage"].as_f64().unwrap(), 0.0);
    assert_eq!(body["passed"], false);

    let results: serde_json::Value = client
        .get(format!("{}/api/results/teacher", address))
        .bearer_auth(&teacher_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["passed"], false);
}

#[tokio::test]
async fn second_attempt_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, student_token, test_id) = setup_math1(&client, &address).await;

    // The test is available before the attempt.
    let available: serde_json::Value = client
        .get(format!("{}/api/tests/available", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(available.as_array().unwrap().len(), 1);

    start_exam(&client, &address, &student_token, test_id).await;
    answer(&client, &address, &student_token, "A").await;
    answer(&client, &address, &student_token, "B").await;
    answer(&client, &address, &student_token, "C").await;

    // Second start fails, regardless of the earlier session being gone.
    let response = start_exam(&client, &address, &student_token, test_id).await;
    assert_eq!(response.status().as_u16(), 409);

    // And the test no longer shows as available.
    let available: serde_json::Value = client
        .get(format!("{}/api/tests/available", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(available.as_array().unwrap().len(), 0);

    // Still exactly one result row.
    let results: serde_json::Value = client
        .get(format!("{}/api/results/student", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_or_invalid_answer_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, student_token, test_id) = setup_math1(&client, &address).await;

    start_exam(&client, &address, &student_token, test_id).await;

    // No choice at all
    let response = client
        .post(format!("{}/api/exam/answer", address))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Lowercase and out-of-range labels are not answers either
    for bad in ["a", "E", ""] {
        let response = client
            .post(format!("{}/api/exam/answer", address))
            .bearer_auth(&student_token)
            .json(&serde_json::json!({ "choice": bad }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    // The session did not advance: a valid answer still gets question 2.
    let body = answer(&client, &address, &student_token, "A").await;
    assert_eq!(body["question"]["number"], 2);
}

#[tokio::test]
async fn answer_without_session_fails() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, student_token, _) = setup_math1(&client, &address).await;

    let response = client
        .post(format!("{}/api/exam/answer", address))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({ "choice": "A" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn starting_unknown_test_fails() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, student_token, _) = setup_math1(&client, &address).await;

    let response = start_exam(&client, &address, &student_token, 9999).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn export_produces_csv_of_teacher_results() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let (teacher_token, student_token, test_id) = setup_math1(&client, &address).await;

    start_exam(&client, &address, &student_token, test_id).await;
    answer(&client, &address, &student_token, "A").await;
    answer(&client, &address, &student_token, "B").await;
    answer(&client, &address, &student_token, "D").await;

    // Students cannot export.
    let response = client
        .get(format!("{}/api/results/export", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .get(format!("{}/api/results/export", address))
        .bearer_auth(&teacher_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/csv"));

    let body = response.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Student,Test,CorrectCount,QuestionCount,Percentage,PassFail,Timestamp"
    );
    let row = lines.next().expect("expected one data row");
    assert!(row.starts_with("Salima,Math1,2,3,66.7,passed,"));
    assert!(lines.next().is_none());
}
