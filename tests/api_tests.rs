// tests/api_tests.rs

use std::sync::Arc;

use quiz_backend::{
    config::Config,
    notifier::{HttpNotifier, LogNotifier, Notifier},
    routes,
    state::AppState,
    store::MemoryStore,
};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Value, json};

struct TestApp {
    address: String,
    client: Client,
}

impl TestApp {
    fn as_user(&self, builder: RequestBuilder, id: i64, role: &str) -> RequestBuilder {
        builder
            .header("X-User-ID", id.to_string())
            .header("X-User-Role", role)
    }

    async fn get(&self, path: &str, id: i64, role: &str) -> Response {
        self.as_user(self.client.get(format!("{}{}", self.address, path)), id, role)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn post(&self, path: &str, body: Value, id: i64, role: &str) -> Response {
        self.as_user(self.client.post(format!("{}{}", self.address, path)), id, role)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn put(&self, path: &str, body: Value, id: i64, role: &str) -> Response {
        self.as_user(self.client.put(format!("{}{}", self.address, path)), id, role)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn delete(&self, path: &str, id: i64, role: &str) -> Response {
        self.as_user(self.client.delete(format!("{}{}", self.address, path)), id, role)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// POSTs and returns the created id.
    async fn create(&self, path: &str, body: Value, id: i64, role: &str) -> String {
        let response = self.post(path, body, id, role).await;
        assert_eq!(response.status().as_u16(), 201, "POST {} failed", path);
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().expect("id must be a string").to_string()
    }
}

/// Spawns the app over a fresh in-memory store on a random port.
async fn spawn_app_with(notifier: Arc<dyn Notifier>) -> TestApp {
    let state = AppState::new(Arc::new(MemoryStore::new()), notifier, Config::memory());
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: Client::new(),
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(LogNotifier)).await
}

fn question_body(subject_id: Option<&str>) -> Value {
    json!({
        "text": "2 + 2 = ?",
        "code": "",
        "variants": {"a": "3", "b": "4", "nested": {"k": [1, 2, 3]}},
        "answer": {"correct": "b"},
        "type_id": "1",
        "subject_id": subject_id,
    })
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app().await;
    let response = app.get("/random_path_that_does_not_exist", 1, "Admin").await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn missing_user_headers_are_rejected() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(format!("{}/subjects/subjects", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = app.get("/subjects/subjects", 1, "Superuser").await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn creator_question_waits_for_moderation() {
    let app = spawn_app().await;

    let id = app.create("/questions/question", question_body(None), 8, "Creator").await;

    let question: Value = app
        .get(&format!("/questions/question/{}", id), 8, "Creator")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(question["id"], id);
    assert_eq!(question["status"], "Created");
    assert_eq!(question["creator_user_id"], "8");
    assert!(question["moderator_user_id"].is_null());
    assert!(question["moderated_at"].is_null());
    assert_eq!(question["type"]["name"], "Test");
    // Free-form documents come back verbatim.
    assert_eq!(question["variants"]["nested"]["k"], json!([1, 2, 3]));
}

#[tokio::test]
async fn admin_question_is_approved_on_submit() {
    let app = spawn_app().await;

    let id = app.create("/questions/question", question_body(None), 1, "Admin").await;

    let question: Value = app
        .get(&format!("/questions/question/{}", id), 1, "Admin")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(question["status"], "Approved");
    assert_eq!(question["moderator_user_id"], "1");
    assert!(question["moderated_at"].is_string());
}

#[tokio::test]
async fn caller_cannot_pick_the_status() {
    let app = spawn_app().await;

    let mut body = question_body(None);
    body["status_id"] = json!("2");
    let id = app.create("/questions/question", body, 8, "Creator").await;

    let question: Value = app
        .get(&format!("/questions/question/{}", id), 8, "Creator")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(question["status"], "Created");
}

#[tokio::test]
async fn moderation_overwrites_status() {
    let app = spawn_app().await;
    let id = app.create("/questions/question", question_body(None), 8, "Creator").await;
    let path = format!("/questions/question/{}/moderate", id);

    let response = app
        .put(&path, json!({"approve": false, "comment": "unclear"}), 3, "Moderator")
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let declined: Vec<Value> = app
        .get("/questions/questions?status_id=3", 3, "Moderator")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(declined.len(), 1);

    app.put(&path, json!({"approve": true}), 3, "Moderator").await;
    let question: Value = app
        .get(&format!("/questions/question/{}", id), 3, "Moderator")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(question["status"], "Approved");

    let response = app
        .put("/questions/question/999/moderate", json!({"approve": true}), 3, "Moderator")
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn edit_keeps_the_original_creator() {
    let app = spawn_app().await;
    let id = app.create("/questions/question", question_body(None), 8, "Creator").await;

    let mut body = question_body(None);
    body["text"] = json!("2 + 3 = ?");
    let response = app
        .put(&format!("/questions/question/{}", id), body, 1, "Admin")
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let question: Value = app
        .get(&format!("/questions/question/{}", id), 1, "Admin")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(question["text"], "2 + 3 = ?");
    assert_eq!(question["creator_user_id"], "8");
    assert_eq!(question["status"], "Approved");
    assert_eq!(question["moderator_user_id"], "1");
}

#[tokio::test]
async fn question_list_filters_combine() {
    let app = spawn_app().await;
    let math = app
        .create("/subjects/subject", json!({"name": "Math"}), 1, "Admin")
        .await;

    app.create("/questions/question", question_body(Some(math.as_str())), 8, "Creator").await;
    app.create("/questions/question", question_body(None), 8, "Creator").await;
    app.create("/questions/question", question_body(Some(math.as_str())), 9, "Creator").await;

    let all: Vec<Value> = app
        .get("/questions/questions", 1, "Admin")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let filtered: Vec<Value> = app
        .get(
            &format!("/questions/questions?subject_id={}&creator_user_id=8", math),
            1,
            "Admin",
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["subject_name"], "Math");
}

#[tokio::test]
async fn empty_filter_parameters_are_ignored() {
    let app = spawn_app().await;

    app.create("/questions/question", question_body(None), 8, "Creator").await;
    app.create("/questions/question", question_body(None), 9, "Creator").await;
    let q = app.create("/questions/question", question_body(None), 1, "Admin").await;
    app.create("/quizzes/quiz", json!({"name": "Solo", "question_ids": [q]}), 8, "Creator")
        .await;

    let response = app
        .get("/questions/questions?subject_id=&creator_user_id=&status_id=", 1, "Admin")
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let questions: Vec<Value> = response.json().await.unwrap();
    assert_eq!(questions.len(), 3);

    let narrowed: Vec<Value> = app
        .get("/questions/questions?subject_id=&creator_user_id=9&status_id=", 1, "Admin")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(narrowed.len(), 1);

    let response = app.get("/quizzes/quizzes?creator_user_id=", 1, "Admin").await;
    assert_eq!(response.status().as_u16(), 200);
    let quizzes: Vec<Value> = response.json().await.unwrap();
    assert_eq!(quizzes.len(), 1);
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = spawn_app().await;

    let responses = [
        app.get("/questions/questions?status_id=pending", 1, "Admin").await,
        app.get("/quizzes/not-a-number", 1, "Admin").await,
        app.as_user(
            app.client.post(format!("{}/quizzes/quiz", app.address)),
            1,
            "Admin",
        )
        .header("content-type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .unwrap(),
    ];

    for response in responses {
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn lookup_tables_are_seeded() {
    let app = spawn_app().await;

    let types: Vec<Value> = app.get("/questions/types", 1, "Admin").await.json().await.unwrap();
    assert_eq!(types.len(), 3);
    assert_eq!(types[0], json!({"id": "1", "name": "Test"}));

    let statuses: Vec<Value> = app
        .get("/questions/statuses", 1, "Admin")
        .await
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = statuses.iter().filter_map(|s| s["name"].as_str()).collect();
    assert_eq!(names, ["Created", "Approved", "Declined"]);
}

#[tokio::test]
async fn invalid_question_payload_is_400() {
    let app = spawn_app().await;

    let mut body = question_body(None);
    body["type_id"] = json!("42");
    let response = app.post("/questions/question", body, 8, "Creator").await;
    assert_eq!(response.status().as_u16(), 400);

    let mut body = question_body(None);
    body["text"] = json!("x".repeat(10_001));
    let response = app.post("/questions/question", body, 8, "Creator").await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn failed_notification_still_keeps_the_question() {
    // Nothing listens on port 9 locally.
    let app = spawn_app_with(Arc::new(HttpNotifier::new("http://127.0.0.1:9/notify"))).await;

    let response = app.post("/questions/question", question_body(None), 8, "Creator").await;
    assert_eq!(response.status().as_u16(), 500);

    let questions: Vec<Value> = app
        .get("/questions/questions", 8, "Creator")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(questions.len(), 1);

    // Privileged submissions never notify, so they succeed.
    let response = app.post("/questions/question", question_body(None), 1, "Admin").await;
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn subject_crud_and_hierarchy() {
    let app = spawn_app().await;

    let math = app
        .create("/subjects/subject", json!({"name": "Math", "description": "Numbers"}), 1, "Admin")
        .await;
    let algebra = app
        .create(
            "/subjects/subject",
            json!({"name": "Algebra", "parent_id": math}),
            1,
            "Admin",
        )
        .await;

    let response = app
        .post("/subjects/subject", json!({"name": "Math"}), 1, "Admin")
        .await;
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .post("/subjects/subject", json!({"name": "Orphan", "parent_id": "999"}), 1, "Admin")
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .put(
            "/subjects/subject",
            json!({"id": math, "name": "Math", "parent_id": algebra}),
            1,
            "Admin",
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let subjects: Vec<Value> = app.get("/subjects/subjects", 1, "Admin").await.json().await.unwrap();
    let names: Vec<&str> = subjects.iter().filter_map(|s| s["name"].as_str()).collect();
    assert_eq!(names, ["Math", "Algebra"]);
    assert_eq!(subjects[1]["parent_id"], math);

    let response = app.delete(&format!("/subjects/subject/{}", math), 1, "Admin").await;
    assert_eq!(response.status().as_u16(), 204);

    let subjects: Vec<Value> = app.get("/subjects/subjects", 1, "Admin").await.json().await.unwrap();
    assert!(subjects.is_empty());

    let response = app.delete(&format!("/subjects/subject/{}", math), 1, "Admin").await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn statistic_rolls_nested_questions_up_to_the_root() {
    let app = spawn_app().await;

    let math = app
        .create("/subjects/subject", json!({"name": "Math"}), 1, "Admin")
        .await;
    let algebra = app
        .create("/subjects/subject", json!({"name": "Algebra", "parent_id": math}), 1, "Admin")
        .await;
    app.create("/questions/question", question_body(Some(algebra.as_str())), 8, "Creator").await;
    app.create("/questions/question", question_body(None), 8, "Creator").await;

    let stat: Value = app.get("/subjects/statistic", 8, "Creator").await.json().await.unwrap();
    assert_eq!(stat["subject_count"], 2);
    assert_eq!(stat["question_count"], 2);
    assert_eq!(stat["question_to_moderate_count"], 2);
    assert_eq!(stat["question_count_created_by_current_user"], 2);
    assert_eq!(stat["tests_count"], 0);
    assert_eq!(
        stat["question_counts_by_subject"],
        json!([{"subject_id": math, "subject_name": "Math", "question_count": 1}])
    );

    let stat: Value = app.get("/subjects/statistic", 1, "Admin").await.json().await.unwrap();
    assert_eq!(stat["question_count_created_by_current_user"], 0);
}

#[tokio::test]
async fn quiz_links_exactly_the_requested_questions() {
    let app = spawn_app().await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(app.create("/questions/question", question_body(None), 1, "Admin").await);
    }

    let quiz = app
        .create(
            "/quizzes/quiz",
            json!({"name": "Warm-up", "question_ids": ids}),
            8,
            "Creator",
        )
        .await;

    let body: Value = app
        .get(&format!("/quizzes/{}", quiz), 8, "Creator")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["question_ids"], json!(ids));
    assert_eq!(body["creator_user_id"], "8");

    let questions: Vec<Value> = app
        .get(&format!("/quizzes/{}/questions", quiz), 8, "Creator")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(questions.len(), 3);

    let mine: Vec<Value> = app
        .get("/quizzes/quizzes?creator_user_id=8", 8, "Creator")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn quiz_with_missing_question_leaves_nothing_behind() {
    let app = spawn_app().await;
    let q = app.create("/questions/question", question_body(None), 1, "Admin").await;

    let response = app
        .post(
            "/quizzes/quiz",
            json!({"name": "Broken", "question_ids": [q, "999"]}),
            8,
            "Creator",
        )
        .await;
    assert_eq!(response.status().as_u16(), 500);

    let quizzes: Vec<Value> = app.get("/quizzes/quizzes", 8, "Creator").await.json().await.unwrap();
    assert!(quizzes.is_empty());
}

#[tokio::test]
async fn deleted_quiz_is_gone_with_its_links() {
    let app = spawn_app().await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(app.create("/questions/question", question_body(None), 1, "Admin").await);
    }
    let quiz = app
        .create("/quizzes/quiz", json!({"name": "Temp", "question_ids": ids}), 1, "Admin")
        .await;

    let response = app.delete(&format!("/quizzes/{}", quiz), 1, "Admin").await;
    assert_eq!(response.status().as_u16(), 204);

    let questions: Vec<Value> = app
        .get(&format!("/quizzes/{}/questions", quiz), 1, "Admin")
        .await
        .json()
        .await
        .unwrap();
    assert!(questions.is_empty());

    let response = app.get(&format!("/quizzes/{}", quiz), 1, "Admin").await;
    assert_eq!(response.status().as_u16(), 404);

    // The questions themselves survive.
    let all: Vec<Value> = app.get("/questions/questions", 1, "Admin").await.json().await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn deleting_a_question_unlinks_it_from_quizzes() {
    let app = spawn_app().await;
    let a = app.create("/questions/question", question_body(None), 1, "Admin").await;
    let b = app.create("/questions/question", question_body(None), 1, "Admin").await;
    let quiz = app
        .create("/quizzes/quiz", json!({"name": "Pair", "question_ids": [a, b]}), 1, "Admin")
        .await;

    let response = app.delete(&format!("/questions/question/{}", a), 1, "Admin").await;
    assert_eq!(response.status().as_u16(), 204);

    let body: Value = app
        .get(&format!("/quizzes/{}", quiz), 1, "Admin")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["question_ids"], json!([b]));
}
