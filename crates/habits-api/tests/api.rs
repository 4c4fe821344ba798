//! Router-level tests: auth, habit CRUD, ownership, public listing.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use habits_api::auth::{AppStateInner, create_token};
use habits_db::Database;

const SECRET: &str = "test-secret";

fn app() -> (Router, Arc<Database>) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state = Arc::new(AppStateInner {
        db: db.clone(),
        jwt_secret: SECRET.into(),
    });
    (habits_api::router(state), db)
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": email, "password": "123", "tg_chat_id": "12345"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

fn new_habit() -> Value {
    json!({
        "place": "дом",
        "time": "2024-08-24T08:00:00+03:00",
        "action": "протереть пыль",
        "is_pleasant": false,
        "frequency_number": 1,
        "frequency_unit": "days",
        "reward": "посмотреть фильм",
        "duration": "00:02:00",
        "is_public": true
    })
}

#[tokio::test]
async fn register_then_login() {
    let (app, _) = app();
    register(&app, "test@gmail.com").await;

    let (status, body) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "test@gmail.com", "password": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "test@gmail.com");

    let (status, _) = call(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "test@gmail.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _) = app();
    register(&app, "test@gmail.com").await;

    let (status, _) = call(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"email": "TEST@gmail.com", "password": "123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn concurrent_registrations_conflict_instead_of_failing() {
    let (app, _) = app();
    let body = || Some(json!({"email": "race@example.com", "password": "123"}));

    let (a, b) = tokio::join!(
        call(&app, "POST", "/auth/register", None, body()),
        call(&app, "POST", "/auth/register", None, body()),
    );
    let mut statuses = vec![a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
}

#[tokio::test]
async fn habits_require_a_valid_token() {
    let (app, _) = app();
    let (status, _) = call(&app, "GET", "/habits", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = create_token("other-secret", uuid::Uuid::new_v4(), "x@y.ru").unwrap();
    let (status, _) = call(&app, "GET", "/habits", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn habit_crud_roundtrip() {
    let (app, db) = app();
    let token = register(&app, "test@gmail.com").await;

    let (status, created) = call(&app, "POST", "/habits", Some(&token), Some(new_habit())).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["duration"], 120);
    assert_eq!(created["time"], "2024-08-24T05:00:00Z");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = call(&app, "GET", &format!("/habits/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["action"], "протереть пыль");

    let (status, list) = call(&app, "GET", "/habits", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);

    let (status, updated) = call(
        &app,
        "PATCH",
        &format!("/habits/{id}"),
        Some(&token),
        Some(json!({"reward": "съесть яблоко"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["reward"], "съесть яблоко");

    let (status, _) = call(&app, "DELETE", &format!("/habits/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(db.get_habit(&id).unwrap().is_none());
}

#[tokio::test]
async fn invalid_habits_are_rejected() {
    let (app, _) = app();
    let token = register(&app, "test@gmail.com").await;

    let mut both = new_habit();
    both["is_pleasant"] = json!(true);
    let (status, body) = call(&app, "POST", "/habits", Some(&token), Some(both)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("reward"));

    let mut rare = new_habit();
    rare["frequency_number"] = json!(8);
    let (status, _) = call(&app, "POST", "/habits", Some(&token), Some(rare)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut long = new_habit();
    long["duration"] = json!("00:05:00");
    let (status, _) = call(&app, "POST", "/habits", Some(&token), Some(long)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut unit = new_habit();
    unit["frequency_unit"] = json!("hours");
    let (status, _) = call(&app, "POST", "/habits", Some(&token), Some(unit)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn switching_to_pleasant_drops_reward() {
    let (app, _) = app();
    let token = register(&app, "test@gmail.com").await;
    let (_, created) = call(&app, "POST", "/habits", Some(&token), Some(new_habit())).await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = call(
        &app,
        "PATCH",
        &format!("/habits/{id}"),
        Some(&token),
        Some(json!({"is_pleasant": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["reward"], Value::Null);
}

#[tokio::test]
async fn other_users_cannot_touch_a_habit() {
    let (app, _) = app();
    let owner = register(&app, "owner@example.com").await;
    let other = register(&app, "other@example.com").await;

    let (_, created) = call(&app, "POST", "/habits", Some(&owner), Some(new_habit())).await;
    let id = created["id"].as_str().unwrap();

    for method in ["GET", "DELETE"] {
        let (status, _) = call(&app, method, &format!("/habits/{id}"), Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
    }
    let (status, _) = call(
        &app,
        "PATCH",
        &format!("/habits/{id}"),
        Some(&other),
        Some(json!({"place": "офис"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, mine) = call(&app, "GET", "/habits", Some(&other), None).await;
    assert_eq!(mine["count"], 0);
}

#[tokio::test]
async fn public_listing_spans_users() {
    let (app, _) = app();
    let a = register(&app, "a@example.com").await;
    let b = register(&app, "b@example.com").await;

    call(&app, "POST", "/habits", Some(&a), Some(new_habit())).await;
    let mut private = new_habit();
    private["is_public"] = json!(false);
    call(&app, "POST", "/habits", Some(&b), Some(private)).await;

    let (status, public) = call(&app, "GET", "/habits/public", Some(&b), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["count"], 1);
    assert_eq!(public["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn pagination_caps_page_size() {
    let (app, _) = app();
    let token = register(&app, "a@example.com").await;
    for _ in 0..7 {
        call(&app, "POST", "/habits", Some(&token), Some(new_habit())).await;
    }

    let (_, first) = call(&app, "GET", "/habits", Some(&token), None).await;
    assert_eq!(first["count"], 7);
    assert_eq!(first["results"].as_array().unwrap().len(), 5);

    let (_, second) = call(&app, "GET", "/habits?page=2", Some(&token), None).await;
    assert_eq!(second["results"].as_array().unwrap().len(), 2);

    let (_, big) = call(&app, "GET", "/habits?page_size=1000", Some(&token), None).await;
    assert_eq!(big["page_size"], 50);
}

#[tokio::test]
async fn profile_chat_id_update() {
    let (app, _) = app();
    let token = register(&app, "a@example.com").await;

    let (status, profile) = call(
        &app,
        "PATCH",
        "/users/me",
        Some(&token),
        Some(json!({"tg_chat_id": "-100123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["tg_chat_id"], "-100123");

    let (status, _) = call(
        &app,
        "PATCH",
        "/users/me",
        Some(&token),
        Some(json!({"tg_chat_id": "not-a-chat"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, cleared) = call(&app, "PATCH", "/users/me", Some(&token), Some(json!({"tg_chat_id": null}))).await;
    assert_eq!(cleared["tg_chat_id"], Value::Null);

    let (status, me) = call(&app, "GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "a@example.com");
}
