//! End-to-end API integration tests
//!
//! These tests verify the complete HTTP API flows including:
//! - Team creation, lookup and deletion
//! - Member creation and team changes
//! - Unpaged and paged member search with sorting
//! - Error responses for bad input and unknown ids

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use common::{setup_fixture, setup_test_db};
use roster_api::api;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for oneshot

/// Setup test application with routes
fn setup_app(pool: SqlitePool) -> Router {
    api::router(pool)
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send_json(app: Router, method: &str, uri: &str, payload: Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&payload).unwrap()))
            .unwrap(),
    )
    .await
    .unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn usernames(rows: &Value) -> Vec<&str> {
    rows.as_array()
        .unwrap()
        .iter()
        .filter_map(|row| row["username"].as_str())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let pool = setup_test_db().await;
    let app = setup_app(pool);

    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_create_team_and_get_it() {
    let pool = setup_test_db().await;
    let app = setup_app(pool.clone());

    let response = send_json(app.clone(), "POST", "/api/teams", json!({ "name": "teamA" })).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["name"], "teamA");
    let id = created["id"].as_str().unwrap().to_string();

    let response = get(app.clone(), &format!("/api/teams/{}", id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["id"], id.as_str());
    assert_eq!(fetched["member_ids"], json!([]));

    // Verify persisted
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team WHERE name = 'teamA'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_create_team_with_blank_name_is_rejected() {
    let pool = setup_test_db().await;
    let app = setup_app(pool);

    let response = send_json(app, "POST", "/api/teams", json!({ "name": "  " })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_list_teams() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/api/teams").await;
    assert_eq!(response.status(), StatusCode::OK);

    let teams = body_json(response).await;
    let names: Vec<&str> = teams
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|team| team["name"].as_str())
        .collect();
    assert_eq!(names, vec!["teamA", "teamB"]);
    assert_eq!(teams[0]["member_ids"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_unknown_team_is_not_found() {
    let pool = setup_test_db().await;
    let app = setup_app(pool);

    let response = get(app, &format!("/api/teams/{}", uuid::Uuid::new_v4())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().starts_with("Team not found"));
}

#[tokio::test]
async fn test_delete_team_keeps_members() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/teams/{}", fx.team_a.id()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app, &format!("/api/members/{}", fx.members[0].id())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let member = body_json(response).await;
    assert!(member["team_id"].is_null());
    assert!(member["team_name"].is_null());
}

#[tokio::test]
async fn test_create_member_in_team() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let payload = json!({
        "username": "member5",
        "age": 50,
        "team_id": fx.team_b.id()
    });
    let response = send_json(app.clone(), "POST", "/api/members", payload).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["username"], "member5");
    assert_eq!(created["team_id"], fx.team_b.id().to_string());

    let response = get(app, &format!("/api/members/{}", created["id"].as_str().unwrap())).await;
    let fetched = body_json(response).await;
    assert_eq!(fetched["age"], 50);
    assert_eq!(fetched["team_name"], "teamB");
}

#[tokio::test]
async fn test_create_member_without_username_or_team() {
    let pool = setup_test_db().await;
    let app = setup_app(pool);

    let response = send_json(app, "POST", "/api/members", json!({ "age": 7 })).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert!(created["username"].is_null());
    assert!(created["team_id"].is_null());
}

#[tokio::test]
async fn test_create_member_rejects_bad_input() {
    let pool = setup_test_db().await;
    let app = setup_app(pool);

    let response = send_json(
        app.clone(),
        "POST",
        "/api/members",
        json!({ "username": "young", "age": -1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send_json(
        app,
        "POST",
        "/api/members",
        json!({ "username": "lost", "age": 1, "team_id": uuid::Uuid::new_v4() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_team() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());
    let member1 = fx.members[0].id();

    let response = send_json(
        app.clone(),
        "PUT",
        &format!("/api/members/{}/team", member1),
        json!({ "team_id": fx.team_b.id() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["team_name"], "teamB");

    let response = get(app, &format!("/api/teams/{}", fx.team_b.id())).await;
    let team = body_json(response).await;
    assert_eq!(team["member_ids"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_get_unknown_member_is_not_found() {
    let pool = setup_test_db().await;
    let app = setup_app(pool);

    let response = get(app, &format!("/api/members/{}", uuid::Uuid::new_v4())).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_v1_with_camel_case_params() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/v1/members?teamName=teamB&ageGoe=35&ageLoe=40").await;
    assert_eq!(response.status(), StatusCode::OK);

    let rows = body_json(response).await;
    assert_eq!(usernames(&rows), vec!["member4"]);
    assert_eq!(rows[0]["team_id"], fx.team_b.id().to_string());
    assert_eq!(rows[0]["team_name"], "teamB");
    assert_eq!(rows[0]["member_id"], fx.members[3].id().to_string());
}

#[tokio::test]
async fn test_search_v1_without_params_returns_everyone() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/v1/members?username=").await;

    let rows = body_json(response).await;
    assert_eq!(usernames(&rows), vec!["member1", "member2", "member3", "member4"]);
}

#[tokio::test]
async fn test_search_with_blank_numeric_params() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app.clone(), "/v1/members?username=&ageGoe=&ageLoe=").await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await;
    assert_eq!(usernames(&rows), vec!["member1", "member2", "member3", "member4"]);

    let response = get(app, "/v3/members?ageGoe=%20&page=&size=&teamName=teamB").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(usernames(&page["content"]), vec!["member3", "member4"]);
    assert_eq!(page["size"], 20);
}

#[tokio::test]
async fn test_search_rejects_non_numeric_age() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/v1/members?ageGoe=old").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_v2_pages_with_total() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/v2/members?page=0&size=3").await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_json(response).await;
    assert_eq!(usernames(&page["content"]), vec!["member1", "member2", "member3"]);
    assert_eq!(page["total_elements"], 4);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["first"], true);
    assert_eq!(page["last"], false);
}

#[tokio::test]
async fn test_search_v3_sorted_last_page() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/v3/members?page=1&size=3&sort=age,desc").await;
    assert_eq!(response.status(), StatusCode::OK);

    let page = body_json(response).await;
    assert_eq!(usernames(&page["content"]), vec!["member1"]);
    assert_eq!(page["page"], 1);
    assert_eq!(page["total_elements"], 4);
    assert_eq!(page["last"], true);
}

#[tokio::test]
async fn test_search_v3_filters_before_paging() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/v3/members?teamName=teamA&size=10&sort=username,desc").await;

    let page = body_json(response).await;
    assert_eq!(usernames(&page["content"]), vec!["member2", "member1"]);
    assert_eq!(page["total_elements"], 2);
}

#[tokio::test]
async fn test_search_rejects_unknown_sort_property() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/v2/members?sort=password").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_search_rejects_zero_page_size() {
    let fx = setup_fixture().await;
    let app = setup_app(fx.pool.clone());

    let response = get(app, "/v3/members?size=0").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
