//! HTTP API integration tests

use axum::http::{Method, StatusCode};
use pixelcollab::backend::routes::create_router;
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_health() {
    let (state, _memory) = test_state().await;
    let app = create_router(state);

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (state, _memory) = test_state().await;
    let app = create_router(state);

    let (status, body) = send(&app, Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_create_requires_token() {
    let (state, _memory) = test_state().await;
    let app = create_router(state.clone());
    let body = json!({"name": "foo", "xsize": 20, "ysize": 20});

    let (status, _) = send(&app, Method::POST, "/api/projects", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/projects", Some(&foreign_token()), Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(state.projects_snapshot().await.is_empty());
}

#[tokio::test]
async fn test_create_list_and_get() {
    let (state, _memory) = test_state().await;
    let app = create_router(state);
    let ada = TestUser::new("ada");

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/projects",
        Some(&ada.token),
        Some(json!({"name": "foo", "xsize": 20, "ysize": 20, "timer": "unlimited"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["owner_name"], "ada");
    assert_eq!(created["grid"].as_array().unwrap().len(), 20);

    let (status, listing) = send(&app, Method::GET, "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["name"], "foo");

    let uri = format!("/api/projects/{}", created["id"]);
    let (status, fetched) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_create_rejects_oversized_grid() {
    let (state, _memory) = test_state().await;
    let app = create_router(state.clone());
    let ada = TestUser::new("ada");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/projects",
        Some(&ada.token),
        Some(json!({"name": "huge", "xsize": 1_u64 << 40, "ysize": 1, "timer": "unlimited"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(state.projects_snapshot().await.is_empty());
    assert!(state.store.load_active_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_missing_project() {
    let (state, _memory) = test_state().await;
    let app = create_router(state);

    let (status, body) = send(&app, Method::GET, "/api/projects/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_mutations_need_a_grant() {
    let (state, _memory) = test_state().await;
    let ada = TestUser::new("ada");
    let bob = TestUser::new("bob");
    let project = active_project(&state, &ada, "foo", 2).await;
    let app = create_router(state);

    let finish = format!("/api/projects/{}/finish", project.id);
    let (status, _) = send(&app, Method::POST, &finish, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, &finish, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let grant = format!("/api/projects/{}/permissions", project.id);
    let (status, _) = send(&app, Method::POST, &grant, Some(&ada.token), Some(json!({"user_id": bob.id}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, finished) = send(&app, Method::POST, &finish, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finished["finished"], true);

    let revoke = format!("/api/projects/{}/permissions/{}", project.id, bob.id);
    let (status, _) = send(&app, Method::DELETE, &revoke, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &revoke, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lifecycle_conflicts() {
    let (state, _memory) = test_state().await;
    let ada = TestUser::new("ada");
    let project = finished_project(&state, &ada, "done", true).await;
    let app = create_router(state);

    let uri = format!("/api/projects/{}", project.id);
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let public = format!("/api/projects/{}/public", project.id);
    let (status, _) = send(&app, Method::PUT, &public, Some(&ada.token), Some(json!({"is_public": false}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::PUT, &public, Some(&ada.token), Some(json!({"is_public": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_public"], true);
}

#[tokio::test]
async fn test_save_and_delete_active_project() {
    let (state, _memory) = test_state().await;
    let ada = TestUser::new("ada");
    let project = active_project(&state, &ada, "foo", 2).await;
    let app = create_router(state.clone());

    let save = format!("/api/projects/{}/save", project.id);
    let (status, _) = send(&app, Method::POST, &save, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let uri = format!("/api/projects/{}", project.id);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&ada.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.projects_snapshot().await.is_empty());
}

#[tokio::test]
async fn test_gallery_rating_and_flags() {
    let (state, _memory) = test_state().await;
    let ada = TestUser::new("ada");
    let bob = TestUser::new("bob");
    let project = finished_project(&state, &ada, "foo", true).await;
    let app = create_router(state);

    let rating = format!("/api/gallery/{}/rating", project.id);
    let (status, _) = send(&app, Method::PUT, &rating, Some(&ada.token), Some(json!({"score": 3}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::PUT, &rating, Some(&bob.token), Some(json!({"score": 9}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::PUT, &rating, Some(&bob.token), Some(json!({"score": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, gallery) = send(&app, Method::GET, "/api/gallery?sort=rating", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(gallery[0]["average_rating"], 6.0);

    let flags = format!("/api/gallery/{}/flags", project.id);
    let (status, body) = send(&app, Method::POST, &flags, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!("created"));
    let (status, body) = send(&app, Method::POST, &flags, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already exists");

    let (status, _) = send(&app, Method::DELETE, &rating, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &rating, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gallery_views() {
    let (state, _memory) = test_state().await;
    let ada = TestUser::new("ada");
    let public = finished_project(&state, &ada, "public", true).await;
    let private = finished_project(&state, &ada, "private", false).await;
    let app = create_router(state);

    let (_, newest) = send(&app, Method::GET, "/api/gallery", None, None).await;
    assert_eq!(newest.as_array().unwrap().len(), 1);
    assert_eq!(newest[0]["project"]["id"], public.id);

    let (_, mine) = send(&app, Method::GET, "/api/gallery?sort=myGallery", Some(&ada.token), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 2);

    let (status, anonymous) = send(&app, Method::GET, "/api/gallery?sort=myGallery", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(anonymous.as_array().unwrap().is_empty());

    let (_, unknown) = send(&app, Method::GET, "/api/gallery?sort=oldest", None, None).await;
    assert!(unknown.as_array().unwrap().is_empty());

    let flags = format!("/api/gallery/{}/flags", private.id);
    let (status, _) = send(&app, Method::POST, &flags, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
