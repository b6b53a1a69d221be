//! End-to-end scenarios through the REST router over a file-backed store.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use vlan_manager::{FileStore, RestRouter, VlanService};

// =============================================================================
// Helpers
// =============================================================================

fn app_at(path: std::path::PathBuf) -> Router {
    let store = FileStore::new(path).unwrap();
    let service = VlanService::new(Arc::new(store)).unwrap();
    RestRouter::new(service).build()
}

fn test_app() -> (Router, TempDir) {
    let tmp = TempDir::new().unwrap();
    (app_at(tmp.path().join("vlans.json")), tmp)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn vlan(name: &str, vlan_id: u16, subnet: &str, gateway: &str) -> Value {
    json!({
        "name": name,
        "vlan_id": vlan_id,
        "subnet": subnet,
        "gateway": gateway,
        "status": "active"
    })
}

fn prod() -> Value {
    vlan("Prod", 100, "192.168.1.0/24", "192.168.1.1")
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn create_returns_record_with_id() {
    let (app, _tmp) = test_app();

    let (status, body) = call(&app, Method::POST, "/api/v1/vlans", Some(prod())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_u64().unwrap() >= 1);
    assert_eq!(body["name"], "Prod");
    assert_eq!(body["vlan_id"], 100);
    assert_eq!(body["subnet"], "192.168.1.0/24");
    assert_eq!(body["gateway"], "192.168.1.1");
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn duplicate_vlan_id_conflicts() {
    let (app, _tmp) = test_app();
    call(&app, Method::POST, "/api/v1/vlans", Some(prod())).await;

    let other = vlan("Other", 100, "10.0.0.0/24", "10.0.0.1");
    let (status, body) = call(&app, Method::POST, "/api/v1/vlans", Some(other)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "VLAN_CONFLICT");
    assert_eq!(body["details"]["vlan_id"], 100);

    let (_, list) = call(&app, Method::GET, "/api/v1/vlans", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn gateway_outside_subnet_is_rejected() {
    let (app, _tmp) = test_app();

    let bad = vlan("Prod", 100, "192.168.1.0/24", "10.0.0.1");
    let (status, body) = call(&app, Method::POST, "/api/v1/vlans", Some(bad)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "REQUEST_VALIDATION_ERROR");

    let (_, list) = call(&app, Method::GET, "/api/v1/vlans", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_unknown_id_is_not_found() {
    let (app, _tmp) = test_app();

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/v1/vlans/999",
        Some(json!({ "name": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "VLAN_NOT_FOUND");
    assert_eq!(body["details"]["vlan_id"], 999);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let (app, _tmp) = test_app();
    let (_, created) = call(&app, Method::POST, "/api/v1/vlans", Some(prod())).await;
    let uri = format!("/api/v1/vlans/{}", created["id"]);

    let (status, body) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "VLAN_NOT_FOUND");
}

#[tokio::test]
async fn unwritable_storage_reports_unhealthy() {
    let tmp = TempDir::new().unwrap();
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let app = app_at(blocker.join("vlans.json"));

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNHEALTHY");
    assert_eq!(body["details"]["storage_healthy"], false);

    let (status, body) = call(&app, Method::POST, "/api/v1/vlans", Some(prod())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "STORAGE_ERROR");
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn ids_strictly_increase_across_deletes_and_restarts() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("vlans.json");
    let app = app_at(path.clone());

    let mut last = 0;
    for vlan_id in 1..=3u16 {
        let body = vlan("v", vlan_id, "10.0.0.0/24", "10.0.0.1");
        let (_, created) = call(&app, Method::POST, "/api/v1/vlans", Some(body)).await;
        let id = created["id"].as_u64().unwrap();
        assert!(id > last);
        last = id;
    }

    // Deleting the newest record must not free its id
    call(&app, Method::DELETE, &format!("/api/v1/vlans/{}", last), None).await;

    // A fresh process over the same file
    let app = app_at(path);
    let body = vlan("v", 10, "10.0.0.0/24", "10.0.0.1");
    let (_, created) = call(&app, Method::POST, "/api/v1/vlans", Some(body)).await;
    assert!(created["id"].as_u64().unwrap() > last);
}

#[tokio::test]
async fn vlan_id_stays_unique_through_updates() {
    let (app, _tmp) = test_app();
    call(&app, Method::POST, "/api/v1/vlans", Some(prod())).await;
    let (_, second) = call(
        &app,
        Method::POST,
        "/api/v1/vlans",
        Some(vlan("Dev", 200, "10.0.0.0/24", "10.0.0.1")),
    )
    .await;
    let uri = format!("/api/v1/vlans/{}", second["id"]);

    let (status, _) = call(&app, Method::PUT, &uri, Some(json!({ "vlan_id": 100 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Keeping its own VLAN ID is not a conflict
    let (status, _) = call(&app, Method::PUT, &uri, Some(json!({ "vlan_id": 200 }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = call(&app, Method::GET, "/api/v1/vlans", None).await;
    let mut vlan_ids: Vec<u64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["vlan_id"].as_u64().unwrap())
        .collect();
    vlan_ids.sort_unstable();
    vlan_ids.dedup();
    assert_eq!(vlan_ids.len(), 2);
}

#[tokio::test]
async fn gateway_range_is_inclusive() {
    let (app, _tmp) = test_app();

    let network = vlan("net", 10, "10.1.0.0/24", "10.1.0.0");
    let (status, _) = call(&app, Method::POST, "/api/v1/vlans", Some(network)).await;
    assert_eq!(status, StatusCode::CREATED);

    let broadcast = vlan("bcast", 11, "10.1.1.0/24", "10.1.1.255");
    let (status, _) = call(&app, Method::POST, "/api/v1/vlans", Some(broadcast)).await;
    assert_eq!(status, StatusCode::CREATED);

    let outside = vlan("out", 12, "10.1.2.0/24", "10.1.3.0");
    let (status, _) = call(&app, Method::POST, "/api/v1/vlans", Some(outside)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn records_survive_restart_unchanged() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("vlans.json");
    let app = app_at(path.clone());

    call(&app, Method::POST, "/api/v1/vlans", Some(prod())).await;
    call(
        &app,
        Method::POST,
        "/api/v1/vlans",
        Some(vlan("Dev", 200, "10.0.0.0/16", "10.0.255.254")),
    )
    .await;
    let (_, before) = call(&app, Method::GET, "/api/v1/vlans", None).await;

    let app = app_at(path.clone());
    let (_, after) = call(&app, Method::GET, "/api/v1/vlans", None).await;
    assert_eq!(before, after);

    // On disk it is a plain array of records
    let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(on_disk, before);
}

#[tokio::test]
async fn repeated_reads_are_identical() {
    let (app, _tmp) = test_app();
    let (_, created) = call(&app, Method::POST, "/api/v1/vlans", Some(prod())).await;
    let uri = format!("/api/v1/vlans/{}", created["id"]);

    let (_, first) = call(&app, Method::GET, &uri, None).await;
    let (_, second) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(first, second);
    assert_eq!(first, created);
}
