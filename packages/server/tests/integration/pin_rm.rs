use std::sync::Arc;

use serde_json::json;

use crate::common::{BackendMode, FailOn, FailingStore, TestApp, routes};

#[tokio::test]
async fn removal_without_credentials_is_rejected() {
    let app = TestApp::spawn().await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app.post(&routes::pin_rm(&["pin-hash-1"]), None).await;

    assert_eq!(res.status, 401);
    assert!(app.is_pinned("john", "pin-hash-1").await);
}

#[tokio::test]
async fn unknown_query_parameter_is_rejected() {
    let app = TestApp::spawn().await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(
            &format!("{}&recursive=true", routes::pin_rm(&["pin-hash-1"])),
            Some("john"),
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "only arg arguments are allowed");
    assert!(app.is_pinned("john", "pin-hash-1").await);
    assert!(!app.backend.invoked(routes::PIN_RM));
}

#[tokio::test]
async fn removal_without_ids_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app.post(routes::PIN_RM, Some("john")).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["message"], "argument \"ipfs-path\" is required");
}

#[tokio::test]
async fn sole_owner_unpins_on_the_node() {
    let app = TestApp::spawn().await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;

    assert_eq!(res.status, 200, "pin rm failed: {}", res.text);
    assert_eq!(res.body, json!({"Pins": ["pin-hash-1"]}));
    assert!(!app.is_pinned("john", "pin-hash-1").await);
    assert_eq!(app.backend.removed(), ["pin-hash-1"]);
}

#[tokio::test]
async fn content_pinned_by_another_user_stays_on_the_node() {
    let app = TestApp::spawn().await;
    app.seed_pin("john", "pin-hash-1").await;
    app.seed_pin("shawn", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;

    assert_eq!(res.status, 200, "pin rm failed: {}", res.text);
    assert_eq!(res.text, r#"{"Pins":["pin-hash-1"]}"#);
    assert!(!app.is_pinned("john", "pin-hash-1").await);
    assert!(app.is_pinned("shawn", "pin-hash-1").await);
    assert!(!app.backend.invoked(routes::PIN_RM));
}

#[tokio::test]
async fn only_unshared_ids_are_forwarded() {
    let app = TestApp::spawn().await;
    for id in ["h1", "h2", "h3"] {
        app.seed_pin("john", id).await;
    }
    app.seed_pin("shawn", "h2").await;

    let res = app
        .post(&routes::pin_rm(&["h3", "h2", "h1"]), Some("john"))
        .await;

    assert_eq!(res.status, 200, "pin rm failed: {}", res.text);
    assert_eq!(res.body, json!({"Pins": ["h3", "h2", "h1"]}));
    assert_eq!(app.backend.queries(routes::PIN_RM), ["arg=h3&arg=h1"]);
    assert_eq!(app.backend.removed(), ["h1", "h3"]);
    assert!(app.is_pinned("shawn", "h2").await);
    for id in ["h1", "h2", "h3"] {
        assert!(!app.is_pinned("john", id).await);
    }
}

#[tokio::test]
async fn unowned_content_is_not_found() {
    let app = TestApp::spawn().await;
    app.seed_pin("shawn", "pin-hash-2").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-2"]), Some("john"))
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
    assert_eq!(
        res.body["message"],
        "not pinned or pinned indirectly: pin-hash-2"
    );
    assert!(app.is_pinned("shawn", "pin-hash-2").await);
    assert!(!app.backend.invoked(routes::PIN_RM));
}

#[tokio::test]
async fn one_unowned_id_fails_the_whole_request() {
    let app = TestApp::spawn().await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1", "pin-hash-2"]), Some("john"))
        .await;

    assert_eq!(res.status, 404);
    assert!(app.is_pinned("john", "pin-hash-1").await);
    assert!(!app.backend.invoked(routes::PIN_RM));
}

#[tokio::test]
async fn removing_twice_is_not_found() {
    let app = TestApp::spawn().await;
    app.seed_pin("john", "pin-hash-1").await;

    let first = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;
    assert_eq!(first.status, 200);

    let second = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;
    assert_eq!(second.status, 404);
    assert_eq!(app.backend.removed(), ["pin-hash-1"]);
}

#[tokio::test]
async fn repeated_ids_are_echoed_but_unpinned_once() {
    let app = TestApp::spawn().await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1", "pin-hash-1"]), Some("john"))
        .await;

    assert_eq!(res.status, 200, "pin rm failed: {}", res.text);
    assert_eq!(res.body, json!({"Pins": ["pin-hash-1", "pin-hash-1"]}));
    assert_eq!(app.backend.queries(routes::PIN_RM), ["arg=pin-hash-1"]);
}

#[tokio::test]
async fn unreachable_backend_still_removes_locally() {
    let app = TestApp::spawn_with_unreachable_backend().await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;

    assert_eq!(res.status, 200, "pin rm failed: {}", res.text);
    assert_eq!(res.body, json!({"Pins": ["pin-hash-1"]}));
    assert!(!app.is_pinned("john", "pin-hash-1").await);
    assert_eq!(app.metrics.error_count("pin_rm", "backend_request"), 1);
}

#[tokio::test]
async fn backend_failure_is_relayed_after_local_removal() {
    let app = TestApp::spawn_with(BackendMode::Error).await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.text, "error");
    assert!(!app.is_pinned("john", "pin-hash-1").await);
}

#[tokio::test]
async fn unreadable_backend_error_relays_its_status() {
    let app = TestApp::spawn_with_truncating_backend().await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.text, "");
    assert!(!app.is_pinned("john", "pin-hash-1").await);
    assert_eq!(app.metrics.error_count("pin_rm", "discard_body"), 1);
}

#[tokio::test]
async fn ownership_lookup_failure_skips_the_node() {
    let store = Arc::new(FailingStore::new(FailOn::ListByContentIds));
    let app = TestApp::spawn_with_store(store).await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
    assert_eq!(app.metrics.error_count("pin_rm", "store"), 1);
    assert!(!app.backend.invoked(routes::PIN_RM));
    assert!(app.is_pinned("john", "pin-hash-1").await);
}

#[tokio::test]
async fn deactivation_failure_skips_the_node() {
    let store = Arc::new(FailingStore::new(FailOn::Deactivate));
    let app = TestApp::spawn_with_store(store).await;
    app.seed_pin("john", "pin-hash-1").await;

    let res = app
        .post(&routes::pin_rm(&["pin-hash-1"]), Some("john"))
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
    assert_eq!(app.metrics.error_count("pin_rm", "store"), 1);
    assert!(!app.backend.invoked(routes::PIN_RM));
    assert!(app.is_pinned("john", "pin-hash-1").await);
}
