use std::sync::Arc;

use crate::common::backend::{hash, wrapped_hash};
use crate::common::{BackendMode, FailOn, FailingStore, TestApp, file, routes};

#[tokio::test]
async fn upload_without_credentials_is_rejected() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(routes::ADD, None, &[file("test.jpg", 1024)])
        .await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "AUTH_MISSING");
    assert!(res.headers.contains_key("www-authenticate"));
    assert!(!app.backend.invoked(routes::ADD));
    assert!(app.records().await.is_empty());
}

#[tokio::test]
async fn backend_failure_is_relayed_and_nothing_is_recorded() {
    let app = TestApp::spawn_with(BackendMode::Error).await;

    let res = app
        .upload(routes::ADD, Some("test"), &[file("test.jpg", 1024)])
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.text, "error");
    assert!(app.records().await.is_empty());
}

#[tokio::test]
async fn unreachable_backend_is_a_bad_gateway() {
    let app = TestApp::spawn_with_unreachable_backend().await;

    let res = app
        .upload(routes::ADD, Some("test"), &[file("test.jpg", 1024)])
        .await;

    assert_eq!(res.status, 502);
    assert_eq!(res.body["code"], "BAD_GATEWAY");
    assert!(app.records().await.is_empty());
}

#[tokio::test]
async fn unknown_query_parameter_is_rejected_before_forwarding() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(
            &format!("{}?pin=false", routes::ADD),
            Some("test"),
            &[file("test.jpg", 1024)],
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(!app.backend.invoked(routes::ADD));
    assert!(app.records().await.is_empty());
}

#[tokio::test]
async fn missing_credentials_win_over_bad_parameters() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(
            &format!("{}?pin=false", routes::ADD),
            None,
            &[file("test.jpg", 1024)],
        )
        .await;

    assert_eq!(res.status, 401);
}

#[tokio::test]
async fn single_file_is_recorded_and_response_relayed() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(routes::ADD, Some("test"), &[file("test.jpg", 1024)])
        .await;

    assert_eq!(res.status, 200, "add failed: {}", res.text);
    let messages = res.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["Hash"], hash("test.jpg"));
    assert_eq!(res.headers["x-chunked-output"], "1");

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].identity, "test");
    assert_eq!(records[0].content_id, hash("test.jpg"));
    assert_eq!(records[0].label, "test.jpg");
    assert_eq!(records[0].byte_size, 1024);
    assert!(records[0].is_active());
}

#[tokio::test]
async fn multiple_files_record_the_last_entry() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(
            routes::ADD,
            Some("test"),
            &[file("a.txt", 10), file("b.txt", 20)],
        )
        .await;

    assert_eq!(res.status, 200, "add failed: {}", res.text);
    assert_eq!(res.messages().len(), 2);

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content_id, hash("b.txt"));
    assert_eq!(records[0].label, "b.txt");
    assert_eq!(records[0].byte_size, 20);
}

#[tokio::test]
async fn wrapped_upload_records_the_directory() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(
            &format!("{}?wrap-with-directory=true", routes::ADD),
            Some("test"),
            &[file("a.txt", 10), file("b.txt", 20)],
        )
        .await;

    assert_eq!(res.status, 200, "add failed: {}", res.text);
    assert_eq!(res.messages().len(), 3);
    assert_eq!(
        app.backend.queries(routes::ADD),
        ["wrap-with-directory=true"]
    );

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].content_id, wrapped_hash("a.txt"));
    assert_eq!(records[0].label, "a.txt (wrapped)");
    assert_eq!(records[0].byte_size, 30);
}

#[tokio::test]
async fn valueless_wrap_flag_counts_as_set() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(
            &format!("{}?wrap-with-directory", routes::ADD),
            Some("test"),
            &[file("a.txt", 10)],
        )
        .await;

    assert_eq!(res.status, 200, "add failed: {}", res.text);
    let records = app.records().await;
    assert_eq!(records[0].content_id, wrapped_hash("a.txt"));
    assert_eq!(records[0].label, "a.txt (wrapped)");
}

#[tokio::test]
async fn wrap_flag_set_to_false_is_not_wrapped() {
    let app = TestApp::spawn().await;

    let res = app
        .upload(
            &format!("{}?wrap-with-directory=false", routes::ADD),
            Some("test"),
            &[file("a.txt", 10)],
        )
        .await;

    assert_eq!(res.status, 200, "add failed: {}", res.text);
    let records = app.records().await;
    assert_eq!(records[0].content_id, hash("a.txt"));
    assert_eq!(records[0].label, "a.txt");
}

#[tokio::test]
async fn reupload_keeps_one_record_and_its_creation_time() {
    let app = TestApp::spawn().await;

    let first = app
        .upload(routes::ADD, Some("john"), &[file("first.jpg", 1024)])
        .await;
    assert_eq!(first.status, 200);
    let created = app.records().await[0].created_at;

    let again = app
        .upload(routes::ADD, Some("john"), &[file("first.jpg", 1024)])
        .await;
    assert_eq!(again.status, 200);

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].created_at, created);
    assert!(records[0].is_active());
}

#[tokio::test]
async fn same_content_from_two_users_is_owned_independently() {
    let app = TestApp::spawn().await;

    for user in ["john", "shawn"] {
        let res = app
            .upload(routes::ADD, Some(user), &[file("first.jpg", 1024)])
            .await;
        assert_eq!(res.status, 200);
    }

    let records = app.records().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].identity, "john");
    assert_eq!(records[1].identity, "shawn");
    assert_eq!(records[0].content_id, records[1].content_id);
}

#[tokio::test]
async fn reupload_after_removal_reactivates() {
    let app = TestApp::spawn().await;

    app.upload(routes::ADD, Some("john"), &[file("first.jpg", 1024)])
        .await;
    let created = app.records().await[0].created_at;

    let rm = app
        .post(&routes::pin_rm(&[&hash("first.jpg")]), Some("john"))
        .await;
    assert_eq!(rm.status, 200, "pin rm failed: {}", rm.text);
    assert!(!app.records().await[0].is_active());

    app.upload(routes::ADD, Some("john"), &[file("first.jpg", 1024)])
        .await;

    let records = app.records().await;
    assert_eq!(records.len(), 1);
    assert!(records[0].is_active());
    assert_eq!(records[0].created_at, created);
}

#[tokio::test]
async fn malformed_backend_response_is_a_decode_error() {
    let app = TestApp::spawn_with(BackendMode::Malformed).await;

    let res = app
        .upload(routes::ADD, Some("john"), &[file("a.txt", 16)])
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "DECODE_ERROR");
    assert_eq!(app.metrics.error_count("add", "unmarshal"), 1);
    assert!(app.records().await.is_empty());
}

#[tokio::test]
async fn empty_backend_response_is_a_decode_error() {
    let app = TestApp::spawn_with(BackendMode::Empty).await;

    let res = app
        .upload(routes::ADD, Some("john"), &[file("a.txt", 16)])
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "DECODE_ERROR");
    assert_eq!(res.body["message"], "no response message");
    assert_eq!(app.metrics.error_count("add", "no_message"), 1);
    assert!(app.records().await.is_empty());
}

#[tokio::test]
async fn store_failure_after_upload_is_an_internal_error() {
    let app = TestApp::spawn_with_store(Arc::new(FailingStore::new(FailOn::Upsert))).await;

    let res = app
        .upload(routes::ADD, Some("john"), &[file("a.txt", 16)])
        .await;

    assert_eq!(res.status, 500);
    assert_eq!(res.body["code"], "INTERNAL_ERROR");
    assert_eq!(app.metrics.error_count("add", "store"), 1);
    assert!(app.backend.invoked(routes::ADD));
    assert!(app.records().await.is_empty());
}
