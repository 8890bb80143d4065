//! HTTP-level round-trip tests for the reqwest backend, against mockito.

use std::time::Duration;

use mockito::Matcher;
use serde_json::json;

use aosp_forge::api::{BackendClient, HttpBackend};
use aosp_forge::error::ApiError;
use aosp_forge::models::{
    AndroidVersion, BuildRequest, BuildVariant, ResolveMethod, ResolvedSource, SearchProvider,
    SourceDescriptor, SourceKind, TerminalOutcome,
};

const TIMEOUT: Duration = Duration::from_secs(2);

fn request() -> BuildRequest {
    let descriptor = |kind: SourceKind, value: &str| {
        SourceDescriptor::new(kind, &ResolvedSource::new(ResolveMethod::Url, value))
    };
    BuildRequest {
        device_name: "Lenovo K10 Note".to_string(),
        device_codename: "kunlun2".to_string(),
        android_version: AndroidVersion::V15,
        build_variant: BuildVariant::Userdebug,
        build_directory: "~/aosp".to_string(),
        device_tree: descriptor(SourceKind::DeviceTree, "https://host/device.git"),
        kernel: descriptor(SourceKind::Kernel, "https://host/kernel.git"),
        vendor: descriptor(SourceKind::Vendor, "https://host/vendor.git"),
    }
}

#[tokio::test]
async fn test_check_system_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/system/check")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"installed":["git","curl"],"missing":["repo"],"system_ready":false}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), TIMEOUT).unwrap();
    let readiness = backend.check_system().await.unwrap();

    assert!(!readiness.system_ready);
    assert_eq!(readiness.missing, vec!["repo".to_string()]);
    assert_eq!(readiness.installed.len(), 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_scopes_by_source_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/search/github")
        .match_body(Matcher::Json(json!({
            "query": "kunlun2",
            "source_type": "device"
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"status":"success","results":[
                {"name":"device_lenovo_kunlun2","full_name":"x/device_lenovo_kunlun2",
                 "description":"LOS device tree","clone_url":"https://github.com/x/device_lenovo_kunlun2.git",
                 "stars":12,"updated_at":"2025-11-01T00:00:00Z"}
            ]}"#,
        )
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), TIMEOUT).unwrap();
    let results = backend
        .search_sources(SearchProvider::Github, SourceKind::DeviceTree, "kunlun2".to_string())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].clone_url, "https://github.com/x/device_lenovo_kunlun2.git");
    assert_eq!(results[0].stars, 12);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gitlab_search_uses_gitlab_route() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/search/gitlab")
        .match_body(Matcher::PartialJson(json!({"source_type": "kernel"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results":[]}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), TIMEOUT).unwrap();
    let results = backend
        .search_sources(SearchProvider::Gitlab, SourceKind::Kernel, "sm6150".to_string())
        .await
        .unwrap();

    assert!(results.is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_build_posts_flattened_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/build/start")
        .match_body(Matcher::PartialJson(json!({
            "device_name": "Lenovo K10 Note",
            "device_codename": "kunlun2",
            "android_version": "15",
            "build_variant": "userdebug",
            "device_tree": {"source_type": "device", "method": "url"},
            "kernel": {"source_type": "kernel", "method": "url"},
            "vendor": {"source_type": "vendor", "method": "url"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"success","build_id":"66f","message":"Build started"}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), TIMEOUT).unwrap();
    let reply = backend.submit_build(request()).await.unwrap();

    assert!(reply.accepted());
    assert_eq!(reply.build_id.as_deref(), Some("66f"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejection_detail_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/build/start")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"A build is already in progress"}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), TIMEOUT).unwrap();
    let error = backend.submit_build(request()).await.unwrap_err();

    match error {
        ApiError::Rejected { code, detail } => {
            assert_eq!(code, 400);
            assert_eq!(detail, "A build is already in progress");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejection_without_body_falls_back_to_reason() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/build/status")
        .with_status(500)
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), TIMEOUT).unwrap();
    match backend.fetch_status().await.unwrap_err() {
        ApiError::Rejected { code, detail } => {
            assert_eq!(code, 500);
            assert!(!detail.is_empty());
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_status_and_logs() {
    let mut server = mockito::Server::new_async().await;
    let _status = server
        .mock("GET", "/api/build/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"active":true,"stage":"Syncing AOSP source","progress":15,"eta":"4h","build_id":"66f","logs":[]}"#,
        )
        .create_async()
        .await;
    let _logs = server
        .mock("GET", "/api/build/logs")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"logs":["[10:00:00] repo sync -c -j4"]}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), TIMEOUT).unwrap();

    let status = backend.fetch_status().await.unwrap();
    assert!(status.active);
    assert_eq!(status.progress, 15);
    assert_eq!(status.stage, "Syncing AOSP source");
    assert_eq!(status.eta, "4h");
    assert!(!status.is_terminal());

    let logs = backend.fetch_logs().await.unwrap();
    assert_eq!(logs, vec!["[10:00:00] repo sync -c -j4".to_string()]);
}

#[tokio::test]
async fn test_status_with_explicit_outcome_extension() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/build/status")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"active":false,"stage":"Build failed","progress":72,"outcome":"failed"}"#)
        .create_async()
        .await;

    let backend = HttpBackend::new(&server.url(), TIMEOUT).unwrap();
    let status = backend.fetch_status().await.unwrap();
    assert!(status.is_terminal());
    assert_eq!(status.terminal_outcome(), TerminalOutcome::Failed);
}

#[tokio::test]
async fn test_transport_error_on_unreachable_backend() {
    // Nothing listens here; the call must fail as a transport error, not
    // a panic.
    let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    match backend.ping().await.unwrap_err() {
        ApiError::Transport(_) => {}
        other => panic!("expected Transport, got {:?}", other),
    }
}
