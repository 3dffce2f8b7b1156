//! Config query routes against a running service.

use reqwest::StatusCode;

mod common;

use common::{start_app, write_snapshot, STUB};

#[tokio::test]
async fn test_get_config() {
    let dir = tempfile::tempdir().unwrap();
    let app = start_app(vec![write_snapshot(dir.path(), "config.yaml", STUB)], 60).await;

    let res = app.get("/configs/app/cluster/ns").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.text().await.unwrap(),
        r#"{"appId":"app","cluster":"cluster","namespaceName":"ns","releaseKey":"abc","configurations":{"mysql":"mysql://root@localhost/mysql"}}"#
    );

    let res = app.get("/configs/app/cluster/ns?releaseKey=abc").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.get("/configs/app/cluster/ns?releaseKey=old").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.text().await.unwrap().is_empty());

    let res = app.get("/configs/app/cluster/ns404").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.text().await.unwrap().is_empty());

    app.stop().await;
}

#[tokio::test]
async fn test_properties_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let suffixed = STUB.replace("    ns:", "    ns.properties:");
    let app = start_app(vec![write_snapshot(dir.path(), "config.yaml", &suffixed)], 60).await;

    for path in ["/configs/app/cluster/ns", "/configs/app/cluster/ns.properties"] {
        let res = app.get(path).await;
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["releaseKey"], "abc");
    }

    app.stop().await;
}

#[tokio::test]
async fn test_first_file_wins() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_snapshot(dir.path(), "first.yaml", STUB);
    let second = write_snapshot(dir.path(), "second.json", &STUB_JSON.replace("abc", "def"));
    let app = start_app(vec![first, second], 60).await;

    let body: serde_json::Value = app.get("/configs/app/cluster/ns").await.json().await.unwrap();
    assert_eq!(body["releaseKey"], "abc");

    let body: serde_json::Value = app.get("/configs/app2/cluster/ns").await.json().await.unwrap();
    assert_eq!(body["releaseKey"], "def");

    app.stop().await;
}

const STUB_JSON: &str = r#"{"app2":{"cluster":{"ns":{"releaseKey":"abc","configurations":{"k":"v"}}}}}"#;

#[tokio::test]
async fn test_flat_services_health() {
    let dir = tempfile::tempdir().unwrap();
    let app = start_app(vec![write_snapshot(dir.path(), "config.yaml", STUB)], 60).await;
    let port = app.app.http_addr().port();

    let res = app.get("/configfiles/json/app/cluster/ns").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"mysql":"mysql://root@localhost/mysql"}"#);

    let res = app.get("/configfiles/json/app/cluster/ns404").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: serde_json::Value = app.get("/services/config").await.json().await.unwrap();
    assert_eq!(body[0]["appName"], "APOLLO-CONFIGSERVICE");
    assert_eq!(body[0]["homepageUrl"], format!("http://localhost:{port}/"));

    let res = app.get("/healthz").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "OK");

    let res = app.get("/not/a/route").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "path not found");

    app.stop().await;
}

#[tokio::test]
async fn test_admin_routes() {
    let dir = tempfile::tempdir().unwrap();
    let app = start_app(vec![write_snapshot(dir.path(), "config.yaml", STUB)], 60).await;

    let res = app
        .client
        .patch(format!("{}/ctrl/logging?level=debug", app.admin_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .client
        .post(format!("{}/logging?level=verbose", app.admin_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let status: serde_json::Value = app
        .client
        .get(format!("{}/admin/status", app.admin_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["outstanding_polls"], 0);
    assert_eq!(status["watchers"][0]["namespaces"], 1);

    // Admin routes are not served on the public listener.
    let res = app.get("/admin/status").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    app.stop().await;
}
