//! Integration tests for view stacks declared as JSON.

use fsview::{FsError, ViewSpec};
use fsview_testutil::{assert_content, assert_not_exists, check_fs};
use serde_json::json;

#[tokio::test]
async fn local_site_with_memory_overrides() {
    let site = tempfile::tempdir().unwrap();
    std::fs::write(site.path().join("index.html"), "<h1>hi</h1>").unwrap();
    std::fs::write(site.path().join("robots.txt"), "Disallow: /").unwrap();

    let config = json!({
        "type": "union",
        "members": [
            {
                "type": "memory",
                "files": { "static/robots.txt": "User-agent: *" }
            },
            {
                "type": "prefix",
                "prefix": "static",
                "inner": { "type": "local", "root": site.path() }
            }
        ]
    });
    let fs = ViewSpec::from_json(&config.to_string()).unwrap().build().unwrap();

    assert_content(fs.as_ref(), "static/robots.txt", "User-agent: *").await;
    assert_content(fs.as_ref(), "static/index.html", "<h1>hi</h1>").await;
    assert_not_exists(fs.as_ref(), "index.html").await;

    let names: Vec<String> = fs
        .read_dir("static")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.name)
        .collect();
    assert_eq!(names, ["robots.txt", "index.html"]);

    let report = check_fs(fs, &["static/index.html", "static/robots.txt"]).await;
    assert!(report.all_passed(), "{report}");
}

#[tokio::test]
async fn sub_of_a_prefix() {
    let config = r#"{
        "type": "sub",
        "dir": "srv",
        "inner": {
            "type": "prefix",
            "prefix": "srv/www",
            "inner": { "type": "memory", "files": { "index.html": "home" } }
        }
    }"#;
    let fs = ViewSpec::from_json(config).unwrap().build().unwrap();
    assert_content(fs.as_ref(), "www/index.html", "home").await;
    assert_not_exists(fs.as_ref(), "srv").await;

    let report = check_fs(fs, &["www/index.html"]).await;
    assert!(report.all_passed(), "{report}");
}

#[test]
fn sub_outside_a_prefix_fails_at_build() {
    let spec = ViewSpec::from_json(
        r#"{ "type": "sub", "dir": "elsewhere",
             "inner": { "type": "prefix", "prefix": "srv", "inner": { "type": "memory" } } }"#,
    )
    .unwrap();
    let err = spec.build().err().unwrap();
    assert!(err.is_not_found(), "{err}");
}

#[test]
fn unknown_layer_type_is_rejected() {
    let err = ViewSpec::from_json(r#"{ "type": "overlayfs", "lower": [] }"#).unwrap_err();
    assert!(matches!(err, FsError::Config(_)));
    assert!(err.to_string().contains("overlayfs"), "{err}");
}
