use std::sync::Arc;

use serde_json::Value;
use tempfile::tempdir;
use versioned_docs::sink::JsonPageWriter;
use versioned_docs_core::contract::{
    Document, Heading, Page, PageContext, PageSink, VersionBundle,
};

fn bundle(id: &str, tag: &str) -> Arc<VersionBundle> {
    Arc::new(VersionBundle {
        id: id.to_string(),
        tag: tag.to_string(),
        base_path: format!("/v{id}"),
        contents: vec![Document {
            path: format!("/v{id}"),
            source_path: "docs/source/index.md".to_string(),
            name: "index.md".to_string(),
            sha: String::new(),
            frontmatter: Default::default(),
            html: "<p>hi</p>".to_string(),
        }],
    })
}

fn page(path: &str) -> Page {
    let v2 = bundle("2", "v2.1.0");
    let v1 = bundle("1", "v1.0.0");
    let mut frontmatter = serde_json::Map::new();
    frontmatter.insert("title".to_string(), Value::from("Guide"));
    Page {
        path: path.to_string(),
        component: "src/templates/docs".to_string(),
        context: PageContext {
            frontmatter,
            html: r#"<h2 id="setup">Setup</h2>"#.to_string(),
            headings: vec![Heading {
                id: "setup".to_string(),
                text: "Setup".to_string(),
            }],
            version: Arc::clone(&v2),
            versions: Arc::from(vec![v2, v1]),
        },
    }
}

#[tokio::test]
async fn test_writes_page_as_index_json() {
    let dir = tempdir().unwrap();
    let writer = JsonPageWriter::new(dir.path());

    writer
        .create_page(page("/v2/guides/setup"))
        .await
        .expect("page should be written");

    let written = dir.path().join("v2/guides/setup/index.json");
    let json: Value = serde_json::from_slice(&std::fs::read(&written).unwrap()).unwrap();
    assert_eq!(json["path"], "/v2/guides/setup");
    assert_eq!(json["component"], "src/templates/docs");
    assert_eq!(json["frontmatter"]["title"], "Guide");
    assert_eq!(json["headings"][0]["id"], "setup");
    assert_eq!(json["version"]["id"], "2");
    assert_eq!(json["version"]["basePath"], "/v2");
    let tags: Vec<&str> = json["versions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["tag"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["v2.1.0", "v1.0.0"]);
    assert!(json["version"].get("contents").is_none());
}

#[test]
fn test_target_file_mapping() {
    let writer = JsonPageWriter::new("/out");

    assert_eq!(
        writer.target_file("/v2").unwrap(),
        std::path::PathBuf::from("/out/v2/index.json")
    );
    assert_eq!(
        writer.target_file("/").unwrap(),
        std::path::PathBuf::from("/out/index.json")
    );
    assert!(writer.target_file("/v2/../../etc").is_err());
}

#[tokio::test]
async fn test_rejects_escaping_paths() {
    let dir = tempdir().unwrap();
    let writer = JsonPageWriter::new(dir.path().join("site"));

    let result = writer.create_page(page("/v2/../../outside")).await;

    assert!(result.is_err());
    assert!(!dir.path().join("outside").exists());
}
