// Parses remote URLs and reads the origin of a throwaway repository created with the git CLI.

use std::process::Command;

use tempfile::tempdir;
use versioned_docs_core::origin::{discover_origin, parse_remote_url, OriginError};

#[test]
fn test_parse_remote_url_table_driven() {
    struct TestCase {
        url: &'static str,
        expected: Option<(&'static str, &'static str)>,
    }
    let cases = vec![
        TestCase {
            url: "https://github.com/apollographql/apollo-server.git",
            expected: Some(("apollographql", "apollo-server")),
        },
        TestCase {
            url: "git@github.com:apollographql/apollo-server.git",
            expected: Some(("apollographql", "apollo-server")),
        },
        TestCase {
            url: "https://github.com/apollographql/apollo-server",
            expected: Some(("apollographql", "apollo-server")),
        },
        TestCase {
            url: "https://github.com/acme/docs.site.git\n",
            expected: Some(("acme", "docs.site")),
        },
        TestCase {
            url: "not a remote",
            expected: None,
        },
    ];

    for case in cases {
        let parsed = parse_remote_url(case.url);
        let actual = parsed
            .as_ref()
            .map(|identity| (identity.owner.as_str(), identity.name.as_str()));
        assert_eq!(actual, case.expected, "parsing {:?}", case.url);
    }
}

fn git(dir: &std::path::Path, args: &[&str]) {
    let status = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .status()
        .expect("git should be installed");
    assert!(status.success(), "git {args:?} failed");
}

#[test]
fn test_discover_origin_reads_remote() {
    let dir = tempdir().unwrap();
    git(dir.path(), &["init", "--quiet"]);
    git(
        dir.path(),
        &[
            "remote",
            "add",
            "origin",
            "git@github.com:apollographql/apollo-server.git",
        ],
    );

    let identity = discover_origin(dir.path()).expect("origin should be discovered");
    assert_eq!(identity.owner, "apollographql");
    assert_eq!(identity.name, "apollo-server");
}

#[test]
fn test_discover_origin_without_remote() {
    let dir = tempdir().unwrap();
    git(dir.path(), &["init", "--quiet"]);

    let result = discover_origin(dir.path());
    assert!(matches!(result, Err(OriginError::NoOrigin(_))));
}
