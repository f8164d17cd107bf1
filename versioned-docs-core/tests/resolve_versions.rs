use mockall::predicate::*;
use mockall::Sequence;

use versioned_docs_core::contract::{MockTagSource, PageInfo, Tag, TagPage};
use versioned_docs_core::versions::{
    dedupe_versions, resolve_versions, ResolveError, TagPatterns, TAG_PAGE_SIZE,
};

fn tag(name: &str) -> Tag {
    Tag {
        id: format!("id-{name}"),
        name: name.to_string(),
    }
}

fn page(names: &[&str], end_cursor: Option<&str>, has_next_page: bool) -> TagPage {
    TagPage {
        page_info: PageInfo {
            end_cursor: end_cursor.map(str::to_string),
            has_next_page,
        },
        nodes: names.iter().map(|name| tag(name)).collect(),
    }
}

#[test]
fn test_tag_patterns_keep_release_tags_only() {
    let patterns = TagPatterns::new("apollo-server").unwrap();

    struct Case {
        name: &'static str,
        expected: bool,
    }
    let cases = vec![
        Case { name: "v2.1.0", expected: true },
        Case { name: "apollo-server@2.1.0", expected: true },
        Case { name: "v2.1.0-alpha", expected: false },
        Case { name: "random", expected: false },
        Case { name: "2.1.0", expected: false },
        Case { name: "v2.1", expected: false },
        Case { name: "apollo-server-core@2.1.0", expected: false },
        Case { name: "other@2.1.0", expected: false },
        Case { name: "v10.20.30", expected: true },
    ];

    for case in cases {
        assert_eq!(
            patterns.matches(case.name),
            case.expected,
            "unexpected match result for tag {}",
            case.name
        );
    }
}

#[test]
fn test_repository_name_is_matched_literally() {
    let patterns = TagPatterns::new("docs.site").unwrap();
    assert!(patterns.matches("docs.site@1.0.0"));
    assert!(!patterns.matches("docsXsite@1.0.0"));
}

#[test]
fn test_version_key_is_major_version() {
    let patterns = TagPatterns::new("apollo-server").unwrap();
    assert_eq!(patterns.version_key("v2.1.0").as_deref(), Some("2"));
    assert_eq!(
        patterns.version_key("apollo-server@2.4.3").as_deref(),
        Some("2")
    );
    assert_eq!(patterns.version_key("v10.0.1").as_deref(), Some("10"));
    assert_eq!(patterns.version_key("random"), None);
}

#[test]
fn test_dedupe_keeps_first_tag_per_version() {
    let patterns = TagPatterns::new("apollo-server").unwrap();
    // Newest first, as the tag query orders them.
    let tags = vec![
        tag("apollo-server@2.2.0"),
        tag("v2.1.0"),
        tag("v1.4.0"),
        tag("apollo-server@1.3.0"),
    ];

    let versions = dedupe_versions(&patterns, &tags);

    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].id, "2");
    assert_eq!(versions[0].tag, "apollo-server@2.2.0");
    assert_eq!(versions[0].base_path, "/v2");
    assert_eq!(versions[1].id, "1");
    assert_eq!(versions[1].tag, "v1.4.0");
    assert_eq!(versions[1].base_path, "/v1");
}

#[tokio::test]
async fn test_resolve_filters_and_dedupes_across_pages() {
    let mut source = MockTagSource::new();
    let mut seq = Sequence::new();

    source
        .expect_query_tags()
        .with(eq("apollographql"), eq("apollo-server"), eq(None::<String>), eq(TAG_PAGE_SIZE))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _, _| {
            Ok(page(
                &["v2.1.0", "apollo-server@2.1.0", "v2.1.0-alpha", "random"],
                Some("cursor-1"),
                true,
            ))
        });
    source
        .expect_query_tags()
        .with(
            eq("apollographql"),
            eq("apollo-server"),
            eq(Some("cursor-1".to_string())),
            eq(TAG_PAGE_SIZE),
        )
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _, _| Ok(page(&["v1.0.0", "v2.0.0"], Some("cursor-2"), false)));

    let versions = resolve_versions(&source, "apollographql", "apollo-server")
        .await
        .expect("resolution should succeed");

    let summary: Vec<(&str, &str)> = versions
        .iter()
        .map(|v| (v.id.as_str(), v.tag.as_str()))
        .collect();
    assert_eq!(summary, vec![("2", "v2.1.0"), ("1", "v1.0.0")]);
}

#[tokio::test]
async fn test_pagination_issues_one_query_per_hundred_tags() {
    let total_tags: usize = 250;
    let names: Vec<String> = (0..total_tags).map(|i| format!("v{i}.0.0")).collect();
    let pages: Vec<TagPage> = names
        .chunks(TAG_PAGE_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            let refs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let last = (index + 1) * TAG_PAGE_SIZE >= total_tags;
            page(&refs, Some(format!("cursor-{index}").as_str()), !last)
        })
        .collect();
    let expected_queries = total_tags.div_ceil(TAG_PAGE_SIZE);
    assert_eq!(pages.len(), expected_queries);

    let mut source = MockTagSource::new();
    let mut remaining = pages.into_iter();
    source
        .expect_query_tags()
        .times(expected_queries)
        .returning(move |_, _, _, _| Ok(remaining.next().expect("no more pages")));

    let versions = resolve_versions(&source, "owner", "repo")
        .await
        .expect("resolution should succeed");

    assert_eq!(versions.len(), total_tags);
    assert_eq!(versions[0].tag, "v0.0.0");
    assert_eq!(versions[249].tag, "v249.0.0");
}

#[tokio::test]
async fn test_query_failure_aborts_resolution() {
    let mut source = MockTagSource::new();
    let mut seq = Sequence::new();
    source
        .expect_query_tags()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _, _| Ok(page(&["v1.0.0"], Some("cursor-1"), true)));
    source
        .expect_query_tags()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _, _, _| Err("rate limited".into()));

    let result = resolve_versions(&source, "owner", "repo").await;

    match result {
        Err(ResolveError::Query { owner, repo, source }) => {
            assert_eq!(owner, "owner");
            assert_eq!(repo, "repo");
            assert_eq!(source.to_string(), "rate limited");
        }
        other => panic!("expected query failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_end_cursor_stops_pagination() {
    let mut source = MockTagSource::new();
    source
        .expect_query_tags()
        .with(eq("owner"), eq("repo"), eq(None::<String>), eq(TAG_PAGE_SIZE))
        .times(1)
        .returning(|_, _, _, _| Ok(page(&["v3.0.0", "v2.0.0"], None, true)));

    let versions = resolve_versions(&source, "owner", "repo")
        .await
        .expect("resolution should succeed");

    let ids: Vec<&str> = versions.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "2"]);
}
