//! Version resolution: paginated tag discovery, tag filtering and per-version de-duplication.
//!
//! Tags are requested newest tag commit first. A tag qualifies when it is
//! named `v<x.y.z>` or `<repo>@<x.y.z>`; the first qualifying tag seen for a
//! version key becomes that version's authoritative tag.
//!
//! The version key is the first numeric group of the `x.y.z` token, so
//! `2.1.0` and `2.4.3` collapse to the same version `2`.

use std::collections::HashSet;

use futures::stream::{self, TryStreamExt};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::contract::{FetchError, ResolvedVersion, Tag, TagPage, TagSource};

/// Tags requested per query.
pub const TAG_PAGE_SIZE: usize = 100;

const VERSION_SEGMENT: &str = r"(\d+)(\.\d+){2}";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("tag query for {owner}/{repo} failed: {source}")]
    Query {
        owner: String,
        repo: String,
        #[source]
        source: FetchError,
    },
    #[error("invalid tag pattern for repository {repo}: {source}")]
    Pattern {
        repo: String,
        #[source]
        source: regex::Error,
    },
}

/// The two accepted tag naming schemes for one repository.
#[derive(Debug, Clone)]
pub struct TagPatterns {
    patterns: [Regex; 2],
    version: Regex,
}

impl TagPatterns {
    pub fn new(repo: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: [
                Regex::new(&format!("^v{VERSION_SEGMENT}$"))?,
                Regex::new(&format!("^{}@{VERSION_SEGMENT}$", regex::escape(repo)))?,
            ],
            version: Regex::new(VERSION_SEGMENT)?,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }

    /// Version key of a tag name: the first numeric group of its `x.y.z` token.
    pub fn version_key(&self, name: &str) -> Option<String> {
        self.version
            .captures(name)
            .and_then(|captures| captures.get(1))
            .map(|group| group.as_str().to_string())
    }
}

/// Reduces qualifying tags (newest first) to one version per key, keeping first-seen order.
pub fn dedupe_versions(patterns: &TagPatterns, tags: &[Tag]) -> Vec<ResolvedVersion> {
    let (versions, _) = tags.iter().fold(
        (Vec::new(), HashSet::new()),
        |(mut versions, mut seen): (Vec<ResolvedVersion>, HashSet<String>), tag| {
            if !patterns.matches(&tag.name) {
                return (versions, seen);
            }
            if let Some(key) = patterns.version_key(&tag.name) {
                if seen.insert(key.clone()) {
                    versions.push(ResolvedVersion {
                        base_path: format!("/v{key}"),
                        id: key,
                        tag: tag.name.clone(),
                    });
                } else {
                    debug!(tag = %tag.name, version = %key, "Dropped duplicate tag for version");
                }
            }
            (versions, seen)
        },
    );
    versions
}

enum Cursor {
    Start,
    After(String),
    Done,
}

/// Streams every qualifying tag, one page per query, until a page reports no next page
/// or no cursor to continue from.
pub async fn fetch_tags<T>(
    source: &T,
    owner: &str,
    repo: &str,
    patterns: &TagPatterns,
) -> Result<Vec<Tag>, FetchError>
where
    T: TagSource + ?Sized,
{
    let pages = stream::try_unfold(Cursor::Start, move |cursor| async move {
        let after = match cursor {
            Cursor::Start => None,
            Cursor::After(after) => Some(after),
            Cursor::Done => return Ok::<_, FetchError>(None),
        };
        let page: TagPage = source.query_tags(owner, repo, after, TAG_PAGE_SIZE).await?;
        debug!(
            tags = page.nodes.len(),
            has_next_page = page.page_info.has_next_page,
            "Received tag page"
        );
        let next = match (page.page_info.has_next_page, page.page_info.end_cursor.clone()) {
            (true, Some(cursor)) => Cursor::After(cursor),
            (true, None) => {
                warn!("Tag page reports a next page without a cursor, stopping pagination");
                Cursor::Done
            }
            (false, _) => Cursor::Done,
        };
        Ok::<_, FetchError>(Some((page.nodes, next)))
    });

    pages
        .try_fold(Vec::new(), move |mut tags: Vec<Tag>, nodes| async move {
            tags.extend(nodes.into_iter().filter(|tag| patterns.matches(&tag.name)));
            Ok(tags)
        })
        .await
}

/// Resolves the ordered list of versions of `owner/repo`. Any query failure is fatal.
pub async fn resolve_versions<T>(
    source: &T,
    owner: &str,
    repo: &str,
) -> Result<Vec<ResolvedVersion>, ResolveError>
where
    T: TagSource + ?Sized,
{
    let patterns = TagPatterns::new(repo).map_err(|source| ResolveError::Pattern {
        repo: repo.to_string(),
        source,
    })?;
    let tags = fetch_tags(source, owner, repo, &patterns)
        .await
        .map_err(|source| ResolveError::Query {
            owner: owner.to_string(),
            repo: repo.to_string(),
            source,
        })?;
    let versions = dedupe_versions(&patterns, &tags);
    info!(
        owner,
        repo,
        qualifying_tags = tags.len(),
        versions = versions.len(),
        "Resolved versions"
    );
    Ok(versions)
}
