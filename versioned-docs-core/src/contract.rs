#![allow(unused)]

//! # contract: data model and trait seams of the documentation pipeline
//!
//! The pipeline talks to three external collaborators, each behind a trait so
//! production clients and test mocks are interchangeable:
//! - [`ContentsApi`]: the hosted-git "contents" endpoint (directory listings and files)
//! - [`TagSource`]: the paginated tag query
//! - [`PageSink`]: the site builder that pages are registered with
//!
//! All trait methods are async and return boxed `Send + Sync` errors.
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall`; mocks are exported behind the
//!   default `test-export-mocks` feature for use in integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};

/// Error type at the fetch seam (simple boxed error).
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Error type at the page registration seam.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// A named pointer into repository history, as returned by the tag query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// One page of the tag query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPage {
    pub page_info: PageInfo,
    pub nodes: Vec<Tag>,
}

/// Kind of an entry in a directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One item of a contents API directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    pub path: String,
    pub url: String,
}

/// A single-file response of the contents API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFile {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub content: String,
    /// `base64` for regular files; empty or `none` when the API omits the body.
    #[serde(default)]
    pub encoding: String,
}

/// One page worth of documentation, keyed by its final site path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: String,
    /// Path of the markdown file inside the repository.
    pub source_path: String,
    pub name: String,
    pub sha: String,
    pub frontmatter: serde_json::Map<String, serde_json::Value>,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
}

/// A qualifying tag, reduced to the version it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVersion {
    pub id: String,
    pub tag: String,
    pub base_path: String,
}

/// Per-version aggregate of everything fetched for that version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionBundle {
    pub id: String,
    pub tag: String,
    pub base_path: String,
    pub contents: Vec<Document>,
}

/// Context attached to every registered page.
///
/// `versions` is shared by all pages of a build so every page can render a
/// version switcher without copying the full bundle list.
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub frontmatter: serde_json::Map<String, serde_json::Value>,
    pub html: String,
    pub headings: Vec<Heading>,
    pub version: Arc<VersionBundle>,
    pub versions: Arc<[Arc<VersionBundle>]>,
}

/// A page registration request.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub path: String,
    pub component: String,
    pub context: PageContext,
}

/// Access to the hosted-git contents API.
/// `reference` is the git ref (tag name) the content is read at.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// List a directory.
    async fn list_directory(
        &self,
        url: &str,
        reference: &str,
    ) -> Result<Vec<ContentEntry>, FetchError>;

    /// Retrieve a single file including its encoded content.
    async fn get_file(&self, url: &str, reference: &str) -> Result<ContentFile, FetchError>;
}

/// Paginated tag query, newest tag commit first.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait TagSource: Send + Sync {
    /// Fetch up to `first` tags after `after` (no cursor for the first page).
    async fn query_tags(
        &self,
        owner: &str,
        repo: &str,
        after: Option<String>,
        first: usize,
    ) -> Result<TagPage, FetchError>;
}

/// The site builder's page registration hook.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait PageSink: Send + Sync {
    async fn create_page(&self, page: Page) -> Result<(), SinkError>;
}
