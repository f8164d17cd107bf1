//! # Page writer (CLI <-> Core)
//!
//! Implements the core [`PageSink`] seam by writing every registered page to
//! disk as `<output_dir>/<page path>/index.json`, so a static site generator
//! can pick the pages up together with their template reference.
//!
//! Each file carries the page's frontmatter, HTML, headings, its own version
//! and a summary of all built versions for rendering a version switcher.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use versioned_docs_core::contract::{Heading, Page, PageSink, SinkError, VersionBundle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    pub tag: String,
    pub base_path: String,
}

impl From<&VersionBundle> for VersionSummary {
    fn from(bundle: &VersionBundle) -> Self {
        Self {
            id: bundle.id.clone(),
            tag: bundle.tag.clone(),
            base_path: bundle.base_path.clone(),
        }
    }
}

/// On-disk form of one page.
#[derive(Debug, Serialize)]
pub struct PageRecord {
    pub path: String,
    pub component: String,
    pub frontmatter: Map<String, Value>,
    pub html: String,
    pub headings: Vec<Heading>,
    pub version: VersionSummary,
    pub versions: Vec<VersionSummary>,
}

impl From<Page> for PageRecord {
    fn from(page: Page) -> Self {
        let context = page.context;
        Self {
            path: page.path,
            component: page.component,
            frontmatter: context.frontmatter,
            html: context.html,
            headings: context.headings,
            version: VersionSummary::from(context.version.as_ref()),
            versions: context
                .versions
                .iter()
                .map(|bundle| VersionSummary::from(bundle.as_ref()))
                .collect(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("page path {0:?} escapes the output directory")]
    UnsafePath(String),
}

pub struct JsonPageWriter {
    output_dir: PathBuf,
}

impl JsonPageWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        tracing::info!(output_dir = %output_dir.display(), "Initialized JsonPageWriter");
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File a page path is written to. `/` maps to `<output_dir>/index.json`.
    pub fn target_file(&self, page_path: &str) -> Result<PathBuf, WriteError> {
        let relative = Path::new(page_path.trim_start_matches('/'));
        let mut target = self.output_dir.clone();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => target.push(segment),
                Component::CurDir => {}
                _ => return Err(WriteError::UnsafePath(page_path.to_string())),
            }
        }
        target.push("index.json");
        Ok(target)
    }
}

#[async_trait]
impl PageSink for JsonPageWriter {
    async fn create_page(&self, page: Page) -> Result<(), SinkError> {
        let target = self.target_file(&page.path).map_err(|e| {
            tracing::error!(error = %e, path = %page.path, "Refusing to write page");
            e
        })?;
        let record = PageRecord::from(page);
        let body = serde_json::to_vec_pretty(&record)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, body).await.map_err(|e| {
            tracing::error!(error = ?e, target = %target.display(), "Failed to write page");
            e
        })?;
        tracing::debug!(path = %record.path, target = %target.display(), "Wrote page");
        Ok(())
    }
}
