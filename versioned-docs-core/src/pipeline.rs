//! High-level pipeline: orchestrates resolve → aggregate → emit for one documentation build.
//!
//! This module provides the top-level orchestration for building every page of a
//! multi-version documentation site. It implements a linear pipeline that:
//!   - Resolves the repository's versions from its tags ([`versions::resolve_versions`])
//!   - Fetches and transforms every version's documentation tree concurrently ([`aggregate`])
//!   - Registers one page per document with the site builder ([`emit_pages`])
//!   - Returns a [`BuildReport`] of what was registered.
//!
//! # Error Handling
//! - Tag resolution failure aborts the build.
//! - A version whose tree cannot be fetched is logged and dropped; the build
//!   continues with the remaining versions.
//! - A page the sink rejects aborts the build.
//!
//! # Navigation
//! - Main entrypoint: [`build`]
//! - Supporting types: [`BuildReport`], [`VersionReport`].

use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::DocsConfig;
use crate::contract::{
    ContentsApi, Page, PageContext, PageSink, ResolvedVersion, SinkError, TagSource, VersionBundle,
};
use crate::fetch::{fetch_directory, FetchOptions};
use crate::headings::extract_headings;
use crate::transform::is_blank_html;
use crate::versions::{self, ResolveError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("site builder rejected page {path}: {source}")]
    Sink {
        path: String,
        #[source]
        source: SinkError,
    },
}

/// Summary of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub versions: Vec<VersionReport>,
    pub pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReport {
    pub id: String,
    pub tag: String,
    pub pages: usize,
}

async fn fetch_version<A>(
    api: &A,
    config: &DocsConfig,
    version: ResolvedVersion,
) -> Option<VersionBundle>
where
    A: ContentsApi + ?Sized,
{
    let options = FetchOptions {
        reference: version.tag.clone(),
        source_dir: config.source_dir.clone(),
    };
    info!(version = %version.id, tag = %version.tag, "[BUILD] Fetching documentation tree");

    match fetch_directory(api, config.contents_url(), &version.base_path, &options).await {
        Ok(tree) => {
            let fetched = tree.flatten();
            let total = fetched.len();
            let contents: Vec<_> = fetched
                .into_iter()
                .filter(|document| !is_blank_html(&document.html))
                .collect();
            info!(
                version = %version.id,
                documents = contents.len(),
                skipped_empty = total - contents.len(),
                "[BUILD] Fetched documentation tree"
            );
            Some(VersionBundle {
                id: version.id,
                tag: version.tag,
                base_path: version.base_path,
                contents,
            })
        }
        Err(e) => {
            error!(
                version = %version.id,
                tag = %version.tag,
                error = %e,
                "[BUILD][ERROR] Failed to fetch documentation tree, dropping version"
            );
            None
        }
    }
}

/// Fetches every version concurrently. Versions that fail are logged and left out;
/// the output keeps resolution order.
pub async fn aggregate<A>(
    api: &A,
    config: &DocsConfig,
    versions: Vec<ResolvedVersion>,
) -> Vec<VersionBundle>
where
    A: ContentsApi + ?Sized,
{
    let requested = versions.len();
    let bundles: Vec<VersionBundle> = join_all(
        versions
            .into_iter()
            .map(|version| fetch_version(api, config, version)),
    )
    .await
    .into_iter()
    .flatten()
    .collect();

    if bundles.len() < requested {
        error!(
            requested,
            fetched = bundles.len(),
            "[BUILD][ERROR] Some versions were dropped"
        );
    }
    bundles
}

/// Registers one page per document of every bundle. Returns the number of pages registered.
pub async fn emit_pages<S>(
    sink: &S,
    template: &str,
    bundles: Vec<VersionBundle>,
) -> Result<usize, BuildError>
where
    S: PageSink + ?Sized,
{
    let versions: Arc<[Arc<VersionBundle>]> = bundles.into_iter().map(Arc::new).collect();
    let mut registered = 0;

    for version in versions.iter() {
        for document in &version.contents {
            let headings = extract_headings(&document.html);
            debug!(path = %document.path, headings = headings.len(), "[BUILD] Registering page");
            let page = Page {
                path: document.path.clone(),
                component: template.to_string(),
                context: PageContext {
                    frontmatter: document.frontmatter.clone(),
                    html: document.html.clone(),
                    headings,
                    version: Arc::clone(version),
                    versions: Arc::clone(&versions),
                },
            };
            sink.create_page(page)
                .await
                .map_err(|source| BuildError::Sink {
                    path: document.path.clone(),
                    source,
                })?;
            registered += 1;
        }
    }

    info!(pages = registered, "[BUILD] Registered pages");
    Ok(registered)
}

/// Entrypoint: build every page of every version of the configured repository.
pub async fn build<A, T, S>(
    config: &DocsConfig,
    contents: &A,
    tags: &T,
    sink: &S,
) -> Result<BuildReport, BuildError>
where
    A: ContentsApi + ?Sized,
    T: TagSource + ?Sized,
    S: PageSink + ?Sized,
{
    info!(owner = %config.owner, repo = %config.repo, "[BUILD] Starting documentation build");

    let resolved = versions::resolve_versions(tags, &config.owner, &config.repo).await?;
    let bundles = aggregate(contents, config, resolved).await;

    let report_versions = bundles
        .iter()
        .map(|bundle| VersionReport {
            id: bundle.id.clone(),
            tag: bundle.tag.clone(),
            pages: bundle.contents.len(),
        })
        .collect();
    let pages = emit_pages(sink, &config.template, bundles).await?;

    Ok(BuildReport {
        versions: report_versions,
        pages,
    })
}
