//! Recursive fetch of a documentation tree through the contents API.
//!
//! Every child of a directory is fetched concurrently; the result keeps the
//! shape of the remote tree as a [`ContentTree`] and is flattened by the caller.

use std::sync::OnceLock;

use futures::future::{try_join_all, BoxFuture};
use futures::{FutureExt, TryFutureExt};
use regex::Regex;
use tracing::debug;

use crate::contract::{ContentEntry, ContentsApi, Document, EntryKind, FetchError};
use crate::transform::{decode_content, transform};

/// Per-version request options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Git ref the tree is read at (a tag name).
    pub reference: String,
    /// Repository directory stripped from every document path.
    pub source_dir: String,
}

/// Tree-shaped result of a recursive directory fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentTree {
    File(Document),
    Directory(Vec<ContentTree>),
}

impl ContentTree {
    /// Post-order traversal; documents come out in listing order.
    pub fn flatten(self) -> Vec<Document> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(self, out: &mut Vec<Document>) {
        match self {
            ContentTree::File(document) => out.push(document),
            ContentTree::Directory(children) => {
                for child in children {
                    child.collect_into(out);
                }
            }
        }
    }
}

fn markdown_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.mdx?$").expect("valid markdown regex"))
}

/// Directories and `.md`/`.mdx` files are fetched; everything else is skipped.
pub fn is_fetched_entry(entry: &ContentEntry) -> bool {
    match entry.kind {
        EntryKind::Dir => true,
        EntryKind::File => markdown_pattern().is_match(&entry.name),
        _ => false,
    }
}

/// Fetches and transforms a single markdown file.
pub async fn fetch_file<A>(
    api: &A,
    url: String,
    base_path: &str,
    options: &FetchOptions,
) -> Result<Document, FetchError>
where
    A: ContentsApi + ?Sized,
{
    let file = api.get_file(&url, &options.reference).await?;
    let text = decode_content(&file)?;
    let document = transform(&text, base_path, &file, &options.source_dir)?;
    Ok(document)
}

/// Lists `url` and fetches every relevant child concurrently, recursing into subdirectories.
///
/// The first failing child fails the whole directory.
pub fn fetch_directory<'a, A>(
    api: &'a A,
    url: String,
    base_path: &'a str,
    options: &'a FetchOptions,
) -> BoxFuture<'a, Result<ContentTree, FetchError>>
where
    A: ContentsApi + ?Sized,
{
    async move {
        let entries = api.list_directory(&url, &options.reference).await?;
        debug!(
            url = %url,
            reference = %options.reference,
            entries = entries.len(),
            "Listed directory"
        );

        let children = entries
            .into_iter()
            .filter(is_fetched_entry)
            .map(|entry| match entry.kind {
                EntryKind::Dir => fetch_directory(api, entry.url, base_path, options),
                _ => fetch_file(api, entry.url, base_path, options)
                    .map_ok(ContentTree::File)
                    .boxed(),
            });

        let children = try_join_all(children).await?;
        Ok(ContentTree::Directory(children))
    }
    .boxed()
}
