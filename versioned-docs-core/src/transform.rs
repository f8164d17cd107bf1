//! Document transformation: frontmatter split, markdown rendering and site path computation.
//!
//! Turns the decoded text of one markdown file into a [`Document`]:
//!   - the leading `---` YAML block becomes the frontmatter mapping
//!   - the body is rendered to HTML with comments and scripts removed
//!   - every heading gets a slug `id` so pages can link to sections
//!   - the repository path is mapped onto the version's site path

use std::collections::HashMap;
use std::sync::OnceLock;

use base64::Engine;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::contract::{ContentFile, Document};

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid frontmatter in {path}: {source}")]
    Frontmatter {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("frontmatter in {path} is not a mapping")]
    FrontmatterNotMapping { path: String },
    #[error("failed to decode {encoding} content of {path}: {source}")]
    Decode {
        path: String,
        encoding: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// Decodes API file content according to its reported encoding.
pub fn decode_content(file: &ContentFile) -> Result<String, TransformError> {
    match file.encoding.as_str() {
        "base64" => {
            // GitHub wraps base64 bodies at 60 columns.
            let compact: String = file
                .content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|source| TransformError::Decode {
                    path: file.path.clone(),
                    encoding: file.encoding.clone(),
                    source,
                })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Ok(file.content.clone()),
    }
}

/// Splits a leading YAML frontmatter block from the body.
///
/// Returns an empty mapping and the untouched text when there is no opening
/// `---` line or no closing `---`/`...` line.
pub fn split_frontmatter(
    text: &str,
    path: &str,
) -> Result<(Map<String, Value>, String), TransformError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');
    let opens = lines
        .next()
        .is_some_and(|first| first.trim_end() == "---");
    if !opens {
        return Ok((Map::new(), text.to_string()));
    }

    let mut offset = text.find('\n').map_or(text.len(), |i| i + 1);
    let yaml_start = offset;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return Ok((parse_frontmatter(yaml, path)?, body.to_string()));
        }
        offset += line.len();
    }

    Ok((Map::new(), text.to_string()))
}

fn parse_frontmatter(yaml: &str, path: &str) -> Result<Map<String, Value>, TransformError> {
    if yaml.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|source| TransformError::Frontmatter {
            path: path.to_string(),
            source,
        })?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(TransformError::FrontmatterNotMapping {
            path: path.to_string(),
        }),
    }
}

/// GitHub-style heading slugs, unique within one document.
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug for `text`; repeats get `-1`, `-2`, ... appended.
    pub fn slug(&mut self, text: &str) -> String {
        let base: String = text
            .trim()
            .to_lowercase()
            .chars()
            .filter_map(|c| match c {
                ' ' => Some('-'),
                '-' | '_' => Some(c),
                c if c.is_alphanumeric() => Some(c),
                _ => None,
            })
            .collect();

        let mut candidate = base.clone();
        while self.seen.contains_key(&candidate) {
            let count = self.seen.entry(base.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{base}-{count}");
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }
}

fn comment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"))
}

fn script_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<script\b.*?(</script\s*>|$)").expect("valid script regex")
    })
}

fn sanitize_raw_html(raw: &str) -> String {
    let without_comments = comment_pattern().replace_all(raw, "");
    script_pattern()
        .replace_all(&without_comments, "")
        .into_owned()
}

/// Renders a markdown body to sanitized HTML with slug ids on every heading.
pub fn render_markdown(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let mut events = sanitize_html_events(Parser::new_ext(body, options));
    assign_heading_ids(&mut events);

    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Drops comments and scripts from raw HTML. Consecutive block HTML events
/// are merged first since a block comment spans one event per line.
fn sanitize_html_events<'a>(parser: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    fn flush<'a>(block: &mut String, events: &mut Vec<Event<'a>>) {
        if block.is_empty() {
            return;
        }
        let cleaned = sanitize_raw_html(block);
        if !cleaned.trim().is_empty() {
            events.push(Event::Html(CowStr::from(cleaned)));
        }
        block.clear();
    }

    let mut events = Vec::new();
    let mut block = String::new();
    for event in parser {
        match event {
            Event::Html(raw) => block.push_str(&raw),
            Event::InlineHtml(raw) => {
                flush(&mut block, &mut events);
                let cleaned = sanitize_raw_html(&raw);
                if !cleaned.is_empty() {
                    events.push(Event::InlineHtml(CowStr::from(cleaned)));
                }
            }
            other => {
                flush(&mut block, &mut events);
                events.push(other);
            }
        }
    }
    flush(&mut block, &mut events);
    events
}

fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut headings: Vec<(usize, String)> = Vec::new();
    let mut open: Option<(usize, String)> = None;

    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { .. }) => open = Some((index, String::new())),
            Event::Text(t) | Event::Code(t) => {
                if let Some((_, text)) = open.as_mut() {
                    text.push_str(t);
                }
            }
            Event::End(TagEnd::Heading(_)) => headings.extend(open.take()),
            _ => {}
        }
    }

    let mut slugger = Slugger::new();
    for (start, text) in headings {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
            if id.is_none() {
                *id = Some(CowStr::from(slugger.slug(&text)));
            }
        }
    }
}

/// Maps a repository file path onto its site path under `base_path`.
///
/// `docs/source/api/index.mdx` with source dir `docs/source` and base path
/// `/v2` becomes `/v2/api`.
pub fn compute_path(api_path: &str, source_dir: &str, base_path: &str) -> String {
    let file_start = api_path.rfind('/').map_or(0, |i| i + 1);
    let stem = match api_path[file_start..].rfind('.') {
        Some(dot) => &api_path[..file_start + dot],
        None => api_path,
    };

    let source_dir = source_dir.trim_matches('/');
    let stem = stem.trim_start_matches('/');
    let relative = match stem.strip_prefix(source_dir) {
        Some(rest) if source_dir.is_empty() || rest.is_empty() || rest.starts_with('/') => rest,
        _ => stem,
    };

    let relative = if relative == "index" || relative == "/index" {
        ""
    } else {
        relative.strip_suffix("/index").unwrap_or(relative)
    };

    let relative = relative.trim_start_matches('/');
    let base = base_path.trim_end_matches('/');
    if relative.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{relative}")
    }
}

/// HTML that is empty once newlines are removed carries no page content.
pub fn is_blank_html(html: &str) -> bool {
    !html.chars().any(|c| c != '\n')
}

/// Builds a [`Document`] from the decoded text of `file`.
pub fn transform(
    raw_text: &str,
    base_path: &str,
    file: &ContentFile,
    source_dir: &str,
) -> Result<Document, TransformError> {
    let (frontmatter, body) = split_frontmatter(raw_text, &file.path)?;
    let html = render_markdown(&body);
    let path = compute_path(&file.path, source_dir, base_path);
    debug!(source = %file.path, path = %path, html_len = html.len(), "Transformed document");

    Ok(Document {
        path,
        source_path: file.path.clone(),
        name: file.name.clone(),
        sha: file.sha.clone(),
        frontmatter,
        html,
    })
}
