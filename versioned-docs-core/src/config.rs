use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_SOURCE_DIR: &str = "docs/source";
pub const DEFAULT_TEMPLATE: &str = "src/templates/docs";
pub const DEFAULT_REST_BASE: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// What to build: which repository, where its docs live, and which template renders them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    pub owner: String,
    pub repo: String,
    /// Directory inside the repository holding the markdown sources.
    pub source_dir: String,
    /// Template reference handed to the site builder with every page.
    pub template: String,
    pub rest_base: String,
}

impl DocsConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            source_dir: DEFAULT_SOURCE_DIR.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            rest_base: DEFAULT_REST_BASE.to_string(),
        }
    }

    /// Contents API URL of the documentation root.
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.rest_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.source_dir.trim_matches('/')
        )
    }

    pub fn trace_loaded(&self) {
        info!(
            owner = %self.owner,
            repo = %self.repo,
            source_dir = %self.source_dir,
            template = %self.template,
            "Loaded DocsConfig"
        );
        debug!(?self, "DocsConfig loaded (full debug)");
    }
}

/// Connection settings for the GitHub client. `Debug` never prints the token.
#[derive(Clone)]
pub struct ApiConfig {
    pub graphql_url: String,
    pub token: String,
}

impl ApiConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("graphql_url", &self.graphql_url)
            .field("token_set", &!self.token.is_empty())
            .finish()
    }
}
