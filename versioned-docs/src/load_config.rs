/// `load_config` module: Loads a static YAML config and injects the GitHub token from the environment.
///
/// This module is the only place where user YAML is parsed and mapped to the
/// strongly-typed configuration of `versioned-docs-core`.
///
/// # Responsibilities
/// - Parse the YAML configuration file into type-safe Rust structs
/// - Fill in defaults (source directory, template, API endpoints)
/// - Resolve the repository from the local git origin when the file does not name it
/// - Inject `GITHUB_TOKEN` from the environment; the token is never read from YAML
///
/// # Errors
/// All errors in this module use `anyhow::Error` for context-rich diagnostics,
/// and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use versioned_docs_core::config::{
    ApiConfig, DocsConfig, DEFAULT_GRAPHQL_URL, DEFAULT_REST_BASE, DEFAULT_SOURCE_DIR,
    DEFAULT_TEMPLATE,
};
use versioned_docs_core::origin::discover_origin;

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Default, Deserialize)]
pub struct RepositorySection {
    pub owner: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocsSection {
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            template: default_template(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_rest_base")]
    pub rest_base: String,
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            rest_base: default_rest_base(),
            graphql_url: default_graphql_url(),
        }
    }
}

fn default_source_dir() -> String {
    DEFAULT_SOURCE_DIR.to_string()
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

fn default_rest_base() -> String {
    DEFAULT_REST_BASE.to_string()
}

fn default_graphql_url() -> String {
    DEFAULT_GRAPHQL_URL.to_string()
}

/// The YAML file as written by the user.
#[derive(Debug, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub repository: RepositorySection,
    #[serde(default)]
    pub docs: DocsSection,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub api: ApiSection,
}

/// Fully resolved configuration for one CLI run.
#[derive(Debug)]
pub struct CliConfig {
    pub docs: DocsConfig,
    pub api: ApiConfig,
    pub output_dir: PathBuf,
}

/// Reads and parses the YAML file without touching the environment or git.
pub fn read_config<P: AsRef<Path>>(path: P) -> Result<RawConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Loads the YAML config file, fills the repository from the git origin of the
/// current directory when needed, and injects the GitHub token from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let raw = read_config(path)?;

    let token = match std::env::var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => {
            info!("{TOKEN_ENV} found in env");
            token
        }
        Ok(_) => {
            error!("{TOKEN_ENV} environment variable is empty");
            anyhow::bail!("{TOKEN_ENV} environment variable is empty");
        }
        Err(e) => {
            error!(error = ?e, "{TOKEN_ENV} environment variable not set");
            return Err(anyhow::anyhow!(
                "{TOKEN_ENV} environment variable not set: {e}"
            ));
        }
    };

    let (owner, name) = match (raw.repository.owner, raw.repository.name) {
        (Some(owner), Some(name)) => (owner, name),
        (owner, name) => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            let origin = discover_origin(&cwd)
                .with_context(|| "Repository owner/name not configured and git origin lookup failed")?;
            (
                owner.unwrap_or(origin.owner),
                name.unwrap_or(origin.name),
            )
        }
    };

    let docs = DocsConfig {
        owner,
        repo: name,
        source_dir: raw.docs.source_dir,
        template: raw.docs.template,
        rest_base: raw.api.rest_base,
    };
    docs.trace_loaded();

    let api = ApiConfig {
        graphql_url: raw.api.graphql_url,
        token,
    };

    info!(
        output_dir = %raw.output_dir.display(),
        "Config loaded and merged successfully"
    );

    Ok(CliConfig {
        docs,
        api,
        output_dir: raw.output_dir,
    })
}
