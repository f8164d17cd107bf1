//! Repository identity from local git metadata.

use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIdentity {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum OriginError {
    #[error("failed to launch git: {0}")]
    Launch(#[from] std::io::Error),
    #[error("no origin remote configured in {0}")]
    NoOrigin(String),
    #[error("cannot determine owner/repository from remote URL {0}")]
    Unrecognised(String),
}

fn remote_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[/:]([\w.-]+)/([\w.-]+?)(?:\.git)?/?$").expect("valid remote regex")
    })
}

/// Owner and repository name of an https or scp-style remote URL.
pub fn parse_remote_url(url: &str) -> Option<RepositoryIdentity> {
    let captures = remote_pattern().captures(url.trim())?;
    Some(RepositoryIdentity {
        owner: captures.get(1)?.as_str().to_string(),
        name: captures.get(2)?.as_str().to_string(),
    })
}

/// Reads `remote.origin.url` of the repository containing `dir`.
pub fn discover_origin(dir: &Path) -> Result<RepositoryIdentity, OriginError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["config", "--get", "remote.origin.url"])
        .output()?;

    if !output.status.success() {
        error!(
            path = %dir.display(),
            status = ?output.status,
            "git config exited with non-zero code"
        );
        return Err(OriginError::NoOrigin(dir.display().to_string()));
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let identity = parse_remote_url(&url).ok_or_else(|| OriginError::Unrecognised(url.clone()))?;
    info!(
        url = %url,
        owner = %identity.owner,
        name = %identity.name,
        "Discovered repository from origin"
    );
    Ok(identity)
}
