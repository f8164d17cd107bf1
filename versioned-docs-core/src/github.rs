//! GitHub client: the production implementation of [`ContentsApi`] and [`TagSource`].
//!
//! One [`GithubClient`] owns a single `reqwest::Client` configured with the
//! bearer token and the v3 media type; it is shared by reference across every
//! concurrent fetch of a build.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::ApiConfig;
use crate::contract::{ContentEntry, ContentFile, ContentsApi, FetchError, TagPage, TagSource};

pub const GITHUB_V3_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

const TAGS_QUERY: &str = r#"
query($owner: String!, $name: String!, $after: String, $first: Int!) {
  repository(owner: $owner, name: $name) {
    name
    refs(
      after: $after
      first: $first
      refPrefix: "refs/tags/"
      orderBy: {field: TAG_COMMIT_DATE, direction: DESC}
    ) {
      pageInfo {
        endCursor
        hasNextPage
      }
      nodes {
        id
        name
      }
    }
  }
}
"#;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid GitHub token: {0}")]
    InvalidToken(#[from] reqwest::header::InvalidHeaderValue),
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("GraphQL query failed: {0}")]
    GraphQl(String),
    #[error("repository {owner}/{repo} not found")]
    RepositoryNotFound { owner: String, repo: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<TagsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct TagsData {
    repository: Option<RepositoryRefs>,
}

#[derive(Deserialize)]
struct RepositoryRefs {
    refs: TagPage,
}

pub struct GithubClient {
    http: Client,
    graphql_url: String,
}

impl GithubClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_V3_MEDIA_TYPE));
        headers.insert(USER_AGENT, HeaderValue::from_static("versioned-docs"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder().default_headers(headers).build()?;
        tracing::info!(
            graphql_url = %config.graphql_url,
            token_set = !config.token.is_empty(),
            "Initialized GithubClient"
        );
        Ok(Self {
            http,
            graphql_url: config.graphql_url.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        reference: &str,
    ) -> Result<T, ApiError> {
        let url = with_ref(url, reference)?;
        debug!(url = %url, "GET contents");
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(url = %url, status = %status, "GitHub contents API returned error");
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

/// Adds `ref=<reference>` to `url` unless it already names a ref.
///
/// Entry URLs in directory listings already carry the ref they were listed at.
pub fn with_ref(url: &str, reference: &str) -> Result<Url, ApiError> {
    let mut parsed = Url::parse(url).map_err(|e| ApiError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let has_ref = parsed.query_pairs().any(|(key, _)| key == "ref");
    if !has_ref && !reference.is_empty() {
        parsed.query_pairs_mut().append_pair("ref", reference);
    }
    Ok(parsed)
}

#[async_trait]
impl ContentsApi for GithubClient {
    async fn list_directory(
        &self,
        url: &str,
        reference: &str,
    ) -> Result<Vec<ContentEntry>, FetchError> {
        Ok(self.get_json(url, reference).await?)
    }

    async fn get_file(&self, url: &str, reference: &str) -> Result<ContentFile, FetchError> {
        Ok(self.get_json(url, reference).await?)
    }
}

#[async_trait]
impl TagSource for GithubClient {
    async fn query_tags(
        &self,
        owner: &str,
        repo: &str,
        after: Option<String>,
        first: usize,
    ) -> Result<TagPage, FetchError> {
        let body = json!({
            "query": TAGS_QUERY,
            "variables": {
                "owner": owner,
                "name": repo,
                "after": after,
                "first": first,
            },
        });
        debug!(owner, repo, ?after, first, "POST tags query");

        let response = self
            .http
            .post(&self.graphql_url)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from)?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            return Err(ApiError::Status {
                url: self.graphql_url.clone(),
                status,
                body,
            }
            .into());
        }

        let parsed: GraphQlResponse = response.json().await.map_err(ApiError::from)?;
        if !parsed.errors.is_empty() {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            return Err(ApiError::GraphQl(messages.join("; ")).into());
        }
        parsed
            .data
            .and_then(|data| data.repository)
            .map(|repository| repository.refs)
            .ok_or_else(|| {
                ApiError::RepositoryNotFound {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                }
                .into()
            })
    }
}
