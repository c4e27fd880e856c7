use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::Token;
use crate::error::{Result, StarLensError};
use crate::repo::RepoId;

const API_VERSION: &str = "2022-11-28";

pub struct GitHubClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("StarLens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StarLensError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Keep any path prefix (e.g. GitHub Enterprise `/api/v3`) when joining.
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let api_url = Url::parse(&base)
            .map_err(|e| StarLensError::Config(format!("Invalid base URL: {e}")))?;

        Ok(Self {
            client,
            api_url,
            token,
        })
    }

    /// Helper to build authenticated requests
    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Construct a URL under `repos/{owner}/{name}`
    pub fn repo_url(&self, repo: &RepoId, path: &str) -> Result<Url> {
        self.api_url
            .join(&format!("repos/{}/{}{path}", repo.owner, repo.name))
            .map_err(|e| StarLensError::Config(format!("Invalid repository URL: {e}")))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        let endpoint = url.path().to_string();
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if !query.is_empty() {
            request = request.query(query);
        }
        request = self.auth_request(request);

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StarLensError::Api(format!("{endpoint}: {status} - {body}")));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }
}
