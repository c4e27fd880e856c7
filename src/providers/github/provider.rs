use async_trait::async_trait;
use log::info;

use super::client::GitHubClient;
use super::types::{GitHubRepoDto, ReleaseDto};
use crate::auth::Token;
use crate::error::Result;
use crate::providers::RepoSource;
use crate::repo::RepoId;
use crate::snapshot::{ClonesWindow, ViewsWindow};

const PER_PAGE: usize = 100;

pub struct GitHubProvider {
    pub client: GitHubClient,
    pub repo: RepoId,
}

impl GitHubProvider {
    pub fn new(base_url: &str, repo: RepoId, token: Option<Token>) -> Result<Self> {
        let client = GitHubClient::new(base_url, token)?;

        Ok(Self { client, repo })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.client.repo_url(&self.repo, path)?;
        self.client.get_json(url, &[]).await
    }
}

#[async_trait]
impl RepoSource for GitHubProvider {
    async fn star_count(&self) -> Result<u64> {
        let repo: GitHubRepoDto = self.get("").await?;
        Ok(repo.stargazers_count)
    }

    async fn traffic_views(&self) -> Result<ViewsWindow> {
        self.get("/traffic/views").await
    }

    async fn traffic_clones(&self) -> Result<ClonesWindow> {
        self.get("/traffic/clones").await
    }

    async fn popular_referrers(&self) -> Result<Vec<serde_json::Value>> {
        self.get("/traffic/popular/referrers").await
    }

    async fn popular_paths(&self) -> Result<Vec<serde_json::Value>> {
        self.get("/traffic/popular/paths").await
    }

    async fn releases(&self) -> Result<Vec<ReleaseDto>> {
        let url = self.client.repo_url(&self.repo, "/releases")?;
        let mut all_releases = Vec::new();
        let mut page = 1;

        loop {
            let query = [("per_page", PER_PAGE.to_string()), ("page", page.to_string())];
            let releases: Vec<ReleaseDto> = self.client.get_json(url.clone(), &query).await?;

            let fetched_count = releases.len();
            all_releases.extend(releases);

            info!(
                "Releases page {page}: fetched {fetched_count} (total: {})",
                all_releases.len()
            );

            if fetched_count < PER_PAGE {
                break;
            }

            page += 1;
        }

        Ok(all_releases)
    }
}
