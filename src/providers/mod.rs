pub mod github;

use async_trait::async_trait;

use crate::error::Result;
use crate::snapshot::{ClonesWindow, ViewsWindow};

pub use github::ReleaseDto;

/// Repository-scoped queries the collector needs from a forge.
///
/// Each call is independent; callers decide how to treat a failure.
#[async_trait]
pub trait RepoSource {
    async fn star_count(&self) -> Result<u64>;

    async fn traffic_views(&self) -> Result<ViewsWindow>;

    async fn traffic_clones(&self) -> Result<ClonesWindow>;

    async fn popular_referrers(&self) -> Result<Vec<serde_json::Value>>;

    async fn popular_paths(&self) -> Result<Vec<serde_json::Value>>;

    /// All releases, following pagination to the end.
    async fn releases(&self) -> Result<Vec<ReleaseDto>>;
}
