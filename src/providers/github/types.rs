use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GitHubRepoDto {
    pub stargazers_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseDto {
    pub tag_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<AssetDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetDto {
    pub name: String,
    pub download_count: u64,
}

impl ReleaseDto {
    pub fn total_downloads(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_dto_ignores_unknown_fields() {
        let json = r#"{
            "id": 1,
            "tag_name": "v0.3.0",
            "draft": false,
            "published_at": "2024-02-10T12:00:00Z",
            "assets": [
                {"name": "starlens-x86_64.tar.gz", "download_count": 12, "size": 99},
                {"name": "starlens-aarch64.tar.gz", "download_count": 30}
            ]
        }"#;

        let release: ReleaseDto = serde_json::from_str(json).unwrap();

        assert_eq!(release.tag_name.as_deref(), Some("v0.3.0"));
        assert_eq!(release.assets.len(), 2);
        assert_eq!(release.total_downloads(), 42);
    }

    #[test]
    fn test_draft_release_without_publish_date() {
        let json = r#"{"tag_name": "v1.0.0-rc1", "published_at": null}"#;

        let release: ReleaseDto = serde_json::from_str(json).unwrap();

        assert!(release.published_at.is_none());
        assert_eq!(release.total_downloads(), 0);
    }
}
