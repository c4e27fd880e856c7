use std::future::Future;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::Result;
use crate::providers::{ReleaseDto, RepoSource};
use crate::snapshot::{AssetRecord, ReleaseRecord, Snapshot, TodayTraffic, Traffic14d, TrafficDay};

/// Captures one daily [`Snapshot`] from a [`RepoSource`].
///
/// Every query is best-effort: a failure is logged and replaced by an empty
/// value.
pub struct Collector<'a, S: RepoSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: RepoSource + Sync + ?Sized> Collector<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    pub async fn collect(&self, now: DateTime<Utc>) -> Snapshot {
        let date = now.date_naive();
        let today = date.format("%Y-%m-%d").to_string();

        info!("Collecting snapshot for {today}...");

        let stars = best_effort("star count", self.source.star_count()).await;
        info!("Stars: {stars}");

        let views = best_effort("traffic/views", self.source.traffic_views()).await;
        let clones = best_effort("traffic/clones", self.source.traffic_clones()).await;
        let referrers = best_effort(
            "traffic/popular/referrers",
            self.source.popular_referrers(),
        )
        .await;
        let paths = best_effort("traffic/popular/paths", self.source.popular_paths()).await;

        info!("Views (14d): {}", views.count);
        info!("Clones (14d): {}", clones.count);

        let releases: Vec<ReleaseRecord> = best_effort("releases", self.source.releases())
            .await
            .into_iter()
            .map(ReleaseRecord::from)
            .collect();
        let total_downloads: u64 = releases.iter().map(|r| r.total_downloads).sum();

        info!("Releases: {}", releases.len());
        info!("Total downloads: {total_downloads}");

        let (views_today, views_uniques) = counts_for_day(&views.views, &today);
        let (clones_today, clones_uniques) = counts_for_day(&clones.clones, &today);

        Snapshot {
            date,
            timestamp: now,
            stars,
            today: TodayTraffic {
                views: views_today,
                views_uniques,
                clones: clones_today,
                clones_uniques,
            },
            traffic_14d: Traffic14d {
                views,
                clones,
                referrers,
                paths,
            },
            total_downloads,
            releases,
        }
    }
}

async fn best_effort<T: Default>(what: &str, query: impl Future<Output = Result<T>>) -> T {
    match query.await {
        Ok(value) => value,
        Err(e) => {
            warn!("Query {what} failed: {e}");
            T::default()
        }
    }
}

/// `(count, uniques)` of the window entry whose timestamp starts with `day`.
///
/// Zero when the window has no such entry; the last match wins.
fn counts_for_day(window: &[TrafficDay], day: &str) -> (u64, u64) {
    window
        .iter()
        .rev()
        .find(|entry| entry.timestamp.starts_with(day))
        .map_or((0, 0), |entry| (entry.count, entry.uniques))
}

impl From<ReleaseDto> for ReleaseRecord {
    fn from(release: ReleaseDto) -> Self {
        let total_downloads = release.total_downloads();

        Self {
            tag: release.tag_name,
            published_at: release.published_at,
            assets: release
                .assets
                .into_iter()
                .map(|a| AssetRecord {
                    name: a.name,
                    download_count: a.download_count,
                })
                .collect(),
            total_downloads,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::StarLensError;
    use crate::providers::github::types::AssetDto;
    use crate::snapshot::{ClonesWindow, ViewsWindow};

    #[derive(Default)]
    struct FakeSource {
        stars: Option<u64>,
        views: Option<ViewsWindow>,
        clones: Option<ClonesWindow>,
        referrers: Option<Vec<serde_json::Value>>,
        releases: Option<Vec<ReleaseDto>>,
    }

    fn unavailable<T>() -> Result<T> {
        Err(StarLensError::Api("503 Service Unavailable".to_string()))
    }

    #[async_trait]
    impl RepoSource for FakeSource {
        async fn star_count(&self) -> Result<u64> {
            self.stars.map_or_else(unavailable, Ok)
        }

        async fn traffic_views(&self) -> Result<ViewsWindow> {
            self.views.clone().map_or_else(unavailable, Ok)
        }

        async fn traffic_clones(&self) -> Result<ClonesWindow> {
            self.clones.clone().map_or_else(unavailable, Ok)
        }

        async fn popular_referrers(&self) -> Result<Vec<serde_json::Value>> {
            self.referrers.clone().map_or_else(unavailable, Ok)
        }

        async fn popular_paths(&self) -> Result<Vec<serde_json::Value>> {
            unavailable()
        }

        async fn releases(&self) -> Result<Vec<ReleaseDto>> {
            self.releases.clone().map_or_else(unavailable, Ok)
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-02T18:45:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn day(timestamp: &str, count: u64, uniques: u64) -> TrafficDay {
        TrafficDay {
            timestamp: timestamp.to_string(),
            count,
            uniques,
        }
    }

    fn release(tag: &str, downloads: &[u64]) -> ReleaseDto {
        ReleaseDto {
            tag_name: Some(tag.to_string()),
            published_at: None,
            assets: downloads
                .iter()
                .enumerate()
                .map(|(i, &download_count)| AssetDto {
                    name: format!("{tag}-{i}.zip"),
                    download_count,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_collect_full_snapshot() {
        let source = FakeSource {
            stars: Some(321),
            views: Some(ViewsWindow {
                count: 40,
                uniques: 12,
                views: vec![
                    day("2024-01-01T00:00:00Z", 25, 8),
                    day("2024-01-02T00:00:00Z", 15, 6),
                ],
            }),
            clones: Some(ClonesWindow {
                count: 3,
                uniques: 2,
                clones: vec![day("2024-01-02T00:00:00Z", 3, 2)],
            }),
            referrers: Some(vec![serde_json::json!({"referrer": "github.com"})]),
            releases: Some(vec![release("v2", &[10, 5]), release("v1", &[100])]),
        };

        let snapshot = Collector::new(&source).collect(now()).await;

        assert_eq!(snapshot.date.to_string(), "2024-01-02");
        assert_eq!(snapshot.timestamp, now());
        assert_eq!(snapshot.stars, 321);
        assert_eq!(
            snapshot.today,
            TodayTraffic {
                views: 15,
                views_uniques: 6,
                clones: 3,
                clones_uniques: 2,
            }
        );
        assert_eq!(snapshot.traffic_14d.views.count, 40);
        assert_eq!(snapshot.traffic_14d.referrers.len(), 1);
        assert_eq!(snapshot.total_downloads, 115);
        assert_eq!(snapshot.releases[0].tag.as_deref(), Some("v2"));
        assert_eq!(snapshot.releases[0].total_downloads, 15);
        assert_eq!(snapshot.releases[1].assets[0].download_count, 100);
    }

    #[tokio::test]
    async fn test_failed_queries_degrade_to_empty() {
        let source = FakeSource::default();

        let snapshot = Collector::new(&source).collect(now()).await;

        assert_eq!(snapshot.stars, 0);
        assert_eq!(snapshot.total_downloads, 0);
        assert_eq!(snapshot.today, TodayTraffic::default());
        assert_eq!(snapshot.traffic_14d, Traffic14d::default());
        assert!(snapshot.releases.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_other_metrics() {
        let source = FakeSource {
            stars: Some(9),
            releases: Some(vec![release("v1", &[4])]),
            ..FakeSource::default()
        };

        let snapshot = Collector::new(&source).collect(now()).await;

        assert_eq!(snapshot.stars, 9);
        assert_eq!(snapshot.total_downloads, 4);
        assert_eq!(snapshot.today.views, 0);
    }

    #[tokio::test]
    async fn test_total_downloads_sums_every_asset() {
        let source = FakeSource {
            releases: Some(vec![
                release("v3", &[]),
                release("v2", &[1, 2, 3]),
                release("v1", &[40]),
            ]),
            ..FakeSource::default()
        };

        let snapshot = Collector::new(&source).collect(now()).await;

        let asset_sum: u64 = snapshot
            .releases
            .iter()
            .flat_map(|r| r.assets.iter())
            .map(|a| a.download_count)
            .sum();
        assert_eq!(snapshot.total_downloads, 46);
        assert_eq!(snapshot.total_downloads, asset_sum);
        assert_eq!(snapshot.releases[0].total_downloads, 0);
    }

    #[test]
    fn test_counts_for_day_requires_prefix_match() {
        let window = vec![
            day("2024-01-01T00:00:00Z", 5, 1),
            day("2024-01-03T00:00:00Z", 9, 2),
        ];

        assert_eq!(counts_for_day(&window, "2024-01-02"), (0, 0));
        assert_eq!(counts_for_day(&window, "2024-01-03"), (9, 2));
        assert_eq!(counts_for_day(&[], "2024-01-03"), (0, 0));
    }

    #[test]
    fn test_counts_for_day_last_match_wins() {
        let window = vec![
            day("2024-01-03T00:00:00Z", 1, 1),
            day("2024-01-03T12:00:00Z", 7, 4),
        ];

        assert_eq!(counts_for_day(&window, "2024-01-03"), (7, 4));
    }
}
