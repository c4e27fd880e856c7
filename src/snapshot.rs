use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One day's captured repository metrics, persisted as `<date>.json`.
///
/// Only `date` is required when reading; everything else falls back to its
/// default so that partial records still take part in the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub today: TodayTraffic,
    #[serde(default)]
    pub traffic_14d: Traffic14d,
    #[serde(default)]
    pub total_downloads: u64,
    #[serde(default)]
    pub releases: Vec<ReleaseRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodayTraffic {
    pub views: u64,
    pub views_uniques: u64,
    pub clones: u64,
    pub clones_uniques: u64,
}

/// Raw rolling-window payloads, kept so per-day values can be re-derived.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Traffic14d {
    pub views: ViewsWindow,
    pub clones: ClonesWindow,
    pub referrers: Vec<serde_json::Value>,
    pub paths: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficDay {
    pub timestamp: String,
    pub count: u64,
    pub uniques: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsWindow {
    pub count: u64,
    pub uniques: u64,
    pub views: Vec<TrafficDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClonesWindow {
    pub count: u64,
    pub uniques: u64,
    pub clones: Vec<TrafficDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub tag: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub total_downloads: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub name: String,
    pub download_count: u64,
}

/// Derived per-day row of `timeline.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub stars: u64,
    pub stars_delta: i64,
    pub total_downloads: u64,
    pub downloads_delta: i64,
    pub views: u64,
    pub views_uniques: u64,
    pub clones: u64,
    pub clones_uniques: u64,
}
