use log::info;

use crate::error::Result;
use crate::snapshot::{Snapshot, TimelineEntry};
use crate::store::SnapshotStore;

/// Recomputes the whole timeline from every stored snapshot and persists it.
pub fn rebuild(store: &SnapshotStore) -> Result<Vec<TimelineEntry>> {
    info!("Rebuilding timeline from {}", store.dir().display());

    let history = store.load_history()?;
    let timeline = build_timeline(&history);
    store.write_timeline(&timeline)?;

    Ok(timeline)
}

/// Folds chronologically ordered snapshots into per-day deltas.
///
/// A zero previous value counts as "no baseline": the delta for the entry
/// that follows it is reported as 0 even when the metric changed. Existing
/// `timeline.json` consumers depend on this.
pub fn build_timeline(history: &[Snapshot]) -> Vec<TimelineEntry> {
    let mut previous_stars = 0;
    let mut previous_downloads = 0;

    history
        .iter()
        .map(|snap| {
            let entry = TimelineEntry {
                date: snap.date,
                stars: snap.stars,
                stars_delta: delta(snap.stars, previous_stars),
                total_downloads: snap.total_downloads,
                downloads_delta: delta(snap.total_downloads, previous_downloads),
                views: snap.today.views,
                views_uniques: snap.today.views_uniques,
                clones: snap.today.clones,
                clones_uniques: snap.today.clones_uniques,
            };

            previous_stars = snap.stars;
            previous_downloads = snap.total_downloads;

            entry
        })
        .collect()
}

#[allow(clippy::cast_possible_wrap)]
fn delta(current: u64, previous: u64) -> i64 {
    if previous == 0 {
        return 0;
    }

    current as i64 - previous as i64
}
