use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

use crate::error::Result;
use crate::snapshot::{Snapshot, TimelineEntry};

pub const TIMELINE_FILE: &str = "timeline.json";

/// Flat directory of `<YYYY-MM-DD>.json` snapshots plus the derived timeline.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    pub fn timeline_path(&self) -> PathBuf {
        self.dir.join(TIMELINE_FILE)
    }

    /// Writes the snapshot for its day, replacing any earlier run's file.
    pub fn write_snapshot(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        let path = self.snapshot_path(snapshot.date);
        self.write_json(&path, snapshot)?;
        info!("Saved snapshot to {}", path.display());
        Ok(path)
    }

    pub fn write_timeline(&self, timeline: &[TimelineEntry]) -> Result<PathBuf> {
        let path = self.timeline_path();
        self.write_json(&path, timeline)?;
        info!(
            "Saved timeline to {} ({} days)",
            path.display(),
            timeline.len()
        );
        Ok(path)
    }

    /// Loads every stored snapshot in file-name order.
    ///
    /// Files that do not parse as a snapshot are skipped.
    pub fn load_history(&self) -> Result<Vec<Snapshot>> {
        if !self.dir.is_dir() {
            return Ok(vec![]);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        paths.retain(|p| is_snapshot_file(p));
        paths.sort();

        let mut history = Vec::with_capacity(paths.len());
        for path in paths {
            let contents = fs::read(&path)?;
            match serde_json::from_slice::<Snapshot>(&contents) {
                Ok(snapshot) => history.push(snapshot),
                Err(e) => debug!("Skipping malformed snapshot {}: {e}", path.display()),
            }
        }

        Ok(history)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn is_snapshot_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|ext| ext == "json")
        && path.file_name().is_some_and(|name| name != TIMELINE_FILE)
}
