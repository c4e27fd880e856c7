use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use super::series::ReleasePoint;
use crate::error::{Result, StarLensError};

/// Reads newline-separated RFC 3339 stargazer timestamps, sorted ascending.
pub fn read_stars(path: &Path) -> Result<Vec<DateTime<Utc>>> {
    parse_stars(&read_input(path)?)
}

/// Reads `tag\tpublished_at\tdownloads` lines, sorted by publish date.
pub fn read_releases(path: &Path) -> Result<Vec<ReleasePoint>> {
    parse_releases(&read_input(path)?)
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| StarLensError::MissingInput(format!("{}: {e}", path.display())))
}

pub fn parse_stars(contents: &str) -> Result<Vec<DateTime<Utc>>> {
    let mut stars = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_timestamp)
        .collect::<Result<Vec<_>>>()?;

    stars.sort();
    Ok(stars)
}

/// Lines that do not split into exactly three fields are ignored.
pub fn parse_releases(contents: &str) -> Result<Vec<ReleasePoint>> {
    let mut releases = Vec::new();

    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let fields: Vec<&str> = line.split('\t').collect();
        let [tag, published, downloads] = fields.as_slice() else {
            continue;
        };

        let downloads = downloads.parse::<u64>().map_err(|e| {
            StarLensError::Parse(format!("Invalid download count '{downloads}' for {tag}: {e}"))
        })?;

        releases.push(ReleasePoint {
            tag: (*tag).to_string(),
            date: parse_timestamp(published)?,
            downloads,
        });
    }

    releases.sort_by_key(|r| r.date);
    Ok(releases)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StarLensError::Parse(format!("Invalid timestamp '{value}': {e}")))
}
