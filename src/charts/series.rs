use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

pub const STAR_MILESTONES: [usize; 5] = [100, 250, 500, 750, 1000];
pub const MOVING_AVERAGE_WINDOW: usize = 3;
pub const RECENT_RELEASES: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePoint {
    pub tag: String,
    pub date: DateTime<Utc>,
    pub downloads: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    pub day: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBar {
    pub tag: String,
    pub downloads: u64,
    pub highlighted: bool,
}

/// Running star total at each stargazer timestamp.
pub fn cumulative_stars(stars: &[DateTime<Utc>]) -> Vec<(DateTime<Utc>, u64)> {
    stars.iter().zip(1..).map(|(&at, total)| (at, total)).collect()
}

/// Milestones already reached, with the timestamp of the star that hit each.
pub fn milestones_reached(stars: &[DateTime<Utc>]) -> Vec<(usize, DateTime<Utc>)> {
    STAR_MILESTONES
        .iter()
        .filter(|&&m| m <= stars.len())
        .map(|&m| (m, stars[m - 1]))
        .collect()
}

/// Stars per calendar day from the first to the last star, gaps filled with 0.
pub fn stars_per_day(stars: &[DateTime<Utc>]) -> Vec<DayCount> {
    let (Some(first), Some(last)) = (stars.first(), stars.last()) else {
        return vec![];
    };

    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for at in stars {
        *counts.entry(at.date_naive()).or_insert(0) += 1;
    }

    first
        .date_naive()
        .iter_days()
        .take_while(|day| *day <= last.date_naive())
        .map(|day| DayCount {
            day,
            count: counts.get(&day).copied().unwrap_or(0),
        })
        .collect()
}

/// Stars per week, keyed by the Monday the week starts on.
pub fn stars_per_week(stars: &[DateTime<Utc>]) -> Vec<DayCount> {
    let mut weeks: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for at in stars {
        let day = at.date_naive();
        let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
        *weeks.entry(monday).or_insert(0) += 1;
    }

    weeks
        .into_iter()
        .map(|(day, count)| DayCount { day, count })
        .collect()
}

/// Trailing mean over full windows only; value `i` covers `values[i..i + window]`.
#[allow(clippy::cast_precision_loss)]
pub fn moving_average(values: &[u64], window: usize) -> Vec<f64> {
    if window == 0 || values.len() < window {
        return vec![];
    }

    values
        .windows(window)
        .map(|w| w.iter().sum::<u64>() as f64 / window as f64)
        .collect()
}

/// Busiest day; the earliest one wins a tie.
pub fn peak_day(daily: &[DayCount]) -> Option<DayCount> {
    daily
        .iter()
        .copied()
        .fold(None, |best: Option<DayCount>, d| match best {
            Some(b) if b.count >= d.count => Some(b),
            _ => Some(d),
        })
}

/// Stars received at or after `window` before the latest star.
pub fn recent_stars(stars: &[DateTime<Utc>], window: Duration) -> usize {
    let Some(&last) = stars.last() else {
        return 0;
    };
    let cutoff = last - window;

    stars.iter().filter(|&&at| at >= cutoff).count()
}

pub fn cumulative_downloads(releases: &[ReleasePoint]) -> Vec<u64> {
    releases
        .iter()
        .scan(0, |total, r| {
            *total += r.downloads;
            Some(*total)
        })
        .collect()
}

/// Most recent releases that were downloaded at all.
///
/// Bars at or above half of the tallest bar are flagged for emphasis.
pub fn release_bars(releases: &[ReleasePoint]) -> Vec<ReleaseBar> {
    let downloaded: Vec<&ReleasePoint> = releases.iter().filter(|r| r.downloads > 0).collect();
    let recent = &downloaded[downloaded.len().saturating_sub(RECENT_RELEASES)..];
    let max = recent.iter().map(|r| r.downloads).max().unwrap_or(0);

    recent
        .iter()
        .map(|r| ReleaseBar {
            tag: r.tag.clone(),
            downloads: r.downloads,
            highlighted: r.downloads.saturating_mul(2) >= max,
        })
        .collect()
}
