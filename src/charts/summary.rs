use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::series::{self, ReleasePoint};

const RULE_WIDTH: usize = 55;

/// Headline numbers printed after the charts are written.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSummary {
    pub title: String,
    pub total_stars: usize,
    pub total_downloads: u64,
    pub releases: usize,
    pub age_days: i64,
    pub avg_stars_per_day: f64,
    pub peak: Option<(NaiveDate, u64)>,
    pub last_7_days: usize,
}

impl GrowthSummary {
    pub fn new(title: &str, stars: &[DateTime<Utc>], releases: &[ReleasePoint]) -> Self {
        let age_days = match (stars.first(), stars.last()) {
            (Some(&first), Some(&last)) => (last - first).num_days(),
            _ => 0,
        };

        #[allow(clippy::cast_precision_loss)]
        let avg_stars_per_day = stars.len() as f64 / age_days.max(1) as f64;

        let peak = series::peak_day(&series::stars_per_day(stars)).map(|d| (d.day, d.count));

        Self {
            title: title.to_string(),
            total_stars: stars.len(),
            total_downloads: releases.iter().map(|r| r.downloads).sum(),
            releases: releases.len(),
            age_days,
            avg_stars_per_day,
            peak,
            last_7_days: series::recent_stars(stars, Duration::days(7)),
        }
    }
}

impl fmt::Display for GrowthSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "{rule}")?;
        writeln!(f, "  GROWTH SUMMARY: {}", self.title)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "  Total stars:       {}", thousands(self.total_stars as u64))?;
        writeln!(f, "  Total downloads:   {}", thousands(self.total_downloads))?;
        writeln!(f, "  Releases:          {}", self.releases)?;
        writeln!(f, "  Project age:       {} days", self.age_days)?;
        writeln!(f, "  Avg stars/day:     {:.1}", self.avg_stars_per_day)?;
        match self.peak {
            Some((day, count)) => writeln!(f, "  Peak day:          {day} ({count} stars)")?,
            None => writeln!(f, "  Peak day:          n/a")?,
        }
        writeln!(f, "  Last 7 days stars: {}", self.last_7_days)?;
        write!(f, "{rule}")
    }
}

/// `1234567` -> `1,234,567`
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_summary_numbers() {
        let stars = vec![
            ts("2024-01-01T00:00:00Z"),
            ts("2024-01-02T09:00:00Z"),
            ts("2024-01-02T10:00:00Z"),
            ts("2024-01-11T00:00:00Z"),
        ];
        let releases = vec![
            ReleasePoint {
                tag: "v1".to_string(),
                date: ts("2024-01-01T00:00:00Z"),
                downloads: 1500,
            },
            ReleasePoint {
                tag: "v2".to_string(),
                date: ts("2024-01-05T00:00:00Z"),
                downloads: 20,
            },
        ];

        let summary = GrowthSummary::new("hello", &stars, &releases);

        assert_eq!(summary.total_stars, 4);
        assert_eq!(summary.total_downloads, 1520);
        assert_eq!(summary.releases, 2);
        assert_eq!(summary.age_days, 10);
        assert!((summary.avg_stars_per_day - 0.4).abs() < f64::EPSILON);
        assert_eq!(
            summary.peak,
            Some((NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 2))
        );
        assert_eq!(summary.last_7_days, 1);

        let text = summary.to_string();
        assert!(text.contains("Total downloads:   1,520"));
        assert!(text.contains("Peak day:          2024-01-02 (2 stars)"));
    }

    #[test]
    fn test_single_star_has_floor_of_one_day() {
        let summary = GrowthSummary::new("x", &[ts("2024-01-01T00:00:00Z")], &[]);

        assert_eq!(summary.age_days, 0);
        assert!((summary.avg_stars_per_day - 1.0).abs() < f64::EPSILON);
    }
}
