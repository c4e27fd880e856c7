use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use log::info;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::series::{self, DayCount, ReleaseBar, ReleasePoint, MOVING_AVERAGE_WINDOW};
use super::summary::{thousands, GrowthSummary};
use crate::error::{Result, StarLensError};

pub const STARS_CUMULATIVE: &str = "stars_cumulative.png";
pub const STARS_PER_DAY: &str = "stars_per_day.png";
pub const DOWNLOADS_CUMULATIVE: &str = "downloads_cumulative.png";
pub const DOWNLOADS_PER_RELEASE: &str = "downloads_per_release.png";
pub const DASHBOARD: &str = "dashboard.png";

const SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const STAR_BLUE: RGBColor = RGBColor(10, 132, 255);
const STAR_TINT: RGBColor = RGBColor(232, 244, 253);
const SKY: RGBColor = RGBColor(90, 200, 250);
const DOWNLOAD_GREEN: RGBColor = RGBColor(52, 199, 89);
const DOWNLOAD_TINT: RGBColor = RGBColor(232, 251, 240);
const ALERT_RED: RGBColor = RGBColor(255, 59, 48);
const ALERT_TINT: RGBColor = RGBColor(255, 240, 240);
const INK: RGBColor = RGBColor(51, 51, 51);
const MUTED: RGBColor = RGBColor(102, 102, 102);
const EDGE: RGBColor = RGBColor(204, 204, 204);
const BLUES: (RGBColor, RGBColor) = (RGBColor(198, 219, 239), RGBColor(8, 48, 107));
const GREENS: (RGBColor, RGBColor) = (RGBColor(199, 233, 192), RGBColor(0, 68, 27));
const PURPLES: (RGBColor, RGBColor) = (RGBColor(218, 218, 235), RGBColor(63, 0, 125));

const STARS_SIZE: (u32, u32) = (1400, 700);
const PER_DAY_SIZE: (u32, u32) = (1400, 600);
const RELEASES_SIZE: (u32, u32) = (1600, 600);
const DASHBOARD_SIZE: (u32, u32) = (1800, 1200);
const HEADER_HEIGHT: u32 = 90;
const DASHBOARD_HEADER_HEIGHT: u32 = 110;

const DAY_SECS: f64 = 86_400.0;
const DAY_BAR_HALF_WIDTH: f64 = 0.425;
const WEEK_BAR_HALF_WIDTH: f64 = 2.5;
const CALLOUT_PAD: i32 = 6;

type Area<'b> = DrawingArea<BitMapBackend<'b>, Shift>;
type DayChart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Every series the charts draw, derived once from the two inputs.
///
/// X positions are fractional days since the origin date of the series, so
/// bars and lines share one axis and tick labels map back to calendar days.
pub struct ChartData {
    pub stars: Vec<DateTime<Utc>>,
    pub releases: Vec<ReleasePoint>,
    star_origin: NaiveDate,
    cumulative_stars: Vec<(f64, f64)>,
    milestones: Vec<(usize, (f64, f64))>,
    daily: Vec<(f64, u64)>,
    moving_average: Vec<(f64, f64)>,
    peak: Option<DayCount>,
    weekly: Vec<(f64, u64)>,
    download_origin: NaiveDate,
    cumulative_downloads: Vec<(f64, f64)>,
    release_bars: Vec<ReleaseBar>,
}

impl ChartData {
    #[allow(clippy::cast_precision_loss)]
    pub fn new(stars: Vec<DateTime<Utc>>, releases: Vec<ReleasePoint>) -> Self {
        let star_origin = stars.first().map_or_else(NaiveDate::default, |at| at.date_naive());
        let download_origin = releases
            .first()
            .map_or(star_origin, |r| r.date.date_naive());

        let cumulative_stars = series::cumulative_stars(&stars)
            .into_iter()
            .map(|(at, total)| (time_offset(star_origin, at), total as f64))
            .collect();
        let milestones = series::milestones_reached(&stars)
            .into_iter()
            .map(|(m, at)| (m, (time_offset(star_origin, at), m as f64)))
            .collect();

        let per_day = series::stars_per_day(&stars);
        let counts: Vec<u64> = per_day.iter().map(|d| d.count).collect();
        let moving_average = series::moving_average(&counts, MOVING_AVERAGE_WINDOW)
            .into_iter()
            .zip(per_day.iter().skip(MOVING_AVERAGE_WINDOW - 1))
            .map(|(avg, d)| (day_offset(star_origin, d.day), avg))
            .collect();

        let cumulative_downloads = releases
            .iter()
            .zip(series::cumulative_downloads(&releases))
            .map(|(r, total)| (time_offset(download_origin, r.date), total as f64))
            .collect();

        Self {
            peak: series::peak_day(&per_day),
            daily: day_counts(star_origin, &per_day),
            weekly: day_counts(star_origin, &series::stars_per_week(&stars)),
            release_bars: series::release_bars(&releases),
            star_origin,
            download_origin,
            cumulative_stars,
            milestones,
            moving_average,
            cumulative_downloads,
            stars,
            releases,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Detail {
    /// Standalone chart with callouts and value labels.
    Full,
    /// Dashboard cell.
    Panel,
}

struct Callout {
    text: RGBColor,
    edge: RGBColor,
    fill: RGBColor,
    size: u32,
}

const MILESTONE: Callout = Callout {
    text: INK,
    edge: EDGE,
    fill: WHITE,
    size: 13,
};

/// Writes the five chart images into `output_dir`.
pub fn render_all(
    data: &ChartData,
    summary: &GrowthSummary,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    register_fonts()?;

    let created = data.stars.first().map_or_else(String::new, |at| {
        at.format("%b %d, %Y").to_string()
    });
    let mut written = Vec::with_capacity(5);

    let path = output_dir.join(STARS_CUMULATIVE);
    render(&path, STARS_SIZE, |root| {
        let (header, body) = root.split_vertically(HEADER_HEIGHT);
        draw_heading(
            &header,
            &format!("{} -- GitHub Stars Growth", summary.title),
            &format!(
                "Created {created}  |  {} days  |  avg {:.0} stars/day",
                summary.age_days, summary.avg_stars_per_day
            ),
            26,
        )?;
        draw_cumulative_stars(&body, data, None, Detail::Full)
    })?;
    written.push(path);

    let path = output_dir.join(STARS_PER_DAY);
    render(&path, PER_DAY_SIZE, |root| {
        draw_stars_per_day(root, data, Some("Daily GitHub Stars"), Detail::Full)
    })?;
    written.push(path);

    let path = output_dir.join(DOWNLOADS_CUMULATIVE);
    render(&path, STARS_SIZE, |root| {
        draw_cumulative_downloads(root, data, Some("Cumulative Release Downloads"), Detail::Full)
    })?;
    written.push(path);

    let path = output_dir.join(DOWNLOADS_PER_RELEASE);
    render(&path, RELEASES_SIZE, |root| {
        draw_release_bars(root, &data.release_bars)
    })?;
    written.push(path);

    let path = output_dir.join(DASHBOARD);
    render(&path, DASHBOARD_SIZE, |root| {
        let (header, body) = root.split_vertically(DASHBOARD_HEADER_HEIGHT);
        draw_heading(
            &header,
            &format!("{} -- Growth Dashboard", summary.title),
            &format!(
                "Created {created}  |  {} days old  |  {} stars  |  {} downloads  |  {} releases",
                summary.age_days,
                thousands(summary.total_stars as u64),
                thousands(summary.total_downloads),
                summary.releases
            ),
            32,
        )?;

        let panels = body.split_evenly((2, 2));
        draw_cumulative_stars(
            &panels[0],
            data,
            Some(format!("GitHub Stars ({} total)", thousands(summary.total_stars as u64)).as_str()),
            Detail::Panel,
        )?;
        draw_stars_per_day(&panels[1], data, Some("Stars per Day"), Detail::Panel)?;
        draw_cumulative_downloads(
            &panels[2],
            data,
            Some(
                format!(
                    "Cumulative Downloads ({} total)",
                    thousands(summary.total_downloads)
                )
                .as_str(),
            ),
            Detail::Panel,
        )?;
        draw_weekly_stars(&panels[3], data)
    })?;
    written.push(path);

    Ok(written)
}

fn register_fonts() -> Result<()> {
    for (style, bytes) in [(FontStyle::Normal, SANS), (FontStyle::Bold, SANS_BOLD)] {
        register_font("sans-serif", style, bytes)
            .map_err(|_| StarLensError::Chart("embedded font could not be loaded".to_string()))?;
    }
    Ok(())
}

fn render<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(&Area<'_>) -> Result<()>,
{
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root)?;
    root.present()?;

    info!("Saved {}", path.display());
    Ok(())
}

fn font(size: u32, bold: bool) -> FontDesc<'static> {
    let font = ("sans-serif", size).into_font();
    if bold {
        font.style(FontStyle::Bold)
    } else {
        font
    }
}

#[allow(clippy::cast_possible_wrap)]
fn draw_heading(area: &Area<'_>, title: &str, subtitle: &str, title_size: u32) -> Result<()> {
    let (width, _) = area.dim_in_pixel();
    let anchor = Pos::new(HPos::Center, VPos::Top);
    let x = width as i32 / 2;

    area.draw_text(title, &font(title_size, true).color(&INK).pos(anchor), (x, 14))?;
    area.draw_text(
        subtitle,
        &font(16, false).color(&MUTED).pos(anchor),
        (x, 26 + title_size as i32),
    )?;
    Ok(())
}

fn day_chart<'a, 'b>(
    area: &'a Area<'b>,
    caption: Option<&str>,
    x_range: Range<f64>,
    y_max: f64,
    origin: NaiveDate,
    y_desc: &str,
) -> Result<DayChart<'a, 'b>> {
    let mut builder = ChartBuilder::on(area);
    builder
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(80);
    if let Some(caption) = caption {
        builder.caption(caption, font(22, true).color(&INK));
    }
    let mut chart = builder.build_cartesian_2d(x_range, 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(WHITE.mix(0.0))
        .bold_line_style(BLACK.mix(0.1))
        .x_labels(10)
        .x_label_formatter(&|x| day_label(origin, *x))
        .y_label_formatter(&|y| count_label(*y))
        .y_desc(y_desc)
        .axis_desc_style(font(15, false).color(&INK))
        .label_style(font(13, false).color(&MUTED))
        .draw()?;

    Ok(chart)
}

#[allow(clippy::cast_precision_loss)]
fn draw_cumulative_stars(
    area: &Area<'_>,
    data: &ChartData,
    caption: Option<&str>,
    detail: Detail,
) -> Result<()> {
    let points = &data.cumulative_stars;
    let mut chart = day_chart(
        area,
        caption,
        x_extent(points),
        y_top(data.stars.len() as f64, detail),
        data.star_origin,
        "Cumulative Stars",
    )?;

    chart.draw_series(AreaSeries::new(
        points.iter().copied(),
        0.0,
        STAR_BLUE.mix(0.15),
    ))?;
    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        STAR_BLUE.stroke_width(line_width(detail)),
    ))?;

    if detail == Detail::Full {
        for &(milestone, at) in &data.milestones {
            draw_callout(&mut chart, at, &[format!("{milestone} stars")], (45, -25), &MILESTONE)?;
        }
        if let Some(&at) = points.last() {
            let current = Callout {
                text: STAR_BLUE,
                edge: STAR_BLUE,
                fill: STAR_TINT,
                size: 15,
            };
            draw_callout(
                &mut chart,
                at,
                &[
                    format!("{} stars", thousands(data.stars.len() as u64)),
                    "(current)".to_string(),
                ],
                (-70, -25),
                &current,
            )?;
        }
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn draw_stars_per_day(
    area: &Area<'_>,
    data: &ChartData,
    caption: Option<&str>,
    detail: Detail,
) -> Result<()> {
    let max = data.daily.iter().map(|&(_, count)| count).max().unwrap_or(0);
    let last = data.daily.last().map_or(0.0, |&(x, _)| x);
    let mut chart = day_chart(
        area,
        caption,
        padded(0.0, last, DAY_BAR_HALF_WIDTH),
        y_top(max as f64, detail),
        data.star_origin,
        "Stars per Day",
    )?;

    chart.draw_series(data.daily.iter().map(|&(x, count)| {
        let color = match detail {
            Detail::Full => shade(BLUES, intensity(count, max)),
            Detail::Panel => SKY,
        };
        Rectangle::new(
            [
                (x - DAY_BAR_HALF_WIDTH, 0.0),
                (x + DAY_BAR_HALF_WIDTH, count as f64),
            ],
            color.filled(),
        )
    }))?;

    if !data.moving_average.is_empty() {
        let label = match detail {
            Detail::Full => format!("{MOVING_AVERAGE_WINDOW}-day moving avg"),
            Detail::Panel => format!("{MOVING_AVERAGE_WINDOW}-day avg"),
        };
        chart
            .draw_series(LineSeries::new(
                data.moving_average.iter().copied(),
                ALERT_RED.stroke_width(2),
            ))?
            .label(label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ALERT_RED.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(EDGE)
            .label_font(font(13, false).color(&INK))
            .draw()?;
    }

    if let (Detail::Full, Some(peak)) = (detail, data.peak) {
        let callout = Callout {
            text: ALERT_RED,
            edge: ALERT_RED,
            fill: ALERT_TINT,
            size: 13,
        };
        draw_callout(
            &mut chart,
            (day_offset(data.star_origin, peak.day), peak.count as f64),
            &[
                format!("Peak: {} stars", peak.count),
                peak.day.format("%b %d").to_string(),
            ],
            (0, -20),
            &callout,
        )?;
    }

    Ok(())
}

fn draw_cumulative_downloads(
    area: &Area<'_>,
    data: &ChartData,
    caption: Option<&str>,
    detail: Detail,
) -> Result<()> {
    let points = &data.cumulative_downloads;
    let total = points.last().map_or(0.0, |&(_, y)| y);
    let mut chart = day_chart(
        area,
        caption,
        x_extent(points),
        y_top(total, detail),
        data.download_origin,
        "Total Downloads",
    )?;

    chart.draw_series(AreaSeries::new(
        points.iter().copied(),
        0.0,
        DOWNLOAD_GREEN.mix(0.15),
    ))?;
    chart.draw_series(LineSeries::new(
        points.iter().copied(),
        DOWNLOAD_GREEN.stroke_width(line_width(detail)),
    ))?;
    let radius = if detail == Detail::Full { 4 } else { 3 };
    chart.draw_series(
        points
            .iter()
            .map(|&p| Circle::new(p, radius, DOWNLOAD_GREEN.filled())),
    )?;

    if let (Detail::Full, Some(&at)) = (detail, points.last()) {
        let callout = Callout {
            text: DOWNLOAD_GREEN,
            edge: DOWNLOAD_GREEN,
            fill: DOWNLOAD_TINT,
            size: 15,
        };
        let total_downloads: u64 = data.releases.iter().map(|r| r.downloads).sum();
        draw_callout(
            &mut chart,
            at,
            &[
                format!("{} total", thousands(total_downloads)),
                "downloads".to_string(),
            ],
            (-90, -25),
            &callout,
        )?;
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn draw_release_bars(area: &Area<'_>, bars: &[ReleaseBar]) -> Result<()> {
    let max = bars.iter().map(|b| b.downloads).max().unwrap_or(0);
    let segments = bars.len().max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(
            format!("Downloads per Release (last {})", series::RECENT_RELEASES),
            font(22, true).color(&INK),
        )
        .margin(20)
        .x_label_area_size(55)
        .y_label_area_size(80)
        .build_cartesian_2d((0..segments).into_segmented(), 0.0..y_top(max as f64, Detail::Full))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(WHITE.mix(0.0))
        .bold_line_style(BLACK.mix(0.1))
        .x_labels(segments)
        .x_label_formatter(&|segment| match segment {
            SegmentValue::CenterOf(i) => bars.get(*i).map(|b| b.tag.clone()).unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_formatter(&|y| count_label(*y))
        .x_desc("Release Version")
        .y_desc("Downloads")
        .axis_desc_style(font(15, false).color(&INK))
        .label_style(font(11, false).color(&MUTED))
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let color = shade(GREENS, intensity(bar.downloads, max));
        let mut rect = Rectangle::new(
            [
                (SegmentValue::Exact(i), 0.0),
                (SegmentValue::Exact(i + 1), bar.downloads as f64),
            ],
            color.filled(),
        );
        rect.set_margin(0, 0, 4, 4);
        rect
    }))?;

    let label_style = font(11, true)
        .color(&INK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    chart.draw_series(
        bars.iter()
            .enumerate()
            .filter(|(_, bar)| bar.highlighted)
            .map(|(i, bar)| {
                Text::new(
                    bar.downloads.to_string(),
                    (
                        SegmentValue::CenterOf(i),
                        bar.downloads as f64 + max as f64 * 0.02,
                    ),
                    label_style.clone(),
                )
            }),
    )?;

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn draw_weekly_stars(area: &Area<'_>, data: &ChartData) -> Result<()> {
    let max = data.weekly.iter().map(|&(_, count)| count).max().unwrap_or(0);
    let first = data.weekly.first().map_or(0.0, |&(x, _)| x);
    let last = data.weekly.last().map_or(0.0, |&(x, _)| x);
    let mut chart = day_chart(
        area,
        Some("Stars per Week"),
        padded(first, last, WEEK_BAR_HALF_WIDTH),
        y_top(max as f64, Detail::Panel),
        data.star_origin,
        "Weekly Stars",
    )?;

    chart.draw_series(data.weekly.iter().map(|&(x, count)| {
        Rectangle::new(
            [
                (x - WEEK_BAR_HALF_WIDTH, 0.0),
                (x + WEEK_BAR_HALF_WIDTH, count as f64),
            ],
            shade(PURPLES, intensity(count, max)).filled(),
        )
    }))?;

    Ok(())
}

/// Boxed label above `at`, joined to the point by a leader line.
///
/// `offset` is the bottom centre of the box in pixels relative to the point.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn draw_callout(
    chart: &mut DayChart<'_, '_>,
    at: (f64, f64),
    lines: &[String],
    offset: (i32, i32),
    look: &Callout,
) -> Result<()> {
    let line_height = (f64::from(look.size) * 1.3).ceil() as i32;
    let width = lines
        .iter()
        .map(|line| text_width(line, look.size))
        .max()
        .unwrap_or(0)
        + 2 * CALLOUT_PAD;
    let height = line_height * lines.len() as i32 + 2 * CALLOUT_PAD;
    let (center, bottom) = offset;
    let top = bottom - height;
    let corners = [(center - width / 2, top), (center + width / 2, bottom)];

    chart.draw_series(std::iter::once(
        EmptyElement::at(at)
            + PathElement::new(vec![(0, 0), (center, bottom)], MUTED.stroke_width(1))
            + Rectangle::new(corners, look.fill.filled())
            + Rectangle::new(corners, look.edge.stroke_width(1)),
    ))?;

    let style = font(look.size, true)
        .color(&look.text)
        .pos(Pos::new(HPos::Center, VPos::Top));
    for (i, line) in lines.iter().enumerate() {
        let y = top + CALLOUT_PAD + line_height * i as i32;
        chart.draw_series(std::iter::once(
            EmptyElement::at(at) + Text::new(line.clone(), (center, y), style.clone()),
        ))?;
    }

    Ok(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn text_width(text: &str, size: u32) -> i32 {
    (text.chars().count() as f64 * f64::from(size) * 0.62).ceil() as i32
}

#[allow(clippy::cast_precision_loss)]
fn time_offset(origin: NaiveDate, at: DateTime<Utc>) -> f64 {
    let midnight = origin.and_time(NaiveTime::MIN).and_utc();
    (at - midnight).num_seconds() as f64 / DAY_SECS
}

#[allow(clippy::cast_precision_loss)]
fn day_offset(origin: NaiveDate, day: NaiveDate) -> f64 {
    (day - origin).num_days() as f64
}

fn day_counts(origin: NaiveDate, counts: &[DayCount]) -> Vec<(f64, u64)> {
    counts
        .iter()
        .map(|d| (day_offset(origin, d.day), d.count))
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn day_label(origin: NaiveDate, x: f64) -> String {
    (origin + Duration::days(x.round() as i64))
        .format("%b %d")
        .to_string()
}

/// Integer ticks only; fractional ticks are left blank.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_label(y: f64) -> String {
    if y < 0.0 || y.fract().abs() > f64::EPSILON {
        return String::new();
    }
    thousands(y.round() as u64)
}

fn x_extent(points: &[(f64, f64)]) -> Range<f64> {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => padded(first.0, last.0, 0.0),
        _ => 0.0..1.0,
    }
}

/// `lo..hi` widened by `half_width` plus a 3% margin, never empty.
fn padded(lo: f64, hi: f64, half_width: f64) -> Range<f64> {
    let margin = ((hi - lo) * 0.03).max(0.5);
    (lo - half_width - margin)..(hi + half_width + margin)
}

/// Axis top with headroom for callouts on standalone charts.
fn y_top(max: f64, detail: Detail) -> f64 {
    let headroom = match detail {
        Detail::Full => 1.3,
        Detail::Panel => 1.1,
    };
    (max * headroom).max(1.0)
}

fn line_width(detail: Detail) -> u32 {
    match detail {
        Detail::Full => 3,
        Detail::Panel => 2,
    }
}

#[allow(clippy::cast_precision_loss)]
fn intensity(value: u64, max: u64) -> f64 {
    0.3 + 0.7 * value as f64 / max.max(1) as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn shade((light, dark): (RGBColor, RGBColor), t: f64) -> RGBColor {
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    RGBColor(
        mix(light.0, dark.0),
        mix(light.1, dark.1),
        mix(light.2, dark.2),
    )
}
