//! Growth charts rendered from exported stargazer and release download lists.
//!
//! Nothing is kept between runs: both inputs are read, every series is
//! recomputed, and the five images are rewritten.

mod input;
mod plots;
mod series;
mod summary;

use std::fs;
use std::path::PathBuf;

use log::info;

use crate::error::{Result, StarLensError};

pub use summary::GrowthSummary;

pub struct ChartConfig {
    pub stars_file: PathBuf,
    pub downloads_file: PathBuf,
    pub output_dir: PathBuf,
    pub title: String,
}

pub fn generate(config: &ChartConfig) -> Result<GrowthSummary> {
    info!("Reading chart inputs...");

    let stars = input::read_stars(&config.stars_file)?;
    let releases = input::read_releases(&config.downloads_file)?;

    if stars.is_empty() {
        return Err(StarLensError::MissingInput(format!(
            "{} contains no stargazer timestamps",
            config.stars_file.display()
        )));
    }

    info!("{} stars, {} releases", stars.len(), releases.len());
    info!("Generating charts...");

    fs::create_dir_all(&config.output_dir)?;

    let data = plots::ChartData::new(stars, releases);
    let summary = GrowthSummary::new(&config.title, &data.stars, &data.releases);
    plots::render_all(&data, &summary, &config.output_dir)?;
    info!("Charts saved to {}", config.output_dir.display());

    Ok(summary)
}
