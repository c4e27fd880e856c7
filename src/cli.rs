use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use crate::auth::Token;
use crate::charts::{self, ChartConfig};
use crate::collector::Collector;
use crate::providers::github::GitHubProvider;
use crate::repo::RepoId;
use crate::store::SnapshotStore;
use crate::timeline;

#[derive(Parser)]
#[command(name = "starlens")]
#[command(author, version, about = "GitHub repository metrics archive", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture today's snapshot from GitHub, then rebuild the timeline
    Snapshot {
        /// Repository as "owner/name"
        #[arg(short, long, env = "STARLENS_REPO")]
        repo: RepoId,

        /// GitHub API token (traffic endpoints need push access)
        #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// GitHub API base URL
        #[arg(short, long, default_value = "https://api.github.com/")]
        api_url: String,

        /// Directory holding one JSON snapshot per day
        #[arg(short, long, default_value = "analytics/data")]
        data_dir: PathBuf,
    },

    /// Rebuild timeline.json from the stored snapshots
    Timeline {
        /// Directory holding one JSON snapshot per day
        #[arg(short, long, default_value = "analytics/data")]
        data_dir: PathBuf,
    },

    /// Render growth charts from exported star and download lists
    Charts {
        /// Newline-separated stargazer timestamps
        #[arg(short, long)]
        stars_file: PathBuf,

        /// Tab-separated `tag  published_at  downloads` lines
        #[arg(short = 'D', long)]
        downloads_file: PathBuf,

        /// Directory the chart images are written to
        #[arg(short, long, default_value = "analytics")]
        output_dir: PathBuf,

        /// Project name shown in the summary
        #[arg(short, long, default_value = "Repository")]
        title: String,
    },
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Snapshot {
                repo,
                token,
                api_url,
                data_dir,
            } => {
                info!("Collecting GitHub metrics for repository: {repo}");

                let provider = GitHubProvider::new(
                    api_url,
                    repo.clone(),
                    Token::from_optional(token.as_deref()),
                )?;
                let store = SnapshotStore::new(data_dir);

                let snapshot = Collector::new(&provider).collect(Utc::now()).await;
                store.write_snapshot(&snapshot)?;
                timeline::rebuild(&store)?;

                info!("Done.");
                Ok(())
            }
            Commands::Timeline { data_dir } => {
                timeline::rebuild(&SnapshotStore::new(data_dir))?;
                Ok(())
            }
            Commands::Charts {
                stars_file,
                downloads_file,
                output_dir,
                title,
            } => {
                let config = ChartConfig {
                    stars_file: stars_file.clone(),
                    downloads_file: downloads_file.clone(),
                    output_dir: output_dir.clone(),
                    title: title.clone(),
                };

                let summary = charts::generate(&config)?;
                println!("{summary}");

                Ok(())
            }
        }
    }
}
