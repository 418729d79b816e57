//! CLI for notegrab.

mod commands;
mod shutdown;

use anyhow::Result;
use clap::{Parser, Subcommand};
use notegrab_core::config::{self, CrawlConfig};
use std::path::{Path, PathBuf};

use commands::{run_crawl, run_scan, run_show_config, CrawlOverrides};

/// Top-level CLI for notegrab.
#[derive(Debug, Parser)]
#[command(name = "notegrab")]
#[command(about = "notegrab: download every document linked from a course index page", long_about = None)]
pub struct Cli {
    /// Read configuration from PATH instead of ~/.config/notegrab/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Scan the index page and download every linked document.
    Crawl {
        /// Index page URL (default: page_url from config).
        url: Option<String>,
        /// Root download directory (default: output_dir from config).
        #[arg(long, short, value_name = "DIR")]
        output: Option<PathBuf>,
        /// Worker pool size.
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Spawn one task per document instead of using the worker pool.
        #[arg(long)]
        per_item: bool,
        /// With --per-item, cap concurrent downloads at N (default: --workers).
        #[arg(long, value_name = "N")]
        max_in_flight: Option<usize>,
    },

    /// List the documents the index page links to, without downloading.
    Scan {
        /// Index page URL (default: page_url from config).
        url: Option<String>,
        /// Print one JSON object per document.
        #[arg(long)]
        json: bool,
    },

    /// Show the config file location and effective configuration.
    Config,
}

/// Config from `--config`, or the XDG file (created with defaults on first use).
fn load_config(explicit: Option<&Path>) -> Result<(CrawlConfig, PathBuf)> {
    match explicit {
        Some(path) => Ok((config::load_from_path(path)?, path.to_path_buf())),
        None => Ok((config::load_or_init()?, config::config_path()?)),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let (cfg, cfg_path) = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config from {}: {:?}", cfg_path.display(), cfg);

        match cli.command {
            CliCommand::Crawl {
                url,
                output,
                workers,
                per_item,
                max_in_flight,
            } => {
                let overrides = CrawlOverrides {
                    url,
                    output,
                    workers,
                    per_item,
                    max_in_flight,
                };
                run_crawl(cfg, overrides).await?
            }
            CliCommand::Scan { url, json } => run_scan(cfg, url, json).await?,
            CliCommand::Config => run_show_config(&cfg, &cfg_path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
