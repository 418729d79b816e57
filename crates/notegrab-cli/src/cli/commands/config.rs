//! `notegrab config` – show where the config lives and what it resolves to.

use anyhow::Result;
use notegrab_core::config::CrawlConfig;
use std::path::Path;

pub fn run_show_config(cfg: &CrawlConfig, path: &Path) -> Result<()> {
    println!("# {}", path.display());
    if let Err(e) = cfg.validate() {
        println!("# warning: {}", e);
    }
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
