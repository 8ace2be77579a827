//! Subcommands of the respool CLI.

pub mod contend;
pub mod drain;
pub mod show;

use anyhow::{Context, Result};
use log::info;
use respool_core::{PoolConfig, PoolManager};
use std::path::Path;

/// Load the configuration (or the defaults) and build a pool from it.
pub fn build_pool(config: Option<&Path>) -> Result<PoolManager> {
    let config = match config {
        Some(path) => PoolConfig::load(path)
            .with_context(|| format!("loading pool configuration {}", path.display()))?,
        None => PoolConfig::default(),
    };

    info!("Building pool with capacity {}", config.capacity);
    PoolManager::from_config(&config).context("building pool")
}
