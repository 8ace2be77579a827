//! Dump the configured pool.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;

/// Arguments for the show command
#[derive(Args)]
pub struct ShowArgs {
    /// Only list resources that are currently free
    #[clap(long)]
    pub available: bool,
}

#[derive(Serialize)]
struct Listing {
    count: usize,
    available_in_pool: usize,
    resources: Vec<respool_core::Resource>,
}

/// Print the resources of a freshly built pool as pretty JSON.
pub fn execute(args: &ShowArgs, config: Option<&Path>) -> Result<()> {
    let pool = super::build_pool(config)?;

    let resources = if args.available {
        pool.list_available()
    } else {
        pool.list_all()
    };

    let listing = Listing {
        count: pool.count(),
        available_in_pool: pool.available(),
        resources,
    };
    let json = serde_json::to_string_pretty(&listing).context("serializing resources")?;
    println!("{}", json);
    Ok(())
}
