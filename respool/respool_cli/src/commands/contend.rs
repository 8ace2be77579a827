//! Typed contention: many requesters racing for the same type at once.

use anyhow::Result;
use clap::Args;
use respool_core::ResourceId;
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

/// Arguments for the contend command
#[derive(Args)]
pub struct ContendArgs {
    /// Resource type to request
    #[clap(long, default_value = "GPU")]
    pub kind: String,

    /// Number of typed resources to add before the race
    #[clap(long, default_value_t = 1)]
    pub resources: usize,

    /// Number of concurrent requesters
    #[clap(long, default_value_t = 10)]
    pub requesters: usize,

    /// Prefix for requester identities
    #[clap(long, default_value = "team42")]
    pub requester_prefix: String,
}

/// Add resources of one type, then fire all requesters at once and tally
/// the outcomes. Nothing is released, so at most `resources` plus any
/// configured resources of that type can succeed.
pub fn execute(args: &ContendArgs, config: Option<&Path>) -> Result<()> {
    let pool = Arc::new(super::build_pool(config)?);

    println!("Adding {} {} resource(s)...", args.resources, args.kind);
    for _ in 0..args.resources {
        let id = pool.add_resource(Some(&args.kind));
        println!("Resource created: {}", id);
    }

    println!("\nRunning {} concurrent requests...\n", args.requesters);
    let barrier = Arc::new(Barrier::new(args.requesters.max(1)));
    let handles: Vec<_> = (0..args.requesters)
        .map(|i| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            let kind = args.kind.clone();
            let requester = format!("{}-{}", args.requester_prefix, i);
            thread::spawn(move || {
                barrier.wait();
                (i, pool.request_typed(&kind, &requester))
            })
        })
        .collect();

    let mut winners: Vec<ResourceId> = Vec::new();
    let mut failures = 0;
    for handle in handles {
        let (i, outcome) = handle
            .join()
            .map_err(|_| anyhow::anyhow!("requester thread panicked"))?;
        match outcome {
            Ok(id) => {
                println!("[Thread-{}] allocated: {}", i, id);
                winners.push(id);
            }
            Err(err) => {
                println!("[Thread-{}] failed: {}", i, err);
                failures += 1;
            }
        }
    }

    println!("\nDone. Success: {}, Failures: {}", winners.len(), failures);

    let stats = pool.stats();
    println!(
        "Contended skips: {}, resource lock acquisitions: {}",
        stats.contended_skips, stats.slot_locks.acquisition_count
    );
    Ok(())
}
