//! Bounded-pool churn: callers acquire, hold for a while, then release.

use anyhow::{anyhow, Result};
use clap::Args;
use respool_core::PoolError;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Arguments for the drain command
#[derive(Args)]
pub struct DrainArgs {
    /// Number of concurrent callers
    #[clap(long, default_value_t = 10)]
    pub callers: usize,

    /// How long each caller waits for a resource (defaults to the configured timeout)
    #[clap(long)]
    pub timeout_ms: Option<u64>,

    /// How long each caller holds its resource before releasing it
    #[clap(long, default_value_t = 100)]
    pub hold_ms: u64,
}

enum Outcome {
    Served { waited: Duration },
    TimedOut,
}

/// Run every caller against the bounded pool and report who was served.
pub fn execute(args: &DrainArgs, config: Option<&Path>) -> Result<()> {
    let pool = Arc::new(super::build_pool(config)?);
    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| pool.acquire_timeout());
    let hold = Duration::from_millis(args.hold_ms);

    println!(
        "Pool capacity {}, {} callers, timeout {:?}, hold {:?}\n",
        pool.capacity(),
        args.callers,
        timeout,
        hold
    );

    let handles: Vec<_> = (0..args.callers)
        .map(|i| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || -> Result<(usize, Outcome)> {
                let requester = format!("caller-{}", i);
                let start = Instant::now();
                match pool.request_bounded_as(timeout, &requester) {
                    Ok(id) => {
                        let waited = start.elapsed();
                        println!("[{}] acquired resource {} after {:?}", requester, id, waited);
                        thread::sleep(hold);
                        pool.release(&id, Some(&requester))?;
                        Ok((i, Outcome::Served { waited }))
                    }
                    Err(PoolError::TimedOut(_)) => {
                        println!("[{}] timed out", requester);
                        Ok((i, Outcome::TimedOut))
                    }
                    Err(err) => Err(err.into()),
                }
            })
        })
        .collect();

    let mut served = 0;
    let mut timed_out = 0;
    let mut longest_wait = Duration::ZERO;
    for handle in handles {
        let (_, outcome) = handle
            .join()
            .map_err(|_| anyhow!("caller thread panicked"))??;
        match outcome {
            Outcome::Served { waited } => {
                served += 1;
                longest_wait = longest_wait.max(waited);
            }
            Outcome::TimedOut => timed_out += 1,
        }
    }

    println!(
        "\nAcquired: {}, Timed out: {}, Longest wait: {:?}",
        served, timed_out, longest_wait
    );
    println!("Available resources: {}", pool.available());
    Ok(())
}
