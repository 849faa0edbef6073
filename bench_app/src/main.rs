#![allow(missing_docs)]

mod workload;

use clap::Parser;
use probe_map::MapConfig;
use workload::{run_workload, WorkloadOptions};

/// Runs a seeded random workload against a `ProbeMap`, cross-checking every result.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[clap(short = 'n', long, default_value = "100000")]
    ops: usize,
    #[clap(short = 'k', long, default_value = "50000")]
    key_space: u64,

    #[clap(short = 'c', long, default_value = "1000")]
    initial_capacity: usize,
    #[clap(short = 'l', long, default_value = "0.5")]
    load_factor: f64,

    #[clap(short = 's', long, default_value = "0")]
    seed: u64,
    #[clap(long, default_value = "0.3")]
    remove_weight: f64,
}

fn main() -> color_eyre::Result<()> {
    let args = Args::parse();

    color_eyre::install()?;
    probe_map_logger::setup();

    let options = WorkloadOptions {
        config: MapConfig::new()
            .with_initial_capacity(args.initial_capacity)
            .with_load_factor(args.load_factor),
        ops: args.ops,
        key_space: args.key_space,
        seed: args.seed,
        remove_weight: args.remove_weight,
    };

    log::info!("running {} operations over {} keys", args.ops, args.key_space);

    let start = std::time::Instant::now();
    let stats = run_workload(&options)?;
    let elapsed = start.elapsed();

    log::info!("# Operations");
    log::info!("inserted: {}", stats.inserts);
    log::info!("updated: {}", stats.updates);
    log::info!("hits: {}", stats.hits);
    log::info!("misses: {}", stats.misses);
    log::info!("removed: {}", stats.removals);
    log::info!("# Table");
    log::info!("entries: {}", stats.final_len);
    log::info!(
        "capacity: {} after {} growths",
        stats.final_capacity,
        stats.growths
    );
    log::info!("threshold: {}", stats.final_threshold);
    log::info!("elapsed: {elapsed:.2?}");

    Ok(())
}
