use std::collections::HashMap;

use color_eyre::eyre::ensure;
use probe_map::{MapConfig, ProbeMap};
use rand::prelude::*;

#[derive(Clone, Debug)]
pub struct WorkloadOptions {
    pub config: MapConfig,
    pub ops: usize,
    pub key_space: u64,
    pub seed: u64,
    /// Fraction of operations that are removals. The rest is split evenly between insertions and
    /// lookups.
    pub remove_weight: f64,
}

#[derive(Clone, Debug, Default)]
pub struct WorkloadStats {
    pub inserts: usize,
    pub updates: usize,
    pub hits: usize,
    pub misses: usize,
    pub removals: usize,
    pub growths: usize,
    pub final_len: usize,
    pub final_capacity: usize,
    pub final_threshold: usize,
}

/// Runs the workload against a `ProbeMap` and a std `HashMap`, failing on the first disagreement.
pub fn run_workload(options: &WorkloadOptions) -> color_eyre::Result<WorkloadStats> {
    ensure!(options.key_space > 0, "key space must not be empty");
    ensure!(
        (0.0..=1.0).contains(&options.remove_weight),
        "remove weight {} is not within 0..=1",
        options.remove_weight
    );

    let mut map: ProbeMap<u64, u64> = ProbeMap::try_with_config(options.config)?;
    let mut reference = HashMap::new();
    let mut rng = rand_pcg::Pcg64::seed_from_u64(options.seed);
    let mut stats = WorkloadStats::default();

    let insert_limit = options.remove_weight + (1.0 - options.remove_weight) / 2.0;

    for op in 0..options.ops {
        let key = rng.gen_range(0..options.key_space);
        let roll: f64 = rng.gen();
        if roll < options.remove_weight {
            let removed = map.remove(&key);
            ensure!(
                removed == reference.remove(&key),
                "operation {op}: removing {key} returned {removed:?}"
            );
            if removed.is_some() {
                stats.removals += 1;
            }
        } else if roll < insert_limit {
            let value: u64 = rng.gen();
            let capacity = map.capacity();
            let previous = map.insert(key, value);
            ensure!(
                previous == reference.insert(key, value),
                "operation {op}: inserting {key} returned {previous:?}"
            );
            match previous {
                Some(_) => stats.updates += 1,
                None => stats.inserts += 1,
            }
            if map.capacity() != capacity {
                stats.growths += 1;
                log::debug!(
                    "operation {op}: capacity {capacity} -> {}",
                    map.capacity()
                );
            }
        } else {
            let found = map.get(&key);
            ensure!(
                found == reference.get(&key),
                "operation {op}: looking up {key} returned {found:?}"
            );
            match found {
                Some(_) => stats.hits += 1,
                None => stats.misses += 1,
            }
        }
        ensure!(
            map.len() == reference.len(),
            "operation {op}: map has {} entries, expected {}",
            map.len(),
            reference.len()
        );
    }

    stats.final_len = map.len();
    stats.final_capacity = map.capacity();
    stats.final_threshold = map.threshold();
    Ok(stats)
}
