//! [ProbeMap] is a hash map using open addressing with fixed stride linear probing and lazy
//! deletion.
//!
//! All entries are stored directly in a single array of [`Slot`]s, each of which is empty,
//! occupied or a tombstone. A key's probe sequence starts at the multiplicative (Fibonacci) hash
//! of its hash code, see [`hash::fibonacci_index`], and advances by a constant odd stride that is
//! coprime to every capacity the map can reach, so each probe sequence visits every slot.
//!
//! Removing an entry turns its slot into a tombstone: lookups probe past tombstones while
//! insertions may reuse them. Tombstones are only discarded when the map grows, which happens when
//! the number of entries reaches `floor(load_factor * capacity)` after an insertion. Growing
//! doubles the capacity and rehashes every entry, giving amortized constant time insertions.
//!
//! The map is meant for single-threaded use and does not provide iteration.

pub mod config;
pub mod hash;
pub mod probe_map;
pub mod slot;

pub use config::{ConfigError, MapConfig};
pub use hash::DefaultBuildHasher;
pub use probe_map::ProbeMap;
pub use slot::Slot;

#[cfg(test)]
mod test_map;
