//! Hashing support: the default hasher and the transform from hash codes to slot indices.
use std::hash::{BuildHasher, Hash};

use zwohash::ZwoHasher;

/// The [`BuildHasher`] used by [`ProbeMap`][crate::ProbeMap] unless another one is provided.
pub type DefaultBuildHasher = std::hash::BuildHasherDefault<ZwoHasher>;

/// The golden ratio fraction `0.6180339887...` as a 64-bit fixed point number.
const GOLDEN_FRACTION: u64 = 0x9E37_79B9_7F4A_7C15;

/// The stride used between consecutive probes unless it shares a factor with the capacity.
pub const BASE_STEP: usize = 7;

/// Computes the hash of a value using the default hasher.
#[inline]
pub fn hash_value<T: Hash>(value: T) -> u64 {
    DefaultBuildHasher::default().hash_one(value)
}

/// Computes the hash of a reference using the default hasher.
///
/// This forwards to [`hash_value`]. Restricting the argument to be a reference is occasionally
/// useful for type inference.
#[inline]
pub fn hash_ref<T: Hash>(value: &T) -> u64 {
    hash_value(value)
}

/// Maps a signed hash code to a slot index in `0..capacity` using multiplicative (Fibonacci)
/// hashing.
///
/// The absolute value of the hash code is multiplied by the golden ratio fraction, the integral
/// part is dropped and the remaining fraction is scaled by `capacity`. All of this is done in
/// fixed point arithmetic: the wrapping product keeps exactly the fractional bits and the final
/// scaling uses a widening multiply, so `i64::MIN` and very large capacities are handled exactly.
///
/// `capacity` must be non-zero.
#[inline]
pub fn fibonacci_index(hash_code: i64, capacity: usize) -> usize {
    debug_assert!(capacity > 0);
    let fraction = hash_code.unsigned_abs().wrapping_mul(GOLDEN_FRACTION);
    ((fraction as u128 * capacity as u128) >> u64::BITS) as usize
}

/// Returns the probe stride for a table whose initial capacity is `capacity`.
///
/// Tables only grow by doubling, and an odd stride that is coprime to the initial capacity stays
/// coprime to every doubled capacity. Thus the returned stride lets a probe sequence reach every
/// slot for the whole lifetime of the table.
pub fn probe_step(capacity: usize) -> usize {
    let mut step = BASE_STEP;
    while gcd(step, capacity) != 1 {
        step += 2;
    }
    step
}

pub(crate) fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
