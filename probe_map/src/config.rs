//! Construction parameters for [`ProbeMap`][crate::ProbeMap].
use std::fmt;

/// Number of slots allocated by [`MapConfig::default`].
pub const DEFAULT_INITIAL_CAPACITY: usize = 1000;

/// Load factor used by [`MapConfig::default`].
pub const DEFAULT_LOAD_FACTOR: f64 = 0.5;

/// Configuration of a [`ProbeMap`][crate::ProbeMap].
///
/// Both fields can be set independently; the others keep their defaults.
///
/// The load factor is clamped to `0.0..=1.0` during validation. A map grows as soon as its number
/// of entries reaches `floor(load_factor * capacity)`, so a load factor of `0.0` doubles the
/// capacity on every insertion of a new key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapConfig {
    /// Number of slots allocated up front. Must be non-zero.
    pub initial_capacity: usize,
    /// Target ratio of entries to slots.
    pub load_factor: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl MapConfig {
    /// Returns the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the initial capacity.
    pub fn with_initial_capacity(self, initial_capacity: usize) -> Self {
        MapConfig {
            initial_capacity,
            ..self
        }
    }

    /// Replaces the load factor.
    pub fn with_load_factor(self, load_factor: f64) -> Self {
        MapConfig {
            load_factor,
            ..self
        }
    }

    /// Checks the configuration, clamping the load factor into `0.0..=1.0`.
    pub fn validate(self) -> Result<ValidConfig, ConfigError> {
        if self.initial_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.load_factor.is_nan() {
            return Err(ConfigError::LoadFactorNotANumber);
        }
        Ok(ValidConfig {
            initial_capacity: self.initial_capacity,
            load_factor: self.load_factor.clamp(0.0, 1.0),
        })
    }
}

/// A [`MapConfig`] that passed validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidConfig {
    initial_capacity: usize,
    load_factor: f64,
}

impl Default for ValidConfig {
    fn default() -> Self {
        ValidConfig {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl ValidConfig {
    /// The initial number of slots, always non-zero.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// The load factor, always within `0.0..=1.0`.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Returns `floor(load_factor * capacity)`.
    pub fn threshold_for(&self, capacity: usize) -> usize {
        (self.load_factor * capacity as f64) as usize
    }
}

/// Error cases for invalid [`MapConfig`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The initial capacity was zero.
    ZeroCapacity,
    /// The load factor was NaN and thus cannot be clamped.
    LoadFactorNotANumber,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => f.write_str("initial capacity must be positive"),
            ConfigError::LoadFactorNotANumber => f.write_str("load factor must not be NaN"),
        }
    }
}

impl std::error::Error for ConfigError {}
