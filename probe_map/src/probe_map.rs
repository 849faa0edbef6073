//! [ProbeMap] is an open addressing hash map using fixed stride linear probing and tombstones.
use crate::{
    config::{ConfigError, MapConfig, ValidConfig},
    hash::{fibonacci_index, probe_step, DefaultBuildHasher},
    slot::Slot,
};
use core::hash::Hash;
use std::{borrow::Borrow, fmt, hash::BuildHasher};

/// An open addressing hash map with fixed stride linear probing and lazy deletion.
///
/// In `ProbeMap<K, V, S>`,
/// `K: Hash + Eq` is the type of keys,
/// `V` is the type of values
/// and `S: BuildHasher` is used for hashing keys (`S` should usually be omitted, it then defaults
/// to [`DefaultBuildHasher`]).
///
/// All entries live directly in a single array of [`Slot`]s. A key's probe sequence starts at the
/// Fibonacci hash of its hash code and advances by a constant stride (see [`ProbeMap::step`]).
/// Removing an entry leaves a tombstone so that probe sequences passing through the slot stay
/// intact. When the number of entries reaches `floor(load_factor * capacity)` after an
/// insertion, the capacity is doubled and all entries are rehashed, dropping every tombstone.
///
/// Hashes are not stored with the entries, but recalculated when the map grows.
#[derive(Clone)]
pub struct ProbeMap<K, V, S = DefaultBuildHasher> {
    slots: Vec<Slot<K, V>>,
    len: usize,
    threshold: usize,
    step: usize,
    config: ValidConfig,
    build_hasher: S,
}

/// Outcome of walking a key's probe sequence.
enum Probed {
    /// A live slot holding an equal key.
    Found(usize),
    /// The key is not present. Carries the first slot of the sequence a new entry may be written
    /// to, if there is one.
    Absent { vacant: Option<usize> },
}

/// Yields each slot index of the probe sequence for `hash` exactly once.
///
/// The sequence stops early when it would return to its start index, which only happens before
/// visiting every slot if `step` and `capacity` share a factor.
#[inline]
fn probe_sequence(hash: u64, capacity: usize, step: usize) -> impl Iterator<Item = usize> {
    let start = fibonacci_index(hash as i64, capacity);
    let step = step % capacity;
    std::iter::successors(Some(start), move |&index| {
        let next = (index + step) % capacity;
        (next != start).then_some(next)
    })
}

fn empty_slots<K, V>(capacity: usize) -> Vec<Slot<K, V>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, Slot::default);
    slots
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for ProbeMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().filter_map(Slot::as_entry))
            .finish()
    }
}

impl<K, V, S: Default> Default for ProbeMap<K, V, S> {
    fn default() -> Self {
        Self::from_valid_config(ValidConfig::default(), S::default())
    }
}

impl<K, V> ProbeMap<K, V> {
    /// Returns an empty map with the default capacity and load factor.
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns an empty map with `capacity` slots and the default load factor.
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(MapConfig::new().with_initial_capacity(capacity))
    }
    /// Returns an empty map with the default capacity and the given load factor.
    ///
    /// The load factor is clamped to `0.0..=1.0`. Panics if it is NaN.
    pub fn with_load_factor(load_factor: f64) -> Self {
        Self::with_config(MapConfig::new().with_load_factor(load_factor))
    }
    /// Returns an empty map configured by `config`.
    ///
    /// Panics if `config` is invalid, see [`MapConfig::validate`].
    pub fn with_config(config: MapConfig) -> Self {
        Self::with_config_and_hasher(config, DefaultBuildHasher::default())
    }
    /// Returns an empty map configured by `config`, or an error if `config` is invalid.
    pub fn try_with_config(config: MapConfig) -> Result<Self, ConfigError> {
        Self::try_with_config_and_hasher(config, DefaultBuildHasher::default())
    }
}

impl<K, V, S> ProbeMap<K, V, S> {
    fn from_valid_config(config: ValidConfig, build_hasher: S) -> Self {
        let capacity = config.initial_capacity();
        ProbeMap {
            slots: empty_slots(capacity),
            len: 0,
            threshold: config.threshold_for(capacity),
            step: probe_step(capacity),
            config,
            build_hasher,
        }
    }
    /// Returns an empty map with the default configuration and the provided BuildHasher.
    pub fn with_hasher(build_hasher: S) -> Self {
        Self::from_valid_config(ValidConfig::default(), build_hasher)
    }
    /// Returns an empty map configured by `config` using the provided BuildHasher.
    ///
    /// Panics if `config` is invalid, see [`MapConfig::validate`].
    pub fn with_config_and_hasher(config: MapConfig, build_hasher: S) -> Self {
        match Self::try_with_config_and_hasher(config, build_hasher) {
            Ok(map) => map,
            Err(err) => panic!("invalid probe map configuration: {err}"),
        }
    }
    /// Returns an empty map configured by `config` using the provided BuildHasher, or an error if
    /// `config` is invalid.
    pub fn try_with_config_and_hasher(
        config: MapConfig,
        build_hasher: S,
    ) -> Result<Self, ConfigError> {
        Ok(Self::from_valid_config(config.validate()?, build_hasher))
    }
    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.len
    }
    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
    /// Returns the number of entries at which the map grows.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
    /// Returns the load factor after clamping.
    pub fn load_factor(&self) -> f64 {
        self.config.load_factor()
    }
    /// Returns the stride between consecutive slots of a probe sequence.
    ///
    /// This is the smallest odd number not below 7 that is coprime to the initial capacity, so it
    /// stays coprime to every capacity the map grows to.
    pub fn step(&self) -> usize {
        self.step
    }
    /// Returns a reference to the map's BuildHasher.
    pub fn hasher(&self) -> &S {
        &self.build_hasher
    }
    /// Removes all entries, but keeps the allocated slots.
    pub fn clear(&mut self) {
        self.slots.fill_with(Slot::default);
        self.len = 0;
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ProbeMap<K, V, S> {
    /// Walks the probe sequence of `key` until it finds the key or an empty slot.
    ///
    /// Tombstones and slots holding other keys are skipped. If the sequence returns to its start,
    /// the key is reported as absent.
    fn probe<Q>(&self, hash: u64, key: &Q) -> Probed
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut vacant = None;
        for index in probe_sequence(hash, self.slots.len(), self.step) {
            match &self.slots[index] {
                Slot::Empty => {
                    return Probed::Absent {
                        vacant: vacant.or(Some(index)),
                    }
                }
                Slot::Tombstone => {
                    vacant.get_or_insert(index);
                }
                Slot::Occupied { key: found, .. } => {
                    let found: &Q = found.borrow();
                    if found == key {
                        return Probed::Found(index);
                    }
                }
            }
        }
        log::trace!(
            "probe sequence exhausted all {} slots without reaching an empty slot",
            self.slots.len()
        );
        Probed::Absent { vacant }
    }

    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.build_hasher.hash_one(key);
        match self.probe(hash, key) {
            Probed::Found(index) => Some(index),
            Probed::Absent { .. } => None,
        }
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If an equivalent key already exists, its value is replaced and the old value is returned.
    /// The key itself is not updated in that case. Otherwise the entry is written to the first
    /// empty slot or tombstone of the key's probe sequence and `None` is returned.
    ///
    /// Grows the map when the number of entries reaches [`threshold`][Self::threshold].
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.build_hasher.hash_one(&key);
        match self.probe(hash, &key) {
            Probed::Found(index) => match &mut self.slots[index] {
                Slot::Occupied { value: old, .. } => Some(std::mem::replace(old, value)),
                _ => unreachable!(),
            },
            Probed::Absent { vacant } => {
                // The map grows before every slot is live, so a vacant slot is always reachable.
                let Some(index) = vacant else {
                    unreachable!("probe map has no vacant slot")
                };
                self.slots[index] = Slot::Occupied { key, value };
                self.len += 1;
                if self.len >= self.threshold {
                    self.grow();
                }
                None
            }
        }
    }

    /// Returns a reference to the value corresponding to the key, if it exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns references to the key and value corresponding to the key, if it exists.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        self.slots[index].as_entry()
    }

    /// Returns a mutable reference to the value corresponding to the key, if it exists.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        match &mut self.slots[index] {
            Slot::Occupied { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if the map contains an entry for the key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    /// Removes the entry for the key and returns its value, if it exists.
    ///
    /// The slot is turned into a tombstone. Removal never shrinks the map.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes the entry for the key and returns the stored key and value, if it exists.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        let entry = self.slots[index].take_entry();
        if entry.is_some() {
            self.len -= 1;
        }
        entry
    }

    /// Doubles the capacity and moves every entry to its slot under the new capacity.
    ///
    /// The new slots are populated before they replace the old ones. All hashes are computed up
    /// front, so a panicking `Hash` implementation leaves the map unchanged.
    #[inline(never)]
    #[cold]
    fn grow(&mut self) {
        let old_capacity = self.slots.len();
        let new_capacity = old_capacity.checked_mul(2).expect("capacity overflow");
        debug_assert_eq!(crate::hash::gcd(self.step, new_capacity), 1);

        let hashes: Vec<u64> = self
            .slots
            .iter()
            .filter_map(Slot::as_entry)
            .map(|(key, _)| self.build_hasher.hash_one(key))
            .collect();

        let mut new_slots = empty_slots(new_capacity);
        let entries = std::mem::take(&mut self.slots)
            .into_iter()
            .filter_map(Slot::into_entry);
        for ((key, value), hash) in entries.zip(hashes) {
            // Keys are unique, so only vacancy matters here.
            let target = probe_sequence(hash, new_capacity, self.step)
                .find(|&index| new_slots[index].is_vacant());
            let Some(index) = target else {
                unreachable!("grown probe map has no vacant slot")
            };
            new_slots[index] = Slot::Occupied { key, value };
        }

        self.slots = new_slots;
        self.threshold = self.config.threshold_for(new_capacity);
        log::debug!(
            "grew probe map from {old_capacity} to {new_capacity} slots, {} entries, threshold {}",
            self.len,
            self.threshold
        );
    }

    #[cfg(test)]
    pub(crate) fn check(&self) {
        let capacity = self.capacity();
        assert!(capacity > 0);
        assert!(self.len < capacity);
        assert_eq!(self.threshold, self.config.threshold_for(capacity));
        assert_eq!(crate::hash::gcd(self.step, capacity), 1);
        let live = self.slots.iter().filter(|slot| slot.is_live()).count();
        assert_eq!(live, self.len);
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some((key, _)) = slot.as_entry() {
                // An earlier duplicate of the key would be found first.
                assert_eq!(self.find_index(key), Some(index));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn tombstone_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Tombstone))
            .count()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> Extend<(K, V)> for ProbeMap<K, V, S> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Hash + Eq, V, S: BuildHasher + Default> FromIterator<(K, V)> for ProbeMap<K, V, S> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

#[test]
fn test() {
    let mut map: ProbeMap<String, usize> = ProbeMap::with_capacity(4);
    map.insert("adam".into(), 10);
    map.insert("eve".into(), 25);
    map.insert("mallory".into(), 8);
    map.insert("jim".into(), 14);
    assert_eq!(map.remove("eve"), Some(25));
    dbg!(&map);
    map.check();
}
