#![allow(missing_docs)]
use crate::{
    hash::{fibonacci_index, hash_ref},
    DefaultBuildHasher, MapConfig, ProbeMap,
};
use rand::prelude::*;
use std::{
    borrow::Borrow,
    fmt::Debug,
    hash::{BuildHasher, BuildHasherDefault, Hash, Hasher},
};

/// Hashes everything to one of four hash codes, producing long probe chains.
#[derive(Default)]
struct CollidingHasher(u64);

impl Hasher for CollidingHasher {
    fn finish(&self) -> u64 {
        self.0 % 4
    }
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 = self.0.wrapping_mul(31).wrapping_add(byte as u64);
        }
    }
}

/// Hashes everything to the same hash code.
#[derive(Default)]
struct ConstHasher;

impl Hasher for ConstHasher {
    fn finish(&self) -> u64 {
        0x5eed
    }
    fn write(&mut self, _bytes: &[u8]) {}
}

type CollidingMap<K, V> = ProbeMap<K, V, BuildHasherDefault<CollidingHasher>>;
type ConstMap<K, V> = ProbeMap<K, V, BuildHasherDefault<ConstHasher>>;

struct CheckedMap<K, V, S> {
    dut: ProbeMap<K, V, S>,
    ref_map: hashbrown::HashMap<K, V, DefaultBuildHasher>,
}

impl<K: Hash + Eq + Clone + Debug, V: Eq + Clone + Debug, S: BuildHasher> CheckedMap<K, V, S> {
    fn new(config: MapConfig, build_hasher: S) -> Self {
        CheckedMap {
            dut: ProbeMap::with_config_and_hasher(config, build_hasher),
            ref_map: hashbrown::HashMap::default(),
        }
    }
    fn len(&self) -> usize {
        let len = self.ref_map.len();
        assert_eq!(len, self.dut.len());
        len
    }
    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let ref_result = self.ref_map.get(key);
        let dut_result = self.dut.get(key);
        assert_eq!(ref_result, dut_result);
        ref_result
    }
    fn get_mut_update<Q>(&mut self, key: &Q, f: impl Fn(&mut V)) -> bool
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let ref_result = self.ref_map.get_mut(key).map(|value| f(value)).is_some();
        let dut_result = self.dut.get_mut(key).map(|value| f(value)).is_some();
        assert_eq!(ref_result, dut_result);
        ref_result
    }
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let capacity = self.dut.capacity();
        let ref_result = self.ref_map.insert(key.clone(), value.clone());
        let dut_result = self.dut.insert(key, value);
        assert_eq!(ref_result, dut_result);
        if self.dut.capacity() != capacity {
            assert_eq!(self.dut.capacity(), 2 * capacity);
            assert_eq!(self.dut.tombstone_count(), 0);
        }
        ref_result
    }
    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: Hash + Eq + ?Sized,
        K: Borrow<Q>,
    {
        let capacity = self.dut.capacity();
        let ref_result = self.ref_map.remove(key);
        let dut_result = self.dut.remove(key);
        assert_eq!(ref_result, dut_result);
        assert_eq!(self.dut.capacity(), capacity);
        ref_result
    }
    fn clear(&mut self) {
        let capacity = self.dut.capacity();
        self.ref_map.clear();
        self.dut.clear();
        assert_eq!(self.dut.capacity(), capacity);
        self.check();
    }
    fn check(&self) {
        self.dut.check();
        assert_eq!(self.ref_map.len(), self.dut.len());
        for (key, value) in self.ref_map.iter() {
            assert_eq!(self.dut.get_key_value(key), Some((key, value)));
        }
    }
    /// NB: `random_likelihood` is **not** a probability. `random_likelihood == 2.0` would be 2:1 odds random:present, i.e. 2/3 probability.
    fn present_or_random_key<R: Rng + SeedableRng>(
        &self,
        random_likelihood: f64,
        rng: &mut R,
        mut rand_k: impl FnMut(&mut R) -> K,
    ) -> K {
        debug_assert!(random_likelihood >= 0.0);
        if self.len() == 0 || rng.gen_range(0.0..1.0 + random_likelihood) >= 1.0 {
            rand_k(rng)
        } else {
            self.ref_map.keys().choose(rng).unwrap().clone()
        }
    }
}

macro_rules! weighted_choose {
    ($rng:expr, $($name:ident: $weight:expr => $body:expr),+) => {
        {
            enum Branches { $( $name,  )* }
            let weights = [$((Branches::$name, $weight)),+];
            match weights.choose_weighted($rng, |x| x.1).unwrap().0 {
                $(Branches::$name => $body),*
            }
        }
    }
}

fn test_suite<K, V, S, R>(
    config: MapConfig,
    build_hasher: S,
    mut rand_k: impl FnMut(&mut R) -> K,
    mut rand_v: impl FnMut(&mut R) -> V,
    update_fn: impl Fn(&mut V),
) where
    K: Hash + Eq + Clone + Debug,
    V: Eq + Clone + Debug,
    S: BuildHasher,
    R: Rng + SeedableRng,
{
    let mut map: CheckedMap<K, V, S> = CheckedMap::new(config, build_hasher);
    let mut rng = R::seed_from_u64(39);
    let mut max_size = 0;
    let verbosity = 1;
    for _ in 0..5000 {
        weighted_choose! {&mut rng,
            Insert: 2.0 => {
                let k = map.present_or_random_key(6.0, &mut rng, &mut rand_k);
                let v = rand_v(&mut rng);
                let result = map.insert(k.clone(), v.clone());
                if verbosity > 0 {
                    println!("inserting {k:?}: {v:?} -> {result:?}");
                }
            },
            Get: 0.5 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let result = map.get(&k);
                if verbosity > 0 {
                    println!("getting {k:?} -> {result:?}");
                }
            },
            GetMut: 0.3 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let result = map.get_mut_update(&k, &update_fn);
                if verbosity > 0 {
                    println!("updating {k:?} -> {result:?}");
                }
            },
            Remove: 1.0 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let result = map.remove(&k);
                if verbosity > 0 {
                    println!("removing {k:?} -> {result:?}");
                }
            },
            Clear: 0.002 => {
                map.clear();
                if verbosity > 0 {
                    println!("clearing");
                }
            },
            Check: 0.15 => {
                map.check();
            }
        };
        max_size = std::cmp::max(max_size, map.len());
    }
    map.check();
    println!(
        "max size {max_size}, final capacity {}",
        map.dut.capacity()
    );
}

fn small_config() -> MapConfig {
    MapConfig::new()
        .with_initial_capacity(3)
        .with_load_factor(0.75)
}

#[test]
fn test_suite_usize_usize() {
    test_suite::<usize, usize, _, rand_pcg::Pcg64>(
        small_config(),
        DefaultBuildHasher::default(),
        |rng| rng.gen::<usize>() >> rng.gen_range(0..usize::BITS),
        |rng| rng.gen(),
        |v| *v = v.wrapping_add(3),
    );
}

#[test]
fn test_suite_boxed_usize_boxed_usize() {
    test_suite::<Box<usize>, Box<usize>, _, rand_pcg::Pcg64>(
        MapConfig::new().with_initial_capacity(7),
        DefaultBuildHasher::default(),
        |rng| Box::new(rng.gen::<usize>() >> rng.gen_range(0..usize::BITS)),
        |rng| Box::new(rng.gen()),
        |v| **v = v.wrapping_add(3),
    );
}

#[test]
fn test_suite_string_u64() {
    test_suite::<String, u64, _, rand_pcg::Pcg64>(
        MapConfig::new()
            .with_initial_capacity(1)
            .with_load_factor(1.0),
        DefaultBuildHasher::default(),
        |rng| {
            let len = rng.gen_range(4..16);
            String::from_iter((0..len).map(|_| rng.gen_range('!'..'~')))
        },
        |rng| rng.gen(),
        |v| *v = v.wrapping_add(3),
    );
}

#[test]
fn test_suite_colliding_u32_string() {
    test_suite::<u32, String, _, rand_pcg::Pcg64>(
        small_config(),
        BuildHasherDefault::<CollidingHasher>::default(),
        |rng| rng.gen_range(0..512),
        |rng| {
            let len = rng.gen_range(8..32);
            String::from_iter((0..len).map(|_| rng.gen_range('!'..'~')))
        },
        |v| {
            let ch = v.remove(0);
            v.push(ch);
        },
    );
}

#[test]
fn test_suite_full_load_colliding() {
    test_suite::<u16, u16, _, rand_pcg::Pcg64>(
        MapConfig::new()
            .with_initial_capacity(8)
            .with_load_factor(1.0),
        BuildHasherDefault::<CollidingHasher>::default(),
        |rng| rng.gen_range(0..64),
        |rng| rng.gen(),
        |v| *v = v.wrapping_add(1),
    );
}

#[test]
fn test_tombstone_reuse() {
    let mut map: ConstMap<&str, u32> = ProbeMap::with_config_and_hasher(
        MapConfig::new().with_initial_capacity(16),
        Default::default(),
    );
    assert_eq!(map.insert("k1", 1), None);
    assert_eq!(map.insert("k2", 2), None);
    assert_eq!(map.remove("k1"), Some(1));
    assert_eq!(map.tombstone_count(), 1);
    map.check();

    assert_eq!(map.insert("k3", 3), None);
    assert_eq!(map.tombstone_count(), 0);
    assert_eq!(map.get("k1"), None);
    assert_eq!(map.get("k2"), Some(&2));
    assert_eq!(map.get("k3"), Some(&3));
    assert_eq!(map.len(), 2);
    map.check();
}

#[test]
fn test_lookup_past_tombstones() {
    let mut map: ConstMap<u32, u32> = ProbeMap::with_config_and_hasher(
        MapConfig::new().with_initial_capacity(32),
        Default::default(),
    );
    for key in 0..10 {
        map.insert(key, key * 10);
    }
    for key in 0..9 {
        assert_eq!(map.remove(&key), Some(key * 10));
    }
    assert_eq!(map.tombstone_count(), 9);
    assert_eq!(map.get(&9), Some(&90));
    assert_eq!(map.remove(&3), None);
    assert_eq!(map.len(), 1);
    map.check();
}

#[test]
fn test_overwrite_does_not_reuse_tombstone() {
    let mut map: ConstMap<u32, u32> = ProbeMap::with_config_and_hasher(
        MapConfig::new().with_initial_capacity(32),
        Default::default(),
    );
    map.insert(1, 1);
    map.insert(2, 2);
    map.remove(&1);
    // The key is found behind the tombstone and updated in place.
    assert_eq!(map.insert(2, 20), Some(2));
    assert_eq!(map.tombstone_count(), 1);
    assert_eq!(map.len(), 1);
    map.check();
}

fn key_with_start(capacity: usize, start: usize) -> u64 {
    (0u64..)
        .find(|key| fibonacci_index(hash_ref(key) as i64, capacity) == start)
        .unwrap()
}

#[test]
fn test_probe_cycle_guard() {
    let mut map: ProbeMap<u64, u64> = ProbeMap::with_config(
        MapConfig::new()
            .with_initial_capacity(2)
            .with_load_factor(1.0),
    );
    let k0 = key_with_start(2, 0);
    let k1 = key_with_start(2, 1);
    map.insert(k0, 0);
    map.remove(&k0);
    map.insert(k1, 1);
    map.remove(&k1);
    assert_eq!(map.capacity(), 2);
    assert_eq!(map.tombstone_count(), 2);

    // Every slot is a tombstone, so lookups end by returning to their start.
    assert_eq!(map.get(&k0), None);
    assert_eq!(map.remove(&k1), None);
    assert!(!map.contains_key(&12345));

    assert_eq!(map.insert(k1, 11), None);
    assert_eq!(map.get(&k1), Some(&11));
    assert_eq!(map.capacity(), 2);
    map.check();
}

#[test]
fn test_zero_load_factor_grows_every_insert() {
    let mut map: ProbeMap<u32, u32> = ProbeMap::with_config(
        MapConfig::new()
            .with_initial_capacity(2)
            .with_load_factor(0.0),
    );
    assert_eq!(map.threshold(), 0);
    map.insert(1, 1);
    assert_eq!(map.capacity(), 4);
    map.insert(1, 2);
    assert_eq!(map.capacity(), 4);
    map.insert(2, 2);
    assert_eq!(map.capacity(), 8);
    assert_eq!(map.threshold(), 0);
    map.check();
}

#[test]
fn test_growth_schedule() {
    let mut map: CollidingMap<u32, u32> = ProbeMap::with_config_and_hasher(
        MapConfig::new()
            .with_initial_capacity(5)
            .with_load_factor(0.6),
        Default::default(),
    );
    assert_eq!(map.threshold(), 3);
    assert_eq!(map.step(), 7);
    let mut expected_capacity = 5;
    for key in 0..200 {
        let threshold = map.threshold();
        map.insert(key, key);
        if key as usize + 1 >= threshold {
            expected_capacity *= 2;
            assert_eq!(map.threshold(), (0.6 * expected_capacity as f64) as usize);
        }
        assert_eq!(map.capacity(), expected_capacity);
        assert_eq!(map.step(), 7);
    }
    map.check();
    for key in 0..200 {
        assert_eq!(map.get(&key), Some(&key));
    }
}

#[test]
fn test_clear() {
    let mut map: ProbeMap<String, usize> = ProbeMap::with_capacity(4);
    for i in 0..20 {
        map.insert(i.to_string(), i);
    }
    let capacity = map.capacity();
    map.remove("3");
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.capacity(), capacity);
    assert_eq!(map.tombstone_count(), 0);
    assert_eq!(map.get("4"), None);
    map.insert("4".into(), 4);
    assert_eq!(map.get("4"), Some(&4));
    map.check();
}

#[test]
fn test_from_iter_and_debug() {
    let map: ProbeMap<&str, u32> = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("a"), Some(&3));
    assert_eq!(map.capacity(), 1000);
    let formatted = format!("{map:?}");
    assert!(formatted.contains("\"a\": 3"));
    assert!(formatted.contains("\"b\": 2"));
    map.check();
}
