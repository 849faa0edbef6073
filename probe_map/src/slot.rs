//! The tri-state cells making up the backing array of a [`ProbeMap`][crate::ProbeMap].

/// A single cell of the backing array of a [`ProbeMap`][crate::ProbeMap].
///
/// Slots start out `Empty`, become `Occupied` when an entry is written to them and turn into a
/// `Tombstone` when that entry is removed. A tombstone can be reused by a later insertion, but it
/// never turns back into `Empty` (only a resize, which allocates fresh slots, gets rid of
/// tombstones).
#[derive(Clone, Debug, Default)]
pub enum Slot<K, V> {
    /// The slot was never written to. Probing for a key stops here.
    #[default]
    Empty,
    /// The slot held an entry that was removed. Probing for a key continues past it.
    Tombstone,
    /// The slot holds a live entry.
    Occupied {
        /// The key of the entry.
        key: K,
        /// The value of the entry.
        value: V,
    },
}

impl<K, V> Slot<K, V> {
    /// Returns `true` if the slot holds a live entry.
    #[inline(always)]
    pub fn is_live(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    /// Returns `true` if a new entry may be written to this slot.
    #[inline(always)]
    pub fn is_vacant(&self) -> bool {
        !self.is_live()
    }

    /// Returns the key and value of a live entry.
    #[inline(always)]
    pub fn as_entry(&self) -> Option<(&K, &V)> {
        match self {
            Slot::Occupied { key, value } => Some((key, value)),
            _ => None,
        }
    }

    /// Takes the entry out of the slot, leaving a tombstone behind.
    ///
    /// Returns `None` and leaves the slot untouched unless it holds a live entry.
    #[inline]
    pub fn take_entry(&mut self) -> Option<(K, V)> {
        if !self.is_live() {
            return None;
        }
        match std::mem::replace(self, Slot::Tombstone) {
            Slot::Occupied { key, value } => Some((key, value)),
            _ => unreachable!(),
        }
    }

    /// Consumes the slot, returning the entry if it is live.
    #[inline]
    pub fn into_entry(self) -> Option<(K, V)> {
        match self {
            Slot::Occupied { key, value } => Some((key, value)),
            _ => None,
        }
    }
}
