use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map;
use std::hash::Hash;

use crate::update::Update;

/// An immutable key-value mapping, the unit of publication.
///
/// A snapshot is never mutated once it has been handed to readers; applying
/// a batch produces a new one via [`Snapshot::apply_batch`].
#[derive(Debug, Clone)]
pub struct Snapshot<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Snapshot<K, V> {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.entries.iter()
    }

    pub fn keys(&self) -> hash_map::Keys<'_, K, V> {
        self.entries.keys()
    }

    pub fn as_map(&self) -> &HashMap<K, V> {
        &self.entries
    }

    pub fn into_map(self) -> HashMap<K, V> {
        self.entries
    }
}

impl<K: Eq + Hash, V> Snapshot<K, V> {
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Snapshot<K, V> {
    /// Fold `batch` over a private copy of this snapshot, in arrival order.
    ///
    /// `Put` inserts or overwrites, `Drop` removes the key when present.
    /// The receiver is left untouched; readers holding it keep seeing the
    /// pre-batch state.
    pub fn apply_batch<I>(&self, batch: I) -> Self
    where
        I: IntoIterator<Item = Update<K, V>>,
    {
        let mut next = self.clone();
        next.apply_in_place(batch);
        next
    }

    /// Same fold as [`apply_batch`](Self::apply_batch) on an owned working copy.
    pub fn apply_in_place<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = Update<K, V>>,
    {
        for update in batch {
            match update {
                Update::Put { key, value } => {
                    self.entries.insert(key, value);
                }
                Update::Drop { key } => {
                    self.entries.remove(&key);
                }
            }
        }
    }
}

impl<K, V> Default for Snapshot<K, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K: Eq + Hash, V: PartialEq> PartialEq for Snapshot<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq + Hash, V: Eq> Eq for Snapshot<K, V> {}

impl<K, V> From<HashMap<K, V>> for Snapshot<K, V> {
    fn from(entries: HashMap<K, V>) -> Self {
        Self { entries }
    }
}

impl<K: Eq + Hash, V> FromIterator<(K, V)> for Snapshot<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a Snapshot<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Snap = Snapshot<String, String>;

    fn put(k: &str, v: &str) -> Update<String, String> {
        Update::put(k.to_string(), v.to_string())
    }

    fn del(k: &str) -> Update<String, String> {
        Update::drop(k.to_string())
    }

    fn snap(pairs: &[(&str, &str)]) -> Snap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn put_inserts_and_overwrites() {
        let s = snap(&[("a", "1")]);
        let next = s.apply_batch(vec![put("a", "2"), put("b", "3")]);
        assert_eq!(next, snap(&[("a", "2"), ("b", "3")]));
    }

    #[test]
    fn apply_leaves_source_untouched() {
        let s = snap(&[("a", "1")]);
        let _ = s.apply_batch(vec![del("a"), put("z", "9")]);
        assert_eq!(s, snap(&[("a", "1")]));
    }

    #[test]
    fn put_drop_put_resolves_to_last_put() {
        let next = Snap::empty().apply_batch(vec![put("k", "a"), del("k"), put("k", "b")]);
        assert_eq!(next.get("k").map(String::as_str), Some("b"));
    }

    #[test]
    fn put_then_drop_leaves_key_absent() {
        let next = Snap::empty().apply_batch(vec![put("k", "a"), del("k")]);
        assert!(!next.contains_key("k"));
        assert!(next.is_empty());
    }

    #[test]
    fn drop_of_absent_key_is_noop() {
        let s = snap(&[("a", "1"), ("b", "2")]);
        let next = s.apply_batch(vec![del("missing")]);
        assert_eq!(next, s);
    }

    #[test]
    fn empty_batch_is_identity() {
        let s = snap(&[("a", "1")]);
        assert_eq!(s.apply_batch(Vec::new()), s);
    }

    /// Deterministic pseudo-random update stream over a small key space.
    fn scripted_stream(len: usize) -> Vec<Update<String, String>> {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        (0..len)
            .map(|i| {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                let key = format!("k{}", (state >> 33) % 16);
                if (state >> 20) % 3 == 0 {
                    Update::drop(key)
                } else {
                    Update::put(key, format!("v{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn result_is_independent_of_chunking() {
        let stream = scripted_stream(500);
        let start = snap(&[("k1", "seed"), ("k2", "seed")]);
        let whole = start.apply_batch(stream.clone());

        for chunk in [1, 2, 3, 7, 64, 499, 500] {
            let chunked = stream
                .chunks(chunk)
                .fold(start.clone(), |acc, batch| acc.apply_batch(batch.to_vec()));
            assert_eq!(chunked, whole, "chunk size {chunk}");
        }
    }

    #[test]
    fn very_large_batch_applies_iteratively() {
        let batch: Vec<Update<u64, u64>> = (0..1_000_000u64).map(|i| Update::put(i % 1000, i)).collect();
        let next = Snapshot::empty().apply_batch(batch);
        assert_eq!(next.len(), 1000);
        assert_eq!(next.get(&999), Some(&999_999));
    }
}
