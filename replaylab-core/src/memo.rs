//! Memoizing computation cache.
//!
//! Each node is a stateful series computation bound to a source series and a
//! parameter tuple. Nodes are created lazily on first request and recomputed
//! at most once per simulated bar: a second request for the same key within
//! the same bar returns the already-written value.
//!
//! Keys are explicit BLAKE3 hashes of (kind, source series id, parameters),
//! so two indicators over different series or with different parameters never
//! share state.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::series::{Lookback, Observable, SeriesId};

/// Stable identity of a cache node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoKey([u8; 32]);

impl MemoKey {
    /// Hash of the indicator kind, the source series and the parameter tuple.
    pub fn new(kind: &str, source: SeriesId, params: &[f64]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(kind.as_bytes());
        hasher.update(&[0u8]);
        hasher.update(&source.0.to_le_bytes());
        for p in params {
            hasher.update(&p.to_bits().to_le_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Id of the node's own output series.
    pub fn series_id(&self) -> SeriesId {
        SeriesId::from_hash(blake3::Hash::from(self.0))
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for MemoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

struct Node {
    series: Lookback<f64>,
    state: Box<dyn Any + Send>,
    stamp: Option<u64>,
}

/// Run-scoped store of computation nodes.
#[derive(Default)]
pub struct MemoCache {
    nodes: HashMap<MemoKey, Node>,
    bar: u64,
    recomputes: u64,
}

impl fmt::Debug for MemoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("nodes", &self.nodes.len())
            .field("bar", &self.bar)
            .field("recomputes", &self.recomputes)
            .finish()
    }
}

impl MemoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new simulated bar. Nodes become eligible for one more recompute.
    pub fn begin_bar(&mut self, bar: u64) {
        self.bar = bar;
    }

    pub fn current_bar(&self) -> u64 {
        self.bar
    }

    /// Look up or create the node for `key` and run `step` once for the current bar.
    ///
    /// `step` receives the node's state and its history so far and returns the
    /// new value, which is written as offset 0. Non-finite values are stored
    /// as 0.
    ///
    /// # Panics
    /// If `key` already names a node whose state is not an `S`. Keys embed the
    /// indicator kind, so this only happens when two indicators share a kind name.
    pub fn compute<S, I, F>(&mut self, key: MemoKey, init: I, step: F) -> &Lookback<f64>
    where
        S: Any + Send,
        I: FnOnce() -> S,
        F: FnOnce(&mut S, &Lookback<f64>) -> f64,
    {
        let bar = self.bar;
        let node = self.nodes.entry(key).or_insert_with(|| Node {
            series: Lookback::with_id(key.series_id()),
            state: Box::new(init()),
            stamp: None,
        });

        if node.stamp != Some(bar) {
            let Some(state) = node.state.downcast_mut::<S>() else {
                panic!("memo node {key} holds a different state type");
            };
            let value = step(state, &node.series);
            node.series.write(if value.is_finite() { value } else { 0.0 });
            node.stamp = Some(bar);
            self.recomputes += 1;
        }

        &node.series
    }

    /// Output series of an existing node.
    pub fn series(&self, key: &MemoKey) -> Option<&Lookback<f64>> {
        self.nodes.get(key).map(|n| &n.series)
    }

    /// State of an existing node, if it holds an `S`.
    pub fn state<S: Any + Send>(&self, key: &MemoKey) -> Option<&S> {
        self.nodes.get(key).and_then(|n| n.state.downcast_ref::<S>())
    }

    pub fn contains(&self, key: &MemoKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total recompute steps run so far (diagnostics).
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.recomputes = 0;
    }
}

/// Key for a node over `source` with the given parameters.
pub fn key_for(kind: &str, source: &dyn Observable, params: &[f64]) -> MemoKey {
    MemoKey::new(kind, source.series_id(), params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_step(calls: &mut u32, _history: &Lookback<f64>) -> f64 {
        *calls += 1;
        *calls as f64
    }

    #[test]
    fn keys_differ_by_kind_source_and_params() {
        let a = SeriesId::from_origin("a");
        let b = SeriesId::from_origin("b");
        assert_eq!(MemoKey::new("vol", a, &[20.0]), MemoKey::new("vol", a, &[20.0]));
        assert_ne!(MemoKey::new("vol", a, &[20.0]), MemoKey::new("vol", a, &[21.0]));
        assert_ne!(MemoKey::new("vol", a, &[20.0]), MemoKey::new("vol", b, &[20.0]));
        assert_ne!(MemoKey::new("vol", a, &[20.0]), MemoKey::new("var", a, &[20.0]));
    }

    #[test]
    fn one_recompute_per_bar() {
        let mut cache = MemoCache::new();
        let key = MemoKey::new("count", SeriesId::from_origin("x"), &[]);

        cache.begin_bar(0);
        cache.compute(key, || 0u32, counting_step);
        let v = *cache.compute(key, || 0u32, counting_step).read(0).unwrap();
        assert_eq!(v, 1.0);
        assert_eq!(cache.state::<u32>(&key), Some(&1));

        cache.begin_bar(1);
        let series = cache.compute(key, || 0u32, counting_step);
        assert_eq!(series.read(0), Some(&2.0));
        assert_eq!(series.read(1), Some(&1.0));
        assert_eq!(cache.recomputes(), 2);
    }

    #[test]
    fn non_finite_values_are_stored_as_zero() {
        let mut cache = MemoCache::new();
        let key = MemoKey::new("nan", SeriesId::from_origin("x"), &[]);
        let series = cache.compute(key, || (), |_, _| f64::NAN);
        assert_eq!(series.read(0), Some(&0.0));
    }

    #[test]
    fn node_series_id_comes_from_key() {
        let mut cache = MemoCache::new();
        let key = MemoKey::new("id", SeriesId::from_origin("x"), &[]);
        let id = cache.compute(key, || (), |_, _| 1.0).id();
        assert_eq!(id, key.series_id());
    }

    #[test]
    #[should_panic(expected = "different state type")]
    fn mismatched_state_type_panics() {
        let mut cache = MemoCache::new();
        let key = MemoKey::new("clash", SeriesId::from_origin("x"), &[]);
        cache.compute(key, || 0u32, |_, _| 1.0);
        cache.begin_bar(1);
        cache.compute(key, || 0.0f64, |_, _| 1.0);
    }
}
