//! Generic secondary index: attribute value → bucket of record keys.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::common::EmployeeId;

/// Maps an indexed attribute value to the set of record keys sharing it.
///
/// One building block serves both kinds of secondary index:
/// - ordered (`u32` age, `u32` salary): [`ids_in_range`](Self::ids_in_range)
///   walks buckets in key order via `BTreeMap::range`
/// - categorical (`String` department): [`ids_for`](Self::ids_for) is an
///   exact lookup; an unknown category is an empty result, not an error
///
/// Buckets hold [`EmployeeId`]s only — the primary table remains the single
/// source of truth for record contents. Within a bucket, ids keep insertion
/// order. A bucket is created lazily on first insert and removed as soon as
/// its last member leaves, so an empty bucket never exists.
///
/// # Thread Safety
/// None here. The store wraps each index in its own `RwLock`.
#[derive(Debug, Default)]
pub struct SecondaryIndex<K: Ord> {
    buckets: BTreeMap<K, Vec<EmployeeId>>,
}

impl<K: Ord> SecondaryIndex<K> {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    /// Add `id` to the bucket for `key`, creating the bucket if needed.
    ///
    /// Callers guarantee the id is not already in that bucket (invariant I2).
    pub fn insert(&mut self, key: K, id: EmployeeId) {
        let bucket = self.buckets.entry(key).or_default();
        debug_assert!(!bucket.contains(&id), "duplicate id {id} in bucket");
        bucket.push(id);
    }

    /// Remove `id` from the bucket for `key`.
    ///
    /// Returns `false` if the bucket does not exist or does not contain the
    /// id — the caller decides whether that is a consistency fault. An
    /// emptied bucket is dropped.
    pub fn remove<Q>(&mut self, key: &Q, id: EmployeeId) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|&member| member == id) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        true
    }

    /// Ids in the bucket for exactly `key` (insertion order).
    pub fn ids_for<Q>(&self, key: &Q) -> Vec<EmployeeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.buckets.get(key).cloned().unwrap_or_default()
    }

    /// Ids in every bucket whose key falls within `range`, both ends
    /// inclusive. Bucket order follows key order; within a bucket,
    /// insertion order.
    ///
    /// Inverted bounds (`lo > hi`) are an empty result, not a panic.
    pub fn ids_in_range(&self, range: RangeInclusive<K>) -> Vec<EmployeeId> {
        if range.start() > range.end() {
            return Vec::new();
        }
        self.buckets
            .range(range)
            .flat_map(|(_, bucket)| bucket.iter().copied())
            .collect()
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total ids across all buckets.
    pub fn entry_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
