//! Bounded least-recently-used container with insert-if-absent semantics.
//!
//! Entries live in a slab of nodes linked into a doubly linked recency list
//! (head = most recent, tail = least recent), with a map from key to slab
//! slot. Every operation runs under one mutex per container; no entry lock is
//! ever taken while it is held.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::observability::CacheMetrics;

struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

struct LruState<K, V> {
    map: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<K: Hash + Eq + Clone, V> LruState<K, V> {
    fn new() -> Self {
        Self { map: HashMap::new(), slots: Vec::new(), free: Vec::new(), head: None, tail: None, len: 0 }
    }

    fn allocate(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                idx
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    /// Detach a linked node from the recency list.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        if self.head == Some(idx) {
            self.head = next;
        } else if let Some(node) = prev.and_then(|p| self.slots[p].as_mut()) {
            node.next = next;
        }

        if self.tail == Some(idx) {
            self.tail = prev;
        } else if let Some(node) = next.and_then(|n| self.slots[n].as_mut()) {
            node.prev = prev;
        }

        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = None;
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(node) = self.slots[idx].as_mut() {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(node) = old_head.and_then(|h| self.slots[h].as_mut()) {
            node.prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn evict_tail(&mut self) -> bool {
        let Some(idx) = self.tail else {
            return false;
        };
        self.unlink(idx);
        match self.slots[idx].take() {
            Some(node) => {
                self.map.remove(&node.key);
                self.free.push(idx);
                self.len -= 1;
                true
            }
            None => false,
        }
    }
}

/// Fixed-capacity key/value container with least-recently-used eviction.
///
/// `put_if_absent` is a true set-once: an existing key keeps its value and its
/// recency. A capacity of zero retains nothing.
pub struct LruCache<K, V> {
    capacity: usize,
    layer: &'static str,
    state: Mutex<LruState<K, V>>,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    /// Create a container holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self::with_layer(capacity, "lru")
    }

    /// Create a container whose evictions are reported under `layer`.
    pub fn with_layer(capacity: usize, layer: &'static str) -> Self {
        Self { capacity, layer, state: Mutex::new(LruState::new()) }
    }

    fn lock(&self) -> MutexGuard<'_, LruState<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up `key`, promoting it to most recently used on a hit.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut state = self.lock();
        let idx = *state.map.get(key)?;
        state.promote(idx);
        state.slots[idx].as_ref().map(|node| node.value.clone())
    }

    /// Insert `value` under `key` unless the key is already present.
    ///
    /// Returns `true` when inserted. Inserting past capacity evicts the least
    /// recently used entry.
    pub fn put_if_absent(&self, key: K, value: V) -> bool {
        let mut state = self.lock();
        if state.map.contains_key(&key) {
            return false;
        }

        let idx = state.allocate(Node { key: key.clone(), value, prev: None, next: None });
        state.map.insert(key, idx);
        state.len += 1;
        state.push_front(idx);

        if state.len > self.capacity && state.evict_tail() {
            tracing::trace!(layer = self.layer, capacity = self.capacity, "Evicted least recently used entry");
            CacheMetrics::record_eviction(self.layer);
        }

        true
    }

    /// Whether `key` is present, without touching its recency.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.lock().map.contains_key(key)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.lock().len
    }

    /// Whether the container holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<K> {
        let state = self.lock();
        let mut keys = Vec::with_capacity(state.len);
        let mut cursor = state.head;
        while let Some(idx) = cursor {
            let node = state.slots[idx].as_ref().expect("linked slot is occupied");
            keys.push(node.key.clone());
            cursor = node.next;
        }
        keys
    }

    /// Walk the recency list and check its links against the map.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let state = self.lock();
        assert!(state.len <= self.capacity, "len {} exceeds capacity {}", state.len, self.capacity);
        assert_eq!(state.map.len(), state.len);

        let mut forward = Vec::new();
        let mut prev = None;
        let mut cursor = state.head;
        while let Some(idx) = cursor {
            let node = state.slots[idx].as_ref().expect("linked slot is occupied");
            assert_eq!(node.prev, prev, "broken prev link at slot {}", idx);
            assert_eq!(state.map.get(&node.key), Some(&idx));
            forward.push(idx);
            prev = Some(idx);
            cursor = node.next;
        }
        assert_eq!(forward.len(), state.len);
        assert_eq!(state.tail, forward.last().copied());

        let occupied = state.slots.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(occupied, state.len);
        assert_eq!(occupied + state.free.len(), state.slots.len());
    }
}
