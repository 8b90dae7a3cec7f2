// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Event queue for the sweep.
//
// Two phases share one handle space:
//   - Before `init`, keys are appended to an array which `init` sorts once,
//     largest first, so the minimum is always at the end. Handles are negative.
//   - After `init`, new keys (intersection vertices) go into a binary heap.
//     Handles are non-negative.
// The minimum is whichever of the two fronts is smaller. Any key can be
// removed by handle.

use std::cmp::Ordering;

use crate::error::{reserve, TessError, TessResult};

/// Handle value for a vertex that is not in the queue.
pub const INVALID_HANDLE: i32 = i32::MAX;

pub type Leq<K> = fn(&K, &K) -> bool;

struct HandleSlot<K> {
    key: K,
    /// Position in `nodes`, or 0 once the handle has been freed.
    node: usize,
}

/// Binary min-heap addressed by handle.
struct Heap<K> {
    /// `nodes[1..=size]` hold handles in heap order; `nodes[0]` is unused.
    nodes: Vec<usize>,
    slots: Vec<HandleSlot<K>>,
    free: Vec<usize>,
    size: usize,
    initialized: bool,
    leq: Leq<K>,
}

impl<K: Copy> Heap<K> {
    fn new(leq: Leq<K>) -> Self {
        Heap {
            nodes: vec![0],
            slots: Vec::new(),
            free: Vec::new(),
            size: 0,
            initialized: false,
            leq,
        }
    }

    #[inline]
    fn handle_leq(&self, a: usize, b: usize) -> bool {
        (self.leq)(&self.slots[a].key, &self.slots[b].key)
    }

    #[inline]
    fn place(&mut self, pos: usize, h: usize) {
        self.nodes[pos] = h;
        self.slots[h].node = pos;
    }

    fn float_down(&mut self, mut curr: usize) {
        let h_curr = self.nodes[curr];
        loop {
            let mut child = curr << 1;
            if child < self.size && self.handle_leq(self.nodes[child + 1], self.nodes[child]) {
                child += 1;
            }
            if child > self.size || self.handle_leq(h_curr, self.nodes[child]) {
                self.place(curr, h_curr);
                return;
            }
            let h_child = self.nodes[child];
            self.place(curr, h_child);
            curr = child;
        }
    }

    fn float_up(&mut self, mut curr: usize) {
        let h_curr = self.nodes[curr];
        loop {
            let parent = curr >> 1;
            if parent == 0 || self.handle_leq(self.nodes[parent], h_curr) {
                self.place(curr, h_curr);
                return;
            }
            let h_parent = self.nodes[parent];
            self.place(curr, h_parent);
            curr = parent;
        }
    }

    fn init(&mut self) {
        for i in (1..=self.size).rev() {
            self.float_down(i);
        }
        self.initialized = true;
    }

    fn insert(&mut self, key: K) -> TessResult<usize> {
        self.size += 1;
        let curr = self.size;
        if curr >= self.nodes.len() {
            reserve(&mut self.nodes, 1)?;
            self.nodes.push(0);
        }
        let h = match self.free.pop() {
            Some(h) => {
                self.slots[h] = HandleSlot { key, node: curr };
                h
            }
            None => {
                reserve(&mut self.slots, 1)?;
                self.slots.push(HandleSlot { key, node: curr });
                self.slots.len() - 1
            }
        };
        self.nodes[curr] = h;
        if self.initialized {
            self.float_up(curr);
        }
        Ok(h)
    }

    fn minimum(&self) -> Option<K> {
        (self.size > 0).then(|| self.slots[self.nodes[1]].key)
    }

    fn extract_min(&mut self) -> Option<K> {
        if self.size == 0 {
            return None;
        }
        let h_min = self.nodes[1];
        let key = self.slots[h_min].key;
        let last = self.nodes[self.size];
        self.place(1, last);
        self.release(h_min);
        self.size -= 1;
        if self.size > 0 {
            self.float_down(1);
        }
        Some(key)
    }

    fn delete(&mut self, h: usize) {
        debug_assert!(self.slots[h].node != 0, "heap handle already freed");
        let curr = self.slots[h].node;
        let last = self.nodes[self.size];
        self.place(curr, last);
        self.size -= 1;
        if curr <= self.size {
            if curr <= 1 || self.handle_leq(self.nodes[curr >> 1], self.nodes[curr]) {
                self.float_down(curr);
            } else {
                self.float_up(curr);
            }
        }
        self.release(h);
    }

    fn release(&mut self, h: usize) {
        self.slots[h].node = 0;
        self.free.push(h);
    }
}

/// Sorted-array front end with a heap behind it.
pub struct PriorityQ<K> {
    heap: Heap<K>,
    keys: Vec<Option<K>>,
    /// Indices into `keys`, sorted largest first. Only the tail is consumed.
    order: Vec<usize>,
    initialized: bool,
    leq: Leq<K>,
}

impl<K: Copy> PriorityQ<K> {
    pub fn new(leq: Leq<K>) -> Self {
        PriorityQ {
            heap: Heap::new(leq),
            keys: Vec::new(),
            order: Vec::new(),
            initialized: false,
            leq,
        }
    }

    /// Sort the keys inserted so far and switch later inserts to the heap.
    pub fn init(&mut self) -> TessResult<()> {
        let keys = &self.keys;
        let leq = self.leq;
        let mut order: Vec<usize> = Vec::new();
        order
            .try_reserve(keys.len())
            .map_err(|_| TessError::OutOfMemory)?;
        order.extend((0..keys.len()).filter(|&i| keys[i].is_some()));
        order.sort_unstable_by(|&a, &b| match (&keys[a], &keys[b]) {
            (Some(ka), Some(kb)) => match (leq(ka, kb), leq(kb, ka)) {
                (true, true) => b.cmp(&a),
                (true, false) => Ordering::Greater,
                _ => Ordering::Less,
            },
            _ => b.cmp(&a),
        });
        self.order = order;
        self.initialized = true;
        self.heap.init();
        Ok(())
    }

    /// Insert a key and return its handle.
    pub fn insert(&mut self, key: K) -> TessResult<i32> {
        if self.initialized {
            return self.heap.insert(key).map(|h| h as i32);
        }
        reserve(&mut self.keys, 1)?;
        self.keys.push(Some(key));
        Ok(-(self.keys.len() as i32))
    }

    fn sorted_min(&self) -> Option<K> {
        self.order.last().and_then(|&i| self.keys[i])
    }

    pub fn minimum(&self) -> Option<K> {
        match (self.sorted_min(), self.heap.minimum()) {
            (Some(s), Some(h)) if (self.leq)(&h, &s) => Some(h),
            (Some(s), _) => Some(s),
            (None, h) => h,
        }
    }

    pub fn extract_min(&mut self) -> Option<K> {
        let sort_min = match self.sorted_min() {
            Some(s) => s,
            None => return self.heap.extract_min(),
        };
        if let Some(h) = self.heap.minimum() {
            if (self.leq)(&h, &sort_min) {
                return self.heap.extract_min();
            }
        }
        if let Some(i) = self.order.pop() {
            self.keys[i] = None;
        }
        self.trim();
        Some(sort_min)
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty() && self.heap.size == 0
    }

    /// Remove the key behind `handle`.
    pub fn delete(&mut self, handle: i32) {
        if handle >= 0 {
            self.heap.delete(handle as usize);
            return;
        }
        let curr = (-(handle + 1)) as usize;
        debug_assert!(self.keys[curr].is_some(), "sorted handle already removed");
        self.keys[curr] = None;
        self.trim();
    }

    fn trim(&mut self) {
        while let Some(&i) = self.order.last() {
            if self.keys[i].is_some() {
                break;
            }
            self.order.pop();
        }
    }
}
