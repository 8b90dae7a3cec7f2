// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Sorted doubly linked list holding the active regions of the sweep, ordered
// bottom to top along the sweep line.
//
// The ordering depends on the current event, so the list does not own a
// comparator; callers pass one in on every ordered operation.

use crate::error::{reserve, TessResult};
use crate::mesh::INVALID;

pub type NodeIdx = u32;

/// The sentinel node at the head of the list. Its key is `INVALID`.
pub const DICT_HEAD: NodeIdx = 0;

#[derive(Clone, Debug)]
struct DictNode {
    key: u32,
    next: NodeIdx,
    prev: NodeIdx,
}

pub struct Dict {
    nodes: Vec<DictNode>,
    free: Vec<NodeIdx>,
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl Dict {
    pub fn new() -> Self {
        Dict {
            nodes: vec![DictNode {
                key: INVALID,
                next: DICT_HEAD,
                prev: DICT_HEAD,
            }],
            free: Vec::new(),
        }
    }

    /// Insert `key` at the first position before `node` (walking backwards)
    /// whose predecessor satisfies `leq(pred_key, key)`.
    pub fn insert_before<F>(&mut self, mut node: NodeIdx, key: u32, leq: F) -> TessResult<NodeIdx>
    where
        F: Fn(u32, u32) -> bool,
    {
        loop {
            node = self.nodes[node as usize].prev;
            let node_key = self.nodes[node as usize].key;
            if node_key == INVALID || leq(node_key, key) {
                break;
            }
        }
        let next = self.nodes[node as usize].next;
        let fresh = DictNode {
            key,
            next,
            prev: node,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = fresh;
                idx
            }
            None => {
                reserve(&mut self.nodes, 1)?;
                self.nodes.push(fresh);
                (self.nodes.len() - 1) as NodeIdx
            }
        };
        self.nodes[node as usize].next = idx;
        self.nodes[next as usize].prev = idx;
        Ok(idx)
    }

    pub fn delete(&mut self, node: NodeIdx) {
        debug_assert!(node != DICT_HEAD);
        let DictNode { next, prev, .. } = self.nodes[node as usize];
        self.nodes[next as usize].prev = prev;
        self.nodes[prev as usize].next = next;
        self.nodes[node as usize] = DictNode {
            key: INVALID,
            next: INVALID,
            prev: INVALID,
        };
        self.free.push(node);
    }

    /// First node from the bottom whose key satisfies `at_or_above`, or the
    /// head if there is none.
    pub fn search<F>(&self, at_or_above: F) -> NodeIdx
    where
        F: Fn(u32) -> bool,
    {
        let mut node = DICT_HEAD;
        loop {
            node = self.nodes[node as usize].next;
            let key = self.nodes[node as usize].key;
            if key == INVALID || at_or_above(key) {
                return node;
            }
        }
    }

    #[inline]
    pub fn key(&self, node: NodeIdx) -> u32 {
        self.nodes[node as usize].key
    }

    #[inline]
    pub fn min(&self) -> NodeIdx {
        self.nodes[DICT_HEAD as usize].next
    }

    #[inline]
    pub fn succ(&self, node: NodeIdx) -> NodeIdx {
        self.nodes[node as usize].next
    }

    #[inline]
    pub fn pred(&self, node: NodeIdx) -> NodeIdx {
        self.nodes[node as usize].prev
    }
}
