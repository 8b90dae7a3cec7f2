// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// GPU-ready view of a FilledPath.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use super::FillRule;
use crate::path::Point;

/// One vertex of the attribute array, packed as `(x, y, 0, 0)`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct FillVertex {
    pub position: [f32; 4],
}

/// Vertex and index arrays ready for upload, plus the index chunks to draw
/// for each fill rule and each non-zero winding number.
///
/// The first chunks are the four fill rules, in `FillRule` declaration
/// order. Winding numbers follow as 1, -1, 2, -2 and so on; winding zero
/// is the `ComplementNonZero` chunk.
#[derive(Clone, Debug, Default)]
pub struct FillAttributes {
    vertices: Vec<FillVertex>,
    indices: Vec<u32>,
    chunks: Vec<Range<usize>>,
}

const FILL_RULE_COUNT: usize = 4;

impl FillAttributes {
    pub(crate) fn new<'a>(
        points: &[Point],
        rules: [&[u32]; FILL_RULE_COUNT],
        windings: impl Iterator<Item = (i32, &'a [u32])> + Clone,
    ) -> Self {
        let vertices = points
            .iter()
            .map(|p| FillVertex { position: [p.x, p.y, 0.0, 0.0] })
            .collect();

        let chunk_count = windings
            .clone()
            .map(|(w, _)| Self::chunk_from_winding(w) + 1)
            .fold(FILL_RULE_COUNT, usize::max);
        let mut chunks = vec![0..0; chunk_count];
        let mut indices = Vec::new();

        for (rule, src) in FillRule::ALL.iter().zip(rules) {
            let start = indices.len();
            indices.extend_from_slice(src);
            chunks[Self::chunk_from_fill_rule(*rule)] = start..indices.len();
        }
        for (w, src) in windings.filter(|&(w, _)| w != 0) {
            let start = indices.len();
            indices.extend_from_slice(src);
            chunks[Self::chunk_from_winding(w)] = start..indices.len();
        }

        FillAttributes { vertices, indices, chunks }
    }

    pub fn chunk_from_fill_rule(rule: FillRule) -> usize {
        match rule {
            FillRule::OddEven => 0,
            FillRule::ComplementOddEven => 1,
            FillRule::NonZero => 2,
            FillRule::ComplementNonZero => 3,
        }
    }

    pub fn chunk_from_winding(winding: i32) -> usize {
        if winding == 0 {
            return Self::chunk_from_fill_rule(FillRule::ComplementNonZero);
        }
        let magnitude = winding.unsigned_abs() as usize;
        let negative = usize::from(winding < 0);
        FILL_RULE_COUNT + negative + 2 * (magnitude - 1)
    }

    pub fn vertices(&self) -> &[FillVertex] {
        &self.vertices
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn number_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Indices of one chunk; empty for a chunk with no triangles or out of
    /// range.
    pub fn chunk(&self, chunk: usize) -> &[u32] {
        match self.chunks.get(chunk) {
            Some(r) => &self.indices[r.clone()],
            None => &[],
        }
    }
}
