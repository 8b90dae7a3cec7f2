// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::OnceLock;

use euclid::default::Box2D;
use log::{debug, warn};

use super::attributes::FillAttributes;
use super::builder::{build, fill_indices, Built, WindingBuckets};
use super::subset::{create_hierarchy, NodeContent, SubPath, SubsetNode};
use super::{FillOptions, FillRule};
use crate::error::{reserve, FillError};
use crate::path::{Point, TessellatedPath};

/// How much a subset asks of the renderer: its vertex count and the length
/// of the longest index range among the four fill rules.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SubsetSizes {
    pub attributes: usize,
    pub largest_index_block: usize,
}

impl SubsetSizes {
    fn fits(self, max_attributes: usize, max_indices: usize) -> bool {
        self.attributes <= max_attributes && self.largest_index_block <= max_indices
    }

    fn add(self, other: SubsetSizes) -> SubsetSizes {
        SubsetSizes {
            attributes: self.attributes + other.attributes,
            largest_index_block: self.largest_index_block + other.largest_index_block,
        }
    }
}

/// Triangles of one region of a path, with the triangles of each winding
/// number kept together.
///
/// Triangle indices are packed as all odd windings, then all even non-zero
/// windings, then winding zero. Each of the four `FillRule`s is therefore one
/// contiguous range, and so is every single winding number.
#[derive(Debug, Default)]
pub struct FillSubset {
    points: Vec<Point>,
    indices: Vec<u32>,
    windings: BTreeMap<i32, Range<usize>>,
    winding_numbers: Vec<i32>,
    even_non_zero_start: usize,
    zero_start: usize,
    attributes: OnceLock<FillAttributes>,
}

impl FillSubset {
    fn build(path: &TessellatedPath, options: &FillOptions) -> Result<Self, FillError> {
        Ok(Self::from_built(build(path, options)?))
    }

    fn from_built(built: Built) -> Self {
        FillSubset {
            winding_numbers: built.windings.keys().copied().collect(),
            points: built.points,
            indices: built.indices,
            windings: built.windings,
            even_non_zero_start: built.even_non_zero_start,
            zero_start: built.zero_start,
            attributes: OnceLock::new(),
        }
    }

    /// Both subsets in one: `b`'s points follow `a`'s, and each winding's
    /// triangles are `a`'s followed by `b`'s.
    fn merge(a: &FillSubset, b: &FillSubset) -> Result<Self, FillError> {
        let mut points = Vec::new();
        reserve(&mut points, a.points.len() + b.points.len())?;
        points.extend_from_slice(&a.points);
        points.extend_from_slice(&b.points);

        let offset = a.points.len() as u32;
        let mut buckets = WindingBuckets::new();
        for (&w, r) in &a.windings {
            let bucket = buckets.entry(w).or_default();
            reserve(bucket, r.len())?;
            bucket.extend_from_slice(&a.indices[r.clone()]);
        }
        for (&w, r) in &b.windings {
            let bucket = buckets.entry(w).or_default();
            reserve(bucket, r.len())?;
            bucket.extend(b.indices[r.clone()].iter().map(|i| i + offset));
        }

        let mut built = fill_indices(&buckets)?;
        built.points = points;
        Ok(Self::from_built(built))
    }

    pub fn sizes(&self) -> SubsetSizes {
        let largest_index_block = FillRule::ALL
            .iter()
            .map(|&r| self.rule_indices(r).len())
            .max()
            .unwrap_or(0);
        SubsetSizes {
            attributes: self.points.len(),
            largest_index_block,
        }
    }

    /// Every point the triangles refer to: the path's own points, then
    /// points made where edges cross, guide box corners and the zero
    /// boundary corners.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Triangles with exactly this winding number.
    pub fn indices(&self, winding: i32) -> &[u32] {
        match self.windings.get(&winding) {
            Some(r) => &self.indices[r.clone()],
            None => &[],
        }
    }

    pub fn nonzero_winding_indices(&self) -> &[u32] {
        &self.indices[..self.zero_start]
    }

    pub fn odd_winding_indices(&self) -> &[u32] {
        &self.indices[..self.even_non_zero_start]
    }

    /// Even windings, zero included.
    pub fn even_winding_indices(&self) -> &[u32] {
        &self.indices[self.even_non_zero_start..]
    }

    pub fn zero_winding_indices(&self) -> &[u32] {
        &self.indices[self.zero_start..]
    }

    pub fn rule_indices(&self, rule: FillRule) -> &[u32] {
        match rule {
            FillRule::OddEven => self.odd_winding_indices(),
            FillRule::ComplementOddEven => self.even_winding_indices(),
            FillRule::NonZero => self.nonzero_winding_indices(),
            FillRule::ComplementNonZero => self.zero_winding_indices(),
        }
    }

    /// Winding numbers that have triangles, in ascending order.
    pub fn winding_numbers(&self) -> &[i32] {
        &self.winding_numbers
    }

    /// Triangles of every winding number accepted by `pred`, concatenated in
    /// ascending winding order.
    pub fn indices_where(&self, mut pred: impl FnMut(i32) -> bool) -> Vec<u32> {
        let mut out = Vec::new();
        for (&w, r) in &self.windings {
            if pred(w) {
                out.extend_from_slice(&self.indices[r.clone()]);
            }
        }
        out
    }

    /// Attribute data for drawing, built on first use and shared afterwards.
    pub fn attribute_data(&self) -> &FillAttributes {
        self.attributes.get_or_init(|| {
            let rules = FillRule::ALL.map(|r| self.rule_indices(r));
            let windings = self
                .windings
                .iter()
                .map(|(&w, r)| (w, &self.indices[r.clone()]));
            FillAttributes::new(&self.points, rules, windings)
        })
    }
}

/// The triangulated interior of a path for every fill rule at once.
///
/// The queries below cover the whole path. Winding zero covers the part of a
/// box slightly larger than the path bounds that the path does not fill.
///
/// The path is also cut into a hierarchy of subsets by repeatedly halving its
/// box. Subset 0 is the whole path; every other subset holds the part of the
/// path inside its box, so a renderer can skip the subsets a clip region
/// misses (see `select_subsets`). Subset data is built on first access.
#[derive(Debug)]
pub struct FilledPath {
    whole: FillSubset,
    nodes: Vec<SubsetNode>,
    subsets: Vec<OnceLock<FillSubset>>,
    options: FillOptions,
}

impl FilledPath {
    pub fn new(path: &TessellatedPath) -> Result<Self, FillError> {
        Self::with_options(path, &FillOptions::DEFAULT)
    }

    pub fn with_options(path: &TessellatedPath, options: &FillOptions) -> Result<Self, FillError> {
        let whole = FillSubset::build(path, options)?;
        let nodes = create_hierarchy(
            SubPath::from_path(path),
            options.subset_depth,
            options.points_per_subset,
        );
        debug!("fill: {} subsets", nodes.len());
        Ok(FilledPath {
            whole,
            subsets: nodes.iter().map(|_| OnceLock::new()).collect(),
            nodes,
            options: *options,
        })
    }

    pub fn points(&self) -> &[Point] {
        self.whole.points()
    }

    /// Triangles with exactly this winding number.
    pub fn indices(&self, winding: i32) -> &[u32] {
        self.whole.indices(winding)
    }

    pub fn nonzero_winding_indices(&self) -> &[u32] {
        self.whole.nonzero_winding_indices()
    }

    pub fn odd_winding_indices(&self) -> &[u32] {
        self.whole.odd_winding_indices()
    }

    /// Even windings, zero included.
    pub fn even_winding_indices(&self) -> &[u32] {
        self.whole.even_winding_indices()
    }

    pub fn zero_winding_indices(&self) -> &[u32] {
        self.whole.zero_winding_indices()
    }

    pub fn rule_indices(&self, rule: FillRule) -> &[u32] {
        self.whole.rule_indices(rule)
    }

    pub fn winding_numbers(&self) -> &[i32] {
        self.whole.winding_numbers()
    }

    pub fn indices_where(&self, pred: impl FnMut(i32) -> bool) -> Vec<u32> {
        self.whole.indices_where(pred)
    }

    pub fn attribute_data(&self) -> &FillAttributes {
        self.whole.attribute_data()
    }

    pub fn number_subsets(&self) -> usize {
        self.nodes.len()
    }

    /// The box a subset was cut to. Its triangles may reach slightly past it
    /// by the winding-zero margin.
    pub fn subset_bounds(&self, id: usize) -> Box2D<f32> {
        self.nodes[id].bounds
    }

    /// The two halves of a subset, or `None` for a subset that was not split.
    pub fn subset_children(&self, id: usize) -> Option<[usize; 2]> {
        self.nodes[id].children()
    }

    /// Triangles of one subset. An unsplit subset is tessellated on its own;
    /// a split one merges its two halves.
    ///
    /// Panics if `id` is not below `number_subsets()`.
    pub fn subset(&self, id: usize) -> Result<&FillSubset, FillError> {
        if id == 0 {
            return Ok(&self.whole);
        }
        let cell = &self.subsets[id];
        if let Some(subset) = cell.get() {
            return Ok(subset);
        }
        let made = match &self.nodes[id].content {
            NodeContent::Split([a, b]) => FillSubset::merge(self.subset(*a)?, self.subset(*b)?)?,
            NodeContent::Leaf(sub_path) => FillSubset::build(&sub_path.to_path(), &self.options)?,
        };
        Ok(cell.get_or_init(|| made))
    }

    /// Sizes used for selection. A split subset other than the root counts
    /// the sum of its halves, which bounds the sizes of their merge.
    fn subset_sizes(&self, id: usize) -> Result<SubsetSizes, FillError> {
        match self.nodes[id].children() {
            Some([a, b]) if id != 0 => Ok(self.subset_sizes(a)?.add(self.subset_sizes(b)?)),
            _ => Ok(self.subset(id)?.sizes()),
        }
    }

    /// Ids of subsets whose boxes meet `clip`, together covering every
    /// triangle inside it. A subset is chosen whole when it fits within
    /// `max_attributes` vertices and `max_indices` indices per fill rule;
    /// otherwise its halves are considered instead. Subsets with no points
    /// are skipped.
    pub fn select_subsets(
        &self,
        clip: &Box2D<f32>,
        max_attributes: usize,
        max_indices: usize,
    ) -> Result<Vec<usize>, FillError> {
        let mut out = Vec::new();
        self.select_clipped(0, clip, (max_attributes, max_indices), &mut out)?;
        Ok(out)
    }

    fn select_clipped(
        &self,
        id: usize,
        clip: &Box2D<f32>,
        budget: (usize, usize),
        out: &mut Vec<usize>,
    ) -> Result<(), FillError> {
        let bounds = self.nodes[id].bounds;
        if !overlaps(&bounds, clip) {
            return Ok(());
        }
        match self.nodes[id].children() {
            Some([a, b]) if !encloses(clip, &bounds) => {
                self.select_clipped(a, clip, budget, out)?;
                self.select_clipped(b, clip, budget, out)
            }
            _ => self.select_unculled(id, budget, out),
        }
    }

    fn select_unculled(&self, id: usize, budget: (usize, usize), out: &mut Vec<usize>) -> Result<(), FillError> {
        let sizes = self.subset_sizes(id)?;
        if sizes.attributes == 0 {
            return Ok(());
        }
        if sizes.fits(budget.0, budget.1) {
            out.push(id);
            return Ok(());
        }
        match self.nodes[id].children() {
            Some([a, b]) => {
                self.select_unculled(a, budget, out)?;
                self.select_unculled(b, budget, out)
            }
            None => {
                warn!(
                    "fill: subset {} needs {} attributes and {} indices, over the budget",
                    id, sizes.attributes, sizes.largest_index_block
                );
                out.push(id);
                Ok(())
            }
        }
    }
}

fn overlaps(a: &Box2D<f32>, b: &Box2D<f32>) -> bool {
    a.min.x <= b.max.x && b.min.x <= a.max.x && a.min.y <= b.max.y && b.min.y <= a.max.y
}

fn encloses(outer: &Box2D<f32>, inner: &Box2D<f32>) -> bool {
    outer.min.x <= inner.min.x
        && outer.min.y <= inner.min.y
        && inner.max.x <= outer.max.x
        && inner.max.y <= outer.max.y
}
