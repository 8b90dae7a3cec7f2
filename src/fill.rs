// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Winding-partitioned fills.
//
// A path is tessellated twice: once keeping every region with a non-zero
// winding number, bucketed by that number, and once against an enclosing
// boundary to pick up the regions with winding zero. The buckets are then
// packed into one index array so that each standard fill rule is a single
// contiguous range.

mod attributes;
mod builder;
mod filled_path;
mod hoard;
mod subset;

pub use attributes::{FillAttributes, FillVertex};
pub use filled_path::{FillSubset, FilledPath, SubsetSizes};

/// The four fill rules that select a contiguous range of a `FilledPath`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FillRule {
    /// Odd winding numbers.
    OddEven,
    /// Even winding numbers, including zero.
    ComplementOddEven,
    /// Every non-zero winding number.
    NonZero,
    /// Winding number zero.
    ComplementNonZero,
}

impl FillRule {
    pub const ALL: [FillRule; 4] = [
        FillRule::OddEven,
        FillRule::ComplementOddEven,
        FillRule::NonZero,
        FillRule::ComplementNonZero,
    ];

    /// Whether a region with this winding number is filled by the rule.
    pub fn accepts(self, winding: i32) -> bool {
        match self {
            FillRule::OddEven => winding % 2 != 0,
            FillRule::ComplementOddEven => winding % 2 == 0,
            FillRule::NonZero => winding != 0,
            FillRule::ComplementNonZero => winding == 0,
        }
    }
}

/// Parameters for building a `FilledPath`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FillOptions {
    /// Surround runs of contour points with winding-neutral boxes. The extra
    /// edges split long thin regions into better shaped triangles.
    ///
    /// Default value: `true`.
    pub guide_boxes: bool,

    /// Contour points per guide box.
    ///
    /// Default value: `FillOptions::DEFAULT_POINTS_PER_BOX`.
    pub points_per_box: usize,

    /// Guide boxes per enclosing guide box, one level up.
    ///
    /// Default value: `FillOptions::DEFAULT_BOXES_PER_BOX`.
    pub boxes_per_box: usize,

    /// How far the winding-zero boundary sits outside the path bounds,
    /// relative to the larger side of the bounds.
    ///
    /// Default value: `FillOptions::DEFAULT_BOUNDARY_MARGIN`.
    pub boundary_margin: f32,

    /// A subset with more points than this is split in two.
    ///
    /// Default value: `FillOptions::DEFAULT_POINTS_PER_SUBSET`.
    pub points_per_subset: usize,

    /// How many times the path may be split in half, at most.
    ///
    /// Default value: `FillOptions::DEFAULT_SUBSET_DEPTH`.
    pub subset_depth: usize,
}

impl FillOptions {
    pub const DEFAULT_POINTS_PER_BOX: usize = 12;
    pub const DEFAULT_BOXES_PER_BOX: usize = 8;
    pub const DEFAULT_BOUNDARY_MARGIN: f32 = 1.0 / 1024.0;
    pub const DEFAULT_POINTS_PER_SUBSET: usize = 64;
    pub const DEFAULT_SUBSET_DEPTH: usize = 12;

    pub const DEFAULT: Self = FillOptions {
        guide_boxes: true,
        points_per_box: Self::DEFAULT_POINTS_PER_BOX,
        boxes_per_box: Self::DEFAULT_BOXES_PER_BOX,
        boundary_margin: Self::DEFAULT_BOUNDARY_MARGIN,
        points_per_subset: Self::DEFAULT_POINTS_PER_SUBSET,
        subset_depth: Self::DEFAULT_SUBSET_DEPTH,
    };

    #[inline]
    pub const fn with_guide_boxes(mut self, guide_boxes: bool) -> Self {
        self.guide_boxes = guide_boxes;
        self
    }

    #[inline]
    pub const fn with_points_per_box(mut self, points_per_box: usize) -> Self {
        self.points_per_box = points_per_box;
        self
    }

    #[inline]
    pub const fn with_boxes_per_box(mut self, boxes_per_box: usize) -> Self {
        self.boxes_per_box = boxes_per_box;
        self
    }

    #[inline]
    pub const fn with_boundary_margin(mut self, margin: f32) -> Self {
        self.boundary_margin = margin;
        self
    }

    #[inline]
    pub const fn with_points_per_subset(mut self, points: usize) -> Self {
        self.points_per_subset = points;
        self
    }

    #[inline]
    pub const fn with_subset_depth(mut self, depth: usize) -> Self {
        self.subset_depth = depth;
        self
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}
