// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Spatial hierarchy over a path. Each node's box is split in half along one
// axis and its contours are clipped into the two halves, until a node has
// few enough points or the depth limit is reached.

use euclid::default::Box2D;
use euclid::point2;

use crate::path::{Point, TessellatedPath};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    const BOTH: [Axis; 2] = [Axis::X, Axis::Y];

    fn of(self, p: Point) -> f32 {
        match self {
            Axis::X => p.x,
            Axis::Y => p.y,
        }
    }

    /// The point at `along` on this axis and `across` on the other one.
    fn point(self, along: f32, across: f32) -> Point {
        match self {
            Axis::X => point2(along, across),
            Axis::Y => point2(across, along),
        }
    }

    fn other(self) -> Axis {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// The part of a path inside one box, as closed point loops.
#[derive(Clone, Debug)]
pub(crate) struct SubPath {
    bounds: Box2D<f32>,
    contours: Vec<Vec<Point>>,
    total_points: usize,
}

impl SubPath {
    pub fn from_path(path: &TessellatedPath) -> Self {
        let contours = (0..path.number_contours())
            .map(|c| path.contour_points(c).collect())
            .collect();
        Self::new(path.bounds().unwrap_or_else(Box2D::zero), contours)
    }

    fn new(bounds: Box2D<f32>, contours: Vec<Vec<Point>>) -> Self {
        let total_points = contours.iter().map(Vec::len).sum();
        SubPath {
            bounds,
            contours,
            total_points,
        }
    }

    pub fn bounds(&self) -> Box2D<f32> {
        self.bounds
    }

    pub fn total_points(&self) -> usize {
        self.total_points
    }

    pub fn to_path(&self) -> TessellatedPath {
        let mut path = TessellatedPath::new();
        for contour in &self.contours {
            let Some((&first, rest)) = contour.split_first() else {
                continue;
            };
            path.begin(first);
            for &p in rest {
                path.line_to(p);
            }
            path.end();
        }
        path
    }

    /// Split at the middle of the box, along whichever axis puts fewer points
    /// into the two halves.
    pub fn split(&self) -> [SubPath; 2] {
        let mid = self.bounds.center();
        let axis = self.choose_axis(mid);
        let value = axis.of(mid);
        let across = axis.other();

        let low_max = axis.point(value, across.of(self.bounds.max));
        let high_min = axis.point(value, across.of(self.bounds.min));
        let mut low = Vec::with_capacity(self.contours.len());
        let mut high = Vec::with_capacity(self.contours.len());
        for contour in &self.contours {
            let (l, h) = split_contour(contour, axis, value);
            if !l.is_empty() {
                low.push(l);
            }
            if !h.is_empty() {
                high.push(h);
            }
        }
        [
            SubPath::new(Box2D::new(self.bounds.min, low_max), low),
            SubPath::new(Box2D::new(high_min, self.bounds.max), high),
        ]
    }

    /// Count, per axis, the points both halves would receive: points on the
    /// line go to both, and each edge crossing it adds a point to each.
    fn choose_axis(&self, mid: Point) -> Axis {
        let mut count = [0usize; 2];
        for contour in &self.contours {
            let Some(&last) = contour.last() else {
                continue;
            };
            let mut prev = last;
            for &p in contour {
                for (slot, axis) in count.iter_mut().zip(Axis::BOTH) {
                    let (pv, v, m) = (axis.of(prev), axis.of(p), axis.of(mid));
                    *slot += if v == m { 2 } else { 1 };
                    if pv != m && (pv < m) != (v < m) {
                        *slot += 2;
                    }
                }
                prev = p;
            }
        }
        if count[0] < count[1] {
            Axis::X
        } else {
            Axis::Y
        }
    }
}

fn split_point(a: Point, b: Point, axis: Axis, value: f32) -> Point {
    let t = (value - axis.of(a)) / (axis.of(b) - axis.of(a));
    let across = axis.other();
    axis.point(value, (1.0 - t) * across.of(a) + t * across.of(b))
}

/// Clip a closed contour to both sides of the line `axis == value`. Points on
/// the line land in both halves.
fn split_contour(src: &[Point], axis: Axis, value: f32) -> (Vec<Point>, Vec<Point>) {
    let (mut low, mut high) = (Vec::new(), Vec::new());
    let Some(&last) = src.last() else {
        return (low, high);
    };
    let mut prev = last;
    for &p in src {
        let (prev_lo, lo) = (axis.of(prev) <= value, axis.of(p) <= value);
        let (prev_hi, hi) = (axis.of(prev) >= value, axis.of(p) >= value);
        if prev_lo != lo || prev_hi != hi {
            let cut = split_point(prev, p, axis, value);
            if prev_lo != lo {
                low.push(cut);
            }
            if prev_hi != hi {
                high.push(cut);
            }
        }
        if lo {
            low.push(p);
        }
        if hi {
            high.push(p);
        }
        prev = p;
    }
    (low, high)
}

/// What a hierarchy node holds.
#[derive(Clone, Debug)]
pub(crate) enum NodeContent {
    /// Ids of the two halves.
    Split([usize; 2]),
    Leaf(SubPath),
}

#[derive(Clone, Debug)]
pub(crate) struct SubsetNode {
    pub bounds: Box2D<f32>,
    pub content: NodeContent,
}

impl SubsetNode {
    pub fn children(&self) -> Option<[usize; 2]> {
        match self.content {
            NodeContent::Split(c) => Some(c),
            NodeContent::Leaf(_) => None,
        }
    }
}

/// Build the hierarchy rooted at `root`. Nodes are numbered depth first, so
/// the root is node 0 and a node precedes all of its descendants.
pub(crate) fn create_hierarchy(root: SubPath, max_depth: usize, points_per_subset: usize) -> Vec<SubsetNode> {
    let mut nodes = Vec::new();
    add_node(root, max_depth, points_per_subset, &mut nodes);
    nodes
}

fn add_node(path: SubPath, depth: usize, points_per_subset: usize, out: &mut Vec<SubsetNode>) -> usize {
    let id = out.len();
    let bounds = path.bounds();
    if depth > 0 && path.total_points() > points_per_subset {
        let [low, high] = path.split();
        // Splitting must make progress on at least one side.
        if low.total_points() < path.total_points() || high.total_points() < path.total_points() {
            out.push(SubsetNode {
                bounds,
                content: NodeContent::Split([0, 0]),
            });
            let a = add_node(low, depth - 1, points_per_subset, out);
            let b = add_node(high, depth - 1, points_per_subset, out);
            out[id].content = NodeContent::Split([a, b]);
            return id;
        }
    }
    out.push(SubsetNode {
        bounds,
        content: NodeContent::Leaf(path),
    });
    id
}
