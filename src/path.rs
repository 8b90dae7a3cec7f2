// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Flattened path input: closed contours made of polyline edges.

use std::ops::Range;

use euclid::default::{Box2D, Point2D};

pub type Point = Point2D<f32>;

/// A set of closed contours. Each edge is a run of points starting at the
/// previous edge's end, so consecutive edges share their boundary point.
#[derive(Clone, Debug, Default)]
pub struct TessellatedPath {
    points: Vec<Point>,
    contours: Vec<Vec<Range<u32>>>,
    bounds: Option<Box2D<f32>>,
    /// Start point and current end point of the contour being built.
    open: Option<(Point, Point)>,
}

impl TessellatedPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new contour at `p`, closing any open one.
    pub fn begin(&mut self, p: Point) -> &mut Self {
        self.end();
        self.contours.push(Vec::new());
        self.open = Some((p, p));
        self.include(p);
        self
    }

    pub fn line_to(&mut self, p: Point) -> &mut Self {
        self.segment_to(&[p])
    }

    /// Add an edge through `pts` from the current point, ending at the last
    /// of them. Does nothing without an open contour.
    pub fn segment_to(&mut self, pts: &[Point]) -> &mut Self {
        let (Some((start, from)), Some(&to)) = (self.open, pts.last()) else {
            return self;
        };
        let first = self.points.len() as u32;
        self.points.push(from);
        for &p in pts {
            self.points.push(p);
            self.include(p);
        }
        if let Some(contour) = self.contours.last_mut() {
            contour.push(first..self.points.len() as u32);
        }
        self.open = Some((start, to));
        self
    }

    /// Close the open contour with an edge back to its start if needed.
    pub fn end(&mut self) -> &mut Self {
        if let Some((start, current)) = self.open {
            if current != start {
                self.line_to(start);
            }
            if self.contours.last().map_or(false, |c| c.is_empty()) {
                self.contours.pop();
            }
        }
        self.open = None;
        self
    }

    fn include(&mut self, p: Point) {
        let pt_box = Box2D::new(p, p);
        self.bounds = Some(match self.bounds {
            Some(b) => enclose(&b, &pt_box),
            None => pt_box,
        });
    }

    pub fn point_data(&self) -> &[Point] {
        &self.points
    }

    pub fn number_contours(&self) -> usize {
        self.contours.len()
    }

    pub fn number_edges(&self, contour: usize) -> usize {
        self.contours[contour].len()
    }

    /// Range into `point_data` of one edge, including both end points.
    pub fn edge_range(&self, contour: usize, edge: usize) -> Range<u32> {
        self.contours[contour][edge].clone()
    }

    /// Bounding box of every point, or `None` for an empty path.
    pub fn bounds(&self) -> Option<Box2D<f32>> {
        self.bounds
    }

    /// The points of a closed contour in order, without repeating the shared
    /// point between consecutive edges.
    pub fn contour_points(&self, contour: usize) -> impl Iterator<Item = Point> + '_ {
        self.contours[contour].iter().flat_map(move |r| {
            let end = r.end.saturating_sub(1).max(r.start);
            self.points[r.start as usize..end as usize].iter().copied()
        })
    }
}

/// Smallest box containing both boxes. Unlike `Box2D::union`, a box with no
/// area still counts.
pub(crate) fn enclose(a: &Box2D<f32>, b: &Box2D<f32>) -> Box2D<f32> {
    Box2D::new(a.min.min(b.min), a.max.max(b.max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::point2;

    #[test]
    fn triangle_closes_back_to_start() {
        let mut path = TessellatedPath::new();
        path.begin(point2(0.0, 0.0))
            .line_to(point2(2.0, 0.0))
            .line_to(point2(1.0, 3.0))
            .end();
        assert_eq!(path.number_contours(), 1);
        assert_eq!(path.number_edges(0), 3);
        let pts: Vec<Point> = path.contour_points(0).collect();
        assert_eq!(pts, vec![point2(0.0, 0.0), point2(2.0, 0.0), point2(1.0, 3.0)]);
        let b = path.bounds().unwrap();
        assert_eq!(b.min, point2(0.0, 0.0));
        assert_eq!(b.max, point2(2.0, 3.0));
    }

    #[test]
    fn segment_edges_keep_intermediate_points() {
        let mut path = TessellatedPath::new();
        path.begin(point2(0.0, 0.0))
            .segment_to(&[point2(1.0, 1.0), point2(2.0, 0.0)])
            .end();
        assert_eq!(path.number_edges(0), 2);
        assert_eq!(path.edge_range(0, 0).len(), 3);
        assert_eq!(path.contour_points(0).count(), 3);
    }

    #[test]
    fn begin_closes_previous_contour() {
        let mut path = TessellatedPath::new();
        path.begin(point2(0.0, 0.0)).line_to(point2(1.0, 0.0));
        path.begin(point2(5.0, 5.0)).line_to(point2(6.0, 5.0)).line_to(point2(5.0, 6.0));
        path.end();
        assert_eq!(path.number_contours(), 2);
        assert_eq!(path.number_edges(0), 2);
        assert_eq!(path.contour_points(1).count(), 3);
    }

    #[test]
    fn bounds_grow_with_every_point() {
        let mut path = TessellatedPath::new();
        path.begin(point2(0.0, 0.0))
            .line_to(point2(1000.0, 0.0))
            .line_to(point2(1000.0, 1000.0))
            .line_to(point2(-5.0, 1000.0))
            .end();
        let b = path.bounds().unwrap();
        assert_eq!(b.min, point2(-5.0, 0.0));
        assert_eq!(b.max, point2(1000.0, 1000.0));

        // A flat path still spans its extent.
        let mut flat = TessellatedPath::new();
        flat.begin(point2(0.0, 2.0)).line_to(point2(7.0, 2.0)).end();
        let b = flat.bounds().unwrap();
        assert_eq!((b.min.x, b.max.x, b.min.y, b.max.y), (0.0, 7.0, 2.0, 2.0));
    }

    #[test]
    fn lone_point_contour_is_dropped() {
        let mut path = TessellatedPath::new();
        path.begin(point2(1.0, 1.0)).end();
        assert_eq!(path.number_contours(), 0);
        assert!(path.bounds().is_some());
    }
}
