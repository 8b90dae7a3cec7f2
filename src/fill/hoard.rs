// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Point store shared by both fill passes, the mapping from path coordinates
// into the tessellator's working box, and guide box generation.

use std::collections::HashMap;

use euclid::default::{Box2D, Point2D, Vector2D};

use crate::error::{reserve, TessError, TessResult};
use crate::path::{enclose, Point, TessellatedPath};

const LOG2_BOX_DIM: i32 = 24;
const NEGATIVE_LOG2_FUDGE: i32 = 20;

/// Side of the working box the path bounds are mapped onto.
pub(crate) const BOX_DIM: f64 = (1u32 << LOG2_BOX_DIM) as f64;

// Corner flags of a guide box; the corner index is the sum of its flags.
pub(crate) const BOX_MAX_X: usize = 1;
pub(crate) const BOX_MAX_Y: usize = 2;

/// Corners in clockwise order: min-min, min-max, max-max, max-min.
pub(crate) const BOX_CORNER_ORDER: [usize; 4] = [0, BOX_MAX_Y, BOX_MAX_X | BOX_MAX_Y, BOX_MAX_X];

/// Maps path coordinates onto `[0, BOX_DIM]` in double precision.
///
/// Every vertex fed to the tessellator is nudged diagonally by a multiple of
/// `fudge_delta()` that grows with each vertex, so repeated path points become
/// distinct vertices instead of exact degeneracies.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CoordinateConverter {
    scale: Vector2D<f64>,
    translate: Point2D<f64>,
    scale_f: Vector2D<f32>,
    translate_f: Point,
    fudge_delta: f64,
}

impl CoordinateConverter {
    pub fn new(bounds: &Box2D<f32>) -> Self {
        let min = bounds.min.cast::<f64>();
        let delta = bounds.max.cast::<f64>() - min;
        // A flat axis still gets a finite scale.
        let axis = |d: f64| if d > 0.0 { BOX_DIM / d } else { BOX_DIM };
        let scale = Vector2D::new(axis(delta.x), axis(delta.y));
        CoordinateConverter {
            scale,
            translate: min,
            scale_f: scale.cast::<f32>(),
            translate_f: bounds.min,
            fudge_delta: (-NEGATIVE_LOG2_FUDGE as f64).exp2(),
        }
    }

    pub fn apply(&self, p: Point, fudge_count: u32) -> Point2D<f64> {
        let q = p.cast::<f64>() - self.translate;
        let fudge = f64::from(fudge_count) * self.fudge_delta;
        Point2D::new(self.scale.x * q.x + fudge, self.scale.y * q.y + fudge)
    }

    /// Integer image of `p` in the working box, computed in single precision.
    pub fn iapply(&self, p: Point) -> (i32, i32) {
        let q = p - self.translate_f;
        ((self.scale_f.x * q.x) as i32, (self.scale_f.y * q.y) as i32)
    }

    pub fn fudge_delta(&self) -> f64 {
        self.fudge_delta
    }
}

/// Client ids of one contour, in path order.
pub(crate) type HoardContour = Vec<u32>;

/// Client ids of one guide box, indexed by corner flags.
pub(crate) type GuideBox = [u32; 4];

/// Append-only point store. Points with the same integer image in the
/// working box share one id.
pub(crate) struct PointHoard {
    converter: CoordinateConverter,
    points: Vec<Point>,
    map: HashMap<(i32, i32), u32>,
    points_per_box: usize,
    boxes_per_box: usize,
}

impl PointHoard {
    pub fn new(bounds: &Box2D<f32>, points_per_box: usize, boxes_per_box: usize) -> Self {
        PointHoard {
            converter: CoordinateConverter::new(bounds),
            points: Vec::new(),
            map: HashMap::new(),
            points_per_box: points_per_box.max(1),
            // One box per box would recurse forever.
            boxes_per_box: boxes_per_box.max(2),
        }
    }

    pub fn converter(&self) -> &CoordinateConverter {
        &self.converter
    }

    pub fn point(&self, id: u32) -> Point {
        self.points[id as usize]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    /// Id of `p`, adding it to the store if no stored point shares its image.
    pub fn fetch(&mut self, p: Point) -> TessResult<u32> {
        let key = self.converter.iapply(p);
        if let Some(&id) = self.map.get(&key) {
            return Ok(id);
        }
        reserve(&mut self.points, 1)?;
        self.map.try_reserve(1).map_err(|_| TessError::OutOfMemory)?;
        let id = self.points.len() as u32;
        self.points.push(p);
        self.map.insert(key, id);
        Ok(id)
    }

    /// Store every contour of `path`, returning the contours as ids and, if
    /// `guide_boxes` is set, the guide boxes around them.
    pub fn generate_path(
        &mut self,
        path: &TessellatedPath,
        guide_boxes: bool,
    ) -> TessResult<(Vec<HoardContour>, Vec<GuideBox>)> {
        let mut contours = Vec::with_capacity(path.number_contours());
        let mut boxes = Vec::new();
        for c in 0..path.number_contours() {
            let pts: Vec<Point> = path.contour_points(c).collect();
            let mut ids = Vec::new();
            reserve(&mut ids, pts.len())?;
            for &p in &pts {
                ids.push(self.fetch(p)?);
            }
            contours.push(ids);

            if guide_boxes && pts.len() >= self.points_per_box {
                let groups = pts
                    .chunks(self.points_per_box)
                    .map(|g| Box2D::from_points(g.iter().copied()))
                    .collect();
                let tail = tail_len(pts.len(), self.points_per_box);
                self.process_boxes(merge_tail(groups, tail), &mut boxes)?;
            }
        }
        Ok((contours, boxes))
    }

    /// Record the corners of each box, then recurse on boxes of boxes.
    fn process_boxes(&mut self, level: Vec<Box2D<f32>>, out: &mut Vec<GuideBox>) -> TessResult<()> {
        reserve(out, level.len())?;
        for b in &level {
            let mut corners = [0; 4];
            for (k, corner) in corners.iter_mut().enumerate() {
                let x = if k & BOX_MAX_X != 0 { b.max.x } else { b.min.x };
                let y = if k & BOX_MAX_Y != 0 { b.max.y } else { b.min.y };
                *corner = self.fetch(Point::new(x, y))?;
            }
            out.push(corners);
        }

        if level.len() >= self.boxes_per_box {
            let parents = level
                .chunks(self.boxes_per_box)
                .map(|g| g.iter().skip(1).fold(g[0], |acc, b| enclose(&acc, b)))
                .collect();
            let tail = tail_len(level.len(), self.boxes_per_box);
            self.process_boxes(merge_tail(parents, tail), out)?;
        }
        Ok(())
    }
}

fn tail_len(len: usize, group: usize) -> usize {
    match len % group {
        0 => group,
        r => r,
    }
}

/// Fold a trailing group of at most four members into its neighbour. A
/// lone group of at most two members is dropped.
fn merge_tail(mut boxes: Vec<Box2D<f32>>, tail_len: usize) -> Vec<Box2D<f32>> {
    if tail_len <= 4 && boxes.len() > 1 {
        if let Some(last) = boxes.pop() {
            if let Some(prev) = boxes.last_mut() {
                *prev = enclose(prev, &last);
            }
        }
    } else if boxes.len() == 1 && tail_len <= 2 {
        boxes.clear();
    }
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::point2;

    fn unit_bounds() -> Box2D<f32> {
        Box2D::new(point2(0.0, 0.0), point2(1.0, 1.0))
    }

    #[test]
    fn converter_maps_bounds_onto_box() {
        let c = CoordinateConverter::new(&Box2D::new(point2(-2.0, 1.0), point2(2.0, 3.0)));
        assert_eq!(c.apply(point2(-2.0, 1.0), 0), Point2D::new(0.0, 0.0));
        assert_eq!(c.apply(point2(2.0, 3.0), 0), Point2D::new(BOX_DIM, BOX_DIM));
        let nudged = c.apply(point2(-2.0, 1.0), 3);
        assert_eq!(nudged.x, 3.0 * c.fudge_delta());
        assert_eq!(nudged.y, nudged.x);
        assert_eq!(c.iapply(point2(0.0, 2.0)), (1 << 23, 1 << 23));
    }

    #[test]
    fn flat_bounds_stay_finite() {
        let c = CoordinateConverter::new(&Box2D::new(point2(0.0, 5.0), point2(4.0, 5.0)));
        let p = c.apply(point2(4.0, 5.0), 0);
        assert!(p.x.is_finite() && p.y.is_finite());
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn fetch_dedups_by_integer_image() {
        let mut hoard = PointHoard::new(&unit_bounds(), 12, 8);
        let a = hoard.fetch(point2(0.5, 0.5)).unwrap();
        let b = hoard.fetch(point2(0.5, 0.5 + 1.0e-9)).unwrap();
        let c = hoard.fetch(point2(0.25, 0.5)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(hoard.len(), 2);
        assert_eq!(hoard.point(c), point2(0.25, 0.5));
    }

    #[test]
    fn merged_tail_keeps_flat_boxes() {
        let boxes = vec![
            Box2D::new(point2(0.0, 0.0), point2(1.0, 1.0)),
            Box2D::new(point2(5.0, 0.0), point2(9.0, 0.0)),
        ];
        let merged = merge_tail(boxes, 1);
        assert_eq!(merged, vec![Box2D::new(point2(0.0, 0.0), point2(9.0, 1.0))]);
    }

    fn circle(n: usize) -> TessellatedPath {
        let mut path = TessellatedPath::new();
        for i in 0..n {
            let a = i as f32 / n as f32 * std::f32::consts::TAU;
            let p = point2(a.cos() * 10.0, a.sin() * 10.0);
            if i == 0 {
                path.begin(p);
            } else {
                path.line_to(p);
            }
        }
        path.end();
        path
    }

    #[test]
    fn small_contours_get_no_guide_boxes() {
        let path = circle(11);
        let mut hoard = PointHoard::new(&path.bounds().unwrap(), 12, 8);
        let (contours, boxes) = hoard.generate_path(&path, true).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 11);
        assert!(boxes.is_empty());
    }

    #[test]
    fn guide_boxes_nest() {
        // 100 points: 9 groups, the 4-point tail folded in, then one parent.
        let path = circle(100);
        let mut hoard = PointHoard::new(&path.bounds().unwrap(), 12, 8);
        let (_, boxes) = hoard.generate_path(&path, true).unwrap();
        assert_eq!(boxes.len(), 9);
        for b in &boxes {
            let min = hoard.point(b[0]);
            let max = hoard.point(b[BOX_MAX_X | BOX_MAX_Y]);
            assert!(min.x <= max.x && min.y <= max.y);
        }

        let (_, none) = hoard.generate_path(&path, false).unwrap();
        assert!(none.is_empty());
    }
}
