// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Two-pass construction of winding-bucketed triangles and their packing.

use std::collections::BTreeMap;
use std::ops::Range;

use euclid::default::Box2D;
use log::{debug, warn};

use super::hoard::{GuideBox, HoardContour, PointHoard, BOX_CORNER_ORDER, BOX_MAX_X, BOX_MAX_Y};
use super::FillOptions;
use crate::error::{reserve, FillError, TessError};
use crate::path::{Point, TessellatedPath};
use crate::sink::{PrimitiveType, TessellationSink, NULL_CLIENT_ID};
use crate::tess::Tessellator;

/// Triangle indices per winding number, for one path.
pub(crate) type WindingBuckets = BTreeMap<i32, Vec<u32>>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Pass {
    /// Every non-zero winding, bucketed by winding number.
    NonZero,
    /// Regions of winding zero, found as winding -1 inside a clockwise
    /// boundary around the path.
    Zero,
}

impl Pass {
    fn accepts(self, winding: i32) -> bool {
        match self {
            Pass::NonZero => winding != 0,
            Pass::Zero => winding == -1,
        }
    }
}

/// Sink for one pass: filters degenerate triangles and appends the rest to
/// the bucket of their winding number.
struct Tesser<'a> {
    hoard: &'a mut PointHoard,
    buckets: &'a mut WindingBuckets,
    pass: Pass,
    current: i32,
    temp: [u32; 3],
    temp_len: usize,
    triangles: usize,
    triangulation_failed: bool,
    out_of_memory: bool,
}

impl<'a> Tesser<'a> {
    fn new(hoard: &'a mut PointHoard, buckets: &'a mut WindingBuckets, pass: Pass) -> Self {
        Tesser {
            hoard,
            buckets,
            pass,
            current: 0,
            temp: [NULL_CLIENT_ID; 3],
            temp_len: 0,
            triangles: 0,
            triangulation_failed: false,
            out_of_memory: false,
        }
    }

    fn non_degenerate(&self, [a, b, c]: [u32; 3]) -> bool {
        if a == NULL_CLIENT_ID || b == NULL_CLIENT_ID || c == NULL_CLIENT_ID {
            return false;
        }
        if a == b || a == c || b == c {
            return false;
        }
        let (p0, p1, p2) = (self.hoard.point(a), self.hoard.point(b), self.hoard.point(c));
        if p0 == p1 || p0 == p2 || p1 == p2 {
            return false;
        }
        // Only reject what single precision calls flat.
        (p1 - p0).cross(p2 - p0).abs() > 0.0
    }

    fn add_triangle(&mut self, tri: [u32; 3]) {
        let bucket = self.buckets.entry(self.current).or_default();
        if reserve(bucket, 3).is_err() {
            self.out_of_memory = true;
            return;
        }
        bucket.extend_from_slice(&tri);
        self.triangles += 1;
    }
}

impl TessellationSink for Tesser<'_> {
    fn on_begin(&mut self, primitive: PrimitiveType, winding: i32) {
        debug_assert_eq!(primitive, PrimitiveType::Triangles);
        self.temp_len = 0;
        self.current = match self.pass {
            Pass::NonZero => winding,
            Pass::Zero => {
                debug_assert_eq!(winding, -1);
                0
            }
        };
    }

    fn on_vertex(&mut self, id: u32) {
        if id == NULL_CLIENT_ID {
            self.triangulation_failed = true;
        }
        self.temp[self.temp_len] = id;
        self.temp_len += 1;
        if self.temp_len == 3 {
            self.temp_len = 0;
            if self.non_degenerate(self.temp) {
                self.add_triangle(self.temp);
            }
        }
    }

    fn on_combine(&mut self, _x: f64, _y: f64, ids: [u32; 4], weights: [f64; 4]) -> u32 {
        let mut pt = Point::origin();
        for (&id, &w) in ids.iter().zip(&weights) {
            if id != NULL_CLIENT_ID {
                pt += self.hoard.point(id).to_vector() * w as f32;
            }
        }
        match self.hoard.fetch(pt) {
            Ok(id) => id,
            Err(_) => {
                self.out_of_memory = true;
                NULL_CLIENT_ID
            }
        }
    }

    fn accept_winding(&self, winding: i32) -> bool {
        self.pass.accepts(winding)
    }
}

/// Output of one pass.
struct PassStats {
    triangles: usize,
    triangulation_failed: bool,
}

/// Feeds the path, its guide boxes and, for the zero pass, the enclosing
/// boundary to one tessellator.
struct PassInput<'p> {
    contours: &'p [HoardContour],
    boxes: &'p [GuideBox],
    boundary: Option<Box2D<f32>>,
}

fn run_pass(
    hoard: &mut PointHoard,
    buckets: &mut WindingBuckets,
    input: &PassInput<'_>,
    pass: Pass,
) -> Result<PassStats, FillError> {
    let mut tess = Tessellator::new(Tesser::new(hoard, buckets, pass));
    let mut count: u32 = 0;

    tess.begin_polygon()?;
    for contour in input.contours {
        tess.begin_contour(true)?;
        for &id in contour {
            let p = {
                let hoard = &tess.sink().hoard;
                hoard.converter().apply(hoard.point(id), count)
            };
            count += 1;
            tess.vertex(p.x, p.y, id)?;
        }
        tess.end_contour()?;
    }

    for corners in input.boxes {
        // Guide edges carry no winding. Corners are pushed outward so boxes
        // never coincide with path edges or each other.
        let slack = f64::from(count) * tess.sink().hoard.converter().fudge_delta();
        tess.begin_contour(false)?;
        for k in BOX_CORNER_ORDER {
            let id = corners[k];
            let p = {
                let hoard = &tess.sink().hoard;
                hoard.converter().apply(hoard.point(id), 0)
            };
            let (x, y) = push_outward(p.x, p.y, k, slack);
            tess.vertex(x, y, id)?;
        }
        tess.end_contour()?;
        count += 1;
    }

    if let Some(bounds) = input.boundary {
        // Clockwise, so everything inside it drops by one winding.
        let slack = f64::from(count) * tess.sink().hoard.converter().fudge_delta();
        tess.begin_contour(true)?;
        for k in BOX_CORNER_ORDER {
            let corner = Point::new(
                if k & BOX_MAX_X != 0 { bounds.max.x } else { bounds.min.x },
                if k & BOX_MAX_Y != 0 { bounds.max.y } else { bounds.min.y },
            );
            let (id, p) = {
                let hoard = &mut tess.sink_mut().hoard;
                let id = hoard.fetch(corner)?;
                (id, hoard.converter().apply(corner, 0))
            };
            let (x, y) = push_outward(p.x, p.y, k, slack);
            tess.vertex(x, y, id)?;
        }
        tess.end_contour()?;
    }

    tess.end_polygon()?;

    let sink = tess.into_sink();
    if sink.out_of_memory {
        return Err(TessError::OutOfMemory.into());
    }
    Ok(PassStats {
        triangles: sink.triangles,
        triangulation_failed: sink.triangulation_failed,
    })
}

fn push_outward(x: f64, y: f64, corner: usize, slack: f64) -> (f64, f64) {
    let x = if corner & BOX_MAX_X != 0 { x + slack } else { x - slack };
    let y = if corner & BOX_MAX_Y != 0 { y + slack } else { y - slack };
    (x, y)
}

/// The zero-pass boundary: the path bounds grown by `margin` times their
/// larger side, so its corners lie strictly outside the path.
fn boundary_box(bounds: &Box2D<f32>, margin: f32) -> Box2D<f32> {
    let size = bounds.size();
    let mut pad = size.width.max(size.height) * margin.abs();
    if pad.is_nan() || pad <= 0.0 {
        pad = 1.0;
    }
    // Far from the origin a small pad is lost to rounding.
    let magnitude = [bounds.min.x, bounds.min.y, bounds.max.x, bounds.max.y]
        .iter()
        .fold(0.0f32, |m, v| m.max(v.abs()));
    let pad = pad.max(magnitude * 4.0 * f32::EPSILON);
    bounds.inflate(pad, pad)
}

/// The product of both passes, packed.
#[derive(Debug, Default)]
pub(crate) struct Built {
    pub points: Vec<Point>,
    pub indices: Vec<u32>,
    pub windings: BTreeMap<i32, Range<usize>>,
    pub even_non_zero_start: usize,
    pub zero_start: usize,
}

pub(crate) fn build(path: &TessellatedPath, options: &FillOptions) -> Result<Built, FillError> {
    let Some(bounds) = path.bounds() else {
        return Ok(Built::default());
    };

    let mut hoard = PointHoard::new(&bounds, options.points_per_box, options.boxes_per_box);
    let (contours, boxes) = hoard.generate_path(path, options.guide_boxes)?;
    let mut buckets = WindingBuckets::new();

    let mut input = PassInput {
        contours: &contours,
        boxes: &boxes,
        boundary: None,
    };
    let non_zero = run_pass(&mut hoard, &mut buckets, &input, Pass::NonZero)?;

    // With nothing filled there is no winding zero to distinguish.
    let zero = if non_zero.triangles > 0 {
        input.boundary = Some(boundary_box(&bounds, options.boundary_margin));
        run_pass(&mut hoard, &mut buckets, &input, Pass::Zero)?
    } else {
        PassStats {
            triangles: 0,
            triangulation_failed: false,
        }
    };

    if non_zero.triangulation_failed || zero.triangulation_failed {
        warn!("fill: triangulation produced vertices without a client id; some triangles dropped");
    }
    debug!(
        "fill: {} points, {} guide boxes, {} non-zero and {} zero triangles in {} buckets",
        hoard.len(),
        boxes.len(),
        non_zero.triangles,
        zero.triangles,
        buckets.len()
    );

    let mut built = fill_indices(&buckets)?;
    built.points = hoard.into_points();
    Ok(built)
}

fn is_even(winding: i32) -> bool {
    winding % 2 == 0
}

/// Pack the buckets as odd windings, then even non-zero windings, then
/// winding zero, each group in ascending winding order.
pub(crate) fn fill_indices(buckets: &WindingBuckets) -> Result<Built, FillError> {
    let (mut num_odd, mut num_even_non_zero, mut total) = (0, 0, 0);
    for (&w, bucket) in buckets {
        total += bucket.len();
        match w {
            0 => {}
            w if is_even(w) => num_even_non_zero += bucket.len(),
            _ => num_odd += bucket.len(),
        }
    }

    let mut indices = Vec::new();
    reserve(&mut indices, total)?;
    indices.resize(total, 0);

    let mut windings = BTreeMap::new();
    let (mut odd, mut even_non_zero, mut zero) = (0, num_odd, num_odd + num_even_non_zero);
    for (&w, bucket) in buckets.iter().filter(|(_, b)| !b.is_empty()) {
        let cursor = if w == 0 {
            &mut zero
        } else if is_even(w) {
            &mut even_non_zero
        } else {
            &mut odd
        };
        let range = *cursor..*cursor + bucket.len();
        indices[range.clone()].copy_from_slice(bucket);
        *cursor = range.end;
        windings.insert(w, range);
    }
    debug_assert_eq!(odd, num_odd);
    debug_assert_eq!(even_non_zero, num_odd + num_even_non_zero);
    debug_assert_eq!(zero, total);

    Ok(Built {
        points: Vec::new(),
        indices,
        windings,
        even_non_zero_start: num_odd,
        zero_start: num_odd + num_even_non_zero,
    })
}
