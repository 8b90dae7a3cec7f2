// Copyright 2025 Lars Brubaker
// Shared test utilities for winding-tess tests.

#![allow(dead_code)]

use euclid::point2;
use winding_tess::{
    Diagnostic, FilledPath, Point, PrimitiveType, TessellatedPath, TessellationSink, Tessellator,
};

/// Install a test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parse the `.dat` format: one vertex per line as `x y` or `x, y`.
/// Blank lines separate contours.
pub fn parse_contours(data: &str) -> Vec<Vec<Point>> {
    let mut contours: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for line in data.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                contours.push(std::mem::take(&mut current));
            }
            continue;
        }
        let floats: Vec<f32> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<f32>().ok())
            .collect();
        for xy in floats.chunks_exact(2) {
            current.push(point2(xy[0], xy[1]));
        }
    }
    if !current.is_empty() {
        contours.push(current);
    }
    contours
}

pub fn path_from_contours(contours: &[Vec<Point>]) -> TessellatedPath {
    let mut path = TessellatedPath::new();
    for contour in contours {
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

pub fn path_from_dat(data: &str) -> (Vec<Vec<Point>>, TessellatedPath) {
    let contours = parse_contours(data);
    let path = path_from_contours(&contours);
    (contours, path)
}

/// Regular polygon, counter-clockwise.
pub fn circle(center: Point, radius: f32, n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let a = i as f32 / n as f32 * std::f32::consts::TAU;
            point2(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// Signed area of a triangle, positive when counter-clockwise.
pub fn triangle_area(a: Point, b: Point, c: Point) -> f64 {
    let (a, b, c) = (a.cast::<f64>(), b.cast::<f64>(), c.cast::<f64>());
    0.5 * (b - a).cross(c - a)
}

pub fn triangles<'a>(points: &'a [Point], indices: &'a [u32]) -> impl Iterator<Item = [Point; 3]> + 'a {
    assert_eq!(indices.len() % 3, 0, "index count not a multiple of 3");
    indices
        .chunks_exact(3)
        .map(move |t| [points[t[0] as usize], points[t[1] as usize], points[t[2] as usize]])
}

/// Total unsigned area of the triangles in `indices`.
pub fn area(points: &[Point], indices: &[u32]) -> f64 {
    triangles(points, indices)
        .map(|[a, b, c]| triangle_area(a, b, c).abs())
        .sum()
}

pub fn filled_area(filled: &FilledPath, indices: &[u32]) -> f64 {
    area(filled.points(), indices)
}

pub fn centroid([a, b, c]: [Point; 3]) -> Point {
    point2((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
}

/// Winding number of `p` with respect to closed contours, by counting signed
/// crossings of a ray towards +x.
pub fn winding_at(contours: &[Vec<Point>], p: Point) -> i32 {
    let p = p.cast::<f64>();
    let mut w = 0;
    for contour in contours {
        let n = contour.len();
        for i in 0..n {
            let a = contour[i].cast::<f64>();
            let b = contour[(i + 1) % n].cast::<f64>();
            let side = (b - a).cross(p - a);
            if a.y <= p.y {
                if b.y > p.y && side > 0.0 {
                    w += 1;
                }
            } else if b.y <= p.y && side < 0.0 {
                w -= 1;
            }
        }
    }
    w
}

pub fn assert_close(got: f64, expected: f64, tolerance: f64, what: &str) {
    assert!(
        (got - expected).abs() <= tolerance * expected.abs().max(1.0),
        "{}: got {}, expected {}",
        what,
        got,
        expected
    );
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Begin(PrimitiveType, i32),
    Vertex(u32),
    End,
}

/// Sink that records every call and fills the windings `accept` selects.
/// Vertex ids index `points`; combined vertices are appended to it.
pub struct Recorder {
    pub points: Vec<Point>,
    pub calls: Vec<Call>,
    pub errors: Vec<Diagnostic>,
    pub accept: fn(i32) -> bool,
}

impl Recorder {
    pub fn new(accept: fn(i32) -> bool) -> Self {
        Recorder {
            points: Vec::new(),
            calls: Vec::new(),
            errors: Vec::new(),
            accept,
        }
    }

    /// Triangle indices grouped with the winding of their begin call.
    pub fn triangles(&self) -> Vec<(i32, [u32; 3])> {
        let mut out = Vec::new();
        let mut winding = 0;
        let mut pending = Vec::new();
        for call in &self.calls {
            match *call {
                Call::Begin(_, w) => winding = w,
                Call::Vertex(id) => {
                    pending.push(id);
                    if pending.len() == 3 {
                        out.push((winding, [pending[0], pending[1], pending[2]]));
                        pending.clear();
                    }
                }
                Call::End => pending.clear(),
            }
        }
        out
    }

    pub fn area(&self) -> f64 {
        self.triangles()
            .iter()
            .map(|(_, t)| {
                let [a, b, c] = t.map(|i| self.points[i as usize]);
                triangle_area(a, b, c).abs()
            })
            .sum()
    }
}

impl TessellationSink for Recorder {
    fn on_begin(&mut self, primitive: PrimitiveType, winding: i32) {
        self.calls.push(Call::Begin(primitive, winding));
    }

    fn on_vertex(&mut self, id: u32) {
        self.calls.push(Call::Vertex(id));
    }

    fn on_end(&mut self) {
        self.calls.push(Call::End);
    }

    fn on_error(&mut self, diagnostic: Diagnostic) {
        self.errors.push(diagnostic);
    }

    fn on_combine(&mut self, x: f64, y: f64, _ids: [u32; 4], _weights: [f64; 4]) -> u32 {
        self.points.push(point2(x as f32, y as f32));
        (self.points.len() - 1) as u32
    }

    fn accept_winding(&self, winding: i32) -> bool {
        winding != 0 && (self.accept)(winding)
    }
}

/// Run the tessellator directly over `contours` with a recording sink.
pub fn tessellate(contours: &[Vec<Point>], accept: fn(i32) -> bool) -> Recorder {
    let mut recorder = Recorder::new(accept);
    for contour in contours {
        recorder.points.extend_from_slice(contour);
    }
    let mut tess = Tessellator::new(recorder);
    tess.begin_polygon().unwrap();
    let mut id = 0u32;
    for contour in contours {
        tess.begin_contour(true).unwrap();
        for p in contour {
            tess.vertex(f64::from(p.x), f64::from(p.y), id).unwrap();
            id += 1;
        }
        tess.end_contour().unwrap();
    }
    tess.end_polygon().unwrap();
    tess.into_sink()
}
