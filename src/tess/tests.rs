// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Unit tests for the tessellator front end.

use super::*;
use crate::sink::PrimitiveType;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Begin(PrimitiveType, i32),
    Vertex(u32),
    End,
}

/// Records everything and creates a new point for every combine.
struct Recorder {
    points: Vec<(f64, f64)>,
    calls: Vec<Call>,
    errors: Vec<Diagnostic>,
    accept: fn(i32) -> bool,
    monotones: Option<Vec<(i32, Vec<u32>)>>,
}

impl Recorder {
    fn new() -> Self {
        Recorder {
            points: Vec::new(),
            calls: Vec::new(),
            errors: Vec::new(),
            accept: |w| w != 0,
            monotones: None,
        }
    }

    fn with_accept(accept: fn(i32) -> bool) -> Self {
        Recorder { accept, ..Recorder::new() }
    }

    /// Triangles grouped with the winding of their begin call.
    fn triangles(&self) -> Vec<(i32, [u32; 3])> {
        let mut out = Vec::new();
        let mut winding = None;
        let mut pending = Vec::new();
        for c in &self.calls {
            match *c {
                Call::Begin(PrimitiveType::Triangles, w) => winding = Some(w),
                Call::Begin(PrimitiveType::LineLoop, _) => winding = None,
                Call::Vertex(id) => {
                    if let Some(w) = winding {
                        pending.push(id);
                        if pending.len() == 3 {
                            out.push((w, [pending[0], pending[1], pending[2]]));
                            pending.clear();
                        }
                    }
                }
                Call::End => pending.clear(),
            }
        }
        out
    }

    fn loops(&self) -> Vec<(i32, Vec<u32>)> {
        let mut out = Vec::new();
        let mut current: Option<(i32, Vec<u32>)> = None;
        for c in &self.calls {
            match *c {
                Call::Begin(PrimitiveType::LineLoop, w) => current = Some((w, Vec::new())),
                Call::Vertex(id) => {
                    if let Some((_, ids)) = current.as_mut() {
                        ids.push(id);
                    }
                }
                Call::End => out.extend(current.take()),
                _ => {}
            }
        }
        out
    }

    fn signed_area(&self, tri: [u32; 3]) -> f64 {
        let p = |i: u32| self.points[i as usize];
        let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
        0.5 * ((b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1))
    }

    fn total_area(&self) -> f64 {
        self.triangles().iter().map(|&(_, t)| self.signed_area(t).abs()).sum()
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
    fn on_error(&mut self, d: Diagnostic) {
        self.errors.push(d);
    }
    fn on_combine(&mut self, x: f64, y: f64, _: [u32; 4], _: [f64; 4]) -> u32 {
        self.points.push((x, y));
        (self.points.len() - 1) as u32
    }
    fn accept_winding(&self, w: i32) -> bool {
        (self.accept)(w)
    }
    fn wants_monotones(&self) -> bool {
        self.monotones.is_some()
    }
    fn on_monotone(&mut self, winding: i32, ids: &[u32]) {
        if let Some(m) = self.monotones.as_mut() {
            m.push((winding, ids.to_vec()));
        }
    }
}

fn contour(tess: &mut Tessellator<Recorder>, pts: &[(f64, f64)]) {
    contour_kind(tess, pts, true);
}

fn contour_kind(tess: &mut Tessellator<Recorder>, pts: &[(f64, f64)], real: bool) {
    tess.begin_contour(real).unwrap();
    for &(x, y) in pts {
        let id = tess.sink().points.len() as u32;
        tess.sink_mut().points.push((x, y));
        tess.vertex(x, y, id).unwrap();
    }
    tess.end_contour().unwrap();
}

const SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
const BOWTIE: [(f64, f64); 4] = [(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)];

#[test]
fn square_fast_path_fans_from_first_vertex() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    contour(&mut tess, &SQUARE);
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    assert_eq!(
        sink.calls,
        vec![
            Call::Begin(PrimitiveType::Triangles, 1),
            Call::Vertex(0),
            Call::Vertex(1),
            Call::Vertex(2),
            Call::Vertex(0),
            Call::Vertex(2),
            Call::Vertex(3),
            Call::End,
        ]
    );
    assert!(sink.errors.is_empty());
}

#[test]
fn clockwise_square_reports_negative_winding() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    let cw: Vec<_> = SQUARE.iter().rev().copied().collect();
    contour(&mut tess, &cw);
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    let tris = sink.triangles();
    assert_eq!(tris.len(), 2);
    for &(w, t) in &tris {
        assert_eq!(w, -1);
        // Triangles keep counter-clockwise orientation.
        assert!(sink.signed_area(t) > 0.0);
    }
}

#[test]
fn positive_only_predicate_skips_clockwise_fan() {
    let mut tess = Tessellator::new(Recorder::with_accept(|w| w > 0));
    tess.begin_polygon().unwrap();
    let cw: Vec<_> = SQUARE.iter().rev().copied().collect();
    contour(&mut tess, &cw);
    tess.end_polygon().unwrap();
    assert!(tess.sink().calls.is_empty());
}

#[test]
fn bowtie_goes_through_sweep() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    contour(&mut tess, &BOWTIE);
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    // One combined vertex at the crossing.
    assert_eq!(sink.points.len(), 5);
    assert_eq!(sink.points[4], (1.0, 1.0));
    let tris = sink.triangles();
    assert_eq!(tris.len(), 2);
    let mut windings: Vec<i32> = tris.iter().map(|&(w, _)| w).collect();
    windings.sort();
    assert_eq!(windings, vec![-1, 1]);
    assert!((sink.total_area() - 2.0).abs() < 1e-9);
}

#[test]
fn nested_squares_wind_twice_inside() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    contour(&mut tess, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
    contour(&mut tess, &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    let area = |want: i32| -> f64 {
        sink.triangles()
            .iter()
            .filter(|&&(w, _)| w == want)
            .map(|&(_, t)| sink.signed_area(t))
            .sum()
    };
    assert!((area(2) - 4.0).abs() < 1e-9);
    assert!((area(1) - 12.0).abs() < 1e-9);
}

#[test]
fn winding_minus_one_captures_ring_inside_clockwise_boundary() {
    let mut tess = Tessellator::new(Recorder::with_accept(|w| w == -1));
    tess.begin_polygon().unwrap();
    contour(&mut tess, &SQUARE);
    contour(&mut tess, &[(-2.0, -2.0), (-2.0, 3.0), (3.0, 3.0), (3.0, -2.0)]);
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    assert!(sink.triangles().iter().all(|&(w, _)| w == -1));
    assert!((sink.total_area() - 24.0).abs() < 1e-9);
}

#[test]
fn guide_contour_does_not_change_windings() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    contour(&mut tess, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
    contour_kind(&mut tess, &[(1.0, -1.0), (3.0, -1.0), (3.0, 1.0), (1.0, 1.0)], false);
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    assert!(sink.triangles().iter().all(|&(w, _)| w == 1));
    assert!((sink.total_area() - 4.0).abs() < 1e-9);
}

#[test]
fn single_guide_contour_emits_nothing() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    contour_kind(&mut tess, &SQUARE, false);
    tess.end_polygon().unwrap();
    assert!(tess.sink().calls.is_empty());
}

#[test]
fn large_single_contour_uses_sweep() {
    let n = TESS_MAX_CACHE + 20;
    let pts: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / n as f64;
            (a.cos() * 10.0, a.sin() * 10.0)
        })
        .collect();
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    contour(&mut tess, &pts);
    tess.end_polygon().unwrap();
    let tris = tess.sink().triangles();
    assert_eq!(tris.len(), n - 2);
    assert!(tris.iter().all(|&(w, _)| w == 1));
}

#[test]
fn degenerate_inputs_emit_nothing() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    contour(&mut tess, &[(0.0, 0.0), (1.0, 1.0)]);
    tess.end_polygon().unwrap();
    tess.begin_polygon().unwrap();
    contour(&mut tess, &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
    tess.end_polygon().unwrap();
    assert!(tess.sink().calls.is_empty());
    assert!(tess.sink().errors.is_empty());
}

#[test]
fn missing_begins_are_repaired() {
    let mut tess = Tessellator::new(Recorder::new());
    for (i, &(x, y)) in SQUARE.iter().enumerate() {
        tess.sink_mut().points.push((x, y));
        tess.vertex(x, y, i as u32).unwrap();
    }
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    assert_eq!(
        sink.errors,
        vec![
            Diagnostic::MissingBeginPolygon,
            Diagnostic::MissingBeginContour,
            Diagnostic::MissingEndContour,
        ]
    );
    assert_eq!(sink.triangles().len(), 2);
}

#[test]
fn begin_polygon_while_open_discards_it() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    tess.begin_contour(true).unwrap();
    tess.vertex(0.0, 0.0, 0).unwrap();
    tess.begin_polygon().unwrap();
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    assert_eq!(
        sink.errors,
        vec![Diagnostic::MissingEndContour, Diagnostic::MissingEndPolygon]
    );
    assert!(sink.calls.is_empty());
}

#[test]
fn huge_coordinates_are_clamped() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.begin_polygon().unwrap();
    tess.begin_contour(true).unwrap();
    tess.vertex(1e300, 0.0, 0).unwrap();
    tess.end_contour().unwrap();
    tess.end_polygon().unwrap();
    assert_eq!(tess.sink().errors, vec![Diagnostic::CoordTooLarge]);
}

#[test]
fn tolerance_out_of_range_is_rejected() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.set_property(TessProperty::Tolerance(0.25));
    tess.set_property(TessProperty::Tolerance(2.0));
    tess.set_property(TessProperty::Tolerance(f64::NAN));
    assert_eq!(
        tess.property(TessPropertyKind::Tolerance),
        TessProperty::Tolerance(0.25)
    );
    assert_eq!(
        tess.sink().errors,
        vec![Diagnostic::InvalidValue, Diagnostic::InvalidValue]
    );
    assert_eq!(
        tess.property(TessPropertyKind::BoundaryOnly),
        TessProperty::BoundaryOnly(false)
    );
}

#[test]
fn boundary_only_fast_path_emits_loop() {
    let mut tess = Tessellator::new(Recorder::new());
    tess.set_property(TessProperty::BoundaryOnly(true));
    tess.begin_polygon().unwrap();
    let cw: Vec<_> = SQUARE.iter().rev().copied().collect();
    contour(&mut tess, &cw);
    tess.end_polygon().unwrap();
    // Reversed so the loop runs counter-clockwise.
    assert_eq!(tess.sink().loops(), vec![(-1, vec![0, 3, 2, 1])]);
}

#[test]
fn boundary_only_sweep_emits_outer_and_hole() {
    let mut tess = Tessellator::new(Recorder::with_accept(|w| w % 2 != 0));
    tess.set_property(TessProperty::BoundaryOnly(true));
    tess.begin_polygon().unwrap();
    contour(&mut tess, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
    contour(&mut tess, &[(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0)]);
    tess.end_polygon().unwrap();
    let loops = tess.sink().loops();
    assert!(tess.sink().triangles().is_empty());
    // The ring is one face bounded by both squares' edges.
    let total: usize = loops.iter().map(|(_, ids)| ids.len()).sum();
    assert_eq!(total, 8);
}

#[test]
fn monotones_arrive_before_triangles() {
    let mut sink = Recorder::new();
    sink.monotones = Some(Vec::new());
    let mut tess = Tessellator::new(sink);
    tess.begin_polygon().unwrap();
    contour(&mut tess, &SQUARE);
    tess.end_polygon().unwrap();
    let sink = tess.into_sink();
    let monotones = sink.monotones.clone().unwrap_or_default();
    assert_eq!(monotones.len(), 1);
    assert_eq!(monotones[0].0, 1);
    let mut ids = monotones[0].1.clone();
    ids.sort();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert_eq!(sink.triangles().len(), 2);
}

fn area_by_winding(sink: &Recorder) -> std::collections::BTreeMap<i32, f64> {
    let mut out = std::collections::BTreeMap::new();
    for (w, t) in sink.triangles() {
        *out.entry(w).or_insert(0.0) += sink.signed_area(t).abs();
    }
    out
}

#[test]
fn contour_through_first_vertex_matches_sweep() {
    // The edge (2, 0) -> (7, 5) passes through the first vertex, so a fan
    // from it would cover the small loop twice at winding 1.
    let pts = [(6.0, 4.0), (9.0, 3.0), (5.0, 7.0), (2.0, 0.0), (7.0, 5.0), (7.0, 7.0)];
    let run = |monotones: bool| {
        let mut sink = Recorder::new();
        if monotones {
            sink.monotones = Some(Vec::new());
        }
        let mut tess = Tessellator::new(sink);
        tess.begin_polygon().unwrap();
        contour(&mut tess, &pts);
        tess.end_polygon().unwrap();
        tess.into_sink()
    };
    let direct = run(false);
    let swept = run(true);

    let direct_areas = area_by_winding(&direct);
    let swept_areas = area_by_winding(&swept);
    assert!(direct_areas.contains_key(&2), "{:?}", direct_areas);
    assert_eq!(
        direct_areas.keys().collect::<Vec<_>>(),
        swept_areas.keys().collect::<Vec<_>>()
    );
    for (w, a) in &direct_areas {
        assert!((a - swept_areas[w]).abs() < 1e-9, "winding {}: {} vs {}", w, a, swept_areas[w]);
    }
    assert!((direct.total_area() - 12.5).abs() < 1e-9);
}
