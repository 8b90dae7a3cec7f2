// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Output generation: delivers the finished mesh, or the cached single
// contour, to the sink.

use log::debug;

use super::geometry::{fan_orientation, FanOrientation};
use crate::error::{reserve, TessResult};
use crate::geom::SweepPoint;
use crate::mesh::{FaceIdx, Mesh};
use crate::sink::{PrimitiveType, TessellationSink};

/// A vertex held back while the polygon is still a single small contour.
#[derive(Copy, Clone, Debug)]
pub(crate) struct CachedVertex {
    pub point: SweepPoint,
    pub id: u32,
    pub real: bool,
}

fn filled(mesh: &Mesh, f: FaceIdx) -> bool {
    let face = &mesh.faces[f as usize];
    face.inside && face.winding != 0
}

fn emit_face<S: TessellationSink + ?Sized>(mesh: &Mesh, f: FaceIdx, sink: &mut S) {
    let start = mesh.faces[f as usize].an_edge;
    let mut e = start;
    loop {
        sink.on_vertex(mesh.verts[mesh.org(e) as usize].data);
        e = mesh.lnext(e);
        if e == start {
            break;
        }
    }
}

/// Emit every filled triangle. Consecutive triangles with the same winding
/// number share one begin/end pair.
pub(crate) fn render_triangles<S: TessellationSink + ?Sized>(mesh: &Mesh, sink: &mut S) {
    let mut current: Option<i32> = None;
    let mut count = 0usize;
    for f in mesh.faces().filter(|&f| filled(mesh, f)) {
        debug_assert_eq!(mesh.face_len(f), 3);
        let w = mesh.faces[f as usize].winding;
        if current != Some(w) {
            if current.is_some() {
                sink.on_end();
            }
            sink.on_begin(PrimitiveType::Triangles, w);
            current = Some(w);
        }
        emit_face(mesh, f, sink);
        count += 1;
    }
    if current.is_some() {
        sink.on_end();
    }
    debug!("rendered {} triangles", count);
}

/// Emit one line loop per inside face.
pub(crate) fn render_boundary<S: TessellationSink + ?Sized>(mesh: &Mesh, sink: &mut S) {
    for f in mesh.faces() {
        if !mesh.faces[f as usize].inside {
            continue;
        }
        sink.on_begin(PrimitiveType::LineLoop, mesh.faces[f as usize].winding);
        emit_face(mesh, f, sink);
        sink.on_end();
    }
}

/// Hand each filled monotone region to the sink before triangulation.
pub(crate) fn emit_monotones<S: TessellationSink + ?Sized>(mesh: &Mesh, sink: &mut S) -> TessResult<()> {
    let mut ids: Vec<u32> = Vec::new();
    for f in mesh.faces().filter(|&f| filled(mesh, f)) {
        ids.clear();
        reserve(&mut ids, mesh.face_len(f))?;
        let start = mesh.faces[f as usize].an_edge;
        let mut e = start;
        loop {
            ids.push(mesh.verts[mesh.org(e) as usize].data);
            e = mesh.lnext(e);
            if e == start {
                break;
            }
        }
        sink.on_monotone(mesh.faces[f as usize].winding, &ids);
    }
    Ok(())
}

/// Try to render a single cached contour as a triangle fan from its first
/// vertex. Returns false if the contour needs the full sweep.
pub(crate) fn render_cache<S: TessellationSink + ?Sized>(
    cache: &[CachedVertex],
    boundary_only: bool,
    sink: &mut S,
) -> bool {
    if cache.len() < 3 {
        return true;
    }
    // Guide edges carry no winding; leave them to the sweep.
    if cache.iter().any(|v| !v.real) {
        return false;
    }

    let mut points = [SweepPoint::origin(); super::TESS_MAX_CACHE];
    for (slot, v) in points.iter_mut().zip(cache) {
        *slot = v.point;
    }
    let orientation = fan_orientation(&points[..cache.len().min(points.len())]);
    let sign = match orientation {
        FanOrientation::Inconsistent => return false,
        FanOrientation::Degenerate => return true,
        o => o.winding(),
    };
    if !sink.accept_winding(sign) {
        return true;
    }
    debug!("single contour of {} vertices rendered as a fan", cache.len());

    let v0 = cache[0].id;
    if boundary_only {
        sink.on_begin(PrimitiveType::LineLoop, sign);
        sink.on_vertex(v0);
        if sign > 0 {
            cache[1..].iter().for_each(|v| sink.on_vertex(v.id));
        } else {
            cache[1..].iter().rev().for_each(|v| sink.on_vertex(v.id));
        }
    } else {
        sink.on_begin(PrimitiveType::Triangles, sign);
        for pair in cache[1..].windows(2) {
            let (vp, vc) = (pair[0].id, pair[1].id);
            sink.on_vertex(v0);
            if sign > 0 {
                sink.on_vertex(vp);
                sink.on_vertex(vc);
            } else {
                sink.on_vertex(vc);
                sink.on_vertex(vp);
            }
        }
    }
    sink.on_end();
    true
}
