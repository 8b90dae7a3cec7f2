// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Tessellator front end: the polygon/contour state machine, the single-contour
// vertex cache, and the pipeline run at end_polygon.
//
// Polygons are described with begin_polygon, then any number of contours
// (begin_contour, vertex..., end_contour), then end_polygon. Output goes to the
// sink as the polygon is finished.

mod geometry;
mod output;

#[cfg(test)]
mod tests;

use log::debug;

use crate::error::{reserve, Diagnostic, TessResult};
use crate::geom::{Real, SweepPoint};
use crate::mesh::{sym, EdgeIdx, Mesh, INVALID};
use crate::sink::{report, TessellationSink};
use crate::sweep::{compute_interior, SweepOutcome};

use geometry::clamp_coord;
use output::{emit_monotones, render_boundary, render_cache, render_triangles, CachedVertex};

/// Largest accepted coordinate magnitude. Larger values are clamped.
pub const MAX_COORD: Real = 1.0e150;

/// A polygon that is a single contour of at most this many vertices may be
/// rendered as a fan without building a mesh.
pub const TESS_MAX_CACHE: usize = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum TessState {
    Dormant,
    InPolygon,
    InContour,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TessProperty {
    /// Relative tolerance for merging nearby vertices, in `[0, 1]`.
    /// Comparisons are currently exact whatever the value.
    Tolerance(f64),
    /// Emit the outline of each filled region instead of triangles.
    BoundaryOnly(bool),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TessPropertyKind {
    Tolerance,
    BoundaryOnly,
}

pub struct Tessellator<S> {
    sink: S,
    state: TessState,
    /// Created once the polygon is known to need the full sweep.
    mesh: Option<Mesh>,
    last_edge: EdgeIdx,
    edges_real: bool,
    cache: Vec<CachedVertex>,
    /// A second contour has begun; the cache goes into the mesh at its first
    /// vertex.
    flush_cache: bool,
    tolerance: f64,
    boundary_only: bool,
}

impl<S: TessellationSink> Tessellator<S> {
    pub fn new(sink: S) -> Self {
        Tessellator {
            sink,
            state: TessState::Dormant,
            mesh: None,
            last_edge: INVALID,
            edges_real: true,
            cache: Vec::new(),
            flush_cache: false,
            tolerance: 0.0,
            boundary_only: false,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn set_property(&mut self, property: TessProperty) {
        match property {
            TessProperty::Tolerance(t) => {
                if (0.0..=1.0).contains(&t) {
                    self.tolerance = t;
                } else {
                    report(&mut self.sink, Diagnostic::InvalidValue);
                }
            }
            TessProperty::BoundaryOnly(b) => self.boundary_only = b,
        }
    }

    pub fn property(&self, kind: TessPropertyKind) -> TessProperty {
        match kind {
            TessPropertyKind::Tolerance => TessProperty::Tolerance(self.tolerance),
            TessPropertyKind::BoundaryOnly => TessProperty::BoundaryOnly(self.boundary_only),
        }
    }

    // ─────── State machine ───────────────────────────────────────────────────

    /// Force the state to `target` one level at a time, reporting each
    /// missing call.
    fn goto_state(&mut self, target: TessState) -> TessResult<()> {
        while self.state != target {
            if self.state < target {
                match self.state {
                    TessState::Dormant => {
                        report(&mut self.sink, Diagnostic::MissingBeginPolygon);
                        self.begin_polygon()?;
                    }
                    _ => {
                        report(&mut self.sink, Diagnostic::MissingBeginContour);
                        self.begin_contour(true)?;
                    }
                }
            } else {
                match self.state {
                    TessState::InContour => {
                        report(&mut self.sink, Diagnostic::MissingEndContour);
                        self.end_contour()?;
                    }
                    _ => {
                        // The open polygon is abandoned.
                        report(&mut self.sink, Diagnostic::MissingEndPolygon);
                        self.make_dormant();
                    }
                }
            }
        }
        Ok(())
    }

    fn make_dormant(&mut self) {
        self.mesh = None;
        self.cache.clear();
        self.flush_cache = false;
        self.last_edge = INVALID;
        self.state = TessState::Dormant;
    }

    pub fn begin_polygon(&mut self) -> TessResult<()> {
        self.goto_state(TessState::Dormant)?;
        self.state = TessState::InPolygon;
        self.cache.clear();
        self.flush_cache = false;
        self.mesh = None;
        // A sink that fills winding zero needs the real arrangement.
        if self.sink.accept_winding(0) {
            self.mesh = Some(Mesh::new());
        }
        Ok(())
    }

    /// Start a contour. Edges of a contour that is not `real` do not change
    /// winding numbers; they only add structure to the arrangement.
    pub fn begin_contour(&mut self, real: bool) -> TessResult<()> {
        self.goto_state(TessState::InPolygon)?;
        self.state = TessState::InContour;
        self.last_edge = INVALID;
        if !self.cache.is_empty() {
            self.flush_cache = true;
        }
        self.edges_real = real;
        Ok(())
    }

    pub fn vertex(&mut self, x: f64, y: f64, id: u32) -> TessResult<()> {
        self.goto_state(TessState::InContour)?;
        let result = self.add_or_cache_vertex(x, y, id);
        if result.is_err() {
            self.make_dormant();
        }
        result
    }

    fn add_or_cache_vertex(&mut self, x: f64, y: f64, id: u32) -> TessResult<()> {
        if self.flush_cache {
            self.empty_cache()?;
            self.last_edge = INVALID;
        }

        let mut too_large = false;
        let x = clamp_coord(x, &mut too_large);
        let y = clamp_coord(y, &mut too_large);
        if too_large {
            report(&mut self.sink, Diagnostic::CoordTooLarge);
        }

        if self.mesh.is_none() {
            if self.cache.len() < TESS_MAX_CACHE {
                reserve(&mut self.cache, 1)?;
                self.cache.push(CachedVertex {
                    point: SweepPoint::new(x, y),
                    id,
                    real: self.edges_real,
                });
                return Ok(());
            }
            self.empty_cache()?;
        }
        self.add_vertex(x, y, id)
    }

    pub fn end_contour(&mut self) -> TessResult<()> {
        self.goto_state(TessState::InContour)?;
        self.state = TessState::InPolygon;
        Ok(())
    }

    /// Finish the polygon and deliver its output to the sink. On error the
    /// polygon is discarded and nothing further is emitted.
    pub fn end_polygon(&mut self) -> TessResult<()> {
        self.goto_state(TessState::InPolygon)?;
        self.state = TessState::Dormant;

        if self.mesh.is_none() {
            if !self.sink.accept_winding(0)
                && !self.sink.wants_monotones()
                && render_cache(&self.cache, self.boundary_only, &mut self.sink)
            {
                self.cache.clear();
                return Ok(());
            }
            if let Err(e) = self.empty_cache() {
                self.make_dormant();
                return Err(e);
            }
        }

        let Some(mut mesh) = self.mesh.take() else {
            return Ok(());
        };
        self.last_edge = INVALID;
        self.tessellate_mesh(&mut mesh)
    }

    fn tessellate_mesh(&mut self, mesh: &mut Mesh) -> TessResult<()> {
        let outcome = compute_interior(mesh, &mut self.sink)?;
        if outcome == SweepOutcome::MissingCombine {
            debug!("crossing without a combined vertex; polygon not rendered");
            return Ok(());
        }
        if self.sink.wants_monotones() {
            emit_monotones(mesh, &mut self.sink)?;
        }
        if self.boundary_only {
            mesh.set_winding_number(1, true)?;
            mesh.discard_exterior();
            render_boundary(mesh, &mut self.sink);
        } else {
            mesh.tessellate_interior()?;
            debug_assert!(mesh.is_consistent());
            mesh.discard_exterior();
            render_triangles(mesh, &mut self.sink);
        }
        Ok(())
    }

    // ─────── Mesh construction ───────────────────────────────────────────────

    /// Move the cached vertices into a fresh mesh.
    fn empty_cache(&mut self) -> TessResult<()> {
        self.mesh = Some(Mesh::new());
        let cache = std::mem::take(&mut self.cache);
        let real = self.edges_real;
        self.last_edge = INVALID;
        for v in &cache {
            self.edges_real = v.real;
            self.add_vertex(v.point.x, v.point.y, v.id)?;
        }
        self.edges_real = real;
        self.cache = cache;
        self.cache.clear();
        self.flush_cache = false;
        Ok(())
    }

    fn add_vertex(&mut self, x: f64, y: f64, id: u32) -> TessResult<()> {
        let mesh = self.mesh.get_or_insert_with(Mesh::new);
        let e = if self.last_edge == INVALID {
            // First vertex of the contour: a self-loop.
            let e = mesh.make_edge()?;
            mesh.splice(e, sym(e))?;
            e
        } else {
            // Split the last edge so it ends at the new vertex.
            mesh.split_edge(self.last_edge)?;
            mesh.lnext(self.last_edge)
        };

        let v = mesh.org(e);
        mesh.verts[v as usize].coords = SweepPoint::new(x, y);
        mesh.verts[v as usize].data = id;

        let w = i32::from(self.edges_real);
        mesh.edges[e as usize].winding = w;
        mesh.edges[sym(e) as usize].winding = -w;
        self.last_edge = e;
        Ok(())
    }
}
