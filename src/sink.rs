// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Output side of the tessellator. A sink receives primitives as they are
// produced and decides which winding numbers count as filled.

use log::warn;

use crate::error::Diagnostic;

/// Client id for a vertex that has no entry in the caller's point store.
pub const NULL_CLIENT_ID: u32 = u32::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrimitiveType {
    /// Every three vertices form one triangle.
    Triangles,
    /// One closed outline.
    LineLoop,
}

/// Receiver for tessellation output. Every method has a default, so a sink
/// only implements the callbacks it cares about.
///
/// Primitives arrive as `on_begin`, a run of `on_vertex`, then `on_end`.
/// The winding passed to `on_begin` is the winding number shared by every
/// primitive in the run.
pub trait TessellationSink {
    fn on_begin(&mut self, _primitive: PrimitiveType, _winding: i32) {}

    fn on_vertex(&mut self, _id: u32) {}

    fn on_end(&mut self) {}

    fn on_error(&mut self, _diagnostic: Diagnostic) {}

    /// Supply a client id for a vertex created at `(x, y)`, where edges cross
    /// or coincident vertices merge. `ids` are the contributing vertices
    /// (`NULL_CLIENT_ID` where unused) and `weights` their interpolation
    /// weights, which sum to 1.
    ///
    /// Returning `NULL_CLIENT_ID` keeps the first id for a merge; for a
    /// crossing it is reported as `Diagnostic::NeedCombineCallback`.
    fn on_combine(&mut self, _x: f64, _y: f64, _ids: [u32; 4], _weights: [f64; 4]) -> u32 {
        NULL_CLIENT_ID
    }

    /// Whether a region with this winding number is filled. Winding zero is
    /// never filled by the sweep, whatever this returns; it is only consulted
    /// for zero when deciding whether a single contour may skip the sweep.
    fn accept_winding(&self, winding: i32) -> bool {
        winding != 0
    }

    /// Opt in to `on_monotone`.
    fn wants_monotones(&self) -> bool {
        false
    }

    /// The vertex ids of one filled monotone region, in boundary order,
    /// delivered before the region is triangulated.
    fn on_monotone(&mut self, _winding: i32, _ids: &[u32]) {}
}

/// Log a diagnostic and hand it to the sink.
pub(crate) fn report<S: TessellationSink + ?Sized>(sink: &mut S, diagnostic: Diagnostic) {
    warn!("tessellator: {}", diagnostic);
    sink.on_error(diagnostic);
}
