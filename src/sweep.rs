// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Sweep-line computation of the planar arrangement.
//
// Vertices are processed left to right. The edge dictionary holds the edges
// crossing the sweep line, bottom to top, and each pair of adjacent edges
// bounds an active region carrying the winding number of the area between
// them. When a region is closed off by the sweep, its face in the mesh is
// marked with that winding number and with whether the sink accepts it.
//
// Every inside face the sweep produces is monotone, which is what lets the
// triangulation run in linear time per face.

use log::trace;

use crate::dict::{Dict, NodeIdx, DICT_HEAD};
use crate::error::{reserve, Diagnostic, TessResult};
use crate::geom::{
    edge_eval, edge_intersect, edge_sign, vert_eq, vert_l1_dist, vert_leq, Real, SweepPoint,
};
use crate::mesh::{sym, EdgeIdx, FaceIdx, Mesh, VertIdx, E_HEAD, F_HEAD, INVALID, V_HEAD};
use crate::priorityq::{PriorityQ, INVALID_HANDLE};
use crate::sink::{report, TessellationSink, NULL_CLIENT_ID};
use crate::tess::MAX_COORD;

/// Sentinel edges span the whole coordinate range at this height.
const SENTINEL_COORD: Real = 4.0 * MAX_COORD;

type RegionIdx = u32;

/// The area between two adjacent dictionary edges.
#[derive(Clone, Debug)]
struct ActiveRegion {
    /// Upper edge, directed right to left.
    e_up: EdgeIdx,
    node_up: NodeIdx,
    winding: i32,
    inside: bool,
    /// One of the two unbounded edges at the top and bottom.
    sentinel: bool,
    /// Upper or lower edge changed; neighbors must be rechecked.
    dirty: bool,
    /// Upper edge is a temporary edge added by `connect_right_vertex`.
    fix_upper_edge: bool,
}

impl ActiveRegion {
    fn new(e_up: EdgeIdx) -> Self {
        ActiveRegion {
            e_up,
            node_up: INVALID,
            winding: 0,
            inside: false,
            sentinel: false,
            dirty: false,
            fix_upper_edge: false,
        }
    }
}

/// Queue key. The position is copied in because a queued vertex never moves.
#[derive(Copy, Clone, Debug)]
struct Event {
    point: SweepPoint,
    vertex: VertIdx,
}

/// Left to right, then bottom to top, then by vertex creation order.
fn event_leq(a: &Event, b: &Event) -> bool {
    if vert_eq(a.point, b.point) {
        a.vertex <= b.vertex
    } else {
        vert_leq(a.point, b.point)
    }
}

/// Whether edge `e1` is at or below edge `e2` where the sweep line crosses
/// them at `event`. Both edges are directed right to left.
fn edge_leq(mesh: &Mesh, event: VertIdx, e1: EdgeIdx, e2: EdgeIdx) -> bool {
    let ev = mesh.point(event);
    let e1_ends_here = mesh.dst(e1) == event;
    let e2_ends_here = mesh.dst(e2) == event;

    if e1_ends_here {
        if e2_ends_here {
            // Both leave the event; order by slope.
            let (o1, o2) = (mesh.org_point(e1), mesh.org_point(e2));
            if vert_leq(o1, o2) {
                return edge_sign(mesh.dst_point(e2), o1, o2) <= 0.0;
            }
            return edge_sign(mesh.dst_point(e1), o2, o1) >= 0.0;
        }
        return edge_sign(mesh.dst_point(e2), ev, mesh.org_point(e2)) <= 0.0;
    }
    if e2_ends_here {
        return edge_sign(mesh.dst_point(e1), ev, mesh.org_point(e1)) >= 0.0;
    }

    let t1 = edge_eval(mesh.dst_point(e1), ev, mesh.org_point(e1));
    let t2 = edge_eval(mesh.dst_point(e2), ev, mesh.org_point(e2));
    t1 >= t2
}

/// How a sweep ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SweepOutcome {
    Complete,
    /// Edges crossed and the sink supplied no vertex for the crossing; the
    /// arrangement is valid but references a null client id.
    MissingCombine,
}

/// Compute the planar arrangement of `mesh`, merge coincident vertices, split
/// crossing edges, and mark every face with its winding number and whether
/// the sink accepts it.
pub(crate) fn compute_interior<S>(mesh: &mut Mesh, sink: &mut S) -> TessResult<SweepOutcome>
where
    S: TessellationSink + ?Sized,
{
    let mut sweep = Sweep {
        mesh,
        sink,
        dict: Dict::new(),
        regions: Vec::new(),
        free_regions: Vec::new(),
        pq: PriorityQ::new(event_leq),
        event: INVALID,
        missing_combine: false,
    };
    sweep.run()?;
    Ok(if sweep.missing_combine {
        SweepOutcome::MissingCombine
    } else {
        SweepOutcome::Complete
    })
}

struct Sweep<'a, S: TessellationSink + ?Sized> {
    mesh: &'a mut Mesh,
    sink: &'a mut S,
    dict: Dict,
    regions: Vec<ActiveRegion>,
    free_regions: Vec<RegionIdx>,
    pq: PriorityQ<Event>,
    /// The vertex being processed; `edge_leq` is evaluated relative to it.
    event: VertIdx,
    missing_combine: bool,
}

impl<'a, S: TessellationSink + ?Sized> Sweep<'a, S> {
    fn run(&mut self) -> TessResult<()> {
        self.remove_degenerate_edges()?;
        self.init_priority_queue()?;
        self.init_edge_dict()?;

        let mut events = 0usize;
        while let Some(ev) = self.pq.extract_min() {
            self.mesh.verts[ev.vertex as usize].pq_handle = INVALID_HANDLE;
            // Merge every vertex at exactly this position before processing.
            while let Some(next) = self.pq.minimum() {
                if !vert_eq(next.point, ev.point) {
                    break;
                }
                self.pq.extract_min();
                self.mesh.verts[next.vertex as usize].pq_handle = INVALID_HANDLE;
                let a = self.mesh.verts[ev.vertex as usize].an_edge;
                let b = self.mesh.verts[next.vertex as usize].an_edge;
                self.splice_merge_vertices(a, b)?;
            }
            self.sweep_event(ev.vertex)?;
            events += 1;
        }
        trace!("sweep processed {} events", events);
        debug_assert!(self.pq.is_empty());

        self.done_edge_dict();
        self.remove_degenerate_faces()?;
        debug_assert!(self.mesh.is_consistent());
        Ok(())
    }

    // ─────────────────────────── Regions ───────────────────────────

    fn alloc_region(&mut self, region: ActiveRegion) -> TessResult<RegionIdx> {
        if let Some(r) = self.free_regions.pop() {
            self.regions[r as usize] = region;
            return Ok(r);
        }
        reserve(&mut self.regions, 1)?;
        self.regions.push(region);
        Ok((self.regions.len() - 1) as RegionIdx)
    }

    #[inline]
    fn region_above(&self, r: RegionIdx) -> RegionIdx {
        self.dict.key(self.dict.succ(self.regions[r as usize].node_up))
    }

    #[inline]
    fn region_below(&self, r: RegionIdx) -> RegionIdx {
        self.dict.key(self.dict.pred(self.regions[r as usize].node_up))
    }

    #[inline]
    fn e_up(&self, r: RegionIdx) -> EdgeIdx {
        self.regions[r as usize].e_up
    }

    fn set_dirty(&mut self, r: RegionIdx) {
        if r != INVALID {
            self.regions[r as usize].dirty = true;
        }
    }

    fn is_inside(&self, winding: i32) -> bool {
        winding != 0 && self.sink.accept_winding(winding)
    }

    /// Insert `r` into the dictionary, searching downward from `node`.
    fn insert_region_before(&mut self, node: NodeIdx, r: RegionIdx) -> TessResult<NodeIdx> {
        let (mesh, regions, event) = (&*self.mesh, &self.regions, self.event);
        self.dict.insert_before(node, r, |a, b| {
            edge_leq(mesh, event, regions[a as usize].e_up, regions[b as usize].e_up)
        })
    }

    fn add_region_below(&mut self, reg_above: RegionIdx, e_new_up: EdgeIdx) -> TessResult<RegionIdx> {
        let r = self.alloc_region(ActiveRegion::new(e_new_up))?;
        let node = self.insert_region_before(self.regions[reg_above as usize].node_up, r)?;
        self.regions[r as usize].node_up = node;
        self.mesh.edges[e_new_up as usize].active_region = r;
        Ok(r)
    }

    fn delete_region(&mut self, r: RegionIdx) {
        let region = &self.regions[r as usize];
        debug_assert!(!region.fix_upper_edge || self.mesh.edges[region.e_up as usize].winding == 0);
        let (e_up, node) = (region.e_up, region.node_up);
        self.mesh.edges[e_up as usize].active_region = INVALID;
        self.dict.delete(node);
        self.free_regions.push(r);
    }

    /// Replace a temporary upper edge with a real one.
    fn fix_upper_edge(&mut self, r: RegionIdx, new_edge: EdgeIdx) -> TessResult<()> {
        debug_assert!(self.regions[r as usize].fix_upper_edge);
        self.mesh.delete_edge(self.e_up(r))?;
        let region = &mut self.regions[r as usize];
        region.fix_upper_edge = false;
        region.e_up = new_edge;
        self.mesh.edges[new_edge as usize].active_region = r;
        Ok(())
    }

    fn compute_winding(&mut self, r: RegionIdx) {
        let above = self.region_above(r);
        let w = self.regions[above as usize].winding + self.mesh.edges[self.e_up(r) as usize].winding;
        let inside = self.is_inside(w);
        let region = &mut self.regions[r as usize];
        region.winding = w;
        region.inside = inside;
    }

    fn mark_face(&mut self, f: FaceIdx, r: RegionIdx) {
        let (inside, winding) = (self.regions[r as usize].inside, self.regions[r as usize].winding);
        let face = &mut self.mesh.faces[f as usize];
        face.inside = inside;
        face.winding = winding;
    }

    /// Record the region's winding on its face and remove it from the sweep.
    fn finish_region(&mut self, r: RegionIdx) {
        let e = self.e_up(r);
        let f = self.mesh.lface(e);
        self.mark_face(f, r);
        self.mesh.faces[f as usize].an_edge = e;
        self.delete_region(r);
    }

    /// The region above the uppermost edge sharing an origin with `r`'s upper
    /// edge. A temporary edge found there is replaced first.
    fn top_left_region(&mut self, r: RegionIdx) -> TessResult<RegionIdx> {
        let org = self.mesh.org(self.e_up(r));
        let mut r = r;
        loop {
            r = self.region_above(r);
            if self.mesh.org(self.e_up(r)) != org {
                break;
            }
        }
        if self.regions[r as usize].fix_upper_edge {
            let below = self.region_below(r);
            let a = sym(self.e_up(below));
            let b = self.mesh.lnext(self.e_up(r));
            let e = self.mesh.connect(a, b)?;
            self.fix_upper_edge(r, e)?;
            r = self.region_above(r);
        }
        Ok(r)
    }

    fn top_right_region(&self, r: RegionIdx) -> RegionIdx {
        let dst = self.mesh.dst(self.e_up(r));
        let mut r = r;
        loop {
            r = self.region_above(r);
            if self.mesh.dst(self.e_up(r)) != dst {
                return r;
            }
        }
    }

    /// Close every region from `reg_first` down to (not including)
    /// `reg_last`, or until the edges stop sharing an origin when `reg_last`
    /// is `INVALID`. Returns the lowest left-going edge at the event.
    fn finish_left_regions(&mut self, reg_first: RegionIdx, reg_last: RegionIdx) -> TessResult<EdgeIdx> {
        let mut reg_prev = reg_first;
        let mut e_prev = self.e_up(reg_first);
        while reg_prev != reg_last {
            self.regions[reg_prev as usize].fix_upper_edge = false;
            let reg = self.region_below(reg_prev);
            let mut e = self.e_up(reg);
            if self.mesh.org(e) != self.mesh.org(e_prev) {
                if !self.regions[reg as usize].fix_upper_edge {
                    // No more left-going edges at this vertex.
                    self.finish_region(reg_prev);
                    break;
                }
                // Temporary edge below; replace it with one to this vertex.
                let a = self.mesh.lprev(e_prev);
                e = self.mesh.connect(a, sym(e))?;
                self.fix_upper_edge(reg, e)?;
            }
            if self.mesh.onext(e_prev) != e {
                let oprev = self.mesh.oprev(e);
                self.mesh.splice(oprev, e)?;
                self.mesh.splice(e_prev, e)?;
            }
            self.finish_region(reg_prev);
            e_prev = self.e_up(reg);
            reg_prev = reg;
        }
        Ok(e_prev)
    }

    /// Insert the right-going edges `e_first .. e_last` (around their common
    /// origin) below `reg_up`, then fix the mesh ordering and windings of all
    /// right-going edges at that vertex.
    fn add_right_edges(
        &mut self,
        reg_up: RegionIdx,
        e_first: EdgeIdx,
        e_last: EdgeIdx,
        e_top_left: EdgeIdx,
        clean_up: bool,
    ) -> TessResult<()> {
        let mut e = e_first;
        loop {
            debug_assert!(self.mesh.edge_goes_right(e));
            self.add_region_below(reg_up, sym(e))?;
            e = self.mesh.onext(e);
            if e == e_last {
                break;
            }
        }

        let e_top_left = if e_top_left == INVALID {
            self.mesh.rprev(self.e_up(self.region_below(reg_up)))
        } else {
            e_top_left
        };

        let mut reg_prev = reg_up;
        let mut e_prev = e_top_left;
        let mut first_time = true;
        loop {
            let reg = self.region_below(reg_prev);
            let e = sym(self.e_up(reg));
            if self.mesh.org(e) != self.mesh.org(e_prev) {
                break;
            }
            if self.mesh.onext(e) != e_prev {
                // Relink e directly below e_prev.
                let oprev = self.mesh.oprev(e);
                self.mesh.splice(oprev, e)?;
                let oprev = self.mesh.oprev(e_prev);
                self.mesh.splice(oprev, e)?;
            }
            let w = self.regions[reg_prev as usize].winding - self.mesh.edges[e as usize].winding;
            let inside = self.is_inside(w);
            let region = &mut self.regions[reg as usize];
            region.winding = w;
            region.inside = inside;

            // Parallel right-going edges are merged before any intersection test.
            self.regions[reg_prev as usize].dirty = true;
            if !first_time && self.check_for_right_splice(reg_prev)? {
                self.mesh.add_winding(e, e_prev);
                self.delete_region(reg_prev);
                self.mesh.delete_edge(e_prev)?;
            }
            first_time = false;
            reg_prev = reg;
            e_prev = e;
        }
        self.regions[reg_prev as usize].dirty = true;

        if clean_up {
            self.walk_dirty_regions(reg_prev)?;
        }
        Ok(())
    }

    // ─────────────────────────── Vertex merging ───────────────────────────

    /// Ask the sink for a client id for `isect`. When the sink declines, an
    /// optional merge keeps the first id; a required one is reported once and
    /// leaves the vertex without an id.
    fn call_combine(&mut self, isect: VertIdx, ids: [u32; 4], weights: [f64; 4], needed: bool) {
        let p = self.mesh.point(isect);
        let mut id = self.sink.on_combine(p.x, p.y, ids, weights);
        if id == NULL_CLIENT_ID {
            if !needed {
                id = ids[0];
            } else if !self.missing_combine {
                report(&mut *self.sink, Diagnostic::NeedCombineCallback);
                self.missing_combine = true;
            }
        }
        self.mesh.verts[isect as usize].data = id;
    }

    /// Merge `e2.org` into `e1.org`, which sit at the same position.
    fn splice_merge_vertices(&mut self, e1: EdgeIdx, e2: EdgeIdx) -> TessResult<()> {
        let v1 = self.mesh.org(e1);
        let v2 = self.mesh.org(e2);
        let ids = [
            self.mesh.verts[v1 as usize].data,
            self.mesh.verts[v2 as usize].data,
            NULL_CLIENT_ID,
            NULL_CLIENT_ID,
        ];
        self.call_combine(v1, ids, [0.5, 0.5, 0.0, 0.0], false);
        self.mesh.splice(e1, e2)
    }

    /// Weights of `org` and `dst` for a point on their segment, summing to 0.5.
    fn vertex_weights(&self, isect: VertIdx, org: VertIdx, dst: VertIdx) -> [f64; 2] {
        let p = self.mesh.point(isect);
        let t1 = vert_l1_dist(self.mesh.point(org), p);
        let t2 = vert_l1_dist(self.mesh.point(dst), p);
        if t1 + t2 == 0.0 {
            return [0.25, 0.25];
        }
        [0.5 * t2 / (t1 + t2), 0.5 * t1 / (t1 + t2)]
    }

    fn get_intersect_data(
        &mut self,
        isect: VertIdx,
        org_up: VertIdx,
        dst_up: VertIdx,
        org_lo: VertIdx,
        dst_lo: VertIdx,
    ) {
        let data = |v: VertIdx| self.mesh.verts[v as usize].data;
        let ids = [data(org_up), data(dst_up), data(org_lo), data(dst_lo)];
        let [w0, w1] = self.vertex_weights(isect, org_up, dst_up);
        let [w2, w3] = self.vertex_weights(isect, org_lo, dst_lo);
        self.call_combine(isect, ids, [w0, w1, w2, w3], true);
    }

    // ─────────────────────────── Ordering repair ───────────────────────────

    /// Check the upper and lower edges of `reg_up` against each other at
    /// their origins, and splice if the dictionary order is violated there.
    fn check_for_right_splice(&mut self, reg_up: RegionIdx) -> TessResult<bool> {
        let reg_lo = self.region_below(reg_up);
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let up_org = self.mesh.org_point(e_up);
        let lo_org = self.mesh.org_point(e_lo);

        if vert_leq(up_org, lo_org) {
            if edge_sign(self.mesh.dst_point(e_lo), up_org, lo_org) > 0.0 {
                return Ok(false);
            }
            if !vert_eq(up_org, lo_org) {
                // e_up.org lies on or below e_lo; splice it in.
                self.mesh.split_edge(sym(e_lo))?;
                let oprev = self.mesh.oprev(e_lo);
                self.mesh.splice(e_up, oprev)?;
                self.set_dirty(reg_up);
                self.set_dirty(reg_lo);
            } else if self.mesh.org(e_up) != self.mesh.org(e_lo) {
                // Same position; discard e_up.org, which is still queued.
                let handle = self.mesh.verts[self.mesh.org(e_up) as usize].pq_handle;
                if handle != INVALID_HANDLE {
                    self.pq.delete(handle);
                }
                let oprev = self.mesh.oprev(e_lo);
                self.splice_merge_vertices(oprev, e_up)?;
            }
        } else {
            if edge_sign(self.mesh.dst_point(e_up), lo_org, up_org) < 0.0 {
                return Ok(false);
            }
            // e_lo.org lies on or above e_up.
            let above = self.region_above(reg_up);
            self.set_dirty(above);
            self.set_dirty(reg_up);
            self.mesh.split_edge(sym(e_up))?;
            let oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(oprev, e_up)?;
        }
        Ok(true)
    }

    /// The same check at the destinations, which are both already processed.
    fn check_for_left_splice(&mut self, reg_up: RegionIdx) -> TessResult<bool> {
        let reg_lo = self.region_below(reg_up);
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let up_dst = self.mesh.dst_point(e_up);
        let lo_dst = self.mesh.dst_point(e_lo);
        debug_assert!(!vert_eq(up_dst, lo_dst));

        if vert_leq(up_dst, lo_dst) {
            if edge_sign(up_dst, lo_dst, self.mesh.org_point(e_up)) < 0.0 {
                return Ok(false);
            }
            let above = self.region_above(reg_up);
            self.set_dirty(above);
            self.set_dirty(reg_up);
            let e = self.mesh.split_edge(e_up)?;
            self.mesh.splice(sym(e_lo), e)?;
            let f = self.mesh.lface(e);
            self.mark_face(f, reg_up);
        } else {
            if edge_sign(lo_dst, up_dst, self.mesh.org_point(e_lo)) > 0.0 {
                return Ok(false);
            }
            self.set_dirty(reg_up);
            self.set_dirty(reg_lo);
            let e = self.mesh.split_edge(e_lo)?;
            let lnext = self.mesh.lnext(e_up);
            self.mesh.splice(lnext, sym(e_lo))?;
            let f = self.mesh.rface(e);
            self.mark_face(f, reg_up);
        }
        Ok(true)
    }

    /// Test the upper and lower edges of `reg_up` for a crossing right of the
    /// sweep line, and split both at the crossing if there is one. Returns
    /// true if the dirty regions were already walked recursively.
    fn check_for_intersect(&mut self, reg_up: RegionIdx) -> TessResult<bool> {
        let mut reg_up = reg_up;
        let mut reg_lo = self.region_below(reg_up);
        let mut e_up = self.e_up(reg_up);
        let mut e_lo = self.e_up(reg_lo);
        let (org_up, dst_up) = (self.mesh.org(e_up), self.mesh.dst(e_up));
        let (org_lo, dst_lo) = (self.mesh.org(e_lo), self.mesh.dst(e_lo));
        let (p_org_up, p_dst_up) = (self.mesh.point(org_up), self.mesh.point(dst_up));
        let (p_org_lo, p_dst_lo) = (self.mesh.point(org_lo), self.mesh.point(dst_lo));
        let event = self.event;
        let p_event = self.mesh.point(event);

        debug_assert!(!vert_eq(p_dst_lo, p_dst_up));
        debug_assert!(org_up != event && org_lo != event);

        if org_up == org_lo {
            return Ok(false);
        }
        let t_min_up = p_org_up.y.min(p_dst_up.y);
        let t_max_lo = p_org_lo.y.max(p_dst_lo.y);
        if t_min_up > t_max_lo {
            return Ok(false);
        }
        if vert_leq(p_org_up, p_org_lo) {
            if edge_sign(p_dst_lo, p_org_up, p_org_lo) > 0.0 {
                return Ok(false);
            }
        } else if edge_sign(p_dst_up, p_org_lo, p_org_up) < 0.0 {
            return Ok(false);
        }

        // The edges intersect, at least marginally.
        let mut isect = edge_intersect(p_dst_up, p_org_up, p_dst_lo, p_org_lo);
        if vert_leq(isect, p_event) {
            // Slightly left of the sweep line from rounding; use the event.
            isect = p_event;
        }
        let org_min = if vert_leq(p_org_up, p_org_lo) { p_org_up } else { p_org_lo };
        if vert_leq(org_min, isect) {
            isect = org_min;
        }

        if vert_eq(isect, p_org_up) || vert_eq(isect, p_org_lo) {
            // At one of the right endpoints.
            self.check_for_right_splice(reg_up)?;
            return Ok(false);
        }

        let up_wrong_side = !vert_eq(p_dst_up, p_event) && edge_sign(p_dst_up, p_event, isect) >= 0.0;
        let lo_wrong_side = !vert_eq(p_dst_lo, p_event) && edge_sign(p_dst_lo, p_event, isect) <= 0.0;
        if up_wrong_side || lo_wrong_side {
            // A new edge would pass on the wrong side of the event.
            if dst_lo == event {
                // Splice dst_lo into e_up and process the new regions.
                self.mesh.split_edge(sym(e_up))?;
                self.mesh.splice(sym(e_lo), e_up)?;
                reg_up = self.top_left_region(reg_up)?;
                let below = self.region_below(reg_up);
                e_up = self.e_up(below);
                self.finish_left_regions(below, reg_lo)?;
                let oprev = self.mesh.oprev(e_up);
                self.add_right_edges(reg_up, oprev, e_up, e_up, true)?;
                return Ok(true);
            }
            if dst_up == event {
                // Splice dst_up into e_lo and process the new regions.
                self.mesh.split_edge(sym(e_lo))?;
                let a = self.mesh.lnext(e_up);
                let b = self.mesh.oprev(e_lo);
                self.mesh.splice(a, b)?;
                reg_lo = reg_up;
                reg_up = self.top_right_region(reg_up);
                let e = self.mesh.rprev(self.e_up(self.region_below(reg_up)));
                self.regions[reg_lo as usize].e_up = self.mesh.oprev(e_lo);
                e_lo = self.finish_left_regions(reg_lo, INVALID)?;
                let first = self.mesh.onext(e_lo);
                let last = self.mesh.rprev(e_up);
                self.add_right_edges(reg_up, first, last, e, true)?;
                return Ok(true);
            }
            // Called from connect_right_vertex: split whichever edge is on
            // the wrong side at the event and let the caller splice it.
            if edge_sign(p_dst_up, p_event, isect) >= 0.0 {
                let above = self.region_above(reg_up);
                self.set_dirty(above);
                self.set_dirty(reg_up);
                self.mesh.split_edge(sym(e_up))?;
                let v = self.mesh.org(e_up);
                self.mesh.verts[v as usize].coords = p_event;
            }
            if edge_sign(p_dst_lo, p_event, isect) <= 0.0 {
                self.set_dirty(reg_up);
                self.set_dirty(reg_lo);
                self.mesh.split_edge(sym(e_lo))?;
                let v = self.mesh.org(e_lo);
                self.mesh.verts[v as usize].coords = p_event;
            }
            return Ok(false);
        }

        // General case: split both edges and join them at the new vertex.
        self.mesh.split_edge(sym(e_up))?;
        self.mesh.split_edge(sym(e_lo))?;
        let oprev = self.mesh.oprev(e_lo);
        self.mesh.splice(oprev, e_up)?;
        let v = self.mesh.org(e_up);
        self.mesh.verts[v as usize].coords = isect;
        let handle = self.pq.insert(Event { point: isect, vertex: v })?;
        self.mesh.verts[v as usize].pq_handle = handle;
        self.get_intersect_data(v, org_up, dst_up, org_lo, dst_lo);
        let above = self.region_above(reg_up);
        self.set_dirty(above);
        self.set_dirty(reg_up);
        self.set_dirty(reg_lo);
        Ok(false)
    }

    /// Recheck every dirty region from `reg_up` outward until the dictionary
    /// and the mesh agree again.
    fn walk_dirty_regions(&mut self, reg_up: RegionIdx) -> TessResult<()> {
        let mut reg_up = reg_up;
        let mut reg_lo = self.region_below(reg_up);
        loop {
            // Find the lowest dirty region.
            while reg_lo != INVALID && self.regions[reg_lo as usize].dirty {
                reg_up = reg_lo;
                reg_lo = self.region_below(reg_lo);
            }
            if reg_lo == INVALID {
                return Ok(());
            }
            if !self.regions[reg_up as usize].dirty {
                reg_lo = reg_up;
                reg_up = self.region_above(reg_up);
                if reg_up == INVALID || !self.regions[reg_up as usize].dirty {
                    return Ok(());
                }
            }
            self.regions[reg_up as usize].dirty = false;
            let mut e_up = self.e_up(reg_up);
            let mut e_lo = self.e_up(reg_lo);

            if self.mesh.dst(e_up) != self.mesh.dst(e_lo) && self.check_for_left_splice(reg_up)? {
                // A temporary edge is no longer needed once it has been
                // spliced against.
                if self.regions[reg_lo as usize].fix_upper_edge {
                    self.delete_region(reg_lo);
                    self.mesh.delete_edge(e_lo)?;
                    reg_lo = self.region_below(reg_up);
                    e_lo = self.e_up(reg_lo);
                } else if self.regions[reg_up as usize].fix_upper_edge {
                    self.delete_region(reg_up);
                    self.mesh.delete_edge(e_up)?;
                    reg_up = self.region_above(reg_lo);
                    e_up = self.e_up(reg_up);
                }
            }

            if self.mesh.org(e_up) != self.mesh.org(e_lo) {
                let event = self.event;
                if self.mesh.dst(e_up) != self.mesh.dst(e_lo)
                    && !self.regions[reg_up as usize].fix_upper_edge
                    && !self.regions[reg_lo as usize].fix_upper_edge
                    && (self.mesh.dst(e_up) == event || self.mesh.dst(e_lo) == event)
                {
                    if self.check_for_intersect(reg_up)? {
                        return Ok(());
                    }
                } else {
                    self.check_for_right_splice(reg_up)?;
                }
            }

            if self.mesh.org(e_up) == self.mesh.org(e_lo) && self.mesh.dst(e_up) == self.mesh.dst(e_lo) {
                // Two-edge loop; fold e_up into e_lo.
                self.mesh.add_winding(e_lo, e_up);
                self.delete_region(reg_up);
                self.mesh.delete_edge(e_up)?;
                reg_up = self.region_above(reg_lo);
            }
        }
    }

    // ─────────────────────────── Event processing ───────────────────────────

    /// The event has left-going edges but no right-going ones. Connect it to
    /// the right with a temporary edge so the region above stays monotone.
    fn connect_right_vertex(&mut self, reg_up: RegionIdx, e_bottom_left: EdgeIdx) -> TessResult<()> {
        let mut reg_up = reg_up;
        let mut e_bottom_left = e_bottom_left;
        let mut e_top_left = self.mesh.onext(e_bottom_left);
        let reg_lo = self.region_below(reg_up);
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);
        let mut degenerate = false;

        if self.mesh.dst(e_up) != self.mesh.dst(e_lo) {
            self.check_for_intersect(reg_up)?;
        }

        // The upper or lower edge may now pass through the event.
        let p_event = self.mesh.point(self.event);
        if vert_eq(self.mesh.org_point(e_up), p_event) {
            let oprev = self.mesh.oprev(e_top_left);
            self.mesh.splice(oprev, e_up)?;
            reg_up = self.top_left_region(reg_up)?;
            let below = self.region_below(reg_up);
            e_top_left = self.e_up(below);
            self.finish_left_regions(below, reg_lo)?;
            degenerate = true;
        }
        if vert_eq(self.mesh.org_point(e_lo), p_event) {
            let oprev = self.mesh.oprev(e_lo);
            self.mesh.splice(e_bottom_left, oprev)?;
            e_bottom_left = self.finish_left_regions(reg_lo, INVALID)?;
            degenerate = true;
        }
        if degenerate {
            let first = self.mesh.onext(e_bottom_left);
            return self.add_right_edges(reg_up, first, e_top_left, e_top_left, true);
        }

        // Connect to the closer of the two right endpoints.
        let target = if vert_leq(self.mesh.org_point(e_lo), self.mesh.org_point(e_up)) {
            self.mesh.oprev(e_lo)
        } else {
            e_up
        };
        let lprev = self.mesh.lprev(e_bottom_left);
        let e_new = self.mesh.connect(lprev, target)?;

        // No cleanup yet, or e_new could vanish before it is marked temporary.
        let onext = self.mesh.onext(e_new);
        self.add_right_edges(reg_up, e_new, onext, onext, false)?;
        let r = self.mesh.edges[sym(e_new) as usize].active_region;
        self.regions[r as usize].fix_upper_edge = true;
        self.walk_dirty_regions(reg_up)
    }

    /// The event lies on the upper edge of `reg_up`.
    fn connect_left_degenerate(&mut self, reg_up: RegionIdx, v_event: VertIdx) -> TessResult<()> {
        let e = self.e_up(reg_up);
        let p_event = self.mesh.point(v_event);
        let an_edge = self.mesh.verts[v_event as usize].an_edge;

        if vert_eq(self.mesh.org_point(e), p_event) {
            // e.org is still queued; merge and wait for it.
            return self.splice_merge_vertices(e, an_edge);
        }

        if !vert_eq(self.mesh.dst_point(e), p_event) {
            // Split e at the event and process again.
            self.mesh.split_edge(sym(e))?;
            if self.regions[reg_up as usize].fix_upper_edge {
                let unused = self.mesh.onext(e);
                self.mesh.delete_edge(unused)?;
                self.regions[reg_up as usize].fix_upper_edge = false;
            }
            self.mesh.splice(an_edge, e)?;
            return self.sweep_event(v_event);
        }

        // The event coincides with e.dst, which was already processed.
        let reg_up = self.top_right_region(reg_up);
        let reg = self.region_below(reg_up);
        let mut e_top_right = sym(self.e_up(reg));
        let mut e_top_left = self.mesh.onext(e_top_right);
        let e_last = e_top_left;
        if self.regions[reg as usize].fix_upper_edge {
            // Real right-going edges replace the temporary one.
            debug_assert!(e_top_left != e_top_right);
            self.delete_region(reg);
            self.mesh.delete_edge(e_top_right)?;
            e_top_right = self.mesh.oprev(e_top_left);
        }
        self.mesh.splice(an_edge, e_top_right)?;
        if !self.mesh.edge_goes_left(e_top_left) {
            e_top_left = INVALID;
        }
        let first = self.mesh.onext(e_top_right);
        self.add_right_edges(reg_up, first, e_last, e_top_left, true)
    }

    /// The event has no processed edges: every edge goes right.
    fn connect_left_vertex(&mut self, v_event: VertIdx) -> TessResult<()> {
        let probe = sym(self.mesh.verts[v_event as usize].an_edge);
        let node = {
            let (mesh, regions, event) = (&*self.mesh, &self.regions, self.event);
            self.dict
                .search(|key| edge_leq(mesh, event, probe, regions[key as usize].e_up))
        };
        let reg_up = self.dict.key(node);
        if reg_up == INVALID {
            return Ok(());
        }
        let reg_lo = self.region_below(reg_up);
        if reg_lo == INVALID {
            return Ok(());
        }
        let e_up = self.e_up(reg_up);
        let e_lo = self.e_up(reg_lo);

        let p_event = self.mesh.point(v_event);
        if edge_sign(self.mesh.dst_point(e_up), p_event, self.mesh.org_point(e_up)) == 0.0 {
            return self.connect_left_degenerate(reg_up, v_event);
        }

        // Connect to the closer of the two left endpoints.
        let reg = if vert_leq(self.mesh.dst_point(e_lo), self.mesh.dst_point(e_up)) {
            reg_up
        } else {
            reg_lo
        };

        let an_edge = self.mesh.verts[v_event as usize].an_edge;
        if self.regions[reg_up as usize].inside || self.regions[reg as usize].fix_upper_edge {
            let e_new = if reg == reg_up {
                let lnext = self.mesh.lnext(e_up);
                self.mesh.connect(sym(an_edge), lnext)?
            } else {
                let dnext = self.mesh.dnext(e_lo);
                sym(self.mesh.connect(dnext, an_edge)?)
            };
            if self.regions[reg as usize].fix_upper_edge {
                self.fix_upper_edge(reg, e_new)?;
            } else {
                let r = self.add_region_below(reg_up, e_new)?;
                self.compute_winding(r);
            }
            self.sweep_event(v_event)
        } else {
            // Outside the fill; no connection needed.
            self.add_right_edges(reg_up, an_edge, an_edge, INVALID, true)
        }
    }

    fn sweep_event(&mut self, v_event: VertIdx) -> TessResult<()> {
        self.event = v_event;
        let p = self.mesh.point(v_event);
        trace!("sweep event {} at ({}, {})", v_event, p.x, p.y);

        // Find an edge already in the dictionary, if any.
        let start = self.mesh.verts[v_event as usize].an_edge;
        let mut e = start;
        while self.mesh.edges[e as usize].active_region == INVALID {
            e = self.mesh.onext(e);
            if e == start {
                return self.connect_left_vertex(v_event);
            }
        }

        // Close the regions between left-going edges, then add the
        // right-going edges.
        let reg_up = self.top_left_region(self.mesh.edges[e as usize].active_region)?;
        let reg = self.region_below(reg_up);
        let e_top_left = self.e_up(reg);
        let e_bottom_left = self.finish_left_regions(reg, INVALID)?;

        if self.mesh.onext(e_bottom_left) == e_top_left {
            self.connect_right_vertex(reg_up, e_bottom_left)
        } else {
            let first = self.mesh.onext(e_bottom_left);
            self.add_right_edges(reg_up, first, e_top_left, e_top_left, true)
        }
    }

    // ─────────────────────────── Setup and teardown ───────────────────────────

    fn add_sentinel(&mut self, y: Real) -> TessResult<()> {
        let e = self.mesh.make_edge()?;
        let (org, dst) = (self.mesh.org(e), self.mesh.dst(e));
        self.mesh.verts[org as usize].coords = SweepPoint::new(SENTINEL_COORD, y);
        self.mesh.verts[dst as usize].coords = SweepPoint::new(-SENTINEL_COORD, y);
        self.event = dst;

        let r = self.alloc_region(ActiveRegion {
            sentinel: true,
            ..ActiveRegion::new(e)
        })?;
        let node = self.insert_region_before(DICT_HEAD, r)?;
        self.regions[r as usize].node_up = node;
        Ok(())
    }

    fn init_edge_dict(&mut self) -> TessResult<()> {
        self.add_sentinel(-SENTINEL_COORD)?;
        self.add_sentinel(SENTINEL_COORD)
    }

    /// Only the sentinels and at most one temporary edge should remain.
    fn done_edge_dict(&mut self) {
        let mut leftover = 0;
        loop {
            let r = self.dict.key(self.dict.min());
            if r == INVALID {
                break;
            }
            let region = &self.regions[r as usize];
            if !region.sentinel {
                debug_assert!(region.fix_upper_edge);
                leftover += 1;
            }
            debug_assert_eq!(region.winding, 0);
            self.delete_region(r);
        }
        debug_assert!(leftover <= 1);
    }

    /// Remove zero-length edges and contours of fewer than three edges.
    fn remove_degenerate_edges(&mut self) -> TessResult<()> {
        let mut e = self.mesh.edges[E_HEAD as usize].next;
        while e != E_HEAD {
            let mut e_next = self.mesh.edges[e as usize].next;
            let mut e_lnext = self.mesh.lnext(e);

            if vert_eq(self.mesh.org_point(e), self.mesh.dst_point(e)) && self.mesh.lnext(e_lnext) != e {
                // Zero-length edge on a contour of at least three edges.
                self.splice_merge_vertices(e_lnext, e)?;
                self.mesh.delete_edge(e)?;
                e = e_lnext;
                e_lnext = self.mesh.lnext(e);
            }
            if self.mesh.lnext(e_lnext) == e {
                // Contour of one or two edges.
                if e_lnext != e {
                    if e_lnext == e_next || e_lnext == sym(e_next) {
                        e_next = self.mesh.edges[e_next as usize].next;
                    }
                    self.mesh.delete_edge(e_lnext)?;
                }
                if e == e_next || e == sym(e_next) {
                    e_next = self.mesh.edges[e_next as usize].next;
                }
                self.mesh.delete_edge(e)?;
            }
            e = e_next;
        }
        Ok(())
    }

    fn init_priority_queue(&mut self) -> TessResult<()> {
        let mut v = self.mesh.verts[V_HEAD as usize].next;
        while v != V_HEAD {
            let point = self.mesh.point(v);
            let handle = self.pq.insert(Event { point, vertex: v })?;
            self.mesh.verts[v as usize].pq_handle = handle;
            v = self.mesh.verts[v as usize].next;
        }
        self.pq.init()
    }

    /// Fold faces bounded by only two edges into their neighbors.
    fn remove_degenerate_faces(&mut self) -> TessResult<()> {
        let mut f = self.mesh.faces[F_HEAD as usize].next;
        while f != F_HEAD {
            let f_next = self.mesh.faces[f as usize].next;
            let e = self.mesh.faces[f as usize].an_edge;
            debug_assert!(self.mesh.lnext(e) != e);
            if self.mesh.lnext(self.mesh.lnext(e)) == e {
                let onext = self.mesh.onext(e);
                self.mesh.add_winding(onext, e);
                self.mesh.delete_edge(e)?;
            }
            f = f_next;
        }
        Ok(())
    }
}
