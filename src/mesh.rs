// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Half-edge mesh stored in index arenas.
//
// Every edge is a pair of half-edges at indices `e` and `e ^ 1`. Vertices,
// faces and edge pairs each live on a circular doubly linked list anchored at
// a dummy head at index 0. Nodes are never reclaimed; a killed node is simply
// unlinked, and all indices stay stable for the lifetime of the mesh.
//
// The operations here are the classic topological primitives: make_edge,
// splice, delete_edge, add_edge_vertex, split_edge, connect and zap_face.
// Each keeps the mesh valid, so callers never see a half-finished topology.

mod mono;

use crate::error::{reserve, TessResult};
use crate::geom::{vert_leq, SweepPoint};

pub const INVALID: u32 = u32::MAX;

pub type VertIdx = u32;
pub type FaceIdx = u32;
pub type EdgeIdx = u32;

pub const V_HEAD: VertIdx = 0;
pub const F_HEAD: FaceIdx = 0;
pub const E_HEAD: EdgeIdx = 0;
pub const E_HEAD_SYM: EdgeIdx = 1;

/// The other half of the pair.
#[inline(always)]
pub fn sym(e: EdgeIdx) -> EdgeIdx {
    e ^ 1
}

#[derive(Clone, Debug)]
pub struct Vertex {
    pub next: VertIdx,
    pub prev: VertIdx,
    /// A half-edge with this vertex as origin.
    pub an_edge: EdgeIdx,
    pub coords: SweepPoint,
    /// Client id carried through to the output.
    pub data: u32,
    /// Handle in the event queue while the vertex is pending.
    pub pq_handle: i32,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            next: INVALID,
            prev: INVALID,
            an_edge: INVALID,
            coords: SweepPoint::new(0.0, 0.0),
            data: INVALID,
            pq_handle: 0,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Face {
    pub next: FaceIdx,
    pub prev: FaceIdx,
    /// A half-edge with this face on its left.
    pub an_edge: EdgeIdx,
    /// Whether the winding number of the face satisfied the sink's predicate.
    pub inside: bool,
    /// Winding number of the face, valid once the sweep has finished it.
    pub winding: i32,
}

#[derive(Clone, Debug)]
pub struct HalfEdge {
    /// Next pair in the edge list. Even halves chain forward; the odd half of
    /// a pair stores the previous pair in its own `next`.
    pub next: EdgeIdx,
    /// Next edge counter-clockwise around the origin.
    pub onext: EdgeIdx,
    /// Next edge counter-clockwise around the left face.
    pub lnext: EdgeIdx,
    pub org: VertIdx,
    pub lface: FaceIdx,
    /// Region in the edge dictionary whose upper edge this is, if any.
    pub active_region: u32,
    /// Change in winding number when crossing from the right face to the left.
    pub winding: i32,
}

impl Default for HalfEdge {
    fn default() -> Self {
        Self {
            next: INVALID,
            onext: INVALID,
            lnext: INVALID,
            org: INVALID,
            lface: INVALID,
            active_region: INVALID,
            winding: 0,
        }
    }
}

pub struct Mesh {
    pub verts: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub edges: Vec<HalfEdge>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    pub fn new() -> Self {
        let v_head = Vertex {
            next: V_HEAD,
            prev: V_HEAD,
            ..Vertex::default()
        };
        let f_head = Face {
            next: F_HEAD,
            prev: F_HEAD,
            an_edge: INVALID,
            ..Face::default()
        };
        let e_head = HalfEdge {
            next: E_HEAD,
            ..HalfEdge::default()
        };
        let e_head_sym = HalfEdge {
            next: E_HEAD_SYM,
            ..HalfEdge::default()
        };
        Mesh {
            verts: vec![v_head],
            faces: vec![f_head],
            edges: vec![e_head, e_head_sym],
        }
    }

    // ──────────────────────────── Navigation ────────────────────────────

    #[inline]
    pub fn onext(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e as usize].onext
    }

    #[inline]
    pub fn lnext(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[e as usize].lnext
    }

    #[inline]
    pub fn org(&self, e: EdgeIdx) -> VertIdx {
        self.edges[e as usize].org
    }

    #[inline]
    pub fn dst(&self, e: EdgeIdx) -> VertIdx {
        self.edges[sym(e) as usize].org
    }

    #[inline]
    pub fn lface(&self, e: EdgeIdx) -> FaceIdx {
        self.edges[e as usize].lface
    }

    #[inline]
    pub fn rface(&self, e: EdgeIdx) -> FaceIdx {
        self.edges[sym(e) as usize].lface
    }

    #[inline]
    pub fn oprev(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[sym(e) as usize].lnext
    }

    #[inline]
    pub fn lprev(&self, e: EdgeIdx) -> EdgeIdx {
        sym(self.edges[e as usize].onext)
    }

    #[inline]
    pub fn rprev(&self, e: EdgeIdx) -> EdgeIdx {
        self.edges[sym(e) as usize].onext
    }

    #[inline]
    pub fn dnext(&self, e: EdgeIdx) -> EdgeIdx {
        sym(self.rprev(e))
    }

    #[inline]
    pub fn point(&self, v: VertIdx) -> SweepPoint {
        self.verts[v as usize].coords
    }

    #[inline]
    pub fn org_point(&self, e: EdgeIdx) -> SweepPoint {
        self.point(self.org(e))
    }

    #[inline]
    pub fn dst_point(&self, e: EdgeIdx) -> SweepPoint {
        self.point(self.dst(e))
    }

    #[inline]
    pub fn edge_goes_left(&self, e: EdgeIdx) -> bool {
        vert_leq(self.dst_point(e), self.org_point(e))
    }

    #[inline]
    pub fn edge_goes_right(&self, e: EdgeIdx) -> bool {
        vert_leq(self.org_point(e), self.dst_point(e))
    }

    /// Sum of both halves' winding into `dst`, used when merging parallel edges.
    pub fn add_winding(&mut self, dst: EdgeIdx, src: EdgeIdx) {
        let w = self.edges[src as usize].winding;
        let ws = self.edges[sym(src) as usize].winding;
        self.edges[dst as usize].winding += w;
        self.edges[sym(dst) as usize].winding += ws;
    }

    /// Iterate over the live vertices in list order.
    pub fn vertices(&self) -> impl Iterator<Item = VertIdx> + '_ {
        ListIter {
            head: V_HEAD,
            cur: self.verts[V_HEAD as usize].next,
            next: move |v: u32| self.verts[v as usize].next,
        }
    }

    /// Iterate over the live faces in list order.
    pub fn faces(&self) -> impl Iterator<Item = FaceIdx> + '_ {
        ListIter {
            head: F_HEAD,
            cur: self.faces[F_HEAD as usize].next,
            next: move |f: u32| self.faces[f as usize].next,
        }
    }

    /// Iterate over the even half of every live edge pair.
    pub fn edge_pairs(&self) -> impl Iterator<Item = EdgeIdx> + '_ {
        ListIter {
            head: E_HEAD,
            cur: self.edges[E_HEAD as usize].next,
            next: move |e: u32| self.edges[e as usize].next,
        }
    }

    /// Number of half-edges on the boundary of `f`.
    pub fn face_len(&self, f: FaceIdx) -> usize {
        let start = self.faces[f as usize].an_edge;
        let mut e = start;
        let mut n = 0;
        loop {
            n += 1;
            e = self.lnext(e);
            if e == start {
                return n;
            }
        }
    }

    // ──────────────────────── Allocation primitives ────────────────────────

    /// New edge pair inserted before `e_next` in the edge list. The pair forms
    /// its own origin rings and a single two-edge loop; org and lface are unset.
    fn alloc_edge(&mut self, e_next: EdgeIdx) -> TessResult<EdgeIdx> {
        reserve(&mut self.edges, 2)?;
        let e_next = e_next & !1;
        let e = self.edges.len() as EdgeIdx;
        let e_sym = sym(e);
        let e_prev = self.edges[sym(e_next) as usize].next;

        self.edges.push(HalfEdge {
            next: e_next,
            onext: e,
            lnext: e_sym,
            ..HalfEdge::default()
        });
        self.edges.push(HalfEdge {
            next: e_prev,
            onext: e_sym,
            lnext: e,
            ..HalfEdge::default()
        });
        self.edges[sym(e_prev) as usize].next = e;
        self.edges[sym(e_next) as usize].next = e_sym;
        Ok(e)
    }

    /// New vertex before `v_next`, made the origin of every edge in the
    /// origin ring of `e_orig`.
    fn alloc_vertex(&mut self, e_orig: EdgeIdx, v_next: VertIdx) -> TessResult<VertIdx> {
        reserve(&mut self.verts, 1)?;
        let v = self.verts.len() as VertIdx;
        let v_prev = self.verts[v_next as usize].prev;
        self.verts.push(Vertex {
            next: v_next,
            prev: v_prev,
            an_edge: e_orig,
            ..Vertex::default()
        });
        self.verts[v_prev as usize].next = v;
        self.verts[v_next as usize].prev = v;

        let mut e = e_orig;
        loop {
            self.edges[e as usize].org = v;
            e = self.onext(e);
            if e == e_orig {
                break;
            }
        }
        Ok(v)
    }

    /// New face before `f_next`, inheriting its inside flag and winding, made
    /// the left face of every edge in the loop of `e_orig`.
    fn alloc_face(&mut self, e_orig: EdgeIdx, f_next: FaceIdx) -> TessResult<FaceIdx> {
        reserve(&mut self.faces, 1)?;
        let f = self.faces.len() as FaceIdx;
        let f_prev = self.faces[f_next as usize].prev;
        let template = &self.faces[f_next as usize];
        let (inside, winding) = (template.inside, template.winding);
        self.faces.push(Face {
            next: f_next,
            prev: f_prev,
            an_edge: e_orig,
            inside,
            winding,
        });
        self.faces[f_prev as usize].next = f;
        self.faces[f_next as usize].prev = f;

        let mut e = e_orig;
        loop {
            self.edges[e as usize].lface = f;
            e = self.lnext(e);
            if e == e_orig {
                break;
            }
        }
        Ok(f)
    }

    fn kill_edge(&mut self, e_del: EdgeIdx) {
        let e_del = e_del & !1;
        let e_next = self.edges[e_del as usize].next;
        let e_prev = self.edges[sym(e_del) as usize].next;
        self.edges[sym(e_next) as usize].next = e_prev;
        self.edges[sym(e_prev) as usize].next = e_next;
        self.edges[e_del as usize].next = INVALID;
        self.edges[sym(e_del) as usize].next = INVALID;
    }

    fn kill_vertex(&mut self, v_del: VertIdx, new_org: VertIdx) {
        let start = self.verts[v_del as usize].an_edge;
        let mut e = start;
        loop {
            self.edges[e as usize].org = new_org;
            e = self.onext(e);
            if e == start {
                break;
            }
        }
        let Vertex { prev, next, .. } = self.verts[v_del as usize];
        self.verts[next as usize].prev = prev;
        self.verts[prev as usize].next = next;
        let dead = &mut self.verts[v_del as usize];
        dead.next = INVALID;
        dead.prev = INVALID;
        dead.an_edge = INVALID;
    }

    fn kill_face(&mut self, f_del: FaceIdx, new_lface: FaceIdx) {
        let start = self.faces[f_del as usize].an_edge;
        let mut e = start;
        loop {
            self.edges[e as usize].lface = new_lface;
            e = self.lnext(e);
            if e == start {
                break;
            }
        }
        let (prev, next) = (self.faces[f_del as usize].prev, self.faces[f_del as usize].next);
        self.faces[next as usize].prev = prev;
        self.faces[prev as usize].next = next;
        let dead = &mut self.faces[f_del as usize];
        dead.next = INVALID;
        dead.prev = INVALID;
        dead.an_edge = INVALID;
    }

    /// Exchange `a.onext` and `b.onext`, repairing the lnext links that point
    /// at them. Its own inverse.
    fn raw_splice(&mut self, a: EdgeIdx, b: EdgeIdx) {
        let a_onext = self.onext(a);
        let b_onext = self.onext(b);
        self.edges[sym(a_onext) as usize].lnext = b;
        self.edges[sym(b_onext) as usize].lnext = a;
        self.edges[a as usize].onext = b_onext;
        self.edges[b as usize].onext = a_onext;
    }

    // ──────────────────────── Topological operations ────────────────────────

    /// A new isolated edge with two new vertices and one new face.
    pub fn make_edge(&mut self) -> TessResult<EdgeIdx> {
        let e = self.alloc_edge(E_HEAD)?;
        self.alloc_vertex(e, V_HEAD)?;
        self.alloc_vertex(sym(e), V_HEAD)?;
        self.alloc_face(e, F_HEAD)?;
        Ok(e)
    }

    /// Exchange `e_org.onext` and `e_dst.onext`.
    ///
    /// If the two origins differ they are merged into one; if they are the
    /// same the vertex is split in two. Likewise the two left faces are merged
    /// or split.
    pub fn splice(&mut self, e_org: EdgeIdx, e_dst: EdgeIdx) -> TessResult<()> {
        if e_org == e_dst {
            return Ok(());
        }
        let mut joining_vertices = false;
        let mut joining_loops = false;

        if self.org(e_dst) != self.org(e_org) {
            joining_vertices = true;
            self.kill_vertex(self.org(e_dst), self.org(e_org));
        }
        if self.lface(e_dst) != self.lface(e_org) {
            joining_loops = true;
            self.kill_face(self.lface(e_dst), self.lface(e_org));
        }

        self.raw_splice(e_dst, e_org);

        if !joining_vertices {
            let org = self.org(e_org);
            self.alloc_vertex(e_dst, org)?;
            self.verts[org as usize].an_edge = e_org;
        }
        if !joining_loops {
            let lface = self.lface(e_org);
            self.alloc_face(e_dst, lface)?;
            self.faces[lface as usize].an_edge = e_org;
        }
        Ok(())
    }

    /// Remove the edge `e_del`. Faces on either side are joined, or a face is
    /// split if the edge was its only link between two pieces. Endpoints left
    /// without edges are removed.
    pub fn delete_edge(&mut self, e_del: EdgeIdx) -> TessResult<()> {
        let e_del_sym = sym(e_del);
        let mut joining_loops = false;

        if self.lface(e_del) != self.rface(e_del) {
            joining_loops = true;
            self.kill_face(self.lface(e_del), self.rface(e_del));
        }

        if self.onext(e_del) == e_del {
            self.kill_vertex(self.org(e_del), INVALID);
        } else {
            let rface = self.rface(e_del);
            if rface != INVALID {
                self.faces[rface as usize].an_edge = self.oprev(e_del);
            }
            let org = self.org(e_del);
            self.verts[org as usize].an_edge = self.onext(e_del);
            self.raw_splice(e_del, self.oprev(e_del));
            if !joining_loops {
                let lface = self.lface(e_del);
                self.alloc_face(e_del, lface)?;
            }
        }

        if self.onext(e_del_sym) == e_del_sym {
            self.kill_vertex(self.org(e_del_sym), INVALID);
            self.kill_face(self.lface(e_del_sym), INVALID);
        } else {
            let lface = self.lface(e_del);
            if lface != INVALID {
                self.faces[lface as usize].an_edge = self.oprev(e_del_sym);
            }
            let org = self.org(e_del_sym);
            self.verts[org as usize].an_edge = self.onext(e_del_sym);
            self.raw_splice(e_del_sym, self.oprev(e_del_sym));
        }

        self.kill_edge(e_del);
        Ok(())
    }

    /// New edge `e_new` with `e_new == e_org.lnext` whose destination is a new
    /// vertex. Both halves share the left face of `e_org`.
    pub fn add_edge_vertex(&mut self, e_org: EdgeIdx) -> TessResult<EdgeIdx> {
        let e_new = self.alloc_edge(e_org)?;
        let e_new_sym = sym(e_new);
        self.raw_splice(e_new, self.lnext(e_org));
        let dst = self.dst(e_org);
        self.edges[e_new as usize].org = dst;
        self.alloc_vertex(e_new_sym, dst)?;
        let lface = self.lface(e_org);
        self.edges[e_new as usize].lface = lface;
        self.edges[e_new_sym as usize].lface = lface;
        Ok(e_new)
    }

    /// Split `e_org` in two at a new vertex. Returns the second half, which is
    /// `e_org.lnext` and carries the same winding.
    pub fn split_edge(&mut self, e_org: EdgeIdx) -> TessResult<EdgeIdx> {
        let temp = self.add_edge_vertex(e_org)?;
        let e_new = sym(temp);
        let e_org_sym = sym(e_org);

        self.raw_splice(e_org_sym, self.oprev(e_org_sym));
        self.raw_splice(e_org_sym, e_new);

        let mid = self.org(e_new);
        self.edges[e_org_sym as usize].org = mid;
        let far = self.dst(e_new);
        self.verts[far as usize].an_edge = sym(e_new);
        let rface = self.rface(e_org);
        self.edges[sym(e_new) as usize].lface = rface;
        self.edges[e_new as usize].winding = self.edges[e_org as usize].winding;
        self.edges[sym(e_new) as usize].winding = self.edges[e_org_sym as usize].winding;
        Ok(e_new)
    }

    /// New edge from `e_org.dst` to `e_dst.org`. If the two edges shared a
    /// left face it is split in two, with the new face on the left of the new
    /// edge; otherwise the two faces are joined.
    pub fn connect(&mut self, e_org: EdgeIdx, e_dst: EdgeIdx) -> TessResult<EdgeIdx> {
        let e_new = self.alloc_edge(e_org)?;
        let e_new_sym = sym(e_new);
        let mut joining_loops = false;

        if self.lface(e_dst) != self.lface(e_org) {
            joining_loops = true;
            self.kill_face(self.lface(e_dst), self.lface(e_org));
        }

        self.raw_splice(e_new, self.lnext(e_org));
        self.raw_splice(e_new_sym, e_dst);

        self.edges[e_new as usize].org = self.dst(e_org);
        self.edges[e_new_sym as usize].org = self.org(e_dst);
        let lface = self.lface(e_org);
        self.edges[e_new as usize].lface = lface;
        self.edges[e_new_sym as usize].lface = lface;
        self.faces[lface as usize].an_edge = e_new_sym;

        if !joining_loops {
            self.alloc_face(e_new, lface)?;
        }
        Ok(e_new)
    }

    /// Remove face `f_zap`. Its edges lose their left face; edges with no face
    /// on either side are deleted along with any vertices they isolate.
    pub fn zap_face(&mut self, f_zap: FaceIdx) {
        let start = self.faces[f_zap as usize].an_edge;
        let mut e_next = self.lnext(start);
        loop {
            let e = e_next;
            e_next = self.lnext(e);
            self.edges[e as usize].lface = INVALID;

            if self.rface(e) == INVALID {
                if self.onext(e) == e {
                    self.kill_vertex(self.org(e), INVALID);
                } else {
                    let org = self.org(e);
                    self.verts[org as usize].an_edge = self.onext(e);
                    self.raw_splice(e, self.oprev(e));
                }
                let e_sym = sym(e);
                if self.onext(e_sym) == e_sym {
                    self.kill_vertex(self.org(e_sym), INVALID);
                } else {
                    let org = self.org(e_sym);
                    self.verts[org as usize].an_edge = self.onext(e_sym);
                    self.raw_splice(e_sym, self.oprev(e_sym));
                }
                self.kill_edge(e);
            }
            if e == start {
                break;
            }
        }

        let (prev, next) = (self.faces[f_zap as usize].prev, self.faces[f_zap as usize].next);
        self.faces[next as usize].prev = prev;
        self.faces[prev as usize].next = next;
        let dead = &mut self.faces[f_zap as usize];
        dead.next = INVALID;
        dead.prev = INVALID;
        dead.an_edge = INVALID;
    }

    /// Structural consistency check over every live face, vertex and edge.
    pub fn is_consistent(&self) -> bool {
        for f in self.faces() {
            let start = self.faces[f as usize].an_edge;
            let mut e = start;
            loop {
                if sym(self.onext(self.lnext(e))) != e
                    || self.lnext(sym(self.onext(e))) != e
                    || self.lface(e) != f
                {
                    return false;
                }
                e = self.lnext(e);
                if e == start {
                    break;
                }
            }
        }
        for v in self.vertices() {
            let start = self.verts[v as usize].an_edge;
            let mut e = start;
            loop {
                if self.lnext(sym(self.onext(e))) != e
                    || sym(self.onext(self.lnext(e))) != e
                    || self.org(e) != v
                {
                    return false;
                }
                e = self.onext(e);
                if e == start {
                    break;
                }
            }
        }
        for e in self.edge_pairs() {
            let s = sym(e);
            if self.org(e) == INVALID
                || self.org(s) == INVALID
                || sym(self.onext(self.lnext(e))) != e
                || self.lnext(sym(self.onext(e))) != e
            {
                return false;
            }
        }
        true
    }
}

struct ListIter<F: Fn(u32) -> u32> {
    head: u32,
    cur: u32,
    next: F,
}

impl<F: Fn(u32) -> u32> Iterator for ListIter<F> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.cur == self.head {
            return None;
        }
        let item = self.cur;
        self.cur = (self.next)(item);
        Some(item)
    }
}
