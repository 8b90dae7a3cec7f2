// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Triangulation of monotone faces and interior bookkeeping on the finished mesh.

use super::{sym, FaceIdx, Mesh, INVALID};
use crate::error::TessResult;
use crate::geom::edge_sign;

impl Mesh {
    /// Triangulate a face that is monotone with respect to the sweep direction.
    ///
    /// The face is walked from its leftmost vertex along an upper and a lower
    /// chain, connecting across whenever the chain being advanced turns the
    /// right way. New faces inherit the inside flag and winding of `face`.
    pub fn tessellate_mono_region(&mut self, face: FaceIdx) -> TessResult<()> {
        let mut up = self.faces[face as usize].an_edge;
        debug_assert!(self.lnext(up) != up && self.lnext(self.lnext(up)) != up);

        while self.edge_goes_left(up) {
            up = self.lprev(up);
        }
        while self.edge_goes_right(up) {
            up = self.lnext(up);
        }
        let mut lo = self.lprev(up);

        while self.lnext(up) != lo {
            if crate::geom::vert_leq(self.dst_point(up), self.org_point(lo)) {
                // up.dst is on the left; make triangles from the lower chain.
                while self.lnext(lo) != up
                    && (self.edge_goes_left(self.lnext(lo))
                        || edge_sign(
                            self.org_point(lo),
                            self.dst_point(lo),
                            self.dst_point(self.lnext(lo)),
                        ) <= 0.0)
                {
                    let temp = self.connect(self.lnext(lo), lo)?;
                    lo = sym(temp);
                }
                lo = self.lprev(lo);
            } else {
                // lo.org is on the left; make triangles from the upper chain.
                while self.lnext(lo) != up
                    && (self.edge_goes_right(self.lprev(up))
                        || edge_sign(
                            self.dst_point(up),
                            self.org_point(up),
                            self.org_point(self.lprev(up)),
                        ) >= 0.0)
                {
                    let temp = self.connect(up, self.lprev(up))?;
                    up = sym(temp);
                }
                up = self.lnext(up);
            }
        }

        // The rightmost vertex remains; fan out from the lower chain.
        debug_assert!(self.lnext(lo) != up);
        while self.lnext(self.lnext(lo)) != up {
            let temp = self.connect(self.lnext(lo), lo)?;
            lo = sym(temp);
        }
        Ok(())
    }

    /// Triangulate every inside face.
    pub fn tessellate_interior(&mut self) -> TessResult<()> {
        let mut f = self.faces[super::F_HEAD as usize].next;
        while f != super::F_HEAD {
            // New faces are linked in before `f`, so they are not revisited.
            let next = self.faces[f as usize].next;
            let face = &self.faces[f as usize];
            if face.inside && face.winding != 0 {
                self.tessellate_mono_region(f)?;
            }
            f = next;
        }
        Ok(())
    }

    /// Remove every face that is not inside.
    pub fn discard_exterior(&mut self) {
        let mut f = self.faces[super::F_HEAD as usize].next;
        while f != super::F_HEAD {
            let next = self.faces[f as usize].next;
            if !self.faces[f as usize].inside {
                self.zap_face(f);
            }
            f = next;
        }
    }

    fn face_inside(&self, f: FaceIdx) -> bool {
        f != INVALID && self.faces[f as usize].inside
    }

    /// Reset edge windings so that each edge separating an inside face from
    /// an outside one carries `value` toward the inside, and every other edge
    /// carries zero. With `keep_only_boundary` the other edges are deleted.
    pub fn set_winding_number(&mut self, value: i32, keep_only_boundary: bool) -> TessResult<()> {
        let mut e = self.edges[super::E_HEAD as usize].next;
        while e != super::E_HEAD {
            let e_next = self.edges[e as usize].next;
            let left = self.face_inside(self.lface(e));
            let right = self.face_inside(self.rface(e));
            if left != right {
                self.edges[e as usize].winding = if left { value } else { -value };
            } else if !keep_only_boundary {
                self.edges[e as usize].winding = 0;
            } else {
                self.delete_edge(e)?;
            }
            e = e_next;
        }
        Ok(())
    }
}
