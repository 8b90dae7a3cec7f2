// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Geometric predicates on sweep coordinates.
//
// The sweep runs left to right along x and orders ties bottom to top along y.
// All predicates are evaluated in double precision and are written so that the
// sign of each result is consistent with `vert_leq`, which is what keeps the
// event queue and the edge dictionary in agreement.

use euclid::default::Point2D;

pub type Real = f64;

/// A vertex position in sweep space.
pub type SweepPoint = Point2D<Real>;

/// Lexicographic order: x first, then y.
#[inline]
pub fn vert_leq(u: SweepPoint, v: SweepPoint) -> bool {
    u.x < v.x || (u.x == v.x && u.y <= v.y)
}

#[inline]
pub fn vert_eq(u: SweepPoint, v: SweepPoint) -> bool {
    u.x == v.x && u.y == v.y
}

/// Lexicographic order with the axes transposed: y first, then x.
#[inline]
pub fn trans_leq(u: SweepPoint, v: SweepPoint) -> bool {
    u.y < v.y || (u.y == v.y && u.x <= v.x)
}

/// For `u <= v <= w` in `vert_leq` order, returns the signed vertical distance
/// from the segment `uw` to `v`, evaluated at `v.x`. Zero when `uw` is
/// vertical.
pub fn edge_eval(u: SweepPoint, v: SweepPoint, w: SweepPoint) -> Real {
    let gap_l = v.x - u.x;
    let gap_r = w.x - v.x;
    if gap_l + gap_r > 0.0 {
        if gap_l < gap_r {
            (v.y - u.y) + (u.y - w.y) * (gap_l / (gap_l + gap_r))
        } else {
            (v.y - w.y) + (w.y - u.y) * (gap_r / (gap_l + gap_r))
        }
    } else {
        0.0
    }
}

/// Same sign as `edge_eval(u, v, w)`, without the division.
pub fn edge_sign(u: SweepPoint, v: SweepPoint, w: SweepPoint) -> Real {
    let gap_l = v.x - u.x;
    let gap_r = w.x - v.x;
    if gap_l + gap_r > 0.0 {
        (v.y - w.y) * gap_l + (v.y - u.y) * gap_r
    } else {
        0.0
    }
}

/// `edge_eval` with the axes transposed.
pub fn trans_eval(u: SweepPoint, v: SweepPoint, w: SweepPoint) -> Real {
    let gap_l = v.y - u.y;
    let gap_r = w.y - v.y;
    if gap_l + gap_r > 0.0 {
        if gap_l < gap_r {
            (v.x - u.x) + (u.x - w.x) * (gap_l / (gap_l + gap_r))
        } else {
            (v.x - w.x) + (w.x - u.x) * (gap_r / (gap_l + gap_r))
        }
    } else {
        0.0
    }
}

/// `edge_sign` with the axes transposed.
pub fn trans_sign(u: SweepPoint, v: SweepPoint, w: SweepPoint) -> Real {
    let gap_l = v.y - u.y;
    let gap_r = w.y - v.y;
    if gap_l + gap_r > 0.0 {
        (v.x - w.x) * gap_l + (v.x - u.x) * gap_r
    } else {
        0.0
    }
}

#[inline]
pub fn vert_l1_dist(u: SweepPoint, v: SweepPoint) -> Real {
    (u.x - v.x).abs() + (u.y - v.y).abs()
}

/// Returns `(b*x + a*y) / (a + b)`, or the midpoint when both weights are zero.
/// Negative weights are treated as zero, so the result always lies between
/// `x` and `y`.
#[inline]
pub fn real_interpolate(a: Real, x: Real, b: Real, y: Real) -> Real {
    let a = a.max(0.0);
    let b = b.max(0.0);
    if a <= b {
        if b == 0.0 {
            x / 2.0 + y / 2.0
        } else {
            x + (y - x) * (a / (a + b))
        }
    } else {
        y + (x - y) * (b / (a + b))
    }
}

/// Intersection of segments `o1 d1` and `o2 d2`.
///
/// Each coordinate is computed independently, along the axis order that gives
/// it the most precision. The result is guaranteed to lie inside the bounding
/// rectangle of both segments, which the sweep relies on to keep new vertices
/// to the right of the current event.
pub fn edge_intersect(
    o1: SweepPoint,
    d1: SweepPoint,
    o2: SweepPoint,
    d2: SweepPoint,
) -> SweepPoint {
    let x = intersect_coord(o1, d1, o2, d2, vert_leq, edge_eval, edge_sign, |p| p.x);
    let y = intersect_coord(o1, d1, o2, d2, trans_leq, trans_eval, trans_sign, |p| p.y);
    SweepPoint::new(x, y)
}

#[allow(clippy::too_many_arguments)]
fn intersect_coord(
    o1: SweepPoint,
    d1: SweepPoint,
    o2: SweepPoint,
    d2: SweepPoint,
    leq: fn(SweepPoint, SweepPoint) -> bool,
    eval: fn(SweepPoint, SweepPoint, SweepPoint) -> Real,
    sign: fn(SweepPoint, SweepPoint, SweepPoint) -> Real,
    coord: fn(SweepPoint) -> Real,
) -> Real {
    let (mut a, mut b) = if leq(o1, d1) { (o1, d1) } else { (d1, o1) };
    let (mut c, mut d) = if leq(o2, d2) { (o2, d2) } else { (d2, o2) };
    if !leq(a, c) {
        std::mem::swap(&mut a, &mut c);
        std::mem::swap(&mut b, &mut d);
    }

    if !leq(c, b) {
        // Technically no intersection; split the gap between them.
        return coord(c) / 2.0 + coord(b) / 2.0;
    }

    if leq(b, d) {
        // Interpolate between c and b.
        let (mut z1, mut z2) = (eval(a, c, b), eval(c, b, d));
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        real_interpolate(z1, coord(c), z2, coord(b))
    } else {
        // Interpolate between c and d.
        let (mut z1, mut z2) = (sign(a, c, b), -sign(a, d, b));
        if z1 + z2 < 0.0 {
            z1 = -z1;
            z2 = -z2;
        }
        real_interpolate(z1, coord(c), z2, coord(d))
    }
}
