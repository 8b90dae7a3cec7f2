// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Standalone geometry helpers for the tessellator front end.

use std::f64::consts::TAU;

use super::MAX_COORD;
use crate::geom::{Real, SweepPoint};

/// Clamp `c` into `[-MAX_COORD, MAX_COORD]`, noting whether it was out of range.
pub(crate) fn clamp_coord(c: Real, too_large: &mut bool) -> Real {
    if c < -MAX_COORD {
        *too_large = true;
        -MAX_COORD
    } else if c > MAX_COORD {
        *too_large = true;
        MAX_COORD
    } else {
        c
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FanOrientation {
    CounterClockwise,
    Clockwise,
    /// Every fan triangle has zero area.
    Degenerate,
    /// Fan triangles disagree in orientation, or the fan wraps around its
    /// apex more than once.
    Inconsistent,
}

impl FanOrientation {
    /// Winding number of the area the fan covers.
    pub(crate) fn winding(self) -> i32 {
        match self {
            FanOrientation::CounterClockwise => 1,
            FanOrientation::Clockwise => -1,
            _ => 0,
        }
    }
}

/// Orientation of the triangle fan from `points[0]` through the remaining
/// points, or `Inconsistent` if the fan does not tile the contour.
pub(crate) fn fan_orientation(points: &[SweepPoint]) -> FanOrientation {
    let Some((&v0, rest)) = points.split_first() else {
        return FanOrientation::Degenerate;
    };
    let mut sign = 0i32;
    let mut swept: Real = 0.0;
    let mut prev: Option<SweepPoint> = None;
    for &vc in rest {
        let cur = vc - v0;
        // A contour that returns to the apex has no fan around it.
        if cur.x == 0.0 && cur.y == 0.0 {
            return FanOrientation::Inconsistent;
        }
        if let Some(p) = prev {
            let prev_dir = p - v0;
            let cross = prev_dir.cross(cur);
            // An edge through the apex turns the fan by half a turn that no
            // triangle covers.
            if cross == 0.0 && prev_dir.dot(cur) < 0.0 {
                return FanOrientation::Inconsistent;
            }
            if cross != 0.0 {
                let s = if cross > 0.0 { 1 } else { -1 };
                if sign == -s {
                    return FanOrientation::Inconsistent;
                }
                sign = s;
                swept += cross.atan2(prev_dir.dot(cur)).abs();
            }
        }
        prev = Some(vc);
    }
    if swept >= TAU {
        return FanOrientation::Inconsistent;
    }
    match sign {
        1 => FanOrientation::CounterClockwise,
        -1 => FanOrientation::Clockwise,
        _ => FanOrientation::Degenerate,
    }
}
