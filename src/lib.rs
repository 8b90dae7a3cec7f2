// winding-tess: sweep-line polygon tessellation with winding-number tracking
// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)

mod dict;
pub mod error;
pub mod fill;
mod geom;
mod mesh;
pub mod path;
mod priorityq;
pub mod sink;
mod sweep;
pub mod tess;

pub use error::{Diagnostic, FillError, TessError, TessResult};
pub use fill::{FillAttributes, FillOptions, FillRule, FillSubset, FillVertex, FilledPath, SubsetSizes};
pub use path::{Point, TessellatedPath};
pub use sink::{PrimitiveType, TessellationSink, NULL_CLIENT_ID};
pub use tess::{TessProperty, TessPropertyKind, Tessellator, MAX_COORD, TESS_MAX_CACHE};
