// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)
//
// Fatal errors and non-fatal diagnostics reported by the tessellator.

use thiserror::Error;

/// Fatal tessellation failure. The polygon being built is discarded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum TessError {
    #[error("out of memory while building the tessellation mesh")]
    OutOfMemory,
}

/// Non-fatal conditions. The tessellator repairs what it can and keeps going;
/// each one is delivered to `TessellationSink::on_error` and logged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("vertex or contour call made before begin_polygon")]
    MissingBeginPolygon,
    #[error("vertex call made before begin_contour")]
    MissingBeginContour,
    #[error("begin_polygon called while a polygon was still open")]
    MissingEndPolygon,
    #[error("contour left open at end_polygon or begin_contour")]
    MissingEndContour,
    #[error("coordinate magnitude exceeded the supported range and was clamped")]
    CoordTooLarge,
    #[error("edges intersect but the sink did not supply a combined vertex")]
    NeedCombineCallback,
    #[error("property value out of range")]
    InvalidValue,
}

/// Failure constructing a `FilledPath`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum FillError {
    #[error(transparent)]
    Tessellation(#[from] TessError),
}

pub type TessResult<T> = Result<T, TessError>;

/// Reserve room for `additional` more elements, turning allocator refusal into
/// a tessellation error instead of an abort.
#[inline]
pub(crate) fn reserve<T>(v: &mut Vec<T>, additional: usize) -> TessResult<()> {
    // Indices are u32 with u32::MAX as the null value.
    if v.len() + additional >= (u32::MAX - 1) as usize {
        return Err(TessError::OutOfMemory);
    }
    v.try_reserve(additional).map_err(|_| TessError::OutOfMemory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_error_wraps_tess_error() {
        let e: FillError = TessError::OutOfMemory.into();
        assert_eq!(e, FillError::Tessellation(TessError::OutOfMemory));
        assert_eq!(e.to_string(), TessError::OutOfMemory.to_string());
    }

    #[test]
    fn reserve_grows_vec() {
        let mut v: Vec<u8> = Vec::new();
        reserve(&mut v, 2).unwrap();
        assert!(v.capacity() >= 2);
    }
}
