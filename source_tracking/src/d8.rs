//! Decoding of ESRI-style D8 flow-direction rasters into receiver tables.
//!
//! Rows are numbered top-down as they appear in the raster file, so cell
//! `row * cols + col` lies south of `(row - 1) * cols + col`.

use crate::{
    error::{TrackingError, ValidationError},
    routing::{CellId, Routing},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterShape {
    pub rows: usize,
    pub cols: usize,
}

impl RasterShape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> CellId {
        debug_assert!(row < self.rows && col < self.cols);
        row * self.cols + col
    }

    #[inline]
    pub fn row_col(&self, cell: CellId) -> (usize, usize) {
        (cell / self.cols, cell % self.cols)
    }

    /// `true` everywhere except the outermost ring of cells.
    pub fn interior_mask(&self) -> Vec<bool> {
        (0..self.cell_count())
            .map(|cell| {
                let (row, col) = self.row_col(cell);
                row > 0 && col > 0 && row + 1 < self.rows && col + 1 < self.cols
            })
            .collect()
    }
}

fn esri_directions() -> &'static [(i32, i32, i32)] {
    // (code, d_col, d_row) clockwise from east: E, SE, S, SW, W, NW, N, NE
    &[
        (1, 1, 0),
        (2, 1, 1),
        (4, 0, 1),
        (8, -1, 1),
        (16, -1, 0),
        (32, -1, -1),
        (64, 0, -1),
        (128, 1, -1),
    ]
}

/// Converts one D8 code per cell into a single-receiver routing.
///
/// Zero and negative (nodata) codes mark sinks. Codes outside the eight
/// powers of two, or pointing off the raster, are rejected.
pub fn routing_from_esri_codes(
    shape: RasterShape,
    codes: &[i32],
) -> Result<Routing, TrackingError> {
    check_len("direction codes", shape, codes.len())?;
    decode(shape, codes, |_| true)
}

/// Like [`routing_from_esri_codes`], but only cells where `core` is `true`
/// are decoded. Every other cell becomes a sink whatever its code, so edge
/// cells pointing off the raster and positive nodata values pass through.
pub fn routing_from_esri_codes_masked(
    shape: RasterShape,
    codes: &[i32],
    core: &[bool],
) -> Result<Routing, TrackingError> {
    check_len("direction codes", shape, codes.len())?;
    check_len("core mask", shape, core.len())?;
    decode(shape, codes, |cell| core[cell])
}

fn check_len(field: &'static str, shape: RasterShape, found: usize) -> Result<(), TrackingError> {
    if found != shape.cell_count() {
        return Err(ValidationError::LengthMismatch {
            field,
            expected: shape.cell_count(),
            found,
        }
        .into());
    }
    Ok(())
}

fn decode(
    shape: RasterShape,
    codes: &[i32],
    is_core: impl Fn(CellId) -> bool,
) -> Result<Routing, TrackingError> {
    let mut receivers = Vec::with_capacity(codes.len());
    for (cell, &code) in codes.iter().enumerate() {
        if code <= 0 || !is_core(cell) {
            receivers.push(cell);
            continue;
        }
        let invalid = || TrackingError::from(ValidationError::InvalidDirectionCode { cell, code });
        let &(_, d_col, d_row) = esri_directions()
            .iter()
            .find(|(c, _, _)| *c == code)
            .ok_or_else(invalid)?;
        let (row, col) = shape.row_col(cell);
        let target_row = row as i64 + d_row as i64;
        let target_col = col as i64 + d_col as i64;
        if target_row < 0
            || target_col < 0
            || target_row >= shape.rows as i64
            || target_col >= shape.cols as i64
        {
            return Err(invalid());
        }
        receivers.push(shape.cell(target_row as usize, target_col as usize));
    }

    Ok(Routing::Single(receivers))
}

/// Cells whose direction code is not `nodata`.
pub fn core_mask_from_nodata(codes: &[i32], nodata: i32) -> Vec<bool> {
    codes.iter().map(|&code| code != nodata).collect()
}

/// Core cells of a raster with its edge ring closed: interior cells whose
/// code is not `nodata`.
pub fn closed_core_mask(
    shape: RasterShape,
    codes: &[i32],
    nodata: Option<i32>,
) -> Result<Vec<bool>, TrackingError> {
    check_len("direction codes", shape, codes.len())?;
    let interior = shape.interior_mask();
    match nodata {
        Some(nodata) => intersect_core_masks(&interior, &core_mask_from_nodata(codes, nodata)),
        None => Ok(interior),
    }
}

/// Cellwise AND of two core masks over the same cells.
pub fn intersect_core_masks(mask: &[bool], other: &[bool]) -> Result<Vec<bool>, TrackingError> {
    if mask.len() != other.len() {
        return Err(ValidationError::LengthMismatch {
            field: "core mask",
            expected: mask.len(),
            found: other.len(),
        }
        .into());
    }
    Ok(mask.iter().zip(other).map(|(&a, &b)| a && b).collect())
}
