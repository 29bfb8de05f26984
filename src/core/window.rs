use crate::types::{BandImage, FuseError, FuseResult, PixelAddress, WindowStack};
use ndarray::Array3;

/// Split a window extent into pixels above/left and below/right of center.
///
/// Odd extents are centered. Even extents span one more pixel below/right
/// than above/left; this asymmetry is a deliberate convention, and the
/// returned window always has exactly the requested extent.
fn half_extents(extent: usize) -> (i64, i64) {
    ((extent as i64 - 1) / 2, extent as i64 / 2)
}

/// Extract one window per band around a pixel address
///
/// Returns an array shaped [window rows, window columns, bands], with the
/// band axis in the order the slice was given. Bounds are checked before
/// any slicing: a window that would cross the grid edge fails with
/// [`FuseError::WindowOutOfRange`] rather than being truncated.
pub fn extract_window(
    address: PixelAddress,
    bands: &[&BandImage],
    shape: (usize, usize),
) -> FuseResult<WindowStack> {
    let (height, width) = shape;
    if height == 0 || width == 0 {
        return Err(FuseError::Processing(format!(
            "Window shape {}x{} must be positive",
            height, width
        )));
    }
    if bands.is_empty() {
        return Err(FuseError::Processing(
            "Window extraction needs at least one band".to_string(),
        ));
    }

    let (grid_rows, grid_cols) = bands[0].dim();
    for band in bands {
        if band.dim() != (grid_rows, grid_cols) {
            return Err(FuseError::Processing(format!(
                "Band dimension mismatch: expected {}x{}, got {}x{}",
                grid_rows,
                grid_cols,
                band.nrows(),
                band.ncols()
            )));
        }
    }

    let (up, down) = half_extents(height);
    let (left, right) = half_extents(width);

    let row0 = address.row - up;
    let row1 = address.row + down;
    let col0 = address.col - left;
    let col1 = address.col + right;

    if row0 < 0 || col0 < 0 || row1 >= grid_rows as i64 || col1 >= grid_cols as i64 {
        return Err(FuseError::WindowOutOfRange {
            col: address.col,
            row: address.row,
            height,
            width,
            grid_rows,
            grid_cols,
        });
    }

    let mut window = Array3::zeros((height, width, bands.len()));
    for (b, band) in bands.iter().enumerate() {
        let view = band.slice(ndarray::s![
            row0 as usize..=row1 as usize,
            col0 as usize..=col1 as usize
        ]);
        window.slice_mut(ndarray::s![.., .., b]).assign(&view);
    }

    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn ramp_band(rows: usize, cols: usize) -> BandImage {
        Array2::from_shape_fn((rows, cols), |(i, j)| (i * cols + j) as f32)
    }

    #[test]
    fn test_odd_window_is_centered() {
        let band = ramp_band(10, 10);
        let window = extract_window(PixelAddress::new(5, 5), &[&band], (3, 3)).unwrap();

        assert_eq!(window.dim(), (3, 3, 1));
        // Center of the window is the addressed pixel.
        assert_eq!(window[[1, 1, 0]], band[[5, 5]]);
        assert_eq!(window[[0, 0, 0]], band[[4, 4]]);
        assert_eq!(window[[2, 2, 0]], band[[6, 6]]);
    }

    #[test]
    fn test_even_window_extends_below_right() {
        let band = ramp_band(10, 10);
        let window = extract_window(PixelAddress::new(5, 5), &[&band], (4, 4)).unwrap();

        assert_eq!(window.dim(), (4, 4, 1));
        // One pixel above/left, two below/right of the address.
        assert_eq!(window[[0, 0, 0]], band[[4, 4]]);
        assert_eq!(window[[3, 3, 0]], band[[7, 7]]);
    }

    #[test]
    fn test_edge_window_is_rejected_not_truncated() {
        let band = ramp_band(10, 10);

        for address in [
            PixelAddress::new(0, 5),
            PixelAddress::new(5, 0),
            PixelAddress::new(9, 5),
            PixelAddress::new(5, 9),
        ] {
            let result = extract_window(address, &[&band], (3, 3));
            assert!(matches!(result, Err(FuseError::WindowOutOfRange { .. })));
        }

        // Just inside the rim is fine.
        assert!(extract_window(PixelAddress::new(1, 1), &[&band], (3, 3)).is_ok());
        assert!(extract_window(PixelAddress::new(8, 8), &[&band], (3, 3)).is_ok());
    }

    #[test]
    fn test_multi_band_stacking_order() {
        let ones: BandImage = Array2::from_elem((8, 8), 1.0);
        let twos: BandImage = Array2::from_elem((8, 8), 2.0);
        let window = extract_window(PixelAddress::new(4, 4), &[&ones, &twos], (3, 3)).unwrap();

        assert_eq!(window.dim(), (3, 3, 2));
        assert_eq!(window[[0, 0, 0]], 1.0);
        assert_eq!(window[[0, 0, 1]], 2.0);
    }

    #[test]
    fn test_band_dimension_mismatch_is_rejected() {
        let a: BandImage = Array2::zeros((8, 8));
        let b: BandImage = Array2::zeros((9, 8));
        let result = extract_window(PixelAddress::new(4, 4), &[&a, &b], (3, 3));
        assert!(matches!(result, Err(FuseError::Processing(_))));
    }
}
