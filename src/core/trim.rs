use crate::core::projection::{latlon_to_scan, scan_to_pixel, PixelMode};
use crate::types::{
    FuseError, FuseResult, GeoBoundingBox, GeodeticPoint, ImageBand, ImageGrid, SatelliteGeometry,
};
use ndarray::Array2;
use num_traits::{Float, FromPrimitive};

/// Pixel window selected by a trim, rows/columns half-open [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    pub row0: usize,
    pub row1: usize,
    pub col0: usize,
    pub col1: usize,
}

impl TrimWindow {
    pub fn nrows(&self) -> usize {
        self.row1 - self.row0
    }

    pub fn ncols(&self) -> usize {
        self.col1 - self.col0
    }
}

/// Region-of-interest trimmer for full-disk image grids
pub struct Trimmer {
    geometry: SatelliteGeometry,
}

impl Trimmer {
    pub fn new(geometry: SatelliteGeometry) -> Self {
        Self { geometry }
    }

    /// Compute the pixel window covering a geographic bounding box on one band
    ///
    /// The box's upper-left (max lat, min lon) and lower-right (min lat,
    /// max lon) corners are projected to scan angles, then to pixel
    /// coordinates on the band's own grid. A window with zero or negative
    /// extent fails with [`FuseError::TrimOutOfBounds`]; it is never
    /// silently clamped into an empty slice.
    pub fn window_for(&self, band: &ImageBand, bbox: &GeoBoundingBox) -> FuseResult<TrimWindow> {
        let upper_left = latlon_to_scan(
            GeodeticPoint::new(bbox.max_lat, bbox.min_lon),
            &self.geometry,
        )?;
        let lower_right = latlon_to_scan(
            GeodeticPoint::new(bbox.min_lat, bbox.max_lon),
            &self.geometry,
        )?;

        let (col_ul, row_ul) = scan_to_pixel(upper_left, &band.grid, PixelMode::Exact);
        let (col_lr, row_lr) = scan_to_pixel(lower_right, &band.grid, PixelMode::Exact);

        let row0 = row_ul.floor() as i64;
        let row1 = row_lr.ceil() as i64;
        let col0 = col_ul.floor() as i64;
        let col1 = col_lr.ceil() as i64;

        if row1 <= row0 || col1 <= col0 {
            return Err(FuseError::TrimOutOfBounds {
                rows: row1 - row0,
                cols: col1 - col0,
            });
        }

        let (grid_rows, grid_cols) = band.data.dim();
        let row0 = row0.max(0) as usize;
        let col0 = col0.max(0) as usize;
        let row1 = (row1 as usize).min(grid_rows);
        let col1 = (col1 as usize).min(grid_cols);

        if row1 <= row0 || col1 <= col0 {
            return Err(FuseError::TrimOutOfBounds {
                rows: row1 as i64 - row0 as i64,
                cols: col1 as i64 - col0 as i64,
            });
        }

        Ok(TrimWindow {
            row0,
            row1,
            col0,
            col1,
        })
    }

    /// Trim one band to a geographic bounding box
    ///
    /// Produces a new band whose grid definition is shifted so pixel (0, 0)
    /// of the slice keeps its original scan angle.
    pub fn trim_band(&self, band: &ImageBand, bbox: &GeoBoundingBox) -> FuseResult<ImageBand> {
        let window = self.window_for(band, bbox)?;
        log::debug!(
            "Trimming band {} to rows {}..{}, cols {}..{}",
            band.id,
            window.row0,
            window.row1,
            window.col0,
            window.col1
        );

        let data = band
            .data
            .slice(ndarray::s![window.row0..window.row1, window.col0..window.col1])
            .to_owned();

        let mut grid = band.grid;
        grid.x_offset += window.col0 as f64 * grid.pixel_scale;
        grid.y_offset -= window.row0 as f64 * grid.pixel_scale;

        Ok(ImageBand::new(band.id, data, grid, band.pixel_size_m))
    }

    /// Trim every band of a grid to a bounding box on a common resolution
    ///
    /// Bands whose native pixel size differs from the reference band are
    /// first resampled onto the reference resolution by 2-D cubic
    /// interpolation (resampling factor = reference grid size / source
    /// grid size), then sliced with the reference window.
    pub fn trim_grid(
        &self,
        grid: &ImageGrid,
        bbox: &GeoBoundingBox,
        reference: crate::types::BandId,
    ) -> FuseResult<ImageGrid> {
        let reference_band = grid.band(reference)?;
        let (ref_rows, ref_cols) = reference_band.data.dim();

        let mut trimmed = ImageGrid::new(grid.geometry, grid.acquired_at);
        for band in grid.bands.values() {
            let band = if band.data.dim() == (ref_rows, ref_cols) {
                band.clone()
            } else {
                log::info!(
                    "Resampling band {} from {:?} to {}x{}",
                    band.id,
                    band.data.dim(),
                    ref_rows,
                    ref_cols
                );
                let resampled = resample_bicubic(&band.data, ref_rows, ref_cols);
                ImageBand::new(
                    band.id,
                    resampled,
                    reference_band.grid,
                    reference_band.pixel_size_m,
                )
            };
            trimmed.insert_band(self.trim_band(&band, bbox)?);
        }

        Ok(trimmed)
    }
}

/// Catmull-Rom cubic kernel
fn cubic_weight(t: f64) -> f64 {
    const A: f64 = -0.5;
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t < 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

/// Resample a 2-D array to new dimensions by bicubic interpolation
///
/// Sample positions are pixel-center aligned; source indices are clamped
/// at the edges.
pub fn resample_bicubic<A>(data: &Array2<A>, new_rows: usize, new_cols: usize) -> Array2<A>
where
    A: Float + FromPrimitive,
{
    let (rows, cols) = data.dim();
    let row_scale = rows as f64 / new_rows as f64;
    let col_scale = cols as f64 / new_cols as f64;

    Array2::from_shape_fn((new_rows, new_cols), |(i, j)| {
        let src_y = (i as f64 + 0.5) * row_scale - 0.5;
        let src_x = (j as f64 + 0.5) * col_scale - 0.5;
        bicubic_sample(data, src_y, src_x)
    })
}

fn bicubic_sample<A>(data: &Array2<A>, y: f64, x: f64) -> A
where
    A: Float + FromPrimitive,
{
    let (rows, cols) = data.dim();
    let y0 = y.floor();
    let x0 = x.floor();

    let mut accum = A::zero();
    let mut weight_sum = A::zero();

    for dy in -1..=2 {
        let sy = y0 + dy as f64;
        let wy = cubic_weight(y - sy);
        let row = (sy.max(0.0) as usize).min(rows - 1);

        for dx in -1..=2 {
            let sx = x0 + dx as f64;
            let wx = cubic_weight(x - sx);
            let col = (sx.max(0.0) as usize).min(cols - 1);

            let w = A::from_f64(wy * wx).unwrap_or_else(A::zero);
            accum = accum + data[[row, col]] * w;
            weight_sum = weight_sum + w;
        }
    }

    if weight_sum == A::zero() {
        A::zero()
    } else {
        accum / weight_sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BandId, PixelGridDef, SatelliteGeometry};
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};
    use ndarray::Array2;

    // Full-disk geometry on a coarse test grid: same angular extent as the
    // 5424 grid, 64 pixels across, disk center at (32, 32).
    fn coarse_grid_def(size: usize) -> PixelGridDef {
        let half_extent = 0.151_872;
        PixelGridDef::new(2.0 * half_extent / size as f64, -half_extent, half_extent)
    }

    fn coarse_band(id: BandId, size: usize, fill: f32) -> ImageBand {
        ImageBand::new(
            id,
            Array2::from_elem((size, size), fill),
            coarse_grid_def(size),
            2000.0 * 5424.0 / size as f64,
        )
    }

    #[test]
    fn test_window_contains_disk_center() {
        let geometry = SatelliteGeometry::goes_east();
        let trimmer = Trimmer::new(geometry);
        let band = coarse_band(BandId::IrWindow, 64, 0.0);

        let bbox = GeoBoundingBox {
            min_lon: geometry.sub_lon - 5.0,
            max_lon: geometry.sub_lon + 5.0,
            min_lat: -5.0,
            max_lat: 5.0,
        };

        let window = trimmer.window_for(&band, &bbox).unwrap();
        assert!(window.row0 < 32 && window.row1 > 32);
        assert!(window.col0 < 32 && window.col1 > 32);
    }

    #[test]
    fn test_inverted_bbox_is_rejected() {
        let geometry = SatelliteGeometry::goes_east();
        let trimmer = Trimmer::new(geometry);
        let band = coarse_band(BandId::IrWindow, 64, 0.0);

        // min/max latitudes swapped: the window inverts instead of clamping.
        let bbox = GeoBoundingBox {
            min_lon: geometry.sub_lon - 5.0,
            max_lon: geometry.sub_lon + 5.0,
            min_lat: 5.0,
            max_lat: -5.0,
        };

        let result = trimmer.window_for(&band, &bbox);
        assert!(matches!(result, Err(FuseError::TrimOutOfBounds { .. })));
    }

    #[test]
    fn test_trimmed_band_keeps_scan_alignment() {
        let geometry = SatelliteGeometry::goes_east();
        let trimmer = Trimmer::new(geometry);
        let band = coarse_band(BandId::VisRed, 64, 1.0);

        let bbox = GeoBoundingBox {
            min_lon: geometry.sub_lon - 10.0,
            max_lon: geometry.sub_lon + 10.0,
            min_lat: -10.0,
            max_lat: 10.0,
        };

        let window = trimmer.window_for(&band, &bbox).unwrap();
        let trimmed = trimmer.trim_band(&band, &bbox).unwrap();

        assert_eq!(trimmed.data.dim(), (window.nrows(), window.ncols()));
        // Pixel (0, 0) of the slice keeps the scan angle it had in the
        // full-disk grid.
        let expected_x = band.grid.x_offset + window.col0 as f64 * band.grid.pixel_scale;
        assert_relative_eq!(trimmed.grid.x_offset, expected_x, epsilon = 1e-12);
    }

    #[test]
    fn test_resample_preserves_constant_field() {
        let data: Array2<f32> = Array2::from_elem((8, 8), 3.5);
        let up = resample_bicubic(&data, 16, 16);
        assert_eq!(up.dim(), (16, 16));
        for &v in up.iter() {
            assert_relative_eq!(v, 3.5, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_resample_tracks_linear_ramp() {
        let data: Array2<f32> = Array2::from_shape_fn((16, 16), |(i, _)| i as f32);
        let down = resample_bicubic(&data, 8, 8);

        // Interior of a downsampled linear ramp stays linear.
        for i in 1..7 {
            let expected = (i as f32 + 0.5) * 2.0 - 0.5;
            assert_relative_eq!(down[[i, 4]], expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_trim_grid_resamples_finer_band() {
        let geometry = SatelliteGeometry::goes_east();
        let trimmer = Trimmer::new(geometry);

        // IR at the coarse reference resolution, red at double resolution.
        let mut grid = ImageGrid::new(geometry, Utc.with_ymd_and_hms(2020, 1, 1, 18, 0, 0).unwrap());
        grid.insert_band(coarse_band(BandId::IrWindow, 64, 10.0));
        grid.insert_band(coarse_band(BandId::VisRed, 128, 20.0));

        let bbox = GeoBoundingBox {
            min_lon: geometry.sub_lon - 5.0,
            max_lon: geometry.sub_lon + 5.0,
            min_lat: -5.0,
            max_lat: 5.0,
        };

        let trimmed = trimmer.trim_grid(&grid, &bbox, BandId::IrWindow).unwrap();
        let ir = trimmed.band(BandId::IrWindow).unwrap();
        let red = trimmed.band(BandId::VisRed).unwrap();

        // Both bands land on the reference window and resolution.
        assert_eq!(ir.data.dim(), red.data.dim());
        assert_relative_eq!(red.pixel_size_m, ir.pixel_size_m);
        assert_relative_eq!(red.data[[0, 0]], 20.0, epsilon = 1e-4);
    }
}
