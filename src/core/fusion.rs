use crate::core::projection::{latlon_to_scan, scan_to_pixel_address};
use crate::core::window::extract_window;
use crate::types::{
    BandId, BandImage, FuseError, FuseResult, FusedRecord, ImageGrid, PixelGridDef, Trace, Track,
};
use chrono::{DateTime, Utc};

/// Fusion parameters
#[derive(Debug, Clone)]
pub struct FusionParams {
    /// Imager bands to sample, in output channel order
    pub bands: Vec<BandId>,
    /// Pixel window shape (rows, columns) extracted around each trace
    pub window: (usize, usize),
    /// Drop traces whose primary layer equals this code
    pub no_cloud_sentinel: Option<f32>,
    /// Keep only the outermost vertical layer of each trace
    pub first_layer_only: bool,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            bands: vec![BandId::VisRed, BandId::NearIr, BandId::IrWindow],
            window: (3, 3),          // 3x3 neighborhood
            no_cloud_sentinel: Some(0.0),
            first_layer_only: false,
        }
    }
}

/// Trace fusion engine
///
/// Walks a track in along-orbit order and joins each trace with the
/// imager pixel window at its location. Each trace's output depends only
/// on that trace's inputs; there is no shared state between iterations.
pub struct FusionEngine {
    params: FusionParams,
}

impl FusionEngine {
    /// Create a fusion engine with default parameters
    pub fn new() -> Self {
        Self {
            params: FusionParams::default(),
        }
    }

    /// Create a fusion engine with custom parameters
    pub fn with_params(params: FusionParams) -> Self {
        Self { params }
    }

    /// Fuse a track against an image grid acquired at `obs_time`
    ///
    /// The observation time must fall inside the track's closed
    /// [first, last] timestamp interval; otherwise the whole run fails
    /// with [`FuseError::TimeOutOfRange`] before any per-trace work.
    /// Traces filtered by the sentinel, off the visible disk, or too
    /// close to the grid edge for the window are skipped; the output
    /// preserves the relative order of the surviving traces.
    pub fn fuse(
        &self,
        track: &Track,
        grid: &ImageGrid,
        obs_time: DateTime<Utc>,
    ) -> FuseResult<Vec<FusedRecord>> {
        let (bands, grid_def) = self.resolve_bands(track, grid, obs_time)?;

        log::info!(
            "Fusing {} traces against {} bands with {}x{} windows",
            track.len(),
            bands.len(),
            self.params.window.0,
            self.params.window.1
        );

        let mut records = Vec::with_capacity(track.len());
        for trace in &track.traces {
            if let Some(record) = self.fuse_trace(trace, &bands, &grid_def, grid)? {
                records.push(record);
            }
        }

        log::info!("Fused {} of {} traces", records.len(), track.len());
        Ok(records)
    }

    /// Parallel variant of [`fuse`](Self::fuse) using Rayon
    ///
    /// Identical per-trace semantics and output order; traces are
    /// independent, so partitioning the track is safe.
    #[cfg(feature = "parallel")]
    pub fn fuse_parallel(
        &self,
        track: &Track,
        grid: &ImageGrid,
        obs_time: DateTime<Utc>,
    ) -> FuseResult<Vec<FusedRecord>> {
        use rayon::prelude::*;

        let (bands, grid_def) = self.resolve_bands(track, grid, obs_time)?;

        let results: FuseResult<Vec<Option<FusedRecord>>> = track
            .traces
            .par_iter()
            .map(|trace| self.fuse_trace(trace, &bands, &grid_def, grid))
            .collect();

        Ok(results?.into_iter().flatten().collect())
    }

    /// Run-level validation: the time gate, then band resolution.
    ///
    /// The time check comes first and fails the entire run; no trace is
    /// processed when the requested time is outside the track span.
    fn resolve_bands<'a>(
        &self,
        track: &Track,
        grid: &'a ImageGrid,
        obs_time: DateTime<Utc>,
    ) -> FuseResult<(Vec<&'a BandImage>, PixelGridDef)> {
        let (start, end) = track.time_span().ok_or_else(|| {
            FuseError::Processing("Cannot fuse an empty track".to_string())
        })?;
        if obs_time < start || obs_time > end {
            return Err(FuseError::TimeOutOfRange {
                requested: obs_time,
                start,
                end,
            });
        }

        let first_id = *self.params.bands.first().ok_or_else(|| {
            FuseError::Processing("Fusion needs at least one band".to_string())
        })?;
        let grid_def = grid.band(first_id)?.grid;

        let mut bands = Vec::with_capacity(self.params.bands.len());
        for &id in &self.params.bands {
            let band = grid.band(id)?;
            if band.grid != grid_def {
                return Err(FuseError::Processing(format!(
                    "Band {} is not on the common pixel grid; trim bands onto one resolution before fusing",
                    id
                )));
            }
            bands.push(&band.data);
        }

        Ok((bands, grid_def))
    }

    /// Fuse one trace; `Ok(None)` means it was filtered or skipped.
    fn fuse_trace(
        &self,
        trace: &Trace,
        bands: &[&BandImage],
        grid_def: &PixelGridDef,
        grid: &ImageGrid,
    ) -> FuseResult<Option<FusedRecord>> {
        // Cheap filters come before any geometry work.
        if let Some(sentinel) = self.params.no_cloud_sentinel {
            if trace.layers.first() == Some(&sentinel) {
                return Ok(None);
            }
        }

        let scan = match latlon_to_scan(trace.location, &grid.geometry) {
            Ok(scan) => scan,
            Err(FuseError::OffDisk { .. }) => {
                log::debug!(
                    "Skipping trace at ({:.3}, {:.3}): off the visible disk",
                    trace.location.lat,
                    trace.location.lon
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let address = scan_to_pixel_address(scan, grid_def);
        let window = match extract_window(address, bands, self.params.window) {
            Ok(window) => window,
            Err(FuseError::WindowOutOfRange { .. }) => {
                log::debug!(
                    "Skipping trace at ({:.3}, {:.3}): window crosses the grid edge",
                    trace.location.lat,
                    trace.location.lon
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let layers = if self.params.first_layer_only {
            trace.layers.first().copied().into_iter().collect()
        } else {
            trace.layers.clone()
        };

        Ok(Some(FusedRecord {
            timestamp: trace.timestamp,
            location: trace.location,
            layers,
            window,
        }))
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}
