use crate::core::projection::{pixel_to_scan, scan_to_latlon_grid};
use crate::core::solar::solar_zenith_grid;
use crate::types::{
    BandId, BandImage, Composite, FuseError, FuseResult, ImageBand, SatelliteGeometry,
};
use chrono::{DateTime, TimeZone, Utc};
use ndarray::{Array2, Array3, Zip};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-band normalization constants for composite assembly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandScale {
    pub min: f32,
    pub max: f32,
    pub gamma: f32,
}

/// Table of per-band normalization constants (band id -> min/max/gamma)
///
/// Numeric tuning lives here, not in the transform code; callers pass the
/// table into [`Compositor::compose`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandScaleTable {
    pub scales: HashMap<BandId, BandScale>,
}

impl BandScaleTable {
    pub fn get(&self, id: BandId) -> FuseResult<BandScale> {
        self.scales.get(&id).copied().ok_or(FuseError::MissingBand(id))
    }
}

impl Default for BandScaleTable {
    /// Production tuning: reflective bands on [0, 1] with 2.2 gamma, the
    /// IR window on a 193-313 K brightness-temperature ramp.
    fn default() -> Self {
        let mut scales = HashMap::new();
        scales.insert(
            BandId::VisRed,
            BandScale {
                min: 0.0,
                max: 1.0,
                gamma: 2.2,
            },
        );
        scales.insert(
            BandId::NearIr,
            BandScale {
                min: 0.0,
                max: 1.0,
                gamma: 2.2,
            },
        );
        scales.insert(
            BandId::IrWindow,
            BandScale {
                min: 193.0,
                max: 313.0,
                gamma: 1.0,
            },
        );
        Self { scales }
    }
}

/// Parameters for the solar-zenith reflectance correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarCorrectionParams {
    /// UTC instant the zenith angle is evaluated at
    pub zenith_reference_time: DateTime<Utc>,
    /// Pixels with cos(zenith) below this are masked instead of amplified
    pub min_cos_zenith: f64,
}

impl Default for SolarCorrectionParams {
    fn default() -> Self {
        Self {
            // Legacy behavior: the zenith is evaluated at this fixed
            // instant for every image.
            // TODO: confirm with product owners whether this should track
            // ImageGrid::acquired_at instead of the fixed constant.
            zenith_reference_time: Utc.with_ymd_and_hms(2019, 2, 18, 18, 0, 0).unwrap(),
            min_cos_zenith: (85.0_f64).to_radians().cos(),
        }
    }
}

/// Physical regimes assigned by the region classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RegionClass {
    Clear = 0,
    LowThickCloud = 1,
    ThinHighCloud = 2,
    Supercooled = 3,
}

/// One classification rule: inclusive per-channel bounds and the regime
/// assigned where every channel falls inside them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub label: RegionClass,
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl ClassificationRule {
    fn matches(&self, channels: [f32; 3]) -> bool {
        channels
            .iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }
}

/// The production rule set, in evaluation order.
///
/// Order is a contract: rules are applied first to last and later rules
/// overwrite earlier ones where both match.
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            label: RegionClass::LowThickCloud,
            min: [0.6, 0.6, 0.6],
            max: [1.0, 1.0, 1.0],
        },
        ClassificationRule {
            label: RegionClass::ThinHighCloud,
            min: [0.0, 0.0, 0.6],
            max: [0.35, 0.5, 1.0],
        },
        ClassificationRule {
            label: RegionClass::Supercooled,
            min: [0.55, 0.55, 0.0],
            max: [1.0, 1.0, 0.4],
        },
    ]
}

/// Band compositor for a geostationary imager
pub struct Compositor {
    geometry: SatelliteGeometry,
}

impl Compositor {
    pub fn new(geometry: SatelliteGeometry) -> Self {
        Self { geometry }
    }

    /// Remove the solar-angle dependency from a reflective band
    ///
    /// Every pixel's geodetic coordinate is recovered from its pixel
    /// address through the band's grid definition, the solar zenith is
    /// evaluated there at the configured reference time, and the band is
    /// expressed as an illumination-normalized ratio against the
    /// reference band: `(band / reference) / cos(zenith)`. Night and
    /// terminator pixels (cos(zenith) < `min_cos_zenith`) come back NaN,
    /// as do pixels off the visible disk.
    pub fn correct_band(
        &self,
        band: &ImageBand,
        reference: &ImageBand,
        params: &SolarCorrectionParams,
    ) -> FuseResult<BandImage> {
        let dims = band.data.dim();
        if reference.data.dim() != dims {
            return Err(FuseError::Processing(format!(
                "Reference band {}x{} does not match band {}x{}",
                reference.data.nrows(),
                reference.data.ncols(),
                dims.0,
                dims.1
            )));
        }

        log::info!(
            "Solar-correcting band {} ({}x{} px) against {}",
            band.id,
            dims.0,
            dims.1,
            reference.id
        );

        // Scan angles for every pixel center, then geodetic coordinates.
        let mut x_grid = Array2::zeros(dims);
        let mut y_grid = Array2::zeros(dims);
        for ((row, col), x) in x_grid.indexed_iter_mut() {
            let scan = pixel_to_scan(col as f64, row as f64, &band.grid);
            *x = scan.x;
            y_grid[[row, col]] = scan.y;
        }

        let (lat, lon) = scan_to_latlon_grid(&x_grid, &y_grid, &self.geometry);
        let zenith = solar_zenith_grid(&lat, &lon, params.zenith_reference_time);

        let min_cos = params.min_cos_zenith;
        let corrected = Zip::from(&band.data)
            .and(&reference.data)
            .and(&zenith)
            .map_collect(|&value, &reference_value, &zenith_deg| {
                let cos_zenith = zenith_deg.to_radians().cos();
                if !cos_zenith.is_finite() || cos_zenith < min_cos || reference_value == 0.0 {
                    f32::NAN
                } else {
                    (value / reference_value) / cos_zenith as f32
                }
            });

        Ok(corrected)
    }

    /// Stack normalized bands into a multi-channel composite
    ///
    /// For each band, in the order given: normalize with the table's
    /// min/max, apply the gamma exponent `v^(1/gamma)`, clip to [0, 1],
    /// and stack along a new trailing channel axis. Finite inputs always
    /// produce values in [0, 1]; NaN inputs stay NaN.
    pub fn compose(&self, bands: &[&ImageBand], table: &BandScaleTable) -> FuseResult<Composite> {
        let first = bands
            .first()
            .ok_or_else(|| FuseError::Processing("Compose needs at least one band".to_string()))?;
        let dims = first.data.dim();

        let mut composite = Array3::zeros((dims.0, dims.1, bands.len()));
        for (channel, band) in bands.iter().enumerate() {
            if band.data.dim() != dims {
                return Err(FuseError::Processing(format!(
                    "Band {} is {}x{}, expected {}x{}",
                    band.id,
                    band.data.nrows(),
                    band.data.ncols(),
                    dims.0,
                    dims.1
                )));
            }

            let scale = table.get(band.id)?;
            let span = scale.max - scale.min;
            if span <= 0.0 {
                return Err(FuseError::Processing(format!(
                    "Band {} scale has non-positive span: min {} max {}",
                    band.id, scale.min, scale.max
                )));
            }

            let inv_gamma = 1.0 / scale.gamma;
            let normalized = band.data.mapv(|v| {
                if v.is_nan() {
                    f32::NAN
                } else {
                    let norm = ((v - scale.min) / span).max(0.0);
                    norm.powf(inv_gamma).min(1.0)
                }
            });
            composite
                .slice_mut(ndarray::s![.., .., channel])
                .assign(&normalized);
        }

        Ok(composite)
    }

    /// Label every pixel of a 3-channel composite with a physical regime
    ///
    /// Rules are evaluated in slice order and later rules overwrite
    /// earlier ones where both match (last wins). The rule order is part
    /// of the contract: reordering rules changes the output and is a
    /// breaking behavioral change. Unmatched pixels stay
    /// [`RegionClass::Clear`].
    pub fn classify_regions(
        &self,
        composite: &Composite,
        rules: &[ClassificationRule],
    ) -> FuseResult<Array2<u8>> {
        let (rows, cols, channels) = composite.dim();
        if channels != 3 {
            return Err(FuseError::Processing(format!(
                "Region classification needs a 3-channel composite, got {}",
                channels
            )));
        }

        let mut mask = Array2::from_elem((rows, cols), RegionClass::Clear as u8);
        for rule in rules {
            for row in 0..rows {
                for col in 0..cols {
                    let pixel = [
                        composite[[row, col, 0]],
                        composite[[row, col, 1]],
                        composite[[row, col, 2]],
                    ];
                    if rule.matches(pixel) {
                        mask[[row, col]] = rule.label as u8;
                    }
                }
            }
        }

        Ok(mask)
    }
}
