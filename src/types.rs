use chrono::{DateTime, Utc};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Real-valued imager band raster (rows x columns)
pub type BandImage = Array2<f32>;

/// Multi-channel composite image (rows x columns x channels)
pub type Composite = Array3<f32>;

/// Extracted pixel neighborhood (window rows x window columns x bands)
pub type WindowStack = Array3<f32>;

/// Geodetic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPoint {
    /// Latitude in degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, [-180, 180]
    pub lon: f64,
}

impl GeodeticPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Geostationary scan angle pair in radians
///
/// `x` is the east-west scan angle, `y` the north-south scan angle,
/// both measured from the sub-satellite point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanAngle {
    pub x: f64,
    pub y: f64,
}

impl ScanAngle {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Discrete pixel address into an imager grid
///
/// Signed so that addresses computed for points outside the grid
/// survive until an explicit bounds check instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelAddress {
    pub col: i64,
    pub row: i64,
}

impl PixelAddress {
    pub fn new(col: i64, row: i64) -> Self {
        Self { col, row }
    }
}

/// Orbital geometry of a geostationary imager
///
/// Immutable per imager; supplied once and reused for every transform
/// call. Distances in meters, longitudes in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteGeometry {
    /// Sub-satellite longitude in degrees
    pub sub_lon: f64,
    /// Equatorial radius of the Earth ellipsoid in meters
    pub semi_major_axis: f64,
    /// Polar radius of the Earth ellipsoid in meters
    pub semi_minor_axis: f64,
    /// Satellite height above the sub-satellite point in meters
    pub orbital_height: f64,
}

impl SatelliteGeometry {
    /// GOES-16 / GOES-East ABI fixed-grid geometry
    pub fn goes_east() -> Self {
        Self {
            sub_lon: -75.0,
            semi_major_axis: 6_378_137.0,
            semi_minor_axis: 6_356_752.314_14,
            orbital_height: 35_786_023.0,
        }
    }

    /// GOES-17 / GOES-West ABI fixed-grid geometry
    pub fn goes_west() -> Self {
        Self {
            sub_lon: -137.0,
            ..Self::goes_east()
        }
    }

    /// Himawari-8 AHI geometry
    pub fn himawari8() -> Self {
        Self {
            sub_lon: 140.7,
            semi_major_axis: 6_378_137.0,
            semi_minor_axis: 6_356_752.3,
            orbital_height: 35_785_863.0,
        }
    }

    /// Distance from the Earth's center to the satellite in meters
    pub fn orbital_radius(&self) -> f64 {
        self.semi_major_axis + self.orbital_height
    }

    /// (Re/Rp)^2, the ellipsoid flattening ratio used by the transforms
    pub fn radius_ratio_sq(&self) -> f64 {
        let ratio = self.semi_major_axis / self.semi_minor_axis;
        ratio * ratio
    }
}

/// Affine map between scan angles and pixel addresses for one band
///
/// `col = (x - x_offset) / pixel_scale`, `row = -(y - y_offset) / pixel_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelGridDef {
    /// Angular size of one pixel in radians
    pub pixel_scale: f64,
    /// Scan angle of pixel column 0 in radians
    pub x_offset: f64,
    /// Scan angle of pixel row 0 in radians
    pub y_offset: f64,
}

impl PixelGridDef {
    pub fn new(pixel_scale: f64, x_offset: f64, y_offset: f64) -> Self {
        Self {
            pixel_scale,
            x_offset,
            y_offset,
        }
    }

    /// 2-km full-disk grid (5424 x 5424, disk center at pixel (2712, 2712))
    pub fn full_disk_2km() -> Self {
        Self {
            pixel_scale: 56.0e-6,
            x_offset: -0.151_872,
            y_offset: 0.151_872,
        }
    }

    /// 1-km full-disk grid (10848 x 10848)
    pub fn full_disk_1km() -> Self {
        Self {
            pixel_scale: 28.0e-6,
            x_offset: -0.151_872,
            y_offset: 0.151_872,
        }
    }
}

/// Spectral band identifiers for the imager channels this engine composes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandId {
    /// Blue visible channel (~0.47 um)
    VisBlue,
    /// Red visible channel (~0.64 um)
    VisRed,
    /// Near-infrared channel (~0.86 um)
    NearIr,
    /// Clean infrared window channel (~10.4 um)
    IrWindow,
    /// Any other channel, by native band number
    Channel(u8),
}

impl std::fmt::Display for BandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BandId::VisBlue => write!(f, "B01"),
            BandId::VisRed => write!(f, "B03"),
            BandId::NearIr => write!(f, "B04"),
            BandId::IrWindow => write!(f, "B13"),
            BandId::Channel(n) => write!(f, "B{:02}", n),
        }
    }
}

/// One spectral band raster with its pixel-grid parameters
#[derive(Debug, Clone)]
pub struct ImageBand {
    pub id: BandId,
    pub data: BandImage,
    pub grid: PixelGridDef,
    /// Native ground pixel size in meters
    pub pixel_size_m: f64,
}

impl ImageBand {
    pub fn new(id: BandId, data: BandImage, grid: PixelGridDef, pixel_size_m: f64) -> Self {
        Self {
            id,
            data,
            grid,
            pixel_size_m,
        }
    }
}

/// A named collection of band rasters from one imager acquisition
///
/// Never mutated in place after trimming; trim operations produce a
/// new grid.
#[derive(Debug, Clone)]
pub struct ImageGrid {
    pub bands: HashMap<BandId, ImageBand>,
    pub geometry: SatelliteGeometry,
    pub acquired_at: DateTime<Utc>,
}

impl ImageGrid {
    pub fn new(geometry: SatelliteGeometry, acquired_at: DateTime<Utc>) -> Self {
        Self {
            bands: HashMap::new(),
            geometry,
            acquired_at,
        }
    }

    /// Add a band raster to the grid
    pub fn insert_band(&mut self, band: ImageBand) {
        self.bands.insert(band.id, band);
    }

    /// Look up a band, failing loudly if it was never loaded
    pub fn band(&self, id: BandId) -> FuseResult<&ImageBand> {
        self.bands.get(&id).ok_or(FuseError::MissingBand(id))
    }
}

/// Geographic bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

/// One profile point from the polar-orbiting sensor
#[derive(Debug, Clone)]
pub struct Trace {
    pub timestamp: DateTime<Utc>,
    pub location: GeodeticPoint,
    /// Per-vertical-layer cloud codes, outermost layer first
    pub layers: Vec<f32>,
}

/// Ordered sequence of traces along one orbital pass
///
/// Insertion order is along-orbit order and is physically meaningful;
/// every operation over a track preserves it.
#[derive(Debug, Clone, Default)]
pub struct Track {
    pub traces: Vec<Trace>,
}

impl Track {
    pub fn new(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    /// Assemble a track from the parallel arrays an external parser produces
    ///
    /// `layers` is shaped [num_traces, num_layers].
    pub fn from_arrays(
        timestamps: &[DateTime<Utc>],
        lats: &[f64],
        lons: &[f64],
        layers: &Array2<f32>,
    ) -> FuseResult<Self> {
        let n = timestamps.len();
        if lats.len() != n || lons.len() != n || layers.nrows() != n {
            return Err(FuseError::Processing(format!(
                "Track array length mismatch: {} timestamps, {} lats, {} lons, {} layer rows",
                n,
                lats.len(),
                lons.len(),
                layers.nrows()
            )));
        }

        let traces = (0..n)
            .map(|i| Trace {
                timestamp: timestamps[i],
                location: GeodeticPoint::new(lats[i], lons[i]),
                layers: layers.row(i).to_vec(),
            })
            .collect();

        Ok(Self { traces })
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// First and last timestamps of the track (closed interval)
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.traces.first(), self.traces.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}

/// One trace joined with its co-located imager pixel windows
///
/// Immutable once created by the fusion engine.
#[derive(Debug, Clone)]
pub struct FusedRecord {
    pub timestamp: DateTime<Utc>,
    pub location: GeodeticPoint,
    pub layers: Vec<f32>,
    /// Band order matches the `bands` list of the fusion parameters
    pub window: WindowStack,
}

/// Error types for co-location processing
#[derive(Debug, thiserror::Error)]
pub enum FuseError {
    #[error("Scan angle ({x}, {y}) points off the visible Earth disk")]
    OffDisk { x: f64, y: f64 },

    #[error("Trim window has non-positive extent: {rows} rows x {cols} cols")]
    TrimOutOfBounds { rows: i64, cols: i64 },

    #[error(
        "Window of {height}x{width} at pixel ({col}, {row}) extends outside the {grid_rows}x{grid_cols} grid"
    )]
    WindowOutOfRange {
        col: i64,
        row: i64,
        height: usize,
        width: usize,
        grid_rows: usize,
        grid_cols: usize,
    },

    #[error("Requested time {requested} outside track span [{start}, {end}]")]
    TimeOutOfRange {
        requested: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Unsupported output mode: {0}")]
    InvalidMode(String),

    #[error("Band {0} is not present in the image grid")]
    MissingBand(BandId),

    #[error("Processing error: {0}")]
    Processing(String),
}

/// Result type for co-location operations
pub type FuseResult<T> = Result<T, FuseError>;
