//! GEOFUSE: A Fast, Modular Geostationary/Polar-Orbit Co-location Engine
//!
//! This library co-registers a polar-orbiting cloud profiler's along-track
//! profiles with a geostationary imager's full-disk pixel grid: coordinate
//! transforms between geodetic, satellite-centric, scan-angle, and pixel
//! coordinates; region-of-interest trimming; band composition; and the
//! per-trace pixel-window fusion that joins the two sensors into unified
//! records. File retrieval and format parsing are deliberately external:
//! the engine consumes in-memory arrays and scalar attributes.

pub mod core;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BandId, BandImage, Composite, FuseError, FuseResult, FusedRecord, GeoBoundingBox,
    GeodeticPoint, ImageBand, ImageGrid, PixelAddress, PixelGridDef, SatelliteGeometry, ScanAngle,
    Trace, Track, WindowStack,
};

pub use crate::core::{
    default_rules, extract_window, latlon_to_scan, pixel_to_scan, satellite_to_latlon,
    scan_to_latlon, scan_to_pixel, scan_to_pixel_address, scan_to_satellite, BandScale,
    BandScaleTable, ClassificationRule, Compositor, FusionEngine, FusionParams, PixelMode,
    RegionClass, SolarCorrectionParams, TrimWindow, Trimmer,
};
