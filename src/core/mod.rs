//! Core co-location processing modules

pub mod composite;
pub mod fusion;
pub mod projection;
pub mod solar;
pub mod trim;
pub mod window;

// Re-export main types
pub use composite::{
    default_rules, BandScale, BandScaleTable, ClassificationRule, Compositor, RegionClass,
    SolarCorrectionParams,
};
pub use fusion::{FusionEngine, FusionParams};
pub use projection::{
    latlon_to_scan, latlon_to_scan_grid, pixel_to_scan, satellite_to_latlon, scan_to_latlon,
    scan_to_latlon_grid, scan_to_pixel, scan_to_pixel_address, scan_to_satellite, PixelMode,
};
pub use solar::{solar_zenith_angle, solar_zenith_grid};
pub use trim::{resample_bicubic, TrimWindow, Trimmer};
pub use window::extract_window;
