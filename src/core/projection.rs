//! Coordinate transforms between geodetic, satellite-centric Cartesian,
//! scan-angle, and pixel-grid coordinates. Angles are radians internally;
//! latitude/longitude cross the public boundary in degrees.

use crate::types::{
    FuseError, FuseResult, GeodeticPoint, PixelAddress, PixelGridDef, SatelliteGeometry, ScanAngle,
};
use ndarray::Array2;
use std::str::FromStr;

/// Output selector for [`scan_to_pixel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelMode {
    /// Fractional pixel coordinates
    Exact,
    /// Coordinates rounded to the nearest pixel center
    Nearest,
}

impl FromStr for PixelMode {
    type Err = FuseError;

    fn from_str(s: &str) -> FuseResult<Self> {
        match s {
            "exact" => Ok(PixelMode::Exact),
            "nearest" => Ok(PixelMode::Nearest),
            other => Err(FuseError::InvalidMode(other.to_string())),
        }
    }
}

/// Intersect the line of sight for one scan angle with the Earth ellipsoid.
///
/// Returns the satellite-centric Cartesian components `(sx, sy, sz)` in
/// meters: `sx` along the nadir axis toward the Earth's center, `sy`
/// horizontal (east negative), `sz` vertical. `None` when the ray misses
/// the visible disk.
fn intersect_ellipsoid(x: f64, y: f64, geometry: &SatelliteGeometry) -> Option<(f64, f64, f64)> {
    let h = geometry.orbital_radius();
    let re = geometry.semi_major_axis;
    let ratio_sq = geometry.radius_ratio_sq();

    let (sin_x, cos_x) = x.sin_cos();
    let (sin_y, cos_y) = y.sin_cos();

    // Quadratic coefficients of the ellipsoid-intercept condition
    // a*r^2 + b*r + c = 0, r = slant distance from the satellite.
    let a = sin_x * sin_x + cos_x * cos_x * (cos_y * cos_y + ratio_sq * sin_y * sin_y);
    let b = -2.0 * h * cos_x * cos_y;
    let c = h * h - re * re;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let r = (-b - discriminant.sqrt()) / (2.0 * a);
    let sx = r * cos_x * cos_y;
    let sy = -r * sin_x;
    let sz = r * cos_x * sin_y;

    Some((sx, sy, sz))
}

/// Scan angle to satellite-centric Cartesian coordinates
///
/// Solves the line-of-sight/ellipsoid quadratic; a negative discriminant
/// means the scan angle points off the visible Earth disk.
pub fn scan_to_satellite(
    scan: ScanAngle,
    geometry: &SatelliteGeometry,
) -> FuseResult<(f64, f64, f64)> {
    intersect_ellipsoid(scan.x, scan.y, geometry).ok_or(FuseError::OffDisk {
        x: scan.x,
        y: scan.y,
    })
}

/// Satellite-centric Cartesian coordinates to geodetic latitude/longitude
pub fn satellite_to_latlon(
    sx: f64,
    sy: f64,
    sz: f64,
    geometry: &SatelliteGeometry,
) -> GeodeticPoint {
    let h = geometry.orbital_radius();
    let ratio_sq = geometry.radius_ratio_sq();

    // Geodetic latitude needs the ellipsoid correction on the vertical
    // component before the arctangent.
    let lat = (ratio_sq * sz / ((h - sx).hypot(sy))).atan();
    let lon = geometry.sub_lon.to_radians() - (sy / (h - sx)).atan();

    GeodeticPoint::new(lat.to_degrees(), lon.to_degrees())
}

/// Scan angle directly to geodetic coordinates
pub fn scan_to_latlon(scan: ScanAngle, geometry: &SatelliteGeometry) -> FuseResult<GeodeticPoint> {
    let (sx, sy, sz) = scan_to_satellite(scan, geometry)?;
    Ok(satellite_to_latlon(sx, sy, sz, geometry))
}

/// Geodetic coordinates to scan angle
///
/// Points on the far side of the Earth (not visible from the satellite)
/// are rejected as [`FuseError::OffDisk`].
pub fn latlon_to_scan(point: GeodeticPoint, geometry: &SatelliteGeometry) -> FuseResult<ScanAngle> {
    let (scan, visible) = latlon_to_scan_parts(point.lat, point.lon, geometry);
    if visible {
        Ok(scan)
    } else {
        Err(FuseError::OffDisk {
            x: scan.x,
            y: scan.y,
        })
    }
}

/// Forward transform plus the visibility verdict for the point
fn latlon_to_scan_parts(lat: f64, lon: f64, geometry: &SatelliteGeometry) -> (ScanAngle, bool) {
    let h = geometry.orbital_radius();
    let re = geometry.semi_major_axis;
    let rp = geometry.semi_minor_axis;
    let ratio_sq = geometry.radius_ratio_sq();

    let lat_rad = lat.to_radians();
    let dlon = lon.to_radians() - geometry.sub_lon.to_radians();

    // Geocentric latitude, then the ellipsoid radius at that latitude.
    let lat_c = ((rp * rp) / (re * re) * lat_rad.tan()).atan();
    let e_sq = (re * re - rp * rp) / (re * re);
    let rc = rp / (1.0 - e_sq * lat_c.cos() * lat_c.cos()).sqrt();

    let sx = h - rc * lat_c.cos() * dlon.cos();
    let sy = -rc * lat_c.cos() * dlon.sin();
    let sz = rc * lat_c.sin();

    let norm = (sx * sx + sy * sy + sz * sz).sqrt();
    let scan = ScanAngle::new((-sy / norm).asin(), (sz / sx).atan());

    // Visibility condition: the line of sight must not pass through the
    // ellipsoid before reaching the point.
    let visible = h * (h - sx) >= sy * sy + ratio_sq * sz * sz;
    (scan, visible)
}

/// Scan angle to (column, row) pixel coordinates on a band's grid
///
/// `PixelMode::Exact` returns fractional coordinates, `PixelMode::Nearest`
/// rounds to the nearest pixel center.
pub fn scan_to_pixel(scan: ScanAngle, grid: &PixelGridDef, mode: PixelMode) -> (f64, f64) {
    let col = (scan.x - grid.x_offset) / grid.pixel_scale;
    let row = -(scan.y - grid.y_offset) / grid.pixel_scale;

    match mode {
        PixelMode::Exact => (col, row),
        PixelMode::Nearest => (col.round(), row.round()),
    }
}

/// Scan angle to a discrete pixel address (nearest pixel center)
pub fn scan_to_pixel_address(scan: ScanAngle, grid: &PixelGridDef) -> PixelAddress {
    let (col, row) = scan_to_pixel(scan, grid, PixelMode::Nearest);
    PixelAddress::new(col as i64, row as i64)
}

/// (Column, row) pixel coordinates back to a scan angle (exact inverse affine)
pub fn pixel_to_scan(col: f64, row: f64, grid: &PixelGridDef) -> ScanAngle {
    ScanAngle::new(
        col * grid.pixel_scale + grid.x_offset,
        -(row * grid.pixel_scale) + grid.y_offset,
    )
}

/// Elementwise scan-angle grids to latitude/longitude grids
///
/// Off-disk elements come back as NaN in both outputs so callers can mask
/// them; nothing is raised per element.
pub fn scan_to_latlon_grid(
    x_grid: &Array2<f64>,
    y_grid: &Array2<f64>,
    geometry: &SatelliteGeometry,
) -> (Array2<f64>, Array2<f64>) {
    let mut lat = Array2::from_elem(x_grid.dim(), f64::NAN);
    let mut lon = Array2::from_elem(x_grid.dim(), f64::NAN);

    for ((idx, &x), &y) in x_grid.indexed_iter().zip(y_grid.iter()) {
        if let Some((sx, sy, sz)) = intersect_ellipsoid(x, y, geometry) {
            let point = satellite_to_latlon(sx, sy, sz, geometry);
            lat[idx] = point.lat;
            lon[idx] = point.lon;
        }
    }

    (lat, lon)
}

/// Elementwise latitude/longitude grids to scan-angle grids
///
/// Not-visible elements come back as NaN in both outputs.
pub fn latlon_to_scan_grid(
    lat_grid: &Array2<f64>,
    lon_grid: &Array2<f64>,
    geometry: &SatelliteGeometry,
) -> (Array2<f64>, Array2<f64>) {
    let mut x = Array2::from_elem(lat_grid.dim(), f64::NAN);
    let mut y = Array2::from_elem(lat_grid.dim(), f64::NAN);

    for ((idx, &lat), &lon) in lat_grid.indexed_iter().zip(lon_grid.iter()) {
        let (scan, visible) = latlon_to_scan_parts(lat, lon, geometry);
        if visible {
            x[idx] = scan.x;
            y[idx] = scan.y;
        }
    }

    (x, y)
}
