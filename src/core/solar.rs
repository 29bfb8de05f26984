//! Solar geometry for reflectance correction, using the low-accuracy
//! NOAA series for declination and the equation of time.

use crate::types::GeodeticPoint;
use chrono::{DateTime, Datelike, Timelike, Utc};
use ndarray::{Array2, Zip};

/// Solar zenith angle in degrees at a geodetic point and UTC time
///
/// NaN coordinates propagate to a NaN zenith so masked pixels stay masked.
pub fn solar_zenith_angle(point: GeodeticPoint, time: DateTime<Utc>) -> f64 {
    let (declination, eq_time) = solar_position_terms(time);

    let fractional_hour =
        time.hour() as f64 + time.minute() as f64 / 60.0 + time.second() as f64 / 3600.0;

    // True solar time in minutes, then the hour angle in radians.
    let time_offset = eq_time + 4.0 * point.lon;
    let true_solar_minutes = fractional_hour * 60.0 + time_offset;
    let hour_angle = (true_solar_minutes / 4.0 - 180.0).to_radians();

    let lat_rad = point.lat.to_radians();
    let cos_zenith = lat_rad.sin() * declination.sin()
        + lat_rad.cos() * declination.cos() * hour_angle.cos();

    cos_zenith.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Solar zenith angles for elementwise latitude/longitude grids (degrees)
pub fn solar_zenith_grid(
    lat_grid: &Array2<f64>,
    lon_grid: &Array2<f64>,
    time: DateTime<Utc>,
) -> Array2<f64> {
    Zip::from(lat_grid)
        .and(lon_grid)
        .map_collect(|&lat, &lon| solar_zenith_angle(GeodeticPoint::new(lat, lon), time))
}

/// Parallel variant of [`solar_zenith_grid`] using Rayon
#[cfg(feature = "parallel")]
pub fn solar_zenith_grid_parallel(
    lat_grid: &Array2<f64>,
    lon_grid: &Array2<f64>,
    time: DateTime<Utc>,
) -> Array2<f64> {
    Zip::from(lat_grid)
        .and(lon_grid)
        .par_map_collect(|&lat, &lon| solar_zenith_angle(GeodeticPoint::new(lat, lon), time))
}

/// Solar declination (radians) and equation of time (minutes) for a UTC instant
fn solar_position_terms(time: DateTime<Utc>) -> (f64, f64) {
    let fractional_hour =
        time.hour() as f64 + time.minute() as f64 / 60.0 + time.second() as f64 / 3600.0;

    // Fractional year in radians.
    let gamma = 2.0 * std::f64::consts::PI / 365.0
        * (time.ordinal() as f64 - 1.0 + (fractional_hour - 12.0) / 24.0);

    let declination = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
        - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin();

    let eq_time = 229.18
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin());

    (declination, eq_time)
}
