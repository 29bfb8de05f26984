use approx::assert_relative_eq;
use geofuse::{
    latlon_to_scan, pixel_to_scan, scan_to_latlon, scan_to_pixel, scan_to_pixel_address,
    GeodeticPoint, PixelAddress, PixelGridDef, PixelMode, SatelliteGeometry, ScanAngle,
};

#[test]
fn test_latlon_round_trip_across_the_visible_disk() {
    let geometry = SatelliteGeometry::goes_east();

    // Sweep the disk out to 60 degrees great-circle distance from the
    // sub-point; everything in that range is comfortably visible.
    let mut checked = 0;
    for lat_step in -6..=6 {
        for lon_step in -6..=6 {
            let lat = lat_step as f64 * 10.0;
            let lon = geometry.sub_lon + lon_step as f64 * 10.0;

            let scan = match latlon_to_scan(GeodeticPoint::new(lat, lon), &geometry) {
                Ok(scan) => scan,
                // Corner combinations near the limb may be invisible.
                Err(_) => continue,
            };
            let back = scan_to_latlon(scan, &geometry).unwrap();

            assert_relative_eq!(back.lat, lat, epsilon = 1e-6);
            assert_relative_eq!(back.lon, lon, epsilon = 1e-6);
            checked += 1;
        }
    }
    assert!(checked > 100, "only {} points were visible", checked);
}

#[test]
fn test_sub_satellite_point_is_scan_origin() {
    for geometry in [
        SatelliteGeometry::goes_east(),
        SatelliteGeometry::goes_west(),
        SatelliteGeometry::himawari8(),
    ] {
        let scan = latlon_to_scan(GeodeticPoint::new(0.0, geometry.sub_lon), &geometry).unwrap();
        assert_eq!(scan.x, 0.0);
        assert_eq!(scan.y, 0.0);
    }
}

#[test]
fn test_scan_origin_is_disk_center_pixel() {
    let grid = PixelGridDef::full_disk_2km();
    let address = scan_to_pixel_address(ScanAngle::new(0.0, 0.0), &grid);
    assert_eq!(address, PixelAddress::new(2712, 2712));

    let grid_1km = PixelGridDef::full_disk_1km();
    let address = scan_to_pixel_address(ScanAngle::new(0.0, 0.0), &grid_1km);
    assert_eq!(address, PixelAddress::new(5424, 5424));
}

#[test]
fn test_pixel_scan_affine_round_trip() {
    let grid = PixelGridDef::full_disk_2km();

    for &(col, row) in &[(0.0, 0.0), (2712.0, 2712.0), (5423.0, 5423.0), (100.5, 4000.25)] {
        let scan = pixel_to_scan(col, row, &grid);
        let (col_back, row_back) = scan_to_pixel(scan, &grid, PixelMode::Exact);
        assert_relative_eq!(col_back, col, epsilon = 1e-9);
        assert_relative_eq!(row_back, row, epsilon = 1e-9);
    }
}

#[test]
fn test_scan_round_trip_through_geodetic() {
    let geometry = SatelliteGeometry::himawari8();

    for &(x, y) in &[(0.01, 0.02), (-0.05, -0.03), (0.1, 0.08)] {
        let point = scan_to_latlon(ScanAngle::new(x, y), &geometry).unwrap();
        let scan = latlon_to_scan(point, &geometry).unwrap();
        assert_relative_eq!(scan.x, x, epsilon = 1e-9);
        assert_relative_eq!(scan.y, y, epsilon = 1e-9);
    }
}
