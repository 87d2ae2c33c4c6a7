//! Great-circle distance on a spherical earth

use super::types::Coordinate;

/// Mean earth radius (IUGG), meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Haversine distance between two coordinates in meters
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let d_phi = (b.lat - a.lat).to_radians();
    let d_lambda = (b.lon - a.lon).to_radians();

    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Coordinate `meters` due north of `origin`
///
/// Along a meridian the haversine distance is exactly `R * dφ`, which makes
/// this handy for placing fixes at known distances from a zone center.
pub fn offset_north(origin: Coordinate, meters: f64) -> Coordinate {
    Coordinate::new(origin.lat + (meters / EARTH_RADIUS_M).to_degrees(), origin.lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn test_zero_distance() {
        let p = Coordinate::new(40.8927236, 31.1680019);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinate::new(40.8927236, 31.1680019);
        let b = Coordinate::new(40.8664894, 31.1672618);
        assert!(approx(haversine_m(a, b), haversine_m(b, a), 1e-9));
    }

    #[test]
    fn test_one_degree_latitude() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        // R * pi / 180
        assert!(approx(haversine_m(a, b), 111_195.08, 0.01));
    }

    #[test]
    fn test_known_pair() {
        // Two zone centers of the default deployment, ~2.9 km apart
        let a = Coordinate::new(40.8927236, 31.1680019);
        let b = Coordinate::new(40.8664894, 31.1672618);
        let d = haversine_m(a, b);
        assert!(d > 2_900.0 && d < 2_930.0, "distance was {}", d);
    }

    #[test]
    fn test_offset_north_round_trips_distance() {
        let origin = Coordinate::new(40.90, 31.17);
        for meters in [10.0, 100.0, 250.0, 400.0] {
            let p = offset_north(origin, meters);
            assert!(approx(haversine_m(origin, p), meters, 1e-6));
        }
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        assert!(approx(haversine_m(a, b), std::f64::consts::PI * EARTH_RADIUS_M, 1e-3));
    }
}
