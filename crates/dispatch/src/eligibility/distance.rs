//! Great-circle distance.

use foodcart_core::{Coordinates, Distance};

/// Mean Earth radius (IUGG), kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Haversine distance between two points, in kilometers, at full precision.
#[must_use]
pub fn great_circle_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let dlat = (b.lat() - a.lat()).to_radians();
    let dlon = (b.lon() - a.lon()).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Distance between two possibly-unresolved points.
#[must_use]
pub fn distance(a: Option<Coordinates>, b: Option<Coordinates>) -> Distance {
    match (a, b) {
        (Some(a), Some(b)) => Distance::Known(great_circle_km(a, b)),
        _ => Distance::Unknown,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn test_known_moscow_distances() {
        let order = point(55.76, 37.60);
        let a = great_circle_km(order, point(55.75, 37.62));
        let b = great_circle_km(order, point(55.80, 37.50));
        assert!((a - 1.674).abs() < 0.01, "got {a}");
        assert!((b - 7.674).abs() < 0.01, "got {b}");
        assert!(a < b);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = great_circle_km(point(0.0, 0.0), point(0.0, 1.0));
        assert!((d - 111.195).abs() < 0.01);
    }

    #[test]
    fn test_antipodes_do_not_overflow() {
        let d = great_circle_km(point(0.0, 0.0), point(0.0, 180.0));
        assert!((d - 20_015.114).abs() < 0.01);
    }

    #[test]
    fn test_symmetric_and_deterministic() {
        let a = point(55.76, 37.60);
        let b = point(59.93, 30.31);
        assert_eq!(great_circle_km(a, b).to_bits(), great_circle_km(a, b).to_bits());
        assert!((great_circle_km(a, b) - great_circle_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn test_same_point_is_zero() {
        let a = point(55.76, 37.60);
        assert!(great_circle_km(a, a).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unresolved_side_gives_unknown() {
        let a = Some(point(55.76, 37.60));
        assert_eq!(distance(a, None), Distance::Unknown);
        assert_eq!(distance(None, a), Distance::Unknown);
        assert_eq!(distance(None, None), Distance::Unknown);
        assert!(distance(a, a).is_known());
    }
}
