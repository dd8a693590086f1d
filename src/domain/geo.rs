//! Great-circle geometry on a spherical Earth approximation

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// Haversine distance between two coordinate pairs, in meters.
///
/// Symmetric in its arguments and zero for identical points. Callers are
/// responsible for passing coordinates within valid ranges.
pub fn haversine_distance(
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
) -> f64 {
    let lat1_rad = to_radians(latitude_1);
    let lat2_rad = to_radians(latitude_2);

    let dlat = to_radians(latitude_2 - latitude_1);
    let dlon = to_radians(longitude_2 - longitude_1);

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_identical_points() {
        let d = haversine_distance(-23.550520, -46.633309, -23.550520, -46.633309);
        assert_eq!(d, 0.0);
        assert!(!d.is_nan());
    }

    #[test]
    fn test_symmetry() {
        let pairs = [
            ((-23.550520, -46.633309), (-23.560, -46.640)),
            ((0.0, 0.0), (10.0, 10.0)),
            ((89.9, 179.9), (-89.9, -179.9)),
            ((52.5200, 13.4050), (48.8566, 2.3522)),
        ];
        for ((lat1, lon1), (lat2, lon2)) in pairs {
            let ab = haversine_distance(lat1, lon1, lat2, lon2);
            let ba = haversine_distance(lat2, lon2, lat1, lon1);
            assert!((ab - ba).abs() <= 1e-6 * ab.max(1.0));
        }
    }

    #[test]
    fn test_known_distance_sao_paulo() {
        // Praça da Sé to a point ~1.2 km away
        let d = haversine_distance(-23.550520, -46.633309, -23.560, -46.640);
        assert!(d > 1_100.0 && d < 1_400.0, "got {d}");
    }

    #[test]
    fn test_short_distance_inside_zone_radius() {
        // ~7 m offset should stay well within a 100 m radius
        let d = haversine_distance(-23.550520, -46.633309, -23.5505, -46.6333);
        assert!(d < 100.0, "got {d}");
    }

    #[test]
    fn test_equator_degree_of_longitude() {
        // One degree of longitude at the equator is ~111.2 km
        let d = haversine_distance(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111_195.0).abs() < 200.0, "got {d}");
    }
}
