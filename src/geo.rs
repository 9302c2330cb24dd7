//! Great-circle distance

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two points given in degrees
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // rounding can push `a` past 1 for near-antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONDON: (f64, f64) = (51.5074, -0.1278);
    const PARIS: (f64, f64) = (48.8566, 2.3522);

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(distance_km(LONDON.0, LONDON.1, LONDON.0, LONDON.1), 0.0);
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            (LONDON, PARIS),
            ((40.7128, -74.0060), (34.0522, -118.2437)),
            ((-33.8688, 151.2093), (35.6762, 139.6503)),
            ((89.9, 10.0), (-89.9, -170.0)),
        ];
        for (a, b) in pairs {
            let ab = distance_km(a.0, a.1, b.0, b.1);
            let ba = distance_km(b.0, b.1, a.0, a.1);
            assert!((ab - ba).abs() < 1e-9, "{:?} -> {:?}: {} vs {}", a, b, ab, ba);
        }
    }

    #[test]
    fn test_london_paris() {
        let d = distance_km(LONDON.0, LONDON.1, PARIS.0, PARIS.1);
        assert!((d - 343.5).abs() < 2.0, "got {}", d);
    }

    #[test]
    fn test_near_antipodal_pairs_are_finite() {
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        for step in 0..=9000 {
            let lat = step as f64 / 100.0;
            let d = distance_km(lat, 10.0, -lat, -170.0);
            assert!(d.is_finite(), "lat {}: {}", lat, d);
            assert!((0.0..=half + 1e-6).contains(&d), "lat {}: {}", lat, d);
        }
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = distance_km(0.0, 0.0, 0.0, 180.0);
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half).abs() < 1e-6);
    }
}
