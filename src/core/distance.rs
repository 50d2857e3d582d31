use crate::models::GeoPoint;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[inline]
pub fn distance_between(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Proximity score (0-1) for a distance, decaying exponentially
///
/// Zero at or beyond `radius_km`; `e^(-distance / (radius * 0.5))` inside it.
#[inline]
pub fn proximity_score(distance_km: f64, radius_km: f64) -> f64 {
    if radius_km <= 0.0 || distance_km >= radius_km {
        return 0.0;
    }

    (-distance_km / (radius_km * 0.5)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_distance() {
        // Montréal to Québec City (approximately 233 km)
        let distance = haversine_distance(45.5017, -73.5673, 46.8139, -71.2080);
        assert!((distance - 233.0).abs() < 10.0, "Distance should be ~233km, got {}", distance);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(45.5017, -73.5673);
        let b = GeoPoint::new(45.5231, -73.5817);
        assert_eq!(distance_between(&a, &b), distance_between(&b, &a));
    }

    #[test]
    fn test_proximity_score() {
        // Very close = high score
        assert!(proximity_score(1.0, 50.0) > 0.9);

        // At radius = zero score
        assert_eq!(proximity_score(50.0, 50.0), 0.0);

        // Half radius = moderate score
        let half = proximity_score(25.0, 50.0);
        assert!(half > 0.3 && half < 0.8);

        // Closer never scores lower
        assert!(proximity_score(5.0, 50.0) >= proximity_score(10.0, 50.0));
    }
}
