//! Geographic helpers for stops and map regions.

use crate::types::{Coordinate, Region};

/// Earth's radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Minimum latitude span of a computed region.
pub const MIN_LATITUDE_DELTA: f64 = 0.0922;

/// Minimum longitude span of a computed region.
pub const MIN_LONGITUDE_DELTA: f64 = 0.0421;

/// Padding applied around the bounding box of a set of points.
const REGION_PADDING: f64 = 1.1;

/// Haversine distance between two points in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Total length in kilometers of a path visiting `points` in order.
pub fn route_distance_km(points: &[Coordinate]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_km(w[0].latitude, w[0].longitude, w[1].latitude, w[1].longitude))
        .sum()
}

/// Region that fits all `points` with 10% padding.
///
/// Spans never drop below [`MIN_LATITUDE_DELTA`] / [`MIN_LONGITUDE_DELTA`], so a
/// single stop still gets a usable zoom. No points yields a region centered
/// on (0, 0).
pub fn region_for_coordinates(points: &[Coordinate]) -> Region {
    let Some(first) = points.first() else {
        return Region::new(0.0, 0.0, MIN_LATITUDE_DELTA, MIN_LONGITUDE_DELTA);
    };

    let (mut min_lat, mut max_lat) = (first.latitude, first.latitude);
    let (mut min_lng, mut max_lng) = (first.longitude, first.longitude);

    for p in &points[1..] {
        min_lat = min_lat.min(p.latitude);
        max_lat = max_lat.max(p.latitude);
        min_lng = min_lng.min(p.longitude);
        max_lng = max_lng.max(p.longitude);
    }

    Region {
        latitude: (min_lat + max_lat) / 2.0,
        longitude: (min_lng + max_lng) / 2.0,
        latitude_delta: ((max_lat - min_lat) * REGION_PADDING).max(MIN_LATITUDE_DELTA),
        longitude_delta: ((max_lng - min_lng) * REGION_PADDING).max(MIN_LONGITUDE_DELTA),
    }
}

/// Address text for a stop picked on the map: `"lat, lon"` with 6 decimals.
pub fn format_coordinate_address(latitude: f64, longitude: f64) -> String {
    format!("{:.6}, {:.6}", latitude, longitude)
}

/// Whether a coordinate pair is finite and within WGS84 bounds.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}
