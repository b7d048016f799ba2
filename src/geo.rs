//! Distance helpers.
//!
//! Two metrics are used and they are not interchangeable: planar distance in
//! degrees orders candidate checkpoints, great-circle distance in kilometers
//! decides whether a position lies within a cluster's service radius.

use crate::model::Position;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Euclidean distance in raw degree space.
pub fn planar_distance(from: Position, to: Position) -> f64 {
    let d_lat = from.lat - to.lat;
    let d_lon = from.lon - to.lon;
    (d_lat * d_lat + d_lon * d_lon).sqrt()
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(from: Position, to: Position) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}
