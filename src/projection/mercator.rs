//! Spherical Mercator projection between WGS84 degrees and tile space.

use std::f64::consts::{FRAC_PI_4, PI, TAU};

use crate::projection::wgs84::{Wgs84, Wgs84Inverse};
use crate::projection::Projection;

/// Latitude at which the spherical Mercator square ends, in degrees.
pub const MERCATOR_MAX_LATITUDE: f64 = 85.05112878;

const TILE_SPAN: f64 = 18_446_744_073_709_551_616.0;

/// Forward spherical Mercator projection: degrees to tile coordinates.
///
/// Longitude maps exactly as in [`Wgs84`]. Latitude is clipped to
/// ±[`MERCATOR_MAX_LATITUDE`], warped to Mercator `y` and rescaled from `-π..=π` onto
/// the `u64` range. Values near the clipping latitude are not guaranteed to round-trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SphericalMercator;

/// Inverse spherical Mercator projection: tile coordinates to degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SphericalMercatorInverse;

impl Projection for SphericalMercator {
    type From = f64;
    type To = u64;

    #[inline]
    fn transform_x(&self, longitude: f64) -> u64 {
        Wgs84.transform_x(longitude)
    }

    fn transform_y(&self, latitude: f64) -> u64 {
        let latitude = if latitude.is_nan() {
            -MERCATOR_MAX_LATITUDE
        } else {
            latitude.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE)
        };
        let y = (FRAC_PI_4 + latitude.to_radians() / 2.0).tan().ln();
        let unit = ((y + PI) / TAU).clamp(0.0, 1.0);
        // Saturates at u64::MAX.
        (unit * TILE_SPAN) as u64
    }
}

impl Projection for SphericalMercatorInverse {
    type From = u64;
    type To = f64;

    #[inline]
    fn transform_x(&self, x: u64) -> f64 {
        Wgs84Inverse.transform_x(x)
    }

    fn transform_y(&self, y: u64) -> f64 {
        let y = y as f64 / TILE_SPAN * TAU - PI;
        y.sinh().atan().to_degrees()
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn equator_is_centre() {
        assert_eq!(SphericalMercator.transform_y(0.0), 1 << 63);
        assert_eq!(SphericalMercatorInverse.transform_y(1 << 63), 0.0);
    }

    #[test]
    fn longitude_matches_wgs84() {
        for lon in [-180.0, -121.895259, 0.0, 45.5, 180.0] {
            assert_eq!(SphericalMercator.transform_x(lon), Wgs84.transform_x(lon));
        }
    }

    #[test]
    fn latitude_round_trips_away_from_clip() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..10_000 {
            let lat: f64 = rng.gen_range(-80.0..80.0);
            let y = SphericalMercator.transform_y(lat);
            let back = SphericalMercatorInverse.transform_y(y);
            assert!((back - lat).abs() < 1e-9, "{lat} came back as {back}");
        }
    }

    #[test]
    fn latitude_is_monotone() {
        let lats = [-80.0, -60.0, -10.0, -0.5, 0.0, 0.5, 10.0, 60.0, 80.0];
        let ys: Vec<u64> = lats
            .iter()
            .map(|lat| SphericalMercator.transform_y(*lat))
            .collect();
        assert!(ys.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
