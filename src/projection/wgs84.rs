//! Linear projection between WGS84 degrees and tile space.

use crate::projection::Projection;

/// Smallest longitude in degrees.
pub const MIN_LONGITUDE: f64 = -180.0;
/// Largest longitude in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;
/// Smallest latitude in degrees.
pub const MIN_LATITUDE: f64 = -90.0;
/// Largest latitude in degrees.
pub const MAX_LATITUDE: f64 = 90.0;

// 2^63 tile steps span half of each axis: 180 degrees of longitude and 90 of latitude.
// 180 = 45 * 2^2 and 90 = 45 * 2^1, so one degree is 2^61 / 45 or 2^62 / 45 steps.
const LONGITUDE_SHIFT: i32 = 61;
const LATITUDE_SHIFT: i32 = 62;
const LONGITUDE_STEP: f64 = 1.0 / (1u64 << LONGITUDE_SHIFT) as f64;
const LATITUDE_STEP: f64 = 1.0 / (1u64 << LATITUDE_SHIFT) as f64;
const CENTRE: u64 = 1 << 63;

/// Forward WGS84 projection: degrees to tile coordinates.
///
/// Each axis is clamped to its domain and rescaled linearly onto the whole `u64` range,
/// with `0.0` landing on `2^63`. NaN clamps to the lower bound.
///
/// ```
/// use geo_qtree::projection::{Projection, Wgs84, Wgs84Inverse};
///
/// let (x, y) = Wgs84.transform(-121.895259, 37.333447);
/// assert_eq!(Wgs84Inverse.transform(x, y), (-121.895259, 37.333447));
/// assert_eq!(Wgs84.transform_x(-200.0), 0);
/// assert_eq!(Wgs84.transform_y(90.0), u64::MAX);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wgs84;

/// Inverse WGS84 projection: tile coordinates to degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Wgs84Inverse;

impl Projection for Wgs84 {
    type From = f64;
    type To = u64;

    #[inline]
    fn transform_x(&self, longitude: f64) -> u64 {
        project(longitude, MAX_LONGITUDE, LONGITUDE_SHIFT)
    }

    #[inline]
    fn transform_y(&self, latitude: f64) -> u64 {
        project(latitude, MAX_LATITUDE, LATITUDE_SHIFT)
    }
}

impl Projection for Wgs84Inverse {
    type From = u64;
    type To = f64;

    #[inline]
    fn transform_x(&self, x: u64) -> f64 {
        unproject(x, LONGITUDE_STEP)
    }

    #[inline]
    fn transform_y(&self, y: u64) -> f64 {
        unproject(y, LATITUDE_STEP)
    }
}

/// Map `degrees` in `-half..=half` to `0..=u64::MAX`.
///
/// The offset from the centre is `|degrees| * 2^shift / 45` truncated toward zero,
/// computed exactly from the mantissa and exponent of `degrees`.
pub(crate) fn project(degrees: f64, half: f64, shift: i32) -> u64 {
    let degrees = if degrees.is_nan() {
        -half
    } else {
        degrees.clamp(-half, half)
    };
    let (mantissa, exponent) = decompose(degrees.abs());
    let scale = exponent + shift;
    let steps = if scale >= 0 {
        (mantissa << scale) / 45
    } else if scale > -128 {
        (mantissa >> -scale) / 45
    } else {
        0
    };

    let centre = CENTRE as u128;
    let offset = if degrees < 0.0 {
        centre - steps
    } else {
        centre + steps
    };
    offset.min(u64::MAX as u128) as u64
}

/// The inverse of [`project`], rounding the exact result to the nearest `f64`.
pub(crate) fn unproject(value: u64, step: f64) -> f64 {
    let (negative, steps) = if value < CENTRE {
        (true, CENTRE - value)
    } else {
        (false, value - CENTRE)
    };
    let degrees = (steps as u128 * 45) as f64 * step;
    if negative {
        -degrees
    } else {
        degrees
    }
}

/// Split a finite, non-negative `f64` into an integer mantissa and a binary exponent.
fn decompose(value: f64) -> (u128, i32) {
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction = (bits & ((1 << 52) - 1)) as u128;
    if exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), exponent - 1075)
    }
}
