//! Coordinate projections between geographic degrees and tile space.
//!
//! Forward projections turn longitude and latitude into the `u64` coordinates a
//! [`QTree`][crate::qtree::QTree] indexes; inverse projections turn them back.

use geo_traits::{CoordTrait, RectTrait};

use crate::tile::TileRect;

#[cfg(feature = "use-geo_0_31")]
mod geometry;
mod mercator;
mod wgs84;

#[cfg(feature = "use-geo_0_31")]
pub use geometry::GeometryForm;
pub use mercator::{SphericalMercator, SphericalMercatorInverse, MERCATOR_MAX_LATITUDE};
pub use wgs84::{
    Wgs84, Wgs84Inverse, MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE,
};

/// A stateless codec applied independently to each axis.
pub trait Projection {
    /// Coordinate type accepted by this projection.
    type From: Copy;
    /// Coordinate type produced by this projection.
    type To: Copy;

    /// Project a coordinate on the x axis.
    fn transform_x(&self, x: Self::From) -> Self::To;

    /// Project a coordinate on the y axis.
    fn transform_y(&self, y: Self::From) -> Self::To;

    /// Project both coordinates of a point.
    fn transform(&self, x: Self::From, y: Self::From) -> (Self::To, Self::To) {
        (self.transform_x(x), self.transform_y(y))
    }

    /// Project any [`CoordTrait`] point.
    fn transform_coord(&self, coord: &impl CoordTrait<T = Self::From>) -> (Self::To, Self::To) {
        self.transform(coord.x(), coord.y())
    }
}

/// Project a rectangle in degrees to the tile rectangle covering it.
///
/// Both bounds are clamped like single coordinates, so a rectangle reaching past the
/// domain covers up to its edge.
///
/// ```
/// use geo_qtree::projection::{project_rect, Wgs84};
/// use geo_qtree::TileRect;
///
/// let rect = geo_0_31::Rect::new((-180.0, -90.0), (180.0, 90.0));
/// assert_eq!(project_rect(&Wgs84, &rect), TileRect::full());
/// ```
pub fn project_rect<P>(projection: &P, rect: &impl RectTrait<T = f64>) -> TileRect
where
    P: Projection<From = f64, To = u64>,
{
    let (x0, y0) = projection.transform_coord(&rect.min());
    let (x1, y1) = projection.transform_coord(&rect.max());
    TileRect::new(x0, y0, x1, y1)
}

/// Unproject a tile rectangle to `[min_x, min_y, max_x, max_y]` in degrees.
pub fn unproject_rect<P>(projection: &P, rect: &TileRect) -> [f64; 4]
where
    P: Projection<From = u64, To = f64>,
{
    let (min_x, min_y) = projection.transform(rect.x0, rect.y0);
    let (max_x, max_y) = projection.transform(rect.x1, rect.y1);
    [min_x, min_y, max_x, max_y]
}

#[cfg(test)]
mod test {
    use geo_0_31::{coord, Rect};

    use super::*;

    #[test]
    fn transform_coord_accepts_geo_types() {
        let coord = coord! { x: -121.895259, y: 37.333447 };
        let (x, y) = Wgs84.transform_coord(&coord);
        assert_eq!((x, y), Wgs84.transform(-121.895259, 37.333447));
        assert_eq!(Wgs84Inverse.transform(x, y), (coord.x, coord.y));
    }

    #[test]
    fn rect_round_trip() {
        let rect = Rect::new(
            coord! { x: -122.5, y: 37.25 },
            coord! { x: -121.75, y: 38.0 },
        );
        let tiles = project_rect(&Wgs84, &rect);
        assert!(tiles.x0 < tiles.x1 && tiles.y0 < tiles.y1);
        assert_eq!(
            unproject_rect(&Wgs84Inverse, &tiles),
            [-122.5, 37.25, -121.75, 38.0]
        );
    }

    #[test]
    fn rect_clamps_to_domain() {
        let rect = Rect::new(coord! { x: -500.0, y: -100.0 }, coord! { x: 10.0, y: 100.0 });
        let tiles = project_rect(&Wgs84, &rect);
        assert_eq!(tiles.x0, 0);
        assert_eq!(tiles.y0, 0);
        assert_eq!(tiles.y1, u64::MAX);
        assert_eq!(tiles.x1, Wgs84.transform_x(10.0));
    }

    #[test]
    fn mercator_rect_is_ordered() {
        let rect = Rect::new(coord! { x: -10.0, y: -60.0 }, coord! { x: 10.0, y: 60.0 });
        let tiles = project_rect(&SphericalMercator, &rect);
        assert!(tiles.x0 < tiles.x1 && tiles.y0 < tiles.y1);
    }
}
