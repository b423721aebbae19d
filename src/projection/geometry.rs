use geo_0_31::{coord, Geometry, Intersects, Rect};

use crate::projection::{unproject_rect, Projection, Wgs84Inverse};
use crate::qtree::ShapeForm;
use crate::tile::TileRect;

/// A [`ShapeForm`] for `geo` geometries in degrees.
///
/// The query rectangle is unprojected with `P` and the geometry must intersect it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryForm<P = Wgs84Inverse> {
    inverse: P,
}

impl<P> GeometryForm<P> {
    /// A form unprojecting queries with `inverse`.
    pub fn new(inverse: P) -> Self {
        Self { inverse }
    }
}

impl<P: Projection<From = u64, To = f64>> ShapeForm<Geometry<f64>> for GeometryForm<P> {
    fn accepts(&self, shape: &Geometry<f64>, query: &TileRect) -> bool {
        let [min_x, min_y, max_x, max_y] = unproject_rect(&self.inverse, query);
        let rect = Rect::new(coord! { x: min_x, y: min_y }, coord! { x: max_x, y: max_y });
        shape.intersects(&rect)
    }
}

#[cfg(test)]
mod test {
    use geo_0_31::{line_string, point};

    use super::*;
    use crate::projection::{project_rect, Wgs84};
    use crate::qtree::QTree;
    use crate::Tile;

    #[test]
    fn filters_by_geometry() {
        let mut tree = QTree::empty(GeometryForm::<Wgs84Inverse>::default());

        let road = Geometry::from(line_string![(x: -122.0, y: 37.0), (x: -121.0, y: 38.0)]);
        let bounds = project_rect(&Wgs84, &Rect::new((-122.0, 37.0), (-121.0, 38.0)));
        let (x, y) = (
            Tile::point(bounds.x0).union(Tile::point(bounds.x1)),
            Tile::point(bounds.y0).union(Tile::point(bounds.y1)),
        );
        tree.insert("road", x, y, Some(road), ());

        let city = Geometry::from(point!(x: -121.895259, y: 37.333447));
        let (cx, cy) = Wgs84.transform(-121.895259, 37.333447);
        tree.insert("city", Tile::point(cx), Tile::point(cy), Some(city), ());

        // Near the diagonal road, away from the city.
        let near_road = project_rect(&Wgs84, &Rect::new((-121.55, 37.45), (-121.45, 37.55)));
        let found: Vec<_> = tree.search_within(near_road).map(|e| *e.key()).collect();
        assert_eq!(found, vec!["road"]);

        // Inside the road's bounding box but off the line.
        let off_road = project_rect(&Wgs84, &Rect::new((-121.95, 37.85), (-121.9, 37.9)));
        assert_eq!(tree.search_within(off_road).count(), 0);
    }
}
