//! Refinement of range-query matches beyond tile intersection.

use crate::tile::TileRect;

/// Decides whether an entry's shape accepts a query rectangle.
///
/// The tree only consults the form for entries that carry a shape and whose tiles
/// already intersect the query. Any `Fn(&S, &TileRect) -> bool` closure is a form.
///
/// ```
/// use geo_qtree::qtree::ShapeForm;
/// use geo_qtree::TileRect;
///
/// let above_diagonal = |_: &(), query: &TileRect| query.y1 >= query.x0;
/// assert!(above_diagonal.accepts(&(), &TileRect::new(0, 0, 4, 4)));
/// assert!(!above_diagonal.accepts(&(), &TileRect::new(8, 0, 9, 4)));
/// ```
pub trait ShapeForm<S> {
    /// Returns `true` if `shape` should match `query`.
    fn accepts(&self, shape: &S, query: &TileRect) -> bool;
}

/// A form that accepts every query: shapes are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptAll;

impl<S> ShapeForm<S> for AcceptAll {
    #[inline]
    fn accepts(&self, _shape: &S, _query: &TileRect) -> bool {
        true
    }
}

/// A form for exact rectangles: an entry's [`TileRect`] shape must overlap the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RectForm;

impl ShapeForm<TileRect> for RectForm {
    #[inline]
    fn accepts(&self, shape: &TileRect, query: &TileRect) -> bool {
        shape.intersects(query)
    }
}

impl<S, F> ShapeForm<S> for F
where
    F: Fn(&S, &TileRect) -> bool,
{
    #[inline]
    fn accepts(&self, shape: &S, query: &TileRect) -> bool {
        self(shape, query)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rect_form_overlap() {
        let shape = TileRect::new(10, 10, 20, 20);
        assert!(RectForm.accepts(&shape, &TileRect::new(20, 0, 30, 10)));
        assert!(!RectForm.accepts(&shape, &TileRect::new(21, 0, 30, 30)));
    }

    #[test]
    fn accept_all_ignores_shape() {
        assert!(AcceptAll.accepts(&"anything", &TileRect::new(1, 1, 0, 0)));
    }
}
