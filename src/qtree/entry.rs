use crate::tile::{Axis, Tile, TileRect};

/// A keyed item stored in a [`QTree`][crate::qtree::QTree].
///
/// An entry occupies one tile on each axis. Its optional shape narrows which query
/// rectangles match it beyond tile intersection; the tree's
/// [`ShapeForm`][crate::qtree::ShapeForm] decides how.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<K, S, V> {
    key: K,
    shape: Option<S>,
    x: Tile,
    y: Tile,
    value: V,
}

impl<K, S, V> Entry<K, S, V> {
    /// Create a new entry.
    ///
    /// An entry with an empty tile is never matched by a range query.
    pub fn new(key: K, shape: Option<S>, x: Tile, y: Tile, value: V) -> Self {
        Self {
            key,
            shape,
            x,
            y,
            value,
        }
    }

    /// Create an entry at a single point, without a shape.
    pub fn point(key: K, x: u64, y: u64, value: V) -> Self {
        Self::new(key, None, Tile::point(x), Tile::point(y), value)
    }

    /// The key identifying this entry.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The shape refining which queries match this entry.
    pub fn shape(&self) -> Option<&S> {
        self.shape.as_ref()
    }

    /// The tile this entry occupies on the x axis.
    pub fn x_tile(&self) -> Tile {
        self.x
    }

    /// The tile this entry occupies on the y axis.
    pub fn y_tile(&self) -> Tile {
        self.y
    }

    /// The value stored with this entry.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The tile-space rectangle this entry occupies.
    pub fn rect(&self) -> TileRect {
        TileRect::from_tiles(self.x, self.y)
    }

    /// Returns `true` if this entry sits at the given tiles.
    #[inline]
    pub(crate) fn is_at(&self, x: Tile, y: Tile) -> bool {
        self.x == x && self.y == y
    }

    /// The tile of this entry on the given axis.
    #[inline]
    pub(crate) fn tile(&self, axis: Axis) -> Tile {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Consume this entry, returning its key and value.
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}
