//! Power-of-two aligned intervals on a 64-bit axis, and the rectangles used to query them.

use std::fmt;

use geo_traits::{CoordTrait, RectTrait};

/// The rank of the tile that spans an entire axis.
pub const MAX_RANK: u32 = 64;

const RANK_SHIFT: u32 = 64;

/// One of the two axes of the tile space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The horizontal axis, longitude after projection.
    X,
    /// The vertical axis, latitude after projection.
    Y,
}

/// An aligned interval `base..=base + 2^rank - 1` on one axis.
///
/// The rank and the base are packed into a single `u128` word: the low 64 bits hold the
/// base and the next 8 bits hold the rank. A rank-0 tile is a single coordinate and a
/// rank-64 tile ([`Tile::FULL`]) is the whole axis. The base of a tile is always a
/// multiple of `2^rank`.
///
/// ```
/// use geo_qtree::Tile;
///
/// let a = Tile::point(16);
/// let b = Tile::point(32);
/// let both = a.union(b);
/// assert_eq!(both.rank(), 6);
/// assert_eq!(both.base(), 0);
/// assert!(both.contains_tile(a) && both.contains_tile(b));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile(u128);

impl Tile {
    /// The identity of [`Tile::union`]. It contains and intersects nothing.
    pub const EMPTY: Tile = Tile(u128::MAX);

    /// The tile covering the whole axis.
    pub const FULL: Tile = Tile((MAX_RANK as u128) << RANK_SHIFT);

    /// Create the tile of the given rank that contains `coordinate`.
    ///
    /// The coordinate is aligned down to a multiple of `2^rank`. Ranks above
    /// [`MAX_RANK`] are clamped.
    #[inline]
    pub fn new(rank: u32, coordinate: u64) -> Self {
        let rank = rank.min(MAX_RANK);
        let base = coordinate & !low_mask(rank);
        Self(((rank as u128) << RANK_SHIFT) | base as u128)
    }

    /// Create the rank-0 tile holding exactly `coordinate`.
    #[inline]
    pub fn point(coordinate: u64) -> Self {
        Self(coordinate as u128)
    }

    /// The rank of this tile: it spans `2^rank` coordinates.
    ///
    /// Meaningless for [`Tile::EMPTY`].
    #[inline]
    pub fn rank(self) -> u32 {
        ((self.0 >> RANK_SHIFT) as u8) as u32
    }

    /// The first coordinate covered by this tile.
    #[inline]
    pub fn base(self) -> u64 {
        self.0 as u64
    }

    /// The last coordinate covered by this tile.
    #[inline]
    pub fn last(self) -> u64 {
        self.base() | low_mask(self.rank())
    }

    /// Returns `true` for [`Tile::EMPTY`].
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    /// The smallest tile containing both `self` and `other`.
    ///
    /// Two bases agree once shifted right by `r` exactly when their highest differing bit
    /// is below `r`.
    #[inline]
    pub fn union(self, other: Tile) -> Tile {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let diff = self.base() ^ other.base();
        let rank = self
            .rank()
            .max(other.rank())
            .max(u64::BITS - diff.leading_zeros());
        Tile::new(rank, self.base())
    }

    /// Returns `true` if `coordinate` falls inside this tile.
    #[inline]
    pub fn contains(self, coordinate: u64) -> bool {
        !self.is_empty() && coordinate & !low_mask(self.rank()) == self.base()
    }

    /// Returns `true` if every coordinate of `other` falls inside this tile.
    #[inline]
    pub fn contains_tile(self, other: Tile) -> bool {
        !other.is_empty() && other.rank() <= self.rank() && self.contains(other.base())
    }

    /// Returns `true` if the two tiles share at least one coordinate.
    ///
    /// Aligned tiles are either nested or disjoint, so this is a containment test in
    /// whichever direction the ranks allow.
    #[inline]
    pub fn intersects(self, other: Tile) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if self.rank() >= other.rank() {
            self.contains(other.base())
        } else {
            other.contains(self.base())
        }
    }

    /// Returns `true` if this tile shares a coordinate with the inclusive range `lo..=hi`.
    #[inline]
    pub fn intersects_range(self, lo: u64, hi: u64) -> bool {
        !self.is_empty() && lo <= hi && self.base() <= hi && self.last() >= lo
    }

    /// Split this tile into its lower and upper halves, one rank down.
    ///
    /// Returns `None` for points and for the empty tile.
    #[inline]
    pub fn halves(self) -> Option<(Tile, Tile)> {
        if self.is_empty() || self.rank() == 0 {
            return None;
        }
        let rank = self.rank() - 1;
        let low = Tile::new(rank, self.base());
        let high = Tile::new(rank, self.base() | (1 << rank));
        Some((low, high))
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("Tile::EMPTY");
        }
        f.debug_struct("Tile")
            .field("rank", &self.rank())
            .field("base", &self.base())
            .finish()
    }
}

#[inline]
fn low_mask(rank: u32) -> u64 {
    if rank >= MAX_RANK {
        u64::MAX
    } else {
        (1 << rank) - 1
    }
}

/// An inclusive, axis-aligned query rectangle `x0..=x1` by `y0..=y1` in tile space.
///
/// A rectangle with `x0 > x1` or `y0 > y1` is empty and selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRect {
    /// Smallest x coordinate, inclusive.
    pub x0: u64,
    /// Smallest y coordinate, inclusive.
    pub y0: u64,
    /// Largest x coordinate, inclusive.
    pub x1: u64,
    /// Largest y coordinate, inclusive.
    pub y1: u64,
}

impl TileRect {
    /// Create the rectangle `x0..=x1` by `y0..=y1`.
    pub fn new(x0: u64, y0: u64, x1: u64, y1: u64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// The rectangle covering the whole tile space.
    pub fn full() -> Self {
        Self::new(0, 0, u64::MAX, u64::MAX)
    }

    /// The rectangle covered by an x-tile and a y-tile.
    pub fn from_tiles(x: Tile, y: Tile) -> Self {
        if x.is_empty() || y.is_empty() {
            // Any rectangle with inverted bounds is empty.
            return Self::new(1, 1, 0, 0);
        }
        Self::new(x.base(), y.base(), x.last(), y.last())
    }

    /// Convert any [`RectTrait`] with `u64` coordinates.
    pub fn from_rect(rect: &impl RectTrait<T = u64>) -> Self {
        Self::new(
            rect.min().x(),
            rect.min().y(),
            rect.max().x(),
            rect.max().y(),
        )
    }

    /// Returns `true` if this rectangle selects nothing.
    pub fn is_empty(&self) -> bool {
        self.x0 > self.x1 || self.y0 > self.y1
    }

    /// Returns `true` if the point `(x, y)` is inside this rectangle.
    pub fn contains_point(&self, x: u64, y: u64) -> bool {
        self.x0 <= x && x <= self.x1 && self.y0 <= y && y <= self.y1
    }

    /// Returns `true` if the area covered by the two tiles meets this rectangle.
    #[inline]
    pub fn intersects_tiles(&self, x: Tile, y: Tile) -> bool {
        x.intersects_range(self.x0, self.x1) && y.intersects_range(self.y0, self.y1)
    }

    /// Returns `true` if the two rectangles share at least one point.
    pub fn intersects(&self, other: &TileRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x0 <= other.x1 && other.x0 <= self.x1 && self.y0 <= other.y1 && other.y0 <= self.y1
    }
}
