#![doc = include_str!("../README.md")]

mod error;
pub mod projection;
pub mod qtree;
pub mod tile;

pub use error::QTreeError;
pub use qtree::QTree;
pub use tile::{Axis, Tile, TileRect};
