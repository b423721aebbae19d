//! A persistent, copy-on-write quadtree over power-of-two tiles.

#![warn(missing_docs)]

mod entry;
mod page;
mod shape;
mod shared;
mod split;
mod traversal;
mod tree;

pub use entry::Entry;
pub use page::{Leaf, Node, Page};
pub use shape::{AcceptAll, RectForm, ShapeForm};
pub use shared::SharedQTree;
pub use traversal::Search;
pub use tree::{QTree, TreeConfig, DEFAULT_SPLIT_THRESHOLD};
