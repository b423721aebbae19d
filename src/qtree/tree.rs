use std::sync::Arc;

use geo_traits::{CoordTrait, RectTrait};

use crate::error::{QTreeError, Result};
use crate::qtree::entry::Entry;
use crate::qtree::page::Page;
use crate::qtree::shape::{AcceptAll, ShapeForm};
use crate::qtree::split::split_overloaded;
use crate::qtree::traversal::Search;
use crate::tile::{Tile, TileRect};

/// Default number of entries a page holds before it is split.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 32;

/// Structural policy of a [`QTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeConfig {
    split_threshold: usize,
}

impl TreeConfig {
    /// Create a config with the given split threshold.
    ///
    /// # Panics
    ///
    /// Panics if `split_threshold` is zero. Use [`TreeConfig::try_new`] to handle that
    /// case as an error.
    pub fn new(split_threshold: usize) -> Self {
        assert!(split_threshold >= 1, "split threshold must be at least 1");
        Self { split_threshold }
    }

    /// Create a config with the given split threshold, rejecting zero.
    pub fn try_new(split_threshold: usize) -> Result<Self> {
        if split_threshold == 0 {
            return Err(QTreeError::InvalidSplitThreshold(split_threshold));
        }
        Ok(Self { split_threshold })
    }

    /// Pages whose span exceeds this are split; nodes whose span falls to it collapse.
    pub fn split_threshold(&self) -> usize {
        self.split_threshold
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            split_threshold: DEFAULT_SPLIT_THRESHOLD,
        }
    }
}

/// A persistent quadtree of keyed entries over 64-bit tile space.
///
/// The tree is a handle onto an immutable root [`Page`]. Mutating methods build a new
/// root that shares every untouched page with the old one, so cloning a `QTree` is cheap
/// and a clone is a snapshot that later mutations never affect.
///
/// Keys are unique: inserting a key that is already present replaces the old entry,
/// wherever it sits. Lookups and removals take the key together with its tiles so they
/// only descend where those tiles lead; [`QTree::find`] looks a key up without them.
///
/// ```
/// use geo_qtree::qtree::QTree;
///
/// let mut tree: QTree<&str, (), u32> = QTree::default();
/// tree.insert_point("k0", 2, 2, 0);
/// tree.insert_point("k1", 2, 6, 1);
/// tree.insert_point("k2", 6, 2, 2);
///
/// let snapshot = tree.clone();
/// tree.remove_point(&"k1", 2, 6);
///
/// let found: Vec<_> = snapshot.search(2, 2, 2, 6).map(|entry| *entry.key()).collect();
/// assert_eq!(found, vec!["k0", "k1"]);
/// assert_eq!(tree.search(2, 2, 2, 6).count(), 1);
/// ```
#[derive(Debug)]
pub struct QTree<K, S, V, F = AcceptAll> {
    root: Arc<Page<K, S, V>>,
    config: TreeConfig,
    form: F,
}

impl<K, S, V, F: Clone> Clone for QTree<K, S, V, F> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            config: self.config,
            form: self.form.clone(),
        }
    }
}

impl<K, S, V, F: Default> Default for QTree<K, S, V, F> {
    fn default() -> Self {
        Self::empty(F::default())
    }
}

impl<K, S, V, F> QTree<K, S, V, F> {
    /// An empty tree that interprets shapes with `form`.
    pub fn empty(form: F) -> Self {
        Self::with_config(form, TreeConfig::default())
    }

    /// An empty tree with a custom structural policy.
    pub fn with_config(form: F, config: TreeConfig) -> Self {
        Self::from_root(Arc::new(Page::empty()), config, form)
    }

    /// A tree onto an existing root page.
    pub fn from_root(root: Arc<Page<K, S, V>>, config: TreeConfig, form: F) -> Self {
        Self { root, config, form }
    }

    /// The current root page.
    pub fn root(&self) -> &Arc<Page<K, S, V>> {
        &self.root
    }

    /// The structural policy of this tree.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The form interpreting entry shapes.
    pub fn form(&self) -> &F {
        &self.form
    }

    /// The number of entries in the tree.
    pub fn len(&self) -> usize {
        self.root.span()
    }

    /// Returns `true` if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.root = Arc::new(Page::empty());
    }

    /// Returns `true` if both trees share the same root page.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

impl<K: Eq, S, V, F> QTree<K, S, V, F> {
    /// Insert an entry, replacing any entry with the same key.
    pub fn insert_entry(&mut self, entry: Entry<K, S, V>) {
        let updated = self.root.updated(Arc::new(entry), &self.config);
        self.root = split_overloaded(&updated, &self.config);
        log::trace!(
            "inserted entry, tree now holds {} entries at depth {}",
            self.root.span(),
            self.root.depth()
        );
    }

    /// Insert `value` under `key`, occupying the tiles `x` and `y`.
    ///
    /// Build tiles with [`Tile::new`] for a given rank, or [`Tile::point`] for rank 0.
    pub fn insert(&mut self, key: K, x: Tile, y: Tile, shape: Option<S>, value: V) {
        self.insert_entry(Entry::new(key, shape, x, y, value));
    }

    /// Insert `value` under `key` at the point `(x, y)`.
    pub fn insert_point(&mut self, key: K, x: u64, y: u64, value: V) {
        self.insert_entry(Entry::point(key, x, y, value));
    }

    /// Remove the entry with this key at these tiles, returning it.
    pub fn remove(&mut self, key: &K, x: Tile, y: Tile) -> Option<Arc<Entry<K, S, V>>> {
        let removed = self.root.get(key, x, y)?.clone();
        let root = self.root.removed(key, x, y, &self.config);
        self.root = root.balanced(&self.config);
        log::trace!("removed entry, tree now holds {} entries", self.root.span());
        Some(removed)
    }

    /// Remove the entry with this key at the point `(x, y)`, returning it.
    pub fn remove_point(&mut self, key: &K, x: u64, y: u64) -> Option<Arc<Entry<K, S, V>>> {
        self.remove(key, Tile::point(x), Tile::point(y))
    }

    /// Move an entry from the tiles `(x, y)` to the tiles of `entry`.
    ///
    /// Like [`QTree::insert_entry`], but returns the entry stored under `entry`'s key at
    /// the old tiles. If nothing was stored there this is a plain insert.
    pub fn moved(
        &mut self,
        x: Tile,
        y: Tile,
        entry: Entry<K, S, V>,
    ) -> Option<Arc<Entry<K, S, V>>> {
        let removed = self.remove(entry.key(), x, y);
        self.insert_entry(entry);
        removed
    }

    /// Find the entry with this key, wherever it sits.
    ///
    /// Visits entries until it meets the key; prefer [`QTree::get_entry`] when the
    /// tiles are known.
    pub fn find(&self, key: &K) -> Option<&Entry<K, S, V>> {
        self.root.find(key).map(|entry| entry.as_ref())
    }

    /// Find the entry with this key at exactly these tiles.
    pub fn get_entry(&self, key: &K, x: Tile, y: Tile) -> Option<&Entry<K, S, V>> {
        self.root.get(key, x, y).map(|entry| entry.as_ref())
    }

    /// The value stored under this key at exactly these tiles.
    pub fn get(&self, key: &K, x: Tile, y: Tile) -> Option<&V> {
        self.get_entry(key, x, y).map(|entry| entry.value())
    }

    /// The value stored under this key at the point `(x, y)`.
    pub fn get_point(&self, key: &K, x: u64, y: u64) -> Option<&V> {
        self.get(key, Tile::point(x), Tile::point(y))
    }

    /// Returns `true` if an entry with this key sits at exactly these tiles.
    pub fn contains_key(&self, key: &K, x: Tile, y: Tile) -> bool {
        self.root.contains_key(key, x, y)
    }
}

impl<K, S, V, F: ShapeForm<S>> QTree<K, S, V, F> {
    /// Lazily find the entries intersecting the inclusive rectangle `x0..=x1` by
    /// `y0..=y1`.
    ///
    /// An inverted rectangle selects nothing. Results come in a stable order for an
    /// unchanged tree.
    pub fn search(&self, x0: u64, y0: u64, x1: u64, y1: u64) -> Search<'_, K, S, V, F> {
        self.search_within(TileRect::new(x0, y0, x1, y1))
    }

    /// Lazily find the entries intersecting any rectangle with `u64` coordinates.
    pub fn search_rect(&self, rect: &impl RectTrait<T = u64>) -> Search<'_, K, S, V, F> {
        self.search(
            rect.min().x(),
            rect.min().y(),
            rect.max().x(),
            rect.max().y(),
        )
    }

    /// Lazily find the entries intersecting `rect`.
    pub fn search_within(&self, rect: TileRect) -> Search<'_, K, S, V, F> {
        self.root.search(rect, &self.form)
    }
}

impl<K, S, V, F> QTree<K, S, V, F> {
    /// Every entry of the tree, in query order.
    pub fn iter(&self) -> Search<'_, K, S, V, AcceptAll> {
        self.root.entries()
    }
}
