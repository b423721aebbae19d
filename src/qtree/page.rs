//! Persistent pages: lookup, insertion and removal.
//!
//! Pages are immutable once built. Every structural operation takes `self` behind an
//! [`Arc`] and returns the new page, reusing every untouched child by reference. An
//! operation that changes nothing hands back the same `Arc`, so callers can detect a
//! no-op with [`Arc::ptr_eq`].

use std::sync::Arc;

use crate::qtree::entry::Entry;
use crate::qtree::shape::{AcceptAll, ShapeForm};
use crate::qtree::split::split_overloaded;
use crate::qtree::traversal::Search;
use crate::qtree::tree::TreeConfig;
use crate::tile::{Axis, Tile, TileRect};

/// A page holding entries directly.
///
/// A leaf's tiles cover its entries but need not be their union: a leaf cut out by a
/// split keeps the half cell it was cut from, even while empty, so that inserts keep
/// routing into it. [`Page::balanced`] builds leaves with the tight union.
#[derive(Debug)]
pub struct Leaf<K, S, V> {
    pub(crate) entries: Vec<Arc<Entry<K, S, V>>>,
    pub(crate) x: Tile,
    pub(crate) y: Tile,
}

impl<K, S, V> Leaf<K, S, V> {
    pub(crate) fn new(entries: Vec<Arc<Entry<K, S, V>>>, (x, y): (Tile, Tile)) -> Self {
        Self { entries, x, y }
    }

    /// The entries of this leaf, in insertion order.
    pub fn entries(&self) -> &[Arc<Entry<K, S, V>>] {
        &self.entries
    }
}

/// A page holding child pages, plus the entries that fit no single child.
#[derive(Debug)]
pub struct Node<K, S, V> {
    pub(crate) pages: Vec<Arc<Page<K, S, V>>>,
    pub(crate) lifted: Vec<Arc<Entry<K, S, V>>>,
    pub(crate) x: Tile,
    pub(crate) y: Tile,
    pub(crate) span: usize,
}

impl<K, S, V> Node<K, S, V> {
    pub(crate) fn new(
        pages: Vec<Arc<Page<K, S, V>>>,
        lifted: Vec<Arc<Entry<K, S, V>>>,
        x: Tile,
        y: Tile,
    ) -> Self {
        let span = lifted.len() + pages.iter().map(|page| page.span()).sum::<usize>();
        Self {
            pages,
            lifted,
            x,
            y,
            span,
        }
    }

    /// The child pages of this node.
    pub fn pages(&self) -> &[Arc<Page<K, S, V>>] {
        &self.pages
    }

    /// The entries held at this node because no single child contains them.
    pub fn lifted(&self) -> &[Arc<Entry<K, S, V>>] {
        &self.lifted
    }

    /// The most specific child containing both tiles, if any.
    ///
    /// Specificity is the sum of the child's ranks; ties go to the lowest index.
    fn route(&self, x: Tile, y: Tile) -> Option<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.contains_tiles(x, y))
            .min_by_key(|(_, page)| page.x_tile().rank() + page.y_tile().rank())
            .map(|(index, _)| index)
    }
}

/// One page of a [`QTree`][crate::qtree::QTree].
///
/// Every page carries a tile per axis that covers everything beneath it, and a span
/// equal to the number of entries beneath it.
#[derive(Debug)]
pub enum Page<K, S, V> {
    /// A page holding entries directly.
    Leaf(Leaf<K, S, V>),
    /// A page holding child pages.
    Node(Node<K, S, V>),
}

impl<K, S, V> Default for Page<K, S, V> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<K, S, V> Page<K, S, V> {
    /// An empty leaf with empty tiles.
    pub fn empty() -> Self {
        Page::Leaf(Leaf::new(Vec::new(), (Tile::EMPTY, Tile::EMPTY)))
    }

    /// Returns `true` if this page holds its entries directly.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Page::Leaf(_))
    }

    /// The tile covering this page on the x axis.
    pub fn x_tile(&self) -> Tile {
        match self {
            Page::Leaf(leaf) => leaf.x,
            Page::Node(node) => node.x,
        }
    }

    /// The tile covering this page on the y axis.
    pub fn y_tile(&self) -> Tile {
        match self {
            Page::Leaf(leaf) => leaf.y,
            Page::Node(node) => node.y,
        }
    }

    pub(crate) fn tile(&self, axis: Axis) -> Tile {
        match axis {
            Axis::X => self.x_tile(),
            Axis::Y => self.y_tile(),
        }
    }

    /// The number of entries beneath this page.
    pub fn span(&self) -> usize {
        match self {
            Page::Leaf(leaf) => leaf.entries.len(),
            Page::Node(node) => node.span,
        }
    }

    /// The number of direct children. Zero for a leaf.
    pub fn arity(&self) -> usize {
        match self {
            Page::Leaf(_) => 0,
            Page::Node(node) => node.pages.len(),
        }
    }

    /// The number of pages on the longest path from this page down to a leaf.
    pub fn depth(&self) -> usize {
        match self {
            Page::Leaf(_) => 1,
            Page::Node(node) => {
                1 + node
                    .pages
                    .iter()
                    .map(|page| page.depth())
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// The direct children of this page. Empty for a leaf.
    pub fn pages(&self) -> &[Arc<Page<K, S, V>>] {
        match self {
            Page::Leaf(_) => &[],
            Page::Node(node) => &node.pages,
        }
    }

    /// The entries held at this page itself: a leaf's entries or a node's lifted entries.
    pub fn own_entries(&self) -> &[Arc<Entry<K, S, V>>] {
        match self {
            Page::Leaf(leaf) => &leaf.entries,
            Page::Node(node) => &node.lifted,
        }
    }

    /// Every entry beneath this page, in query order.
    pub fn entries(&self) -> Search<'_, K, S, V, AcceptAll> {
        Search::new(self, TileRect::full(), &AcceptAll)
    }

    /// Lazily find the entries whose tiles intersect `rect` and whose shape, if any, is
    /// accepted by `form`.
    ///
    /// Entries held at a page come before those of its children, and children are
    /// visited in order.
    pub fn search<'a, F: ShapeForm<S>>(
        &'a self,
        rect: TileRect,
        form: &'a F,
    ) -> Search<'a, K, S, V, F> {
        Search::new(self, rect, form)
    }

    /// Returns `true` if this page's tiles contain both tiles.
    #[inline]
    pub(crate) fn contains_tiles(&self, x: Tile, y: Tile) -> bool {
        self.x_tile().contains_tile(x) && self.y_tile().contains_tile(y)
    }

    /// Append every entry beneath this page to `out`, in query order.
    pub(crate) fn collect_entries(&self, out: &mut Vec<Arc<Entry<K, S, V>>>) {
        match self {
            Page::Leaf(leaf) => out.extend(leaf.entries.iter().cloned()),
            Page::Node(node) => {
                out.extend(node.lifted.iter().cloned());
                for page in &node.pages {
                    page.collect_entries(out);
                }
            }
        }
    }
}

impl<K: Eq, S, V> Page<K, S, V> {
    /// Find the entry with this key at exactly these tiles.
    pub fn get(&self, key: &K, x: Tile, y: Tile) -> Option<&Arc<Entry<K, S, V>>> {
        match self {
            Page::Leaf(leaf) => leaf
                .entries
                .iter()
                .find(|entry| entry.key() == key && entry.is_at(x, y)),
            Page::Node(node) => node
                .lifted
                .iter()
                .find(|entry| entry.key() == key && entry.is_at(x, y))
                .or_else(|| {
                    node.pages
                        .iter()
                        .filter(|page| page.contains_tiles(x, y))
                        .find_map(|page| page.get(key, x, y))
                }),
        }
    }

    /// Returns `true` if an entry with this key sits at exactly these tiles.
    pub fn contains_key(&self, key: &K, x: Tile, y: Tile) -> bool {
        self.get(key, x, y).is_some()
    }

    /// Find the entry with this key, wherever it sits beneath this page.
    ///
    /// Without tiles to route by, this visits every entry until it finds the key.
    pub fn find(&self, key: &K) -> Option<&Arc<Entry<K, S, V>>> {
        match self {
            Page::Leaf(leaf) => leaf.entries.iter().find(|entry| entry.key() == key),
            Page::Node(node) => node
                .lifted
                .iter()
                .find(|entry| entry.key() == key)
                .or_else(|| node.pages.iter().find_map(|page| page.find(key))),
        }
    }

    /// Insert `entry`, replacing any entry with the same key.
    ///
    /// A leaf replaces the same key in place or appends, and grows its tiles to cover
    /// the entry. It never splits itself; callers split the returned page when its span
    /// exceeds the threshold. A node first removes an entry with the same key from
    /// anywhere beneath it, then routes the new entry into its most specific child that
    /// contains it, splitting that child if it becomes overloaded, or lifts the entry
    /// when no child contains it.
    pub fn updated(
        self: &Arc<Self>,
        entry: Arc<Entry<K, S, V>>,
        config: &TreeConfig,
    ) -> Arc<Self> {
        if self.is_leaf() {
            return self.inserted(entry, config);
        }
        let old = self.find(entry.key()).map(|old| (old.x_tile(), old.y_tile()));
        match old {
            Some((x, y)) => self.removed(entry.key(), x, y, config).inserted(entry, config),
            None => self.inserted(entry, config),
        }
    }

    /// Insert `entry` without looking for its key outside the leaf it lands in.
    fn inserted(self: &Arc<Self>, entry: Arc<Entry<K, S, V>>, config: &TreeConfig) -> Arc<Self> {
        let (x, y) = (entry.x_tile(), entry.y_tile());
        match self.as_ref() {
            Page::Leaf(leaf) => {
                let mut entries = leaf.entries.clone();
                match entries.iter().position(|old| old.key() == entry.key()) {
                    Some(index) => entries[index] = entry,
                    None => entries.push(entry),
                }
                let tiles = (leaf.x.union(x), leaf.y.union(y));
                Arc::new(Page::Leaf(Leaf::new(entries, tiles)))
            }
            Page::Node(node) => {
                let mut lifted = node.lifted.clone();
                let mut pages = node.pages.clone();
                match node.route(x, y) {
                    Some(index) => {
                        let child = pages[index].inserted(entry, config);
                        pages[index] = split_overloaded(&child, config);
                    }
                    None => lifted.push(entry),
                }
                Arc::new(Page::Node(Node::new(
                    pages,
                    lifted,
                    node.x.union(x),
                    node.y.union(y),
                )))
            }
        }
    }

    /// Remove the entry with this key at exactly these tiles.
    ///
    /// Aggregate tiles are left as they are. A child whose span falls to the threshold
    /// collapses into a leaf that keeps the child's tiles. Returns the same page when
    /// there is no such entry.
    pub fn removed(
        self: &Arc<Self>,
        key: &K,
        x: Tile,
        y: Tile,
        config: &TreeConfig,
    ) -> Arc<Self> {
        let matches = |entry: &Arc<Entry<K, S, V>>| entry.key() == key && entry.is_at(x, y);
        match self.as_ref() {
            Page::Leaf(leaf) => match leaf.entries.iter().position(matches) {
                Some(index) => {
                    let mut entries = leaf.entries.clone();
                    entries.remove(index);
                    Arc::new(Page::Leaf(Leaf::new(entries, (leaf.x, leaf.y))))
                }
                None => self.clone(),
            },
            Page::Node(node) => {
                if let Some(index) = node.lifted.iter().position(matches) {
                    let mut lifted = node.lifted.clone();
                    lifted.remove(index);
                    return Arc::new(Page::Node(Node::new(
                        node.pages.clone(),
                        lifted,
                        node.x,
                        node.y,
                    )));
                }
                for (index, page) in node.pages.iter().enumerate() {
                    if !page.contains_tiles(x, y) {
                        continue;
                    }
                    let child = page.removed(key, x, y, config);
                    if Arc::ptr_eq(&child, page) {
                        continue;
                    }
                    let mut pages = node.pages.clone();
                    pages[index] = child.collapsed(config);
                    return Arc::new(Page::Node(Node::new(
                        pages,
                        node.lifted.clone(),
                        node.x,
                        node.y,
                    )));
                }
                self.clone()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type TestPage = Page<&'static str, (), u32>;

    fn point(key: &'static str, x: u64, y: u64, value: u32) -> Arc<Entry<&'static str, (), u32>> {
        Arc::new(Entry::point(key, x, y, value))
    }

    #[test]
    fn leaf_replaces_same_key_in_place() {
        let config = TreeConfig::default();
        let page = Arc::new(TestPage::empty());
        let page = page.updated(point("a", 1, 1, 0), &config);
        let page = page.updated(point("b", 2, 2, 1), &config);
        let page = page.updated(point("a", 5, 1, 2), &config);

        assert_eq!(page.span(), 2);
        let keys: Vec<_> = page.entries().map(|entry| *entry.key()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(page.get(&"a", Tile::point(5), Tile::point(1)).unwrap().value(), &2);
        assert!(page.x_tile().contains(1) && page.x_tile().contains(5));
    }

    #[test]
    fn removing_missing_key_is_a_no_op() {
        let config = TreeConfig::default();
        let page = Arc::new(TestPage::empty()).updated(point("a", 1, 1, 0), &config);

        let same = page.removed(&"b", Tile::point(1), Tile::point(1), &config);
        assert!(Arc::ptr_eq(&page, &same));

        let same = page.removed(&"a", Tile::point(2), Tile::point(1), &config);
        assert!(Arc::ptr_eq(&page, &same));
    }

    #[test]
    fn removal_keeps_tiles() {
        let config = TreeConfig::default();
        let page = Arc::new(TestPage::empty())
            .updated(point("a", 0, 0, 0), &config)
            .updated(point("b", 100, 100, 1), &config);
        let before = (page.x_tile(), page.y_tile());

        let page = page.removed(&"b", Tile::point(100), Tile::point(100), &config);
        assert_eq!(page.span(), 1);
        assert_eq!((page.x_tile(), page.y_tile()), before);
        assert!(!page.contains_key(&"b", Tile::point(100), Tile::point(100)));
    }

    #[test]
    fn node_lifts_what_no_child_contains() {
        let config = TreeConfig::new(4);
        let page = Arc::new(TestPage::empty())
            .updated(point("a", 0, 0, 0), &config)
            .updated(point("b", 7, 0, 1), &config)
            .split(&config);
        assert_eq!(page.arity(), 2);

        let wide = Arc::new(Entry::new("w", None, Tile::new(3, 0), Tile::point(0), 2));
        let page = page.updated(wide, &config);
        assert_eq!(page.own_entries().len(), 1);
        assert_eq!(page.span(), 3);
        assert!(page.contains_key(&"w", Tile::new(3, 0), Tile::point(0)));

        let page = page.removed(&"w", Tile::new(3, 0), Tile::point(0), &config);
        assert!(page.own_entries().is_empty());
        assert_eq!(page.span(), 2);
    }

    #[test]
    fn node_replaces_key_held_by_another_child() {
        let config = TreeConfig::new(4);
        let page = Arc::new(TestPage::empty())
            .updated(point("a", 0, 0, 0), &config)
            .updated(point("b", 7, 0, 1), &config)
            .split(&config);

        let page = page.updated(point("a", 6, 0, 2), &config);
        assert_eq!(page.span(), 2);
        assert_eq!(page.entries().filter(|entry| entry.key() == &"a").count(), 1);
        assert!(!page.contains_key(&"a", Tile::point(0), Tile::point(0)));
        assert_eq!(page.find(&"a").map(|entry| *entry.value()), Some(2));
        assert_eq!(page.pages()[1].span(), 2);
    }

    #[test]
    fn lifted_key_moves_into_child() {
        let config = TreeConfig::new(4);
        let page = Arc::new(TestPage::empty())
            .updated(point("a", 0, 0, 0), &config)
            .updated(point("b", 7, 0, 1), &config)
            .split(&config);

        let wide = Arc::new(Entry::new("k", None, Tile::new(3, 0), Tile::point(0), 2));
        let page = page.updated(wide, &config);
        let page = page.updated(point("k", 1, 0, 3), &config);

        assert!(page.own_entries().is_empty());
        assert_eq!(page.span(), 3);
        assert_eq!(page.get(&"k", Tile::point(1), Tile::point(0)).unwrap().value(), &3);
    }
}
