//! Splitting overloaded pages and collapsing sparse ones.

use std::sync::Arc;

use crate::qtree::entry::Entry;
use crate::qtree::page::{Leaf, Node, Page};
use crate::qtree::tree::TreeConfig;
use crate::tile::{Axis, Tile};

type Entries<K, S, V> = Vec<Arc<Entry<K, S, V>>>;

impl<K, S, V> Page<K, S, V> {
    /// Restructure this page one step deeper.
    ///
    /// A leaf becomes a node with two children, the halves of its tile on the axis of
    /// larger rank (ties prefer x), and entries straddling the halving line are lifted
    /// onto the node. A node re-partitions the children that straddle its own halving
    /// line the same way; failing that, it gathers an excess of lifted entries into
    /// quadrant leaves. Span and tiles are unchanged. Returns the same page
    /// when no step applies.
    pub fn split(self: &Arc<Self>, config: &TreeConfig) -> Arc<Self> {
        let split = match self.as_ref() {
            Page::Leaf(leaf) => leaf.split(),
            Page::Node(node) => node.split(config),
        };
        match split {
            Some(page) => Arc::new(page),
            None => self.clone(),
        }
    }

    /// Collapse this page into a single leaf if its span is at most the split threshold.
    ///
    /// The leaf holds every entry beneath the node, lifted entries first, and its tiles
    /// are the union of those entries' tiles. Returns the same page otherwise.
    pub fn balanced(self: &Arc<Self>, config: &TreeConfig) -> Arc<Self> {
        match self.as_ref() {
            Page::Node(node) if node.span <= config.split_threshold() => {
                let mut entries = Vec::with_capacity(node.span);
                self.collect_entries(&mut entries);
                let tiles = entries
                    .iter()
                    .fold((Tile::EMPTY, Tile::EMPTY), |(x, y), entry| {
                        (x.union(entry.x_tile()), y.union(entry.y_tile()))
                    });
                log::debug!(
                    "balanced node of arity {} into a leaf of {} entries",
                    node.pages.len(),
                    entries.len()
                );
                Arc::new(Page::Leaf(Leaf::new(entries, tiles)))
            }
            _ => self.clone(),
        }
    }

    /// Like [`Page::balanced`], but the leaf keeps this node's tiles.
    ///
    /// Used on children during removal so that the collapsed child still covers the cell
    /// its parent routes entries into.
    pub(crate) fn collapsed(self: &Arc<Self>, config: &TreeConfig) -> Arc<Self> {
        match self.as_ref() {
            Page::Node(node) if node.span <= config.split_threshold() => {
                let mut entries = Vec::with_capacity(node.span);
                self.collect_entries(&mut entries);
                log::debug!("collapsed child of {} entries", entries.len());
                Arc::new(Page::Leaf(Leaf::new(entries, (node.x, node.y))))
            }
            _ => self.clone(),
        }
    }
}

/// Split `page` until its span fits the threshold or no split makes progress, then do
/// the same for the children of whatever it became.
pub(crate) fn split_overloaded<K, S, V>(
    page: &Arc<Page<K, S, V>>,
    config: &TreeConfig,
) -> Arc<Page<K, S, V>> {
    let mut current = page.clone();
    while current.span() > config.split_threshold() {
        let split = current.split(config);
        if Arc::ptr_eq(&split, &current) {
            break;
        }
        current = split;
    }
    if Arc::ptr_eq(&current, page) {
        return current;
    }

    match current.as_ref() {
        Page::Leaf(_) => current,
        Page::Node(node) => {
            let pages = node
                .pages
                .iter()
                .map(|child| split_overloaded(child, config))
                .collect();
            Arc::new(Page::Node(Node::new(
                pages,
                node.lifted.clone(),
                node.x,
                node.y,
            )))
        }
    }
}

/// The axes to try splitting on, most promising first.
fn axis_order(x: Tile, y: Tile) -> [Axis; 2] {
    if y.rank() > x.rank() {
        [Axis::Y, Axis::X]
    } else {
        [Axis::X, Axis::Y]
    }
}

/// The tiles of a cell with `axis` narrowed to `tile`.
fn narrowed(axis: Axis, tile: Tile, (x, y): (Tile, Tile)) -> (Tile, Tile) {
    match axis {
        Axis::X => (tile, y),
        Axis::Y => (x, tile),
    }
}

/// Sort entries into those inside `low`, those inside `high` and those straddling both.
fn partition<K, S, V>(
    entries: impl IntoIterator<Item = Arc<Entry<K, S, V>>>,
    axis: Axis,
    low: Tile,
    high: Tile,
) -> (Entries<K, S, V>, Entries<K, S, V>, Entries<K, S, V>) {
    let mut lower = Vec::new();
    let mut upper = Vec::new();
    let mut straddling = Vec::new();
    for entry in entries {
        let tile = entry.tile(axis);
        if low.contains_tile(tile) {
            lower.push(entry);
        } else if high.contains_tile(tile) {
            upper.push(entry);
        } else {
            straddling.push(entry);
        }
    }
    (lower, upper, straddling)
}

impl<K, S, V> Leaf<K, S, V> {
    fn split(&self) -> Option<Page<K, S, V>> {
        for axis in axis_order(self.x, self.y) {
            let cell = (self.x, self.y);
            let Some((low, high)) = axis_tile(axis, cell).halves() else {
                continue;
            };
            let entries = self.entries.iter().cloned();
            let (lower, upper, lifted) = partition(entries, axis, low, high);
            if lower.is_empty() && upper.is_empty() {
                continue;
            }

            log::debug!(
                "split leaf of {} entries on {:?} at rank {}, lifting {}",
                self.entries.len(),
                axis,
                low.rank(),
                lifted.len()
            );
            let pages = vec![
                Arc::new(Page::Leaf(Leaf::new(lower, narrowed(axis, low, cell)))),
                Arc::new(Page::Leaf(Leaf::new(upper, narrowed(axis, high, cell)))),
            ];
            return Some(Page::Node(Node::new(pages, lifted, self.x, self.y)));
        }
        None
    }
}

impl<K, S, V> Node<K, S, V> {
    fn split(&self, config: &TreeConfig) -> Option<Page<K, S, V>> {
        self.refine().or_else(|| self.absorb(config))
    }

    /// Re-partition the children that straddle the halving line of this node's tile.
    fn refine(&self) -> Option<Page<K, S, V>> {
        for axis in axis_order(self.x, self.y) {
            let Some((low, high)) = axis_tile(axis, (self.x, self.y)).halves() else {
                continue;
            };
            let straddles = |page: &Arc<Page<K, S, V>>| {
                let tile = page.tile(axis);
                !tile.is_empty() && !low.contains_tile(tile) && !high.contains_tile(tile)
            };
            if !self.pages.iter().any(straddles) {
                continue;
            }

            let mut pages = Vec::with_capacity(self.pages.len() + 1);
            let mut lifted = self.lifted.clone();
            let mut refined = 0;
            for page in &self.pages {
                if !straddles(page) {
                    pages.push(page.clone());
                    continue;
                }
                let mut entries = Vec::with_capacity(page.span());
                page.collect_entries(&mut entries);
                let (lower, upper, straddling) = partition(entries, axis, low, high);
                lifted.extend(straddling);

                let cell = (page.x_tile(), page.y_tile());
                pages.push(Arc::new(Page::Leaf(Leaf::new(
                    lower,
                    narrowed(axis, low, cell),
                ))));
                pages.push(Arc::new(Page::Leaf(Leaf::new(
                    upper,
                    narrowed(axis, high, cell),
                ))));
                refined += 1;
            }

            log::debug!(
                "split node on {:?} at rank {}: refined {} of {} children, {} lifted",
                axis,
                low.rank(),
                refined,
                self.pages.len(),
                lifted.len()
            );
            return Some(Page::Node(Node::new(pages, lifted, self.x, self.y)));
        }
        None
    }

    /// Move lifted entries that fit a quadrant of this node's tile into new quadrant
    /// leaves, once there are more lifted entries than the threshold.
    fn absorb(&self, config: &TreeConfig) -> Option<Page<K, S, V>> {
        let overloaded = self.lifted.len() > config.split_threshold();
        if !overloaded || self.x.is_empty() || self.y.is_empty() {
            return None;
        }

        let xs = halves_or_whole(self.x);
        let ys = halves_or_whole(self.y);
        let quadrants: Vec<(Tile, Tile)> = ys
            .iter()
            .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
            .collect();

        let mut groups: Vec<Entries<K, S, V>> = vec![Vec::new(); quadrants.len()];
        let mut lifted = Vec::new();
        for entry in &self.lifted {
            let quadrant = quadrants.iter().position(|&(x, y)| {
                x.contains_tile(entry.x_tile()) && y.contains_tile(entry.y_tile())
            });
            match quadrant {
                Some(index) => groups[index].push(entry.clone()),
                None => lifted.push(entry.clone()),
            }
        }
        if lifted.len() == self.lifted.len() {
            return None;
        }

        let mut pages = self.pages.clone();
        for (cell, entries) in quadrants.into_iter().zip(groups) {
            if !entries.is_empty() {
                pages.push(Arc::new(Page::Leaf(Leaf::new(entries, cell))));
            }
        }
        log::debug!(
            "split node by absorbing {} lifted entries into quadrants",
            self.lifted.len() - lifted.len()
        );
        Some(Page::Node(Node::new(pages, lifted, self.x, self.y)))
    }
}

/// The tile of a cell on `axis`.
fn axis_tile(axis: Axis, (x, y): (Tile, Tile)) -> Tile {
    match axis {
        Axis::X => x,
        Axis::Y => y,
    }
}

fn halves_or_whole(tile: Tile) -> Vec<Tile> {
    match tile.halves() {
        Some((low, high)) => vec![low, high],
        None => vec![tile],
    }
}
