//! Lazy range queries over a page tree.

use std::slice;
use std::sync::Arc;

use tinyvec::TinyVec;

use crate::qtree::entry::Entry;
use crate::qtree::page::Page;
use crate::qtree::shape::ShapeForm;
use crate::tile::TileRect;

/// An iterator over the entries matching a range query.
///
/// Created by [`Page::search`] and [`QTree::search`][crate::qtree::QTree::search]. The
/// traversal is depth first and holds no lookahead: each call to `next` resumes where the
/// previous one stopped. Children whose tiles miss the query rectangle are
/// skipped without being visited.
pub struct Search<'a, K, S, V, F> {
    rect: TileRect,
    form: &'a F,
    /// Entries of the page being visited that have not been tested yet.
    entries: slice::Iter<'a, Arc<Entry<K, S, V>>>,
    /// For every node on the current path, the children still to visit.
    // Use TinyVec to avoid heap allocations for trees up to 32 pages deep
    stack: TinyVec<[slice::Iter<'a, Arc<Page<K, S, V>>>; 32]>,
}

impl<'a, K, S, V, F: ShapeForm<S>> Search<'a, K, S, V, F> {
    pub(crate) fn new(page: &'a Page<K, S, V>, rect: TileRect, form: &'a F) -> Self {
        let mut search = Self {
            rect,
            form,
            entries: Default::default(),
            stack: TinyVec::new(),
        };
        if rect.intersects_tiles(page.x_tile(), page.y_tile()) {
            search.enter(page);
        }
        search
    }

    /// The query rectangle.
    pub fn rect(&self) -> TileRect {
        self.rect
    }

    fn enter(&mut self, page: &'a Page<K, S, V>) {
        match page {
            Page::Leaf(leaf) => self.entries = leaf.entries.iter(),
            Page::Node(node) => {
                self.entries = node.lifted.iter();
                self.stack.push(node.pages.iter());
            }
        }
    }
}

#[inline]
fn accepts<K, S, V, F: ShapeForm<S>>(rect: &TileRect, form: &F, entry: &Entry<K, S, V>) -> bool {
    rect.intersects_tiles(entry.x_tile(), entry.y_tile())
        && entry
            .shape()
            .map_or(true, |shape| form.accepts(shape, rect))
}

impl<'a, K, S, V, F: ShapeForm<S>> Iterator for Search<'a, K, S, V, F> {
    type Item = &'a Entry<K, S, V>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            for entry in self.entries.by_ref() {
                if accepts(&self.rect, self.form, entry) {
                    return Some(entry.as_ref());
                }
            }

            let next = match self.stack.last_mut() {
                Some(pages) => pages.next(),
                None => return None,
            };
            match next {
                Some(page) => {
                    if self.rect.intersects_tiles(page.x_tile(), page.y_tile()) {
                        self.enter(page);
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
