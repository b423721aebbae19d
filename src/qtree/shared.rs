//! Publishing the current version of a tree to concurrent readers and writers.

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::error::{QTreeError, Result};
use crate::qtree::tree::QTree;

/// A cell holding the current version of a [`QTree`].
///
/// Readers take snapshots with [`SharedQTree::load`] and traverse them without holding
/// any lock; snapshots stay valid however the cell changes afterwards. Writers either
/// run a read-modify-publish step that excludes other writers with
/// [`SharedQTree::update`], or build a new version from a snapshot and publish it with
/// [`SharedQTree::compare_and_swap`], which fails if another writer published first.
///
/// ```
/// use geo_qtree::qtree::{QTree, SharedQTree};
///
/// let tree: QTree<u32, (), &str> = QTree::default();
/// let shared = SharedQTree::new(tree);
/// shared.update(|tree| tree.insert_point(1, 10, 10, "a"));
///
/// let snapshot = shared.load();
/// let mut next = snapshot.clone();
/// next.insert_point(2, 20, 20, "b");
/// shared.compare_and_swap(&snapshot, next).unwrap();
///
/// // The snapshot is stale now.
/// assert!(shared.compare_and_swap(&snapshot, snapshot.clone()).is_err());
/// assert_eq!(shared.load().len(), 2);
/// ```
#[derive(Debug)]
pub struct SharedQTree<K, S, V, F> {
    current: RwLock<QTree<K, S, V, F>>,
}

impl<K, S, V, F: Clone> SharedQTree<K, S, V, F> {
    /// Create a cell publishing `tree`.
    pub fn new(tree: QTree<K, S, V, F>) -> Self {
        Self {
            current: RwLock::new(tree),
        }
    }

    /// A snapshot of the current version.
    pub fn load(&self) -> QTree<K, S, V, F> {
        self.current.read().clone()
    }

    /// Publish `tree` unconditionally.
    pub fn store(&self, tree: QTree<K, S, V, F>) {
        *self.current.write() = tree;
        log::trace!("published new root unconditionally");
    }

    /// Publish `tree` only if the current version still shares its root with `expected`.
    ///
    /// Returns [`QTreeError::StaleRoot`] without publishing if another version was
    /// published since `expected` was loaded.
    pub fn compare_and_swap(
        &self,
        expected: &QTree<K, S, V, F>,
        tree: QTree<K, S, V, F>,
    ) -> Result<()> {
        let mut current = self.current.write();
        if !current.ptr_eq(expected) {
            log::trace!("rejected publish from a stale root");
            return Err(QTreeError::StaleRoot);
        }
        *current = tree;
        log::trace!("published new root");
        Ok(())
    }

    /// Apply `f` to the current version and publish the result, excluding other writers
    /// for the duration.
    ///
    /// Readers keep seeing the previous version until `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut QTree<K, S, V, F>) -> R) -> R {
        let current = self.current.upgradable_read();
        let mut next = current.clone();
        let result = f(&mut next);
        *RwLockUpgradableReadGuard::upgrade(current) = next;
        log::trace!("published updated root");
        result
    }

    /// Consume the cell, returning the current version.
    pub fn into_inner(self) -> QTree<K, S, V, F> {
        self.current.into_inner()
    }
}
