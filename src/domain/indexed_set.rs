//! Unordered set with O(1) insert, lookup, and removal.
//!
//! [`IndexedSet`] keeps its elements in a dense `Vec` plus a reverse
//! `HashMap` from element to position. Removal overwrites the removed slot
//! with the last element, re-points the moved element's index entry, and
//! truncates. Enumeration order is therefore insertion order only until
//! the first removal.

use std::collections::HashMap;
use std::hash::Hash;

/// Dense, enumerable set with swap-with-last removal.
///
/// Invariant: `items[index[x]] == x` for every `x` in the set.
#[derive(Debug, Clone)]
pub struct IndexedSet<T> {
    items: Vec<T>,
    index: HashMap<T, usize>,
}

impl<T: Clone + Eq + Hash> IndexedSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Appends `item` if absent. Returns `false` if it was already present.
    pub fn insert(&mut self, item: T) -> bool {
        if self.index.contains_key(&item) {
            return false;
        }
        self.index.insert(item.clone(), self.items.len());
        self.items.push(item);
        true
    }

    /// Removes `item` by swapping the last element into its slot.
    ///
    /// Returns `false` if the item was not present.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(pos) = self.index.remove(item) else {
            return false;
        };
        let last = self.items.len().saturating_sub(1);
        if pos != last {
            self.items.swap(pos, last);
            if let Some(moved) = self.items.get(pos) {
                self.index.insert(moved.clone(), pos);
            }
        }
        self.items.pop();
        true
    }

    /// Returns `true` if `item` is in the set.
    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Returns the position of `item` in the dense array.
    #[must_use]
    pub fn position(&self, item: &T) -> Option<usize> {
        self.index.get(item).copied()
    }

    /// Returns the element at `pos`.
    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&T> {
        self.items.get(pos)
    }

    /// Returns the last element of the dense array.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.items.last()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the set holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates in dense-array order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns the dense array.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }
}

impl<T: Clone + Eq + Hash> Default for IndexedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Clone + Eq + Hash> IntoIterator for &'a IndexedSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
