#![forbid(unsafe_code)]

//! Display order of carousel items.
//!
//! A [`Track`] stores, for every display position, the item's original
//! index. The original index is the stable per-item marker that lets a
//! reordered track return to its canonical order.
//!
//! # Invariants
//!
//! 1. `order` is always a permutation of `0..len`.
//! 2. The rotations preserve the cyclic order of items.

/// Ordered sequence of item indices in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Track {
    order: Vec<usize>,
}

impl Track {
    /// Canonical track of `len` items.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            order: (0..len).collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Original indices in display order.
    #[inline]
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Original index of the item shown at `position`.
    #[must_use]
    pub fn original_at(&self, position: usize) -> Option<usize> {
        self.order.get(position).copied()
    }

    /// Display position of the item with original index `original`.
    #[must_use]
    pub fn position_of(&self, original: usize) -> Option<usize> {
        self.order.iter().position(|&o| o == original)
    }

    /// Append a new item, returning its original index.
    pub fn push(&mut self) -> usize {
        let original = self.order.len();
        self.order.push(original);
        original
    }

    /// Move the first item to the back. No-op below two items.
    pub fn move_first_to_last(&mut self) -> bool {
        if self.order.len() < 2 {
            return false;
        }
        self.order.rotate_left(1);
        true
    }

    /// Move the last item to the front. No-op below two items.
    pub fn move_last_to_first(&mut self) -> bool {
        if self.order.len() < 2 {
            return false;
        }
        self.order.rotate_right(1);
        true
    }

    /// Sort items back into original order. Returns whether anything moved.
    pub fn restore_canonical(&mut self) -> bool {
        if self.is_canonical() {
            return false;
        }
        self.order.sort_unstable();
        true
    }

    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.order.iter().enumerate().all(|(pos, &o)| pos == o)
    }
}
