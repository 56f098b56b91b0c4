#![forbid(unsafe_code)]

//! The scrollable surface contract.
//!
//! A [`ScrollContainer`] is whatever actually scrolls: a DOM element behind
//! a bridge, a terminal viewport, or the in-memory
//! [`VirtualContainer`](crate::VirtualContainer). The engine reads offsets
//! and extents, issues positioning requests, and polls change notices once
//! per rendering pass.

use crate::track::Track;

/// How a positioning request moves the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollBehavior {
    /// Animated motion over several rendering passes.
    #[default]
    Smooth,
    /// Jump in a single step.
    Instant,
}

/// Whether the surface snaps to item boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SnapMode {
    /// Snapping and animated positioning are active.
    #[default]
    Mandatory,
    /// Snapping is off and every positioning request is instant.
    Suppressed,
}

/// Change notification produced by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerNotice {
    /// The scroll offset changed.
    Scrolled,
    /// The container or one of its children changed size, or a child was
    /// added.
    Resized,
}

/// A scrollable container of ordered items along one axis.
///
/// # Invariants
///
/// 1. `0 <= scroll_offset() <= max_offset()`.
/// 2. `child_count() == track().len()`.
/// 3. Reordering through [`track_mut`](Self::track_mut) becomes visible only
///    after [`commit_track`](Self::commit_track).
pub trait ScrollContainer {
    /// Current scroll offset in pixels.
    fn scroll_offset(&self) -> f64;

    /// Visible extent of the viewport.
    fn client_extent(&self) -> f64;

    /// Total scrollable extent of the content.
    fn scroll_extent(&self) -> f64;

    /// Largest reachable offset.
    fn max_offset(&self) -> f64 {
        (self.scroll_extent() - self.client_extent()).max(0.0)
    }

    /// Number of child items.
    fn child_count(&self) -> usize {
        self.track().len()
    }

    /// Extent of the child at display `position`, if any.
    fn child_extent(&self, position: usize) -> Option<f64>;

    /// Request a new offset. Targets outside `[0, max_offset]` are clamped.
    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior);

    fn snap(&self) -> SnapMode;

    fn set_snap(&mut self, mode: SnapMode);

    /// Display order of children.
    fn track(&self) -> &Track;

    /// Mutable display order. Call [`commit_track`](Self::commit_track) to
    /// apply it.
    fn track_mut(&mut self) -> &mut Track;

    /// Apply the pending display order.
    fn commit_track(&mut self);

    /// Progress any in-flight animated motion by one rendering pass.
    fn advance_frame(&mut self);

    /// Drain notices produced since the previous call.
    fn take_notices(&mut self) -> Vec<ContainerNotice>;

    /// Whether animated motion is still in flight.
    fn is_moving(&self) -> bool {
        false
    }
}
