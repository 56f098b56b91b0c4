#![forbid(unsafe_code)]

//! In-memory [`ScrollContainer`] for hosts without a real surface and for
//! tests.
//!
//! Smooth requests glide over a fixed number of rendering passes with an
//! ease-out cubic curve. Snapping is modelled by [`VirtualContainer::release`],
//! which the host calls when a simulated drag ends.

use crate::container::{ContainerNotice, ScrollBehavior, ScrollContainer, SnapMode};
use crate::track::Track;

/// Offsets closer than this are considered equal.
const EPS: f64 = 1e-6;

/// Default length of a smooth glide, in rendering passes.
pub const DEFAULT_GLIDE_FRAMES: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Glide {
    from: f64,
    to: f64,
    frame: u32,
    frames: u32,
}

impl Glide {
    fn offset_at(&self, frame: u32) -> f64 {
        let t = (f64::from(frame) / f64::from(self.frames)).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * ease_out_cubic(t)
    }
}

#[inline]
fn ease_out_cubic(t: f64) -> f64 {
    1.0 - (1.0 - t).powi(3)
}

fn sanitize(extent: f64) -> f64 {
    if extent.is_finite() && extent > 0.0 {
        extent
    } else {
        0.0
    }
}

/// Simulated horizontal scroller.
#[derive(Debug, Clone)]
pub struct VirtualContainer {
    client_extent: f64,
    /// Extents keyed by original index.
    extents: Vec<f64>,
    /// Pending order, edited through `track_mut`.
    track: Track,
    /// Order the viewport shows; replaced by `commit_track`.
    displayed: Track,
    offset: f64,
    snap: SnapMode,
    glide: Option<Glide>,
    glide_frames: u32,
    notices: Vec<ContainerNotice>,
    commits: usize,
}

impl VirtualContainer {
    /// Container with one item per entry of `extents`.
    #[must_use]
    pub fn new(client_extent: f64, extents: Vec<f64>) -> Self {
        let extents: Vec<f64> = extents.into_iter().map(sanitize).collect();
        Self {
            client_extent: sanitize(client_extent),
            track: Track::new(extents.len()),
            displayed: Track::new(extents.len()),
            extents,
            offset: 0.0,
            snap: SnapMode::Mandatory,
            glide: None,
            glide_frames: DEFAULT_GLIDE_FRAMES,
            notices: Vec::new(),
            commits: 0,
        }
    }

    /// `count` items of `item_extent` each.
    #[must_use]
    pub fn uniform(client_extent: f64, item_extent: f64, count: usize) -> Self {
        Self::new(client_extent, vec![item_extent; count])
    }

    /// Container without children.
    #[must_use]
    pub fn empty(client_extent: f64) -> Self {
        Self::new(client_extent, Vec::new())
    }

    /// Glide length for smooth requests. `0` makes every request instant.
    #[must_use]
    pub fn with_glide_frames(mut self, frames: u32) -> Self {
        self.glide_frames = frames;
        self
    }

    fn notify(&mut self, notice: ContainerNotice) {
        if !self.notices.contains(&notice) {
            self.notices.push(notice);
        }
    }

    fn set_offset(&mut self, offset: f64) {
        let clamped = if offset.is_finite() {
            offset.clamp(0.0, self.max_offset())
        } else {
            self.offset
        };
        if (clamped - self.offset).abs() > EPS {
            self.offset = clamped;
            self.notify(ContainerNotice::Scrolled);
        }
    }

    /// User-driven movement (drag, wheel). Cancels any glide.
    pub fn scroll_by(&mut self, delta: f64) {
        self.glide = None;
        self.set_offset(self.offset + delta);
    }

    /// End of a user gesture: snap to the nearest item boundary.
    ///
    /// The first item's extent is the snap grid. Does nothing while snapping
    /// is suppressed.
    pub fn release(&mut self) {
        if self.snap == SnapMode::Suppressed {
            return;
        }
        let Some(item) = self.child_extent(0).filter(|e| *e > 0.0) else {
            return;
        };
        let target = (self.offset / item).round() * item;
        self.scroll_to(target, ScrollBehavior::Smooth);
    }

    pub fn set_client_extent(&mut self, extent: f64) {
        self.client_extent = sanitize(extent);
        self.notify(ContainerNotice::Resized);
        self.set_offset(self.offset);
    }

    /// Resize the item with original index `original`.
    pub fn set_item_extent(&mut self, original: usize, extent: f64) {
        if let Some(slot) = self.extents.get_mut(original) {
            *slot = sanitize(extent);
            self.notify(ContainerNotice::Resized);
            self.set_offset(self.offset);
        }
    }

    /// Append a child, returning its original index.
    pub fn push_item(&mut self, extent: f64) -> usize {
        self.extents.push(sanitize(extent));
        self.notify(ContainerNotice::Resized);
        self.displayed.push();
        self.track.push()
    }

    /// How many times the display order has been committed.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Original indices in the committed display order.
    #[must_use]
    pub fn display_order(&self) -> &[usize] {
        self.displayed.order()
    }

    /// Whether `track_mut` edits are waiting for `commit_track`.
    #[must_use]
    pub fn has_pending_order(&self) -> bool {
        self.track != self.displayed
    }
}

impl ScrollContainer for VirtualContainer {
    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn client_extent(&self) -> f64 {
        self.client_extent
    }

    fn scroll_extent(&self) -> f64 {
        self.extents.iter().sum::<f64>().max(self.client_extent)
    }

    fn child_extent(&self, position: usize) -> Option<f64> {
        self.displayed
            .original_at(position)
            .and_then(|original| self.extents.get(original).copied())
    }

    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior) {
        let instant = behavior == ScrollBehavior::Instant
            || self.snap == SnapMode::Suppressed
            || self.glide_frames == 0;
        if instant || !offset.is_finite() {
            self.glide = None;
            self.set_offset(offset);
            return;
        }
        let to = offset.clamp(0.0, self.max_offset());
        if (to - self.offset).abs() <= EPS {
            self.glide = None;
            return;
        }
        self.glide = Some(Glide {
            from: self.offset,
            to,
            frame: 0,
            frames: self.glide_frames,
        });
    }

    fn snap(&self) -> SnapMode {
        self.snap
    }

    fn set_snap(&mut self, mode: SnapMode) {
        self.snap = mode;
    }

    fn track(&self) -> &Track {
        &self.track
    }

    fn track_mut(&mut self) -> &mut Track {
        &mut self.track
    }

    fn commit_track(&mut self) {
        self.displayed.clone_from(&self.track);
        self.commits += 1;
    }

    fn advance_frame(&mut self) {
        let Some(mut glide) = self.glide.take() else {
            return;
        };
        glide.frame += 1;
        let next = if glide.frame >= glide.frames {
            glide.to
        } else {
            let next = glide.offset_at(glide.frame);
            self.glide = Some(glide);
            next
        };
        self.set_offset(next);
    }

    fn take_notices(&mut self) -> Vec<ContainerNotice> {
        std::mem::take(&mut self.notices)
    }

    fn is_moving(&self) -> bool {
        self.glide.is_some()
    }
}
