#![forbid(unsafe_code)]

//! Endless wraparound by relocating boundary items.
//!
//! When the viewport comes within [`WRAP_THRESHOLD`] pixels of either end,
//! the item on the far side is moved next to the viewport and the offset is
//! shifted by one item, so the content under the viewport does not move.
//!
//! # Sequence
//!
//! 1. A `slide-pass` or `slide-stop` queues a boundary check for the next
//!    frame (at most one per frame).
//! 2. If the check finds a boundary, the wrap runs on the following frame.
//! 3. The wrap detaches scroll listeners, suppresses snapping, rotates the
//!    track, commits it, and shifts the offset instantly.
//! 4. A zero-delay timer restores snapping, re-attaches listeners and
//!    requests an index update.
//!
//! # Invariants
//!
//! 1. Rotations preserve the cyclic order of items.
//! 2. The offset shift equals exactly one item size, so the visual position
//!    is continuous.
//! 3. No wrap happens with fewer than [`MIN_LOOP_ITEMS`] items.
//! 4. After `disable`, the track is canonical and snapping is mandatory.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Fewer than 3 items | Checks never wrap |
//! | Item size 0 | Checks never wrap |
//! | Compensated offset lands on the opposite boundary | Wrap skipped (no ping-pong) |
//! | Offset moved away between check and wrap | Wrap skipped |

use std::time::Duration;

use snapslide_core::{
    FrameHandle, ScrollBehavior, ScrollContainer, SlideEvent, SlideEventKind, SnapMode, TimerSlot,
};
use snapslide_runtime::{Plugin, PluginId, SliderContext, Wake};

use crate::LOOP_PLUGIN_ID;

/// Distance from an end, in pixels, at which a wrap triggers.
pub const WRAP_THRESHOLD: f64 = 5.0;

/// Fewest items for which wrapping is well defined.
pub const MIN_LOOP_ITEMS: usize = 3;

const CHECK: u32 = 1;
const WRAP_END_TO_START: u32 = 2;
const WRAP_START_TO_END: u32 = 3;
const RESNAP: u32 = 4;

/// Which way items move during a wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapDirection {
    /// Near the start: the last item moves to the front, offset grows.
    EndToStart,
    /// Near the end: the first item moves to the back, offset shrinks.
    StartToEnd,
}

impl WrapDirection {
    const fn token(self) -> u32 {
        match self {
            Self::EndToStart => WRAP_END_TO_START,
            Self::StartToEnd => WRAP_START_TO_END,
        }
    }

    const fn from_token(token: u32) -> Option<Self> {
        match token {
            WRAP_END_TO_START => Some(Self::EndToStart),
            WRAP_START_TO_END => Some(Self::StartToEnd),
            _ => None,
        }
    }
}

/// Decide whether the viewport sits close enough to an end to wrap.
///
/// A wrap is refused when the shifted offset would itself be within the
/// threshold of the opposite end, which happens when the container has
/// less than about two items of scroll range.
#[must_use]
pub fn boundary_wrap(
    offset: f64,
    client_extent: f64,
    scroll_extent: f64,
    item_size: f64,
    count: usize,
) -> Option<WrapDirection> {
    if count < MIN_LOOP_ITEMS || !item_size.is_finite() || item_size <= 0.0 || !offset.is_finite() {
        return None;
    }
    let to_end = |offset: f64| scroll_extent - offset - client_extent;

    if offset < WRAP_THRESHOLD {
        let shifted = offset + item_size;
        return (to_end(shifted) >= WRAP_THRESHOLD).then_some(WrapDirection::EndToStart);
    }
    if to_end(offset) < WRAP_THRESHOLD {
        let shifted = offset - item_size;
        return (shifted >= WRAP_THRESHOLD).then_some(WrapDirection::StartToEnd);
    }
    None
}

fn boundary_of<C: ScrollContainer>(ctx: &SliderContext<C>) -> Option<WrapDirection> {
    let container = ctx.container();
    boundary_wrap(
        container.scroll_offset(),
        container.client_extent(),
        container.scroll_extent(),
        ctx.item_size(),
        container.child_count(),
    )
}

/// Infinite-loop plugin. Takes no parameters.
#[derive(Debug, Default)]
pub struct LoopPlugin {
    enabled: bool,
    check: Option<FrameHandle>,
    wrap: Option<FrameHandle>,
    resnap: TimerSlot,
    wraps: u64,
}

impl LoopPlugin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Wraps performed so far.
    #[inline]
    #[must_use]
    pub fn wrap_count(&self) -> u64 {
        self.wraps
    }

    /// Whether snapping is currently suppressed by a wrap.
    #[inline]
    #[must_use]
    pub fn is_resnapping(&self) -> bool {
        !self.resnap.is_idle()
    }

    fn schedule_check<C: ScrollContainer>(&mut self, ctx: &mut SliderContext<C>) {
        if self.check.is_none() {
            self.check = ctx.request_frame(LOOP_PLUGIN_ID, CHECK);
        }
    }

    fn cancel_frames<C: ScrollContainer>(&mut self, ctx: &mut SliderContext<C>) {
        if let Some(handle) = self.check.take() {
            ctx.cancel_frame(handle);
        }
        if let Some(handle) = self.wrap.take() {
            ctx.cancel_frame(handle);
        }
    }

    fn run_check<C: ScrollContainer>(&mut self, ctx: &mut SliderContext<C>) {
        if self.wrap.is_some() || !self.resnap.is_idle() {
            return;
        }
        if let Some(direction) = boundary_of(ctx) {
            self.wrap = ctx.request_frame(LOOP_PLUGIN_ID, direction.token());
        }
    }

    fn run_wrap<C: ScrollContainer>(&mut self, ctx: &mut SliderContext<C>, direction: WrapDirection) {
        if boundary_of(ctx) != Some(direction) {
            return;
        }
        let item_size = ctx.item_size();

        ctx.detach_listeners();
        let container = ctx.container_mut();
        container.set_snap(SnapMode::Suppressed);
        let shift = match direction {
            WrapDirection::EndToStart => {
                container.track_mut().move_last_to_first();
                item_size
            }
            WrapDirection::StartToEnd => {
                container.track_mut().move_first_to_last();
                -item_size
            }
        };
        container.commit_track();
        let offset = container.scroll_offset() + shift;
        container.scroll_to(offset, ScrollBehavior::Instant);

        self.wraps += 1;
        tracing::debug!(
            plugin = LOOP_PLUGIN_ID,
            direction = ?direction,
            offset,
            wraps = self.wraps,
            "Wrapped"
        );

        ctx.cancel_timer(&mut self.resnap);
        self.resnap = ctx.set_timeout(LOOP_PLUGIN_ID, Duration::ZERO, RESNAP);
    }

    fn restore_snap<C: ScrollContainer>(ctx: &mut SliderContext<C>) {
        ctx.container_mut().set_snap(SnapMode::Mandatory);
        ctx.attach_listeners();
        ctx.update();
    }
}

impl<C: ScrollContainer + 'static> Plugin<C> for LoopPlugin {
    fn id(&self) -> PluginId {
        LOOP_PLUGIN_ID
    }

    fn enable(&mut self, ctx: &mut SliderContext<C>) {
        self.cancel_frames(ctx);
        ctx.subscribe(LOOP_PLUGIN_ID, SlideEventKind::Pass);
        ctx.subscribe(LOOP_PLUGIN_ID, SlideEventKind::Stop);
        self.enabled = true;
        self.schedule_check(ctx);
    }

    fn disable(&mut self, ctx: &mut SliderContext<C>) {
        ctx.unsubscribe(LOOP_PLUGIN_ID, SlideEventKind::Pass);
        ctx.unsubscribe(LOOP_PLUGIN_ID, SlideEventKind::Stop);
        self.cancel_frames(ctx);
        if ctx.cancel_timer(&mut self.resnap) {
            Self::restore_snap(ctx);
        }
        if !self.enabled {
            return;
        }
        self.enabled = false;

        let container = ctx.container_mut();
        if container.track_mut().restore_canonical() {
            container.commit_track();
        }
        ctx.update();
    }

    fn on_event(&mut self, ctx: &mut SliderContext<C>, _event: SlideEvent) {
        if self.enabled {
            self.schedule_check(ctx);
        }
    }

    fn on_wake(&mut self, ctx: &mut SliderContext<C>, wake: Wake) {
        match wake.token {
            CHECK if wake.frame().is_some() && wake.frame() == self.check => {
                self.check = None;
                self.run_check(ctx);
            }
            RESNAP if wake.timer().is_some_and(|id| self.resnap.matches(id)) => {
                self.resnap.take();
                Self::restore_snap(ctx);
            }
            token => {
                if let Some(direction) = WrapDirection::from_token(token)
                    && wake.frame().is_some()
                    && wake.frame() == self.wrap
                {
                    self.wrap = None;
                    self.run_wrap(ctx, direction);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snapslide_core::VirtualContainer;
    use snapslide_runtime::{Slider, SliderOptions};

    const FRAME: Duration = Duration::from_millis(16);

    fn looped(count: usize, slide: usize) -> Slider<VirtualContainer> {
        let mut slider = Slider::new(
            VirtualContainer::uniform(200.0, 200.0, count).with_glide_frames(4),
            SliderOptions::default().with_slide(slide),
        );
        slider.register(Box::new(LoopPlugin::new()), true);
        slider
    }

    fn settle(slider: &mut Slider<VirtualContainer>) {
        for _ in 0..300 {
            slider.step(FRAME);
            if slider.is_idle() {
                return;
            }
        }
    }

    #[test]
    fn boundary_detection() {
        // 5 items of 200 in a 200 viewport: max offset 800.
        let wrap = |offset| boundary_wrap(offset, 200.0, 1000.0, 200.0, 5);
        assert_eq!(wrap(0.0), Some(WrapDirection::EndToStart));
        assert_eq!(wrap(4.9), Some(WrapDirection::EndToStart));
        assert_eq!(wrap(5.0), None);
        assert_eq!(wrap(400.0), None);
        assert_eq!(wrap(795.1), Some(WrapDirection::StartToEnd));
        assert_eq!(wrap(800.0), Some(WrapDirection::StartToEnd));
    }

    #[test]
    fn boundary_requires_three_items_and_a_size() {
        assert_eq!(boundary_wrap(0.0, 200.0, 400.0, 200.0, 2), None);
        assert_eq!(boundary_wrap(0.0, 200.0, 600.0, 0.0, 3), None);
        assert_eq!(boundary_wrap(f64::NAN, 200.0, 600.0, 200.0, 3), None);
    }

    #[test]
    fn boundary_refuses_ping_pong() {
        // Three items fill the viewport: no scroll range at all.
        assert_eq!(boundary_wrap(0.0, 600.0, 600.0, 200.0, 3), None);
        // One item of range: shifting would land on the other end.
        assert_eq!(boundary_wrap(0.0, 400.0, 600.0, 200.0, 3), None);
        assert_eq!(boundary_wrap(200.0, 400.0, 600.0, 200.0, 3), None);
        // Two items of range is enough.
        assert_eq!(
            boundary_wrap(0.0, 200.0, 600.0, 200.0, 3),
            Some(WrapDirection::EndToStart)
        );
    }

    #[test]
    fn enabling_at_start_wraps_once() {
        let mut slider = looped(4, 0);
        settle(&mut slider);
        assert_eq!(slider.container().display_order(), &[3, 0, 1, 2]);
        assert_eq!(slider.container().scroll_offset(), 200.0);
        assert_eq!(slider.slide(), 1);
        assert_eq!(slider.container().snap(), SnapMode::Mandatory);
        assert!(slider.is_listening());
        let plugin = slider.plugin_as::<LoopPlugin>(LOOP_PLUGIN_ID).unwrap();
        assert_eq!(plugin.wrap_count(), 1);
        assert!(!plugin.is_resnapping());
        // The wrap itself is silent.
        assert!(slider.drain_events().is_empty());
    }

    #[test]
    fn no_wrap_with_two_items() {
        let mut slider = looped(2, 0);
        settle(&mut slider);
        assert_eq!(slider.container().display_order(), &[0, 1]);
        assert_eq!(slider.container().commit_count(), 0);
    }

    #[test]
    fn forward_past_end_moves_first_to_back() {
        let mut slider = looped(5, 2);
        settle(&mut slider);
        assert_eq!(slider.container().display_order(), &[0, 1, 2, 3, 4]);

        slider.slide_to(4);
        settle(&mut slider);
        assert_eq!(slider.container().display_order(), &[1, 2, 3, 4, 0]);
        assert_eq!(slider.container().scroll_offset(), 600.0);
        assert_eq!(slider.slide(), 3);
        // Item 4 is still the one in view.
        assert_eq!(slider.container().track().original_at(slider.slide()), Some(4));
    }

    #[test]
    fn disable_restores_canonical_order() {
        let mut slider = looped(4, 0);
        settle(&mut slider);
        assert!(!slider.container().track().is_canonical());

        assert!(slider.disable_plugin(LOOP_PLUGIN_ID));
        settle(&mut slider);
        assert!(slider.container().track().is_canonical());
        assert!(!slider.plugin_as::<LoopPlugin>(LOOP_PLUGIN_ID).unwrap().is_enabled());

        let commits = slider.container().commit_count();
        assert!(slider.disable_plugin(LOOP_PLUGIN_ID));
        settle(&mut slider);
        assert_eq!(slider.container().commit_count(), commits);
    }

    #[test]
    fn disable_mid_wrap_restores_snapping() {
        let mut slider = looped(4, 0);
        // Measure, check, wrap: the resnap timer is now pending.
        slider.frame();
        slider.frame();
        slider.frame();
        assert_eq!(slider.container().snap(), SnapMode::Suppressed);
        assert!(!slider.is_listening());

        slider.disable_plugin(LOOP_PLUGIN_ID);
        assert_eq!(slider.container().snap(), SnapMode::Mandatory);
        assert!(slider.is_listening());
        settle(&mut slider);
        assert!(slider.container().track().is_canonical());
    }

    #[test]
    fn repeated_enable_does_not_duplicate_checks() {
        let mut slider = looped(5, 2);
        slider.enable_plugin(LOOP_PLUGIN_ID);
        slider.enable_plugin(LOOP_PLUGIN_ID);
        settle(&mut slider);
        assert_eq!(
            slider
                .plugin_as::<LoopPlugin>(LOOP_PLUGIN_ID)
                .unwrap()
                .wrap_count(),
            0
        );
    }
}
