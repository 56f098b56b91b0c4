#![forbid(unsafe_code)]

//! Engine state shared with plugins.
//!
//! [`SliderContext`] owns the container, the scheduler, the slide state and
//! the subscription tables. The [`Slider`](crate::Slider) owns a context and
//! the plugin registry side by side, which lets it lend `&mut SliderContext`
//! to one plugin at a time.
//!
//! Everything that moves the carousel is deferred: `update`, `slide_to`,
//! scroll ticks and measurements run on the next frame, and gesture
//! settlement runs on a timer. Plugins observe the results through
//! subscriptions, which are delivered after the task that emitted them.
//!
//! # Invariants
//!
//! 1. `item_size` is `0.0` or finite and strictly positive.
//! 2. Once `item_size > 0`, `slide < child_count` (or `0` when empty).
//! 3. At most one settle timer is pending (the `debounce` slot).
//! 4. After destroy, every write is a no-op.

use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use snapslide_core::{
    FrameHandle, InteractionKind, Scheduler, ScrollBehavior, ScrollContainer, SlideEvent,
    SlideEventKind, TimerId, TimerSlot,
};

use crate::options::{Rounding, RoundingFn, SizingMethod, SliderOptions};
use crate::plugin::PluginId;

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Deferred engine work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EngineTask {
    /// Re-run the sizing method, then update.
    Measure,
    /// Recompute the slide index from the offset.
    Update,
    /// Process one scroll notification.
    ScrollTick,
    /// The settle timer fired.
    ScrollEnd,
    /// Smoothly scroll to a slide.
    SlideTo(usize),
}

/// Anything the scheduler can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Task {
    Engine(EngineTask),
    Plugin { owner: PluginId, token: u32 },
}

/// A pending delivery to one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Event {
        plugin: PluginId,
        event: SlideEvent,
    },
    Interaction {
        plugin: PluginId,
        kind: InteractionKind,
    },
}

#[inline]
fn sanitize_size(size: f64) -> f64 {
    if size.is_finite() && size > 0.0 {
        size
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// SliderContext
// ---------------------------------------------------------------------------

/// Engine state and the operations plugins may perform on it.
pub struct SliderContext<C> {
    container: C,
    pub(crate) scheduler: Scheduler<Task>,
    slide: usize,
    item_size: f64,
    rounding: Rounding,
    rounding_fn: Option<RoundingFn>,
    sizing: SizingMethod<C>,
    scroll_timeout: Duration,
    snapped_offset: f64,
    debounce: TimerSlot,
    listening: bool,
    /// A settle timer was cancelled by `detach_listeners` mid-gesture.
    interrupted: bool,
    destroyed: bool,
    pub(crate) registered: BTreeSet<PluginId>,
    event_subs: Vec<(PluginId, SlideEventKind)>,
    interaction_subs: Vec<(PluginId, InteractionKind)>,
    pub(crate) dispatch: VecDeque<Dispatch>,
    pub(crate) outbox: Vec<SlideEvent>,
}

impl<C: ScrollContainer> SliderContext<C> {
    pub(crate) fn new(container: C, options: SliderOptions<C>) -> Self {
        let SliderOptions {
            config,
            sizing,
            rounding_fn,
        } = options;
        let mut ctx = Self {
            container,
            scheduler: Scheduler::new(),
            slide: config.slide,
            item_size: 0.0,
            rounding: config.rounding,
            rounding_fn,
            sizing,
            scroll_timeout: config.scroll_timeout,
            snapped_offset: 0.0,
            debounce: TimerSlot::Idle,
            listening: true,
            interrupted: false,
            destroyed: false,
            registered: BTreeSet::new(),
            event_subs: Vec::new(),
            interaction_subs: Vec::new(),
            dispatch: VecDeque::new(),
            outbox: Vec::new(),
        };
        ctx.item_size = sanitize_size(ctx.sizing.measure(&ctx.container));
        if ctx.slide > 0 && ctx.item_size > 0.0 {
            let offset = ctx.slide as f64 * ctx.item_size;
            ctx.container.scroll_to(offset, ScrollBehavior::Instant);
            ctx.container.take_notices();
        }
        ctx.snapped_offset = ctx.slide as f64 * ctx.item_size;
        ctx.scheduler.request_frame(Task::Engine(EngineTask::Measure));
        ctx
    }

    // --- Read ---

    /// Current slide index.
    #[inline]
    #[must_use]
    pub fn slide(&self) -> usize {
        self.slide
    }

    /// Measured item size; `0.0` until measured.
    #[inline]
    #[must_use]
    pub fn item_size(&self) -> f64 {
        self.item_size
    }

    #[inline]
    #[must_use]
    pub fn scroll_timeout(&self) -> Duration {
        self.scroll_timeout
    }

    /// Offset of the slide the index was last snapped to.
    #[inline]
    #[must_use]
    pub fn snapped_offset(&self) -> f64 {
        self.snapped_offset
    }

    #[inline]
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Whether a gesture is in progress (its settle timer is pending).
    #[inline]
    #[must_use]
    pub fn is_settling(&self) -> bool {
        self.debounce.is_scheduled()
    }

    #[inline]
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether a plugin with this identity is registered.
    #[must_use]
    pub fn has_plugin(&self, id: PluginId) -> bool {
        self.registered.contains(id)
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &C {
        &self.container
    }

    #[inline]
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// Current scheduler time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    // --- Engine commands ---

    /// Recompute the slide index on the next frame.
    pub fn update(&mut self) {
        if self.destroyed {
            return;
        }
        self.scheduler.request_frame(Task::Engine(EngineTask::Update));
    }

    /// Smoothly scroll to `index` on the next frame.
    ///
    /// The index is not validated; the container clamps the offset.
    pub fn slide_to(&mut self, index: usize) {
        if self.destroyed {
            return;
        }
        self.scheduler
            .request_frame(Task::Engine(EngineTask::SlideTo(index)));
    }

    /// Resume scroll observation.
    ///
    /// A gesture whose settle timer was cancelled by
    /// [`detach_listeners`](Self::detach_listeners) gets a fresh one, so it
    /// still ends with exactly one `slide-stop`.
    pub fn attach_listeners(&mut self) {
        if self.destroyed {
            return;
        }
        self.listening = true;
        if std::mem::take(&mut self.interrupted) {
            self.arm_settle_timer();
        }
    }

    /// Suspend scroll observation and cancel a pending settle timer.
    pub fn detach_listeners(&mut self) {
        if self.destroyed {
            return;
        }
        self.listening = false;
        if self.debounce.cancel(&mut self.scheduler) {
            self.interrupted = true;
        }
    }

    // --- Subscriptions ---

    /// Deliver slide events of `kind` to `owner`. Idempotent.
    pub fn subscribe(&mut self, owner: PluginId, kind: SlideEventKind) {
        if self.destroyed || self.event_subs.contains(&(owner, kind)) {
            return;
        }
        self.event_subs.push((owner, kind));
    }

    pub fn unsubscribe(&mut self, owner: PluginId, kind: SlideEventKind) {
        self.event_subs.retain(|sub| *sub != (owner, kind));
    }

    /// Deliver interactions of `kind` to `owner`. Idempotent.
    ///
    /// Custom names are normalized, so `Other("MouseDown")` and
    /// `Other("mousedown")` are the same subscription.
    pub fn listen_interaction(&mut self, owner: PluginId, kind: InteractionKind) {
        let kind = kind.normalized();
        if self.destroyed || self.is_listening_for(owner, &kind) {
            return;
        }
        self.interaction_subs.push((owner, kind));
    }

    pub fn unlisten_interaction(&mut self, owner: PluginId, kind: &InteractionKind) {
        let kind = kind.clone().normalized();
        self.interaction_subs
            .retain(|(o, k)| !(*o == owner && *k == kind));
    }

    /// Whether `owner` is subscribed to slide events of `kind`.
    #[must_use]
    pub fn is_subscribed(&self, owner: PluginId, kind: SlideEventKind) -> bool {
        self.event_subs.contains(&(owner, kind))
    }

    /// Whether `owner` listens for interactions of `kind`.
    #[must_use]
    pub fn is_listening_for(&self, owner: PluginId, kind: &InteractionKind) -> bool {
        let kind = kind.clone().normalized();
        self.interaction_subs
            .iter()
            .any(|(o, k)| *o == owner && *k == kind)
    }

    // --- Plugin scheduling ---

    /// Wake `owner` with `token` on the next frame.
    pub fn request_frame(&mut self, owner: PluginId, token: u32) -> Option<FrameHandle> {
        if self.destroyed {
            return None;
        }
        Some(self.scheduler.request_frame(Task::Plugin { owner, token }))
    }

    pub fn cancel_frame(&mut self, handle: FrameHandle) -> bool {
        self.scheduler.cancel_frame(handle)
    }

    /// Wake `owner` with `token` once, after `delay`.
    pub fn set_timeout(&mut self, owner: PluginId, delay: Duration, token: u32) -> TimerSlot {
        if self.destroyed {
            return TimerSlot::Idle;
        }
        TimerSlot::Scheduled(
            self.scheduler
                .set_timeout(delay, Task::Plugin { owner, token }),
        )
    }

    /// Wake `owner` with `token` every `period`.
    pub fn set_interval(&mut self, owner: PluginId, period: Duration, token: u32) -> TimerSlot {
        if self.destroyed {
            return TimerSlot::Idle;
        }
        TimerSlot::Running(
            self.scheduler
                .set_interval(period, Task::Plugin { owner, token }),
        )
    }

    /// Cancel the timer held by `slot` and reset it to `Idle`.
    pub fn cancel_timer(&mut self, slot: &mut TimerSlot) -> bool {
        slot.cancel(&mut self.scheduler)
    }

    // -----------------------------------------------------------------------
    // Engine internals
    // -----------------------------------------------------------------------

    /// Index for `offset`, clamped to the children. `None` while unmeasured.
    pub(crate) fn index_at(&self, offset: f64) -> Option<usize> {
        let count = self.container.child_count();
        if self.item_size <= 0.0 || count == 0 {
            return None;
        }
        let raw = offset / self.item_size;
        let rounded = match &self.rounding_fn {
            Some(round) => round(raw),
            None => self.rounding.apply(raw),
        };
        if !rounded.is_finite() {
            return None;
        }
        Some(rounded.clamp(0.0, (count - 1) as f64) as usize)
    }

    pub(crate) fn measure(&mut self) {
        let size = sanitize_size(self.sizing.measure(&self.container));
        if size != self.item_size {
            tracing::trace!(item_size = size, previous = self.item_size, "item measured");
        }
        self.item_size = size;
        self.update();
    }

    /// Silent index recomputation. Returns whether state changed.
    pub(crate) fn recompute(&mut self) -> bool {
        let Some(index) = self.index_at(self.container.scroll_offset()) else {
            return false;
        };
        let snapped = index as f64 * self.item_size;
        let changed = index != self.slide || snapped != self.snapped_offset;
        self.slide = index;
        self.snapped_offset = snapped;
        changed
    }

    pub(crate) fn scroll_tick(&mut self) {
        if !self.listening || self.item_size <= 0.0 {
            return;
        }
        let offset = self.container.scroll_offset();
        let Some(candidate) = self.index_at(offset) else {
            return;
        };

        if self.debounce.is_idle() {
            let direction: isize = if offset > self.snapped_offset { 1 } else { -1 };
            self.emit(SlideEvent::Start {
                target: self.slide as isize + direction,
            });
        }

        if candidate != self.slide {
            let mut index = self.slide;
            while index != candidate {
                index = if candidate > index { index + 1 } else { index - 1 };
                self.emit(SlideEvent::Pass { index });
            }
            self.slide = candidate;
            self.snapped_offset = candidate as f64 * self.item_size;
        }

        self.arm_settle_timer();
    }

    fn arm_settle_timer(&mut self) {
        self.debounce.cancel(&mut self.scheduler);
        self.debounce = TimerSlot::Scheduled(
            self.scheduler
                .set_timeout(self.scroll_timeout, Task::Engine(EngineTask::ScrollEnd)),
        );
    }

    pub(crate) fn scroll_end(&mut self, id: TimerId) {
        if !self.debounce.matches(id) {
            return;
        }
        self.debounce.take();
        self.recompute();
        tracing::trace!(slide = self.slide, "gesture settled");
        self.emit(SlideEvent::Stop { index: self.slide });
    }

    pub(crate) fn apply_slide_to(&mut self, index: usize) {
        if self.item_size <= 0.0 {
            return;
        }
        let offset = index as f64 * self.item_size;
        tracing::trace!(slide = index, offset, "slide_to");
        self.container.scroll_to(offset, ScrollBehavior::Smooth);
    }

    /// Record an event for the host and queue it for subscribers.
    fn emit(&mut self, event: SlideEvent) {
        tracing::trace!(event = %event, "emit");
        self.outbox.push(event);
        let kind = event.kind();
        for &(plugin, _) in self.event_subs.iter().filter(|(_, k)| *k == kind) {
            self.dispatch.push_back(Dispatch::Event { plugin, event });
        }
    }

    pub(crate) fn queue_interaction(&mut self, kind: &InteractionKind) {
        for (plugin, _) in self.interaction_subs.iter().filter(|(_, k)| k == kind) {
            self.dispatch.push_back(Dispatch::Interaction {
                plugin: *plugin,
                kind: kind.clone(),
            });
        }
    }

    /// Drop every subscription and pending delivery of `id`.
    pub(crate) fn forget_plugin(&mut self, id: PluginId) {
        self.registered.remove(id);
        self.event_subs.retain(|(owner, _)| *owner != id);
        self.interaction_subs.retain(|(owner, _)| *owner != id);
        self.dispatch.retain(|d| match d {
            Dispatch::Event { plugin, .. } | Dispatch::Interaction { plugin, .. } => {
                *plugin != id
            }
        });
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.listening = false;
        self.interrupted = false;
        self.debounce = TimerSlot::Idle;
        self.scheduler.clear();
        self.registered.clear();
        self.event_subs.clear();
        self.interaction_subs.clear();
        self.dispatch.clear();
        self.destroyed = true;
    }
}
