#![forbid(unsafe_code)]

//! The slide engine.
//!
//! [`Slider`] binds one [`ScrollContainer`] and turns its scroll activity
//! into `slide-start` / `slide-pass` / `slide-stop` events. It is
//! host-driven: no threads, no wall clock.
//!
//! # Lifecycle
//!
//! 1. [`Slider::new`] measures the first item and queues a measurement
//!    frame.
//! 2. The host calls [`Slider::advance_time`] and [`Slider::frame`] (or
//!    [`Slider::step`]) from its event loop, forwards user input through
//!    [`Slider::interact`], and reads [`Slider::drain_events`].
//! 3. [`Slider::destroy`] tears everything down. Every later call is a
//!    no-op.
//!
//! # Ordering
//!
//! Within one frame, tasks run in request order; tasks requested while the
//! frame runs land in the next one. After every task, events it emitted are
//! delivered to subscribed plugins before the next task starts.

use std::any::Any;
use std::collections::BTreeMap;
use std::time::Duration;

use snapslide_core::{ContainerNotice, InteractionKind, ScrollContainer, SlideEvent, TimerId};

use crate::context::{Dispatch, EngineTask, SliderContext, Task};
use crate::options::SliderOptions;
use crate::plugin::{Plugin, PluginId, Wake, WakeSource};

/// Outcome of a single [`Slider::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// `false` once the engine is destroyed.
    pub running: bool,
    /// Timers that fired while advancing time.
    pub timers_fired: u32,
    /// Frame tasks executed.
    pub frame_tasks: u32,
    /// Slide events emitted during this step.
    pub events_emitted: u32,
    /// Current frame index (monotonically increasing).
    pub frame_idx: u64,
}

/// Scroll-driven carousel engine with a plugin registry.
pub struct Slider<C> {
    ctx: SliderContext<C>,
    plugins: BTreeMap<PluginId, Box<dyn Plugin<C>>>,
    frame_idx: u64,
}

impl<C: ScrollContainer + 'static> Slider<C> {
    /// Bind to `container`.
    pub fn new(container: C, options: SliderOptions<C>) -> Self {
        let ctx = SliderContext::new(container, options);
        tracing::debug!(
            item_size = ctx.item_size(),
            slide = ctx.slide(),
            children = ctx.container().child_count(),
            "Slider created"
        );
        Self {
            ctx,
            plugins: BTreeMap::new(),
            frame_idx: 0,
        }
    }

    // --- State ---

    #[inline]
    #[must_use]
    pub fn slide(&self) -> usize {
        self.ctx.slide()
    }

    #[inline]
    #[must_use]
    pub fn item_size(&self) -> f64 {
        self.ctx.item_size()
    }

    #[inline]
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.ctx.is_listening()
    }

    #[inline]
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.ctx.is_destroyed()
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &C {
        self.ctx.container()
    }

    /// Direct access to the container, for host input such as user scrolls.
    #[inline]
    pub fn container_mut(&mut self) -> &mut C {
        self.ctx.container_mut()
    }

    /// Shared engine state.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &SliderContext<C> {
        &self.ctx
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.ctx.now()
    }

    #[must_use]
    pub fn frame_idx(&self) -> u64 {
        self.frame_idx
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.ctx.scheduler.next_deadline()
    }

    /// Whether nothing is pending: no frame task, no timer, no motion.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.ctx.scheduler.is_idle() && !self.ctx.container().is_moving()
    }

    /// Whether frame tasks are queued.
    #[must_use]
    pub fn has_pending_frames(&self) -> bool {
        self.ctx.scheduler.pending_frames() > 0
    }

    // --- Public commands ---

    pub fn attach_listeners(&mut self) {
        self.ctx.attach_listeners();
    }

    pub fn detach_listeners(&mut self) {
        self.ctx.detach_listeners();
    }

    pub fn update(&mut self) {
        self.ctx.update();
    }

    pub fn slide_to(&mut self, index: usize) {
        self.ctx.slide_to(index);
    }

    /// Forward a user interaction to plugins listening for it.
    ///
    /// Any host event name is accepted; see [`InteractionKind::named`].
    pub fn interact(&mut self, kind: InteractionKind) {
        if self.ctx.is_destroyed() {
            return;
        }
        self.ctx.queue_interaction(&kind.normalized());
        self.pump();
    }

    /// Events emitted since the previous call, in emission order.
    pub fn drain_events(&mut self) -> Vec<SlideEvent> {
        std::mem::take(&mut self.ctx.outbox)
    }

    // --- Plugins ---

    /// Register every plugin in order, enabling each when `enabled`.
    pub fn with<I>(&mut self, plugins: I, enabled: bool) -> &mut Self
    where
        I: IntoIterator<Item = Box<dyn Plugin<C>>>,
    {
        for plugin in plugins {
            self.register(plugin, enabled);
        }
        self
    }

    /// Register one plugin. A plugin already registered under the same
    /// identity is disabled and replaced.
    pub fn register(&mut self, mut plugin: Box<dyn Plugin<C>>, enabled: bool) -> &mut Self {
        if self.ctx.is_destroyed() {
            return self;
        }
        let id = plugin.id();
        if self.plugins.contains_key(id) {
            tracing::debug!(plugin = id, "Replacing plugin");
            self.unregister(id);
        }
        self.ctx.registered.insert(id);
        if enabled {
            plugin.enable(&mut self.ctx);
        }
        self.plugins.insert(id, plugin);
        tracing::debug!(plugin = id, enabled, "Plugin registered");
        self.pump();
        self
    }

    /// Disable and remove a plugin, handing it back.
    pub fn unregister(&mut self, id: PluginId) -> Option<Box<dyn Plugin<C>>> {
        let mut plugin = self.plugins.remove(id)?;
        plugin.disable(&mut self.ctx);
        self.ctx.forget_plugin(id);
        tracing::debug!(plugin = id, "Plugin unregistered");
        self.pump();
        Some(plugin)
    }

    /// Enable a registered plugin. Returns `false` if it is not registered.
    pub fn enable_plugin(&mut self, id: PluginId) -> bool {
        let Some(plugin) = self.plugins.get_mut(id) else {
            return false;
        };
        plugin.enable(&mut self.ctx);
        tracing::debug!(plugin = id, "Plugin enabled");
        self.pump();
        true
    }

    /// Disable a registered plugin. Returns `false` if it is not registered.
    pub fn disable_plugin(&mut self, id: PluginId) -> bool {
        let Some(plugin) = self.plugins.get_mut(id) else {
            return false;
        };
        plugin.disable(&mut self.ctx);
        tracing::debug!(plugin = id, "Plugin disabled");
        self.pump();
        true
    }

    #[must_use]
    pub fn has_plugin(&self, id: PluginId) -> bool {
        self.plugins.contains_key(id)
    }

    /// Registered identities, in registry order.
    pub fn plugin_ids(&self) -> impl Iterator<Item = PluginId> + '_ {
        self.plugins.keys().copied()
    }

    /// Typed view of a registered plugin.
    #[must_use]
    pub fn plugin_as<P: Plugin<C>>(&self, id: PluginId) -> Option<&P> {
        let plugin: &dyn Plugin<C> = &**self.plugins.get(id)?;
        let any: &dyn Any = plugin;
        any.downcast_ref::<P>()
    }

    // --- Teardown ---

    /// Detach listeners, disable and unregister every plugin, and drop all
    /// pending work. Idempotent.
    pub fn destroy(&mut self) {
        if self.ctx.is_destroyed() {
            return;
        }
        self.ctx.detach_listeners();
        for (id, plugin) in &mut self.plugins {
            plugin.disable(&mut self.ctx);
            tracing::debug!(plugin = *id, "Plugin disabled on destroy");
        }
        self.plugins.clear();
        self.ctx.mark_destroyed();
        tracing::debug!(frame_idx = self.frame_idx, "Slider destroyed");
    }

    // --- Host loop ---

    /// Advance time by `dt`, firing due timers in deadline order.
    ///
    /// Returns how many timers fired.
    pub fn advance_time(&mut self, dt: Duration) -> u32 {
        if self.ctx.is_destroyed() {
            return 0;
        }
        let until = self.ctx.now().saturating_add(dt);
        let mut fired = 0;
        while let Some((id, task)) = self.ctx.scheduler.pop_due(until) {
            fired += 1;
            self.run_timer(id, task);
            if self.ctx.is_destroyed() {
                return fired;
            }
        }
        self.ctx.scheduler.advance_to(until);
        fired
    }

    /// Run one rendering pass.
    ///
    /// Executes the frame tasks queued before the call, advances container
    /// motion, then turns container notices into next-frame work.
    ///
    /// Returns how many tasks ran.
    pub fn frame(&mut self) -> u32 {
        if self.ctx.is_destroyed() {
            return 0;
        }
        let _span = tracing::trace_span!("slider.frame", frame_idx = self.frame_idx).entered();
        let tasks = self.ctx.scheduler.take_frame_tasks();
        let mut ran = 0;
        for (handle, task) in tasks {
            ran += 1;
            match task {
                Task::Engine(engine) => self.run_engine(engine),
                Task::Plugin { owner, token } => self.wake(
                    owner,
                    Wake {
                        token,
                        source: WakeSource::Frame(handle),
                    },
                ),
            }
            self.pump();
            if self.ctx.is_destroyed() {
                return ran;
            }
        }

        self.ctx.container_mut().advance_frame();
        let notices = self.ctx.container_mut().take_notices();
        for notice in notices {
            match notice {
                ContainerNotice::Scrolled if self.ctx.is_listening() => {
                    self.ctx
                        .scheduler
                        .request_frame(Task::Engine(EngineTask::ScrollTick));
                }
                ContainerNotice::Scrolled => {}
                ContainerNotice::Resized => {
                    self.ctx
                        .scheduler
                        .request_frame(Task::Engine(EngineTask::Measure));
                }
            }
        }
        self.frame_idx += 1;
        ran
    }

    /// `advance_time(dt)` followed by `frame()`.
    pub fn step(&mut self, dt: Duration) -> StepResult {
        let before = self.ctx.outbox.len();
        let timers_fired = self.advance_time(dt);
        let frame_tasks = self.frame();
        let emitted = self.ctx.outbox.len().saturating_sub(before);
        StepResult {
            running: !self.ctx.is_destroyed(),
            timers_fired,
            frame_tasks,
            events_emitted: u32::try_from(emitted).unwrap_or(u32::MAX),
            frame_idx: self.frame_idx,
        }
    }

    // --- Internals ---

    fn run_timer(&mut self, id: TimerId, task: Task) {
        match task {
            Task::Engine(EngineTask::ScrollEnd) => self.ctx.scroll_end(id),
            Task::Engine(engine) => self.run_engine(engine),
            Task::Plugin { owner, token } => self.wake(
                owner,
                Wake {
                    token,
                    source: WakeSource::Timer(id),
                },
            ),
        }
        self.pump();
    }

    fn run_engine(&mut self, task: EngineTask) {
        match task {
            EngineTask::Measure => self.ctx.measure(),
            EngineTask::Update => {
                if self.ctx.recompute() {
                    tracing::trace!(slide = self.ctx.slide(), "index updated");
                }
            }
            EngineTask::ScrollTick => self.ctx.scroll_tick(),
            // Only ever scheduled as a timer.
            EngineTask::ScrollEnd => {}
            EngineTask::SlideTo(index) => self.ctx.apply_slide_to(index),
        }
    }

    fn wake(&mut self, owner: PluginId, wake: Wake) {
        if let Some(plugin) = self.plugins.get_mut(owner) {
            plugin.on_wake(&mut self.ctx, wake);
        }
    }

    /// Deliver queued events and interactions to their plugins.
    fn pump(&mut self) {
        while let Some(dispatch) = self.ctx.dispatch.pop_front() {
            match dispatch {
                Dispatch::Event { plugin, event } => {
                    if let Some(p) = self.plugins.get_mut(plugin) {
                        p.on_event(&mut self.ctx, event);
                    }
                }
                Dispatch::Interaction { plugin, kind } => {
                    if let Some(p) = self.plugins.get_mut(plugin) {
                        p.on_interaction(&mut self.ctx, kind);
                    }
                }
            }
        }
    }
}

impl<C> std::fmt::Debug for Slider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slider")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .field("frame_idx", &self.frame_idx)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use snapslide_core::{SlideEventKind, TimerSlot, VirtualContainer};

    const FRAME: Duration = Duration::from_millis(16);

    fn slider(count: usize) -> Slider<VirtualContainer> {
        Slider::new(
            VirtualContainer::uniform(200.0, 200.0, count).with_glide_frames(4),
            SliderOptions::default(),
        )
    }

    fn settle(s: &mut Slider<VirtualContainer>) {
        for _ in 0..200 {
            s.step(FRAME);
            if s.is_idle() {
                return;
            }
        }
    }

    /// Records every callback it receives.
    #[derive(Default)]
    struct Recorder {
        enabled: u32,
        disabled: u32,
        events: Vec<SlideEvent>,
        interactions: Vec<InteractionKind>,
        wakes: Vec<u32>,
        timer: TimerSlot,
    }

    impl Plugin<VirtualContainer> for Recorder {
        fn id(&self) -> PluginId {
            "recorder"
        }

        fn enable(&mut self, ctx: &mut SliderContext<VirtualContainer>) {
            self.enabled += 1;
            ctx.subscribe("recorder", SlideEventKind::Stop);
            ctx.listen_interaction("recorder", InteractionKind::Wheel);
            ctx.listen_interaction("recorder", InteractionKind::named("mousedown"));
            ctx.cancel_timer(&mut self.timer);
            self.timer = ctx.set_timeout("recorder", Duration::from_millis(50), 7);
        }

        fn disable(&mut self, ctx: &mut SliderContext<VirtualContainer>) {
            self.disabled += 1;
            ctx.unsubscribe("recorder", SlideEventKind::Stop);
            ctx.unlisten_interaction("recorder", &InteractionKind::Wheel);
            ctx.unlisten_interaction("recorder", &InteractionKind::named("mousedown"));
            ctx.cancel_timer(&mut self.timer);
        }

        fn on_event(&mut self, _ctx: &mut SliderContext<VirtualContainer>, event: SlideEvent) {
            self.events.push(event);
        }

        fn on_interaction(
            &mut self,
            _ctx: &mut SliderContext<VirtualContainer>,
            kind: InteractionKind,
        ) {
            self.interactions.push(kind);
        }

        fn on_wake(&mut self, _ctx: &mut SliderContext<VirtualContainer>, wake: Wake) {
            if wake.timer().is_some_and(|id| self.timer.matches(id)) {
                self.timer.take();
            }
            self.wakes.push(wake.token);
        }
    }

    #[test]
    fn gesture_emits_start_pass_stop() {
        let mut s = slider(5);
        settle(&mut s);
        s.container_mut().scroll_by(200.0);
        settle(&mut s);
        assert_eq!(
            s.drain_events(),
            vec![
                SlideEvent::Start { target: 1 },
                SlideEvent::Pass { index: 1 },
                SlideEvent::Stop { index: 1 },
            ]
        );
        assert_eq!(s.slide(), 1);
    }

    #[test]
    fn update_when_snapped_is_silent() {
        let mut s = slider(5);
        settle(&mut s);
        s.update();
        settle(&mut s);
        assert!(s.drain_events().is_empty());
        assert_eq!(s.slide(), 0);
    }

    #[test]
    fn slide_to_glides_and_settles() {
        let mut s = slider(5);
        settle(&mut s);
        s.slide_to(3);
        settle(&mut s);
        assert_eq!(s.container().scroll_offset(), 600.0);
        assert_eq!(s.slide(), 3);
        let events = s.drain_events();
        assert_eq!(events.first(), Some(&SlideEvent::Start { target: 1 }));
        assert_eq!(events.last(), Some(&SlideEvent::Stop { index: 3 }));
    }

    #[test]
    fn plugin_receives_subscribed_events_and_interactions() {
        let mut s = slider(5);
        s.register(Box::new(Recorder::default()), true);
        s.interact(InteractionKind::Wheel);
        s.interact(InteractionKind::TouchMove);
        s.interact(InteractionKind::Other("MouseDown".into()));
        s.interact(InteractionKind::named("mouseup"));
        settle(&mut s);
        s.container_mut().scroll_by(200.0);
        settle(&mut s);

        let recorder = s.plugin_as::<Recorder>("recorder").unwrap();
        assert_eq!(recorder.enabled, 1);
        assert_eq!(recorder.events, vec![SlideEvent::Stop { index: 1 }]);
        assert_eq!(
            recorder.interactions,
            vec![InteractionKind::Wheel, InteractionKind::named("mousedown")]
        );
        assert_eq!(recorder.wakes, vec![7]);
        assert!(recorder.timer.is_idle());
    }

    #[test]
    fn registering_without_enable_attaches_nothing() {
        let mut s = slider(3);
        s.with([Box::new(Recorder::default()) as Box<dyn Plugin<_>>], false);
        assert!(s.has_plugin("recorder"));
        assert!(s.context().has_plugin("recorder"));
        s.interact(InteractionKind::Wheel);
        let recorder = s.plugin_as::<Recorder>("recorder").unwrap();
        assert_eq!(recorder.enabled, 0);
        assert!(recorder.interactions.is_empty());
    }

    #[test]
    fn duplicate_identity_replaces_previous_instance() {
        let mut s = slider(3);
        s.register(Box::new(Recorder::default()), true);
        s.register(Box::new(Recorder::default()), true);
        assert_eq!(s.plugin_ids().collect::<Vec<_>>(), vec!["recorder"]);
        let recorder = s.plugin_as::<Recorder>("recorder").unwrap();
        assert_eq!((recorder.enabled, recorder.disabled), (1, 0));
        assert_eq!(s.context().scheduler.pending_timers(), 1);
    }

    #[test]
    fn unregister_hands_plugin_back_disabled() {
        let mut s = slider(3);
        s.register(Box::new(Recorder::default()), true);
        let plugin = s.unregister("recorder").unwrap();
        let any: &dyn Any = &*plugin;
        assert_eq!(any.downcast_ref::<Recorder>().unwrap().disabled, 1);
        assert!(!s.context().has_plugin("recorder"));
        assert!(s.unregister("recorder").is_none());
        assert!(!s.enable_plugin("recorder"));
    }

    #[test]
    fn destroy_is_final_and_idempotent() {
        let mut s = slider(5);
        s.register(Box::new(Recorder::default()), true);
        settle(&mut s);
        s.drain_events();

        s.destroy();
        s.destroy();
        assert!(s.is_destroyed());
        assert!(!s.has_plugin("recorder"));

        s.container_mut().scroll_by(400.0);
        s.slide_to(2);
        s.update();
        s.interact(InteractionKind::Wheel);
        for _ in 0..20 {
            let result = s.step(FRAME);
            assert!(!result.running);
            assert_eq!(result.frame_tasks, 0);
        }
        assert!(s.drain_events().is_empty());
        assert_eq!(s.slide(), 0);
    }

    #[test]
    fn resize_remeasures() {
        let mut s = slider(5);
        settle(&mut s);
        for original in 0..5 {
            s.container_mut().set_item_extent(original, 100.0);
        }
        settle(&mut s);
        assert_eq!(s.item_size(), 100.0);
    }

    #[test]
    fn step_reports_work() {
        let mut s = slider(5);
        let first = s.step(FRAME);
        assert!(first.running);
        assert_eq!(first.frame_tasks, 1);
        assert_eq!(first.frame_idx, 1);
    }
}
