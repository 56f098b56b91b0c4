#![forbid(unsafe_code)]

//! The plugin capability.
//!
//! A plugin is identity plus an enable/disable pair. The engine hands it a
//! [`SliderContext`] on every call instead of the plugin holding a pointer
//! back to the engine, so a plugin can only touch engine state while it is
//! registered.
//!
//! # Contract
//!
//! - `enable` and `disable` may be called any number of times, in any
//!   interleaving. Each `enable` tears down whatever a previous `enable`
//!   left behind before arming anything.
//! - `disable` on a disabled plugin is a no-op.
//! - Work a plugin schedules through the context comes back as
//!   [`Plugin::on_wake`] carrying the plugin's own token.

use std::any::Any;

use snapslide_core::{FrameHandle, InteractionKind, SlideEvent, TimerId};

use crate::context::SliderContext;

/// Stable identity of a plugin; the registry key.
pub type PluginId = &'static str;

/// Which suspension point resumed a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeSource {
    Frame(FrameHandle),
    Timer(TimerId),
}

/// A deferred plugin callback coming due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wake {
    /// The token the plugin scheduled with.
    pub token: u32,
    pub source: WakeSource,
}

impl Wake {
    /// The timer that fired, if this wake came from a timer.
    #[must_use]
    pub const fn timer(&self) -> Option<TimerId> {
        match self.source {
            WakeSource::Timer(id) => Some(id),
            WakeSource::Frame(_) => None,
        }
    }

    /// The frame callback that ran, if this wake came from a frame.
    #[must_use]
    pub const fn frame(&self) -> Option<FrameHandle> {
        match self.source {
            WakeSource::Frame(handle) => Some(handle),
            WakeSource::Timer(_) => None,
        }
    }
}

/// Engine extension.
pub trait Plugin<C>: Any {
    fn id(&self) -> PluginId;

    /// Attach listeners and timers.
    fn enable(&mut self, ctx: &mut SliderContext<C>);

    /// Detach everything `enable` attached.
    fn disable(&mut self, ctx: &mut SliderContext<C>);

    /// A slide event this plugin subscribed to.
    fn on_event(&mut self, _ctx: &mut SliderContext<C>, _event: SlideEvent) {}

    /// An interaction this plugin listens for.
    fn on_interaction(&mut self, _ctx: &mut SliderContext<C>, _kind: InteractionKind) {}

    /// A frame callback or timer this plugin scheduled.
    fn on_wake(&mut self, _ctx: &mut SliderContext<C>, _wake: Wake) {}
}
