#![forbid(unsafe_code)]

//! Timed advance that yields to the user.
//!
//! While enabled, a repeating timer advances one slide per interval. Any of
//! the configured interactions stops that timer and (re)starts a single-shot
//! resume timer; when the user has been quiet for the resume delay, autoplay
//! re-enables itself with a fresh interval.
//!
//! # Environment Variables
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `SNAPSLIDE_AUTOPLAY_INTERVAL_MS` | `interval` | positive integer (ms) |
//! | `SNAPSLIDE_AUTOPLAY_RESUME_MS` | `resume_delay` | integer (ms) |
//! | `SNAPSLIDE_AUTOPLAY_EVENTS` | `interactions` | comma-separated event names (`touchmove,wheel,mousedown`) |
//!
//! A value that parses but fails validation (an interval of `0`) is reported
//! and the field keeps its default.

use std::env;
use std::time::Duration;

use snapslide_core::{
    FrameHandle, InteractionFlags, InteractionKind, InteractionSet, ScrollContainer, TimerSlot,
};
use snapslide_runtime::{ConfigError, Plugin, PluginId, SliderContext, Wake, parse_millis};

use crate::{AUTOPLAY_PLUGIN_ID, LOOP_PLUGIN_ID};

pub const ENV_AUTOPLAY_INTERVAL_MS: &str = "SNAPSLIDE_AUTOPLAY_INTERVAL_MS";
pub const ENV_AUTOPLAY_RESUME_MS: &str = "SNAPSLIDE_AUTOPLAY_RESUME_MS";
pub const ENV_AUTOPLAY_EVENTS: &str = "SNAPSLIDE_AUTOPLAY_EVENTS";

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(3141);
pub const DEFAULT_RESUME_DELAY: Duration = Duration::from_millis(6282);

/// Distance from the end, in pixels, that still counts as "at the end".
const END_TOLERANCE: f64 = 0.5;

const TICK: u32 = 1;
const RESUME: u32 = 2;
const ADVANCE: u32 = 3;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Autoplay timing and the interactions that pause it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AutoplayConfig {
    pub interval: Duration,
    pub resume_delay: Duration,
    pub interactions: InteractionSet,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            resume_delay: DEFAULT_RESUME_DELAY,
            interactions: InteractionSet::from(
                InteractionFlags::TOUCH_MOVE | InteractionFlags::WHEEL,
            ),
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct AutoplayConfigParse {
    pub config: AutoplayConfig,
    pub errors: Vec<ConfigError>,
}

impl AutoplayConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> AutoplayConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config through an arbitrary variable lookup.
    pub fn from_env_with<F>(mut get: F) -> AutoplayConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_AUTOPLAY_INTERVAL_MS) {
            match parse_millis(&value) {
                Some(parsed) => config.interval = parsed,
                None => errors.push(ConfigError::new(
                    "interval",
                    value,
                    "expected integer milliseconds",
                )),
            }
        }

        if let Some(value) = get(ENV_AUTOPLAY_RESUME_MS) {
            match parse_millis(&value) {
                Some(parsed) => config.resume_delay = parsed,
                None => errors.push(ConfigError::new(
                    "resume_delay",
                    value,
                    "expected integer milliseconds",
                )),
            }
        }

        if let Some(value) = get(ENV_AUTOPLAY_EVENTS) {
            match InteractionSet::parse_list(&value) {
                Ok(parsed) => config.interactions = parsed,
                Err(err) => errors.push(ConfigError::new("interactions", value, err.to_string())),
            }
        }

        if let Err(mut validation) = config.validate() {
            let defaults = Self::default();
            for error in &validation {
                if error.field == "interval" {
                    config.interval = defaults.interval;
                }
            }
            errors.append(&mut validation);
        }

        AutoplayConfigParse { config, errors }
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.interval.is_zero() {
            errors.push(ConfigError::new("interval", "0", "must be >= 1ms"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// Advances one slide per interval unless the user is interacting.
///
/// # Invariants
///
/// 1. At most one interval and one resume timer exist.
/// 2. The interval is never running while the resume timer is scheduled.
/// 3. Repeated interactions move the resume deadline instead of stacking
///    resumes.
#[derive(Debug)]
pub struct AutoplayPlugin {
    config: AutoplayConfig,
    interval: TimerSlot,
    resume: TimerSlot,
    advance: Option<FrameHandle>,
    ticks: u64,
    resumes: u64,
}

impl Default for AutoplayPlugin {
    fn default() -> Self {
        Self::from_config(AutoplayConfig::default())
    }
}

impl AutoplayPlugin {
    /// Create with an interval, a resume delay and the interactions that
    /// pause autoplay.
    #[must_use]
    pub fn new(
        interval: Duration,
        resume_delay: Duration,
        interactions: impl IntoIterator<Item = InteractionKind>,
    ) -> Self {
        Self::from_config(AutoplayConfig {
            interval,
            resume_delay,
            interactions: interactions.into_iter().collect(),
        })
    }

    #[must_use]
    pub fn from_config(config: AutoplayConfig) -> Self {
        Self {
            config,
            interval: TimerSlot::Idle,
            resume: TimerSlot::Idle,
            advance: None,
            ticks: 0,
            resumes: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AutoplayConfig {
        &self.config
    }

    /// Whether the repeating timer is active.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.interval.is_running()
    }

    /// Whether autoplay is waiting for the user to go quiet.
    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.resume.is_scheduled()
    }

    /// Interval ticks handled so far.
    #[inline]
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Times autoplay resumed after an interaction.
    #[inline]
    #[must_use]
    pub fn resume_count(&self) -> u64 {
        self.resumes
    }

    fn tick<C: ScrollContainer>(&mut self, ctx: &mut SliderContext<C>) {
        self.ticks += 1;
        if ctx.has_plugin(LOOP_PLUGIN_ID) {
            ctx.slide_to(ctx.slide() + 1);
        } else if self.advance.is_none() {
            self.advance = ctx.request_frame(AUTOPLAY_PLUGIN_ID, ADVANCE);
        }
    }

    fn advance_or_rewind<C: ScrollContainer>(ctx: &mut SliderContext<C>) {
        let container = ctx.container();
        let remaining =
            container.scroll_extent() - container.scroll_offset() - container.client_extent();
        let at_end = remaining.abs() < END_TOLERANCE;
        let target = if at_end { 0 } else { ctx.slide() + 1 };
        tracing::trace!(plugin = AUTOPLAY_PLUGIN_ID, target, at_end, "advance");
        ctx.slide_to(target);
    }
}

impl<C: ScrollContainer + 'static> Plugin<C> for AutoplayPlugin {
    fn id(&self) -> PluginId {
        AUTOPLAY_PLUGIN_ID
    }

    fn enable(&mut self, ctx: &mut SliderContext<C>) {
        ctx.cancel_timer(&mut self.resume);
        ctx.cancel_timer(&mut self.interval);
        self.interval = ctx.set_interval(AUTOPLAY_PLUGIN_ID, self.config.interval, TICK);
        for kind in self.config.interactions.kinds() {
            ctx.listen_interaction(AUTOPLAY_PLUGIN_ID, kind);
        }
        tracing::debug!(
            plugin = AUTOPLAY_PLUGIN_ID,
            interval_ms = self.config.interval.as_millis() as u64,
            "Autoplay running"
        );
    }

    fn disable(&mut self, ctx: &mut SliderContext<C>) {
        for kind in self.config.interactions.kinds() {
            ctx.unlisten_interaction(AUTOPLAY_PLUGIN_ID, &kind);
        }
        ctx.cancel_timer(&mut self.interval);
        ctx.cancel_timer(&mut self.resume);
        if let Some(handle) = self.advance.take() {
            ctx.cancel_frame(handle);
        }
    }

    fn on_interaction(&mut self, ctx: &mut SliderContext<C>, kind: InteractionKind) {
        if !self.config.interactions.has(&kind) {
            return;
        }
        if self.interval.is_running() {
            ctx.cancel_timer(&mut self.interval);
            tracing::debug!(plugin = AUTOPLAY_PLUGIN_ID, interaction = %kind, "Autoplay paused");
        }
        ctx.cancel_timer(&mut self.resume);
        self.resume = ctx.set_timeout(AUTOPLAY_PLUGIN_ID, self.config.resume_delay, RESUME);
    }

    fn on_wake(&mut self, ctx: &mut SliderContext<C>, wake: Wake) {
        match wake.token {
            TICK if wake.timer().is_some_and(|id| self.interval.matches(id)) => self.tick(ctx),
            RESUME if wake.timer().is_some_and(|id| self.resume.matches(id)) => {
                self.resume.take();
                self.resumes += 1;
                tracing::debug!(
                    plugin = AUTOPLAY_PLUGIN_ID,
                    resumes = self.resumes,
                    "Autoplay resumed"
                );
                <Self as Plugin<C>>::enable(self, ctx);
            }
            ADVANCE if wake.frame().is_some() && wake.frame() == self.advance => {
                self.advance = None;
                Self::advance_or_rewind(ctx);
            }
            _ => {}
        }
    }
}
