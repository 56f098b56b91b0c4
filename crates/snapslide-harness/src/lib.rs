#![forbid(unsafe_code)]

//! Deterministic host loop for SnapSlide.
//!
//! [`SliderHarness`] plays the part of a browser event loop: it advances the
//! clock one frame interval at a time, runs a rendering pass, and records
//! every emitted event with the time it surfaced.
//!
//! # Quick Start
//!
//! ```
//! use snapslide_harness::SliderHarness;
//! use snapslide_core::SlideEvent;
//!
//! let mut h = SliderHarness::uniform(200.0, 200.0, 5);
//! h.settle();
//! h.scroll_by(200.0);
//! h.settle();
//!
//! let events: Vec<_> = h.take_events().into_iter().map(|r| r.event).collect();
//! assert_eq!(events.last(), Some(&SlideEvent::Stop { index: 1 }));
//! ```

use std::io::Write;
use std::time::Duration;

use serde::Serialize;
use snapslide_core::{InteractionKind, ScrollContainer, SlideEvent, VirtualContainer};
use snapslide_runtime::{Slider, SliderOptions, StepResult};

/// Default frame interval (about 60 Hz).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Upper bound on steps taken by [`SliderHarness::settle`].
pub const MAX_SETTLE_STEPS: usize = 10_000;

/// An event together with the harness time at which it surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedEvent {
    pub at: Duration,
    pub event: SlideEvent,
}

#[derive(Serialize)]
struct JsonLine {
    at_ms: u64,
    #[serde(flatten)]
    event: SlideEvent,
}

impl RecordedEvent {
    /// One JSON object, e.g. `{"at_ms":176,"type":"slide-stop","index":1}`.
    pub fn to_jsonl(&self) -> serde_json::Result<String> {
        serde_json::to_string(&JsonLine {
            at_ms: u64::try_from(self.at.as_millis()).unwrap_or(u64::MAX),
            event: self.event,
        })
    }
}

/// Frame-stepping driver around a [`Slider`].
pub struct SliderHarness<C> {
    slider: Slider<C>,
    frame_interval: Duration,
    events: Vec<RecordedEvent>,
}

impl<C: ScrollContainer + 'static> SliderHarness<C> {
    #[must_use]
    pub fn new(slider: Slider<C>) -> Self {
        Self {
            slider,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    #[inline]
    #[must_use]
    pub fn slider(&self) -> &Slider<C> {
        &self.slider
    }

    #[inline]
    pub fn slider_mut(&mut self) -> &mut Slider<C> {
        &mut self.slider
    }

    #[inline]
    #[must_use]
    pub fn container(&self) -> &C {
        self.slider.container()
    }

    #[inline]
    pub fn container_mut(&mut self) -> &mut C {
        self.slider.container_mut()
    }

    #[must_use]
    pub fn slide(&self) -> usize {
        self.slider.slide()
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.slider.now()
    }

    /// Forward an interaction to the slider.
    pub fn interact(&mut self, kind: InteractionKind) {
        self.slider.interact(kind);
        self.collect();
    }

    /// Advance one frame interval and run one rendering pass.
    pub fn step(&mut self) -> StepResult {
        let result = self.slider.step(self.frame_interval);
        self.collect();
        result
    }

    /// Step until at least `duration` has elapsed. Returns the step count.
    pub fn run_for(&mut self, duration: Duration) -> usize {
        let deadline = self.now().saturating_add(duration);
        let mut steps = 0;
        while self.now() < deadline {
            self.step();
            steps += 1;
            if self.slider.is_destroyed() {
                break;
            }
        }
        steps
    }

    /// Step until no frame task, timer or motion is pending.
    ///
    /// Returns `false` if the slider is still busy after
    /// [`MAX_SETTLE_STEPS`], which is expected while a repeating timer
    /// (autoplay) is active.
    pub fn settle(&mut self) -> bool {
        for _ in 0..MAX_SETTLE_STEPS {
            let result = self.step();
            if !result.running || self.slider.is_idle() {
                return true;
            }
        }
        tracing::warn!(
            steps = MAX_SETTLE_STEPS,
            now_ms = self.now().as_millis() as u64,
            "Harness did not settle"
        );
        false
    }

    /// All events recorded so far.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<RecordedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Recorded events without timestamps.
    #[must_use]
    pub fn event_log(&self) -> Vec<SlideEvent> {
        self.events.iter().map(|r| r.event).collect()
    }

    /// Write recorded events as JSON lines.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for record in &self.events {
            writeln!(writer, "{}", record.to_jsonl()?)?;
        }
        Ok(())
    }

    fn collect(&mut self) {
        let at = self.slider.now();
        self.events.extend(
            self.slider
                .drain_events()
                .into_iter()
                .map(|event| RecordedEvent { at, event }),
        );
    }
}

impl SliderHarness<VirtualContainer> {
    /// Harness over `count` uniform items with default options.
    #[must_use]
    pub fn uniform(client_extent: f64, item_extent: f64, count: usize) -> Self {
        Self::new(Slider::new(
            VirtualContainer::uniform(client_extent, item_extent, count),
            SliderOptions::default(),
        ))
    }

    /// Simulated user drag or wheel movement.
    pub fn scroll_by(&mut self, delta: f64) {
        self.container_mut().scroll_by(delta);
    }

    /// Spread `total` pixels of user scrolling over `frames` frames.
    pub fn fling(&mut self, total: f64, frames: usize) {
        let frames = frames.max(1);
        let delta = total / frames as f64;
        for _ in 0..frames {
            self.scroll_by(delta);
            self.step();
        }
    }

    /// End of a simulated gesture: snap to the nearest item.
    pub fn release(&mut self) {
        self.container_mut().release();
    }
}
