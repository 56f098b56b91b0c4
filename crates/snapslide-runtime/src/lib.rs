#![forbid(unsafe_code)]

//! Scroll-driven slide engine.
//!
//! A [`Slider`] watches one [`ScrollContainer`](snapslide_core::ScrollContainer),
//! converts its continuous offset into a discrete slide index, and emits
//! [`SlideEvent`](snapslide_core::SlideEvent)s as a gesture starts, crosses
//! item boundaries, and settles. [`Plugin`]s extend it through an explicit
//! [`SliderContext`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use snapslide_core::{SlideEvent, VirtualContainer};
//! use snapslide_runtime::{Slider, SliderOptions};
//!
//! let container = VirtualContainer::uniform(200.0, 200.0, 5);
//! let mut slider = Slider::new(container, SliderOptions::default());
//! // Initial measurement, then the index update it requests.
//! slider.step(Duration::from_millis(16));
//! slider.step(Duration::from_millis(16));
//!
//! slider.container_mut().scroll_by(200.0);
//! for _ in 0..20 {
//!     slider.step(Duration::from_millis(16));
//! }
//! assert_eq!(slider.slide(), 1);
//! assert_eq!(slider.drain_events().last(), Some(&SlideEvent::Stop { index: 1 }));
//! ```

pub mod context;
pub mod options;
pub mod plugin;
pub mod slider;

pub use context::SliderContext;
pub use options::{
    ConfigError, DEFAULT_SCROLL_TIMEOUT, Rounding, RoundingFn, SizingMethod, SliderConfig,
    SliderConfigParse, SliderOptions, parse_millis,
};
pub use plugin::{Plugin, PluginId, Wake, WakeSource};
pub use slider::{Slider, StepResult};
