#![forbid(unsafe_code)]

//! SnapSlide public facade crate.
//!
//! Re-exports the engine, its container contract and the bundled plugins,
//! and offers a prelude for day-to-day usage.
//!
//! ```
//! use std::time::Duration;
//! use snapslide::prelude::*;
//!
//! let mut slider = Slider::new(
//!     VirtualContainer::uniform(320.0, 320.0, 6),
//!     SliderOptions::default(),
//! );
//! slider.register(Box::new(LoopPlugin::new()), true);
//! for _ in 0..30 {
//!     slider.step(Duration::from_millis(16));
//! }
//! assert_eq!(slider.container().display_order(), &[5, 0, 1, 2, 3, 4]);
//! ```

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use snapslide_core::{
    ContainerNotice, DeterministicClock, InteractionFlags, InteractionKind, InteractionSet,
    ScrollBehavior, ScrollContainer, SlideEvent, SlideEventKind, SnapMode, TimerSlot, Track,
    VirtualContainer,
};

// --- Runtime re-exports ----------------------------------------------------

pub use snapslide_runtime::{
    ConfigError, Plugin, PluginId, Rounding, SizingMethod, Slider, SliderConfig, SliderContext,
    SliderOptions, StepResult, Wake, WakeSource,
};

// --- Plugin re-exports -----------------------------------------------------

#[cfg(feature = "autoplay")]
pub use snapslide_plugins::{AutoplayConfig, AutoplayPlugin};
#[cfg(feature = "loop")]
pub use snapslide_plugins::LoopPlugin;
pub use snapslide_plugins::{AUTOPLAY_PLUGIN_ID, LOOP_PLUGIN_ID};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for SnapSlide hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// One or more configuration values were rejected.
    Config(Vec<ConfigError>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(errors) => {
                write!(f, "invalid configuration")?;
                for (i, err) in errors.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{sep}{err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<Vec<ConfigError>> for Error {
    fn from(errors: Vec<ConfigError>) -> Self {
        Self::Config(errors)
    }
}

/// Standard result type for SnapSlide APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Engine options from the environment, rejecting any malformed value.
///
/// [`SliderConfig::from_env`] is the lenient variant that keeps defaults.
pub fn options_from_env<C>() -> Result<SliderOptions<C>> {
    options_from(SliderConfig::from_env_with_diagnostics())
}

fn options_from<C>(parse: snapslide_runtime::SliderConfigParse) -> Result<SliderOptions<C>> {
    if parse.errors.is_empty() {
        Ok(SliderOptions::from_config(parse.config))
    } else {
        Err(Error::Config(parse.errors))
    }
}

/// Autoplay configuration from the environment, rejecting any malformed
/// value.
#[cfg(feature = "autoplay")]
pub fn autoplay_from_env() -> Result<AutoplayConfig> {
    let parse = AutoplayConfig::from_env_with_diagnostics();
    if parse.errors.is_empty() {
        Ok(parse.config)
    } else {
        Err(Error::Config(parse.errors))
    }
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Error, InteractionKind, Plugin, Result, ScrollContainer, SlideEvent, Slider,
        SliderContext, SliderOptions, VirtualContainer,
    };

    #[cfg(feature = "autoplay")]
    pub use crate::AutoplayPlugin;
    #[cfg(feature = "loop")]
    pub use crate::LoopPlugin;

    pub use crate::{core, plugins, runtime};
}

pub use snapslide_core as core;
pub use snapslide_plugins as plugins;
pub use snapslide_runtime as runtime;
