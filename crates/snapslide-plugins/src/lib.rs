#![forbid(unsafe_code)]

//! Plugins for the SnapSlide engine.
//!
//! - [`LoopPlugin`] (feature `loop`): relocates boundary items so the
//!   carousel appears to wrap endlessly.
//! - [`AutoplayPlugin`] (feature `autoplay`): advances one slide per
//!   interval and pauses while the user interacts.

use snapslide_runtime::PluginId;

/// Identity of the loop plugin. Autoplay checks for it to decide whether it
/// can advance past the last slide.
pub const LOOP_PLUGIN_ID: PluginId = "loop";

/// Identity of the autoplay plugin.
pub const AUTOPLAY_PLUGIN_ID: PluginId = "autoplay";

#[cfg(feature = "autoplay")]
pub mod autoplay;
#[cfg(feature = "loop")]
pub mod loop_plugin;

#[cfg(feature = "autoplay")]
pub use autoplay::{AutoplayConfig, AutoplayConfigParse, AutoplayPlugin};
#[cfg(feature = "loop")]
pub use loop_plugin::{LoopPlugin, MIN_LOOP_ITEMS, WRAP_THRESHOLD, WrapDirection, boundary_wrap};
