#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! [`SliderConfig`] is plain data and can be loaded from the environment.
//! [`SliderOptions`] adds the two behaviours that only make sense in code:
//! how an item is measured and an optional custom rounding function.
//!
//! # Environment Variables
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `SNAPSLIDE_SCROLL_TIMEOUT_MS` | `scroll_timeout` | positive integer (ms) |
//! | `SNAPSLIDE_ROUNDING` | `rounding` | `nearest` \| `floor` \| `ceil` |
//! | `SNAPSLIDE_SLIDE` | `slide` | non-negative integer |

use std::env;
use std::fmt;
use std::time::Duration;

use snapslide_core::ScrollContainer;

pub const ENV_SCROLL_TIMEOUT_MS: &str = "SNAPSLIDE_SCROLL_TIMEOUT_MS";
pub const ENV_ROUNDING: &str = "SNAPSLIDE_ROUNDING";
pub const ENV_SLIDE: &str = "SNAPSLIDE_SLIDE";

/// Quiet period after the last scroll tick before a gesture counts as
/// settled.
pub const DEFAULT_SCROLL_TIMEOUT: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Parse an integer millisecond count.
#[inline]
pub fn parse_millis(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_millis)
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// Offset-to-index rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Rounding {
    #[default]
    Nearest,
    Floor,
    Ceil,
}

impl Rounding {
    #[must_use]
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Self::Nearest => value.round(),
            Self::Floor => value.floor(),
            Self::Ceil => value.ceil(),
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "nearest" | "round" => Some(Self::Nearest),
            "floor" => Some(Self::Floor),
            "ceil" => Some(Self::Ceil),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SliderConfig
// ---------------------------------------------------------------------------

/// Data part of the engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SliderConfig {
    pub scroll_timeout: Duration,
    pub rounding: Rounding,
    /// Initial slide index.
    pub slide: usize,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            scroll_timeout: DEFAULT_SCROLL_TIMEOUT,
            rounding: Rounding::Nearest,
            slide: 0,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct SliderConfigParse {
    pub config: SliderConfig,
    pub errors: Vec<ConfigError>,
}

impl SliderConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> SliderConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Parse config through an arbitrary variable lookup.
    ///
    /// Malformed values, and values that fail [`Self::validate`], keep their
    /// defaults and are reported.
    pub fn from_env_with<F>(mut get: F) -> SliderConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_SCROLL_TIMEOUT_MS) {
            match parse_millis(&value) {
                Some(parsed) => config.scroll_timeout = parsed,
                None => errors.push(ConfigError::new(
                    "scroll_timeout",
                    value,
                    "expected integer milliseconds",
                )),
            }
        }

        if let Some(value) = get(ENV_ROUNDING) {
            match Rounding::parse(&value) {
                Some(parsed) => config.rounding = parsed,
                None => errors.push(ConfigError::new(
                    "rounding",
                    value,
                    "expected nearest|floor|ceil",
                )),
            }
        }

        if let Some(value) = get(ENV_SLIDE) {
            match value.trim().parse::<usize>() {
                Ok(parsed) => config.slide = parsed,
                Err(_) => errors.push(ConfigError::new(
                    "slide",
                    value,
                    "expected non-negative integer",
                )),
            }
        }

        if let Err(mut validation) = config.validate() {
            let defaults = Self::default();
            for error in &validation {
                if error.field == "scroll_timeout" {
                    config.scroll_timeout = defaults.scroll_timeout;
                }
            }
            errors.append(&mut validation);
        }

        SliderConfigParse { config, errors }
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.scroll_timeout.is_zero() {
            errors.push(ConfigError::new(
                "scroll_timeout",
                "0",
                "must be >= 1ms",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// SliderOptions
// ---------------------------------------------------------------------------

/// Custom offset-to-index rounding, applied to `offset / item_size`.
pub type RoundingFn = Box<dyn Fn(f64) -> f64>;

/// How the engine measures one item.
pub enum SizingMethod<C> {
    /// Extent of the first child in display order.
    FirstChild,
    /// A constant item size.
    Fixed(f64),
    /// Any computation over the container.
    Custom(Box<dyn Fn(&C) -> f64>),
}

impl<C> Default for SizingMethod<C> {
    fn default() -> Self {
        Self::FirstChild
    }
}

impl<C> fmt::Debug for SizingMethod<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstChild => f.write_str("FirstChild"),
            Self::Fixed(px) => f.debug_tuple("Fixed").field(px).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<C: ScrollContainer> SizingMethod<C> {
    /// Raw measurement. Callers sanitize the result.
    pub fn measure(&self, container: &C) -> f64 {
        match self {
            Self::FirstChild => container.child_extent(0).unwrap_or(0.0),
            Self::Fixed(px) => *px,
            Self::Custom(measure) => measure(container),
        }
    }
}

/// Full engine options.
pub struct SliderOptions<C> {
    pub config: SliderConfig,
    pub sizing: SizingMethod<C>,
    /// Overrides [`SliderConfig::rounding`] when set.
    pub rounding_fn: Option<RoundingFn>,
}

impl<C> Default for SliderOptions<C> {
    fn default() -> Self {
        Self::from_config(SliderConfig::default())
    }
}

impl<C> fmt::Debug for SliderOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliderOptions")
            .field("config", &self.config)
            .field("sizing", &self.sizing)
            .field("rounding_fn", &self.rounding_fn.as_ref().map(|_| ".."))
            .finish()
    }
}

impl<C> SliderOptions<C> {
    #[must_use]
    pub fn from_config(config: SliderConfig) -> Self {
        Self {
            config,
            sizing: SizingMethod::FirstChild,
            rounding_fn: None,
        }
    }

    #[must_use]
    pub fn with_scroll_timeout(mut self, timeout: Duration) -> Self {
        self.config.scroll_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.config.rounding = rounding;
        self
    }

    #[must_use]
    pub fn with_rounding_fn(mut self, rounding: impl Fn(f64) -> f64 + 'static) -> Self {
        self.rounding_fn = Some(Box::new(rounding));
        self
    }

    #[must_use]
    pub fn with_sizing(mut self, sizing: SizingMethod<C>) -> Self {
        self.sizing = sizing;
        self
    }

    #[must_use]
    pub fn with_slide(mut self, slide: usize) -> Self {
        self.config.slide = slide;
        self
    }
}
