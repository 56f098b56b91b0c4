#![forbid(unsafe_code)]

//! Slide lifecycle events and user interaction signals.
//!
//! A gesture produces exactly one [`SlideEvent::Start`], one
//! [`SlideEvent::Pass`] per crossed item boundary, and one
//! [`SlideEvent::Stop`] once scrolling has been quiet long enough.
//!
//! Interactions are the host's raw input notifications (touch, wheel, ...).
//! The engine never interprets them; plugins listen for the kinds they care
//! about.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Slide events
// ---------------------------------------------------------------------------

/// Discriminant of a [`SlideEvent`], used as a subscription topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlideEventKind {
    /// A gesture started moving away from the current slide.
    Start,
    /// The nearest slide changed mid-gesture.
    Pass,
    /// The gesture settled.
    Stop,
}

impl SlideEventKind {
    /// DOM-style event name (`slide-start`, `slide-pass`, `slide-stop`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "slide-start",
            Self::Pass => "slide-pass",
            Self::Stop => "slide-stop",
        }
    }
}

impl fmt::Display for SlideEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A slide lifecycle event with its integer payload.
///
/// `Start` carries the slide the gesture is heading towards, computed as
/// `current ± 1`; it may therefore be `-1` or one past the last slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type")
)]
pub enum SlideEvent {
    /// `slide-start(targetIndex)`.
    #[cfg_attr(feature = "serde", serde(rename = "slide-start"))]
    Start { target: isize },
    /// `slide-pass(newIndex)`.
    #[cfg_attr(feature = "serde", serde(rename = "slide-pass"))]
    Pass { index: usize },
    /// `slide-stop(finalIndex)`.
    #[cfg_attr(feature = "serde", serde(rename = "slide-stop"))]
    Stop { index: usize },
}

impl SlideEvent {
    /// The event's kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> SlideEventKind {
        match self {
            Self::Start { .. } => SlideEventKind::Start,
            Self::Pass { .. } => SlideEventKind::Pass,
            Self::Stop { .. } => SlideEventKind::Stop,
        }
    }

    /// The payload as a signed slide index.
    #[inline]
    #[must_use]
    pub const fn payload(&self) -> isize {
        match *self {
            Self::Start { target } => target,
            Self::Pass { index } | Self::Stop { index } => index as isize,
        }
    }
}

impl fmt::Display for SlideEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.payload())
    }
}

// ---------------------------------------------------------------------------
// Interactions
// ---------------------------------------------------------------------------

/// A user interaction reported by the host.
///
/// The named variants are the interactions the bundled plugins know about.
/// Any other host event name travels as [`InteractionKind::Other`]; build it
/// through [`InteractionKind::named`] or [`str::parse`] so that built-in
/// names always resolve to their variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InteractionKind {
    TouchStart,
    TouchMove,
    TouchEnd,
    Wheel,
    PointerDown,
    KeyDown,
    /// A host event name outside the built-in set, trimmed and lowercased.
    Other(Cow<'static, str>),
}

impl InteractionKind {
    /// Every built-in interaction kind, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::TouchStart,
        Self::TouchMove,
        Self::TouchEnd,
        Self::Wheel,
        Self::PointerDown,
        Self::KeyDown,
    ];

    /// Interaction for an arbitrary host event name.
    ///
    /// Built-in names (in any of the spellings [`FromStr`] accepts) map to
    /// their variant; everything else becomes [`InteractionKind::Other`].
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        if let Some(kind) = Self::builtin(&name) {
            return kind;
        }
        let canonical = {
            let trimmed = name.trim();
            trimmed.len() == name.len() && !trimmed.bytes().any(|b| b.is_ascii_uppercase())
        };
        if canonical {
            Self::Other(name)
        } else {
            Self::Other(Cow::Owned(name.trim().to_ascii_lowercase()))
        }
    }

    /// The built-in kind spelled `name`, ignoring case, `-` and `_`.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL.into_iter().find(|kind| kind.name() == normalized)
    }

    /// The same interaction with its name normalized as [`Self::named`] does.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Other(name) => Self::named(name),
            kind => kind,
        }
    }

    /// DOM event name for this interaction.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::Wheel => "wheel",
            Self::PointerDown => "pointerdown",
            Self::KeyDown => "keydown",
            Self::Other(name) => name,
        }
    }

    /// The single-bit flag of a built-in kind; `None` for [`Self::Other`].
    #[must_use]
    pub const fn flag(&self) -> Option<InteractionFlags> {
        match self {
            Self::TouchStart => Some(InteractionFlags::TOUCH_START),
            Self::TouchMove => Some(InteractionFlags::TOUCH_MOVE),
            Self::TouchEnd => Some(InteractionFlags::TOUCH_END),
            Self::Wheel => Some(InteractionFlags::WHEEL),
            Self::PointerDown => Some(InteractionFlags::POINTER_DOWN),
            Self::KeyDown => Some(InteractionFlags::KEY_DOWN),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a string cannot name an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInteractionError {
    name: String,
}

impl ParseInteractionError {
    /// The rejected name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ParseInteractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str("empty interaction name")
        } else {
            write!(f, "invalid interaction name '{}'", self.name)
        }
    }
}

impl std::error::Error for ParseInteractionError {}

impl FromStr for InteractionKind {
    type Err = ParseInteractionError;

    /// Accepts DOM names (`touchmove`) as well as kebab/snake spellings
    /// (`touch-move`, `touch_move`) of the built-in kinds, case-insensitively.
    /// Any other single word is a custom interaction.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() || name.contains(|c: char| c.is_whitespace() || c == ',') {
            return Err(ParseInteractionError {
                name: name.to_owned(),
            });
        }
        Ok(Self::named(name.to_owned()))
    }
}

bitflags! {
    /// Built-in [`InteractionKind`]s as bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InteractionFlags: u8 {
        const TOUCH_START  = 0b0000_0001;
        const TOUCH_MOVE   = 0b0000_0010;
        const TOUCH_END    = 0b0000_0100;
        const WHEEL        = 0b0000_1000;
        const POINTER_DOWN = 0b0001_0000;
        const KEY_DOWN     = 0b0010_0000;
    }
}

/// A set of [`InteractionKind`]s: built-in kinds as flags plus custom names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InteractionSet {
    builtin: InteractionFlags,
    custom: BTreeSet<Cow<'static, str>>,
}

impl InteractionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builtin.is_empty() && self.custom.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.builtin.iter().count() + self.custom.len()
    }

    /// The built-in members.
    #[must_use]
    pub const fn flags(&self) -> InteractionFlags {
        self.builtin
    }

    /// Add `kind`, returning whether it was new.
    pub fn insert(&mut self, kind: InteractionKind) -> bool {
        match kind.normalized() {
            InteractionKind::Other(name) => self.custom.insert(name),
            kind => {
                let Some(flag) = kind.flag() else {
                    return false;
                };
                let fresh = !self.builtin.contains(flag);
                self.builtin.insert(flag);
                fresh
            }
        }
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with(mut self, kind: InteractionKind) -> Self {
        self.insert(kind);
        self
    }

    /// Whether `kind` is a member of the set.
    #[must_use]
    pub fn has(&self, kind: &InteractionKind) -> bool {
        match kind.clone().normalized() {
            InteractionKind::Other(name) => self.custom.contains(&name),
            builtin => builtin.flag().is_some_and(|flag| self.builtin.contains(flag)),
        }
    }

    /// Built-in members in declaration order, then custom names sorted.
    pub fn kinds(&self) -> impl Iterator<Item = InteractionKind> + '_ {
        InteractionKind::ALL
            .into_iter()
            .filter(move |kind| kind.flag().is_some_and(|flag| self.builtin.contains(flag)))
            .chain(self.custom.iter().cloned().map(InteractionKind::Other))
    }

    /// Parse a comma-separated list of interaction names.
    ///
    /// Empty entries are ignored, so `""` parses to the empty set. Names
    /// outside the built-in kinds are kept as custom interactions.
    pub fn parse_list(list: &str) -> Result<Self, ParseInteractionError> {
        list.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .try_fold(Self::new(), |set, part| {
                part.parse::<InteractionKind>().map(|kind| set.with(kind))
            })
    }
}

impl From<InteractionFlags> for InteractionSet {
    fn from(builtin: InteractionFlags) -> Self {
        Self {
            builtin,
            custom: BTreeSet::new(),
        }
    }
}

impl Extend<InteractionKind> for InteractionSet {
    fn extend<I: IntoIterator<Item = InteractionKind>>(&mut self, iter: I) {
        for kind in iter {
            self.insert(kind);
        }
    }
}

impl FromIterator<InteractionKind> for InteractionSet {
    fn from_iter<I: IntoIterator<Item = InteractionKind>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl fmt::Display for InteractionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kind) in self.kinds().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(kind.name())?;
        }
        Ok(())
    }
}

/// Serialized as a list of event names.
#[cfg(feature = "serde")]
impl serde::Serialize for InteractionSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.kinds().map(|kind| kind.name().to_owned()))
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for InteractionSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = <Vec<String> as serde::Deserialize>::deserialize(deserializer)?;
        names
            .iter()
            .map(|name| name.parse::<InteractionKind>())
            .collect::<Result<Self, _>>()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_and_payload() {
        let start = SlideEvent::Start { target: -1 };
        assert_eq!(start.kind(), SlideEventKind::Start);
        assert_eq!(start.payload(), -1);

        let pass = SlideEvent::Pass { index: 3 };
        assert_eq!(pass.kind(), SlideEventKind::Pass);
        assert_eq!(pass.payload(), 3);
    }

    #[test]
    fn event_display_uses_dom_names() {
        assert_eq!(SlideEvent::Start { target: 1 }.to_string(), "slide-start(1)");
        assert_eq!(SlideEvent::Pass { index: 2 }.to_string(), "slide-pass(2)");
        assert_eq!(SlideEvent::Stop { index: 0 }.to_string(), "slide-stop(0)");
    }

    #[test]
    fn interaction_parses_dom_and_kebab_names() {
        assert_eq!("touchmove".parse::<InteractionKind>(), Ok(InteractionKind::TouchMove));
        assert_eq!("touch-move".parse::<InteractionKind>(), Ok(InteractionKind::TouchMove));
        assert_eq!(" Wheel ".parse::<InteractionKind>(), Ok(InteractionKind::Wheel));
        assert_eq!(
            "POINTER_DOWN".parse::<InteractionKind>(),
            Ok(InteractionKind::PointerDown)
        );
    }

    #[test]
    fn unknown_names_become_custom_interactions() {
        let kind = " MouseDown ".parse::<InteractionKind>().unwrap();
        assert_eq!(kind, InteractionKind::Other("mousedown".into()));
        assert_eq!(kind.name(), "mousedown");
        assert_eq!(kind.flag(), None);
        assert_eq!(InteractionKind::named("pointermove").to_string(), "pointermove");
        assert_eq!(InteractionKind::named("wheel"), InteractionKind::Wheel);
        assert_eq!(
            InteractionKind::Other("Touch-Move".into()).normalized(),
            InteractionKind::TouchMove
        );
    }

    #[test]
    fn interaction_rejects_empty_or_multiword_names() {
        let err = "  ".parse::<InteractionKind>().unwrap_err();
        assert_eq!(err.name(), "");
        assert_eq!(err.to_string(), "empty interaction name");

        let err = "mouse down".parse::<InteractionKind>().unwrap_err();
        assert_eq!(err.to_string(), "invalid interaction name 'mouse down'");
    }

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in InteractionKind::ALL {
            assert_eq!(kind.name().parse::<InteractionKind>(), Ok(kind));
        }
    }

    #[test]
    fn set_parse_list() {
        let set = InteractionSet::parse_list("touchmove, wheel").unwrap();
        assert_eq!(
            set,
            InteractionSet::from(InteractionFlags::TOUCH_MOVE | InteractionFlags::WHEEL)
        );
        assert_eq!(
            set.kinds().collect::<Vec<_>>(),
            vec![InteractionKind::TouchMove, InteractionKind::Wheel]
        );
        assert!(InteractionSet::parse_list("").unwrap().is_empty());
        assert!(InteractionSet::parse_list("wheel,mouse down").is_err());
    }

    #[test]
    fn set_keeps_custom_names_after_builtins() {
        let set = InteractionSet::parse_list("pointermove,mousedown,wheel").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.flags(), InteractionFlags::WHEEL);
        assert_eq!(
            set.kinds().collect::<Vec<_>>(),
            vec![
                InteractionKind::Wheel,
                InteractionKind::Other("mousedown".into()),
                InteractionKind::Other("pointermove".into()),
            ]
        );
        assert!(set.has(&InteractionKind::named("mousedown")));
        assert!(set.has(&InteractionKind::Other("MouseDown".into())));
        assert!(!set.has(&InteractionKind::named("mouseup")));
        assert_eq!(set.to_string(), "wheel,mousedown,pointermove");
    }

    #[test]
    fn set_from_iterator() {
        let set: InteractionSet = [InteractionKind::KeyDown, InteractionKind::KeyDown]
            .into_iter()
            .collect();
        assert_eq!(set, InteractionSet::from(InteractionFlags::KEY_DOWN));
        assert!(set.has(&InteractionKind::KeyDown));
        assert!(!set.has(&InteractionKind::Wheel));
    }

    #[test]
    fn insert_reports_new_members() {
        let mut set = InteractionSet::new();
        assert!(set.insert(InteractionKind::Wheel));
        assert!(!set.insert(InteractionKind::named("WHEEL")));
        assert!(set.insert(InteractionKind::named("mousedown")));
        assert!(!set.insert(InteractionKind::Other("mousedown".into())));
        assert_eq!(set.len(), 2);
    }
}
