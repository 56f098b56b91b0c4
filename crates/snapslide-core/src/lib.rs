#![forbid(unsafe_code)]

//! Core: slide events, deterministic scheduling, item order, and the scroll
//! container contract.
//!
//! Nothing here owns a rendering surface or a real clock. The host pushes
//! time forward and reports scroll/resize activity through a
//! [`ScrollContainer`](container::ScrollContainer).

pub mod container;
pub mod event;
pub mod schedule;
pub mod track;
pub mod virtual_container;

pub use container::{ContainerNotice, ScrollBehavior, ScrollContainer, SnapMode};
pub use event::{
    InteractionFlags, InteractionKind, InteractionSet, ParseInteractionError, SlideEvent,
    SlideEventKind,
};
pub use schedule::{DeterministicClock, FrameHandle, Scheduler, TimerId, TimerSlot};
pub use track::Track;
pub use virtual_container::VirtualContainer;
