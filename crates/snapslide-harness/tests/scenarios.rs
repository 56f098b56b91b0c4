#![forbid(unsafe_code)]

//! End-to-end carousel scenarios driven through [`SliderHarness`].
//!
//! Each test plays a host event loop at 60 Hz against a
//! [`VirtualContainer`] and checks the emitted event stream together with
//! the resulting slide, offset and display order.

use std::time::Duration;

use pretty_assertions::assert_eq;
use snapslide_core::{InteractionKind, ScrollContainer, SlideEvent, VirtualContainer};
use snapslide_harness::SliderHarness;
use snapslide_plugins::{
    AUTOPLAY_PLUGIN_ID, AutoplayConfig, AutoplayPlugin, LOOP_PLUGIN_ID, LoopPlugin,
    autoplay::ENV_AUTOPLAY_EVENTS,
};
use snapslide_runtime::{Slider, SliderOptions};

const ITEM: f64 = 200.0;
const INTERVAL: Duration = Duration::from_millis(3141);
const RESUME: Duration = Duration::from_millis(6282);

// ═══════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════

fn harness(count: usize, slide: usize) -> SliderHarness<VirtualContainer> {
    SliderHarness::new(Slider::new(
        VirtualContainer::uniform(ITEM, ITEM, count),
        SliderOptions::default().with_slide(slide),
    ))
}

fn with_autoplay(h: &mut SliderHarness<VirtualContainer>) {
    h.slider_mut().register(
        Box::new(AutoplayPlugin::new(
            INTERVAL,
            RESUME,
            [InteractionKind::TouchMove, InteractionKind::Wheel],
        )),
        true,
    );
}

fn autoplay(h: &SliderHarness<VirtualContainer>) -> &AutoplayPlugin {
    h.slider()
        .plugin_as::<AutoplayPlugin>(AUTOPLAY_PLUGIN_ID)
        .expect("autoplay registered")
}

/// Original index of the item currently filling the viewport.
fn visible(h: &SliderHarness<VirtualContainer>) -> usize {
    let c = h.container();
    let position = (c.scroll_offset() / ITEM).round() as usize;
    c.track().original_at(position).expect("position in range")
}

fn run_until(h: &mut SliderHarness<VirtualContainer>, at: Duration) {
    let remaining = at.saturating_sub(h.now());
    h.run_for(remaining);
}

// ═══════════════════════════════════════════════════════════════════════
// 1. A single scroll settles into start / pass / stop
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn scroll_one_item_then_quiet() {
    let mut h = harness(5, 0);
    assert!(h.settle());
    assert!(h.events().is_empty());

    h.scroll_by(ITEM);
    assert!(h.settle());

    assert_eq!(
        h.event_log(),
        vec![
            SlideEvent::Start { target: 1 },
            SlideEvent::Pass { index: 1 },
            SlideEvent::Stop { index: 1 },
        ]
    );
    assert_eq!(h.slide(), 1);

    let events = h.events();
    assert!(events[2].at - events[1].at >= Duration::from_millis(100));
}

#[test]
fn stop_waits_for_the_configured_timeout() {
    let mut h = SliderHarness::new(Slider::new(
        VirtualContainer::uniform(ITEM, ITEM, 5),
        SliderOptions::default().with_scroll_timeout(Duration::from_millis(400)),
    ));
    h.settle();
    h.scroll_by(ITEM);
    h.run_for(Duration::from_millis(300));
    assert_eq!(h.event_log().len(), 2);
    assert!(h.settle());
    assert_eq!(h.event_log().last(), Some(&SlideEvent::Stop { index: 1 }));
}

// ═══════════════════════════════════════════════════════════════════════
// 2. Loop wraps backward past the start without a visible jump
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn loop_wraps_backward_past_start() {
    let mut h = harness(4, 1);
    h.slider_mut().register(Box::new(LoopPlugin::new()), true);
    assert!(h.settle());
    assert_eq!(h.container().display_order(), &[0, 1, 2, 3]);
    assert_eq!(h.container().scroll_offset(), ITEM);
    assert_eq!(visible(&h), 1);

    h.scroll_by(-ITEM);
    assert!(h.settle());

    // [A, B, C, D] became [D, A, B, C]; A, reached by the scroll, stays in view.
    assert_eq!(h.container().display_order(), &[3, 0, 1, 2]);
    assert_eq!(h.container().scroll_offset(), ITEM);
    assert_eq!(visible(&h), 0);
    assert_eq!(h.slide(), 1);
    assert_eq!(
        h.event_log(),
        vec![
            SlideEvent::Start { target: 0 },
            SlideEvent::Pass { index: 0 },
            SlideEvent::Stop { index: 1 },
        ]
    );

    let plugin = h
        .slider()
        .plugin_as::<LoopPlugin>(LOOP_PLUGIN_ID)
        .expect("loop registered");
    assert_eq!(plugin.wrap_count(), 1);
    assert!(!plugin.is_resnapping());
}

#[test]
fn loop_wrap_keeps_viewport_content_every_frame() {
    let mut h = harness(4, 1);
    h.slider_mut().register(Box::new(LoopPlugin::new()), true);
    h.settle();
    h.scroll_by(-ITEM);

    let shown = visible(&h);
    for _ in 0..40 {
        h.step();
        assert_eq!(visible(&h), shown);
        assert_eq!(h.container().scroll_offset() % ITEM, 0.0);
    }
    assert_eq!(h.container().display_order(), &[3, 0, 1, 2]);
}

#[test]
fn loop_wraps_forward_past_end() {
    let mut h = harness(4, 2);
    h.slider_mut().register(Box::new(LoopPlugin::new()), true);
    h.settle();
    assert_eq!(visible(&h), 2);

    h.scroll_by(ITEM);
    assert!(h.settle());

    assert_eq!(h.container().display_order(), &[1, 2, 3, 0]);
    assert_eq!(h.container().scroll_offset(), 2.0 * ITEM);
    assert_eq!(visible(&h), 3);
    assert_eq!(h.event_log().last(), Some(&SlideEvent::Stop { index: 2 }));
}

#[test]
fn loop_needs_three_items() {
    let mut h = harness(2, 0);
    h.slider_mut().register(Box::new(LoopPlugin::new()), true);
    h.settle();
    h.scroll_by(ITEM);
    h.settle();
    assert_eq!(h.container().display_order(), &[0, 1]);
    assert_eq!(h.slide(), 1);
}

// ═══════════════════════════════════════════════════════════════════════
// 3. Autoplay advances once per interval and rewinds at the end
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn autoplay_advances_and_rewinds() {
    let mut h = harness(4, 0);
    with_autoplay(&mut h);

    run_until(&mut h, INTERVAL - Duration::from_millis(16));
    assert_eq!(h.slide(), 0);
    assert!(h.events().is_empty());

    let settle_margin = Duration::from_millis(1000);
    for (k, expected) in [1, 2, 3, 0, 1].into_iter().enumerate() {
        run_until(&mut h, INTERVAL * (k as u32 + 1) + settle_margin);
        assert_eq!(h.slide(), expected, "after tick {}", k + 1);
        assert_eq!(
            h.event_log().last(),
            Some(&SlideEvent::Stop { index: expected })
        );
    }
    assert_eq!(autoplay(&h).tick_count(), 5);
    assert!(autoplay(&h).is_running());
}

#[test]
fn autoplay_with_loop_never_rewinds() {
    let mut h = harness(4, 0);
    h.slider_mut().register(Box::new(LoopPlugin::new()), true);
    with_autoplay(&mut h);
    h.run_for(Duration::from_millis(500));
    assert_eq!(visible(&h), 0);

    let settle_margin = Duration::from_millis(1000);
    for k in 1..=8u32 {
        run_until(&mut h, INTERVAL * k + settle_margin);
        assert_eq!(visible(&h), k as usize % 4, "after tick {k}");
    }
    assert!(
        h.event_log()
            .iter()
            .all(|event| !matches!(event, SlideEvent::Pass { index: 0 }))
    );
}

// ═══════════════════════════════════════════════════════════════════════
// 4. Interaction pauses autoplay until the user goes quiet
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn touch_pauses_then_resumes_after_delay() {
    let mut h = harness(4, 0);
    with_autoplay(&mut h);
    h.run_for(Duration::from_millis(1000));
    assert!(autoplay(&h).is_running());

    let touched_at = h.now();
    h.interact(InteractionKind::TouchMove);
    assert!(!autoplay(&h).is_running());
    assert!(autoplay(&h).is_paused());

    run_until(&mut h, touched_at + RESUME - Duration::from_millis(32));
    assert!(autoplay(&h).is_paused());
    assert_eq!(autoplay(&h).tick_count(), 0);
    assert_eq!(h.slide(), 0);

    h.run_for(Duration::from_millis(64));
    assert!(autoplay(&h).is_running());
    assert_eq!(autoplay(&h).resume_count(), 1);

    // The repeating timer restarts from the resume, not from the first tick.
    let resumed_at = h.now();
    run_until(&mut h, resumed_at + INTERVAL - Duration::from_millis(100));
    assert_eq!(h.slide(), 0);
    h.run_for(Duration::from_millis(1000));
    assert_eq!(h.slide(), 1);
}

#[test]
fn unlisted_interaction_is_ignored() {
    let mut h = harness(4, 0);
    with_autoplay(&mut h);
    h.run_for(Duration::from_millis(100));
    h.interact(InteractionKind::KeyDown);
    assert!(autoplay(&h).is_running());
    assert!(!autoplay(&h).is_paused());
}

#[test]
fn custom_event_names_from_env_pause_autoplay() {
    let parse = AutoplayConfig::from_env_with(|key| {
        (key == ENV_AUTOPLAY_EVENTS).then(|| "mousedown,pointermove".to_string())
    });
    assert!(parse.errors.is_empty());

    let mut h = harness(4, 0);
    h.slider_mut()
        .register(Box::new(AutoplayPlugin::from_config(parse.config)), true);
    h.run_for(Duration::from_millis(100));

    h.interact(InteractionKind::TouchMove);
    assert!(autoplay(&h).is_running());

    h.interact(InteractionKind::named("pointermove"));
    assert!(!autoplay(&h).is_running());
    assert!(autoplay(&h).is_paused());

    h.run_for(RESUME + Duration::from_millis(32));
    assert!(autoplay(&h).is_running());
    assert_eq!(autoplay(&h).resume_count(), 1);
}

// ═══════════════════════════════════════════════════════════════════════
// 5. An empty container starts tracking once children appear
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn empty_container_starts_tracking_after_children_appear() {
    let mut h = SliderHarness::new(Slider::new(
        VirtualContainer::empty(ITEM),
        SliderOptions::default(),
    ));
    assert!(h.settle());
    assert_eq!(h.slider().item_size(), 0.0);

    h.slider_mut().update();
    assert!(h.settle());
    assert_eq!(h.slide(), 0);
    assert!(h.events().is_empty());

    for _ in 0..5 {
        h.container_mut().push_item(ITEM);
    }
    assert!(h.settle());
    assert_eq!(h.slider().item_size(), ITEM);
    assert!(h.events().is_empty());

    h.scroll_by(ITEM);
    assert!(h.settle());
    assert_eq!(
        h.event_log(),
        vec![
            SlideEvent::Start { target: 1 },
            SlideEvent::Pass { index: 1 },
            SlideEvent::Stop { index: 1 },
        ]
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Teardown
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn destroy_mid_gesture_silences_everything() {
    let mut h = harness(5, 0);
    h.slider_mut().register(Box::new(LoopPlugin::new()), true);
    with_autoplay(&mut h);
    h.run_for(Duration::from_millis(200));
    h.scroll_by(ITEM);
    h.step();
    h.step();
    h.take_events();

    h.slider_mut().destroy();
    assert!(h.slider().is_destroyed());

    h.scroll_by(ITEM);
    h.container_mut().push_item(ITEM);
    h.slider_mut().update();
    h.slider_mut().slide_to(3);
    h.interact(InteractionKind::TouchMove);
    for _ in 0..1000 {
        h.step();
    }
    assert!(h.events().is_empty());
    assert_eq!(h.slider().next_deadline(), None);
}
