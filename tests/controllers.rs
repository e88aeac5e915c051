use std::collections::BTreeMap;

use verbscope::brightness::{multiplier_for, DEFAULT_LEVEL, TOTAL_BLOCKS};
use verbscope::content::{ContentLibrary, ContentSet};
use verbscope::glyphs::GlyphCache;
use verbscope::host::RecordingHost;
use verbscope::input::{InputEvent, Key};
use verbscope::machine::State;
use verbscope::pool::TextPool;
use verbscope::scroll_zoom::MAX_ZOOM;
use verbscope::session::{Session, SessionOptions};
use verbscope::theme::{ThemeMode, Tone};

fn session() -> Session<RecordingHost> {
    let mut groups = BTreeMap::new();
    groups.insert(
        "en".to_owned(),
        vec![ContentSet {
            name: "pirate".to_owned(),
            display_name: String::new(),
            description: String::new(),
            author: String::new(),
            github: String::new(),
            language: "en".to_owned(),
            category: String::new(),
            verbs: vec!["Plundering".to_owned()],
        }],
    );
    let library = ContentLibrary::from_groups(groups, BTreeMap::new());
    let options = SessionOptions {
        view_w: 320,
        view_h: 200,
        mobile: Some(false),
        ..SessionOptions::default()
    };
    let mut session = Session::new(&library, options, GlyphCache::blocks(), RecordingHost::default())
        .expect("session should build");
    session.start(0);
    session
}

fn frames(session: &mut Session<RecordingHost>, from: u64, to: u64) {
    let mut now = from;
    while now < to {
        now += 16;
        session.frame(now);
    }
}

#[test]
fn wheel_zoom_springs_back_to_exactly_one() {
    let mut session = session();
    session
        .handle_input(
            InputEvent::Wheel {
                delta_y: -400.0,
                x: 100.0,
                y: 50.0,
            },
            10,
        )
        .expect("wheel");
    session.frame(16);
    let zoomed = session.params().scroll_zoom;
    assert!(zoomed > 1.0 && zoomed <= MAX_ZOOM);
    assert_eq!(session.scroll_zoom().pivot(), (100.0, 50.0));

    frames(&mut session, 16, 400);
    assert_eq!(session.params().scroll_zoom, zoomed, "held while input is recent");

    frames(&mut session, 400, 6_000);
    assert_eq!(session.params().scroll_zoom, 1.0);
    assert!(!session.scroll_zoom().is_springing());
}

#[test]
fn wheel_down_never_zooms_out_past_one() {
    let mut session = session();
    session
        .handle_input(
            InputEvent::Wheel {
                delta_y: 900.0,
                x: 0.0,
                y: 0.0,
            },
            10,
        )
        .expect("wheel");
    frames(&mut session, 0, 200);
    assert_eq!(session.params().scroll_zoom, 1.0);
}

#[test]
fn brightness_keys_step_the_bar_and_clamp() {
    let mut session = session();
    for at in 0..3 {
        session
            .handle_input(InputEvent::key_down(Key::Char('+')), at)
            .expect("key");
    }
    assert_eq!(session.brightness().level(), DEFAULT_LEVEL + 3);
    for at in 0..20 {
        session
            .handle_input(InputEvent::key_down(Key::Char('-')), 10 + at)
            .expect("key");
    }
    assert_eq!(session.brightness().level(), 0);
    assert_eq!(session.brightness().multiplier(), multiplier_for(0));
    assert!(session.brightness().level() <= TOTAL_BLOCKS);
    assert_eq!(session.state(), State::Boot, "brightness keys never dispatch");
}

#[test]
fn pointer_parallax_eases_toward_the_corner() {
    let mut session = session();
    session
        .handle_input(InputEvent::PointerMove { x: 320.0, y: 200.0 }, 0)
        .expect("pointer");
    session.frame(16);
    let first = session.params().mouse_translate_x;
    assert!(first < 0.0);
    frames(&mut session, 16, 4_000);
    let settled = session.params().mouse_translate_x;
    assert!(settled < first);
    assert!((settled + 0.6).abs() < 0.05);
    assert!(session.params().mouse_zoom < 1.0);
}

#[test]
fn overlap_eases_the_depth_of_field_in_and_out() {
    let mut session = session();
    session.set_overlap(true);
    frames(&mut session, 0, 3_000);
    assert!(session.effects().dof.strength() > 0.9);
    session.set_overlap(false);
    frames(&mut session, 3_000, 6_000);
    assert!(session.effects().dof.strength() < 0.1);
}

#[test]
fn theme_switch_recolours_and_keeps_running() {
    let mut session = session();
    let dark_bg = session.params().bg_color;
    session.set_theme(ThemeMode::Light).expect("theme");
    assert!(session.theme().is_light());
    assert_ne!(session.params().bg_color, dark_bg);
    frames(&mut session, 0, 100);
    session.render().expect("render after theme switch");
}

#[test]
fn font_size_change_remeasures_layout() {
    let mut session = session();
    let before = session.layout_ctx().line_height;
    session.params_mut().font_size *= 2.0;
    session.sync_params().expect("sync");
    assert!(session.layout_ctx().line_height > before);
}

#[test]
fn invalid_params_are_rejected_on_sync() {
    let mut session = session();
    session.params_mut().bloom_strength = f32::NAN;
    let err = session.sync_params().expect_err("nan should be rejected");
    assert!(format!("{err:#}").contains("bloom_strength"));
}

#[test]
fn pool_keeps_at_most_its_capacity() {
    let mut pool = TextPool::default();
    let primitives: Vec<_> = (0..60)
        .map(|index| pool.acquire(&format!("line {index}"), Tone::Output, 14.0))
        .collect();
    for primitive in primitives {
        pool.release(primitive);
    }
    assert_eq!(pool.available(), pool.capacity());
    let reused = pool.acquire("again", Tone::Dim, 12.0);
    assert_eq!(reused.text, "again");
    assert_eq!(pool.available(), pool.capacity() - 1);
}
