//! The top-level session.
//!
//! Owns every subsystem record and drives them from two entry points: host
//! input ([`Session::handle_input`]) and the per-frame callback
//! ([`Session::frame`]). Within a frame the order is fixed: timers, tweens,
//! pointer parallax, interaction controllers, camera, spinner/scroll/demo
//! ticking, layout, flicker, effect sync. [`Session::render`] composites
//! whatever the last frame left behind.

use std::sync::Arc;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tiny_skia::Pixmap;
use tracing::{debug, info};

use crate::boot::{BootAnim, BootOutcome, HostInfo};
use crate::brightness::BrightnessBar;
use crate::camera::Camera;
use crate::compositor::{Compositor, FrameView};
use crate::config::{SequenceTiming, StateTable};
use crate::content::{demo_verbs, ContentLibrary, ContentSet};
use crate::effects::Effects;
use crate::esc_skip::EscSkip;
use crate::generator::LineBuffer;
use crate::glyphs::GlyphCache;
use crate::header::{build_header_rows, build_intro_rows, HEADER_COLS};
use crate::host::HostBridge;
use crate::input::{brightness_step, map_key, InputEvent, Key};
use crate::layout::{Anchors, ChromeVisibility, LayoutCtx};
use crate::machine::{self, suggestion, DispatchEvent, Effect, Machine, State};
use crate::mobile::{apply_marketplace_hint, is_mobile, next_tap_index};
use crate::params::{display_size, Params};
use crate::parallax::Parallax;
use crate::pool::{PoolStats, TextPool};
use crate::scene::{Scene, ScrollRow};
use crate::scheduler::{Scheduler, TimerEvent, TimerQueue};
use crate::scroll_zoom::ScrollZoom;
use crate::theme::{Theme, ThemeMode, Tone};
use crate::ticker::{self, TickerState, PERMS_TEXT};
use crate::tween::TweenSet;
use crate::zoom::{resolve_focus, FocusPoint, ZoomController};

pub const DEFAULT_VIEW_W: u32 = 1280;
pub const DEFAULT_VIEW_H: u32 = 800;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub view_w: u32,
    pub view_h: u32,
    /// Preferred language code, resolved against the library.
    pub language: String,
    pub seed: u64,
    pub theme: ThemeMode,
    /// Starting parameters; `None` uses the theme defaults.
    pub params: Option<Params>,
    /// Force compact mode on or off; `None` decides from the view width.
    pub mobile: Option<bool>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            view_w: DEFAULT_VIEW_W,
            view_h: DEFAULT_VIEW_H,
            language: "en".to_owned(),
            seed: 0,
            theme: ThemeMode::Dark,
            params: None,
            mobile: None,
        }
    }
}

/// A recorded state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub at_ms: u64,
    pub from: State,
    pub to: State,
}

pub struct Session<H: HostBridge> {
    host: H,
    theme: Theme,
    params: Params,
    table: StateTable,
    sequence: SequenceTiming,
    machine: Machine,
    sets: Vec<Arc<ContentSet>>,
    fallback: Option<Arc<ContentSet>>,
    scene: Scene,
    pool: TextPool,
    buffer: LineBuffer,
    lctx: LayoutCtx,
    anchors: Anchors,
    ticker: TickerState,
    timers: TimerQueue<TimerEvent>,
    tweens: TweenSet,
    zoom: ZoomController,
    camera: Camera,
    parallax: Parallax,
    scroll_zoom: ScrollZoom,
    esc: EscSkip,
    brightness: BrightnessBar,
    effects: Effects,
    boot: BootAnim,
    compositor: Compositor,
    rng: StdRng,
    view: (u32, u32),
    now_ms: u64,
    frames: u64,
    transitions: Vec<Transition>,
    started: bool,
    destroyed: bool,
}

impl<H: HostBridge> Session<H> {
    pub fn new(
        library: &ContentLibrary,
        options: SessionOptions,
        glyphs: GlyphCache,
        host: H,
    ) -> Result<Self> {
        let theme = Theme::new(options.theme);
        let params = match options.params {
            Some(params) => params,
            None => Params::for_theme(&theme),
        };
        params.validate()?;

        let mut rng = StdRng::seed_from_u64(options.seed);
        let fallback = library.find_fallback();
        let language = library.resolve_language(&options.language);
        let sets = library.build_locale_sets(&language, fallback.as_ref(), &mut rng);

        let (view_w, view_h) = (options.view_w.max(1), options.view_h.max(1));
        let sequence = SequenceTiming::default();
        let compositor = Compositor::new(glyphs, view_w, view_h)?;
        let ch_w = compositor.glyphs().char_width(params.font_size);
        let lctx = LayoutCtx::new(ch_w, params.font_size, params.line_height_offset);
        let (display_w, display_h) = display_size(view_w, view_h, params.display_downscale);
        let detect_lines = HostInfo::detect(display_w, display_h).detect_lines(&mut rng);
        let boot = BootAnim::new(&sequence, params.frame_ms, detect_lines);

        let mut machine = Machine::new(State::Boot);
        machine.mobile = options.mobile.unwrap_or_else(|| is_mobile(view_w));

        let mut scene = Scene::new();
        scene.scroll.extend(
            build_intro_rows()
                .into_iter()
                .chain(build_header_rows(HEADER_COLS, sets.len()))
                .map(ScrollRow::Header),
        );

        let effects = Effects::new(&mut rng);
        let camera = Camera::new(view_w as f32, view_h as f32, params.screen_padding);
        info!(
            language,
            sets = sets.len(),
            fallback = fallback.is_some(),
            mobile = machine.mobile,
            "session created"
        );

        let mut session = Self {
            host,
            theme,
            params,
            table: StateTable::resolve(),
            zoom: ZoomController::new(sequence),
            sequence,
            machine,
            sets,
            fallback,
            scene,
            pool: TextPool::default(),
            buffer: LineBuffer::new(),
            lctx,
            anchors: Anchors::default(),
            ticker: TickerState::new(0),
            timers: TimerQueue::new(),
            tweens: TweenSet::new(),
            camera,
            parallax: Parallax::default(),
            scroll_zoom: ScrollZoom::default(),
            esc: EscSkip::default(),
            brightness: BrightnessBar::default(),
            effects,
            boot,
            compositor,
            rng,
            view: (view_w, view_h),
            now_ms: 0,
            frames: 0,
            transitions: Vec::new(),
            started: false,
            destroyed: false,
        };
        session.resize(view_w, view_h)?;
        Ok(session)
    }

    /// Enter the opening state: BOOT, or straight into the demo of the first
    /// set in compact mode.
    pub fn start(&mut self, now_ms: u64) {
        if self.started || self.destroyed {
            return;
        }
        self.started = true;
        self.now_ms = now_ms;
        self.ticker = TickerState::new(now_ms);
        if self.machine.mobile {
            if let Some(first) = self.sets.first().cloned() {
                self.machine.active_set = Some(first);
                self.enter_state(State::Demo);
            }
            apply_marketplace_hint(&mut self.scene, &mut self.lctx);
            self.ticker.layout_dirty = true;
        } else {
            self.enter_state(State::Boot);
            self.zoom.start_baseline(&mut self.tweens, &self.params, now_ms);
        }
    }

    /// One display refresh.
    pub fn frame(&mut self, now_ms: u64) {
        if self.destroyed {
            return;
        }
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        self.fire_timers(now);

        let finished = self.tweens.update(now, &mut self.params);
        if !finished.is_empty() {
            self.zoom
                .on_finished(&finished, &mut self.tweens, &self.params, now);
        }
        self.parallax.step(&mut self.params);
        self.scroll_zoom.step(now, &mut self.params);
        self.tick_esc(now);
        self.brightness.tick(now);
        self.camera.update(&self.params);

        ticker::tick_spinner(now, &mut self.ticker, &mut self.scene, &self.params);
        ticker::tick_scroll(
            now,
            &mut self.ticker,
            &mut self.scene,
            &self.machine,
            &self.params,
            &mut self.buffer,
            &mut self.pool,
            &self.lctx,
            &self.sequence,
            &mut self.rng,
        );
        if self.machine.current.is_demo_like() {
            ticker::tick_demo(
                now,
                &mut self.ticker,
                &mut self.scene,
                &self.params,
                &self.lctx,
                &mut self.rng,
            );
        }
        self.layout_if_dirty();
        ticker::tick_flicker(
            &mut self.scene,
            &self.machine,
            &self.params,
            &mut self.effects.flicker,
            &self.lctx,
            &mut self.rng,
        );
        self.effects.sync(
            &self.params,
            self.brightness.multiplier(),
            self.machine.overlap,
            self.theme.is_light(),
        );
        self.frames += 1;
    }

    /// Composite the current scene.
    pub fn render(&mut self) -> Result<&Pixmap> {
        let esc_progress =
            (self.machine.current == State::EscCountdown).then(|| self.esc.progress());
        let frame = FrameView {
            scene: &self.scene,
            params: &self.params,
            theme: &self.theme,
            effects: &self.effects,
            camera: &self.camera,
            ch_w: self.lctx.ch_w,
            line_height: self.lctx.line_height,
            now_ms: self.now_ms,
            scroll_zoom: self.params.scroll_zoom,
            scroll_pivot: self.scroll_zoom.pivot(),
            esc_progress,
            brightness: &self.brightness,
        };
        self.compositor.render(&frame)
    }

    pub fn handle_input(&mut self, event: InputEvent, now_ms: u64) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;
        match event {
            InputEvent::KeyDown { key, shift, repeat } => self.key_down(key, shift, repeat, now),
            InputEvent::KeyUp { key } => {
                if key == Key::Escape
                    && self.esc.key_up()
                    && self.machine.current == State::EscCountdown
                {
                    self.enter_state(self.machine.previous);
                }
            }
            InputEvent::PointerMove { x, y } => {
                let (w, h) = self.view;
                self.parallax.pointer_moved(x / w as f32, y / h as f32);
            }
            InputEvent::Wheel { delta_y, x, y } => self.scroll_zoom.wheel(delta_y, x, y, now),
            InputEvent::Tap => self.tap(),
            InputEvent::Resize { width, height } => self.resize(width, height)?,
        }
        Ok(())
    }

    /// Resize the view; the display surface, mesh and overlays follow.
    pub fn resize(&mut self, view_w: u32, view_h: u32) -> Result<()> {
        let (view_w, view_h) = (view_w.max(1), view_h.max(1));
        self.view = (view_w, view_h);
        let (display_w, display_h) =
            display_size(view_w, view_h, self.params.display_downscale);
        self.scene.resize(
            display_w as f32,
            display_h as f32,
            self.params.screen_padding,
        );
        self.camera
            .resize(view_w as f32, view_h as f32, self.params.screen_padding);
        self.camera.update(&self.params);
        self.effects.resize(
            self.scene.surface_size(),
            (view_w, view_h),
            &self.theme.palette,
            &mut self.rng,
        );
        self.compositor.resize(view_w, view_h)?;
        self.lctx.prev_rule_cols = 0;
        if self.machine.mobile && self.started {
            apply_marketplace_hint(&mut self.scene, &mut self.lctx);
        }
        self.ticker.layout_dirty = true;
        debug!(view_w, view_h, display_w, display_h, "session resized");
        Ok(())
    }

    /// Push the parameter store into everything that caches from it: font
    /// metrics, surface sizes, camera and the post stack.
    pub fn sync_params(&mut self) -> Result<()> {
        if self.destroyed {
            return Ok(());
        }
        self.params.validate()?;
        let glyphs = self.compositor.glyphs();
        if self.lctx.sync(&self.params, |size| glyphs.char_width(size)) {
            debug!(
                ch_w = self.lctx.ch_w,
                line_height = self.lctx.line_height,
                "font metrics remeasured"
            );
        }
        let (w, h) = self.view;
        self.resize(w, h)?;
        self.camera.update(&self.params);
        let dof_strength = self.effects.dof.strength();
        self.effects.post.sync(
            &self.params,
            self.brightness.multiplier(),
            dof_strength,
            self.theme.is_light(),
        );
        self.effects.dead_pixels_visible = self.params.dead_pixels_enabled;
        self.effects.glare_opacity = self.params.glare_opacity;
        self.effects.breathing.enabled = self.params.breathing_enabled;
        self.ticker.layout_dirty = true;
        Ok(())
    }

    /// Switch light/dark. Theme-bound colour knobs are reset to the new
    /// theme's defaults.
    pub fn set_theme(&mut self, mode: ThemeMode) -> Result<()> {
        self.theme = Theme::new(mode);
        self.params.apply_theme(&self.theme);
        info!(light = self.theme.is_light(), "theme changed");
        self.sync_params()
    }

    /// Caller-signalled overlap; the depth-of-field blur eases toward it.
    pub fn set_overlap(&mut self, overlap: bool) {
        self.machine.overlap = overlap;
    }

    /// Cancel every timer and tween and return pooled text. Nothing fires
    /// afterwards; later calls are no-ops.
    pub fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.boot.destroy(&mut self.timers);
        self.timers.clear();
        self.machine.demo_timer = None;
        self.machine.bug_timer = None;
        self.tweens.stop_all();
        self.scroll_zoom.disable(&mut self.params);
        self.esc.reset();
        self.scene.clear_scroll(&mut self.pool);
        self.pool.flush();
        info!(frames = self.frames, "session torn down");
    }

    pub fn state(&self) -> State {
        self.machine.current
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Edit parameters directly; call [`Session::sync_params`] afterwards.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn sets(&self) -> &[Arc<ContentSet>] {
        &self.sets
    }

    pub fn ticker(&self) -> &TickerState {
        &self.ticker
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn layout_ctx(&self) -> &LayoutCtx {
        &self.lctx
    }

    pub fn brightness(&self) -> &BrightnessBar {
        &self.brightness
    }

    pub fn esc(&self) -> &EscSkip {
        &self.esc
    }

    pub fn scroll_zoom(&self) -> &ScrollZoom {
        &self.scroll_zoom
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn pool_available(&self) -> usize {
        self.pool.available()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.pending_count()
    }

    pub fn active_tweens(&self) -> usize {
        self.tweens.len()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn view_size(&self) -> (u32, u32) {
        self.view
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn take_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    fn dispatch(&mut self, event: DispatchEvent) {
        let effect = machine::dispatch(
            event,
            &mut self.machine,
            &self.sets,
            self.fallback.as_ref(),
        );
        match effect {
            None => {}
            Some(Effect::Enter(state)) => self.enter_state(state),
            Some(Effect::RefreshSuggestion) => self.refresh_prompt(),
            Some(Effect::Clipboard(text)) => self.host.clipboard_write(&text),
            Some(Effect::Marketplace) => self.host.navigate_marketplace(),
        }
    }

    fn enter_state(&mut self, state: State) {
        if self.destroyed {
            return;
        }
        let now = self.now_ms;
        let left = self.machine.enter(state);
        if left != state {
            info!(from = left.name(), to = state.name(), at_ms = now, "state transition");
            self.transitions.push(Transition {
                at_ms: now,
                from: left,
                to: state,
            });
        }

        if left.is_boot() && !state.is_boot() {
            self.boot.destroy(&mut self.timers);
            let removed = self.scene.remove_intro_rows();
            debug!(removed, "intro rows removed");
        }
        if left == State::Demo {
            if let Some(handle) = self.machine.demo_timer.take() {
                self.timers.cancel(handle);
            }
        }
        if left == State::Bugged {
            if let Some(handle) = self.machine.bug_timer.take() {
                self.timers.cancel(handle);
            }
        }

        match state {
            State::Boot => {
                self.boot.start(now, &mut self.timers);
                self.sync_boot_view();
            }
            State::Demo => self.start_demo(),
            State::PostDemo if left != State::EscCountdown => {
                self.brightness
                    .start_dim(self.sequence.dim_level, self.sequence.dim_step_ms, now);
            }
            State::Bugged => {
                self.effects.flicker.reset();
                let handle = self
                    .timers
                    .arm(now, self.params.bug_timeout_ms, TimerEvent::BugTimeout);
                self.machine.bug_timer = Some(handle);
            }
            _ => {}
        }

        self.refresh_prompt();
        self.ticker.layout_dirty = true;
        self.layout_if_dirty();

        let config = *self.table.get(state);
        let focus = resolve_focus(config.focus, &self.scene, &self.lctx, &self.anchors);
        let focus = self.focus_in_view(focus);
        self.zoom.jumpcut(
            state,
            &config,
            focus,
            &mut self.tweens,
            &mut self.params,
            now,
        );
    }

    fn start_demo(&mut self) {
        let Some(set) = self.machine.active_set.clone() else {
            return;
        };
        let now = self.now_ms;
        self.machine.has_submitted = true;
        let mut verbs = demo_verbs(&set);
        verbs.shuffle(&mut self.rng);
        self.ticker.reset_demo(verbs, now);
        self.ticker.state_diagram_shown = false;
        self.ticker.promo_shown = false;
        let first = self.ticker.current_verb().unwrap_or_default().to_owned();
        self.scene.verb.set_text(first);
        self.scene.ellipsis.visible = true;
        self.scene.clear_scroll(&mut self.pool);
        self.buffer.clear();
        if let Some(handle) = self.machine.demo_timer.take() {
            self.timers.cancel(handle);
        }
        if !self.machine.mobile {
            let handle = self
                .timers
                .arm(now, self.params.demo_timeout_ms, TimerEvent::DemoTimeout);
            self.machine.demo_timer = Some(handle);
        }
        info!(set = set.name.as_str(), verbs = self.ticker.verbs.len(), "demo started");
    }

    fn fire_timers(&mut self, now: u64) {
        for (handle, event) in self.timers.due(now) {
            if self.destroyed {
                return;
            }
            match event {
                TimerEvent::DemoTimeout => {
                    if self.machine.demo_timer == Some(handle) {
                        self.machine.demo_timer = None;
                        self.dispatch(DispatchEvent::DemoTimeout);
                    }
                }
                TimerEvent::BugTimeout => {
                    if self.machine.bug_timer == Some(handle) {
                        self.machine.bug_timer = None;
                        self.dispatch(DispatchEvent::BugTimeout);
                    }
                }
                TimerEvent::Boot(step) => {
                    if !self.machine.current.is_boot() {
                        continue;
                    }
                    let outcome = self.boot.handle(step, now, &mut self.timers);
                    self.sync_boot_view();
                    if outcome == BootOutcome::Ready && self.machine.current == State::Boot {
                        self.enter_state(State::BootReady);
                    }
                }
            }
        }
    }

    fn key_down(&mut self, key: Key, shift: bool, repeat: bool, now: u64) {
        if key == Key::Escape {
            if self.esc_gesture_allowed() && self.esc.key_down(repeat, now) {
                self.enter_state(State::EscCountdown);
                return;
            }
            if repeat {
                return;
            }
        }
        if let Some(step) = brightness_step(key) {
            self.brightness.adjust(step, now);
            return;
        }
        if let Some(event) = map_key(key, shift) {
            self.dispatch(event);
        }
    }

    fn tick_esc(&mut self, now: u64) {
        let tick = self.esc.tick(now);
        if tick.just_activated {
            if self.esc_gesture_allowed() {
                self.enter_state(State::EscCountdown);
            } else {
                self.esc.reset();
                return;
            }
        }
        if self.esc.is_active() || tick.completed {
            self.host.esc_progress(tick.progress);
        }
        if tick.completed {
            self.host.navigate_marketplace();
            if self.machine.current == State::EscCountdown {
                self.enter_state(self.machine.previous);
            }
        }
    }

    fn esc_gesture_allowed(&self) -> bool {
        !self.machine.mobile && matches!(self.machine.current, State::Demo | State::PostDemo)
    }

    fn tap(&mut self) {
        if self.machine.mobile {
            if let Some(index) = next_tap_index(self.machine.browse_index, self.sets.len()) {
                self.machine.browse_index = index;
                self.machine.active_set = self.sets.get(index).cloned();
                self.start_demo();
                self.ticker.layout_dirty = true;
            }
        } else if self.machine.current.is_boot() || self.machine.current == State::Idle {
            self.dispatch(DispatchEvent::Enter);
        }
    }

    fn refresh_prompt(&mut self) {
        let state = self.machine.current;
        if !self.machine.mobile {
            if state.shows_suggestion() {
                let shown = suggestion(&self.machine, &self.sets, self.fallback.as_ref());
                self.scene.prompt.set_text(shown.prompt_text());
                self.scene.prompt.tone = if shown.active {
                    Tone::Active
                } else {
                    Tone::Suggestion
                };
            } else {
                self.scene.prompt.set_text("❯");
                self.scene.prompt.tone = Tone::Prompt;
            }
        }
        self.scene.status.set_text(ticker::status_text(state));
        self.scene.perms.set_text(PERMS_TEXT);
        self.ticker.layout_dirty = true;
    }

    fn sync_boot_view(&mut self) {
        let view = self.boot.view();
        self.scene.caret.set_text(view.prompt.as_str());
        self.scene.caret.tone = Tone::Prompt;
        self.scene.input.set_text(view.input.as_str());
        self.scene.input.tone = Tone::Active;
        self.scene.boot_output.set_text(view.output.as_str());
        self.scene.boot_hint.set_text(view.hint.as_str());
        self.ticker.layout_dirty = true;
    }

    fn layout_if_dirty(&mut self) {
        let config = self.table.get(self.machine.current);
        let visibility = ChromeVisibility {
            spinner: config.show_spinner,
            meta: config.show_meta,
        };
        let show_input = config.show_input;
        if let Some(anchors) = ticker::tick_layout(
            &mut self.ticker,
            &mut self.scene,
            &self.params,
            &self.machine,
            visibility,
            &mut self.lctx,
            &mut self.pool,
        ) {
            self.anchors = anchors;
            if !show_input {
                self.scene.caret.visible = false;
                self.scene.input.visible = false;
            }
        }
    }

    /// Content-space focus to camera (view) space.
    fn focus_in_view(&self, focus: FocusPoint) -> FocusPoint {
        let (w, h) = self.view;
        let sx = w as f32 / self.scene.content_w.max(1.0);
        let sy = h as f32 / self.scene.content_h.max(1.0);
        FocusPoint {
            x: focus.x * sx,
            y: focus.y * sy,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::host::RecordingHost;

    fn set(name: &str, verbs: &[&str]) -> ContentSet {
        ContentSet {
            name: name.to_owned(),
            display_name: String::new(),
            description: String::new(),
            author: "someone".to_owned(),
            github: String::new(),
            language: "en".to_owned(),
            category: String::new(),
            verbs: verbs.iter().map(|verb| (*verb).to_owned()).collect(),
        }
    }

    fn library() -> ContentLibrary {
        let mut groups = BTreeMap::new();
        groups.insert(
            "en".to_owned(),
            vec![
                set("pirate", &["Plundering", "Sailing"]),
                set("wizard", &["Conjuring"]),
                set("chef", &["Simmering", "Braising", "Plating"]),
            ],
        );
        ContentLibrary::from_groups(groups, BTreeMap::new())
    }

    fn session() -> Session<RecordingHost> {
        let options = SessionOptions {
            view_w: 320,
            view_h: 200,
            mobile: Some(false),
            seed: 7,
            ..SessionOptions::default()
        };
        Session::new(&library(), options, GlyphCache::blocks(), RecordingHost::default())
            .expect("session")
    }

    fn press(session: &mut Session<RecordingHost>, key: Key, now: u64) {
        session
            .handle_input(InputEvent::key_down(key), now)
            .expect("input");
        session
            .handle_input(InputEvent::KeyUp { key }, now)
            .expect("input");
    }

    #[test]
    fn boot_runs_to_ready_then_enter_reaches_idle() {
        let mut session = session();
        session.start(0);
        assert_eq!(session.state(), State::Boot);
        let mut now = 0;
        while session.state() == State::Boot && now < 20_000 {
            now += 16;
            session.frame(now);
        }
        assert_eq!(session.state(), State::BootReady);
        assert!(session.scene().boot_hint.text.contains("press Enter"));

        press(&mut session, Key::Enter, now);
        assert_eq!(session.state(), State::Idle);
        assert_eq!(session.pending_timers(), 0);
        assert!(session.scene().scroll.iter().all(|row| !row.is_intro()));
        assert!(session.scene().prompt.text.contains("pirate"));
    }

    #[test]
    fn demo_entry_arms_exactly_one_timeout() {
        let mut session = session();
        session.start(0);
        press(&mut session, Key::Enter, 10);
        press(&mut session, Key::Enter, 20);
        assert_eq!(session.state(), State::Demo);
        assert!(session.machine().has_submitted);
        assert!(session.machine().demo_timer.is_some());
        assert_eq!(session.pending_timers(), 1);

        let timeout = session.params().demo_timeout_ms;
        session.frame(20 + timeout);
        assert_eq!(session.state(), State::PostDemo);
        assert_eq!(session.pending_timers(), 0);
        assert!(session.brightness().is_dimming());
    }

    #[test]
    fn teardown_silences_everything() {
        let mut session = session();
        session.start(0);
        press(&mut session, Key::Enter, 10);
        press(&mut session, Key::Enter, 20);
        session.teardown();
        assert!(session.is_destroyed());
        assert_eq!(session.pending_timers(), 0);
        assert_eq!(session.active_tweens(), 0);
        assert_eq!(session.pool_available(), 0);
        session.frame(1_000_000);
        assert_eq!(session.state(), State::Demo);
    }

    #[test]
    fn focus_maps_content_space_onto_the_view() {
        let mut session = session();
        session.params_mut().display_downscale = 2.0;
        session.sync_params().expect("sync");
        let focus = session.focus_in_view(FocusPoint { x: 10.0, y: 50.0 });
        assert_eq!(focus, FocusPoint { x: 20.0, y: 100.0 });
    }
}
