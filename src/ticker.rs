//! Per-frame ticking of the simulated terminal: spinner glyph, scroll feed,
//! demo verb/token/highlight updates, dirty-flag layout and BUGGED flicker.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::config::SequenceTiming;
use crate::effects::flicker::{self, FlickerFrame, FlickerState};
use crate::generator::{LineBuffer, Special};
use crate::layout::{self, Anchors, ChromeVisibility, LayoutCtx};
use crate::machine::{Machine, State};
use crate::params::Params;
use crate::pool::TextPool;
use crate::scene::Scene;

pub const SPINNER_FRAMES: [&str; 6] = ["·", "✻", "✽", "✶", "✳", "✢"];
pub const SPINNER_TIMELINE: [usize; 8] = [0, 0, 1, 2, 3, 4, 5, 5];
pub const TOKEN_INTERVAL_MS: u64 = 1_000;
/// Width of the moving highlight over the verb, in characters.
pub const HIGHLIGHT_WIDTH: i64 = 3;

pub const PERMS_TEXT: &str = "⏵⏵ bypass permissions on (shift+tab to cycle) · 5 files +322 -66";

#[derive(Debug, Clone, PartialEq)]
pub struct TickerState {
    pub verbs: Vec<String>,
    pub verb_idx: usize,
    pub spinner_tick: u64,
    pub token_count: i64,
    pub start_ms: u64,
    pub last_frame_ms: u64,
    pub last_verb_ms: u64,
    pub last_token_ms: u64,
    pub last_scroll_ms: u64,
    pub layout_dirty: bool,
    pub state_diagram_shown: bool,
    pub promo_shown: bool,
}

impl TickerState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            verbs: Vec::new(),
            verb_idx: 0,
            spinner_tick: 0,
            token_count: 0,
            start_ms: now_ms,
            last_frame_ms: 0,
            last_verb_ms: 0,
            last_token_ms: 0,
            last_scroll_ms: 0,
            layout_dirty: true,
            state_diagram_shown: false,
            promo_shown: false,
        }
    }

    /// Restart demo counters with a fresh verb list.
    pub fn reset_demo(&mut self, verbs: Vec<String>, now_ms: u64) {
        self.verbs = verbs;
        self.verb_idx = 0;
        self.token_count = 0;
        self.start_ms = now_ms;
        self.last_verb_ms = now_ms;
        self.last_token_ms = now_ms;
        self.last_scroll_ms = now_ms;
        self.layout_dirty = true;
    }

    pub fn current_verb(&self) -> Option<&str> {
        self.verbs.get(self.verb_idx).map(String::as_str)
    }
}

/// `12s` under a minute, `3m 4s` above.
pub fn fmt_elapsed(ms: u64) -> String {
    let secs = ms / 1_000;
    if secs < 60 {
        format!("{secs}s")
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

pub fn status_text(state: State) -> String {
    format!("…/verbscope   main *5   [{}]", state.name())
}

/// `HH:MM` of demo elapsed time plus a tip.
pub fn info_text(elapsed_ms: u64) -> String {
    let hours = elapsed_ms / 3_600_000;
    let minutes = (elapsed_ms % 3_600_000) / 60_000;
    format!("{hours:02}:{minutes:02} | tip: /git:commit")
}

pub fn meta_text(elapsed_ms: u64, tokens: i64) -> String {
    format!(
        "(esc to interrupt · {} · ↓ {tokens} tokens · thinking)",
        fmt_elapsed(elapsed_ms)
    )
}

pub fn tick_spinner(now_ms: u64, ts: &mut TickerState, scene: &mut Scene, params: &Params) {
    if now_ms.saturating_sub(ts.last_frame_ms) < params.frame_ms {
        return;
    }
    ts.spinner_tick += 1;
    let frame = SPINNER_TIMELINE[(ts.spinner_tick % SPINNER_TIMELINE.len() as u64) as usize];
    scene.glyph.set_text(SPINNER_FRAMES[frame]);
    ts.last_frame_ms = now_ms;
}

/// Push the next generated line when its delay has elapsed. Runs only after
/// the first submission and outside IDLE/BROWSING.
pub fn tick_scroll<R: Rng + ?Sized>(
    now_ms: u64,
    ts: &mut TickerState,
    scene: &mut Scene,
    machine: &Machine,
    params: &Params,
    buffer: &mut LineBuffer,
    pool: &mut TextPool,
    lctx: &LayoutCtx,
    sequence: &SequenceTiming,
    rng: &mut R,
) {
    if !machine.has_submitted || matches!(machine.current, State::Idle | State::Browsing) {
        return;
    }

    let elapsed = now_ms.saturating_sub(ts.start_ms);
    if !ts.state_diagram_shown && elapsed >= sequence.state_diagram_ms {
        debug!(elapsed, "queueing state diagram insert");
        buffer.push_front_event(Special::StateDiagram.event(&sequence.burst));
        ts.state_diagram_shown = true;
    }
    if !ts.promo_shown && elapsed >= sequence.promo_ms {
        debug!(elapsed, "queueing promo insert");
        buffer.push_front_event(Special::Promo.event(&sequence.burst));
        ts.promo_shown = true;
    }

    let delay = buffer.scroll_delay(params.scroll_ms);
    if now_ms.saturating_sub(ts.last_scroll_ms) >= delay {
        let line = buffer.next_line(rng, &sequence.burst);
        let anchor = scene.glyph.y;
        layout::add_scroll_line(&line, scene, pool, lctx, params, anchor);
        ts.last_scroll_ms = now_ms;
        ts.layout_dirty = true;
    }

    scene.status.set_text(status_text(machine.current));
    scene.perms.set_text(PERMS_TEXT);
    scene.info.set_text(info_text(elapsed));
}

/// Verb rotation, token counter, highlight sweep and meta line.
pub fn tick_demo<R: Rng + ?Sized>(
    now_ms: u64,
    ts: &mut TickerState,
    scene: &mut Scene,
    params: &Params,
    lctx: &LayoutCtx,
    rng: &mut R,
) {
    if !ts.verbs.is_empty() && now_ms.saturating_sub(ts.last_verb_ms) >= params.verb_ms {
        let next = (ts.verb_idx + 1) % ts.verbs.len();
        if next == 0 && ts.verbs.len() > 1 {
            ts.verbs.shuffle(rng);
        }
        ts.verb_idx = next;
        scene.verb.set_text(ts.verbs[next].clone());
        ts.last_verb_ms = now_ms;
        ts.layout_dirty = true;
    }
    if now_ms.saturating_sub(ts.last_token_ms) >= TOKEN_INTERVAL_MS {
        ts.token_count += i64::from(params.token_rate) + rng.gen_range(-10..10);
        ts.last_token_ms = now_ms;
    }
    tick_highlight(now_ms, scene, params, lctx);
    let elapsed = now_ms.saturating_sub(ts.start_ms);
    scene.meta.set_text(meta_text(elapsed, ts.token_count));
}

/// Sweep a three-character window across the verb, entering and leaving
/// from off-screen on both sides.
pub fn tick_highlight(now_ms: u64, scene: &mut Scene, params: &Params, lctx: &LayoutCtx) {
    let chars: Vec<char> = scene.verb.text.chars().collect();
    let len = chars.len() as i64;
    if len == 0 || params.char_dwell_ms == 0 {
        return;
    }
    let dwell = params.char_dwell_ms;
    let cycle = (len as u64 + 2) * dwell;
    let step = ((now_ms % cycle) / dwell) as i64 - 2;
    let start = step.max(0);
    let end = len.min(step + HIGHLIGHT_WIDTH);
    let visible = end > start;
    let text: String = if visible {
        chars[start as usize..end as usize].iter().collect()
    } else {
        String::new()
    };
    scene.highlight.set_text(text);
    scene.highlight.x = scene.verb.x + start as f32 * lctx.ch_w;
    scene.highlight.visible = visible;
}

/// Re-run layout if anything marked it dirty this frame.
pub fn tick_layout(
    ts: &mut TickerState,
    scene: &mut Scene,
    params: &Params,
    machine: &Machine,
    visibility: ChromeVisibility,
    lctx: &mut LayoutCtx,
    pool: &mut TextPool,
) -> Option<Anchors> {
    if !ts.layout_dirty {
        return None;
    }
    let anchors = layout::layout(params, machine.current, visibility, lctx, scene, pool);
    ts.layout_dirty = false;
    Some(anchors)
}

/// Jitter the terminal layer while BUGGED; steady otherwise.
pub fn tick_flicker<R: Rng + ?Sized>(
    scene: &mut Scene,
    machine: &Machine,
    params: &Params,
    state: &mut FlickerState,
    lctx: &LayoutCtx,
    rng: &mut R,
) {
    let frame = if machine.current == State::Bugged {
        flicker::next_frame(lctx.line_height, params, state, rng)
    } else {
        FlickerFrame::STEADY
    };
    scene.tui_offset_y = frame.y_offset;
    scene.tui_alpha = frame.alpha;
}
