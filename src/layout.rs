//! Dirty-flag layout of the terminal scene.
//!
//! [`LayoutCtx`] caches character metrics; they are re-measured only when the
//! font size or line-height offset changes. [`layout`] is called by the
//! ticker only on frames where something visible changed.

use crate::generator::LineDef;
use crate::machine::State;
use crate::params::{Params, LINE_HEIGHT_RATIO};
use crate::pool::TextPool;
use crate::scene::{Scene, ScrollRow};

/// Default indent for generated lines, in character cells.
pub const DEFAULT_COL: u32 = 3;
/// Chrome below the header in the idle layout: two rules, prompt, three status lines.
pub const CHROME_LINES: f32 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutCtx {
    pub ch_w: f32,
    pub line_height: f32,
    pub prev_rule_cols: usize,
    /// Extra vertical shift of the bottom chrome (compact viewports only).
    pub chrome_offset_y: f32,
    font_size: f32,
    line_height_offset: f32,
}

impl LayoutCtx {
    pub fn new(ch_w: f32, font_size: f32, line_height_offset: f32) -> Self {
        Self {
            ch_w,
            line_height: (font_size * LINE_HEIGHT_RATIO).round() + line_height_offset,
            prev_rule_cols: 0,
            chrome_offset_y: 0.0,
            font_size,
            line_height_offset,
        }
    }

    /// Re-measure when the font metrics in `params` differ from the cached
    /// ones. Returns whether anything was recomputed.
    pub fn sync(&mut self, params: &Params, measure_char: impl Fn(f32) -> f32) -> bool {
        let unchanged = self.font_size == params.font_size
            && self.line_height_offset == params.line_height_offset;
        if unchanged {
            return false;
        }
        self.font_size = params.font_size;
        self.line_height_offset = params.line_height_offset;
        self.ch_w = measure_char(params.font_size);
        self.line_height = params.line_height();
        self.prev_rule_cols = 0;
        true
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn rule_cols(&self, screen_w: f32) -> usize {
        if self.ch_w <= 0.0 {
            return 1;
        }
        ((screen_w / self.ch_w).floor() as i64 - 2).max(1) as usize
    }
}

/// Which spinner-area lines the current state shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChromeVisibility {
    pub spinner: bool,
    pub meta: bool,
}

/// Anchor rows computed by layout, used to resolve camera focus targets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Anchors {
    pub left_x: f32,
    pub spinner_y: f32,
}

pub fn left_x(params: &Params, lctx: &LayoutCtx) -> f32 {
    if params.absolute_x != 0.0 {
        (lctx.ch_w * params.absolute_x).round()
    } else {
        (lctx.ch_w * (2.0 + params.offset_x)).round()
    }
}

pub fn spinner_y(params: &Params, lctx: &LayoutCtx, screen_h: f32) -> f32 {
    let lh = lctx.line_height;
    if params.absolute_y != 0.0 {
        (lh * params.absolute_y).round()
    } else {
        (screen_h / 2.0 - lh + lh * params.offset_y).round()
    }
}

/// Append a generated line as a pooled primitive just above the spinner row,
/// then restack and evict.
pub fn add_scroll_line(
    line: &LineDef,
    scene: &mut Scene,
    pool: &mut TextPool,
    lctx: &LayoutCtx,
    params: &Params,
    anchor_y: f32,
) {
    let mut primitive = pool.acquire(&line.text, line.tone, params.font_size);
    let col = line.col.unwrap_or(DEFAULT_COL) as f32;
    primitive.x = left_x(params, lctx) + (col * lctx.ch_w).round();
    scene.scroll.push(ScrollRow::Line(primitive));
    layout_scroll_rows(scene, pool, lctx, anchor_y);
}

/// Stack rows upward from `anchor_y` (one line-height gap) and release rows
/// that have scrolled entirely above the surface.
pub fn layout_scroll_rows(scene: &mut Scene, pool: &mut TextPool, lctx: &LayoutCtx, anchor_y: f32) {
    let lh = lctx.line_height;
    let count = scene.scroll.len();
    for (index, row) in scene.scroll.iter_mut().enumerate() {
        row.set_y(anchor_y - lh - (count - index) as f32 * lh);
    }
    let evict = scene
        .scroll
        .iter()
        .take_while(|row| row.y() + lh < 0.0)
        .count();
    for row in scene.scroll.drain(..evict) {
        row.recycle(pool);
    }
}

pub fn layout(
    params: &Params,
    state: State,
    visibility: ChromeVisibility,
    lctx: &mut LayoutCtx,
    scene: &mut Scene,
    pool: &mut TextPool,
) -> Anchors {
    let ch_w = lctx.ch_w;
    let lh = lctx.line_height;
    let screen_w = scene.content_w;
    let screen_h = scene.content_h;
    let col3 = (DEFAULT_COL as f32 * ch_w).round();
    let left = left_x(params, lctx);
    let spinner = spinner_y(params, lctx, screen_h);
    let scroll_y = if params.absolute_y != 0.0 {
        (lh * params.absolute_y).round()
    } else {
        0.0
    };
    let anchors = Anchors {
        left_x: left,
        spinner_y: spinner,
    };

    place_spinner_line(scene, left, spinner, col3, ch_w, lh);
    refresh_rules(scene, lctx, screen_w);

    let ch1 = ch_w.round();
    for row in &mut scene.scroll {
        if let ScrollRow::Header(header) = row {
            header.x = left + ch1;
        }
    }

    if state.is_boot() {
        place_boot_block(scene, left, lh, ch_w);
        set_chrome_visible(scene, false);
        scene.glyph.visible = false;
        scene.verb.visible = false;
        scene.ellipsis.visible = false;
        scene.highlight.visible = false;
        scene.meta.visible = false;
        return anchors;
    }

    set_boot_visible(scene, false);
    set_chrome_visible(scene, true);
    let spinner_visible = visibility.spinner;
    scene.glyph.visible = spinner_visible;
    scene.verb.visible = spinner_visible;
    scene.ellipsis.visible = spinner_visible;
    scene.highlight.visible = spinner_visible && scene.highlight.visible;
    scene.meta.visible = visibility.meta;

    if matches!(state, State::Idle | State::Browsing) {
        layout_idle(scene, left + ch1, scroll_y, screen_h, lh);
    } else {
        layout_scroll_rows(scene, pool, lctx, spinner);
        let chrome_y = scene.meta.y + lh + lctx.chrome_offset_y;
        layout_chrome(scene, left + ch1, chrome_y, lh);
    }
    anchors
}

fn place_spinner_line(scene: &mut Scene, left: f32, spinner: f32, col3: f32, ch_w: f32, lh: f32) {
    scene.glyph.at(left, spinner);
    scene.verb.at(left + col3, spinner);
    let verb_cols = scene.verb.text.chars().count() as f32;
    scene
        .ellipsis
        .at(scene.verb.x + (verb_cols * ch_w).round(), spinner);
    scene.highlight.y = spinner;
    scene.meta.at(left + col3, (spinner + 2.0 * lh).round());
}

fn refresh_rules(scene: &mut Scene, lctx: &mut LayoutCtx, screen_w: f32) {
    let cols = lctx.rule_cols(screen_w);
    if cols != lctx.prev_rule_cols {
        let rule = "─".repeat(cols);
        scene.rule_top.text.clone_from(&rule);
        scene.rule_bottom.text = rule;
        lctx.prev_rule_cols = cols;
    }
}

fn place_boot_block(scene: &mut Scene, left: f32, lh: f32, ch_w: f32) {
    set_boot_visible(scene, true);
    let top = lh.round();
    let output_lines = if scene.boot_output.text.is_empty() {
        0
    } else {
        scene.boot_output.text.lines().count()
    };
    scene.boot_output.at(left, top + lh.round());
    let prompt_y = if output_lines > 0 {
        ((output_lines as f32 + 2.0) * lh).round()
    } else {
        0.0
    };
    let caret_w = (scene.caret.text.chars().count() as f32 * ch_w).round();
    scene.caret.at(left, top + prompt_y);
    scene.input.at(left + caret_w, top + prompt_y);
    scene.boot_hint.at(left, top + prompt_y + lh.round());
}

fn set_boot_visible(scene: &mut Scene, visible: bool) {
    scene.caret.visible = visible;
    scene.input.visible = visible;
    scene.boot_output.visible = visible;
    scene.boot_hint.visible = visible;
}

fn set_chrome_visible(scene: &mut Scene, visible: bool) {
    for node in [
        &mut scene.rule_top,
        &mut scene.prompt,
        &mut scene.rule_bottom,
        &mut scene.status,
        &mut scene.perms,
        &mut scene.info,
    ] {
        node.visible = visible;
    }
}

/// Centre the header rows plus the chrome block vertically.
fn layout_idle(scene: &mut Scene, chrome_x: f32, scroll_y: f32, screen_h: f32, lh: f32) {
    let header_h = scene.scroll.len() as f32 * lh;
    let chrome_h = CHROME_LINES * lh;
    let top = ((screen_h - header_h - chrome_h) / 2.0).round() + scroll_y;
    for (index, row) in scene.scroll.iter_mut().enumerate() {
        row.set_y(top + index as f32 * lh);
    }
    layout_chrome(scene, chrome_x, top + header_h, lh);
}

pub(crate) fn layout_chrome(scene: &mut Scene, x: f32, base_y: f32, lh: f32) {
    let nodes = [
        &mut scene.rule_top,
        &mut scene.prompt,
        &mut scene.rule_bottom,
        &mut scene.status,
        &mut scene.perms,
        &mut scene.info,
    ];
    for (index, node) in nodes.into_iter().enumerate() {
        node.at(x, base_y + index as f32 * lh);
    }
}
