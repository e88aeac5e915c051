//! Compact-viewport mode: the demo autostarts, taps cycle verb sets, and the
//! chrome prompt is replaced by a marketplace hint box.

use crate::layout::LayoutCtx;
use crate::scene::Scene;
use crate::theme::Tone;

pub const MOBILE_BREAKPOINT: u32 = 768;
pub const MARKETPLACE_HINT: &str = "check back on desktop for the marketplace";

pub fn is_mobile(view_w: u32) -> bool {
    view_w < MOBILE_BREAKPOINT
}

/// Box the hint into the rule/prompt rows and pin the rule cache so layout
/// keeps the custom text. The chrome moves up one line toward the spinner.
pub fn apply_marketplace_hint(scene: &mut Scene, lctx: &mut LayoutCtx) {
    let border = "─".repeat(MARKETPLACE_HINT.chars().count() + 2);
    scene.rule_top.text = format!("┌{border}┐");
    scene.prompt.text = format!("│ {MARKETPLACE_HINT} │");
    scene.rule_bottom.text = format!("└{border}┘");
    for node in [&mut scene.rule_top, &mut scene.prompt, &mut scene.rule_bottom] {
        node.tone = Tone::Dim;
    }
    lctx.prev_rule_cols = lctx.rule_cols(scene.content_w);
    lctx.chrome_offset_y = -lctx.line_height;
}

/// Index of the set a tap advances to, or `None` when there is nothing to
/// cycle through.
pub fn next_tap_index(browse_index: usize, set_count: usize) -> Option<usize> {
    (set_count > 1).then(|| (browse_index + 1) % set_count)
}
