//! Retained scene of the simulated terminal.
//!
//! Named text nodes for the chrome plus the scroll rows. Layout writes
//! positions into it, the ticker writes text, and the compositor draws it.
//! Positions are in content space (inside the padded display surface).

use crate::header::HeaderRow;
use crate::pool::{TextPool, TextPrimitive};
use crate::theme::Tone;

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub tone: Tone,
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

impl TextNode {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            x: 0.0,
            y: 0.0,
            visible: true,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if self.text == text {
            return false;
        }
        self.text = text;
        true
    }

    pub fn at(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollRow {
    Line(TextPrimitive),
    Header(HeaderRow),
}

impl ScrollRow {
    pub fn y(&self) -> f32 {
        match self {
            Self::Line(line) => line.y,
            Self::Header(row) => row.y,
        }
    }

    pub fn set_y(&mut self, y: f32) {
        match self {
            Self::Line(line) => line.y = y,
            Self::Header(row) => row.y = y,
        }
    }

    pub fn is_intro(&self) -> bool {
        matches!(self, Self::Header(row) if row.intro)
    }

    /// Return a line's primitive to the pool; header rows are just dropped.
    pub fn recycle(self, pool: &mut TextPool) {
        if let Self::Line(line) = self {
            pool.release(line);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    // Spinner line.
    pub glyph: TextNode,
    pub verb: TextNode,
    pub ellipsis: TextNode,
    pub highlight: TextNode,
    pub meta: TextNode,
    // Boot input block.
    pub caret: TextNode,
    pub input: TextNode,
    pub boot_output: TextNode,
    pub boot_hint: TextNode,
    // Bottom chrome.
    pub rule_top: TextNode,
    pub prompt: TextNode,
    pub rule_bottom: TextNode,
    pub status: TextNode,
    pub perms: TextNode,
    pub info: TextNode,

    pub scroll: Vec<ScrollRow>,

    /// Unpadded content size in display pixels.
    pub content_w: f32,
    pub content_h: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    /// Vertical offset and alpha of the whole terminal, driven by flicker.
    pub tui_offset_y: f32,
    pub tui_alpha: f32,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            glyph: TextNode::new("✳", Tone::Verb),
            verb: TextNode::new("Loading", Tone::Verb),
            ellipsis: TextNode::new("…", Tone::Ellipsis),
            highlight: TextNode::new("", Tone::Highlight),
            meta: TextNode::new("", Tone::Suggestion),
            caret: TextNode::new("> ", Tone::Suggestion),
            input: TextNode::new("", Tone::Suggestion),
            boot_output: TextNode::new("", Tone::Dim),
            boot_hint: TextNode::new("", Tone::Prompt),
            rule_top: TextNode::new("", Tone::Border),
            prompt: TextNode::new("❯", Tone::Prompt),
            rule_bottom: TextNode::new("", Tone::Border),
            status: TextNode::new("", Tone::Dim),
            perms: TextNode::new("", Tone::Warn),
            info: TextNode::new("", Tone::Dim),
            scroll: Vec::new(),
            content_w: 0.0,
            content_h: 0.0,
            pad_x: 0.0,
            pad_y: 0.0,
            tui_offset_y: 0.0,
            tui_alpha: 1.0,
        }
    }

    /// Padded display surface size.
    pub fn surface_size(&self) -> (u32, u32) {
        (
            (self.content_w + 2.0 * self.pad_x).round().max(1.0) as u32,
            (self.content_h + 2.0 * self.pad_y).round().max(1.0) as u32,
        )
    }

    pub fn resize(&mut self, content_w: f32, content_h: f32, screen_padding: f32) {
        self.content_w = content_w;
        self.content_h = content_h;
        self.pad_x = (content_w * screen_padding).round();
        self.pad_y = (content_h * screen_padding).round();
    }

    pub fn nodes(&self) -> [&TextNode; 15] {
        [
            &self.glyph,
            &self.verb,
            &self.ellipsis,
            &self.highlight,
            &self.meta,
            &self.caret,
            &self.input,
            &self.boot_output,
            &self.boot_hint,
            &self.rule_top,
            &self.prompt,
            &self.rule_bottom,
            &self.status,
            &self.perms,
            &self.info,
        ]
    }

    pub fn scroll_lines(&self) -> impl Iterator<Item = &TextPrimitive> {
        self.scroll.iter().filter_map(|row| match row {
            ScrollRow::Line(line) => Some(line),
            ScrollRow::Header(_) => None,
        })
    }

    /// Remove every scroll row, returning line primitives to the pool.
    pub fn clear_scroll(&mut self, pool: &mut TextPool) {
        for row in self.scroll.drain(..) {
            row.recycle(pool);
        }
    }

    /// Drop intro-only header rows; returns how many were removed.
    pub fn remove_intro_rows(&mut self) -> usize {
        let before = self.scroll.len();
        self.scroll.retain(|row| !row.is_intro());
        before - self.scroll.len()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{build_header_rows, build_intro_rows};

    #[test]
    fn intro_rows_are_removed_and_header_kept() {
        let mut scene = Scene::new();
        let intro = build_intro_rows();
        let intro_len = intro.len();
        scene.scroll.extend(intro.into_iter().map(ScrollRow::Header));
        scene
            .scroll
            .extend(build_header_rows(80, 3).into_iter().map(ScrollRow::Header));
        let header_len = scene.scroll.len() - intro_len;

        assert_eq!(scene.remove_intro_rows(), intro_len);
        assert_eq!(scene.scroll.len(), header_len);
    }

    #[test]
    fn clearing_scroll_returns_lines_to_pool() {
        let mut pool = TextPool::default();
        let mut scene = Scene::new();
        for text in ["a", "b", "c"] {
            let line = pool.acquire(text, Tone::Tool, 12.0);
            scene.scroll.push(ScrollRow::Line(line));
        }
        scene.clear_scroll(&mut pool);
        assert!(scene.scroll.is_empty());
        assert_eq!(pool.available(), 3);
    }

    #[test]
    fn surface_includes_padding_on_both_sides() {
        let mut scene = Scene::new();
        scene.resize(200.0, 100.0, 0.15);
        assert_eq!(scene.surface_size(), (260, 130));
    }
}
