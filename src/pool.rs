//! Bounded reuse of scroll-line text primitives.
//!
//! A primitive is owned either by a scroll row or by the pool, never both:
//! `release` takes it by value, so a line cannot be drawn in two places.

use tracing::trace;

use crate::theme::Tone;

pub const TEXT_POOL_CAP: usize = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct TextPrimitive {
    id: u64,
    pub text: String,
    pub tone: Tone,
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
    pub visible: bool,
}

impl TextPrimitive {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub created: u64,
    pub reused: u64,
    pub discarded: u64,
}

#[derive(Debug)]
pub struct TextPool {
    free: Vec<TextPrimitive>,
    cap: usize,
    next_id: u64,
    stats: PoolStats,
}

impl Default for TextPool {
    fn default() -> Self {
        Self::with_capacity(TEXT_POOL_CAP)
    }
}

impl TextPool {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            free: Vec::with_capacity(cap),
            cap,
            next_id: 0,
            stats: PoolStats::default(),
        }
    }

    /// Reuse a released primitive when one is available; its content, tone
    /// and size are overwritten and it becomes visible again.
    pub fn acquire(&mut self, text: &str, tone: Tone, font_size: f32) -> TextPrimitive {
        if let Some(mut primitive) = self.free.pop() {
            self.stats.reused += 1;
            primitive.text.clear();
            primitive.text.push_str(text);
            primitive.tone = tone;
            primitive.font_size = font_size;
            primitive.x = 0.0;
            primitive.y = 0.0;
            primitive.visible = true;
            return primitive;
        }
        self.stats.created += 1;
        let id = self.next_id;
        self.next_id += 1;
        TextPrimitive {
            id,
            text: text.to_owned(),
            tone,
            font_size,
            x: 0.0,
            y: 0.0,
            visible: true,
        }
    }

    /// Hide and keep for reuse, or drop once the pool is at capacity.
    pub fn release(&mut self, mut primitive: TextPrimitive) {
        primitive.visible = false;
        if self.free.len() < self.cap {
            self.free.push(primitive);
        } else {
            self.stats.discarded += 1;
            trace!(id = primitive.id, "pool full, discarding primitive");
        }
    }

    pub fn flush(&mut self) {
        self.free.clear();
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}
