//! Boot sequence: blinking cursor, host detection lines, then the launch
//! command typed out one character at a time.
//!
//! Each step is a one-shot timer on the session's queue, so tearing the
//! sequence down is a single `cancel_where` over [`TimerEvent::Boot`].

use rand::Rng;
use tracing::debug;

use crate::config::{BootTiming, SequenceTiming};
use crate::scheduler::{Scheduler, TimerEvent, TimerQueue};

pub const BOOT_COMMAND: &str = "verbscope run";
pub const BOOT_CURSOR: char = '█';
pub const BOOT_PROMPT: &str = "$ ";
pub const BOOT_HINT: &str = " ∙ press Enter to launch interactive demo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootStep {
    Blink,
    EndBlink,
    DetectLine,
    TypeCommand,
    TypeChar,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    Continue,
    Ready,
}

/// Text the boot block currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootView {
    pub prompt: String,
    pub input: String,
    pub output: String,
    pub hint: String,
}

/// What the detection lines report about the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: String,
    pub terminal: String,
    pub display_w: u32,
    pub display_h: u32,
    pub locale: String,
}

impl HostInfo {
    pub fn detect(display_w: u32, display_h: u32) -> Self {
        let os = match std::env::consts::OS {
            "macos" => "macOS",
            "windows" => "Windows",
            "linux" => "Linux",
            _ => "Unknown OS",
        };
        let terminal = std::env::var("TERM_PROGRAM")
            .or_else(|_| std::env::var("TERM"))
            .unwrap_or_else(|_| "headless".to_owned());
        Self {
            os: os.to_owned(),
            terminal,
            display_w,
            display_h,
            locale: locale_from_env(),
        }
    }

    pub fn detect_lines<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        vec![
            format!("os: {}", self.os),
            format!("terminal: {}", self.terminal),
            format!("display: {}×{}", self.display_w, self.display_h),
            format!("locale: {}", self.locale),
            format!("session: {}", session_id(rng)),
        ]
    }
}

/// `LANG`-style locale reduced to a tag, e.g. `de_DE.UTF-8` becomes `de-DE`.
pub fn locale_from_env() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty() && value != "C" && value != "POSIX")
        .map(|value| {
            value
                .split('.')
                .next()
                .unwrap_or_default()
                .replace('_', "-")
        })
        .unwrap_or_else(|| "en-US".to_owned())
}

fn session_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..8)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone)]
pub struct BootAnim {
    view: BootView,
    timing: BootTiming,
    detect_lines: Vec<String>,
    shown: usize,
    typed: usize,
    cursor_on: bool,
    blinking: bool,
    ready: bool,
}

impl BootAnim {
    /// Delays in `sequence` are rescaled to `frame_ms`.
    pub fn new(sequence: &SequenceTiming, frame_ms: u64, detect_lines: Vec<String>) -> Self {
        let boot = sequence.boot;
        let scale = |ms| sequence.scaled(ms, frame_ms);
        Self {
            view: BootView::default(),
            timing: BootTiming {
                char_ms: scale(boot.char_ms),
                pre_blink_ms: scale(boot.pre_blink_ms),
                blink_ms: scale(boot.blink_ms),
                post_type_ms: scale(boot.post_type_ms),
                detect_line_ms: scale(boot.detect_line_ms),
                post_detect_ms: scale(boot.post_detect_ms),
            },
            detect_lines,
            shown: 0,
            typed: 0,
            cursor_on: true,
            blinking: false,
            ready: false,
        }
    }

    pub fn view(&self) -> &BootView {
        &self.view
    }

    pub fn timing(&self) -> &BootTiming {
        &self.timing
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn start<S: Scheduler<TimerEvent>>(&mut self, now_ms: u64, queue: &mut S) {
        self.view = BootView {
            prompt: BOOT_PROMPT.to_owned(),
            input: BOOT_CURSOR.to_string(),
            output: String::new(),
            hint: String::new(),
        };
        self.shown = 0;
        self.typed = 0;
        self.ready = false;
        self.cursor_on = true;
        self.blinking = true;
        queue.arm(now_ms, self.timing.blink_ms, TimerEvent::Boot(BootStep::Blink));
        queue.arm(
            now_ms,
            self.timing.pre_blink_ms,
            TimerEvent::Boot(BootStep::EndBlink),
        );
    }

    pub fn handle<S: Scheduler<TimerEvent>>(
        &mut self,
        step: BootStep,
        now_ms: u64,
        queue: &mut S,
    ) -> BootOutcome {
        match step {
            BootStep::Blink => {
                if self.blinking {
                    self.cursor_on = !self.cursor_on;
                    self.view.input = if self.cursor_on {
                        BOOT_CURSOR.to_string()
                    } else {
                        String::new()
                    };
                    queue.arm(now_ms, self.timing.blink_ms, TimerEvent::Boot(BootStep::Blink));
                }
            }
            BootStep::EndBlink => {
                self.blinking = false;
                self.show_next_detect(now_ms, queue);
            }
            BootStep::DetectLine => self.show_next_detect(now_ms, queue),
            BootStep::TypeCommand => {
                self.view.output.clear();
                self.typed = 0;
                self.type_char(now_ms, queue);
            }
            BootStep::TypeChar => {
                self.typed += 1;
                self.type_char(now_ms, queue);
            }
            BootStep::Ready => {
                self.view.input = BOOT_COMMAND.to_owned();
                self.view.hint = BOOT_HINT.to_owned();
                self.ready = true;
                debug!("boot sequence ready");
                return BootOutcome::Ready;
            }
        }
        BootOutcome::Continue
    }

    /// Cancel every pending boot step.
    pub fn destroy(&mut self, queue: &mut TimerQueue<TimerEvent>) {
        let cancelled = queue.cancel_where(|event| matches!(event, TimerEvent::Boot(_)));
        self.blinking = false;
        if cancelled > 0 {
            debug!(cancelled, "boot sequence torn down");
        }
    }

    fn show_next_detect<S: Scheduler<TimerEvent>>(&mut self, now_ms: u64, queue: &mut S) {
        if self.shown < self.detect_lines.len() {
            self.shown += 1;
            self.view.output = self.detect_lines[..self.shown].join("\n");
            queue.arm(
                now_ms,
                self.timing.detect_line_ms,
                TimerEvent::Boot(BootStep::DetectLine),
            );
        } else {
            queue.arm(
                now_ms,
                self.timing.post_detect_ms,
                TimerEvent::Boot(BootStep::TypeCommand),
            );
        }
    }

    fn type_char<S: Scheduler<TimerEvent>>(&mut self, now_ms: u64, queue: &mut S) {
        let len = BOOT_COMMAND.chars().count();
        let mut input: String = BOOT_COMMAND.chars().take(self.typed).collect();
        if self.typed < len {
            input.push(BOOT_CURSOR);
            queue.arm(now_ms, self.timing.char_ms, TimerEvent::Boot(BootStep::TypeChar));
        } else {
            queue.arm(now_ms, self.timing.post_type_ms, TimerEvent::Boot(BootStep::Ready));
        }
        self.view.input = input;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run_until_ready(anim: &mut BootAnim, queue: &mut TimerQueue<TimerEvent>) -> u64 {
        let mut now = 0;
        anim.start(now, queue);
        loop {
            let Some(due) = queue.next_due_ms() else {
                panic!("boot stalled before ready");
            };
            now = due;
            for (_, event) in queue.due(now) {
                if let TimerEvent::Boot(step) = event {
                    if anim.handle(step, now, queue) == BootOutcome::Ready {
                        return now;
                    }
                }
            }
        }
    }

    fn lines() -> Vec<String> {
        vec!["os: Linux".to_owned(), "terminal: headless".to_owned()]
    }

    #[test]
    fn full_sequence_reaches_ready_at_expected_time() {
        let sequence = SequenceTiming::default();
        let mut anim = BootAnim::new(&sequence, 100, lines());
        let mut queue = TimerQueue::new();
        let ready_at = run_until_ready(&mut anim, &mut queue);

        let chars = BOOT_COMMAND.chars().count() as u64;
        let expected = 800 + 2 * 120 + 400 + chars * 55 + 200;
        assert_eq!(ready_at, expected);
        assert_eq!(anim.view().input, BOOT_COMMAND);
        assert_eq!(anim.view().hint, BOOT_HINT);
        assert!(anim.view().output.is_empty());
        assert!(anim.is_ready());
    }

    #[test]
    fn delays_scale_with_frame_rate() {
        let sequence = SequenceTiming::default();
        let anim = BootAnim::new(&sequence, 50, lines());
        assert_eq!(anim.timing().char_ms, 28);
        assert_eq!(anim.timing().pre_blink_ms, 400);
    }

    #[test]
    fn destroy_cancels_pending_steps() {
        let sequence = SequenceTiming::default();
        let mut anim = BootAnim::new(&sequence, 100, lines());
        let mut queue = TimerQueue::new();
        queue.arm(0, 10_000, TimerEvent::DemoTimeout);
        anim.start(0, &mut queue);
        anim.destroy(&mut queue);
        assert_eq!(queue.pending_count(), 1);
    }

    #[test]
    fn detect_lines_include_an_eight_char_session_id() {
        let info = HostInfo {
            os: "Linux".to_owned(),
            terminal: "xterm".to_owned(),
            display_w: 1920,
            display_h: 1080,
            locale: "en-US".to_owned(),
        };
        let lines = info.detect_lines(&mut StdRng::seed_from_u64(7));
        assert_eq!(lines[2], "display: 1920×1080");
        let session = lines[4].strip_prefix("session: ").expect("session line");
        assert_eq!(session.len(), 8);
        assert!(session.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
