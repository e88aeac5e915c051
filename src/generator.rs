//! Procedural terminal output for the demo scroll feed.
//!
//! A weighted table of producers synthesises short batches of coloured lines
//! that look like an agent working: tool calls, shell output, diffs, panels.
//! The [`LineBuffer`] pulls one batch whenever it runs dry.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::trace;

use crate::config::BurstDelays;
use crate::theme::Tone;

/// Boxed panel inner width in columns.
pub const PANEL_WIDTH: usize = 34;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDef {
    pub text: String,
    pub tone: Tone,
    /// Column indent in character cells; `None` uses the layout default.
    pub col: Option<u32>,
}

impl LineDef {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            col: None,
        }
    }

    pub fn indented(text: impl Into<String>, tone: Tone, col: u32) -> Self {
        Self {
            text: text.into(),
            tone,
            col: Some(col),
        }
    }

    /// Spacer appended after every batch, painted in the background colour.
    pub fn blank() -> Self {
        Self::new(" ", Tone::Blank)
    }
}

/// One producer's output. `burst_ms == 0` means the default scroll cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedEvent {
    pub lines: Vec<LineDef>,
    pub burst_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Producer {
    FileRead,
    Glob,
    Grep,
    AssistantAction,
    BashCommand,
    DiffHunk,
    BoxedPanel,
    PromptLine,
    ErrorBlock,
    SearchSummary,
    CompletionTagline,
    ModeToggle,
}

pub const PRODUCER_TABLE: [(Producer, u32); 12] = [
    (Producer::FileRead, 20),
    (Producer::Glob, 6),
    (Producer::Grep, 6),
    (Producer::AssistantAction, 12),
    (Producer::BashCommand, 8),
    (Producer::DiffHunk, 5),
    (Producer::BoxedPanel, 3),
    (Producer::PromptLine, 4),
    (Producer::ErrorBlock, 2),
    (Producer::SearchSummary, 6),
    (Producer::CompletionTagline, 3),
    (Producer::ModeToggle, 2),
];

pub fn total_weight() -> u32 {
    PRODUCER_TABLE.iter().map(|(_, weight)| weight).sum()
}

/// Linear scan of cumulative weight for a uniform draw in `[0, total)`.
pub fn producer_for_roll(roll: u32) -> Producer {
    let mut cumulative = 0;
    for (producer, weight) in PRODUCER_TABLE {
        cumulative += weight;
        if roll < cumulative {
            return producer;
        }
    }
    PRODUCER_TABLE[PRODUCER_TABLE.len() - 1].0
}

pub fn pick_producer<R: Rng + ?Sized>(rng: &mut R) -> Producer {
    producer_for_roll(rng.gen_range(0..total_weight()))
}

pub fn pick_event<R: Rng + ?Sized>(rng: &mut R, burst: &BurstDelays) -> GeneratedEvent {
    produce(pick_producer(rng), rng, burst)
}

const FILES: [&str; 12] = [
    "src/main.rs",
    "src/install.rs",
    "src/settings.rs",
    "src/sets.rs",
    "src/verbs.rs",
    "Cargo.toml",
    "README.md",
    "CLAUDE.md",
    "sets/en/pirate.json",
    "rustfmt.toml",
    "justfile",
    "src/site.rs",
];
const GLOB_PATTERNS: [&str; 4] = ["**/*.rs", "sets/**/*.json", "src/**/*.rs", "templates/**/*.html"];
const GREP_TERMS: [&str; 6] = ["load_sets", "VerbSet", "use .*::", "Settings", "read_to_string", "pub fn"];
const BASH_COMMANDS: [(&str, &str); 6] = [
    ("cargo clippy", "Finished dev profile, 0 warnings"),
    ("cargo test", "test result: ok. 7 passed; 0 failed"),
    ("cargo fmt --check", "No formatting changes."),
    ("cargo build --release", "Finished release in 12.4s"),
    ("git status", "2 files changed, 14 insertions"),
    ("git diff --stat", "3 files changed, 42(+), 7(-)"),
];
const ERRORS: [(&str, &str); 3] = [
    ("unresolved import `crate::utils`", "--> src/install.rs:3:5"),
    ("mismatched types: expected `u32`, found `&str`", "--> src/sets.rs:14:5"),
    ("No such file or directory (os error 2)", "while opening /tmp/.cache/build"),
];
const PANELS: [&[&str]; 3] = [
    &["Plan: update settings module", "Step 1: read current config", "Step 2: merge verb overrides"],
    &["Context: verbs CLI", "Stack: Rust + clap", "Entry: src/main.rs"],
    &["Dependencies resolved", "clap 4.5", "serde 1.0", "tempfile 3.10"],
];
const PROMPTS: [&str; 5] = ["❯ build", "❯ /fast", "❯ test --watch", "❯ lint --fix", "❯ git push"];
const REMOVED: [&str; 3] = ["let old = true;", "return None;", "// TODO"];
const ADDED: [&str; 3] = ["let val = parse(input)?;", "Ok(result)", "pub type Config = ();"];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

pub fn produce<R: Rng + ?Sized>(
    producer: Producer,
    rng: &mut R,
    burst: &BurstDelays,
) -> GeneratedEvent {
    let (lines, burst_ms) = match producer {
        Producer::FileRead => (
            vec![LineDef::new(format!("Read {}", pick(rng, &FILES)), Tone::Tool)],
            0,
        ),
        Producer::Glob => {
            let pattern = pick(rng, &GLOB_PATTERNS);
            let matches = rng.gen_range(2..=12);
            (
                vec![LineDef::new(format!("Glob {pattern} ({matches} matches)"), Tone::Tool)],
                0,
            )
        }
        Producer::Grep => {
            let term = pick(rng, &GREP_TERMS);
            let matches = rng.gen_range(1..=18);
            (
                vec![LineDef::new(format!("Grep \"{term}\" ({matches} matches)"), Tone::Tool)],
                0,
            )
        }
        Producer::AssistantAction => {
            let action = pick(rng, &["Read", "Edit", "Write", "Glob", "Grep"]);
            let file = pick(rng, &FILES);
            let count = rng.gen_range(8..=120);
            (
                vec![
                    LineDef::indented(format!("⏺ {action}({file})"), Tone::Accent, 1),
                    LineDef::indented(format!("⎿ {count} lines"), Tone::Output, 1),
                ],
                burst.action,
            )
        }
        Producer::BashCommand => {
            let (command, output) = BASH_COMMANDS
                .choose(rng)
                .copied()
                .unwrap_or(BASH_COMMANDS[0]);
            (
                vec![
                    LineDef::new(format!("Bash {command}"), Tone::Output),
                    LineDef::new(output, Tone::Ok),
                ],
                burst.bash,
            )
        }
        Producer::DiffHunk => (diff_hunk(rng), burst.diff),
        Producer::BoxedPanel => {
            let panel = PANELS.choose(rng).copied().unwrap_or(PANELS[0]);
            (boxed_panel(panel), burst.panel)
        }
        Producer::PromptLine => (
            vec![LineDef::indented(pick(rng, &PROMPTS), Tone::Prompt, 1)],
            0,
        ),
        Producer::ErrorBlock => {
            let (message, detail) = ERRORS.choose(rng).copied().unwrap_or(ERRORS[0]);
            (
                vec![
                    LineDef::new(format!("error: {message}"), Tone::Error),
                    LineDef::new(detail, Tone::Output),
                ],
                burst.error,
            )
        }
        Producer::SearchSummary => (vec![search_summary(rng)], 0),
        Producer::CompletionTagline => (vec![completion_tagline(rng)], 0),
        Producer::ModeToggle => (
            vec![
                LineDef::indented("/fast", Tone::Prompt, 1),
                LineDef::new("Fast mode enabled", Tone::Ok),
            ],
            burst.mode,
        ),
    };
    GeneratedEvent { lines, burst_ms }
}

fn diff_hunk<R: Rng + ?Sized>(rng: &mut R) -> Vec<LineDef> {
    let file = pick(rng, &FILES);
    let start = rng.gen_range(1..=80);
    let mut lines = vec![
        LineDef::new(format!("Edit {file}"), Tone::Path),
        LineDef::new(format!("@@ -{start},3 +{start},4 @@"), Tone::LineNum),
    ];
    for _ in 0..rng.gen_range(0..=2) {
        lines.push(LineDef::indented(
            format!("- {}", pick(rng, &REMOVED)),
            Tone::Error,
            1,
        ));
    }
    for _ in 0..rng.gen_range(1..=3) {
        lines.push(LineDef::indented(format!("+ {}", pick(rng, &ADDED)), Tone::Ok, 1));
    }
    lines
}

fn boxed_panel(rows: &[&str]) -> Vec<LineDef> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(LineDef::indented(
        format!("╭{}╮", "─".repeat(PANEL_WIDTH)),
        Tone::Border,
        1,
    ));
    for row in rows {
        let pad = PANEL_WIDTH.saturating_sub(row.chars().count() + 1);
        lines.push(LineDef::indented(
            format!("│ {row}{}│", " ".repeat(pad)),
            Tone::Border,
            1,
        ));
    }
    lines.push(LineDef::indented(
        format!("╰{}╯", "─".repeat(PANEL_WIDTH)),
        Tone::Border,
        1,
    ));
    lines
}

fn search_summary<R: Rng + ?Sized>(rng: &mut R) -> LineDef {
    match rng.gen_range(0..6) {
        0 => LineDef::indented("✓ tests passed (7/7)", Tone::Ok, 1),
        1 => LineDef::indented("✓ clippy clean", Tone::Ok, 1),
        2 => LineDef::indented("✓ typecheck passed", Tone::Ok, 1),
        3 => LineDef::new("Validation: 0 errors, 2 warnings", Tone::Warn),
        4 => LineDef::new("warn: nl/multi-lul.json: 54 verbs", Tone::Warn),
        _ => LineDef::new(format!("Duration: {}ms", rng.gen_range(120..=900)), Tone::Output),
    }
}

fn completion_tagline<R: Rng + ?Sized>(rng: &mut R) -> LineDef {
    match rng.gen_range(0..3) {
        0 => LineDef::new(format!("Cooked for {}s", rng.gen_range(8..=45)), Tone::Output),
        1 => LineDef::indented(
            format!("↓ {} tokens used", rng.gen_range(800..=4200)),
            Tone::Output,
            1,
        ),
        _ => LineDef::new(format!("Done in {}s", rng.gen_range(2..=18)), Tone::Output),
    }
}

/// Fixed inserts queued once per demo at elapsed-time thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    StateDiagram,
    Promo,
}

impl Special {
    pub fn event(self, burst: &BurstDelays) -> GeneratedEvent {
        match self {
            Self::StateDiagram => GeneratedEvent {
                lines: state_diagram(),
                burst_ms: burst.diagram,
            },
            Self::Promo => GeneratedEvent {
                lines: promo(),
                burst_ms: burst.promo,
            },
        }
    }
}

fn state_diagram() -> Vec<LineDef> {
    let border = |text: &str| LineDef::new(text, Tone::Border);
    let alert = |text: &str| LineDef::new(text, Tone::Error);
    vec![
        LineDef::new("", Tone::Output),
        LineDef::new("## Session states", Tone::Accent),
        LineDef::new("", Tone::Output),
        border("   BOOT ──ready──▶ BOOT_READY ──ENTER──▶ ┌──────────┐"),
        border("                                        │   IDLE   │◀──┐"),
        border("                                        └────┬─────┘   │ ↑ at top"),
        border("                                     ↑↓      │         │"),
        border("                                        ┌────▼─────┐   │"),
        border("                                        │ BROWSING │───┘"),
        border("                                        └────┬─────┘"),
        border("                                       ENTER │"),
        border("                                        ┌────▼─────┐"),
        border("                                        │   DEMO   │"),
        border("                                        └────┬─────┘"),
        border("                              ESC / timeout  │   hold ESC"),
        border("                                        ┌────▼─────┐ ────────▶ ESC_COUNTDOWN"),
        border("                                        │POST_DEMO │"),
        border("                                        └──────────┘  ENTER: copy · marketplace"),
        border(""),
        alert("                 ╔════════╗"),
        alert("   SHIFT_TAB ───▶║ BUGGED ║───▶ previous state (ESC or timeout)"),
        alert("                 ╚════════╝"),
        LineDef::new("", Tone::Output),
        LineDef::new("Notes:", Tone::Accent),
        LineDef::indented("  • the fallback set pins after four skips while browsing", Tone::Output, 1),
        LineDef::indented("  • SHIFT_TAB reaches BUGGED from every interactive state", Tone::Output, 1),
        LineDef::new("", Tone::Output),
    ]
}

fn promo() -> Vec<LineDef> {
    let mut lines = vec![LineDef::new("", Tone::Output)];
    for row in [
        "██╗   ██╗███████╗██████╗ ██████╗ ███████╗",
        "██║   ██║██╔════╝██╔══██╗██╔══██╗██╔════╝",
        "██║   ██║█████╗  ██████╔╝██████╔╝███████╗",
        "╚██╗ ██╔╝██╔══╝  ██╔══██╗██╔══██╗╚════██║",
        " ╚████╔╝ ███████╗██║  ██║██████╔╝███████║",
        "  ╚═══╝  ╚══════╝╚═╝  ╚═╝╚═════╝ ╚══════╝",
    ] {
        lines.push(LineDef::new(row, Tone::Accent));
    }
    lines.push(LineDef::new("", Tone::Output));
    lines.push(LineDef::new("        Spinner verbs for your agent", Tone::Path));
    lines.push(LineDef::new("", Tone::Output));
    lines.push(LineDef::new(format!("┌{}┐", "─".repeat(46)), Tone::Border));
    for feature in [
        "✓ Swap the spinner text in one command",
        "✓ Sets in every language, shared by authors",
        "✓ Browse, preview and install from the CLI",
    ] {
        let pad = 46usize.saturating_sub(feature.chars().count() + 2);
        lines.push(LineDef::indented(
            format!("│  {feature}{}│", " ".repeat(pad)),
            Tone::Ok,
            1,
        ));
    }
    lines.push(LineDef::new(format!("└{}┘", "─".repeat(46)), Tone::Border));
    lines.push(LineDef::new("", Tone::Output));
    lines.push(LineDef::new("     bunx claude-verbs install <name>", Tone::Accent));
    lines.push(LineDef::new("", Tone::Output));
    lines
}

/// Pull-model queue of pending scroll lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    queue: VecDeque<LineDef>,
    current_burst_ms: u64,
    lines_left_in_burst: usize,
    refills: u64,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refill with one producer batch plus a spacer, only if empty.
    pub fn feed<R: Rng + ?Sized>(&mut self, rng: &mut R, burst: &BurstDelays) {
        if !self.queue.is_empty() {
            return;
        }
        let event = pick_event(rng, burst);
        self.queue.extend(event.lines);
        self.queue.push_back(LineDef::blank());
        self.current_burst_ms = event.burst_ms;
        self.lines_left_in_burst = self.queue.len();
        self.refills += 1;
        trace!(lines = self.queue.len(), burst_ms = self.current_burst_ms, "line buffer refilled");
    }

    pub fn next_line<R: Rng + ?Sized>(&mut self, rng: &mut R, burst: &BurstDelays) -> LineDef {
        self.feed(rng, burst);
        self.lines_left_in_burst = self.lines_left_in_burst.saturating_sub(1);
        self.queue.pop_front().unwrap_or_else(LineDef::blank)
    }

    /// Queue a fixed insert ahead of whatever is pending. Its burst delay
    /// paces exactly its own lines; whatever follows drains at `scroll_ms`.
    pub fn push_front_event(&mut self, event: GeneratedEvent) {
        let count = event.lines.len();
        for line in event.lines.into_iter().rev() {
            self.queue.push_front(line);
        }
        if event.burst_ms > 0 {
            self.current_burst_ms = event.burst_ms;
            self.lines_left_in_burst = count;
        }
    }

    /// Delay before the next line: the batch's burst delay while lines of
    /// that batch remain, otherwise `scroll_ms`.
    pub fn scroll_delay(&self, scroll_ms: u64) -> u64 {
        if self.current_burst_ms > 0 && self.lines_left_in_burst > 0 {
            self.current_burst_ms
        } else {
            scroll_ms
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn refills(&self) -> u64 {
        self.refills
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.current_burst_ms = 0;
        self.lines_left_in_burst = 0;
    }
}
