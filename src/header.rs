//! Intro banner and welcome header rows prepended to the scroll buffer.

use crate::theme::Tone;

/// Column where the header's right-hand panel starts.
pub const HEADER_LEFT_COL: usize = 38;
pub const HEADER_COLS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPart {
    pub text: String,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRow {
    pub parts: Vec<HeaderPart>,
    /// Intro rows are dropped when BOOT is left; header rows stay.
    pub intro: bool,
    pub x: f32,
    pub y: f32,
}

impl HeaderRow {
    fn single(text: impl Into<String>, tone: Tone, intro: bool) -> Self {
        Self {
            parts: vec![HeaderPart {
                text: text.into(),
                tone,
            }],
            intro,
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn text(&self) -> String {
        self.parts.iter().map(|part| part.text.as_str()).collect()
    }
}

const TITLE_ART: [&str; 6] = [
    "██╗   ██╗███████╗██████╗ ██████╗ ███████╗",
    "██║   ██║██╔════╝██╔══██╗██╔══██╗██╔════╝",
    "██║   ██║█████╗  ██████╔╝██████╔╝███████╗",
    "╚██╗ ██╔╝██╔══╝  ██╔══██╗██╔══██╗╚════██║",
    " ╚████╔╝ ███████╗██║  ██║██████╔╝███████║",
    "  ╚═══╝  ╚══════╝╚═╝  ╚═╝╚═════╝ ╚══════╝",
];

pub fn build_intro_rows() -> Vec<HeaderRow> {
    let blank = || HeaderRow::single("", Tone::Dim, true);
    let mut rows = vec![
        blank(),
        HeaderRow::single("  Loading verbs...", Tone::Dim, true),
        blank(),
    ];
    rows.extend(
        TITLE_ART
            .iter()
            .map(|line| HeaderRow::single(format!("  {line}"), Tone::Prompt, true)),
    );
    rows.push(blank());
    for line in [
        "  Spinner verb packs for your terminal",
        "  agent, browsable by language.",
    ] {
        rows.push(HeaderRow::single(line, Tone::Dim, true));
    }
    rows.push(blank());
    rows.push(HeaderRow::single(
        format!("  {}", "─".repeat(41)),
        Tone::Border,
        true,
    ));
    rows.push(blank());
    rows
}

fn centered(text: &str, width: usize) -> String {
    let gap = width.saturating_sub(text.chars().count());
    let left = gap / 2;
    format!("{}{text}{}", " ".repeat(left), " ".repeat(gap - left))
}

fn right_padded(text: &str, width: usize) -> String {
    let gap = width.saturating_sub(text.chars().count());
    format!("{text}{}", " ".repeat(gap))
}

/// Boxed welcome panel, `cols` wide, advertising `set_count` sets.
pub fn build_header_rows(cols: usize, set_count: usize) -> Vec<HeaderRow> {
    let inner = cols.saturating_sub(2);
    let left_w = HEADER_LEFT_COL;
    let right_w = inner.saturating_sub(left_w + 1);

    let row = |left: &str, right: &str, tone: Tone| HeaderRow {
        parts: vec![
            HeaderPart {
                text: "│".to_owned(),
                tone: Tone::Verb,
            },
            HeaderPart {
                text: centered(left, left_w),
                tone,
            },
            HeaderPart {
                text: "│".to_owned(),
                tone: Tone::Verb,
            },
            HeaderPart {
                text: right_padded(&format!(" {right}"), right_w),
                tone,
            },
            HeaderPart {
                text: "│".to_owned(),
                tone: Tone::Verb,
            },
        ],
        intro: false,
        x: 0.0,
        y: 0.0,
    };

    let title = " Verbs ";
    let dashes = inner.saturating_sub(title.chars().count());
    let dash_left = dashes / 2;
    let top = HeaderRow {
        parts: vec![
            HeaderPart {
                text: format!("╭{}", "─".repeat(dash_left)),
                tone: Tone::Verb,
            },
            HeaderPart {
                text: title.to_owned(),
                tone: Tone::Accent,
            },
            HeaderPart {
                text: format!("{}╮", "─".repeat(dashes - dash_left)),
                tone: Tone::Verb,
            },
        ],
        intro: false,
        x: 0.0,
        y: 0.0,
    };

    vec![
        top,
        row("", "", Tone::Border),
        row("Welcome!", "Getting started", Tone::Verb),
        row("", "bunx claude-verbs install <name>", Tone::Dim),
        row("▐▛███▜▌", &"─".repeat(25), Tone::Verb),
        row("▝▜█████▛▘", &format!("{set_count} verb sets available"), Tone::Verb),
        row("▘▘ ▝▝", "Arrow keys to browse", Tone::Dim),
        row("", "", Tone::Border),
        row(concat!("verbscope v", env!("CARGO_PKG_VERSION")), "", Tone::Verb),
        row("", "", Tone::Border),
        HeaderRow::single(format!("╰{}╯", "─".repeat(inner)), Tone::Verb, false),
    ]
}
