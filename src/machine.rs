//! Session state machine and keyboard dispatcher.
//!
//! [`dispatch`] is a pure function of the machine record, the browse list and
//! the optional fallback set. It mutates cursors and flags in place and
//! returns at most one [`Effect`] for the session to carry out. State entry
//! bookkeeping lives in [`Machine::enter`]; side effects of entering a state
//! (timers, camera, demo reset) are the session's job.

use std::fmt;
use std::sync::Arc;

use crate::content::ContentSet;
use crate::scheduler::TimerHandle;

/// Forward skips while browsing before the fallback set is pinned.
pub const SKIP_THRESHOLD: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Boot,
    BootReady,
    Idle,
    Browsing,
    Demo,
    PostDemo,
    Bugged,
    EscCountdown,
}

impl State {
    pub const COUNT: usize = 8;
    /// Declaration order; per-state configuration folds along it.
    pub const ALL: [State; Self::COUNT] = [
        State::Boot,
        State::BootReady,
        State::Idle,
        State::Browsing,
        State::Demo,
        State::PostDemo,
        State::Bugged,
        State::EscCountdown,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Boot => "BOOT",
            Self::BootReady => "BOOT_READY",
            Self::Idle => "IDLE",
            Self::Browsing => "BROWSING",
            Self::Demo => "DEMO",
            Self::PostDemo => "POST_DEMO",
            Self::Bugged => "BUGGED",
            Self::EscCountdown => "ESC_COUNTDOWN",
        }
    }

    /// States whose scroll feed and verb ticker run.
    pub fn is_demo_like(self) -> bool {
        matches!(
            self,
            Self::Demo | Self::PostDemo | Self::Bugged | Self::EscCountdown
        )
    }

    pub fn is_boot(self) -> bool {
        matches!(self, Self::Boot | Self::BootReady)
    }

    pub fn shows_suggestion(self) -> bool {
        matches!(self, Self::Idle | Self::Browsing | Self::PostDemo)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchEvent {
    Enter,
    ArrowDown,
    ArrowUp,
    Tab,
    Esc,
    ShiftTab,
    DemoTimeout,
    BugTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Copy,
    Marketplace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSuggestion {
    pub text: &'static str,
    pub action: PostAction,
}

pub const POST_SUGGESTIONS: [PostSuggestion; 2] = [
    PostSuggestion {
        text: "copy command to get access to spinner verb cli",
        action: PostAction::Copy,
    },
    PostSuggestion {
        text: "show marketplace",
        action: PostAction::Marketplace,
    },
];

/// What the session must do after a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Enter(State),
    RefreshSuggestion,
    Clipboard(String),
    Marketplace,
}

#[derive(Debug, Clone)]
pub struct Machine {
    pub current: State,
    pub previous: State,
    pub active_set: Option<Arc<ContentSet>>,
    pub browse_index: usize,
    pub skip_count: u32,
    pub post_index: usize,
    pub demo_timer: Option<TimerHandle>,
    pub bug_timer: Option<TimerHandle>,
    pub has_submitted: bool,
    pub tab_completed: bool,
    pub overlap: bool,
    pub mobile: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(State::Idle)
    }
}

impl Machine {
    pub fn new(initial: State) -> Self {
        Self {
            current: initial,
            previous: initial,
            active_set: None,
            browse_index: 0,
            skip_count: 0,
            post_index: 0,
            demo_timer: None,
            bug_timer: None,
            has_submitted: false,
            tab_completed: false,
            overlap: false,
            mobile: false,
        }
    }

    /// Record a transition. Returns the state that was left.
    pub fn enter(&mut self, state: State) -> State {
        let left = self.current;
        self.previous = left;
        self.current = state;
        self.tab_completed = false;
        if state == State::PostDemo {
            self.post_index = 0;
        }
        left
    }

    pub fn fallback_pinned(&self, fallback: Option<&Arc<ContentSet>>) -> bool {
        self.skip_count >= SKIP_THRESHOLD && fallback.is_some()
    }

    /// Set under the browse cursor, or the fallback once it is pinned.
    pub fn select_active_set(
        &self,
        sets: &[Arc<ContentSet>],
        fallback: Option<&Arc<ContentSet>>,
    ) -> Option<Arc<ContentSet>> {
        if self.fallback_pinned(fallback) {
            return fallback.cloned();
        }
        self.cursor_set(sets).cloned()
    }

    pub fn cursor_set<'a>(&self, sets: &'a [Arc<ContentSet>]) -> Option<&'a Arc<ContentSet>> {
        if sets.is_empty() {
            None
        } else {
            sets.get(self.browse_index % sets.len())
        }
    }
}

pub fn dispatch(
    event: DispatchEvent,
    machine: &mut Machine,
    sets: &[Arc<ContentSet>],
    fallback: Option<&Arc<ContentSet>>,
) -> Option<Effect> {
    match machine.current {
        State::Boot | State::BootReady => match event {
            DispatchEvent::Enter => Some(Effect::Enter(State::Idle)),
            DispatchEvent::ShiftTab => Some(Effect::Enter(State::Bugged)),
            _ => None,
        },
        State::Idle => dispatch_idle(event, machine, sets),
        State::Browsing => dispatch_browsing(event, machine, sets, fallback),
        State::Demo => match event {
            DispatchEvent::Esc | DispatchEvent::DemoTimeout => Some(Effect::Enter(State::PostDemo)),
            DispatchEvent::ShiftTab => Some(Effect::Enter(State::Bugged)),
            _ => None,
        },
        State::PostDemo => dispatch_post_demo(event, machine),
        State::Bugged => match event {
            DispatchEvent::Esc | DispatchEvent::BugTimeout => {
                Some(Effect::Enter(machine.previous))
            }
            _ => None,
        },
        // Driven by the escape gesture, not by discrete keys.
        State::EscCountdown => None,
    }
}

fn dispatch_idle(
    event: DispatchEvent,
    machine: &mut Machine,
    sets: &[Arc<ContentSet>],
) -> Option<Effect> {
    if event == DispatchEvent::ShiftTab {
        return Some(Effect::Enter(State::Bugged));
    }
    if sets.is_empty() {
        return None;
    }
    let len = sets.len();
    match event {
        DispatchEvent::Tab => {
            machine.tab_completed = true;
            Some(Effect::RefreshSuggestion)
        }
        DispatchEvent::Enter => {
            machine.active_set = machine.cursor_set(sets).cloned();
            Some(Effect::Enter(State::Demo))
        }
        DispatchEvent::ArrowDown => {
            machine.tab_completed = false;
            machine.browse_index = (machine.browse_index + 1) % len;
            machine.skip_count = 0;
            Some(Effect::Enter(State::Browsing))
        }
        DispatchEvent::ArrowUp => {
            machine.tab_completed = false;
            machine.browse_index = (machine.browse_index % len + len - 1) % len;
            machine.skip_count = 0;
            Some(Effect::Enter(State::Browsing))
        }
        _ => None,
    }
}

fn dispatch_browsing(
    event: DispatchEvent,
    machine: &mut Machine,
    sets: &[Arc<ContentSet>],
    fallback: Option<&Arc<ContentSet>>,
) -> Option<Effect> {
    match event {
        DispatchEvent::Tab => {
            machine.tab_completed = true;
            Some(Effect::RefreshSuggestion)
        }
        DispatchEvent::Enter => {
            let selected = machine.select_active_set(sets, fallback)?;
            machine.active_set = Some(selected);
            Some(Effect::Enter(State::Demo))
        }
        DispatchEvent::ArrowDown => {
            machine.tab_completed = false;
            browse_down(machine, sets, fallback);
            Some(Effect::RefreshSuggestion)
        }
        DispatchEvent::ArrowUp => {
            machine.tab_completed = false;
            Some(browse_up(machine, fallback))
        }
        DispatchEvent::ShiftTab => Some(Effect::Enter(State::Bugged)),
        _ => None,
    }
}

fn browse_down(machine: &mut Machine, sets: &[Arc<ContentSet>], fallback: Option<&Arc<ContentSet>>) {
    if sets.is_empty() {
        return;
    }
    machine.skip_count = machine.skip_count.saturating_add(1);
    if !machine.fallback_pinned(fallback) {
        machine.browse_index = (machine.browse_index + 1) % sets.len();
    }
}

// Not the mirror of `browse_down`: a pinned fallback drops the skip counter to
// one below the threshold without moving the cursor, and retreating from
// index 1 already returns to IDLE.
fn browse_up(machine: &mut Machine, fallback: Option<&Arc<ContentSet>>) -> Effect {
    if machine.fallback_pinned(fallback) {
        machine.skip_count = SKIP_THRESHOLD - 1;
        Effect::RefreshSuggestion
    } else if machine.browse_index <= 1 {
        Effect::Enter(State::Idle)
    } else {
        machine.browse_index -= 1;
        machine.skip_count = machine.skip_count.saturating_sub(1);
        Effect::RefreshSuggestion
    }
}

fn dispatch_post_demo(event: DispatchEvent, machine: &mut Machine) -> Option<Effect> {
    let len = POST_SUGGESTIONS.len();
    match event {
        DispatchEvent::Tab => {
            machine.tab_completed = true;
            Some(Effect::RefreshSuggestion)
        }
        DispatchEvent::Enter => match POST_SUGGESTIONS[machine.post_index % len].action {
            PostAction::Copy => machine
                .active_set
                .as_ref()
                .map(|set| Effect::Clipboard(set.install_command())),
            PostAction::Marketplace => Some(Effect::Marketplace),
        },
        DispatchEvent::ArrowDown => {
            machine.tab_completed = false;
            machine.post_index = (machine.post_index + 1) % len;
            Some(Effect::RefreshSuggestion)
        }
        DispatchEvent::ArrowUp => {
            machine.tab_completed = false;
            machine.post_index = (machine.post_index + len - 1) % len;
            Some(Effect::RefreshSuggestion)
        }
        DispatchEvent::ShiftTab => Some(Effect::Enter(State::Bugged)),
        _ => None,
    }
}

/// Prompt-line text for the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub hint: String,
    /// Whether the prompt renders in the active (bright) tone.
    pub active: bool,
}

impl Suggestion {
    pub fn prompt_text(&self) -> String {
        if self.hint.is_empty() {
            format!("❯ {}", self.label)
        } else {
            format!("❯ {}   {}", self.label, self.hint)
        }
    }
}

const BROWSE_HINT: &str = "↑↓ browse · enter to demo · · tab to complete";
const SELECT_HINT: &str = "↑↓ browse · enter to select · · tab to complete";

pub fn suggestion(
    machine: &Machine,
    sets: &[Arc<ContentSet>],
    fallback: Option<&Arc<ContentSet>>,
) -> Suggestion {
    match machine.current {
        State::Idle => {
            let set = machine.cursor_set(sets);
            let label = match set {
                Some(set) => format!("Show me some verbs of {}", set.name),
                None => "No sets available".to_owned(),
            };
            let hint = if set.is_some() && !machine.tab_completed {
                BROWSE_HINT.to_owned()
            } else {
                String::new()
            };
            Suggestion {
                label,
                hint,
                active: machine.tab_completed,
            }
        }
        State::Browsing => {
            let label = if machine.fallback_pinned(fallback) {
                "Show me some verbs of an idt".to_owned()
            } else {
                machine
                    .cursor_set(sets)
                    .map(|set| format!("Show me some verbs of {}", set.name))
                    .unwrap_or_default()
            };
            Suggestion {
                label,
                hint: hint_unless_completed(machine, BROWSE_HINT),
                active: true,
            }
        }
        State::PostDemo => Suggestion {
            label: POST_SUGGESTIONS[machine.post_index % POST_SUGGESTIONS.len()]
                .text
                .to_owned(),
            hint: hint_unless_completed(machine, SELECT_HINT),
            active: true,
        },
        _ => Suggestion {
            label: String::new(),
            hint: String::new(),
            active: true,
        },
    }
}

fn hint_unless_completed(machine: &Machine, hint: &str) -> String {
    if machine.tab_completed {
        String::new()
    } else {
        hint.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sets(names: &[&str]) -> Vec<Arc<ContentSet>> {
        names
            .iter()
            .map(|name| {
                Arc::new(ContentSet {
                    name: (*name).to_owned(),
                    display_name: String::new(),
                    description: String::new(),
                    author: String::new(),
                    github: String::new(),
                    language: "en".to_owned(),
                    category: String::new(),
                    verbs: Vec::new(),
                })
            })
            .collect()
    }

    fn apply(machine: &mut Machine, effect: Option<Effect>) {
        if let Some(Effect::Enter(state)) = effect {
            machine.enter(state);
        }
    }

    #[test]
    fn boot_enter_goes_idle() {
        let mut machine = Machine::new(State::Boot);
        let list = sets(&["a"]);
        assert_eq!(
            dispatch(DispatchEvent::Enter, &mut machine, &list, None),
            Some(Effect::Enter(State::Idle))
        );
        assert_eq!(dispatch(DispatchEvent::Tab, &mut machine, &list, None), None);
    }

    #[test]
    fn idle_with_no_sets_only_honours_shift_tab() {
        let mut machine = Machine::default();
        for event in [
            DispatchEvent::Enter,
            DispatchEvent::ArrowDown,
            DispatchEvent::ArrowUp,
            DispatchEvent::Tab,
        ] {
            assert_eq!(dispatch(event, &mut machine, &[], None), None);
        }
        assert_eq!(suggestion(&machine, &[], None).label, "No sets available");
        assert_eq!(
            dispatch(DispatchEvent::ShiftTab, &mut machine, &[], None),
            Some(Effect::Enter(State::Bugged))
        );
    }

    #[test]
    fn boot_states_accept_shift_tab() {
        for state in [State::Boot, State::BootReady] {
            let mut machine = Machine::new(state);
            assert_eq!(
                dispatch(DispatchEvent::ShiftTab, &mut machine, &[], None),
                Some(Effect::Enter(State::Bugged))
            );
        }
    }

    #[test]
    fn idle_tab_completes_without_changing_state() {
        let mut machine = Machine::default();
        let list = sets(&["a", "b"]);
        let effect = dispatch(DispatchEvent::Tab, &mut machine, &list, None);
        assert_eq!(effect, Some(Effect::RefreshSuggestion));
        assert!(machine.tab_completed);
        let shown = suggestion(&machine, &list, None);
        assert!(shown.hint.is_empty());
        assert!(shown.active);
    }

    #[test]
    fn browse_up_at_cursor_one_returns_idle() {
        let mut machine = Machine::default();
        let list = sets(&["a", "b", "c"]);
        let effect = dispatch(DispatchEvent::ArrowDown, &mut machine, &list, None);
        apply(&mut machine, effect);
        assert_eq!((machine.current, machine.browse_index), (State::Browsing, 1));
        let effect = dispatch(DispatchEvent::ArrowUp, &mut machine, &list, None);
        assert_eq!(effect, Some(Effect::Enter(State::Idle)));
    }

    #[test]
    fn pinned_fallback_retreat_drops_skip_below_threshold() {
        let list = sets(&["a", "b", "c"]);
        let fallback = sets(&["idiot"]).remove(0);
        let mut machine = Machine::default();
        machine.enter(State::Browsing);
        for _ in 0..SKIP_THRESHOLD {
            dispatch(DispatchEvent::ArrowDown, &mut machine, &list, Some(&fallback));
        }
        assert!(machine.fallback_pinned(Some(&fallback)));
        let cursor = machine.browse_index;

        dispatch(DispatchEvent::ArrowUp, &mut machine, &list, Some(&fallback));
        assert_eq!(machine.skip_count, SKIP_THRESHOLD - 1);
        assert_eq!(machine.browse_index, cursor);
        assert_eq!(
            suggestion(&machine, &list, Some(&fallback)).label,
            format!("Show me some verbs of {}", list[cursor].name)
        );
    }

    #[test]
    fn post_demo_menu_copies_install_command_and_calls_marketplace() {
        let list = sets(&["pirate"]);
        let mut machine = Machine::default();
        machine.active_set = Some(list[0].clone());
        machine.enter(State::Demo);
        machine.enter(State::PostDemo);

        assert_eq!(
            dispatch(DispatchEvent::Enter, &mut machine, &list, None),
            Some(Effect::Clipboard("bunx claude-verbs install pirate".to_owned()))
        );
        dispatch(DispatchEvent::ArrowDown, &mut machine, &list, None);
        assert_eq!(
            dispatch(DispatchEvent::Enter, &mut machine, &list, None),
            Some(Effect::Marketplace)
        );
        dispatch(DispatchEvent::ArrowDown, &mut machine, &list, None);
        assert_eq!(machine.post_index, 0);
        dispatch(DispatchEvent::ArrowUp, &mut machine, &list, None);
        assert_eq!(machine.post_index, 1);
        assert_eq!(machine.current, State::PostDemo);
    }

    #[test]
    fn bug_timeout_returns_to_previous() {
        let list = sets(&["a"]);
        let mut machine = Machine::default();
        machine.enter(State::Demo);
        let effect = dispatch(DispatchEvent::ShiftTab, &mut machine, &list, None);
        apply(&mut machine, effect);
        assert_eq!(machine.previous, State::Demo);
        assert_eq!(
            dispatch(DispatchEvent::BugTimeout, &mut machine, &list, None),
            Some(Effect::Enter(State::Demo))
        );
    }

    #[test]
    fn escape_countdown_ignores_keys() {
        let mut machine = Machine::new(State::EscCountdown);
        let list = sets(&["a"]);
        assert_eq!(dispatch(DispatchEvent::Esc, &mut machine, &list, None), None);
        assert_eq!(dispatch(DispatchEvent::ShiftTab, &mut machine, &list, None), None);
    }
}
