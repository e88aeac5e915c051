//! Scripted input timelines for headless runs.
//!
//! A script is a YAML (or JSON) document listing input events against the
//! session clock:
//!
//! ```yaml
//! steps:
//!   - { at_ms: 2500, event: key_down, key: Enter }
//!   - { at_ms: 2550, event: key_up, key: Enter }
//!   - { at_ms: 9000, event: wheel, delta_y: -240, x: 400, y: 300 }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::input::{InputEvent, Key};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: InputEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn parse(raw: &str) -> Result<Self> {
        let script: Script = serde_yaml::from_str(raw).context("failed to parse input script")?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid script {}", path.display()))
    }

    /// Steps must be in time order; a resize must be non-empty.
    pub fn validate(&self) -> Result<()> {
        for (index, pair) in self.steps.windows(2).enumerate() {
            if pair[1].at_ms < pair[0].at_ms {
                bail!(
                    "script step {} at {}ms comes before step {} at {}ms",
                    index + 1,
                    pair[1].at_ms,
                    index,
                    pair[0].at_ms
                );
            }
        }
        for (index, step) in self.steps.iter().enumerate() {
            if let InputEvent::Resize { width, height } = step.event {
                if width == 0 || height == 0 {
                    bail!("script step {index} resizes to an empty {width}x{height} view");
                }
            }
        }
        Ok(())
    }

    /// Time of the last step, or 0 for an empty script.
    pub fn end_ms(&self) -> u64 {
        self.steps.last().map_or(0, |step| step.at_ms)
    }

    /// Append a key press and its release `hold_ms` later.
    pub fn press(&mut self, at_ms: u64, key: Key, hold_ms: u64) {
        self.steps.push(ScriptStep {
            at_ms,
            event: InputEvent::key_down(key),
        });
        self.steps.push(ScriptStep {
            at_ms: at_ms + hold_ms,
            event: InputEvent::KeyUp { key },
        });
    }

    pub fn player(&self) -> ScriptPlayer<'_> {
        ScriptPlayer {
            steps: &self.steps,
            next: 0,
        }
    }
}

/// Hands out steps as the clock passes them.
#[derive(Debug, Clone)]
pub struct ScriptPlayer<'a> {
    steps: &'a [ScriptStep],
    next: usize,
}

impl<'a> ScriptPlayer<'a> {
    /// Every not-yet-played step due at or before `now_ms`.
    pub fn due(&mut self, now_ms: u64) -> &'a [ScriptStep] {
        let start = self.next;
        while self
            .steps
            .get(self.next)
            .is_some_and(|step| step.at_ms <= now_ms)
        {
            self.next += 1;
        }
        &self.steps[start..self.next]
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
steps:
  - { at_ms: 100, event: key_down, key: Enter }
  - { at_ms: 150, event: key_up, key: Enter }
  - { at_ms: 400, event: pointer_move, x: 10, y: 20 }
  - { at_ms: 400, event: tap }
"#;

    #[test]
    fn parses_flattened_events() {
        let script = Script::parse(SCRIPT).expect("script should parse");
        assert_eq!(script.steps.len(), 4);
        assert_eq!(script.steps[0].event, InputEvent::key_down(Key::Enter));
        assert_eq!(script.steps[3].event, InputEvent::Tap);
        assert_eq!(script.end_ms(), 400);
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let err = Script::parse(
            "steps:\n  - { at_ms: 500, event: tap }\n  - { at_ms: 100, event: tap }\n",
        )
        .expect_err("should reject");
        assert!(format!("{err:#}").contains("comes before"));
    }

    #[test]
    fn unknown_key_names_fail_to_parse() {
        let err = Script::parse("steps:\n  - { at_ms: 0, event: key_down, key: Hyper }\n")
            .expect_err("should reject");
        assert!(format!("{err:#}").contains("failed to parse input script"));
    }

    #[test]
    fn player_releases_each_step_once() {
        let script = Script::parse(SCRIPT).expect("script should parse");
        let mut player = script.player();
        assert!(player.due(99).is_empty());
        assert_eq!(player.due(150).len(), 2);
        assert!(player.due(150).is_empty());
        assert_eq!(player.due(10_000).len(), 2);
        assert!(player.is_finished());
    }

    #[test]
    fn press_appends_down_then_up() {
        let mut script = Script::default();
        script.press(1_000, Key::Escape, 1_600);
        assert_eq!(script.steps[1].at_ms, 2_600);
        assert_eq!(script.steps[1].event, InputEvent::KeyUp { key: Key::Escape });
        script.validate().expect("ordered");
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("script.yaml");
        fs::write(&path, SCRIPT).expect("write");
        assert_eq!(Script::load(&path).expect("load").steps.len(), 4);
        let missing = Script::load(&dir.path().join("nope.yaml")).expect_err("missing");
        assert!(format!("{missing:#}").contains("nope.yaml"));
    }
}
