//! Raw host input and its mapping onto dispatcher events.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::machine::DispatchEvent;

/// Keys the engine reacts to. Anything else arrives as [`Key::Char`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Enter,
    ArrowDown,
    ArrowUp,
    Tab,
    Escape,
    Char(char),
}

impl FromStr for Key {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let key = match raw {
            "Enter" | "enter" | "Return" => Self::Enter,
            "ArrowDown" | "down" => Self::ArrowDown,
            "ArrowUp" | "up" => Self::ArrowUp,
            "Tab" | "tab" => Self::Tab,
            "Escape" | "Esc" | "esc" => Self::Escape,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Self::Char(ch),
                    _ => bail!("unknown key '{other}'"),
                }
            }
        };
        Ok(key)
    }
}

impl TryFrom<String> for Key {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => f.write_str("Enter"),
            Self::ArrowDown => f.write_str("ArrowDown"),
            Self::ArrowUp => f.write_str("ArrowUp"),
            Self::Tab => f.write_str("Tab"),
            Self::Escape => f.write_str("Escape"),
            Self::Char(ch) => write!(f, "{ch}"),
        }
    }
}

/// One host input event. Pointer coordinates are view pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    KeyDown {
        key: Key,
        #[serde(default)]
        shift: bool,
        #[serde(default)]
        repeat: bool,
    },
    KeyUp {
        key: Key,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    /// Negative `delta_y` scrolls up.
    Wheel {
        delta_y: f32,
        #[serde(default)]
        x: f32,
        #[serde(default)]
        y: f32,
    },
    Tap,
    Resize {
        width: u32,
        height: u32,
    },
}

impl InputEvent {
    pub fn key_down(key: Key) -> Self {
        Self::KeyDown {
            key,
            shift: false,
            repeat: false,
        }
    }
}

/// Dispatcher event for a key press, if the key maps to one.
pub fn map_key(key: Key, shift: bool) -> Option<DispatchEvent> {
    match key {
        Key::Enter => Some(DispatchEvent::Enter),
        Key::ArrowDown => Some(DispatchEvent::ArrowDown),
        Key::ArrowUp => Some(DispatchEvent::ArrowUp),
        Key::Escape => Some(DispatchEvent::Esc),
        Key::Tab if shift => Some(DispatchEvent::ShiftTab),
        Key::Tab => Some(DispatchEvent::Tab),
        Key::Char(_) => None,
    }
}

/// Brightness bar step for a key press: `+`/`=` up, `-`/`_` down.
pub fn brightness_step(key: Key) -> Option<i8> {
    match key {
        Key::Char('+' | '=') => Some(1),
        Key::Char('-' | '_') => Some(-1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_tab_maps_to_its_own_event() {
        assert_eq!(map_key(Key::Tab, false), Some(DispatchEvent::Tab));
        assert_eq!(map_key(Key::Tab, true), Some(DispatchEvent::ShiftTab));
        assert_eq!(map_key(Key::Enter, true), Some(DispatchEvent::Enter));
        assert_eq!(map_key(Key::Char('q'), false), None);
    }

    #[test]
    fn key_names_parse_and_print_back() {
        for name in ["Enter", "ArrowDown", "ArrowUp", "Tab", "Escape", "x"] {
            let key: Key = name.parse().expect("key should parse");
            assert_eq!(key.to_string(), name);
        }
        assert_eq!("esc".parse::<Key>().ok(), Some(Key::Escape));
        assert!("F13".parse::<Key>().is_err());
    }

    #[test]
    fn brightness_keys_step_both_ways() {
        assert_eq!(brightness_step(Key::Char('+')), Some(1));
        assert_eq!(brightness_step(Key::Char('-')), Some(-1));
        assert_eq!(brightness_step(Key::Enter), None);
    }

    #[test]
    fn events_deserialize_from_tagged_yaml() {
        let event: InputEvent =
            serde_yaml::from_str("{ event: key_down, key: Tab, shift: true }").expect("yaml");
        assert_eq!(
            event,
            InputEvent::KeyDown {
                key: Key::Tab,
                shift: true,
                repeat: false
            }
        );
        let wheel: InputEvent = serde_yaml::from_str("{ event: wheel, delta_y: -120 }").expect("yaml");
        assert_eq!(
            wheel,
            InputEvent::Wheel {
                delta_y: -120.0,
                x: 0.0,
                y: 0.0
            }
        );
    }
}
