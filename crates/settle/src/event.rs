//! Input event types and the key table used to synthesize keyboard input.

use crate::result::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single trusted input event delivered to the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    /// Key press (down then up)
    KeyPress {
        /// Key name, e.g. "Tab", "ArrowDown", "e"
        key: String,
    },
    /// Left click at viewport coordinates
    MouseClick {
        /// X coordinate
        x: f64,
        /// Y coordinate
        y: f64,
    },
}

impl InputEvent {
    /// Create a key press event
    #[must_use]
    pub fn key_press(key: impl Into<String>) -> Self {
        Self::KeyPress { key: key.into() }
    }

    /// Create a mouse click event
    #[must_use]
    pub const fn mouse_click(x: f64, y: f64) -> Self {
        Self::MouseClick { x, y }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyPress { key } => write!(f, "press {key}"),
            Self::MouseClick { x, y } => write!(f, "click ({x}, {y})"),
        }
    }
}

/// Everything a browser needs to synthesize a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    /// DOM `key` value
    pub key: String,
    /// DOM `code` value
    pub code: String,
    /// Windows virtual key code (`keyCode`)
    pub key_code: i64,
    /// Text inserted by the key, if any
    pub text: Option<String>,
}

impl KeyDefinition {
    fn named(key: &str, code: &str, key_code: i64, text: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            key_code,
            text: text.map(str::to_string),
        }
    }

    /// Resolve a key name. Named keys come from a fixed table; any other
    /// single character maps to itself.
    pub fn resolve(name: &str) -> HarnessResult<Self> {
        let def = match name {
            "Tab" => Self::named("Tab", "Tab", 9, None),
            "Enter" => Self::named("Enter", "Enter", 13, Some("\r")),
            "Escape" => Self::named("Escape", "Escape", 27, None),
            "Backspace" => Self::named("Backspace", "Backspace", 8, None),
            " " | "Space" => Self::named(" ", "Space", 32, Some(" ")),
            "ArrowLeft" => Self::named("ArrowLeft", "ArrowLeft", 37, None),
            "ArrowUp" => Self::named("ArrowUp", "ArrowUp", 38, None),
            "ArrowRight" => Self::named("ArrowRight", "ArrowRight", 39, None),
            "ArrowDown" => Self::named("ArrowDown", "ArrowDown", 40, None),
            other => return Self::single_char(other),
        };
        Ok(def)
    }

    fn single_char(name: &str) -> HarnessResult<Self> {
        let mut chars = name.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(HarnessError::input(format!("unknown key '{name}'")));
        };
        let upper = c.to_ascii_uppercase();
        let (code, key_code) = if c.is_ascii_alphabetic() {
            (format!("Key{upper}"), i64::from(upper as u8))
        } else if c.is_ascii_digit() {
            (format!("Digit{c}"), i64::from(c as u8))
        } else {
            (String::new(), 0)
        };
        Ok(Self {
            key: c.to_string(),
            code,
            key_code,
            text: Some(c.to_string()),
        })
    }
}
