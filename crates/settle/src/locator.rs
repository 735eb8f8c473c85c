//! Selectors and the read-only DOM queries built from them.
//!
//! Every query compiles to a single JavaScript expression. Queries never
//! focus, click or navigate, so the wait engine can re-run them freely.
//!
//! Absence conventions:
//!
//! - `Visible` and `Count` answer `false` / `0` for a missing element
//! - `ComputedStyle`, `ClassList`, `TextContent` and `Rect` answer `null`
//! - `Global` and `Expression` answer `null` for anything undefined or throwing
//!
//! A malformed CSS selector still throws inside the page; that surfaces as an
//! evaluation error because it is a bug in the scenario, not a page state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding client rect of an element
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementRect {
    /// Distance from the viewport top
    pub top: f64,
    /// Distance from the viewport left
    pub left: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl ElementRect {
    /// Create a new rect
    #[must_use]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Get the center point
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Whether the rect has a visible area
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// CSS selector (e.g., "#cutscene-overlay", ".cmd-btn")
    Css(String),
    /// Innermost element whose text contains the string
    Text(String),
    /// CSS selector filtered by contained text (`div:has-text("...")`)
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create a CSS selector filtered by text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Convert to a JavaScript expression yielding the element or `undefined`
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelector({})", js_str(s)),
            Self::Text(t) => format!(
                "(() => {{ const t = {t}; return Array.from(document.querySelectorAll('body *'))\
                 .filter(el => el.textContent.includes(t))\
                 .find(el => !Array.from(el.children).some(c => c.textContent.includes(t))); }})()",
                t = js_str(t)
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from(document.querySelectorAll({})).find(el => el.textContent.includes({}))",
                js_str(css),
                js_str(text)
            ),
        }
    }

    /// Convert to a JavaScript expression counting matches
    #[must_use]
    pub fn to_count_query(&self) -> String {
        match self {
            Self::Css(s) => format!("document.querySelectorAll({}).length", js_str(s)),
            Self::Text(t) => format!(
                "(() => {{ const t = {t}; return Array.from(document.querySelectorAll('body *'))\
                 .filter(el => el.textContent.includes(t))\
                 .filter(el => !Array.from(el.children).some(c => c.textContent.includes(t))).length; }})()",
                t = js_str(t)
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from(document.querySelectorAll({})).filter(el => el.textContent.includes({})).length",
                js_str(css),
                js_str(text)
            ),
        }
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::Css(value.to_string())
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Self::Css(value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::Text(t) => write!(f, "text={t:?}"),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text({text:?})"),
        }
    }
}

/// A read-only query against the page
#[derive(Debug, Clone, PartialEq)]
pub enum DomQuery {
    /// Element exists, is displayed, and has a non-empty box
    Visible(Selector),
    /// Number of matching elements
    Count(Selector),
    /// Computed style property of the first match
    ComputedStyle {
        /// Element selector
        selector: Selector,
        /// CSS property (kebab-case or camelCase)
        property: String,
    },
    /// Class list of the first match
    ClassList(Selector),
    /// Text content of the first match
    TextContent(Selector),
    /// Bounding client rect of the first match
    Rect(Selector),
    /// Dotted path under `window`, e.g. `$gameSystem.ui.focusedWindow`
    Global(String),
    /// Arbitrary expression, `null` if it throws or is undefined
    Expression(String),
}

impl DomQuery {
    /// Compile the query into a single JavaScript expression
    #[must_use]
    pub fn to_script(&self) -> String {
        match self {
            Self::Visible(selector) => format!(
                "(() => {{ const el = {}; if (!el) return false; \
                 const s = window.getComputedStyle(el); \
                 if (s.visibility === 'hidden' || s.display === 'none') return false; \
                 const r = el.getBoundingClientRect(); return r.width > 0 && r.height > 0; }})()",
                selector.to_query()
            ),
            Self::Count(selector) => selector.to_count_query(),
            Self::ComputedStyle { selector, property } => format!(
                "(() => {{ const el = {}; if (!el) return null; \
                 const s = window.getComputedStyle(el); const p = {}; \
                 const v = s.getPropertyValue(p) || s[p]; \
                 return v === undefined || v === null ? '' : String(v); }})()",
                selector.to_query(),
                js_str(property)
            ),
            Self::ClassList(selector) => format!(
                "(() => {{ const el = {}; return el ? Array.from(el.classList) : null; }})()",
                selector.to_query()
            ),
            Self::TextContent(selector) => format!(
                "(() => {{ const el = {}; return el ? (el.textContent || '') : null; }})()",
                selector.to_query()
            ),
            Self::Rect(selector) => format!(
                "(() => {{ const el = {}; if (!el) return null; const r = el.getBoundingClientRect(); \
                 return {{ top: r.top, left: r.left, width: r.width, height: r.height }}; }})()",
                selector.to_query()
            ),
            Self::Global(path) => {
                let mut segments = path.split('.').filter(|k| !k.is_empty());
                let root = segments.next().map_or_else(|| "window".to_string(), global_root);
                let keys: Vec<String> = segments.map(js_str).collect();
                format!(
                    "(() => {{ try {{ let v = {}; for (const k of [{}]) {{ \
                     if (v === null || v === undefined) return null; v = v[k]; }} \
                     {} }} catch (e) {{ return null; }} }})()",
                    root,
                    keys.join(", "),
                    PLAIN_RETURN
                )
            }
            Self::Expression(expression) => format!(
                "(() => {{ try {{ const v = ({expression}); {PLAIN_RETURN} }} catch (e) {{ return null; }} }})()"
            ),
        }
    }
}

impl fmt::Display for DomQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible(s) => write!(f, "visible({s})"),
            Self::Count(s) => write!(f, "count({s})"),
            Self::ComputedStyle { selector, property } => {
                write!(f, "style({selector}, {property})")
            }
            Self::ClassList(s) => write!(f, "classList({s})"),
            Self::TextContent(s) => write!(f, "text({s})"),
            Self::Rect(s) => write!(f, "rect({s})"),
            Self::Global(path) => write!(f, "global({path})"),
            Self::Expression(e) => write!(f, "eval({e})"),
        }
    }
}

/// Return `v` as plain JSON: undefined becomes null, objects are detached
/// through JSON so cyclic game state cannot break value transfer.
const PLAIN_RETURN: &str = "if (v === undefined) return null; \
     if (typeof v === 'function') return null; \
     if (typeof v === 'object' && v !== null) { \
     try { return JSON.parse(JSON.stringify(v)); } catch (e) { return String(v); } } \
     return v;";

/// Reserved words that cannot be read as a bare binding
const JS_RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "import", "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && !JS_RESERVED.contains(&name)
}

/// First segment of a global path.
///
/// Top-level `let`/`const` bindings live in the global lexical scope and are
/// not properties of `window`, so a plain identifier is read bare first.
fn global_root(name: &str) -> String {
    let property = format!("window[{}]", js_str(name));
    if is_js_identifier(name) {
        format!("(typeof {name} !== 'undefined' ? {name} : {property})")
    } else {
        property
    }
}

/// Quote a string as a JavaScript string literal
pub(crate) fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
