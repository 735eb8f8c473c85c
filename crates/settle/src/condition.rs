//! Conditions: named, side-effect-free predicates over page state.
//!
//! A condition is plain data. [`crate::StateProbe::observe`] evaluates it and
//! the wait engine polls that evaluation.

use crate::locator::Selector;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A predicate over page state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Element exists and is displayed
    Visible {
        /// Element selector
        selector: Selector,
    },
    /// Element is absent or not displayed
    Hidden {
        /// Element selector
        selector: Selector,
    },
    /// At least one element matches
    Exists {
        /// Element selector
        selector: Selector,
    },
    /// At least `min` elements match
    CountAtLeast {
        /// Element selector
        selector: Selector,
        /// Minimum count
        min: usize,
    },
    /// First match carries the class
    HasClass {
        /// Element selector
        selector: Selector,
        /// Class name
        class: String,
    },
    /// First match's text contains the string
    TextContains {
        /// Element selector
        selector: Selector,
        /// Expected substring
        text: String,
    },
    /// In-page expression is truthy; throwing or undefined counts as false
    Expression {
        /// JavaScript expression
        script: String,
    },
    /// Global at a dotted path is neither undefined nor null
    GlobalDefined {
        /// Dotted path under `window`
        path: String,
    },
    /// Global at a dotted path equals a JSON value
    GlobalEquals {
        /// Dotted path under `window`
        path: String,
        /// Expected value
        value: Value,
    },
    /// Some console message contains the string
    ConsoleContains {
        /// Expected substring
        text: String,
    },
    /// Some console message matches the regular expression
    ConsoleMatches {
        /// Regular expression
        pattern: String,
    },
    /// Every inner condition holds
    All {
        /// Inner conditions
        conditions: Vec<Condition>,
    },
    /// At least one inner condition holds
    Any {
        /// Inner conditions
        conditions: Vec<Condition>,
    },
    /// Inner condition does not hold
    Not {
        /// Inner condition
        condition: Box<Condition>,
    },
}

impl Condition {
    /// Element is visible
    #[must_use]
    pub fn visible(selector: impl Into<Selector>) -> Self {
        Self::Visible {
            selector: selector.into(),
        }
    }

    /// Element is hidden or absent
    #[must_use]
    pub fn hidden(selector: impl Into<Selector>) -> Self {
        Self::Hidden {
            selector: selector.into(),
        }
    }

    /// Element exists
    #[must_use]
    pub fn exists(selector: impl Into<Selector>) -> Self {
        Self::Exists {
            selector: selector.into(),
        }
    }

    /// At least `min` matches
    #[must_use]
    pub fn count_at_least(selector: impl Into<Selector>, min: usize) -> Self {
        Self::CountAtLeast {
            selector: selector.into(),
            min,
        }
    }

    /// First match carries `class`
    #[must_use]
    pub fn has_class(selector: impl Into<Selector>, class: impl Into<String>) -> Self {
        Self::HasClass {
            selector: selector.into(),
            class: class.into(),
        }
    }

    /// First match's text contains `text`
    #[must_use]
    pub fn text_contains(selector: impl Into<Selector>, text: impl Into<String>) -> Self {
        Self::TextContains {
            selector: selector.into(),
            text: text.into(),
        }
    }

    /// Expression is truthy
    #[must_use]
    pub fn expression(script: impl Into<String>) -> Self {
        Self::Expression {
            script: script.into(),
        }
    }

    /// Global is defined
    #[must_use]
    pub fn global_defined(path: impl Into<String>) -> Self {
        Self::GlobalDefined { path: path.into() }
    }

    /// Global equals `value`
    #[must_use]
    pub fn global_equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::GlobalEquals {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Console contains `text`
    #[must_use]
    pub fn console_contains(text: impl Into<String>) -> Self {
        Self::ConsoleContains { text: text.into() }
    }

    /// Console matches `pattern`
    #[must_use]
    pub fn console_matches(pattern: impl Into<String>) -> Self {
        Self::ConsoleMatches {
            pattern: pattern.into(),
        }
    }

    /// Every condition holds
    #[must_use]
    pub fn all(conditions: impl IntoIterator<Item = Self>) -> Self {
        Self::All {
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Any condition holds
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Self>) -> Self {
        Self::Any {
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Both hold
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::All { mut conditions } => {
                conditions.push(other);
                Self::All { conditions }
            }
            first => Self::all([first, other]),
        }
    }

    /// Either holds
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Any { mut conditions } => {
                conditions.push(other);
                Self::Any { conditions }
            }
            first => Self::any([first, other]),
        }
    }

    /// Negation
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::Not { condition } => *condition,
            other => Self::Not {
                condition: Box::new(other),
            },
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, op: &str, conditions: &[Condition]) -> fmt::Result {
    write!(f, "{op}(")?;
    for (i, c) in conditions.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{c}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visible { selector } => write!(f, "visible({selector})"),
            Self::Hidden { selector } => write!(f, "hidden({selector})"),
            Self::Exists { selector } => write!(f, "exists({selector})"),
            Self::CountAtLeast { selector, min } => write!(f, "count({selector}) >= {min}"),
            Self::HasClass { selector, class } => write!(f, "{selector} has class {class:?}"),
            Self::TextContains { selector, text } => write!(f, "text({selector}) contains {text:?}"),
            Self::Expression { script } => write!(f, "eval({script})"),
            Self::GlobalDefined { path } => write!(f, "defined({path})"),
            Self::GlobalEquals { path, value } => write!(f, "{path} == {value}"),
            Self::ConsoleContains { text } => write!(f, "console contains {text:?}"),
            Self::ConsoleMatches { pattern } => write!(f, "console matches /{pattern}/"),
            Self::All { conditions } => join(f, "all", conditions),
            Self::Any { conditions } => join(f, "any", conditions),
            Self::Not { condition } => write!(f, "not({condition})"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Condition::visible("#ui-root").to_string(), "visible(#ui-root)");
        assert_eq!(
            Condition::has_class("#cmd", "slide-visible").to_string(),
            "#cmd has class \"slide-visible\""
        );
        assert_eq!(
            Condition::global_equals("Renderer.isAnimating", false).to_string(),
            "Renderer.isAnimating == false"
        );
    }

    #[test]
    fn test_and_flattens() {
        let c = Condition::visible("#a").and(Condition::visible("#b")).and(Condition::visible("#c"));
        match c {
            Condition::All { conditions } => assert_eq!(conditions.len(), 3),
            other => panic!("expected All, got {other:?}"),
        }
    }

    #[test]
    fn test_or_and_display() {
        let c = Condition::console_contains("System initialized.")
            .or(Condition::exists(Selector::css_with_text("div", "System initialized.")));
        assert!(c.to_string().starts_with("any(console contains"));
    }

    #[test]
    fn test_double_negation_cancels() {
        let c = Condition::visible("#cutscene-overlay");
        assert_eq!(c.clone().negate().negate(), c);
    }

    #[test]
    fn test_serde_roundtrip() {
        let c = Condition::count_at_least(".party-slot", 4);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"kind\":\"count_at_least\""));
        assert_eq!(serde_json::from_str::<Condition>(&json).unwrap(), c);
    }
}
