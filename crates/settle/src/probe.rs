//! Read-only typed queries against the page.
//!
//! Probes never mutate the page, so the wait engine can call them any
//! number of times. Globals are always read tolerantly: an undefined link on
//! the path reads as absent, never as an error.

use crate::condition::Condition;
use crate::locator::{DomQuery, ElementRect, Selector};
use crate::result::{HarnessError, HarnessResult};
use crate::session::Session;
use crate::wait::Observation;
use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

/// Typed queries over one session
#[derive(Debug, Clone, Copy)]
pub struct StateProbe<'s> {
    session: &'s Session,
}

fn not_found(selector: &Selector) -> HarnessError {
    HarnessError::ElementNotFound {
        selector: selector.to_string(),
    }
}

fn unexpected(query: &DomQuery, value: &Value) -> HarnessError {
    HarnessError::evaluation(format!("{query} returned unexpected value {value}"))
}

/// JavaScript truthiness of a JSON value
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl<'s> StateProbe<'s> {
    /// Create a probe over a session
    #[must_use]
    pub const fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Underlying session
    #[must_use]
    pub const fn session(&self) -> &'s Session {
        self.session
    }

    /// Whether the element exists and is displayed; absent means `false`
    pub async fn is_visible(&self, selector: &Selector) -> HarnessResult<bool> {
        let query = DomQuery::Visible(selector.clone());
        let value = self.session.query(&query).await?;
        value.as_bool().ok_or_else(|| unexpected(&query, &value))
    }

    /// Number of matching elements
    pub async fn count(&self, selector: &Selector) -> HarnessResult<usize> {
        let query = DomQuery::Count(selector.clone());
        let value = self.session.query(&query).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| unexpected(&query, &value))
    }

    /// Whether at least one element matches
    pub async fn exists(&self, selector: &Selector) -> HarnessResult<bool> {
        Ok(self.count(selector).await? > 0)
    }

    /// Computed style property of the first match
    pub async fn computed_style(&self, selector: &Selector, property: &str) -> HarnessResult<String> {
        let query = DomQuery::ComputedStyle {
            selector: selector.clone(),
            property: property.to_string(),
        };
        match self.session.query(&query).await? {
            Value::Null => Err(not_found(selector)),
            Value::String(s) => Ok(s),
            other => Err(unexpected(&query, &other)),
        }
    }

    /// Class list of the first match
    pub async fn class_list(&self, selector: &Selector) -> HarnessResult<BTreeSet<String>> {
        let query = DomQuery::ClassList(selector.clone());
        match self.session.query(&query).await? {
            Value::Null => Err(not_found(selector)),
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()),
            other => Err(unexpected(&query, &other)),
        }
    }

    /// Text content of the first match
    pub async fn text_content(&self, selector: &Selector) -> HarnessResult<String> {
        let query = DomQuery::TextContent(selector.clone());
        match self.session.query(&query).await? {
            Value::Null => Err(not_found(selector)),
            Value::String(s) => Ok(s),
            other => Err(unexpected(&query, &other)),
        }
    }

    /// Bounding client rect of the first match
    pub async fn element_rect(&self, selector: &Selector) -> HarnessResult<ElementRect> {
        let query = DomQuery::Rect(selector.clone());
        match self.session.query(&query).await? {
            Value::Null => Err(not_found(selector)),
            value => Ok(serde_json::from_value(value)?),
        }
    }

    /// Evaluate an expression; throwing or undefined reads as `null`
    pub async fn expression(&self, script: &str) -> HarnessResult<Value> {
        self.session
            .query(&DomQuery::Expression(script.to_string()))
            .await
    }

    /// Read a global by dotted path; any absent link reads as `None`
    pub async fn global(&self, path: &str) -> HarnessResult<Option<Value>> {
        let value = self.session.query(&DomQuery::Global(path.to_string())).await?;
        Ok((!value.is_null()).then_some(value))
    }

    /// Every console message since the session opened
    pub async fn console_transcript(&self) -> HarnessResult<Vec<String>> {
        self.session.console_transcript().await
    }

    /// Evaluate a condition once
    ///
    /// Missing elements make element conditions false rather than failing.
    pub fn observe<'a>(&'a self, condition: &'a Condition) -> BoxFuture<'a, HarnessResult<Observation>> {
        async move {
            let observation = match condition {
                Condition::Visible { selector } => Observation::flag(self.is_visible(selector).await?),
                Condition::Hidden { selector } => Observation::flag(!self.is_visible(selector).await?),
                Condition::Exists { selector } => Observation::flag(self.exists(selector).await?),
                Condition::CountAtLeast { selector, min } => {
                    let count = self.count(selector).await?;
                    Observation::new(count >= *min, Value::from(count))
                }
                Condition::HasClass { selector, class } => match self.class_list(selector).await {
                    Ok(classes) => Observation::new(
                        classes.contains(class),
                        Value::from(classes.into_iter().collect::<Vec<_>>()),
                    ),
                    Err(HarnessError::ElementNotFound { .. }) => Observation::new(false, Value::Null),
                    Err(e) => return Err(e),
                },
                Condition::TextContains { selector, text } => match self.text_content(selector).await {
                    Ok(content) => Observation::new(content.contains(text.as_str()), Value::from(content)),
                    Err(HarnessError::ElementNotFound { .. }) => Observation::new(false, Value::Null),
                    Err(e) => return Err(e),
                },
                Condition::Expression { script } => {
                    let value = self.expression(script).await?;
                    Observation::new(truthy(&value), value)
                }
                Condition::GlobalDefined { path } => {
                    let actual = self.global(path).await?;
                    Observation::new(actual.is_some(), actual.unwrap_or(Value::Null))
                }
                Condition::GlobalEquals { path, value } => {
                    let actual = self.global(path).await?.unwrap_or(Value::Null);
                    Observation::new(&actual == value, actual)
                }
                Condition::ConsoleContains { text } => {
                    let transcript = self.console_transcript().await?;
                    let hit = transcript.iter().find(|line| line.contains(text.as_str()));
                    Observation::new(hit.is_some(), hit.map_or(Value::Null, |l| Value::from(l.as_str())))
                }
                Condition::ConsoleMatches { pattern } => {
                    let re = Regex::new(pattern)
                        .map_err(|e| HarnessError::invalid_config(format!("bad console pattern: {e}")))?;
                    let transcript = self.console_transcript().await?;
                    let hit = transcript.iter().find(|line| re.is_match(line));
                    Observation::new(hit.is_some(), hit.map_or(Value::Null, |l| Value::from(l.as_str())))
                }
                Condition::All { conditions } => {
                    let mut values = Vec::with_capacity(conditions.len());
                    for inner in conditions {
                        let observation = self.observe(inner).await?;
                        values.push(observation.value);
                        if !observation.satisfied {
                            return Ok(Observation::new(false, Value::Array(values)));
                        }
                    }
                    Observation::new(true, Value::Array(values))
                }
                Condition::Any { conditions } => {
                    let mut values = Vec::with_capacity(conditions.len());
                    for inner in conditions {
                        let observation = self.observe(inner).await?;
                        values.push(observation.value);
                        if observation.satisfied {
                            return Ok(Observation::new(true, Value::Array(values)));
                        }
                    }
                    Observation::new(false, Value::Array(values))
                }
                Condition::Not { condition } => {
                    let inner = self.observe(condition).await?;
                    Observation::new(!inner.satisfied, inner.value)
                }
            };
            Ok(observation)
        }
        .boxed()
    }
}
