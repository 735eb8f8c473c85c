//! Keyboard and pointer input, and scripted sequences with per-step settling.
//!
//! A sequence is a list of [`InteractionStep`]s executed strictly in order.
//! After each action the step's [`Settle`] rule is awaited before the next
//! action is sent. The first step whose settle condition times out aborts
//! the sequence with [`HarnessError::StepTimeout`], which carries the
//! records of the steps that settled before it.

use crate::condition::Condition;
use crate::event::InputEvent;
use crate::locator::Selector;
use crate::probe::StateProbe;
use crate::result::{HarnessError, HarnessResult};
use crate::session::Session;
use crate::wait::{self, WaitOptions, WaitResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// What a step does to the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Press and release a key
    Press {
        /// Key name
        key: String,
    },
    /// Click at viewport coordinates
    Click {
        /// X coordinate
        x: f64,
        /// Y coordinate
        y: f64,
    },
    /// Click the center of the first match
    ClickSelector {
        /// Element selector
        selector: Selector,
    },
    /// Evaluate a script for its side effect (e.g. `UI.focusWindow("cmd")`)
    Evaluate {
        /// JavaScript
        script: String,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Press { key } => write!(f, "press {key}"),
            Self::Click { x, y } => write!(f, "click ({x}, {y})"),
            Self::ClickSelector { selector } => write!(f, "click {selector}"),
            Self::Evaluate { script } => write!(f, "eval {script}"),
        }
    }
}

/// How to decide that a step has taken effect
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Settle {
    /// Move on immediately
    #[default]
    None,
    /// Wait for a condition
    Condition {
        /// Condition to await
        condition: Condition,
        /// Wait bounds
        options: WaitOptions,
    },
    /// Fixed delay; only when the page exposes no observable signal
    Delay(Duration),
}

/// One action plus its settle rule
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionStep {
    /// Action to perform
    pub action: Action,
    /// Settle rule awaited after the action
    pub settle: Settle,
    /// Screenshot label taken once the step settled
    pub capture: Option<String>,
}

impl InteractionStep {
    /// Create a step with no settle rule
    #[must_use]
    pub const fn new(action: Action) -> Self {
        Self {
            action,
            settle: Settle::None,
            capture: None,
        }
    }

    /// Key press step
    #[must_use]
    pub fn press(key: impl Into<String>) -> Self {
        Self::new(Action::Press { key: key.into() })
    }

    /// Coordinate click step
    #[must_use]
    pub const fn click(x: f64, y: f64) -> Self {
        Self::new(Action::Click { x, y })
    }

    /// Selector click step
    #[must_use]
    pub fn click_selector(selector: impl Into<Selector>) -> Self {
        Self::new(Action::ClickSelector {
            selector: selector.into(),
        })
    }

    /// Script evaluation step
    #[must_use]
    pub fn evaluate(script: impl Into<String>) -> Self {
        Self::new(Action::Evaluate {
            script: script.into(),
        })
    }

    /// Settle by waiting for a condition
    #[must_use]
    pub fn settle_on(mut self, condition: Condition, options: WaitOptions) -> Self {
        self.settle = Settle::Condition { condition, options };
        self
    }

    /// Settle with a fixed delay
    #[must_use]
    pub fn settle_for(mut self, delay: Duration) -> Self {
        self.settle = Settle::Delay(delay);
        self
    }

    /// Capture a screenshot after the step settles
    #[must_use]
    pub fn capture(mut self, label: impl Into<String>) -> Self {
        self.capture = Some(label.into());
        self
    }
}

/// What happened in one completed step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Zero-based step index
    pub index: usize,
    /// Action description
    pub action: String,
    /// Settle wait, when the step had a condition
    pub wait: Option<WaitResult>,
}

/// Outcome of a fully settled sequence
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SequenceReport {
    /// One record per step, in order
    pub steps: Vec<StepRecord>,
}

impl SequenceReport {
    /// Number of steps executed
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps ran
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Sends input to one session
#[derive(Debug, Clone, Copy)]
pub struct Interactor<'s> {
    session: &'s Session,
}

impl<'s> Interactor<'s> {
    /// Create an interactor over a session
    #[must_use]
    pub const fn new(session: &'s Session) -> Self {
        Self { session }
    }

    /// Press and release a key
    pub async fn press_key(&self, key: &str) -> HarnessResult<()> {
        debug!(key, "press");
        self.session.dispatch(&InputEvent::key_press(key)).await
    }

    /// Click at viewport coordinates
    pub async fn click(&self, x: f64, y: f64) -> HarnessResult<()> {
        debug!(x, y, "click");
        self.session.dispatch(&InputEvent::mouse_click(x, y)).await
    }

    /// Click the center of the first match
    pub async fn click_selector(&self, selector: &Selector) -> HarnessResult<()> {
        let rect = StateProbe::new(self.session).element_rect(selector).await?;
        let center = rect.center();
        debug!(%selector, x = center.x, y = center.y, "click element");
        self.session
            .dispatch(&InputEvent::mouse_click(center.x, center.y))
            .await
    }

    /// Perform one action
    pub async fn perform(&self, action: &Action) -> HarnessResult<()> {
        match action {
            Action::Press { key } => self.press_key(key).await,
            Action::Click { x, y } => self.click(*x, *y).await,
            Action::ClickSelector { selector } => self.click_selector(selector).await,
            Action::Evaluate { script } => {
                self.session.evaluate(script).await?;
                Ok(())
            }
        }
    }

    /// Perform one step and await its settle rule
    ///
    /// `index` is only used to label a [`HarnessError::StepTimeout`].
    pub async fn run_step(&self, index: usize, step: &InteractionStep) -> HarnessResult<StepRecord> {
        debug!(step = index, action = %step.action, "sequence step");
        self.perform(&step.action).await?;

        let wait = match &step.settle {
            Settle::None => None,
            Settle::Delay(delay) => {
                wait::settle_delay(*delay).await;
                None
            }
            Settle::Condition { condition, options } => {
                let probe = StateProbe::new(self.session);
                let result = wait::wait_until(&probe, condition, options).await?;
                if !result.satisfied {
                    return Err(HarnessError::StepTimeout {
                        step_index: index,
                        waited_for: result.waited_for,
                        last_observed: result.last_observed,
                        completed: Vec::new(),
                    });
                }
                Some(result)
            }
        };

        Ok(StepRecord {
            index,
            action: step.action.to_string(),
            wait,
        })
    }

    /// Run steps strictly in order, settling after each
    pub async fn run_sequence(&self, steps: &[InteractionStep]) -> HarnessResult<SequenceReport> {
        let mut report = SequenceReport::default();
        for (index, step) in steps.iter().enumerate() {
            let record = self
                .run_step(index, step)
                .await
                .map_err(|e| with_completed(e, &report.steps))?;
            report.steps.push(record);
        }
        Ok(report)
    }
}

/// Attach already settled step records to a step timeout
pub(crate) fn with_completed(err: HarnessError, steps: &[StepRecord]) -> HarnessError {
    match err {
        HarnessError::StepTimeout {
            step_index,
            waited_for,
            last_observed,
            ..
        } => HarnessError::StepTimeout {
            step_index,
            waited_for,
            last_observed,
            completed: steps.to_vec(),
        },
        other => other,
    }
}
