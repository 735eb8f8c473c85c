//! Bounded dismissal of a blocking overlay.
//!
//! The dismisser is a two-state machine. While the blocking condition holds
//! it performs one dismiss action, sleeps a fixed settle delay and checks
//! again. It stops as soon as the overlay is clear, or fails after exactly
//! `max_attempts` actions.

use crate::condition::Condition;
use crate::interaction::Interactor;
use crate::locator::Selector;
use crate::probe::StateProbe;
use crate::result::{HarnessError, HarnessResult};
use crate::session::Session;
use crate::wait::{self, WaitOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default dismiss attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Default settle delay after each dismiss action (500ms)
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// How one dismiss attempt is performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DismissAction {
    /// Click at fixed viewport coordinates
    ClickAt {
        /// X coordinate
        x: f64,
        /// Y coordinate
        y: f64,
    },
    /// Click the center of an element
    ClickSelector {
        /// Element selector
        selector: Selector,
    },
    /// Press a key
    Press {
        /// Key name
        key: String,
    },
}

impl fmt::Display for DismissAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClickAt { x, y } => write!(f, "click ({x}, {y})"),
            Self::ClickSelector { selector } => write!(f, "click {selector}"),
            Self::Press { key } => write!(f, "press {key}"),
        }
    }
}

/// Whether the overlay still blocks input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearanceState {
    /// Overlay intercepts input
    Blocking,
    /// Gameplay UI reachable
    Clear,
}

/// Outcome of a successful dismissal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CutsceneClearance {
    /// Dismiss actions performed
    pub attempts: u32,
    /// Time from start to clear
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Dismisses an overlay with a bounded number of actions
#[derive(Debug, Clone, PartialEq)]
pub struct CutsceneDismisser {
    blocking: Condition,
    action: DismissAction,
    max_attempts: u32,
    settle: Duration,
    appear: Option<WaitOptions>,
}

impl CutsceneDismisser {
    /// Dismisser for an overlay that blocks while `blocking` holds
    #[must_use]
    pub fn new(blocking: Condition, action: DismissAction) -> Self {
        Self {
            blocking,
            action,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            appear: None,
        }
    }

    /// Set max attempts
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set settle delay
    #[must_use]
    pub const fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// First wait (bounded) for the overlay to appear. If it never shows,
    /// the page is treated as clear.
    #[must_use]
    pub const fn with_appear_wait(mut self, options: WaitOptions) -> Self {
        self.appear = Some(options);
        self
    }

    /// Max attempts
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Current state of the overlay
    pub async fn state(&self, probe: &StateProbe<'_>) -> HarnessResult<ClearanceState> {
        let observation = probe.observe(&self.blocking).await?;
        Ok(if observation.satisfied {
            ClearanceState::Blocking
        } else {
            ClearanceState::Clear
        })
    }

    /// Dismiss until clear, or fail after `max_attempts` actions
    pub async fn dismiss(&self, session: &Session) -> HarnessResult<CutsceneClearance> {
        if self.max_attempts == 0 {
            return Err(HarnessError::invalid_config("cutscene max_attempts must be at least 1"));
        }
        let probe = StateProbe::new(session);
        let interactor = Interactor::new(session);
        let start = Instant::now();

        if let Some(options) = &self.appear {
            let appeared = wait::wait_until(&probe, &self.blocking, options).await?;
            debug!(appeared = appeared.satisfied, "cutscene appear wait");
        }

        let mut attempts = 0;
        loop {
            if self.state(&probe).await? == ClearanceState::Clear {
                info!(attempts, "cutscene cleared");
                return Ok(CutsceneClearance {
                    attempts,
                    elapsed: start.elapsed(),
                });
            }
            if attempts == self.max_attempts {
                return Err(HarnessError::CutsceneNotCleared { attempts });
            }
            self.act(&interactor).await?;
            attempts += 1;
            debug!(attempt = attempts, action = %self.action, "cutscene dismiss");
            tokio::time::sleep(self.settle).await;
        }
    }

    async fn act(&self, interactor: &Interactor<'_>) -> HarnessResult<()> {
        match &self.action {
            DismissAction::ClickAt { x, y } => interactor.click(*x, *y).await,
            DismissAction::ClickSelector { selector } => interactor.click_selector(selector).await,
            DismissAction::Press { key } => interactor.press_key(key).await,
        }
    }
}
