//! Scenarios, their execution context, and sealed results.

use crate::condition::Condition;
use crate::config::HarnessConfig;
use crate::cutscene::{CutsceneClearance, CutsceneDismisser};
use crate::interaction::{self, InteractionStep, Interactor, SequenceReport};
use crate::probe::StateProbe;
use crate::result::{HarnessError, HarnessResult};
use crate::session::Session;
use crate::wait::{self, WaitOptions, WaitResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Scenario verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Every check held
    Pass,
    /// An explicit assertion did not hold
    Fail,
    /// Infrastructure failure, timeout, panic or cancellation
    Error,
}

impl Verdict {
    /// Label for terminal output
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file written by a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Caller-chosen label
    pub label: String,
    /// Where the file was written
    pub path: PathBuf,
    /// Hex SHA-256 of the contents
    pub sha256: String,
    /// Size in bytes
    pub bytes: usize,
}

/// Expected and actual values of a failed assertion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mismatch {
    /// Observation name
    pub probe: String,
    /// Expected value
    pub expected: Value,
    /// Actual value
    pub actual: Value,
}

/// Sealed outcome of one scenario run
///
/// Only the runner can build one; every field is read through a getter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    name: String,
    verdict: Verdict,
    cause: Option<String>,
    mismatch: Option<Mismatch>,
    observations: BTreeMap<String, Value>,
    artifacts: Vec<Artifact>,
    console: Vec<String>,
    #[serde(rename = "duration_ms", serialize_with = "serialize_millis")]
    duration: Duration,
    started_at: DateTime<Utc>,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl ScenarioResult {
    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Verdict
    #[must_use]
    pub const fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// Whether the verdict is `pass`
    #[must_use]
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Error text for `fail` and `error`
    #[must_use]
    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    /// Expected/actual for a failed assertion
    #[must_use]
    pub const fn mismatch(&self) -> Option<&Mismatch> {
        self.mismatch.as_ref()
    }

    /// Named observations recorded by the scenario
    #[must_use]
    pub const fn observations(&self) -> &BTreeMap<String, Value> {
        &self.observations
    }

    /// Files written
    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Console transcript at the end of the run
    #[must_use]
    pub fn console(&self) -> &[String] {
        &self.console
    }

    /// Wall-clock duration
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Start time
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Collects observations and artifacts while a scenario runs
#[derive(Debug)]
pub(crate) struct ScenarioRecorder {
    name: String,
    observations: BTreeMap<String, Value>,
    artifacts: Vec<Artifact>,
    console: Vec<String>,
    started_at: DateTime<Utc>,
    start: tokio::time::Instant,
}

impl ScenarioRecorder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            observations: BTreeMap::new(),
            artifacts: Vec::new(),
            console: Vec::new(),
            started_at: Utc::now(),
            start: tokio::time::Instant::now(),
        }
    }

    pub(crate) fn set_console(&mut self, console: Vec<String>) {
        self.console = console;
    }

    /// Seal into a result. `Ok` is a pass; assertion mismatches fail;
    /// everything else is an error.
    pub(crate) fn seal(mut self, outcome: Result<(), HarnessError>) -> ScenarioResult {
        if let Err(HarnessError::StepTimeout { completed, .. }) = &outcome {
            if let Ok(records) = serde_json::to_value(completed) {
                self.observations.insert("steps.completed".to_string(), records);
            }
        }
        let (verdict, cause, mismatch) = match outcome {
            Ok(()) => (Verdict::Pass, None, None),
            Err(e) => {
                let cause = Some(e.to_string());
                match e {
                    HarnessError::AssertionMismatch {
                        probe,
                        expected,
                        actual,
                    } => (
                        Verdict::Fail,
                        cause,
                        Some(Mismatch {
                            probe,
                            expected,
                            actual,
                        }),
                    ),
                    _ => (Verdict::Error, cause, None),
                }
            }
        };
        ScenarioResult {
            name: self.name,
            verdict,
            cause,
            mismatch,
            observations: self.observations,
            artifacts: self.artifacts,
            console: self.console,
            duration: self.start.elapsed(),
            started_at: self.started_at,
        }
    }

    /// Seal as an error with free-form text (panics, cancellation)
    pub(crate) fn seal_error(self, cause: impl Into<String>) -> ScenarioResult {
        let cause = cause.into();
        let mut result = self.seal(Ok(()));
        result.verdict = Verdict::Error;
        result.cause = Some(cause);
        result
    }
}

/// Everything a scenario body can touch
#[derive(Debug)]
pub struct ScenarioContext<'s> {
    session: &'s Session,
    config: &'s HarnessConfig,
    recorder: ScenarioRecorder,
    screenshots: u32,
}

impl<'s> ScenarioContext<'s> {
    pub(crate) fn new(session: &'s Session, config: &'s HarnessConfig, recorder: ScenarioRecorder) -> Self {
        Self {
            session,
            config,
            recorder,
            screenshots: 0,
        }
    }

    pub(crate) fn into_recorder(self) -> ScenarioRecorder {
        self.recorder
    }

    /// Scenario name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.recorder.name
    }

    /// The session
    #[must_use]
    pub const fn session(&self) -> &'s Session {
        self.session
    }

    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &'s HarnessConfig {
        self.config
    }

    /// Probe over the session
    #[must_use]
    pub const fn probe(&self) -> StateProbe<'s> {
        StateProbe::new(self.session)
    }

    /// Interactor over the session
    #[must_use]
    pub const fn interactor(&self) -> Interactor<'s> {
        Interactor::new(self.session)
    }

    /// Wait with the default options; an unsatisfied wait is returned, not raised
    pub async fn wait_for(&self, condition: &Condition) -> HarnessResult<WaitResult> {
        wait::wait_until(&self.probe(), condition, &self.config.wait).await
    }

    /// Wait with the default options and raise [`HarnessError::Timeout`] if
    /// the condition never holds
    pub async fn require(&self, condition: &Condition) -> HarnessResult<WaitResult> {
        self.require_with(condition, &self.config.wait).await
    }

    /// Like [`Self::require`] with explicit options
    pub async fn require_with(&self, condition: &Condition, options: &WaitOptions) -> HarnessResult<WaitResult> {
        wait::wait_until(&self.probe(), condition, options)
            .await?
            .into_result(options)
    }

    /// Run an interaction sequence, taking the screenshots steps ask for
    pub async fn run_steps(&mut self, steps: &[InteractionStep]) -> HarnessResult<SequenceReport> {
        let interactor = self.interactor();
        let mut report = SequenceReport::default();
        for (index, step) in steps.iter().enumerate() {
            let record = match interactor.run_step(index, step).await {
                Ok(record) => record,
                Err(err) => {
                    self.observe("steps", Value::from(report.len()));
                    return Err(interaction::with_completed(err, &report.steps));
                }
            };
            report.steps.push(record);
            if let Some(label) = &step.capture {
                self.screenshot(label).await?;
            }
        }
        self.observe("steps", Value::from(report.len()));
        Ok(report)
    }

    /// Clear the intro cutscene with the configured dismisser
    pub async fn clear_cutscene(&mut self) -> HarnessResult<CutsceneClearance> {
        let dismisser = self.config.cutscene_dismisser();
        self.dismiss(&dismisser).await
    }

    /// Clear an overlay with a specific dismisser
    pub async fn dismiss(&mut self, dismisser: &CutsceneDismisser) -> HarnessResult<CutsceneClearance> {
        let clearance = dismisser.dismiss(self.session).await?;
        self.observe("cutscene.attempts", Value::from(clearance.attempts));
        Ok(clearance)
    }

    /// Record a named observation
    pub fn observe(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.recorder.observations.insert(key.into(), value.into());
    }

    /// Record `actual` and fail the scenario unless it equals `expected`
    pub fn expect_eq(
        &mut self,
        probe: &str,
        expected: impl Into<Value>,
        actual: impl Into<Value>,
    ) -> HarnessResult<()> {
        let expected = expected.into();
        let actual = actual.into();
        self.observe(probe, actual.clone());
        if expected == actual {
            Ok(())
        } else {
            Err(HarnessError::AssertionMismatch {
                probe: probe.to_string(),
                expected,
                actual,
            })
        }
    }

    /// Record `actual` and fail the scenario unless `holds`
    pub fn ensure(
        &mut self,
        probe: &str,
        holds: bool,
        expected: impl Into<Value>,
        actual: impl Into<Value>,
    ) -> HarnessResult<()> {
        let actual = actual.into();
        self.observe(probe, actual.clone());
        if holds {
            Ok(())
        } else {
            Err(HarnessError::AssertionMismatch {
                probe: probe.to_string(),
                expected: expected.into(),
                actual,
            })
        }
    }

    /// Capture a screenshot into the output directory as
    /// `<scenario>-<NN>-<label>.png`
    pub async fn screenshot(&mut self, label: &str) -> HarnessResult<Artifact> {
        let shot = self.session.screenshot().await?;
        self.screenshots += 1;
        let dir = &self.config.output_dir;
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}-{:02}-{}.png", self.name(), self.screenshots, label));
        tokio::fs::write(&path, &shot.data).await?;

        let artifact = Artifact {
            label: label.to_string(),
            sha256: format!("{:x}", Sha256::digest(&shot.data)),
            bytes: shot.data.len(),
            path,
        };
        debug!(path = %artifact.path.display(), bytes = artifact.bytes, "screenshot");
        self.recorder.artifacts.push(artifact.clone());
        Ok(artifact)
    }
}

/// A named, self-contained verification
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Registry name, e.g. `focus-menu`
    fn name(&self) -> &str;

    /// One-line description
    fn description(&self) -> &str;

    /// Scenario body. Errors become `fail` (assertion mismatch) or `error`.
    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seal_pass() {
        let mut recorder = ScenarioRecorder::new("ui-layout");
        recorder.observations.insert("root.visible".into(), json!(true));
        let result = recorder.seal(Ok(()));
        assert!(result.passed());
        assert_eq!(result.cause(), None);
        assert_eq!(result.observations()["root.visible"], json!(true));
    }

    #[test]
    fn test_seal_assertion_is_fail_with_values() {
        let result = ScenarioRecorder::new("focus-menu").seal(Err(HarnessError::AssertionMismatch {
            probe: "focused.label".into(),
            expected: json!("ATTACK"),
            actual: json!("ITEM"),
        }));
        assert_eq!(result.verdict(), Verdict::Fail);
        let mismatch = result.mismatch().unwrap();
        assert_eq!(mismatch.expected, json!("ATTACK"));
        assert_eq!(mismatch.actual, json!("ITEM"));
        assert!(result.cause().unwrap().contains("focused.label"));
    }

    #[test]
    fn test_seal_other_errors_are_error() {
        let result = ScenarioRecorder::new("x").seal(Err(HarnessError::Timeout {
            waited_for: "visible(#ui-root)".into(),
            ms: 5000,
        }));
        assert_eq!(result.verdict(), Verdict::Error);
        assert!(result.mismatch().is_none());
        assert!(result.cause().unwrap().contains("#ui-root"));
    }

    #[test]
    fn test_seal_error_text() {
        let result = ScenarioRecorder::new("x").seal_error("panicked: boom");
        assert_eq!(result.verdict(), Verdict::Error);
        assert_eq!(result.cause(), Some("panicked: boom"));
    }

    #[test]
    fn test_result_serializes_lowercase_verdict() {
        let result = ScenarioRecorder::new("x").seal(Ok(()));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["verdict"], "pass");
        assert!(json["duration_ms"].is_u64());
        assert_eq!(json["name"], "x");
    }
}
