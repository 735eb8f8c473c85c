//! Scenario run orchestration and the JSON run report

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use settle::{HarnessConfig, Launcher, ScenarioRegistry, ScenarioResult, ScenarioRunner, Verdict};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// File name of the report inside the output directory
pub const REPORT_FILE: &str = "report.json";

/// Aggregate outcome of one `settle run`
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Unique id of this run
    pub run_id: Uuid,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Page under test, as configured
    pub target: Option<String>,
    /// Wall-clock duration
    pub duration_ms: u64,
    /// Scenarios with a `pass` verdict
    pub passed: usize,
    /// Scenarios with a `fail` verdict
    pub failed: usize,
    /// Scenarios with an `error` verdict
    pub errored: usize,
    /// Per-scenario results, in request order
    pub scenarios: Vec<ScenarioResult>,
}

impl RunReport {
    /// Build a report from results
    #[must_use]
    pub fn new(
        target: Option<String>,
        started_at: DateTime<Utc>,
        duration: Duration,
        scenarios: Vec<ScenarioResult>,
    ) -> Self {
        let count = |verdict: Verdict| scenarios.iter().filter(|r| r.verdict() == verdict).count();
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            target,
            duration_ms: duration.as_millis() as u64,
            passed: count(Verdict::Pass),
            failed: count(Verdict::Fail),
            errored: count(Verdict::Error),
            scenarios,
        }
    }

    /// Number of scenarios run
    #[must_use]
    pub fn total(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether every verdict is `pass`
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }

    /// `Ok` when every scenario passed
    pub fn into_outcome(self) -> CliResult<Self> {
        if self.all_passed() {
            Ok(self)
        } else {
            Err(CliError::ScenariosFailed {
                failed: self.failed + self.errored,
                total: self.total(),
            })
        }
    }

    /// Pretty JSON
    pub fn to_json(&self) -> CliResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `report.json` into `dir`, creating it if needed
    pub fn write(&self, dir: &Path) -> CliResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(REPORT_FILE);
        std::fs::write(&path, self.to_json()?)?;
        Ok(path)
    }
}

/// Runs selected scenarios and prints their verdicts
#[derive(Debug)]
pub struct RunSession {
    config: CliConfig,
    reporter: ProgressReporter,
}

impl RunSession {
    /// Create a run session
    #[must_use]
    pub fn new(config: CliConfig) -> Self {
        let reporter =
            ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
        Self { config, reporter }
    }

    /// Run `names` (all when empty) and write the report
    ///
    /// Unknown names fail before any browser starts. The report is written
    /// whether or not the scenarios pass.
    pub async fn execute<L: Launcher>(
        &mut self,
        launcher: L,
        harness: HarnessConfig,
        registry: &ScenarioRegistry,
        names: &[String],
        cancel: CancellationToken,
    ) -> CliResult<RunReport> {
        let scenarios = registry.select(names)?;
        let output_dir = harness.output_dir.clone();
        let target = harness.target.clone();

        self.reporter.header("Scenarios");
        if let Some(target) = &target {
            self.reporter.info(&format!("target {target}"));
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let runner = ScenarioRunner::new(launcher, harness).with_cancellation(cancel);
        self.reporter.start_progress(scenarios.len());
        let results = runner
            .run_all(&scenarios, self.config.effective_jobs(), self.config.fail_fast)
            .await;
        self.reporter.finish();

        for result in &results {
            self.reporter.scenario(result);
        }
        let report = RunReport::new(target, started_at, start.elapsed(), results);
        self.reporter.summary(
            report.passed,
            report.failed,
            report.errored,
            Duration::from_millis(report.duration_ms),
        );

        let path = report.write(&output_dir)?;
        info!(path = %path.display(), run_id = %report.run_id, "report written");
        if self.config.verbosity.is_verbose() {
            self.reporter.info(&format!("report {}", path.display()));
        }
        Ok(report)
    }
}
