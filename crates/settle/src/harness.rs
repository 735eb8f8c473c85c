//! Scenario runner: one session per scenario, torn down on every path.

use crate::config::HarnessConfig;
use crate::driver::Launcher;
use crate::result::HarnessError;
use crate::scenario::{Scenario, ScenarioContext, ScenarioRecorder, ScenarioResult};
use crate::session::Session;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

enum BodyOutcome {
    Finished(Result<(), HarnessError>),
    Panicked(String),
    Cancelled,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs scenarios against fresh sessions
#[derive(Debug)]
pub struct ScenarioRunner<L: Launcher> {
    launcher: L,
    config: HarnessConfig,
    cancel: CancellationToken,
}

impl<L: Launcher> ScenarioRunner<L> {
    /// Create a runner
    #[must_use]
    pub fn new(launcher: L, config: HarnessConfig) -> Self {
        Self {
            launcher,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an external cancellation token
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that aborts every in-flight scenario when cancelled
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The launcher
    #[must_use]
    pub const fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Run one scenario to a sealed result
    pub async fn run(&self, scenario: &dyn Scenario) -> ScenarioResult {
        self.run_with(scenario, &self.cancel).await
    }

    async fn run_with(&self, scenario: &dyn Scenario, cancel: &CancellationToken) -> ScenarioResult {
        let span = info_span!("scenario", name = scenario.name());
        async move {
            let recorder = ScenarioRecorder::new(scenario.name());
            if cancel.is_cancelled() {
                return recorder.seal(Err(HarnessError::Cancelled));
            }

            let target = match self.config.target() {
                Ok(target) => target,
                Err(e) => return recorder.seal(Err(e)),
            };
            let mut session =
                match Session::open(&self.launcher, &target, &self.config.session_options()).await {
                    Ok(session) => session,
                    Err(e) => {
                        warn!(error = %e, "session failed to open");
                        return recorder.seal(Err(e));
                    }
                };

            let (outcome, mut recorder) = {
                let mut ctx = ScenarioContext::new(&session, &self.config, recorder);
                let body = AssertUnwindSafe(scenario.run(&mut ctx)).catch_unwind();
                let outcome = tokio::select! {
                    biased;
                    () = cancel.cancelled() => BodyOutcome::Cancelled,
                    result = body => match result {
                        Ok(result) => BodyOutcome::Finished(result),
                        Err(payload) => BodyOutcome::Panicked(panic_message(payload.as_ref())),
                    },
                };
                (outcome, ctx.into_recorder())
            };

            match session.console_transcript().await {
                Ok(console) => recorder.set_console(console),
                Err(e) => warn!(error = %e, "could not read console transcript"),
            }
            if let Err(e) = session.close().await {
                warn!(error = %e, "session close failed");
            }

            let result = match outcome {
                BodyOutcome::Finished(result) => recorder.seal(result),
                BodyOutcome::Panicked(message) => recorder.seal_error(format!("scenario panicked: {message}")),
                BodyOutcome::Cancelled => recorder.seal(Err(HarnessError::Cancelled)),
            };
            info!(
                verdict = %result.verdict(),
                duration_ms = result.duration().as_millis() as u64,
                "scenario finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    /// Run several scenarios with at most `jobs` sessions at once.
    ///
    /// Results come back in request order. With `fail_fast`, the first
    /// non-passing result cancels scenarios still running and the ones not
    /// yet started; both are reported as `error`.
    pub async fn run_all(
        &self,
        scenarios: &[&dyn Scenario],
        jobs: usize,
        fail_fast: bool,
    ) -> Vec<ScenarioResult> {
        let batch = self.cancel.child_token();
        stream::iter(scenarios.iter().copied())
            .map(|scenario| {
                let batch = &batch;
                async move {
                    let result = self.run_with(scenario, batch).await;
                    if fail_fast && !result.passed() {
                        batch.cancel();
                    }
                    result
                }
            })
            .buffered(jobs.max(1))
            .collect()
            .await
    }
}
