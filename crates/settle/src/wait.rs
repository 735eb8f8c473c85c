//! Wait engine: poll an observation until it holds or a deadline passes.
//!
//! Every wait in the harness goes through [`poll_until`]. The contract:
//!
//! - the first observation happens immediately
//! - between observations the engine sleeps one poll interval, clamped to the
//!   time left before the deadline, so the last check lands *at* the deadline
//! - a success on that last check counts
//! - a slow observation is cut off at `deadline + poll_interval`, so a wait
//!   never returns later than `timeout + poll_interval`
//!
//! A condition that never holds is not an error; it is a [`WaitResult`] with
//! `satisfied == false`. Only infrastructure failures propagate as errors.

use crate::condition::Condition;
use crate::probe::StateProbe;
use crate::result::{HarnessError, HarnessResult};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (5 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds, strictly positive
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject a zero poll interval
    pub fn validate(&self) -> HarnessResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(HarnessError::invalid_config(
                "wait.poll_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// OBSERVATION / WAIT RESULT
// =============================================================================

/// One evaluation of a condition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Whether the condition holds
    pub satisfied: bool,
    /// The value the condition was judged on
    pub value: Value,
}

impl Observation {
    /// Create an observation
    #[must_use]
    pub const fn new(satisfied: bool, value: Value) -> Self {
        Self { satisfied, value }
    }

    /// Observation whose value is the verdict itself
    #[must_use]
    pub const fn flag(satisfied: bool) -> Self {
        Self::new(satisfied, Value::Bool(satisfied))
    }
}

/// Result of a wait operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitResult {
    /// Whether the condition held before the deadline
    pub satisfied: bool,
    /// Time spent waiting
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Value seen by the last observation
    pub last_observed: Value,
    /// Description of what was waited for
    pub waited_for: String,
    /// Number of completed observations
    pub polls: u32,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl WaitResult {
    /// Convert an unsatisfied wait into a [`HarnessError::Timeout`]
    pub fn into_result(self, options: &WaitOptions) -> HarnessResult<Self> {
        if self.satisfied {
            Ok(self)
        } else {
            Err(HarnessError::Timeout {
                waited_for: self.waited_for,
                ms: options.timeout_ms,
            })
        }
    }
}

// =============================================================================
// POLLING LOOP
// =============================================================================

/// Poll `observe` until it is satisfied or the deadline passes
pub async fn poll_until<F, Fut>(
    waited_for: impl Into<String>,
    options: &WaitOptions,
    mut observe: F,
) -> HarnessResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<Observation>>,
{
    options.validate()?;
    let waited_for = waited_for.into();
    let poll = options.poll_interval();
    let start = Instant::now();
    let deadline = start + options.timeout();
    let hard_stop = deadline + poll;

    let mut polls = 0;
    let mut last_observed = Value::Null;

    loop {
        let budget = hard_stop.saturating_duration_since(Instant::now());
        let Ok(observation) = tokio::time::timeout(budget, observe()).await else {
            warn!(waited_for = %waited_for, "observation overran the wait deadline");
            return Ok(finish(false, start, last_observed, waited_for, polls));
        };
        let observation = observation?;
        polls += 1;
        last_observed = observation.value;

        if observation.satisfied {
            debug!(waited_for = %waited_for, polls, "wait satisfied");
            return Ok(finish(true, start, last_observed, waited_for, polls));
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(waited_for = %waited_for, polls, last = %last_observed, "wait timed out");
            return Ok(finish(false, start, last_observed, waited_for, polls));
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

fn finish(
    satisfied: bool,
    start: Instant,
    last_observed: Value,
    waited_for: String,
    polls: u32,
) -> WaitResult {
    WaitResult {
        satisfied,
        elapsed: start.elapsed(),
        last_observed,
        waited_for,
        polls,
    }
}

/// Wait until `condition` holds on the page behind `probe`
pub async fn wait_until(
    probe: &StateProbe<'_>,
    condition: &Condition,
    options: &WaitOptions,
) -> HarnessResult<WaitResult> {
    poll_until(condition.to_string(), options, || probe.observe(condition)).await
}

/// Sleep a fixed duration. Only for pages that expose no observable settle
/// signal; every use is logged as degraded.
pub async fn settle_delay(duration: Duration) {
    debug!(ms = duration.as_millis() as u64, "degraded settle: fixed delay");
    tokio::time::sleep(duration).await;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Observation that becomes true `after` since the wait started
    fn true_after(start: Instant, after: Duration) -> impl FnMut() -> std::future::Ready<HarnessResult<Observation>> {
        move || std::future::ready(Ok(Observation::flag(start.elapsed() >= after)))
    }

    mod wait_options_tests {
        use super::*;

        #[test]
        fn test_wait_options_default() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
            assert_eq!(opts.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        }

        #[test]
        fn test_wait_options_chained() {
            let opts = WaitOptions::new().with_timeout(2000).with_poll_interval(25);
            assert_eq!(opts.timeout(), ms(2000));
            assert_eq!(opts.poll_interval(), ms(25));
        }

        #[test]
        fn test_zero_poll_interval_is_invalid() {
            let err = WaitOptions::new().with_poll_interval(0).validate().unwrap_err();
            assert!(matches!(err, HarnessError::InvalidConfig { .. }));
        }
    }

    mod poll_until_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_immediate_success_polls_once() {
            let opts = WaitOptions::new().with_timeout(1000).with_poll_interval(50);
            let result = poll_until("ready", &opts, || async { Ok(Observation::flag(true)) })
                .await
                .unwrap();
            assert!(result.satisfied);
            assert_eq!(result.polls, 1);
            assert_eq!(result.elapsed, Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_timeout_is_not_an_error() {
            let opts = WaitOptions::new().with_timeout(200).with_poll_interval(50);
            let result = poll_until("never", &opts, || async {
                Ok(Observation::new(false, serde_json::json!("still animating")))
            })
            .await
            .unwrap();
            assert!(!result.satisfied);
            assert_eq!(result.elapsed, ms(200));
            assert_eq!(result.last_observed, serde_json::json!("still animating"));
            // 0, 50, 100, 150, 200
            assert_eq!(result.polls, 5);
        }

        #[tokio::test(start_paused = true)]
        async fn test_final_check_lands_on_deadline() {
            // 130 is not a multiple of 50: checks at 0, 50, 100, 130
            let opts = WaitOptions::new().with_timeout(130).with_poll_interval(50);
            let start = Instant::now();
            let result = poll_until("at deadline", &opts, true_after(start, ms(130)))
                .await
                .unwrap();
            assert!(result.satisfied);
            assert_eq!(result.polls, 4);
            assert_eq!(result.elapsed, ms(130));
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_timeout_checks_once() {
            let opts = WaitOptions::new().with_timeout(0).with_poll_interval(50);
            let result = poll_until("instant", &opts, || async { Ok(Observation::flag(false)) })
                .await
                .unwrap();
            assert!(!result.satisfied);
            assert_eq!(result.polls, 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_slow_observation_is_cut_off() {
            let opts = WaitOptions::new().with_timeout(100).with_poll_interval(50);
            let result = poll_until("slow", &opts, || async {
                tokio::time::sleep(ms(10_000)).await;
                Ok(Observation::flag(true))
            })
            .await
            .unwrap();
            assert!(!result.satisfied);
            assert_eq!(result.elapsed, ms(150));
            assert_eq!(result.polls, 0);
        }

        #[tokio::test(start_paused = true)]
        async fn test_infrastructure_error_propagates() {
            let calls = Arc::new(AtomicU32::new(0));
            let opts = WaitOptions::new().with_timeout(500).with_poll_interval(50);
            let counter = Arc::clone(&calls);
            let err = poll_until("crash", &opts, move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Ok(Observation::flag(false))
                    } else {
                        Err(HarnessError::evaluation("Target crashed"))
                    }
                }
            })
            .await
            .unwrap_err();
            assert!(matches!(err, HarnessError::Evaluation { .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_poll_rejected_before_observing() {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&calls);
            let opts = WaitOptions::new().with_poll_interval(0);
            let err = poll_until("x", &opts, move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(Observation::flag(true)) }
            })
            .await
            .unwrap_err();
            assert!(matches!(err, HarnessError::InvalidConfig { .. }));
            assert_eq!(calls.load(Ordering::SeqCst), 0);
        }
    }

    mod wait_result_tests {
        use super::*;

        #[test]
        fn test_into_result() {
            let opts = WaitOptions::new().with_timeout(300);
            let unsatisfied = WaitResult {
                satisfied: false,
                elapsed: ms(300),
                last_observed: Value::Null,
                waited_for: "visible(.focused)".into(),
                polls: 7,
            };
            let err = unsatisfied.into_result(&opts).unwrap_err();
            assert!(matches!(err, HarnessError::Timeout { ms: 300, .. }));
        }

        #[test]
        fn test_serializes_elapsed_as_millis() {
            let result = WaitResult {
                satisfied: true,
                elapsed: ms(120),
                last_observed: Value::Bool(true),
                waited_for: "x".into(),
                polls: 3,
            };
            let json = serde_json::to_value(&result).unwrap();
            assert_eq!(json["elapsed"], 120);
        }
    }

    mod bound_properties {
        use super::*;

        fn paused_runtime() -> tokio::runtime::Runtime {
            tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap()
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn prop_satisfied_iff_true_within_timeout(
                timeout in 0u64..2_000,
                poll in 1u64..300,
                becomes_true in 0u64..3_000,
            ) {
                let rt = paused_runtime();
                let result = rt.block_on(async {
                    let opts = WaitOptions::new().with_timeout(timeout).with_poll_interval(poll);
                    let start = Instant::now();
                    poll_until("prop", &opts, true_after(start, ms(becomes_true))).await
                }).unwrap();

                prop_assert_eq!(result.satisfied, becomes_true <= timeout);
                prop_assert!(result.elapsed <= ms(timeout + poll));
                if !result.satisfied {
                    prop_assert_eq!(result.elapsed, ms(timeout));
                }
            }
        }
    }
}
