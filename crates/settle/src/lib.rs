//! Settle: condition-driven browser verification for a canvas tactics game.
//!
//! Settle opens the game in headless Chromium, drives it with trusted
//! keyboard and pointer input, and decides that the UI has reacted by
//! polling observable page state instead of sleeping for fixed durations.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────────┐
//! │ Scenario     │──►│ Interactor / │──►│ Session      │──►│ PageDriver │
//! │ (registry)   │   │ Cutscene     │   │ (one per run)│   │ CDP / Mock │
//! └──────┬───────┘   └──────┬───────┘   └──────────────┘   └────────────┘
//!        │                  │ settle
//!        ▼                  ▼
//! ┌──────────────┐   ┌──────────────┐
//! │ ScenarioRun- │   │ Wait engine  │◄── StateProbe ◄── Condition
//! │ ner (verdict)│   │ (poll_until) │
//! └──────────────┘   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use settle::{ChromiumLauncher, HarnessConfig, ScenarioRegistry, ScenarioRunner};
//!
//! # async fn demo() -> settle::HarnessResult<()> {
//! let config = HarnessConfig::default().with_target("index.html");
//! let registry = ScenarioRegistry::builtin();
//! let runner = ScenarioRunner::new(ChromiumLauncher, config);
//! let scenarios = registry.select(&["focus-menu"])?;
//! for result in runner.run_all(&scenarios, 1, false).await {
//!     println!("{}: {}", result.name(), result.verdict());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod browser;
mod builtin;
mod condition;
mod config;
mod cutscene;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
mod event;
mod harness;
mod interaction;
mod locator;
mod probe;
mod registry;
mod result;
mod scenario;
mod session;
mod wait;

pub use browser::{BrowserConfig, ChromiumLauncher};
pub use builtin::{
    ActorCycle, CutsceneThenMeasure, FocusMenu, IntroCutscene, InventoryNavigation, LogPosition,
    StaminaMove, SystemInit, TacticsFocus, UiLayout,
};
pub use condition::Condition;
pub use config::{CutsceneConfig, GameProfile, HarnessConfig};
pub use cutscene::{
    ClearanceState, CutsceneClearance, CutsceneDismisser, DismissAction, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_SETTLE_MS,
};
pub use driver::{
    ConsoleLevel, ConsoleMessage, Launcher, MockDriver, MockElement, MockHandle, MockLauncher,
    MockMutation, MockTrigger, PageDriver, Screenshot,
};
pub use event::{InputEvent, KeyDefinition};
pub use harness::ScenarioRunner;
pub use interaction::{Action, InteractionStep, Interactor, SequenceReport, Settle, StepRecord};
pub use locator::{DomQuery, ElementRect, Point, Selector};
pub use probe::StateProbe;
pub use registry::ScenarioRegistry;
pub use result::{HarnessError, HarnessResult};
pub use scenario::{Artifact, Mismatch, Scenario, ScenarioContext, ScenarioResult, Verdict};
pub use session::{Session, SessionOptions, Target, DEFAULT_NAVIGATION_TIMEOUT_MS};
pub use wait::{
    poll_until, settle_delay, wait_until, Observation, WaitOptions, WaitResult,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::condition::*;
    pub use super::config::*;
    pub use super::interaction::*;
    pub use super::locator::*;
    pub use super::result::*;
    pub use super::scenario::*;
    pub use super::session::*;
    pub use super::wait::*;
    pub use super::{ScenarioRegistry, ScenarioRunner, StateProbe};
}
