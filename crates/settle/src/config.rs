//! Harness configuration, loadable from YAML.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. The [`GameProfile`] holds every selector, key and global path the
//! built-in scenarios touch.

use crate::browser::BrowserConfig;
use crate::cutscene::{CutsceneDismisser, DismissAction, DEFAULT_MAX_ATTEMPTS, DEFAULT_SETTLE_MS};
use crate::condition::Condition;
use crate::result::{HarnessError, HarnessResult};
use crate::session::{SessionOptions, Target, DEFAULT_NAVIGATION_TIMEOUT_MS};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cutscene dismissal defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutsceneConfig {
    /// Dismiss attempts before giving up
    pub max_attempts: u32,
    /// Delay after each dismiss action
    pub settle_ms: u64,
    /// Click X coordinate
    pub click_x: f64,
    /// Click Y coordinate
    pub click_y: f64,
    /// How long to wait for the overlay to appear (0 = don't wait)
    pub appear_timeout_ms: u64,
}

impl Default for CutsceneConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            settle_ms: DEFAULT_SETTLE_MS,
            click_x: 480.0,
            click_y: 270.0,
            appear_timeout_ms: 1_000,
        }
    }
}

/// Selectors, keys and globals of the game under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameProfile {
    /// Root UI container
    pub root: String,
    /// Game view container
    pub view_container: String,
    /// Game canvas
    pub canvas: String,
    /// Party slot elements
    pub party_slot: String,
    /// Intro overlay
    pub overlay: String,
    /// Command (tactics) window
    pub command_window: String,
    /// Command buttons
    pub command_button: String,
    /// Inventory rows
    pub inventory_row: String,
    /// Message log
    pub log: String,
    /// Class of the focused command
    pub focused_class: String,
    /// Class of a slid-in window
    pub visible_class: String,
    /// First command label once the menu is focused
    pub expected_focus_label: String,
    /// Upper bound on the menu gaining focus after the menu key
    pub focus_timeout_ms: u64,
    /// Key that focuses the menu
    pub menu_key: String,
    /// Key that moves the cursor down
    pub down_key: String,
    /// Key that confirms
    pub confirm_key: String,
    /// Key that moves the active actor right on the map
    pub move_key: String,
    /// Key that selects the next actor
    pub next_actor_key: String,
    /// Key that selects the previous actor
    pub prev_actor_key: String,
    /// Initialization message in DOM or console
    pub init_message: String,
    /// Global holding the active actor index
    pub actor_index_path: String,
    /// Global that is true while the renderer animates
    pub animating_path: String,
    /// Expression yielding the active actor's stamina
    pub stamina_expression: String,
    /// Script that focuses the command window
    pub focus_command_script: String,
    /// Global naming the focused window
    pub focused_window_path: String,
}

impl Default for GameProfile {
    fn default() -> Self {
        Self {
            root: "#ui-root".into(),
            view_container: "#game-view-container".into(),
            canvas: "#game-canvas".into(),
            party_slot: ".party-slot".into(),
            overlay: "#cutscene-overlay".into(),
            command_window: "#cmd".into(),
            command_button: ".cmd-btn".into(),
            inventory_row: ".item-row".into(),
            log: "#log".into(),
            focused_class: "focused".into(),
            visible_class: "slide-visible".into(),
            expected_focus_label: "ATTACK".into(),
            focus_timeout_ms: 2_000,
            menu_key: "Tab".into(),
            down_key: "ArrowDown".into(),
            confirm_key: "Enter".into(),
            move_key: "ArrowRight".into(),
            next_actor_key: "e".into(),
            prev_actor_key: "q".into(),
            init_message: "System initialized.".into(),
            actor_index_path: "$gameParty.index".into(),
            animating_path: "Renderer.isAnimating".into(),
            stamina_expression: "$gameParty.active().stamina".into(),
            focus_command_script: "$gameSystem.ui.focusWindow(\"cmd\")".into(),
            focused_window_path: "$gameSystem.ui.focusedWindow".into(),
        }
    }
}

/// Complete harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Page under test (path or URL)
    pub target: Option<String>,
    /// Browser settings
    pub browser: BrowserConfig,
    /// Upper bound on the initial navigation
    pub navigation_timeout_ms: u64,
    /// Default wait bounds
    pub wait: WaitOptions,
    /// Cutscene dismissal defaults
    pub cutscene: CutsceneConfig,
    /// Game selectors and globals
    pub profile: GameProfile,
    /// Artifact directory
    pub output_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target: None,
            browser: BrowserConfig::default(),
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            wait: WaitOptions::default(),
            cutscene: CutsceneConfig::default(),
            profile: GameProfile::default(),
            output_dir: PathBuf::from("target/settle"),
        }
    }
}

impl HarnessConfig {
    /// Parse from YAML
    pub fn from_yaml_str(yaml: &str) -> HarnessResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| HarnessError::invalid_config(format!("config parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> HarnessResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| HarnessError::invalid_config(e.to_string()))
    }

    /// Set the target
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the default wait options
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Check values that would make waits or dismissal meaningless
    pub fn validate(&self) -> HarnessResult<()> {
        self.wait.validate()?;
        if self.cutscene.max_attempts == 0 {
            return Err(HarnessError::invalid_config(
                "cutscene.max_attempts must be at least 1",
            ));
        }
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(HarnessError::invalid_config("viewport must be non-empty"));
        }
        Ok(())
    }

    /// Parsed target
    pub fn target(&self) -> HarnessResult<Target> {
        self.target
            .as_deref()
            .map(Target::parse)
            .ok_or_else(|| HarnessError::invalid_config("no target configured"))
    }

    /// Options for opening a session
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            browser: self.browser.clone(),
            navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
        }
    }

    /// Default dismisser: coordinate clicks while the overlay is visible
    #[must_use]
    pub fn cutscene_dismisser(&self) -> CutsceneDismisser {
        let c = &self.cutscene;
        let dismisser = CutsceneDismisser::new(
            Condition::visible(self.profile.overlay.as_str()),
            DismissAction::ClickAt {
                x: c.click_x,
                y: c.click_y,
            },
        )
        .with_max_attempts(c.max_attempts)
        .with_settle(Duration::from_millis(c.settle_ms));
        if c.appear_timeout_ms == 0 {
            dismisser
        } else {
            dismisser.with_appear_wait(
                self.wait
                    .with_timeout(c.appear_timeout_ms),
            )
        }
    }
}
