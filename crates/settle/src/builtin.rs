//! Built-in scenarios for the tactics game.
//!
//! Every selector, key and global path comes from the configured
//! [`crate::GameProfile`], so a renamed element is a config change rather
//! than a code change.

use crate::condition::Condition;
use crate::cutscene::{CutsceneDismisser, DismissAction};
use crate::interaction::{Action, InteractionStep};
use crate::locator::Selector;
use crate::result::HarnessResult;
use crate::scenario::{Scenario, ScenarioContext};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Parse a CSS pixel length such as `"32px"` or `"31.5px"`
fn parse_px(value: &str) -> Option<f64> {
    value
        .trim()
        .strip_suffix("px")
        .and_then(|n| n.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Compound selector for a focused command button
fn focused_command(ctx: &ScenarioContext<'_>) -> Selector {
    let profile = &ctx.config().profile;
    Selector::css(format!("{}.{}", profile.command_button, profile.focused_class))
}

/// Tab focuses the command menu on `ATTACK`
#[derive(Debug, Default, Clone, Copy)]
pub struct FocusMenu;

#[async_trait]
impl Scenario for FocusMenu {
    fn name(&self) -> &str {
        "focus-menu"
    }

    fn description(&self) -> &str {
        "menu key focuses the command window on the expected first command"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let profile = &ctx.config().profile;
        ctx.require(&Condition::visible(profile.root.as_str())).await?;
        ctx.clear_cutscene().await?;

        let focused = focused_command(ctx);
        let wait = ctx.config().wait.with_timeout(profile.focus_timeout_ms);
        ctx.run_steps(&[InteractionStep::press(&profile.menu_key)
            .settle_on(Condition::exists(focused.clone()), wait)
            .capture("menu-focus")])
            .await?;

        let label = ctx.probe().text_content(&focused).await?;
        ctx.expect_eq("focused.label", profile.expected_focus_label.as_str(), label.trim())
    }
}

/// Clear the intro, then read a command button's computed height
#[derive(Debug, Default, Clone, Copy)]
pub struct CutsceneThenMeasure;

#[async_trait]
impl Scenario for CutsceneThenMeasure {
    fn name(&self) -> &str {
        "cutscene-then-measure"
    }

    fn description(&self) -> &str {
        "after the intro clears, command buttons have a numeric pixel height"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        ctx.clear_cutscene().await?;

        let button = Selector::css(ctx.config().profile.command_button.as_str());
        ctx.require(&Condition::exists(button.clone())).await?;
        let height = ctx.probe().computed_style(&button, "height").await?;
        let pixels = parse_px(&height);
        if let Some(px) = pixels {
            ctx.observe("command_button.height_px", px);
        }
        ctx.ensure("command_button.height", pixels.is_some(), "<number>px", height)
    }
}

/// Menu, cursor down, confirm: the inventory list opens
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryNavigation;

#[async_trait]
impl Scenario for InventoryNavigation {
    fn name(&self) -> &str {
        "inventory-navigation"
    }

    fn description(&self) -> &str {
        "keyboard navigation from the command menu opens the inventory"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let profile = &ctx.config().profile;
        ctx.clear_cutscene().await?;

        let focused = focused_command(ctx);
        let rows = Selector::css(profile.inventory_row.as_str());
        let wait = ctx.config().wait;
        let cursor_moved = Condition::exists(focused.clone()).and(
            Condition::text_contains(focused.clone(), profile.expected_focus_label.as_str()).negate(),
        );
        ctx.run_steps(&[
            InteractionStep::press(&profile.menu_key)
                .settle_on(Condition::exists(focused.clone()), wait)
                .capture("menu"),
            InteractionStep::press(&profile.down_key)
                .settle_on(cursor_moved, wait)
                .capture("cursor-down"),
            InteractionStep::press(&profile.confirm_key)
                .settle_on(Condition::visible(rows.clone()), wait)
                .capture("inventory"),
        ])
        .await?;

        let count = ctx.probe().count(&rows).await?;
        ctx.ensure("inventory.rows", count > 0, ">= 1", count)
    }
}

/// Next/previous actor keys cycle the active party index
#[derive(Debug, Default, Clone, Copy)]
pub struct ActorCycle;

#[async_trait]
impl Scenario for ActorCycle {
    fn name(&self) -> &str {
        "actor-cycle"
    }

    fn description(&self) -> &str {
        "next actor changes the active index and previous actor restores it"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let profile = &ctx.config().profile;
        ctx.clear_cutscene().await?;

        let path = profile.actor_index_path.as_str();
        ctx.require(&Condition::global_defined(path)).await?;
        let initial = ctx.probe().global(path).await?.unwrap_or(Value::Null);
        ctx.observe("actor.initial", initial.clone());

        ctx.interactor().press_key(&profile.next_actor_key).await?;
        let advanced = ctx
            .wait_for(&Condition::global_equals(path, initial.clone()).negate())
            .await?;
        ctx.screenshot("next-actor").await?;
        ctx.ensure(
            "actor.next",
            advanced.satisfied,
            format!("!= {initial}"),
            advanced.last_observed,
        )?;

        ctx.interactor().press_key(&profile.prev_actor_key).await?;
        let restored = ctx
            .wait_for(&Condition::global_equals(path, initial.clone()))
            .await?;
        ctx.screenshot("previous-actor").await?;
        ctx.expect_eq("actor.returned", initial, restored.last_observed)
    }
}

/// Moving on the map never increases the active actor's stamina
#[derive(Debug, Default, Clone, Copy)]
pub struct StaminaMove;

#[async_trait]
impl Scenario for StaminaMove {
    fn name(&self) -> &str {
        "stamina-move"
    }

    fn description(&self) -> &str {
        "a map move settles its animation and does not raise stamina"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let profile = &ctx.config().profile;
        ctx.clear_cutscene().await?;

        let before = ctx.probe().expression(&profile.stamina_expression).await?;
        let before_n = before.as_f64();
        ctx.ensure("stamina.before", before_n.is_some(), "number", before.clone())?;

        ctx.interactor().press_key(&profile.move_key).await?;
        ctx.require(&Condition::global_equals(profile.animating_path.as_str(), false))
            .await?;

        let after = ctx.probe().expression(&profile.stamina_expression).await?;
        ctx.screenshot("after-move").await?;
        let holds = matches!((before_n, after.as_f64()), (Some(b), Some(a)) if a <= b);
        ctx.ensure("stamina.after", holds, format!("<= {before}"), after)
    }
}

/// Records where the message log sits
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPosition;

#[async_trait]
impl Scenario for LogPosition {
    fn name(&self) -> &str {
        "log-position"
    }

    fn description(&self) -> &str {
        "records the log's computed top, position and bounding top"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let log = Selector::css(ctx.config().profile.log.as_str());
        ctx.require(&Condition::exists(log.clone())).await?;

        let probe = ctx.probe();
        let top = probe.computed_style(&log, "top").await?;
        let position = probe.computed_style(&log, "position").await?;
        let rect = probe.element_rect(&log).await?;
        ctx.observe("log.top", top);
        ctx.observe("log.position", position);
        ctx.observe("log.rect_top", rect.top);
        ctx.screenshot("log-position").await?;
        Ok(())
    }
}

/// Boot message, canvas and party slots are present
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInit;

#[async_trait]
impl Scenario for SystemInit {
    fn name(&self) -> &str {
        "system-init"
    }

    fn description(&self) -> &str {
        "the game reports initialization and renders its canvas and party"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let profile = &ctx.config().profile;
        let message = profile.init_message.as_str();
        let initialized = Condition::console_contains(message)
            .or(Condition::exists(Selector::css_with_text("div", message)));
        let wait = ctx.require(&initialized).await?;
        ctx.observe("init.evidence", wait.last_observed);

        let probe = ctx.probe();
        let canvases = probe.count(&Selector::css(profile.canvas.as_str())).await?;
        ctx.ensure("canvas.count", canvases > 0, ">= 1", canvases)?;
        let slots = probe.count(&Selector::css(profile.party_slot.as_str())).await?;
        ctx.ensure("party_slot.count", slots > 0, ">= 1", slots)
    }
}

/// Root and game view containers are displayed
#[derive(Debug, Default, Clone, Copy)]
pub struct UiLayout;

#[async_trait]
impl Scenario for UiLayout {
    fn name(&self) -> &str {
        "ui-layout"
    }

    fn description(&self) -> &str {
        "the UI root and the game view container are visible"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let profile = &ctx.config().profile;
        ctx.require(&Condition::visible(profile.root.as_str())).await?;

        let container = Selector::css(profile.view_container.as_str());
        let visible = ctx.probe().is_visible(&container).await?;
        ctx.ensure("view_container.visible", visible, true, visible)?;
        let rect = ctx.probe().element_rect(&container).await?;
        ctx.observe("view_container.rect", serde_json::to_value(rect)?);
        ctx.screenshot("layout").await?;
        Ok(())
    }
}

/// Intro overlay appears and is dismissed by clicking it
#[derive(Debug, Default, Clone, Copy)]
pub struct IntroCutscene;

#[async_trait]
impl Scenario for IntroCutscene {
    fn name(&self) -> &str {
        "intro-cutscene"
    }

    fn description(&self) -> &str {
        "the intro overlay shows, clicks dismiss it and gameplay is reachable"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let config = ctx.config();
        let overlay = Selector::css(config.profile.overlay.as_str());
        ctx.require(&Condition::visible(overlay.clone())).await?;
        ctx.screenshot("intro").await?;

        let dismisser = CutsceneDismisser::new(
            Condition::visible(overlay.clone()),
            DismissAction::ClickSelector {
                selector: overlay.clone(),
            },
        )
        .with_max_attempts(config.cutscene.max_attempts)
        .with_settle(Duration::from_millis(config.cutscene.settle_ms));
        ctx.dismiss(&dismisser).await?;

        ctx.require(&Condition::hidden(overlay)).await?;
        ctx.screenshot("gameplay").await?;
        Ok(())
    }
}

/// Focusing the command window slides it into view
#[derive(Debug, Default, Clone, Copy)]
pub struct TacticsFocus;

#[async_trait]
impl Scenario for TacticsFocus {
    fn name(&self) -> &str {
        "tactics-focus"
    }

    fn description(&self) -> &str {
        "focusing the command window applies its slide-in class"
    }

    async fn run(&self, ctx: &mut ScenarioContext<'_>) -> HarnessResult<()> {
        let profile = &ctx.config().profile;
        ctx.clear_cutscene().await?;

        ctx.interactor()
            .perform(&Action::Evaluate {
                script: profile.focus_command_script.clone(),
            })
            .await?;
        let window = Selector::css(profile.command_window.as_str());
        let slid = ctx
            .wait_for(&Condition::has_class(window, profile.visible_class.as_str()))
            .await?;

        let focused = ctx
            .probe()
            .global(&profile.focused_window_path)
            .await?
            .unwrap_or(Value::Null);
        ctx.observe("focused_window", focused);
        ctx.screenshot("tactics").await?;
        ctx.ensure(
            "command_window.classes",
            slid.satisfied,
            profile.visible_class.as_str(),
            slid.last_observed,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::driver::{ConsoleMessage, MockDriver, MockElement, MockLauncher, MockMutation, MockTrigger};
    use crate::harness::ScenarioRunner;
    use crate::locator::ElementRect;
    use crate::scenario::Verdict;
    use serde_json::json;

    /// Game page whose intro needs two clicks, with a Tab-focusable menu
    fn game_page(first_command: &'static str) -> impl Fn() -> MockDriver + Send + Sync + 'static {
        move || {
            MockDriver::new()
                .with_element(MockElement::new("div").with_id("ui-root"))
                .with_element(MockElement::new("div").with_id("game-view-container"))
                .with_element(MockElement::new("canvas").with_id("game-canvas"))
                .with_element(MockElement::new("div").with_class("party-slot"))
                .with_element(MockElement::new("div").with_id("cmd").with_class("window"))
                .with_element(
                    MockElement::new("button")
                        .with_class("cmd-btn")
                        .with_text(format!(" {first_command} "))
                        .with_rect(ElementRect::new(10.0, 400.0, 120.0, 32.0)),
                )
                .with_element(MockElement::new("button").with_class("cmd-btn").with_text("ITEM"))
                .with_element(
                    MockElement::new("div")
                        .with_id("cutscene-overlay")
                        .with_rect(ElementRect::new(0.0, 0.0, 960.0, 540.0)),
                )
                .with_global("$gameParty.index", json!(0))
                .with_global("$gameParty.stamina", json!(10))
                .with_global("Renderer.isAnimating", json!(false))
                .after_load(Duration::ZERO, MockMutation::Console(ConsoleMessage::log("System initialized.")))
                .on_nth(
                    MockTrigger::Click,
                    2,
                    Duration::from_millis(100),
                    vec![MockMutation::SetVisible(Selector::css("#cutscene-overlay"), false)],
                )
                .on(
                    MockTrigger::Key("Tab".into()),
                    Duration::from_millis(120),
                    vec![MockMutation::MoveClass {
                        class: "focused".into(),
                        to: Selector::css(".cmd-btn"),
                    }],
                )
        }
    }

    fn runner(
        page: impl Fn() -> MockDriver + Send + Sync + 'static,
        dir: &tempfile::TempDir,
    ) -> ScenarioRunner<MockLauncher> {
        let config = HarnessConfig::default()
            .with_target("about:blank")
            .with_output_dir(dir.path());
        ScenarioRunner::new(MockLauncher::new(page), config)
    }

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("32px"), Some(32.0));
        assert_eq!(parse_px(" 31.5px "), Some(31.5));
        assert_eq!(parse_px("auto"), None);
        assert_eq!(parse_px("px"), None);
    }

    mod focus_menu_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_passes_after_clearing_intro() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(game_page("ATTACK"), &dir);
            let result = runner.run(&FocusMenu).await;
            assert!(result.passed(), "{:?}", result.cause());
            assert_eq!(result.observations()["focused.label"], json!("ATTACK"));
            assert_eq!(result.observations()["cutscene.attempts"], json!(2));
            assert_eq!(result.artifacts().len(), 1);
            assert!(result.artifacts()[0].path.ends_with("focus-menu-01-menu-focus.png"));
            assert!(result.artifacts()[0].path.exists());

            let history = runner.launcher().handles()[0].history();
            let tab = history.iter().position(|h| h == "press:Tab").unwrap();
            let last_click = history.iter().rposition(|h| h.starts_with("click:")).unwrap();
            assert!(last_click < tab);
        }

        #[tokio::test(start_paused = true)]
        async fn test_wrong_label_fails_with_values() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(game_page("WAIT"), &dir);
            let result = runner.run(&FocusMenu).await;
            assert_eq!(result.verdict(), Verdict::Fail);
            let mismatch = result.mismatch().unwrap();
            assert_eq!(mismatch.expected, json!("ATTACK"));
            assert_eq!(mismatch.actual, json!("WAIT"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_focus_slower_than_two_seconds_is_error() {
            let dir = tempfile::tempdir().unwrap();
            let page = || {
                MockDriver::new()
                    .with_element(MockElement::new("div").with_id("ui-root"))
                    .with_element(MockElement::new("button").with_class("cmd-btn").with_text("ATTACK"))
                    .on(
                        MockTrigger::Key("Tab".into()),
                        Duration::from_millis(3_500),
                        vec![MockMutation::AddClass(Selector::css(".cmd-btn"), "focused".into())],
                    )
            };
            let runner = runner(page, &dir);
            let result = runner.run(&FocusMenu).await;
            assert_eq!(result.verdict(), Verdict::Error);
            assert!(result.cause().unwrap().contains("Step 0"), "{:?}", result.cause());
            assert!(result.cause().unwrap().contains(".cmd-btn.focused"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_menu_never_focusing_is_error() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(
                || MockDriver::new().with_element(MockElement::new("div").with_id("ui-root")),
                &dir,
            );
            let result = runner.run(&FocusMenu).await;
            assert_eq!(result.verdict(), Verdict::Error);
            assert!(result.cause().unwrap().contains(".cmd-btn.focused"));
        }
    }

    mod measure_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_height_is_numeric() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(game_page("ATTACK"), &dir);
            let result = runner.run(&CutsceneThenMeasure).await;
            assert!(result.passed(), "{:?}", result.cause());
            assert_eq!(result.observations()["command_button.height"], json!("32px"));
            assert_eq!(result.observations()["command_button.height_px"], json!(32.0));
        }

        #[tokio::test(start_paused = true)]
        async fn test_stuck_intro_is_error() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(
                || {
                    MockDriver::new()
                        .with_element(MockElement::new("div").with_id("cutscene-overlay"))
                        .with_element(MockElement::new("button").with_class("cmd-btn"))
                },
                &dir,
            );
            let result = runner.run(&CutsceneThenMeasure).await;
            assert_eq!(result.verdict(), Verdict::Error);
            assert_eq!(runner.launcher().handles()[0].count_calls("click:"), 10);
        }

        #[tokio::test(start_paused = true)]
        async fn test_non_pixel_height_fails() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(
                || {
                    MockDriver::new()
                        .with_element(MockElement::new("button").with_class("cmd-btn").with_style("height", "auto"))
                },
                &dir,
            );
            let result = runner.run(&CutsceneThenMeasure).await;
            assert_eq!(result.verdict(), Verdict::Fail);
        }
    }

    mod inventory_tests {
        use super::*;

        /// Game page whose `Enter` opens the inventory
        fn inventory_page() -> MockDriver {
            game_page("ATTACK")().on(
                MockTrigger::Key("Enter".into()),
                Duration::from_millis(200),
                vec![MockMutation::Insert(MockElement::new("div").with_class("item-row").with_text("Potion"))],
            )
        }

        #[tokio::test(start_paused = true)]
        async fn test_captures_each_step() {
            let dir = tempfile::tempdir().unwrap();
            let page = || {
                inventory_page().on(
                    MockTrigger::Key("ArrowDown".into()),
                    Duration::from_millis(80),
                    vec![MockMutation::MoveClass {
                        class: "focused".into(),
                        to: Selector::css_with_text(".cmd-btn", "ITEM"),
                    }],
                )
            };
            let runner = runner(page, &dir);
            let result = runner.run(&InventoryNavigation).await;
            assert!(result.passed(), "{:?}", result.cause());
            let labels: Vec<_> = result.artifacts().iter().map(|a| a.label.as_str()).collect();
            assert_eq!(labels, ["menu", "cursor-down", "inventory"]);
            assert_eq!(result.observations()["inventory.rows"], json!(1));
        }

        #[tokio::test(start_paused = true)]
        async fn test_cursor_that_never_moves_stops_before_confirm() {
            let dir = tempfile::tempdir().unwrap();
            let runner = runner(inventory_page, &dir);
            let result = runner.run(&InventoryNavigation).await;
            assert_eq!(result.verdict(), Verdict::Error);
            assert!(result.cause().unwrap().contains("Step 1"), "{:?}", result.cause());
            assert_eq!(result.observations()["steps"], json!(1));
            let completed = result.observations()["steps.completed"].as_array().unwrap();
            assert_eq!(completed.len(), 1);
            assert_eq!(completed[0]["action"], json!("press Tab"));
            assert!(!runner.launcher().handles()[0].was_called("press:Enter"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_actor_cycle_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let page = || {
            game_page("ATTACK")()
                .on(
                    MockTrigger::Key("e".into()),
                    Duration::from_millis(50),
                    vec![MockMutation::SetGlobal("$gameParty.index".into(), json!(1))],
                )
                .on(
                    MockTrigger::Key("q".into()),
                    Duration::from_millis(50),
                    vec![MockMutation::SetGlobal("$gameParty.index".into(), json!(0))],
                )
        };
        let runner = runner(page, &dir);
        let result = runner.run(&ActorCycle).await;
        assert!(result.passed(), "{:?}", result.cause());
        assert_eq!(result.observations()["actor.next"], json!(1));
        assert_eq!(result.observations()["actor.returned"], json!(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stamina_increase_fails() {
        let dir = tempfile::tempdir().unwrap();
        let page = || {
            game_page("ATTACK")().on(
                MockTrigger::Key("ArrowRight".into()),
                Duration::ZERO,
                vec![MockMutation::SetGlobal("$gameParty.stamina".into(), json!(12))],
            )
        };
        let mut config = HarnessConfig::default()
            .with_target("about:blank")
            .with_output_dir(dir.path());
        config.profile.stamina_expression = "$gameParty.stamina".into();
        let runner = ScenarioRunner::new(MockLauncher::new(page), config);
        let result = runner.run(&StaminaMove).await;
        assert_eq!(result.verdict(), Verdict::Fail);
        assert_eq!(result.mismatch().unwrap().actual, json!(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_init_and_layout() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(game_page("ATTACK"), &dir);
        let init = runner.run(&SystemInit).await;
        assert!(init.passed(), "{:?}", init.cause());
        assert_eq!(init.observations()["party_slot.count"], json!(1));
        let layout = runner.run(&UiLayout).await;
        assert!(layout.passed(), "{:?}", layout.cause());
    }

    #[tokio::test(start_paused = true)]
    async fn test_intro_cutscene_clicks_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(game_page("ATTACK"), &dir);
        let result = runner.run(&IntroCutscene).await;
        assert!(result.passed(), "{:?}", result.cause());
        assert_eq!(result.artifacts().len(), 2);
        let handle = &runner.launcher().handles()[0];
        assert_eq!(handle.count_calls("click:480,270"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tactics_focus_slides_window() {
        let dir = tempfile::tempdir().unwrap();
        let script = HarnessConfig::default().profile.focus_command_script;
        let page = move || {
            game_page("ATTACK")().on(
                MockTrigger::Script(script.clone()),
                Duration::from_millis(300),
                vec![
                    MockMutation::AddClass(Selector::css("#cmd"), "slide-visible".into()),
                    MockMutation::SetGlobal("$gameSystem.ui.focusedWindow".into(), json!("cmd")),
                ],
            )
        };
        let runner = runner(page, &dir);
        let result = runner.run(&TacticsFocus).await;
        assert!(result.passed(), "{:?}", result.cause());
        assert_eq!(result.observations()["focused_window"], json!("cmd"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_log_position_missing_log_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(game_page("ATTACK"), &dir);
        let result = runner.run(&LogPosition).await;
        assert_eq!(result.verdict(), Verdict::Error);
        assert!(result.cause().unwrap().contains("#log"));
    }
}
