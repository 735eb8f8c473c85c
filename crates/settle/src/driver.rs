//! PageDriver - the seam between the harness and a live page.
//!
//! Every higher layer (probe, interaction, cutscene, scenario) talks to the
//! page only through [`PageDriver`]. Two implementations exist:
//!
//! - `CdpDriver` (feature `browser`) drives Chromium over CDP
//! - [`MockDriver`] is an in-memory scripted page for unit tests
//!
//! A [`Launcher`] creates one driver per session.

use crate::event::{InputEvent, KeyDefinition};
use crate::locator::{DomQuery, ElementRect, Selector};
use crate::result::{HarnessError, HarnessResult};
use crate::session::SessionOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Console message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    /// console.log / console.info
    Log,
    /// console.debug
    Debug,
    /// console.warn
    Warning,
    /// console.error and uncaught exceptions
    Error,
}

impl fmt::Display for ConsoleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Log => "log",
            Self::Debug => "debug",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One captured console message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    /// Severity
    pub level: ConsoleLevel,
    /// Message text (arguments joined by spaces)
    pub text: String,
}

impl ConsoleMessage {
    /// Create a console message
    #[must_use]
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    /// Create a `log` level message
    #[must_use]
    pub fn log(text: impl Into<String>) -> Self {
        Self::new(ConsoleLevel::Log, text)
    }
}

/// Screenshot data
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
}

impl Screenshot {
    /// Wrap raw PNG bytes
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check the PNG signature
    #[must_use]
    pub fn is_png(&self) -> bool {
        self.data.starts_with(&PNG_SIGNATURE)
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Abstract page driver
///
/// Implementations must be usable from any task: the runner may hold several
/// sessions on a multi-threaded runtime.
#[async_trait]
pub trait PageDriver: Send + Sync + fmt::Debug {
    /// Navigate to URL and wait for the load event
    async fn navigate(&mut self, url: &str, timeout: Duration) -> HarnessResult<()>;

    /// Evaluate an expression in the page and return its JSON value
    async fn evaluate(&self, script: &str) -> HarnessResult<Value>;

    /// Run a read-only DOM query
    async fn query(&self, query: &DomQuery) -> HarnessResult<Value> {
        self.evaluate(&query.to_script()).await
    }

    /// Deliver a trusted input event
    async fn dispatch(&self, event: &InputEvent) -> HarnessResult<()>;

    /// Capture the viewport as PNG
    async fn screenshot(&self) -> HarnessResult<Screenshot>;

    /// Every console message captured since the page opened
    async fn console_messages(&self) -> HarnessResult<Vec<ConsoleMessage>>;

    /// Close the page and its browser
    async fn close(&mut self) -> HarnessResult<()>;
}

/// Creates one driver per session
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start a browser with a blank page
    async fn launch(&self, options: &SessionOptions) -> HarnessResult<Box<dyn PageDriver>>;
}

// =============================================================================
// MockDriver
// =============================================================================

/// Element of the scripted page
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Tag name, lowercase
    pub tag: String,
    /// `id` attribute
    pub id: Option<String>,
    /// Class list
    pub classes: BTreeSet<String>,
    /// Text content
    pub text: String,
    /// Displayed (not `display: none` / `visibility: hidden`)
    pub visible: bool,
    /// Bounding client rect
    pub rect: ElementRect,
    /// Computed style overrides
    pub styles: BTreeMap<String, String>,
}

impl MockElement {
    /// Create a visible element with a 100x20 box
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: BTreeSet::new(),
            text: String::new(),
            visible: true,
            rect: ElementRect::new(0.0, 0.0, 100.0, 20.0),
            styles: BTreeMap::new(),
        }
    }

    /// Set the id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set visibility
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Set the bounding rect
    #[must_use]
    pub const fn with_rect(mut self, rect: ElementRect) -> Self {
        self.rect = rect;
        self
    }

    /// Set a computed style value
    #[must_use]
    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    fn is_displayed(&self) -> bool {
        self.visible && self.rect.has_area()
    }

    fn computed_style(&self, property: &str) -> String {
        if let Some(value) = self.styles.get(property) {
            return value.clone();
        }
        match property {
            "display" => if self.visible { "block" } else { "none" }.to_string(),
            "visibility" => "visible".to_string(),
            "height" => format!("{}px", self.rect.height),
            "width" => format!("{}px", self.rect.width),
            "top" => format!("{}px", self.rect.top),
            "left" => format!("{}px", self.rect.left),
            "position" => "static".to_string(),
            _ => String::new(),
        }
    }

    /// Match against a compound CSS selector (`tag#id.class`). For descendant
    /// selectors only the last compound is compared.
    fn matches_css(&self, css: &str) -> bool {
        css.split(',').any(|alternative| {
            alternative
                .split_whitespace()
                .last()
                .is_some_and(|compound| self.matches_compound(compound))
        })
    }

    fn matches_compound(&self, compound: &str) -> bool {
        let mut tag = String::new();
        let mut parts: Vec<(char, String)> = Vec::new();
        for c in compound.chars() {
            if c == '#' || c == '.' {
                parts.push((c, String::new()));
            } else if let Some((_, current)) = parts.last_mut() {
                current.push(c);
            } else {
                tag.push(c);
            }
        }
        if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&self.tag) {
            return false;
        }
        parts.iter().all(|(kind, name)| match kind {
            '#' => self.id.as_deref() == Some(name.as_str()),
            _ => self.classes.contains(name),
        })
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Css(css) => self.matches_css(css),
            Selector::Text(text) => self.text.contains(text.as_str()),
            Selector::CssWithText { css, text } => {
                self.matches_css(css) && self.text.contains(text.as_str())
            }
        }
    }
}

/// A change applied to the scripted page
#[derive(Debug, Clone, PartialEq)]
pub enum MockMutation {
    /// Append an element
    Insert(MockElement),
    /// Remove every match
    Remove(Selector),
    /// Show or hide every match
    SetVisible(Selector, bool),
    /// Add a class to every match
    AddClass(Selector, String),
    /// Remove a class from every match
    RemoveClass(Selector, String),
    /// Move a class so that only the first match carries it
    MoveClass {
        /// Class to move
        class: String,
        /// Element that receives it
        to: Selector,
    },
    /// Replace the text of every match
    SetText(Selector, String),
    /// Set a computed style on every match
    SetStyle(Selector, String, String),
    /// Write a global at a dotted path
    SetGlobal(String, Value),
    /// Emit a console message
    Console(ConsoleMessage),
}

/// What a reaction listens for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTrigger {
    /// A key press with this key name
    Key(String),
    /// Any mouse click
    Click,
    /// An `evaluate` call with exactly this script
    Script(String),
}

#[derive(Debug, Clone)]
struct Reaction {
    trigger: MockTrigger,
    /// Fire on the n-th occurrence only (1-based); `None` fires every time
    nth: Option<u32>,
    delay: Duration,
    mutations: Vec<MockMutation>,
}

#[derive(Debug)]
struct Scheduled {
    due: Instant,
    mutation: MockMutation,
}

/// State of the scripted page
#[derive(Debug, Default)]
struct MockPage {
    url: Option<String>,
    elements: Vec<MockElement>,
    globals: Value,
    expressions: BTreeMap<String, Value>,
    failing_scripts: BTreeMap<String, String>,
    console: Vec<ConsoleMessage>,
    on_load: Vec<(Duration, MockMutation)>,
    reactions: Vec<Reaction>,
    trigger_counts: BTreeMap<String, u32>,
    scheduled: Vec<Scheduled>,
    history: Vec<String>,
    navigation_error: Option<String>,
    crashed: bool,
    close_count: u32,
}

impl MockPage {
    fn apply_due(&mut self) {
        let now = Instant::now();
        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.scheduled).into_iter().partition(|s| s.due <= now);
        self.scheduled = pending;
        for item in due {
            self.apply(item.mutation);
        }
    }

    fn schedule(&mut self, delay: Duration, mutation: MockMutation) {
        if delay.is_zero() {
            self.apply(mutation);
        } else {
            self.scheduled.push(Scheduled {
                due: Instant::now() + delay,
                mutation,
            });
        }
    }

    fn apply(&mut self, mutation: MockMutation) {
        match mutation {
            MockMutation::Insert(element) => self.elements.push(element),
            MockMutation::Remove(selector) => self.elements.retain(|e| !e.matches(&selector)),
            MockMutation::SetVisible(selector, visible) => {
                self.each_match(&selector, |e| e.visible = visible);
            }
            MockMutation::AddClass(selector, class) => {
                self.each_match(&selector, |e| {
                    e.classes.insert(class.clone());
                });
            }
            MockMutation::RemoveClass(selector, class) => {
                self.each_match(&selector, |e| {
                    e.classes.remove(&class);
                });
            }
            MockMutation::MoveClass { class, to } => {
                for element in &mut self.elements {
                    element.classes.remove(&class);
                }
                if let Some(target) = self.elements.iter_mut().find(|e| e.matches(&to)) {
                    target.classes.insert(class);
                }
            }
            MockMutation::SetText(selector, text) => {
                self.each_match(&selector, |e| e.text.clone_from(&text));
            }
            MockMutation::SetStyle(selector, property, value) => {
                self.each_match(&selector, |e| {
                    e.styles.insert(property.clone(), value.clone());
                });
            }
            MockMutation::SetGlobal(path, value) => set_path(&mut self.globals, &path, value),
            MockMutation::Console(message) => self.console.push(message),
        }
    }

    fn each_match(&mut self, selector: &Selector, mut f: impl FnMut(&mut MockElement)) {
        for element in self.elements.iter_mut().filter(|e| e.matches(selector)) {
            f(element);
        }
    }

    fn first(&self, selector: &Selector) -> Option<&MockElement> {
        self.elements.iter().find(|e| e.matches(selector))
    }

    fn fire(&mut self, trigger: &MockTrigger) {
        let key = format!("{trigger:?}");
        let count = self.trigger_counts.entry(key).or_insert(0);
        *count += 1;
        let count = *count;
        let fired: Vec<Reaction> = self
            .reactions
            .iter()
            .filter(|r| &r.trigger == trigger && r.nth.map_or(true, |n| n == count))
            .cloned()
            .collect();
        for reaction in fired {
            for mutation in reaction.mutations {
                self.schedule(reaction.delay, mutation);
            }
        }
    }

    /// Canned value, else a global read when the expression is a plain path
    fn expression(&self, expression: &str) -> Value {
        self.expressions
            .get(expression)
            .or_else(|| get_path(&self.globals, expression.trim_start_matches("window.")))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn answer(&self, query: &DomQuery) -> Value {
        match query {
            DomQuery::Visible(s) => json!(self.first(s).is_some_and(MockElement::is_displayed)),
            DomQuery::Count(s) => json!(self.elements.iter().filter(|e| e.matches(s)).count()),
            DomQuery::ComputedStyle { selector, property } => self
                .first(selector)
                .map_or(Value::Null, |e| json!(e.computed_style(property))),
            DomQuery::ClassList(s) => self
                .first(s)
                .map_or(Value::Null, |e| json!(e.classes.iter().collect::<Vec<_>>())),
            DomQuery::TextContent(s) => self.first(s).map_or(Value::Null, |e| json!(e.text)),
            DomQuery::Rect(s) => self.first(s).map_or(Value::Null, |e| json!(e.rect)),
            DomQuery::Global(path) => get_path(&self.globals, path).cloned().unwrap_or(Value::Null),
            DomQuery::Expression(expression) => self.expression(expression),
        }
    }
}

fn get_path<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .filter(|k| !k.is_empty())
        .try_fold(root, |value, key| value.get(key))
}

fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut current = root;
    for key in path.split('.').filter(|k| !k.is_empty()) {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        current = match current {
            Value::Object(map) => map.entry(key.to_string()).or_insert(Value::Null),
            _ => return,
        };
    }
    *current = value;
}

/// Mock driver for unit testing
///
/// Holds a scripted page: elements, globals, canned expression values and
/// reactions to input. Mutations may be delayed, measured on the tokio clock,
/// so tests under `start_paused` time are deterministic.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    page: Arc<Mutex<MockPage>>,
}

/// Inspection handle that stays valid after the driver is boxed
#[derive(Debug, Clone)]
pub struct MockHandle {
    page: Arc<Mutex<MockPage>>,
}

impl MockDriver {
    /// Create new mock driver with an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an inspection handle
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            page: Arc::clone(&self.page),
        }
    }

    fn page(&self) -> HarnessResult<MutexGuard<'_, MockPage>> {
        lock(&self.page)
    }

    fn edit(self, f: impl FnOnce(&mut MockPage)) -> Self {
        if let Ok(mut page) = self.page.lock() {
            f(&mut page);
        }
        self
    }

    /// Add an element present from the start
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.edit(|p| p.elements.push(element))
    }

    /// Set a global present from the start
    #[must_use]
    pub fn with_global(self, path: &str, value: Value) -> Self {
        self.edit(|p| set_path(&mut p.globals, path, value))
    }

    /// Canned value for an expression query
    #[must_use]
    pub fn with_expression(self, expression: impl Into<String>, value: Value) -> Self {
        self.edit(|p| {
            p.expressions.insert(expression.into(), value);
        })
    }

    /// Make `evaluate` of this script throw
    #[must_use]
    pub fn with_failing_script(self, script: impl Into<String>, message: impl Into<String>) -> Self {
        self.edit(|p| {
            p.failing_scripts.insert(script.into(), message.into());
        })
    }

    /// Apply a mutation this long after navigation completes
    #[must_use]
    pub fn after_load(self, delay: Duration, mutation: MockMutation) -> Self {
        self.edit(|p| p.on_load.push((delay, mutation)))
    }

    /// React every time the trigger occurs
    #[must_use]
    pub fn on(self, trigger: MockTrigger, delay: Duration, mutations: Vec<MockMutation>) -> Self {
        self.edit(|p| {
            p.reactions.push(Reaction {
                trigger,
                nth: None,
                delay,
                mutations,
            });
        })
    }

    /// React only on the n-th occurrence of the trigger (1-based)
    #[must_use]
    pub fn on_nth(
        self,
        trigger: MockTrigger,
        nth: u32,
        delay: Duration,
        mutations: Vec<MockMutation>,
    ) -> Self {
        self.edit(|p| {
            p.reactions.push(Reaction {
                trigger,
                nth: Some(nth),
                delay,
                mutations,
            });
        })
    }

    /// Make navigation fail
    #[must_use]
    pub fn with_navigation_error(self, message: impl Into<String>) -> Self {
        self.edit(|p| p.navigation_error = Some(message.into()))
    }
}

impl MockHandle {
    /// Recorded calls, e.g. `navigate:file:///game.html`, `press:Tab`
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.page).map(|p| p.history.clone()).unwrap_or_default()
    }

    /// Check if a call with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.history().iter().any(|c| c.starts_with(prefix))
    }

    /// Count recorded calls with this prefix
    #[must_use]
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.history().iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Number of times `close` ran
    #[must_use]
    pub fn close_count(&self) -> u32 {
        lock(&self.page).map(|p| p.close_count).unwrap_or_default()
    }

    /// Apply a mutation immediately
    pub fn mutate(&self, mutation: MockMutation) {
        if let Ok(mut page) = lock(&self.page) {
            page.apply(mutation);
        }
    }

    /// Make every later call fail as if the renderer crashed
    pub fn crash(&self) {
        if let Ok(mut page) = lock(&self.page) {
            page.crashed = true;
        }
    }
}

fn lock(page: &Mutex<MockPage>) -> HarnessResult<MutexGuard<'_, MockPage>> {
    page.lock()
        .map_err(|_| HarnessError::evaluation("mock page state poisoned"))
}

fn ensure_alive(page: &MockPage) -> HarnessResult<()> {
    if page.crashed {
        return Err(HarnessError::evaluation("Target crashed"));
    }
    Ok(())
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> HarnessResult<()> {
        let mut page = self.page()?;
        page.history.push(format!("navigate:{url}"));
        if let Some(message) = page.navigation_error.clone() {
            return Err(HarnessError::Navigation {
                url: url.to_string(),
                message,
            });
        }
        page.url = Some(url.to_string());
        let on_load = std::mem::take(&mut page.on_load);
        for (delay, mutation) in on_load {
            page.schedule(delay, mutation);
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> HarnessResult<Value> {
        let mut page = self.page()?;
        ensure_alive(&page)?;
        page.apply_due();
        page.history.push(format!("evaluate:{script}"));
        if let Some(message) = page.failing_scripts.get(script) {
            return Err(HarnessError::evaluation(message.clone()));
        }
        page.fire(&MockTrigger::Script(script.to_string()));
        Ok(page.expression(script))
    }

    async fn query(&self, query: &DomQuery) -> HarnessResult<Value> {
        let mut page = self.page()?;
        ensure_alive(&page)?;
        page.apply_due();
        Ok(page.answer(query))
    }

    async fn dispatch(&self, event: &InputEvent) -> HarnessResult<()> {
        let mut page = self.page()?;
        ensure_alive(&page)?;
        page.apply_due();
        match event {
            InputEvent::KeyPress { key } => {
                let def = KeyDefinition::resolve(key)?;
                page.history.push(format!("press:{}", def.key));
                page.fire(&MockTrigger::Key(key.clone()));
            }
            InputEvent::MouseClick { x, y } => {
                page.history.push(format!("click:{x},{y}"));
                page.fire(&MockTrigger::Click);
            }
        }
        Ok(())
    }

    async fn screenshot(&self) -> HarnessResult<Screenshot> {
        let mut page = self.page()?;
        ensure_alive(&page)?;
        page.history.push("screenshot".to_string());
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(page.url.as_deref().unwrap_or_default().as_bytes());
        Ok(Screenshot::new(data))
    }

    async fn console_messages(&self) -> HarnessResult<Vec<ConsoleMessage>> {
        let mut page = self.page()?;
        page.apply_due();
        Ok(page.console.clone())
    }

    async fn close(&mut self) -> HarnessResult<()> {
        let mut page = self.page()?;
        page.history.push("close".to_string());
        page.close_count += 1;
        Ok(())
    }
}

type MockFactory = dyn Fn() -> MockDriver + Send + Sync;

/// Launcher producing a fresh [`MockDriver`] per session
pub struct MockLauncher {
    factory: Box<MockFactory>,
    launches: AtomicU32,
    handles: Mutex<Vec<MockHandle>>,
    launch_error: Option<String>,
}

impl MockLauncher {
    /// Create a launcher from a page factory
    #[must_use]
    pub fn new(factory: impl Fn() -> MockDriver + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            launches: AtomicU32::new(0),
            handles: Mutex::new(Vec::new()),
            launch_error: None,
        }
    }

    /// Make every launch fail
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let mut launcher = Self::new(MockDriver::new);
        launcher.launch_error = Some(message.into());
        launcher
    }

    /// Number of launches so far
    #[must_use]
    pub fn launches(&self) -> u32 {
        self.launches.load(Ordering::SeqCst)
    }

    /// Handles of every launched page, in launch order
    #[must_use]
    pub fn handles(&self) -> Vec<MockHandle> {
        self.handles.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl fmt::Debug for MockLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockLauncher")
            .field("launches", &self.launches())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn launch(&self, _options: &SessionOptions) -> HarnessResult<Box<dyn PageDriver>> {
        if let Some(message) = &self.launch_error {
            return Err(HarnessError::BrowserLaunch {
                message: message.clone(),
            });
        }
        self.launches.fetch_add(1, Ordering::SeqCst);
        let driver = (self.factory)();
        if let Ok(mut handles) = self.handles.lock() {
            handles.push(driver.handle());
        }
        Ok(Box::new(driver))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod mock_element_tests {
        use super::*;

        #[test]
        fn test_compound_selector_matching() {
            let el = MockElement::new("div").with_id("cmd").with_class("window").with_class("slide-visible");
            assert!(el.matches(&Selector::css("#cmd")));
            assert!(el.matches(&Selector::css("div.window")));
            assert!(el.matches(&Selector::css(".window.slide-visible")));
            assert!(el.matches(&Selector::css("#ui-root #cmd")));
            assert!(el.matches(&Selector::css("span, #cmd")));
            assert!(!el.matches(&Selector::css("span#cmd")));
            assert!(!el.matches(&Selector::css(".focused")));
        }

        #[test]
        fn test_text_matching() {
            let el = MockElement::new("div").with_text("System initialized.");
            assert!(el.matches(&Selector::css_with_text("div", "initialized")));
            assert!(!el.matches(&Selector::css_with_text("span", "initialized")));
            assert!(el.matches(&Selector::text("System")));
        }

        #[test]
        fn test_default_computed_styles() {
            let el = MockElement::new("button").with_rect(ElementRect::new(0.0, 0.0, 80.0, 32.0));
            assert_eq!(el.computed_style("height"), "32px");
            assert_eq!(el.computed_style("display"), "block");
            let el = el.with_style("height", "28px");
            assert_eq!(el.computed_style("height"), "28px");
        }
    }

    mod path_tests {
        use super::*;

        #[test]
        fn test_set_and_get_nested() {
            let mut root = Value::Null;
            set_path(&mut root, "$gameSystem.ui.focusedWindow", json!("cmd"));
            assert_eq!(get_path(&root, "$gameSystem.ui.focusedWindow"), Some(&json!("cmd")));
            assert_eq!(get_path(&root, "$gameSystem.missing.deeper"), None);
        }
    }

    mod mock_driver_tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_driver_navigate() {
            let mut driver = MockDriver::new();
            let handle = driver.handle();
            driver.navigate("file:///game.html", Duration::from_secs(1)).await.unwrap();
            assert!(handle.was_called("navigate:file:///game.html"));
        }

        #[tokio::test]
        async fn test_navigation_error() {
            let mut driver = MockDriver::new().with_navigation_error("net::ERR_FILE_NOT_FOUND");
            let err = driver.navigate("file:///missing.html", Duration::from_secs(1)).await.unwrap_err();
            assert!(matches!(err, HarnessError::Navigation { .. }));
        }

        #[tokio::test]
        async fn test_key_reaction() {
            let driver = MockDriver::new()
                .with_element(MockElement::new("div").with_class("cmd-btn").with_text("ATTACK"))
                .on(
                    MockTrigger::Key("Tab".into()),
                    Duration::ZERO,
                    vec![MockMutation::AddClass(Selector::css(".cmd-btn"), "focused".into())],
                );
            let focused = DomQuery::Count(Selector::css(".focused"));
            assert_eq!(driver.query(&focused).await.unwrap(), json!(0));
            driver.dispatch(&InputEvent::key_press("Tab")).await.unwrap();
            assert_eq!(driver.query(&focused).await.unwrap(), json!(1));
        }

        #[tokio::test(start_paused = true)]
        async fn test_delayed_mutation_applies_on_tokio_clock() {
            let mut driver = MockDriver::new().after_load(
                Duration::from_millis(300),
                MockMutation::Console(ConsoleMessage::log("System initialized.")),
            );
            driver.navigate("about:blank", Duration::from_secs(1)).await.unwrap();
            assert!(driver.console_messages().await.unwrap().is_empty());
            tokio::time::sleep(Duration::from_millis(300)).await;
            assert_eq!(driver.console_messages().await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_nth_click_reaction() {
            let overlay = Selector::css("#cutscene-overlay");
            let driver = MockDriver::new()
                .with_element(MockElement::new("div").with_id("cutscene-overlay"))
                .on_nth(
                    MockTrigger::Click,
                    2,
                    Duration::ZERO,
                    vec![MockMutation::SetVisible(overlay.clone(), false)],
                );
            let visible = DomQuery::Visible(overlay);
            driver.dispatch(&InputEvent::mouse_click(1.0, 1.0)).await.unwrap();
            assert_eq!(driver.query(&visible).await.unwrap(), json!(true));
            driver.dispatch(&InputEvent::mouse_click(1.0, 1.0)).await.unwrap();
            assert_eq!(driver.query(&visible).await.unwrap(), json!(false));
        }

        #[tokio::test]
        async fn test_failing_script_and_unknown_key() {
            let driver = MockDriver::new().with_failing_script("boom()", "ReferenceError: boom is not defined");
            let err = driver.evaluate("boom()").await.unwrap_err();
            assert!(err.to_string().contains("ReferenceError"));
            let err = driver.dispatch(&InputEvent::key_press("NotAKey")).await.unwrap_err();
            assert!(matches!(err, HarnessError::Input { .. }));
        }

        #[tokio::test]
        async fn test_missing_elements_answer_null() {
            let driver = MockDriver::new();
            let rect = DomQuery::Rect(Selector::css("#log"));
            assert_eq!(driver.query(&rect).await.unwrap(), Value::Null);
            let global = DomQuery::Global("$gameParty.index".into());
            assert_eq!(driver.query(&global).await.unwrap(), Value::Null);
        }

        #[tokio::test]
        async fn test_crash_fails_queries() {
            let driver = MockDriver::new();
            driver.handle().crash();
            let err = driver.query(&DomQuery::Count(Selector::css("div"))).await.unwrap_err();
            assert!(matches!(err, HarnessError::Evaluation { .. }));
        }

        #[tokio::test]
        async fn test_screenshot_is_png() {
            let driver = MockDriver::new();
            assert!(driver.screenshot().await.unwrap().is_png());
        }
    }

    mod launcher_tests {
        use super::*;

        #[tokio::test]
        async fn test_launcher_counts_and_tracks_handles() {
            let launcher = MockLauncher::new(MockDriver::new);
            let options = SessionOptions::default();
            let _a = launcher.launch(&options).await.unwrap();
            let _b = launcher.launch(&options).await.unwrap();
            assert_eq!(launcher.launches(), 2);
            assert_eq!(launcher.handles().len(), 2);
        }

        #[tokio::test]
        async fn test_failing_launcher() {
            let launcher = MockLauncher::failing("chromium not found");
            let err = launcher.launch(&SessionOptions::default()).await.unwrap_err();
            assert!(matches!(err, HarnessError::BrowserLaunch { .. }));
            assert_eq!(launcher.launches(), 0);
        }
    }
}
