//! Scenario registry, looked up by name.

use crate::builtin::{
    ActorCycle, CutsceneThenMeasure, FocusMenu, IntroCutscene, InventoryNavigation, LogPosition,
    StaminaMove, SystemInit, TacticsFocus, UiLayout,
};
use crate::result::{HarnessError, HarnessResult};
use crate::scenario::Scenario;
use std::fmt;

/// Named scenarios in registration order
#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: Vec<Box<dyn Scenario>>,
}

impl fmt::Debug for ScenarioRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRegistry")
            .field("scenarios", &self.names())
            .finish()
    }
}

impl ScenarioRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in scenario
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(FocusMenu);
        registry.register(CutsceneThenMeasure);
        registry.register(InventoryNavigation);
        registry.register(ActorCycle);
        registry.register(StaminaMove);
        registry.register(LogPosition);
        registry.register(SystemInit);
        registry.register(UiLayout);
        registry.register(IntroCutscene);
        registry.register(TacticsFocus);
        registry
    }

    /// Register a scenario, replacing any with the same name
    pub fn register(&mut self, scenario: impl Scenario + 'static) {
        let scenario: Box<dyn Scenario> = Box::new(scenario);
        match self.scenarios.iter().position(|s| s.name() == scenario.name()) {
            Some(index) => self.scenarios[index] = scenario,
            None => self.scenarios.push(scenario),
        }
    }

    /// Get a scenario by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Scenario> {
        self.scenarios
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    /// Registered names, in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name()).collect()
    }

    /// Every scenario, in order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Scenario> {
        self.scenarios.iter().map(|s| s.as_ref())
    }

    /// Number of registered scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Resolve names to scenarios, keeping the requested order.
    ///
    /// An empty request selects everything. Unknown names are reported
    /// together as one [`HarnessError::InvalidConfig`].
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> HarnessResult<Vec<&dyn Scenario>> {
        if names.is_empty() {
            return Ok(self.iter().collect());
        }
        let mut selected = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();
        for name in names {
            match self.get(name.as_ref()) {
                Some(scenario) => selected.push(scenario),
                None => unknown.push(name.as_ref()),
            }
        }
        if unknown.is_empty() {
            Ok(selected)
        } else {
            Err(HarnessError::invalid_config(format!(
                "unknown scenario(s): {} (available: {})",
                unknown.join(", "),
                self.names().join(", ")
            )))
        }
    }
}
