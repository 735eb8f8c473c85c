//! Browser session: one browser process and one page for one scenario.

use crate::browser::BrowserConfig;
use crate::driver::{ConsoleMessage, Launcher, PageDriver, Screenshot};
use crate::event::InputEvent;
use crate::locator::DomQuery;
use crate::result::{HarnessError, HarnessResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Default navigation timeout (10 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 10_000;

/// What the session navigates to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Local HTML document
    File(PathBuf),
    /// Already-formed URL (`http`, `https`, `file`, `about`)
    Url(String),
}

impl Target {
    /// Classify a command-line style target
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        const SCHEMES: [&str; 4] = ["http://", "https://", "file://", "about:"];
        if SCHEMES.iter().any(|s| raw.starts_with(s)) {
            Self::Url(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }

    /// Resolve to a navigable URL. File targets are made absolute and must exist.
    pub fn to_url(&self) -> HarnessResult<String> {
        match self {
            Self::Url(url) => Ok(url.clone()),
            Self::File(path) => file_url(path),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

fn file_url(path: &Path) -> HarnessResult<String> {
    let absolute = std::fs::canonicalize(path).map_err(|e| HarnessError::Navigation {
        url: path.display().to_string(),
        message: e.to_string(),
    })?;
    let encoded = absolute
        .to_string_lossy()
        .replace('%', "%25")
        .replace(' ', "%20")
        .replace('#', "%23");
    Ok(format!("file://{encoded}"))
}

/// Per-session launch options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Browser settings, including viewport
    pub browser: BrowserConfig,
    /// Upper bound on the initial navigation
    pub navigation_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            browser: BrowserConfig::default(),
            navigation_timeout: Duration::from_millis(DEFAULT_NAVIGATION_TIMEOUT_MS),
        }
    }
}

/// One browser page bound to a target
///
/// Owned by exactly one scenario run. [`Session::close`] must be awaited on
/// every exit path; dropping an open session only logs a warning.
#[derive(Debug)]
pub struct Session {
    driver: Box<dyn PageDriver>,
    target: Target,
    url: String,
    viewport: (u32, u32),
    closed: bool,
}

impl Session {
    /// Launch a browser and navigate to `target`
    ///
    /// A navigation failure closes the freshly launched browser before the
    /// error is returned.
    pub async fn open(
        launcher: &dyn Launcher,
        target: &Target,
        options: &SessionOptions,
    ) -> HarnessResult<Self> {
        let url = target.to_url()?;
        let mut driver = launcher.launch(options).await?;

        if let Err(e) = driver.navigate(&url, options.navigation_timeout).await {
            if let Err(close_err) = driver.close().await {
                warn!(error = %close_err, "failed to close browser after navigation error");
            }
            return Err(e);
        }
        debug!(url = %url, "session opened");

        Ok(Self {
            driver,
            target: target.clone(),
            url,
            viewport: (options.browser.viewport_width, options.browser.viewport_height),
            closed: false,
        })
    }

    /// Navigation target
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Resolved URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Viewport (width, height)
    #[must_use]
    pub const fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Whether the session has been closed
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn live(&self) -> HarnessResult<&dyn PageDriver> {
        if self.closed {
            return Err(HarnessError::SessionClosed);
        }
        Ok(self.driver.as_ref())
    }

    /// Evaluate an expression; in-page exceptions become [`HarnessError::Evaluation`]
    pub async fn evaluate(&self, script: &str) -> HarnessResult<Value> {
        self.live()?.evaluate(script).await
    }

    /// Run a read-only DOM query
    pub async fn query(&self, query: &DomQuery) -> HarnessResult<Value> {
        self.live()?.query(query).await
    }

    /// Deliver an input event
    pub async fn dispatch(&self, event: &InputEvent) -> HarnessResult<()> {
        self.live()?.dispatch(event).await
    }

    /// Capture the viewport as PNG bytes
    pub async fn screenshot(&self) -> HarnessResult<Screenshot> {
        self.live()?.screenshot().await
    }

    /// Captured console messages, oldest first
    pub async fn console_messages(&self) -> HarnessResult<Vec<ConsoleMessage>> {
        self.live()?.console_messages().await
    }

    /// Captured console text, oldest first
    pub async fn console_transcript(&self) -> HarnessResult<Vec<String>> {
        Ok(self
            .console_messages()
            .await?
            .into_iter()
            .map(|m| m.text)
            .collect())
    }

    /// Close the browser. Calling it again is a no-op.
    pub async fn close(&mut self) -> HarnessResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.driver.close().await?;
        debug!(url = %self.url, "session closed");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            warn!(url = %self.url, "session dropped without close");
        }
    }
}
