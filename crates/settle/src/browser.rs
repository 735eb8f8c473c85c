//! Browser control over the Chrome DevTools Protocol.
//!
//! With the `browser` feature, [`ChromiumLauncher`] starts Chromium through
//! chromiumoxide and hands back a CDP-backed [`PageDriver`]. Without the
//! feature the launcher still exists but every launch fails, so a build
//! without Chromium support reports a clear error instead of hanging.

use crate::driver::{Launcher, PageDriver};
use crate::result::HarnessResult;
use crate::session::SessionOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 960,
            viewport_height: 540,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Launches Chromium, one process per session
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    /// Create a launcher
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for ChromiumLauncher {
    async fn launch(&self, options: &SessionOptions) -> HarnessResult<Box<dyn PageDriver>> {
        #[cfg(feature = "browser")]
        {
            let driver = cdp::CdpDriver::launch(&options.browser).await?;
            Ok(Box::new(driver))
        }
        #[cfg(not(feature = "browser"))]
        {
            let _ = options;
            Err(crate::result::HarnessError::BrowserLaunch {
                message: "built without the `browser` feature".to_string(),
            })
        }
    }
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
mod cdp {
    use super::BrowserConfig;
    use crate::driver::{ConsoleLevel, ConsoleMessage, PageDriver, Screenshot};
    use crate::event::{InputEvent, KeyDefinition};
    use crate::result::{HarnessError, HarnessResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, MouseButton,
    };
    use chromiumoxide::cdp::browser_protocol::page::{
        CaptureScreenshotFormat, CaptureScreenshotParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::{
        ConsoleApiCalledType, EnableParams, EventConsoleApiCalled, EventExceptionThrown,
        RemoteObject,
    };
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde_json::Value;
    use std::fmt;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use tracing::{debug, warn};

    fn launch_error(e: impl fmt::Display) -> HarnessError {
        HarnessError::BrowserLaunch {
            message: e.to_string(),
        }
    }

    /// A Chromium page driven over CDP
    pub struct CdpDriver {
        browser: Option<CdpBrowser>,
        page: CdpPage,
        console: Arc<Mutex<Vec<ConsoleMessage>>>,
        tasks: Vec<JoinHandle<()>>,
    }

    impl fmt::Debug for CdpDriver {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("CdpDriver")
                .field("open", &self.browser.is_some())
                .finish_non_exhaustive()
        }
    }

    impl CdpDriver {
        /// Launch Chromium and open a blank page with console capture attached
        pub async fn launch(config: &BrowserConfig) -> HarnessResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Some(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    device_scale_factor: None,
                    emulating_mobile: false,
                    is_landscape: false,
                    has_touch: false,
                }));

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder.build().map_err(launch_error)?;
            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(launch_error)?;

            let mut tasks = vec![tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            })];

            let page = browser.new_page("about:blank").await.map_err(launch_error)?;
            page.execute(EnableParams::default()).await.map_err(launch_error)?;

            // Listeners are registered before the first navigation so no
            // message emitted during load is lost.
            let console = Arc::new(Mutex::new(Vec::new()));
            let mut api_calls = page
                .event_listener::<EventConsoleApiCalled>()
                .await
                .map_err(launch_error)?;
            let mut exceptions = page
                .event_listener::<EventExceptionThrown>()
                .await
                .map_err(launch_error)?;

            let sink = Arc::clone(&console);
            tasks.push(tokio::spawn(async move {
                while let Some(event) = api_calls.next().await {
                    let text = event
                        .args
                        .iter()
                        .map(remote_text)
                        .collect::<Vec<_>>()
                        .join(" ");
                    sink.lock()
                        .await
                        .push(ConsoleMessage::new(console_level(&event.r#type), text));
                }
            }));

            let sink = Arc::clone(&console);
            tasks.push(tokio::spawn(async move {
                while let Some(event) = exceptions.next().await {
                    let details = &event.exception_details;
                    let text = details
                        .exception
                        .as_ref()
                        .and_then(|e| e.description.clone())
                        .unwrap_or_else(|| details.text.clone());
                    sink.lock()
                        .await
                        .push(ConsoleMessage::new(ConsoleLevel::Error, text));
                }
            }));

            debug!(
                width = config.viewport_width,
                height = config.viewport_height,
                headless = config.headless,
                "chromium launched"
            );

            Ok(Self {
                browser: Some(browser),
                page,
                console,
                tasks,
            })
        }

        async fn key_event(
            &self,
            kind: DispatchKeyEventType,
            def: &KeyDefinition,
            with_text: bool,
        ) -> HarnessResult<()> {
            let mut builder = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key(def.key.clone())
                .code(def.code.clone())
                .windows_virtual_key_code(def.key_code)
                .native_virtual_key_code(def.key_code);
            if with_text {
                if let Some(ref text) = def.text {
                    builder = builder.text(text.clone());
                }
            }
            let params = builder.build().map_err(HarnessError::input)?;
            self.page
                .execute(params)
                .await
                .map_err(|e| HarnessError::input(e.to_string()))?;
            Ok(())
        }

        async fn mouse_event(&self, kind: DispatchMouseEventType, x: f64, y: f64) -> HarnessResult<()> {
            let mut builder = DispatchMouseEventParams::builder().r#type(kind.clone()).x(x).y(y);
            if kind != DispatchMouseEventType::MouseMoved {
                builder = builder.button(MouseButton::Left).click_count(1);
            }
            let params = builder.build().map_err(HarnessError::input)?;
            self.page
                .execute(params)
                .await
                .map_err(|e| HarnessError::input(e.to_string()))?;
            Ok(())
        }
    }

    fn console_level(kind: &ConsoleApiCalledType) -> ConsoleLevel {
        match kind {
            ConsoleApiCalledType::Error | ConsoleApiCalledType::Assert => ConsoleLevel::Error,
            ConsoleApiCalledType::Warning => ConsoleLevel::Warning,
            ConsoleApiCalledType::Debug => ConsoleLevel::Debug,
            _ => ConsoleLevel::Log,
        }
    }

    fn remote_text(object: &RemoteObject) -> String {
        match &object.value {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => object.description.clone().unwrap_or_default(),
        }
    }

    #[async_trait]
    impl PageDriver for CdpDriver {
        async fn navigate(&mut self, url: &str, timeout: Duration) -> HarnessResult<()> {
            let navigation_error = |message: String| HarnessError::Navigation {
                url: url.to_string(),
                message,
            };
            match tokio::time::timeout(timeout, self.page.goto(url)).await {
                Ok(Ok(_)) => Ok(()),
                Ok(Err(e)) => Err(navigation_error(e.to_string())),
                Err(_) => Err(navigation_error(format!(
                    "load did not complete within {}ms",
                    timeout.as_millis()
                ))),
            }
        }

        async fn evaluate(&self, script: &str) -> HarnessResult<Value> {
            let result = self
                .page
                .evaluate(script)
                .await
                .map_err(|e| HarnessError::evaluation(e.to_string()))?;
            Ok(result.value().cloned().unwrap_or(Value::Null))
        }

        async fn dispatch(&self, event: &InputEvent) -> HarnessResult<()> {
            match event {
                InputEvent::KeyPress { key } => {
                    let def = KeyDefinition::resolve(key)?;
                    let down = if def.text.is_some() {
                        DispatchKeyEventType::KeyDown
                    } else {
                        DispatchKeyEventType::RawKeyDown
                    };
                    self.key_event(down, &def, true).await?;
                    self.key_event(DispatchKeyEventType::KeyUp, &def, false).await
                }
                InputEvent::MouseClick { x, y } => {
                    self.mouse_event(DispatchMouseEventType::MouseMoved, *x, *y).await?;
                    self.mouse_event(DispatchMouseEventType::MousePressed, *x, *y).await?;
                    self.mouse_event(DispatchMouseEventType::MouseReleased, *x, *y).await
                }
            }
        }

        async fn screenshot(&self) -> HarnessResult<Screenshot> {
            let params = CaptureScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            let screenshot = self
                .page
                .execute(params)
                .await
                .map_err(|e| HarnessError::Screenshot {
                    message: e.to_string(),
                })?;

            use base64::Engine;
            let data = base64::engine::general_purpose::STANDARD
                .decode(&screenshot.data)
                .map_err(|e| HarnessError::Screenshot {
                    message: e.to_string(),
                })?;
            Ok(Screenshot::new(data))
        }

        async fn console_messages(&self) -> HarnessResult<Vec<ConsoleMessage>> {
            Ok(self.console.lock().await.clone())
        }

        async fn close(&mut self) -> HarnessResult<()> {
            for task in self.tasks.drain(..) {
                task.abort();
            }
            if let Some(mut browser) = self.browser.take() {
                if let Err(e) = browser.close().await {
                    warn!(error = %e, "graceful browser close failed, killing process");
                    if let Some(Err(e)) = browser.kill().await {
                        warn!(error = %e, "failed to kill browser process");
                    }
                }
                browser.wait().await?;
                debug!("chromium closed");
            }
            Ok(())
        }
    }
}
