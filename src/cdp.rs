//! Chrome DevTools Protocol rendering backend

use crate::backend::{PageSession, RenderingBackend};
use crate::dom::RenderedDom;
use crate::{Error, RenderConfig, Result};
use anyhow::Context;
use headless_chrome::browser::tab::Tab;
use headless_chrome::{Browser, LaunchOptions};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

const CAPTURE_SCRIPT: &str = include_str!("capture.js");

/// Launches a headless Chrome per session (uses the `headless_chrome` crate)
///
/// Each [`CdpSession`] owns its browser process; closing the session (or
/// dropping it) terminates the process.
pub struct CdpBackend {
    config: RenderConfig,
}

impl CdpBackend {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    fn launch(&self) -> Result<Browser> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((self.config.viewport.width, self.config.viewport.height)))
            .path(self.config.chrome_path.clone())
            .idle_browser_timeout(Duration::from_millis(
                self.config.navigation_timeout_ms + self.config.selector_timeout_ms,
            ))
            .build()
            .map_err(|e| Error::CdpError(format!("Failed to build launch options: {}", e)))?;

        Ok(Browser::new(launch_options).context("Failed to launch browser")?)
    }
}

/// One open tab with the target page loaded
pub struct CdpSession {
    browser: Browser,
    tab: Arc<Tab>,
    max_nodes: usize,
}

impl RenderingBackend for CdpBackend {
    fn name(&self) -> &'static str {
        "cdp"
    }

    fn open(&self, url: &str) -> Result<Box<dyn PageSession>> {
        // Any early return below drops `browser`, which kills the process.
        let browser = self.launch()?;

        let tab = browser.new_tab().context("Failed to create tab")?;

        tab.set_user_agent(&self.config.user_agent, None, None)
            .context("Failed to set user agent")?;

        tab.set_default_timeout(Duration::from_millis(self.config.navigation_timeout_ms));

        tab.navigate_to(url)
            .map_err(|e| Error::LoadError(format!("Navigation failed: {}", e)))?;

        tab.wait_until_navigated()
            .map_err(|e| Error::LoadError(format!("Wait for navigation failed: {}", e)))?;

        tab.wait_for_element_with_custom_timeout(
            &self.config.ready_selector,
            Duration::from_millis(self.config.selector_timeout_ms),
        )
        .map_err(|e| {
            Error::RenderError(format!(
                "Selector '{}' not ready: {}",
                self.config.ready_selector, e
            ))
        })?;

        // Let late layout (fonts, lazy sections) settle
        if self.config.settle_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.config.settle_ms));
        }

        debug!("CDP session ready for {}", url);
        Ok(Box::new(CdpSession {
            browser,
            tab,
            max_nodes: self.config.max_nodes,
        }))
    }
}

impl PageSession for CdpSession {
    fn capture(&mut self) -> Result<RenderedDom> {
        let script = CAPTURE_SCRIPT.replace("__WIREFRAME_MAX_NODES__", &self.max_nodes.to_string());
        let eval = self
            .tab
            .evaluate(&script, false)
            .context("Capture script evaluation failed")?;

        let payload = match eval.value {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => {
                return Err(Error::ExtractionError(format!(
                    "Capture returned a non-string value: {}",
                    other
                )))
            }
            None => return Err(Error::ExtractionError("No value returned from capture".into())),
        };

        let dom = RenderedDom::from_json(&payload)?;
        debug!("Captured {} nodes from {}", dom.len(), dom.url);
        Ok(dom)
    }

    fn close(self: Box<Self>) -> Result<()> {
        // Dropping the browser terminates the child process.
        let CdpSession { browser, tab, .. } = *self;
        drop(tab);
        drop(browser);
        Ok(())
    }
}
