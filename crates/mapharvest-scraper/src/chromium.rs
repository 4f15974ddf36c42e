//! Headless Chromium implementation of the page capability, driven over the
//! DevTools protocol.
//!
//! Every DOM operation is a small self-contained script evaluated in the page;
//! selectors are embedded as JSON string literals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::PageError;
use crate::page::{ElementSnapshot, PageCapability, PageLauncher, PageSession};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches one private browser per [`PageLauncher::open`] call.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    pub headless: bool,
    pub navigation_timeout: Duration,
}

impl Default for ChromiumLauncher {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: Duration::from_secs(60),
        }
    }
}

impl ChromiumLauncher {
    #[must_use]
    pub fn new(headless: bool, navigation_timeout: Duration) -> Self {
        Self {
            headless,
            navigation_timeout,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig, PageError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1280, 1024)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");
        if !self.headless {
            builder = builder.with_head();
        }
        builder.build().map_err(PageError::Browser)
    }
}

#[async_trait]
impl PageLauncher for ChromiumLauncher {
    async fn open(&self, url: &str) -> Result<Box<dyn PageSession>, PageError> {
        let config = self.browser_config()?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PageError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::trace!(error = %err, "browser handler event error");
                }
            }
        });

        let page = match navigate(&browser, url, self.navigation_timeout).await {
            Ok(page) => page,
            Err(err) => {
                if let Err(close_err) = browser.close().await {
                    tracing::warn!(error = %close_err, "failed to close browser after navigation error");
                }
                handler.abort();
                return Err(err);
            }
        };

        tracing::debug!(url, headless = self.headless, "opened results page");
        Ok(Box::new(ChromiumPage {
            page,
            browser: Mutex::new(Some(browser)),
            handler,
            closed: AtomicBool::new(false),
        }))
    }
}

async fn navigate(browser: &Browser, url: &str, timeout: Duration) -> Result<Page, PageError> {
    let navigation_error = |reason: String| PageError::Navigation {
        url: url.to_string(),
        reason,
    };

    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| PageError::Browser(e.to_string()))?;

    match tokio::time::timeout(timeout, page.goto(url)).await {
        Ok(Ok(_)) => Ok(page),
        Ok(Err(err)) => Err(navigation_error(err.to_string())),
        Err(_) => Err(navigation_error(format!(
            "timed out after {}s",
            timeout.as_secs()
        ))),
    }
}

/// A page in a browser it owns exclusively.
pub struct ChromiumPage {
    page: Page,
    browser: Mutex<Option<Browser>>,
    handler: JoinHandle<()>,
    closed: AtomicBool,
}

impl ChromiumPage {
    fn ensure_open(&self) -> Result<(), PageError> {
        if self.closed.load(Ordering::Acquire) || self.handler.is_finished() {
            return Err(PageError::Closed);
        }
        Ok(())
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, PageError> {
        self.ensure_open()?;
        let result = self.page.evaluate(script.as_str()).await.map_err(|err| {
            // A dead connection surfaces as an evaluation error; report it as closed.
            if self.handler.is_finished() {
                PageError::Closed
            } else {
                PageError::Script(err.to_string())
            }
        })?;
        result
            .into_value()
            .map_err(|err| PageError::Script(format!("unexpected script result: {err}")))
    }
}

fn js_string(value: &str) -> Result<String, PageError> {
    serde_json::to_string(value).map_err(|e| PageError::Script(e.to_string()))
}

#[async_trait]
impl PageCapability for ChromiumPage {
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        let started = Instant::now();
        loop {
            if self.count(selector).await? > 0 {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(PageError::Timeout {
                    selector: selector.to_string(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn query_all(
        &self,
        selector: &str,
        attributes: &[&str],
    ) -> Result<Vec<ElementSnapshot>, PageError> {
        let attributes = serde_json::to_string(attributes)
            .map_err(|e| PageError::Script(e.to_string()))?;
        let script = format!(
            r"(() => {{
                const names = {attributes};
                return Array.from(document.querySelectorAll({selector})).map((el) => {{
                    const attributes = {{}};
                    for (const name of names) {{
                        const value = el.getAttribute(name);
                        if (value !== null) attributes[name] = value;
                    }}
                    return {{ text: (el.textContent || '').trim(), attributes }};
                }});
            }})()",
            selector = js_string(selector)?,
        );
        self.eval(script).await
    }

    async fn count(&self, selector: &str) -> Result<usize, PageError> {
        let script = format!(
            "document.querySelectorAll({}).length",
            js_string(selector)?
        );
        self.eval(script).await
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError> {
        let script = format!(
            r"(() => {{
                const el = document.querySelectorAll({selector})[{index}];
                if (!el) return false;
                el.scrollIntoView({{ block: 'center' }});
                el.click();
                return true;
            }})()",
            selector = js_string(selector)?,
        );
        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            Err(PageError::ElementNotFound {
                selector: selector.to_string(),
                index,
            })
        }
    }

    async fn scroll_to_end(&self, selector: &str) -> Result<(), PageError> {
        let script = format!(
            r"(() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.scrollTop = el.scrollHeight;
                return true;
            }})()",
            selector = js_string(selector)?,
        );
        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            Err(PageError::ElementNotFound {
                selector: selector.to_string(),
                index: 0,
            })
        }
    }

    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[async_trait]
impl PageSession for ChromiumPage {
    async fn close(&self) -> Result<(), PageError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let browser = self.browser.lock().await.take();
        let result = match browser {
            Some(mut browser) => browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| PageError::Browser(e.to_string())),
            None => Ok(()),
        };
        self.handler.abort();
        result
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        // The browser process itself is killed when `Browser` drops.
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_embedded_as_escaped_literals() {
        assert_eq!(
            js_string(r#"div[role="feed"]"#).expect("serializable"),
            r#""div[role=\"feed\"]""#
        );
    }

    #[test]
    fn default_launcher_is_headless_with_sixty_second_navigation() {
        let launcher = ChromiumLauncher::default();
        assert!(launcher.headless);
        assert_eq!(launcher.navigation_timeout, Duration::from_secs(60));
    }
}
