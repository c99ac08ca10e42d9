//! One isolated browser session: process + context + page + CDP handler.
//!
//! A session is exclusively owned by a single bot run. Teardown releases
//! sub-resources in nesting order (page, context, browser, handler task)
//! and never fails the run.

use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::{BotConfig, WaitUntil};
use crate::models::PageAnalysis;

/// DOM metrics collected in a single evaluation round-trip.
const PAGE_ANALYSIS_JS: &str = r#"
(() => {
    return {
        title: document.title,
        url: window.location.href,
        linkCount: document.querySelectorAll('a').length,
        formCount: document.querySelectorAll('form').length,
        buttonCount: document.querySelectorAll('button').length,
        inputCount: document.querySelectorAll('input').length,
        imageCount: document.querySelectorAll('img').length,
        hasServiceWorker: 'serviceWorker' in navigator,
        viewport: {
            width: window.innerWidth,
            height: window.innerHeight
        },
        scrollHeight: document.body.scrollHeight,
        links: Array.from(document.querySelectorAll('a'))
            .map(a => ({
                text: a.textContent.trim(),
                href: a.href,
                target: a.target
            }))
            .filter(link => link.href && link.text),
        forms: Array.from(document.querySelectorAll('form'))
            .map(form => ({
                action: form.action,
                method: form.method,
                inputs: Array.from(form.querySelectorAll('input'))
                    .map(input => ({
                        type: input.type,
                        name: input.name,
                        required: input.required
                    }))
            }))
    };
})()
"#;

/// Time elapsed between navigation start and the end of the response,
/// from the Navigation Timing API. Null when no entry is available.
const RESPONSE_TIMING_JS: &str = r#"
(() => {
    const [nav] = performance.getEntriesByType('navigation');
    return nav ? nav.responseEnd : null;
})()
"#;

/// Extra settle time applied for the `networkidle` wait policy; CDP has no
/// direct networkidle wait in chromiumoxide's high-level API.
const NETWORK_IDLE_SETTLE: Duration = Duration::from_millis(500);

pub struct BrowserSession {
    browser: Option<Browser>,
    context_id: Option<BrowserContextId>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    navigation_timeout: Duration,
    op_timeout: Duration,
    wait_until: WaitUntil,
}

impl BrowserSession {
    /// Launch a fresh browser process with one isolated context and page.
    /// Anything already acquired is torn down again on failure; a partial
    /// session is never handed out.
    pub async fn launch(config: &BotConfig) -> Result<Self> {
        let mut session = Self {
            browser: None,
            context_id: None,
            page: None,
            handler: None,
            navigation_timeout: Duration::from_millis(config.page.navigation_timeout_ms),
            op_timeout: Duration::from_millis(config.page.default_timeout_ms),
            wait_until: config.page.wait_until,
        };

        if let Err(error) = session.acquire(config).await {
            session.close().await;
            return Err(error);
        }

        Ok(session)
    }

    async fn acquire(&mut self, config: &BotConfig) -> Result<()> {
        let chrome_path = find_chrome_executable()?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .viewport(Some(Viewport {
                width: config.context.viewport.width,
                height: config.context.viewport.height,
                ..Default::default()
            }))
            .window_size(config.context.viewport.width, config.context.viewport.height)
            .launch_timeout(Duration::from_millis(config.browser.timeout_ms));

        for arg in &config.browser.args {
            builder = builder.arg(arg);
        }
        if !config.browser.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .context("Failed to launch browser")?;

        // Drain CDP events for the lifetime of the session.
        self.handler = Some(tokio::spawn(async move {
            while handler.next().await.is_some() {}
        }));
        self.browser = Some(browser);
        let Some(browser) = self.browser.as_ref() else {
            anyhow::bail!("Browser not initialized");
        };

        let context_id = browser
            .create_browser_context(CreateBrowserContextParams::default())
            .await
            .context("Failed to create browser context")?;
        self.context_id = Some(context_id.clone());

        let page = browser
            .new_page(
                CreateTargetParams::builder()
                    .url("about:blank")
                    .browser_context_id(context_id)
                    .build()
                    .map_err(|e| anyhow!("Failed to build target params: {:?}", e))?,
            )
            .await
            .context("Failed to create page")?;

        page.execute(SetUserAgentOverrideParams::new(
            config.context.user_agent.clone(),
        ))
        .await
        .context("Failed to set user agent")?;

        self.page = Some(page);
        Ok(())
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| anyhow!("Page not initialized"))
    }

    async fn with_timeout<T>(
        &self,
        what: &str,
        timeout: Duration,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| anyhow!("{} timed out after {}ms", what, timeout.as_millis()))?
    }

    /// Navigate to a URL under the configured wait-until policy and
    /// navigation timeout.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page()?;
        let wait_until = self.wait_until;

        self.with_timeout("Navigation", self.navigation_timeout, async move {
            page.goto(url).await.context("Navigation failed")?;
            // Covers the load lifecycle for both `load` and
            // `domcontentloaded`; failures here mean the load event never
            // fired in time and surface through the outer timeout instead.
            page.wait_for_navigation().await.ok();
            if wait_until == WaitUntil::NetworkIdle {
                tokio::time::sleep(NETWORK_IDLE_SETTLE).await;
            }
            Ok(())
        })
        .await
    }

    /// Current page URL, when the page reports one.
    pub async fn current_url(&self) -> Option<String> {
        let page = self.page.as_ref()?;
        page.url().await.ok().flatten()
    }

    /// Extract page metrics in a single evaluation call.
    pub async fn analyze(&self) -> Result<PageAnalysis> {
        let page = self.page()?;
        self.with_timeout("Page analysis", self.op_timeout, async move {
            page.evaluate(PAGE_ANALYSIS_JS)
                .await
                .context("Page analysis script failed")?
                .into_value::<PageAnalysis>()
                .context("Failed to parse page analysis payload")
        })
        .await
    }

    /// Response-end timing in milliseconds, when the page exposes it.
    /// Absence degrades to a missing performance metric, not an error.
    pub async fn response_timing_ms(&self) -> Option<f64> {
        let page = self.page.as_ref()?;
        let result = tokio::time::timeout(self.op_timeout, page.evaluate(RESPONSE_TIMING_JS))
            .await
            .ok()?
            .ok()?;
        result.into_value::<Option<f64>>().ok().flatten()
    }

    /// Scroll the page to its vertical midpoint.
    pub async fn scroll_to_midpoint(&self) -> Result<()> {
        let page = self.page()?;
        self.with_timeout("Scroll", self.op_timeout, async move {
            page.evaluate("window.scrollTo(0, document.body.scrollHeight / 2)")
                .await
                .context("Scroll failed")?;
            Ok(())
        })
        .await
    }

    /// Click the first element matching a CSS selector.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let page = self.page()?;
        self.with_timeout("Click", self.op_timeout, async move {
            let element = page
                .find_element(selector)
                .await
                .context("Element not found")?;
            element.click().await.context("Click failed")?;
            Ok(())
        })
        .await
    }

    /// Focus an element and type text into it.
    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let page = self.page()?;
        self.with_timeout("Type", self.op_timeout, async move {
            let element = page
                .find_element(selector)
                .await
                .context("Element not found")?;
            element.click().await.context("Focus failed")?;
            element.type_str(text).await.context("Typing failed")?;
            Ok(())
        })
        .await
    }

    /// Best-effort teardown in nesting order: page, context, browser
    /// process, handler task. A failed sub-release is logged and never
    /// blocks the next one. Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(error) = page.close().await {
                tracing::warn!("Page cleanup error: {error}");
            }
        }

        if let Some(context_id) = self.context_id.take() {
            if let Some(browser) = self.browser.as_ref() {
                if let Err(error) = browser.dispose_browser_context(context_id).await {
                    tracing::warn!("Context cleanup error: {error}");
                }
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(error) = browser.close().await {
                tracing::warn!("Browser cleanup error: {error}");
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

/// Find a Chromium executable on the system.
///
/// Checks the `WEBBOT_CHROME` override, then Playwright's browser cache,
/// then well-known install locations.
fn find_chrome_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("WEBBOT_CHROME") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!("WEBBOT_CHROME points to a missing file: {}", path.display());
    }

    if let Some(cache) = playwright_cache_dir() {
        if let Ok(entries) = std::fs::read_dir(&cache) {
            let mut chromium_dirs: Vec<_> = entries
                .filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().starts_with("chromium"))
                .collect();
            chromium_dirs.sort_by_key(|e| std::cmp::Reverse(e.file_name()));

            for dir in chromium_dirs {
                for candidate in [
                    "chrome-linux/chrome",
                    "chrome-headless-shell-linux/chrome-headless-shell",
                    "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
                    "chrome-headless-shell-mac-arm64/chrome-headless-shell",
                    "chrome-headless-shell-mac-x64/chrome-headless-shell",
                ] {
                    let binary = dir.path().join(candidate);
                    if binary.exists() {
                        tracing::info!("Using Chromium at: {}", binary.display());
                        return Ok(binary);
                    }
                }
            }
        }
    }

    let paths = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    for path in &paths {
        let p = PathBuf::from(path);
        if p.exists() {
            tracing::info!("Found Chrome at: {path}");
            return Ok(p);
        }
    }

    anyhow::bail!(
        "Chrome/Chromium not found. Install it, or point WEBBOT_CHROME at an executable."
    )
}

fn playwright_cache_dir() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library/Caches/ms-playwright"))
    } else {
        dirs::cache_dir().map(|c| c.join("ms-playwright"))
    }
}
