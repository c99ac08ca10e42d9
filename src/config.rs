//! Bot configuration with bounded fields.
//!
//! Every numeric field carries a fixed [min, max] range; `validated()` fails
//! construction when any field falls outside its range. The config is
//! treated as immutable once a run starts, with one sanctioned exception:
//! the CLI reassigns `browser.headless` before launching any bot.

use anyhow::{ensure, Result};
use serde::Deserialize;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Page load condition applied after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    Load,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "networkidle")]
    NetworkIdle,
}

/// Browser viewport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
        }
    }
}

/// Browser launch configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Launch timeout in milliseconds
    pub timeout_ms: u64,
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_ms: 60_000,
            args: vec![
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-gpu".to_string(),
            ],
        }
    }
}

/// Browser context configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub user_agent: String,
    pub viewport: ViewportConfig,
    pub timeout_ms: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: ViewportConfig::default(),
            timeout_ms: 30_000,
        }
    }
}

/// Page-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Timeout for individual page operations (evaluate, click, type)
    pub default_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub wait_until: WaitUntil,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            navigation_timeout_ms: 30_000,
            wait_until: WaitUntil::NetworkIdle,
        }
    }
}

/// Concurrency limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub max_bots: usize,
    pub min_bots: usize,
    pub default_bots: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_bots: 10,
            min_bots: 1,
            default_bots: 1,
        }
    }
}

/// Per-action behavior configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub enabled: bool,
    pub wait_time_ms: u64,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            wait_time_ms: 1000,
        }
    }
}

impl ActionConfig {
    fn with_wait(wait_time_ms: u64) -> Self {
        Self {
            enabled: true,
            wait_time_ms,
        }
    }
}

/// Testing behavior configuration.
///
/// `retry_attempts` and `retry_delay_ms` are declared and validated but not
/// consulted by the run pipeline; no automatic retry loop is wired in.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    pub default_url: String,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub scroll: ActionConfig,
    pub link_click: ActionConfig,
    pub form_interaction: ActionConfig,
}

impl Default for TestingConfig {
    fn default() -> Self {
        Self {
            default_url: "https://example.com".to_string(),
            retry_attempts: 3,
            retry_delay_ms: 1000,
            scroll: ActionConfig::default(),
            link_click: ActionConfig::with_wait(2000),
            form_interaction: ActionConfig::with_wait(500),
        }
    }
}

/// Complete bot configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub browser: BrowserConfig,
    pub context: ContextConfig,
    pub page: PageConfig,
    pub concurrency: ConcurrencyConfig,
    pub testing: TestingConfig,
}

fn ensure_range(name: &str, value: u64, min: u64, max: u64) -> Result<()> {
    ensure!(
        (min..=max).contains(&value),
        "{name} must be between {min} and {max}, got {value}"
    );
    Ok(())
}

impl BotConfig {
    /// Check every bounded field and return the config on success.
    pub fn validated(self) -> Result<Self> {
        let v = &self.context.viewport;
        ensure_range("viewport width", v.width.into(), 800, 3840)?;
        ensure_range("viewport height", v.height.into(), 600, 2160)?;

        ensure_range("browser timeout", self.browser.timeout_ms, 5_000, 120_000)?;
        ensure_range("context timeout", self.context.timeout_ms, 5_000, 60_000)?;
        ensure_range(
            "page default timeout",
            self.page.default_timeout_ms,
            5_000,
            60_000,
        )?;
        ensure_range(
            "navigation timeout",
            self.page.navigation_timeout_ms,
            5_000,
            60_000,
        )?;

        let c = &self.concurrency;
        ensure_range("max bots", c.max_bots as u64, 1, 100)?;
        ensure!(c.min_bots >= 1, "min bots must be at least 1");
        ensure!(
            (c.min_bots..=c.max_bots).contains(&c.default_bots),
            "default bots must be between {} and {}",
            c.min_bots,
            c.max_bots
        );

        ensure_range("retry attempts", self.testing.retry_attempts.into(), 0, 10)?;
        ensure_range("retry delay", self.testing.retry_delay_ms, 100, 10_000)?;
        for (name, action) in [
            ("scroll wait time", &self.testing.scroll),
            ("link click wait time", &self.testing.link_click),
            ("form interaction wait time", &self.testing.form_interaction),
        ] {
            ensure_range(name, action.wait_time_ms, 0, 10_000)?;
        }

        Ok(self)
    }
}
