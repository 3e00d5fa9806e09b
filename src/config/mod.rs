use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub api: ApiConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Remote analysis API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// e.g. `http://127.0.0.1:5000/api`. No compiled-in default.
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra headers sent with every request (tunnel warning suppression etc.)
    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(default)]
    pub summary_endpoint: SummaryEndpoint,
}

/// Which route accepts document uploads.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummaryEndpoint {
    #[default]
    ReportSummary,
    Agent,
}

impl SummaryEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            SummaryEndpoint::ReportSummary => "report_summary",
            SummaryEndpoint::Agent => "agent",
        }
    }
}

/// Page orchestrator configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DashboardConfig {
    /// Per-fetch deadline. Unset means a fetch may stay Loading indefinitely.
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
}

impl DashboardConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("stock-overflow/{}", env!("CARGO_PKG_VERSION"))
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides, then apply the
    /// CLI base URL override if one was given.
    pub fn load(base_url_override: Option<String>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("STOCK_OVERFLOW").separator("__"));

        if let Some(url) = base_url_override {
            builder = builder.set_override("api.base_url", url)?;
        }

        let app_cfg: AppConfig = builder
            .build()?
            .try_deserialize()
            .context("api.base_url must be configured (config/default.toml, STOCK_OVERFLOW__API__BASE_URL or --base-url)")?;

        app_cfg.validate()?;
        Ok(app_cfg)
    }

    fn validate(&self) -> Result<()> {
        let base = self.api.base_url.trim();
        if base.is_empty() {
            bail!("api.base_url is empty");
        }
        url::Url::parse(base).with_context(|| format!("api.base_url {:?} is not a valid URL", base))?;
        Ok(())
    }
}

#[cfg(test)]
impl ApiConfig {
    /// Config with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            headers: HashMap::new(),
            summary_endpoint: SummaryEndpoint::default(),
        }
    }
}
