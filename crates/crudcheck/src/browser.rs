//! Headless browser session fixture over the W3C WebDriver protocol

use std::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::driver::{DriverConfig, DriverHandle};
use crate::error::{CrudError, CrudResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
        }
    }

    /// Driver binary looked up on PATH when none is configured
    pub fn default_driver(&self) -> &'static str {
        match self {
            Browser::Chrome => "chromedriver",
            Browser::Firefox => "geckodriver",
        }
    }

    /// Capabilities for a new session
    pub fn capabilities(&self, headless: bool) -> Value {
        match self {
            Browser::Chrome => {
                let mut args = vec!["--no-sandbox", "--disable-dev-shm-usage"];
                if headless {
                    args.insert(0, "--headless=new");
                }
                json!({
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args }
                })
            }
            Browser::Firefox => {
                let args: Vec<&str> = if headless { vec!["-headless"] } else { vec![] };
                json!({
                    "browserName": "firefox",
                    "moz:firefoxOptions": { "args": args }
                })
            }
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = CrudError;

    fn from_str(s: &str) -> CrudResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            other => Err(CrudError::InvalidConfig(format!("unknown browser: {}", other))),
        }
    }
}

/// A live browser session, plus the driver process when this session owns it
pub struct BrowserSession {
    http: reqwest::Client,
    endpoint: String,
    session_id: Option<String>,
    driver: Option<DriverHandle>,
}

impl BrowserSession {
    /// Attach to `config.endpoint` when set, otherwise spawn a driver
    pub async fn acquire(config: &BrowserConfig) -> CrudResult<Self> {
        match config.endpoint.as_deref() {
            Some(endpoint) => Self::attach(endpoint, config).await,
            None => Self::launch(config).await,
        }
    }

    /// Spawn a driver, open a session and maximize the window
    pub async fn launch(config: &BrowserConfig) -> CrudResult<Self> {
        let mut driver_config = config.driver.clone();
        if driver_config.binary_path.as_os_str().is_empty() {
            driver_config.binary_path = config.browser.default_driver().into();
        }

        let driver = DriverHandle::spawn(&driver_config).await?;
        let endpoint = driver.base_url().to_string();
        Self::open(endpoint, Some(driver), config).await
    }

    /// Open a session on an already running WebDriver endpoint
    pub async fn attach(endpoint: &str, config: &BrowserConfig) -> CrudResult<Self> {
        Self::open(endpoint.trim_end_matches('/').to_string(), None, config).await
    }

    async fn open(
        endpoint: String,
        driver: Option<DriverHandle>,
        config: &BrowserConfig,
    ) -> CrudResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.command_timeout_secs))
            .build()?;

        let mut session = Self {
            http,
            endpoint,
            session_id: None,
            driver,
        };

        let body = json!({
            "capabilities": {
                "alwaysMatch": config.browser.capabilities(config.headless)
            }
        });

        info!(
            "Starting {} session (headless: {})",
            config.browser.as_str(),
            config.headless
        );
        let url = format!("{}/session", session.endpoint);
        let value = session.command(session.http.post(&url).json(&body)).await?;

        let session_id = value
            .get("sessionId")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CrudError::WebDriver(format!("no sessionId in response: {}", value)))?;
        session.session_id = Some(session_id.to_string());
        info!("Browser session {} started", session_id);

        if config.maximize {
            let maximized = session.maximize().await;
            if let Err(e) = maximized {
                // The session exists on the driver; release it before failing
                if let Err(close_err) = session.close().await {
                    warn!("Failed to close browser session after setup error: {}", close_err);
                }
                return Err(e);
            }
        }

        Ok(session)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Maximize the current window
    pub async fn maximize(&self) -> CrudResult<()> {
        let url = self.session_url("window/maximize")?;
        self.command(self.http.post(&url).json(&json!({}))).await?;
        debug!("Window maximized");
        Ok(())
    }

    /// Delete the session and stop the driver process, if owned
    pub async fn close(mut self) -> CrudResult<()> {
        let result = self.delete_session().await;
        if let Some(mut driver) = self.driver.take() {
            driver.shutdown().await?;
        }
        result
    }

    async fn delete_session(&mut self) -> CrudResult<()> {
        let Some(id) = self.session_id.take() else {
            return Ok(());
        };

        let url = format!("{}/session/{}", self.endpoint, id);
        self.command(self.http.delete(&url)).await?;
        info!("Browser session {} closed", id);
        Ok(())
    }

    fn session_url(&self, path: &str) -> CrudResult<String> {
        let id = self
            .session_id
            .as_deref()
            .ok_or_else(|| CrudError::WebDriver("session is closed".to_string()))?;
        Ok(format!("{}/session/{}/{}", self.endpoint, id, path))
    }

    /// Send a command and unwrap the `value` envelope
    async fn command(&self, request: reqwest::RequestBuilder) -> CrudResult<Value> {
        let resp = request.send().await?;
        let status = resp.status();
        let body: Value = resp.json().await?;
        let value = body.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let error = value.get("error").and_then(|v| v.as_str()).unwrap_or("unknown error");
            let message = value.get("message").and_then(|v| v.as_str()).unwrap_or("");
            return Err(CrudError::WebDriver(format!("{} ({}): {}", error, status, message)));
        }

        Ok(value)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Some(id) = &self.session_id {
            warn!("Browser session {} dropped without close()", id);
        }
    }
}

/// Configuration for the browser fixture
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Acquire a session for the run
    pub enabled: bool,

    /// Already running WebDriver endpoint; when set no driver process is spawned
    pub endpoint: Option<String>,
    pub browser: Browser,
    pub headless: bool,
    pub maximize: bool,
    pub command_timeout_secs: u64,
    pub driver: DriverConfig,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            browser: Browser::Chrome,
            headless: true,
            maximize: true,
            command_timeout_secs: 60,
            driver: DriverConfig::default(),
        }
    }
}
