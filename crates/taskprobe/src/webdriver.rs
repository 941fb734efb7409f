//! Appium client built on thirtyfour.
//!
//! thirtyfour sends `By::Id` as a CSS selector, which UiAutomator2 does not
//! support, so every [`Selector`] goes out as XPath over `resource-id`,
//! `content-desc` or the widget class.

use crate::capabilities::Capabilities;
use crate::driver::{AutomationDriver, ElementRef};
use crate::locator::Selector;
use crate::locators::APP_PACKAGE;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thirtyfour::error::WebDriverError;
use thirtyfour::{By, WebDriver, WebElement};
use tokio::sync::RwLock;

/// How long the readiness check may take before the server counts as down
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Readiness reported by `GET /status`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerStatus {
    /// Whether the server accepts new sessions. Servers that omit the
    /// field are taken as ready.
    #[serde(default = "ready_by_default")]
    pub ready: bool,
    /// Human-readable state
    #[serde(default)]
    pub message: String,
}

const fn ready_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    value: ServerStatus,
}

/// An open Appium session.
///
/// Elements found through the session are kept by id so that an
/// [`ElementRef`] can be turned back into a thirtyfour element.
pub struct RemoteDriver {
    server_url: String,
    driver: RwLock<Option<WebDriver>>,
    elements: Mutex<HashMap<String, WebElement>>,
}

impl fmt::Debug for RemoteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDriver")
            .field("server_url", &self.server_url)
            .field("elements", &self.cache().len())
            .finish_non_exhaustive()
    }
}

impl RemoteDriver {
    /// Ask the server at `server_url` whether it accepts sessions.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Http`] when the server is unreachable or answers
    /// with an error status, and [`ProbeError::Json`] for a malformed body.
    pub async fn server_status(server_url: &str) -> ProbeResult<ServerStatus> {
        let client = reqwest::Client::builder().timeout(STATUS_TIMEOUT).build()?;
        let url = format!("{}/status", server_url.trim_end_matches('/'));
        let body = client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let envelope: StatusEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.value)
    }

    /// Create a session on the server at `server_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::SessionLaunch`] when the server is unreachable,
    /// not ready, or refuses the capabilities.
    pub async fn start(server_url: &str, capabilities: &Capabilities) -> ProbeResult<Self> {
        let server_url = server_url.trim_end_matches('/');
        tracing::info!(server = %server_url, "creating automation session");

        let status = Self::server_status(server_url)
            .await
            .map_err(|e| ProbeError::SessionLaunch {
                message: format!("{server_url} is not reachable: {e}"),
            })?;
        if !status.ready {
            return Err(ProbeError::SessionLaunch {
                message: format!("{server_url} is not ready: {}", status.message),
            });
        }

        let caps: Map<String, Value> = capabilities.clone().into();
        let driver = WebDriver::new(server_url, caps)
            .await
            .map_err(|e| ProbeError::SessionLaunch {
                message: e.to_string(),
            })?;
        tracing::info!("automation session created");
        Ok(Self::attach(server_url, driver))
    }

    /// Wrap a session that was created elsewhere
    #[must_use]
    pub fn attach(server_url: &str, driver: WebDriver) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            driver: RwLock::new(Some(driver)),
            elements: Mutex::new(HashMap::new()),
        }
    }

    /// Server URL without a trailing slash
    #[must_use]
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// False once the session was quit
    pub async fn is_open(&self) -> bool {
        self.driver.read().await.is_some()
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, WebElement>> {
        self.elements.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(&self, element: WebElement) -> ElementRef {
        let id = element.element_id().to_string();
        let _ = self.cache().insert(id.clone(), element);
        ElementRef::new(id)
    }

    async fn element(&self, element: &ElementRef) -> ProbeResult<WebElement> {
        if !self.is_open().await {
            return Err(ProbeError::SessionNotInitialized);
        }
        self.cache()
            .get(element.id())
            .cloned()
            .ok_or_else(|| ProbeError::StaleElement {
                element: element.id().to_string(),
            })
    }

    async fn find_all(&self, selector: &Selector) -> ProbeResult<Vec<WebElement>> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or(ProbeError::SessionNotInitialized)?;
        let xpath = selector.to_xpath(APP_PACKAGE);
        driver
            .find_all(By::XPath(xpath.as_str()))
            .await
            .map_err(|e| map_error("find elements", &selector.to_string(), e))
    }
}

/// XPath for a search below an element; an absolute `//` path would search
/// the whole hierarchy.
fn relative_xpath(xpath: &str) -> String {
    if xpath.starts_with('/') {
        format!(".{xpath}")
    } else {
        xpath.to_string()
    }
}

fn map_error(command: &str, subject: &str, err: WebDriverError) -> ProbeError {
    match err {
        WebDriverError::NoSuchElement(_) => ProbeError::NoSuchElement {
            locator: subject.to_string(),
        },
        WebDriverError::StaleElementReference(_) => ProbeError::StaleElement {
            element: subject.to_string(),
        },
        other => ProbeError::WebDriver {
            command: command.to_string(),
            error: "webdriver".to_string(),
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl AutomationDriver for RemoteDriver {
    async fn find_element(&self, selector: &Selector) -> ProbeResult<ElementRef> {
        let guard = self.driver.read().await;
        let driver = guard.as_ref().ok_or(ProbeError::SessionNotInitialized)?;
        let xpath = selector.to_xpath(APP_PACKAGE);
        let element = driver
            .find(By::XPath(xpath.as_str()))
            .await
            .map_err(|e| map_error("find element", &selector.to_string(), e))?;
        Ok(self.remember(element))
    }

    async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementRef>> {
        let found = self.find_all(selector).await?;
        Ok(found.into_iter().map(|e| self.remember(e)).collect())
    }

    async fn find_child_elements(
        &self,
        parent: &ElementRef,
        selector: &Selector,
    ) -> ProbeResult<Vec<ElementRef>> {
        let parent_element = self.element(parent).await?;
        let xpath = relative_xpath(&selector.to_xpath(APP_PACKAGE));
        let found = parent_element
            .find_all(By::XPath(xpath.as_str()))
            .await
            .map_err(|e| map_error("find child elements", parent.id(), e))?;
        Ok(found.into_iter().map(|e| self.remember(e)).collect())
    }

    async fn text(&self, element: &ElementRef) -> ProbeResult<String> {
        self.element(element)
            .await?
            .text()
            .await
            .map_err(|e| map_error("text", element.id(), e))
    }

    async fn is_displayed(&self, element: &ElementRef) -> ProbeResult<bool> {
        self.element(element)
            .await?
            .is_displayed()
            .await
            .map_err(|e| map_error("displayed", element.id(), e))
    }

    async fn is_enabled(&self, element: &ElementRef) -> ProbeResult<bool> {
        self.element(element)
            .await?
            .is_enabled()
            .await
            .map_err(|e| map_error("enabled", element.id(), e))
    }

    async fn is_selected(&self, element: &ElementRef) -> ProbeResult<bool> {
        self.element(element)
            .await?
            .is_selected()
            .await
            .map_err(|e| map_error("selected", element.id(), e))
    }

    async fn click(&self, element: &ElementRef) -> ProbeResult<()> {
        self.element(element)
            .await?
            .click()
            .await
            .map_err(|e| map_error("click", element.id(), e))
    }

    async fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
        self.element(element)
            .await?
            .clear()
            .await
            .map_err(|e| map_error("clear", element.id(), e))
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
        self.element(element)
            .await?
            .send_keys(text)
            .await
            .map_err(|e| map_error("send keys", element.id(), e))
    }

    async fn quit(&self) -> ProbeResult<()> {
        let driver = self
            .driver
            .write()
            .await
            .take()
            .ok_or(ProbeError::SessionNotInitialized)?;
        self.cache().clear();
        let result = driver.quit().await.map_err(|e| map_error("quit", "", e));
        tracing::info!(server = %self.server_url, "automation session closed");
        result
    }
}
