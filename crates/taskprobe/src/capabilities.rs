//! Session capabilities.
//!
//! Appium accepts W3C capabilities; anything outside the W3C set must carry
//! a vendor prefix, so keys are stored with `appium:` unless they are
//! standard.

use crate::config::AppConfig;
use serde_json::{Map, Value};

/// Vendor prefix for Appium-specific capabilities
pub const APPIUM_PREFIX: &str = "appium:";

/// Capability names defined by the W3C WebDriver spec
pub const W3C_CAPABILITIES: &[&str] = &[
    "acceptInsecureCerts",
    "browserName",
    "browserVersion",
    "pageLoadStrategy",
    "platformName",
    "proxy",
    "setWindowRect",
    "strictFileInteractability",
    "timeouts",
    "unhandledPromptBehavior",
    "webSocketUrl",
];

/// Capabilities sent when creating a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capabilities {
    always_match: Map<String, Value>,
}

impl Capabilities {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// UiAutomator2 capabilities for the configured device and app
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new()
            .with("platformName", config.platform_name.as_str())
            .with("deviceName", config.device_name.as_str())
            .with("app", config.app_path.as_str())
            .with("automationName", config.automation_name.as_str())
            .with("noReset", config.no_reset)
            .with("fullReset", config.full_reset)
    }

    /// Add a capability, prefixing non-W3C names with `appium:`
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        let _ = self.always_match.insert(Self::qualify(name), value.into());
        self
    }

    /// Look up a capability by its short or prefixed name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.always_match.get(&Self::qualify(name))
    }

    /// Number of capabilities
    #[must_use]
    pub fn len(&self) -> usize {
        self.always_match.len()
    }

    /// True when no capability is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.always_match.is_empty()
    }

    fn qualify(name: &str) -> String {
        if name.contains(':') || W3C_CAPABILITIES.contains(&name) {
            name.to_string()
        } else {
            format!("{APPIUM_PREFIX}{name}")
        }
    }
}

impl From<Capabilities> for Map<String, Value> {
    fn from(capabilities: Capabilities) -> Self {
        capabilities.always_match
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> AppConfig {
        AppConfig::from_properties_str(
            "platform.name=Android\n\
             device.name=Pixel_7\n\
             app.path=/tmp/app.apk\n\
             automation.name=UiAutomator2\n\
             no.reset=true\n\
             full.reset=false\n\
             appium.server.url=http://localhost:4723\n",
        )
        .unwrap()
    }

    #[test]
    fn test_prefixing() {
        let caps = Capabilities::new()
            .with("platformName", "Android")
            .with("newCommandTimeout", 120)
            .with("appium:udid", "emulator-5554");
        assert!(caps.get("platformName").is_some());
        assert_eq!(caps.get("newCommandTimeout"), Some(&json!(120)));
        assert_eq!(caps.get("appium:newCommandTimeout"), Some(&json!(120)));
        assert_eq!(caps.get("udid"), Some(&json!("emulator-5554")));
        assert_eq!(caps.len(), 3);
    }

    #[test]
    fn test_from_config() {
        let caps = Capabilities::from_config(&config());
        assert_eq!(caps.get("platformName"), Some(&json!("Android")));
        assert_eq!(caps.get("appium:deviceName"), Some(&json!("Pixel_7")));
        assert_eq!(caps.get("app"), Some(&json!("/tmp/app.apk")));
        assert_eq!(caps.get("automationName"), Some(&json!("UiAutomator2")));
        assert_eq!(caps.get("noReset"), Some(&json!(true)));
        assert_eq!(caps.get("fullReset"), Some(&json!(false)));
    }

    #[test]
    fn test_into_map_keeps_prefixed_names() {
        let map: Map<String, Value> = Capabilities::from_config(&config()).into();
        assert_eq!(map["appium:automationName"], "UiAutomator2");
        assert_eq!(map["platformName"], "Android");
        assert!(!map.contains_key("automationName"));
    }
}
