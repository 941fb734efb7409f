//! Suite configuration.
//!
//! Settings come from a Java-style `.properties` resource. [`Properties`]
//! parses the file format; [`AppConfig`] validates the keys the suite needs
//! and turns them into typed values.

use crate::result::{ProbeError, ProbeResult};
use crate::wait::{WaitPolicy, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use reqwest::Url;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "TASKPROBE_CONFIG";

/// Configuration file bundled with the crate
pub const DEFAULT_CONFIG_FILE: &str = "assets/config.properties";

/// Property keys.
#[allow(missing_docs)]
pub mod keys {
    pub const PLATFORM_NAME: &str = "platform.name";
    pub const DEVICE_NAME: &str = "device.name";
    pub const APP_PATH: &str = "app.path";
    pub const AUTOMATION_NAME: &str = "automation.name";
    pub const NO_RESET: &str = "no.reset";
    pub const FULL_RESET: &str = "full.reset";
    pub const SERVER_URL: &str = "appium.server.url";
    pub const HOME_TEXT_EXPECTED: &str = "home.text.expected";
    pub const WAIT_TIMEOUT_MS: &str = "wait.timeout.ms";
    pub const WAIT_POLL_INTERVAL_MS: &str = "wait.poll.interval.ms";
}

// =============================================================================
// PROPERTIES
// =============================================================================

/// Key/value pairs parsed from `.properties` text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `.properties` text.
    ///
    /// Supports `#`/`!` comments, `=`, `:` or whitespace separators,
    /// backslash line continuations and the `\t \n \r \f \uXXXX` escapes.
    /// Later keys override earlier ones.
    pub fn parse(text: &str) -> ProbeResult<Self> {
        let mut props = Self::new();
        let mut lines = text.lines().enumerate();

        while let Some((number, raw)) = lines.next() {
            let first = raw.trim_start();
            if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
                continue;
            }

            let mut logical = String::from(first);
            while ends_with_continuation(&logical) {
                let _ = logical.pop();
                match lines.next() {
                    Some((_, next)) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_entry(&logical);
            let key = unescape(key, number + 1)?;
            let value = unescape(value, number + 1)?;
            props.set(key, value);
        }

        Ok(props)
    }

    /// Read and parse a `.properties` file
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    /// Insert or replace a value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let _ = self.entries.insert(key.into(), value.into());
    }

    /// Get a value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Get a value that must be present
    pub fn require(&self, key: &str) -> ProbeResult<&str> {
        self.get(key).ok_or_else(|| ProbeError::MissingConfig {
            key: key.to_string(),
        })
    }

    /// All keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A trailing odd run of backslashes continues the line.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split a logical line at the first unescaped separator.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .map_or(rest, str::trim_start);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str, line: usize) -> ProbeResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| ProbeError::InvalidConfig {
                        key: format!("line {line}"),
                        message: format!("malformed \\u escape '\\u{hex}'"),
                    })?;
                out.push(decoded);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}

fn parse_bool(props: &Properties, key: &str) -> ProbeResult<bool> {
    match props.require(key)?.trim() {
        v if v.eq_ignore_ascii_case("true") => Ok(true),
        v if v.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(ProbeError::InvalidConfig {
            key: key.to_string(),
            message: format!("expected true or false, got '{other}'"),
        }),
    }
}

fn parse_millis(props: &Properties, key: &str, default: u64) -> ProbeResult<u64> {
    props.get(key).map_or(Ok(default), |raw| {
        raw.trim().parse().map_err(|e| ProbeError::InvalidConfig {
            key: key.to_string(),
            message: format!("'{raw}' is not a millisecond count: {e}"),
        })
    })
}

// =============================================================================
// APP CONFIG
// =============================================================================

/// Validated suite configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Target platform (e.g. "Android")
    pub platform_name: String,
    /// Device or emulator name
    pub device_name: String,
    /// Path of the application binary on the automation server host
    pub app_path: String,
    /// Automation engine (e.g. "UiAutomator2")
    pub automation_name: String,
    /// Keep app state between sessions
    pub no_reset: bool,
    /// Reinstall the app for each session
    pub full_reset: bool,
    /// Automation server base URL
    pub server_url: Url,
    /// Text the home screen is expected to show
    pub home_text_expected: Option<String>,
    /// Bounded wait used by every page object
    pub wait: WaitPolicy,
}

impl AppConfig {
    /// Build from parsed properties.
    ///
    /// `full.reset` defaults to false when absent; every other capability key
    /// is required. A rejected configuration is logged before it is returned.
    pub fn from_properties(props: &Properties) -> ProbeResult<Self> {
        Self::validate(props).map_err(|e| {
            tracing::error!(error = %e, "invalid configuration");
            e
        })
    }

    fn validate(props: &Properties) -> ProbeResult<Self> {
        let raw_url = props.require(keys::SERVER_URL)?;
        let server_url = Url::parse(raw_url.trim()).map_err(|e| ProbeError::InvalidConfig {
            key: keys::SERVER_URL.to_string(),
            message: format!("malformed URL '{raw_url}': {e}"),
        })?;
        if !matches!(server_url.scheme(), "http" | "https") {
            return Err(ProbeError::InvalidConfig {
                key: keys::SERVER_URL.to_string(),
                message: format!("unsupported scheme '{}'", server_url.scheme()),
            });
        }

        let full_reset = if props.get(keys::FULL_RESET).is_some() {
            parse_bool(props, keys::FULL_RESET)?
        } else {
            false
        };

        let timeout_ms = parse_millis(props, keys::WAIT_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS)?;
        let poll_interval_ms =
            parse_millis(props, keys::WAIT_POLL_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS)?;

        Ok(Self {
            platform_name: props.require(keys::PLATFORM_NAME)?.to_string(),
            device_name: props.require(keys::DEVICE_NAME)?.to_string(),
            app_path: props.require(keys::APP_PATH)?.to_string(),
            automation_name: props.require(keys::AUTOMATION_NAME)?.to_string(),
            no_reset: parse_bool(props, keys::NO_RESET)?,
            full_reset,
            server_url,
            home_text_expected: props.get(keys::HOME_TEXT_EXPECTED).map(str::to_string),
            wait: WaitPolicy::new()
                .with_timeout(timeout_ms)
                .with_poll_interval(poll_interval_ms),
        })
    }

    /// Parse `.properties` text into a config
    pub fn from_properties_str(text: &str) -> ProbeResult<Self> {
        Self::from_properties(&Properties::parse(text)?)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> ProbeResult<Self> {
        let path = path.as_ref();
        let props = Properties::load(path).map_err(|e| {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "error loading configuration properties"
            );
            e
        })?;
        tracing::info!(
            path = %path.display(),
            keys = props.len(),
            "configuration properties loaded"
        );
        Self::from_properties(&props)
    }

    /// Load from `$TASKPROBE_CONFIG`, or the bundled file when unset
    pub fn from_env() -> ProbeResult<Self> {
        Self::load(Self::default_path())
    }

    /// Location [`AppConfig::from_env`] reads
    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV).map_or_else(
            || Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_FILE),
            PathBuf::from,
        )
    }

    /// Replace the wait policy
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Expected home text, or a setup error when the key is absent
    pub fn expected_home_text(&self) -> ProbeResult<&str> {
        self.home_text_expected
            .as_deref()
            .ok_or_else(|| ProbeError::MissingConfig {
                key: keys::HOME_TEXT_EXPECTED.to_string(),
            })
    }
}
