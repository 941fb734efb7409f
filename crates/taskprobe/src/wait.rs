//! Bounded waits.
//!
//! Every locate in the page objects goes through a [`Waiter`]: the driver is
//! polled for a [`Condition`] at a fixed interval until it holds or the
//! [`WaitPolicy`] timeout expires. Lookups that fail with "no such element"
//! or "stale element" count as "not yet"; every other error ends the wait
//! immediately.

use crate::driver::{AutomationDriver, ElementRef};
use crate::locator::Locator;
use crate::result::{ProbeError, ProbeResult};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (500ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

// =============================================================================
// WAIT POLICY
// =============================================================================

/// Timeout and poll interval shared by every wait in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitPolicy {
    /// Create a policy with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// =============================================================================
// CONDITIONS
// =============================================================================

/// What a wait polls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// At least one element matches
    Present,
    /// The first match is displayed
    Visible,
    /// The first match is displayed and enabled
    Clickable,
    /// No match is displayed (or nothing matches)
    Invisible,
}

impl Condition {
    /// Name used in logs and timeout errors
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
            Self::Invisible => "invisible",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Outcome of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the condition was checked
    pub polls: u32,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAITER
// =============================================================================

/// Polls a driver for element conditions under one [`WaitPolicy`]
#[derive(Debug)]
pub struct Waiter<'a, D: ?Sized> {
    driver: &'a D,
    policy: WaitPolicy,
}

impl<'a, D: AutomationDriver + ?Sized> Waiter<'a, D> {
    /// Create a waiter over `driver`
    pub const fn new(driver: &'a D, policy: WaitPolicy) -> Self {
        Self { driver, policy }
    }

    /// The policy in force
    pub const fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Wait until the located element is present
    pub async fn present(&self, locator: &Locator) -> ProbeResult<ElementRef> {
        self.until(locator, Condition::Present).await
    }

    /// Wait until the located element is visible
    pub async fn visible(&self, locator: &Locator) -> ProbeResult<ElementRef> {
        self.until(locator, Condition::Visible).await
    }

    /// Wait until the located element is clickable
    pub async fn clickable(&self, locator: &Locator) -> ProbeResult<ElementRef> {
        self.until(locator, Condition::Clickable).await
    }

    /// Wait until an element satisfies `condition` and return it.
    ///
    /// [`Condition::Invisible`] has no element to return and is rejected;
    /// use [`Waiter::invisible`].
    pub async fn until(&self, locator: &Locator, condition: Condition) -> ProbeResult<ElementRef> {
        if condition == Condition::Invisible {
            return Err(ProbeError::InvalidWait {
                message: format!("{locator} cannot be returned once invisible; use invisible()"),
            });
        }
        let start = Instant::now();
        let mut polls = 0_u32;
        tracing::debug!(locator = %locator, condition = %condition, "waiting");

        loop {
            polls += 1;
            if let Some(element) = self.check(locator, condition).await? {
                tracing::debug!(
                    locator = %locator,
                    condition = %condition,
                    polls,
                    elapsed = ?start.elapsed(),
                    "condition met"
                );
                return Ok(element);
            }
            if !self.pause(start).await {
                return Err(self.timeout(locator, condition));
            }
        }
    }

    /// Wait until no element matching the locator is displayed
    pub async fn invisible(&self, locator: &Locator) -> ProbeResult<WaitResult> {
        let start = Instant::now();
        let mut polls = 0_u32;
        tracing::debug!(locator = %locator, condition = %Condition::Invisible, "waiting");

        loop {
            polls += 1;
            if self.is_invisible(locator).await? {
                return Ok(WaitResult {
                    elapsed: start.elapsed(),
                    polls,
                    waited_for: format!("{locator} {}", Condition::Invisible),
                });
            }
            if !self.pause(start).await {
                return Err(self.timeout(locator, Condition::Invisible));
            }
        }
    }

    /// Sleep one poll interval, clipped to the remaining budget.
    /// Returns false once the budget is spent.
    async fn pause(&self, start: Instant) -> bool {
        let elapsed = start.elapsed();
        let timeout = self.policy.timeout();
        if elapsed >= timeout {
            return false;
        }
        let remaining = timeout - elapsed;
        let interval = self.policy.poll_interval().max(Duration::from_millis(1));
        tokio::time::sleep(interval.min(remaining)).await;
        true
    }

    fn timeout(&self, locator: &Locator, condition: Condition) -> ProbeError {
        ProbeError::Timeout {
            condition: condition.to_string(),
            locator: locator.to_string(),
            ms: self.policy.timeout_ms,
        }
    }

    async fn check(
        &self,
        locator: &Locator,
        condition: Condition,
    ) -> ProbeResult<Option<ElementRef>> {
        let element = match self.driver.find_element(locator.selector()).await {
            Ok(element) => element,
            Err(e) if e.is_transient_lookup() => return Ok(None),
            Err(e) => return Err(e),
        };

        let satisfied = match condition {
            Condition::Present => Ok(true),
            Condition::Visible => self.driver.is_displayed(&element).await,
            Condition::Clickable => match self.driver.is_displayed(&element).await {
                Ok(true) => self.driver.is_enabled(&element).await,
                other => other,
            },
            Condition::Invisible => Ok(false),
        };

        match satisfied {
            Ok(true) => Ok(Some(element)),
            Ok(false) => Ok(None),
            Err(e) if e.is_transient_lookup() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn is_invisible(&self, locator: &Locator) -> ProbeResult<bool> {
        let elements = self.driver.find_elements(locator.selector()).await?;
        for element in &elements {
            match self.driver.is_displayed(element).await {
                Ok(true) => return Ok(false),
                Ok(false) => {}
                Err(e) if e.is_transient_lookup() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}
