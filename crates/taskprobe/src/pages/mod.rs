//! Page objects for the Task Manager Plus screens.
//!
//! A page object borrows the session's driver and wait policy, owns the
//! locators of its screen and exposes semantic operations built from
//! locate (with a bounded wait), read, type and click. Every operation logs
//! its outcome; failures are logged with context and returned unchanged.

mod home;
mod task;

pub use home::HomePage;
pub use task::{TaskDetails, TaskPage};

use crate::driver::AutomationDriver;
use crate::locator::Locator;
use crate::result::ProbeResult;
use crate::wait::{WaitPolicy, Waiter};
use async_trait::async_trait;

/// A screen of the app under test.
///
/// Each screen has a landmark element whose visibility proves that a
/// transition to it completed.
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Driver the page talks to
    type Driver: AutomationDriver + ?Sized;

    /// The driver
    fn driver(&self) -> &Self::Driver;

    /// Wait policy for every locate on this page
    fn wait_policy(&self) -> WaitPolicy;

    /// Element that is visible once the screen is shown
    fn landmark(&self) -> Locator;

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Wait for the landmark to become visible
    async fn wait_until_loaded(&self) -> ProbeResult<()> {
        let landmark = self.landmark();
        Waiter::new(self.driver(), self.wait_policy())
            .visible(&landmark)
            .await
            .map(|_| tracing::debug!(page = self.page_name(), "page loaded"))
    }
}

/// Log the outcome of a page step and pass it through
pub(crate) fn log_step<T>(step: &str, result: ProbeResult<T>) -> ProbeResult<T> {
    match &result {
        Ok(_) => tracing::info!(step, "step completed"),
        Err(e) => tracing::error!(step, error = %e, kind = %e.kind(), "step failed"),
    }
    result
}
