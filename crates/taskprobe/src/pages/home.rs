use super::{log_step, PageObject};
use crate::driver::AutomationDriver;
use crate::locator::Locator;
use crate::locators;
use crate::result::ProbeResult;
use crate::wait::{WaitPolicy, Waiter};
use async_trait::async_trait;

/// Screen shown right after launch
#[derive(Debug)]
pub struct HomePage<'a, D: ?Sized> {
    driver: &'a D,
    wait: WaitPolicy,
}

impl<'a, D: AutomationDriver + ?Sized> HomePage<'a, D> {
    /// Create the page over a driver
    pub const fn new(driver: &'a D, wait: WaitPolicy) -> Self {
        Self { driver, wait }
    }

    /// Text of the home view, read once it is present
    pub async fn home_text(&self) -> ProbeResult<String> {
        let result = async {
            let element = Waiter::new(self.driver, self.wait)
                .present(&locators::home_text())
                .await?;
            let text = self.driver.text(&element).await?;
            tracing::debug!(text = %text, "home text read");
            Ok(text)
        }
        .await;
        log_step("read home text", result)
    }
}

#[async_trait]
impl<D: AutomationDriver + ?Sized> PageObject for HomePage<'_, D> {
    type Driver = D;

    fn driver(&self) -> &D {
        self.driver
    }

    fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    fn landmark(&self) -> Locator {
        locators::home_text()
    }

    fn page_name(&self) -> &str {
        "home"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDevice, Screen};

    #[tokio::test]
    async fn test_home_text() {
        let device = MockDevice::new().with_home_text("Welcome back");
        let page = HomePage::new(&device, WaitPolicy::default());
        assert_eq!(page.home_text().await.unwrap(), "Welcome back");
        assert!(page.wait_until_loaded().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_home_text_readable_while_hidden() {
        let device = MockDevice::new();
        device.hide("text_home");
        let page = HomePage::new(&device, WaitPolicy::new().with_timeout(1_000));

        assert_eq!(page.home_text().await.unwrap(), "This is home Fragment");
        let err = page.wait_until_loaded().await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn test_home_text_times_out_off_screen() {
        let device = MockDevice::new();
        device.set_screen(Screen::TaskList);
        let page = HomePage::new(&device, WaitPolicy::new().with_timeout(2_000));

        let err = page.home_text().await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("home text"));
    }
}
