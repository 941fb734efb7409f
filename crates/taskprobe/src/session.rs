//! Session lifecycle.
//!
//! A [`Session`] owns one driver bound to one running app. It is released
//! either by a scope ([`with_session`], [`Session::run`]) that always quits,
//! or by a [`SessionFixture`] whose teardown tolerates a setup that never
//! completed.

use crate::capabilities::Capabilities;
use crate::config::AppConfig;
use crate::driver::AutomationDriver;
use crate::pages::{HomePage, TaskPage};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Waiter;
use crate::webdriver::RemoteDriver;
use futures::future::BoxFuture;
use std::future::Future;

/// A live automation session plus the configuration it was opened with
#[derive(Debug)]
pub struct Session<D = RemoteDriver> {
    driver: D,
    config: AppConfig,
}

impl Session<RemoteDriver> {
    /// Launch the app through the configured Appium server.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::SessionLaunch`] when the server cannot create
    /// the session. The error is logged and returned unchanged.
    pub async fn open(config: AppConfig) -> ProbeResult<Self> {
        let capabilities = Capabilities::from_config(&config);
        tracing::info!(
            device = %config.device_name,
            app = %config.app_path,
            automation = %config.automation_name,
            "initializing driver"
        );
        match RemoteDriver::start(config.server_url.as_str(), &capabilities).await {
            Ok(driver) => {
                tracing::info!("driver initialized successfully");
                Ok(Self { driver, config })
            }
            Err(e) => {
                tracing::error!(error = %e, "error initializing driver");
                Err(e)
            }
        }
    }
}

impl<D: AutomationDriver> Session<D> {
    /// Wrap an already running driver
    pub const fn with_driver(driver: D, config: AppConfig) -> Self {
        Self { driver, config }
    }

    /// The underlying driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Configuration the session was opened with
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Waiter using the configured policy
    pub const fn wait(&self) -> Waiter<'_, D> {
        Waiter::new(&self.driver, self.config.wait)
    }

    /// Home screen page object
    pub const fn home_page(&self) -> HomePage<'_, D> {
        HomePage::new(&self.driver, self.config.wait)
    }

    /// Task screens page object
    pub const fn task_page(&self) -> TaskPage<'_, D> {
        TaskPage::new(&self.driver, self.config.wait)
    }

    /// Quit the driver, consuming the session
    pub async fn close(self) -> ProbeResult<()> {
        match self.driver.quit().await {
            Ok(()) => {
                tracing::info!("driver quit successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "error quitting driver");
                Err(e)
            }
        }
    }

    /// Run `body` against the session, then quit whatever the outcome.
    ///
    /// The body's error wins over a quit error; a quit error is returned
    /// only when the body succeeded.
    pub async fn run<T, F>(self, body: F) -> ProbeResult<T>
    where
        F: for<'s> FnOnce(&'s Self) -> BoxFuture<'s, ProbeResult<T>>,
    {
        let outcome = body(&self).await;
        let closed = self.close().await;
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) | (Err(e), _) => Err(e),
        }
    }
}

/// Open a remote session from `config`, run `body`, and always quit.
///
/// ```ignore
/// let list = with_session(config, |session| {
///     Box::pin(async move {
///         let page = session.task_page();
///         page.navigate_to_task_manager().await?;
///         page.task_list().await
///     })
/// })
/// .await?;
/// ```
pub async fn with_session<T, F>(config: AppConfig, body: F) -> ProbeResult<T>
where
    F: for<'s> FnOnce(&'s Session<RemoteDriver>) -> BoxFuture<'s, ProbeResult<T>>,
{
    Session::open(config).await?.run(body).await
}

// =============================================================================
// FIXTURE
// =============================================================================

/// Lifecycle state of a [`SessionFixture`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureState {
    /// Created but not set up
    Registered,
    /// Session is open
    SetUp,
    /// Session was quit
    TornDown,
    /// Setup failed; no session exists
    Failed,
}

/// Per-test holder of a session with explicit setup and teardown.
///
/// Teardown is a no-op unless setup completed, so it can run
/// unconditionally after every test.
#[derive(Debug)]
pub struct SessionFixture<D = RemoteDriver> {
    session: Option<Session<D>>,
    state: FixtureState,
}

impl<D> Default for SessionFixture<D> {
    fn default() -> Self {
        Self {
            session: None,
            state: FixtureState::Registered,
        }
    }
}

impl SessionFixture<RemoteDriver> {
    /// Open a remote session from `config`
    pub async fn setup(&mut self, config: AppConfig) -> ProbeResult<()> {
        self.setup_with(|| Session::open(config)).await
    }
}

impl<D: AutomationDriver> SessionFixture<D> {
    /// Create an empty fixture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set up with a custom session factory
    pub async fn setup_with<F, Fut>(&mut self, open: F) -> ProbeResult<()>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = ProbeResult<Session<D>>> + Send,
    {
        if self.session.is_some() {
            return Err(ProbeError::FixtureError {
                message: "session fixture is already set up".to_string(),
            });
        }
        match open().await {
            Ok(session) => {
                self.session = Some(session);
                self.state = FixtureState::SetUp;
                Ok(())
            }
            Err(e) => {
                self.state = FixtureState::Failed;
                Err(e)
            }
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> FixtureState {
        self.state
    }

    /// Whether a session is open
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    /// The open session
    pub fn session(&self) -> ProbeResult<&Session<D>> {
        self.session.as_ref().ok_or(ProbeError::SessionNotInitialized)
    }

    /// Quit the session if one is open
    pub async fn teardown(&mut self) -> ProbeResult<()> {
        let Some(session) = self.session.take() else {
            tracing::debug!(state = ?self.state, "teardown skipped, driver not initialized");
            return Ok(());
        };
        self.state = FixtureState::TornDown;
        session.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::MockDevice;
    use crate::wait::WaitPolicy;

    fn config() -> AppConfig {
        AppConfig::from_properties_str(
            "platform.name=Android\n\
             device.name=emulator-5554\n\
             app.path=/tmp/app.apk\n\
             automation.name=UiAutomator2\n\
             no.reset=false\n\
             appium.server.url=http://127.0.0.1:9\n",
        )
        .unwrap()
        .with_wait(WaitPolicy::new().with_timeout(500).with_poll_interval(50))
    }

    mod scope_tests {
        use super::*;

        #[tokio::test]
        async fn test_run_returns_body_value() {
            let session = Session::with_driver(MockDevice::new(), config());
            let text = session
                .run(|s| Box::pin(async move { s.home_page().home_text().await }))
                .await
                .unwrap();
            assert_eq!(text, "This is home Fragment");
        }

        #[tokio::test(start_paused = true)]
        async fn test_run_returns_body_error() {
            let session = Session::with_driver(MockDevice::new(), config());
            let err = session
                .run(|s| {
                    Box::pin(async move {
                        s.task_page().task_list().await?;
                        Ok(())
                    })
                })
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }

        #[tokio::test]
        async fn test_run_reports_quit_failure() {
            let device = MockDevice::new();
            device.quit().await.unwrap();
            let session = Session::with_driver(device, config());
            let result = session.run(|_| Box::pin(async { Ok(()) })).await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_open_unreachable_server() {
            let err = Session::open(config()).await.unwrap_err();
            assert!(matches!(err, ProbeError::SessionLaunch { .. }));
        }

        #[tokio::test]
        async fn test_with_session_propagates_launch_failure() {
            let result = with_session(config(), |_| Box::pin(async { Ok(()) })).await;
            assert!(matches!(result, Err(ProbeError::SessionLaunch { .. })));
        }
    }

    mod fixture_tests {
        use super::*;

        #[tokio::test]
        async fn test_lifecycle() {
            let mut fixture: SessionFixture<MockDevice> = SessionFixture::new();
            assert_eq!(fixture.state(), FixtureState::Registered);

            fixture
                .setup_with(|| async { Ok(Session::with_driver(MockDevice::new(), config())) })
                .await
                .unwrap();
            assert_eq!(fixture.state(), FixtureState::SetUp);
            assert!(fixture.is_initialized());
            assert!(fixture.session().is_ok());

            fixture.teardown().await.unwrap();
            assert_eq!(fixture.state(), FixtureState::TornDown);
            assert!(!fixture.is_initialized());
        }

        #[tokio::test]
        async fn test_teardown_after_failed_setup_is_noop() {
            let mut fixture: SessionFixture<MockDevice> = SessionFixture::new();
            let err = fixture
                .setup_with(|| async {
                    Err(ProbeError::SessionLaunch {
                        message: "device offline".to_string(),
                    })
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::SessionLaunch { .. }));
            assert_eq!(fixture.state(), FixtureState::Failed);

            fixture.teardown().await.unwrap();
            assert!(matches!(
                fixture.session(),
                Err(ProbeError::SessionNotInitialized)
            ));
        }

        #[tokio::test]
        async fn test_teardown_twice() {
            let mut fixture: SessionFixture<MockDevice> = SessionFixture::new();
            fixture
                .setup_with(|| async { Ok(Session::with_driver(MockDevice::new(), config())) })
                .await
                .unwrap();
            fixture.teardown().await.unwrap();
            fixture.teardown().await.unwrap();
        }

        #[tokio::test]
        async fn test_double_setup_rejected() {
            let mut fixture: SessionFixture<MockDevice> = SessionFixture::new();
            let open = || async { Ok(Session::with_driver(MockDevice::new(), config())) };
            fixture.setup_with(open).await.unwrap();
            let err = fixture.setup_with(open).await.unwrap_err();
            assert!(matches!(err, ProbeError::FixtureError { .. }));
        }
    }
}
