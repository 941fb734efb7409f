//! Home screen scenarios
//!
//! The `live_` tests need an Appium server and an emulator with the app
//! installed; run them with `cargo test -- --ignored`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;
use taskprobe::{logging, AppConfig, MockDevice, ProbeError, Session, SessionFixture, WaitPolicy};

fn bundled_config() -> AppConfig {
    AppConfig::load(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/config.properties"))
        .expect("bundled config should load")
}

fn assert_home_text(actual: &str, expected: &str) -> Result<(), ProbeError> {
    if actual == expected {
        Ok(())
    } else {
        Err(ProbeError::assertion(format!(
            "home text was '{actual}', expected '{expected}'"
        )))
    }
}

// ============================================================================
// Mock device
// ============================================================================

#[tokio::test]
async fn test_home_text_matches_config() {
    logging::init();
    let config = bundled_config().with_wait(WaitPolicy::new().with_timeout(1_000));
    let session = Session::with_driver(MockDevice::new(), config);

    session
        .run(|s| {
            Box::pin(async move {
                let text = s.home_page().home_text().await?;
                assert_home_text(&text, s.config().expected_home_text()?)
            })
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_home_text_mismatch_is_assertion_failure() {
    logging::init();
    let session = Session::with_driver(
        MockDevice::new().with_home_text("This is dashboard Fragment"),
        bundled_config(),
    );

    let err = session
        .run(|s| {
            Box::pin(async move {
                let text = s.home_page().home_text().await?;
                assert_home_text(&text, s.config().expected_home_text()?)
            })
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), taskprobe::ErrorKind::Assertion);
}

// ============================================================================
// Live device
// ============================================================================

#[tokio::test]
#[ignore = "requires an Appium server and emulator"]
async fn live_home_text() {
    logging::init();
    let config = AppConfig::from_env().expect("config should load");
    let mut fixture: SessionFixture = SessionFixture::new();

    let outcome = async {
        fixture.setup(config).await?;
        let session = fixture.session()?;
        let text = session.home_page().home_text().await?;
        assert_home_text(&text, session.config().expected_home_text()?)
    }
    .await;

    fixture.teardown().await.expect("teardown should not fail");
    outcome.unwrap();
}
