//! taskprobe: page-object UI automation for the Task Manager Plus Android app
//!
//! Tests drive the app through an Appium server speaking the W3C WebDriver
//! protocol. Page objects encapsulate the locators of each screen and expose
//! semantic operations; every locate goes through one bounded wait policy.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐    ┌────────────┐    ┌─────────────────┐    ┌──────────┐
//! │ Test case  │───►│ Session    │───►│ Page objects    │───►│ Appium   │
//! │ (tests/)   │    │ (config +  │    │ (locators +     │    │ server / │
//! │            │◄───│  driver)   │◄───│  bounded waits) │◄───│ device   │
//! └────────────┘    └────────────┘    └─────────────────┘    └──────────┘
//! ```
//!
//! [`MockDevice`] stands in for the Appium server in unit tests.

#![warn(missing_docs)]

pub mod capabilities;
pub mod config;
mod driver;
pub mod locator;
pub mod locators;
pub mod logging;
pub mod mock;
pub mod pages;
mod result;
mod session;
pub mod wait;
pub mod webdriver;

pub use capabilities::Capabilities;
pub use config::{AppConfig, Properties};
pub use driver::{AutomationDriver, ElementRef};
pub use locator::{Locator, Selector};
pub use mock::{MockDevice, MockTask, Screen};
pub use pages::{HomePage, PageObject, TaskDetails, TaskPage};
pub use result::{ErrorKind, ProbeError, ProbeResult};
pub use session::{with_session, FixtureState, Session, SessionFixture};
pub use wait::{Condition, WaitPolicy, WaitResult, Waiter};
pub use webdriver::{RemoteDriver, ServerStatus};
