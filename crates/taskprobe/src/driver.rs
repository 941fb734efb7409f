//! AutomationDriver - abstract remote automation trait
//!
//! Page objects only talk to this trait. Two implementations ship with the
//! crate:
//!
//! - [`RemoteDriver`](crate::webdriver::RemoteDriver) - an Appium session
//!   through thirtyfour
//! - [`MockDevice`](crate::mock::MockDevice) - an in-memory Task Manager Plus
//!   simulation for unit tests

use crate::locator::Selector;
use crate::result::ProbeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to an element returned by a find command.
///
/// Only valid until the next screen transition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(String);

impl ElementRef {
    /// Wrap a server-issued element id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The server-issued element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Primitive operations of a remote automation session.
///
/// `find_element` fails with [`ProbeError::NoSuchElement`](crate::ProbeError::NoSuchElement)
/// when nothing matches; `find_elements` returns an empty list instead.
/// Element commands on a reference that no longer exists fail with
/// [`ProbeError::StaleElement`](crate::ProbeError::StaleElement).
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// First element matching the selector
    async fn find_element(&self, selector: &Selector) -> ProbeResult<ElementRef>;

    /// All elements matching the selector, in document order
    async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementRef>>;

    /// All descendants of `parent` matching the selector
    async fn find_child_elements(
        &self,
        parent: &ElementRef,
        selector: &Selector,
    ) -> ProbeResult<Vec<ElementRef>>;

    /// Visible text of the element
    async fn text(&self, element: &ElementRef) -> ProbeResult<String>;

    /// Whether the element is displayed
    async fn is_displayed(&self, element: &ElementRef) -> ProbeResult<bool>;

    /// Whether the element is enabled
    async fn is_enabled(&self, element: &ElementRef) -> ProbeResult<bool>;

    /// Whether a checkable element is checked
    async fn is_selected(&self, element: &ElementRef) -> ProbeResult<bool>;

    /// Tap the element
    async fn click(&self, element: &ElementRef) -> ProbeResult<()>;

    /// Clear an editable element
    async fn clear(&self, element: &ElementRef) -> ProbeResult<()>;

    /// Type text into an editable element
    async fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()>;

    /// End the session and close the application
    async fn quit(&self) -> ProbeResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ref() {
        let element = ElementRef::new("00000000-0000-0001");
        assert_eq!(element.id(), "00000000-0000-0001");
        assert_eq!(element.to_string(), "00000000-0000-0001");
        assert_eq!(element.clone(), element);
    }
}
