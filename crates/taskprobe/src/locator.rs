//! Locator abstraction for element selection.
//!
//! A [`Selector`] names one of the location strategies the Appium
//! UiAutomator2 driver understands. A [`Locator`] pairs a selector with a
//! human-readable name used in logs and timeout errors.

use std::fmt;

/// Android widget class used for plain text views
pub const TEXT_VIEW_CLASS: &str = "android.widget.TextView";

/// Android widget class used for buttons
pub const BUTTON_CLASS: &str = "android.widget.Button";

/// Android widget class used for image buttons
pub const IMAGE_BUTTON_CLASS: &str = "android.widget.ImageButton";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Android resource id (e.g. `rv_task_list` or `android:id/button1`)
    Id(String),
    /// Accessibility id (`content-desc` on Android)
    AccessibilityId(String),
    /// XPath over the accessibility hierarchy
    XPath(String),
    /// Widget class name
    ClassName(String),
}

impl Selector {
    /// Create a resource id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Create an accessibility id selector
    #[must_use]
    pub fn accessibility_id(label: impl Into<String>) -> Self {
        Self::AccessibilityId(label.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Create a class name selector
    #[must_use]
    pub fn class_name(class: impl Into<String>) -> Self {
        Self::ClassName(class.into())
    }

    /// XPath matching a widget of `class` whose attribute `attr` equals `value` exactly
    #[must_use]
    pub fn attribute_equals(class: &str, attr: &str, value: &str) -> Self {
        Self::XPath(format!("//{class}[@{attr}={}]", xpath_literal(value)))
    }

    /// XPath matching a text view whose text equals `text` exactly
    #[must_use]
    pub fn text_view_with_text(text: &str) -> Self {
        Self::attribute_equals(TEXT_VIEW_CLASS, "text", text)
    }

    /// W3C location strategy name
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Id(_) => "id",
            Self::AccessibilityId(_) => "accessibility id",
            Self::XPath(_) => "xpath",
            Self::ClassName(_) => "class name",
        }
    }

    /// Value sent alongside the strategy
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Id(v) | Self::AccessibilityId(v) | Self::XPath(v) | Self::ClassName(v) => v,
        }
    }

    /// Express the selector as XPath over the UiAutomator2 hierarchy.
    ///
    /// Short resource ids are qualified with `package`; ids that already
    /// carry a package (`android:id/button1`) are used as they are.
    #[must_use]
    pub fn to_xpath(&self, package: &str) -> String {
        match self {
            Self::Id(id) if id.contains(':') => {
                format!("//*[@resource-id={}]", xpath_literal(id))
            }
            Self::Id(id) => {
                let qualified = format!("{package}:id/{id}");
                format!("//*[@resource-id={}]", xpath_literal(&qualified))
            }
            Self::AccessibilityId(label) => {
                format!("//*[@content-desc={}]", xpath_literal(label))
            }
            Self::XPath(expr) => expr.clone(),
            Self::ClassName(class) => format!("//{class}"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy(), self.value())
    }
}

/// Quote `value` as an XPath 1.0 string literal.
///
/// XPath 1.0 has no escape sequences, so a value containing both quote
/// characters is assembled with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// A named selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    name: String,
    selector: Selector,
}

impl Locator {
    /// Create a named locator
    #[must_use]
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
        }
    }

    /// Create a locator named after its selector
    #[must_use]
    pub fn from_selector(selector: Selector) -> Self {
        Self {
            name: selector.to_string(),
            selector,
        }
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the symbolic name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.selector.to_string() {
            write!(f, "{}", self.selector)
        } else {
            write!(f, "{} ({})", self.name, self.selector)
        }
    }
}
