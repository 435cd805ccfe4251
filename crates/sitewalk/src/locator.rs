//! Locators: immutable descriptions of how to find an element.
//!
//! A [`Locator`] is pure data. Building one never touches the DOM and
//! two locators with equal `(strategy, value)` are interchangeable.
//! Page and region types declare them as associated constants:
//!
//! ```ignore
//! impl WebNav {
//!     const LOGIN: Locator = Locator::css("a.pardotTrackClick");
//!     const MENU_TOGGLE: Locator = Locator::id("menu-toggle");
//! }
//! ```

use std::borrow::Cow;
use std::fmt;

/// Strategy used by the driver to resolve a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Element `id` attribute
    Id,
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
    /// Single class name
    ClassName,
    /// Tag name
    TagName,
    /// Element `name` attribute
    Name,
    /// Exact text of a link
    LinkText,
    /// Substring of a link's text
    PartialLinkText,
}

impl Strategy {
    /// Short name used when displaying locators
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::ClassName => "class",
            Self::TagName => "tag",
            Self::Name => "name",
            Self::LinkText => "link_text",
            Self::PartialLinkText => "partial_link_text",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to find an element: a strategy and a selector string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    strategy: Strategy,
    value: Cow<'static, str>,
}

impl Locator {
    /// Create a locator from a static selector
    #[must_use]
    pub const fn new(strategy: Strategy, value: &'static str) -> Self {
        Self {
            strategy,
            value: Cow::Borrowed(value),
        }
    }

    /// Create a locator from a selector computed at runtime
    #[must_use]
    pub fn dynamic(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: Cow::Owned(value.into()),
        }
    }

    /// Locate by `id` attribute
    #[must_use]
    pub const fn id(value: &'static str) -> Self {
        Self::new(Strategy::Id, value)
    }

    /// Locate by CSS selector
    #[must_use]
    pub const fn css(value: &'static str) -> Self {
        Self::new(Strategy::Css, value)
    }

    /// Locate by XPath expression
    #[must_use]
    pub const fn xpath(value: &'static str) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Locate by a single class name
    #[must_use]
    pub const fn class_name(value: &'static str) -> Self {
        Self::new(Strategy::ClassName, value)
    }

    /// Locate by tag name
    #[must_use]
    pub const fn tag_name(value: &'static str) -> Self {
        Self::new(Strategy::TagName, value)
    }

    /// Locate by `name` attribute
    #[must_use]
    pub const fn name(value: &'static str) -> Self {
        Self::new(Strategy::Name, value)
    }

    /// Locate a link by its exact text
    #[must_use]
    pub const fn link_text(value: &'static str) -> Self {
        Self::new(Strategy::LinkText, value)
    }

    /// Locate a link by part of its text
    #[must_use]
    pub const fn partial_link_text(value: &'static str) -> Self {
        Self::new(Strategy::PartialLinkText, value)
    }

    /// The resolution strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The selector string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Express this locator as a CSS selector, if the strategy allows it.
    ///
    /// Link-text and XPath locators have no CSS equivalent and return `None`.
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self.strategy {
            Strategy::Css | Strategy::TagName => Some(self.value.to_string()),
            Strategy::Id => Some(format!("[id=\"{}\"]", escape_quotes(&self.value))),
            Strategy::Name => Some(format!("[name=\"{}\"]", escape_quotes(&self.value))),
            Strategy::ClassName => Some(format!(".{}", self.value.trim())),
            Strategy::XPath | Strategy::LinkText | Strategy::PartialLinkText => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.value)
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUBMIT: Locator = Locator::css("button[type='submit']");

    mod construction_tests {
        use super::*;

        #[test]
        fn test_const_locator() {
            assert_eq!(SUBMIT.strategy(), Strategy::Css);
            assert_eq!(SUBMIT.value(), "button[type='submit']");
        }

        #[test]
        fn test_dynamic_equals_static() {
            let dynamic = Locator::dynamic(Strategy::Css, String::from("button[type='submit']"));
            assert_eq!(dynamic, SUBMIT);
        }

        #[test]
        fn test_strategy_matters() {
            assert_ne!(Locator::id("login"), Locator::name("login"));
        }

        #[test]
        fn test_display() {
            assert_eq!(Locator::id("menu").to_string(), "id=menu");
            assert_eq!(
                Locator::partial_link_text("Log").to_string(),
                "partial_link_text=Log"
            );
        }
    }

    mod css_conversion_tests {
        use super::*;

        #[test]
        fn test_id_to_css() {
            assert_eq!(
                Locator::id("main-menu").to_css().as_deref(),
                Some("[id=\"main-menu\"]")
            );
        }

        #[test]
        fn test_name_escapes_quotes() {
            assert_eq!(
                Locator::dynamic(Strategy::Name, "a\"b").to_css().as_deref(),
                Some("[name=\"a\\\"b\"]")
            );
        }

        #[test]
        fn test_class_and_tag() {
            assert_eq!(Locator::class_name("link").to_css().as_deref(), Some(".link"));
            assert_eq!(Locator::tag_name("nav").to_css().as_deref(), Some("nav"));
        }

        #[test]
        fn test_no_css_equivalent() {
            assert!(Locator::xpath("//a").to_css().is_none());
            assert!(Locator::link_text("Home").to_css().is_none());
        }
    }

    mod property_tests {
        use super::super::{Locator, Strategy};
        use proptest::prelude::{prop_assert_eq, prop_oneof, proptest, Just};

        fn any_strategy() -> impl proptest::strategy::Strategy<Value = Strategy> {
            prop_oneof![
                Just(Strategy::Id),
                Just(Strategy::Css),
                Just(Strategy::XPath),
                Just(Strategy::ClassName),
                Just(Strategy::TagName),
                Just(Strategy::Name),
                Just(Strategy::LinkText),
                Just(Strategy::PartialLinkText),
            ]
        }

        proptest! {
            #[test]
            fn prop_equal_iff_fields_equal(
                s1 in any_strategy(),
                s2 in any_strategy(),
                v1 in "[a-z.#]{0,8}",
                v2 in "[a-z.#]{0,8}",
            ) {
                let a = Locator::dynamic(s1, v1.clone());
                let b = Locator::dynamic(s2, v2.clone());
                prop_assert_eq!(a == b, s1 == s2 && v1 == v2);
            }
        }
    }
}
