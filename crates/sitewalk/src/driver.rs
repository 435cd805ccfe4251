//! Driver - Abstract Browser Automation Trait
//!
//! Everything Sitewalk does to a browser goes through [`Driver`]. The page
//! and region layers never talk to a concrete backend, so the same page
//! objects run against the in-memory [`FakeBrowser`](crate::FakeBrowser)
//! in tests and against Chromium (feature `browser`) in real runs.
//!
//! Drivers hand out opaque [`ElementId`]s. An id stays valid only for the
//! DOM render that produced it; using it afterwards must fail with
//! [`SitewalkError::StaleElement`](crate::SitewalkError::StaleElement).
//!
//! All methods take `&self`. A driver is owned by exactly one scenario at a
//! time, so implementations only need interior mutability, not locking
//! discipline across threads.

use crate::locator::Locator;
use crate::result::SitewalkResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to an element issued by a driver
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    /// Wrap a driver-specific handle
    #[must_use]
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Browser window dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl WindowSize {
    /// Create a window size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Desktop 1080p
    pub const DESKTOP: Self = Self::new(1920, 1080);

    /// Phone-sized viewport, narrow enough for collapsed navigation menus
    pub const PHONE: Self = Self::new(393, 852);
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::DESKTOP
    }
}

/// Browser capability consumed by pages, regions, and the harness
pub trait Driver: Send + Sync {
    /// Navigate the current window to `url`
    fn navigate(&self, url: &str) -> SitewalkResult<()>;

    /// URL of the current window
    fn current_url(&self) -> SitewalkResult<String>;

    /// Serialized DOM of the current window
    fn page_source(&self) -> SitewalkResult<String>;

    /// Document title
    fn title(&self) -> SitewalkResult<String>;

    /// `document.readyState` of the current window
    fn ready_state(&self) -> SitewalkResult<String>;

    /// Find all elements matching `locator`, searching descendants of
    /// `scope` or the whole document when `scope` is `None`
    fn find_elements(
        &self,
        scope: Option<&ElementId>,
        locator: &Locator,
    ) -> SitewalkResult<Vec<ElementId>>;

    /// Tag name of an element (lowercase)
    fn tag_name(&self, element: &ElementId) -> SitewalkResult<String>;

    /// Visible text of an element and its descendants
    fn text(&self, element: &ElementId) -> SitewalkResult<String>;

    /// Attribute value, `None` if absent
    fn attribute(&self, element: &ElementId, name: &str) -> SitewalkResult<Option<String>>;

    /// Whether a human would see the element
    fn is_displayed(&self, element: &ElementId) -> SitewalkResult<bool>;

    /// Click an element
    fn click(&self, element: &ElementId) -> SitewalkResult<()>;

    /// Type text into an element
    fn send_keys(&self, element: &ElementId, text: &str) -> SitewalkResult<()>;

    /// Clear an input element
    fn clear(&self, element: &ElementId) -> SitewalkResult<()>;

    /// Evaluate a script in the page
    fn execute_script(&self, script: &str) -> SitewalkResult<serde_json::Value>;

    /// Current window size
    fn window_size(&self) -> SitewalkResult<WindowSize>;

    /// Resize the current window
    fn set_window_size(&self, size: WindowSize) -> SitewalkResult<()>;

    /// Handles of all open windows, in opening order
    fn window_handles(&self) -> SitewalkResult<Vec<String>>;

    /// Handle of the current window
    fn current_window(&self) -> SitewalkResult<String>;

    /// Make another window current
    fn switch_to_window(&self, handle: &str) -> SitewalkResult<()>;

    /// Close the current window. No window is current until the next
    /// [`Driver::switch_to_window`].
    fn close_window(&self) -> SitewalkResult<()>;

    /// PNG screenshot of the current window
    fn screenshot(&self) -> SitewalkResult<Vec<u8>>;

    /// End the browser session
    fn quit(&self) -> SitewalkResult<()> {
        Ok(())
    }
}
