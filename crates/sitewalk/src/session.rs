//! Browser session and element handles.
//!
//! A [`Session`] is the one shared resource of a scenario: the driver plus
//! the resolved configuration. Pages, regions, and elements hold cheap
//! clones of it; none of them change the browser's configuration except
//! through explicit calls such as [`Session::resize_window`].

use crate::config::{Product, SuiteConfig};
use crate::driver::{Driver, ElementId, WindowSize};
use crate::locator::Locator;
use crate::result::{SitewalkError, SitewalkResult};
use crate::wait::{WaitOptions, Waiter};
use std::fmt;
use std::sync::Arc;

/// The driver and configuration a scenario runs with
#[derive(Clone)]
pub struct Session {
    driver: Arc<dyn Driver>,
    config: Arc<SuiteConfig>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("instance", &self.config.instance)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session over a driver
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, config: Arc<SuiteConfig>) -> Self {
        Self { driver, config }
    }

    /// The underlying driver
    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// The suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Base URL of a product
    pub fn base_url(&self, product: Product) -> SitewalkResult<String> {
        self.config.base_url(product)
    }

    /// Waiter for element and condition waits
    #[must_use]
    pub fn waiter(&self) -> Waiter {
        Waiter::with_options(self.config.wait)
    }

    /// Waiter with custom options
    #[must_use]
    pub const fn waiter_with(&self, options: WaitOptions) -> Waiter {
        Waiter::with_options(options)
    }

    /// Waiter for page readiness after navigation
    #[must_use]
    pub fn navigation_waiter(&self) -> Waiter {
        Waiter::with_options(self.config.navigation_wait())
    }

    /// Navigate the current window
    pub fn navigate(&self, url: &str) -> SitewalkResult<()> {
        tracing::debug!(url, "navigate");
        self.driver.navigate(url)
    }

    /// URL of the current window
    pub fn current_url(&self) -> SitewalkResult<String> {
        self.driver.current_url()
    }

    /// Document title of the current window
    pub fn title(&self) -> SitewalkResult<String> {
        self.driver.title()
    }

    /// Serialized DOM of the current window
    pub fn page_source(&self) -> SitewalkResult<String> {
        self.driver.page_source()
    }

    /// Evaluate a script in the current page
    pub fn execute_script(&self, script: &str) -> SitewalkResult<serde_json::Value> {
        self.driver.execute_script(script)
    }

    /// First element matching `locator` anywhere in the document
    pub fn find(&self, locator: &Locator) -> SitewalkResult<Element> {
        first(self.find_all(locator)?, locator)
    }

    /// All elements matching `locator` anywhere in the document
    pub fn find_all(&self, locator: &Locator) -> SitewalkResult<Vec<Element>> {
        let ids = self.driver.find_elements(None, locator)?;
        Ok(self.wrap(ids, locator))
    }

    /// The document element of the current render.
    ///
    /// Scoping lookups to it makes them fail with a staleness error once the
    /// browser has navigated away.
    pub fn document(&self) -> SitewalkResult<Element> {
        self.find(&Locator::tag_name("html"))
    }

    /// Current window size
    pub fn window_size(&self) -> SitewalkResult<WindowSize> {
        self.driver.window_size()
    }

    /// Resize the browser window
    pub fn resize_window(&self, size: WindowSize) -> SitewalkResult<()> {
        tracing::debug!(width = size.width, height = size.height, "resize window");
        self.driver.set_window_size(size)
    }

    /// Wait for a new window to open and make it current
    pub fn switch_to_new_window(&self, known: &[String]) -> SitewalkResult<String> {
        let (handle, _) = self.waiter().wait_for_value("a new window to open", || {
            Ok(self
                .driver
                .window_handles()?
                .into_iter()
                .find(|h| !known.contains(h)))
        })?;
        self.driver.switch_to_window(&handle)?;
        tracing::debug!(handle = %handle, "switched to new window");
        Ok(handle)
    }

    /// Make a window current
    pub fn switch_to_window(&self, handle: &str) -> SitewalkResult<()> {
        self.driver.switch_to_window(handle)
    }

    /// Close the current window
    pub fn close_window(&self) -> SitewalkResult<()> {
        tracing::debug!("close window");
        self.driver.close_window()
    }

    /// Handles of all open windows
    pub fn window_handles(&self) -> SitewalkResult<Vec<String>> {
        self.driver.window_handles()
    }

    /// Handle of the current window
    pub fn current_window(&self) -> SitewalkResult<String> {
        self.driver.current_window()
    }

    fn wrap(&self, ids: Vec<ElementId>, locator: &Locator) -> Vec<Element> {
        ids.into_iter()
            .map(|id| Element {
                session: self.clone(),
                id,
                locator: locator.clone(),
            })
            .collect()
    }
}

fn first(mut elements: Vec<Element>, locator: &Locator) -> SitewalkResult<Element> {
    if elements.is_empty() {
        return Err(SitewalkError::ElementNotFound {
            locator: locator.to_string(),
        });
    }
    Ok(elements.swap_remove(0))
}

/// A resolved element in the current render
#[derive(Clone)]
pub struct Element {
    session: Session,
    id: ElementId,
    locator: Locator,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("locator", &self.locator.to_string())
            .finish()
    }
}

impl Element {
    /// Driver handle
    #[must_use]
    pub const fn id(&self) -> &ElementId {
        &self.id
    }

    /// Locator this element was found by
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Session this element belongs to
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// First descendant matching `locator`
    pub fn find(&self, locator: &Locator) -> SitewalkResult<Element> {
        first(self.find_all(locator)?, locator)
    }

    /// All descendants matching `locator`
    pub fn find_all(&self, locator: &Locator) -> SitewalkResult<Vec<Element>> {
        let ids = self.session.driver.find_elements(Some(&self.id), locator)?;
        Ok(self.session.wrap(ids, locator))
    }

    /// Whether any descendant matches `locator`
    pub fn contains(&self, locator: &Locator) -> SitewalkResult<bool> {
        Ok(!self.find_all(locator)?.is_empty())
    }

    /// Lowercase tag name; also a cheap staleness probe
    pub fn tag_name(&self) -> SitewalkResult<String> {
        self.session.driver.tag_name(&self.id)
    }

    /// Visible text
    pub fn text(&self) -> SitewalkResult<String> {
        self.session.driver.text(&self.id)
    }

    /// Attribute value, `None` if absent
    pub fn attribute(&self, name: &str) -> SitewalkResult<Option<String>> {
        self.session.driver.attribute(&self.id, name)
    }

    /// Whether a human would see this element
    pub fn is_displayed(&self) -> SitewalkResult<bool> {
        self.session.driver.is_displayed(&self.id)
    }

    /// Click this element
    pub fn click(&self) -> SitewalkResult<()> {
        tracing::debug!(locator = %self.locator, "click");
        self.session.driver.click(&self.id)
    }

    /// Type into this element
    pub fn send_keys(&self, text: &str) -> SitewalkResult<()> {
        tracing::debug!(locator = %self.locator, chars = text.chars().count(), "type");
        self.session.driver.send_keys(&self.id, text)
    }

    /// Clear this input
    pub fn clear(&self) -> SitewalkResult<()> {
        self.session.driver.clear(&self.id)
    }

    /// Replace the contents of this input
    pub fn fill(&self, text: &str) -> SitewalkResult<()> {
        self.clear()?;
        self.send_keys(text)
    }

    /// Wait until this element is displayed, then click it
    pub fn click_when_displayed(&self) -> SitewalkResult<()> {
        let description = format!("{} to be displayed", self.locator);
        self.session
            .waiter()
            .wait_until(&description, || self.is_displayed())?;
        self.click()
    }
}
