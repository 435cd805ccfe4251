//! Page Objects
//!
//! A [`Page`] is a top-level navigable unit: a product, a URL template, and a
//! page-specific `loaded` predicate. Page values move through
//! `Unopened -> Loading -> Ready`; only a ready page accepts actions.
//!
//! When a page becomes ready it captures the document element of the render
//! it observed. Every lookup the page (and each region built from it) makes
//! is scoped to that anchor, so once the browser navigates away the old page
//! fails with [`SitewalkError::StaleElement`] instead of silently reading the
//! new document.
//!
//! ```ignore
//! struct About { ctx: PageContext }
//!
//! impl Page for About {
//!     const PRODUCT: Product = Product::Web;
//!     const URL_TEMPLATE: &'static str = "/about";
//!
//!     fn from_context(ctx: PageContext) -> Self { Self { ctx } }
//!     fn context(&self) -> &PageContext { &self.ctx }
//!     fn context_mut(&mut self) -> &mut PageContext { &mut self.ctx }
//!
//!     fn loaded(&self) -> SitewalkResult<bool> {
//!         self.find(&Locator::css("main h1"))?.is_displayed()
//!     }
//! }
//!
//! let about = About::new(&session).open()?;
//! ```

use crate::config::Product;
use crate::locator::Locator;
use crate::nav::Link;
use crate::region::{Region, Scope};
use crate::result::{SitewalkError, SitewalkResult};
use crate::session::{Element, Session};
use crate::template::{UrlParams, UrlTemplate};
use crate::wait::LoadState;
use std::fmt;

/// Lifecycle of a page value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageState {
    /// Constructed, not navigated to
    #[default]
    Unopened,
    /// Navigation issued, readiness not yet confirmed
    Loading,
    /// `loaded` held; actions are allowed
    Ready,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unopened => "unopened",
            Self::Loading => "loading",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// State shared by every page type: session, path parameters, lifecycle,
/// and the document anchor of the render the page is bound to
#[derive(Debug, Clone)]
pub struct PageContext {
    session: Session,
    params: UrlParams,
    state: PageState,
    anchor: Option<Element>,
}

impl PageContext {
    /// Fresh, unopened context
    #[must_use]
    pub fn new(session: Session, params: UrlParams) -> Self {
        Self {
            session,
            params,
            state: PageState::Unopened,
            anchor: None,
        }
    }

    /// The session
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Path parameters
    #[must_use]
    pub const fn params(&self) -> &UrlParams {
        &self.params
    }

    /// Lifecycle state
    #[must_use]
    pub const fn state(&self) -> PageState {
        self.state
    }
}

/// Implement the context accessors of [`Page`] for a struct whose context
/// field is named `ctx`
macro_rules! page_context {
    () => {
        fn from_context(ctx: $crate::page::PageContext) -> Self {
            Self { ctx }
        }

        fn context(&self) -> &$crate::page::PageContext {
            &self.ctx
        }

        fn context_mut(&mut self) -> &mut $crate::page::PageContext {
            &mut self.ctx
        }
    };
}
pub(crate) use page_context;

/// A navigable page
pub trait Page: Sized {
    /// Product whose base URL the template is relative to
    const PRODUCT: Product;

    /// Path template, e.g. `/details/books/{slug}`
    const URL_TEMPLATE: &'static str;

    /// Wrap a context
    fn from_context(ctx: PageContext) -> Self;

    /// Shared page state
    fn context(&self) -> &PageContext;

    /// Shared page state, mutably
    fn context_mut(&mut self) -> &mut PageContext;

    /// Page-specific readiness: key content visible and async content
    /// settled. Must not act on the page; evaluating it twice against an
    /// unchanged DOM gives the same answer.
    fn loaded(&self) -> SitewalkResult<bool>;

    /// What a user would take as confirmation of being on this page
    fn is_displayed(&self) -> bool {
        self.loaded().unwrap_or(false)
    }

    /// Short type name used in logs and errors
    fn page_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    // =========================================================================
    // Provided methods
    // =========================================================================

    /// Unopened page without path parameters
    fn new(session: &Session) -> Self {
        Self::with_params(session, UrlParams::new())
    }

    /// Unopened page with path parameters
    fn with_params(session: &Session, params: UrlParams) -> Self {
        Self::from_context(PageContext::new(session.clone(), params))
    }

    /// Parsed [`Self::URL_TEMPLATE`]
    fn template() -> SitewalkResult<UrlTemplate> {
        UrlTemplate::parse(Self::URL_TEMPLATE)
    }

    /// Session this page drives
    fn session(&self) -> &Session {
        self.context().session()
    }

    /// Lifecycle state
    fn state(&self) -> PageState {
        self.context().state()
    }

    /// Absolute URL of this page
    fn url(&self) -> SitewalkResult<String> {
        let base = self.session().base_url(Self::PRODUCT)?;
        Self::template()?.render_url(&base, self.context().params())
    }

    /// Navigate to [`Self::url`] and block until the page is ready
    fn open(mut self) -> SitewalkResult<Self> {
        let url = self.url()?;
        let ctx = self.context_mut();
        ctx.state = PageState::Loading;
        ctx.anchor = None;
        ctx.session.navigate(&url)?;
        self.wait_for_page_to_load()
    }

    /// Block until the document is complete and `loaded` holds, then bind
    /// the page to the current render.
    ///
    /// Fails with [`SitewalkError::Timeout`] after the navigation timeout.
    fn wait_for_page_to_load(mut self) -> SitewalkResult<Self> {
        let session = self.session().clone();
        let description = format!("{} to load", Self::page_name());
        self.context_mut().state = PageState::Loading;

        let (_, waited) = session.navigation_waiter().wait_for_value(&description, || {
            if !LoadState::Load.is_reached(&session.driver().ready_state()?) {
                return Ok(None);
            }
            self.context_mut().anchor = Some(session.document()?);
            Ok(self.loaded()?.then_some(()))
        })?;

        self.context_mut().state = PageState::Ready;
        tracing::info!(
            page = Self::page_name(),
            elapsed_ms = u64::try_from(waited.elapsed.as_millis()).unwrap_or(u64::MAX),
            "page ready"
        );
        Ok(self)
    }

    /// Construct this page after an action that should have navigated to
    /// it. Waits for the browser URL to fit the template (recovering its
    /// parameters), then for the page to load.
    ///
    /// Landing anywhere else fails with
    /// [`SitewalkError::UnexpectedDestination`].
    fn arrive(session: &Session) -> SitewalkResult<Self> {
        let template = Self::template()?;
        let base = session.base_url(Self::PRODUCT)?;
        let description = format!("the browser to reach {}", Self::page_name());

        let arrived = session.waiter().wait_for_value(&description, || {
            let url = session.current_url()?;
            Ok(template.match_url(&base, &url))
        });
        let params = match arrived {
            Ok((params, _)) => params,
            Err(SitewalkError::Timeout { .. }) => {
                return Err(SitewalkError::UnexpectedDestination {
                    expected: format!("{} ({base}{template})", Self::page_name()),
                    actual: session.current_url()?,
                });
            }
            Err(e) => return Err(e),
        };

        Self::with_params(session, params).wait_for_page_to_load()
    }

    /// Error unless the page is ready
    fn ensure_ready(&self) -> SitewalkResult<()> {
        match self.state() {
            PageState::Ready => Ok(()),
            state => Err(SitewalkError::invalid_state(format!(
                "{} is {state}; actions need a ready page",
                Self::page_name()
            ))),
        }
    }

    /// Document element this page is bound to
    fn document(&self) -> SitewalkResult<&Element> {
        self.context().anchor.as_ref().ok_or_else(|| {
            SitewalkError::invalid_state(format!("{} has not been opened", Self::page_name()))
        })
    }

    /// First element matching `locator` in this page's render
    fn find(&self, locator: &Locator) -> SitewalkResult<Element> {
        self.document()?.find(locator)
    }

    /// All elements matching `locator` in this page's render
    fn find_all(&self, locator: &Locator) -> SitewalkResult<Vec<Element>> {
        self.document()?.find_all(locator)
    }

    /// Region rooted at the first match of `locator`
    fn region<R: Region>(&self, locator: Locator) -> SitewalkResult<R> {
        Ok(R::from_scope(Scope::within(self.document()?, locator)))
    }

    /// One region per match of `locator`, in document order
    fn regions<R: Region>(&self, locator: &Locator) -> SitewalkResult<Vec<R>> {
        Ok(self
            .find_all(locator)?
            .into_iter()
            .map(|el| R::from_scope(Scope::pinned(el)))
            .collect())
    }

    /// Click a link on this page and return the ready destination
    fn follow<D: Page>(&self, link: &Link<D>) -> SitewalkResult<D> {
        self.ensure_ready()?;
        link.follow_from(self.document()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::SuiteConfig;
    use crate::fake::{FakeBrowser, FakeSite, Node, Response};
    use crate::wait::WaitOptions;
    use std::sync::Arc;
    use std::time::Duration;

    const BASE: &str = "https://example.org";

    #[derive(Debug)]
    struct About {
        ctx: PageContext,
    }

    impl About {
        const HEADING: Locator = Locator::css("main h1");
    }

    impl Page for About {
        const PRODUCT: Product = Product::Web;
        const URL_TEMPLATE: &'static str = "/about";

        fn from_context(ctx: PageContext) -> Self {
            Self { ctx }
        }

        fn context(&self) -> &PageContext {
            &self.ctx
        }

        fn context_mut(&mut self) -> &mut PageContext {
            &mut self.ctx
        }

        fn loaded(&self) -> SitewalkResult<bool> {
            self.find(&Self::HEADING)?.is_displayed()
        }
    }

    fn site(reveal: Duration) -> FakeSite {
        FakeSite::new().route(BASE, "/about", move |_| {
            Response::page(
                "About",
                Node::new("main")
                    .child(Node::new("h1").text("About us").reveal_after(reveal)),
            )
        })
    }

    fn session(site: FakeSite, navigation_timeout_ms: u64) -> Session {
        let mut config = SuiteConfig::new();
        config.base_urls.insert(Product::Web, BASE.to_string());
        config.wait = WaitOptions::new().with_timeout(300).with_poll_interval(10);
        config.navigation_timeout_ms = navigation_timeout_ms;
        Session::new(Arc::new(FakeBrowser::new(Arc::new(site))), Arc::new(config))
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn test_new_page_is_unopened() {
            let about = About::new(&session(site(Duration::ZERO), 500));
            assert_eq!(about.state(), PageState::Unopened);
            assert!(matches!(
                about.ensure_ready(),
                Err(SitewalkError::InvalidState { .. })
            ));
            assert!(matches!(
                about.find(&About::HEADING),
                Err(SitewalkError::InvalidState { .. })
            ));
        }

        #[test]
        fn test_url_renders_template_under_base() {
            let about = About::new(&session(site(Duration::ZERO), 500));
            assert_eq!(about.url().unwrap(), "https://example.org/about");
        }

        #[test]
        fn test_open_waits_for_loaded() {
            let session = session(site(Duration::from_millis(80)), 2000);
            let about = About::new(&session).open().unwrap();
            assert_eq!(about.state(), PageState::Ready);
            assert_eq!(session.current_url().unwrap(), "https://example.org/about");
            let heading = about.find(&About::HEADING).unwrap();
            assert_eq!(heading.text().unwrap(), "About us");
        }

        #[test]
        fn test_open_times_out() {
            let session = session(site(Duration::from_secs(60)), 100);
            match About::new(&session).open() {
                Err(SitewalkError::Timeout { ms, waited_for }) => {
                    assert_eq!(ms, 100);
                    assert!(waited_for.contains("About"));
                }
                other => panic!("Expected Timeout, got {other:?}"),
            }
        }

        #[test]
        fn test_loaded_is_idempotent() {
            let about = About::new(&session(site(Duration::ZERO), 500)).open().unwrap();
            let first = about.loaded().unwrap();
            let second = about.loaded().unwrap();
            assert!(first);
            assert_eq!(first, second);
            assert_eq!(about.state(), PageState::Ready);
        }

        #[test]
        fn test_page_name() {
            assert_eq!(About::page_name(), "About");
        }
    }

    mod arrival_tests {
        use super::*;

        #[test]
        fn test_arrive_on_matching_url() {
            let session = session(site(Duration::ZERO), 500);
            session.navigate("https://example.org/about").unwrap();
            let about = About::arrive(&session).unwrap();
            assert_eq!(about.state(), PageState::Ready);
        }

        #[test]
        fn test_arrive_elsewhere_is_unexpected_destination() {
            let session = session(site(Duration::ZERO), 500);
            session.navigate("https://example.org/missing").unwrap();
            match About::arrive(&session) {
                Err(SitewalkError::UnexpectedDestination { expected, actual }) => {
                    assert!(expected.starts_with("About"));
                    assert_eq!(actual, "https://example.org/missing");
                }
                other => panic!("Expected UnexpectedDestination, got {other:?}"),
            }
        }
    }

    mod staleness_tests {
        use super::*;

        #[test]
        fn test_page_goes_stale_after_navigation() {
            let session = session(site(Duration::ZERO), 500);
            let about = About::new(&session).open().unwrap();
            session.navigate("https://example.org/about").unwrap();
            assert!(matches!(
                about.find(&About::HEADING),
                Err(SitewalkError::StaleElement { .. })
            ));
            assert!(!about.is_displayed());
        }
    }
}
