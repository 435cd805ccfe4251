//! Regions: bounded subtrees of a page.
//!
//! A region holds a [`Scope`], never an element. The root is resolved again
//! on every access, so a region outliving its render reports a lookup error
//! rather than reading stale state.

use crate::locator::Locator;
use crate::nav::Link;
use crate::page::Page;
use crate::result::SitewalkResult;
use crate::session::{Element, Session};

#[derive(Debug, Clone)]
enum Root {
    /// First match of a locator under a page's document anchor
    Within { anchor: Element, locator: Locator },
    /// First match of a locator under another region's root
    Nested { parent: Box<Scope>, locator: Locator },
    /// An element already resolved, e.g. one item of a list
    Pinned(Element),
}

/// How a region finds its root element
#[derive(Debug, Clone)]
pub struct Scope {
    root: Root,
}

impl Scope {
    /// Root located by `locator` under a document anchor
    #[must_use]
    pub fn within(anchor: &Element, locator: Locator) -> Self {
        Self {
            root: Root::Within {
                anchor: anchor.clone(),
                locator,
            },
        }
    }

    /// Root located by `locator` under a parent region
    #[must_use]
    pub fn nested(parent: &Self, locator: Locator) -> Self {
        Self {
            root: Root::Nested {
                parent: Box::new(parent.clone()),
                locator,
            },
        }
    }

    /// Root fixed to an element
    #[must_use]
    pub const fn pinned(element: Element) -> Self {
        Self {
            root: Root::Pinned(element),
        }
    }

    /// Resolve the root element
    pub fn root(&self) -> SitewalkResult<Element> {
        match &self.root {
            Root::Within { anchor, locator } => anchor.find(locator),
            Root::Nested { parent, locator } => parent.root()?.find(locator),
            Root::Pinned(element) => {
                // probe so a detached element fails here, not at first use
                element.tag_name()?;
                Ok(element.clone())
            }
        }
    }

    /// Session the root lives in
    #[must_use]
    pub fn session(&self) -> &Session {
        match &self.root {
            Root::Within { anchor, .. } => anchor.session(),
            Root::Nested { parent, .. } => parent.session(),
            Root::Pinned(element) => element.session(),
        }
    }
}

/// Implement [`Region::from_scope`] and [`Region::scope`] for a struct whose
/// only field is `scope`
macro_rules! region_scope {
    () => {
        fn from_scope(scope: $crate::region::Scope) -> Self {
            Self { scope }
        }

        fn scope(&self) -> &$crate::region::Scope {
            &self.scope
        }
    };
}
pub(crate) use region_scope;

/// A UI region with a lazily resolved root
pub trait Region: Sized {
    /// Wrap a scope
    fn from_scope(scope: Scope) -> Self;

    /// The scope this region resolves its root through
    fn scope(&self) -> &Scope;

    /// The root element.
    ///
    /// [`SitewalkError::ElementNotFound`](crate::SitewalkError::ElementNotFound)
    /// if absent,
    /// [`SitewalkError::StaleElement`](crate::SitewalkError::StaleElement) if
    /// the render it belonged to is gone.
    fn root(&self) -> SitewalkResult<Element> {
        self.scope().root()
    }

    /// Session this region drives
    fn session(&self) -> &Session {
        self.scope().session()
    }

    /// First descendant of the root matching `locator`
    fn find(&self, locator: &Locator) -> SitewalkResult<Element> {
        self.root()?.find(locator)
    }

    /// All descendants of the root matching `locator`
    fn find_all(&self, locator: &Locator) -> SitewalkResult<Vec<Element>> {
        self.root()?.find_all(locator)
    }

    /// Whether the root is present and visible. Never fails.
    fn is_displayed(&self) -> bool {
        self.root()
            .and_then(|root| root.is_displayed())
            .unwrap_or(false)
    }

    /// Block until the root is displayed
    fn wait_until_displayed(self) -> SitewalkResult<Self> {
        let description = format!("{} to be displayed", std::any::type_name::<Self>());
        self.session()
            .waiter()
            .wait_until(&description, || self.root()?.is_displayed())?;
        Ok(self)
    }

    /// Sub-region rooted at the first match of `locator`
    fn region<R: Region>(&self, locator: Locator) -> R {
        R::from_scope(Scope::nested(self.scope(), locator))
    }

    /// One sub-region per match of `locator`, in document order
    fn regions<R: Region>(&self, locator: &Locator) -> SitewalkResult<Vec<R>> {
        Ok(self
            .find_all(locator)?
            .into_iter()
            .map(|el| R::from_scope(Scope::pinned(el)))
            .collect())
    }

    /// Click a link inside this region and return the ready destination
    fn follow<D: Page>(&self, link: &Link<D>) -> SitewalkResult<D> {
        link.follow_from(&self.root()?)
    }
}
