//! Navigation edges between page types and retailer classification.

use crate::locator::Locator;
use crate::page::Page;
use crate::result::SitewalkResult;
use crate::session::Element;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A clickable edge to page type `P`.
///
/// Declared as an associated constant next to the locators it uses. Page
/// modules may link to each other in cycles; nothing is registered or
/// cached.
pub struct Link<P> {
    locator: Locator,
    destination: PhantomData<fn() -> P>,
}

impl<P> Link<P> {
    /// Declare an edge found by `locator`
    #[must_use]
    pub const fn new(locator: Locator) -> Self {
        Self {
            locator,
            destination: PhantomData,
        }
    }

    /// Locator of the clickable element
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }
}

impl<P> Clone for Link<P> {
    fn clone(&self) -> Self {
        Self::new(self.locator.clone())
    }
}

impl<P> fmt::Debug for Link<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("locator", &self.locator)
            .field("destination", &std::any::type_name::<P>())
            .finish()
    }
}

impl<P: Page> Link<P> {
    /// Click the link under `container` and return the ready destination
    pub fn follow_from(&self, container: &Element) -> SitewalkResult<P> {
        container.find(&self.locator)?.click()?;
        P::arrive(container.session())
    }
}

/// Where a retailer link led
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// Amazon print store
    Amazon,
    /// Bookshare accessible library
    Bookshare,
    /// Apple Books / iTunes
    ITunes,
    /// Google Play Books
    GooglePlay,
    /// Amazon Kindle store
    Kindle,
    /// Anything else, with the URL reached
    Unknown(String),
}

impl Destination {
    /// Classify a URL by its host
    #[must_use]
    pub fn classify(url: &str) -> Self {
        let Some(parsed) = url::Url::parse(url).ok() else {
            return Self::Unknown(url.to_string());
        };
        let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) else {
            return Self::Unknown(url.to_string());
        };
        let on = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if on("read.amazon.com") || (is_amazon(&host) && parsed.path().contains("kindle")) {
            Self::Kindle
        } else if is_amazon(&host) || on("amzn.to") {
            Self::Amazon
        } else if on("bookshare.org") {
            Self::Bookshare
        } else if on("itunes.apple.com") || on("books.apple.com") {
            Self::ITunes
        } else if on("play.google.com") {
            Self::GooglePlay
        } else {
            Self::Unknown(url.to_string())
        }
    }
}

/// `amazon.<tld>`, `amazon.co.<cc>` or `amazon.com.<cc>`, with any subdomain
fn is_amazon(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    let is_tld = |label: &str| label.len() >= 2 && label.chars().all(|c| c.is_ascii_alphabetic());
    labels
        .iter()
        .rposition(|label| *label == "amazon")
        .is_some_and(|i| match &labels[i + 1..] {
            [tld] => is_tld(*tld),
            [second, cc] => matches!(*second, "co" | "com") && cc.len() == 2 && is_tld(*cc),
            _ => false,
        })
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amazon => f.write_str("Amazon"),
            Self::Bookshare => f.write_str("Bookshare"),
            Self::ITunes => f.write_str("iTunes"),
            Self::GooglePlay => f.write_str("Google Play"),
            Self::Kindle => f.write_str("Kindle"),
            Self::Unknown(url) => write!(f, "unknown ({url})"),
        }
    }
}
