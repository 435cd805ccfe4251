//! Marketing site and book catalog.

use super::accounts::AccountsLogin;
use crate::config::Product;
use crate::locator::{Locator, Strategy};
use crate::nav::{Destination, Link};
use crate::page::{page_context, Page, PageContext};
use crate::region::{region_scope, Region, Scope};
use crate::result::{SitewalkError, SitewalkResult};
use crate::session::Session;
use crate::template::UrlParams;

/// Landing page
#[derive(Debug)]
pub struct WebHome {
    ctx: PageContext,
}

impl WebHome {
    const HERO: Locator = Locator::css("#hero h1");
    const NAV: Locator = Locator::css("nav.main-nav");

    /// Site navigation bar
    pub fn nav(&self) -> SitewalkResult<WebNav> {
        self.ensure_ready()?;
        self.region(Self::NAV)
    }

    /// Headline of the hero banner
    pub fn headline(&self) -> SitewalkResult<String> {
        self.find(&Self::HERO)?.text()
    }
}

impl Page for WebHome {
    const PRODUCT: Product = Product::Web;
    const URL_TEMPLATE: &'static str = "/";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        self.find(&Self::HERO)?.is_displayed()
    }
}

/// Navigation bar shared by the marketing pages.
///
/// Wide windows show the subject menu inline; narrow windows collapse it
/// behind a toggle.
#[derive(Debug)]
pub struct WebNav {
    scope: Scope,
}

impl WebNav {
    const LOGIN: Link<AccountsLogin> = Link::new(Locator::css("a.login"));
    const MENU_TOGGLE: Locator = Locator::id("menu-toggle");
    const WIDE_MENU: Locator = Locator::css("ul.subjects-menu");
    const NARROW_MENU: Locator = Locator::id("mobile-menu");
    const SUBJECT_LINK: Locator = Locator::css("a.subject");

    /// Whether the menu is collapsed behind a toggle
    pub fn is_collapsed(&self) -> bool {
        self.find(&Self::MENU_TOGGLE)
            .and_then(|toggle| toggle.is_displayed())
            .unwrap_or(false)
    }

    /// Whether subject links are visible
    pub fn is_menu_open(&self) -> bool {
        [Self::WIDE_MENU, Self::NARROW_MENU].iter().any(|menu| {
            self.find(menu)
                .and_then(|el| el.is_displayed())
                .unwrap_or(false)
        })
    }

    /// Expand the collapsed menu; a no-op when already open
    pub fn open_menu(self) -> SitewalkResult<Self> {
        if self.is_menu_open() {
            return Ok(self);
        }
        self.find(&Self::MENU_TOGGLE)?.click()?;
        self.session()
            .waiter()
            .wait_for_function("the subject menu to open", || self.is_menu_open())?;
        Ok(self)
    }

    /// Names of the visible subject links
    pub fn subjects(&self) -> SitewalkResult<Vec<String>> {
        let mut names = Vec::new();
        for link in self.find_all(&Self::SUBJECT_LINK)? {
            if link.is_displayed()? {
                names.push(link.text()?);
            }
        }
        Ok(names)
    }

    /// Open the menu if needed and pick a subject
    pub fn go_to_subject(self, name: &str) -> SitewalkResult<Subjects> {
        let nav = self.open_menu()?;
        let links = nav.find_all(&Locator::dynamic(Strategy::LinkText, name))?;
        let mut clicked = false;
        for link in links {
            if link.is_displayed()? {
                link.click()?;
                clicked = true;
                break;
            }
        }
        if !clicked {
            return Err(SitewalkError::ElementNotFound {
                locator: format!("visible subject link '{name}'"),
            });
        }
        Subjects::arrive(nav.session())
    }

    /// Follow the login link to the accounts site
    pub fn log_in(&self) -> SitewalkResult<AccountsLogin> {
        self.follow(&Self::LOGIN)
    }
}

impl Region for WebNav {
    region_scope!();
}

/// Books of one subject
#[derive(Debug)]
pub struct Subjects {
    ctx: PageContext,
}

impl Subjects {
    const BOOK: Locator = Locator::css(".book-card");

    /// Unopened subject page
    pub fn for_subject(session: &Session, subject: &str) -> Self {
        Self::with_params(session, UrlParams::new().with("subject", subject))
    }

    /// Subject slug from the URL
    pub fn subject(&self) -> &str {
        self.context().params().get("subject").unwrap_or_default()
    }

    /// Book cards in page order
    pub fn books(&self) -> SitewalkResult<Vec<BookCard>> {
        self.ensure_ready()?;
        self.regions(&Self::BOOK)
    }

    /// Card whose title is `title`
    pub fn book(&self, title: &str) -> SitewalkResult<BookCard> {
        for card in self.books()? {
            if card.title()? == title {
                return Ok(card);
            }
        }
        Err(SitewalkError::ElementNotFound {
            locator: format!("book card titled '{title}'"),
        })
    }
}

impl Page for Subjects {
    const PRODUCT: Product = Product::Web;
    const URL_TEMPLATE: &'static str = "/subjects/{subject}";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        let cards = self.find_all(&Self::BOOK)?;
        if cards.is_empty() {
            return Ok(false);
        }
        for card in cards {
            if !card.is_displayed()? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// One book on a subject page
#[derive(Debug)]
pub struct BookCard {
    scope: Scope,
}

impl BookCard {
    const TITLE: Locator = Locator::css(".book-title");
    const DETAILS: Link<BookDetails> = Link::new(Locator::css("a.book-title"));

    /// Book title
    pub fn title(&self) -> SitewalkResult<String> {
        self.find(&Self::TITLE)?.text()
    }

    /// Open the book's details page
    pub fn view_details(&self) -> SitewalkResult<BookDetails> {
        self.follow(&Self::DETAILS)
    }
}

impl Region for BookCard {
    region_scope!();
}

/// Details and ordering options of one book
#[derive(Debug)]
pub struct BookDetails {
    ctx: PageContext,
}

impl BookDetails {
    const TITLE: Locator = Locator::css("h1.book-title");
    const ORDER_OPTIONS: Locator = Locator::id("order-options");
    const SUBJECT: Link<Subjects> = Link::new(Locator::css("a.subject-link"));

    /// Unopened details page
    pub fn for_book(session: &Session, slug: &str) -> Self {
        Self::with_params(session, UrlParams::new().with("slug", slug))
    }

    /// Book slug from the URL
    pub fn slug(&self) -> &str {
        self.context().params().get("slug").unwrap_or_default()
    }

    /// Book title
    pub fn title(&self) -> SitewalkResult<String> {
        self.find(&Self::TITLE)?.text()
    }

    /// Ordering panel
    pub fn order_options(&self) -> SitewalkResult<OrderOptions> {
        self.ensure_ready()?;
        self.region(Self::ORDER_OPTIONS)
    }

    /// Back to the book's subject
    pub fn back_to_subject(&self) -> SitewalkResult<Subjects> {
        self.follow(&Self::SUBJECT)
    }
}

impl Page for BookDetails {
    const PRODUCT: Product = Product::Web;
    const URL_TEMPLATE: &'static str = "/details/books/{slug}";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        self.find(&Self::TITLE)?.is_displayed()
    }
}

/// Retailer links of a book
#[derive(Debug)]
pub struct OrderOptions {
    scope: Scope,
}

impl OrderOptions {
    const PRINT: Locator = Locator::css("a.buy-print");
    const KINDLE: Locator = Locator::css("a.buy-kindle");
    const BOOKSHARE: Locator = Locator::css("a.bookshare");

    /// Whether a print copy can be ordered
    pub fn is_print_available(&self) -> bool {
        self.find(&Self::PRINT)
            .and_then(|link| link.is_displayed())
            .unwrap_or(false)
    }

    /// Follow the print link and classify the store it opens
    pub fn buy_print(&self) -> SitewalkResult<Destination> {
        self.visit_retailer(&Self::PRINT)
    }

    /// Follow the Kindle link and classify the store it opens
    pub fn buy_kindle(&self) -> SitewalkResult<Destination> {
        self.visit_retailer(&Self::KINDLE)
    }

    /// Follow the Bookshare link and classify where it leads
    pub fn bookshare(&self) -> SitewalkResult<Destination> {
        self.visit_retailer(&Self::BOOKSHARE)
    }

    /// Retailers open in a new window; classify it, close it, come back
    fn visit_retailer(&self, locator: &Locator) -> SitewalkResult<Destination> {
        let session = self.session().clone();
        let home = session.current_window()?;
        let known = session.window_handles()?;
        self.find(locator)?.click_when_displayed()?;
        session.switch_to_new_window(&known)?;
        let loaded = session.waiter().wait_for_value("the retailer page to load", || {
            let url = session.current_url()?;
            Ok((url != "about:blank").then_some(url))
        });
        let closed = session.close_window();
        session.switch_to_window(&home)?;
        let (url, _) = loaded?;
        closed?;
        let destination = Destination::classify(&url);
        tracing::info!(%destination, url = %url, "retailer link followed");
        Ok(destination)
    }
}

impl Region for OrderOptions {
    region_scope!();
}
