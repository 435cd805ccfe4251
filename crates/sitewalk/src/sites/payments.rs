//! Payments administration.

use crate::config::Product;
use crate::locator::Locator;
use crate::nav::Link;
use crate::page::{page_context, Page, PageContext};
use crate::region::{region_scope, Region, Scope};
use crate::result::SitewalkResult;

/// Admin landing page; only admins get past the login redirect
#[derive(Debug)]
pub struct PaymentsAdmin {
    ctx: PageContext,
}

impl PaymentsAdmin {
    const NAV: Locator = Locator::css("nav.admin-nav");
    const ORDERS: Link<Orders> = Link::new(Locator::id("orders-link"));

    /// Open the order list
    pub fn go_to_orders(&self) -> SitewalkResult<Orders> {
        self.follow(&Self::ORDERS)
    }
}

impl Page for PaymentsAdmin {
    const PRODUCT: Product = Product::Payments;
    const URL_TEMPLATE: &'static str = "/admin";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        self.find(&Self::NAV)?.is_displayed()
    }
}

/// Order list with search
#[derive(Debug)]
pub struct Orders {
    ctx: PageContext,
}

impl Orders {
    const TABLE: Locator = Locator::css("table#orders");
    const ROW: Locator = Locator::css("table#orders tbody tr");
    const SEARCH_FIELD: Locator = Locator::css("form.order-search input[name='q']");
    const SEARCH_BUTTON: Locator = Locator::css("form.order-search button");

    /// Rows in table order
    pub fn rows(&self) -> SitewalkResult<Vec<OrderRow>> {
        self.ensure_ready()?;
        self.regions(&Self::ROW)
    }

    /// Search for `term`; the filtered list is a new render
    pub fn search(self, term: &str) -> SitewalkResult<Self> {
        self.ensure_ready()?;
        tracing::debug!(term, "searching orders");
        self.find(&Self::SEARCH_FIELD)?.fill(term)?;
        self.find(&Self::SEARCH_BUTTON)?.click()?;
        Self::arrive(self.session())
    }
}

impl Page for Orders {
    const PRODUCT: Product = Product::Payments;
    const URL_TEMPLATE: &'static str = "/admin/orders";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        self.find(&Self::TABLE)?.is_displayed()
    }
}

/// One order
#[derive(Debug)]
pub struct OrderRow {
    scope: Scope,
}

impl OrderRow {
    const ID: Locator = Locator::css("td.order-id");
    const CUSTOMER: Locator = Locator::css("td.customer");
    const STATUS: Locator = Locator::css("td.status");

    /// Order number
    pub fn id(&self) -> SitewalkResult<String> {
        self.find(&Self::ID)?.text()
    }

    /// Customer name
    pub fn customer(&self) -> SitewalkResult<String> {
        self.find(&Self::CUSTOMER)?.text()
    }

    /// Fulfilment status
    pub fn status(&self) -> SitewalkResult<String> {
        self.find(&Self::STATUS)?.text()
    }
}

impl Region for OrderRow {
    region_scope!();
}
