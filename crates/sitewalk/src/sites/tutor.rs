//! Tutor: course dashboard for students and teachers.

use super::accounts::AccountsLogin;
use crate::config::{Credentials, Product};
use crate::locator::Locator;
use crate::nav::Link;
use crate::page::{page_context, Page, PageContext};
use crate::region::{region_scope, Region, Scope};
use crate::result::{SitewalkError, SitewalkResult};
use crate::session::Session;
use crate::template::UrlParams;

/// Public landing page
#[derive(Debug)]
pub struct TutorHome {
    ctx: PageContext,
}

impl TutorHome {
    const LOGIN: Link<AccountsLogin> = Link::new(Locator::id("login"));

    /// Sign in through accounts and come back to the dashboard
    pub fn log_in(self, credentials: &Credentials) -> SitewalkResult<TutorDashboard> {
        self.follow(&Self::LOGIN)?.log_in_to::<TutorDashboard>(credentials)
    }
}

impl Page for TutorHome {
    const PRODUCT: Product = Product::Tutor;
    const URL_TEMPLATE: &'static str = "/";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        self.find(Self::LOGIN.locator())?.is_displayed()
    }
}

/// Courses of the signed-in user. Cards arrive after the page shell.
#[derive(Debug)]
pub struct TutorDashboard {
    ctx: PageContext,
}

impl TutorDashboard {
    const COURSE: Locator = Locator::css(".course-card");

    /// Course cards in page order
    pub fn courses(&self) -> SitewalkResult<Vec<CourseCard>> {
        self.ensure_ready()?;
        self.regions(&Self::COURSE)
    }

    /// Card of the course named `name`
    pub fn course(&self, name: &str) -> SitewalkResult<CourseCard> {
        for card in self.courses()? {
            if card.name()? == name {
                return Ok(card);
            }
        }
        Err(SitewalkError::ElementNotFound {
            locator: format!("course card named '{name}'"),
        })
    }
}

impl Page for TutorDashboard {
    const PRODUCT: Product = Product::Tutor;
    const URL_TEMPLATE: &'static str = "/dashboard";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        let cards = self.find_all(&Self::COURSE)?;
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

/// One course on the dashboard
#[derive(Debug)]
pub struct CourseCard {
    scope: Scope,
}

impl CourseCard {
    const NAME: Locator = Locator::css(".course-name");
    const OPEN: Link<CoursePage> = Link::new(Locator::css("a.course-link"));

    /// Course name
    pub fn name(&self) -> SitewalkResult<String> {
        self.find(&Self::NAME)?.text()
    }

    /// Open the course
    pub fn open(&self) -> SitewalkResult<CoursePage> {
        self.follow(&Self::OPEN)
    }
}

impl Region for CourseCard {
    region_scope!();
}

/// A single course
#[derive(Debug)]
pub struct CoursePage {
    ctx: PageContext,
}

impl CoursePage {
    const NAME: Locator = Locator::css("h1.course-name");
    const DASHBOARD: Link<TutorDashboard> = Link::new(Locator::css("a.dashboard-link"));

    /// Unopened course page
    pub fn for_course(session: &Session, course_id: &str) -> Self {
        Self::with_params(session, UrlParams::new().with("course_id", course_id))
    }

    /// Course id from the URL
    pub fn course_id(&self) -> &str {
        self.context().params().get("course_id").unwrap_or_default()
    }

    /// Course name
    pub fn name(&self) -> SitewalkResult<String> {
        self.find(&Self::NAME)?.text()
    }

    /// Back to the dashboard
    pub fn back_to_dashboard(&self) -> SitewalkResult<TutorDashboard> {
        self.follow(&Self::DASHBOARD)
    }
}

impl Page for CoursePage {
    const PRODUCT: Product = Product::Tutor;
    const URL_TEMPLATE: &'static str = "/course/{course_id}";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        self.find(&Self::NAME)?.is_displayed()
    }
}
