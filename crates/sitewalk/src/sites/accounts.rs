//! Accounts: login and profile.

use crate::config::{Credentials, Product};
use crate::locator::Locator;
use crate::page::{page_context, Page, PageContext};
use crate::result::{SitewalkError, SitewalkResult};

/// Login form
#[derive(Debug)]
pub struct AccountsLogin {
    ctx: PageContext,
}

/// What the browser showed after submitting the login form
enum LoginOutcome {
    Left,
    Rejected(String),
}

impl AccountsLogin {
    const FORM: Locator = Locator::id("login-form");
    const USERNAME: Locator = Locator::name("username");
    const PASSWORD: Locator = Locator::name("password");
    const SUBMIT: Locator = Locator::css("#login-form button[type='submit']");
    const ERROR: Locator = Locator::css("#login-form .login-error");
    const FACEBOOK: Locator = Locator::css("a.social-login.facebook");
    const GOOGLE: Locator = Locator::css("a.social-login.google");

    /// Log in and land on the profile page
    pub fn log_in(self, credentials: &Credentials) -> SitewalkResult<Profile> {
        self.log_in_to::<Profile>(credentials)
    }

    /// Log in and land on `D`, the page the login was started from.
    ///
    /// Rejected credentials fail with
    /// [`SitewalkError::UnexpectedDestination`] naming the form's error.
    pub fn log_in_to<D: Page>(self, credentials: &Credentials) -> SitewalkResult<D> {
        self.submit(credentials)?;
        match self.await_outcome()? {
            LoginOutcome::Left => D::arrive(self.session()),
            LoginOutcome::Rejected(message) => {
                tracing::warn!(user = %credentials.username, %message, "login rejected");
                Err(SitewalkError::UnexpectedDestination {
                    expected: D::page_name().to_string(),
                    actual: format!("{} (login error: {message})", self.session().current_url()?),
                })
            }
        }
    }

    /// Submit credentials that should be rejected and return the login page
    /// showing the error
    pub fn log_in_expecting_error(self, credentials: &Credentials) -> SitewalkResult<Self> {
        self.submit(credentials)?;
        match self.await_outcome()? {
            LoginOutcome::Rejected(_) => Self::arrive(self.session()),
            LoginOutcome::Left => Err(SitewalkError::assertion(format!(
                "expected login as {} to be rejected",
                credentials.username
            ))),
        }
    }

    /// Error shown by the form, if any
    pub fn error_message(&self) -> SitewalkResult<Option<String>> {
        let errors = self.find_all(&Self::ERROR)?;
        for error in errors {
            if error.is_displayed()? {
                return Ok(Some(error.text()?));
            }
        }
        Ok(None)
    }

    /// Whether the social sign-in buttons are shown
    pub fn has_social_login(&self) -> SitewalkResult<bool> {
        Ok(self.find(&Self::FACEBOOK)?.is_displayed()? && self.find(&Self::GOOGLE)?.is_displayed()?)
    }

    fn submit(&self, credentials: &Credentials) -> SitewalkResult<()> {
        self.ensure_ready()?;
        tracing::info!(user = %credentials.username, "logging in");
        self.find(&Self::USERNAME)?.fill(&credentials.username)?;
        self.find(&Self::PASSWORD)?.fill(&credentials.password)?;
        self.find(&Self::SUBMIT)?.click()
    }

    /// Wait until the form is gone or shows an error. A successful login
    /// replaces the document, so this page's lookups go stale.
    fn await_outcome(&self) -> SitewalkResult<LoginOutcome> {
        let (outcome, _) = self
            .session()
            .waiter()
            .wait_for_value("the login to complete", || match self.error_message() {
                Ok(Some(message)) => Ok(Some(LoginOutcome::Rejected(message))),
                Ok(None) => Ok(None),
                Err(SitewalkError::StaleElement { .. }) => self.rejected_after_rerender(),
                Err(e) => Err(e),
            })?;
        Ok(outcome)
    }

    /// The page was replaced; it may be the login page again with an error
    fn rejected_after_rerender(&self) -> SitewalkResult<Option<LoginOutcome>> {
        let session = self.session();
        for error in session.find_all(&Self::ERROR)? {
            if error.is_displayed()? {
                return Ok(Some(LoginOutcome::Rejected(error.text()?)));
            }
        }
        if session.find_all(&Self::FORM)?.is_empty() {
            Ok(Some(LoginOutcome::Left))
        } else {
            Ok(None)
        }
    }
}

impl Page for AccountsLogin {
    const PRODUCT: Product = Product::Accounts;
    const URL_TEMPLATE: &'static str = "/login";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        Ok(self.find(&Self::FORM)?.is_displayed()? && self.find(&Self::USERNAME)?.is_displayed()?)
    }
}

/// Profile of the signed-in user
#[derive(Debug)]
pub struct Profile {
    ctx: PageContext,
}

impl Profile {
    const NAME: Locator = Locator::css("#profile h1.name");
    const USERNAME: Locator = Locator::css("#profile .username");
    const LOG_OUT: Locator = Locator::id("log-out");

    /// Display name
    pub fn name(&self) -> SitewalkResult<String> {
        self.find(&Self::NAME)?.text()
    }

    /// Login name
    pub fn username(&self) -> SitewalkResult<String> {
        self.find(&Self::USERNAME)?.text()
    }

    /// Log out and return to the login page
    pub fn log_out(self) -> SitewalkResult<AccountsLogin> {
        self.ensure_ready()?;
        self.find(&Self::LOG_OUT)?.click()?;
        AccountsLogin::arrive(self.session())
    }
}

impl Page for Profile {
    const PRODUCT: Product = Product::Accounts;
    const URL_TEMPLATE: &'static str = "/profile";

    page_context!();

    fn loaded(&self) -> SitewalkResult<bool> {
        self.find(&Self::NAME)?.is_displayed()
    }
}
