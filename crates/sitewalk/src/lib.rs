//! Sitewalk: page-object browser tests for a family of web products
//!
//! Scenarios are written against typed page objects. A page knows its URL
//! template and how to tell it has finished loading; a region is a scoped
//! part of a page whose root is resolved lazily; links between pages are
//! typed, so following one yields the destination page already verified
//! as loaded.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Suite        │──►│ Scenario     │──►│ Page/Region  │──►│ Driver       │
//! │ (markers,    │   │ bodies       │   │ objects      │   │ fake or      │
//! │  report)     │   │              │   │              │   │ chromium     │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! The [`FakeBrowser`] driver runs every bundled scenario offline against
//! an in-memory rendition of the products ([`fake::demo`]). Enable the
//! `browser` feature for [`chromium::ChromiumDriver`].

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Scenario assertions
pub mod assertion;
/// Chromium over CDP
#[cfg(all(feature = "browser", not(target_arch = "wasm32")))]
pub mod chromium;
/// Suite configuration
pub mod config;
/// Browser driver abstraction
pub mod driver;
/// In-memory browser and demo site
pub mod fake;
/// Scenario registry and runner
pub mod harness;
/// Element locators
pub mod locator;
/// Typed links between pages
pub mod nav;
/// Page objects
pub mod page;
/// Region objects
pub mod region;
mod result;
/// Browser session and element handles
pub mod session;
/// Page objects for the products
pub mod sites;
/// Bundled scenarios
pub mod suite;
/// URL templates
pub mod template;
/// Polling waits
pub mod wait;

pub use assertion::{ensure, ensure_contains, ensure_eq, ensure_len, AssertionResult};
#[cfg(all(feature = "browser", not(target_arch = "wasm32")))]
pub use chromium::{ChromiumDriver, ChromiumOptions, ChromiumSessionFactory};
pub use config::{parse_systems, Credentials, Instance, Product, Role, SuiteConfig};
pub use driver::{Driver, ElementId, WindowSize};
pub use fake::{FakeBrowser, FakeSite};
pub use harness::{
    Diagnostics, FakeSessionFactory, Marker, MarkerFilter, Outcome, Scenario, ScenarioResult,
    SessionFactory, Suite, SuiteReport,
};
pub use locator::{Locator, Strategy};
pub use nav::{Destination, Link};
pub use page::{Page, PageContext, PageState};
pub use region::{Region, Scope};
pub use result::{SitewalkError, SitewalkResult};
pub use session::{Element, Session};
pub use template::{UrlParams, UrlTemplate};
pub use wait::{LoadState, WaitOptions, WaitResult, Waiter};

/// Prelude for writing pages and scenarios
pub mod prelude {
    pub use super::assertion::*;
    pub use super::config::{Credentials, Product, Role, SuiteConfig};
    pub use super::driver::{Driver, WindowSize};
    pub use super::locator::{Locator, Strategy};
    pub use super::nav::{Destination, Link};
    pub use super::page::{Page, PageContext};
    pub use super::region::{Region, Scope};
    pub use super::result::{SitewalkError, SitewalkResult};
    pub use super::session::{Element, Session};
}
