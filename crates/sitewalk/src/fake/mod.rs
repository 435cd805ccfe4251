//! In-memory browser and web application.
//!
//! [`FakeBrowser`] implements [`Driver`](crate::Driver) over a tiny DOM
//! served by a [`FakeSite`]: routes render documents, buttons run actions.
//! It models what the page layer depends on (render generations, element
//! visibility, delayed content, layout breakpoints, windows) and nothing
//! else. [`demo`] builds a site for the four products that the bundled
//! scenarios run against offline.

mod browser;
pub mod demo;
mod dom;
mod selector;
mod site;

pub use browser::{FakeBrowser, NOT_FOUND_TITLE};
pub use dom::{Layout, Node, NARROW_BREAKPOINT};
pub use site::{ActionContext, FakeSite, Request, Response, SiteState};
