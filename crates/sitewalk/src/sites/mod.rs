//! Page objects for the four products.
//!
//! Pages link to each other across modules (the marketing nav leads to
//! accounts, accounts returns to whatever page the login started from);
//! the edges are typed [`Link`](crate::nav::Link) constants, so cycles need
//! no registry.

pub mod accounts;
pub mod payments;
pub mod tutor;
pub mod web;

pub use accounts::{AccountsLogin, Profile};
pub use payments::{OrderRow, Orders, PaymentsAdmin};
pub use tutor::{CourseCard, CoursePage, TutorDashboard, TutorHome};
pub use web::{BookCard, BookDetails, OrderOptions, Subjects, WebHome, WebNav};
