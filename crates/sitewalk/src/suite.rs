//! Built-in scenarios for the four products.

use crate::assertion::{ensure, ensure_contains, ensure_eq, ensure_len};
use crate::config::{Credentials, Product, Role};
use crate::driver::WindowSize;
use crate::harness::{Marker, Scenario};
use crate::nav::Destination;
use crate::page::Page;
use crate::region::Region;
use crate::result::{SitewalkError, SitewalkResult};
use crate::session::Session;
use crate::sites::{
    AccountsLogin, BookDetails, PaymentsAdmin, Subjects, TutorDashboard, TutorHome, WebHome,
};

/// Every implemented scenario
#[must_use]
pub fn catalog() -> Vec<Scenario> {
    vec![
        // web
        Scenario::new("home page loads", Product::Web, home_page_loads)
            .test_case("C1001")
            .marker(Marker::Smoke)
            .marker(Marker::Nondestructive),
        Scenario::new("nav login link reaches accounts", Product::Web, nav_login_link)
            .test_case("C1002")
            .marker(Marker::Nondestructive),
        Scenario::new("mobile menu opens", Product::Web, mobile_menu_opens)
            .test_case("C1003")
            .marker(Marker::Nondestructive),
        Scenario::new("subject lists its books", Product::Web, subject_lists_books)
            .test_case("C1004")
            .marker(Marker::Nondestructive),
        Scenario::new("book details round trip", Product::Web, book_details_round_trip)
            .test_case("C1005")
            .marker(Marker::Nondestructive),
        Scenario::new("print copy is sold on Amazon", Product::Web, print_copy_on_amazon)
            .test_case("C1006")
            .marker(Marker::Nondestructive),
        Scenario::new("books are listed alphabetically", Product::Web, books_sorted)
            .test_case("C1007")
            .marker(Marker::Nondestructive)
            .expected_failure("books are listed in curriculum order"),
        // accounts
        Scenario::new("login page loads", Product::Accounts, login_page_loads)
            .test_case("C2001")
            .marker(Marker::Smoke)
            .marker(Marker::Nondestructive),
        Scenario::new("student logs in and out", Product::Accounts, student_logs_in_and_out)
            .test_case("C2002"),
        Scenario::new("bad password shows an error", Product::Accounts, bad_password)
            .test_case("C2003")
            .marker(Marker::Nondestructive),
        Scenario::new("social sign-in is offered", Product::Accounts, social_buttons)
            .test_case("C2004")
            .marker(Marker::Social)
            .marker(Marker::Nondestructive),
        Scenario::new("facebook login", Product::Accounts, facebook_login)
            .test_case("C2005")
            .marker(Marker::Social)
            .skip("third-party sign-in pages are not automated"),
        // tutor
        Scenario::new("student sees dashboard", Product::Tutor, student_dashboard)
            .test_case("C3001")
            .marker(Marker::Smoke),
        Scenario::new("open course and come back", Product::Tutor, open_course_and_return)
            .test_case("C3002"),
        // payments
        Scenario::new("admin lists orders", Product::Payments, admin_lists_orders)
            .test_case("C4001")
            .marker(Marker::Smoke),
        Scenario::new("order search filters rows", Product::Payments, order_search)
            .test_case("C4002"),
    ]
}

/// Visit `D`, get bounced to the login page, and log in as `role`
fn log_in_as<D: Page>(session: &Session, role: Role) -> SitewalkResult<D> {
    let credentials = session.config().credentials(role)?.clone();
    session.navigate(&D::new(session).url()?)?;
    AccountsLogin::arrive(session)?.log_in_to::<D>(&credentials)
}

// =============================================================================
// Web
// =============================================================================

fn home_page_loads(session: &Session) -> SitewalkResult<()> {
    let home = WebHome::new(session).open()?;
    ensure(!home.headline()?.is_empty(), "hero headline is empty")?;
    ensure(home.nav()?.is_displayed(), "navigation bar is hidden")
}

fn nav_login_link(session: &Session) -> SitewalkResult<()> {
    let login = WebHome::new(session).open()?.nav()?.log_in()?;
    ensure(login.is_displayed(), "login form is not shown")
}

fn mobile_menu_opens(session: &Session) -> SitewalkResult<()> {
    session.resize_window(WindowSize::PHONE)?;
    let home = WebHome::new(session).open()?;
    let nav = home.nav()?;
    ensure(nav.is_collapsed(), "menu should collapse on a phone")?;
    ensure(!nav.is_menu_open(), "collapsed menu should start closed")?;

    let nav = nav.open_menu()?;
    ensure(nav.subjects()?.iter().any(|s| s == "Math"), "Math missing from the menu")?;

    session.resize_window(WindowSize::DESKTOP)?;
    ensure(!nav.is_collapsed(), "menu should expand on a desktop")?;
    ensure(nav.is_menu_open(), "desktop menu should be visible")
}

fn subject_lists_books(session: &Session) -> SitewalkResult<()> {
    let subjects = WebHome::new(session)
        .open()?
        .nav()?
        .go_to_subject("Math")?;
    ensure_eq(&subjects.subject(), &"math", "subject in URL")?;
    ensure_len(&subjects.books()?, 2, "math books")
}

fn book_details_round_trip(session: &Session) -> SitewalkResult<()> {
    let subjects = Subjects::for_subject(session, "math").open()?;
    let details = subjects.book("College Algebra")?.view_details()?;
    ensure_eq(&details.slug(), &"college-algebra", "book slug")?;
    ensure_eq(&details.title()?, &"College Algebra".to_string(), "book title")?;

    match subjects.books() {
        Err(SitewalkError::StaleElement { .. }) => {}
        other => {
            return Err(SitewalkError::assertion(format!(
                "subject page should be stale after leaving it, got {other:?}"
            )))
        }
    }

    let back = details.back_to_subject()?;
    ensure_eq(&back.subject(), &"math", "subject after returning")
}

fn print_copy_on_amazon(session: &Session) -> SitewalkResult<()> {
    let details = BookDetails::for_book(session, "college-physics").open()?;
    let options = details.order_options()?;
    ensure(options.is_print_available(), "print copy should be offered")?;
    ensure_eq(&options.buy_print()?, &Destination::Amazon, "print retailer")?;
    ensure_eq(&options.buy_kindle()?, &Destination::Kindle, "ebook retailer")?;
    ensure(details.is_displayed(), "details page should stay open")
}

fn books_sorted(session: &Session) -> SitewalkResult<()> {
    let subjects = Subjects::for_subject(session, "math").open()?;
    let titles = subjects
        .books()?
        .iter()
        .map(|card| card.title())
        .collect::<SitewalkResult<Vec<_>>>()?;
    let mut sorted = titles.clone();
    sorted.sort();
    ensure_eq(&titles, &sorted, "book order")
}

// =============================================================================
// Accounts
// =============================================================================

fn login_page_loads(session: &Session) -> SitewalkResult<()> {
    let login = AccountsLogin::new(session).open()?;
    ensure(login.error_message()?.is_none(), "fresh login page shows an error")
}

fn student_logs_in_and_out(session: &Session) -> SitewalkResult<()> {
    let credentials = session.config().credentials(Role::Student)?.clone();
    let profile = AccountsLogin::new(session).open()?.log_in(&credentials)?;
    ensure_eq(&profile.username()?, &credentials.username, "profile username")?;
    let login = profile.log_out()?;
    ensure(login.error_message()?.is_none(), "logging out shows an error")
}

fn bad_password(session: &Session) -> SitewalkResult<()> {
    let student = session.config().credentials(Role::Student)?;
    let wrong = Credentials::new(student.username.clone(), format!("{}-wrong", student.password));
    let login = AccountsLogin::new(session)
        .open()?
        .log_in_expecting_error(&wrong)?;
    let message = login.error_message()?.unwrap_or_default();
    ensure_contains(&message, "Incorrect")
}

fn social_buttons(session: &Session) -> SitewalkResult<()> {
    let login = AccountsLogin::new(session).open()?;
    ensure(login.has_social_login()?, "social sign-in buttons are missing")
}

fn facebook_login(session: &Session) -> SitewalkResult<()> {
    let credentials = session.config().credentials(Role::Facebook)?.clone();
    AccountsLogin::new(session).open()?.log_in(&credentials)?;
    Ok(())
}

// =============================================================================
// Tutor
// =============================================================================

fn student_dashboard(session: &Session) -> SitewalkResult<()> {
    let credentials = session.config().credentials(Role::Student)?.clone();
    let dashboard = TutorHome::new(session).open()?.log_in(&credentials)?;
    ensure_len(&dashboard.courses()?, 2, "courses")
}

fn open_course_and_return(session: &Session) -> SitewalkResult<()> {
    let dashboard: TutorDashboard = log_in_as(session, Role::Student)?;
    let course = dashboard.course("Physics 101")?.open()?;
    ensure_eq(&course.course_id(), &"1", "course id")?;
    ensure_eq(&course.name()?, &"Physics 101".to_string(), "course name")?;
    let dashboard = course.back_to_dashboard()?;
    ensure_len(&dashboard.courses()?, 2, "courses after returning")
}

// =============================================================================
// Payments
// =============================================================================

fn admin_lists_orders(session: &Session) -> SitewalkResult<()> {
    let admin: PaymentsAdmin = log_in_as(session, Role::Admin)?;
    let orders = admin.go_to_orders()?;
    ensure(!orders.rows()?.is_empty(), "order list is empty")
}

fn order_search(session: &Session) -> SitewalkResult<()> {
    let admin: PaymentsAdmin = log_in_as(session, Role::Admin)?;
    let orders = admin.go_to_orders()?;
    let all = orders.rows()?.len();
    let orders = orders.search("Ada")?;
    let rows = orders.rows()?;
    ensure(!rows.is_empty() && rows.len() < all, "search should narrow the list")?;
    for row in rows {
        ensure_contains(&row.customer()?, "Ada")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_and_case_ids_are_unique() {
        let catalog = catalog();
        let names: HashSet<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        let ids: HashSet<_> = catalog.iter().filter_map(|s| s.test_case.as_deref()).collect();
        assert_eq!(names.len(), catalog.len());
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_catalog_covers_every_product() {
        let catalog = catalog();
        for product in Product::ALL {
            assert!(catalog.iter().any(|s| s.product == product), "{product}");
        }
    }

    #[test]
    fn test_social_scenarios_are_marked() {
        for scenario in catalog() {
            if scenario.name.contains("facebook") || scenario.name.contains("social") {
                assert!(scenario.markers.contains(&Marker::Social), "{}", scenario.name);
            }
        }
    }
}
