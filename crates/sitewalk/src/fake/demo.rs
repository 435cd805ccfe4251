//! Demo deployment of the four products for offline runs.
//!
//! The pages mirror the structure the page objects in
//! [`sites`](crate::sites) expect, including the awkward parts: delayed
//! content, a navigation menu that collapses on narrow windows, retailer
//! links that open new windows, and login redirects across products.

use super::dom::Node;
use super::site::{ActionContext, FakeSite, Request, Response, SiteState};
use crate::config::{Credentials, Product, Role, SuiteConfig};
use crate::result::{SitewalkError, SitewalkResult};
use std::collections::BTreeMap;
use std::time::Duration;
use url::form_urlencoded;

/// Delay before the marketing hero banner shows
pub const HERO_DELAY: Duration = Duration::from_millis(30);

/// Delay before dashboard course cards show
pub const COURSES_DELAY: Duration = Duration::from_millis(40);

/// Text of the login form error
pub const LOGIN_ERROR: &str = "Incorrect username or password";

struct DemoUser {
    username: &'static str,
    password: &'static str,
    name: &'static str,
    role: Role,
}

static USERS: [DemoUser; 3] = [
    DemoUser {
        username: "student01",
        password: "password",
        name: "Sam Student",
        role: Role::Student,
    },
    DemoUser {
        username: "teacher01",
        password: "password",
        name: "Terry Teacher",
        role: Role::Teacher,
    },
    DemoUser {
        username: "admin",
        password: "password",
        name: "Avery Admin",
        role: Role::Admin,
    },
];

struct Book {
    slug: &'static str,
    title: &'static str,
    subject: &'static str,
    isbn: &'static str,
    print: bool,
}

static SUBJECTS: [(&str, &str); 2] = [("math", "Math"), ("science", "Science")];

// Listed in catalog order, which is not alphabetical
static BOOKS: [Book; 4] = [
    Book {
        slug: "college-algebra",
        title: "College Algebra",
        subject: "math",
        isbn: "1938168380",
        print: true,
    },
    Book {
        slug: "calculus-volume-1",
        title: "Calculus Volume 1",
        subject: "math",
        isbn: "1938168024",
        print: true,
    },
    Book {
        slug: "college-physics",
        title: "College Physics",
        subject: "science",
        isbn: "1938168003",
        print: true,
    },
    Book {
        slug: "biology-2e",
        title: "Biology 2e",
        subject: "science",
        isbn: "1947172514",
        print: false,
    },
];

static COURSES: [(&str, &str); 2] = [("1", "Physics 101"), ("2", "Biology 201")];

static ORDERS: [(&str, &str, &str); 4] = [
    ("1001", "Ada Lovelace", "shipped"),
    ("1002", "Grace Hopper", "pending"),
    ("1003", "Alan Turing", "refunded"),
    ("1004", "Ada Yonath", "pending"),
];

/// Credentials of the demo accounts
#[must_use]
pub fn credentials() -> BTreeMap<Role, Credentials> {
    USERS
        .iter()
        .map(|u| (u.role, Credentials::new(u.username, u.password)))
        .collect()
}

/// Fill in demo credentials for roles the configuration leaves unset
pub fn add_missing_credentials(config: &mut SuiteConfig) {
    for (role, creds) in credentials() {
        config.credentials.entry(role).or_insert(creds);
    }
}

/// Demo site serving every product at its configured base URL
pub fn site(config: &SuiteConfig) -> SitewalkResult<FakeSite> {
    let bases = Bases {
        web: config.base_url(Product::Web)?,
        accounts: config.base_url(Product::Accounts)?,
        tutor: config.base_url(Product::Tutor)?,
        payments: config.base_url(Product::Payments)?,
    };
    Ok(web(&bases)
        .merge(accounts(&bases))
        .merge(tutor(&bases))
        .merge(payments(&bases)))
}

#[derive(Debug, Clone)]
struct Bases {
    web: String,
    accounts: String,
    tutor: String,
    payments: String,
}

impl Bases {
    /// Accounts login that returns to `back` afterwards
    fn login_returning_to(&self, back: &str) -> String {
        let back: String = form_urlencoded::byte_serialize(back.as_bytes()).collect();
        format!("{}/login?r={back}", self.accounts)
    }
}

fn signed_in(state: &SiteState) -> Option<&'static DemoUser> {
    let username = state.get("user")?;
    USERS.iter().find(|u| u.username == username)
}

// =============================================================================
// Web
// =============================================================================

fn web(bases: &Bases) -> FakeSite {
    let login = format!("{}/login", bases.accounts);
    let home_login = login.clone();
    let subject_login = login;
    FakeSite::new()
        .route(&bases.web, "/", move |_| {
            Response::page(
                "Openly licensed textbooks",
                Node::new("div")
                    .child(main_nav(&home_login))
                    .child(
                        Node::new("section").id("hero").child(
                            Node::new("h1")
                                .text("Free textbooks for every student")
                                .reveal_after(HERO_DELAY),
                        ),
                    ),
            )
        })
        .route(&bases.web, "/subjects/{subject}", move |req| {
            let subject = req.param("subject");
            let Some((slug, name)) = SUBJECTS.iter().find(|(s, _)| Some(*s) == subject) else {
                return Response::NotFound;
            };
            let cards = BOOKS.iter().filter(|b| b.subject == *slug).map(|b| {
                Node::new("div")
                    .class("book-card")
                    .child(
                        Node::link(&format!("/details/books/{}", b.slug), b.title)
                            .class("book-title"),
                    )
            });
            Response::page(
                name,
                Node::new("div")
                    .child(main_nav(&subject_login))
                    .child(Node::new("h1").text(name))
                    .child(Node::new("div").class("books").children(cards)),
            )
        })
        .route(&bases.web, "/details/books/{slug}", |req| {
            let Some(book) = BOOKS.iter().find(|b| Some(b.slug) == req.param("slug")) else {
                return Response::NotFound;
            };
            Response::page(book.title, book_details(book))
        })
        .action("toggle-menu", |ctx: &mut ActionContext<'_>| {
            ctx.toggle("mobile-menu");
            Ok(())
        })
}

fn main_nav(login: &str) -> Node {
    let subject_links = || {
        SUBJECTS.iter().map(|(slug, name)| {
            Node::new("li").child(Node::link(&format!("/subjects/{slug}"), name).class("subject"))
        })
    };
    Node::new("nav")
        .class("main-nav")
        .child(Node::link("/", "Home").class("brand"))
        .child(
            Node::new("ul")
                .class("subjects-menu")
                .children(subject_links())
                .wide_only(),
        )
        .child(
            Node::button("toggle-menu", "Menu")
                .id("menu-toggle")
                .narrow_only(),
        )
        .child(
            Node::new("ul")
                .id("mobile-menu")
                .children(subject_links())
                .narrow_only()
                .hidden(),
        )
        .child(Node::link(login, "Log in").class("login"))
}

fn book_details(book: &Book) -> Node {
    let mut options = Node::new("div").id("order-options");
    if book.print {
        options = options.child(
            Node::link(&format!("https://www.amazon.com/dp/{}", book.isbn), "Order a print copy")
                .class("buy-print")
                .attr("target", "_blank"),
        );
    }
    options = options
        .child(
            Node::link(
                &format!("https://www.amazon.com/kindle-dbs/product/{}", book.isbn),
                "Kindle",
            )
            .class("buy-kindle")
            .attr("target", "_blank"),
        )
        .child(
            Node::link(
                &format!("https://www.bookshare.org/search?keyword={}", book.isbn),
                "Bookshare",
            )
            .class("bookshare")
            .attr("target", "_blank"),
        );

    Node::new("main")
        .child(Node::new("h1").class("book-title").text(book.title))
        .child(
            Node::link(&format!("/subjects/{}", book.subject), "Back to subject")
                .class("subject-link"),
        )
        .child(options)
}

// =============================================================================
// Accounts
// =============================================================================

fn accounts(bases: &Bases) -> FakeSite {
    FakeSite::new()
        .route(&bases.accounts, "/login", |_| {
            Response::page(
                "Log in",
                Node::new("div")
                    .child(
                        Node::new("form")
                            .id("login-form")
                            .child(Node::input("text", "username"))
                            .child(Node::input("password", "password"))
                            .child(Node::new("p").id("login-error").class("login-error").hidden())
                            .child(
                                Node::new("button")
                                    .attr("type", "submit")
                                    .action("log-in")
                                    .text("Log in"),
                            ),
                    )
                    .child(
                        Node::new("div")
                            .class("social")
                            .child(
                                Node::link("/auth/facebook", "Facebook")
                                    .class("social-login")
                                    .class("facebook"),
                            )
                            .child(
                                Node::link("/auth/google", "Google")
                                    .class("social-login")
                                    .class("google"),
                            ),
                    ),
            )
        })
        .route(&bases.accounts, "/profile", |req: &Request<'_>| {
            let Some(user) = signed_in(req.state) else {
                return Response::redirect("/login");
            };
            Response::page(
                "Profile",
                Node::new("div").id("profile").children([
                    Node::new("h1").class("name").text(user.name),
                    Node::new("span").class("username").text(user.username),
                    Node::button("log-out", "Log out").id("log-out"),
                ]),
            )
        })
        .action("log-in", log_in)
        .action("log-out", |ctx: &mut ActionContext<'_>| {
            ctx.state_mut().remove("user");
            ctx.navigate("/login");
            Ok(())
        })
}

fn log_in(ctx: &mut ActionContext<'_>) -> SitewalkResult<()> {
    let username = ctx.field("username").unwrap_or_default();
    let password = ctx.field("password").unwrap_or_default();
    let Some(user) = USERS
        .iter()
        .find(|u| u.username == username && u.password == password)
    else {
        if !(ctx.set_text("login-error", LOGIN_ERROR) && ctx.set_hidden("login-error", false)) {
            return Err(SitewalkError::driver("login form has no error element"));
        }
        return Ok(());
    };
    let back = ctx
        .url()
        .query_pairs()
        .find(|(k, _)| k == "r")
        .map(|(_, v)| v.into_owned());
    ctx.state_mut().set("user", user.username);
    ctx.navigate(back.unwrap_or_else(|| "/profile".to_string()));
    Ok(())
}

// =============================================================================
// Tutor
// =============================================================================

fn tutor(bases: &Bases) -> FakeSite {
    let dashboard = format!("{}/dashboard", bases.tutor);
    let home_login = bases.login_returning_to(&dashboard);
    let dashboard_login = home_login.clone();
    let course_login = home_login.clone();
    FakeSite::new()
        .route(&bases.tutor, "/", move |_| {
            Response::page(
                "Tutor",
                Node::new("div")
                    .child(Node::new("h1").text("Tutor"))
                    .child(Node::link(&home_login, "Log in").id("login")),
            )
        })
        .route(&bases.tutor, "/dashboard", move |req| {
            if signed_in(req.state).is_none() {
                return Response::redirect(dashboard_login.clone());
            }
            let cards = COURSES.iter().map(|(id, name)| {
                Node::new("div")
                    .class("course-card")
                    .reveal_after(COURSES_DELAY)
                    .child(Node::new("h2").class("course-name").text(name))
                    .child(Node::link(&format!("/course/{id}"), "Open").class("course-link"))
            });
            Response::page(
                "Dashboard",
                Node::new("div")
                    .child(Node::new("h1").text("Dashboard"))
                    .child(Node::new("div").class("courses").children(cards)),
            )
        })
        .route(&bases.tutor, "/course/{course_id}", move |req| {
            if signed_in(req.state).is_none() {
                return Response::redirect(course_login.clone());
            }
            let course_id = req.param("course_id");
            let Some((_, name)) = COURSES.iter().find(|(id, _)| Some(*id) == course_id) else {
                return Response::NotFound;
            };
            Response::page(
                name,
                Node::new("main")
                    .child(Node::new("h1").class("course-name").text(name))
                    .child(Node::link("/dashboard", "Dashboard").class("dashboard-link")),
            )
        })
}

// =============================================================================
// Payments
// =============================================================================

fn payments(bases: &Bases) -> FakeSite {
    let admin_login = bases.login_returning_to(&format!("{}/admin", bases.payments));
    let orders_login = bases.login_returning_to(&format!("{}/admin/orders", bases.payments));
    FakeSite::new()
        .route(&bases.payments, "/admin", move |req| {
            if let Some(response) = require_admin(req, &admin_login) {
                return response;
            }
            Response::page(
                "Payments admin",
                Node::new("div")
                    .child(
                        Node::new("nav")
                            .class("admin-nav")
                            .child(Node::link("/admin/orders", "Orders").id("orders-link")),
                    )
                    .child(Node::new("h1").text("Payments")),
            )
        })
        .route(&bases.payments, "/admin/orders", move |req| {
            if let Some(response) = require_admin(req, &orders_login) {
                return response;
            }
            let term = req.query("q").unwrap_or_default();
            Response::page("Orders", orders_page(&term))
        })
        .action("search-orders", |ctx: &mut ActionContext<'_>| {
            let term = ctx.field("q").unwrap_or_default();
            if term.trim().is_empty() {
                ctx.navigate("/admin/orders");
            } else {
                let encoded: String =
                    form_urlencoded::byte_serialize(term.trim().as_bytes()).collect();
                ctx.navigate(format!("/admin/orders?q={encoded}"));
            }
            Ok(())
        })
}

/// Login redirect for anonymous visitors, a refusal for non-admins
fn require_admin(req: &Request<'_>, login: &str) -> Option<Response> {
    match signed_in(req.state) {
        None => Some(Response::redirect(login)),
        Some(user) if user.role != Role::Admin => Some(Response::page(
            "Forbidden",
            Node::new("h1").text("You are not allowed to see this page"),
        )),
        Some(_) => None,
    }
}

fn orders_page(term: &str) -> Node {
    let needle = term.trim().to_lowercase();
    let rows = ORDERS
        .iter()
        .filter(|(id, customer, _)| {
            needle.is_empty() || id.contains(&needle) || customer.to_lowercase().contains(&needle)
        })
        .map(|(id, customer, status)| {
            Node::new("tr").children([
                Node::new("td").class("order-id").text(id),
                Node::new("td").class("customer").text(customer),
                Node::new("td").class("status").text(status),
            ])
        });

    Node::new("div")
        .child(
            Node::new("form").class("order-search").children([
                Node::input("text", "q").attr("value", term.trim()),
                Node::button("search-orders", "Search"),
            ]),
        )
        .child(
            Node::new("table").id("orders").children([
                Node::new("thead").child(Node::new("tr").children([
                    Node::new("th").text("Order"),
                    Node::new("th").text("Customer"),
                    Node::new("th").text("Status"),
                ])),
                Node::new("tbody").children(rows),
            ]),
        )
}
