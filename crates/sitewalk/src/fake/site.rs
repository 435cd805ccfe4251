//! Server side of the fake browser: routes that render documents and
//! actions that run when buttons are clicked.

use super::dom::{Document, Node};
use crate::result::SitewalkResult;
use crate::template::{UrlParams, UrlTemplate};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Server-side state shared by all windows of one browser, such as who is
/// logged in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteState(BTreeMap<String, String>);

impl SiteState {
    /// Value of a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether a key is set
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Set a key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a key
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }
}

/// A request being routed
#[derive(Debug)]
pub struct Request<'a> {
    /// Requested URL
    pub url: &'a Url,
    /// Parameters captured by the route template
    pub params: &'a UrlParams,
    /// Server-side state
    pub state: &'a SiteState,
}

impl Request<'_> {
    /// A captured path parameter
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// First value of a query parameter
    #[must_use]
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// What a route answers with
#[derive(Debug, Clone)]
pub enum Response {
    /// A document with a title and body content
    Page {
        /// Document title
        title: String,
        /// Body content
        body: Node,
    },
    /// Redirect to another URL, absolute or relative to the request
    Redirect(String),
    /// No such page
    NotFound,
}

impl Response {
    /// A document
    #[must_use]
    pub fn page(title: &str, body: Node) -> Self {
        Self::Page {
            title: title.to_string(),
            body,
        }
    }

    /// A redirect
    #[must_use]
    pub fn redirect(to: impl Into<String>) -> Self {
        Self::Redirect(to.into())
    }
}

type RouteFn = Arc<dyn Fn(&Request<'_>) -> Response + Send + Sync>;
type ActionFn = Arc<dyn Fn(&mut ActionContext<'_>) -> SitewalkResult<()> + Send + Sync>;

struct Route {
    base: String,
    template: Result<UrlTemplate, String>,
    handler: RouteFn,
}

/// Routes and actions of a fake web application
#[derive(Default, Clone)]
pub struct FakeSite {
    routes: Vec<Arc<Route>>,
    actions: HashMap<String, ActionFn>,
}

impl fmt::Debug for FakeSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeSite")
            .field("routes", &self.routes.len())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FakeSite {
    /// Site with no routes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `template` under `base`. Earlier routes win.
    #[must_use]
    pub fn route<F>(mut self, base: &str, template: &str, handler: F) -> Self
    where
        F: Fn(&Request<'_>) -> Response + Send + Sync + 'static,
    {
        self.routes.push(Arc::new(Route {
            base: base.trim_end_matches('/').to_string(),
            template: UrlTemplate::parse(template).map_err(|e| e.to_string()),
            handler: Arc::new(handler),
        }));
        self
    }

    /// Run `handler` when an element with `data-action="name"` is clicked
    #[must_use]
    pub fn action<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut ActionContext<'_>) -> SitewalkResult<()> + Send + Sync + 'static,
    {
        self.actions.insert(name.to_string(), Arc::new(handler));
        self
    }

    /// Merge another site's routes and actions into this one
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.routes.extend(other.routes);
        self.actions.extend(other.actions);
        self
    }

    /// Templates that failed to parse
    pub(crate) fn invalid_routes(&self) -> Vec<String> {
        self.routes
            .iter()
            .filter_map(|r| r.template.as_ref().err().cloned())
            .collect()
    }

    pub(crate) fn respond(&self, url: &Url, state: &SiteState) -> Response {
        for route in &self.routes {
            let Ok(template) = &route.template else {
                continue;
            };
            if let Some(params) = template.match_url(&route.base, url.as_str()) {
                let request = Request {
                    url,
                    params: &params,
                    state,
                };
                return (route.handler)(&request);
            }
        }
        Response::NotFound
    }

    pub(crate) fn action_handler(&self, name: &str) -> Option<ActionFn> {
        self.actions.get(name).cloned()
    }
}

/// Follow-up of an action once its handler returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Navigate(String),
    Reload,
}

/// What an action handler can see and change
#[derive(Debug)]
pub struct ActionContext<'a> {
    pub(crate) document: &'a mut Document,
    pub(crate) state: &'a mut SiteState,
    pub(crate) url: &'a Url,
    pub(crate) target: usize,
    pub(crate) effect: Option<Effect>,
}

impl ActionContext<'_> {
    /// URL of the page the action ran on
    #[must_use]
    pub fn url(&self) -> &Url {
        self.url
    }

    /// Current value of the named input
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        self.document.field(name)
    }

    /// Attribute of the element carrying `data-action`
    #[must_use]
    pub fn target_attribute(&self, name: &str) -> Option<String> {
        self.document.attribute(self.target, name)
    }

    /// Server-side state
    #[must_use]
    pub fn state(&self) -> &SiteState {
        self.state
    }

    /// Server-side state, mutably
    pub fn state_mut(&mut self) -> &mut SiteState {
        self.state
    }

    /// Load `url` (absolute or relative) after the handler returns
    pub fn navigate(&mut self, url: impl Into<String>) {
        self.effect = Some(Effect::Navigate(url.into()));
    }

    /// Re-render the current URL after the handler returns
    pub fn reload(&mut self) {
        self.effect = Some(Effect::Reload);
    }

    /// Show or hide the element with `id` without re-rendering.
    /// Returns false if there is no such element.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> bool {
        let Some(index) = self.document.by_id(id) else {
            return false;
        };
        if let Some(node) = self.document.node_mut(index) {
            node.hidden = hidden;
            node.reveal_at = None;
        }
        true
    }

    /// Flip the visibility of the element with `id`
    pub fn toggle(&mut self, id: &str) -> bool {
        let hidden = self
            .document
            .by_id(id)
            .and_then(|i| self.document.node(i))
            .is_some_and(|n| n.hidden);
        self.set_hidden(id, !hidden)
    }

    /// Replace the own text of the element with `id`
    pub fn set_text(&mut self, id: &str, text: &str) -> bool {
        let Some(node) = self.document.by_id(id).and_then(|i| self.document.node_mut(i)) else {
            return false;
        };
        node.text = text.to_string();
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_site_state() {
        let mut state = SiteState::default();
        state.set("user", "ada");
        assert!(state.contains("user"));
        assert_eq!(state.get("user"), Some("ada"));
        assert_eq!(state.remove("user").as_deref(), Some("ada"));
        assert!(!state.contains("user"));
    }

    #[test]
    fn test_first_matching_route_wins() {
        let site = FakeSite::new()
            .route("https://example.org", "/books/{slug}", |req| {
                Response::page(req.param("slug").unwrap_or_default(), Node::new("p"))
            })
            .route("https://example.org", "/books/{other}", |_| Response::NotFound);
        let url = Url::parse("https://example.org/books/physics?x=1").unwrap();
        match site.respond(&url, &SiteState::default()) {
            Response::Page { title, .. } => assert_eq!(title, "physics"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unrouted_is_not_found() {
        let site = FakeSite::new().route("https://example.org", "/", |_| Response::NotFound);
        let url = Url::parse("https://other.example.org/").unwrap();
        assert!(matches!(site.respond(&url, &SiteState::default()), Response::NotFound));
    }

    #[test]
    fn test_query_parameter() {
        let site = FakeSite::new().route("https://example.org", "/search", |req| {
            Response::page(&req.query("q").unwrap_or_default(), Node::new("p"))
        });
        let url = Url::parse("https://example.org/search?q=biology").unwrap();
        match site.respond(&url, &SiteState::default()) {
            Response::Page { title, .. } => assert_eq!(title, "biology"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_template_reported() {
        let site = FakeSite::new().route("https://example.org", "/books/{", |_| Response::NotFound);
        assert_eq!(site.invalid_routes().len(), 1);
    }
}
