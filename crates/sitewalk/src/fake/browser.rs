//! [`FakeBrowser`]: a [`Driver`] over the in-memory DOM.

use super::dom::Document;
use super::selector::Query;
use super::site::{ActionContext, Effect, FakeSite, Response, SiteState};
use crate::driver::{Driver, ElementId, WindowSize};
use crate::locator::Locator;
use crate::result::{SitewalkError, SitewalkResult};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// Title of documents served for unrouted URLs
pub const NOT_FOUND_TITLE: &str = "Page not found";

#[derive(Debug)]
struct Window {
    handle: String,
    url: String,
    document: Document,
    generation: u64,
}

#[derive(Debug)]
struct BrowserState {
    windows: Vec<Window>,
    current: usize,
    next_window: u32,
    next_generation: u64,
    size: WindowSize,
    site_state: SiteState,
    history: Vec<String>,
}

impl BrowserState {
    fn window(&self) -> SitewalkResult<&Window> {
        self.windows
            .get(self.current)
            .ok_or_else(|| SitewalkError::driver("no current window"))
    }

    fn window_mut(&mut self) -> SitewalkResult<&mut Window> {
        self.windows
            .get_mut(self.current)
            .ok_or_else(|| SitewalkError::driver("no current window"))
    }

    fn open_window(&mut self) -> usize {
        self.next_window += 1;
        let generation = self.bump_generation();
        self.windows.push(Window {
            handle: format!("window-{}", self.next_window),
            url: "about:blank".to_string(),
            document: Document::blank(Instant::now()),
            generation,
        });
        self.windows.len() - 1
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Resolve an element id to a node index in the current window's render
    fn resolve(&self, element: &ElementId) -> SitewalkResult<usize> {
        let stale = || SitewalkError::StaleElement {
            handle: element.to_string(),
        };
        let mut parts = element.as_str().split(':');
        let (Some(handle), Some(generation), Some(index), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(SitewalkError::driver(format!("malformed element id '{element}'")));
        };
        let window = self.window()?;
        let generation: u64 = generation.parse().map_err(|_| stale())?;
        let index: usize = index.parse().map_err(|_| stale())?;
        if window.handle != handle
            || window.generation != generation
            || index >= window.document.len()
        {
            return Err(stale());
        }
        Ok(index)
    }

    fn element_id(&self, index: usize) -> SitewalkResult<ElementId> {
        let window = self.window()?;
        Ok(ElementId::new(format!(
            "{}:{}:{index}",
            window.handle, window.generation
        )))
    }

    /// Load `url` into the current window, following redirects
    fn load(&mut self, site: &FakeSite, url: &str) -> SitewalkResult<()> {
        let mut target = Url::parse(url).map_err(|e| SitewalkError::NavigationError {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        for _ in 0..MAX_REDIRECTS {
            let now = Instant::now();
            let document = match site.respond(&target, &self.site_state) {
                Response::Page { title, body } => Document::render(&title, Some(body), now),
                Response::NotFound => Document::render(NOT_FOUND_TITLE, None, now),
                Response::Redirect(to) => {
                    target = target.join(&to).map_err(|e| SitewalkError::NavigationError {
                        url: to.clone(),
                        message: e.to_string(),
                    })?;
                    continue;
                }
            };
            let generation = self.bump_generation();
            let window = self.window_mut()?;
            window.url = target.to_string();
            window.document = document;
            window.generation = generation;
            return Ok(());
        }
        Err(SitewalkError::NavigationError {
            url: url.to_string(),
            message: format!("more than {MAX_REDIRECTS} redirects"),
        })
    }

    fn absolute(&self, href: &str) -> SitewalkResult<String> {
        let base = Url::parse(&self.window()?.url)
            .or_else(|_| Url::parse("about:blank"))?;
        Ok(base.join(href)?.to_string())
    }
}

/// In-memory browser for tests and offline runs.
///
/// Every navigation or reload renders a new generation of the document;
/// element ids from older generations fail with
/// [`SitewalkError::StaleElement`]. Actions that only show, hide, or
/// retext elements keep the generation.
#[derive(Debug)]
pub struct FakeBrowser {
    site: Arc<FakeSite>,
    state: Mutex<BrowserState>,
}

impl FakeBrowser {
    /// Browser with one blank window
    #[must_use]
    pub fn new(site: Arc<FakeSite>) -> Self {
        let mut state = BrowserState {
            windows: Vec::new(),
            current: 0,
            next_window: 0,
            next_generation: 0,
            size: WindowSize::default(),
            site_state: SiteState::default(),
            history: Vec::new(),
        };
        state.open_window();
        Self {
            site,
            state: Mutex::new(state),
        }
    }

    /// Start with a given window size
    #[must_use]
    pub fn with_window_size(self, size: WindowSize) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.size = size;
        }
        self
    }

    /// Gestures performed so far, e.g. `navigate https://...`, `click a`
    pub fn history(&self) -> SitewalkResult<Vec<String>> {
        Ok(self.lock()?.history.clone())
    }

    /// Server-side state
    pub fn site_state(&self) -> SitewalkResult<SiteState> {
        Ok(self.lock()?.site_state.clone())
    }

    fn lock(&self) -> SitewalkResult<MutexGuard<'_, BrowserState>> {
        self.state
            .lock()
            .map_err(|_| SitewalkError::driver("fake browser state poisoned"))
    }

    /// Run `f` on a resolved element of the current render
    fn with_element<T>(
        &self,
        element: &ElementId,
        f: impl FnOnce(&BrowserState, &Document, usize) -> T,
    ) -> SitewalkResult<T> {
        let guard = self.lock()?;
        let state: &BrowserState = &guard;
        let index = state.resolve(element)?;
        let window = state.window()?;
        Ok(f(state, &window.document, index))
    }

    fn run_action(&self, state: &mut BrowserState, name: &str, index: usize) -> SitewalkResult<()> {
        let handler = self
            .site
            .action_handler(name)
            .ok_or_else(|| SitewalkError::driver(format!("no fake action named '{name}'")))?;
        let current = state.current;
        let window = state
            .windows
            .get_mut(current)
            .ok_or_else(|| SitewalkError::driver("no current window"))?;
        let url = Url::parse(&window.url)?;
        let mut ctx = ActionContext {
            document: &mut window.document,
            state: &mut state.site_state,
            url: &url,
            target: index,
            effect: None,
        };
        handler(&mut ctx)?;
        match ctx.effect.take() {
            Some(Effect::Navigate(to)) => {
                let to = url.join(&to)?.to_string();
                state.load(&self.site, &to)
            }
            Some(Effect::Reload) => state.load(&self.site, url.as_str()),
            None => Ok(()),
        }
    }
}

impl Driver for FakeBrowser {
    fn navigate(&self, url: &str) -> SitewalkResult<()> {
        let invalid = self.site.invalid_routes();
        if !invalid.is_empty() {
            return Err(SitewalkError::config(format!(
                "fake site has invalid routes: {}",
                invalid.join("; ")
            )));
        }
        let mut state = self.lock()?;
        state.history.push(format!("navigate {url}"));
        state.load(&self.site, url)
    }

    fn current_url(&self) -> SitewalkResult<String> {
        Ok(self.lock()?.window()?.url.clone())
    }

    fn page_source(&self) -> SitewalkResult<String> {
        Ok(self.lock()?.window()?.document.source())
    }

    fn title(&self) -> SitewalkResult<String> {
        Ok(self.lock()?.window()?.document.title.clone())
    }

    fn ready_state(&self) -> SitewalkResult<String> {
        Ok("complete".to_string())
    }

    fn find_elements(
        &self,
        scope: Option<&ElementId>,
        locator: &Locator,
    ) -> SitewalkResult<Vec<ElementId>> {
        let query = Query::from_locator(locator)?;
        let state = self.lock()?;
        let scope = scope.map(|s| state.resolve(s)).transpose()?;
        let window = state.window()?;
        window
            .document
            .select(scope, &query, state.size.width, Instant::now())
            .into_iter()
            .map(|index| state.element_id(index))
            .collect()
    }

    fn tag_name(&self, element: &ElementId) -> SitewalkResult<String> {
        self.with_element(element, |_, doc, i| {
            doc.node(i).map(|n| n.tag.clone()).unwrap_or_default()
        })
    }

    fn text(&self, element: &ElementId) -> SitewalkResult<String> {
        self.with_element(element, |state, doc, i| doc.text(i, state.size.width, Instant::now()))
    }

    fn attribute(&self, element: &ElementId, name: &str) -> SitewalkResult<Option<String>> {
        self.with_element(element, |_, doc, i| doc.attribute(i, name))
    }

    fn is_displayed(&self, element: &ElementId) -> SitewalkResult<bool> {
        self.with_element(element, |state, doc, i| {
            doc.is_displayed(i, state.size.width, Instant::now())
        })
    }

    fn click(&self, element: &ElementId) -> SitewalkResult<()> {
        let mut state = self.lock()?;
        let index = state.resolve(element)?;
        let window = state.window()?;
        let doc = &window.document;
        if !doc.is_displayed(index, state.size.width, Instant::now()) {
            return Err(SitewalkError::driver(format!("element not interactable: {element}")));
        }
        let tag = doc.node(index).map(|n| n.tag.clone()).unwrap_or_default();
        let action = doc
            .closest_with(index, "data-action")
            .and_then(|i| doc.attribute(i, "data-action").map(|name| (name, i)));
        let link = doc.closest_with(index, "href").and_then(|i| {
            let href = doc.attribute(i, "href")?;
            let blank = doc.attribute(i, "target").is_some_and(|t| t == "_blank");
            Some((href, blank))
        });
        state.history.push(format!("click {tag}"));

        if let Some((name, target)) = action {
            return self.run_action(&mut state, &name, target);
        }
        let Some((href, blank)) = link else {
            return Ok(());
        };
        let url = state.absolute(&href)?;
        if blank {
            let previous = state.current;
            let opened = state.open_window();
            state.current = opened;
            let loaded = state.load(&self.site, &url);
            state.current = previous;
            if loaded.is_err() {
                state.windows.remove(opened);
            }
            loaded
        } else {
            state.load(&self.site, &url)
        }
    }

    fn send_keys(&self, element: &ElementId, text: &str) -> SitewalkResult<()> {
        let mut state = self.lock()?;
        let index = state.resolve(element)?;
        let width = state.size.width;
        let window = state.window_mut()?;
        if !window.document.is_text_input(index)
            || !window.document.is_displayed(index, width, Instant::now())
        {
            return Err(SitewalkError::driver(format!("element not interactable: {element}")));
        }
        let name = window
            .document
            .attribute(index, "name")
            .unwrap_or_default();
        if let Some(node) = window.document.node_mut(index) {
            node.value.push_str(text);
        }
        state.history.push(format!("type {name}"));
        Ok(())
    }

    fn clear(&self, element: &ElementId) -> SitewalkResult<()> {
        let mut state = self.lock()?;
        let index = state.resolve(element)?;
        let window = state.window_mut()?;
        if let Some(node) = window.document.node_mut(index) {
            node.value.clear();
        }
        Ok(())
    }

    fn execute_script(&self, script: &str) -> SitewalkResult<serde_json::Value> {
        let state = self.lock()?;
        let window = state.window()?;
        let expression = script
            .trim()
            .trim_start_matches("return ")
            .trim_end_matches(';')
            .trim();
        match expression {
            "document.readyState" => Ok("complete".into()),
            "document.title" => Ok(window.document.title.clone().into()),
            "document.URL" | "window.location.href" => Ok(window.url.clone().into()),
            "window.innerWidth" => Ok(state.size.width.into()),
            "window.innerHeight" => Ok(state.size.height.into()),
            s if s.starts_with("window.scrollTo(") || s.starts_with("window.scrollBy(") => {
                Ok(serde_json::Value::Null)
            }
            _ => Err(SitewalkError::Unsupported {
                message: format!("fake browser cannot evaluate `{script}`"),
            }),
        }
    }

    fn window_size(&self) -> SitewalkResult<WindowSize> {
        Ok(self.lock()?.size)
    }

    fn set_window_size(&self, size: WindowSize) -> SitewalkResult<()> {
        self.lock()?.size = size;
        Ok(())
    }

    fn window_handles(&self) -> SitewalkResult<Vec<String>> {
        Ok(self.lock()?.windows.iter().map(|w| w.handle.clone()).collect())
    }

    fn current_window(&self) -> SitewalkResult<String> {
        Ok(self.lock()?.window()?.handle.clone())
    }

    fn switch_to_window(&self, handle: &str) -> SitewalkResult<()> {
        let mut state = self.lock()?;
        let index = state
            .windows
            .iter()
            .position(|w| w.handle == handle)
            .ok_or_else(|| SitewalkError::driver(format!("no such window: {handle}")))?;
        state.current = index;
        Ok(())
    }

    fn close_window(&self) -> SitewalkResult<()> {
        let mut state = self.lock()?;
        let current = state.current;
        if current >= state.windows.len() {
            return Err(SitewalkError::driver("no current window"));
        }
        let closed = state.windows.remove(current);
        state.current = usize::MAX;
        state.history.push(format!("close {}", closed.handle));
        Ok(())
    }

    fn screenshot(&self) -> SitewalkResult<Vec<u8>> {
        Err(SitewalkError::Unsupported {
            message: "the fake browser does not render pixels".to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fake::Node;
    use std::time::Duration;

    const BASE: &str = "https://example.org";

    fn site() -> FakeSite {
        FakeSite::new()
            .route(BASE, "/", |req| {
                let greeting = req
                    .state
                    .get("user")
                    .map_or("Hello".to_string(), |u| format!("Hi {u}"));
                Response::page(
                    "Home",
                    Node::new("main")
                        .child(Node::new("h1").text(&greeting))
                        .child(Node::link("/about", "About"))
                        .child(
                            Node::link("https://shop.example.com/buy", "Buy")
                                .attr("target", "_blank"),
                        )
                        .child(Node::link("/loop", "Loop").attr("target", "_blank"))
                        .child(Node::input("text", "user"))
                        .child(Node::button("sign-in", "Sign in"))
                        .child(Node::button("toggle", "Menu"))
                        .child(Node::new("ul").id("menu").hidden())
                        .child(
                            Node::new("p")
                                .id("late")
                                .text("Late")
                                .reveal_after(Duration::from_secs(60)),
                        ),
                )
            })
            .route(BASE, "/about", |_| Response::page("About", Node::new("h1").text("About")))
            .route(BASE, "/old", |_| Response::redirect("/about"))
            .route(BASE, "/loop", |_| Response::redirect("/loop"))
            .action("sign-in", |ctx| {
                let user = ctx.field("user").unwrap_or_default();
                ctx.state_mut().set("user", user);
                ctx.reload();
                Ok(())
            })
            .action("toggle", |ctx| {
                ctx.toggle("menu");
                Ok(())
            })
    }

    fn browser() -> FakeBrowser {
        let browser = FakeBrowser::new(Arc::new(site()));
        browser.navigate("https://example.org/").unwrap();
        browser
    }

    fn find(browser: &FakeBrowser, locator: &Locator) -> ElementId {
        browser.find_elements(None, locator).unwrap().remove(0)
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_starts_blank() {
            let browser = FakeBrowser::new(Arc::new(site()));
            assert_eq!(browser.current_url().unwrap(), "about:blank");
            assert_eq!(browser.window_handles().unwrap().len(), 1);
        }

        #[test]
        fn test_follow_link() {
            let browser = browser();
            browser.click(&find(&browser, &Locator::link_text("About"))).unwrap();
            assert_eq!(browser.current_url().unwrap(), "https://example.org/about");
            assert_eq!(browser.title().unwrap(), "About");
        }

        #[test]
        fn test_redirect() {
            let browser = browser();
            browser.navigate("https://example.org/old").unwrap();
            assert_eq!(browser.current_url().unwrap(), "https://example.org/about");
        }

        #[test]
        fn test_not_found_keeps_url() {
            let browser = browser();
            browser.navigate("https://example.org/nope").unwrap();
            assert_eq!(browser.current_url().unwrap(), "https://example.org/nope");
            assert_eq!(browser.title().unwrap(), NOT_FOUND_TITLE);
        }

        #[test]
        fn test_malformed_url() {
            let browser = browser();
            assert!(matches!(
                browser.navigate("not a url"),
                Err(SitewalkError::NavigationError { .. })
            ));
        }

        #[test]
        fn test_target_blank_opens_window() {
            let browser = browser();
            let home = browser.current_window().unwrap();
            browser.click(&find(&browser, &Locator::link_text("Buy"))).unwrap();
            let handles = browser.window_handles().unwrap();
            assert_eq!(handles.len(), 2);
            assert_eq!(browser.current_window().unwrap(), home);
            browser.switch_to_window(&handles[1]).unwrap();
            assert_eq!(browser.current_url().unwrap(), "https://shop.example.com/buy");
        }

        #[test]
        fn test_failed_load_in_new_window_leaves_no_window() {
            let browser = browser();
            let home = browser.current_window().unwrap();
            let broken = find(&browser, &Locator::link_text("Loop"));
            assert!(matches!(
                browser.click(&broken),
                Err(SitewalkError::NavigationError { .. })
            ));
            assert_eq!(browser.window_handles().unwrap(), [home.clone()]);
            assert_eq!(browser.current_window().unwrap(), home);
        }

        #[test]
        fn test_close_window() {
            let browser = browser();
            let home = browser.current_window().unwrap();
            browser.click(&find(&browser, &Locator::link_text("Buy"))).unwrap();
            let shop = browser.window_handles().unwrap().remove(1);
            browser.switch_to_window(&shop).unwrap();
            browser.close_window().unwrap();

            assert!(browser.current_window().is_err());
            assert!(browser.close_window().is_err());
            assert!(browser.switch_to_window(&shop).is_err());
            browser.switch_to_window(&home).unwrap();
            assert_eq!(browser.window_handles().unwrap(), [home]);
            assert_eq!(browser.title().unwrap(), "Home");
        }
    }

    mod staleness_tests {
        use super::*;

        #[test]
        fn test_navigation_invalidates_ids() {
            let browser = browser();
            let heading = find(&browser, &Locator::tag_name("h1"));
            browser.navigate("https://example.org/").unwrap();
            assert!(matches!(
                browser.text(&heading),
                Err(SitewalkError::StaleElement { .. })
            ));
            assert!(matches!(
                browser.find_elements(Some(&heading), &Locator::css("a")),
                Err(SitewalkError::StaleElement { .. })
            ));
        }

        #[test]
        fn test_dom_mutation_keeps_ids() {
            let browser = browser();
            let menu = find(&browser, &Locator::id("menu"));
            assert!(!browser.is_displayed(&menu).unwrap());
            browser.click(&find(&browser, &Locator::css("button[data-action=toggle]"))).unwrap();
            assert!(browser.is_displayed(&menu).unwrap());
        }

        #[test]
        fn test_other_window_ids_are_stale() {
            let browser = browser();
            let heading = find(&browser, &Locator::tag_name("h1"));
            browser.click(&find(&browser, &Locator::link_text("Buy"))).unwrap();
            let handles = browser.window_handles().unwrap();
            browser.switch_to_window(&handles[1]).unwrap();
            assert!(browser.tag_name(&heading).is_err());
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_action_reads_fields_and_reloads() {
            let browser = browser();
            let input = find(&browser, &Locator::name("user"));
            browser.send_keys(&input, "ada").unwrap();
            assert_eq!(browser.attribute(&input, "value").unwrap().as_deref(), Some("ada"));
            browser.click(&find(&browser, &Locator::css("button[data-action='sign-in']"))).unwrap();
            let heading = find(&browser, &Locator::tag_name("h1"));
            assert_eq!(browser.text(&heading).unwrap(), "Hi ada");
            assert_eq!(browser.site_state().unwrap().get("user"), Some("ada"));
        }

        #[test]
        fn test_clear() {
            let browser = browser();
            let input = find(&browser, &Locator::name("user"));
            browser.send_keys(&input, "x").unwrap();
            browser.clear(&input).unwrap();
            assert_eq!(browser.attribute(&input, "value").unwrap().as_deref(), Some(""));
        }

        #[test]
        fn test_hidden_elements_are_not_interactable() {
            let browser = browser();
            let late = find(&browser, &Locator::id("late"));
            assert!(!browser.is_displayed(&late).unwrap());
            assert!(matches!(browser.click(&late), Err(SitewalkError::Driver { .. })));
        }

        #[test]
        fn test_history() {
            let browser = browser();
            browser.click(&find(&browser, &Locator::link_text("About"))).unwrap();
            assert_eq!(
                browser.history().unwrap(),
                ["navigate https://example.org/", "click a"]
            );
        }

        #[test]
        fn test_scripts() {
            let browser = browser();
            assert_eq!(browser.execute_script("return document.readyState;").unwrap(), "complete");
            assert_eq!(browser.execute_script("document.title").unwrap(), "Home");
            assert!(browser.execute_script("window.scrollTo(0, 0)").unwrap().is_null());
            assert!(matches!(
                browser.execute_script("alert(1)"),
                Err(SitewalkError::Unsupported { .. })
            ));
        }

        #[test]
        fn test_window_size() {
            let browser = browser().with_window_size(WindowSize::PHONE);
            assert_eq!(browser.window_size().unwrap(), WindowSize::PHONE);
            browser.set_window_size(WindowSize::DESKTOP).unwrap();
            assert_eq!(browser.execute_script("window.innerWidth").unwrap(), 1920);
        }
    }
}
