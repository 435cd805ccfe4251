//! Chromium over CDP (feature `browser`).
//!
//! The public surface is synchronous: every call blocks on a private tokio
//! runtime. Elements are tracked in a registry that lives in the page's
//! JavaScript realm under ids minted from UUIDs. A navigation discards the
//! realm and with it the registry, so ids from an earlier render report
//! [`SitewalkError::StaleElement`] without any bookkeeping on this side.

use crate::config::SuiteConfig;
use crate::driver::{Driver, ElementId, WindowSize};
use crate::harness::SessionFactory;
use crate::locator::{Locator, Strategy};
use crate::result::{SitewalkError, SitewalkResult};
use crate::session::Session;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::page::{Page as CdpPage, ScreenshotParams};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Runtime;

/// Launch options
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Run without a visible window
    pub headless: bool,
    /// Initial window size
    pub window: WindowSize,
    /// Chromium binary; found on `PATH` when unset
    pub executable: Option<PathBuf>,
    /// Keep Chromium's sandbox on
    pub sandbox: bool,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window: WindowSize::default(),
            executable: None,
            sandbox: true,
        }
    }
}

impl ChromiumOptions {
    /// Options taken from a suite configuration
    #[must_use]
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            headless: config.headless,
            window: config.window,
            ..Self::default()
        }
    }
}

struct Window {
    handle: String,
    target: TargetId,
    page: CdpPage,
}

struct ChromiumState {
    windows: Vec<Window>,
    current: usize,
    size: WindowSize,
}

impl ChromiumState {
    fn page(&self) -> SitewalkResult<CdpPage> {
        self.windows
            .get(self.current)
            .map(|w| w.page.clone())
            .ok_or_else(|| SitewalkError::driver("no current window"))
    }
}

/// Reply of the element scripts
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply<T> {
    Ok(T),
    Stale,
}

/// A [`Driver`] controlling a local Chromium
pub struct ChromiumDriver {
    runtime: Runtime,
    browser: Mutex<CdpBrowser>,
    state: Mutex<ChromiumState>,
}

impl std::fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumDriver").finish_non_exhaustive()
    }
}

fn cdp_error(e: impl std::fmt::Display) -> SitewalkError {
    SitewalkError::driver(e.to_string())
}

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

impl ChromiumDriver {
    /// Launch Chromium with one blank window
    pub fn launch(options: &ChromiumOptions) -> SitewalkResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let mut builder =
            CdpConfig::builder().window_size(options.window.width, options.window.height);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(cdp_error)?;

        let (browser, page) = runtime.block_on(async {
            let (browser, mut handler) = CdpBrowser::launch(config).await.map_err(cdp_error)?;
            tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });
            let page = browser.new_page("about:blank").await.map_err(cdp_error)?;
            Ok::<_, SitewalkError>((browser, page))
        })?;
        tracing::info!(headless = options.headless, "chromium launched");

        let window = Window {
            handle: uuid::Uuid::new_v4().to_string(),
            target: page.target_id().clone(),
            page,
        };
        let driver = Self {
            runtime,
            browser: Mutex::new(browser),
            state: Mutex::new(ChromiumState {
                windows: vec![window],
                current: 0,
                size: options.window,
            }),
        };
        driver.set_window_size(options.window)?;
        Ok(driver)
    }

    fn lock(&self) -> SitewalkResult<MutexGuard<'_, ChromiumState>> {
        self.state
            .lock()
            .map_err(|_| SitewalkError::driver("chromium state poisoned"))
    }

    fn page(&self) -> SitewalkResult<CdpPage> {
        self.lock()?.page()
    }

    fn eval<T: DeserializeOwned>(&self, script: String) -> SitewalkResult<T> {
        let page = self.page()?;
        self.runtime.block_on(async move {
            page.evaluate_expression(script)
                .await
                .map_err(cdp_error)?
                .into_value::<T>()
                .map_err(cdp_error)
        })
    }

    /// Run `body` with `el` bound to a registered element
    fn on_element<T: DeserializeOwned>(
        &self,
        element: &ElementId,
        body: &str,
    ) -> SitewalkResult<T> {
        let script = format!(
            "(() => {{ const el = (window.__sitewalk || new Map()).get({id}); \
             if (!el || !el.isConnected) return 'stale'; \
             return {{ ok: (() => {{ {body} }})() }}; }})()",
            id = js_string(element.as_str()),
        );
        match self.eval::<Reply<T>>(script)? {
            Reply::Ok(value) => Ok(value),
            Reply::Stale => Err(SitewalkError::StaleElement {
                handle: element.to_string(),
            }),
        }
    }

    /// Sync the window list with the browser's pages
    fn refresh_windows(&self) -> SitewalkResult<()> {
        let pages = {
            let browser = self
                .browser
                .lock()
                .map_err(|_| SitewalkError::driver("chromium browser poisoned"))?;
            self.runtime.block_on(browser.pages()).map_err(cdp_error)?
        };
        let mut state = self.lock()?;
        let current = state.windows.get(state.current).map(|w| w.target.clone());
        state
            .windows
            .retain(|w| pages.iter().any(|p| p.target_id() == &w.target));
        for page in pages {
            if !state.windows.iter().any(|w| &w.target == page.target_id()) {
                state.windows.push(Window {
                    handle: uuid::Uuid::new_v4().to_string(),
                    target: page.target_id().clone(),
                    page,
                });
            }
        }
        state.current = current
            .and_then(|t| state.windows.iter().position(|w| w.target == t))
            .unwrap_or(0);
        Ok(())
    }
}

/// How a locator is resolved in the page
fn query_kind(locator: &Locator) -> (&'static str, String) {
    match (locator.to_css(), locator.strategy()) {
        (Some(css), _) => ("css", css),
        (None, Strategy::XPath) => ("xpath", locator.value().to_string()),
        (None, Strategy::PartialLinkText) => ("partial", locator.value().to_string()),
        (None, _) => ("link", locator.value().trim().to_string()),
    }
}

fn find_script(scope: Option<&ElementId>, locator: &Locator, prefix: &str) -> String {
    let (kind, value) = query_kind(locator);
    let scope = scope.map_or_else(|| "null".to_string(), |s| js_string(s.as_str()));
    format!(
        "(() => {{ const reg = (window.__sitewalk ||= new Map()); let root = document; \
         const scope = {scope}; \
         if (scope !== null) {{ root = reg.get(scope); \
           if (!root || !root.isConnected) return 'stale'; }} \
         const kind = {kind}; const value = {value}; let found = []; \
         if (kind === 'css') {{ found = Array.from(root.querySelectorAll(value)); }} \
         else if (kind === 'xpath') {{ \
           const r = document.evaluate(value, root, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
           for (let i = 0; i < r.snapshotLength; i++) found.push(r.snapshotItem(i)); }} \
         else {{ found = Array.from(root.querySelectorAll('a')).filter(a => {{ \
           const t = a.innerText.trim(); \
           return kind === 'link' ? t === value : t.includes(value); }}); }} \
         return {{ ok: found.map((el, i) => {{ \
           const id = {prefix} + '-' + i; reg.set(id, el); return id; }}) }}; }})()",
        kind = js_string(kind),
        value = js_string(&value),
        prefix = js_string(prefix),
    )
}

impl Driver for ChromiumDriver {
    fn navigate(&self, url: &str) -> SitewalkResult<()> {
        let page = self.page()?;
        self.runtime
            .block_on(page.goto(url))
            .map_err(|e| SitewalkError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn current_url(&self) -> SitewalkResult<String> {
        let page = self.page()?;
        let url = self.runtime.block_on(page.url()).map_err(cdp_error)?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    fn page_source(&self) -> SitewalkResult<String> {
        let page = self.page()?;
        self.runtime.block_on(page.content()).map_err(cdp_error)
    }

    fn title(&self) -> SitewalkResult<String> {
        self.eval("document.title".to_string())
    }

    fn ready_state(&self) -> SitewalkResult<String> {
        self.eval("document.readyState".to_string())
    }

    fn find_elements(
        &self,
        scope: Option<&ElementId>,
        locator: &Locator,
    ) -> SitewalkResult<Vec<ElementId>> {
        let prefix = uuid::Uuid::new_v4().simple().to_string();
        match self.eval::<Reply<Vec<String>>>(find_script(scope, locator, &prefix))? {
            Reply::Ok(ids) => Ok(ids.into_iter().map(ElementId::new).collect()),
            Reply::Stale => Err(SitewalkError::StaleElement {
                handle: scope.map(ToString::to_string).unwrap_or_default(),
            }),
        }
    }

    fn tag_name(&self, element: &ElementId) -> SitewalkResult<String> {
        self.on_element(element, "return el.tagName.toLowerCase();")
    }

    fn text(&self, element: &ElementId) -> SitewalkResult<String> {
        self.on_element(element, "return el.innerText.replace(/\\s+/g, ' ').trim();")
    }

    fn attribute(&self, element: &ElementId, name: &str) -> SitewalkResult<Option<String>> {
        let body = format!(
            "const name = {}; if (name === 'value' && 'value' in el) return String(el.value); \
             return el.getAttribute(name);",
            js_string(name)
        );
        self.on_element(element, &body)
    }

    fn is_displayed(&self, element: &ElementId) -> SitewalkResult<bool> {
        self.on_element(
            element,
            "const s = getComputedStyle(el); const r = el.getBoundingClientRect(); \
             return s.display !== 'none' && s.visibility !== 'hidden' \
               && (r.width > 0 || r.height > 0);",
        )
    }

    fn click(&self, element: &ElementId) -> SitewalkResult<()> {
        self.on_element::<serde_json::Value>(
            element,
            "el.scrollIntoView({ block: 'center' }); el.click(); return null;",
        )?;
        Ok(())
    }

    fn send_keys(&self, element: &ElementId, text: &str) -> SitewalkResult<()> {
        let body = format!(
            "el.focus(); el.value += {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }})); return null;",
            js_string(text)
        );
        self.on_element::<serde_json::Value>(element, &body)?;
        Ok(())
    }

    fn clear(&self, element: &ElementId) -> SitewalkResult<()> {
        self.on_element::<serde_json::Value>(
            element,
            "el.value = ''; el.dispatchEvent(new Event('input', { bubbles: true })); return null;",
        )?;
        Ok(())
    }

    fn execute_script(&self, script: &str) -> SitewalkResult<serde_json::Value> {
        let page = self.page()?;
        let script = script.to_string();
        self.runtime.block_on(async move {
            let result = page.evaluate_expression(script).await.map_err(cdp_error)?;
            Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
        })
    }

    fn window_size(&self) -> SitewalkResult<WindowSize> {
        Ok(self.lock()?.size)
    }

    fn set_window_size(&self, size: WindowSize) -> SitewalkResult<()> {
        let page = self.page()?;
        let params = SetDeviceMetricsOverrideParams::new(
            i64::from(size.width),
            i64::from(size.height),
            1.0,
            false,
        );
        self.runtime.block_on(page.execute(params)).map_err(cdp_error)?;
        self.lock()?.size = size;
        Ok(())
    }

    fn window_handles(&self) -> SitewalkResult<Vec<String>> {
        self.refresh_windows()?;
        Ok(self.lock()?.windows.iter().map(|w| w.handle.clone()).collect())
    }

    fn current_window(&self) -> SitewalkResult<String> {
        let state = self.lock()?;
        state
            .windows
            .get(state.current)
            .map(|w| w.handle.clone())
            .ok_or_else(|| SitewalkError::driver("no current window"))
    }

    fn switch_to_window(&self, handle: &str) -> SitewalkResult<()> {
        self.refresh_windows()?;
        let page = {
            let mut state = self.lock()?;
            let index = state
                .windows
                .iter()
                .position(|w| w.handle == handle)
                .ok_or_else(|| SitewalkError::driver(format!("no window '{handle}'")))?;
            state.current = index;
            state.windows[index].page.clone()
        };
        self.runtime.block_on(page.bring_to_front()).map_err(cdp_error)?;
        Ok(())
    }

    fn close_window(&self) -> SitewalkResult<()> {
        let window = {
            let mut state = self.lock()?;
            let current = state.current;
            if current >= state.windows.len() {
                return Err(SitewalkError::driver("no current window"));
            }
            state.current = usize::MAX;
            state.windows.remove(current)
        };
        self.runtime.block_on(window.page.close()).map_err(cdp_error)
    }

    fn screenshot(&self) -> SitewalkResult<Vec<u8>> {
        let page = self.page()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.runtime.block_on(page.screenshot(params)).map_err(cdp_error)
    }

    fn quit(&self) -> SitewalkResult<()> {
        let mut browser = self
            .browser
            .lock()
            .map_err(|_| SitewalkError::driver("chromium browser poisoned"))?;
        self.runtime.block_on(async {
            browser.close().await.map_err(cdp_error)?;
            browser.wait().await.map_err(cdp_error)?;
            Ok::<_, SitewalkError>(())
        })
    }
}

/// Launches a fresh Chromium for every scenario
#[derive(Debug, Clone, Default)]
pub struct ChromiumSessionFactory {
    options: Option<ChromiumOptions>,
}

impl ChromiumSessionFactory {
    /// Factory with explicit launch options; otherwise they follow the
    /// suite configuration
    #[must_use]
    pub fn with_options(options: ChromiumOptions) -> Self {
        Self {
            options: Some(options),
        }
    }
}

impl SessionFactory for ChromiumSessionFactory {
    fn create(&self, config: &Arc<SuiteConfig>) -> SitewalkResult<Session> {
        let options = self
            .options
            .clone()
            .unwrap_or_else(|| ChromiumOptions::from_config(config));
        let driver = ChromiumDriver::launch(&options)?;
        Ok(Session::new(Arc::new(driver), Arc::clone(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_kind() {
        assert_eq!(query_kind(&Locator::id("menu")), ("css", "[id=\"menu\"]".to_string()));
        assert_eq!(query_kind(&Locator::xpath("//a")), ("xpath", "//a".to_string()));
        assert_eq!(query_kind(&Locator::link_text(" Math ")), ("link", "Math".to_string()));
        assert_eq!(query_kind(&Locator::partial_link_text("Ma")), ("partial", "Ma".to_string()));
    }

    #[test]
    fn test_scripts_quote_their_inputs() {
        let script = find_script(None, &Locator::css("a[title=\"x\"]"), "p");
        assert!(script.contains(r#"const value = "a[title=\"x\"]";"#));
        assert!(script.contains("const scope = null;"));
    }

    #[test]
    fn test_options_follow_config() {
        let mut config = SuiteConfig::new();
        config.headless = false;
        config.window = WindowSize::PHONE;
        let options = ChromiumOptions::from_config(&config);
        assert!(!options.headless);
        assert_eq!(options.window, WindowSize::PHONE);
        assert!(options.sandbox);
    }
}
