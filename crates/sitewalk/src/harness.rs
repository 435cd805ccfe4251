//! Scenario harness: selection by marker, one fresh session per scenario,
//! outcome bookkeeping, and failure diagnostics.

use crate::config::{Product, SuiteConfig};
use crate::fake::{demo, FakeBrowser, FakeSite};
use crate::result::{SitewalkError, SitewalkResult};
use crate::session::Session;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// Longest page-source excerpt kept in diagnostics
pub const MAX_SOURCE_CHARS: usize = 4_000;

/// Scenario body
pub type ScenarioFn = fn(&Session) -> SitewalkResult<()>;

// =============================================================================
// Markers
// =============================================================================

/// Tag used to select scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    /// Marketing site
    Web,
    /// Accounts
    Accounts,
    /// Tutor
    Tutor,
    /// Payments
    Payments,
    /// Safe to run against production
    Nondestructive,
    /// Uses third-party sign-in
    Social,
    /// Quick health check
    Smoke,
}

impl Marker {
    /// Marker of a product
    #[must_use]
    pub const fn product(product: Product) -> Self {
        match product {
            Product::Web => Self::Web,
            Product::Accounts => Self::Accounts,
            Product::Tutor => Self::Tutor,
            Product::Payments => Self::Payments,
        }
    }

    /// Name used in filter expressions
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Accounts => "accounts",
            Self::Tutor => "tutor",
            Self::Payments => "payments",
            Self::Nondestructive => "nondestructive",
            Self::Social => "social",
            Self::Smoke => "smoke",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Marker {
    type Err = SitewalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "accounts" => Ok(Self::Accounts),
            "tutor" => Ok(Self::Tutor),
            "payments" => Ok(Self::Payments),
            "nondestructive" => Ok(Self::Nondestructive),
            "social" => Ok(Self::Social),
            "smoke" => Ok(Self::Smoke),
            other => Err(SitewalkError::config(format!("unknown marker '{other}'"))),
        }
    }
}

/// Boolean expression over markers, e.g. `web and not (social or smoke)`.
///
/// `not` binds tighter than `and`, which binds tighter than `or`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerFilter {
    /// Scenario carries the marker
    Has(Marker),
    /// Negation
    Not(Box<MarkerFilter>),
    /// Both hold
    And(Box<MarkerFilter>, Box<MarkerFilter>),
    /// Either holds
    Or(Box<MarkerFilter>, Box<MarkerFilter>),
}

impl MarkerFilter {
    /// Parse a filter expression
    pub fn parse(expression: &str) -> SitewalkResult<Self> {
        let tokens = tokenize(expression);
        let mut parser = FilterParser {
            tokens: &tokens,
            pos: 0,
        };
        let parsed = parser.or_expr().and_then(|filter| match parser.peek() {
            None => Ok(filter),
            Some(token) => Err(SitewalkError::config(format!("unexpected '{token}'"))),
        });
        parsed.map_err(|e| match e {
            SitewalkError::Config { message } => SitewalkError::config(format!(
                "invalid marker expression '{expression}': {message}"
            )),
            other => other,
        })
    }

    /// Whether a scenario with `markers` is selected
    #[must_use]
    pub fn matches(&self, markers: &[Marker]) -> bool {
        match self {
            Self::Has(marker) => markers.contains(marker),
            Self::Not(inner) => !inner.matches(markers),
            Self::And(a, b) => a.matches(markers) && b.matches(markers),
            Self::Or(a, b) => a.matches(markers) || b.matches(markers),
        }
    }
}

impl FromStr for MarkerFilter {
    type Err = SitewalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn tokenize(expression: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in expression.chars() {
        if c.is_whitespace() || c == '(' || c == ')' {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        } else {
            word.push(c);
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

struct FilterParser<'a> {
    tokens: &'a [String],
    pos: usize,
}

impl<'a> FilterParser<'a> {
    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn advance(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).map(String::as_str);
        self.pos += 1;
        token
    }

    fn or_expr(&mut self) -> SitewalkResult<MarkerFilter> {
        let mut left = self.and_expr()?;
        while self.peek() == Some("or") {
            self.pos += 1;
            left = MarkerFilter::Or(Box::new(left), Box::new(self.and_expr()?));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> SitewalkResult<MarkerFilter> {
        let mut left = self.not_expr()?;
        while self.peek() == Some("and") {
            self.pos += 1;
            left = MarkerFilter::And(Box::new(left), Box::new(self.not_expr()?));
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> SitewalkResult<MarkerFilter> {
        if self.peek() == Some("not") {
            self.pos += 1;
            return Ok(MarkerFilter::Not(Box::new(self.not_expr()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> SitewalkResult<MarkerFilter> {
        match self.advance() {
            Some("(") => {
                let inner = self.or_expr()?;
                match self.advance() {
                    Some(")") => Ok(inner),
                    _ => Err(SitewalkError::config("missing ')'")),
                }
            }
            Some(token @ (")" | "and" | "or")) => {
                Err(SitewalkError::config(format!("unexpected '{token}'")))
            }
            Some(name) => Ok(MarkerFilter::Has(name.parse()?)),
            None => Err(SitewalkError::config("unexpected end of expression")),
        }
    }
}

// =============================================================================
// Scenarios
// =============================================================================

/// A named, tagged scenario
#[derive(Clone)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Product the scenario exercises
    pub product: Product,
    /// Test-case id in the case tracker
    pub test_case: Option<String>,
    /// Markers besides the product marker
    pub markers: Vec<Marker>,
    /// Reason to skip without running
    pub skip: Option<String>,
    /// Reason the scenario is known to fail
    pub expected_failure: Option<String>,
    /// The scenario itself
    pub body: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("product", &self.product)
            .field("test_case", &self.test_case)
            .field("markers", &self.markers)
            .field("skip", &self.skip)
            .field("expected_failure", &self.expected_failure)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// Create a scenario
    #[must_use]
    pub fn new(name: impl Into<String>, product: Product, body: ScenarioFn) -> Self {
        Self {
            name: name.into(),
            product,
            test_case: None,
            markers: Vec::new(),
            skip: None,
            expected_failure: None,
            body,
        }
    }

    /// Attach a test-case id
    #[must_use]
    pub fn test_case(mut self, id: impl Into<String>) -> Self {
        self.test_case = Some(id.into());
        self
    }

    /// Add a marker
    #[must_use]
    pub fn marker(mut self, marker: Marker) -> Self {
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
        self
    }

    /// Skip with a reason
    #[must_use]
    pub fn skip(mut self, reason: impl Into<String>) -> Self {
        self.skip = Some(reason.into());
        self
    }

    /// Mark as an expected failure
    #[must_use]
    pub fn expected_failure(mut self, reason: impl Into<String>) -> Self {
        self.expected_failure = Some(reason.into());
        self
    }

    /// Product marker followed by the explicit markers
    #[must_use]
    pub fn all_markers(&self) -> Vec<Marker> {
        let mut markers = vec![Marker::product(self.product)];
        markers.extend(self.markers.iter().copied());
        markers
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Creates the fresh session each scenario runs in
pub trait SessionFactory {
    /// Open a session
    fn create(&self, config: &Arc<SuiteConfig>) -> SitewalkResult<Session>;
}

impl<F> SessionFactory for F
where
    F: Fn(&Arc<SuiteConfig>) -> SitewalkResult<Session>,
{
    fn create(&self, config: &Arc<SuiteConfig>) -> SitewalkResult<Session> {
        self(config)
    }
}

/// Sessions over [`FakeBrowser`]s serving one site
#[derive(Debug, Clone)]
pub struct FakeSessionFactory {
    site: Arc<FakeSite>,
}

impl FakeSessionFactory {
    /// Factory for a given site
    #[must_use]
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
        }
    }

    /// Factory for the demo deployment at the configured base URLs
    pub fn demo(config: &SuiteConfig) -> SitewalkResult<Self> {
        Ok(Self::new(demo::site(config)?))
    }
}

impl SessionFactory for FakeSessionFactory {
    fn create(&self, config: &Arc<SuiteConfig>) -> SitewalkResult<Session> {
        let browser = FakeBrowser::new(Arc::clone(&self.site)).with_window_size(config.window);
        Ok(Session::new(Arc::new(browser), Arc::clone(config)))
    }
}

// =============================================================================
// Results
// =============================================================================

/// How a scenario ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Ran and held
    Passed,
    /// Ran and failed
    Failed,
    /// Not run
    Skipped,
    /// Failed as expected
    XFailed,
    /// Expected to fail but held
    XPassed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::XFailed => "XFAIL",
            Self::XPassed => "XPASS",
        };
        f.write_str(label)
    }
}

/// Browser state captured when a scenario fails
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    /// URL of the current window
    pub url: Option<String>,
    /// Page source without scripts and styles, truncated
    pub source: Option<String>,
    /// Screenshot written to the artifacts directory
    pub screenshot: Option<PathBuf>,
}

/// Result of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Product
    pub product: Product,
    /// Test-case id
    pub test_case: Option<String>,
    /// Outcome
    pub outcome: Outcome,
    /// Failure message or skip reason
    pub message: Option<String>,
    /// Browser state at failure
    pub diagnostics: Option<Diagnostics>,
    /// Run time in milliseconds
    pub duration_ms: u64,
}

/// Results of a suite run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Per-scenario results in run order
    pub results: Vec<ScenarioResult>,
    /// Total run time in milliseconds
    pub duration_ms: u64,
    /// Whether fail-fast stopped the run
    pub stopped_early: bool,
}

impl SuiteReport {
    fn count(&self, outcome: Outcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    /// Passed scenarios
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(Outcome::Passed)
    }

    /// Failed scenarios
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Outcome::Failed)
    }

    /// Skipped scenarios
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(Outcome::Skipped)
    }

    /// Expected failures that failed
    #[must_use]
    pub fn xfailed(&self) -> usize {
        self.count(Outcome::XFailed)
    }

    /// Expected failures that passed
    #[must_use]
    pub fn xpassed(&self) -> usize {
        self.count(Outcome::XPassed)
    }

    /// Scenarios reported
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True when nothing failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Failed results
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::Failed)
            .collect()
    }

    /// One-line count summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} skipped, {} xfailed, {} xpassed in {:.2}s",
            self.passed(),
            self.failed(),
            self.skipped(),
            self.xfailed(),
            self.xpassed(),
            Duration::from_millis(self.duration_ms).as_secs_f64()
        )
    }

    /// Pretty JSON
    pub fn to_json(&self) -> SitewalkResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// =============================================================================
// Suite
// =============================================================================

/// A set of scenarios and how to select them
#[derive(Debug, Clone, Default)]
pub struct Suite {
    scenarios: Vec<Scenario>,
    filter: Option<MarkerFilter>,
    fail_fast: bool,
}

impl Suite {
    /// Suite over `scenarios`
    #[must_use]
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            filter: None,
            fail_fast: false,
        }
    }

    /// Only run scenarios matching `filter`
    #[must_use]
    pub fn with_filter(mut self, filter: MarkerFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Stop after the first failure
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// All scenarios
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Scenarios enabled by the configured systems and the marker filter
    #[must_use]
    pub fn selected(&self, config: &SuiteConfig) -> Vec<&Scenario> {
        self.scenarios
            .iter()
            .filter(|s| config.is_enabled(s.product))
            .filter(|s| {
                self.filter
                    .as_ref()
                    .map_or(true, |f| f.matches(&s.all_markers()))
            })
            .collect()
    }

    /// Run the selected scenarios, each in a fresh session
    pub fn run(&self, config: SuiteConfig, factory: &dyn SessionFactory) -> SuiteReport {
        let config = Arc::new(config);
        let start = Instant::now();
        let selected = self.selected(&config);
        tracing::info!(scenarios = selected.len(), instance = %config.instance, "suite starting");

        let mut report = SuiteReport::default();
        for scenario in selected {
            let result = run_scenario(scenario, &config, factory);
            let failed = result.outcome == Outcome::Failed;
            report.results.push(result);
            if failed && self.fail_fast {
                report.stopped_early = true;
                tracing::warn!(scenario = %scenario.name, "stopping after first failure");
                break;
            }
        }
        report.duration_ms = millis(start.elapsed());
        tracing::info!(summary = %report.summary(), "suite finished");
        report
    }
}

fn run_scenario(
    scenario: &Scenario,
    config: &Arc<SuiteConfig>,
    factory: &dyn SessionFactory,
) -> ScenarioResult {
    let mut result = ScenarioResult {
        name: scenario.name.clone(),
        product: scenario.product,
        test_case: scenario.test_case.clone(),
        outcome: Outcome::Skipped,
        message: None,
        diagnostics: None,
        duration_ms: 0,
    };
    if let Some(reason) = &scenario.skip {
        tracing::info!(scenario = %scenario.name, %reason, "scenario skipped");
        result.message = Some(reason.clone());
        return result;
    }

    let start = Instant::now();
    tracing::info!(scenario = %scenario.name, test_case = ?scenario.test_case, "scenario starting");
    let session = match factory.create(config) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(scenario = %scenario.name, error = %e, "could not open a session");
            result.outcome = Outcome::Failed;
            result.message = Some(e.to_string());
            result.duration_ms = millis(start.elapsed());
            return result;
        }
    };

    let outcome = (scenario.body)(&session);
    match (outcome, &scenario.expected_failure) {
        (Ok(()), None) => result.outcome = Outcome::Passed,
        (Ok(()), Some(reason)) => {
            result.outcome = Outcome::XPassed;
            result.message = Some(reason.clone());
        }
        (Err(e), Some(_)) => {
            result.outcome = Outcome::XFailed;
            result.message = Some(e.to_string());
        }
        (Err(e), None) => {
            let diagnostics =
                collect_diagnostics(&session, &scenario.name, config.artifacts_dir.as_deref());
            tracing::warn!(
                scenario = %scenario.name,
                error = %e,
                url = diagnostics.url.as_deref().unwrap_or("<unknown>"),
                "scenario failed"
            );
            result.outcome = Outcome::Failed;
            result.message = Some(e.to_string());
            result.diagnostics = Some(diagnostics);
        }
    }
    if let Err(e) = session.driver().quit() {
        tracing::warn!(scenario = %scenario.name, error = %e, "could not close the browser");
    }
    result.duration_ms = millis(start.elapsed());
    tracing::info!(
        scenario = %scenario.name,
        outcome = %result.outcome,
        duration_ms = result.duration_ms,
        "scenario finished"
    );
    result
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Capture what the browser shows; failures to capture are logged, not raised
pub fn collect_diagnostics(
    session: &Session,
    scenario: &str,
    artifacts_dir: Option<&Path>,
) -> Diagnostics {
    let url = session.current_url().ok();
    let source = session
        .page_source()
        .ok()
        .map(|source| sanitize_source(&source, MAX_SOURCE_CHARS));
    let screenshot = artifacts_dir.and_then(|dir| match save_screenshot(session, scenario, dir) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(scenario, error = %e, "no screenshot captured");
            None
        }
    });
    Diagnostics {
        url,
        source,
        screenshot,
    }
}

fn save_screenshot(session: &Session, scenario: &str, dir: &Path) -> SitewalkResult<PathBuf> {
    let png = session.driver().screenshot()?;
    std::fs::create_dir_all(dir)?;
    let slug: String = scenario
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let path = dir.join(format!("{slug}-{}.png", uuid::Uuid::new_v4().simple()));
    std::fs::write(&path, png)?;
    Ok(path)
}

fn script_or_style() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>").ok()
        })
        .as_ref()
}

/// Drop `<script>` and `<style>` elements and cut to `max_chars`
#[must_use]
pub fn sanitize_source(source: &str, max_chars: usize) -> String {
    let stripped = script_or_style().map_or_else(
        || source.to_string(),
        |pattern| pattern.replace_all(source, "").into_owned(),
    );
    if stripped.chars().count() <= max_chars {
        return stripped;
    }
    let mut cut: String = stripped.chars().take(max_chars).collect();
    cut.push_str("\n... [truncated]");
    cut
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::assertion::ensure;
    use crate::fake::{Node, Response};
    use crate::wait::WaitOptions;

    fn ok_body(_: &Session) -> SitewalkResult<()> {
        Ok(())
    }

    fn failing_body(session: &Session) -> SitewalkResult<()> {
        session.navigate("https://qa.example.org/")?;
        ensure(false, "the sky is green")
    }

    fn config() -> SuiteConfig {
        let mut config = SuiteConfig::new();
        config.wait = WaitOptions::new().with_timeout(100).with_poll_interval(10);
        config
    }

    fn factory() -> FakeSessionFactory {
        FakeSessionFactory::new(FakeSite::new().route("https://qa.example.org", "/", |_| {
            Response::page(
                "Home",
                Node::new("main")
                    .child(Node::new("script").text("var secret = 1;"))
                    .child(Node::new("h1").text("Hello")),
            )
        }))
    }

    mod filter_tests {
        use super::*;

        fn markers(list: &[Marker]) -> Vec<Marker> {
            list.to_vec()
        }

        #[test]
        fn test_single_marker() {
            let filter = MarkerFilter::parse("web").unwrap();
            assert!(filter.matches(&markers(&[Marker::Web, Marker::Smoke])));
            assert!(!filter.matches(&markers(&[Marker::Tutor])));
        }

        #[test]
        fn test_precedence() {
            let filter = MarkerFilter::parse("web or tutor and not social").unwrap();
            assert!(filter.matches(&[Marker::Web, Marker::Social]));
            assert!(filter.matches(&[Marker::Tutor]));
            assert!(!filter.matches(&[Marker::Tutor, Marker::Social]));
        }

        #[test]
        fn test_parentheses() {
            let filter: MarkerFilter = "(web or tutor) and not social".parse().unwrap();
            assert!(!filter.matches(&[Marker::Web, Marker::Social]));
            assert!(filter.matches(&[Marker::Web]));
        }

        #[test]
        fn test_invalid_expressions() {
            for expression in ["", "web and", "(web", "web)", "bogus", "and web", "not"] {
                match MarkerFilter::parse(expression) {
                    Err(SitewalkError::Config { message }) => {
                        assert!(message.contains("marker"), "{expression}: {message}");
                    }
                    other => panic!("{expression}: expected Config error, got {other:?}"),
                }
            }
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_outcomes() {
            let suite = Suite::new(vec![
                Scenario::new("passes", Product::Web, ok_body),
                Scenario::new("fails", Product::Web, failing_body),
                Scenario::new("skipped", Product::Web, failing_body).skip("not today"),
                Scenario::new("known bug", Product::Web, failing_body).expected_failure("bug"),
                Scenario::new("fixed bug", Product::Web, ok_body).expected_failure("bug"),
            ]);
            let report = suite.run(config(), &factory());
            assert_eq!(report.total(), 5);
            assert_eq!(report.passed(), 1);
            assert_eq!(report.failed(), 1);
            assert_eq!(report.skipped(), 1);
            assert_eq!(report.xfailed(), 1);
            assert_eq!(report.xpassed(), 1);
            assert!(!report.is_success());
            assert_eq!(report.results[2].message.as_deref(), Some("not today"));
        }

        #[test]
        fn test_failure_diagnostics() {
            let suite = Suite::new(vec![Scenario::new("fails", Product::Web, failing_body)]);
            let report = suite.run(config(), &factory());
            let failure = report.failures()[0];
            assert!(failure.message.as_deref().unwrap().contains("the sky is green"));
            let diagnostics = failure.diagnostics.as_ref().unwrap();
            assert_eq!(diagnostics.url.as_deref(), Some("https://qa.example.org/"));
            let source = diagnostics.source.as_deref().unwrap();
            assert!(source.contains("Hello"));
            assert!(!source.contains("secret"));
            assert!(diagnostics.screenshot.is_none());
        }

        #[test]
        fn test_unsupported_screenshot_still_reports() {
            let dir = tempfile::tempdir().unwrap();
            let mut config = config();
            config.artifacts_dir = Some(dir.path().to_path_buf());
            let suite = Suite::new(vec![Scenario::new("fails", Product::Web, failing_body)]);
            let report = suite.run(config, &factory());
            assert_eq!(report.failed(), 1);
            assert!(report.results[0].diagnostics.as_ref().unwrap().screenshot.is_none());
        }

        #[test]
        fn test_fail_fast() {
            let suite = Suite::new(vec![
                Scenario::new("fails", Product::Web, failing_body),
                Scenario::new("passes", Product::Web, ok_body),
            ])
            .with_fail_fast(true);
            let report = suite.run(config(), &factory());
            assert_eq!(report.total(), 1);
            assert!(report.stopped_early);
        }

        #[test]
        fn test_selection_by_system_and_marker() {
            let suite = Suite::new(vec![
                Scenario::new("web smoke", Product::Web, ok_body).marker(Marker::Smoke),
                Scenario::new("web other", Product::Web, ok_body),
                Scenario::new("tutor smoke", Product::Tutor, ok_body).marker(Marker::Smoke),
            ])
            .with_filter(MarkerFilter::parse("smoke").unwrap());
            let mut config = config();
            assert_eq!(suite.selected(&config).len(), 2);
            config.systems = vec![Product::Tutor];
            let names: Vec<_> = suite
                .selected(&config)
                .iter()
                .map(|s| s.name.as_str())
                .collect();
            assert_eq!(names, ["tutor smoke"]);
        }

        #[test]
        fn test_session_factory_error_fails_scenario() {
            let broken = |_: &Arc<SuiteConfig>| -> SitewalkResult<Session> {
                Err(SitewalkError::driver("no browser"))
            };
            let report = Suite::new(vec![Scenario::new("passes", Product::Web, ok_body)])
                .run(config(), &broken);
            assert_eq!(report.failed(), 1);
            assert!(report.results[0].message.as_deref().unwrap().contains("no browser"));
        }

        #[test]
        fn test_report_json() {
            let scenario = Scenario::new("passes", Product::Web, ok_body).test_case("C1");
            let report = Suite::new(vec![scenario]).run(config(), &factory());
            let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
            assert_eq!(json["results"][0]["outcome"], "passed");
            assert_eq!(json["results"][0]["test_case"], "C1");
            assert!(report.summary().starts_with("1 passed, 0 failed"));
        }
    }

    mod sanitize_tests {
        use super::*;

        #[test]
        fn test_strips_scripts_and_styles() {
            let html = "<html><head><style>p{}</style></head>\
                        <body><SCRIPT type=\"x\">\nalert(1)\n</script><p>kept</p></body></html>";
            let clean = sanitize_source(html, 1_000);
            assert_eq!(clean, "<html><head></head><body><p>kept</p></body></html>");
        }

        #[test]
        fn test_truncates_on_char_boundary() {
            let clean = sanitize_source("ééééé", 3);
            assert!(clean.starts_with("ééé"));
            assert!(clean.ends_with("[truncated]"));
        }
    }
}
