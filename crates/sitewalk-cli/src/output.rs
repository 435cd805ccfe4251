//! Report rendering

use console::{style, Style};
use sitewalk::{Outcome, Scenario, ScenarioResult, SuiteReport};
use std::fmt::Write as _;

/// Renders scenario lists and suite reports as text
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode: only failures and the summary
    pub quiet: bool,
}

impl Reporter {
    /// Create a reporter
    #[must_use]
    pub const fn new(use_color: bool, quiet: bool) -> Self {
        Self { use_color, quiet }
    }

    fn outcome_label(&self, outcome: Outcome) -> String {
        let label = outcome.to_string();
        if !self.use_color {
            return label;
        }
        let styled = match outcome {
            Outcome::Passed => style(label).green().bold(),
            Outcome::Failed => style(label).red().bold(),
            Outcome::Skipped | Outcome::XFailed => style(label).yellow(),
            Outcome::XPassed => style(label).magenta().bold(),
        };
        styled.to_string()
    }

    fn result_line(&self, result: &ScenarioResult) -> String {
        let case = result.test_case.as_deref().unwrap_or("-");
        let mut line = format!(
            "{:<8} {case:<6} {}::{} ({}ms)",
            self.outcome_label(result.outcome),
            result.product,
            result.name,
            result.duration_ms
        );
        if let Some(message) = &result.message {
            let _ = write!(line, "\n         {message}");
        }
        line
    }

    /// Text rendering of a suite report
    #[must_use]
    pub fn render_report(&self, report: &SuiteReport) -> String {
        let mut out = String::new();
        for result in &report.results {
            if self.quiet && result.outcome != Outcome::Failed {
                continue;
            }
            out.push_str(&self.result_line(result));
            out.push('\n');
            if let Some(diagnostics) = &result.diagnostics {
                if let Some(url) = &diagnostics.url {
                    let _ = writeln!(out, "         at {url}");
                }
                if let Some(path) = &diagnostics.screenshot {
                    let _ = writeln!(out, "         screenshot {}", path.display());
                }
            }
        }
        if report.stopped_early {
            out.push_str("stopped after the first failure\n");
        }

        let status = if report.is_success() { "PASSED" } else { "FAILED" };
        let status = if !self.use_color {
            status.to_string()
        } else if report.is_success() {
            Style::new().green().bold().apply_to(status).to_string()
        } else {
            Style::new().red().bold().apply_to(status).to_string()
        };
        let _ = writeln!(out, "\n{status} {} scenarios: {}", report.total(), report.summary());
        out
    }

    /// Text rendering of a scenario list
    #[must_use]
    pub fn render_list(&self, scenarios: &[&Scenario]) -> String {
        let mut out = String::new();
        for scenario in scenarios {
            let markers = scenario
                .all_markers()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            let case = scenario.test_case.as_deref().unwrap_or("-");
            let name = if self.use_color {
                style(&scenario.name).bold().to_string()
            } else {
                scenario.name.clone()
            };
            let _ = write!(out, "{case:<6} {name} [{markers}]");
            if let Some(reason) = &scenario.skip {
                let _ = write!(out, " (skip: {reason})");
            }
            if let Some(reason) = &scenario.expected_failure {
                let _ = write!(out, " (xfail: {reason})");
            }
            out.push('\n');
        }
        let _ = writeln!(out, "{} scenarios", scenarios.len());
        out
    }
}
