//! Sitewalk CLI Library
//!
//! Command-line front end for running the bundled scenarios.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod error;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ConfigSource, DriverArg, FormatArg, ListArgs, RunArgs,
};
pub use error::{CliError, CliResult};
pub use output::Reporter;

use sitewalk::fake::demo;
use sitewalk::{FakeSessionFactory, SessionFactory, Suite, SuiteConfig, SuiteReport};
use tracing_subscriber::EnvFilter;

const MASKED_PASSWORD: &str = "********";

/// Install the log subscriber; `RUST_LOG` wins over the `-v` count
pub fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitewalk={level},sitewalk_cli={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn session_factory(
    driver: DriverArg,
    config: &mut SuiteConfig,
) -> CliResult<Box<dyn SessionFactory>> {
    match driver {
        DriverArg::Fake => {
            demo::add_missing_credentials(config);
            Ok(Box::new(FakeSessionFactory::demo(config)?))
        }
        #[cfg(feature = "browser")]
        DriverArg::Chromium => Ok(Box::new(sitewalk::ChromiumSessionFactory::default())),
        #[cfg(not(feature = "browser"))]
        DriverArg::Chromium => Err(CliError::invalid_argument(
            "chromium driver not enabled. Rebuild with --features browser",
        )),
    }
}

/// Run the selected scenarios
pub fn run_suite(args: &RunArgs) -> CliResult<SuiteReport> {
    let mut config = args.source.resolve()?;
    let factory = session_factory(args.driver, &mut config)?;
    let mut suite = Suite::new(sitewalk::suite::catalog()).with_fail_fast(args.fail_fast);
    if let Some(filter) = args.filter()? {
        suite = suite.with_filter(filter);
    }
    tracing::debug!(driver = ?args.driver, "running suite");
    Ok(suite.run(config, factory.as_ref()))
}

/// Render the scenarios a run would select
pub fn list_scenarios(args: &ListArgs, reporter: &Reporter) -> CliResult<String> {
    let config = args.source.resolve()?;
    let mut suite = Suite::new(sitewalk::suite::catalog());
    if let Some(filter) = args.filter()? {
        suite = suite.with_filter(filter);
    }
    let selected = suite.selected(&config);
    match args.format {
        FormatArg::Text => Ok(reporter.render_list(&selected)),
        FormatArg::Json => {
            let entries: Vec<serde_json::Value> = selected
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "name": s.name,
                        "product": s.product,
                        "test_case": s.test_case,
                        "markers": s.all_markers(),
                        "skip": s.skip,
                        "expected_failure": s.expected_failure,
                    })
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
    }
}

/// The resolved configuration as YAML, passwords masked
pub fn render_config(args: &ConfigArgs) -> CliResult<String> {
    let mut config = args.source.resolve()?;
    for credentials in config.credentials.values_mut() {
        credentials.password = MASKED_PASSWORD.to_string();
    }
    Ok(serde_yaml_ng::to_string(&config)?)
}
