//! CLI command definitions using clap

use crate::error::{CliError, CliResult};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sitewalk::{parse_systems, Instance, MarkerFilter, SuiteConfig};
use std::path::PathBuf;

/// Sitewalk: page-object browser tests for the web products
#[derive(Parser, Debug)]
#[command(name = "sitewalk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios
    Run(RunArgs),

    /// List scenarios with their markers and case ids
    List(ListArgs),

    /// Print the resolved configuration
    Config(ConfigArgs),
}

/// Where the suite configuration comes from
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigSource {
    /// YAML configuration file
    #[arg(short, long, env = "SITEWALK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Deployment to test (local, dev, qa, staging, prod)
    #[arg(long)]
    pub instance: Option<String>,

    /// Comma separated products to test (web, accounts, tutor, payments)
    #[arg(long)]
    pub systems: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Directory for failure screenshots
    #[arg(long)]
    pub artifacts: Option<PathBuf>,
}

impl ConfigSource {
    /// Defaults, then the YAML file, then the environment, then flags
    pub fn resolve(&self) -> CliResult<SuiteConfig> {
        let base = match &self.config {
            Some(path) => SuiteConfig::from_file(path)?,
            None => SuiteConfig::new(),
        };
        let mut config = base.with_process_env()?;
        self.apply(&mut config)?;
        Ok(config)
    }

    /// Apply the command-line overrides
    pub fn apply(&self, config: &mut SuiteConfig) -> CliResult<()> {
        if let Some(instance) = &self.instance {
            config.instance = instance.parse::<Instance>()?;
        }
        if let Some(systems) = &self.systems {
            config.systems = parse_systems(systems)?;
        }
        if self.headed {
            config.headless = false;
        }
        if let Some(dir) = &self.artifacts {
            config.artifacts_dir = Some(dir.clone());
        }
        Ok(())
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Configuration sources
    #[command(flatten)]
    pub source: ConfigSource,

    /// Marker expression, e.g. "web and not social"
    #[arg(short, long)]
    pub markers: Option<String>,

    /// Browser driver
    #[arg(long, default_value = "fake")]
    pub driver: DriverArg,

    /// Stop after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Report format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

impl RunArgs {
    /// Parsed marker expression
    pub fn filter(&self) -> CliResult<Option<MarkerFilter>> {
        parse_filter(self.markers.as_deref())
    }
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Configuration sources
    #[command(flatten)]
    pub source: ConfigSource,

    /// Marker expression, e.g. "smoke"
    #[arg(short, long)]
    pub markers: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: FormatArg,
}

impl ListArgs {
    /// Parsed marker expression
    pub fn filter(&self) -> CliResult<Option<MarkerFilter>> {
        parse_filter(self.markers.as_deref())
    }
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration sources
    #[command(flatten)]
    pub source: ConfigSource,
}

fn parse_filter(expr: Option<&str>) -> CliResult<Option<MarkerFilter>> {
    expr.map(MarkerFilter::parse)
        .transpose()
        .map_err(|e| CliError::invalid_argument(e.to_string()))
}

/// Browser driver choice
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverArg {
    /// In-memory browser against the bundled demo site
    #[default]
    Fake,
    /// Local Chromium (needs the `browser` feature)
    Chromium,
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorArg {
    /// Whether to color stdout
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = Cli::try_parse_from(["sitewalk", "run"]).unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.driver, DriverArg::Fake);
            assert_eq!(args.format, FormatArg::Text);
            assert!(!args.fail_fast);
            assert!(args.markers.is_none());
            assert_eq!(cli.verbose, 0);
        }

        #[test]
        fn test_run_with_options() {
            let cli = Cli::try_parse_from([
                "sitewalk",
                "-vv",
                "run",
                "--systems",
                "web,accounts",
                "-m",
                "smoke and not social",
                "--driver",
                "chromium",
                "--fail-fast",
                "--format",
                "json",
                "--headed",
            ])
            .unwrap();
            assert_eq!(cli.verbose, 2);
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.driver, DriverArg::Chromium);
            assert_eq!(args.format, FormatArg::Json);
            assert!(args.fail_fast);
            assert!(args.source.headed);
            assert_eq!(args.source.systems.as_deref(), Some("web,accounts"));
            assert!(args.filter().unwrap().is_some());
        }

        #[test]
        fn test_unknown_driver_rejected() {
            assert!(Cli::try_parse_from(["sitewalk", "run", "--driver", "netscape"]).is_err());
        }

        #[test]
        fn test_subcommand_required() {
            assert!(Cli::try_parse_from(["sitewalk"]).is_err());
        }

        #[test]
        fn test_list_and_config() {
            let cli = Cli::try_parse_from(["sitewalk", "list", "-m", "tutor"]).unwrap();
            assert!(matches!(cli.command, Commands::List(_)));
            let cli = Cli::try_parse_from(["sitewalk", "config", "--instance", "staging"]).unwrap();
            let Commands::Config(args) = cli.command else {
                panic!("expected config");
            };
            assert_eq!(args.source.instance.as_deref(), Some("staging"));
        }
    }

    mod config_source_tests {
        use super::*;
        use sitewalk::Product;

        #[test]
        fn test_flags_override_config() {
            let source = ConfigSource {
                instance: Some("qa".into()),
                systems: Some("tutor, payments".into()),
                headed: true,
                artifacts: Some(PathBuf::from("target/shots")),
                ..ConfigSource::default()
            };
            let mut config = SuiteConfig::new();
            source.apply(&mut config).unwrap();
            assert_eq!(config.instance, Instance::Qa);
            assert_eq!(config.systems, vec![Product::Tutor, Product::Payments]);
            assert!(!config.headless);
            assert_eq!(config.artifacts_dir, Some(PathBuf::from("target/shots")));
        }

        #[test]
        fn test_unknown_system_rejected() {
            let source = ConfigSource {
                systems: Some("web,intranet".into()),
                ..ConfigSource::default()
            };
            let mut config = SuiteConfig::new();
            assert!(source.apply(&mut config).is_err());
        }

        #[test]
        fn test_bad_marker_expression() {
            let err = parse_filter(Some("web and")).unwrap_err();
            assert!(matches!(err, CliError::InvalidArgument { .. }));
            assert!(parse_filter(None).unwrap().is_none());
        }
    }
}
