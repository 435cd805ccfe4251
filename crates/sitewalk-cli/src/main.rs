//! Sitewalk CLI: run page-object browser scenarios
//!
//! ## Usage
//!
//! ```bash
//! sitewalk run                               # Every scenario on the demo site
//! sitewalk run --systems web -m "not social" # Select by product and markers
//! sitewalk run --driver chromium --headed    # Real browser (feature `browser`)
//! sitewalk list -m smoke                     # Show what would run
//! sitewalk config -c sitewalk.yaml           # Show the resolved configuration
//! ```

use clap::Parser;
use sitewalk_cli::{
    init_tracing, list_scenarios, render_config, run_suite, Cli, CliError, CliResult, Commands,
    FormatArg, Reporter,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ScenariosFailed { .. }) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);
    let reporter = Reporter::new(cli.color.should_color(), cli.quiet);

    match cli.command {
        Commands::Run(args) => {
            let report = run_suite(&args)?;
            match args.format {
                FormatArg::Text => print!("{}", reporter.render_report(&report)),
                FormatArg::Json => println!("{}", report.to_json()?),
            }
            if report.is_success() {
                Ok(())
            } else {
                Err(CliError::ScenariosFailed {
                    failed: report.failed(),
                })
            }
        }
        Commands::List(args) => {
            println!("{}", list_scenarios(&args, &reporter)?.trim_end());
            Ok(())
        }
        Commands::Config(args) => {
            print!("{}", render_config(&args)?);
            Ok(())
        }
    }
}
