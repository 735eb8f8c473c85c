//! Settle CLI: run UI verification scenarios against a browser-hosted game
//!
//! ## Usage
//!
//! ```bash
//! settle list                                   # Registered scenarios
//! settle run --target index.html                # Run every scenario
//! settle run focus-menu ui-layout -t index.html # Run selected scenarios
//! settle config --config settle.yaml            # Effective configuration
//! ```
//!
//! Exit status is 0 when every scenario passes, 1 when any fails or errors,
//! and 2 for usage or configuration errors.

use clap::Parser;
use settle::{ChromiumLauncher, ScenarioRegistry};
use settle_cli::{
    apply_run_args, load_harness_config, logging, Cli, CliConfig, CliError, CliResult, ColorChoice,
    Commands, ConfigArgs, OutputFormat, RunArgs, RunSession, Verbosity,
};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::warn;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();

    match run(cli.command, verbosity, color) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(command: Commands, verbosity: Verbosity, color: ColorChoice) -> CliResult<()> {
    let json_logs = matches!(&command, Commands::Run(args) if OutputFormat::from(args.format) == OutputFormat::Json);
    logging::init(verbosity, color, json_logs);

    match command {
        Commands::Run(args) => {
            let config = CliConfig::new()
                .with_verbosity(verbosity)
                .with_color(color)
                .with_jobs(args.jobs)
                .with_fail_fast(args.fail_fast)
                .with_format(args.format.into());
            run_scenarios(config, &args)
        }
        Commands::List => {
            run_list();
            Ok(())
        }
        Commands::Config(args) => run_config(&args),
    }
}

fn run_scenarios(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let harness = apply_run_args(load_harness_config(args.config.as_deref())?, args)?;
    harness.target()?;
    let registry = ScenarioRegistry::builtin();
    let format = config.format;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(async {
        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling scenarios");
                on_interrupt.cancel();
            }
        });
        RunSession::new(config)
            .execute(ChromiumLauncher, harness, &registry, &args.names, cancel)
            .await
    })?;

    if format == OutputFormat::Json {
        println!("{}", report.to_json()?);
    }
    report.into_outcome().map(|_| ())
}

fn run_list() {
    let registry = ScenarioRegistry::builtin();
    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
    for scenario in registry.iter() {
        println!("{:width$}  {}", scenario.name(), scenario.description());
    }
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let config = load_harness_config(args.config.as_deref())?;
    let yaml = config
        .to_yaml()
        .map_err(|e| CliError::config(e.to_string()))?;
    print!("{yaml}");
    Ok(())
}
