//! CLI configuration

use crate::commands::RunArgs;
use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use settle::HarnessConfig;
use std::path::Path;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - failures and summary only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a level
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "settle=info,settle_cli=info",
            Self::Debug => "settle=debug,settle_cli=debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors on stderr
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stderr().features().colors_supported(),
        }
    }
}

/// Presentation and scheduling settings that never reach the library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Scenarios run at once (0 = auto-detect)
    pub jobs: usize,
    /// Stop at the first scenario that does not pass
    pub fail_fast: bool,
    /// Result format on stdout
    pub format: OutputFormat,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            jobs: 1,
            fail_fast: false,
            format: OutputFormat::Text,
        }
    }
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set concurrent scenarios
    #[must_use]
    pub const fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set fail fast
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set output format
    #[must_use]
    pub const fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Effective number of concurrent scenarios
    #[must_use]
    #[allow(clippy::redundant_closure_for_method_calls)] // NonZero::get as a path needs MSRV 1.79
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.jobs
        }
    }
}

/// Load the harness configuration from an optional YAML file
pub fn load_harness_config(path: Option<&Path>) -> CliResult<HarnessConfig> {
    match path {
        Some(path) if !path.is_file() => Err(CliError::config(format!(
            "config file not found: {}",
            path.display()
        ))),
        Some(path) => Ok(HarnessConfig::load(path)?),
        None => Ok(HarnessConfig::default()),
    }
}

/// Apply `run` flags on top of a loaded configuration
pub fn apply_run_args(mut config: HarnessConfig, args: &RunArgs) -> CliResult<HarnessConfig> {
    if let Some(target) = &args.target {
        config.target = Some(target.clone());
    }
    if let Some(output) = &args.output {
        config.output_dir.clone_from(output);
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(chromium) = &args.chromium {
        config.browser.chromium_path = Some(chromium.clone());
    }
    if args.no_sandbox {
        config.browser.sandbox = false;
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::commands::{Cli, Commands};
    use clap::Parser;
    use std::path::PathBuf;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["settle", "run"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    mod verbosity_tests {
        use super::*;

        #[test]
        fn test_from_flags() {
            assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
            assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
            assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
            assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Debug);
        }

        #[test]
        fn test_predicates() {
            assert!(Verbosity::Quiet.is_quiet());
            assert!(!Verbosity::Normal.is_verbose());
            assert!(Verbosity::Debug.is_verbose());
        }

        #[test]
        fn test_log_filter() {
            assert_eq!(Verbosity::Normal.log_filter(), "warn");
            assert!(Verbosity::Debug.log_filter().contains("settle=debug"));
        }
    }

    mod cli_config_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let config = CliConfig::new();
            assert_eq!(config.jobs, 1);
            assert_eq!(config.effective_jobs(), 1);
            assert!(!config.fail_fast);
            assert_eq!(config.format, OutputFormat::Text);
        }

        #[test]
        fn test_auto_jobs() {
            assert!(CliConfig::new().with_jobs(0).effective_jobs() >= 1);
        }

        #[test]
        fn test_color_choice() {
            assert!(ColorChoice::Always.should_color());
            assert!(!ColorChoice::Never.should_color());
        }
    }

    mod harness_config_tests {
        use super::*;

        #[test]
        fn test_flags_override_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settle.yaml");
            std::fs::write(&path, "target: from-file.html\nbrowser:\n  headless: true\n").unwrap();
            let loaded = load_harness_config(Some(&path)).unwrap();
            let args = run_args(&["--target", "index.html", "--headed", "--no-sandbox", "-o", "out"]);
            let config = apply_run_args(loaded, &args).unwrap();
            assert_eq!(config.target.as_deref(), Some("index.html"));
            assert!(!config.browser.headless);
            assert!(!config.browser.sandbox);
            assert_eq!(config.output_dir, PathBuf::from("out"));
        }

        #[test]
        fn test_file_values_survive_without_flags() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("settle.yaml");
            std::fs::write(&path, "target: from-file.html\n").unwrap();
            let loaded = load_harness_config(Some(&path)).unwrap();
            let config = apply_run_args(loaded, &run_args(&[])).unwrap();
            assert_eq!(config.target.as_deref(), Some("from-file.html"));
        }

        #[test]
        fn test_missing_file_is_usage_error() {
            let err = load_harness_config(Some(Path::new("/nonexistent/settle.yaml"))).unwrap_err();
            assert_eq!(err.exit_code(), 2);
        }
    }
}
