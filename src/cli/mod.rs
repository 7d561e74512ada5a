//! Command-line interface module

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversion::config::{ConversionConfig, FailurePolicy};
use crate::conversion::converter::DEFAULT_CONVERTER;
use crate::error::{ConversionError, ConversionResult};

pub mod path_mapping;

use path_mapping::DirectoryPair;

/// Main CLI arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "epubconv")]
#[command(about = "Batch convert PDF files to EPUB with calibre's ebook-convert")]
#[command(version)]
#[command(long_about = None)]
pub struct Args {
    /// Directory containing the PDF files (default: current directory)
    #[arg(long)]
    pub target: Option<PathBuf>,

    /// Directory for the EPUB files (default: the target directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of files converted at once (default: logical cores minus one)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// ebook-convert executable to run
    #[arg(long, default_value = DEFAULT_CONVERTER)]
    pub converter: PathBuf,

    /// Maximum seconds a single conversion may take
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Continue converting other files when one file fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// Output batch statistics
    #[arg(long)]
    pub stats: bool,

    /// Format of the batch statistics
    #[arg(long, value_enum, default_value_t = StatsFormat::Text)]
    pub stats_format: StatsFormat,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(long)]
    pub quiet: bool,

    /// Subcommands for advanced operations
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check that ebook-convert is installed and print its version
    Check,
}

/// Statistics output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsFormat {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

/// CLI configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub args: Args,
    pub dirs: DirectoryPair,
    pub conversion_config: ConversionConfig,
}

impl CliConfig {
    /// Create CLI configuration from arguments, resolving paths against the
    /// current directory
    pub fn from_args(args: Args) -> ConversionResult<Self> {
        let base = std::env::current_dir()
            .map_err(ConversionError::WorkingDirectory)?;
        Self::from_args_with_base(args, &base)
    }

    /// Create CLI configuration from arguments, resolving paths against `base`
    pub fn from_args_with_base(args: Args, base: &Path) -> ConversionResult<Self> {
        let dirs = DirectoryPair::resolve(base, args.target.as_deref(), args.output.as_deref());
        let conversion_config = Self::create_conversion_config(&args)?;

        Ok(Self {
            args,
            dirs,
            conversion_config,
        })
    }

    /// Create conversion configuration from CLI arguments
    fn create_conversion_config(args: &Args) -> ConversionResult<ConversionConfig> {
        let mut config = ConversionConfig::default()
            .with_converter_path(args.converter.clone())
            .with_failure_policy(FailurePolicy::from_continue_flag(args.continue_on_error))
            .with_timeout(args.timeout.map(Duration::from_secs))
            .with_progress(!args.quiet);

        if let Some(jobs) = args.jobs {
            config = config.with_concurrency(jobs);
        }

        // Validate configuration
        config.validate().map_err(ConversionError::configuration)?;

        Ok(config)
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.args.quiet
    }

    /// Check if stats output is requested
    pub fn want_stats(&self) -> bool {
        self.args.stats
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.args.verbose {
            "epubconv=debug"
        } else if self.args.quiet {
            "epubconv=error"
        } else {
            "epubconv=warn"
        }
    }
}

/// CLI utilities and helpers
pub struct CliUtils;

impl CliUtils {
    /// Format a duration in human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_millis = duration.as_millis();

        if total_millis < 1000 {
            format!("{}ms", total_millis)
        } else if total_millis < 60_000 {
            format!("{:.1}s", total_millis as f64 / 1000.0)
        } else {
            let minutes = total_millis / 60_000;
            let seconds = (total_millis % 60_000) / 1000;
            format!("{}m {}s", minutes, seconds)
        }
    }

    /// Show a success message (if not in quiet mode)
    pub fn show_success(message: &str, quiet: bool) {
        if !quiet {
            println!("✓ {}", message);
        }
    }

    /// Show an error message
    pub fn show_error(message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Show a warning message (if not in quiet mode)
    pub fn show_warning(message: &str, quiet: bool) {
        if !quiet {
            eprintln!("⚠ {}", message);
        }
    }
}

/// Handle CLI errors with user-friendly messages
pub fn handle_error(error: &ConversionError) {
    CliUtils::show_error(&error.user_message());

    // Provide helpful suggestions
    match error {
        ConversionError::Job(_) => {
            eprintln!("\nTip: Use --continue-on-error to convert the remaining files anyway");
        }
        ConversionError::TargetUnreadable { .. } => {
            eprintln!("\nTip: Use --target to point at the directory holding your PDF files");
        }
        _ => {}
    }
}
