use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use epubconv::cli::{handle_error, Args, CliConfig, CliUtils, Commands, StatsFormat};
use epubconv::conversion::{BatchOutcome, BatchReport, EpubConverter};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match CliConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            handle_error(&e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);

    match run(&config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            match e.downcast_ref::<epubconv::ConversionError>() {
                Some(err) => handle_error(err),
                None => CliUtils::show_error(&format!("{:#}", e)),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &CliConfig) {
    // Respect RUST_LOG if set, otherwise derive the filter from --verbose/--quiet
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Returns whether the run succeeded
async fn run(config: &CliConfig) -> Result<bool> {
    let converter = EpubConverter::new(config.dirs.clone(), config.conversion_config.clone())?;

    let version = converter.check_converter().await?;
    if matches!(config.args.command, Some(Commands::Check)) {
        println!("{}", version);
        return Ok(true);
    }
    tracing::debug!(%version, "converter available");

    match converter.convert().await? {
        BatchOutcome::NoInputFiles { target } => {
            CliUtils::show_error(&format!(
                "Target path ({}) does not include any file with '.{}' extension",
                target.display(),
                config.conversion_config.source_extension
            ));
            Ok(false)
        }
        BatchOutcome::Completed(report) => {
            print_report(&report, config)?;
            Ok(report.is_success())
        }
    }
}

fn print_report(report: &BatchReport, config: &CliConfig) -> Result<()> {
    let quiet = config.is_quiet();

    if report.failures.is_empty() && report.skipped.is_empty() {
        CliUtils::show_success(
            &format!(
                "Converted {} file(s) into {} in {}",
                report.converted.len(),
                config.dirs.output.display(),
                CliUtils::format_duration(report.elapsed)
            ),
            quiet,
        );
    } else {
        for failure in &report.failures {
            CliUtils::show_error(&format!(
                "{} failed during {}: {}",
                failure.file_name, failure.stage, failure.cause
            ));
        }
        for name in &report.skipped {
            CliUtils::show_error(&format!(
                "{} skipped: file name is not valid UTF-8, rename it and run again",
                name
            ));
        }
        CliUtils::show_warning(
            &format!(
                "Converted {} of {} file(s)",
                report.converted.len(),
                report.total
            ),
            quiet,
        );
    }

    if config.want_stats() {
        let summary = report.summary();
        match config.args.stats_format {
            StatsFormat::Text => println!("\n{}", summary.to_text()),
            StatsFormat::Json => println!(
                "{}",
                summary.to_json().context("Failed to serialize statistics")?
            ),
        }
    }

    Ok(())
}
