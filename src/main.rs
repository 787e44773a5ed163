use anyhow::{Context, Result};
use log::{error, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use bisubs::app_config::{LogLevel, MergeConfig};
use bisubs::app_controller::{Controller, JobSpec};
use bisubs::file_utils::FileManager;
use bisubs::formats;

/// A simple custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn print_usage(program: &str) {
    eprintln!("Usage:");
    eprintln!("  {} <video-file> [output-path]", program);
    eprintln!("  {} <video-file> <primary.srt> <secondary.srt> [output-path]", program);
    eprintln!("  {} <directory>            batch mode over every video inside", program);
    eprintln!();
    eprintln!("Configuration is read from conf.json (created on first run).");
}

/// Reject paths with shell-hostile characters before they reach any
/// subprocess argument list.
fn sanitized(path_str: &str) -> Result<PathBuf> {
    if path_str.contains("..") || path_str.contains('|') || path_str.contains(';') {
        anyhow::bail!("Path contains potentially unsafe characters: {}", path_str);
    }
    Ok(PathBuf::from(path_str))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so the logger gets the right level.
    let config_path = "conf.json";
    let config = if FileManager::file_exists(config_path) {
        MergeConfig::from_file(config_path).with_context(|| "Failed to load configuration")?
    } else {
        println!("Configuration file not found, creating default at {}", config_path);
        MergeConfig::create_default_file(config_path)?
    };

    let log_level = match config.log_level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    };
    if let Err(e) = CustomLogger::init(log_level) {
        eprintln!("Logger init failed: {}", e);
        process::exit(1);
    }

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        error!("Missing required input path argument");
        print_usage(&args[0]);
        process::exit(1);
    }

    let input = sanitized(&args[1])?;
    if !input.exists() {
        error!("Input path not found: {:?}", input);
        process::exit(1);
    }

    let controller = Controller::with_config(config.clone())?;

    if input.is_dir() {
        let summary = controller.run_batch(&input).await?;
        if summary.failed > 0 {
            process::exit(1);
        }
        return Ok(());
    }

    let job = build_job(&input, &args)?;
    match controller.run_job(&job).await {
        Ok(report) => {
            for warning in &report.warnings {
                warn!("{}", warning);
            }
            info!(
                "Done: {} event(s) written to {:?}",
                report.merged_events, report.output_path
            );
            Ok(())
        }
        Err(e) => {
            // Single-line reason on stderr; details are in the log above.
            error!("{}", e);
            process::exit(1);
        }
    }
}

/// Interpret the positional arguments after the input path.
fn build_job(input: &Path, args: &[String]) -> Result<JobSpec> {
    let mut job = if formats::FormatKind::from_path(input).is_some() {
        // The input itself is a subtitle file; expect its counterpart next.
        let counterpart = args
            .get(2)
            .map(|s| sanitized(s))
            .transpose()?
            .context("A second subtitle file is required when merging two files")?;
        JobSpec::for_files(input, counterpart)
    } else {
        JobSpec::for_video(input)
    };

    match args.len() {
        0..=2 => {}
        3 => {
            if job.video.is_some() {
                job.output = Some(sanitized(&args[2])?);
            }
        }
        4 => {
            if job.video.is_some() {
                job.primary_subtitle = Some(sanitized(&args[2])?);
                job.secondary_subtitle = Some(sanitized(&args[3])?);
            } else {
                job.output = Some(sanitized(&args[3])?);
            }
        }
        _ => {
            if job.video.is_some() {
                job.primary_subtitle = Some(sanitized(&args[2])?);
                job.secondary_subtitle = Some(sanitized(&args[3])?);
                job.output = Some(sanitized(&args[4])?);
            } else {
                job.output = Some(sanitized(&args[3])?);
            }
            if args.len() > 5 {
                warn!("Extra arguments ignored");
            }
        }
    }
    Ok(job)
}
