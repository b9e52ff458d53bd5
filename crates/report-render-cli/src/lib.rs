use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use report_render::{RenderError, ReportRenderer, ReportView};
use report_render_config::{Config, LoadOptions};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    NotFound = 2,
}

#[derive(Parser)]
#[command(name = "report-render", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file taking precedence over discovered ones
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the whole report as one HTML fragment
    Html(InputArgs),
    /// List the navigable sections of a report
    Sections(SectionsArgs),
    /// Render one section by identifier
    Section(SectionArgs),
    /// Render the executive-summary overview
    Overview(InputArgs),
    /// Print the complete rendered view as JSON
    View(InputArgs),
}

#[derive(Args)]
struct InputArgs {
    /// Path to the report, or `-` for stdin
    #[arg(value_name = "FILE")]
    path: PathBuf,
}

#[derive(Args)]
struct SectionsArgs {
    #[command(flatten)]
    input: InputArgs,

    #[arg(long, value_enum)]
    format: Option<ListFormat>,
}

#[derive(Args)]
struct SectionArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Section identifier as printed by `sections`
    #[arg(value_name = "ID")]
    identifier: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ListFormat {
    Plain,
    Json,
}

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut options = LoadOptions::default();
    if let Some(path) = &cli.config {
        options = options.with_override_path(path);
    }
    let config = Config::load(options)?;
    let renderer = ReportRenderer::new(config.render_options())?
        .with_shared_sanitizer(config.output.sanitize.sanitizer());
    debug!(sanitize = %config.output.sanitize, "renderer ready");

    match cli.command {
        Command::Html(args) => handle_html(&renderer, args),
        Command::Sections(args) => handle_sections(&renderer, args),
        Command::Section(args) => handle_section(&renderer, args),
        Command::Overview(args) => handle_overview(&renderer, args),
        Command::View(args) => handle_view(&renderer, args),
    }
}

fn handle_html(renderer: &ReportRenderer, args: InputArgs) -> Result<i32> {
    let report = read_report(&args.path)?;
    emit(&renderer.render_fragment(&report))?;
    Ok(ExitCode::Success as i32)
}

fn handle_sections(renderer: &ReportRenderer, args: SectionsArgs) -> Result<i32> {
    let report = read_report(&args.input.path)?;
    let view = renderer.render_report(&report);

    if let ReportView::Whole { .. } = view {
        eprintln!("No sections found in {}", args.input.path.display());
        return Ok(ExitCode::Failure as i32);
    }

    let rendered = match args.format.unwrap_or(ListFormat::Plain) {
        ListFormat::Plain => view
            .navigation()
            .iter()
            .map(|entry| format!("{}\t{}", entry.identifier, entry.title))
            .collect::<Vec<_>>()
            .join("\n"),
        ListFormat::Json => serde_json::to_string_pretty(view.navigation())?,
    };

    emit(&rendered)?;
    Ok(ExitCode::Success as i32)
}

fn handle_section(renderer: &ReportRenderer, args: SectionArgs) -> Result<i32> {
    let report = read_report(&args.input.path)?;
    let view = renderer.render_report(&report);

    match view.fragment(&args.identifier) {
        Ok(section) => {
            emit(&section.html)?;
            Ok(ExitCode::Success as i32)
        }
        Err(err @ RenderError::SectionNotFound { .. }) => {
            eprintln!("{err}");
            let available: Vec<_> = view
                .overview()
                .into_iter()
                .map(|section| section.identifier.as_str())
                .chain(view.navigation().iter().map(|entry| entry.identifier.as_str()))
                .collect();
            if !available.is_empty() {
                eprintln!("Available sections:");
                for identifier in available {
                    eprintln!("  - {identifier}");
                }
            }
            Ok(ExitCode::NotFound as i32)
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_overview(renderer: &ReportRenderer, args: InputArgs) -> Result<i32> {
    let report = read_report(&args.path)?;
    let view = renderer.render_report(&report);

    match view.overview() {
        Some(section) => {
            emit(&section.html)?;
            Ok(ExitCode::Success as i32)
        }
        None => {
            eprintln!("No executive summary found in {}", args.path.display());
            Ok(ExitCode::NotFound as i32)
        }
    }
}

fn handle_view(renderer: &ReportRenderer, args: InputArgs) -> Result<i32> {
    let report = read_report(&args.path)?;
    let view = renderer.render_report(&report);
    emit(&serde_json::to_string_pretty(&view)?)?;
    Ok(ExitCode::Success as i32)
}

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "report_render=warn",
        1 => "report_render=debug",
        _ => "report_render=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Keep any subscriber installed by an embedding process.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn read_report(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut report = String::new();
        io::stdin()
            .lock()
            .read_to_string(&mut report)
            .context("Unable to read report from stdin")?;
        return Ok(report);
    }

    fs::read_to_string(path)
        .with_context(|| format!("Unable to read report at path: {}", path.display()))
}

fn emit(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match writeln!(handle, "{text}") {
        Ok(_) => {}
        Err(err) if should_ignore_pipe_error(&err) => return Ok(()),
        Err(err) => return Err(err).context("Failed to write output"),
    }

    match handle.flush() {
        Ok(_) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err).context("Failed to flush stdout"),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}
