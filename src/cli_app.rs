//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use github_badge::core::cache::BadgeCache;
use github_badge::core::clock::{Clock, SystemClock};
use github_badge::core::config::Config;
use github_badge::core::errors::BadgeError;
use github_badge::core::model::{BadgeData, Page};
use github_badge::feed::orchestrator::{FetchOrchestrator, RefreshTrigger};
use github_badge::feed::transport::{OfflineTransport, ReqwestTransport, Transport};
use github_badge::logger::activity::ActivityLogger;
use github_badge::render::pages::{RenderContext, render_page};
use github_badge::render::qr::default_encoder;
use github_badge::render::surface::CellCanvas;
use github_badge::render::text::FixedWidthFont;
use github_badge::render;
use github_badge::serve::{ServeOptions, serve_blocking};
use github_badge::signals::SignalHandler;
use github_badge::device::terminal::{TerminalInput, TerminalSession, TerminalSurface};
use github_badge::ui::input::ScriptedInput;
use github_badge::ui::runtime::{BadgeRuntime, StopReason};

/// GitHub Badge: profile stats on a small e-ink panel.
#[derive(Debug, Parser)]
#[command(
    name = "badge",
    author,
    version,
    about = "GitHub Badge - e-ink profile stats display",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the interactive badge in the terminal simulator.
    Run(RunArgs),
    /// Run one refresh and print the normalized badge data.
    Fetch(FetchArgs),
    /// Contact every configured source and report status and latency.
    Probe,
    /// Render one page and print its draw commands and a text preview.
    Render(RenderArgs),
    /// View configuration state.
    Config(ConfigArgs),
    /// Serve a local feed directory the way GitHub Pages would.
    Serve(ServeArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PageArg {
    Overview,
    Stats,
    Activity,
    Qr,
}

impl From<PageArg> for Page {
    fn from(value: PageArg) -> Self {
        match value {
            PageArg::Overview => Self::Overview,
            PageArg::Stats => Self::Stats,
            PageArg::Activity => Self::Activity,
            PageArg::Qr => Self::Qr,
        }
    }
}

#[derive(Debug, Clone, Args, Default)]
struct RunArgs {
    /// Boot, draw the first page as text, and exit.
    #[arg(long)]
    once: bool,
    /// Page to start on.
    #[arg(long, value_enum)]
    page: Option<PageArg>,
    /// Never touch the network.
    #[arg(long)]
    offline: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct FetchArgs {
    /// Fall back to demo data instead of failing when every source fails.
    #[arg(long)]
    demo: bool,
}

#[derive(Debug, Clone, Args)]
struct RenderArgs {
    /// Page to render.
    #[arg(long, value_enum, default_value = "overview")]
    page: PageArg,
    /// Skip fetching and render from an empty cache.
    #[arg(long)]
    offline: bool,
    /// Seed demo data when no fetch succeeded.
    #[arg(long)]
    demo: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct ServeArgs {
    /// Directory holding the generated feed files.
    #[arg(long, value_name = "DIR", default_value = "api")]
    dir: PathBuf,
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,
    /// Port to listen on.
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Badge library failure.
    #[error(transparent)]
    Badge(#[from] BadgeError),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }
    let interactive = matches!(&cli.command, Command::Run(args) if !args.once);
    init_tracing(cli, interactive);

    match &cli.command {
        Command::Run(args) => run_badge(cli, args),
        Command::Fetch(args) => run_fetch(cli, args),
        Command::Probe => run_probe(cli),
        Command::Render(args) => run_render(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Serve(args) => run_serve(args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Diagnostics go to stderr. The interactive simulator owns the terminal,
/// so its diagnostics are dropped unless `RUST_LOG` asks for them.
fn init_tracing(cli: &Cli, interactive: bool) {
    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let explicit = std::env::var_os("RUST_LOG").is_some();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(!cli.no_color && io::stderr().is_terminal())
        .with_target(false);
    let installed = if interactive && !explicit {
        builder.with_writer(io::sink).try_init()
    } else {
        builder.with_writer(io::stderr).try_init()
    };
    drop(installed);
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Config::load(cli.config.as_deref()).map_err(|e| match e {
        BadgeError::InvalidConfig { .. }
        | BadgeError::MissingConfig { .. }
        | BadgeError::ConfigParse { .. } => CliError::User(e.to_string()),
        other => CliError::Badge(other),
    })
}

fn transport_for(config: &Config, offline: bool) -> Result<Box<dyn Transport>, CliError> {
    if offline {
        return Ok(Box::new(OfflineTransport));
    }
    Ok(Box::new(ReqwestTransport::new(&config.feed.user_agent)?))
}

fn orchestrator_for(
    config: &Config,
    offline: bool,
    clock: Rc<dyn Clock>,
    logger: ActivityLogger,
) -> Result<FetchOrchestrator, CliError> {
    Ok(FetchOrchestrator::new(
        config,
        transport_for(config, offline)?,
        clock,
        logger,
    ))
}

// ──────────────────── run ────────────────────

fn run_badge(cli: &Cli, args: &RunArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let logger = ActivityLogger::open(config.paths.activity_log.clone());
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let orchestrator = orchestrator_for(&config, args.offline, Rc::clone(&clock), logger.clone())?;
    let start_page = args.page.map_or(Page::Overview, Page::from);
    let (width, height) = (config.display.width, config.display.height);

    if args.once {
        let mut runtime = BadgeRuntime::new(
            config,
            orchestrator,
            CellCanvas::new(width, height),
            ScriptedInput::default(),
            clock,
            logger,
        )
        .start_on(start_page);
        runtime.boot()?;
        let lines = runtime.surface().to_lines();
        runtime.shutdown(StopReason::Quit)?;
        return print_preview(cli, "run", start_page, &lines, None);
    }

    run_terminal(config, orchestrator, clock, logger, start_page)
}

fn run_terminal(
    config: Config,
    orchestrator: FetchOrchestrator,
    clock: Rc<dyn Clock>,
    logger: ActivityLogger,
    start_page: Page,
) -> Result<(), CliError> {
    let signals = SignalHandler::new();
    let surface = TerminalSurface::new(config.display.width, config.display.height);
    let session = TerminalSession::enter()?;
    let mut runtime = BadgeRuntime::new(
        config,
        orchestrator,
        surface,
        TerminalInput::new(),
        clock,
        logger,
    )
    .with_shutdown_flag(signals.flag())
    .start_on(start_page);
    let result = runtime.run();
    drop(session);
    let reason = result?;
    eprintln!("badge stopped ({})", reason.as_str());
    Ok(())
}

// ──────────────────── fetch / probe ────────────────────

fn run_fetch(cli: &Cli, args: &FetchArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let orchestrator = orchestrator_for(&config, false, Rc::clone(&clock), ActivityLogger::disabled())?;
    let mut cache = BadgeCache::new();
    let outcome = orchestrator.refresh(&mut cache, clock.now(), RefreshTrigger::Manual);

    let (data, demo) = match cache.current() {
        Some(data) => (data.clone(), false),
        None if args.demo => (BadgeData::demo(&config.profile.username), true),
        None => {
            let reasons: Vec<String> = outcome.errors.iter().map(ToString::to_string).collect();
            if output_mode(cli) == OutputMode::Json {
                write_json_line(&json!({
                    "command": "fetch",
                    "ok": false,
                    "errors": reasons,
                }))?;
            }
            return Err(CliError::Runtime(format!(
                "all sources failed: {}",
                reasons.join("; ")
            )));
        }
    };

    match output_mode(cli) {
        OutputMode::Json => write_json_line(&json!({
            "command": "fetch",
            "ok": true,
            "source": outcome.source.map(|kind| kind.name()),
            "demo": demo,
            "duration_ms": u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
            "data": serde_json::to_value(&data)?,
        }))?,
        OutputMode::Human => print_badge_data(&data, outcome.source.map(|kind| kind.name())),
    }
    Ok(())
}

fn print_badge_data(data: &BadgeData, source: Option<&str>) {
    let profile = &data.profile;
    let stats = &data.stats;
    println!(
        "{} (@{})  via {}",
        profile.display_name.bold(),
        profile.username,
        source.unwrap_or("demo").cyan()
    );
    println!(
        "  repos {}  followers {}  following {}",
        profile.public_repo_count, profile.follower_count, profile.following_count
    );
    println!(
        "  stars {}  forks {}  avg stars/repo {}",
        stats.total_stars, stats.total_forks, stats.average_stars
    );
    if let Some(language) = stats.top_language() {
        println!("  top language {language}");
    }
    if let Some(top) = &stats.most_starred {
        match top.star_count {
            Some(stars) => println!("  most starred {} ({stars} stars)", top.name),
            None => println!("  most starred {}", top.name),
        }
    }
    if !data.activity.is_empty() {
        println!("  recent activity:");
        for event in &data.activity {
            println!("    {}", event.display_string);
        }
    }
}

fn run_probe(cli: &Cli) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let orchestrator = orchestrator_for(&config, false, clock, ActivityLogger::disabled())?;
    let reports = orchestrator.probe();
    let mode = output_mode(cli);

    for report in &reports {
        let latency_ms = u64::try_from(report.latency.as_millis()).unwrap_or(u64::MAX);
        match mode {
            OutputMode::Json => write_json_line(&json!({
                "command": "probe",
                "source": report.source.name(),
                "url": report.url,
                "latency_ms": latency_ms,
                "ok": report.result.is_ok(),
                "tag": report.result.as_ref().ok().map(|tag| tag.as_str()),
                "error": report.result.as_ref().err().map(ToString::to_string),
            }))?,
            OutputMode::Human => {
                let status = match &report.result {
                    Ok(tag) => format!("ok ({})", tag.as_str()).green(),
                    Err(err) => err.to_string().red(),
                };
                println!(
                    "{:<12} {:>6} ms  {}  {}",
                    report.source.name(),
                    latency_ms,
                    report.url.dimmed(),
                    status
                );
            }
        }
    }

    if reports.iter().any(|report| report.result.is_ok()) {
        Ok(())
    } else {
        Err(CliError::Runtime("no source reachable".to_string()))
    }
}

// ──────────────────── render ────────────────────

fn run_render(cli: &Cli, args: &RenderArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let now = clock.now();
    let mut cache = BadgeCache::new();
    if !args.offline {
        let orchestrator =
            orchestrator_for(&config, false, Rc::clone(&clock), ActivityLogger::disabled())?;
        let outcome = orchestrator.refresh(&mut cache, now, RefreshTrigger::Manual);
        tracing::debug!(source = ?outcome.source, errors = outcome.errors.len(), "render refresh");
    }
    if args.demo && cache.current().is_none() {
        cache.seed_demo(BadgeData::demo(&config.profile.username), now);
    }

    let page = Page::from(args.page);
    let font = FixedWidthFont::BITMAP6;
    let qr = default_encoder();
    let ctx = RenderContext::from_config(&config, &font, qr.as_ref()).at_index(page as usize);
    let commands = render_page(page, &ctx, &cache, now);
    let lines = render::ascii_preview(config.display.width, config.display.height, &commands)?;
    print_preview(
        cli,
        "render",
        page,
        &lines,
        Some(serde_json::to_value(&commands)?),
    )
}

fn print_preview(
    cli: &Cli,
    command: &str,
    page: Page,
    lines: &[String],
    commands: Option<Value>,
) -> Result<(), CliError> {
    match output_mode(cli) {
        OutputMode::Json => write_json_line(&json!({
            "command": command,
            "page": page.name(),
            "preview": lines,
            "commands": commands,
        })),
        OutputMode::Human => {
            let mut stdout = io::stdout().lock();
            if let Some(Value::Array(commands)) = &commands {
                for command in commands {
                    writeln!(stdout, "{}", command.to_string().dimmed())?;
                }
                writeln!(stdout)?;
            }
            let width = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
            let border = format!("+{}+", "-".repeat(width));
            writeln!(stdout, "{border}")?;
            for line in lines {
                writeln!(stdout, "|{line:<width$}|")?;
            }
            writeln!(stdout, "{border}")?;
            Ok(())
        }
    }
}

// ──────────────────── config / serve ────────────────────

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    write_json_line(&json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    }))?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;
            match output_mode(cli) {
                OutputMode::Human => println!("{}", config.to_toml()?),
                OutputMode::Json => write_json_line(&json!({
                    "command": "config show",
                    "config": serde_json::to_value(&config)?,
                }))?,
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": true,
                        "path": config.paths.config_file.to_string_lossy(),
                        "hash": hash,
                    }))?,
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => eprintln!("Configuration is INVALID: {e}"),
                    OutputMode::Json => write_json_line(&json!({
                        "command": "config validate",
                        "valid": false,
                        "error": e.to_string(),
                    }))?,
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

fn run_serve(args: &ServeArgs) -> Result<(), CliError> {
    let options = ServeOptions {
        dir: args.dir.clone(),
        addr: SocketAddr::new(args.bind, args.port),
    };
    eprintln!(
        "serving {} at http://{}/api/ (Ctrl-C to stop)",
        options.dir.display(),
        options.addr
    );
    serve_blocking(&options)?;
    Ok(())
}

// ──────────────────── output ────────────────────

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("BADGE_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
