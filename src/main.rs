use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use formfuse_cli::{
    handle, load_config, AppConfig, CollectingEvents, ControlPlan, FillEngine, TriggerRequest,
    TriggerResponse,
};
use formfuse_profile::{default_profile, FileProfileStore, Profile, ProfileStore};
use perceiver_form::PageDom;
use serde::Serialize;
use serde_json::Value;
use tool_fill::{ControlReport, Decision};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// FormFuse - job-application form autofill
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Log line format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Yaml,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one fill pass over an HTML page
    Fill(FillArgs),

    /// Inspect or edit the stored profile
    Profile(ProfileArgs),

    /// Show which attribute each control resolves to, without filling
    Match(MatchArgs),

    /// Show build information
    Version,
}

#[derive(Args)]
struct FillArgs {
    /// HTML page to fill
    #[arg(long, value_name = "FILE")]
    page: PathBuf,

    /// Write the filled page here
    #[arg(long, value_name = "FILE")]
    write: Option<PathBuf>,

    /// Insert the on-page trigger button before filling
    #[arg(long)]
    trigger: bool,

    /// Print one line per scanned control
    #[arg(long)]
    verbose_report: bool,
}

#[derive(Args)]
struct MatchArgs {
    /// HTML page to inspect
    #[arg(long, value_name = "FILE")]
    page: PathBuf,
}

#[derive(Args)]
struct ProfileArgs {
    #[command(subcommand)]
    action: ProfileAction,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Show the stored profile
    Show,

    /// Show where the profile is stored
    Path,

    /// Set one attribute
    Set {
        /// Dotted attribute path, e.g. identity.email
        path: String,

        /// New value
        value: String,
    },

    /// Replace the profile with a JSON file
    Import {
        /// JSON file, nested tree or `formFuseProfile` envelope
        file: PathBuf,
    },

    /// Reset the profile to defaults
    Reset,
}

#[derive(Serialize)]
struct FillOutput {
    #[serde(flatten)]
    response: TriggerResponse,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    controls: Vec<ControlReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_format)?;
    info!("Starting FormFuse v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    let result = match cli.command {
        Commands::Fill(args) => cmd_fill(args, &config, cli.output).await,
        Commands::Profile(args) => cmd_profile(args, &config, cli.output),
        Commands::Match(args) => cmd_match(args, &config, cli.output),
        Commands::Version => cmd_version(cli.output),
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }

    Ok(())
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, human: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Human => println!("{}", human()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

fn profile_store(config: &AppConfig) -> Result<FileProfileStore> {
    let path = config
        .profile_path()
        .context("Failed to resolve profile location")?;
    Ok(FileProfileStore::new(path))
}

async fn cmd_fill(args: FillArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let mut page = PageDom::from_path(&args.page).context("Failed to load page")?;
    let store = profile_store(config)?;
    let events = Arc::new(CollectingEvents::new());
    let engine = FillEngine::from_config(config).with_events(events.clone());

    if args.trigger {
        let toggled = handle(
            &engine,
            &mut page,
            &store,
            TriggerRequest::ToggleTrigger { visible: true },
        )
        .await;
        if !toggled.ok() {
            bail!("Failed to insert the trigger button");
        }
    }

    let response = handle(&engine, &mut page, &store, TriggerRequest::Fill).await;

    if let Some(out) = &args.write {
        tokio::fs::write(out, page.to_html())
            .await
            .with_context(|| format!("Failed to write {}", out.display()))?;
        info!("Filled page written to: {}", out.display());
    }

    let controls = if args.verbose_report {
        events.take()
    } else {
        Vec::new()
    };
    let ok = response.ok();
    let status = match &response {
        TriggerResponse::Fill(fill) => fill.status_line(),
        TriggerResponse::Trigger { .. } => String::new(),
    };
    let report = FillOutput { response, controls };
    emit(output, &report, || {
        let mut lines = vec![status.clone()];
        lines.extend(report.controls.iter().map(format_report));
        lines.join("\n")
    })?;

    if !ok {
        bail!("{status}");
    }
    Ok(())
}

fn format_report(report: &ControlReport) -> String {
    let kind = report.kind.map(|k| k.label()).unwrap_or("-");
    let path = report.path.as_deref().unwrap_or("-");
    let decision = match &report.decision {
        Decision::Filled => "filled".to_string(),
        Decision::Skipped { reason } => format!("skipped ({})", reason.label()),
    };
    format!("  {:<6} {:<10} {:<34} {}", report.control.to_string(), kind, path, decision)
}

fn cmd_match(args: MatchArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let page = PageDom::from_path(&args.page).context("Failed to load page")?;
    let engine = FillEngine::from_config(config);
    let plans = engine.plan(&page);
    emit(output, &plans, || {
        plans.iter().map(format_plan).collect::<Vec<_>>().join("\n")
    })
}

fn format_plan(plan: &ControlPlan) -> String {
    let kind = plan.kind.map(|k| k.label()).unwrap_or("-");
    let resolution = match (&plan.path, plan.ignored) {
        (Some(path), _) => match plan.score {
            Some(score) => format!("{path} (score {score})"),
            None => format!("{path} (context)"),
        },
        (None, Some(reason)) => format!("ignored: {}", reason.label()),
        (None, None) => "no confident match".to_string(),
    };
    format!("{:<6} {:<10} {}", plan.control.to_string(), kind, resolution)
}

fn cmd_profile(args: ProfileArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let store = profile_store(config)?;
    match args.action {
        ProfileAction::Show => {
            let profile = store.read().context("Failed to read profile")?;
            print_profile(&profile, output)
        }
        ProfileAction::Path => {
            let path = store.path().display().to_string();
            emit(output, &path, || path.clone())
        }
        ProfileAction::Set { path, value } => {
            let mut profile = store.read().context("Failed to read profile")?;
            profile
                .set(&path, &value)
                .with_context(|| format!("Cannot set {path}"))?;
            store.write(&profile).context("Failed to save profile")?;
            print_profile(&profile, output)
        }
        ProfileAction::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let raw: Value = serde_json::from_str(&content).context("Profile file is not JSON")?;
            let profile = store.import(&raw).context("Failed to save profile")?;
            print_profile(&profile, output)
        }
        ProfileAction::Reset => {
            let profile = default_profile();
            store.write(&profile).context("Failed to save profile")?;
            print_profile(&profile, output)
        }
    }
}

fn print_profile(profile: &Profile, output: OutputFormat) -> Result<()> {
    emit(output, &profile.to_json(), || {
        profile
            .flatten()
            .into_iter()
            .map(|(path, value)| format!("{path:<34} {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    })
}

#[derive(Serialize)]
struct BuildInfo {
    version: &'static str,
    git_hash: &'static str,
    git_branch: &'static str,
    build_date: &'static str,
}

fn cmd_version(output: OutputFormat) -> Result<()> {
    let info = BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        git_branch: env!("GIT_BRANCH"),
        build_date: env!("BUILD_DATE"),
    };
    emit(output, &info, || {
        format!(
            "formfuse {} ({} on {}, built {})",
            info.version, info.git_hash, info.git_branch, info.build_date
        )
    })
}
