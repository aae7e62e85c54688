//! Command-line interface: argument parsing and the command handlers

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pitch_panda_sdk::{
    log_error, log_file_saved, log_info, log_stage_complete_console, log_state_file,
    log_warning, AnalysisStatus,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::{Settings, SettingsOverrides};
use crate::deck::load_slides;
use crate::llm::OpenAiClient;
use crate::pipeline::{
    run_status, stream_analysis, AnalysisInput, PipelineContext, StageEvent, StartupState,
};
use crate::render::render_report;
use crate::scraper::build_http_client;
use crate::store::{AnalysisStore, StoredAnalysis};
use crate::utils::{get_domain, slugify};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pitch-panda",
    version,
    about = "Due-diligence reports for startups from their website, pitch deck and private notes"
)]
pub struct Cli {
    /// YAML settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// OpenAI API key (overrides OPENAI_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Model for the text stages
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Model for slide images
    #[arg(long, global = true)]
    pub vision_model: Option<String>,

    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// SQLite file holding saved analyses
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Directory for reports when --output is not given
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Analyze a startup and write a report
    Analyze(AnalyzeArgs),

    /// List saved analyses, most recent first
    List {
        #[arg(long, default_value = "20")]
        limit: usize,

        #[arg(long, default_value = "0")]
        offset: usize,
    },

    /// Print a saved analysis
    Show {
        url: String,

        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
    },

    /// Delete the saved analysis for a URL's domain
    Delete { url: String },

    /// Delete every saved analysis
    Clear,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Company website
    pub url: String,

    /// Slide image or directory of slide images (repeatable)
    #[arg(long = "deck", value_name = "PATH")]
    pub deck: Vec<PathBuf>,

    /// Private context: notes, metrics, internal documents
    #[arg(long, conflicts_with = "context_file")]
    pub context: Option<String>,

    /// Read private context from a file
    #[arg(long, value_name = "FILE")]
    pub context_file: Option<PathBuf>,

    /// Report path (default: <output-dir>/<domain>.md)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,

    /// Neither read nor write the analysis store
    #[arg(long)]
    pub no_cache: bool,

    /// Re-run even when a saved analysis exists
    #[arg(long)]
    pub refresh: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Cli {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            vision_model: self.vision_model.clone(),
            temperature: self.temperature,
            database_path: self.database.clone(),
            output_dir: self.output_dir.clone(),
        }
    }
}

/// Default report location: `<output_dir>/<slug of domain>.<ext>`
pub fn default_output_path(output_dir: &Path, url: &str, format: OutputFormat) -> PathBuf {
    let mut slug = slugify(&get_domain(url));
    if slug.is_empty() {
        slug = "analysis".to_string();
    }
    output_dir.join(format!("{}.{}", slug, format.extension()))
}

fn format_state(state: &StartupState, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(render_report(state)),
        OutputFormat::Json => serde_json::to_string_pretty(&state.for_storage())
            .context("Failed to serialize analysis"),
    }
}

/// Create the report's directory up front so a bad path fails before any model call
fn prepare_output_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn write_report(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    log_state_file!(path.display(), "Analysis report");
    log_file_saved!(path.display());
    Ok(())
}

fn read_context(args: &AnalyzeArgs) -> Result<Option<String>> {
    if let Some(path) = &args.context_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file {}", path.display()))?;
        return Ok(Some(text));
    }
    Ok(args.context.clone())
}

fn open_store(settings: &Settings) -> Result<AnalysisStore> {
    AnalysisStore::open(settings.database_path.clone())
}

async fn print_progress(mut events: mpsc::Receiver<StageEvent>) {
    let mut seen_errors = 0;
    while let Some(event) = events.recv().await {
        log_stage_complete_console!(format!(
            "{} ({}) [{}%]",
            event.stage.number(),
            event.stage,
            event.progress
        ));
        if event.errors_so_far > seen_errors {
            log_warning!(
                "{} new error(s) during {}",
                event.errors_so_far - seen_errors,
                event.stage
            );
            seen_errors = event.errors_so_far;
        }
    }
}

pub async fn analyze(settings: &Settings, args: AnalyzeArgs) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&settings.output_dir, &args.url, args.format));
    prepare_output_dir(&output)?;

    let store = if args.no_cache {
        None
    } else {
        Some(open_store(settings)?)
    };

    if let (Some(store), false) = (&store, args.refresh) {
        if let Some(cached) = store.get_by_url(&args.url)? {
            log_info!(
                "Using saved analysis for {} from {} (pass --refresh to re-run)",
                cached.domain,
                cached.updated_at.format("%Y-%m-%d %H:%M")
            );
            return write_report(&output, &format_state(&cached.state, args.format)?);
        }
    }

    let extra_context = read_context(&args)?;
    let slides = load_slides(&args.deck).context("Failed to load pitch deck")?;

    let client = OpenAiClient::new(settings.openai_config()?)?;
    let http = build_http_client(settings.request_timeout())
        .context("Failed to build HTTP client")?;
    let ctx = PipelineContext::new(Arc::new(client), http).with_options(settings.pipeline_options());

    let mut input = AnalysisInput::new(args.url.clone()).with_slides(slides);
    if let Some(text) = extra_context {
        input = input.with_context(text);
    }

    log_info!(
        "Analyzing {} ({} slide(s), private context: {})",
        args.url,
        input.deck_slides.len(),
        if input.extra_context.is_some() { "yes" } else { "no" }
    );

    let (tx, rx) = mpsc::channel(16);
    let (state, ()) = tokio::join!(stream_analysis(input, &ctx, tx), print_progress(rx));

    match run_status(&state) {
        AnalysisStatus::Completed => log_info!("Analysis complete"),
        AnalysisStatus::CompletedWithErrors => log_warning!(
            "Analysis complete with {} error(s); see the report",
            state.errors.len()
        ),
        _ => log_error!("Analysis failed: {}", state.errors.join("; ")),
    }

    if let Some(store) = &store {
        if state.final_analysis.is_some() {
            store.save(&args.url, &state)?;
        }
    }

    write_report(&output, &format_state(&state, args.format)?)
}

fn list_line(entry: &StoredAnalysis) -> String {
    let status = if entry.state.final_analysis.is_none() {
        "failed".to_string()
    } else if entry.errors.is_empty() {
        "ok".to_string()
    } else {
        format!("{} error(s)", entry.errors.len())
    };
    format!(
        "{:<32} {}  {:<12} {}",
        entry.domain,
        entry.updated_at.format("%Y-%m-%d %H:%M"),
        status,
        entry.url
    )
}

pub fn list(settings: &Settings, limit: usize, offset: usize) -> Result<()> {
    let store = open_store(settings)?;
    let entries = store.list(limit, offset)?;
    if entries.is_empty() {
        log_info!("No saved analyses");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", list_line(entry));
    }
    log_info!("{} of {} saved analyses", entries.len(), store.count()?);
    Ok(())
}

pub fn show(settings: &Settings, url: &str, format: OutputFormat) -> Result<()> {
    let store = open_store(settings)?;
    match store.get_by_url(url)? {
        Some(entry) => {
            println!("{}", format_state(&entry.state, format)?);
            Ok(())
        }
        None => bail!("No saved analysis for {}", get_domain(url)),
    }
}

pub fn delete(settings: &Settings, url: &str) -> Result<()> {
    let store = open_store(settings)?;
    if store.delete(url)? {
        log_info!("Deleted analysis for {}", get_domain(url));
    } else {
        log_warning!("No saved analysis for {}", get_domain(url));
    }
    Ok(())
}

pub fn clear(settings: &Settings) -> Result<()> {
    let store = open_store(settings)?;
    let removed = store.clear()?;
    log_info!("Removed {} saved analyses", removed);
    Ok(())
}

/// Resolve settings and dispatch to the subcommand
pub async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref(), cli.overrides())?;

    match cli.command {
        Command::Analyze(args) => analyze(&settings, args).await,
        Command::List { limit, offset } => list(&settings, limit, offset),
        Command::Show { url, format } => show(&settings, &url, format),
        Command::Delete { url } => delete(&settings, &url),
        Command::Clear => clear(&settings),
    }
}
