//! CLI entry point for the review insights toolkit.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dotenv::dotenv;
use tracing::{info, warn};

use review_insights::ai::{GeminiConfig, GeminiProvider};
use review_insights::ingest::{CSV_TEMPLATE, TEMPLATE_FILE_NAME};
use review_insights::state::AppState;
use review_insights::{
    AnalysisController, CredentialStore, ExportFormat, FileCredentialStore, InsightsConfig,
    KeyringCredentialStore, ReviewSource,
};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Customer Review Insights",
    long_about = "Summarize customer reviews with Gemini and export insight reports.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  GEMINI_API_KEY            API key for Gemini (overrides the stored key)\n  \
                  REVIEW_INSIGHTS_PDF_FONT  TrueType font embedded in PDF exports\n\n\
                  EXAMPLES:\n  \
                  # Analyze two review files and export a PDF\n  \
                  review-insights analyze q1.csv q2.csv --format pdf\n\n  \
                  # Persona analysis with a trend between the first two personas\n  \
                  review-insights analyze reviews.csv --segment-column \"Customer Type\" --trend 1,2\n\n  \
                  # Try it on generated sample data\n  \
                  review-insights analyze --sample --ask \"What do power users complain about?\""
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Keep the API key in this settings file instead of the OS keychain
    #[arg(long, global = true)]
    settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze reviews and export reports
    Analyze(AnalyzeArgs),

    /// Write the CSV template with a persona column
    Template {
        /// Where to write the template
        #[arg(short, long, default_value = TEMPLATE_FILE_NAME)]
        output: PathBuf,
    },

    /// Store the Gemini API key in the OS keychain (or --settings file)
    SetKey {
        /// The API key
        key: String,
    },

    /// Remove the stored Gemini API key
    DeleteKey,
}

#[derive(ClapArgs, Debug)]
struct AnalyzeArgs {
    /// Review files (.csv, .txt, .xlsx, .xls), one report per file
    inputs: Vec<PathBuf>,

    /// Import a published Google Sheet instead of files
    #[arg(long, conflicts_with_all = ["inputs", "sample"])]
    sheet_url: Option<String>,

    /// Generate sample headphone reviews and analyze them by persona
    #[arg(long, conflicts_with = "inputs")]
    sample: bool,

    /// Pasted review text, one report per occurrence
    #[arg(long)]
    text: Vec<String>,

    /// Product context attached to every source
    #[arg(long)]
    context: Option<String>,

    /// Report date attached to every source (e.g. "Q4 2024")
    #[arg(long)]
    report_date: Option<String>,

    /// Group the first source by this CSV column (persona analysis)
    #[arg(long)]
    segment_column: Option<String>,

    /// Column holding the review text for persona analysis
    #[arg(long, default_value = "Comment")]
    review_column: String,

    /// Output language, or "Auto-detect"
    #[arg(long, default_value = "Auto-detect")]
    language: String,

    /// Export formats (txt, pdf, docx, json); repeat or comma-separate
    #[arg(short, long, value_delimiter = ',')]
    format: Vec<ExportFormat>,

    /// Output directory for exported reports
    #[arg(short, long, default_value = "reports")]
    output: PathBuf,

    /// Compare two reports by 1-based position, e.g. "1,2"
    #[arg(long, value_delimiter = ',', num_args = 2)]
    trend: Option<Vec<usize>>,

    /// Ask a question about the first report; may repeat
    #[arg(long)]
    ask: Vec<String>,

    /// Print suggested questions for the first report
    #[arg(long)]
    suggest: bool,

    /// Deep dive into a keyword or theme of the first report
    #[arg(long)]
    deep_dive: Option<String>,

    /// Draft a reply to this customer complaint
    #[arg(long)]
    draft_reply: Option<String>,

    /// Write a sentiment chart (SVG) next to the reports
    #[arg(long)]
    chart: bool,

    /// TrueType font to embed in PDF exports (default: a system font)
    #[arg(long)]
    pdf_font: Option<PathBuf>,

    /// Gemini model for summaries and chat
    #[arg(long)]
    fast_model: Option<String>,

    /// Gemini model for strategy, trends and personas
    #[arg(long)]
    reasoning_model: Option<String>,

    /// Output the final state as JSON to stdout instead of a summary
    ///
    /// Disables all progress logs; only outputs the JSON.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let json = matches!(&cli.command, Command::Analyze(args) if args.json);
    init_logging(&cli.log_level, cli.quiet, json);

    dotenv().ok();

    let store = KeyStore::open(cli.settings.clone());

    match cli.command {
        Command::Template { output } => {
            std::fs::write(&output, CSV_TEMPLATE)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Template written to {}", output.display());
            Ok(())
        }
        Command::SetKey { key } => {
            store.get().set_api_key(&key)?;
            println!("API key saved to {}", store.location());
            Ok(())
        }
        Command::DeleteKey => {
            store
                .get()
                .delete(review_insights::credentials::API_KEY_NAME)?;
            println!("API key removed from {}", store.location());
            Ok(())
        }
        Command::Analyze(args) => run_analyze(args, &store, cli.quiet).await,
    }
}

/// Where the API key is kept: the OS keychain unless `--settings` names a file.
enum KeyStore {
    Keyring(KeyringCredentialStore),
    File(FileCredentialStore),
}

impl KeyStore {
    fn open(settings: Option<PathBuf>) -> Self {
        match settings {
            Some(path) => Self::File(FileCredentialStore::new(path)),
            None => Self::Keyring(KeyringCredentialStore::new()),
        }
    }

    fn get(&self) -> &dyn CredentialStore {
        match self {
            Self::Keyring(store) => store,
            Self::File(store) => store,
        }
    }

    fn location(&self) -> String {
        match self {
            Self::Keyring(store) => format!("the OS keychain (service '{}')", store.service()),
            Self::File(store) => store.path().display().to_string(),
        }
    }
}

/// Environment first, then the stored key.
fn resolve_api_key(store: &dyn CredentialStore) -> Option<String> {
    if let Ok(key) = std::env::var("GEMINI_API_KEY")
        && !key.trim().is_empty()
    {
        return Some(key);
    }
    match store.api_key() {
        Ok(key) => key,
        Err(e) => {
            warn!("Could not read stored API key: {}", e);
            None
        }
    }
}

fn build_controller(
    args: &AnalyzeArgs,
    store: &KeyStore,
    quiet: bool,
) -> Result<AnalysisController> {
    let mut config = InsightsConfig::builder()
        .review_column(&args.review_column)
        .output_language(&args.language)
        .output_dir(&args.output);
    if let Some(column) = &args.segment_column {
        config = config.segment_column(column);
    }
    let config = config.build()?;

    let mut builder = AnalysisController::builder().config(config);

    #[cfg(feature = "pdf")]
    if let Some(path) = &args.pdf_font {
        use review_insights::report::{PdfFont, PdfRenderer, RendererRegistry};

        let font = PdfFont::from_path(path)?;
        info!("Embedding font {} in PDF exports", font.name());
        let mut renderers = RendererRegistry::with_defaults();
        renderers.register(Box::new(PdfRenderer::with_font(font)));
        builder = builder.renderers(renderers);
    }
    #[cfg(not(feature = "pdf"))]
    if args.pdf_font.is_some() {
        warn!("--pdf-font ignored: PDF export is not compiled in");
    }

    match resolve_api_key(store.get()) {
        Some(key) => {
            let mut gemini = GeminiConfig::builder();
            if let Some(model) = &args.fast_model {
                gemini = gemini.fast_model(model);
            }
            if let Some(model) = &args.reasoning_model {
                gemini = gemini.reasoning_model(model);
            }
            builder = builder.provider(Arc::new(GeminiProvider::with_config(key, gemini.build())?));
        }
        None => warn!("No Gemini API key found. Run `review-insights set-key <KEY>` first."),
    }

    if !quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build())
}

async fn run_analyze(args: AnalyzeArgs, store: &KeyStore, quiet: bool) -> Result<()> {
    let controller = build_controller(&args, store, quiet)?;

    load_input(&controller, &args).await?;

    controller
        .run_analysis()
        .await
        .map_err(|e| anyhow!("Analysis failed: {e}"))?;

    if let Some(pair) = &args.trend {
        for &position in pair {
            if position == 0 {
                bail!("Report positions start at 1");
            }
            controller.toggle_comparison(position - 1);
        }
        controller.run_trend_analysis().await?;
    }

    if args.suggest {
        controller.suggest_questions().await?;
    }
    for question in &args.ask {
        controller.ask_question(question).await?;
    }
    if let Some(topic) = &args.deep_dive
        && let Err(e) = controller.deep_dive(topic).await
    {
        warn!("Deep dive failed: {}", e);
    }
    let draft = match &args.draft_reply {
        Some(complaint) => Some(controller.draft_reply(complaint).await?),
        None => None,
    };

    let report_count = controller
        .snapshot()
        .summaries
        .as_ref()
        .map_or(0, Vec::len);
    let mut written = Vec::new();
    for format in &args.format {
        for index in 0..report_count {
            let path = controller
                .write_report(index, *format, Some(&args.output))
                .await?;
            written.push(path);
        }
    }
    if args.chart
        && let Some(svg) = controller.sentiment_chart()
    {
        std::fs::create_dir_all(&args.output)?;
        let path = args.output.join("sentiment_trend.svg");
        std::fs::write(&path, svg)?;
        written.push(path);
    }

    let state = controller.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    print_human_readable_summary(&controller, &state, draft.as_deref());
    for path in written {
        println!("Written: {}", path.display());
    }
    Ok(())
}

async fn load_input(controller: &AnalysisController, args: &AnalyzeArgs) -> Result<()> {
    if args.sample {
        controller.generate_sample_data().await?;
        return Ok(());
    }

    if let Some(url) = &args.sheet_url {
        controller.fetch_sheet(url).await?;
    } else if !args.inputs.is_empty() {
        controller.load_files(args.inputs.clone()).await?;
    }

    let mut sources = controller.snapshot().sources;
    sources.retain(|s| !s.is_blank());
    for text in &args.text {
        let label = format!("Pasted Source {}", sources.len() + 1);
        sources.push(ReviewSource::new(label, text.clone()));
    }
    if sources.is_empty() {
        bail!("No review data given. Pass files, --text, --sheet-url or --sample.");
    }

    for source in &mut sources {
        if let Some(context) = &args.context {
            source.product_context = Some(context.clone());
        }
        if let Some(date) = &args.report_date {
            source.report_date = Some(date.clone());
        }
    }
    controller.set_sources(sources)?;
    Ok(())
}

/// Print the analysis to stdout.
///
/// This uses `println!` intentionally: it is the command's output, not a
/// log line, and must show regardless of log level.
fn print_human_readable_summary(
    controller: &AnalysisController,
    state: &AppState,
    draft: Option<&str>,
) {
    println!("\n{}", "=".repeat(80));
    println!("CUSTOMER REVIEW INSIGHTS");
    println!("{}", "=".repeat(80));

    let summaries = state.summaries.as_deref().unwrap_or_default();
    for index in 0..summaries.len() {
        println!();
        if let Some(markdown) = controller.copy_summary(index) {
            println!("{markdown}");
        }
        if let Some(metrics) = controller.dashboard_metrics(index) {
            println!(
                "Sentiment: {:.0}% positive, {:.0}% negative, {:.0}% neutral ({} points)",
                metrics.positive_percent,
                metrics.negative_percent,
                metrics.neutral_percent,
                metrics.total_points
            );
        }
        if let Some(strategy) = state.strategies.as_ref().and_then(|s| s.get(index)) {
            println!("Key focus: {}", strategy.key_focus_area);
            for (i, step) in strategy.steps.iter().enumerate() {
                println!("  {}. {}", i + 1, step.step);
            }
        }
        println!("{}", "-".repeat(40));
    }

    if let Some(comparison) = &state.persona_comparison {
        println!("\nPERSONA COMPARISON");
        println!("{}", comparison.overview);
        for segment in &comparison.segment_comparisons {
            println!("  {}:", segment.segment);
            for item in &segment.key_differentiators {
                println!("    - {item}");
            }
        }
    }

    if let Some(trend) = &state.trend {
        println!("\nTREND: {} -> {}", trend.start_label, trend.end_label);
        println!("{}", trend.analysis.summary);
        for (title, items) in [
            ("New issues", &trend.analysis.new_issues),
            ("Resolved issues", &trend.analysis.resolved_issues),
            ("Persistent themes", &trend.analysis.persistent_themes),
        ] {
            if !items.is_empty() {
                println!("  {title}:");
                for item in items {
                    println!("    - {item}");
                }
            }
        }
    }

    if !state.suggested_questions.is_empty() {
        println!("\nSUGGESTED QUESTIONS");
        for question in &state.suggested_questions {
            println!("  - {question}");
        }
    }

    if !state.chat_history.is_empty() {
        println!("\nCHAT");
        for message in &state.chat_history {
            println!("  [{:?}] {}", message.sender, message.text);
        }
    }

    if let Some(slot) = &state.deep_dive {
        println!("\nDEEP DIVE: {}", slot.topic);
        match (&slot.result, &slot.error) {
            (Some(result), _) => {
                println!("{}", result.summary);
                for snippet in &result.snippets {
                    println!("  > {snippet}");
                }
            }
            (None, Some(error)) => println!("  {error}"),
            (None, None) => {}
        }
    }

    if let Some(draft) = draft {
        println!("\nDRAFT REPLY\n{draft}");
    }

    if let Some(error) = &state.error {
        println!("\nLast error: {error}");
    }
    println!("{}", "=".repeat(80));
}
