//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use speakerunify_core::{ProgressReporter, RunSummary, SourceStatus, SourceSummary};
use speakerunify_shared::{
    AppConfig, RunConfig, Source, init_config, load_config, validate_config,
};
use speakerunify_storage::{Coverage, SourceStore, database_path};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// speakerunify: one deduplicated speaker collection from nine directories.
#[derive(Parser)]
#[command(
    name = "speakerunify",
    version,
    about = "Unify scraped speaker profiles into one deduplicated collection.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Store location overrides shared by every subcommand.
#[derive(Args, Clone, Debug, Default)]
pub(crate) struct StoreArgs {
    /// Root directory of the local databases.
    #[arg(long, env = "SPEAKERUNIFY_STORE_URL", global = true)]
    pub store_url: Option<String>,

    /// Database receiving the canonical speaker collection.
    #[arg(long, env = "TARGET_DATABASE", global = true)]
    pub target_database: Option<String>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run unification over every enabled source.
    Run {
        /// Only process these sources (repeatable; tag, label or database name).
        #[arg(short, long = "source")]
        sources: Vec<Source>,

        /// Write operations buffered per flush.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Topic mapping file (canonical topic -> variants).
        #[arg(long, env = "SPEAKERUNIFY_TOPIC_MAPPING")]
        mapping: Option<PathBuf>,
    },

    /// Load native documents (one JSON object per line) into a source collection.
    Import {
        /// Source the documents belong to.
        #[arg(short, long)]
        source: Source,

        /// JSON Lines file to load.
        file: PathBuf,
    },

    /// List the source registry and how many documents each source holds.
    Sources,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "speakerunify=info",
        1 => "speakerunify=debug",
        _ => "speakerunify=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let store = cli.store;
    match cli.command {
        Command::Run {
            sources,
            batch_size,
            mapping,
        } => cmd_run(&store, &sources, batch_size, mapping).await,
        Command::Import { source, file } => cmd_import(&store, source, &file).await,
        Command::Sources => cmd_sources(&store).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&store).await,
        },
    }
}

/// Config file values with store overrides applied, validated.
fn resolve_config(store: &StoreArgs) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(url) = &store.store_url {
        config.store.url = url.clone();
    }
    if let Some(target) = &store.target_database {
        config.store.target_database = target.clone();
    }
    validate_config(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(
    store: &StoreArgs,
    only: &[Source],
    batch_size: Option<usize>,
    mapping: Option<PathBuf>,
) -> Result<()> {
    let mut config = resolve_config(store)?;
    if let Some(size) = batch_size {
        config.store.batch_size = size;
    }
    if let Some(path) = mapping {
        config.topics.mapping_path = path.to_string_lossy().into_owned();
    }
    validate_config(&config)?;

    let mut run_config = RunConfig::from(&config);
    run_config.restrict_to(only);
    if run_config.sources.is_empty() {
        return Err(eyre!("no enabled sources to process"));
    }

    info!(
        store = %run_config.store_root.display(),
        target = %run_config.target_database,
        sources = run_config.sources.len(),
        "starting unification run"
    );

    let reporter = CliProgress::new();
    let summary = speakerunify_core::run_unification(&run_config, &reporter).await?;

    print_summary(&summary);
    print_coverage(&summary.coverage);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Unification complete");
    println!("  Ingested:       {}", summary.ingested);
    println!("  Skipped:        {}", summary.skipped);
    println!("  New:            {}", summary.new);
    println!("  Updated:        {}", summary.updated);
    println!("  Write failures: {}", summary.write_failures);
    println!("  Total records:  {}", summary.total);
    println!("  Time:           {:.1}s", summary.elapsed.as_secs_f64());
    println!();
    println!("  {:<12} {:>9} {:>8} {:>7} {:>8}", "SOURCE", "INGESTED", "SKIPPED", "NEW", "UPDATED");
    for source in &summary.sources {
        match &source.status {
            SourceStatus::Processed { .. } => println!(
                "  {:<12} {:>9} {:>8} {:>7} {:>8}",
                source.source.tag(),
                source.ingested,
                source.skipped,
                source.new,
                source.updated
            ),
            SourceStatus::MissingDatabase => {
                println!("  {:<12} (database not found)", source.source.tag())
            }
            SourceStatus::MissingCollection => {
                println!("  {:<12} (collection not found)", source.source.tag())
            }
        }
    }
    println!();
}

fn print_coverage(coverage: &Coverage) {
    let pct = |n: u64| {
        if coverage.total == 0 {
            0.0
        } else {
            n as f64 * 100.0 / coverage.total as f64
        }
    };
    println!("  Field coverage ({} records)", coverage.total);
    for (label, n) in [
        ("Social media", coverage.social_media),
        ("Contact info", coverage.contact),
        ("Testimonials", coverage.testimonials),
        ("Professional info", coverage.professional_info),
        ("Company info", coverage.company),
        ("Platform fields", coverage.platform_fields),
        ("SEO metadata", coverage.seo_metadata),
    ] {
        println!("  {label:<18} {n:>7} ({:.1}%)", pct(n));
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn source_started(&self, source: Source, collection: &str) {
        self.spinner.set_message(format!("{source}: reading {collection}"));
    }

    fn document_processed(&self, source: Source, seen: u64) {
        if seen % 100 == 0 {
            self.spinner.set_message(format!("{source}: {seen} documents"));
        }
    }

    fn source_finished(&self, summary: &SourceSummary) {
        if let SourceStatus::Processed { .. } = summary.status {
            self.spinner.println(format!(
                "  ✓ {}: {} ingested, {} skipped",
                summary.source, summary.ingested, summary.skipped
            ));
        }
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

async fn cmd_import(store: &StoreArgs, source: Source, file: &Path) -> Result<()> {
    let config = resolve_config(store)?;
    let run_config = RunConfig::from(&config);
    let (database, collection) = run_config
        .sources
        .iter()
        .find(|b| b.source == source)
        .map(|b| (b.database.clone(), b.collection.clone()))
        .unwrap_or_else(|| {
            (
                source.default_database().to_string(),
                source.default_collection().to_string(),
            )
        });

    let content = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;

    let mut docs = Vec::new();
    for (n, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let doc: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| eyre!("{}:{}: invalid JSON: {e}", file.display(), n + 1))?;
        docs.push(doc);
    }

    let path = database_path(&run_config.store_root, &database);
    let db = SourceStore::open(&path).await?;
    let mut inserted = 0;
    for chunk in docs.chunks(run_config.batch_size.max(1)) {
        inserted += db.insert_documents(&collection, chunk).await?;
    }
    let total = db.count(&collection).await?;

    info!(%source, %database, %collection, inserted, "import complete");
    println!("  Imported {inserted} documents into {database}.{collection} ({total} total)");
    Ok(())
}

// ---------------------------------------------------------------------------
// sources
// ---------------------------------------------------------------------------

async fn cmd_sources(store: &StoreArgs) -> Result<()> {
    let config = resolve_config(store)?;
    let run_config = RunConfig::from(&config);

    println!(
        "  {:<12} {:<28} {:<24} {:>9}",
        "SOURCE", "DATABASE", "COLLECTION", "DOCUMENTS"
    );
    for source in Source::ALL {
        let Some(binding) = run_config.sources.iter().find(|b| b.source == source) else {
            println!("  {:<12} (disabled)", source.tag());
            continue;
        };

        let path = database_path(&run_config.store_root, &binding.database);
        let (collection, count) = match SourceStore::open_readonly(&path).await? {
            Some(db) => match db.resolve_collection(&binding.collection).await? {
                Some(name) => {
                    let count = db.count(&name).await?;
                    (name, count.to_string())
                }
                None => (binding.collection.clone(), "-".to_string()),
            },
            None => (binding.collection.clone(), "-".to_string()),
        };
        println!(
            "  {:<12} {:<28} {:<24} {:>9}",
            source.tag(),
            binding.database,
            collection,
            count
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(store: &StoreArgs) -> Result<()> {
    let config = resolve_config(store)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
