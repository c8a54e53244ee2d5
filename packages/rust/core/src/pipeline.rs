//! End-to-end unification run: sources → adapters → dedup → merge → store.

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use speakerunify_normalize::TopicCanonicalizer;
use speakerunify_shared::{Result, RunConfig, Source, SourceBinding};
use speakerunify_sources::{Adapter, AdapterRegistry};
use speakerunify_storage::{Coverage, SourceStore, SpeakerStore, database_path};

use crate::dedup::decide;
use crate::identity::IdentityIndex;
use crate::merge::{Applied, MergeEngine};

/// What happened to one configured source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// Documents were read from `collection`.
    Processed { collection: String },
    /// The source database file does not exist.
    MissingDatabase,
    /// Neither the configured collection nor a fallback exists.
    MissingCollection,
}

/// Per-source counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub source: Source,
    pub status: SourceStatus,
    /// Documents adapted and applied.
    pub ingested: u64,
    /// Documents the adapter rejected or that were not valid JSON.
    pub skipped: u64,
    pub new: u64,
    pub updated: u64,
}

impl SourceSummary {
    fn new(source: Source, status: SourceStatus) -> Self {
        Self {
            source,
            status,
            ingested: 0,
            skipped: 0,
            new: 0,
            updated: 0,
        }
    }
}

/// Result of [`run_unification`].
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ingested: u64,
    pub skipped: u64,
    pub new: u64,
    pub updated: u64,
    pub write_failures: u64,
    /// Canonical records in the target after the run.
    pub total: u64,
    pub sources: Vec<SourceSummary>,
    pub coverage: Coverage,
    pub elapsed: Duration,
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called before the first document of a source is read.
    fn source_started(&self, source: Source, collection: &str);
    /// Called after each document; `seen` counts ingested and skipped.
    fn document_processed(&self, source: Source, seen: u64);
    /// Called once per configured source, including skipped ones.
    fn source_finished(&self, summary: &SourceSummary);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn source_started(&self, _source: Source, _collection: &str) {}
    fn document_processed(&self, _source: Source, _seen: u64) {}
    fn source_finished(&self, _summary: &SourceSummary) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run one unification pass over every configured source.
///
/// 1. Load the topic mapping (fatal if missing or malformed)
/// 2. Open the target database and build the identity index from it
/// 3. For each source in order: stream documents, adapt, decide, merge
/// 4. Flush the last batch and collect totals
///
/// The pass is restartable: record ids are deterministic and every write
/// is an upsert, so re-running over unchanged sources adds nothing.
#[instrument(skip_all, fields(target = %config.target_database, sources = config.sources.len()))]
pub async fn run_unification(
    config: &RunConfig,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();

    let topics = TopicCanonicalizer::from_path(&config.mapping_path)?;
    info!(mapping = %config.mapping_path.display(), "topic mapping loaded");

    let target_path = database_path(&config.store_root, &config.target_database);
    let store = SpeakerStore::open(&target_path).await?;
    let mut index = IdentityIndex::from_rows(store.index_rows().await?);
    info!(entries = index.len(), "identity index built");

    let registry = AdapterRegistry::new();
    let mut engine = MergeEngine::new(&store, config.batch_size);
    let mut sources = Vec::with_capacity(config.sources.len());

    for binding in &config.sources {
        let Some(adapter) = registry.get(binding.source) else {
            continue;
        };
        let summary = unify_source(
            &config.store_root,
            binding,
            adapter,
            &topics,
            &mut index,
            &mut engine,
            progress,
        )
        .await?;
        progress.source_finished(&summary);
        sources.push(summary);
    }

    engine.flush().await?;
    let stats = engine.stats();

    let summary = RunSummary {
        ingested: sources.iter().map(|s| s.ingested).sum(),
        skipped: sources.iter().map(|s| s.skipped).sum(),
        new: stats.new,
        updated: stats.updated,
        write_failures: stats.write_failures,
        total: store.count().await?,
        coverage: store.coverage().await?,
        sources,
        elapsed: start.elapsed(),
    };

    info!(
        ingested = summary.ingested,
        skipped = summary.skipped,
        new = summary.new,
        updated = summary.updated,
        write_failures = summary.write_failures,
        total = summary.total,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "unification complete"
    );
    progress.done(&summary);

    Ok(summary)
}

/// Drive every document of one source through adapt → decide → apply.
async fn unify_source(
    root: &Path,
    binding: &SourceBinding,
    adapter: &dyn Adapter,
    topics: &TopicCanonicalizer,
    index: &mut IdentityIndex,
    engine: &mut MergeEngine<'_>,
    progress: &dyn ProgressReporter,
) -> Result<SourceSummary> {
    let source = binding.source;

    let path = database_path(root, &binding.database);
    let Some(db) = SourceStore::open_readonly(&path).await? else {
        warn!(%source, database = %binding.database, "source database not found, skipping");
        return Ok(SourceSummary::new(source, SourceStatus::MissingDatabase));
    };
    let Some(collection) = db.resolve_collection(&binding.collection).await? else {
        warn!(%source, collection = %binding.collection, "source collection not found, skipping");
        return Ok(SourceSummary::new(source, SourceStatus::MissingCollection));
    };

    progress.source_started(source, &collection);
    let mut summary = SourceSummary::new(
        source,
        SourceStatus::Processed {
            collection: collection.clone(),
        },
    );

    let mut cursor = db.documents(&collection).await?;
    while let Some(raw) = cursor.next().await? {
        let candidate = match raw.parse() {
            Ok(doc) => adapter.adapt(&doc, topics),
            Err(e) => {
                debug!(%source, error = %e, "document is not valid JSON");
                None
            }
        };

        match candidate {
            Some(candidate) => {
                let decision = decide(index, &candidate);
                match engine.apply(decision, candidate, index, Utc::now()).await? {
                    Applied::Inserted(_) => summary.new += 1,
                    Applied::Updated(_) => summary.updated += 1,
                }
                summary.ingested += 1;
            }
            None => {
                warn!(%source, seq = raw.seq, "document skipped");
                summary.skipped += 1;
            }
        }
        progress.document_processed(source, summary.ingested + summary.skipped);
    }

    info!(
        %source,
        collection = %collection,
        ingested = summary.ingested,
        skipped = summary.skipped,
        new = summary.new,
        updated = summary.updated,
        "source complete"
    );
    Ok(summary)
}
