//! The materialization engine: dedup, schedule, fetch, replicate, report.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dropmat_fetch::{FetchError, Fetcher, HttpClient};
use dropmat_manifest::{ContentBlob, Manifest, ManifestProvider, RootPrefix, load_manifest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::{DropSource, MaterializeOptions};
use crate::dedup::{DedupGroup, group_by_blob};
use crate::error::{ConfigError, MaterializeError, Result};
use crate::layout::local_path;
use crate::metrics::{MetricsCollector, RunMetrics};
use crate::replicate::replicate;
use crate::scheduler::Scheduler;

/// Lifecycle of a [`Materializer`]. `Completed` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "Idle"),
            RunState::Running => write!(f, "Running"),
            RunState::Completed => write!(f, "Completed"),
            RunState::Failed => write!(f, "Failed"),
        }
    }
}

/// Resolved work for one dedup group.
#[derive(Debug, Clone)]
struct GroupPlan {
    blob:     ContentBlob,
    primary:  PathBuf,
    replicas: Vec<PathBuf>,
}

impl GroupPlan {
    fn resolve(group: &DedupGroup<'_>, destination: &Path, root: &RootPrefix) -> Result<Self> {
        let primary = group.primary();
        let replicas = group
            .replicas()
            .iter()
            .map(|entry| local_path(destination, root, &entry.path))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            blob: primary.blob.clone(),
            primary: local_path(destination, root, &primary.path)?,
            replicas,
        })
    }
}

/// Materializes one manifest snapshot into a destination directory.
///
/// One instance performs at most one run.
pub struct Materializer<C: HttpClient> {
    manifest: Manifest,
    root:     RootPrefix,
    fetcher:  Arc<Fetcher<C>>,
    options:  MaterializeOptions,
    state:    Mutex<RunState>,
    cancel:   CancellationToken,
}

impl<C: HttpClient + 'static> Materializer<C> {
    pub fn new(manifest: Manifest, root: RootPrefix, fetcher: Fetcher<C>) -> Self {
        Self {
            manifest,
            root,
            fetcher: Arc::new(fetcher),
            options: MaterializeOptions::default(),
            state: Mutex::new(RunState::Idle),
            cancel: CancellationToken::new(),
        }
    }

    /// Load the manifest of `source` through `provider`.
    ///
    /// Any provider failure, and a drop with nothing under the root, aborts
    /// construction.
    pub async fn open<P: ManifestProvider>(
        provider: &P,
        source: &DropSource,
        fetcher: Fetcher<C>,
    ) -> std::result::Result<Self, ConfigError> {
        let manifest = load_manifest(provider, &source.url, &source.root).await?;
        debug!(drop = %source.url, root = %source.root, entries = manifest.len(), "loaded manifest");
        Ok(Self::new(manifest, source.root.clone(), fetcher))
    }

    #[must_use]
    pub fn with_options(mut self, options: MaterializeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn manifest(&self) -> &Manifest { &self.manifest }

    pub fn fetcher(&self) -> &Fetcher<C> { &self.fetcher }

    pub fn state(&self) -> RunState { *self.state.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Token that aborts the run when cancelled: no new groups start and
    /// in-flight fetches stop at their next suspension point.
    pub fn cancel_token(&self) -> CancellationToken { self.cancel.clone() }

    /// Reproduce every manifest entry below `destination_root`.
    ///
    /// All groups succeed or the run fails with the first terminal error.
    /// Files written by groups that finished stay in place either way.
    pub async fn materialize(&self, destination_root: impl AsRef<Path>) -> Result<RunMetrics> {
        self.transition(RunState::Idle, RunState::Running)?;

        let result = self.run(destination_root.as_ref()).await;
        let terminal = if result.is_ok() { RunState::Completed } else { RunState::Failed };
        self.transition(RunState::Running, terminal)?;

        match &result {
            Ok(metrics) => info!(
                files = metrics.files,
                unique = metrics.unique_blobs,
                avg_download_secs = metrics.average_download_secs,
                max_download_secs = metrics.max_download_secs,
                "materialization completed"
            ),
            Err(e) => error!(error = %e, "materialization failed"),
        }
        result
    }

    async fn run(&self, destination: &Path) -> Result<RunMetrics> {
        let groups = group_by_blob(self.manifest.entries());
        info!(files = self.manifest.len(), unique = groups.len(), "found files");

        let plans = groups
            .iter()
            .map(|group| GroupPlan::resolve(group, destination, &self.root))
            .collect::<Result<Vec<_>>>()?;

        let total = plans.len();
        let metrics = Arc::new(MetricsCollector::new(self.manifest.len(), total));
        let scheduler = Scheduler::new(self.options.concurrency, self.cancel.clone());

        let fetcher = Arc::clone(&self.fetcher);
        let collector = Arc::clone(&metrics);
        scheduler
            .run(plans, move |plan, cancel| {
                let fetcher = Arc::clone(&fetcher);
                let collector = Arc::clone(&collector);
                async move { materialize_group(&fetcher, plan, &cancel, &collector).await }
            })
            .await?;

        let completed = metrics.completed();
        if completed < total {
            return Err(MaterializeError::Cancelled {
                remaining: total - completed,
                total,
            });
        }
        Ok(metrics.finish())
    }

    fn transition(&self, from: RunState, to: RunState) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != from {
            return Err(MaterializeError::AlreadyRun(*state));
        }
        *state = to;
        Ok(())
    }
}

/// Fetch the primary, then copy it to each replica.
async fn materialize_group<C: HttpClient + 'static>(
    fetcher: &Fetcher<C>,
    plan: GroupPlan,
    cancel: &CancellationToken,
    metrics: &MetricsCollector,
) -> Result<()> {
    let GroupPlan {
        blob,
        primary,
        replicas,
    } = plan;

    let download = match fetcher.fetch(&blob.url, &primary, cancel).await {
        Ok(download) => download,
        // Left unrecorded; the run reports it as outstanding.
        Err(FetchError::Cancelled) => {
            debug!(blob = %blob.id, "group cancelled before download finished");
            return Ok(());
        }
        Err(source) => {
            return Err(MaterializeError::Fetch {
                blob: blob.id.clone(),
                source,
            });
        }
    };

    let copy = if replicas.is_empty() {
        Duration::ZERO
    } else {
        let replica_count = replicas.len();
        let copied = tokio::task::spawn_blocking(move || replicate(&primary, &replicas)).await?;
        let copy = copied.map_err(|source| MaterializeError::Replicate {
            blob: blob.id.clone(),
            source,
        })?;
        debug!(blob = %blob.id, replicas = replica_count, copy_ms = copy.as_millis() as u64, "replicated blob");
        copy
    };

    metrics.record(download, copy);
    Ok(())
}
