//! Materialize a build drop onto local disk.
//!
//! A drop manifest maps file paths to content blobs. Many paths usually share
//! one blob, so entries are grouped by blob id: each group downloads its blob
//! once to the first path and copies it locally to the others. Groups run
//! concurrently under a fixed bound and the first terminal failure stops the
//! run.
//!
//! ```no_run
//! use dropmat::{DropSource, Materializer};
//! use dropmat_fetch::{Fetcher, ReqwestClient};
//! use dropmat_manifest::RestManifestProvider;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = DropSource::parse("https://host/_apis/drop/drops/build.1", Some("bin"))?;
//! let provider = RestManifestProvider::new(None)?;
//! let fetcher = Fetcher::new(ReqwestClient::new()?);
//!
//! let materializer = Materializer::open(&provider, &source, fetcher).await?;
//! let metrics = materializer.materialize("out").await?;
//! println!("{} files, {} blobs", metrics.files, metrics.unique_blobs);
//! # Ok(())
//! # }
//! ```

mod config;
mod dedup;
mod engine;
mod error;
mod layout;
mod metrics;
mod replicate;
mod scheduler;

pub use config::{DEFAULT_CONCURRENCY, DropSource, MaterializeOptions};
pub use dedup::{DedupGroup, group_by_blob};
pub use engine::{Materializer, RunState};
pub use error::{ConfigError, MaterializeError, ReplicationError, Result};
pub use layout::{PathError, local_path};
pub use metrics::{MetricsCollector, RunMetrics};
pub use replicate::replicate;
pub use scheduler::Scheduler;
