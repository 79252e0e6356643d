use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use dropmat::{DEFAULT_CONCURRENCY, MaterializeOptions};
use dropmat_fetch::{DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use tracing_subscriber::EnvFilter;

/// Download a build drop, fetching each distinct blob once.
#[derive(Clone, Debug, Parser)]
#[command(name = "dropmat", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Drop URL, e.g. https://host/_apis/drop/drops/<name>?root=bin
    pub drop_url: String,

    /// Directory the drop is written into.
    #[arg(long, short)]
    pub dest: PathBuf,

    /// Sub-tree of the drop to materialize. Defaults to the URL's `root` parameter.
    #[arg(long)]
    pub root: Option<String>,

    /// Personal access token for the drop service.
    #[arg(long, env = "DROPMAT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Per-attempt download timeout.
    #[arg(long, default_value_t = DEFAULT_ATTEMPT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Blobs downloaded at the same time.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Attempts per blob before giving up.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Repeat for more output (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .max_attempts(self.max_attempts)
            .attempt_timeout(Duration::from_secs(self.timeout_secs))
    }

    pub fn options(&self) -> MaterializeOptions { MaterializeOptions::default().concurrency(self.concurrency) }

    /// `RUST_LOG` wins; otherwise the level follows `-v`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            })
        })
    }
}
