use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every way a beta diversity run can fail. None of these are retried.
#[derive(Debug, Error)]
pub enum BetaError {
    #[error("unsupported taxonomic rank '{0}' (expected 'species' or 'genus')")]
    UnsupportedRank(String),

    #[error("unsupported distance metric '{0}'")]
    UnsupportedMetric(String),

    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed line in sample '{sample}': '{line}'")]
    MalformedLine { sample: String, line: String },

    /// The sample has zero total abundance after rank filtering.
    #[error("sample '{sample}' has zero total abundance, cannot normalize")]
    InvalidSample { sample: String },

    #[error("tool set '{tool}' has an odd number of sample tokens ({count}); expected <sample> <path> pairs")]
    OddSampleTokens { tool: String, count: usize },

    #[error("tool set '{0}' lists no samples")]
    EmptySampleSet(String),

    #[error("tool '{0}' given more than once")]
    DuplicateTool(String),

    #[error("sample '{sample}' given more than once in tool set '{tool}'")]
    DuplicateSample { tool: String, sample: String },

    /// Tool names become file names under `--tables-dir`.
    #[error("invalid tool name '{0}' (must be non-empty, without path separators, not '.' or '..')")]
    InvalidToolName(String),

    #[error("cannot build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("cannot write report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BetaError>;
