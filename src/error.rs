use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while building a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// Shard JSON could not be decoded
    #[error("failed to parse shard {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A shard or source file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A blame or repository query failed
    #[error("git query failed for {}: {source}", path.display())]
    Git {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    /// The final report could not be written
    #[error("failed to write report to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The comment pattern failed to compile
    #[error("invalid comment pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The configuration file could not be read or parsed
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl ReportError {
    /// Whether the failure aborts the run instead of degrading it
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReportError::Write { .. } | ReportError::Config { .. } | ReportError::Pattern(_)
        )
    }
}

/// A non-fatal failure recorded while the batch carried on
#[derive(Debug)]
pub struct Diagnostic(pub ReportError);

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ReportError> for Diagnostic {
    fn from(error: ReportError) -> Self {
        Diagnostic(error)
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
