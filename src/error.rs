use thiserror::Error;

use crate::overview::resilient::SourceFailure;

/// Pass-level failures of [`compute_overview`](crate::overview::compute_overview).
///
/// Partial source failures never surface here; they degrade the affected
/// metric and are listed in `OverviewMetrics::degraded`.
#[derive(Debug, Error)]
pub enum OverviewError {
    /// No credential was available, so no reads were issued.
    #[error("no credential available; sign in before loading the overview")]
    MissingCredential,

    /// The credential store itself failed.
    #[error("credential lookup failed: {0}")]
    CredentialStore(#[source] anyhow::Error),

    /// Every source reader failed in the same pass.
    #[error("all {} dashboard sources failed", .failures.len())]
    AllSourcesFailed { failures: Vec<SourceFailure> },
}

pub type Result<T> = std::result::Result<T, OverviewError>;
