//! The single failure-tolerant wrapper every source read goes through.

use serde::Serialize;
use std::future::Future;
use tracing::{debug, warn};

use crate::sources::SourceKind;

/// Why a source contributed nothing to a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub reason: String,
}

/// Tagged result of one reader call.
#[derive(Debug)]
pub enum SourceOutcome<T> {
    Ready(T),
    Unavailable(SourceFailure),
}

impl<T> SourceOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, SourceOutcome::Ready(_))
    }

    pub fn failure(&self) -> Option<&SourceFailure> {
        match self {
            SourceOutcome::Ready(_) => None,
            SourceOutcome::Unavailable(failure) => Some(failure),
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            SourceOutcome::Ready(value) => Some(value),
            SourceOutcome::Unavailable(_) => None,
        }
    }
}

impl<T: Default> SourceOutcome<T> {
    /// The value, or the zero/empty default for a degraded source.
    pub fn or_default(self) -> T {
        self.ready().unwrap_or_default()
    }
}

/// Awaits `read`, converting any error into [`SourceOutcome::Unavailable`].
pub async fn resilient_read<T, F>(source: SourceKind, read: F) -> SourceOutcome<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match read.await {
        Ok(value) => {
            debug!(source = %source, "Source read succeeded");
            SourceOutcome::Ready(value)
        }
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(source = %source, error = %reason, "Source unavailable, metric degraded");
            SourceOutcome::Unavailable(SourceFailure { source, reason })
        }
    }
}
