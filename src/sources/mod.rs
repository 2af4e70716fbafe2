//! Source reader contract for the dashboard backend.
//!
//! Each reader is a single request/response call. Implementations attach
//! the caller's [`Credential`] and return records already coerced into the
//! shapes in [`records`].

pub mod coerce;
pub mod records;

use anyhow::Result;
use std::fmt;

use crate::period::Window;
use records::{BookingRecord, CourtRecord, CourtUsageRecord, RevenueSnapshot, UserRecord};

/// Court usage reporting period covering all bookings ever made.
pub const ALL_TIME: &str = "all";
/// Status filter for open equipment issues and venue maintenance requests.
pub const PENDING: &str = "pending";

/// Opaque bearer token issued by the auth collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for an empty or whitespace-only token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token.trim().to_string()))
        }
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Identifies a reader call within a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Users,
    Bookings,
    Courts,
    CourtUsage,
    CurrentRevenue,
    PreviousRevenue,
    EquipmentIssues,
    VenueMaintenance,
}

impl SourceKind {
    pub const ALL: [SourceKind; 8] = [
        SourceKind::Users,
        SourceKind::Bookings,
        SourceKind::Courts,
        SourceKind::CourtUsage,
        SourceKind::CurrentRevenue,
        SourceKind::PreviousRevenue,
        SourceKind::EquipmentIssues,
        SourceKind::VenueMaintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Users => "users",
            SourceKind::Bookings => "bookings",
            SourceKind::Courts => "courts",
            SourceKind::CourtUsage => "court_usage",
            SourceKind::CurrentRevenue => "current_revenue",
            SourceKind::PreviousRevenue => "previous_revenue",
            SourceKind::EquipmentIssues => "equipment_issues",
            SourceKind::VenueMaintenance => "venue_maintenance",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstraction over the dashboard backend's read endpoints.
#[async_trait::async_trait]
pub trait DashboardApi: Send + Sync {
    async fn users(&self, credential: &Credential) -> Result<Vec<UserRecord>>;

    async fn bookings(&self, credential: &Credential) -> Result<Vec<BookingRecord>>;

    async fn courts(&self, credential: &Credential) -> Result<Vec<CourtRecord>>;

    /// Usage statistics per court for `period` (see [`ALL_TIME`]).
    async fn court_usage(&self, credential: &Credential, period: &str)
    -> Result<Vec<CourtUsageRecord>>;

    /// Total revenue inside `window`.
    async fn dashboard_revenue(
        &self,
        credential: &Credential,
        window: Window,
    ) -> Result<RevenueSnapshot>;

    /// Number of equipment issues with the given status.
    async fn equipment_issues(&self, credential: &Credential, status: &str) -> Result<usize>;

    /// Number of venue maintenance requests with the given maintenance state.
    async fn venue_maintenance(&self, credential: &Credential, maintenance: &str)
    -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_rejects_blank() {
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new(" abc ").unwrap().token(), "abc");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let c = Credential::new("secret").unwrap();
        assert!(!format!("{c:?}").contains("secret"));
    }
}
