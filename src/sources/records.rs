//! Typed record shapes returned by the source readers.
//!
//! Every field here is guaranteed present; optionality from the raw
//! payload is resolved during coercion.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::period::Window;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRecord {
    pub user_id: Option<String>,
    pub amount: f64,
    pub created_at: NaiveDateTime,
}

/// Live operational state of a court.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CourtStatus {
    Available,
    Booked,
    Maintenance,
}

impl CourtStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "available" | "active" => Some(Self::Available),
            "booked" | "in_use" | "occupied" => Some(Self::Booked),
            "maintenance" | "under_maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourtRecord {
    pub court_id: String,
    pub status: CourtStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourtUsageRecord {
    pub court_id: String,
    pub court_name: String,
    pub booking_count: u64,
    pub revenue: f64,
    pub utilization_rate: f64,
    pub status: CourtStatus,
}

/// Total revenue for one explicit date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueSnapshot {
    pub window: Window,
    pub total: f64,
}
