use chrono::NaiveDateTime;
use serde::Serialize;

use super::join::{NewestUser, TopUser};
use super::resilient::SourceFailure;
use crate::delta::DerivedMetric;
use crate::period::Window;
use crate::sources::records::CourtUsageRecord;

/// Immutable result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewMetrics {
    pub generated_at: NaiveDateTime,
    pub current_period: Window,
    pub previous_period: Window,

    // headline cards
    /// Users that survived boundary coercion. Records without an id or a
    /// parseable creation timestamp are dropped by the reader and not counted.
    pub total_users: usize,
    pub new_users_count: usize,
    pub today_bookings: usize,
    pub current_month_revenue: f64,
    pub current_month_revenue_display: String,
    pub pending_maintenance: usize,

    // comparisons
    pub users_change: DerivedMetric,
    pub bookings_change: DerivedMetric,
    pub revenue_change: DerivedMetric,

    // rankings
    pub top_courts: Vec<CourtUsageRecord>,
    pub top_users: Vec<TopUser>,
    pub newest_users: Vec<NewestUser>,

    /// Sources that were unavailable; their metrics hold zero/empty defaults.
    pub degraded: Vec<SourceFailure>,
}

impl OverviewMetrics {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}
