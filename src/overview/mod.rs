//! Dashboard overview aggregation.
//!
//! [`compute_overview`] issues every source read concurrently, tolerates
//! individual failures through [`resilient::resilient_read`], then joins,
//! ranks and compares the collected data synchronously.

pub mod join;
pub mod metrics;
pub mod resilient;

use chrono::NaiveDateTime;
use tracing::{error, info};

use crate::delta::percent_change;
use crate::error::{OverviewError, Result};
use crate::output::format_vnd;
use crate::period::{Window, current_window, day_key, previous_day_key, previous_window};
use crate::ranking::top_n;
use crate::sources::records::{
    BookingRecord, CourtRecord, CourtUsageRecord, RevenueSnapshot, UserRecord,
};
use crate::sources::{ALL_TIME, Credential, DashboardApi, PENDING, SourceKind};
use join::{is_new_user, newest_users, overlay_court_status, rank_top_users, user_rollups};
use metrics::OverviewMetrics;
use resilient::{SourceFailure, SourceOutcome, resilient_read};

pub const TOP_COURTS: usize = 10;
pub const TOP_USERS: usize = 5;
pub const NEWEST_USERS: usize = 5;

/// Everything fetched during one pass, degraded sources already defaulted.
#[derive(Debug, Default)]
pub struct PassData {
    pub users: Vec<UserRecord>,
    pub bookings: Vec<BookingRecord>,
    pub courts: Vec<CourtRecord>,
    pub court_usage: Vec<CourtUsageRecord>,
    pub current_revenue: Option<RevenueSnapshot>,
    pub previous_revenue: Option<RevenueSnapshot>,
    pub equipment_issues: usize,
    pub venue_maintenance: usize,
}

/// Tagged outcome of every reader call in one pass.
#[derive(Debug)]
pub struct SourceOutcomes {
    pub users: SourceOutcome<Vec<UserRecord>>,
    pub bookings: SourceOutcome<Vec<BookingRecord>>,
    pub courts: SourceOutcome<Vec<CourtRecord>>,
    pub court_usage: SourceOutcome<Vec<CourtUsageRecord>>,
    pub current_revenue: SourceOutcome<RevenueSnapshot>,
    pub previous_revenue: SourceOutcome<RevenueSnapshot>,
    pub equipment_issues: SourceOutcome<usize>,
    pub venue_maintenance: SourceOutcome<usize>,
}

impl SourceOutcomes {
    /// Failed sources, in issue order.
    pub fn failures(&self) -> Vec<SourceFailure> {
        [
            self.users.failure(),
            self.bookings.failure(),
            self.courts.failure(),
            self.court_usage.failure(),
            self.current_revenue.failure(),
            self.previous_revenue.failure(),
            self.equipment_issues.failure(),
            self.venue_maintenance.failure(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }

    /// Replaces every failed source with its zero/empty default.
    pub fn into_pass_data(self) -> PassData {
        PassData {
            users: self.users.or_default(),
            bookings: self.bookings.or_default(),
            courts: self.courts.or_default(),
            court_usage: self.court_usage.or_default(),
            current_revenue: self.current_revenue.ready(),
            previous_revenue: self.previous_revenue.ready(),
            equipment_issues: self.equipment_issues.or_default(),
            venue_maintenance: self.venue_maintenance.or_default(),
        }
    }
}

/// Issues every reader call concurrently, each through [`resilient_read`].
pub async fn read_sources<A>(
    api: &A,
    credential: &Credential,
    current: Window,
    previous: Window,
) -> SourceOutcomes
where
    A: DashboardApi + ?Sized,
{
    let (
        users,
        bookings,
        courts,
        court_usage,
        current_revenue,
        previous_revenue,
        equipment_issues,
        venue_maintenance,
    ) = tokio::join!(
        resilient_read(SourceKind::Users, api.users(credential)),
        resilient_read(SourceKind::Bookings, api.bookings(credential)),
        resilient_read(SourceKind::Courts, api.courts(credential)),
        resilient_read(
            SourceKind::CourtUsage,
            api.court_usage(credential, ALL_TIME)
        ),
        resilient_read(
            SourceKind::CurrentRevenue,
            api.dashboard_revenue(credential, current)
        ),
        resilient_read(
            SourceKind::PreviousRevenue,
            api.dashboard_revenue(credential, previous)
        ),
        resilient_read(
            SourceKind::EquipmentIssues,
            api.equipment_issues(credential, PENDING)
        ),
        resilient_read(
            SourceKind::VenueMaintenance,
            api.venue_maintenance(credential, PENDING)
        ),
    );

    SourceOutcomes {
        users,
        bookings,
        courts,
        court_usage,
        current_revenue,
        previous_revenue,
        equipment_issues,
        venue_maintenance,
    }
}

/// Runs one aggregation pass anchored at `now` (local wall-clock time).
///
/// Fails only when no credential is supplied (before any read) or when
/// every source read fails.
#[tracing::instrument(skip(api, credential), fields(now = %now))]
pub async fn compute_overview<A>(
    api: &A,
    credential: Option<&Credential>,
    now: NaiveDateTime,
) -> Result<OverviewMetrics>
where
    A: DashboardApi + ?Sized,
{
    let credential = credential.ok_or(OverviewError::MissingCredential)?;

    let current = current_window(now);
    let previous = previous_window(now);

    let outcomes = read_sources(api, credential, current, previous).await;
    let degraded = outcomes.failures();

    if degraded.len() == SourceKind::ALL.len() {
        error!(failures = degraded.len(), "Every dashboard source failed");
        return Err(OverviewError::AllSourcesFailed { failures: degraded });
    }

    let data = outcomes.into_pass_data();
    let metrics = aggregate(data, now, current, previous, degraded);
    info!(
        total_users = metrics.total_users,
        today_bookings = metrics.today_bookings,
        pending_maintenance = metrics.pending_maintenance,
        degraded = metrics.degraded.len(),
        "Overview pass complete"
    );
    Ok(metrics)
}

/// The synchronous half of a pass: joins, rankings and comparisons.
pub fn aggregate(
    data: PassData,
    now: NaiveDateTime,
    current: Window,
    previous: Window,
    degraded: Vec<SourceFailure>,
) -> OverviewMetrics {
    let users_this_month = data
        .users
        .iter()
        .filter(|u| current.contains(u.created_at))
        .count();
    let users_last_month = data
        .users
        .iter()
        .filter(|u| previous.contains(u.created_at))
        .count();

    let today = day_key(now);
    let yesterday = previous_day_key(now);
    let (today_bookings, yesterday_bookings) =
        data.bookings
            .iter()
            .fold((0usize, 0usize), |(t, y), b| match day_key(b.created_at) {
                key if key == today => (t + 1, y),
                key if key == yesterday => (t, y + 1),
                _ => (t, y),
            });

    let revenue_now = data.current_revenue.as_ref().map_or(0.0, |r| r.total);
    let revenue_before = data.previous_revenue.as_ref().map_or(0.0, |r| r.total);

    let rollups = user_rollups(&data.bookings);
    let top_users = rank_top_users(&data.users, &rollups, TOP_USERS);
    let newest = newest_users(&data.users, now, NEWEST_USERS);
    let new_users_count = data.users.iter().filter(|u| is_new_user(u, now)).count();

    let courts = overlay_court_status(data.court_usage, &data.courts);
    let top_courts = top_n(courts, |c| c.booking_count as f64, TOP_COURTS);

    OverviewMetrics {
        generated_at: now,
        current_period: current,
        previous_period: previous,
        total_users: data.users.len(),
        new_users_count,
        today_bookings,
        current_month_revenue: revenue_now,
        current_month_revenue_display: format_vnd(revenue_now),
        pending_maintenance: data.equipment_issues + data.venue_maintenance,
        users_change: percent_change(users_this_month as f64, users_last_month as f64),
        bookings_change: percent_change(today_bookings as f64, yesterday_bookings as f64),
        revenue_change: percent_change(revenue_now, revenue_before),
        top_courts,
        top_users,
        newest_users: newest,
        degraded,
    }
}
