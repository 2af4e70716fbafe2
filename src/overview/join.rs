//! Foreign-key joins between independently fetched collections.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::ranking::top_n;
use crate::sources::records::{
    BookingRecord, CourtRecord, CourtStatus, CourtUsageRecord, UserRecord,
};

/// Users created within this many days of the reference instant are new.
pub const NEW_USER_WINDOW_DAYS: i64 = 3;

/// Replaces each usage record's status with the live court status.
/// Records for courts missing from the live list keep their reported status.
pub fn overlay_court_status(
    usage: Vec<CourtUsageRecord>,
    courts: &[CourtRecord],
) -> Vec<CourtUsageRecord> {
    let live: HashMap<&str, CourtStatus> = courts
        .iter()
        .map(|c| (c.court_id.as_str(), c.status))
        .collect();

    usage
        .into_iter()
        .map(|mut record| {
            if let Some(status) = live.get(record.court_id.as_str()) {
                record.status = *status;
            }
            record
        })
        .collect()
}

/// Per-user booking totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRollup {
    pub booking_count: u64,
    pub total_revenue: f64,
    pub last_booking: Option<NaiveDateTime>,
}

/// Folds bookings into per-user rollups. Bookings without a user are skipped.
pub fn user_rollups(bookings: &[BookingRecord]) -> HashMap<String, UserRollup> {
    let mut rollups: HashMap<String, UserRollup> = HashMap::new();

    for booking in bookings {
        let Some(user_id) = &booking.user_id else {
            continue;
        };
        let entry = rollups.entry(user_id.clone()).or_default();
        entry.booking_count += 1;
        entry.total_revenue += booking.amount;
        entry.last_booking = entry.last_booking.max(Some(booking.created_at));
    }

    rollups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopUser {
    #[serde(flatten)]
    pub user: UserRecord,
    pub booking_count: u64,
    pub total_revenue: f64,
    pub last_booking: Option<NaiveDateTime>,
}

/// Ranks users by booking count. Users without bookings are excluded and
/// rollups for unknown user ids never appear.
pub fn rank_top_users(
    users: &[UserRecord],
    rollups: &HashMap<String, UserRollup>,
    n: usize,
) -> Vec<TopUser> {
    let candidates: Vec<TopUser> = users
        .iter()
        .filter_map(|user| {
            let rollup = rollups.get(&user.id).filter(|r| r.booking_count > 0)?;
            Some(TopUser {
                user: user.clone(),
                booking_count: rollup.booking_count,
                total_revenue: rollup.total_revenue,
                last_booking: rollup.last_booking,
            })
        })
        .collect();

    top_n(candidates, |u| u.booking_count as f64, n)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewestUser {
    #[serde(flatten)]
    pub user: UserRecord,
    pub is_new: bool,
}

/// `created_at >= now - 3 days`, boundary inclusive.
pub fn is_new_user(user: &UserRecord, now: NaiveDateTime) -> bool {
    user.created_at >= now - Duration::days(NEW_USER_WINDOW_DAYS)
}

/// The `n` most recently created users, newest first.
pub fn newest_users(users: &[UserRecord], now: NaiveDateTime, n: usize) -> Vec<NewestUser> {
    let ranked = top_n(
        users.to_vec(),
        |u| u.created_at.and_utc().timestamp_millis() as f64,
        n,
    );
    ranked
        .into_iter()
        .map(|user| NewestUser {
            is_new: is_new_user(&user, now),
            user,
        })
        .collect()
}
