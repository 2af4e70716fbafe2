//! Boundary coercion from raw JSON payloads into typed records.
//!
//! Collections may arrive bare or wrapped in an object envelope. Items that
//! lack a required field are dropped; a payload with no recognizable
//! collection is an error.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tracing::debug;

use super::records::{BookingRecord, CourtRecord, CourtStatus, CourtUsageRecord, UserRecord};

/// Locates the collection in `payload`: a bare array, `data`, `data.<key>`
/// or `<key>` for any of `keys`.
pub fn extract_items<'a>(payload: &'a Value, keys: &[&str]) -> Result<&'a [Value]> {
    if let Some(items) = payload.as_array() {
        return Ok(items);
    }

    let mut scopes = vec![payload];
    if let Some(data) = payload.get("data") {
        if let Some(items) = data.as_array() {
            return Ok(items);
        }
        scopes.insert(0, data);
    }

    for scope in scopes {
        for key in keys {
            if let Some(items) = scope.get(*key).and_then(Value::as_array) {
                return Ok(items);
            }
        }
    }

    Err(anyhow!(
        "payload has no collection under data or any of {keys:?}"
    ))
}

/// Number of items in the collection, for readers used only as counters.
pub fn count_items(payload: &Value, keys: &[&str]) -> Result<usize> {
    extract_items(payload, keys).map(<[Value]>::len)
}

fn field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find(|v| !v.is_null())
}

fn as_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(_) => field(v, &["id", "_id"]).and_then(as_id),
        _ => None,
    }
}

/// Finite numbers only; `"NaN"` and `"inf"` strings are rejected.
fn as_f64(v: &Value) -> Option<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn as_string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_string)
}

/// Parses a timestamp into local wall-clock time.
///
/// Offset-carrying RFC 3339 values are converted to the local zone; naive
/// values and bare dates are taken as already local. Integers are epoch
/// milliseconds.
pub fn as_timestamp(v: &Value) -> Option<NaiveDateTime> {
    match v {
        Value::String(s) => parse_timestamp(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.with_timezone(&Local).naive_local()),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

macro_rules! require {
    ($kind:expr, $value:expr, $what:expr) => {
        match $value {
            Some(v) => v,
            None => {
                debug!(kind = $kind, missing = $what, "Dropping malformed item");
                return None;
            }
        }
    };
}

pub fn user(item: &Value) -> Option<UserRecord> {
    let id = require!(
        "user",
        field(item, &["id", "_id", "user_id", "userId"]).and_then(as_id),
        "id"
    );
    let created_at = require!(
        "user",
        field(item, &["created_at", "createdAt"]).and_then(as_timestamp),
        "created_at"
    );
    let email = field(item, &["email"]).and_then(as_string);
    let name = field(item, &["full_name", "fullName", "name", "username"])
        .and_then(as_string)
        .or_else(|| email.clone())
        .unwrap_or_default();
    let role = field(item, &["role"])
        .and_then(as_string)
        .unwrap_or_else(|| "user".to_string());

    Some(UserRecord {
        id,
        name,
        email,
        role,
        created_at,
    })
}

pub fn booking(item: &Value) -> Option<BookingRecord> {
    let created_at = require!(
        "booking",
        field(item, &["created_at", "createdAt"]).and_then(as_timestamp),
        "created_at"
    );
    let user_id = field(item, &["user_id", "userId", "user"]).and_then(as_id);
    let amount = field(
        item,
        &["amount", "total_amount", "totalAmount", "total_price", "totalPrice"],
    )
    .and_then(as_f64)
    .unwrap_or(0.0);

    Some(BookingRecord {
        user_id,
        amount,
        created_at,
    })
}

pub fn court(item: &Value) -> Option<CourtRecord> {
    let court_id = require!(
        "court",
        field(item, &["court_id", "courtId", "id", "_id"]).and_then(as_id),
        "id"
    );
    let status = require!(
        "court",
        field(item, &["status"]).and_then(Value::as_str).and_then(CourtStatus::parse),
        "status"
    );
    Some(CourtRecord { court_id, status })
}

pub fn court_usage(item: &Value) -> Option<CourtUsageRecord> {
    let court_id = require!(
        "court_usage",
        field(item, &["court_id", "courtId", "id", "court"]).and_then(as_id),
        "court_id"
    );
    let court_name = field(item, &["court_name", "courtName", "name"])
        .and_then(as_string)
        .unwrap_or_else(|| court_id.clone());
    let booking_count = field(
        item,
        &["booking_count", "bookingCount", "total_bookings", "totalBookings"],
    )
    .and_then(as_f64)
    .map(|c| c.max(0.0) as u64)
    .unwrap_or(0);
    let revenue = field(item, &["revenue", "total_revenue", "totalRevenue"])
        .and_then(as_f64)
        .unwrap_or(0.0);
    let utilization_rate = field(item, &["utilization_rate", "utilizationRate"])
        .and_then(as_f64)
        .unwrap_or(0.0);
    let status = field(item, &["status"])
        .and_then(Value::as_str)
        .and_then(CourtStatus::parse)
        .unwrap_or(CourtStatus::Available);

    Some(CourtUsageRecord {
        court_id,
        court_name,
        booking_count,
        revenue,
        utilization_rate,
        status,
    })
}

/// Applies `parse` to every item of the collection, dropping failures.
pub fn collect<T>(
    payload: &Value,
    keys: &[&str],
    parse: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>> {
    let items = extract_items(payload, keys)?;
    let records: Vec<T> = items.iter().filter_map(parse).collect();
    if records.len() < items.len() {
        debug!(
            received = items.len(),
            kept = records.len(),
            "Some items were dropped during coercion"
        );
    }
    Ok(records)
}

/// Reads `revenue.total` (optionally under `data`).
pub fn revenue_total(payload: &Value) -> Result<f64> {
    let scope = payload
        .get("data")
        .filter(|d| d.is_object())
        .unwrap_or(payload);
    let revenue = scope
        .get("revenue")
        .ok_or_else(|| anyhow!("revenue payload has no `revenue` field"))?;

    let total = match revenue {
        Value::Object(_) => revenue.get("total").and_then(as_f64),
        other => as_f64(other),
    };
    total.ok_or_else(|| anyhow!("revenue payload has no numeric `revenue.total`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ndt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn test_extract_items_bare_and_enveloped() {
        let bare = json!([1, 2]);
        assert_eq!(extract_items(&bare, &[]).unwrap().len(), 2);

        let data = json!({"success": true, "data": [1, 2, 3]});
        assert_eq!(extract_items(&data, &[]).unwrap().len(), 3);

        let nested = json!({"data": {"users": [1], "total": 1}});
        assert_eq!(extract_items(&nested, &["users"]).unwrap().len(), 1);

        let keyed = json!({"issues": [1, 2]});
        assert_eq!(count_items(&keyed, &["issues"]).unwrap(), 2);
    }

    #[test]
    fn test_extract_items_rejects_unknown_shape() {
        assert!(extract_items(&json!({"message": "oops"}), &["users"]).is_err());
        assert!(extract_items(&json!("text"), &["users"]).is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(as_timestamp(&json!("2024-02-01T10:00:00")), Some(ndt("2024-02-01T10:00:00")));
        assert_eq!(
            as_timestamp(&json!("2024-02-01 10:00:00.250")),
            NaiveDateTime::parse_from_str("2024-02-01 10:00:00.250", "%Y-%m-%d %H:%M:%S%.f").ok()
        );
        assert_eq!(as_timestamp(&json!("2024-02-01")), Some(ndt("2024-02-01T00:00:00")));
        assert_eq!(as_timestamp(&json!("yesterday")), None);

        let rfc = "2024-02-01T10:00:00Z";
        let expected = DateTime::parse_from_rfc3339(rfc)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(as_timestamp(&json!(rfc)), Some(expected));
    }

    #[test]
    fn test_user_accepts_numeric_id_and_camel_case() {
        let u = user(&json!({
            "id": 7,
            "fullName": "Lan",
            "createdAt": "2024-01-05",
            "role": "admin"
        }))
        .unwrap();
        assert_eq!(u.id, "7");
        assert_eq!(u.name, "Lan");
        assert_eq!(u.role, "admin");
        assert_eq!(u.created_at, ndt("2024-01-05T00:00:00"));
    }

    #[test]
    fn test_user_without_created_at_is_dropped() {
        assert!(user(&json!({"id": 1})).is_none());
    }

    #[test]
    fn test_booking_user_reference_variants() {
        let flat =
            booking(&json!({"user_id": 3, "amount": "120.5", "created_at": "2024-02-01"})).unwrap();
        assert_eq!(flat.user_id.as_deref(), Some("3"));
        assert_eq!(flat.amount, 120.5);

        let nested = booking(&json!({
            "user": {"id": "u9"},
            "totalAmount": 10,
            "createdAt": "2024-02-01"
        }))
        .unwrap();
        assert_eq!(nested.user_id.as_deref(), Some("u9"));

        let anonymous =
            booking(&json!({"user_id": null, "amount": 5, "created_at": "2024-02-01"})).unwrap();
        assert_eq!(anonymous.user_id, None);
    }

    #[test]
    fn test_court_requires_known_status() {
        assert_eq!(
            court(&json!({"id": 1, "status": "Maintenance"})).unwrap().status,
            CourtStatus::Maintenance
        );
        assert!(court(&json!({"id": 1, "status": "exploded"})).is_none());
    }

    #[test]
    fn test_court_usage_defaults() {
        let u = court_usage(&json!({"court_id": "A", "booking_count": 5})).unwrap();
        assert_eq!(u.court_name, "A");
        assert_eq!(u.booking_count, 5);
        assert_eq!(u.revenue, 0.0);
        assert_eq!(u.status, CourtStatus::Available);
    }

    #[test]
    fn test_collect_drops_malformed_items() {
        let payload = json!({"data": [
            {"id": 1, "created_at": "2024-01-05"},
            {"id": 2},
            "garbage"
        ]});
        let users = collect(&payload, &["users"], user).unwrap();
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn test_non_finite_numbers_are_malformed() {
        assert!(revenue_total(&json!({"revenue": {"total": "NaN"}})).is_err());
        assert!(revenue_total(&json!({"revenue": "inf"})).is_err());

        let b = booking(&json!({"user_id": 1, "amount": "infinity", "created_at": "2024-02-01"}))
            .unwrap();
        assert_eq!(b.amount, 0.0);

        let u = court_usage(&json!({"court_id": "A", "booking_count": "NaN", "revenue": "-inf"}))
            .unwrap();
        assert_eq!(u.booking_count, 0);
        assert_eq!(u.revenue, 0.0);
    }

    #[test]
    fn test_revenue_total_shapes() {
        assert_eq!(revenue_total(&json!({"revenue": {"total": 1500}})).unwrap(), 1500.0);
        assert_eq!(revenue_total(&json!({"data": {"revenue": {"total": "20"}}})).unwrap(), 20.0);
        assert!(revenue_total(&json!({"revenue": {}})).is_err());
        assert!(revenue_total(&json!([])).is_err());
    }
}
