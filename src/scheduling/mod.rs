//! Consultation scheduling: ledger, audit trail, notifications.

pub mod audit;
pub mod ledger;
pub mod notify;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::errors::ApiError;

pub use audit::{AuditEntry, AuditEvent, AuditLog, ConsultationStats, TeamMember};
pub use ledger::{
    AvailableSlots, ClientInfo, ConsultationRequest, ConsultationStatus, NewConsultation,
    ScheduleOutcome, SchedulingLedger,
};
pub use notify::{Notifier, NullNotifier, WebhookNotifier};

/// Load a JSON list, treating a missing or unreadable file as empty.
/// Ledger-style files trade durability for availability.
pub(crate) fn load_json_or_default<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    if !path.exists() {
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(items) => items,
            Err(err) => {
                tracing::warn!(
                    "unreadable ledger at {}, starting empty: {}",
                    path.display(),
                    err
                );
                Vec::new()
            }
        },
        Err(err) => {
            tracing::warn!(
                "unreadable ledger at {}, starting empty: {}",
                path.display(),
                err
            );
            Vec::new()
        }
    }
}

/// Serialize the whole list and write it through.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ApiError> {
    let contents = serde_json::to_string_pretty(value).map_err(ApiError::internal)?;
    fs::write(path, contents).map_err(ApiError::internal)
}

/// Accept either an RFC 3339 timestamp or a bare date. A bare end date
/// covers its whole day.
pub fn parse_range_bound(
    value: &str,
    end_of_day: bool,
) -> Result<chrono::DateTime<chrono::Utc>, ApiError> {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let time = if end_of_day {
            NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
        } else {
            NaiveTime::default()
        };
        return Ok(DateTime::from_naive_utc_and_offset(date.and_time(time), Utc));
    }
    Err(ApiError::BadRequest(format!(
        "invalid date '{}': expected YYYY-MM-DD or RFC 3339",
        value
    )))
}
