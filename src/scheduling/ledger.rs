//! Consultation requests: the JSON-backed ledger and slot arithmetic.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::config::settings::ContactInfo;
use crate::core::errors::ApiError;

use super::audit::{AuditEvent, AuditLog};
use super::{load_json_or_default, write_json};

/// Bookable times, every business day.
const DAILY_SLOTS: [&str; 7] = [
    "9:00 AM", "10:00 AM", "11:00 AM", "1:00 PM", "2:00 PM", "3:00 PM", "4:00 PM",
];

/// How many business days ahead the calendar extends.
const BUSINESS_DAYS_AHEAD: usize = 14;

const DEFAULT_TIMEZONE: &str = "EST";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Pending and confirmed requests hold their slot; terminal states
    /// release it.
    fn occupies_slot(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationRequest {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub preferred_date: String,
    #[serde(default)]
    pub preferred_time: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub message: String,
    pub status: ConsultationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Incoming scheduling form/JSON payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewConsultation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub preferred_date: String,
    #[serde(default)]
    pub preferred_time: String,
    #[serde(default)]
    pub message: String,
}

/// Request metadata captured for the audit trail.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

/// A slot conflict is an expected outcome, not an error.
#[derive(Debug, Clone)]
pub enum ScheduleOutcome {
    Scheduled { id: String },
    SlotTaken { message: String, suggestion: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableSlots {
    pub available_days: Vec<String>,
    pub available_times: Vec<String>,
    pub available_slots_by_day: BTreeMap<String, Vec<String>>,
    pub timezone: String,
}

pub struct SchedulingLedger {
    path: PathBuf,
    requests: Mutex<Vec<ConsultationRequest>>,
    audit: Arc<AuditLog>,
    contact: ContactInfo,
}

impl SchedulingLedger {
    /// Open the ledger file, tolerating absence or corruption (an unreadable
    /// ledger degrades to an empty one rather than refusing to serve).
    pub fn open(path: PathBuf, audit: Arc<AuditLog>, contact: ContactInfo) -> Self {
        let requests: Vec<ConsultationRequest> = load_json_or_default(&path);
        Self {
            path,
            requests: Mutex::new(requests),
            audit,
            contact,
        }
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    /// Create a request if its slot is free.
    ///
    /// The conflict check and the insert happen under one lock so two
    /// concurrent calls cannot both claim the same slot.
    pub async fn schedule(
        &self,
        new: NewConsultation,
        client: ClientInfo,
    ) -> Result<ScheduleOutcome, ApiError> {
        if new.name.trim().is_empty() || new.email.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "name and email are required to schedule a consultation".to_string(),
            ));
        }

        let request = {
            let mut requests = self.requests.lock().await;

            if !new.preferred_date.is_empty()
                && !new.preferred_time.is_empty()
                && slot_taken(&requests, &new.preferred_date, &new.preferred_time)
            {
                return Ok(ScheduleOutcome::SlotTaken {
                    message: format!(
                        "Sorry, the time slot {} on {} is no longer available. Please select a different time.",
                        new.preferred_time, new.preferred_date
                    ),
                    suggestion: "Try refreshing the page to see updated available times."
                        .to_string(),
                });
            }

            let request = ConsultationRequest {
                id: short_id(),
                name: new.name.trim().to_string(),
                email: new.email.trim().to_string(),
                phone: new.phone,
                company: new.company,
                preferred_date: new.preferred_date,
                preferred_time: new.preferred_time,
                timezone: DEFAULT_TIMEZONE.to_string(),
                message: new.message,
                status: ConsultationStatus::Pending,
                created_at: Utc::now(),
                confirmed_at: None,
            };

            requests.push(request.clone());
            write_json(&self.path, &*requests)?;
            request
        };

        self.audit
            .record(AuditEvent {
                action: "scheduled".to_string(),
                consultation_id: request.id.clone(),
                user_name: request.name.clone(),
                user_email: request.email.clone(),
                user_phone: request.phone.clone(),
                company: request.company.clone(),
                preferred_date: request.preferred_date.clone(),
                preferred_time: request.preferred_time.clone(),
                message: request.message.clone(),
                status: request.status.as_str().to_string(),
                ip_address: client.ip_address,
                user_agent: client.user_agent,
            })
            .await?;

        Ok(ScheduleOutcome::Scheduled { id: request.id })
    }

    /// Overwrite a request's status. Any transition is allowed (admin
    /// override); `confirmed_at` is stamped only when the request enters
    /// confirmed.
    pub async fn update_status(
        &self,
        id: &str,
        status: ConsultationStatus,
    ) -> Result<ConsultationStatus, ApiError> {
        let (old_status, updated) = {
            let mut requests = self.requests.lock().await;
            let request = requests
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| ApiError::NotFound("Consultation request not found".to_string()))?;

            let old_status = request.status;
            request.status = status;
            if status == ConsultationStatus::Confirmed && old_status != ConsultationStatus::Confirmed
            {
                request.confirmed_at = Some(Utc::now());
            }
            let updated = request.clone();
            write_json(&self.path, &*requests)?;
            (old_status, updated)
        };

        self.audit
            .record(AuditEvent {
                action: "updated".to_string(),
                consultation_id: updated.id.clone(),
                user_name: updated.name.clone(),
                user_email: updated.email.clone(),
                user_phone: updated.phone.clone(),
                company: updated.company.clone(),
                preferred_date: updated.preferred_date.clone(),
                preferred_time: updated.preferred_time.clone(),
                message: updated.message.clone(),
                status: status.as_str().to_string(),
                ..AuditEvent::default()
            })
            .await?;

        Ok(old_status)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        {
            let mut requests = self.requests.lock().await;
            let before = requests.len();
            requests.retain(|r| r.id != id);
            if requests.len() == before {
                return Err(ApiError::NotFound(
                    "Consultation request not found".to_string(),
                ));
            }
            write_json(&self.path, &*requests)?;
        }

        self.audit
            .record(AuditEvent {
                action: "deleted".to_string(),
                consultation_id: id.to_string(),
                user_name: "Admin".to_string(),
                user_email: "admin@system".to_string(),
                status: "deleted".to_string(),
                ..AuditEvent::default()
            })
            .await?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> Option<ConsultationRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    pub async fn all(&self) -> Vec<ConsultationRequest> {
        self.requests.lock().await.clone()
    }

    /// Admin listing with optional status and created-at range filters.
    pub async fn filtered(
        &self,
        status: Option<ConsultationStatus>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<ConsultationRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .filter(|r| from.map_or(true, |f| r.created_at >= f))
            .filter(|r| to.map_or(true, |t| r.created_at <= t))
            .cloned()
            .collect()
    }

    /// The booking calendar: fixed daily times over the next business days,
    /// minus occupied slots. Days with nothing free are omitted.
    pub async fn available_slots(&self) -> AvailableSlots {
        let requests = self.requests.lock().await;

        let mut by_day = BTreeMap::new();
        for day in upcoming_business_days() {
            let free: Vec<String> = DAILY_SLOTS
                .iter()
                .filter(|time| !slot_taken(&requests, &day, time))
                .map(|time| time.to_string())
                .collect();
            if !free.is_empty() {
                by_day.insert(day, free);
            }
        }

        AvailableSlots {
            available_days: by_day.keys().cloned().collect(),
            available_times: DAILY_SLOTS.iter().map(|s| s.to_string()).collect(),
            available_slots_by_day: by_day,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

fn slot_taken(requests: &[ConsultationRequest], date: &str, time: &str) -> bool {
    requests.iter().any(|r| {
        r.status.occupies_slot() && r.preferred_date == date && r.preferred_time == time
    })
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// The next `BUSINESS_DAYS_AHEAD` weekdays, starting tomorrow.
fn upcoming_business_days() -> Vec<String> {
    let mut days = Vec::with_capacity(BUSINESS_DAYS_AHEAD);
    let mut date = Utc::now().date_naive();
    while days.len() < BUSINESS_DAYS_AHEAD {
        date = date + Duration::days(1);
        if date.weekday().number_from_monday() <= 5 {
            days.push(date.format("%Y-%m-%d").to_string());
        }
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::notify::NullNotifier;
    use tempfile::TempDir;

    fn ledger(dir: &TempDir) -> SchedulingLedger {
        let audit = Arc::new(AuditLog::open(
            dir.path().join("logs.json"),
            dir.path().join("team.json"),
            Arc::new(NullNotifier),
            ContactInfo::default(),
        ));
        SchedulingLedger::open(
            dir.path().join("requests.json"),
            audit,
            ContactInfo::default(),
        )
    }

    fn booking(date: &str, time: &str) -> NewConsultation {
        NewConsultation {
            name: "Sam".to_string(),
            email: "sam@acme.com".to_string(),
            preferred_date: date.to_string(),
            preferred_time: time.to_string(),
            ..NewConsultation::default()
        }
    }

    async fn schedule_ok(ledger: &SchedulingLedger, new: NewConsultation) -> String {
        match ledger.schedule(new, ClientInfo::default()).await.unwrap() {
            ScheduleOutcome::Scheduled { id } => id,
            ScheduleOutcome::SlotTaken { message, .. } => panic!("unexpected conflict: {}", message),
        }
    }

    #[tokio::test]
    async fn double_booking_is_rejected_until_cancellation() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        let first = schedule_ok(&ledger, booking("2025-03-15", "2:00 PM")).await;
        assert_eq!(first.len(), 8);

        // Same slot while the first request is pending: conflict.
        let second = ledger
            .schedule(booking("2025-03-15", "2:00 PM"), ClientInfo::default())
            .await
            .unwrap();
        match second {
            ScheduleOutcome::SlotTaken { message, suggestion } => {
                assert!(message.contains("2:00 PM"));
                assert!(message.contains("2025-03-15"));
                assert!(!suggestion.is_empty());
            }
            ScheduleOutcome::Scheduled { .. } => panic!("expected a conflict"),
        }

        // Cancelling the first request frees the slot.
        ledger
            .update_status(&first, ConsultationStatus::Cancelled)
            .await
            .unwrap();
        let third = schedule_ok(&ledger, booking("2025-03-15", "2:00 PM")).await;
        assert_ne!(third, first);
    }

    #[tokio::test]
    async fn different_slots_do_not_conflict() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        schedule_ok(&ledger, booking("2025-03-15", "2:00 PM")).await;
        schedule_ok(&ledger, booking("2025-03-15", "3:00 PM")).await;
        schedule_ok(&ledger, booking("2025-03-16", "2:00 PM")).await;
        assert_eq!(ledger.all().await.len(), 3);
    }

    #[tokio::test]
    async fn missing_contact_fields_are_rejected() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        let err = ledger
            .schedule(
                NewConsultation {
                    email: "sam@acme.com".to_string(),
                    ..NewConsultation::default()
                },
                ClientInfo::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert!(ledger.all().await.is_empty());
    }

    #[tokio::test]
    async fn confirmed_at_is_stamped_only_on_confirmation() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);
        let id = schedule_ok(&ledger, booking("2025-03-20", "9:00 AM")).await;

        assert!(ledger.get(&id).await.unwrap().confirmed_at.is_none());

        let old = ledger
            .update_status(&id, ConsultationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(old, ConsultationStatus::Pending);
        let confirmed_at = ledger.get(&id).await.unwrap().confirmed_at;
        assert!(confirmed_at.is_some());

        // Any further transition is allowed and keeps the original stamp.
        ledger
            .update_status(&id, ConsultationStatus::Completed)
            .await
            .unwrap();
        assert_eq!(ledger.get(&id).await.unwrap().confirmed_at, confirmed_at);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        assert!(ledger.get("missing1").await.is_none());
        assert!(matches!(
            ledger
                .update_status("missing1", ConsultationStatus::Confirmed)
                .await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            ledger.delete("missing1").await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn ledger_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let id = {
            let ledger = ledger(&dir);
            schedule_ok(&ledger, booking("2025-03-21", "1:00 PM")).await
        };

        let reopened = ledger(&dir);
        let request = reopened.get(&id).await.unwrap();
        assert_eq!(request.preferred_time, "1:00 PM");
        assert_eq!(request.status, ConsultationStatus::Pending);
    }

    #[tokio::test]
    async fn corrupt_ledger_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("requests.json"), "{{{ nonsense").unwrap();
        let ledger = ledger(&dir);
        assert!(ledger.all().await.is_empty());
    }

    #[tokio::test]
    async fn available_slots_exclude_weekends_and_booked_times() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        let slots = ledger.available_slots().await;
        assert_eq!(slots.available_days.len(), BUSINESS_DAYS_AHEAD);
        assert_eq!(slots.available_times.len(), DAILY_SLOTS.len());
        for day in &slots.available_days {
            let date = chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap();
            assert!(date.weekday().number_from_monday() <= 5, "{} is a weekend", day);
        }

        // Book a slot on the first listed day and watch it disappear.
        let day = slots.available_days[0].clone();
        schedule_ok(&ledger, booking(&day, "9:00 AM")).await;
        let after = ledger.available_slots().await;
        let times = after.available_slots_by_day.get(&day).unwrap();
        assert!(!times.contains(&"9:00 AM".to_string()));
        assert_eq!(times.len(), DAILY_SLOTS.len() - 1);

        // Cancelled bookings release the slot again.
        let requests = ledger.all().await;
        ledger
            .update_status(&requests[0].id, ConsultationStatus::Cancelled)
            .await
            .unwrap();
        let released = ledger.available_slots().await;
        assert!(released
            .available_slots_by_day
            .get(&day)
            .unwrap()
            .contains(&"9:00 AM".to_string()));
    }

    #[tokio::test]
    async fn filtered_listing_by_status() {
        let dir = TempDir::new().unwrap();
        let ledger = ledger(&dir);

        let a = schedule_ok(&ledger, booking("2025-04-01", "9:00 AM")).await;
        schedule_ok(&ledger, booking("2025-04-01", "10:00 AM")).await;
        ledger
            .update_status(&a, ConsultationStatus::Confirmed)
            .await
            .unwrap();

        let confirmed = ledger
            .filtered(Some(ConsultationStatus::Confirmed), None, None)
            .await;
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, a);

        let all = ledger.filtered(None, None, None).await;
        assert_eq!(all.len(), 2);
    }
}
