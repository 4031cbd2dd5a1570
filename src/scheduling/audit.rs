//! Append-only audit trail for scheduling actions, plus the team roster.
//!
//! Every scheduling action becomes one audit entry; entries are never
//! rewritten. Team notifications fan out from here and are strictly
//! best-effort.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::config::settings::ContactInfo;
use crate::core::errors::ApiError;

use super::ledger::{ConsultationRequest, ConsultationStatus};
use super::notify::Notifier;
use super::{load_json_or_default, parse_range_bound, write_json};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    pub consultation_id: String,
    pub user_name: String,
    pub user_email: String,
    #[serde(default)]
    pub user_phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub preferred_date: String,
    #[serde(default)]
    pub preferred_time: String,
    #[serde(default)]
    pub message: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
}

/// Everything the ledger knows about an action when it records it.
#[derive(Debug, Clone, Default)]
pub struct AuditEvent {
    pub action: String,
    pub consultation_id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub company: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub message: String,
    pub status: String,
    pub ip_address: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultationStats {
    pub total_requests: usize,
    pub pending_requests: usize,
    pub confirmed_requests: usize,
    pub completed_requests: usize,
    pub cancelled_requests: usize,
    pub recent_requests_7_days: usize,
    pub team_members_count: usize,
}

pub struct AuditLog {
    log_path: PathBuf,
    team_path: PathBuf,
    logs: Mutex<Vec<AuditEntry>>,
    team: Mutex<Vec<TeamMember>>,
    notifier: Arc<dyn Notifier>,
    contact: ContactInfo,
}

impl AuditLog {
    /// Open both files, tolerating absent or corrupt state (availability
    /// over durability for the audit trail). An empty roster is seeded with
    /// the default recipients so notifications have somewhere to go.
    pub fn open(
        log_path: PathBuf,
        team_path: PathBuf,
        notifier: Arc<dyn Notifier>,
        contact: ContactInfo,
    ) -> Self {
        let logs: Vec<AuditEntry> = load_json_or_default(&log_path);
        let mut team: Vec<TeamMember> = load_json_or_default(&team_path);

        if team.is_empty() {
            team = default_team(&contact);
            if let Err(err) = write_json(&team_path, &team) {
                tracing::warn!("failed to persist default team roster: {}", err);
            }
        }

        Self {
            log_path,
            team_path,
            logs: Mutex::new(logs),
            team: Mutex::new(team),
            notifier,
            contact,
        }
    }

    /// Append one entry and fan out notifications. Returns the log id.
    /// Notification failures are logged and swallowed.
    pub async fn record(&self, event: AuditEvent) -> Result<String, ApiError> {
        let now = Utc::now();
        let entry = AuditEntry {
            id: format!(
                "log_{}_{}",
                now.format("%Y%m%d_%H%M%S"),
                event.consultation_id
            ),
            action: event.action,
            consultation_id: event.consultation_id,
            user_name: event.user_name,
            user_email: event.user_email,
            user_phone: event.user_phone,
            company: event.company,
            preferred_date: event.preferred_date,
            preferred_time: event.preferred_time,
            message: event.message,
            status: event.status,
            timestamp: now,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
        };

        {
            let mut logs = self.logs.lock().await;
            logs.push(entry.clone());
            write_json(&self.log_path, &*logs)?;
        }

        tracing::info!(
            "consultation {}: {} - {} ({})",
            entry.action,
            entry.consultation_id,
            entry.user_name,
            entry.user_email
        );

        self.send_notifications(&entry).await;

        Ok(entry.id)
    }

    async fn send_notifications(&self, entry: &AuditEntry) {
        let (subject, body) = match entry.action.as_str() {
            "scheduled" => new_consultation_message(entry, &self.contact),
            _ if entry.status == "confirmed" || entry.status == "cancelled" => {
                status_update_message(entry)
            }
            _ => return,
        };

        let team = self.team.lock().await.clone();
        for member in team {
            if let Err(err) = self.notifier.notify(&member.email, &subject, &body).await {
                tracing::warn!("notification to {} failed: {}", member.email, err);
            }
        }
    }

    /// Entries from the trailing time window, newest first.
    pub async fn recent(&self, hours: i64) -> Vec<AuditEntry> {
        let cutoff = Utc::now() - Duration::hours(hours.max(0));
        let logs = self.logs.lock().await;
        let mut recent: Vec<AuditEntry> = logs
            .iter()
            .filter(|entry| entry.timestamp >= cutoff)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent
    }

    pub async fn by_status(&self, status: &str) -> Vec<AuditEntry> {
        let logs = self.logs.lock().await;
        let mut matching: Vec<AuditEntry> = logs
            .iter()
            .filter(|entry| entry.status == status)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching
    }

    pub async fn by_date_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<AuditEntry>, ApiError> {
        let start = parse_range_bound(start, false)?;
        let end = parse_range_bound(end, true)?;

        let logs = self.logs.lock().await;
        let mut matching: Vec<AuditEntry> = logs
            .iter()
            .filter(|entry| entry.timestamp >= start && entry.timestamp <= end)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matching)
    }

    pub async fn clear_all(&self) -> Result<usize, ApiError> {
        let mut logs = self.logs.lock().await;
        let removed = logs.len();
        logs.clear();
        write_json(&self.log_path, &*logs)?;
        tracing::info!("audit log cleared, {} entries removed", removed);
        Ok(removed)
    }

    pub async fn team_members(&self) -> Vec<TeamMember> {
        self.team.lock().await.clone()
    }

    /// Insert or update a roster entry; email is the key.
    pub async fn add_team_member(&self, member: TeamMember) -> Result<(), ApiError> {
        let mut team = self.team.lock().await;
        if let Some(existing) = team.iter_mut().find(|m| m.email == member.email) {
            *existing = member;
        } else {
            team.push(member);
        }
        write_json(&self.team_path, &*team)
    }

    /// Remove by email. An absent email leaves the roster untouched and
    /// returns false.
    pub async fn remove_team_member(&self, email: &str) -> Result<bool, ApiError> {
        let mut team = self.team.lock().await;
        let before = team.len();
        team.retain(|member| member.email != email);
        if team.len() == before {
            return Ok(false);
        }
        write_json(&self.team_path, &*team)?;
        Ok(true)
    }

    /// Aggregate statistics over the *requests* ledger, not the audit trail.
    pub async fn stats(&self, requests: &[ConsultationRequest]) -> ConsultationStats {
        let cutoff = Utc::now() - Duration::days(7);
        let count_status = |status: ConsultationStatus| {
            requests.iter().filter(|r| r.status == status).count()
        };

        ConsultationStats {
            total_requests: requests.len(),
            pending_requests: count_status(ConsultationStatus::Pending),
            confirmed_requests: count_status(ConsultationStatus::Confirmed),
            completed_requests: count_status(ConsultationStatus::Completed),
            cancelled_requests: count_status(ConsultationStatus::Cancelled),
            recent_requests_7_days: requests.iter().filter(|r| r.created_at >= cutoff).count(),
            team_members_count: self.team.lock().await.len(),
        }
    }
}

fn default_team(contact: &ContactInfo) -> Vec<TeamMember> {
    vec![
        TeamMember {
            name: "Sales Team".to_string(),
            email: contact.email.clone(),
            role: "Sales Representative".to_string(),
            phone: contact.phone.clone(),
        },
        TeamMember {
            name: "Project Manager".to_string(),
            email: contact.email.clone(),
            role: "Project Manager".to_string(),
            phone: contact.phone.clone(),
        },
    ]
}

fn new_consultation_message(entry: &AuditEntry, contact: &ContactInfo) -> (String, String) {
    let subject = format!("New Consultation Request - {}", entry.user_name);
    let body = format!(
        "New consultation request received:\n\n\
Consultation ID: {}\n\
Name: {}\n\
Email: {}\n\
Phone: {}\n\
Company: {}\n\
Preferred Date: {}\n\
Preferred Time: {}\n\
Message: {}\n\
Status: {}\n\
Timestamp: {}\n\n\
Please contact this prospect within 24 hours to confirm their appointment.\n\n\
Contact Information:\n\
- Phone: {}\n\
- Email: {}\n\n\
This is an automated notification from the consultation scheduling system.",
        entry.consultation_id,
        entry.user_name,
        entry.user_email,
        entry.user_phone,
        entry.company,
        entry.preferred_date,
        entry.preferred_time,
        entry.message,
        entry.status,
        entry.timestamp.to_rfc3339(),
        contact.phone,
        contact.email,
    );
    (subject, body)
}

fn status_update_message(entry: &AuditEntry) -> (String, String) {
    let subject = format!("Consultation Status Update - {}", entry.consultation_id);
    let body = format!(
        "Consultation status updated:\n\n\
Consultation ID: {}\n\
Name: {}\n\
Email: {}\n\
New Status: {}\n\
Action: {}\n\
Timestamp: {}\n\n\
Please follow up as needed.\n\n\
This is an automated notification from the consultation scheduling system.",
        entry.consultation_id,
        entry.user_name,
        entry.user_email,
        entry.status,
        entry.action,
        entry.timestamp.to_rfc3339(),
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::notify::NullNotifier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingNotifier {
        sent: AtomicUsize,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), ApiError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ApiError::ServiceUnavailable("transport down".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn audit_with(dir: &TempDir, notifier: Arc<dyn Notifier>) -> AuditLog {
        AuditLog::open(
            dir.path().join("logs.json"),
            dir.path().join("team.json"),
            notifier,
            ContactInfo::default(),
        )
    }

    fn scheduled_event(id: &str) -> AuditEvent {
        AuditEvent {
            action: "scheduled".to_string(),
            consultation_id: id.to_string(),
            user_name: "Sam".to_string(),
            user_email: "sam@acme.com".to_string(),
            status: "pending".to_string(),
            ..AuditEvent::default()
        }
    }

    #[tokio::test]
    async fn records_and_filters_entries() {
        let dir = TempDir::new().unwrap();
        let audit = audit_with(&dir, Arc::new(NullNotifier));

        let log_id = audit.record(scheduled_event("abc12345")).await.unwrap();
        assert!(log_id.starts_with("log_"));
        assert!(log_id.ends_with("abc12345"));

        assert_eq!(audit.recent(24).await.len(), 1);
        assert_eq!(audit.by_status("pending").await.len(), 1);
        assert!(audit.by_status("confirmed").await.is_empty());
        // Entries older than the window are excluded.
        assert!(audit.recent(0).await.len() <= 1);
    }

    #[tokio::test]
    async fn date_range_rejects_garbage_and_accepts_bare_dates() {
        let dir = TempDir::new().unwrap();
        let audit = audit_with(&dir, Arc::new(NullNotifier));
        audit.record(scheduled_event("abc12345")).await.unwrap();

        assert!(audit.by_date_range("not-a-date", "2030-01-01").await.is_err());

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let hits = audit.by_date_range(&today, &today).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_recording() {
        let dir = TempDir::new().unwrap();
        let counting = Arc::new(CountingNotifier {
            sent: AtomicUsize::new(0),
            fail: true,
        });
        let audit = audit_with(&dir, counting.clone());

        audit.record(scheduled_event("abc12345")).await.unwrap();
        // Default roster has two members; both were attempted.
        assert_eq!(counting.sent.load(Ordering::SeqCst), 2);
        assert_eq!(audit.recent(24).await.len(), 1);
    }

    #[tokio::test]
    async fn roster_removal_semantics() {
        let dir = TempDir::new().unwrap();
        let audit = audit_with(&dir, Arc::new(NullNotifier));

        let baseline = audit.team_members().await.len();
        assert_eq!(baseline, 2);

        audit
            .add_team_member(TeamMember {
                name: "Casey".to_string(),
                email: "casey@meridianlabs.ai".to_string(),
                role: "Engineer".to_string(),
                phone: String::new(),
            })
            .await
            .unwrap();
        assert_eq!(audit.team_members().await.len(), baseline + 1);

        // Unknown email: no mutation, success=false.
        assert!(!audit.remove_team_member("nobody@nowhere.io").await.unwrap());
        assert_eq!(audit.team_members().await.len(), baseline + 1);

        // Present email: exactly one entry gone, and the change persists.
        assert!(audit
            .remove_team_member("casey@meridianlabs.ai")
            .await
            .unwrap());
        assert_eq!(audit.team_members().await.len(), baseline);

        let reopened = audit_with(&dir, Arc::new(NullNotifier));
        assert_eq!(reopened.team_members().await.len(), baseline);
    }

    #[tokio::test]
    async fn clear_all_reports_removed_count() {
        let dir = TempDir::new().unwrap();
        let audit = audit_with(&dir, Arc::new(NullNotifier));
        audit.record(scheduled_event("a1")).await.unwrap();
        audit.record(scheduled_event("a2")).await.unwrap();

        assert_eq!(audit.clear_all().await.unwrap(), 2);
        assert!(audit.recent(24).await.is_empty());
    }
}
