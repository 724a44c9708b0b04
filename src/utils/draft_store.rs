//! In-memory view state of sheets opened by a session.
//!
//! A draft lives from the moment a sheet is loaded until it is reloaded,
//! its TTL runs out or the session logs out. Nothing here is persisted;
//! edits reach the backend only through an explicit save.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::config::Config;
use crate::model::project::Project;
use crate::model::sheet::{MonthKey, SheetMeta};
use crate::sheet::attendance::WorkerAttendanceRow;
use crate::sheet::date_range::DateRange;
use crate::sheet::payment::PaymentLine;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub session: String,
    pub project_id: String,
    pub month: MonthKey,
}

impl DraftKey {
    pub fn new(session: &str, project_id: &str, month: MonthKey) -> Self {
        DraftKey {
            session: session.to_string(),
            project_id: project_id.to_string(),
            month,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttendanceDraft {
    pub sheet: SheetMeta,
    pub range: DateRange,
    pub rows: Vec<WorkerAttendanceRow>,
    /// Workers added in this session and not yet saved to the backend.
    pub unsaved: HashSet<String>,
}

impl AttendanceDraft {
    pub fn new(sheet: SheetMeta, range: DateRange, rows: Vec<WorkerAttendanceRow>) -> Self {
        AttendanceDraft {
            sheet,
            range,
            rows,
            unsaved: HashSet::new(),
        }
    }

    pub fn row_mut(&mut self, worker_id: &str) -> Option<&mut WorkerAttendanceRow> {
        self.rows.iter_mut().find(|r| r.worker_id() == worker_id)
    }

    pub fn contains(&self, worker_id: &str) -> bool {
        self.rows.iter().any(|r| r.worker_id() == worker_id)
    }
}

#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub sheet: SheetMeta,
    pub project: Project,
    pub lines: Vec<PaymentLine>,
}

impl PaymentDraft {
    pub fn line_mut(&mut self, worker_id: &str) -> Option<&mut PaymentLine> {
        self.lines.iter_mut().find(|l| l.worker_id() == worker_id)
    }
}

pub type Shared<T> = Arc<Mutex<T>>;

/// Lock a draft. A poisoned lock still holds a consistent draft because
/// every mutation recomputes its derived fields before returning.
pub fn lock<T>(draft: &Shared<T>) -> MutexGuard<'_, T> {
    draft.lock().unwrap_or_else(PoisonError::into_inner)
}

fn draft_cache<V>(config: &Config) -> Cache<DraftKey, V>
where
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .max_capacity(config.draft_capacity)
        .time_to_idle(Duration::from_secs(config.draft_ttl_secs))
        .build()
}

pub struct DraftStore {
    attendance: Cache<DraftKey, Shared<AttendanceDraft>>,
    payments: Cache<DraftKey, Shared<PaymentDraft>>,
}

impl DraftStore {
    pub fn new(config: &Config) -> Self {
        DraftStore {
            attendance: draft_cache(config),
            payments: draft_cache(config),
        }
    }

    /// Replace whatever this session had open for the sheet.
    pub async fn open_attendance(&self, key: DraftKey, draft: AttendanceDraft) -> Shared<AttendanceDraft> {
        let shared = Arc::new(Mutex::new(draft));
        self.attendance.insert(key, shared.clone()).await;
        shared
    }

    pub async fn attendance(&self, key: &DraftKey) -> Option<Shared<AttendanceDraft>> {
        self.attendance.get(key).await
    }

    pub async fn open_payments(&self, key: DraftKey, draft: PaymentDraft) -> Shared<PaymentDraft> {
        let shared = Arc::new(Mutex::new(draft));
        self.payments.insert(key, shared.clone()).await;
        shared
    }

    pub async fn payments(&self, key: &DraftKey) -> Option<Shared<PaymentDraft>> {
        self.payments.get(key).await
    }

    /// Forget every draft opened with `token`.
    pub async fn discard_session(&self, token: &str) {
        let attendance_keys: Vec<_> = self
            .attendance
            .iter()
            .filter(|(k, _)| k.session == token)
            .map(|(k, _)| k)
            .collect();
        let payment_keys: Vec<_> = self
            .payments
            .iter()
            .filter(|(k, _)| k.session == token)
            .map(|(k, _)| k)
            .collect();

        let discarded = attendance_keys.len() + payment_keys.len();

        let futures: Vec<_> = attendance_keys
            .iter()
            .map(|k| self.attendance.invalidate(k.as_ref()))
            .collect();
        futures::future::join_all(futures).await;

        let futures: Vec<_> = payment_keys
            .iter()
            .map(|k| self.payments.invalidate(k.as_ref()))
            .collect();
        futures::future::join_all(futures).await;

        debug!(discarded, "Session drafts discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceMark;
    use crate::model::designation::Designation;
    use chrono::NaiveDate;

    fn draft() -> AttendanceDraft {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        AttendanceDraft::new(
            SheetMeta {
                id: "s-1".into(),
                tender_id: "p-1".into(),
                month_year: "2025-07".parse().unwrap(),
                start_date: None,
                end_date: None,
                created_at: None,
            },
            DateRange::new(start, start),
            vec![WorkerAttendanceRow::new(
                "w-1",
                "GULZAR SINGH",
                Designation::Skilled,
                vec![AttendanceMark::Off],
            )],
        )
    }

    #[actix_web::test]
    async fn drafts_are_scoped_by_session() {
        let store = DraftStore::new(&Config::for_tests());
        let month: MonthKey = "2025-07".parse().unwrap();
        let mine = DraftKey::new("token-a", "p-1", month);
        let theirs = DraftKey::new("token-b", "p-1", month);

        store.open_attendance(mine.clone(), draft()).await;

        assert!(store.attendance(&mine).await.is_some());
        assert!(store.attendance(&theirs).await.is_none());
    }

    #[actix_web::test]
    async fn edits_are_visible_through_the_store() {
        let store = DraftStore::new(&Config::for_tests());
        let key = DraftKey::new("token-a", "p-1", "2025-07".parse().unwrap());
        store.open_attendance(key.clone(), draft()).await;

        {
            let shared = store.attendance(&key).await.unwrap();
            let mut d = lock(&shared);
            d.row_mut("w-1").unwrap().edit(0, "P").unwrap();
        }

        let shared = store.attendance(&key).await.unwrap();
        assert_eq!(lock(&shared).rows[0].present_count(), 1);
    }

    #[actix_web::test]
    async fn reopening_replaces_the_draft() {
        let store = DraftStore::new(&Config::for_tests());
        let key = DraftKey::new("token-a", "p-1", "2025-07".parse().unwrap());
        let first = store.open_attendance(key.clone(), draft()).await;
        lock(&first).rows[0].edit(0, "P").unwrap();

        store.open_attendance(key.clone(), draft()).await;

        let shared = store.attendance(&key).await.unwrap();
        assert_eq!(lock(&shared).rows[0].present_count(), 0);
    }

    #[actix_web::test]
    async fn logout_discards_only_that_session() {
        let store = DraftStore::new(&Config::for_tests());
        let month: MonthKey = "2025-07".parse().unwrap();
        let mine = DraftKey::new("token-a", "p-1", month);
        let theirs = DraftKey::new("token-b", "p-1", month);
        store.open_attendance(mine.clone(), draft()).await;
        store.open_attendance(theirs.clone(), draft()).await;

        store.discard_session("token-a").await;

        assert!(store.attendance(&mine).await.is_none());
        assert!(store.attendance(&theirs).await.is_some());
    }
}
