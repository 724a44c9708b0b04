//! In-memory backend seeded with a demo organization.
//!
//! Used for local runs (`BACKEND_MODE=fixture`) and by the handler tests. It
//! follows the same contract as the HTTP backend, including its failures:
//! unknown ids are `NotFound`, a foreign token is `Unauthorized`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{Backend, BackendError, BackendResult};
use crate::auth::session::Session;
use crate::model::attendance::{
    AttendanceData, AttendanceMark, AttendanceRecord, BulkAttendance, EcrRow, ProcessResponse,
};
use crate::model::organization::{OrgMembership, Organization, UserProfile};
use crate::model::project::{CreateProject, Project, ProjectStatus};
use crate::model::sheet::{CreateSheetUpstream, MonthKey, SheetMeta};
use crate::model::worker::{CreateWorker, Worker};
use crate::models::{SignInRequest, SignInResponse};
use crate::sheet::attendance::WorkerAttendanceRow;
use crate::sheet::payment::{PaymentLine, SkillRateTable};

pub const FIXTURE_TOKEN: &str = "fixture-token";
pub const FIXTURE_ORG: &str = "org-gs";
pub const FIXTURE_PROJECT: &str = "p-sgtps";
pub const FIXTURE_MONTH: &str = "2025-07";

/// Wage ceiling for pension (EPS) and insurance (EDLI) contributions.
const EPS_WAGE_CEILING: f64 = 15000.0;

type SheetMarks = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Default)]
struct FixtureState {
    organizations: Vec<Organization>,
    projects: Vec<Project>,
    workers: Vec<Worker>,
    sheets: Vec<SheetMeta>,
    /// sheet id -> worker id -> date -> mark
    marks: HashMap<String, SheetMarks>,
}

pub struct FixtureBackend {
    state: RwLock<FixtureState>,
    rates: SkillRateTable,
}

impl FixtureBackend {
    pub fn empty(rates: SkillRateTable) -> Self {
        FixtureBackend {
            state: RwLock::new(FixtureState::default()),
            rates,
        }
    }

    #[cfg(test)]
    pub fn seeded() -> Self {
        Self::seeded_with_rates(SkillRateTable::default())
    }

    /// Demo data: one organization, one project, eight workers (one of them
    /// inactive) and a July 2025 sheet running 24/07 to 23/08.
    pub fn seeded_with_rates(rates: SkillRateTable) -> Self {
        let backend = Self::empty(rates);
        {
            let mut state = backend.write();
            seed(&mut state);
            info!(
                workers = state.workers.len(),
                sheets = state.sheets.len(),
                "Fixture backend seeded"
            );
        }
        backend
    }

    fn read(&self) -> RwLockReadGuard<'_, FixtureState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FixtureState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn authorize(session: &Session) -> BackendResult<()> {
    if session.token == FIXTURE_TOKEN {
        Ok(())
    } else {
        Err(BackendError::Unauthorized)
    }
}

fn conflict(body: String) -> BackendError {
    BackendError::Status { status: 409, body }
}

fn record(worker_id: &str, marks: &BTreeMap<String, String>) -> AttendanceRecord {
    let count = |wanted: AttendanceMark| {
        marks
            .values()
            .filter(|m| AttendanceMark::parse(m) == Some(wanted))
            .count() as u32
    };
    AttendanceRecord {
        worker_id: worker_id.to_string(),
        attendance: marks.clone(),
        present_days: count(AttendanceMark::Present),
        absent_days: count(AttendanceMark::Absent),
    }
}

#[async_trait]
impl Backend for FixtureBackend {
    async fn sign_in(&self, credentials: &SignInRequest) -> BackendResult<SignInResponse> {
        if credentials.username_or_email.is_empty() || credentials.password.is_empty() {
            return Err(BackendError::Unauthorized);
        }
        Ok(SignInResponse {
            access_token: FIXTURE_TOKEN.to_string(),
            token_type: "Bearer".to_string(),
        })
    }

    async fn current_user(&self, session: &Session) -> BackendResult<UserProfile> {
        authorize(session)?;
        let state = self.read();
        Ok(UserProfile {
            id: "u-1".to_string(),
            username: "site.manager".to_string(),
            email: "site.manager@gsconstruction.in".to_string(),
            org_memberships: state
                .organizations
                .iter()
                .map(|o| OrgMembership {
                    org_id: o.id.clone(),
                    org_name: o.name.clone(),
                    roles: vec!["ADMIN".to_string()],
                    permissions: o.your_permissions.clone(),
                })
                .collect(),
        })
    }

    async fn organization(&self, session: &Session, org_id: &str) -> BackendResult<Organization> {
        authorize(session)?;
        self.read()
            .organizations
            .iter()
            .find(|o| o.id == org_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("Organization {org_id}")))
    }

    async fn list_projects(
        &self,
        session: &Session,
        org_id: &str,
        status: Option<ProjectStatus>,
    ) -> BackendResult<Vec<Project>> {
        authorize(session)?;
        Ok(self
            .read()
            .projects
            .iter()
            .filter(|p| p.org_id == org_id)
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect())
    }

    async fn project(&self, session: &Session, org_id: &str, project_id: &str) -> BackendResult<Project> {
        authorize(session)?;
        self.read()
            .projects
            .iter()
            .find(|p| p.org_id == org_id && p.id == project_id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("Project {project_id}")))
    }

    async fn create_project(
        &self,
        session: &Session,
        org_id: &str,
        project: &CreateProject,
    ) -> BackendResult<Project> {
        authorize(session)?;
        let mut state = self.write();
        let org_name = state
            .organizations
            .iter()
            .find(|o| o.id == org_id)
            .map(|o| o.name.clone())
            .ok_or_else(|| BackendError::NotFound(format!("Organization {org_id}")))?;

        let created = Project {
            id: Uuid::new_v4().to_string(),
            name: project.name.clone(),
            order_no: project.order_no.clone(),
            el1_no: project.el1_no.clone(),
            project_code: project.project_code.clone().unwrap_or_default(),
            starting_date: project.starting_date.clone(),
            tentative_ending_date: project.tentative_ending_date.clone(),
            status: ProjectStatus::Planning,
            org_id: org_id.to_string(),
            org_name,
            created_by: "u-1".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            team_members: project.initial_team_members.clone().unwrap_or_default(),
            task_count: 0,
        };
        state.projects.push(created.clone());
        Ok(created)
    }

    async fn list_workers(&self, session: &Session, org_id: &str) -> BackendResult<Vec<Worker>> {
        authorize(session)?;
        Ok(self
            .read()
            .workers
            .iter()
            .filter(|w| w.org_ids.iter().any(|o| o == org_id))
            .cloned()
            .collect())
    }

    async fn create_worker(&self, session: &Session, worker: &CreateWorker) -> BackendResult<Worker> {
        authorize(session)?;
        let mut state = self.write();
        if state.workers.iter().any(|w| w.uan_number == worker.uan_number) {
            return Err(conflict(format!("UAN {} already registered", worker.uan_number)));
        }

        let created = Worker {
            id: Uuid::new_v4().to_string(),
            name: worker.name.clone(),
            uan_number: worker.uan_number.clone(),
            contact_number: worker.contact_number.clone().unwrap_or_default(),
            bank_details: worker.bank_details.clone(),
            tender_ids: vec![],
            org_ids: worker.org_ids.clone(),
            tags: worker.tags.clone(),
            is_active: true,
        };
        state.workers.push(created.clone());
        Ok(created)
    }

    async fn list_sheets(&self, session: &Session, project_id: &str) -> BackendResult<Vec<SheetMeta>> {
        authorize(session)?;
        Ok(self
            .read()
            .sheets
            .iter()
            .filter(|s| s.tender_id == project_id)
            .cloned()
            .collect())
    }

    async fn create_sheet(&self, session: &Session, sheet: &CreateSheetUpstream) -> BackendResult<SheetMeta> {
        authorize(session)?;
        let mut state = self.write();
        if !state.projects.iter().any(|p| p.id == sheet.tender_id) {
            return Err(BackendError::NotFound(format!("Project {}", sheet.tender_id)));
        }
        if state
            .sheets
            .iter()
            .any(|s| s.tender_id == sheet.tender_id && s.month_year == sheet.month_year)
        {
            return Err(conflict(format!(
                "Sheet for {} already exists",
                sheet.month_year
            )));
        }

        let created = SheetMeta {
            id: Uuid::new_v4().to_string(),
            tender_id: sheet.tender_id.clone(),
            month_year: sheet.month_year,
            start_date: Some(sheet.start_date.clone()),
            end_date: Some(sheet.end_date.clone()),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        state.marks.insert(created.id.clone(), SheetMarks::new());
        state.sheets.push(created.clone());
        Ok(created)
    }

    async fn attendance(
        &self,
        session: &Session,
        project_id: &str,
        month: MonthKey,
    ) -> BackendResult<AttendanceData> {
        authorize(session)?;
        let state = self.read();
        let sheet = state
            .sheets
            .iter()
            .find(|s| s.tender_id == project_id && s.month_year == month)
            .ok_or_else(|| BackendError::NotFound(format!("Attendance for {project_id} in {month}")))?;

        let attendances = state
            .marks
            .get(&sheet.id)
            .map(|by_worker| {
                by_worker
                    .iter()
                    .map(|(worker_id, marks)| record(worker_id, marks))
                    .collect()
            })
            .unwrap_or_default();

        Ok(AttendanceData {
            sheet_id: Some(sheet.id.clone()),
            attendances,
        })
    }

    async fn save_attendance(
        &self,
        session: &Session,
        sheet_id: &str,
        bulk: &BulkAttendance,
    ) -> BackendResult<()> {
        authorize(session)?;
        let mut state = self.write();
        if !state
            .sheets
            .iter()
            .any(|s| s.id == sheet_id && s.tender_id == bulk.tender_id)
        {
            return Err(BackendError::NotFound(format!("Sheet {sheet_id}")));
        }

        let saved: SheetMarks = bulk
            .attendances
            .iter()
            .map(|(worker_id, days)| {
                let days = days
                    .iter()
                    .map(|(date, mark)| (date.clone(), mark.as_char().to_string()))
                    .collect();
                (worker_id.clone(), days)
            })
            .collect();
        state.marks.insert(sheet_id.to_string(), saved);
        Ok(())
    }

    async fn remove_sheet_worker(&self, session: &Session, sheet_id: &str, worker_id: &str) -> BackendResult<()> {
        authorize(session)?;
        self.write()
            .marks
            .get_mut(sheet_id)
            .and_then(|by_worker| by_worker.remove(worker_id))
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(format!("Worker {worker_id} on sheet {sheet_id}")))
    }

    async fn change_sheet_worker(
        &self,
        session: &Session,
        sheet_id: &str,
        worker_id: &str,
        new_worker_id: &str,
    ) -> BackendResult<()> {
        authorize(session)?;
        let mut state = self.write();
        if !state.workers.iter().any(|w| w.id == new_worker_id) {
            return Err(BackendError::NotFound(format!("Worker {new_worker_id}")));
        }
        let by_worker = state
            .marks
            .get_mut(sheet_id)
            .ok_or_else(|| BackendError::NotFound(format!("Sheet {sheet_id}")))?;
        if by_worker.contains_key(new_worker_id) {
            return Err(conflict(format!("Worker {new_worker_id} is already on the sheet")));
        }
        let marks = by_worker
            .remove(worker_id)
            .ok_or_else(|| BackendError::NotFound(format!("Worker {worker_id} on sheet {sheet_id}")))?;
        by_worker.insert(new_worker_id.to_string(), marks);
        Ok(())
    }

    async fn process_payment(
        &self,
        session: &Session,
        event_name: &str,
        sheet_id: &str,
    ) -> BackendResult<ProcessResponse> {
        authorize(session)?;
        let state = self.read();
        let sheet = state
            .sheets
            .iter()
            .find(|s| s.id == sheet_id)
            .ok_or_else(|| BackendError::NotFound(format!("Sheet {sheet_id}")))?;
        let range = sheet
            .date_range()
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        let mut processed = Vec::new();
        let mut missing = Vec::new();
        for (worker_id, marks) in state.marks.get(sheet_id).into_iter().flatten() {
            let worker = state.workers.iter().find(|w| &w.id == worker_id);
            let Some(worker) = worker.filter(|w| !w.uan_number.is_empty()) else {
                missing.push(serde_json::json!({ "workerId": worker_id }));
                continue;
            };

            let row = WorkerAttendanceRow::from_record(&range, &record(worker_id, marks), Some(worker));
            let line = PaymentLine::derive(processed.len() + 1, &row, &self.rates);
            let gross = line.gross() as f64;
            let eps_wages = gross.min(EPS_WAGE_CEILING);
            let eps = (eps_wages * 0.0833).round();
            let epf = line.epf() as f64;

            processed.push(EcrRow {
                uan: worker.uan_number.clone(),
                member_name: worker.name.clone(),
                gross_wages: gross,
                epf_wages: gross,
                eps_wages,
                edli_wages: eps_wages,
                epf_contribution_remitted: epf,
                eps_contribution_remitted: eps,
                epf_and_eps_diff_remitted: epf - eps,
                ncp_days: line.ncp_days(),
                refund_of_advances: 0.0,
            });
        }

        let txt_data = processed
            .iter()
            .map(|r| {
                [
                    r.uan.clone(),
                    r.member_name.clone(),
                    r.gross_wages.to_string(),
                    r.epf_wages.to_string(),
                    r.eps_wages.to_string(),
                    r.edli_wages.to_string(),
                    r.epf_contribution_remitted.to_string(),
                    r.eps_contribution_remitted.to_string(),
                    r.epf_and_eps_diff_remitted.to_string(),
                    r.ncp_days.to_string(),
                    r.refund_of_advances.to_string(),
                ]
                .join("#~#")
            })
            .collect::<Vec<_>>()
            .join("\n");

        info!(event_name, sheet_id, processed = processed.len(), missing = missing.len(), "Fixture payment processed");

        Ok(ProcessResponse {
            success: missing.is_empty(),
            processed,
            missing,
            txt_data,
        })
    }
}

const SEED_WORKERS: [(&str, &str, &str, &[&str], &str, bool); 8] = [
    ("w-1001", "RAJENDRA VISHWAKARMA", "101400220031", &["Supervisor"], "POPPPPPPOPPPPPPOPPPPPPOPPPPPAOP", true),
    ("w-1002", "RAMDAS TANDIA", "101400220032", &["high-skilled"], "PPOPPPAAPOPPPPAPOPPAPPPOPPPPPPO", true),
    ("w-1003", "SUNNY SURYAVANSHI", "101400220033", &["High-Skilled", "crane"], "APPOAAPPPPOAAAPPPOAPAAPPOAAAPPP", true),
    ("w-1004", "UMESH KUMAR RAJAK", "101400220034", &["Operator"], "PPPOPPPPPPOPPPPPPOPPPPPPOPPPPPP", true),
    ("w-1005", "GULZAR SINGH", "101400220035", &["skilled"], "PPPPOPPPPPPOPPPPPPOPPPPPPOPPPPP", true),
    ("w-1006", "MAN SINGH", "101400220036", &["Senior", "operator"], "PPPPPOPPPPPPOPPPPPPOPPPPPPOPPPP", true),
    ("w-1007", "RAMESH PATEL", "101400220037", &["helper"], "", true),
    ("w-1008", "SURESH BARMAN", "101400220039", &["helper"], "", false),
];

fn seed(state: &mut FixtureState) {
    state.organizations.push(Organization {
        id: FIXTURE_ORG.to_string(),
        name: "M/S G.S. CONSTRUCTION".to_string(),
        description: "CAMP-BIRSINGHPUR".to_string(),
        created_at: "2024-10-22T00:00:00Z".to_string(),
        created_by: "u-1".to_string(),
        available_roles: vec!["ADMIN".to_string(), "SUPERVISOR".to_string()],
        your_permissions: vec!["ATTENDANCE_WRITE".to_string(), "PAYMENT_WRITE".to_string()],
    });

    state.projects.push(Project {
        id: FIXTURE_PROJECT.to_string(),
        name: "Fire tender and crane operation, SGTPS Birsinghpur".to_string(),
        order_no: "511-0100/SGTPS/P&W/ENIT-10/2024/W.O.-149/3401".to_string(),
        el1_no: "LoA 3189 Dtd. 22/10/2024".to_string(),
        project_code: "SGTPS-FT".to_string(),
        starting_date: "2024-11-07".to_string(),
        tentative_ending_date: "2025-11-06".to_string(),
        status: ProjectStatus::InProgress,
        org_id: FIXTURE_ORG.to_string(),
        org_name: "M/S G.S. CONSTRUCTION".to_string(),
        created_by: "u-1".to_string(),
        created_at: "2024-11-07T00:00:00Z".to_string(),
        team_members: vec!["u-1".to_string()],
        task_count: 0,
    });

    let sheet_id = format!("sheet-{FIXTURE_MONTH}");
    let start = chrono::NaiveDate::from_ymd_opt(2025, 7, 24).unwrap_or_default();
    let mut sheet_marks = SheetMarks::new();

    for (id, name, uan, tags, marks, is_active) in SEED_WORKERS {
        state.workers.push(Worker {
            id: id.to_string(),
            name: name.to_string(),
            uan_number: uan.to_string(),
            contact_number: format!("94250{}", &uan[uan.len() - 5..]),
            bank_details: None,
            tender_ids: vec![FIXTURE_PROJECT.to_string()],
            org_ids: vec![FIXTURE_ORG.to_string()],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_active,
        });

        if marks.is_empty() {
            continue;
        }
        let days = start
            .iter_days()
            .zip(marks.chars())
            .map(|(date, mark)| (date.format("%Y-%m-%d").to_string(), mark.to_string()))
            .collect();
        sheet_marks.insert(id.to_string(), days);
    }

    state.marks.insert(sheet_id.clone(), sheet_marks);
    state.sheets.push(SheetMeta {
        id: sheet_id,
        tender_id: FIXTURE_PROJECT.to_string(),
        month_year: MonthKey::from(start),
        start_date: Some("24/07/2025".to_string()),
        end_date: Some("2025-08-23".to_string()),
        created_at: Some("2025-07-24T00:00:00Z".to_string()),
    });
}
