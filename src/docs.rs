use crate::api::attendance::{
    AttendanceSheetView, MarkEdit, MarkEditResponse, ReplaceSheetWorker, SheetWorker,
};
use crate::api::organization::{Dashboard, DashboardCounts};
use crate::api::payroll::{OtherPaymentEdit, OtherPaymentResponse, PaymentSheetView, ProcessPayment};
use crate::api::project::ProjectQuery;
use crate::api::worker::{WorkerListResponse, WorkerQuery};
use crate::model::attendance::{AttendanceMark, EcrRow, ProcessResponse};
use crate::model::designation::Designation;
use crate::model::organization::{OrgMembership, Organization, UserProfile};
use crate::model::project::{CreateProject, Project, ProjectStatus};
use crate::model::sheet::{CreateSheet, SheetMeta};
use crate::model::worker::{BankDetails, CreateWorker, Worker};
use crate::models::{LoginReqDto, LoginResponse};
use crate::sheet::attendance::{SheetTotals, WorkerAttendanceRow};
use crate::sheet::date_range::DayColumn;
use crate::sheet::payment::{PaymentLine, PaymentTotals, SkillRateTable, SkillSummary};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Site Attendance & Payroll API",
        version = "1.0.0",
        description = r#"
## Site Attendance & Payroll

Attendance sheets and monthly payment sheets for construction crews, on top
of the workforce backend.

### Key Features
- **Attendance sheets**
  - Load a month's sheet, edit P/A/O cells, add, change or remove workers, save in bulk
- **Payment sheets**
  - Wages by skill rate, 12% EPF deduction, other payments, ECR processing
- **Directory**
  - Organization dashboard, projects and workers

### Security
Every `/api` endpoint needs the backend's **Bearer token**. Organization
scoped endpoints also need the `X-Org-Id` header.

### Drafts
Loading a sheet opens a draft for the calling session. Edits change the
draft only; attendance reaches the backend on save.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::organization::get_organization,
        crate::api::organization::dashboard,

        crate::api::project::list_projects,
        crate::api::project::create_project,
        crate::api::project::get_project,

        crate::api::worker::list_workers,
        crate::api::worker::create_worker,

        crate::api::attendance::list_sheets,
        crate::api::attendance::create_sheet,
        crate::api::attendance::load_sheet,
        crate::api::attendance::edit_mark,
        crate::api::attendance::add_worker,
        crate::api::attendance::remove_worker,
        crate::api::attendance::change_worker,
        crate::api::attendance::save_sheet,

        crate::api::payroll::load_payments,
        crate::api::payroll::set_other_payment,
        crate::api::payroll::process_payment
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            UserProfile,
            OrgMembership,
            Organization,
            Dashboard,
            DashboardCounts,
            Project,
            ProjectStatus,
            CreateProject,
            ProjectQuery,
            Worker,
            BankDetails,
            CreateWorker,
            WorkerQuery,
            WorkerListResponse,
            Designation,
            AttendanceMark,
            SheetMeta,
            CreateSheet,
            DayColumn,
            WorkerAttendanceRow,
            SheetTotals,
            AttendanceSheetView,
            MarkEdit,
            MarkEditResponse,
            SheetWorker,
            ReplaceSheetWorker,
            SkillRateTable,
            PaymentLine,
            PaymentTotals,
            SkillSummary,
            PaymentSheetView,
            OtherPaymentEdit,
            OtherPaymentResponse,
            ProcessPayment,
            ProcessResponse,
            EcrRow
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign in and session APIs"),
        (name = "Organization", description = "Organization and dashboard APIs"),
        (name = "Project", description = "Project (tender) APIs"),
        (name = "Worker", description = "Worker directory APIs"),
        (name = "Attendance", description = "Attendance sheet APIs"),
        (name = "Payroll", description = "Payment sheet APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("Bearer")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_sheet_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/projects/{project_id}/sheets/{month}/marks"));
        assert!(paths.contains_key("/api/projects/{project_id}/payments/{month}/other-payment"));
        assert!(paths.contains_key("/auth/login"));
    }
}
