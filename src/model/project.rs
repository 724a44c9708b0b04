use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ProjectStatus {
    Planning,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[schema(example = "p-sgtps")]
    pub id: String,
    #[schema(example = "SGTPS Fire Tender Operation")]
    pub name: String,
    #[serde(default)]
    pub order_no: String,
    #[serde(default)]
    pub el1_no: String,
    #[serde(default)]
    pub project_code: String,
    #[serde(default)]
    pub starting_date: String,
    #[serde(default)]
    pub tentative_ending_date: String,
    pub status: ProjectStatus,
    pub org_id: String,
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub team_members: Vec<String>,
    #[serde(default)]
    pub task_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: String,
    pub order_no: String,
    pub el1_no: String,
    pub project_code: Option<String>,
    #[schema(example = "2024-11-07")]
    pub starting_date: String,
    #[schema(example = "2025-11-06")]
    pub tentative_ending_date: String,
    pub initial_team_members: Option<Vec<String>>,
}
