use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::designation::Designation;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub account_number: String,
    pub ifsc_code: String,
    pub bank_name: String,
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "w-1004",
    "name": "UMESH KUMAR RAJAK",
    "uanNumber": "101400220034",
    "contactNumber": "9425000004",
    "tenderIds": ["p-sgtps"],
    "orgIds": ["org-gs"],
    "tags": ["operator"],
    "isActive": true
}))]
pub struct Worker {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub uan_number: String,
    #[serde(default)]
    pub contact_number: String,
    pub bank_details: Option<BankDetails>,
    #[serde(default)]
    pub tender_ids: Vec<String>,
    #[serde(default)]
    pub org_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_active: bool,
}

impl Worker {
    pub fn designation(&self) -> Designation {
        Designation::from_tags(&self.tags)
    }

    /// Case-insensitive match of `term` against name, UAN, contact number and tags.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&term)
            || self.uan_number.to_lowercase().contains(&term)
            || self.contact_number.to_lowercase().contains(&term)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorker {
    #[schema(example = "GULZAR SINGH")]
    pub name: String,
    #[schema(example = "101400220035")]
    pub uan_number: String,
    pub contact_number: Option<String>,
    pub bank_details: Option<BankDetails>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub org_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(name: &str, tags: &[&str]) -> Worker {
        Worker {
            id: "w-1".into(),
            name: name.into(),
            uan_number: "101400220035".into(),
            contact_number: "9425000005".into(),
            bank_details: None,
            tender_ids: vec![],
            org_ids: vec![],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_active: true,
        }
    }

    #[test]
    fn search_covers_name_uan_contact_and_tags() {
        let w = worker("Gulzar Singh", &["Operator"]);
        assert!(w.matches("gulzar"));
        assert!(w.matches("0220035"));
        assert!(w.matches("94250"));
        assert!(w.matches("OPER"));
        assert!(w.matches("  "));
        assert!(!w.matches("crane"));
    }

    #[test]
    fn designation_comes_from_tags() {
        assert_eq!(worker("a", &["Operator"]).designation(), Designation::Skilled);
        assert_eq!(worker("b", &[]).designation(), Designation::Unskilled);
    }
}
