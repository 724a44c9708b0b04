use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Skill bucket used both as the attendance sheet's designation label and as
/// the key into the day-rate table.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
    EnumIter,
)]
pub enum Designation {
    #[serde(rename = "High Skilled")]
    #[strum(serialize = "High Skilled")]
    HighSkilled,
    #[serde(rename = "Skilled")]
    #[strum(serialize = "Skilled")]
    Skilled,
    #[serde(rename = "Unskilled")]
    #[strum(serialize = "Unskilled")]
    Unskilled,
}

const HIGH_SKILLED_TAGS: [&str; 2] = ["high-skilled", "supervisor"];
const SKILLED_TAGS: [&str; 2] = ["skilled", "operator"];

impl Designation {
    /// Resolve a worker's bucket from its directory tags.
    ///
    /// Tags are compared whole and case-insensitively. High-skilled tags win
    /// over skilled ones; a worker without a recognised tag is Unskilled.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Self {
        let normalized: Vec<String> = tags
            .iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .collect();

        let has_any = |wanted: &[&str]| normalized.iter().any(|t| wanted.contains(&t.as_str()));

        if has_any(&HIGH_SKILLED_TAGS) {
            Designation::HighSkilled
        } else if has_any(&SKILLED_TAGS) {
            Designation::Skilled
        } else {
            Designation::Unskilled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn operator_tag_is_skilled_regardless_of_case() {
        assert_eq!(
            Designation::from_tags(&["Senior", "Operator"]),
            Designation::Skilled
        );
    }

    #[test]
    fn supervisor_tag_is_high_skilled() {
        assert_eq!(
            Designation::from_tags(&["Supervisor"]),
            Designation::HighSkilled
        );
        assert_eq!(
            Designation::from_tags(&["skilled", "HIGH-SKILLED"]),
            Designation::HighSkilled
        );
    }

    #[test]
    fn missing_or_unknown_tags_fall_back_to_unskilled() {
        let none: [&str; 0] = [];
        assert_eq!(Designation::from_tags(&none), Designation::Unskilled);
        assert_eq!(
            Designation::from_tags(&["helper", "night-shift"]),
            Designation::Unskilled
        );
        // whole-tag match: "unskilled" must not be read as "skilled"
        assert_eq!(
            Designation::from_tags(&["unskilled"]),
            Designation::Unskilled
        );
    }

    #[test]
    fn label_round_trips_through_display() {
        assert_eq!(Designation::HighSkilled.to_string(), "High Skilled");
        assert_eq!(
            Designation::from_str("Skilled").ok(),
            Some(Designation::Skilled)
        );
    }
}
