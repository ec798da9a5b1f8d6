//! Project formatter: flattens a structured project into the text blob the
//! model is asked to summarize.
//!
//! The layout (leading newline, four-space indentation, whitespace-only
//! separator lines) is part of the contract with downstream consumers and
//! must stay byte-for-byte stable.

use serde::{Deserialize, Serialize};

const NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescription {
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub problem_statement: String,
    pub proposed_methodology: String,
    #[serde(default)]
    pub expected_outcomes: Option<String>,
    #[serde(default)]
    pub relevance: Option<String>,
    #[serde(default)]
    pub tech_stack: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectDetails {
    pub title: String,
    pub description: ProjectDescription,
    #[serde(default)]
    pub team_members: Option<Vec<String>>,
}

/// Renders the eight labelled sections in fixed order.
pub fn format_project(project: &ProjectDetails) -> String {
    let desc = &project.description;
    let sections: [(&str, String); 8] = [
        ("Title", project.title.clone()),
        ("Abstract", desc.abstract_text.clone()),
        ("Problem Statement", desc.problem_statement.clone()),
        ("Proposed Methodology", desc.proposed_methodology.clone()),
        ("Expected Outcomes", or_not_specified(desc.expected_outcomes.as_deref())),
        ("Relevance", or_not_specified(desc.relevance.as_deref())),
        ("Tech Stack", join_or_not_specified(desc.tech_stack.as_deref())),
        ("Team Members", join_or_not_specified(project.team_members.as_deref())),
    ];

    let body = sections
        .iter()
        .map(|(label, value)| format!("    {label}: {value}\n"))
        .collect::<Vec<_>>()
        .join("    \n");

    format!("\n{body}    ")
}

fn or_not_specified(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_SPECIFIED.to_string(),
    }
}

fn join_or_not_specified(values: Option<&[String]>) -> String {
    match values {
        Some(list) if !list.is_empty() => list.join(", "),
        _ => NOT_SPECIFIED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> ProjectDetails {
        ProjectDetails {
            title: "T".to_string(),
            description: ProjectDescription {
                abstract_text: "A".to_string(),
                problem_statement: "P".to_string(),
                proposed_methodology: "M".to_string(),
                expected_outcomes: None,
                relevance: None,
                tech_stack: None,
            },
            team_members: None,
        }
    }

    #[test]
    fn test_minimal_project_substitutes_not_specified() {
        let text = format_project(&minimal());
        assert!(text.contains("Expected Outcomes: Not specified"));
        assert!(text.contains("Relevance: Not specified"));
        assert!(text.contains("Tech Stack: Not specified"));
        assert!(text.contains("Team Members: Not specified"));
    }

    #[test]
    fn test_exact_layout() {
        let expected = "\n    Title: T\n    \n    Abstract: A\n    \n    Problem Statement: P\n    \n    Proposed Methodology: M\n    \n    Expected Outcomes: Not specified\n    \n    Relevance: Not specified\n    \n    Tech Stack: Not specified\n    \n    Team Members: Not specified\n    ";
        assert_eq!(format_project(&minimal()), expected);
    }

    #[test]
    fn test_labels_appear_in_fixed_order() {
        let text = format_project(&minimal());
        let labels = [
            "Title:",
            "Abstract:",
            "Problem Statement:",
            "Proposed Methodology:",
            "Expected Outcomes:",
            "Relevance:",
            "Tech Stack:",
            "Team Members:",
        ];
        let positions: Vec<usize> = labels
            .iter()
            .map(|l| text.find(l).unwrap_or_else(|| panic!("missing {l}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lists_joined_in_input_order() {
        let mut project = minimal();
        project.description.tech_stack =
            Some(vec!["Rust".into(), "Axum".into(), "Candle".into()]);
        project.team_members = Some(vec!["Priya".into(), "Omar".into()]);
        project.description.expected_outcomes = Some("Faster reviews".into());
        project.description.relevance = Some("High".into());

        let text = format_project(&project);
        assert!(text.contains("    Tech Stack: Rust, Axum, Candle\n"));
        assert!(text.contains("    Team Members: Priya, Omar\n"));
        assert!(text.contains("    Expected Outcomes: Faster reviews\n"));
        assert!(text.contains("    Relevance: High\n"));
    }

    #[test]
    fn test_empty_optionals_count_as_missing() {
        let mut project = minimal();
        project.description.tech_stack = Some(vec![]);
        project.team_members = Some(vec![]);
        project.description.relevance = Some(String::new());

        let text = format_project(&project);
        assert!(text.contains("Tech Stack: Not specified"));
        assert!(text.contains("Team Members: Not specified"));
        assert!(text.contains("Relevance: Not specified"));
    }

    #[test]
    fn test_deserializes_camel_case_description() {
        let project: ProjectDetails = serde_json::from_value(json!({
            "title": "Campus Navigator",
            "description": {
                "abstract": "Indoor routing",
                "problemStatement": "Students get lost",
                "proposedMethodology": "BLE beacons",
                "techStack": ["Flutter", "Firebase"]
            },
            "team_members": ["Ana"]
        }))
        .unwrap();

        assert_eq!(project.description.abstract_text, "Indoor routing");
        assert_eq!(project.description.problem_statement, "Students get lost");
        assert_eq!(
            project.description.tech_stack,
            Some(vec!["Flutter".to_string(), "Firebase".to_string()])
        );
        assert_eq!(project.team_members, Some(vec!["Ana".to_string()]));
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let result = serde_json::from_value::<ProjectDetails>(json!({
            "title": "T",
            "description": { "abstract": "A", "problemStatement": "P" }
        }));
        assert!(result.is_err());
    }
}
