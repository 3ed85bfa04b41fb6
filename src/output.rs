//! Output types returned by the extraction pipeline and the HTTP endpoints.

use serde::{Deserialize, Deserializer, Serialize};

/// One table row: column name → cell value.
///
/// Values are normally strings, but whatever the model returned is passed
/// through unchanged rather than coerced. Columns keep the order the model
/// emitted them in.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// All five MOM sections.
///
/// Field order matches document order and is preserved on serialisation.
/// A section the model left out (or set to `null`) deserialises to an empty
/// vector, so the serialised form always carries all five keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub meeting_mom: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attendees: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub apologize_for_attendance: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub topics_covered: Vec<Row>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub required_signatures: Vec<Row>,
}

impl ExtractionResult {
    /// Total number of rows across all sections.
    pub fn row_count(&self) -> usize {
        self.meeting_mom.len()
            + self.attendees.len()
            + self.apologize_for_attendance.len()
            + self.topics_covered.len()
            + self.required_signatures.len()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Row>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Row>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a successful `POST /extract-all-tables/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllTablesResponse {
    pub topics: ExtractionResult,
}

/// Body of a successful `POST /extract-topics-covered/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsCoveredResponse {
    pub topics_covered: Vec<Row>,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sections_become_empty() {
        let result: ExtractionResult =
            serde_json::from_value(json!({"meeting_mom": [{"Quorum": "Yes"}]})).unwrap();
        assert_eq!(result.meeting_mom.len(), 1);
        assert!(result.attendees.is_empty());

        let out = serde_json::to_value(&result).unwrap();
        assert_eq!(out["attendees"], json!([]));
        assert_eq!(out["required_signatures"], json!([]));
    }

    #[test]
    fn null_section_becomes_empty() {
        let result: ExtractionResult =
            serde_json::from_value(json!({"attendees": null})).unwrap();
        assert!(result.attendees.is_empty());
    }

    #[test]
    fn serialised_keys_follow_document_order() {
        let text = serde_json::to_string(&ExtractionResult::default()).unwrap();
        assert_eq!(
            text,
            r#"{"meeting_mom":[],"attendees":[],"apologize_for_attendance":[],"topics_covered":[],"required_signatures":[]}"#
        );
    }

    #[test]
    fn row_columns_keep_model_order() {
        let reply = r#"{"topics_covered":[{"Topic":"Budget","Discussion":"Q3","Recommendation":"Approve","In‐charge":"CFO","Start Date":"2024-04-01","Voting result":"Unanimous"}]}"#;
        let result: ExtractionResult = serde_json::from_str(reply).unwrap();

        let columns: Vec<&str> = result.topics_covered[0].keys().map(String::as_str).collect();
        assert_eq!(
            columns,
            ["Topic", "Discussion", "Recommendation", "In‐charge", "Start Date", "Voting result"]
        );

        let text = serde_json::to_string(&result.topics_covered).unwrap();
        assert!(text.starts_with(r#"[{"Topic":"Budget","Discussion":"Q3""#), "{text}");
    }

    #[test]
    fn row_count_sums_sections() {
        let result: ExtractionResult = serde_json::from_value(json!({
            "attendees": [{"Name": "A"}, {"Name": "B"}],
            "topics_covered": [{"Topic": "Budget"}]
        }))
        .unwrap();
        assert_eq!(result.row_count(), 3);
    }
}
