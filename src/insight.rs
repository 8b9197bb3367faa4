// Structured insight schema and the presenter contract consumed by the UI.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Deterministic name for the exported insight artifact.
pub const EXPORT_FILE_NAME: &str = "ai_insights.json";

/// A field the service may return either as one text block or as a list of
/// bullet points. Modeled explicitly instead of inspecting shapes at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

/// Structured commentary on a rendered chart. Every field is optional;
/// consumers must tolerate any subset being absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_observations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends_or_patterns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomalies_or_outliers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<TextOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TextOrList>,
}

/// How a section body should be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Bullets(Vec<String>),
    Text(String),
}

/// One renderable section of an insight result.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: &'static str,
    pub body: SectionBody,
}

impl InsightResult {
    /// Parse a raw service payload. Unknown extra fields are ignored and
    /// missing fields are absent, never errors; a payload that is not the
    /// schema at all is `MalformedResponse`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::MalformedResponse(e.to_string()))
    }

    /// The renderable sections, in presentation order. Absent fields produce
    /// no section.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = Vec::new();

        if let Some(obs) = &self.key_observations {
            sections.push(Section {
                title: "Key Observations",
                body: SectionBody::Bullets(obs.clone()),
            });
        }
        if let Some(text) = &self.trends_or_patterns {
            sections.push(Section {
                title: "Trends or Patterns",
                body: SectionBody::Text(text.clone()),
            });
        }
        if let Some(text) = &self.anomalies_or_outliers {
            sections.push(Section {
                title: "Anomalies or Outliers",
                body: SectionBody::Text(text.clone()),
            });
        }
        if let Some(recs) = &self.recommendations {
            sections.push(Section {
                title: "Recommendations",
                body: recs.clone().into(),
            });
        }
        if let Some(summ) = &self.summary {
            sections.push(Section {
                title: "Executive Summary",
                body: summ.clone().into(),
            });
        }

        sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections().is_empty()
    }

    /// Indented, human-diffable JSON for the downloadable artifact.
    pub fn to_export_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<TextOrList> for SectionBody {
    fn from(value: TextOrList) -> Self {
        match value {
            TextOrList::Text(s) => SectionBody::Text(s),
            TextOrList::List(items) => SectionBody::Bullets(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_only() {
        let result = InsightResult::from_json_str(r#"{"summary": "Sales rose."}"#).unwrap();
        assert_eq!(
            result.summary,
            Some(TextOrList::Text("Sales rose.".to_string()))
        );
        assert!(result.key_observations.is_none());

        let sections = result.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Executive Summary");
        assert_eq!(
            sections[0].body,
            SectionBody::Text("Sales rose.".to_string())
        );
    }

    #[test]
    fn test_all_fields_absent() {
        let result = InsightResult::from_json_str("{}").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let result = InsightResult::from_json_str(
            r#"{"summary": "ok", "confidence": 0.9, "model": "x"}"#,
        )
        .unwrap();
        assert!(result.summary.is_some());
    }

    #[test]
    fn test_list_valued_recommendations() {
        let result = InsightResult::from_json_str(
            r#"{"recommendations": ["Restock North", "Audit South"]}"#,
        )
        .unwrap();
        let sections = result.sections();
        assert_eq!(
            sections[0].body,
            SectionBody::Bullets(vec![
                "Restock North".to_string(),
                "Audit South".to_string()
            ])
        );
    }

    #[test]
    fn test_list_valued_summary() {
        let result =
            InsightResult::from_json_str(r#"{"summary": ["point one", "point two"]}"#).unwrap();
        assert_eq!(
            result.summary,
            Some(TextOrList::List(vec![
                "point one".to_string(),
                "point two".to_string()
            ]))
        );
    }

    #[test]
    fn test_not_the_schema_at_all() {
        let err = InsightResult::from_json_str("The chart looks nice.").unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_section_order() {
        let result = InsightResult::from_json_str(
            r#"{
                "key_observations": ["a"],
                "trends_or_patterns": "t",
                "anomalies_or_outliers": "o",
                "recommendations": "r",
                "summary": "s"
            }"#,
        )
        .unwrap();
        let titles: Vec<&str> = result.sections().iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec![
                "Key Observations",
                "Trends or Patterns",
                "Anomalies or Outliers",
                "Recommendations",
                "Executive Summary"
            ]
        );
    }

    #[test]
    fn test_export_round_trip() {
        let result = InsightResult::from_json_str(r#"{"summary": "Sales rose."}"#).unwrap();
        let exported = result.to_export_json();
        let reparsed = InsightResult::from_json_str(&exported).unwrap();
        assert_eq!(reparsed, result);
        assert!(exported.contains('\n'));
    }
}
