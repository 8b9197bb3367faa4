// Insight requester: serializes a chart spec plus a bounded data sample into
// a prompt, calls the text-generation service once, and validates the reply
// against the structured insight schema.

use serde::{Deserialize, Serialize};

use crate::config::InsightConfig;
use crate::data::Table;
use crate::error::{Error, Result};
use crate::insight::InsightResult;
use crate::sample::{self, Sample, MAX_SAMPLE_ROWS};
use crate::schema::SemanticType;
use crate::spec::{ChartSpec, FieldType};

const SYSTEM_PROMPT: &str = r#"You are a data analyst. You are given a declarative chart description and a sample of the data behind it.

CRITICAL INSTRUCTIONS:
1. Return ONLY a valid JSON object, no markdown fences and no surrounding text.
2. Use only these keys, each optional: "key_observations" (array of strings), "trends_or_patterns" (string), "anomalies_or_outliers" (string), "recommendations" (array of strings or string), "summary" (array of strings or string).
3. Ground every statement in the supplied data; do not invent values.
4. Omit a key entirely rather than returning an empty value for it."#;

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for the external text-generation service.
pub struct InsightClient {
    config: InsightConfig,
    max_sample_rows: usize,
}

impl InsightClient {
    pub fn new(config: InsightConfig) -> Self {
        Self {
            config,
            max_sample_rows: MAX_SAMPLE_ROWS,
        }
    }

    pub fn with_max_sample_rows(mut self, max_rows: usize) -> Self {
        self.max_sample_rows = max_rows;
        self
    }

    /// Generate insights for a built chart. One outbound call per
    /// invocation, no internal retries; a transient failure surfaces as
    /// `InsightService` and is retried only by the user acting again.
    ///
    /// This blocks for up to the configured timeout. Run it off the
    /// interactive thread and gate it through an `InsightSession`.
    pub fn request_insights(
        &self,
        spec: &ChartSpec,
        table: &Table,
        x_column: &str,
        y_column: Option<&str>,
    ) -> Result<InsightResult> {
        let sample = self.build_sample(spec, table, x_column, y_column);
        let user_prompt = build_user_prompt(spec, &sample);

        log::debug!(
            "requesting insights: mark={}, sampled {} rows ({} skipped)",
            spec.mark,
            sample.rows.len(),
            sample.skipped
        );

        let content = self.invoke(&user_prompt)?;
        parse_insight_content(&content)
    }

    /// Restrict the sample to the columns the encoding references plus the
    /// explicit x/y selections, deduplicated, in reference order.
    fn build_sample(
        &self,
        spec: &ChartSpec,
        table: &Table,
        x_column: &str,
        y_column: Option<&str>,
    ) -> Sample {
        let mut columns: Vec<(String, SemanticType)> = Vec::new();
        let mut push = |name: &str, ty: SemanticType| {
            if !columns.iter().any(|(existing, _)| existing == name) {
                columns.push((name.to_string(), ty));
            }
        };

        push(&spec.encoding.x.field, channel_type(spec.encoding.x.field_type));
        if let Some(y) = &spec.encoding.y {
            push(&y.field, channel_type(y.field_type));
        }
        if let Some(color) = &spec.encoding.color {
            push(&color.field, channel_type(color.field_type));
        }
        // The caller's raw selections, in case they differ from the encoding.
        push(x_column, selection_type(spec, x_column));
        if let Some(y) = y_column {
            push(y, selection_type(spec, y));
        }

        sample::sample_rows(table, &columns, self.max_sample_rows)
    }

    fn invoke(&self, user_prompt: &str) -> Result<String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| Error::service(e.to_string()))?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: 0.3,
            max_tokens: 1024,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        let response = client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    Error::service("request timed out")
                } else {
                    Error::service(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let message = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api) => api.error.message,
                Err(_) => error_text,
            };
            return Err(Error::service_status(status.as_u16(), message));
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| Error::service(format!("unreadable response body: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::service("no choices in response"))
    }
}

fn channel_type(field_type: FieldType) -> SemanticType {
    match field_type {
        FieldType::Quantitative => SemanticType::Numeric,
        FieldType::Nominal => SemanticType::Categorical,
    }
}

fn selection_type(spec: &ChartSpec, column: &str) -> SemanticType {
    // Fall back to categorical for a column the encoding doesn't type;
    // categorical cells are never filtered, so this is the safe default.
    for channel in [Some(&spec.encoding.x), spec.encoding.y.as_ref(), spec.encoding.color.as_ref()]
        .into_iter()
        .flatten()
    {
        if channel.field == column {
            return channel_type(channel.field_type);
        }
    }
    SemanticType::Categorical
}

fn build_user_prompt(spec: &ChartSpec, sample: &Sample) -> String {
    let mut prompt = String::new();

    prompt.push_str("CHART:\n");
    prompt.push_str(&format!("mark: {}\n", spec.mark));
    prompt.push_str(&format!(
        "x: {} ({:?})\n",
        spec.encoding.x.field, spec.encoding.x.field_type
    ));
    if let Some(y) = &spec.encoding.y {
        prompt.push_str(&format!("y: {} ({:?})\n", y.field, y.field_type));
    }
    if let Some(color) = &spec.encoding.color {
        prompt.push_str(&format!("color: {} ({:?})\n", color.field, color.field_type));
    }

    prompt.push_str("\nDATA SAMPLE");
    if sample.skipped > 0 {
        prompt.push_str(&format!(" (first {} usable rows)", sample.rows.len()));
    }
    prompt.push_str(":\n");
    prompt.push_str(&sample.to_prompt_text());

    prompt.push_str("\nReturn ONLY the JSON object described in the instructions.");
    prompt
}

/// Validate the service's text content against the insight schema. Accepts a
/// bare JSON object; falls back once to the outermost brace-delimited slice
/// for providers that wrap JSON in markdown fences.
fn parse_insight_content(content: &str) -> Result<InsightResult> {
    match InsightResult::from_json_str(content) {
        Ok(result) => Ok(result),
        Err(first_err) => {
            if let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) {
                if start < end {
                    if let Ok(result) = InsightResult::from_json_str(&content[start..=end]) {
                        log::warn!("insight response contained extra text around JSON");
                        return Ok(result);
                    }
                }
            }
            Err(first_err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{build, ChartKind, ChartRequest};
    use httpmock::prelude::*;
    use std::time::Duration;

    fn make_table() -> Table {
        Table::new(
            vec!["region".to_string(), "sales".to_string()],
            vec![
                vec!["North".to_string(), "100".to_string()],
                vec!["South".to_string(), "200".to_string()],
            ],
        )
        .unwrap()
    }

    fn make_spec(table: &Table) -> ChartSpec {
        build(
            table,
            &ChartRequest {
                kind: ChartKind::Bar,
                x_column: "region".to_string(),
                y_column: Some("sales".to_string()),
                color_column: None,
            },
        )
        .unwrap()
    }

    fn client_for(server: &MockServer) -> InsightClient {
        let config = InsightConfig::new(server.url("/v1"), "test-key")
            .with_timeout(Duration::from_secs(5));
        InsightClient::new(config)
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[test]
    fn test_successful_insight_request() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer test-key");
            then.status(200)
                .json_body(chat_body(r#"{"summary": "Sales rose."}"#));
        });

        let table = make_table();
        let spec = make_spec(&table);
        let result = client_for(&server)
            .request_insights(&spec, &table, "region", Some("sales"))
            .unwrap();

        mock.assert();
        assert_eq!(
            result.summary,
            Some(crate::insight::TextOrList::Text("Sales rose.".to_string()))
        );
    }

    #[test]
    fn test_service_error_surfaces() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429)
                .body(r#"{"error": {"message": "rate limited"}}"#);
        });

        let table = make_table();
        let spec = make_spec(&table);
        let err = client_for(&server)
            .request_insights(&spec, &table, "region", Some("sales"))
            .unwrap_err();

        match err {
            Error::InsightService { message, status } => {
                assert_eq!(status, Some(429));
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_content_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(chat_body("The chart looks great!"));
        });

        let table = make_table();
        let spec = make_spec(&table);
        let err = client_for(&server)
            .request_insights(&spec, &table, "region", Some("sales"))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_markdown_wrapped_json_is_recovered() {
        let content = "Here you go:\n```json\n{\"summary\": \"ok\"}\n```";
        let result = parse_insight_content(content).unwrap();
        assert!(result.summary.is_some());
    }

    #[test]
    fn test_sample_respects_row_cap_and_referenced_columns() {
        let table = make_table();
        let spec = make_spec(&table);
        let client = InsightClient::new(InsightConfig::new("base", "key")).with_max_sample_rows(1);
        let sample = client.build_sample(&spec, &table, "region", Some("sales"));
        assert_eq!(sample.rows.len(), 1);
        let names: Vec<&str> = sample.columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["region", "sales"]);
    }

    #[test]
    fn test_prompt_mentions_mark_and_columns() {
        let table = make_table();
        let spec = make_spec(&table);
        let sample = sample::sample_rows(
            &table,
            &[
                ("region".to_string(), SemanticType::Categorical),
                ("sales".to_string(), SemanticType::Numeric),
            ],
            MAX_SAMPLE_ROWS,
        );
        let prompt = build_user_prompt(&spec, &sample);
        assert!(prompt.contains("mark: bar"));
        assert!(prompt.contains("x: region"));
        assert!(prompt.contains("North\t100"));
    }
}
