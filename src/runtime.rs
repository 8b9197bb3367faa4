// Pipeline entry points. Chart generation and insight generation are
// independent outcomes: a failed insight request never takes down a chart
// that already built.

use crate::client::InsightClient;
use crate::data::Table;
use crate::error::Result;
use crate::insight::InsightResult;
use crate::schema;
use crate::spec::{self, ChartRequest, ChartSpec};

/// Result of one Generate action. `insights` is `None` when insight
/// generation was not requested, and carries its own `Result` otherwise.
#[derive(Debug)]
pub struct Generated {
    pub spec: ChartSpec,
    pub insights: Option<Result<InsightResult>>,
}

/// Build the declarative chart spec for a request.
///
/// Classification runs first so an empty table short-circuits as
/// `EmptySchema` before any encoding validation.
pub fn generate_chart(table: &Table, request: &ChartRequest) -> Result<ChartSpec> {
    schema::classify(table)?;
    spec::build(table, request)
}

/// Run the insight pipeline for an already-built chart.
pub fn generate_insights(
    client: &InsightClient,
    spec: &ChartSpec,
    table: &Table,
    request: &ChartRequest,
) -> Result<InsightResult> {
    client.request_insights(spec, table, &request.x_column, request.y_column.as_deref())
}

/// One full Generate action: build the chart, then optionally ask for
/// insights. Only a chart failure is an error of this function; an insight
/// failure is reported inside `Generated`.
pub fn generate(
    table: &Table,
    request: &ChartRequest,
    insight_client: Option<&InsightClient>,
) -> Result<Generated> {
    let spec = generate_chart(table, request)?;

    let insights = insight_client.map(|client| {
        let outcome = generate_insights(client, &spec, table, request);
        if let Err(e) = &outcome {
            log::warn!("insight generation failed: {}", e);
        }
        outcome
    });

    Ok(Generated { spec, insights })
}
