// Bounded row sampling for the insight prompt. Caps the payload sent to the
// external service and keeps insight generation deterministic for a given
// table and chart configuration.

use crate::data::Table;
use crate::schema::SemanticType;

/// Default cap on sampled rows.
pub const MAX_SAMPLE_ROWS: usize = 50;

/// A bounded, deterministic subset of table rows restricted to the columns a
/// chart references. Rows are kept in original table order.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Sampled columns with their semantic types, in reference order.
    pub columns: Vec<(String, SemanticType)>,
    pub rows: Vec<Vec<String>>,
    /// Rows of the source table that were not sampled, either because the
    /// cap was hit or because a referenced numeric cell was non-finite.
    pub skipped: usize,
}

impl Sample {
    /// Serialize the sample as header + tab-separated rows for a prompt.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|(name, _)| name.as_str()).collect();
        out.push_str(&header.join("\t"));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }
}

/// Select up to `max_rows` rows from the named columns, in original order.
///
/// A row is excluded when any of its referenced numeric cells fails to parse
/// as a finite `f64`; the builder passes such values through, so the filter
/// lives here, just before the payload leaves the process.
pub fn sample_rows(
    table: &Table,
    columns: &[(String, SemanticType)],
    max_rows: usize,
) -> Sample {
    let indexed: Vec<(usize, SemanticType)> = columns
        .iter()
        .filter_map(|(name, ty)| table.column_index(name).map(|idx| (idx, *ty)))
        .collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for row in &table.rows {
        if rows.len() >= max_rows {
            skipped += 1;
            continue;
        }

        let finite = indexed.iter().all(|(idx, ty)| match ty {
            SemanticType::Numeric => row
                .get(*idx)
                .map(|cell| cell.trim().parse::<f64>().map_or(false, |v| v.is_finite()))
                .unwrap_or(false),
            SemanticType::Categorical => true,
        });

        if !finite {
            skipped += 1;
            continue;
        }

        rows.push(
            indexed
                .iter()
                .map(|(idx, _)| row.get(*idx).cloned().unwrap_or_default())
                .collect(),
        );
    }

    Sample {
        columns: columns.to_vec(),
        rows,
        skipped,
    }
}
