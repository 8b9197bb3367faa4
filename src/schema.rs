// Semantic-type classification and descriptive statistics for a loaded table.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::Table;
use crate::error::{Error, Result};

/// Semantic type of a column: quantitative or nominal/ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemanticType {
    Numeric,
    Categorical,
}

/// Partition of a table's columns by semantic type. Total and disjoint:
/// every column lands in exactly one of the two lists, in table order.
#[derive(Debug, Clone)]
pub struct Schema {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl Schema {
    /// Semantic type of a named column, if it exists.
    pub fn semantic_type(&self, column: &str) -> Option<SemanticType> {
        if self.numeric.iter().any(|c| c == column) {
            Some(SemanticType::Numeric)
        } else if self.categorical.iter().any(|c| c == column) {
            Some(SemanticType::Categorical)
        } else {
            None
        }
    }
}

/// Descriptive statistics for one numeric column. Non-finite cells are
/// excluded; `count` is the number of values that contributed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Partition the table's columns into numeric and categorical sets.
///
/// A column is numeric when every non-empty cell parses as `f64` and at
/// least one cell does; anything else is categorical. Empty cells are
/// treated as gaps, not as evidence of a categorical column.
pub fn classify(table: &Table) -> Result<Schema> {
    if table.headers.is_empty() {
        return Err(Error::EmptySchema);
    }

    let mut numeric = Vec::new();
    let mut categorical = Vec::new();

    for (idx, name) in table.headers.iter().enumerate() {
        if is_numeric_column(table, idx) {
            numeric.push(name.clone());
        } else {
            categorical.push(name.clone());
        }
    }

    Ok(Schema {
        numeric,
        categorical,
    })
}

fn is_numeric_column(table: &Table, idx: usize) -> bool {
    let mut seen_value = false;
    for row in &table.rows {
        let cell = row.get(idx).map(|s| s.trim()).unwrap_or("");
        if cell.is_empty() {
            continue;
        }
        if cell.parse::<f64>().is_err() {
            return false;
        }
        seen_value = true;
    }
    seen_value
}

/// Standard descriptive statistics per numeric column. Non-numeric columns
/// simply have no entry in the result.
pub fn describe(table: &Table) -> Result<BTreeMap<String, ColumnStats>> {
    let schema = classify(table)?;

    let mut stats = BTreeMap::new();
    for name in &schema.numeric {
        let mut values: Vec<f64> = table
            .column(name)
            .unwrap_or_default()
            .iter()
            .filter_map(|cell| cell.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .collect();

        if values.is_empty() {
            continue;
        }

        values.sort_by(|a, b| a.total_cmp(b));

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };

        stats.insert(
            name.clone(),
            ColumnStats {
                count,
                mean,
                std,
                min: values[0],
                q1: percentile(&values, 0.25),
                median: percentile(&values, 0.50),
                q3: percentile(&values, 0.75),
                max: values[count - 1],
            },
        );
    }

    Ok(stats)
}

/// Percentile by linear interpolation between closest ranks.
/// Input must be sorted.
fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    if sorted_data.len() == 1 {
        return sorted_data[0];
    }

    let rank = p * (sorted_data.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        sorted_data[lower]
    } else {
        let weight = rank - lower as f64;
        sorted_data[lower] * (1.0 - weight) + sorted_data[upper] * weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_partition_total_and_disjoint() {
        let table = make_table(
            &["region", "sales", "note"],
            &[&["North", "100", "ok"], &["South", "200", ""]],
        );
        let schema = classify(&table).unwrap();
        assert_eq!(schema.numeric, vec!["sales"]);
        assert_eq!(schema.categorical, vec!["region", "note"]);
        for h in &table.headers {
            let in_numeric = schema.numeric.contains(h);
            let in_categorical = schema.categorical.contains(h);
            assert!(in_numeric != in_categorical);
        }
    }

    #[test]
    fn test_empty_cells_do_not_disqualify() {
        let table = make_table(&["v"], &[&["1.5"], &[""], &["2.5"]]);
        let schema = classify(&table).unwrap();
        assert_eq!(schema.numeric, vec!["v"]);
    }

    #[test]
    fn test_all_empty_column_is_categorical() {
        let table = make_table(&["v"], &[&[""], &[""]]);
        let schema = classify(&table).unwrap();
        assert_eq!(schema.categorical, vec!["v"]);
    }

    #[test]
    fn test_empty_schema() {
        let table = Table::new(vec![], vec![]).unwrap();
        assert!(matches!(classify(&table), Err(Error::EmptySchema)));
    }

    #[test]
    fn test_describe_basic() {
        let table = make_table(
            &["region", "sales"],
            &[&["North", "100"], &["South", "200"]],
        );
        let stats = describe(&table).unwrap();
        assert!(!stats.contains_key("region"));
        let sales = &stats["sales"];
        assert_eq!(sales.count, 2);
        assert_eq!(sales.mean, 150.0);
        assert_eq!(sales.min, 100.0);
        assert_eq!(sales.max, 200.0);
        assert_eq!(sales.median, 150.0);
        // Sample std of {100, 200}
        assert!((sales.std - 70.710678).abs() < 1e-5);
    }

    #[test]
    fn test_describe_skips_non_finite() {
        let table = make_table(&["v"], &[&["1"], &["NaN"], &["3"], &["inf"]]);
        let stats = describe(&table).unwrap();
        let v = &stats["v"];
        assert_eq!(v.count, 2);
        assert_eq!(v.mean, 2.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.5), 2.5);
        assert_eq!(percentile(&data, 0.25), 1.75);
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 1.0), 4.0);
    }
}
