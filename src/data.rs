use std::io::Read;

use anyhow::{anyhow, Result};
use serde_json::Value;

/// In-memory rectangular dataset. Cells are kept as strings; numeric
/// interpretation happens downstream in the schema classifier.
///
/// Column names are unique and fixed for the table's lifetime; the table is
/// read-only once constructed.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (i, a) in headers.iter().enumerate() {
            if headers[i + 1..].iter().any(|b| a == b) {
                return Err(anyhow!("Duplicate column name '{}'", a));
            }
        }
        Ok(Self { headers, rows })
    }

    /// Read a table from CSV. The first record is the header row; every
    /// following record must have the same width.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        Self::new(headers, rows)
    }

    /// Create a table from a JSON array of objects. Column order follows the
    /// first object's key order.
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;

        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut rows = Vec::new();
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;

            let mut row = Vec::new();
            for header in &headers {
                let val_str = match obj.get(header) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(Value::Null) | None => "".to_string(),
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                row.push(val_str);
            }
            rows.push(row);
        }

        Self::new(headers, rows)
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All values of a named column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|r| r.get(idx).map(|s| s.as_str()).unwrap_or(""))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_csv() {
        let csv = "region,sales\nNorth,100\nSouth,200\n";
        let table = Table::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["region", "sales"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["North", "100"]);
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let csv = "a,a\n1,2\n";
        assert!(Table::from_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_from_json() {
        let value: Value =
            serde_json::from_str(r#"[{"x": 1, "y": "a"}, {"x": 2, "y": null}]"#).unwrap();
        let table = Table::from_json(&value).unwrap();
        assert_eq!(table.headers, vec!["x", "y"]);
        assert_eq!(table.rows[1], vec!["2", ""]);
    }

    #[test]
    fn test_column_lookup() {
        let table = Table::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec!["1".to_string(), "x".to_string()]],
        )
        .unwrap();
        assert_eq!(table.column_index("b"), Some(1));
        assert_eq!(table.column("b").unwrap(), vec!["x"]);
        assert!(table.column("missing").is_none());
    }
}
