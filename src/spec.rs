// Declarative chart specification: a mark, channel encodings tagged with
// semantic types, and the data embedded as JSON records. Renderer-agnostic;
// any grammar-of-graphics style consumer can draw it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::data::Table;
use crate::error::{Error, Result};
use crate::schema::{self, SemanticType};

/// Supported chart kinds. Each variant carries its own channel rules;
/// matches below are exhaustive so an unhandled kind cannot slip in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Point,
    Line,
    Arc,
    Boxplot,
}

impl ChartKind {
    /// Required semantic type of the x channel.
    pub fn x_type(&self) -> SemanticType {
        match self {
            ChartKind::Bar | ChartKind::Arc | ChartKind::Boxplot => SemanticType::Categorical,
            ChartKind::Point | ChartKind::Line => SemanticType::Numeric,
        }
    }

    /// Whether the kind plots a quantity against the x channel. When true,
    /// y is required and must be numeric; when false, y must be absent.
    pub fn requires_y(&self) -> bool {
        match self {
            ChartKind::Bar | ChartKind::Point | ChartKind::Line | ChartKind::Boxplot => true,
            ChartKind::Arc => false,
        }
    }

    /// Whether a categorical color channel may be attached.
    pub fn color_allowed(&self) -> bool {
        match self {
            ChartKind::Bar | ChartKind::Point | ChartKind::Line => true,
            ChartKind::Arc | ChartKind::Boxplot => false,
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChartKind::Bar => "bar",
            ChartKind::Point => "point",
            ChartKind::Line => "line",
            ChartKind::Arc => "arc",
            ChartKind::Boxplot => "boxplot",
        };
        write!(f, "{}", name)
    }
}

/// User chart selections, already reduced to column names by the caller.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub kind: ChartKind,
    pub x_column: String,
    pub y_column: Option<String>,
    pub color_column: Option<String>,
}

/// Scale type a renderer should use for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Quantitative,
    Nominal,
}

impl From<SemanticType> for FieldType {
    fn from(t: SemanticType) -> Self {
        match t {
            SemanticType::Numeric => FieldType::Quantitative,
            SemanticType::Categorical => FieldType::Nominal,
        }
    }
}

/// One visual channel: the column it draws from and its scale type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEncoding {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Mapping from visual channels to columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encoding {
    pub x: ChannelEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<ChannelEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ChannelEncoding>,
}

impl Encoding {
    /// Column names referenced by any channel, in channel order.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut cols = vec![self.x.field.as_str()];
        if let Some(y) = &self.y {
            cols.push(y.field.as_str());
        }
        if let Some(color) = &self.color {
            cols.push(color.field.as_str());
        }
        cols
    }
}

/// Embedded data reference, the `data.values` form of the usual declarative
/// chart grammars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValues {
    pub values: Vec<Map<String, Value>>,
}

/// Declarative chart description. Immutable once built; one spec corresponds
/// to exactly one request plus the table's data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub mark: ChartKind,
    pub encoding: Encoding,
    pub data: DataValues,
}

/// Build a chart spec from a table and a request, enforcing the structural
/// rules of the requested kind. Pure function of its inputs.
///
/// Non-finite numeric values pass through into the embedded data untouched;
/// filtering them is the insight sampler's job, not the builder's.
pub fn build(table: &Table, request: &ChartRequest) -> Result<ChartSpec> {
    let schema = schema::classify(table)?;

    let x = validate_channel(&schema, "x", &request.x_column, request.kind.x_type())?;

    let y = match (&request.y_column, request.kind.requires_y()) {
        (Some(col), true) => Some(validate_channel(&schema, "y", col, SemanticType::Numeric)?),
        (None, true) => {
            return Err(Error::InvalidEncoding(format!(
                "chart kind '{}' requires a y column",
                request.kind
            )))
        }
        (Some(_), false) => {
            return Err(Error::InvalidEncoding(format!(
                "chart kind '{}' does not take a y column",
                request.kind
            )))
        }
        (None, false) => None,
    };

    let color = match (&request.color_column, request.kind.color_allowed()) {
        (Some(col), true) => Some(validate_channel(
            &schema,
            "color",
            col,
            SemanticType::Categorical,
        )?),
        (Some(_), false) => {
            return Err(Error::InvalidEncoding(format!(
                "chart kind '{}' does not take a color column",
                request.kind
            )))
        }
        (None, _) => None,
    };

    let encoding = Encoding { x, y, color };
    let data = embed_rows(table);

    Ok(ChartSpec {
        mark: request.kind,
        encoding,
        data,
    })
}

fn validate_channel(
    schema: &schema::Schema,
    channel: &str,
    column: &str,
    expected: SemanticType,
) -> Result<ChannelEncoding> {
    let actual = schema.semantic_type(column).ok_or_else(|| {
        Error::InvalidEncoding(format!("{} column '{}' not found in table", channel, column))
    })?;

    if actual != expected {
        let (want, got) = match expected {
            SemanticType::Numeric => ("numeric", "categorical"),
            SemanticType::Categorical => ("categorical", "numeric"),
        };
        return Err(Error::InvalidEncoding(format!(
            "{} column '{}' must be {}, but it is {}",
            channel, column, want, got
        )));
    }

    Ok(ChannelEncoding {
        field: column.to_string(),
        field_type: actual.into(),
    })
}

/// Embed the table rows as JSON records. Cells that parse as finite numbers
/// become JSON numbers so renderers get quantitative scales for free; all
/// other cells stay strings.
fn embed_rows(table: &Table) -> DataValues {
    let mut values = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let mut record = Map::new();
        for (header, cell) in table.headers.iter().zip(row.iter()) {
            let value = match cell.trim().parse::<f64>().ok().and_then(Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::String(cell.clone()),
            };
            record.insert(header.clone(), value);
        }
        values.push(record);
    }
    DataValues { values }
}
