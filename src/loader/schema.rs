//! Explicit column schema for the long-format input file.
//!
//! Every column the analysis reads is declared here with its type and
//! nullability, and each cell is checked against that declaration instead
//! of relying on type inference.

use super::DataSourceError;
use csv::StringRecord;
use std::fmt;

pub const PARTICIPANT_ID: &str = "participant_id";
pub const POST_ID: &str = "post_id";
pub const GENDER: &str = "gender";
pub const CONTENT_SOURCE: &str = "content_source";
pub const RATING: &str = "rating";
pub const PERSUASIVENESS_ITEMS: [&str; 3] =
    ["persuasiveness_1", "persuasiveness_2", "persuasiveness_3"];
pub const DONATION_AMOUNT: &str = "donation_amount";

/// Tokens read as a missing value (compared case-insensitively after trimming).
const NULL_TOKENS: [&str; 5] = ["", "na", "nan", "null", "n/a"];

/// Expected type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Float,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Float => write!(f, "a number"),
        }
    }
}

/// Declaration of one input column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnType,
    pub nullable: bool,
}

impl ColumnSpec {
    const fn new(name: &'static str, kind: ColumnType, nullable: bool) -> Self {
        Self {
            name,
            kind,
            nullable,
        }
    }
}

/// A validated cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Float(f64),
    Null,
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Text content, `None` for a missing or numeric cell.
    pub fn into_text(self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Float(_) | Cell::Null => None,
        }
    }

    /// Numeric content, NaN for a missing cell.
    pub fn as_float(&self) -> f64 {
        match self {
            Cell::Float(v) => *v,
            _ => f64::NAN,
        }
    }
}

/// Ordered set of column declarations.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// The experiment's long-format layout: one row per participant and post.
    ///
    /// Every column accepts missing values; they are counted, not rejected.
    pub fn long_format() -> Self {
        let mut columns = vec![
            ColumnSpec::new(PARTICIPANT_ID, ColumnType::Text, true),
            ColumnSpec::new(POST_ID, ColumnType::Text, true),
            ColumnSpec::new(GENDER, ColumnType::Text, true),
            ColumnSpec::new(CONTENT_SOURCE, ColumnType::Text, true),
            ColumnSpec::new(RATING, ColumnType::Text, true),
        ];
        columns.extend(
            PERSUASIVENESS_ITEMS
                .iter()
                .map(|&name| ColumnSpec::new(name, ColumnType::Float, true)),
        );
        columns.push(ColumnSpec::new(DONATION_AMOUNT, ColumnType::Float, true));
        Self { columns }
    }

    #[cfg(test)]
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Position of a declared column in the schema.
    #[cfg(test)]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Map every declared column to its index in the header row.
    pub fn resolve(&self, headers: &StringRecord) -> Result<Vec<usize>, DataSourceError> {
        self.columns
            .iter()
            .map(|spec| {
                headers
                    .iter()
                    .position(|h| h.trim() == spec.name)
                    .ok_or_else(|| DataSourceError::MissingColumn(spec.name.to_string()))
            })
            .collect()
    }

    /// Validate one record, producing one cell per declared column.
    pub fn parse_record(
        &self,
        record: &StringRecord,
        indices: &[usize],
        line: u64,
    ) -> Result<Vec<Cell>, DataSourceError> {
        self.columns
            .iter()
            .zip(indices)
            .map(|(spec, &index)| parse_cell(spec, record.get(index).unwrap_or(""), line))
            .collect()
    }
}

fn is_null_token(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    NULL_TOKENS.contains(&lowered.as_str())
}

/// Validate a raw cell against its column declaration.
pub fn parse_cell(spec: &ColumnSpec, raw: &str, line: u64) -> Result<Cell, DataSourceError> {
    if is_null_token(raw) {
        if spec.nullable {
            return Ok(Cell::Null);
        }
        return Err(DataSourceError::UnexpectedNull {
            line,
            column: spec.name.to_string(),
        });
    }

    let raw = raw.trim();
    match spec.kind {
        ColumnType::Text => Ok(Cell::Text(raw.to_string())),
        ColumnType::Float => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Cell::Float(value)),
            _ => Err(DataSourceError::TypeMismatch {
                line,
                column: spec.name.to_string(),
                value: raw.to_string(),
                expected: spec.kind,
            }),
        },
    }
}
