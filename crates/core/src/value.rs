//! Typed cell values for statements and result rows
//!
//! `SqlValue` is the single value type crossing the storage seam, in both
//! directions: statement rendering turns variants into SQL literal text, and
//! the storage collaborator returns result sets as rows of the same type.
//!
//! Text-like variants are single-quoted with embedded quotes doubled;
//! `Raw` is emitted verbatim and exists for caller-preformatted fragments
//! such as the parenthesized list of an `IN (...)` condition.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single result set row, in the column order of the issued statement.
pub type Row = Vec<SqlValue>;

/// Typed value for one statement parameter or one result cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 text
    Text(String),
    /// Calendar date (no time zone)
    Date(NaiveDate),
    /// Time of day (no time zone)
    Time(NaiveTime),
    /// Combined date and time (no time zone)
    DateTime(NaiveDateTime),
    /// Pre-rendered SQL fragment, emitted verbatim
    Raw(String),
}

impl SqlValue {
    /// Get the variant name as a string (used in decode error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "Null",
            SqlValue::Bool(_) => "Bool",
            SqlValue::Int(_) => "Int",
            SqlValue::Float(_) => "Float",
            SqlValue::Text(_) => "Text",
            SqlValue::Date(_) => "Date",
            SqlValue::Time(_) => "Time",
            SqlValue::DateTime(_) => "DateTime",
            SqlValue::Raw(_) => "Raw",
        }
    }

    /// Check if this is SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Render this value as SQL literal text.
    ///
    /// Text, date and time variants are single-quoted; `Raw` fragments are
    /// the caller's responsibility and pass through untouched.
    pub fn render_sql(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => quote(s),
            SqlValue::Date(d) => quote(&d.format("%Y-%m-%d").to_string()),
            SqlValue::Time(t) => quote(&t.format("%H:%M:%S").to_string()),
            SqlValue::DateTime(dt) => quote(&dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            SqlValue::Raw(s) => s.clone(),
        }
    }
}

/// Single-quote a string literal, doubling embedded quotes
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
