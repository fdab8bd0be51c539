//! Typed business records
//!
//! The record store carries every business field as a string tagged with
//! its data type. Nothing here interprets the value beyond what a caller
//! explicitly asks for; numeric access goes through [`parse_decimal`] so the
//! whole system agrees on what counts as a number.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Data type tag carried alongside every field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Textarea,
    Number,
    Date,
    Time,
    Switch,
    Options,
    Lookup,
    User,
    File,
    Autonum,
    Function,
    /// Any tag this crate does not model explicitly
    #[serde(other)]
    Other,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Textarea => "textarea",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Switch => "switch",
            DataType::Options => "options",
            DataType::Lookup => "lookup",
            DataType::User => "user",
            DataType::File => "file",
            DataType::Autonum => "autonum",
            DataType::Function => "function",
            DataType::Other => "other",
        }
    }
}

/// Errors raised when reading typed values out of a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("Field {field_id} holds a non-numeric value: {value:?}")]
    NonNumeric { field_id: String, value: String },
}

/// A single typed field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    #[serde(rename = "dataType")]
    pub data_type: DataType,
    pub value: String,
}

impl FieldValue {
    pub fn new(data_type: DataType, value: impl Into<String>) -> Self {
        Self {
            data_type,
            value: value.into(),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(DataType::Text, value)
    }

    pub fn number(value: impl Into<String>) -> Self {
        Self::new(DataType::Number, value)
    }

    pub fn decimal(value: Decimal) -> Self {
        Self::new(DataType::Number, value.normalize().to_string())
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self::new(DataType::Date, value)
    }

    pub fn options(value: impl Into<String>) -> Self {
        Self::new(DataType::Options, value)
    }

    pub fn lookup(value: impl Into<String>) -> Self {
        Self::new(DataType::Lookup, value)
    }

    /// Returns true when the value is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Parses a decimal number the way the record store writes them
///
/// Accepts plain (`"1200.50"`) and scientific (`"1.2e3"`) notation with
/// surrounding whitespace. Returns `None` for anything else.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// One row of a business datastore, keyed by field id
///
/// Records are immutable once fetched; journal lines are built from a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl SourceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, used when assembling records
    pub fn with(mut self, field_id: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field_id.into(), value);
        self
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.fields.contains_key(field_id)
    }

    /// Returns the raw value of a field, if present
    pub fn value(&self, field_id: &str) -> Option<&str> {
        self.fields.get(field_id).map(|v| v.value.as_str())
    }

    /// Returns the raw value of a field, or `""` when absent
    pub fn text(&self, field_id: &str) -> &str {
        self.value(field_id).unwrap_or("")
    }

    /// Reads a field as a decimal amount
    ///
    /// Absent and blank fields read as zero. A present value that does not
    /// parse as a number is an error.
    pub fn decimal(&self, field_id: &str) -> Result<Decimal, RecordError> {
        match self.fields.get(field_id) {
            None => Ok(Decimal::ZERO),
            Some(field) if field.is_blank() => Ok(Decimal::ZERO),
            Some(field) => parse_decimal(&field.value).ok_or_else(|| RecordError::NonNumeric {
                field_id: field_id.to_string(),
                value: field.value.clone(),
            }),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> BTreeMap<String, FieldValue> {
        self.fields
    }
}

impl FromIterator<(String, FieldValue)> for SourceRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, FieldValue>> for SourceRecord {
    fn from(fields: BTreeMap<String, FieldValue>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_absent_field_is_zero() {
        let record = SourceRecord::new();
        assert_eq!(record.decimal("leasekingaku").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_decimal_non_numeric_is_error() {
        let record = SourceRecord::new().with("leasekingaku", FieldValue::number("x"));
        let err = record.decimal("leasekingaku").unwrap_err();
        assert_eq!(
            err,
            RecordError::NonNumeric {
                field_id: "leasekingaku".to_string(),
                value: "x".to_string()
            }
        );
    }

    #[test]
    fn test_parse_decimal_scientific() {
        assert_eq!(parse_decimal(" 1.5e3 "), Some(dec!(1500)));
        assert_eq!(parse_decimal("-12.25"), Some(dec!(-12.25)));
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_data_type_serde_unknown_tag() {
        let value: FieldValue =
            serde_json::from_str(r#"{"dataType":"barcode","value":"A1"}"#).unwrap();
        assert_eq!(value.data_type, DataType::Other);
    }
}
