//! Schema-driven metadata definitions and values.
//!
//! # Responsibility
//! - Model per-habit metadata field declarations as a tagged-variant type.
//! - Validate field declarations before they reach persistence.
//!
//! # Invariants
//! - `Enum` fields always carry a non-empty option list; other kinds never
//!   carry options.
//! - A declared default value always type-matches its field kind.
//! - Value-vs-schema conformance of *collected* values is a presentation
//!   concern and is not re-checked here.

use crate::model::date::DayDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field kind for habit metadata declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataKind {
    /// Free-form single-line text.
    Text,
    /// Numeric input (quantity, duration, rating).
    Number,
    /// Yes/no flag.
    Boolean,
    /// Calendar date in canonical `YYYY-MM-DD` form.
    Date,
    /// One value chosen from the declared option list.
    Enum,
}

/// A value collected for one metadata field at completion time.
///
/// Untagged so persisted JSON maps directly onto field kinds: date and enum
/// values travel as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

/// Map from field name to collected value, stored on a completion.
pub type MetadataValues = BTreeMap<String, MetadataValue>;

/// One declared metadata field on a habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataField {
    /// User-facing field name, unique within one habit.
    pub name: String,
    /// Serialized as `type` to match the persisted schema naming.
    #[serde(rename = "type")]
    pub kind: MetadataKind,
    /// Choice list; present exactly when `kind == MetadataKind::Enum`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Optional pre-filled value, typed according to `kind`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<MetadataValue>,
}

/// Validation failure for one metadata field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataFieldError {
    /// Field name is blank after trim.
    BlankName,
    /// Enum field declared without options or with an empty option list.
    MissingEnumOptions { field: String },
    /// Enum option list contains a blank entry.
    BlankEnumOption { field: String },
    /// Options declared on a non-enum field.
    UnexpectedOptions { field: String },
    /// Default value does not type-match the field kind.
    DefaultTypeMismatch { field: String },
    /// Enum default is not one of the declared options.
    DefaultNotInOptions { field: String },
    /// Date default is not a canonical calendar date.
    InvalidDateDefault { field: String },
}

impl Display for MetadataFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "metadata field name must not be blank"),
            Self::MissingEnumOptions { field } => {
                write!(f, "enum metadata field `{field}` requires non-empty options")
            }
            Self::BlankEnumOption { field } => {
                write!(f, "enum metadata field `{field}` has a blank option")
            }
            Self::UnexpectedOptions { field } => {
                write!(f, "metadata field `{field}` is not enum and must not declare options")
            }
            Self::DefaultTypeMismatch { field } => {
                write!(f, "default value for metadata field `{field}` does not match its type")
            }
            Self::DefaultNotInOptions { field } => {
                write!(f, "default for enum metadata field `{field}` is not a declared option")
            }
            Self::InvalidDateDefault { field } => {
                write!(f, "default for date metadata field `{field}` is not a calendar date")
            }
        }
    }
}

impl Error for MetadataFieldError {}

impl MetadataField {
    /// Checks structural validity of this field declaration.
    pub fn validate(&self) -> Result<(), MetadataFieldError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MetadataFieldError::BlankName);
        }

        match self.kind {
            MetadataKind::Enum => {
                let options = self.options.as_ref().filter(|options| !options.is_empty());
                let options = match options {
                    Some(options) => options,
                    None => {
                        return Err(MetadataFieldError::MissingEnumOptions {
                            field: name.to_string(),
                        })
                    }
                };
                if options.iter().any(|option| option.trim().is_empty()) {
                    return Err(MetadataFieldError::BlankEnumOption {
                        field: name.to_string(),
                    });
                }
            }
            _ => {
                if self.options.is_some() {
                    return Err(MetadataFieldError::UnexpectedOptions {
                        field: name.to_string(),
                    });
                }
            }
        }

        if let Some(default) = &self.default {
            self.validate_default(name, default)?;
        }

        Ok(())
    }

    fn validate_default(
        &self,
        name: &str,
        default: &MetadataValue,
    ) -> Result<(), MetadataFieldError> {
        match (self.kind, default) {
            (MetadataKind::Boolean, MetadataValue::Boolean(_)) => Ok(()),
            (MetadataKind::Number, MetadataValue::Number(_)) => Ok(()),
            (MetadataKind::Text, MetadataValue::Text(_)) => Ok(()),
            (MetadataKind::Date, MetadataValue::Text(value)) => DayDate::parse(value)
                .map(|_| ())
                .map_err(|_| MetadataFieldError::InvalidDateDefault {
                    field: name.to_string(),
                }),
            (MetadataKind::Enum, MetadataValue::Text(value)) => {
                let declared = self
                    .options
                    .as_ref()
                    .is_some_and(|options| options.iter().any(|option| option == value));
                if declared {
                    Ok(())
                } else {
                    Err(MetadataFieldError::DefaultNotInOptions {
                        field: name.to_string(),
                    })
                }
            }
            _ => Err(MetadataFieldError::DefaultTypeMismatch {
                field: name.to_string(),
            }),
        }
    }
}
