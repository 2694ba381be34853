use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::common::error::AppError;

/// Outcome of checking a prepared document: `valid` is true iff `errors` is empty.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn of<T: Validate>(document: &T) -> Self {
        match document.validate() {
            Ok(()) => Self { valid: true, errors: Vec::new() },
            Err(errors) => Self::from_errors(&errors),
        }
    }

    pub fn from_errors(errors: &ValidationErrors) -> Self {
        let mut messages = Vec::new();
        collect_messages(errors, "", &mut messages);
        Self { valid: messages.is_empty(), errors: messages }
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.valid {
            Ok(())
        } else {
            Err(AppError::ValidationError(self.errors))
        }
    }
}

fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("{} is invalid", field),
                    };
                    if prefix.is_empty() {
                        out.push(message);
                    } else {
                        out.push(format!("{}: {}", prefix, message));
                    }
                }
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_messages(inner, &join_prefix(prefix, field), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    let item_prefix = format!("{}[{}]", join_prefix(prefix, field), index);
                    collect_messages(inner, &item_prefix, out);
                }
            }
        }
    }
}

fn join_prefix(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

// ---
// Shared field checks used by the schema modules
// ---

pub fn not_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0);
        return Err(err);
    }
    Ok(())
}

/// Largest amount a `NUMERIC(12, 2)` column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

pub fn money_in_range(value: &Decimal) -> Result<(), ValidationError> {
    not_negative(value)?;
    if *value > MAX_MONEY {
        let mut err = ValidationError::new("range");
        err.add_param("max".into(), &MAX_MONEY.to_string());
        return Err(err);
    }
    Ok(())
}

pub fn clock_time(value: &str) -> Result<(), ValidationError> {
    parse_clock_time(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("time_format"))
}

/// Parses `HH:MM`, also accepting `HH:MM:SS`.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

pub fn schema_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Probe {
        #[validate(
            required(message = "name is required"),
            length(min = 1, message = "name is required")
        )]
        name: Option<String>,
        #[validate(range(min = 1, message = "quantity must be at least 1"))]
        quantity: Option<i32>,
    }

    #[test]
    fn report_collects_messages_in_field_order() {
        let report = ValidationReport::of(&Probe { name: None, quantity: Some(0) });
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec!["name is required".to_string(), "quantity must be at least 1".to_string()]
        );
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let report = ValidationReport::of(&Probe { name: Some(String::new()), quantity: None });
        assert_eq!(report.errors, vec!["name is required".to_string()]);
    }

    #[test]
    fn valid_document_has_no_errors() {
        let report = ValidationReport::of(&Probe { name: Some("x".into()), quantity: Some(2) });
        assert!(report.valid);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn negative_decimals_are_rejected() {
        assert!(not_negative(&Decimal::new(-1, 2)).is_err());
        assert!(not_negative(&Decimal::ZERO).is_ok());
        assert!(not_negative(&Decimal::new(1250, 2)).is_ok());
    }

    #[test]
    fn money_fits_numeric_twelve_two() {
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
        assert!(money_in_range(&MAX_MONEY).is_ok());
        assert!(money_in_range(&Decimal::new(1234567890125, 1)).is_err());
        assert!(money_in_range(&Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn clock_times_parse_with_or_without_seconds() {
        assert!(parse_clock_time("09:30").is_some());
        assert!(parse_clock_time("17:45:00").is_some());
        assert!(parse_clock_time("25:00").is_none());
        assert!(clock_time("noon").is_err());
    }
}
