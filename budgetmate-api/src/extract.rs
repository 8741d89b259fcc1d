/// Form extraction with validation
///
/// [`ValidForm`] decodes an `application/x-www-form-urlencoded` body and runs
/// its `validator` rules before the handler sees it. Undecodable bodies
/// become `400`, rule violations `422` with per-field details, both in the
/// usual JSON error shape.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Form,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone)]
pub struct ValidForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidForm<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidForm(value))
    }
}

/// `validator` rule: the value must contain something besides whitespace.
pub fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("This field is required".into());
        return Err(error);
    }
    Ok(())
}

/// Treats blank form values as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a numeric form value; infinities and NaN are rejected.
pub fn parse_amount(field: &str, raw: &str) -> Result<f64, ApiError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or_else(|| ApiError::invalid(field, format!("{} must be a number", field)))
}

/// Parses a numeric form value that must be greater than zero.
pub fn parse_positive_amount(field: &str, raw: &str) -> Result<f64, ApiError> {
    let amount = parse_amount(field, raw)?;
    if amount <= 0.0 {
        return Err(ApiError::invalid(field, format!("{} must be positive", field)));
    }
    Ok(amount)
}

/// Parses an optional numeric form value; blank means absent.
pub fn parse_optional_amount(field: &str, value: Option<String>) -> Result<Option<f64>, ApiError> {
    non_blank(value)
        .map(|raw| parse_amount(field, &raw))
        .transpose()
}

/// Parses an optional `YYYY-MM-DD` form value; blank means absent.
pub fn parse_optional_date(
    field: &str,
    value: Option<String>,
) -> Result<Option<chrono::NaiveDate>, ApiError> {
    match non_blank(value) {
        None => Ok(None),
        Some(raw) => chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::invalid(field, format!("{} must be a YYYY-MM-DD date", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_required() {
        assert!(required("Rent").is_ok());
        assert!(required(" \t").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Rent ".into())), Some("Rent".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("amount", " 1299 ").unwrap(), 1299.0);
        assert!(parse_amount("amount", "inf").is_err());
        assert!(parse_positive_amount("amount", "0").is_err());
        assert!(parse_positive_amount("amount", "-5").is_err());
        assert_eq!(parse_positive_amount("amount", "0.5").unwrap(), 0.5);
    }

    #[test]
    fn test_parse_optional_amount() {
        assert_eq!(parse_optional_amount("amount", Some("12.5".into())).unwrap(), Some(12.5));
        assert_eq!(parse_optional_amount("amount", Some("".into())).unwrap(), None);
        assert!(parse_optional_amount("amount", Some("abc".into())).is_err());
        assert!(parse_optional_amount("amount", Some("NaN".into())).is_err());
    }

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(
            parse_optional_date("date", Some("2025-06-01".into())).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(parse_optional_date("date", None).unwrap(), None);
        assert!(parse_optional_date("date", Some("01/06/2025".into())).is_err());
    }
}
