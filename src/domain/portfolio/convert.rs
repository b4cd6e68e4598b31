//! Conversions from raw snapshot fields to typed values.

use super::wire::{
    FieldValue, FIELD_CURRENCY, FIELD_DAILY_CHANGE, FIELD_PROFIT, FIELD_TOTAL_VALUE,
};
use super::{Period, Portfolio, Snapshot};
use crate::error::ProjectionError;

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Strip one explicit `+` sign. A second sign after it is not a number.
fn strip_plus<'a>(field: &'static str, raw: &'a str) -> Result<&'a str, ProjectionError> {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('+') {
        Some(rest) if rest.starts_with(['+', '-']) => Err(value_parse(field, raw)),
        Some(rest) => Ok(rest),
        None => Ok(trimmed),
    }
}

fn value_parse(field: &'static str, raw: &str) -> ProjectionError {
    ProjectionError::ValueParse {
        field,
        raw: raw.to_string(),
    }
}

fn field_value(field: &'static str, value: Option<&Value>) -> Result<Option<FieldValue>, ProjectionError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value::<FieldValue>(v.clone())
            .map(Some)
            .map_err(|_| value_parse(field, &v.to_string())),
    }
}

/// Parse a percentage field: a number, or text optionally prefixed with `+`.
pub fn parse_change(field: &'static str, value: Option<&Value>) -> Result<Option<f64>, ProjectionError> {
    let parsed = match field_value(field, value)? {
        None => return Ok(None),
        Some(FieldValue::Number(n)) => n.as_f64(),
        Some(FieldValue::Text(s)) => f64::from_str(strip_plus(field, &s)?).ok(),
    };

    match parsed {
        Some(f) if f.is_finite() => Ok(Some(f)),
        _ => Err(value_parse(field, &value.map(|v| v.to_string()).unwrap_or_default())),
    }
}

/// Parse a currency amount into a `Decimal`.
pub fn parse_amount(field: &'static str, value: Option<&Value>) -> Result<Option<Decimal>, ProjectionError> {
    let text = match field_value(field, value)? {
        None => return Ok(None),
        Some(FieldValue::Number(n)) => n.to_string(),
        Some(FieldValue::Text(s)) => strip_plus(field, &s)?.to_string(),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|_| value_parse(field, &text))
}

/// Currency codes are text; anything else is stringified.
pub fn parse_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

impl TryFrom<&Snapshot> for Portfolio {
    type Error = ProjectionError;

    fn try_from(s: &Snapshot) -> Result<Self, Self::Error> {
        let change = |p: Period| parse_change(p.field_key(), s.field(p.field_key()));
        Ok(Self {
            total_value: parse_amount(FIELD_TOTAL_VALUE, s.field(FIELD_TOTAL_VALUE))?,
            currency: parse_text(s.field(FIELD_CURRENCY)),
            daily_change: parse_change(FIELD_DAILY_CHANGE, s.field(FIELD_DAILY_CHANGE))?,
            profit: parse_amount(FIELD_PROFIT, s.field(FIELD_PROFIT))?,
            weekly_change: change(Period::Weekly)?,
            two_weekly_change: change(Period::TwoWeekly)?,
            monthly_change: change(Period::Monthly)?,
            three_monthly_change: change(Period::ThreeMonthly)?,
            six_monthly_change: change(Period::SixMonthly)?,
            yearly_change: change(Period::Yearly)?,
            month_to_date_change: change(Period::MonthToDate)?,
            year_to_date_change: change(Period::YearToDate)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(v: Value) -> Result<Option<f64>, ProjectionError> {
        parse_change("zmianaW", Some(&v))
    }

    #[test]
    fn test_parse_change_plus_prefixed() {
        assert_eq!(change(json!("+1.23")).unwrap(), Some(1.23));
        assert_eq!(change(json!("+3.4")).unwrap(), Some(3.4));
    }

    #[test]
    fn test_parse_change_negative_and_unsigned() {
        assert_eq!(change(json!("-0.5")).unwrap(), Some(-0.5));
        assert_eq!(change(json!("0.75")).unwrap(), Some(0.75));
        assert_eq!(change(json!(2)).unwrap(), Some(2.0));
        assert_eq!(change(json!(-1.5)).unwrap(), Some(-1.5));
    }

    #[test]
    fn test_parse_change_absent() {
        assert_eq!(parse_change("zmianaW", None).unwrap(), None);
        assert_eq!(change(Value::Null).unwrap(), None);
    }

    #[test]
    fn test_parse_change_rejects_garbage() {
        assert!(matches!(
            change(json!("n/a")),
            Err(ProjectionError::ValueParse { field: "zmianaW", .. })
        ));
        assert!(change(json!("+-1")).is_err());
        assert!(change(json!("++1")).is_err());
        assert!(change(json!("inf")).is_err());
        assert!(change(json!([1])).is_err());
        assert!(change(json!("")).is_err());
    }

    #[test]
    fn test_parse_amount() {
        let v = json!(12345.67);
        assert_eq!(
            parse_amount("wartosc", Some(&v)).unwrap(),
            Some(Decimal::from_str("12345.67").unwrap())
        );
        let v = json!("+250.10");
        assert_eq!(
            parse_amount("zysk", Some(&v)).unwrap(),
            Some(Decimal::from_str("250.10").unwrap())
        );
        let v = json!("-10");
        assert_eq!(parse_amount("zysk", Some(&v)).unwrap(), Some(Decimal::from(-10)));
        let v = json!("abc");
        assert!(parse_amount("zysk", Some(&v)).is_err());
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_text(Some(&json!("PLN"))), Some("PLN".to_string()));
        assert_eq!(parse_text(Some(&Value::Null)), None);
        assert_eq!(parse_text(None), None);
    }
}
