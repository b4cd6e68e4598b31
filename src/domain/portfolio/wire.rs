//! Wire types for the `getPortfel` response.
//!
//! Only the envelope is typed here. The snapshot keeps the parsed body as
//! raw JSON; fields are read through these types on projection.

use serde::{Deserialize, Serialize};

/// Top-level key of the portfolio object.
pub const PORTFOLIO_KEY: &str = "portfel";

pub const FIELD_TOTAL_VALUE: &str = "wartosc";
pub const FIELD_CURRENCY: &str = "waluta";
pub const FIELD_DAILY_CHANGE: &str = "zmianaDzienna";
pub const FIELD_PROFIT: &str = "zysk";

/// Sentinel `status.code` the server uses for every rejection.
pub const REJECTED_STATUS_CODE: &str = "1";

/// `status` block present on every response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseStatus {
    #[serde(default)]
    pub code: Option<StatusCode>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ResponseStatus {
    pub fn is_rejected(&self) -> bool {
        self.code
            .as_ref()
            .is_some_and(|c| c.as_string() == REJECTED_STATUS_CODE)
    }
}

/// The server sends the status code as either a string or a number.
/// Any other JSON value is kept as-is and never counts as a rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusCode {
    Text(String),
    Number(serde_json::Number),
    Other(serde_json::Value),
}

impl StatusCode {
    pub fn as_string(&self) -> String {
        match self {
            StatusCode::Text(s) => s.clone(),
            StatusCode::Number(n) => n.to_string(),
            StatusCode::Other(v) => v.to_string(),
        }
    }
}

/// Envelope view used to check the status without touching the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub status: Option<ResponseStatus>,
}

/// A numeric field as sent: a JSON number, or text such as `"+1.23"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_code_text_sentinel() {
        let env: ResponseEnvelope =
            serde_json::from_value(json!({"status": {"code": "1", "text": "bad key"}})).unwrap();
        let status = env.status.unwrap();
        assert!(status.is_rejected());
        assert_eq!(status.text.as_deref(), Some("bad key"));
    }

    #[test]
    fn test_status_code_numeric_sentinel() {
        let env: ResponseEnvelope =
            serde_json::from_value(json!({"status": {"code": 1}})).unwrap();
        assert!(env.status.unwrap().is_rejected());
    }

    #[test]
    fn test_status_code_ok() {
        let env: ResponseEnvelope =
            serde_json::from_value(json!({"status": {"code": "0", "text": "OK"}})).unwrap();
        assert!(!env.status.unwrap().is_rejected());

        let env: ResponseEnvelope = serde_json::from_value(json!({"portfel": {}})).unwrap();
        assert!(env.status.is_none());
    }

    #[test]
    fn test_status_code_unusual_type_not_rejected() {
        let env: ResponseEnvelope =
            serde_json::from_value(json!({"status": {"code": true}})).unwrap();
        let status = env.status.unwrap();
        assert_eq!(status.code, Some(StatusCode::Other(json!(true))));
        assert!(!status.is_rejected());

        let env: ResponseEnvelope =
            serde_json::from_value(json!({"status": {"code": ["1"]}})).unwrap();
        assert!(!env.status.unwrap().is_rejected());
    }

    #[test]
    fn test_field_value_untagged() {
        let n: FieldValue = serde_json::from_value(json!(2)).unwrap();
        assert!(matches!(n, FieldValue::Number(_)));
        let t: FieldValue = serde_json::from_value(json!("+1.5")).unwrap();
        assert_eq!(t, FieldValue::Text("+1.5".to_string()));
    }
}
