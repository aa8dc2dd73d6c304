use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ApiError;

/// One normalised shape for every backend answer.
///
/// The backend mixes `{"status": "success"}` and `{"success": true}`
/// discriminators and reports failures in either `message` or `error`.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResult {
    pub ok: bool,
    pub http_status: u16,
    pub data: Option<Value>,
    pub message: Option<String>,
}

impl ApiResult {
    pub fn from_response(http_status: u16, body: &str) -> Self {
        let http_ok = (200..300).contains(&http_status);
        let Ok(value) = serde_json::from_str::<Value>(body) else {
            let message = if http_ok {
                "response was not valid JSON".to_string()
            } else {
                format!("HTTP {http_status}")
            };
            return Self {
                ok: false,
                http_status,
                data: None,
                message: Some(message),
            };
        };

        let flagged = match (value.get("status"), value.get("success")) {
            (Some(Value::String(s)), _) => s.eq_ignore_ascii_case("success"),
            (_, Some(Value::Bool(b))) => *b,
            _ => false,
        };
        let message = ["message", "error"]
            .iter()
            .find_map(|k| value.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        Self {
            ok: http_ok && flagged,
            http_status,
            data: Some(value),
            message,
        }
    }

    pub fn is_http_ok(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    /// Fail unless the answer is a success, keeping the server's message.
    pub fn check(self) -> Result<Self, ApiError> {
        if !self.is_http_ok() {
            return Err(ApiError::Http {
                status: self.http_status,
                message: self
                    .message
                    .unwrap_or_else(|| "request failed".to_string()),
            });
        }
        if !self.ok {
            return Err(ApiError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ));
        }
        Ok(self)
    }

    /// Check for success and decode the body (envelope fields included) as `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let checked = self.check()?;
        let value = checked.data.unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }
}
