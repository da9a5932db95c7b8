use anyhow::anyhow;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Structured error returned by the service for any non-success status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorPayload {
    /// Request body or parameters rejected by schema validation (HTTP 422).
    Validation(HttpValidationError),
    /// Any other error, reduced to a message.
    Message(ErrorMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpValidationError {
    #[serde(default)]
    pub detail: Vec<ValidationErrorItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrorItem {
    /// Path to the offending value, e.g. `["body", "name"]`.
    #[serde(default)]
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub detail: String,
}

impl ValidationErrorItem {
    /// `body.name` style rendering of `loc`.
    pub fn location(&self) -> String {
        self.loc
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPayload::Message(m) => f.write_str(&m.detail),
            ErrorPayload::Validation(v) => {
                if v.detail.is_empty() {
                    return f.write_str("validation failed");
                }
                for (i, item) in v.detail.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}: {} ({})", item.location(), item.msg, item.kind)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailBody {
    detail: Value,
}

/// Classifies a non-success response body into an [`ErrorPayload`].
pub fn handle_response_error(status: StatusCode, content: &[u8]) -> ErrorPayload {
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        if let Ok(v) = serde_json::from_slice::<HttpValidationError>(content) {
            if !v.detail.is_empty() {
                return ErrorPayload::Validation(v);
            }
        }
    }

    let detail = match serde_json::from_slice::<DetailBody>(content) {
        Ok(DetailBody {
            detail: Value::String(s),
        }) => s,
        Ok(DetailBody { detail }) => detail.to_string(),
        Err(_) => {
            let text = String::from_utf8_lossy(content).trim().to_string();
            if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                text
            }
        }
    };

    ErrorPayload::Message(ErrorMessage { detail })
}

pub(crate) fn format_api_error(status: StatusCode, url: &str, e: &ErrorPayload) -> anyhow::Error {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "Argilla authentication/authorization failed (HTTP {}).\n- Check that ARGILLA_API_KEY (or `api_key:` in .argillarc) is a valid API key\n- Check that the user has access to the dataset's workspace\n\nServer message: {}\nrequest: {}",
            status.as_u16(),
            e,
            url
        );
    }

    if status == StatusCode::NOT_FOUND {
        return anyhow!(
            "Argilla resource not found (HTTP 404).\n- The dataset id may be wrong or the dataset was deleted\n- Check that the configured api_url points at the server root (without /api)\n\nServer message: {}\nrequest: {}",
            e,
            url
        );
    }

    if let ErrorPayload::Validation(_) = e {
        return anyhow!(
            "Argilla rejected the request (HTTP {}) for url ({})\n{}",
            status.as_u16(),
            url,
            e
        );
    }

    anyhow!(
        "API request failed: HTTP {} for url ({})\n{}",
        status.as_u16(),
        url,
        e
    )
}
