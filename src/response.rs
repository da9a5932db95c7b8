use anyhow::Result;
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::error::{ErrorPayload, format_api_error};

/// Decoded body of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Success(T),
    Error(ErrorPayload),
}

/// Uniform envelope returned by every endpoint function.
///
/// `parsed` is `Some(Parsed::Success(_))` only when the status matched the
/// endpoint's documented success code, `Some(Parsed::Error(_))` for any
/// other status, and `None` for success codes that carry no result.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub status_code: StatusCode,
    pub content: Bytes,
    pub headers: HeaderMap,
    pub parsed: Option<Parsed<T>>,
    /// Request URL, kept for error messages.
    pub url: String,
}

impl<T> Response<T> {
    pub fn is_success(&self) -> bool {
        !matches!(self.parsed, Some(Parsed::Error(_)))
    }

    pub fn success(&self) -> Option<&T> {
        match &self.parsed {
            Some(Parsed::Success(v)) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorPayload> {
        match &self.parsed {
            Some(Parsed::Error(e)) => Some(e),
            _ => None,
        }
    }

    /// Converts the envelope into a `Result`, turning an error payload into
    /// an `anyhow::Error` with remediation hints.
    pub fn into_result(self) -> Result<Option<T>> {
        match self.parsed {
            Some(Parsed::Success(v)) => Ok(Some(v)),
            Some(Parsed::Error(e)) => Err(format_api_error(self.status_code, &self.url, &e)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorMessage;

    fn envelope(status: StatusCode, parsed: Option<Parsed<u32>>) -> Response<u32> {
        Response {
            status_code: status,
            content: Bytes::new(),
            headers: HeaderMap::new(),
            parsed,
            url: "http://localhost:6900/api/v1/datasets/x".to_string(),
        }
    }

    #[test]
    fn empty_success_is_not_an_error() {
        let r = envelope(StatusCode::NO_CONTENT, None);
        assert!(r.is_success());
        assert!(r.success().is_none());
        assert!(r.into_result().unwrap().is_none());
    }

    #[test]
    fn error_payload_becomes_err() {
        let r = envelope(
            StatusCode::NOT_FOUND,
            Some(Parsed::Error(ErrorPayload::Message(ErrorMessage {
                detail: "missing".to_string(),
            }))),
        );
        assert!(!r.is_success());
        assert!(r.error().is_some());
        let msg = r.into_result().unwrap_err().to_string();
        assert!(msg.contains("HTTP 404"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn success_payload_is_returned() {
        let r = envelope(StatusCode::OK, Some(Parsed::Success(7)));
        assert_eq!(r.success(), Some(&7));
        assert_eq!(r.into_result().unwrap(), Some(7));
    }
}
