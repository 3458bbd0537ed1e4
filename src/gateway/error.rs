use derive_more::{Display, Error};
use reqwest::StatusCode;

#[derive(Debug, Display, Error)]
pub enum GatewayError {
    #[display("request failed with status {status}: {message}")]
    Http { status: StatusCode, message: String },
    #[display("network error: {_0}")]
    Network(#[error(source)] reqwest::Error),
    #[display("invalid response: {_0}")]
    Decode(#[error(source)] reqwest::Error),
    #[display("{reason}")]
    Validation { reason: String },
    #[display("failed to save file: {_0}")]
    Io(#[error(source)] std::io::Error),
}

impl GatewayError {
    pub fn validation(reason: impl Into<String>) -> Self {
        GatewayError::Validation {
            reason: reason.into(),
        }
    }

    /// HTTP status of the failed call, when the backend answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            GatewayError::Network(e) | GatewayError::Decode(e) => e.status(),
            GatewayError::Validation { .. } | GatewayError::Io(_) => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GatewayError::Decode(e)
        } else {
            GatewayError::Network(e)
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        GatewayError::Io(e)
    }
}

pub type ApiResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_carries_status() {
        let err = GatewayError::Http {
            status: StatusCode::NOT_FOUND,
            message: "no open account for table 4".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            err.to_string(),
            "request failed with status 404 Not Found: no open account for table 4"
        );
    }

    #[test]
    fn validation_error_displays_reason_only() {
        let err = GatewayError::validation("QR id is required");
        assert_eq!(err.to_string(), "QR id is required");
        assert!(err.status().is_none());
    }
}
