use actix_web::{error, HttpResponse};
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum SandboxError {
    #[display("invalid request: {reason}")]
    BadRequest { reason: String },
    #[display("not found: {reason}")]
    NotFound { reason: String },
    #[display("conflict: {reason}")]
    Conflict { reason: String },
}

impl SandboxError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        SandboxError::BadRequest { reason: reason.into() }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        SandboxError::NotFound { reason: reason.into() }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        SandboxError::Conflict { reason: reason.into() }
    }
}

impl error::ResponseError for SandboxError {
    fn status_code(&self) -> StatusCode {
        match *self {
            SandboxError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            SandboxError::NotFound { .. } => StatusCode::NOT_FOUND,
            SandboxError::Conflict { .. } => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }
}
