//! API error types.

use thiserror::Error;

use crate::responses::ExceptionResponse;

/// Errors that business logic turns into OGC exception responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A query parameter has an unsupported value.
    #[error("Invalid parameter value: {0}")]
    InvalidParameterValue(String),

    /// A required query parameter is missing.
    #[error("Missing parameter value: {0}")]
    MissingParameterValue(String),

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation is not supported by this server.
    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    NoApplicableCode(String),
}

impl ApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidParameterValue(_) => 400,
            ApiError::MissingParameterValue(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::OperationNotSupported(_) => 501,
            ApiError::NoApplicableCode(_) => 500,
        }
    }

    /// Get the OGC exception code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidParameterValue(_) => "InvalidParameterValue",
            ApiError::MissingParameterValue(_) => "MissingParameterValue",
            ApiError::NotFound(_) => "NotFound",
            ApiError::OperationNotSupported(_) => "OperationNotSupported",
            ApiError::NoApplicableCode(_) => "NoApplicableCode",
        }
    }

    /// Convert to an exception document.
    pub fn to_exception(&self) -> ExceptionResponse {
        let description = match self {
            ApiError::InvalidParameterValue(msg)
            | ApiError::MissingParameterValue(msg)
            | ApiError::NotFound(msg)
            | ApiError::OperationNotSupported(msg)
            | ApiError::NoApplicableCode(msg) => msg.clone(),
        };
        ExceptionResponse::new(self.code(), description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::InvalidParameterValue("f".to_string()).status_code(), 400);
        assert_eq!(ApiError::MissingParameterValue("bbox".to_string()).status_code(), 400);
        assert_eq!(ApiError::NotFound("lakes".to_string()).status_code(), 404);
        assert_eq!(ApiError::OperationNotSupported("tiles".to_string()).status_code(), 501);
        assert_eq!(ApiError::NoApplicableCode("boom".to_string()).status_code(), 500);
    }

    #[test]
    fn test_error_to_exception() {
        let err = ApiError::NotFound("Collection not found: lakes".to_string());
        let exc = err.to_exception();

        assert_eq!(exc.code, "NotFound");
        assert_eq!(exc.type_, "NotFound");
        assert!(exc.description.contains("lakes"));
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::InvalidParameterValue("Invalid format: xml".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Invalid parameter value"));
        assert!(display.contains("xml"));
    }
}
