#![forbid(unsafe_code)]

use poem::http::StatusCode;
use poem_openapi::Object;
use serde::Serialize;
use thiserror::Error;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("hello_openapi input parameters:\n{}", .0)]
    InputParms(String),

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Inaccessible or invalid logger configuration.
    #[error("Unable to initialize log4rs: {}", .0)]
    Log4rsInitialization(String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    #[error("Unable to start server on {}: {}", .0, .1)]
    ServerStart(String, String),
}

// ***************************************************************************
//                               Status Kinds
// ***************************************************************************
/// The error conditions a use case can declare and signal.  Each kind has a
/// fixed HTTP status and wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    InvalidArgument,
    Internal,
}

impl StatusKind {
    pub fn http_status(self) -> StatusCode {
        match self {
            StatusKind::InvalidArgument => StatusCode::BAD_REQUEST,
            StatusKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Code placed in the result_code field of error bodies.
    pub fn code(self) -> &'static str {
        match self {
            StatusKind::InvalidArgument => "INVALID_ARGUMENT",
            StatusKind::Internal => "INTERNAL",
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            StatusKind::InvalidArgument => "invalid argument",
            StatusKind::Internal => "internal",
        }
    }
}

// ---------------------------------------------------------------------------
// UseCaseError:
// ---------------------------------------------------------------------------
/// An error signaled by a use case, tagged with the status kind that decides
/// how it is reported to the client.
#[derive(Error, Debug)]
#[error("{}: {}", .kind.phrase(), .cause)]
pub struct UseCaseError {
    pub kind: StatusKind,
    pub cause: anyhow::Error,
}

impl UseCaseError {
    pub fn wrap(cause: anyhow::Error, kind: StatusKind) -> Self {
        Self { kind, cause }
    }
}

// ***************************************************************************
//                              Error Responses
// ***************************************************************************
/// JSON body of every error response.
#[derive(Object, Serialize, Debug)]
pub struct HttpResult {
    pub result_code: String,
    pub result_msg: String,
}

impl HttpResult {
    pub fn new(result_code: String, result_msg: String) -> Self {
        Self { result_code, result_msg }
    }

    /// Wrap a request decoding or validation failure.
    pub fn from_decode_error(err: &poem::Error) -> Self {
        let kind = StatusKind::InvalidArgument;
        Self::new(kind.code().to_string(), format!("{}: {}", kind.phrase(), err))
    }
}

impl From<&UseCaseError> for HttpResult {
    fn from(err: &UseCaseError) -> Self {
        Self::new(err.kind.code().to_string(), err.to_string())
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn status_kinds_map_to_http() {
        assert_eq!(StatusKind::InvalidArgument.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(StatusKind::Internal.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn use_case_error_message() {
        let err = UseCaseError::wrap(anyhow!("bad route was called"), StatusKind::InvalidArgument);
        assert_eq!(err.to_string(), "invalid argument: bad route was called");

        let result = HttpResult::from(&err);
        assert_eq!(result.result_code, "INVALID_ARGUMENT");
        assert_eq!(result.result_msg, "invalid argument: bad route was called");
    }
}
