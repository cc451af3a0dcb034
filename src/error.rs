use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown client: {0}")]
    ClientUnknown(String),

    #[error("Client {0} is not connected")]
    ClientOffline(String),

    #[error("Command to client {0} timed out")]
    DispatchTimeout(String),

    #[error("Dispatch failed: {0}")]
    DispatchFailure(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ConsoleError {
    pub fn to_error_code(&self) -> &'static str {
        match self {
            ConsoleError::Database(_) => "DATABASE_ERROR",
            ConsoleError::ClientUnknown(_) => "CLIENT_UNKNOWN",
            ConsoleError::ClientOffline(_) => "CLIENT_OFFLINE",
            ConsoleError::DispatchTimeout(_) => "DISPATCH_TIMEOUT",
            ConsoleError::DispatchFailure(_) => "DISPATCH_FAILED",
            ConsoleError::Validation(_) => "INVALID_INPUT",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
            code: self.to_error_code().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_distinguish_unknown_from_offline() {
        let unknown = ConsoleError::ClientUnknown("ABCD".to_string());
        let offline = ConsoleError::ClientOffline("ABCD".to_string());

        assert_eq!(unknown.to_error_code(), "CLIENT_UNKNOWN");
        assert_eq!(offline.to_error_code(), "CLIENT_OFFLINE");
        assert_ne!(unknown.to_error_code(), offline.to_error_code());
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ConsoleError::DispatchTimeout("ABCD".to_string()).to_error_response();
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("DISPATCH_TIMEOUT"));
        assert!(json.contains("ABCD"));
    }
}
