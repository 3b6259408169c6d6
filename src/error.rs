use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event error: {0}")]
    Event(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Terminal failure of a single fetch cycle.
///
/// The `Display` output is the exact message carried by a `FETCH_ERROR` event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Missing dependency: {name}")]
    MissingDependency { name: String },

    #[error("AccessToken not configured")]
    ConfigurationError,

    #[error("Unexpected response status: {status}")]
    UnexpectedStatus { status: u16 },

    #[error("Invalid response format")]
    InvalidResponseFormat,

    #[error("API Error: {status} - {detail}")]
    ApiError { status: u16, detail: String },

    #[error("No response from Todoist API: {message}")]
    NoResponse { message: String },

    #[error("Request setup error: {message}")]
    RequestSetupError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages() {
        let cases = [
            (
                FetchError::MissingDependency {
                    name: "ureq".to_string(),
                },
                "Missing dependency: ureq",
            ),
            (FetchError::ConfigurationError, "AccessToken not configured"),
            (
                FetchError::UnexpectedStatus { status: 204 },
                "Unexpected response status: 204",
            ),
            (FetchError::InvalidResponseFormat, "Invalid response format"),
            (
                FetchError::ApiError {
                    status: 403,
                    detail: "\"forbidden\"".to_string(),
                },
                "API Error: 403 - \"forbidden\"",
            ),
            (
                FetchError::NoResponse {
                    message: "connection refused".to_string(),
                },
                "No response from Todoist API: connection refused",
            ),
            (
                FetchError::RequestSetupError {
                    message: "bad url".to_string(),
                },
                "Request setup error: bad url",
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }
}
