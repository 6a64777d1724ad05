/// Error types for the translation pipeline and its collaborators
///
/// Tag drift introduced by the translation engine is deliberately absent from
/// this list: it is tolerated by the recomposer and only surfaces in its report.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MtError {
    /// Missing or invalid configuration (API keys, URLs, limits)
    #[error("Configuration error: {0}")]
    Config(String),
    /// Locale code rejected before any request was made
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// Content type route name rejected before any request was made
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),
    /// The translation provider answered with a failure status or a malformed body
    #[error("Translation provider error ({status}): {message}")]
    Provider { status: u16, message: String },
    /// The content store answered with a failure status or a malformed body
    #[error("Content store error ({status}): {message}")]
    Store { status: u16, message: String },
    /// A lookup in the content store returned nothing
    #[error("Not found: {0}")]
    NotFound(String),
    /// Translated markup lost the wrapper needed to split it back into fields
    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),
    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl MtError {
    /// True when the failure came from talking to a remote service
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            MtError::Network(_) | MtError::Provider { .. } | MtError::Store { .. }
        )
    }
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => MtError::Provider {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => MtError::Network(err.to_string()),
        }
    }
}

impl From<url::ParseError> for MtError {
    fn from(err: url::ParseError) -> Self {
        MtError::Config(format!("Invalid URL: {}", err))
    }
}

/// Result type for pipeline operations
pub type MtResult<T> = Result<T, MtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            MtError::Provider {
                status: 456,
                message: "Quota exceeded".to_string()
            }
            .to_string(),
            "Translation provider error (456): Quota exceeded"
        );
        assert_eq!(
            MtError::StructuralMismatch("no </h1>".to_string()).to_string(),
            "Structural mismatch: no </h1>"
        );
        assert_eq!(MtError::Other("plain".to_string()).to_string(), "plain");
    }

    #[test]
    fn test_transport_classification() {
        assert!(MtError::Network("reset".to_string()).is_transport());
        assert!(
            MtError::Store {
                status: 500,
                message: String::new()
            }
            .is_transport()
        );
        assert!(!MtError::StructuralMismatch(String::new()).is_transport());
        assert!(!MtError::Config(String::new()).is_transport());
    }

    #[test]
    fn test_url_parse_error_is_config() {
        let err: MtError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, MtError::Config(_)));
    }
}
