//! Unified error types for availcal.
//!
//! Every failure the calendar pipeline can report is one of these variants.
//! A superseded request is not an error and never appears here.

/// Unified error types for the availability calendar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Malformed caller input (bad date, inverted range, missing ids).
    #[error("INVALID_ARGUMENT: {0}")]
    InvalidArgument(String),

    /// Transport error, timeout or non-200 response from the aggregation endpoint.
    #[error("NETWORK_FAILURE: {0}")]
    NetworkFailure(String),

    /// The endpoint answered 200 but the body could not be decoded.
    #[error("MALFORMED_RESPONSE: {0}")]
    MalformedResponse(String),

    /// The widget's day container never appeared within the retry budget.
    #[error("RENDER_NOT_READY: day container missing after {attempts} retries")]
    RenderNotReady { attempts: u32 },
}

impl Error {
    /// Stable code prefix used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::NetworkFailure(_) => "NETWORK_FAILURE",
            Error::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Error::RenderNotReady { .. } => "RENDER_NOT_READY",
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::InvalidArgument(format!("invalid date: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NetworkFailure("status 500".to_string());
        assert!(err.to_string().contains("NETWORK_FAILURE"));
        assert!(err.to_string().contains("status 500"));

        let err = Error::RenderNotReady { attempts: 10 };
        assert_eq!(err.to_string(), "RENDER_NOT_READY: day container missing after 10 retries");
    }

    #[test]
    fn test_error_code_matches_display_prefix() {
        let errors = [
            Error::InvalidArgument("x".into()),
            Error::NetworkFailure("x".into()),
            Error::MalformedResponse("x".into()),
            Error::RenderNotReady { attempts: 1 },
        ];
        for err in errors {
            assert!(err.to_string().starts_with(err.code()));
        }
    }

    #[test]
    fn test_from_chrono_parse_error() {
        let parse_err = chrono::NaiveDate::parse_from_str("2025-13-01", "%Y-%m-%d").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
