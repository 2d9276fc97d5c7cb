//! Job error handling
//!
//! - [`JobError`] - every failure a print job can hit, with context
//! - [`ErrorKind`] - the flat classification recorded on a failed job
//!
//! | Kind | Raised by |
//! |------|-----------|
//! | MissingParameter | trigger URL without a usable `img` |
//! | NetworkUnavailable | image GET transport failure |
//! | BadResponse | image GET non-2xx or empty body |
//! | EncodingFailed | ZPL encoder / rasterizer |
//! | ConnectFailed | printer refused or misconfigured |
//! | Timeout | printer connect or response deadline |
//! | SocketError | printer socket error after connect |

use std::fmt;

use label_printer::PrintError;
use serde::Serialize;
use thiserror::Error;

/// Failure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MissingParameter,
    NetworkUnavailable,
    BadResponse,
    EncodingFailed,
    ConnectFailed,
    Timeout,
    SocketError,
}

impl ErrorKind {
    /// Failed while talking to the printer (vs. preparing the label)
    pub fn is_printer_side(self) -> bool {
        matches!(
            self,
            ErrorKind::ConnectFailed | ErrorKind::Timeout | ErrorKind::SocketError
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Bad response: {0}")]
    BadResponse(String),

    #[error(transparent)]
    Print(#[from] PrintError),
}

impl JobError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JobError::MissingParameter(_) => ErrorKind::MissingParameter,
            JobError::NetworkUnavailable(_) => ErrorKind::NetworkUnavailable,
            JobError::BadResponse(_) => ErrorKind::BadResponse,
            JobError::Print(e) => match e {
                PrintError::EncodingFailed(_) | PrintError::Image(_) => ErrorKind::EncodingFailed,
                PrintError::ConnectFailed(_) | PrintError::InvalidConfig(_) => {
                    ErrorKind::ConnectFailed
                }
                PrintError::Timeout(_) => ErrorKind::Timeout,
                PrintError::Socket(_) => ErrorKind::SocketError,
            },
        }
    }
}

pub type JobResult<T> = Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let cases = [
            (JobError::MissingParameter("img".into()), ErrorKind::MissingParameter),
            (JobError::BadResponse("404".into()), ErrorKind::BadResponse),
            (
                PrintError::EncodingFailed("empty".into()).into(),
                ErrorKind::EncodingFailed,
            ),
            (PrintError::Image("png".into()).into(), ErrorKind::EncodingFailed),
            (PrintError::Timeout("x".into()).into(), ErrorKind::Timeout),
            (
                PrintError::Socket(std::io::Error::other("reset")).into(),
                ErrorKind::SocketError,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{}", err);
        }
    }

    #[test]
    fn test_printer_side() {
        assert!(ErrorKind::ConnectFailed.is_printer_side());
        assert!(ErrorKind::Timeout.is_printer_side());
        assert!(!ErrorKind::BadResponse.is_printer_side());
    }
}
