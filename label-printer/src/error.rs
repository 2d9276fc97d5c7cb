//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Label setup or image data cannot be expressed as a ZPL document
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// Connection refused or otherwise not established
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Socket error after the connection was established
    #[error("Socket error: {0}")]
    Socket(#[from] std::io::Error),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Image could not be decoded for rasterization
    #[error("Image error: {0}")]
    Image(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
