//! Error handling for the transfer widget
//!
//! Most widget operations are infallible by contract: notifications that do not
//! apply are ignored and preview failures only drop the thumbnail. Errors
//! surface at the edges instead, when loading configuration, decoding click
//! codes coming back from the host view, or registering transfers.
//!
//! ## Error Propagation
//!
//! ```rust
//! use cosmic_connect_transfer::{ClickTarget, Result};
//!
//! fn decode(code: &str) -> Result<ClickTarget> {
//!     let target: ClickTarget = code.parse()?;
//!     Ok(target)
//! }
//!
//! assert!(decode("ftrans.3.btnA").is_ok());
//! assert!(decode("mini.3").is_err());
//! ```

use crate::transfer::TransferIdentity;
use crate::WidgetId;
use thiserror::Error;

/// Result type for transfer widget operations
pub type Result<T> = std::result::Result<T, TransferError>;

/// Errors that can occur while driving transfer widgets
///
/// # Examples
///
/// ```rust
/// use cosmic_connect_transfer::TransferError;
///
/// let error = TransferError::InvalidClickCode("ftrans.x.btnZ".to_string());
/// assert_eq!(error.to_string(), "Invalid click code: ftrans.x.btnZ");
///
/// let error = TransferError::UnknownWidget(7);
/// assert_eq!(error.to_string(), "Unknown transfer widget: 7");
/// ```
#[derive(Error, Debug)]
pub enum TransferError {
    /// I/O error (probe writes, preview files, configuration files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Preview source exceeds the configured size bound
    #[error("Preview source too large: {size} bytes (limit {limit})")]
    PreviewTooLarge {
        /// Size of the source file in bytes
        size: u64,
        /// Configured upper bound in bytes
        limit: u64,
    },

    /// Click code from the host view does not name a transfer control
    #[error("Invalid click code: {0}")]
    InvalidClickCode(String),

    /// No widget is registered under this id
    #[error("Unknown transfer widget: {0}")]
    UnknownWidget(WidgetId),

    /// A live widget is already registered for this transfer identity
    #[error("Transfer already registered: {0}")]
    DuplicateTransfer(TransferIdentity),
}

impl TransferError {
    /// Whether the error came from a malformed value handed in by the host
    /// view rather than from the filesystem or the image pipeline
    pub fn is_host_error(&self) -> bool {
        matches!(
            self,
            TransferError::InvalidClickCode(_)
                | TransferError::UnknownWidget(_)
                | TransferError::DuplicateTransfer(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::TransferDirection;

    #[test]
    fn test_error_display() {
        let error = TransferError::PreviewTooLarge {
            size: 30,
            limit: 20,
        };
        assert_eq!(
            error.to_string(),
            "Preview source too large: 30 bytes (limit 20)"
        );

        let identity = TransferIdentity::new(4, 2, TransferDirection::Receiving);
        let error = TransferError::DuplicateTransfer(identity);
        assert_eq!(
            error.to_string(),
            "Transfer already registered: peer 4 / transfer 2 (receiving)"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: TransferError = io.into();
        assert!(matches!(error, TransferError::Io(_)));
        assert!(!error.is_host_error());
    }

    #[test]
    fn test_host_error_classification() {
        assert!(TransferError::InvalidClickCode("x".to_string()).is_host_error());
        assert!(TransferError::UnknownWidget(1).is_host_error());
        assert!(!TransferError::PreviewTooLarge { size: 2, limit: 1 }.is_host_error());
    }
}
