use thiserror::Error;

/// Errors raised by the byte-access layer (sources, channels and the reader).
///
/// End of data is not an error at this layer: sources report it through
/// `Ok(None)`. Only operations that must obtain a fixed number of bytes
/// (`read_fully`, multi-byte numeric reads) turn it into [`PdfError::UnexpectedEof`].
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Source already closed")]
    SourceClosed,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Mapped region has not been opened")]
    NotOpened,

    #[error("File channel is closed")]
    ChannelClosed,

    #[error("Map failed: {0}")]
    MapFailed(std::io::Error),

    #[error("Unexpected end of data")]
    UnexpectedEof,

    #[error("{0} not found as file or resource")]
    NotFound(String),

    #[error("Unsupported URL: {0}")]
    UnsupportedUrl(String),
}

impl PdfError {
    /// Whether this error reports a failed memory mapping that may be
    /// recovered by falling back to plain positioned reads.
    pub fn is_map_failure(&self) -> bool {
        matches!(self, PdfError::MapFailed(_))
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_pdf_error_display() {
        let error = PdfError::InvalidArgument("-1 is negative".to_string());
        assert_eq!(error.to_string(), "Invalid argument: -1 is negative");
        assert_eq!(PdfError::SourceClosed.to_string(), "Source already closed");
        assert_eq!(
            PdfError::NotFound("missing.pdf".to_string()).to_string(),
            "missing.pdf not found as file or resource"
        );
    }

    #[test]
    fn test_pdf_error_from_io_error() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let pdf_error = PdfError::from(io_error);

        match pdf_error {
            PdfError::Io(ref err) => {
                assert_eq!(err.kind(), ErrorKind::NotFound);
            }
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_map_failure_detection() {
        let mapped = PdfError::MapFailed(IoError::new(ErrorKind::OutOfMemory, "ENOMEM"));
        assert!(mapped.is_map_failure());
        assert!(!PdfError::Io(IoError::other("boom")).is_map_failure());
        assert!(!PdfError::ChannelClosed.is_map_failure());
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PdfError>();
    }
}
