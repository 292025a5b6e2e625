//! PDF Tokenizer Module
//!
//! Turns the bytes of a [`RandomAccessReader`](crate::reader::RandomAccessReader)
//! into the lexical tokens of the PDF grammar (ISO 32000-1 Section 7.2), and
//! locates the structural markers (`%PDF-` header, `startxref`, `%%EOF`)
//! that higher layers need before they can parse objects.

pub mod scan;
pub mod strings;
pub mod tokenizer;

use crate::error::PdfError;

pub use self::strings::decode_string_content;
pub use self::tokenizer::{is_delimiter, is_delimiter_whitespace, is_whitespace, TokenType, Tokenizer};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Source error: {0}")]
    Source(#[from] PdfError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: u64, message: String },

    #[error("Invalid number at position {position}: {value:?}")]
    InvalidNumber { position: u64, value: String },

    #[error("PDF header not found")]
    HeaderNotFound,

    #[error("FDF header not found")]
    FdfHeaderNotFound,

    #[error("PDF startxref not found")]
    StartXrefNotFound,

    #[error("PDF %%EOF marker not found")]
    EofNotFound,
}
