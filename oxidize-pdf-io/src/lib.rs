//! # oxidize-pdf-io
//!
//! Random-access byte sources and a low-level PDF tokenizer.
//!
//! ## Features
//!
//! - **Uniform byte access**: in-memory buffers, positioned file reads, memory-mapped
//!   regions and paged mappings of very large files behind one [`source::RandomAccessSource`] trait
//! - **Composable sources**: windows, concatenation, read-ahead buffering, locking and
//!   close-suppressing views stack by plain decoration
//! - **Reader**: cursor with one byte of push-back and big/little-endian numeric reads
//! - **Tokenizer**: the PDF lexical grammar, including indirect reference and object
//!   header lookahead and the tolerances real-world files require
//! - **Structural scanning**: header, `startxref` and `%%EOF` location, line
//!   recovery helpers for damaged cross-reference sections
//!
//! ## Quick Start
//!
//! ```rust
//! use oxidize_pdf_io::parser::{TokenType, Tokenizer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = b"%PDF-1.7\n1 0 obj<</Type/Catalog>>endobj\nstartxref\n9\n%%EOF".to_vec();
//! let mut tokenizer = Tokenizer::from_bytes(data);
//!
//! assert!(tokenizer.check_pdf_header()?.starts_with("PDF-1.7"));
//! let startxref = tokenizer.startxref()?;
//! println!("startxref at {startxref}");
//!
//! tokenizer.seek(9);
//! tokenizer.next_valid_token()?;
//! assert_eq!(tokenizer.token_type(), TokenType::Obj);
//! assert_eq!(tokenizer.object_number(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ### Opening files
//!
//! ```rust,no_run
//! use oxidize_pdf_io::parser::Tokenizer;
//! use oxidize_pdf_io::reader::RandomAccessReader;
//! use oxidize_pdf_io::source::SourceFactory;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Small files are mapped whole, large ones in pages
//! let source = SourceFactory::new().create_best_source("document.pdf")?;
//! let mut tokenizer = Tokenizer::new(RandomAccessReader::from_boxed(source));
//! while tokenizer.next_token()? {
//!     println!("{:?} {}", tokenizer.token_type(), tokenizer.string_value());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`source`] - Byte sources and the factory choosing between them
//! - [`reader`] - Cursor over a source
//! - [`bytes`] - Byte accumulator and ISO-8859-1 encoding
//! - [`parser`] - Tokenizer and structural scanning

pub mod bytes;
pub mod error;
pub mod parser;
pub mod reader;
pub mod source;

// Re-export main types
pub use error::{PdfError, Result};
pub use parser::{ParseError, ParseResult, TokenType, Tokenizer};
pub use reader::RandomAccessReader;
pub use source::{RandomAccessSource, SourceFactory};

/// Current version of oxidize-pdf-io
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_end_to_end_tokens() {
        let data = b"%PDF-1.7\n1 0 obj<</Type/Catalog>>endobj\nstartxref\n9\n%%EOF";
        let mut tokenizer = Tokenizer::from_bytes(&data[..]);

        assert!(tokenizer.check_pdf_header().unwrap().starts_with("PDF-1.7"));
        assert_eq!(tokenizer.startxref().unwrap(), 40);

        tokenizer.seek(9);
        let mut seen = Vec::new();
        let mut names = Vec::new();
        loop {
            tokenizer.next_valid_token().unwrap();
            seen.push(tokenizer.token_type());
            match tokenizer.token_type() {
                TokenType::Obj => assert_eq!(tokenizer.object_number(), 1),
                TokenType::Name => names.push(tokenizer.string_value()),
                TokenType::EndObj | TokenType::EndOfFile => break,
                _ => {}
            }
        }

        assert_eq!(
            seen,
            vec![
                TokenType::Obj,
                TokenType::StartDict,
                TokenType::Name,
                TokenType::Name,
                TokenType::EndDict,
                TokenType::EndObj,
            ]
        );
        assert_eq!(names, vec!["Type", "Catalog"]);
        assert_eq!(tokenizer.generation_number(), 0);
    }
}
