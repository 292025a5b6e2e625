//! Structural scanning
//!
//! Locating the file header, the last `startxref` and the next `%%EOF`
//! without tokenizing, plus the line helpers used to rebuild a damaged
//! cross-reference section.

use super::tokenizer::{is_whitespace_with, TokenType, Tokenizer, OBJ};
use super::{ParseError, ParseResult};
use crate::bytes::{iso, ByteAccumulator};

const HEADER_WINDOW: usize = 1024;
const STARTXREF_WINDOW: usize = 1024;
const EOF_WINDOW: usize = 128;

const PDF_HEADER: &[u8] = b"%PDF-";
const FDF_HEADER: &[u8] = b"%FDF-";
const STARTXREF: &[u8] = b"startxref";
const EOF_MARKER: &[u8] = b"%%EOF";
const TRAILER: &[u8] = b"trailer";

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

/// Whether `line` starts with the `trailer` keyword.
pub fn check_trailer(line: &ByteAccumulator) -> bool {
    line.starts_with(TRAILER)
}

impl Tokenizer {
    /// Reads up to `len` bytes from the current position.
    fn read_window(&mut self, len: usize) -> ParseResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(len);
        while bytes.len() < len {
            match self.reader().read()? {
                Some(byte) => bytes.push(byte),
                None => break,
            }
        }
        Ok(bytes)
    }

    /// Offset of the `%PDF-` (or `%FDF-`) marker within the first 1024
    /// bytes of the source.
    pub fn header_offset(&mut self) -> ParseResult<u64> {
        self.seek(0);
        let window = self.read_window(HEADER_WINDOW)?;
        find(&window, PDF_HEADER)
            .or_else(|| find(&window, FDF_HEADER))
            .map(|idx| idx as u64)
            .ok_or(ParseError::HeaderNotFound)
    }

    /// Returns the header version text, e.g. `PDF-1.7`.
    pub fn check_pdf_header(&mut self) -> ParseResult<String> {
        self.seek(0);
        let window = self.read_window(HEADER_WINDOW)?;
        let idx = find(&window, PDF_HEADER).ok_or(ParseError::HeaderNotFound)?;
        let end = (idx + 8).min(window.len());
        Ok(iso::decode(&window[idx + 1..end]))
    }

    /// Fails unless the source starts with `%FDF-`.
    pub fn check_fdf_header(&mut self) -> ParseResult<()> {
        self.seek(0);
        let window = self.read_window(HEADER_WINDOW)?;
        match find(&window, FDF_HEADER) {
            Some(0) => Ok(()),
            _ => Err(ParseError::FdfHeaderNotFound),
        }
    }

    /// Offset of the last `startxref` keyword.
    ///
    /// Scans backwards from the end in 1024-byte windows that overlap by
    /// the keyword length.
    pub fn startxref(&mut self) -> ParseResult<u64> {
        let step = (STARTXREF_WINDOW - STARTXREF.len()) as u64;
        let mut pos = self
            .length()
            .saturating_sub(STARTXREF_WINDOW as u64)
            .max(1);
        loop {
            self.seek(pos);
            let window = self.read_window(STARTXREF_WINDOW)?;
            if let Some(idx) = rfind(&window, STARTXREF) {
                return Ok(pos + idx as u64);
            }
            if pos <= 1 {
                return Err(ParseError::StartXrefNotFound);
            }
            pos = pos.saturating_sub(step).max(1);
        }
    }

    /// Position right after the next `%%EOF` marker and any end-of-line
    /// bytes (at most four) that follow it. The tokenizer is left there.
    pub fn next_eof(&mut self) -> ParseResult<u64> {
        loop {
            let start = self.position();
            let window = self.read_window(EOF_WINDOW)?;
            if let Some(idx) = find(&window, EOF_MARKER) {
                let marker_end = start + (idx + EOF_MARKER.len()) as u64;
                self.seek(marker_end);
                let trailing = self.read_window(4)?;
                let eol = trailing
                    .iter()
                    .take_while(|&&b| b == b'\r' || b == b'\n')
                    .count();
                let end = marker_end + eol as u64;
                self.seek(end);
                return Ok(end);
            }
            if window.len() <= EOF_MARKER.len() - 1 {
                return Err(ParseError::EofNotFound);
            }
            // Keep a marker split across windows findable
            let back = self.position().saturating_sub(EOF_MARKER.len() as u64 - 1);
            self.seek(back);
        }
    }

    /// Reads one line into `buffer`, collapsing runs of spaces and tabs.
    ///
    /// `buffer` is reset first, so its previous contents never count
    /// against the capacity.
    ///
    /// Leading whitespace, blank lines included, is skipped. The line ends
    /// at CR, LF, CRLF or the end of the data. At most `buffer.capacity()`
    /// bytes are kept; the rest of an overlong line is consumed and
    /// dropped. Returns `false` only when the data ended before any byte
    /// was kept.
    pub fn read_line_segment(
        &mut self,
        buffer: &mut ByteAccumulator,
        null_is_whitespace: bool,
    ) -> ParseResult<bool> {
        buffer.reset();
        let mut c = loop {
            match self.read()? {
                Some(byte) if is_whitespace_with(byte, null_is_whitespace) => continue,
                other => break other,
            }
        };

        let mut previous_was_whitespace = false;
        let mut eol = false;
        while !eol {
            match c {
                None | Some(b'\n') => eol = true,
                Some(b'\r') => {
                    eol = true;
                    self.skip_lf_after_cr()?;
                }
                Some(byte @ (b'\t' | 0x0c | b' ')) => {
                    if !previous_was_whitespace {
                        previous_was_whitespace = true;
                        buffer.append_byte(byte);
                    }
                }
                Some(byte) => {
                    previous_was_whitespace = false;
                    buffer.append_byte(byte);
                }
            }
            if eol || buffer.len() == buffer.capacity() {
                eol = true;
            } else {
                c = self.read()?;
            }
        }

        if buffer.len() == buffer.capacity() {
            loop {
                c = self.read()?;
                match c {
                    None | Some(b'\n') => break,
                    Some(b'\r') => {
                        self.skip_lf_after_cr()?;
                        break;
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(!(c.is_none() && buffer.is_empty()))
    }

    fn skip_lf_after_cr(&mut self) -> ParseResult<()> {
        let current = self.position();
        if self.read()? != Some(b'\n') {
            self.seek(current);
        }
        Ok(())
    }

    /// Object and generation numbers if this tokenizer's data, read from
    /// the start, is an object header `N G obj`.
    pub fn check_object_start(&mut self) -> Option<(i32, i32)> {
        self.seek(0);
        let number = self.next_number()?;
        let generation = self.next_number()?;
        match self.next_token() {
            Ok(true) if self.token_value_equals(OBJ) => Some((number, generation)),
            _ => None,
        }
    }

    fn next_number(&mut self) -> Option<i32> {
        match self.next_token() {
            Ok(true) if self.token_type() == TokenType::Number => self.int_value().ok(),
            _ => None,
        }
    }

    /// Tokenizes `line` in isolation and checks it is an object header.
    pub fn object_header(line: &[u8]) -> Option<(i32, i32)> {
        Tokenizer::from_bytes(line).check_object_start()
    }
}
