//! Stateful cursor over a random-access source
//!
//! [`RandomAccessReader`] adds an absolute position and a single byte of
//! push-back to a [`RandomAccessSource`], plus the fixed-width numeric reads
//! PDF structures need in both byte orders.

use crate::bytes::iso;
use crate::error::{PdfError, Result};
use crate::source::{ArraySource, IndependentSource, RandomAccessSource, ThreadSafeSource};
use std::mem;

enum ReaderSource {
    /// Only this reader sees the source.
    Exclusive(Box<dyn RandomAccessSource>),
    /// Shared with views created from this reader; closing closes it.
    Shared(ThreadSafeSource),
    /// A view of a reader's shared source; closing is a no-op.
    View(IndependentSource<ThreadSafeSource>),
}

impl ReaderSource {
    fn as_source(&mut self) -> &mut dyn RandomAccessSource {
        match self {
            ReaderSource::Exclusive(source) => source.as_mut(),
            ReaderSource::Shared(source) => source,
            ReaderSource::View(source) => source,
        }
    }

    fn as_source_ref(&self) -> &dyn RandomAccessSource {
        match self {
            ReaderSource::Exclusive(source) => source.as_ref(),
            ReaderSource::Shared(source) => source,
            ReaderSource::View(source) => source,
        }
    }
}

/// Reads a source sequentially from an absolute position.
///
/// # Example
///
/// ```rust
/// use oxidize_pdf_io::reader::RandomAccessReader;
/// use oxidize_pdf_io::source::ArraySource;
///
/// # fn main() -> oxidize_pdf_io::Result<()> {
/// let mut reader = RandomAccessReader::new(ArraySource::new(vec![0x12, 0x34, b'x']));
/// assert_eq!(reader.read_u16()?, 0x1234);
///
/// let byte = reader.read()?.unwrap();
/// reader.push_back(byte);
/// assert_eq!(reader.position(), 2);
/// assert_eq!(reader.read()?, Some(b'x'));
/// # Ok(())
/// # }
/// ```
pub struct RandomAccessReader {
    source: ReaderSource,
    position: u64,
    back: Option<u8>,
}

impl RandomAccessReader {
    pub fn new<S: RandomAccessSource + 'static>(source: S) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn RandomAccessSource>) -> Self {
        Self::with_source(ReaderSource::Exclusive(source))
    }

    fn with_source(source: ReaderSource) -> Self {
        Self {
            source,
            position: 0,
            back: None,
        }
    }

    /// Handle to the shared source, wrapping the exclusive one on first use.
    fn shared(&mut self) -> ThreadSafeSource {
        if let ReaderSource::View(view) = &self.source {
            return view.get_ref().clone();
        }
        let placeholder = ReaderSource::Exclusive(Box::new(ArraySource::new(Vec::new())));
        let handle = match mem::replace(&mut self.source, placeholder) {
            ReaderSource::Exclusive(source) => ThreadSafeSource::from_boxed(source),
            ReaderSource::Shared(shared) => shared,
            ReaderSource::View(view) => view.get_ref().clone(),
        };
        self.source = ReaderSource::Shared(handle.clone());
        handle
    }

    /// A source over the same bytes whose `close()` leaves this reader's
    /// source open.
    pub fn create_source_view(&mut self) -> IndependentSource<ThreadSafeSource> {
        IndependentSource::new(self.shared())
    }

    /// A reader over the same bytes with its own position, starting at 0.
    pub fn create_view(&mut self) -> RandomAccessReader {
        Self::with_source(ReaderSource::View(self.create_source_view()))
    }

    /// Arms the push-back slot. A byte already pushed back is replaced.
    pub fn push_back(&mut self, byte: u8) {
        self.back = Some(byte);
    }

    /// Reads the next byte, or `None` at the end of the source.
    pub fn read(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.back.take() {
            return Ok(Some(byte));
        }
        let byte = self.source.as_source().get(self.position)?;
        if byte.is_some() {
            self.position += 1;
        }
        Ok(byte)
    }

    /// Returns the next byte without consuming it.
    pub fn peek(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.back {
            return Ok(Some(byte));
        }
        self.source.as_source().get(self.position)
    }

    /// Reads up to `buf.len()` bytes, starting with a pushed-back byte.
    ///
    /// Returns `None` when nothing at all could be read.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        if buf.is_empty() {
            return Ok(Some(0));
        }
        let mut count = 0;
        if let Some(byte) = self.back.take() {
            buf[0] = byte;
            count = 1;
        }
        if count < buf.len() {
            if let Some(read) = self.source.as_source().get_range(self.position, &mut buf[count..])? {
                count += read;
                self.position += read as u64;
            }
        }
        Ok(if count == 0 { None } else { Some(count) })
    }

    /// Fills `buf` completely or fails with [`PdfError::UnexpectedEof`].
    pub fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read_into(&mut buf[filled..])? {
                Some(count) if count > 0 => filled += count,
                _ => return Err(PdfError::UnexpectedEof),
            }
        }
        Ok(())
    }

    /// Skips up to `n` bytes and returns how many were skipped.
    pub fn skip(&mut self, n: u64) -> Result<u64> {
        if n == 0 {
            return Ok(0);
        }
        let mut remaining = n;
        let mut skipped = 0;
        if self.back.take().is_some() {
            if n == 1 {
                return Ok(1);
            }
            remaining -= 1;
            skipped = 1;
        }
        let start = self.position;
        let target = start.saturating_add(remaining).min(self.length());
        self.seek(target);
        Ok(target.saturating_sub(start) + skipped)
    }

    /// Moves to `position` and discards any pushed-back byte.
    pub fn seek(&mut self, position: u64) {
        self.position = position;
        self.back = None;
    }

    /// Offset of the next byte to be read.
    ///
    /// A byte pushed back at offset 0 leaves the position at 0.
    pub fn position(&self) -> u64 {
        if self.back.is_some() {
            self.position.saturating_sub(1)
        } else {
            self.position
        }
    }

    pub fn length(&self) -> u64 {
        self.source.as_source_ref().length()
    }

    /// Closes the source. Views leave the shared source open.
    pub fn close(&mut self) -> Result<()> {
        self.back = None;
        self.source.as_source().close()
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.read()?.ok_or(PdfError::UnexpectedEof)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        for byte in &mut bytes {
            *byte = self.read_byte()?;
        }
        Ok(bytes)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_byte()? != 0)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_byte()
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16_le(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Reads a UTF-16 code unit. Lone surrogates become U+FFFD.
    pub fn read_char(&mut self) -> Result<char> {
        Ok(utf16_unit(self.read_u16()?))
    }

    pub fn read_char_le(&mut self) -> Result<char> {
        Ok(utf16_unit(self.read_u16_le()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32_le(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64_le(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32_le(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64_le(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Reads one line terminated by CR, LF or CRLF, decoded as ISO-8859-1.
    ///
    /// Returns `None` when already at the end of the source.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = Vec::new();
        let mut terminated = false;
        while let Some(byte) = self.read()? {
            match byte {
                b'\n' => {
                    terminated = true;
                    break;
                }
                b'\r' => {
                    terminated = true;
                    match self.read()? {
                        Some(b'\n') | None => {}
                        Some(other) => self.push_back(other),
                    }
                    break;
                }
                other => line.push(other),
            }
        }
        if line.is_empty() && !terminated {
            return Ok(None);
        }
        Ok(Some(iso::decode(&line)))
    }

    /// Reads up to `len` bytes as ISO-8859-1 text, stopping at the end of
    /// the source.
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let mut bytes = Vec::with_capacity(len);
        while bytes.len() < len {
            match self.read()? {
                Some(byte) => bytes.push(byte),
                None => break,
            }
        }
        Ok(iso::decode(&bytes))
    }
}

fn utf16_unit(unit: u16) -> char {
    char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &[u8]) -> RandomAccessReader {
        RandomAccessReader::new(ArraySource::from(data))
    }

    #[test]
    fn test_read_and_peek() {
        let mut r = reader(b"ab");
        assert_eq!(r.peek().unwrap(), Some(b'a'));
        assert_eq!(r.read().unwrap(), Some(b'a'));
        assert_eq!(r.read().unwrap(), Some(b'b'));
        assert_eq!(r.position(), 2);
        assert_eq!(r.read().unwrap(), None);
        // EOF does not advance
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn test_push_back_at_start() {
        let mut r = reader(b"abc");
        r.push_back(b'x');
        assert_eq!(r.position(), 0);
        assert_eq!(r.read().unwrap(), Some(b'x'));
        assert_eq!(r.position(), 0);
        assert_eq!(r.read().unwrap(), Some(b'a'));
        assert_eq!(r.position(), 1);

        r.seek(0);
        r.push_back(b'y');
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn test_push_back() {
        let mut r = reader(b"xyz");
        let byte = r.read().unwrap().unwrap();
        assert_eq!(r.position(), 1);

        r.push_back(byte);
        assert_eq!(r.position(), 0);
        assert_eq!(r.peek().unwrap(), Some(b'x'));
        assert_eq!(r.read().unwrap(), Some(b'x'));
        assert_eq!(r.position(), 1);
        assert_eq!(r.read().unwrap(), Some(b'y'));

        // Only one slot
        r.push_back(b'1');
        r.push_back(b'2');
        assert_eq!(r.read().unwrap(), Some(b'2'));
        assert_eq!(r.read().unwrap(), Some(b'z'));
    }

    #[test]
    fn test_seek_clears_push_back() {
        let mut r = reader(b"0123");
        r.read().unwrap();
        r.push_back(b'!');
        r.seek(3);
        assert_eq!(r.position(), 3);
        assert_eq!(r.read().unwrap(), Some(b'3'));
    }

    #[test]
    fn test_read_into_drains_push_back() {
        let mut r = reader(b"abcdef");
        r.read().unwrap();
        r.push_back(b'a');

        let mut buf = [0u8; 4];
        assert_eq!(r.read_into(&mut buf).unwrap(), Some(4));
        assert_eq!(&buf, b"abcd");
        assert_eq!(r.position(), 4);

        assert_eq!(r.read_into(&mut buf).unwrap(), Some(2));
        assert_eq!(r.read_into(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_read_fully() {
        let mut r = reader(b"abc");
        let mut buf = [0u8; 2];
        r.read_fully(&mut buf).unwrap();
        assert_eq!(&buf, b"ab");
        assert!(matches!(r.read_fully(&mut buf), Err(PdfError::UnexpectedEof)));
    }

    #[test]
    fn test_skip() {
        let mut r = reader(b"0123456789");
        assert_eq!(r.skip(3).unwrap(), 3);
        assert_eq!(r.position(), 3);

        r.read().unwrap();
        r.push_back(b'3');
        assert_eq!(r.skip(1).unwrap(), 1);
        assert_eq!(r.read().unwrap(), Some(b'4'));

        r.push_back(b'4');
        assert_eq!(r.skip(3).unwrap(), 3);
        assert_eq!(r.read().unwrap(), Some(b'7'));

        assert_eq!(r.skip(100).unwrap(), 2);
        assert_eq!(r.skip(0).unwrap(), 0);
    }

    #[test]
    fn test_numeric_reads() {
        let mut r = reader(&[
            0x12, 0x34, 0x34, 0x12, 0xff, 0xff, 0xff, 0xfe, 0x78, 0x56, 0x34, 0x12,
        ]);
        assert_eq!(r.read_i16().unwrap(), 0x1234);
        assert_eq!(r.read_u16_le().unwrap(), 0x1234);
        assert_eq!(r.read_i32().unwrap(), -2);
        assert_eq!(r.read_u32_le().unwrap(), 0x1234_5678);
        assert!(matches!(r.read_u8(), Err(PdfError::UnexpectedEof)));

        let mut data = Vec::new();
        data.extend_from_slice(&1.5f64.to_be_bytes());
        data.extend_from_slice(&(-2.25f32).to_le_bytes());
        data.extend_from_slice(&(-7i64).to_le_bytes());
        data.extend_from_slice(&[0x00, 0x41, 0xe9, 0x00]);
        let mut r = reader(&data);
        assert_eq!(r.read_f64().unwrap(), 1.5);
        assert_eq!(r.read_f32_le().unwrap(), -2.25);
        assert_eq!(r.read_i64_le().unwrap(), -7);
        assert_eq!(r.read_char().unwrap(), 'A');
        assert_eq!(r.read_char_le().unwrap(), 'é');
    }

    #[test]
    fn test_truncated_numeric_read() {
        let mut r = reader(&[0x00, 0x01, 0x02]);
        assert!(matches!(r.read_i32(), Err(PdfError::UnexpectedEof)));
    }

    #[test]
    fn test_read_line() {
        let mut r = reader(b"first\r\nsecond\rthird\nlast");
        assert_eq!(r.read_line().unwrap().as_deref(), Some("first"));
        assert_eq!(r.read_line().unwrap().as_deref(), Some("second"));
        assert_eq!(r.read_line().unwrap().as_deref(), Some("third"));
        assert_eq!(r.read_line().unwrap().as_deref(), Some("last"));
        assert_eq!(r.read_line().unwrap(), None);
    }

    #[test]
    fn test_read_string() {
        let mut r = reader(&[b'c', 0xe9, b'!']);
        assert_eq!(r.read_string(2).unwrap(), "cé");
        assert_eq!(r.read_string(5).unwrap(), "!");
    }

    #[test]
    fn test_views_share_bytes_and_survive_close() {
        let mut r = reader(b"shared bytes");
        r.seek(7);

        let mut view = r.create_view();
        assert_eq!(view.position(), 0);
        assert_eq!(view.read_string(6).unwrap(), "shared");

        let mut nested = view.create_view();
        nested.seek(7);
        assert_eq!(nested.read_string(5).unwrap(), "bytes");

        view.close().unwrap();
        nested.close().unwrap();
        assert_eq!(r.read_string(5).unwrap(), "bytes");

        r.close().unwrap();
        assert!(nested.read().is_err());
    }

    #[test]
    fn test_promotion_happens_once() {
        let mut r = reader(b"abc");
        let first = r.create_source_view();
        let second = r.create_source_view();
        assert!(first.get_ref().same_source(second.get_ref()));
    }
}
