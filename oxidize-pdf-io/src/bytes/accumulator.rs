use crate::bytes::iso;
use crate::error::{PdfError, Result};

const DEFAULT_CAPACITY: usize = 128;
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Growable byte buffer reused across tokens and number formatting.
///
/// Bytes are either appended at the tail, growing the storage by doubling
/// when it fills up, or prepended from the end of the storage backwards. The
/// two modes are not meant to be mixed on the same contents. Prepending
/// never grows: the caller sizes the accumulator up front.
#[derive(Debug, Clone)]
pub struct ByteAccumulator {
    buffer: Vec<u8>,
    count: usize,
}

impl Default for ByteAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteAccumulator {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an accumulator with `capacity` bytes of storage, or the
    /// default capacity when `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            capacity
        };
        Self {
            buffer: vec![0; capacity],
            count: 0,
        }
    }

    fn ensure_room(&mut self, extra: usize) {
        let needed = self.count + extra;
        if needed > self.buffer.len() {
            let grown = (self.buffer.len() << 1).max(needed);
            self.buffer.resize(grown, 0);
        }
    }

    pub fn append_byte(&mut self, byte: u8) -> &mut Self {
        self.ensure_room(1);
        self.buffer[self.count] = byte;
        self.count += 1;
        self
    }

    pub fn append(&mut self, bytes: &[u8]) -> &mut Self {
        self.ensure_room(bytes.len());
        self.buffer[self.count..self.count + bytes.len()].copy_from_slice(bytes);
        self.count += bytes.len();
        self
    }

    /// Appends `text` encoded as ISO-8859-1.
    pub fn append_str(&mut self, text: &str) -> &mut Self {
        self.append(&iso::encode(text))
    }

    /// Appends the two lowercase hex digits of `byte`.
    pub fn append_hex(&mut self, byte: u8) -> &mut Self {
        self.append_byte(HEX_DIGITS[usize::from(byte >> 4)]);
        self.append_byte(HEX_DIGITS[usize::from(byte & 0x0f)])
    }

    /// Writes `byte` just before the current prepended contents.
    pub fn prepend_byte(&mut self, byte: u8) -> Result<&mut Self> {
        self.prepend(&[byte])
    }

    /// Writes `bytes` just before the current prepended contents.
    pub fn prepend(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        let used = self.count + bytes.len();
        if used > self.buffer.len() {
            return Err(PdfError::InvalidArgument(format!(
                "prepending {} bytes exceeds capacity {}",
                bytes.len(),
                self.buffer.len()
            )));
        }
        let start = self.buffer.len() - used;
        self.buffer[start..start + bytes.len()].copy_from_slice(bytes);
        self.count = used;
        Ok(self)
    }

    /// Appended contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.count]
    }

    /// Prepended contents, which sit at the end of the storage.
    pub fn prepended(&self) -> &[u8] {
        &self.buffer[self.buffer.len() - self.count..]
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_bytes().get(index).copied()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.as_bytes().starts_with(prefix)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Forgets the contents but keeps the storage.
    pub fn reset(&mut self) -> &mut Self {
        self.count = 0;
        self
    }

    /// Numeric value of an ASCII hex digit.
    pub fn hex_value(byte: u8) -> Option<u8> {
        match byte {
            b'0'..=b'9' => Some(byte - b'0'),
            b'A'..=b'F' => Some(byte - b'A' + 10),
            b'a'..=b'f' => Some(byte - b'a' + 10),
            _ => None,
        }
    }
}
