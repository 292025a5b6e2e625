//! In-memory byte source

use super::{clamp_range, RandomAccessSource};
use crate::error::{PdfError, Result};

/// A source backed by a byte buffer captured at construction.
///
/// Owns its buffer; `close()` drops it and any later access fails with
/// [`PdfError::SourceClosed`]. The length stays the one captured at
/// construction.
#[derive(Debug, Clone)]
pub struct ArraySource {
    data: Option<Vec<u8>>,
    len: u64,
}

impl ArraySource {
    pub fn new(data: Vec<u8>) -> Self {
        let len = data.len() as u64;
        Self {
            data: Some(data),
            len,
        }
    }

    fn data(&self) -> Result<&[u8]> {
        self.data.as_deref().ok_or(PdfError::SourceClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.data.is_none()
    }
}

impl From<Vec<u8>> for ArraySource {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for ArraySource {
    fn from(data: &[u8]) -> Self {
        Self::new(data.to_vec())
    }
}

impl RandomAccessSource for ArraySource {
    fn get(&mut self, offset: u64) -> Result<Option<u8>> {
        let data = self.data()?;
        if offset >= data.len() as u64 {
            return Ok(None);
        }
        Ok(Some(data[offset as usize]))
    }

    fn get_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        let data = self.data()?;
        let Some(count) = clamp_range(offset, buf.len(), data.len() as u64) else {
            return Ok(None);
        };
        let start = offset as usize;
        buf[..count].copy_from_slice(&data[start..start + count]);
        Ok(Some(count))
    }

    fn length(&self) -> u64 {
        self.len
    }

    fn close(&mut self) -> Result<()> {
        self.data = None;
        Ok(())
    }
}
