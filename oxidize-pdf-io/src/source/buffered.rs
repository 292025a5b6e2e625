use super::RandomAccessSource;
use crate::error::Result;

const MAX_BUFFER: u64 = 4096;

/// Read-ahead cache for single-byte access patterns.
///
/// Single-byte `get` is served from one contiguous window that is refilled
/// on a miss; ranged reads bypass the window and go straight to the wrapped
/// source. Owns the wrapped source.
pub struct BufferedSource<S> {
    source: S,
    buffer: Vec<u8>,
    /// Absolute offsets of the first and last cached byte.
    window: Option<(u64, u64)>,
}

impl<S: RandomAccessSource> BufferedSource<S> {
    pub fn new(source: S) -> Self {
        let size = (source.length() / 4).clamp(1, MAX_BUFFER) as usize;
        Self {
            source,
            buffer: vec![0u8; size],
            window: None,
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }
}

impl<S: RandomAccessSource> RandomAccessSource for BufferedSource<S> {
    fn get(&mut self, position: u64) -> Result<Option<u8>> {
        let start = match self.window {
            Some((start, end)) if position >= start && position <= end => start,
            _ => {
                let count = match self.source.get_range(position, &mut self.buffer)? {
                    Some(count) if count > 0 => count,
                    _ => return Ok(None),
                };
                self.window = Some((position, position + count as u64 - 1));
                position
            }
        };
        Ok(Some(self.buffer[(position - start) as usize]))
    }

    fn get_range(&mut self, position: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        self.source.get_range(position, buf)
    }

    fn length(&self) -> u64 {
        self.source.length()
    }

    fn close(&mut self) -> Result<()> {
        self.window = None;
        self.source.close()
    }
}
