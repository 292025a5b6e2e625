use super::{clamp_range, RandomAccessSource};
use crate::error::Result;

/// An offset/length view of a parent source.
///
/// The window does not own its parent: `close()` leaves the parent
/// untouched. Hand it a shared handle (a [`ThreadSafeSource`](super::ThreadSafeSource)
/// clone, for instance) when several windows look at the same parent.
pub struct WindowSource<S> {
    source: S,
    offset: u64,
    length: u64,
}

impl<S: RandomAccessSource> WindowSource<S> {
    pub fn new(source: S, offset: u64, length: u64) -> Self {
        Self {
            source,
            offset,
            length,
        }
    }

    /// View from `offset` to the end of the parent. The length is computed
    /// once, here; later growth of the parent is not reflected.
    pub fn from_offset(source: S, offset: u64) -> Self {
        let length = source.length().saturating_sub(offset);
        Self::new(source, offset, length)
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: RandomAccessSource> RandomAccessSource for WindowSource<S> {
    fn get(&mut self, position: u64) -> Result<Option<u8>> {
        if position >= self.length {
            return Ok(None);
        }
        self.source.get(self.offset + position)
    }

    fn get_range(&mut self, position: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        let Some(count) = clamp_range(position, buf.len(), self.length) else {
            return Ok(None);
        };
        self.source.get_range(self.offset + position, &mut buf[..count])
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ArraySource, ThreadSafeSource};

    #[test]
    fn test_window_translates_offsets() {
        let mut window = WindowSource::new(ArraySource::new(b"0123456789".to_vec()), 3, 4);
        assert_eq!(window.length(), 4);
        assert_eq!(window.get(0).unwrap(), Some(b'3'));
        assert_eq!(window.get(3).unwrap(), Some(b'6'));
        assert_eq!(window.get(4).unwrap(), None);

        let mut buf = [0u8; 10];
        assert_eq!(window.get_range(1, &mut buf).unwrap(), Some(3));
        assert_eq!(&buf[..3], b"456");
        assert_eq!(window.get_range(4, &mut buf).unwrap(), None);
    }

    #[test]
    fn test_window_from_offset_is_fixed_at_construction() {
        let window = WindowSource::from_offset(ArraySource::new(b"abcdef".to_vec()), 2);
        assert_eq!(window.length(), 4);
    }

    #[test]
    fn test_window_close_leaves_parent_open() {
        let parent = ThreadSafeSource::new(ArraySource::new(b"shared".to_vec()));
        let mut window = WindowSource::new(parent.clone(), 0, 3);
        window.close().unwrap();

        let mut parent = parent;
        assert_eq!(parent.get(5).unwrap(), Some(b'd'));
    }
}
