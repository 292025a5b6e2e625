//! Random-access byte sources
//!
//! A [`RandomAccessSource`] is a byte container addressed by absolute offset.
//! It has no cursor of its own; every access names the offset it wants. The
//! variants in this module back that contract with different storage
//! strategies and compose by plain decoration:
//!
//! - [`ArraySource`]: an in-memory buffer
//! - [`FileSource`]: positioned reads on an OS file handle
//! - [`MappedRegionSource`]: one memory-mapped region of a [`FileChannel`]
//! - [`WindowSource`]: an offset/length view of another source
//! - [`GroupedSource`]: several sources concatenated into one address space
//! - [`PagedSource`]: fixed-size mapped pages with a bounded MRU list
//! - [`BufferedSource`]: read-ahead cache for single-byte access
//! - [`ThreadSafeSource`]: a mutex around any source, cloneable as a handle
//! - [`IndependentSource`]: suppresses `close()` of a shared source
//!
//! [`SourceFactory`] chooses and composes them for a given input.
//!
//! # Example
//!
//! ```rust
//! use oxidize_pdf_io::source::{ArraySource, RandomAccessSource};
//!
//! # fn main() -> oxidize_pdf_io::Result<()> {
//! let mut source = ArraySource::new(b"%PDF-1.7".to_vec());
//! assert_eq!(source.get(1)?, Some(b'P'));
//! assert_eq!(source.get(8)?, None);
//!
//! let mut buf = [0u8; 16];
//! assert_eq!(source.get_range(5, &mut buf)?, Some(3));
//! assert_eq!(&buf[..3], b"1.7");
//! # Ok(())
//! # }
//! ```

use crate::error::Result;

pub mod array;
pub mod buffered;
pub mod channel;
pub mod factory;
pub mod file;
pub mod grouped;
pub mod independent;
pub mod memory_mapped;
pub mod mru;
pub mod paged;
pub mod stream;
pub mod thread_safe;
pub mod window;

pub use array::ArraySource;
pub use buffered::BufferedSource;
pub use channel::FileChannel;
pub use factory::SourceFactory;
pub use file::FileSource;
pub use grouped::{GroupedSource, SourceEntry, SourceLifecycle, Sequential};
pub use independent::IndependentSource;
pub use memory_mapped::MappedRegionSource;
pub use mru::MruList;
pub use paged::{PagedSource, PagingOptions, PagingStats};
pub use stream::SourceStream;
pub use thread_safe::ThreadSafeSource;
pub use window::WindowSource;

/// Uniform random-access contract shared by every byte source.
///
/// Offsets are absolute and unsigned. A source either owns the resource it
/// wraps (closing it releases the resource) or borrows it (closing is a
/// no-op); each implementation documents which.
pub trait RandomAccessSource: Send {
    /// Reads the byte at `offset`, or `None` when `offset >= length()`.
    fn get(&mut self, offset: u64) -> Result<Option<u8>>;

    /// Copies bytes starting at `offset` into `buf`.
    ///
    /// Returns `None` when `offset >= length()`, otherwise the number of
    /// bytes copied, which is smaller than `buf.len()` only at the end of
    /// the data.
    fn get_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<Option<usize>>;

    /// Total number of bytes in the source.
    fn length(&self) -> u64;

    /// Releases the underlying resource.
    fn close(&mut self) -> Result<()>;
}

impl<S: RandomAccessSource + ?Sized> RandomAccessSource for Box<S> {
    fn get(&mut self, offset: u64) -> Result<Option<u8>> {
        (**self).get(offset)
    }

    fn get_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        (**self).get_range(offset, buf)
    }

    fn length(&self) -> u64 {
        (**self).length()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Number of bytes that can be served from a contiguous store of `available`
/// bytes starting at `offset`, or `None` if `offset` is past the end.
pub(crate) fn clamp_range(offset: u64, requested: usize, available: u64) -> Option<usize> {
    if offset >= available {
        return None;
    }
    let remaining = available - offset;
    Some(if (requested as u64) > remaining {
        remaining as usize
    } else {
        requested
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_range() {
        assert_eq!(clamp_range(0, 4, 10), Some(4));
        assert_eq!(clamp_range(8, 4, 10), Some(2));
        assert_eq!(clamp_range(10, 4, 10), None);
        assert_eq!(clamp_range(11, 4, 10), None);
        assert_eq!(clamp_range(3, 0, 10), Some(0));
    }

    #[test]
    fn test_boxed_source_delegates() {
        let mut boxed: Box<dyn RandomAccessSource> = Box::new(ArraySource::new(vec![1, 2, 3]));
        assert_eq!(boxed.length(), 3);
        assert_eq!(boxed.get(2).unwrap(), Some(3));
        boxed.close().unwrap();
        assert!(boxed.get(0).is_err());
    }
}
