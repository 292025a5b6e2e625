//! Fixed-size mapped pages over one large file
//!
//! A [`PagedSource`] splits a [`FileChannel`] into equal pages, each backed by
//! a lazily opened [`MappedRegionSource`]. Only a bounded number of pages stay
//! mapped: pages enter a most-recently-used list when a read moves away from
//! them, and the page pushed off the end of that list is unmapped.

use super::grouped::{GroupedSource, SourceEntry, SourceLifecycle};
use super::{FileChannel, MappedRegionSource, MruList, RandomAccessSource};
use crate::error::{PdfError, Result};

/// Default size of the combined mapped window (64 MiB)
pub const DEFAULT_TOTAL_BUFFER_SIZE: u64 = 1 << 26;
/// Default number of pages mapped at once
pub const DEFAULT_MAX_OPEN_BUFFERS: usize = 16;

/// Paging configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingOptions {
    /// Bytes mapped across all open pages
    pub total_buffer_size: u64,
    /// Maximum number of simultaneously mapped pages
    pub max_open_buffers: usize,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            total_buffer_size: DEFAULT_TOTAL_BUFFER_SIZE,
            max_open_buffers: DEFAULT_MAX_OPEN_BUFFERS,
        }
    }
}

impl PagingOptions {
    pub fn with_total_buffer_size(mut self, size: u64) -> Self {
        self.total_buffer_size = size;
        self
    }

    pub fn with_max_open_buffers(mut self, count: usize) -> Self {
        self.max_open_buffers = count;
        self
    }

    /// Size of every page but possibly the last.
    pub fn page_size(&self) -> u64 {
        (self.total_buffer_size / self.max_open_buffers.max(1) as u64).max(1)
    }
}

/// Counters describing the paging behavior so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingStats {
    /// Number of times a page was mapped
    pub maps: u64,
    /// Number of pages unmapped because the MRU list overflowed
    pub evictions: u64,
    /// Pages currently mapped
    pub open_pages: usize,
}

/// Lifecycle mapping pages on use and unmapping the least recently used.
pub struct MruPaging {
    page_size: u64,
    mru: MruList<usize>,
    stats: PagingStats,
}

impl MruPaging {
    fn new(page_size: u64, max_open: usize) -> Self {
        Self {
            page_size,
            mru: MruList::new(max_open),
            stats: PagingStats::default(),
        }
    }
}

impl SourceLifecycle<MappedRegionSource> for MruPaging {
    fn source_in_use(&mut self, entry: &mut SourceEntry<MappedRegionSource>) -> Result<()> {
        let page = entry.source_mut();
        if !page.is_open() {
            page.open()?;
            self.stats.maps += 1;
            self.stats.open_pages += 1;
        }
        Ok(())
    }

    fn source_released(
        &mut self,
        index: usize,
        entries: &mut [SourceEntry<MappedRegionSource>],
    ) -> Result<()> {
        if let Some(evicted) = self.mru.enqueue(index) {
            let page = entries[evicted].source_mut();
            if page.is_open() {
                page.close()?;
                self.stats.open_pages = self.stats.open_pages.saturating_sub(1);
            }
            self.stats.evictions += 1;
            tracing::debug!(page = evicted, "evicted mapped page");
        }
        Ok(())
    }

    fn starting_index(
        &self,
        offset: u64,
        _current: Option<&SourceEntry<MappedRegionSource>>,
    ) -> usize {
        usize::try_from(offset / self.page_size).unwrap_or(usize::MAX)
    }
}

/// A very large file read through a bounded set of mapped pages.
///
/// Owns the channel; `close()` unmaps every page and closes it.
pub struct PagedSource {
    pages: GroupedSource<MappedRegionSource, MruPaging>,
    channel: FileChannel,
}

impl PagedSource {
    pub fn new(channel: FileChannel) -> Result<Self> {
        Self::with_options(channel, PagingOptions::default())
    }

    pub fn with_options(channel: FileChannel, options: PagingOptions) -> Result<Self> {
        let size = channel.size();
        if size == 0 {
            return Err(PdfError::InvalidArgument(
                "File size is 0 bytes".to_string(),
            ));
        }
        if options.max_open_buffers == 0 {
            return Err(PdfError::InvalidArgument(
                "at least one page must be allowed open".to_string(),
            ));
        }

        let page_size = options.page_size();
        let mut pages = Vec::new();
        let mut offset = 0u64;
        while offset < size {
            let length = page_size.min(size - offset);
            pages.push(MappedRegionSource::new(
                channel.clone(),
                to_i64(offset)?,
                to_i64(length)?,
            )?);
            offset += length;
        }

        let lifecycle = MruPaging::new(page_size, options.max_open_buffers);
        Ok(Self {
            pages: GroupedSource::with_lifecycle(pages, lifecycle)?,
            channel,
        })
    }

    pub fn page_size(&self) -> u64 {
        self.pages.lifecycle().page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.entries().len()
    }

    pub fn stats(&self) -> PagingStats {
        self.pages.lifecycle().stats
    }
}

fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| PdfError::InvalidArgument(format!("{value} is too large")))
}

impl RandomAccessSource for PagedSource {
    fn get(&mut self, offset: u64) -> Result<Option<u8>> {
        self.pages.get(offset)
    }

    fn get_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        self.pages.get_range(offset, buf)
    }

    fn length(&self) -> u64 {
        self.pages.length()
    }

    fn close(&mut self) -> Result<()> {
        let result = self.pages.close();
        self.channel.close();
        result
    }
}
