//! Chooses and composes byte sources for a given input
//!
//! # Example
//!
//! ```rust,no_run
//! use oxidize_pdf_io::source::{RandomAccessSource, SourceFactory};
//!
//! # fn main() -> oxidize_pdf_io::Result<()> {
//! let factory = SourceFactory::new()
//!     .with_exclusive_lock(true)
//!     .with_paging_threshold(16 * 1024 * 1024);
//!
//! let mut source = factory.create_best_source("large_document.pdf")?;
//! println!("{} bytes, first byte {:?}", source.length(), source.get(0)?);
//! source.close()?;
//! # Ok(())
//! # }
//! ```

use super::channel::open_exclusive;
use super::{
    ArraySource, BufferedSource, FileChannel, FileSource, GroupedSource, MappedRegionSource,
    PagedSource, PagingOptions, RandomAccessSource, WindowSource,
};
use crate::error::{PdfError, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Files up to this size are mapped as a single region (64 MiB)
pub const DEFAULT_PAGING_THRESHOLD: u64 = 1 << 26;

const URL_PREFIXES: [&str; 6] = ["file:/", "http://", "https://", "jar:", "wsjar:", "vfszip:"];

static FORCE_READ_DEFAULT: AtomicBool = AtomicBool::new(false);

/// Builder-style options selecting how sources are constructed.
#[derive(Debug, Clone)]
pub struct SourceFactory {
    /// Read the whole resource into memory at construction
    force_read: bool,
    /// Never attempt memory mapping
    plain_random_access: bool,
    /// Acquire an exclusive OS lock on opened files
    exclusive_lock: bool,
    /// Largest file mapped as one region; bigger files are paged
    paging_threshold: u64,
    paging: PagingOptions,
    /// Directories searched for names that are neither files nor URLs
    resource_roots: Vec<PathBuf>,
}

impl Default for SourceFactory {
    fn default() -> Self {
        Self {
            force_read: Self::force_read_default(),
            plain_random_access: false,
            exclusive_lock: false,
            paging_threshold: DEFAULT_PAGING_THRESHOLD,
            paging: PagingOptions::default(),
            resource_roots: Vec::new(),
        }
    }
}

impl SourceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the process-wide default for `force_read` picked up by factories
    /// created afterwards.
    pub fn set_force_read_default(force_read: bool) {
        FORCE_READ_DEFAULT.store(force_read, Ordering::Relaxed);
    }

    pub fn force_read_default() -> bool {
        FORCE_READ_DEFAULT.load(Ordering::Relaxed)
    }

    pub fn with_force_read(mut self, force_read: bool) -> Self {
        self.force_read = force_read;
        self
    }

    pub fn with_plain_random_access(mut self, plain: bool) -> Self {
        self.plain_random_access = plain;
        self
    }

    pub fn with_exclusive_lock(mut self, lock: bool) -> Self {
        self.exclusive_lock = lock;
        self
    }

    pub fn with_paging_threshold(mut self, threshold: u64) -> Self {
        self.paging_threshold = threshold;
        self
    }

    pub fn with_paging(mut self, paging: PagingOptions) -> Self {
        self.paging = paging;
        self
    }

    pub fn with_resource_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.resource_roots.push(root.into());
        self
    }

    /// Wraps an in-memory buffer.
    pub fn create_source_bytes(&self, data: Vec<u8>) -> Box<dyn RandomAccessSource> {
        Box::new(ArraySource::new(data))
    }

    /// Reads `reader` to the end and serves the bytes from memory.
    pub fn create_source_stream<R: Read>(&self, mut reader: R) -> Result<Box<dyn RandomAccessSource>> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(self.create_source_bytes(data))
    }

    /// Fetches a URL fully into memory.
    ///
    /// `file:` URLs are read from disk. `http://` and `https://` need the
    /// `remote` feature; every other scheme is rejected.
    pub fn create_source_url(&self, url: &str) -> Result<Box<dyn RandomAccessSource>> {
        if let Some(rest) = url.strip_prefix("file:") {
            let path = match rest.strip_prefix("//") {
                Some(local) if local.starts_with('/') => local,
                _ => rest,
            };
            tracing::debug!(url, "reading file URL into memory");
            return Ok(self.create_source_bytes(fs::read(path)?));
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_remote(url);
        }
        Err(PdfError::UnsupportedUrl(url.to_string()))
    }

    #[cfg(feature = "remote")]
    fn fetch_remote(&self, url: &str) -> Result<Box<dyn RandomAccessSource>> {
        tracing::debug!(url, "fetching remote resource into memory");
        let response = reqwest::blocking::get(url)
            .and_then(|response| response.error_for_status())
            .map_err(|e| PdfError::Io(std::io::Error::other(e)))?;
        let bytes = response
            .bytes()
            .map_err(|e| PdfError::Io(std::io::Error::other(e)))?;
        Ok(self.create_source_bytes(bytes.to_vec()))
    }

    #[cfg(not(feature = "remote"))]
    fn fetch_remote(&self, url: &str) -> Result<Box<dyn RandomAccessSource>> {
        Err(PdfError::UnsupportedUrl(url.to_string()))
    }

    /// Picks the most suitable source for a file name.
    ///
    /// Names that are not files on disk are treated as URLs when they look
    /// like one and as bundled resources otherwise; both are read fully into
    /// memory. Existing files are mapped unless the factory says otherwise.
    pub fn create_best_source<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn RandomAccessSource>> {
        let path = path.as_ref();
        if !path.is_file() {
            let name = path.to_string_lossy();
            if URL_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) {
                return self.create_source_url(&name);
            }
            return self.create_source_resource(&name);
        }

        if self.force_read {
            tracing::debug!(path = %path.display(), "reading file into memory");
            return Ok(self.create_source_bytes(fs::read(path)?));
        }

        let file = self.open_file(path)?;
        if self.plain_random_access {
            tracing::debug!(path = %path.display(), "using positioned file reads");
            return Ok(Box::new(FileSource::new(file)?));
        }

        let channel = FileChannel::from_file(file)?;
        if channel.size() == 0 {
            return Ok(Box::new(FileSource::new(channel.take_file()?)?));
        }
        match self.best_source(channel.clone()) {
            Ok(source) => Ok(source),
            Err(e) if e.is_map_failure() => {
                tracing::debug!(path = %path.display(), "mapping failed, using positioned file reads: {e}");
                Ok(Box::new(FileSource::new(channel.take_file()?)?))
            }
            Err(e) => {
                channel.close();
                Err(e)
            }
        }
    }

    fn open_file(&self, path: &Path) -> Result<File> {
        if !self.exclusive_lock {
            return Ok(File::open(path)?);
        }
        open_exclusive(path)
    }

    fn create_source_resource(&self, name: &str) -> Result<Box<dyn RandomAccessSource>> {
        let found = self
            .resource_roots
            .iter()
            .map(|root| root.join(name))
            .find(|candidate| candidate.is_file());
        match found {
            Some(path) => {
                tracing::debug!(resource = name, path = %path.display(), "reading resource into memory");
                Ok(self.create_source_bytes(fs::read(path)?))
            }
            None => Err(PdfError::NotFound(name.to_string())),
        }
    }

    /// Maps a channel whole when it is small enough, otherwise in pages.
    /// Either way single-byte reads go through a [`BufferedSource`].
    pub fn best_source(&self, channel: FileChannel) -> Result<Box<dyn RandomAccessSource>> {
        let size = channel.size();
        if size <= self.paging_threshold {
            tracing::debug!(size, "mapping file as a single region");
            let region = MappedRegionSource::whole_channel(channel)?;
            return Ok(Box::new(BufferedSource::new(region)));
        }
        tracing::debug!(
            size,
            page_size = self.paging.page_size(),
            max_open = self.paging.max_open_buffers,
            "mapping file in pages"
        );
        let paged = PagedSource::with_options(channel, self.paging)?;
        Ok(Box::new(BufferedSource::new(paged)))
    }

    /// Composes the half-open `(start, end)` ranges of `source` into one
    /// contiguous source. Every window gets its own handle to `source`, so
    /// pass a cheaply cloneable shared handle such as a
    /// [`ThreadSafeSource`](super::ThreadSafeSource).
    pub fn create_ranged<S>(source: S, ranges: &[(u64, u64)]) -> Result<GroupedSource<WindowSource<S>>>
    where
        S: RandomAccessSource + Clone,
    {
        let mut windows = Vec::with_capacity(ranges.len());
        for &(start, end) in ranges {
            if end < start {
                return Err(PdfError::InvalidArgument(format!(
                    "range {start}..{end} ends before it starts"
                )));
            }
            windows.push(WindowSource::new(source.clone(), start, end - start));
        }
        GroupedSource::new(windows)
    }
}
