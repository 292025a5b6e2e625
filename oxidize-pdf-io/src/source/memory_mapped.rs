//! Memory-mapped region sources
//!
//! Uses OS-level memory mapping to access a window of a file without
//! reading it into memory. Mappings are read-only and private.

use super::channel::FileChannel;
use super::{clamp_range, RandomAccessSource};
use crate::error::{PdfError, Result};
use std::fs::File;

/// Platform-specific memory mapping implementation
#[cfg(unix)]
mod unix_mmap {
    use super::*;
    use std::os::unix::io::AsRawFd;
    use std::ptr;

    pub struct MmapInner {
        ptr: *mut u8,
        map_len: usize,
        delta: usize,
        len: usize,
    }

    // SAFETY: MmapInner is used in a read-only context
    unsafe impl Send for MmapInner {}
    unsafe impl Sync for MmapInner {}

    fn page_size() -> u64 {
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size <= 0 {
            4096
        } else {
            size as u64
        }
    }

    impl MmapInner {
        pub fn new(file: &File, offset: u64, len: usize) -> Result<Self> {
            let aligned = offset - offset % page_size();
            let delta = (offset - aligned) as usize;
            let map_len = len + delta;

            unsafe {
                let ptr = libc::mmap(
                    ptr::null_mut(),
                    map_len,
                    libc::PROT_READ,
                    libc::MAP_PRIVATE,
                    file.as_raw_fd(),
                    aligned as libc::off_t,
                );

                if ptr == libc::MAP_FAILED {
                    return Err(PdfError::MapFailed(std::io::Error::last_os_error()));
                }

                Ok(Self {
                    ptr: ptr as *mut u8,
                    map_len,
                    delta,
                    len,
                })
            }
        }

        pub fn as_slice(&self) -> &[u8] {
            unsafe { std::slice::from_raw_parts(self.ptr.add(self.delta), self.len) }
        }

        /// Unmaps the region, reporting the OS error if the call fails.
        pub fn unmap(mut self) -> std::io::Result<()> {
            let ptr = std::mem::replace(&mut self.ptr, ptr::null_mut());
            let ret = unsafe { libc::munmap(ptr as *mut libc::c_void, self.map_len) };
            if ret != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        }
    }

    impl Drop for MmapInner {
        fn drop(&mut self) {
            if !self.ptr.is_null() {
                unsafe {
                    libc::munmap(self.ptr as *mut libc::c_void, self.map_len);
                }
            }
        }
    }
}

#[cfg(windows)]
mod windows_mmap {
    use super::*;
    use std::os::windows::io::AsRawHandle;
    use std::ptr;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::memoryapi::{
        CreateFileMappingW, MapViewOfFile, UnmapViewOfFile, FILE_MAP_READ,
    };
    use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
    use winapi::um::winnt::PAGE_READONLY;

    pub struct MmapInner {
        ptr: *mut u8,
        delta: usize,
        len: usize,
        mapping_handle: *mut winapi::ctypes::c_void,
    }

    unsafe impl Send for MmapInner {}
    unsafe impl Sync for MmapInner {}

    fn allocation_granularity() -> u64 {
        unsafe {
            let mut info: SYSTEM_INFO = std::mem::zeroed();
            GetSystemInfo(&mut info);
            info.dwAllocationGranularity as u64
        }
    }

    impl MmapInner {
        pub fn new(file: &File, offset: u64, len: usize) -> Result<Self> {
            let aligned = offset - offset % allocation_granularity();
            let delta = (offset - aligned) as usize;

            unsafe {
                let mapping_handle = CreateFileMappingW(
                    file.as_raw_handle() as *mut _,
                    ptr::null_mut(),
                    PAGE_READONLY,
                    0,
                    0,
                    ptr::null(),
                );

                if mapping_handle.is_null() {
                    return Err(PdfError::MapFailed(std::io::Error::last_os_error()));
                }

                let ptr = MapViewOfFile(
                    mapping_handle,
                    FILE_MAP_READ,
                    (aligned >> 32) as u32,
                    (aligned & 0xFFFF_FFFF) as u32,
                    len + delta,
                );

                if ptr.is_null() {
                    CloseHandle(mapping_handle);
                    return Err(PdfError::MapFailed(std::io::Error::last_os_error()));
                }

                Ok(Self {
                    ptr: ptr as *mut u8,
                    delta,
                    len,
                    mapping_handle,
                })
            }
        }

        pub fn as_slice(&self) -> &[u8] {
            unsafe { std::slice::from_raw_parts(self.ptr.add(self.delta), self.len) }
        }

        pub fn unmap(mut self) -> std::io::Result<()> {
            let ptr = std::mem::replace(&mut self.ptr, ptr::null_mut());
            unsafe {
                let ok = UnmapViewOfFile(ptr as *mut _);
                CloseHandle(self.mapping_handle);
                self.mapping_handle = ptr::null_mut();
                if ok == 0 {
                    return Err(std::io::Error::last_os_error());
                }
            }
            Ok(())
        }
    }

    impl Drop for MmapInner {
        fn drop(&mut self) {
            unsafe {
                if !self.ptr.is_null() {
                    UnmapViewOfFile(self.ptr as *mut _);
                }
                if !self.mapping_handle.is_null() {
                    CloseHandle(self.mapping_handle);
                }
            }
        }
    }
}

// Fallback implementation for unsupported platforms
#[cfg(not(any(unix, windows)))]
mod fallback_mmap {
    use super::*;
    use std::io::{Read, Seek, SeekFrom};

    pub struct MmapInner {
        data: Vec<u8>,
    }

    impl MmapInner {
        pub fn new(file: &File, offset: u64, len: usize) -> Result<Self> {
            let mut data = vec![0u8; len];
            let mut file_clone = file.try_clone()?;
            file_clone.seek(SeekFrom::Start(offset))?;
            file_clone.read_exact(&mut data)?;
            Ok(Self { data })
        }

        pub fn as_slice(&self) -> &[u8] {
            &self.data
        }

        pub fn unmap(self) -> std::io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(not(any(unix, windows)))]
use fallback_mmap::MmapInner;
#[cfg(unix)]
use unix_mmap::MmapInner;
#[cfg(windows)]
use windows_mmap::MmapInner;

/// One read-only memory-mapped region of a [`FileChannel`].
///
/// The mapping is deferred until [`open`](Self::open) is called; reading
/// before that fails with [`PdfError::NotOpened`]. [`close`](RandomAccessSource::close)
/// unmaps the region and a later `open` maps it again.
///
/// A region created with [`new`](Self::new) borrows the channel and leaves it
/// open on close. One created with [`whole_channel`](Self::whole_channel)
/// owns it and closes it together with the mapping.
pub struct MappedRegionSource {
    channel: FileChannel,
    offset: u64,
    length: u64,
    region: Option<MmapInner>,
    owns_channel: bool,
}

impl MappedRegionSource {
    pub fn new(channel: FileChannel, offset: i64, length: i64) -> Result<Self> {
        if offset < 0 {
            return Err(PdfError::InvalidArgument(format!("{offset} is negative")));
        }
        if length <= 0 {
            return Err(PdfError::InvalidArgument(format!(
                "{length} is zero or negative"
            )));
        }
        Ok(Self {
            channel,
            offset: offset as u64,
            length: length as u64,
            region: None,
            owns_channel: false,
        })
    }

    /// Maps the entire channel right away and takes ownership of it.
    pub fn whole_channel(channel: FileChannel) -> Result<Self> {
        let size = channel.size();
        if size == 0 {
            return Err(PdfError::InvalidArgument(
                "File size is 0 bytes".to_string(),
            ));
        }
        let mut source = Self::new(channel, 0, size as i64)?;
        source.owns_channel = true;
        source.open()?;
        Ok(source)
    }

    /// Maps the region. Calling it on an open region is a no-op.
    pub fn open(&mut self) -> Result<()> {
        if self.region.is_some() {
            return Ok(());
        }
        if self.offset + self.length > self.channel.size() {
            return Err(PdfError::InvalidArgument(format!(
                "region {}+{} exceeds file size {}",
                self.offset,
                self.length,
                self.channel.size()
            )));
        }
        let len = usize::try_from(self.length).map_err(|_| {
            PdfError::InvalidArgument(format!("{} bytes cannot be mapped", self.length))
        })?;
        let region = self
            .channel
            .with_file(|file| MmapInner::new(file, self.offset, len))?;
        self.region = Some(region);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.region.is_some()
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn bytes(&self) -> Result<&[u8]> {
        self.region
            .as_ref()
            .map(MmapInner::as_slice)
            .ok_or(PdfError::NotOpened)
    }
}

impl RandomAccessSource for MappedRegionSource {
    fn get(&mut self, offset: u64) -> Result<Option<u8>> {
        let bytes = self.bytes()?;
        if offset >= bytes.len() as u64 {
            return Ok(None);
        }
        Ok(Some(bytes[offset as usize]))
    }

    fn get_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        let bytes = self.bytes()?;
        let Some(count) = clamp_range(offset, buf.len(), bytes.len() as u64) else {
            return Ok(None);
        };
        let start = offset as usize;
        buf[..count].copy_from_slice(&bytes[start..start + count]);
        Ok(Some(count))
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn close(&mut self) -> Result<()> {
        if let Some(region) = self.region.take() {
            if let Err(e) = region.unmap() {
                tracing::warn!(
                    offset = self.offset,
                    length = self.length,
                    "failed to unmap region: {e}"
                );
            }
        }
        if self.owns_channel {
            self.channel.close();
        }
        Ok(())
    }
}
