//! Shareable file handle used by the memory-mapped sources

use crate::error::{PdfError, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// A cloneable handle to an open file.
///
/// Every clone refers to the same file. The size is captured when the
/// channel is created. Once [`close`](Self::close) is called on any clone the
/// file is released for all of them; regions mapped before that stay valid
/// until they are unmapped.
#[derive(Clone, Debug)]
pub struct FileChannel {
    inner: Arc<ChannelInner>,
}

#[derive(Debug)]
struct ChannelInner {
    file: RwLock<Option<File>>,
    size: u64,
}

impl FileChannel {
    /// Opens `path` read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file(File::open(path)?)
    }

    /// Opens `path` read-write and takes an exclusive lock on it.
    pub fn open_locked<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file(open_exclusive(path.as_ref())?)
    }

    pub fn from_file(file: File) -> Result<Self> {
        let size = file.metadata()?.len();
        Ok(Self {
            inner: Arc::new(ChannelInner {
                file: RwLock::new(Some(file)),
                size,
            }),
        })
    }

    pub fn size(&self) -> u64 {
        self.inner.size
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .file
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Runs `f` with the open file, failing with [`PdfError::ChannelClosed`]
    /// once the channel has been closed.
    pub(crate) fn with_file<T>(&self, f: impl FnOnce(&File) -> Result<T>) -> Result<T> {
        let guard = self
            .inner
            .file
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(file) => f(file),
            None => Err(PdfError::ChannelClosed),
        }
    }

    /// Detaches the file from the channel, leaving every clone closed.
    pub fn take_file(&self) -> Result<File> {
        self.inner
            .file
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(PdfError::ChannelClosed)
    }

    /// Releases the file. Closing an already closed channel is a no-op.
    pub fn close(&self) {
        drop(
            self.inner
                .file
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
    }
}

/// Opens `path` read-write and takes an exclusive lock on it.
pub(crate) fn open_exclusive(path: &Path) -> Result<File> {
    let file = OpenOptions::new().read(true).write(true).open(path)?;
    lock_exclusive(&file)?;
    Ok(file)
}

/// Acquires an exclusive advisory lock on `file`, blocking until it is granted.
#[cfg(unix)]
pub(crate) fn lock_exclusive(file: &File) -> Result<()> {
    use std::os::unix::io::AsRawFd;

    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX) };
    if ret != 0 {
        return Err(PdfError::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(windows)]
pub(crate) fn lock_exclusive(file: &File) -> Result<()> {
    use std::os::windows::io::AsRawHandle;
    use winapi::um::fileapi::LockFileEx;
    use winapi::um::minwinbase::{LOCKFILE_EXCLUSIVE_LOCK, OVERLAPPED};

    unsafe {
        let mut overlapped: OVERLAPPED = std::mem::zeroed();
        let ok = LockFileEx(
            file.as_raw_handle() as *mut _,
            LOCKFILE_EXCLUSIVE_LOCK,
            0,
            u32::MAX,
            u32::MAX,
            &mut overlapped,
        );
        if ok == 0 {
            return Err(PdfError::Io(std::io::Error::last_os_error()));
        }
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
pub(crate) fn lock_exclusive(_file: &File) -> Result<()> {
    Err(PdfError::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "file locking is not supported on this platform",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_channel_size_and_close() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"channel data").unwrap();
        temp_file.flush().unwrap();

        let channel = FileChannel::open(temp_file.path()).unwrap();
        let clone = channel.clone();
        assert_eq!(channel.size(), 12);
        assert!(clone.is_open());

        channel.close();
        assert!(!clone.is_open());
        assert!(matches!(
            clone.with_file(|_| Ok(())),
            Err(PdfError::ChannelClosed)
        ));
        channel.close();
    }

    #[test]
    fn test_take_file_detaches() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"abc").unwrap();
        temp_file.flush().unwrap();

        let channel = FileChannel::open(temp_file.path()).unwrap();
        let file = channel.take_file().unwrap();
        assert_eq!(file.metadata().unwrap().len(), 3);
        assert!(!channel.is_open());
        assert!(channel.take_file().is_err());
    }

    #[cfg(any(unix, windows))]
    #[test]
    fn test_open_locked() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"locked").unwrap();
        temp_file.flush().unwrap();

        let channel = FileChannel::open_locked(temp_file.path()).unwrap();
        assert_eq!(channel.size(), 6);
    }

    #[test]
    fn test_open_exclusive_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_exclusive(&dir.path().join("missing.pdf"));
        assert!(matches!(result, Err(PdfError::Io(_))));
    }
}
