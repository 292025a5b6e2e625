use super::RandomAccessSource;
use crate::error::{PdfError, Result};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Positioned reads on an OS file handle.
///
/// The length is captured once at construction and never re-queried. The
/// handle's cursor is shared mutable state, so the source is not meant to be
/// used from several threads without a [`ThreadSafeSource`](super::ThreadSafeSource)
/// around it. Owns the file; `close()` releases it.
pub struct FileSource {
    file: Option<File>,
    length: u64,
    /// Where the handle's cursor currently is, to skip redundant seeks.
    cursor: u64,
}

impl FileSource {
    pub fn new(file: File) -> Result<Self> {
        let length = file.metadata()?.len();
        Ok(Self {
            file: Some(file),
            length,
            // Unknown until the first seek
            cursor: u64::MAX,
        })
    }
}

impl RandomAccessSource for FileSource {
    fn get(&mut self, position: u64) -> Result<Option<u8>> {
        if position >= self.length {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        let count = self.get_range(position, &mut byte)?;
        Ok(count.filter(|&n| n == 1).map(|_| byte[0]))
    }

    fn get_range(&mut self, position: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        if position >= self.length {
            return Ok(None);
        }
        let file = self.file.as_mut().ok_or(PdfError::SourceClosed)?;
        if self.cursor != position {
            file.seek(SeekFrom::Start(position))?;
            self.cursor = position;
        }
        let mut total = 0;
        while total < buf.len() {
            match file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    // The handle's cursor is unknown after a failed read
                    self.cursor = u64::MAX;
                    return Err(e.into());
                }
            }
        }
        self.cursor = position + total as u64;
        if total == 0 && !buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(total))
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn close(&mut self) -> Result<()> {
        self.file = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(data: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(data).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_file_source_reads() {
        let temp_file = temp_with(b"Test data for file source");
        let mut source = FileSource::new(File::open(temp_file.path()).unwrap()).unwrap();

        assert_eq!(source.length(), 25);
        assert_eq!(source.get(0).unwrap(), Some(b'T'));
        assert_eq!(source.get(24).unwrap(), Some(b'e'));
        assert_eq!(source.get(25).unwrap(), None);

        let mut buf = [0u8; 4];
        assert_eq!(source.get_range(5, &mut buf).unwrap(), Some(4));
        assert_eq!(&buf, b"data");
        // Sequential access continues without a seek
        assert_eq!(source.get_range(9, &mut buf).unwrap(), Some(4));
        assert_eq!(&buf, b" for");
        assert_eq!(source.get_range(23, &mut buf).unwrap(), Some(2));
        assert_eq!(&buf[..2], b"ce");
    }

    #[test]
    fn test_file_source_length_is_captured() {
        let mut temp_file = temp_with(b"12345");
        let mut source = FileSource::new(File::open(temp_file.path()).unwrap()).unwrap();

        temp_file.write_all(b"67890").unwrap();
        temp_file.flush().unwrap();

        assert_eq!(source.length(), 5);
        assert_eq!(source.get(7).unwrap(), None);
    }

    #[test]
    fn test_file_source_close() {
        let temp_file = temp_with(b"abc");
        let mut source = FileSource::new(File::open(temp_file.path()).unwrap()).unwrap();
        source.close().unwrap();
        assert!(source.get(0).is_err());
    }
}
