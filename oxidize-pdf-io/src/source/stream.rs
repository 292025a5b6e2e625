use super::RandomAccessSource;
use crate::error::PdfError;
use std::io::{self, Read, Seek, SeekFrom};

/// Adapts a [`RandomAccessSource`] to [`std::io::Read`] and [`std::io::Seek`].
///
/// Keeps its own cursor; the source itself stays stateless.
pub struct SourceStream<S> {
    source: S,
    position: u64,
}

impl<S: RandomAccessSource> SourceStream<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

fn to_io(error: PdfError) -> io::Error {
    match error {
        PdfError::Io(e) => e,
        other => io::Error::other(other),
    }
}

impl<S: RandomAccessSource> Read for SourceStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.source.get_range(self.position, buf).map_err(to_io)? {
            Some(count) => {
                self.position += count as u64;
                Ok(count)
            }
            None => Ok(0),
        }
    }
}

impl<S: RandomAccessSource> Seek for SourceStream<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.source.length().checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        match target {
            Some(position) => {
                self.position = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ArraySource;

    #[test]
    fn test_read_to_end() {
        let mut stream = SourceStream::new(ArraySource::new(b"stream contents".to_vec()));
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"stream contents");
        assert_eq!(stream.position(), 15);
    }

    #[test]
    fn test_seek_and_read() {
        let mut stream = SourceStream::new(ArraySource::new(b"0123456789".to_vec()));
        assert_eq!(stream.seek(SeekFrom::End(-3)).unwrap(), 7);
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"789");
        assert_eq!(stream.read(&mut buf).unwrap(), 0);

        stream.seek(SeekFrom::Start(2)).unwrap();
        stream.seek(SeekFrom::Current(1)).unwrap();
        let mut byte = [0u8; 1];
        stream.read_exact(&mut byte).unwrap();
        assert_eq!(byte[0], b'3');

        assert!(stream.seek(SeekFrom::Current(-10)).is_err());
    }

    #[test]
    fn test_closed_source_is_an_io_error() {
        let mut source = ArraySource::new(b"abc".to_vec());
        source.close().unwrap();
        let mut stream = SourceStream::new(source);
        let mut buf = [0u8; 2];
        assert!(stream.read(&mut buf).is_err());
    }
}
