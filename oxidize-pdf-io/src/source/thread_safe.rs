use super::RandomAccessSource;
use crate::error::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Serializes every operation of a source behind one mutex.
///
/// Cloning yields another handle to the same source. `close()` on any handle
/// closes the shared source; wrap a handle in an
/// [`IndependentSource`](super::IndependentSource) to hand out a view that
/// cannot do that.
#[derive(Clone)]
pub struct ThreadSafeSource {
    source: Arc<Mutex<Box<dyn RandomAccessSource>>>,
}

impl ThreadSafeSource {
    pub fn new<S: RandomAccessSource + 'static>(source: S) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn RandomAccessSource>) -> Self {
        Self {
            source: Arc::new(Mutex::new(source)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn RandomAccessSource>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether two handles share the same underlying source.
    pub fn same_source(&self, other: &ThreadSafeSource) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

impl RandomAccessSource for ThreadSafeSource {
    fn get(&mut self, offset: u64) -> Result<Option<u8>> {
        self.lock().get(offset)
    }

    fn get_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        self.lock().get_range(offset, buf)
    }

    fn length(&self) -> u64 {
        self.lock().length()
    }

    fn close(&mut self) -> Result<()> {
        self.lock().close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ArraySource;
    use std::thread;

    #[test]
    fn test_thread_safe_handles_share_source() {
        let source = ThreadSafeSource::new(ArraySource::new(b"abc".to_vec()));
        let mut other = source.clone();
        assert!(source.same_source(&other));
        assert_eq!(other.get(1).unwrap(), Some(b'b'));

        let mut source = source;
        source.close().unwrap();
        assert!(other.get(0).is_err());
    }

    #[test]
    fn test_concurrent_reads() {
        let data: Vec<u8> = (0..=255).collect();
        let source = ThreadSafeSource::new(ArraySource::new(data));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let mut handle = source.clone();
                thread::spawn(move || {
                    for i in 0..256u64 {
                        let offset = (i + t * 64) % 256;
                        assert_eq!(handle.get(offset).unwrap(), Some(offset as u8));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
