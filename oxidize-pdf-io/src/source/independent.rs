use super::RandomAccessSource;
use crate::error::Result;

/// Delegates every read to a shared source but never closes it.
///
/// Used to hand a view of a shared source to a consumer whose shutdown must
/// not tear down the resource for everybody else.
#[derive(Clone)]
pub struct IndependentSource<S> {
    source: S,
}

impl<S: RandomAccessSource> IndependentSource<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }
}

impl<S: RandomAccessSource> RandomAccessSource for IndependentSource<S> {
    fn get(&mut self, offset: u64) -> Result<Option<u8>> {
        self.source.get(offset)
    }

    fn get_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        self.source.get_range(offset, buf)
    }

    fn length(&self) -> u64 {
        self.source.length()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
