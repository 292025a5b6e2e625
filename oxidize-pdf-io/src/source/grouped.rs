//! Several sources concatenated into one address space

use super::RandomAccessSource;
use crate::error::{PdfError, Result};

/// One sub-source of a [`GroupedSource`] and the absolute range it covers.
pub struct SourceEntry<S> {
    source: S,
    first: u64,
    length: u64,
    index: usize,
}

impl<S: RandomAccessSource> SourceEntry<S> {
    fn new(source: S, first: u64, index: usize) -> Self {
        let length = source.length();
        Self {
            source,
            first,
            length,
            index,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Absolute offset of the first byte of this entry
    pub fn first_byte(&self) -> u64 {
        self.first
    }

    /// Absolute offset one past the last byte of this entry
    pub fn end_byte(&self) -> u64 {
        self.first + self.length
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.first && offset - self.first < self.length
    }

    /// Translates an absolute offset into one local to this entry.
    pub fn local_offset(&self, offset: u64) -> u64 {
        offset - self.first
    }
}

/// Hooks a [`GroupedSource`] calls while dispatching reads.
///
/// The default implementations do nothing and start every lookup from the
/// current entry when the offset lies at or after it.
pub trait SourceLifecycle<S>: Send {
    /// Called right before `entry` starts serving reads.
    fn source_in_use(&mut self, _entry: &mut SourceEntry<S>) -> Result<()> {
        Ok(())
    }

    /// Called when the entry at `index` stops being the current one.
    fn source_released(&mut self, _index: usize, _entries: &mut [SourceEntry<S>]) -> Result<()> {
        Ok(())
    }

    /// Index at which the lookup for `offset` starts scanning.
    fn starting_index(&self, offset: u64, current: Option<&SourceEntry<S>>) -> usize {
        match current {
            Some(entry) if offset >= entry.first => entry.index,
            _ => 0,
        }
    }
}

/// Lifecycle that leaves sub-sources alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sequential;

impl<S> SourceLifecycle<S> for Sequential {}

/// Concatenates an ordered list of sources into one logical address space.
///
/// Offsets are computed once from the sub-source lengths. The last entry
/// that served a read is remembered so that sequential access avoids a
/// scan. The grouped source owns its sub-sources and closes all of them on
/// `close()`.
pub struct GroupedSource<S = Box<dyn RandomAccessSource>, L = Sequential> {
    entries: Vec<SourceEntry<S>>,
    current: Option<usize>,
    size: u64,
    lifecycle: L,
}

impl<S: RandomAccessSource, L: SourceLifecycle<S> + Default> GroupedSource<S, L> {
    pub fn new(sources: Vec<S>) -> Result<Self> {
        Self::with_lifecycle(sources, L::default())
    }
}

impl<S: RandomAccessSource, L: SourceLifecycle<S>> GroupedSource<S, L> {
    pub fn with_lifecycle(sources: Vec<S>, lifecycle: L) -> Result<Self> {
        if sources.is_empty() {
            return Err(PdfError::InvalidArgument(
                "grouped source needs at least one source".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(sources.len());
        let mut size = 0u64;
        for (index, source) in sources.into_iter().enumerate() {
            let entry = SourceEntry::new(source, size, index);
            size += entry.length;
            entries.push(entry);
        }

        Ok(Self {
            entries,
            current: None,
            size,
            lifecycle,
        })
    }

    pub fn entries(&self) -> &[SourceEntry<S>] {
        &self.entries
    }

    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    /// Index of the entry that served the most recent read.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Finds the entry holding `offset`, making it the current one.
    fn entry_for(&mut self, offset: u64) -> Result<Option<usize>> {
        if offset >= self.size {
            return Ok(None);
        }
        if let Some(current) = self.current {
            if self.entries[current].contains(offset) {
                return Ok(Some(current));
            }
            self.lifecycle.source_released(current, &mut self.entries)?;
        }

        let current_entry = self.current.map(|index| &self.entries[index]);
        let start = self
            .lifecycle
            .starting_index(offset, current_entry)
            .min(self.entries.len());
        let found = self.entries[start..]
            .iter()
            .position(|entry| entry.contains(offset))
            .map(|position| start + position);

        // Only a source that made it into use becomes current
        self.current = None;
        if let Some(index) = found {
            self.lifecycle.source_in_use(&mut self.entries[index])?;
            self.current = Some(index);
        }
        Ok(found)
    }
}

impl<S: RandomAccessSource, L: SourceLifecycle<S>> RandomAccessSource for GroupedSource<S, L> {
    fn get(&mut self, offset: u64) -> Result<Option<u8>> {
        let Some(index) = self.entry_for(offset)? else {
            return Ok(None);
        };
        let entry = &mut self.entries[index];
        let local = entry.local_offset(offset);
        entry.source.get(local)
    }

    /// Reads across sub-source boundaries. An empty `buf` at an offset
    /// inside the data returns `Some(0)` rather than `None`.
    fn get_range(&mut self, offset: u64, buf: &mut [u8]) -> Result<Option<usize>> {
        let Some(mut index) = self.entry_for(offset)? else {
            return Ok(None);
        };
        let mut local = self.entries[index].local_offset(offset);
        let mut position = offset;
        let mut filled = 0;

        while filled < buf.len() {
            let entry = &mut self.entries[index];
            if local > entry.length {
                break;
            }
            let count = match entry.source.get_range(local, &mut buf[filled..])? {
                Some(count) if count > 0 => count,
                _ => break,
            };
            filled += count;
            position += count as u64;
            local = 0;
            index = match self.entry_for(position)? {
                Some(next) => next,
                None => break,
            };
        }

        Ok(if filled == 0 && !buf.is_empty() {
            None
        } else {
            Some(filled)
        })
    }

    fn length(&self) -> u64 {
        self.size
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        let mut first_error = None;
        for entry in &mut self.entries {
            if let Err(e) = entry.source.close() {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    tracing::error!(index = entry.index, "failed to close source: {e}");
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
