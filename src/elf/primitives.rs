use super::error::ElfError;

/// Index into the section table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct SectionIndex(pub u32);

/// Index into a string table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct StringIndex(pub u32);

/// A run of fixed size entries within the file, e.g. the section header table or
/// .dynsym. Tables are validated against the file length when they are located.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Table {
    /// Used in errors, e.g. "symbol index 12 is out of range".
    pub what: &'static str,
    pub offset: usize,
    pub count: usize,
    pub entry_size: usize,
}

impl Table {
    pub fn new(what: &'static str, offset: usize, count: usize, entry_size: usize) -> Self {
        Table {
            what,
            offset,
            count,
            entry_size,
        }
    }

    /// Number of entries in a section of size bytes with entries of entry_size bytes.
    /// Zero sized entries are treated as an empty table.
    pub fn count_entries(size: u64, entry_size: u64) -> usize {
        if entry_size == 0 {
            0
        } else {
            (size / entry_size) as usize
        }
    }

    /// Offset within the file of the entry at index.
    pub fn entry(&self, index: usize) -> Result<usize, ElfError> {
        if index >= self.count {
            return Err(ElfError::IndexOutOfRange {
                what: self.what,
                index,
                count: self.count,
            });
        }
        Ok(self.offset + index * self.entry_size)
    }

    /// Offset just past the last entry, None on overflow.
    pub fn end(&self) -> Option<usize> {
        self.count
            .checked_mul(self.entry_size)
            .and_then(|n| n.checked_add(self.offset))
    }
}
