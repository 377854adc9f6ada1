//! Address ranges used to decide whether a buffer lives in a particular memory domain.
//!
//! A backend is handed one of these at construction time (the mapped framebuffer, typically) and
//! keeps it for its whole lifetime. Every request it sees is first tested against it: sources in
//! uncached memory take the chunked staging path, buffers outside a hardware engine's reach are
//! declined outright.

/// An immutable `[begin, end)` range of addresses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MemoryRegion {
    begin: usize,
    end: usize,
}

impl MemoryRegion {
    /// A region containing no addresses. Every residency query against it fails.
    pub const EMPTY: Self = Self { begin: 0, end: 0 };

    /// Creates a region from its bounds.
    ///
    /// Returns [`None`] if `end < begin`.
    #[inline]
    pub const fn new(begin: usize, end: usize) -> Option<Self> {
        if end < begin {
            return None;
        }
        Some(Self { begin, end })
    }

    /// Creates a region covering `len` bytes starting at `base`.
    ///
    /// Returns [`None`] if the range wraps around the address space.
    #[inline]
    pub fn from_raw_parts(base: *const u8, len: usize) -> Option<Self> {
        let begin = base as usize;
        let end = begin.checked_add(len)?;
        Some(Self { begin, end })
    }

    /// Creates a region covering exactly the memory of `slice`.
    #[inline]
    pub fn from_slice(slice: &[u8]) -> Self {
        let begin = slice.as_ptr() as usize;
        Self {
            begin,
            end: begin + slice.len(),
        }
    }

    /// First address inside the region.
    #[inline(always)]
    pub const fn begin(&self) -> usize {
        self.begin
    }

    /// First address past the region.
    #[inline(always)]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Size of the region in bytes.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Whether the region contains no addresses at all.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Residency query: whether `addr` lies in `[begin, end)`.
    #[inline(always)]
    pub fn contains(&self, addr: *const u8) -> bool {
        let addr = addr as usize;
        addr >= self.begin && addr < self.end
    }

    /// Whether the whole of `[start, start + len)` lies inside the region.
    ///
    /// An empty range is contained if its start is a valid position inside or at the end of the
    /// region.
    #[inline]
    pub fn contains_range(&self, start: usize, len: usize) -> bool {
        match start.checked_add(len) {
            Some(end) => start >= self.begin && end <= self.end,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn new_rejects_inverted_bounds() {
        assert_eq!(MemoryRegion::new(10, 5), None);
        assert_eq!(MemoryRegion::new(5, 5), Some(MemoryRegion { begin: 5, end: 5 }));
    }

    #[rstest]
    #[case::before(0x0FFF, false)]
    #[case::first(0x1000, true)]
    #[case::middle(0x1800, true)]
    #[case::last(0x1FFF, true)]
    #[case::end(0x2000, false)]
    fn contains(#[case] addr: usize, #[case] expected: bool) {
        let region = MemoryRegion::new(0x1000, 0x2000).unwrap();
        assert_eq!(region.contains(addr as *const u8), expected);
    }

    #[rstest]
    #[case::whole(0x1000, 0x1000, true)]
    #[case::inside(0x1100, 0x20, true)]
    #[case::runs_past_end(0x1FF0, 0x20, false)]
    #[case::starts_before(0x0FF0, 0x20, false)]
    #[case::empty_at_end(0x2000, 0, true)]
    #[case::wraps(usize::MAX - 4, 16, false)]
    fn contains_range(#[case] start: usize, #[case] len: usize, #[case] expected: bool) {
        let region = MemoryRegion::new(0x1000, 0x2000).unwrap();
        assert_eq!(region.contains_range(start, len), expected);
    }

    #[test]
    fn empty_region_contains_nothing() {
        assert!(MemoryRegion::EMPTY.is_empty());
        assert!(!MemoryRegion::EMPTY.contains(core::ptr::null()));
    }

    #[test]
    fn from_slice_covers_slice() {
        let data = [0u8; 64];
        let region = MemoryRegion::from_slice(&data);
        assert_eq!(region.len(), 64);
        assert!(region.contains(data.as_ptr()));
        assert!(region.contains(data[63..].as_ptr()));
        assert!(!region.contains(data.as_ptr().wrapping_add(64)));
    }

    #[test]
    fn from_raw_parts_rejects_wrapping() {
        assert_eq!(MemoryRegion::from_raw_parts(usize::MAX as *const u8, 2), None);
    }
}
