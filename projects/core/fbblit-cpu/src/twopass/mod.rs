//! # Chunked Copies Out of Uncached Memory
//!
//! Reading uncached memory (a mapped framebuffer, typically) at small or unaligned granularity is
//! dramatically slower than reading it in aligned bursts. This module implements `memmove` for
//! such sources by staging every transfer through a small cached buffer:
//!
//! ```text
//!             aligned fetch (F)                   write back (W)
//! src - shift ─────────────────> staging ─────────────────────────> dst
//!             chunk + 32 bytes    [shift..shift + chunk]            chunk bytes
//! ```
//!
//! The chunk size is a multiple of the fetch alignment, so `shift = src % alignment` is the same
//! for every chunk of a transfer.
//!
//! ## Over-read
//!
//! When `shift != 0`, each fetch reads up to one alignment unit past the bytes written back. The
//! exact window is reported by [`fetch_footprint`]; it is the caller's job to ensure it is
//! readable. Nothing outside `[dst, dst + size)` is ever written.
//!
//! ## Direction
//!
//! If `src > dst` the chunks are processed front to back, otherwise back to front, starting with
//! the partial chunk at the end. Each chunk is fully staged before being written, so overlapping
//! ranges behave like `memmove`.

use fbblit_common::allocate::{AllocateError, ScratchBuffer};
use fbblit_common::primitive::{AlignedBlockFetch, CopyPrimitive, NonOverfetchingCopy};
use likely_stable::unlikely;

/// Number of bytes written back per chunk.
pub const SCRATCH_CHUNK_SIZE: usize = 2048;

/// Alignment of every fetch from the source.
pub const FETCH_ALIGNMENT: usize = 32;

/// Allocates a staging buffer sized for [`SCRATCH_CHUNK_SIZE`] chunks at [`FETCH_ALIGNMENT`].
#[inline]
pub fn allocate_staging() -> Result<ScratchBuffer, AllocateError> {
    ScratchBuffer::new(SCRATCH_CHUNK_SIZE, FETCH_ALIGNMENT)
}

/// The address window a transfer of `size` bytes from `src` reads from, as `(start, len)`.
///
/// The window starts at `src` rounded down to [`FETCH_ALIGNMENT`] and, when `src` is not
/// aligned, ends one alignment unit past `src + size` minus the misalignment.
#[inline]
pub fn fetch_footprint(src: *const u8, size: usize) -> (usize, usize) {
    let addr = src as usize;
    if size == 0 {
        return (addr, 0);
    }

    let shift = addr & (FETCH_ALIGNMENT - 1);
    let start = addr - shift;
    if shift == 0 {
        (start, size)
    } else {
        (start, size.saturating_add(FETCH_ALIGNMENT))
    }
}

/// `memmove` for a source in uncached memory, with the default primitives: volatile aligned
/// bursts to fetch, the platform `memcpy` to write back.
///
/// # Safety
///
/// Same as [`twopass_memmove`].
#[inline]
pub unsafe fn uncached_memmove(
    dst: *mut u8,
    src: *const u8,
    size: usize,
    staging: &mut ScratchBuffer,
) {
    twopass_memmove::<AlignedBlockFetch, NonOverfetchingCopy>(dst, src, size, staging)
}

/// Copies `size` bytes from `src` to `dst` through `staging`, with `memmove` semantics.
///
/// # Type Parameters
///
/// * `F` - Primitive used to fetch from the source. Called with an aligned source and the
///   staging window as destination.
/// * `W` - Primitive used to write staged bytes to the destination.
///
/// # Safety
///
/// - The whole [`fetch_footprint`] of `(src, size)`, plus `F::OVERFETCH` bytes past it, must be
///   valid for reads
/// - `dst` must be valid for writes of `size` bytes
/// - `staging.chunk_size()` must be a non-zero multiple of `staging.alignment()`
/// - `dst` and `src` may overlap; `staging` must not overlap either
pub unsafe fn twopass_memmove<F: CopyPrimitive, W: CopyPrimitive>(
    dst: *mut u8,
    src: *const u8,
    size: usize,
    staging: &mut ScratchBuffer,
) {
    if unlikely(size == 0) {
        return;
    }

    let chunk = staging.chunk_size();
    let alignment = staging.alignment();
    debug_assert!(chunk != 0 && chunk % alignment == 0);

    let shift = src as usize & (alignment - 1);
    let extra = if shift != 0 { alignment } else { 0 };
    let buffer = staging.as_mut_ptr();

    let step = |offset: usize, len: usize| {
        F::copy(buffer, src.add(offset).sub(shift), len + extra);
        W::copy(dst.add(offset), buffer.add(shift), len);
    };

    let remainder = size % chunk;
    let full = size - remainder;

    if src as usize > dst as usize {
        let mut offset = 0;
        while offset < full {
            step(offset, chunk);
            offset += chunk;
        }
        if remainder != 0 {
            step(full, remainder);
        }
    } else {
        if remainder != 0 {
            step(full, remainder);
        }
        let mut offset = full;
        while offset != 0 {
            offset -= chunk;
            step(offset, chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    const PAD: usize = 64;
    const SENTINEL: u8 = 0xCC;

    /// A 32-byte aligned buffer with readable padding on both sides of `len` usable bytes.
    struct Arena {
        storage: Vec<u8>,
        start: usize,
        len: usize,
    }

    impl Arena {
        fn new(len: usize) -> Self {
            let storage = vec![SENTINEL; len + PAD * 2 + 32];
            let start = storage.as_ptr().align_offset(32) + PAD;
            Self {
                storage,
                start,
                len,
            }
        }

        fn with_pattern(len: usize) -> Self {
            let mut arena = Self::new(len);
            for (x, byte) in arena.bytes_mut().iter_mut().enumerate() {
                *byte = (x * 13 + 7) as u8;
            }
            arena
        }

        fn bytes(&self) -> &[u8] {
            &self.storage[self.start..self.start + self.len]
        }

        fn bytes_mut(&mut self) -> &mut [u8] {
            &mut self.storage[self.start..self.start + self.len]
        }

        fn ptr(&mut self, offset: usize) -> *mut u8 {
            unsafe { self.storage.as_mut_ptr().add(self.start + offset) }
        }

        fn padding_untouched(&self) -> bool {
            self.storage[..self.start].iter().all(|&b| b == SENTINEL)
                && self.storage[self.start + self.len..]
                    .iter()
                    .all(|&b| b == SENTINEL)
        }
    }

    #[rstest]
    #[case::aligned(0x1000, 100, (0x1000, 100))]
    #[case::misaligned(0x1005, 100, (0x1000, 132))]
    #[case::last_in_unit(0x101F, 1, (0x1000, 33))]
    #[case::empty(0x1005, 0, (0x1005, 0))]
    fn footprint(#[case] src: usize, #[case] size: usize, #[case] expected: (usize, usize)) {
        assert_eq!(fetch_footprint(src as *const u8, size), expected);
    }

    #[test]
    fn footprint_covers_every_fetch() {
        // Last chunk fetch: starts at src + full - shift, reads remainder + 32 bytes.
        let src = 0x2003usize;
        let size = SCRATCH_CHUNK_SIZE * 2 + 17;
        let (start, len) = fetch_footprint(src as *const u8, size);
        let last_fetch_end = src + SCRATCH_CHUNK_SIZE * 2 - 3 + 17 + FETCH_ALIGNMENT;
        assert_eq!(start + len, last_fetch_end);
        assert_eq!(start, 0x2000);
    }

    fn copy_distinct<F: CopyPrimitive>(chunk: usize, src_offset: usize, dst_offset: usize, size: usize) {
        let mut src = Arena::with_pattern(src_offset + size);
        let mut dst = Arena::new(dst_offset + size);
        let mut staging = ScratchBuffer::new(chunk, FETCH_ALIGNMENT).unwrap();

        unsafe {
            twopass_memmove::<F, NonOverfetchingCopy>(
                dst.ptr(dst_offset),
                src.ptr(src_offset),
                size,
                &mut staging,
            );
        }

        assert_eq!(
            &dst.bytes()[dst_offset..],
            &src.bytes()[src_offset..],
            "copy differs (chunk: {chunk}, src_offset: {src_offset}, dst_offset: {dst_offset}, size: {size})"
        );
        assert!(
            dst.bytes()[..dst_offset].iter().all(|&b| b == SENTINEL),
            "wrote before destination (size: {size})"
        );
        assert!(dst.padding_untouched(), "wrote past destination (size: {size})");
    }

    #[rstest]
    fn copies_distinct_buffers(
        #[values(0, 1, 5, 16, 31)] src_offset: usize,
        #[values(0, 2, 3)] dst_offset: usize,
        #[values(0, 1, 31, 32, 33, 64, 65, 200, 2048, 2049, 5000)] size: usize,
    ) {
        copy_distinct::<AlignedBlockFetch>(SCRATCH_CHUNK_SIZE, src_offset, dst_offset, size);
        copy_distinct::<NonOverfetchingCopy>(64, src_offset, dst_offset, size);
    }

    /// Overlapping move inside one buffer, checked against `copy_within`.
    fn move_within(chunk: usize, src_offset: usize, dst_offset: usize, size: usize) {
        let total = src_offset.max(dst_offset) + size;
        let mut arena = Arena::with_pattern(total);
        let mut expected = arena.bytes().to_vec();
        expected.copy_within(src_offset..src_offset + size, dst_offset);

        let mut staging = ScratchBuffer::new(chunk, FETCH_ALIGNMENT).unwrap();
        let dst = arena.ptr(dst_offset);
        let src = arena.ptr(src_offset);
        unsafe {
            twopass_memmove::<AlignedBlockFetch, NonOverfetchingCopy>(dst, src, size, &mut staging);
        }

        assert_eq!(
            arena.bytes(),
            expected.as_slice(),
            "overlapping move differs (chunk: {chunk}, src_offset: {src_offset}, dst_offset: {dst_offset}, size: {size})"
        );
        assert!(arena.padding_untouched());
    }

    #[test]
    fn overlapping_moves_small_sizes_exhaustive() {
        for size in [1usize, 7, 31, 32, 33, 64, 100, 255, 256] {
            for delta in 1..=size {
                for base in [0usize, 5] {
                    // Forward: destination below source.
                    move_within(64, base + delta, base, size);
                    // Backward: destination above source.
                    move_within(64, base, base + delta, size);
                }
            }
        }
    }

    #[test]
    fn move_onto_itself_is_identity() {
        move_within(64, 9, 9, 300);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn overlapping_moves_large_sizes(
            size in 257usize..20_000,
            delta in 1usize..6_000,
            base in 0usize..64,
            forward in any::<bool>(),
        ) {
            if forward {
                move_within(SCRATCH_CHUNK_SIZE, base + delta, base, size);
            } else {
                move_within(SCRATCH_CHUNK_SIZE, base, base + delta, size);
            }
        }
    }
}
