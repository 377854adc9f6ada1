//! # Scanline Copies Between Cached Buffers
//!
//! Copies one scanline between two buffers while only ever issuing naturally aligned loads and
//! stores, no matter how the two ends sit relative to a machine word.
//!
//! The line is classified by the alignment of both ends inside a 32-byte chunk:
//!
//! ```text
//!  src & 3 == dst & 3          -> aligned::copy_line            (no shifting)
//!  src & 3 == 0, dst & 3 != 0  -> combine::source_aligned       (shift into place)
//!  anything else               -> combine::destination_aligned  (shift out of place)
//! ```
//!
//! The two combine strategies keep a rolling carry of the bytes of the previously loaded source
//! word which have not been stored yet:
//!
//! ```text
//! src words:  [s0 s1 s2 s3][s4 s5 s6 s7][s8 ...
//! carry:            [s2 s3]
//! dst word:   [s2 s3 s4 s5]   = merge(carry, word1)
//! carry:                  [s6 s7]
//! ```
//!
//! Lines no longer than one chunk take a reduced path without the unrolled block loop.
//!
//! All kernels here are forward copies; the source and destination lines must not overlap.

pub mod aligned;
pub mod combine;


/// Size of a machine word as used by the line kernels.
pub const WORD_SIZE: usize = 4;

/// Size of one unrolled block, and the grid the line start alignment is measured against.
pub const CHUNK_SIZE: usize = 32;

/// Lines of at most this many bytes skip the unrolled block loop.
pub const SMALL_LINE_LIMIT: usize = CHUNK_SIZE;

/// How the two ends of a scanline relate to a machine word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineAlignment {
    /// Both ends have the same offset within a word.
    Mutual,
    /// The source starts on a word boundary, the destination does not.
    SourceWordAligned,
    /// The destination starts on a word boundary and the source does not, or neither does.
    DestinationWordAligned,
}

/// Offset of `ptr` within a [`CHUNK_SIZE`] chunk.
#[inline(always)]
pub fn chunk_offset(ptr: *const u8) -> usize {
    ptr as usize & (CHUNK_SIZE - 1)
}

/// Classifies a scanline by the alignment of its two ends.
#[inline(always)]
pub fn classify(dst: *const u8, src: *const u8) -> LineAlignment {
    let src_shift = chunk_offset(src) & (WORD_SIZE - 1);
    let dst_shift = chunk_offset(dst) & (WORD_SIZE - 1);

    if src_shift == dst_shift {
        LineAlignment::Mutual
    } else if src_shift == 0 {
        LineAlignment::SourceWordAligned
    } else {
        LineAlignment::DestinationWordAligned
    }
}

/// Copies a single scanline of `len` bytes using the best strategy for its alignment.
///
/// # Arguments
///
/// * `dst` - Pointer to the first destination byte
/// * `src` - Pointer to the first source byte
/// * `len` - Number of bytes in the line
///
/// # Safety
///
/// - `src` must be valid for reads of `len` bytes
/// - `dst` must be valid for writes of `len` bytes
/// - The two ranges must not overlap
#[inline]
pub unsafe fn copy_line(dst: *mut u8, src: *const u8, len: usize) {
    match classify(dst, src) {
        LineAlignment::Mutual => aligned::copy_line(dst, src, len),
        LineAlignment::SourceWordAligned => combine::source_aligned(dst, src, len),
        LineAlignment::DestinationWordAligned => combine::destination_aligned(dst, src, len),
    }
}

/// Copies a short run with the widest store both ends allow, bytes or half-words.
///
/// # Safety
///
/// Same as [`copy_line`].
#[inline(always)]
pub(crate) unsafe fn copy_small(dst: *mut u8, src: *const u8, len: usize) {
    let mut src = src;
    let mut dst = dst;
    let end = dst.add(len);

    if (src as usize | dst as usize) & 1 == 0 {
        let pair_end = dst.add(len & !1);
        while dst < pair_end {
            (dst as *mut u16).write((src as *const u16).read());
            src = src.add(2);
            dst = dst.add(2);
        }
    }

    while dst < end {
        dst.write(src.read());
        src = src.add(1);
        dst = dst.add(1);
    }
}

/// Stores up to 7 bytes at an arbitrary address using only naturally aligned stores.
///
/// # Safety
///
/// `dst` must be valid for writes of `bytes.len()` bytes.
#[inline(always)]
pub(crate) unsafe fn store_fragment(dst: *mut u8, bytes: &[u8]) {
    let mut dst = dst;
    let mut x = 0;
    while x < bytes.len() {
        let left = bytes.len() - x;
        if dst as usize & 1 != 0 || left == 1 {
            dst.write(bytes[x]);
            x += 1;
            dst = dst.add(1);
        } else if dst as usize & 2 != 0 || left < 4 {
            (dst as *mut u16).write(u16::from_ne_bytes([bytes[x], bytes[x + 1]]));
            x += 2;
            dst = dst.add(2);
        } else {
            (dst as *mut u32).write(u32::from_ne_bytes([
                bytes[x],
                bytes[x + 1],
                bytes[x + 2],
                bytes[x + 3],
            ]));
            x += 4;
            dst = dst.add(4);
        }
    }
}

#[cfg(test)]
mod dispatch_tests {
    use super::tests::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::both_aligned(0, 0, LineAlignment::Mutual)]
    #[case::same_word_offset(6, 2, LineAlignment::Mutual)]
    #[case::same_odd_offset(5, 1, LineAlignment::Mutual)]
    #[case::source_aligned(2, 0, LineAlignment::SourceWordAligned)]
    #[case::source_aligned_odd(3, 8, LineAlignment::SourceWordAligned)]
    #[case::destination_aligned(0, 2, LineAlignment::DestinationWordAligned)]
    #[case::neither_aligned(1, 2, LineAlignment::DestinationWordAligned)]
    fn classify_offsets(
        #[case] dst_offset: usize,
        #[case] src_offset: usize,
        #[case] expected: LineAlignment,
    ) {
        let dst = (0x1000 + dst_offset) as *const u8;
        let src = (0x2000 + src_offset) as *const u8;
        assert_eq!(classify(dst, src), expected);
    }

    /// Every pair of even offsets inside a chunk, across small and bulk widths.
    #[test]
    fn copy_line_matches_reference_for_even_offsets() {
        for src_offset in (0..CHUNK_SIZE).step_by(2) {
            for dst_offset in (0..CHUNK_SIZE).step_by(2) {
                for len in (0..=CHUNK_SIZE * 12).step_by(2) {
                    assert_line_kernel_matches_reference(
                        copy_line,
                        "copy_line",
                        src_offset,
                        dst_offset,
                        len,
                    );
                }
            }
        }
    }

    /// Byte granular offsets, as seen with 8bpp lines.
    #[test]
    fn copy_line_matches_reference_for_all_offsets() {
        for src_offset in 0..CHUNK_SIZE {
            for dst_offset in 0..CHUNK_SIZE {
                for len in [0, 1, 2, 3, 5, 7, 31, 32, 33, 37, 64, 95, 130] {
                    assert_line_kernel_matches_reference(
                        copy_line,
                        "copy_line",
                        src_offset,
                        dst_offset,
                        len,
                    );
                }
            }
        }
    }

    #[test]
    fn source_at_5_destination_at_0() {
        let mut src = AlignedLine::new(128);
        let mut dst = AlignedLine::new(128);
        for x in 0..64 {
            src.bytes_mut()[5 + x] = x as u8;
        }

        unsafe {
            copy_line(dst.as_mut_ptr(), src.as_ptr().add(5), 64);
        }

        let expected: Vec<u8> = (0..64u8).collect();
        assert_eq!(&dst.bytes()[..64], expected.as_slice());
    }

    #[rstest]
    #[case::odd_start(1, &[1, 2, 3, 4, 5, 6, 7])]
    #[case::half_word_start(2, &[1, 2, 3, 4, 5])]
    #[case::word_start(0, &[1, 2, 3])]
    #[case::single(3, &[9])]
    fn store_fragment_writes_exact_bytes(#[case] offset: usize, #[case] bytes: &[u8]) {
        let mut line = AlignedLine::new(32);
        line.bytes_mut().fill(0xCC);

        unsafe {
            store_fragment(line.as_mut_ptr().add(offset), bytes);
        }

        let out = line.bytes();
        assert_eq!(&out[offset..offset + bytes.len()], bytes);
        assert!(out[..offset].iter().all(|&b| b == 0xCC));
        assert!(out[offset + bytes.len()..].iter().all(|&b| b == 0xCC));
    }
}
