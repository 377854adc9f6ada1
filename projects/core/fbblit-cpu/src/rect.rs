//! Rectangle copies built from the line kernels.
//!
//! A rectangle is `height` scanlines of `width_bytes` bytes, each `stride` bytes apart. When
//! source and destination share a buffer the rows are visited in the order `memmove` would visit
//! bytes: bottom to top when the destination starts above the source in memory and the two spans
//! overlap, top to bottom otherwise. Overlap within a single row is left to the per-row copy.

use crate::line;
use crate::twopass::uncached_memmove;
use fbblit_common::allocate::ScratchBuffer;
use likely_stable::unlikely;

/// Number of bytes between the first byte of the first row and the end of the last row.
#[inline(always)]
fn span(stride: usize, width_bytes: usize, height: usize) -> usize {
    stride * (height - 1) + width_bytes
}

/// Whether rows must be copied last to first.
///
/// True when the linear spans of the two rectangles overlap and the destination starts at a
/// higher address than the source.
#[inline]
pub fn rows_bottom_up(
    width_bytes: usize,
    height: usize,
    dst: *const u8,
    dst_stride: usize,
    src: *const u8,
    src_stride: usize,
) -> bool {
    if width_bytes == 0 || height == 0 {
        return false;
    }

    let dst_start = dst as usize;
    let src_start = src as usize;
    let dst_end = dst_start + span(dst_stride, width_bytes, height);
    let src_end = src_start + span(src_stride, width_bytes, height);

    dst_start > src_start && src_end > dst_start && dst_end > src_start
}

/// Visits every row in a `memmove`-safe order, passing `(dst_row, src_row)` to `copy_row`.
#[inline(always)]
unsafe fn for_each_row(
    width_bytes: usize,
    height: usize,
    dst: *mut u8,
    dst_stride: usize,
    src: *const u8,
    src_stride: usize,
    mut copy_row: impl FnMut(*mut u8, *const u8),
) {
    if rows_bottom_up(width_bytes, height, dst, dst_stride, src, src_stride) {
        for y in (0..height).rev() {
            copy_row(dst.add(y * dst_stride), src.add(y * src_stride));
        }
    } else {
        for y in 0..height {
            copy_row(dst.add(y * dst_stride), src.add(y * src_stride));
        }
    }
}

/// Copies a rectangle whose source lives in uncached memory, every row staged through `staging`.
///
/// # Arguments
///
/// * `width_bytes` - Bytes per row to copy
/// * `height` - Number of rows
/// * `dst` - First byte of the destination rectangle
/// * `dst_stride` - Bytes between destination rows
/// * `src` - First byte of the source rectangle
/// * `src_stride` - Bytes between source rows
/// * `staging` - Scratch buffer for the chunked copy, see [`crate::twopass`]
///
/// # Safety
///
/// - The source rectangle's rows, extended by their [`crate::twopass::fetch_footprint`], must be
///   valid for reads
/// - The destination rectangle's rows must be valid for writes
/// - Source and destination may overlap
pub unsafe fn overlapped_blit_uncached(
    width_bytes: usize,
    height: usize,
    dst: *mut u8,
    dst_stride: usize,
    src: *const u8,
    src_stride: usize,
    staging: &mut ScratchBuffer,
) {
    if unlikely(width_bytes == 0 || height == 0) {
        return;
    }

    for_each_row(
        width_bytes,
        height,
        dst,
        dst_stride,
        src,
        src_stride,
        |dst_row, src_row| uncached_memmove(dst_row, src_row, width_bytes, staging),
    );
}

/// Copies a rectangle between cached buffers with the word-combine line copier.
///
/// A row whose source and destination bytes intersect is moved with `memmove` instead.
///
/// # Safety
///
/// - The source rectangle's rows must be valid for reads
/// - The destination rectangle's rows must be valid for writes
/// - Source and destination may overlap
pub unsafe fn standard_blit(
    width_bytes: usize,
    height: usize,
    dst: *mut u8,
    dst_stride: usize,
    src: *const u8,
    src_stride: usize,
) {
    if unlikely(width_bytes == 0 || height == 0) {
        return;
    }

    for_each_row(
        width_bytes,
        height,
        dst,
        dst_stride,
        src,
        src_stride,
        |dst_row, src_row| {
            let d = dst_row as usize;
            let s = src_row as usize;
            if unlikely(s < d + width_bytes && d < s + width_bytes) {
                core::ptr::copy(src_row, dst_row, width_bytes);
            } else {
                line::copy_line(dst_row, src_row, width_bytes);
            }
        },
    );
}
