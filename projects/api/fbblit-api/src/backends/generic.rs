//! The software fallback at the end of every cascade.
//!
//! Plain per-row `memmove`s and pixel stores. Slow but total: any request with a whole number of
//! bytes per pixel is carried out, whatever its strides, overlap or hints.

use crate::backend::{Backend, Operation, Outcome};
use crate::request::{BlitRequest, FillRequest};
use core::ptr;
use fbblit_common::bpp::BitsPerPixel;
use log::debug;

/// Always-succeeding software backend.
#[derive(Debug, Default, Copy, Clone)]
pub struct GenericBackend;

impl GenericBackend {
    /// Copies the rectangle described by `request`.
    ///
    /// Rows are copied bottom to top when the `upside_down` hint is set, or, without hints,
    /// whenever that is needed for overlapping rectangles. Mismatched depths copy
    /// `width * source bytes per pixel` bytes per row; depths that are not a whole number of
    /// bytes are ignored.
    pub fn blit(&self, request: &BlitRequest<'_>) {
        if request.is_empty() {
            return;
        }
        let Some(bytes_per_pixel) = request.src().bytes_per_pixel() else {
            debug!(
                "generic blit ignored: {} bits per pixel is not a whole number of bytes",
                request.src().bits_per_pixel()
            );
            return;
        };

        let row_bytes = request.width() as usize * bytes_per_pixel;
        let src = request.src_ptr();
        let dst = request.dst_ptr();
        let src_stride = request.src().stride();
        let dst_stride = request.dst().stride();
        let height = request.height() as isize;

        let copy_row = |y: isize| unsafe {
            // SAFETY: the request guarantees every row of both rectangles is valid.
            ptr::copy(
                src.wrapping_offset(y * src_stride),
                dst.wrapping_offset(y * dst_stride),
                row_bytes,
            );
        };

        if rows_last_to_first(request) {
            (0..height).rev().for_each(copy_row);
        } else {
            (0..height).for_each(copy_row);
        }
    }

    /// Fills the rectangle described by `request` with its colour, in native byte order.
    ///
    /// Depths other than 8, 16 and 32 bits per pixel are ignored.
    pub fn fill(&self, request: &FillRequest<'_>) {
        if request.is_empty() {
            return;
        }
        let Some(depth) = request.dst().depth() else {
            debug!(
                "generic fill ignored: unsupported depth of {} bits per pixel",
                request.dst().bits_per_pixel()
            );
            return;
        };

        let width = request.width() as usize;
        let row_bytes = width * depth.bytes();
        let stride = request.dst().stride();
        let first_row = request.dst_ptr();
        let color = depth.mask_color(request.color());

        // SAFETY: the request guarantees every row of the rectangle is valid for writes, and rows
        // of a valid rectangle never overlap each other.
        unsafe {
            match depth {
                BitsPerPixel::Bpp8 => ptr::write_bytes(first_row, color as u8, width),
                BitsPerPixel::Bpp16 => {
                    for x in 0..width {
                        (first_row.add(x * 2) as *mut u16).write_unaligned(color as u16);
                    }
                }
                BitsPerPixel::Bpp32 => {
                    for x in 0..width {
                        (first_row.add(x * 4) as *mut u32).write_unaligned(color);
                    }
                }
            }

            for y in 1..request.height() as isize {
                ptr::copy_nonoverlapping(first_row, first_row.wrapping_offset(y * stride), row_bytes);
            }
        }
    }
}

/// Whether rows must be visited last to first.
///
/// Hints from the host win. Without them, rows go last to first when the destination lies
/// further along the source's row direction, which is what keeps overlapping rectangles intact.
fn rows_last_to_first(request: &BlitRequest<'_>) -> bool {
    let direction = request.direction();
    if !direction.is_none() {
        return direction.upside_down;
    }

    let delta = (request.dst_ptr() as usize).wrapping_sub(request.src_ptr() as usize) as isize;
    if delta == 0 {
        return false;
    }
    (delta > 0) == (request.src().stride() > 0)
}

impl Backend for GenericBackend {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn supports(&self, _operation: Operation) -> bool {
        true
    }

    fn overlapped_blit(&self, request: &BlitRequest<'_>) -> Outcome {
        self.blit(request);
        Outcome::Handled
    }

    fn fast_path_blit(&self, request: &BlitRequest<'_>) -> Outcome {
        self.blit(request);
        Outcome::Handled
    }

    fn fill(&self, request: &FillRequest<'_>) -> Outcome {
        GenericBackend::fill(self, request);
        Outcome::Handled
    }
}
