//! CPU-optimised backend.
//!
//! Serves two kinds of copies:
//!
//! - **Overlapped blits out of uncached memory.** Every row is staged through an aligned scratch
//!   buffer in 2048-byte chunks, see [`fbblit_cpu::twopass`]. Narrow rectangles are left to the
//!   next backend, as the staging overhead outweighs the gain, except for same-row moves to the
//!   right which are always taken.
//! - **Fast path blits between cached buffers**, using the word-combine line copier.
//!
//! Fills are not offered.

use crate::backend::{Backend, Operation, Outcome};
use crate::error::{InitError, InitResult};
use crate::request::BlitRequest;
use fbblit_common::region::MemoryRegion;
use fbblit_cpu::rect::{overlapped_blit_uncached, standard_blit};
use fbblit_cpu::twopass::{allocate_staging, fetch_footprint};
use likely_stable::unlikely;
use log::{debug, trace};

/// Tunables for [`CpuBackend`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CpuBackendSettings {
    /// Narrowest 16bpp rectangle, in pixels, worth staging out of uncached memory.
    pub width_threshold_16bpp: u32,
    /// Narrowest 32bpp rectangle, in pixels, worth staging out of uncached memory.
    pub width_threshold_32bpp: u32,
    /// Whether [`Operation::FastPathBlit`] is offered.
    pub enable_fast_path: bool,
}

impl Default for CpuBackendSettings {
    fn default() -> Self {
        Self {
            width_threshold_16bpp: 60,
            width_threshold_32bpp: 40,
            enable_fast_path: true,
        }
    }
}

impl CpuBackendSettings {
    /// Sets [`CpuBackendSettings::width_threshold_16bpp`].
    pub const fn with_width_threshold_16bpp(mut self, pixels: u32) -> Self {
        self.width_threshold_16bpp = pixels;
        self
    }

    /// Sets [`CpuBackendSettings::width_threshold_32bpp`].
    pub const fn with_width_threshold_32bpp(mut self, pixels: u32) -> Self {
        self.width_threshold_32bpp = pixels;
        self
    }

    /// Sets [`CpuBackendSettings::enable_fast_path`].
    pub const fn with_fast_path(mut self, enabled: bool) -> Self {
        self.enable_fast_path = enabled;
        self
    }
}

/// Backend running the CPU kernels of [`fbblit_cpu`].
#[derive(Debug, Clone)]
pub struct CpuBackend {
    uncached: MemoryRegion,
    settings: CpuBackendSettings,
}

impl CpuBackend {
    /// Creates a backend treating `uncached` as slow-to-read memory.
    ///
    /// # Errors
    ///
    /// - [`InitError::ZeroThreshold`] if a width threshold is zero
    /// - [`InitError::Allocate`] if a staging buffer cannot be allocated at all
    pub fn new(uncached: MemoryRegion, settings: CpuBackendSettings) -> InitResult<Self> {
        if settings.width_threshold_16bpp == 0 {
            return Err(InitError::ZeroThreshold("width_threshold_16bpp"));
        }
        if settings.width_threshold_32bpp == 0 {
            return Err(InitError::ZeroThreshold("width_threshold_32bpp"));
        }

        // Staging buffers are allocated per request; make sure that can work at all.
        drop(allocate_staging()?);

        debug!(
            "cpu backend: uncached region {:#x}..{:#x}, {:?}",
            uncached.begin(),
            uncached.end(),
            settings
        );
        Ok(Self { uncached, settings })
    }

    /// Creates a backend from the bounds of the uncached region.
    ///
    /// # Errors
    ///
    /// [`InitError::InvertedRegion`] if `end < begin`, otherwise as [`CpuBackend::new`].
    pub fn from_bounds(begin: usize, end: usize, settings: CpuBackendSettings) -> InitResult<Self> {
        let region = MemoryRegion::new(begin, end).ok_or(InitError::InvertedRegion { begin, end })?;
        Self::new(region, settings)
    }

    /// The uncached region.
    pub fn uncached(&self) -> &MemoryRegion {
        &self.uncached
    }

    /// The settings in use.
    pub fn settings(&self) -> &CpuBackendSettings {
        &self.settings
    }

    fn width_threshold(&self, bits_per_pixel: u8) -> u32 {
        match bits_per_pixel {
            16 => self.settings.width_threshold_16bpp,
            32 => self.settings.width_threshold_32bpp,
            _ => 0,
        }
    }

    /// Whether the whole fetch window of the source rectangle lies in the uncached region and
    /// inside the source buffer.
    ///
    /// The region only says which memory is slow to read. The buffer is what the request proves
    /// readable, so a window leaving it is declined even when the region is larger.
    fn fetch_window_readable(&self, request: &BlitRequest<'_>, row_bytes: usize) -> bool {
        let src = request.src_ptr();
        if !self.uncached.contains(src) {
            trace!("cpu: declined, source not in uncached memory");
            return false;
        }

        let stride = request.src().stride() as usize;
        let last_row = (src as usize).wrapping_add(stride * (request.height() as usize - 1));
        let (start, _) = fetch_footprint(src, row_bytes);
        let (last_start, last_len) = fetch_footprint(last_row as *const u8, row_bytes);
        let Some(len) = (last_start + last_len).checked_sub(start) else {
            return false;
        };
        if !self.uncached.contains_range(start, len) {
            trace!("cpu: declined, fetch window leaves uncached memory");
            return false;
        }

        let buffer = request.src();
        let readable = MemoryRegion::new(
            buffer.base() as usize,
            (buffer.base() as usize).saturating_add(buffer.len()),
        );
        if !readable.is_some_and(|readable| readable.contains_range(start, len)) {
            trace!("cpu: declined, fetch window leaves the source buffer");
            return false;
        }
        true
    }
}

/// Checks shared by both copy paths. Returns the bytes per row to copy if the request can be
/// served by the kernels at all.
fn kernel_row_bytes(request: &BlitRequest<'_>) -> Option<usize> {
    let src = request.src();
    let dst = request.dst();
    if src.bits_per_pixel() != dst.bits_per_pixel() {
        trace!("cpu: declined, depth {} -> {}", src.bits_per_pixel(), dst.bits_per_pixel());
        return None;
    }
    let Some(bytes_per_pixel) = src.bytes_per_pixel() else {
        trace!("cpu: declined, {} bits per pixel", src.bits_per_pixel());
        return None;
    };
    if src.stride() < 0 || dst.stride() < 0 {
        trace!("cpu: declined, negative stride");
        return None;
    }
    Some(request.width() as usize * bytes_per_pixel)
}

/// A move to the right within the same rows whose source and destination overlap.
fn is_same_row_rightward_overlap(request: &BlitRequest<'_>) -> bool {
    let (src_x, src_y) = request.src_origin();
    let (dst_x, dst_y) = request.dst_origin();
    request.same_surface()
        && src_y == dst_y
        && src_x < dst_x
        && src_x.saturating_add(request.width()) >= dst_x
}

impl Backend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::OverlappedBlit => true,
            Operation::FastPathBlit => self.settings.enable_fast_path,
            Operation::Fill => false,
        }
    }

    fn overlapped_blit(&self, request: &BlitRequest<'_>) -> Outcome {
        if unlikely(request.is_empty()) {
            return Outcome::NotHandled;
        }

        let threshold = self.width_threshold(request.src().bits_per_pixel());
        if (request.width() as u32) < threshold && !is_same_row_rightward_overlap(request) {
            trace!("cpu: declined, width {} below {}", request.width(), threshold);
            return Outcome::NotHandled;
        }

        let Some(row_bytes) = kernel_row_bytes(request) else {
            return Outcome::NotHandled;
        };

        if !self.fetch_window_readable(request, row_bytes) {
            return Outcome::NotHandled;
        }

        let mut staging = match allocate_staging() {
            Ok(staging) => staging,
            Err(error) => {
                debug!("cpu: declined, staging allocation failed: {error}");
                return Outcome::NotHandled;
            }
        };

        // SAFETY: the request vouches for both rectangles and for its whole source buffer, and the
        // fetch window was checked to lie inside that buffer.
        unsafe {
            overlapped_blit_uncached(
                row_bytes,
                request.height() as usize,
                request.dst_ptr(),
                request.dst().stride() as usize,
                request.src_ptr(),
                request.src().stride() as usize,
                &mut staging,
            );
        }
        Outcome::Handled
    }

    fn fast_path_blit(&self, request: &BlitRequest<'_>) -> Outcome {
        if !self.settings.enable_fast_path || unlikely(request.is_empty()) {
            return Outcome::NotHandled;
        }
        if !request.direction().is_none() {
            trace!("cpu: declined, direction hints {:?}", request.direction());
            return Outcome::NotHandled;
        }
        let Some(row_bytes) = kernel_row_bytes(request) else {
            return Outcome::NotHandled;
        };

        // SAFETY: the request vouches for both rectangles.
        unsafe {
            standard_blit(
                row_bytes,
                request.height() as usize,
                request.dst_ptr(),
                request.dst().stride() as usize,
                request.src_ptr(),
                request.src().stride() as usize,
            );
        }
        Outcome::Handled
    }
}
