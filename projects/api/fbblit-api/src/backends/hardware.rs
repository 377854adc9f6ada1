//! Backend driving a 2D/DMA engine through a host-provided [`HardwareEngine`].
//!
//! The engine only sees buffers inside the framebuffer aperture. Small requests are declined:
//! setting up and waiting for the engine costs more than the CPU needs for the whole copy.

use crate::backend::{Backend, Operation, Outcome};
use crate::error::{InitError, InitResult};
use crate::request::{BlitRequest, CopyDirection, FillRequest};
use fbblit_common::region::MemoryRegion;
use likely_stable::unlikely;
use log::{debug, trace};

/// Which operations an engine can carry out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct EngineCapabilities {
    /// Rectangle copies, overlapping or not.
    pub blit: bool,
    /// Solid fills.
    pub fill: bool,
}

/// A rectangle copy handed to the engine.
#[derive(Debug, Copy, Clone)]
pub struct HardwareBlit {
    /// First byte of the source rectangle.
    pub src: *const u8,
    /// Bytes between source rows.
    pub src_stride: isize,
    /// Source depth.
    pub src_bits_per_pixel: u8,
    /// First byte of the destination rectangle.
    pub dst: *mut u8,
    /// Bytes between destination rows.
    pub dst_stride: isize,
    /// Destination depth.
    pub dst_bits_per_pixel: u8,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Iteration order hints from the host.
    pub direction: CopyDirection,
}

/// A solid fill handed to the engine.
#[derive(Debug, Copy, Clone)]
pub struct HardwareFill {
    /// First byte of the rectangle.
    pub dst: *mut u8,
    /// Bytes between rows.
    pub stride: isize,
    /// Depth.
    pub bits_per_pixel: u8,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Packed colour.
    pub color: u32,
}

/// A synchronous 2D engine.
///
/// Both operations block until the engine has finished, and report whether it did the work.
pub trait HardwareEngine: Send + Sync {
    /// Operations the engine offers.
    fn capabilities(&self) -> EngineCapabilities;

    /// Runs a copy. Returns `false` if the engine refused it, leaving memory untouched.
    ///
    /// # Safety
    ///
    /// Both rectangles of `blit` must be valid for the engine to access and lie inside the
    /// framebuffer aperture.
    unsafe fn blit(&self, _blit: &HardwareBlit) -> bool {
        false
    }

    /// Runs a fill. Returns `false` if the engine refused it, leaving memory untouched.
    ///
    /// # Safety
    ///
    /// The rectangle of `fill` must be valid for the engine to write and lie inside the
    /// framebuffer aperture.
    unsafe fn fill(&self, _fill: &HardwareFill) -> bool {
        false
    }
}

/// Smallest areas, in pixels, worth handing to the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HardwareThresholds {
    /// Copies from 16bpp to 16bpp.
    pub blit_area_16bpp: u64,
    /// Every other copy.
    pub blit_area: u64,
    /// Fills of 16bpp buffers.
    pub fill_area_16bpp: u64,
    /// Fills of every other depth.
    pub fill_area: u64,
}

impl Default for HardwareThresholds {
    fn default() -> Self {
        Self {
            blit_area_16bpp: 2500,
            blit_area: 1000,
            fill_area_16bpp: 10_000_000,
            fill_area: 5000,
        }
    }
}

impl HardwareThresholds {
    /// Sets [`HardwareThresholds::blit_area_16bpp`].
    pub const fn with_blit_area_16bpp(mut self, pixels: u64) -> Self {
        self.blit_area_16bpp = pixels;
        self
    }

    /// Sets [`HardwareThresholds::blit_area`].
    pub const fn with_blit_area(mut self, pixels: u64) -> Self {
        self.blit_area = pixels;
        self
    }

    /// Sets [`HardwareThresholds::fill_area_16bpp`].
    pub const fn with_fill_area_16bpp(mut self, pixels: u64) -> Self {
        self.fill_area_16bpp = pixels;
        self
    }

    /// Sets [`HardwareThresholds::fill_area`].
    pub const fn with_fill_area(mut self, pixels: u64) -> Self {
        self.fill_area = pixels;
        self
    }
}

/// Backend forwarding large framebuffer requests to a [`HardwareEngine`].
#[derive(Debug)]
pub struct HardwareBackend<E> {
    engine: E,
    framebuffer: MemoryRegion,
    thresholds: HardwareThresholds,
}

impl<E: HardwareEngine> HardwareBackend<E> {
    /// Wraps `engine`, which can reach the memory of `framebuffer`.
    pub fn new(engine: E, framebuffer: MemoryRegion, thresholds: HardwareThresholds) -> Self {
        debug!(
            "hardware backend: framebuffer {:#x}..{:#x}, {:?}, {:?}",
            framebuffer.begin(),
            framebuffer.end(),
            engine.capabilities(),
            thresholds
        );
        Self {
            engine,
            framebuffer,
            thresholds,
        }
    }

    /// Wraps `engine`, with the framebuffer given by its bounds.
    ///
    /// # Errors
    ///
    /// [`InitError::InvertedRegion`] if `end < begin`.
    pub fn from_bounds(
        engine: E,
        begin: usize,
        end: usize,
        thresholds: HardwareThresholds,
    ) -> InitResult<Self> {
        let framebuffer =
            MemoryRegion::new(begin, end).ok_or(InitError::InvertedRegion { begin, end })?;
        Ok(Self::new(engine, framebuffer, thresholds))
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The thresholds in use.
    pub fn thresholds(&self) -> &HardwareThresholds {
        &self.thresholds
    }

    fn blit_threshold(&self, request: &BlitRequest<'_>) -> u64 {
        if request.src().bits_per_pixel() == 16 && request.dst().bits_per_pixel() == 16 {
            self.thresholds.blit_area_16bpp
        } else {
            self.thresholds.blit_area
        }
    }

    fn fill_threshold(&self, bits_per_pixel: u8) -> u64 {
        if bits_per_pixel == 16 {
            self.thresholds.fill_area_16bpp
        } else {
            self.thresholds.fill_area
        }
    }
}

#[inline]
fn area(width: i32, height: i32) -> u64 {
    width as u64 * height as u64
}

impl<E: HardwareEngine> Backend for HardwareBackend<E> {
    fn name(&self) -> &'static str {
        "hardware"
    }

    fn supports(&self, operation: Operation) -> bool {
        let capabilities = self.engine.capabilities();
        match operation {
            Operation::OverlappedBlit => capabilities.blit,
            Operation::FastPathBlit => false,
            Operation::Fill => capabilities.fill,
        }
    }

    fn overlapped_blit(&self, request: &BlitRequest<'_>) -> Outcome {
        if !self.framebuffer.contains(request.src().base())
            || !self.framebuffer.contains(request.dst().base())
        {
            trace!("hardware: declined blit, buffers outside the framebuffer");
            return Outcome::NotHandled;
        }
        if unlikely(request.is_empty()) {
            return Outcome::Handled;
        }

        let area = area(request.width(), request.height());
        let threshold = self.blit_threshold(request);
        if area < threshold {
            trace!("hardware: declined blit, area {area} below {threshold}");
            return Outcome::NotHandled;
        }

        let blit = HardwareBlit {
            src: request.src_ptr(),
            src_stride: request.src().stride(),
            src_bits_per_pixel: request.src().bits_per_pixel(),
            dst: request.dst_ptr(),
            dst_stride: request.dst().stride(),
            dst_bits_per_pixel: request.dst().bits_per_pixel(),
            width: request.width() as u32,
            height: request.height() as u32,
            direction: request.direction(),
        };
        // SAFETY: the request vouches for both rectangles, and both buffers sit in the aperture.
        let done = unsafe { self.engine.blit(&blit) };
        if !done {
            trace!("hardware: engine refused blit");
        }
        Outcome::from(done)
    }

    fn fill(&self, request: &FillRequest<'_>) -> Outcome {
        if unlikely(request.is_empty()) {
            return Outcome::Handled;
        }
        if !self.framebuffer.contains(request.dst().base()) {
            trace!("hardware: declined fill, buffer outside the framebuffer");
            return Outcome::NotHandled;
        }

        let area = area(request.width(), request.height());
        let threshold = self.fill_threshold(request.dst().bits_per_pixel());
        if area < threshold {
            trace!("hardware: declined fill, area {area} below {threshold}");
            return Outcome::NotHandled;
        }

        let fill = HardwareFill {
            dst: request.dst_ptr(),
            stride: request.dst().stride(),
            bits_per_pixel: request.dst().bits_per_pixel(),
            width: request.width() as u32,
            height: request.height() as u32,
            color: request.color(),
        };
        // SAFETY: the request vouches for the rectangle, and the buffer sits in the aperture.
        let done = unsafe { self.engine.fill(&fill) };
        if !done {
            trace!("hardware: engine refused fill");
        }
        Outcome::from(done)
    }
}
