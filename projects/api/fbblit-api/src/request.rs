//! Blit and fill requests.
//!
//! A request describes one rectangle transfer between two [`PixelBuffer`]s, or one rectangle
//! fill. Requests are built per call and are not [`Send`]: they hold raw pointers into
//! caller-owned memory for the lifetime `'a`.
//!
//! Safe constructors take slices and check every byte of both rectangles against them. The raw
//! constructors exist for device memory (mapped framebuffers) and negative strides, where the
//! caller vouches for the memory instead.
//!
//! A request with a zero or negative width or height is valid and empty: every path treats it as
//! a no-op.

use crate::error::{RequestError, RequestResult};
use core::marker::PhantomData;
use fbblit_common::bpp::BitsPerPixel;

/// Iteration order hints the host attaches to overlapping copies.
///
/// Fast paths decline any request carrying a hint; the generic fallback honours them.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct CopyDirection {
    /// Copy each row right to left.
    pub reverse: bool,
    /// Copy rows bottom to top.
    pub upside_down: bool,
}

impl CopyDirection {
    /// No hint; the copier picks whatever order is overlap-safe.
    pub const NONE: Self = Self {
        reverse: false,
        upside_down: false,
    };

    /// Whether no hint is set.
    #[inline]
    pub const fn is_none(self) -> bool {
        !self.reverse && !self.upside_down
    }
}

/// A view over caller-owned pixel memory.
///
/// The pixel at `(x, y)` starts `y * stride + x * bytes_per_pixel` bytes past `base`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    base: *mut u8,
    len: usize,
    stride: isize,
    bits_per_pixel: u8,
}

impl PixelBuffer {
    /// Describes `len` bytes of pixels at `base`.
    ///
    /// Creating the descriptor is always safe; building a request from it is not, see
    /// [`BlitRequest::from_raw_parts`].
    #[inline]
    pub const fn new(base: *mut u8, len: usize, stride: isize, bits_per_pixel: u8) -> Self {
        Self {
            base,
            len,
            stride,
            bits_per_pixel,
        }
    }

    /// First byte of the buffer.
    #[inline(always)]
    pub const fn base(&self) -> *mut u8 {
        self.base
    }

    /// Number of addressable bytes from [`PixelBuffer::base`].
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer has no addressable bytes.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes between the starts of two consecutive rows. May be negative.
    #[inline(always)]
    pub const fn stride(&self) -> isize {
        self.stride
    }

    /// Depth of every pixel, in bits.
    #[inline(always)]
    pub const fn bits_per_pixel(&self) -> u8 {
        self.bits_per_pixel
    }

    /// Depth of every pixel in bytes, or [`None`] when it is not a whole number of bytes.
    #[inline]
    pub const fn bytes_per_pixel(&self) -> Option<usize> {
        if self.bits_per_pixel != 0 && self.bits_per_pixel % 8 == 0 {
            Some((self.bits_per_pixel / 8) as usize)
        } else {
            None
        }
    }

    /// Depth as one of the supported depths.
    #[inline]
    pub const fn depth(&self) -> Option<BitsPerPixel> {
        BitsPerPixel::from_bits(self.bits_per_pixel)
    }

    /// Address of the first byte of pixel `(x, y)`.
    ///
    /// Computed with wrapping arithmetic; the result is only meaningful for pixels inside a
    /// validated rectangle.
    #[inline]
    pub fn pixel_ptr(&self, x: i32, y: i32) -> *mut u8 {
        let bytes = (self.bits_per_pixel / 8) as isize;
        let offset = (y as isize)
            .wrapping_mul(self.stride)
            .wrapping_add((x as isize).wrapping_mul(bytes));
        self.base.wrapping_offset(offset)
    }

    fn from_slice_parts(base: *mut u8, len: usize, stride: usize, bpp: BitsPerPixel) -> Self {
        Self::new(base, len, stride as isize, bpp.bits())
    }

    /// Checks a rectangle against the `len` bytes of the buffer, the way the safe request
    /// constructors check it against a slice.
    pub(crate) fn check_rect(&self, origin: (i32, i32), width: i32, height: i32) -> RequestResult<()> {
        let stride = usize::try_from(self.stride).map_err(|_| RequestError::NegativeStride)?;
        validate_rect(self.len, stride, self.bits_per_pixel, origin, width, height).map(|_| ())
    }
}

/// Checks the depth and a `width` x `height` rectangle at `origin` against a slice of `len`
/// bytes laid out with `stride`.
fn validate_rect(
    len: usize,
    stride: usize,
    bits_per_pixel: u8,
    origin: (i32, i32),
    width: i32,
    height: i32,
) -> RequestResult<BitsPerPixel> {
    let bpp =
        BitsPerPixel::from_bits(bits_per_pixel).ok_or(RequestError::UnsupportedDepth(bits_per_pixel))?;
    let out_of_bounds = |required| RequestError::RectangleOutOfBounds {
        required,
        actual: len,
    };

    if isize::try_from(stride).is_err() {
        return Err(out_of_bounds(stride));
    }
    if width <= 0 || height <= 0 {
        return Ok(bpp);
    }
    if origin.0 < 0 || origin.1 < 0 {
        return Err(RequestError::NegativeOrigin);
    }

    let (x, y) = (origin.0 as usize, origin.1 as usize);
    let (width, height) = (width as usize, height as usize);

    let row_bytes = (x + width)
        .checked_mul(bpp.bytes())
        .ok_or(out_of_bounds(usize::MAX))?;
    if height > 1 && stride < row_bytes {
        return Err(RequestError::StrideTooSmall { stride, row_bytes });
    }

    let required = (y + height - 1)
        .checked_mul(stride)
        .and_then(|rows| rows.checked_add(row_bytes))
        .ok_or(out_of_bounds(usize::MAX))?;
    if required > len {
        return Err(out_of_bounds(required));
    }

    Ok(bpp)
}

/// A rectangle copy from one pixel buffer to another, or within one.
#[derive(Debug)]
pub struct BlitRequest<'a> {
    src: PixelBuffer,
    dst: PixelBuffer,
    src_x: i32,
    src_y: i32,
    dst_x: i32,
    dst_y: i32,
    width: i32,
    height: i32,
    direction: CopyDirection,
    _buffers: PhantomData<&'a mut [u8]>,
}

impl<'a> BlitRequest<'a> {
    /// Describes a copy between two distinct slices.
    ///
    /// # Parameters
    ///
    /// - `src`, `src_stride`: Source pixels and the bytes between their rows
    /// - `dst`, `dst_stride`: Destination pixels and the bytes between their rows
    /// - `bits_per_pixel`: Depth of both buffers, 8, 16 or 32
    /// - `src_origin`, `dst_origin`: Top left pixel of each rectangle
    /// - `width`, `height`: Size of the rectangle in pixels
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the depth is unsupported or either rectangle leaves its slice.
    #[allow(clippy::too_many_arguments)]
    pub fn between(
        src: &'a [u8],
        src_stride: usize,
        dst: &'a mut [u8],
        dst_stride: usize,
        bits_per_pixel: u8,
        src_origin: (i32, i32),
        dst_origin: (i32, i32),
        width: i32,
        height: i32,
    ) -> RequestResult<Self> {
        let bpp = validate_rect(src.len(), src_stride, bits_per_pixel, src_origin, width, height)?;
        validate_rect(dst.len(), dst_stride, bits_per_pixel, dst_origin, width, height)?;

        // The source is only ever read through this pointer.
        let src = PixelBuffer::from_slice_parts(src.as_ptr() as *mut u8, src.len(), src_stride, bpp);
        let dst = PixelBuffer::from_slice_parts(dst.as_mut_ptr(), dst.len(), dst_stride, bpp);
        Ok(Self::assemble(src, dst, src_origin, dst_origin, width, height))
    }

    /// Describes a copy inside one slice. The two rectangles may overlap.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the depth is unsupported or either rectangle leaves the slice.
    pub fn within(
        buffer: &'a mut [u8],
        stride: usize,
        bits_per_pixel: u8,
        src_origin: (i32, i32),
        dst_origin: (i32, i32),
        width: i32,
        height: i32,
    ) -> RequestResult<Self> {
        let bpp = validate_rect(buffer.len(), stride, bits_per_pixel, src_origin, width, height)?;
        validate_rect(buffer.len(), stride, bits_per_pixel, dst_origin, width, height)?;

        let view = PixelBuffer::from_slice_parts(buffer.as_mut_ptr(), buffer.len(), stride, bpp);
        Ok(Self::assemble(view, view, src_origin, dst_origin, width, height))
    }

    /// Describes a copy between caller-vouched buffers.
    ///
    /// No validation is performed. Depths that are not a whole number of bytes, mismatched
    /// depths and negative strides are representable; paths that cannot serve them decline.
    ///
    /// # Safety
    ///
    /// For the whole of `'a`:
    /// - every byte of the source rectangle must be valid for reads
    /// - every byte of the destination rectangle must be valid for writes
    /// - no other reference may access the destination rectangle
    /// - the first [`PixelBuffer::len`] bytes of the source must be valid for reads, as the
    ///   uncached copier fetches whole aligned blocks around the rectangle
    /// - when used with [`crate::BlitContext::blit_boxes`], the first [`PixelBuffer::len`] bytes
    ///   of the destination must be valid for writes and not accessed through other references
    pub unsafe fn from_raw_parts(
        src: PixelBuffer,
        dst: PixelBuffer,
        src_origin: (i32, i32),
        dst_origin: (i32, i32),
        width: i32,
        height: i32,
    ) -> Self {
        Self::assemble(src, dst, src_origin, dst_origin, width, height)
    }

    fn assemble(
        src: PixelBuffer,
        dst: PixelBuffer,
        src_origin: (i32, i32),
        dst_origin: (i32, i32),
        width: i32,
        height: i32,
    ) -> Self {
        Self {
            src,
            dst,
            src_x: src_origin.0,
            src_y: src_origin.1,
            dst_x: dst_origin.0,
            dst_y: dst_origin.1,
            width,
            height,
            direction: CopyDirection::NONE,
            _buffers: PhantomData,
        }
    }

    /// Attaches iteration order hints.
    #[inline]
    pub fn with_direction(mut self, direction: CopyDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Returns the same request with both origins moved, for box lists sharing one buffer pair.
    ///
    /// # Safety
    ///
    /// Same as [`BlitRequest::from_raw_parts`] for the moved rectangles.
    #[inline]
    pub(crate) unsafe fn with_rect(
        &self,
        src_origin: (i32, i32),
        dst_origin: (i32, i32),
        width: i32,
        height: i32,
    ) -> Self {
        Self::assemble(self.src, self.dst, src_origin, dst_origin, width, height)
            .with_direction(self.direction)
    }

    /// Source buffer.
    #[inline(always)]
    pub fn src(&self) -> &PixelBuffer {
        &self.src
    }

    /// Destination buffer.
    #[inline(always)]
    pub fn dst(&self) -> &PixelBuffer {
        &self.dst
    }

    /// Top left pixel of the source rectangle.
    #[inline(always)]
    pub fn src_origin(&self) -> (i32, i32) {
        (self.src_x, self.src_y)
    }

    /// Top left pixel of the destination rectangle.
    #[inline(always)]
    pub fn dst_origin(&self) -> (i32, i32) {
        (self.dst_x, self.dst_y)
    }

    /// Width of the rectangle in pixels.
    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height of the rectangle in pixels.
    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Iteration order hints.
    #[inline(always)]
    pub fn direction(&self) -> CopyDirection {
        self.direction
    }

    /// Whether there is nothing to copy.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// First byte of the source rectangle.
    #[inline]
    pub fn src_ptr(&self) -> *const u8 {
        self.src.pixel_ptr(self.src_x, self.src_y)
    }

    /// First byte of the destination rectangle.
    #[inline]
    pub fn dst_ptr(&self) -> *mut u8 {
        self.dst.pixel_ptr(self.dst_x, self.dst_y)
    }

    /// Whether both rectangles live in the same buffer with the same layout.
    #[inline]
    pub fn same_surface(&self) -> bool {
        self.src.base == self.dst.base && self.src.stride == self.dst.stride
    }
}

/// A solid colour fill of one rectangle.
#[derive(Debug)]
pub struct FillRequest<'a> {
    dst: PixelBuffer,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    color: u32,
    _buffer: PhantomData<&'a mut [u8]>,
}

impl<'a> FillRequest<'a> {
    /// Describes a fill of a rectangle inside a slice.
    ///
    /// `color` is a packed pixel of the given depth; bits above the depth are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] if the depth is unsupported or the rectangle leaves the slice.
    pub fn new(
        dst: &'a mut [u8],
        stride: usize,
        bits_per_pixel: u8,
        origin: (i32, i32),
        width: i32,
        height: i32,
        color: u32,
    ) -> RequestResult<Self> {
        let bpp = validate_rect(dst.len(), stride, bits_per_pixel, origin, width, height)?;
        let dst = PixelBuffer::from_slice_parts(dst.as_mut_ptr(), dst.len(), stride, bpp);
        Ok(Self::assemble(dst, origin, width, height, color))
    }

    /// Describes a fill of a caller-vouched buffer.
    ///
    /// # Safety
    ///
    /// For the whole of `'a`, every byte of the rectangle must be valid for writes and no other
    /// reference may access it. When used with [`crate::BlitContext::fill_boxes`], the same holds
    /// for the first [`PixelBuffer::len`] bytes of the buffer.
    pub unsafe fn from_raw_parts(
        dst: PixelBuffer,
        origin: (i32, i32),
        width: i32,
        height: i32,
        color: u32,
    ) -> Self {
        Self::assemble(dst, origin, width, height, color)
    }

    fn assemble(dst: PixelBuffer, origin: (i32, i32), width: i32, height: i32, color: u32) -> Self {
        Self {
            dst,
            x: origin.0,
            y: origin.1,
            width,
            height,
            color,
            _buffer: PhantomData,
        }
    }

    /// Returns the same fill moved to another rectangle of the same buffer.
    ///
    /// # Safety
    ///
    /// Same as [`FillRequest::from_raw_parts`] for the moved rectangle.
    #[inline]
    pub(crate) unsafe fn with_rect(&self, origin: (i32, i32), width: i32, height: i32) -> Self {
        Self::assemble(self.dst, origin, width, height, self.color)
    }

    /// Destination buffer.
    #[inline(always)]
    pub fn dst(&self) -> &PixelBuffer {
        &self.dst
    }

    /// Top left pixel of the rectangle.
    #[inline(always)]
    pub fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Width of the rectangle in pixels.
    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Height of the rectangle in pixels.
    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Packed fill colour.
    #[inline(always)]
    pub fn color(&self) -> u32 {
        self.color
    }

    /// Whether there is nothing to fill.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// First byte of the rectangle.
    #[inline]
    pub fn dst_ptr(&self) -> *mut u8 {
        self.dst.pixel_ptr(self.x, self.y)
    }
}
