//! Memory allocation utilities for staging transfers out of uncached memory.
//!
//! Rust does not offer a stack buffer with a runtime-chosen alignment out of the box, so the
//! scratch area the chunked copier stages its reads through is carved out of a heap arena.
//!
//! ## Useful APIs
//!
//! [`allocate_align_64`]: Allocates uninitialized memory aligned to 64-bytes.
//! [`ScratchBuffer::new`]: Creates an arena with an aligned window suitable for chunked fetches.
//!
//! ## Safety
//!
//! All allocation operations are wrapped in safe APIs that handle proper initialization,
//! cleanup, and error handling. Memory is automatically deallocated when the allocation
//! wrappers are dropped.

use core::alloc::{Layout, LayoutError};
use safe_allocator_api::prelude::AllocError;
use safe_allocator_api::RawAlloc;
use thiserror::Error;

/// A staging arena with an aligned window inside it.
///
/// The arena is `chunk_size + 2 * alignment` bytes long. The window starts at the first
/// `alignment`-aligned address inside the arena and is `chunk_size + alignment` bytes long,
/// which is exactly what one chunk fetch needs when the source start sits up to one alignment
/// unit past an aligned address.
///
/// The contents are never initialized; it is only ever accessed through raw pointers, written by
/// a fetch before anything is read back.
pub struct ScratchBuffer {
    alloc: RawAlloc,
    offset: usize,
    window_len: usize,
    alignment: usize,
}

impl ScratchBuffer {
    /// Allocates a scratch arena for chunks of `chunk_size` bytes fetched at `alignment`.
    ///
    /// # Parameters
    ///
    /// - `chunk_size`: The largest number of bytes written back per chunk
    /// - `alignment`: The fetch alignment unit, must be a power of two
    ///
    /// # Returns
    ///
    /// A [`ScratchBuffer`] whose window is aligned to `alignment`
    pub fn new(chunk_size: usize, alignment: usize) -> Result<Self, AllocateError> {
        if !alignment.is_power_of_two() {
            return Err(AllocateError::InvalidAlignment(alignment));
        }

        let window_len = chunk_size
            .checked_add(alignment)
            .ok_or(AllocateError::SizeOverflow)?;
        let arena_len = window_len
            .checked_add(alignment)
            .ok_or(AllocateError::SizeOverflow)?;

        let mut alloc = allocate_align_64(arena_len)?;

        // Distance to the next aligned address. Zero whenever alignment <= 64.
        let base = alloc.as_mut_ptr() as usize;
        let offset = base.wrapping_neg() & (alignment - 1);
        debug_assert!(offset + window_len <= arena_len);

        Ok(Self {
            alloc,
            offset,
            window_len,
            alignment,
        })
    }

    /// Pointer to the first byte of the aligned window.
    ///
    /// # Safety
    ///
    /// The returned pointer is valid only as long as this [`ScratchBuffer`] remains alive, and
    /// for at most [`ScratchBuffer::window_len`] bytes.
    #[inline(always)]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        // SAFETY: offset < alignment and the arena holds window_len + alignment bytes.
        unsafe { self.alloc.as_mut_ptr().add(self.offset) }
    }

    /// Number of usable bytes in the aligned window.
    #[inline(always)]
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Largest chunk this buffer can stage, i.e. the window minus one alignment unit.
    #[inline(always)]
    pub fn chunk_size(&self) -> usize {
        self.window_len - self.alignment
    }

    /// Alignment of [`ScratchBuffer::as_mut_ptr`].
    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.alignment
    }
}

/// Allocates data with an alignment of 64 bytes.
///
/// # Parameters
///
/// - `num_bytes`: The number of bytes to allocate
///
/// # Returns
///
/// A [`RawAlloc`] containing the allocated data
pub fn allocate_align_64(num_bytes: usize) -> Result<RawAlloc, AllocateError> {
    let layout = Layout::from_size_align(num_bytes, 64)?;
    Ok(RawAlloc::new(layout)?)
}

/// An error that happened in memory allocation within the library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocateError {
    /// An error that occurred while creating a layout for allocation.
    #[error("Invalid layout provided. Likely due to `num_bytes` in `allocate_align_64` being larger than isize::MAX. {0}")]
    LayoutError(#[from] LayoutError),

    /// An error that occurred while allocating memory.
    #[error(transparent)]
    AllocationFailed(#[from] AllocError),

    /// The requested alignment was not a power of two.
    #[error("Alignment {0} is not a power of two")]
    InvalidAlignment(usize),

    /// Chunk size plus alignment padding does not fit in a `usize`.
    #[error("Scratch buffer size overflows usize")]
    SizeOverflow,
}
