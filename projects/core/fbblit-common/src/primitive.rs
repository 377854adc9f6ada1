//! Low level copy primitives.
//!
//! The chunked copier does not care how bytes are physically moved, only about the contract
//! below. Architecture specific memcpy variants (preloading, write-combining, non-temporal) plug
//! in by implementing [`CopyPrimitive`].
//!
//! # Overfetch
//!
//! Some primitives read past the requested range in order to always issue full bursts. They
//! declare how far with [`CopyPrimitive::OVERFETCH`]; callers that need exact-bound reads pick a
//! primitive whose overfetch is zero.

/// A forward, non-overlapping byte copy.
pub trait CopyPrimitive {
    /// Maximum number of bytes past `src + n` this primitive may read. Never written.
    const OVERFETCH: usize;

    /// Copies `n` bytes from `src` to `dst` and returns `dst`.
    ///
    /// # Safety
    ///
    /// - `src` must be valid for reads of `n + Self::OVERFETCH` bytes
    /// - `dst` must be valid for writes of `n` bytes
    /// - The two ranges must not overlap
    /// - Any extra alignment requirement documented by the implementation must hold
    unsafe fn copy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8;
}

/// The platform `memcpy`. Reads exactly `n` bytes.
#[derive(Debug, Copy, Clone, Default)]
pub struct NonOverfetchingCopy;

impl CopyPrimitive for NonOverfetchingCopy {
    const OVERFETCH: usize = 0;

    #[inline(always)]
    unsafe fn copy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
        core::ptr::copy_nonoverlapping(src, dst, n);
        dst
    }
}

/// Reads the source as volatile 32-byte bursts of four `u64`s.
///
/// Meant for fetching from device-mapped memory, where the compiler must neither split nor
/// merge the loads. The trailing `n % 32` bytes are fetched as `u32` words and then bytes, so no
/// byte past `src + n` is read.
///
/// # Alignment
///
/// Both `src` and `dst` must be 32-byte aligned.
#[derive(Debug, Copy, Clone, Default)]
pub struct AlignedBlockFetch;

impl CopyPrimitive for AlignedBlockFetch {
    const OVERFETCH: usize = 0;

    #[inline(always)]
    unsafe fn copy(dst: *mut u8, src: *const u8, n: usize) -> *mut u8 {
        debug_assert!(src as usize % 32 == 0, "source must be 32-byte aligned");
        debug_assert!(dst as usize % 32 == 0, "destination must be 32-byte aligned");

        let mut input = src;
        let mut output = dst;
        let block_end = src.add(n & !31);
        while input < block_end {
            let a = (input as *const u64).read_volatile();
            let b = (input.add(8) as *const u64).read_volatile();
            let c = (input.add(16) as *const u64).read_volatile();
            let d = (input.add(24) as *const u64).read_volatile();
            (output as *mut u64).write(a);
            (output.add(8) as *mut u64).write(b);
            (output.add(16) as *mut u64).write(c);
            (output.add(24) as *mut u64).write(d);
            input = input.add(32);
            output = output.add(32);
        }

        let word_end = src.add(n & !3);
        while input < word_end {
            (output as *mut u32).write((input as *const u32).read_volatile());
            input = input.add(4);
            output = output.add(4);
        }

        let end = src.add(n);
        while input < end {
            output.write(input.read_volatile());
            input = input.add(1);
            output = output.add(1);
        }

        dst
    }
}
