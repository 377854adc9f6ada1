//! Scanlines whose two ends sit at the same offset inside a word.
//!
//! No shifting is needed: once the leading fragment brings both pointers onto a word boundary,
//! everything is moved with plain aligned loads and stores. If the two ends are also congruent
//! modulo 8, the bulk of the line goes through `u64`s, otherwise through `u32`s, 32 bytes per
//! iteration either way.

use super::{SMALL_LINE_LIMIT, WORD_SIZE};
use multiversion::multiversion;

/// Copies a line between mutually aligned buffers.
///
/// # Safety
///
/// - `src` must be valid for reads of `len` bytes
/// - `dst` must be valid for writes of `len` bytes
/// - The two ranges must not overlap
/// - `src as usize % 4 == dst as usize % 4`
pub unsafe fn copy_line(dst: *mut u8, src: *const u8, len: usize) {
    debug_assert_eq!(
        src as usize & (WORD_SIZE - 1),
        dst as usize & (WORD_SIZE - 1),
        "aligned::copy_line requires both ends at the same word offset"
    );

    let mut src = src;
    let mut dst = dst;
    let mut remaining = len;

    // Leading fragment, up to the first word boundary.
    while remaining != 0 && dst as usize & (WORD_SIZE - 1) != 0 {
        if dst as usize & 1 != 0 || remaining == 1 {
            dst.write(src.read());
            src = src.add(1);
            dst = dst.add(1);
            remaining -= 1;
        } else {
            (dst as *mut u16).write((src as *const u16).read());
            src = src.add(2);
            dst = dst.add(2);
            remaining -= 2;
        }
    }

    if remaining > SMALL_LINE_LIMIT {
        let bulk = copy_blocks(dst, src, remaining);
        src = src.add(bulk);
        dst = dst.add(bulk);
        remaining -= bulk;
    }

    // Whole words left over after the blocks, or all of them for a small line.
    while remaining >= WORD_SIZE {
        (dst as *mut u32).write((src as *const u32).read());
        src = src.add(WORD_SIZE);
        dst = dst.add(WORD_SIZE);
        remaining -= WORD_SIZE;
    }

    // Trailing fragment.
    if remaining >= 2 {
        (dst as *mut u16).write((src as *const u16).read());
        src = src.add(2);
        dst = dst.add(2);
        remaining -= 2;
    }
    if remaining != 0 {
        dst.write(src.read());
    }
}

/// Moves words up to the next 32-byte destination boundary, then whole 32-byte blocks.
///
/// Returns the number of bytes copied; less than 32 bytes are left for the caller.
///
/// # Safety
///
/// Both pointers word aligned, otherwise same as [`copy_line`].
#[inline(always)]
unsafe fn copy_blocks(dst: *mut u8, src: *const u8, len: usize) -> usize {
    let mut src = src;
    let mut dst = dst;
    let mut remaining = len;

    while remaining >= WORD_SIZE && dst as usize & 31 != 0 {
        (dst as *mut u32).write((src as *const u32).read());
        src = src.add(WORD_SIZE);
        dst = dst.add(WORD_SIZE);
        remaining -= WORD_SIZE;
    }

    let blocks = remaining / 32;
    if (src as usize ^ dst as usize) & 7 == 0 {
        copy_blocks_u64(dst as *mut u64, src as *const u64, blocks);
    } else {
        copy_blocks_u32(dst as *mut u32, src as *const u32, blocks);
    }

    len - remaining + blocks * 32
}

#[cfg_attr(
    not(feature = "nightly"),
    multiversion(targets(
        // x86-64-v3 without lahfsahf
        "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v2 without lahfsahf
        "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
    ))
)]
#[cfg_attr(
    feature = "nightly",
    multiversion(targets(
        // x86-64-v4 without lahfsahf
        "x86_64+avx+avx2+avx512bw+avx512cd+avx512dq+avx512f+avx512vl+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v3 without lahfsahf
        "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v2 without lahfsahf
        "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
    ))
)]
unsafe fn copy_blocks_u64(dst: *mut u64, src: *const u64, blocks: usize) {
    unsafe {
        let mut src = src;
        let mut dst = dst;
        let end = src.add(blocks * 4);
        while src < end {
            let a = src.read();
            let b = src.add(1).read();
            let c = src.add(2).read();
            let d = src.add(3).read();
            dst.write(a);
            dst.add(1).write(b);
            dst.add(2).write(c);
            dst.add(3).write(d);
            src = src.add(4);
            dst = dst.add(4);
        }
    }
}

#[cfg_attr(
    not(feature = "nightly"),
    multiversion(targets(
        // x86-64-v3 without lahfsahf
        "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v2 without lahfsahf
        "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
    ))
)]
#[cfg_attr(
    feature = "nightly",
    multiversion(targets(
        // x86-64-v4 without lahfsahf
        "x86_64+avx+avx2+avx512bw+avx512cd+avx512dq+avx512f+avx512vl+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v3 without lahfsahf
        "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
        // x86-64-v2 without lahfsahf
        "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
    ))
)]
unsafe fn copy_blocks_u32(dst: *mut u32, src: *const u32, blocks: usize) {
    unsafe {
        let mut src = src;
        let mut dst = dst;
        let end = src.add(blocks * 8);
        while src < end {
            let w0 = src.read();
            let w1 = src.add(1).read();
            let w2 = src.add(2).read();
            let w3 = src.add(3).read();
            let w4 = src.add(4).read();
            let w5 = src.add(5).read();
            let w6 = src.add(6).read();
            let w7 = src.add(7).read();
            dst.write(w0);
            dst.add(1).write(w1);
            dst.add(2).write(w2);
            dst.add(3).write(w3);
            dst.add(4).write(w4);
            dst.add(5).write(w5);
            dst.add(6).write(w6);
            dst.add(7).write(w7);
            src = src.add(8);
            dst = dst.add(8);
        }
    }
}
