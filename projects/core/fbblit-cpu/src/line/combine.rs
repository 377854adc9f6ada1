//! Scanlines whose two ends sit at different offsets inside a word.
//!
//! Every destination word is assembled from two neighbouring source words: the bytes still
//! pending from the previous load (the carry) followed by the leading bytes of the next one.
//! Only aligned loads and stores are issued, and nothing outside `[src, src + len)` is read.
//!
//! The carry is kept in memory byte order: `carry.to_ne_bytes()[..n]` are the `n` pending bytes.
//! Only the shifts used to move bytes between words depend on the target's endianness.

use super::{copy_small, store_fragment, SMALL_LINE_LIMIT, WORD_SIZE};
use multiversion::multiversion;

/// Appends the leading bytes of `next` behind the `carry_bits / 8` pending bytes in `carry`.
#[cfg(target_endian = "little")]
#[inline(always)]
fn merge(carry: u32, next: u32, carry_bits: u32) -> u32 {
    carry | (next << carry_bits)
}

/// Moves the trailing bytes of `word` to the front, discarding the first `consumed_bits / 8`.
#[cfg(target_endian = "little")]
#[inline(always)]
fn carry_out(word: u32, consumed_bits: u32) -> u32 {
    word >> consumed_bits
}

#[cfg(target_endian = "big")]
#[inline(always)]
fn merge(carry: u32, next: u32, carry_bits: u32) -> u32 {
    carry | (next >> carry_bits)
}

#[cfg(target_endian = "big")]
#[inline(always)]
fn carry_out(word: u32, consumed_bits: u32) -> u32 {
    word << consumed_bits
}

/// Copies a line whose source starts on a word boundary and whose destination does not.
///
/// The first source word supplies the destination's leading fragment; the rest of it becomes
/// the initial carry.
///
/// # Safety
///
/// - `src` must be valid for reads of `len` bytes
/// - `dst` must be valid for writes of `len` bytes
/// - The two ranges must not overlap
/// - `src` must be word aligned and `dst` must not be
pub unsafe fn source_aligned(dst: *mut u8, src: *const u8, len: usize) {
    debug_assert_eq!(src as usize & (WORD_SIZE - 1), 0, "source must be word aligned");
    debug_assert_ne!(dst as usize & (WORD_SIZE - 1), 0, "destination must be misaligned");

    if len <= SMALL_LINE_LIMIT {
        copy_small(dst, src, len);
        return;
    }

    let pending = dst as usize & (WORD_SIZE - 1);
    let head = WORD_SIZE - pending;

    let first = (src as *const u32).read();
    store_fragment(dst, &first.to_ne_bytes()[..head]);
    let carry = carry_out(first, (head * 8) as u32);

    finish(
        dst.add(head) as *mut u32,
        src.add(WORD_SIZE) as *const u32,
        len - WORD_SIZE,
        carry,
        pending,
    );
}

/// Copies a line whose source is not word aligned, after bringing the destination onto a word
/// boundary if needed.
///
/// The bytes up to the source's next word boundary become the initial carry.
///
/// # Safety
///
/// - `src` must be valid for reads of `len` bytes
/// - `dst` must be valid for writes of `len` bytes
/// - The two ranges must not overlap
/// - `src` and `dst` must sit at different offsets within a word
pub unsafe fn destination_aligned(dst: *mut u8, src: *const u8, len: usize) {
    debug_assert_ne!(
        src as usize & (WORD_SIZE - 1),
        dst as usize & (WORD_SIZE - 1),
        "ends must sit at different word offsets"
    );

    if len <= SMALL_LINE_LIMIT {
        copy_small(dst, src, len);
        return;
    }

    let mut src = src;
    let mut dst = dst;
    let mut remaining = len;

    // Leading fragment, up to the destination's first word boundary.
    while dst as usize & (WORD_SIZE - 1) != 0 {
        if (src as usize | dst as usize) & 1 == 0 {
            (dst as *mut u16).write((src as *const u16).read());
            src = src.add(2);
            dst = dst.add(2);
            remaining -= 2;
        } else {
            dst.write(src.read());
            src = src.add(1);
            dst = dst.add(1);
            remaining -= 1;
        }
    }

    // Source bytes up to its next word boundary.
    let pending = WORD_SIZE - (src as usize & (WORD_SIZE - 1));
    let mut bytes = [0u8; WORD_SIZE];
    for (x, byte) in bytes[..pending].iter_mut().enumerate() {
        *byte = src.add(x).read();
    }
    let carry = u32::from_ne_bytes(bytes);

    finish(
        dst as *mut u32,
        src.add(pending) as *const u32,
        remaining - pending,
        carry,
        pending,
    );
}

/// Streams the rest of the line through the carry and flushes the tail.
///
/// `available` is the number of source bytes left at `src`; the destination still needs
/// `available + pending` bytes.
#[inline(always)]
unsafe fn finish(dst: *mut u32, src: *const u32, available: usize, carry: u32, pending: usize) {
    debug_assert!(pending > 0 && pending < WORD_SIZE);

    let carry_bits = (pending * 8) as u32;
    let words = available / WORD_SIZE;

    // Single words until the destination reaches a 32-byte boundary.
    let lead = (((32 - (dst as usize & 31)) & 31) / WORD_SIZE).min(words);
    let carry = stream_words(dst, src, lead, carry, carry_bits);
    let carry = stream_blocks(dst.add(lead), src.add(lead), words - lead, carry, carry_bits);

    let dst = dst.add(words) as *mut u8;
    let src = src.add(words) as *const u8;
    let tail_src = available - words * WORD_SIZE;

    // At most 3 carried bytes and 3 source bytes remain.
    let mut tail = [0u8; 8];
    tail[..pending].copy_from_slice(&carry.to_ne_bytes()[..pending]);
    for x in 0..tail_src {
        tail[pending + x] = src.add(x).read();
    }
    store_fragment(dst, &tail[..pending + tail_src]);
}

/// Writes `words` destination words, one per loaded source word. Returns the new carry.
#[inline(always)]
unsafe fn stream_words(
    dst: *mut u32,
    src: *const u32,
    words: usize,
    carry: u32,
    carry_bits: u32,
) -> u32 {
    let consumed_bits = 32 - carry_bits;
    let mut carry = carry;
    for x in 0..words {
        let next = src.add(x).read();
        dst.add(x).write(merge(carry, next, carry_bits));
        carry = carry_out(next, consumed_bits);
    }
    carry
}

/// Same as [`stream_words`], eight words (one 32-byte block) per iteration.
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
unsafe fn stream_blocks(
    dst: *mut u32,
    src: *const u32,
    words: usize,
    carry: u32,
    carry_bits: u32,
) -> u32 {
    unsafe {
        let consumed_bits = 32 - carry_bits;
        let mut src = src;
        let mut dst = dst;
        let mut carry = carry;

        let block_end = src.add(words & !7);
        while src < block_end {
            let w0 = src.read();
            let w1 = src.add(1).read();
            let w2 = src.add(2).read();
            let w3 = src.add(3).read();
            let w4 = src.add(4).read();
            let w5 = src.add(5).read();
            let w6 = src.add(6).read();
            let w7 = src.add(7).read();

            dst.write(merge(carry, w0, carry_bits));
            dst.add(1).write(merge(carry_out(w0, consumed_bits), w1, carry_bits));
            dst.add(2).write(merge(carry_out(w1, consumed_bits), w2, carry_bits));
            dst.add(3).write(merge(carry_out(w2, consumed_bits), w3, carry_bits));
            dst.add(4).write(merge(carry_out(w3, consumed_bits), w4, carry_bits));
            dst.add(5).write(merge(carry_out(w4, consumed_bits), w5, carry_bits));
            dst.add(6).write(merge(carry_out(w5, consumed_bits), w6, carry_bits));
            dst.add(7).write(merge(carry_out(w6, consumed_bits), w7, carry_bits));
            carry = carry_out(w7, consumed_bits);

            src = src.add(8);
            dst = dst.add(8);
        }

        stream_words(dst, src, words & 7, carry, carry_bits)
    }
}
