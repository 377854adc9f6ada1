#![no_main]

// Checks the word-combine line copier against a plain slice copy, for every alignment pair, and
// that it never writes outside the destination line.

use fbblit_cpu::line::copy_line;
use libfuzzer_sys::{arbitrary, fuzz_target};

const GUARD: usize = 32;
const SENTINEL: u8 = 0xCC;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct LineInput {
    pub src_offset: u8,
    pub dst_offset: u8,
    pub bytes: Vec<u8>,
}

fuzz_target!(|input: LineInput| {
    let src_offset = (input.src_offset % 32) as usize;
    let dst_offset = (input.dst_offset % 32) as usize;
    let len = input.bytes.len().min(4096);

    // 32-byte aligned storage for both lines.
    let mut src_storage = vec![0u8; len + src_offset + GUARD + 32];
    let src_start = src_storage.as_ptr().align_offset(32) + src_offset;
    src_storage[src_start..src_start + len].copy_from_slice(&input.bytes[..len]);

    let mut dst_storage = vec![SENTINEL; len + dst_offset + GUARD * 2 + 32];
    let dst_start = dst_storage.as_ptr().align_offset(32) + GUARD + dst_offset;

    unsafe {
        copy_line(
            dst_storage.as_mut_ptr().add(dst_start),
            src_storage.as_ptr().add(src_start),
            len,
        );
    }

    assert_eq!(
        &dst_storage[dst_start..dst_start + len],
        &input.bytes[..len],
        "copy_line differs for src offset {src_offset}, dst offset {dst_offset}, len {len}"
    );
    assert!(
        dst_storage[..dst_start].iter().all(|&b| b == SENTINEL),
        "copy_line wrote before the line (src offset {src_offset}, dst offset {dst_offset}, len {len})"
    );
    assert!(
        dst_storage[dst_start + len..].iter().all(|&b| b == SENTINEL),
        "copy_line wrote past the line (src offset {src_offset}, dst offset {dst_offset}, len {len})"
    );
});
