#![no_main]

// Checks the chunked uncached memmove against `copy_within` for arbitrary overlapping moves
// inside one buffer, and that nothing outside the destination range changes.

use fbblit_cpu::twopass::{allocate_staging, uncached_memmove};
use libfuzzer_sys::{arbitrary, fuzz_target};

const PAD: usize = 64;

#[derive(Clone, Debug, arbitrary::Arbitrary)]
pub struct MoveInput {
    pub src: u16,
    pub dst: u16,
    pub size: u16,
    pub len: u16,
    pub seed: u8,
}

fuzz_target!(|input: MoveInput| {
    let len = (input.len as usize % 16384) + 1;
    let size = input.size as usize % (len + 1);
    let src = input.src as usize % (len - size + 1);
    let dst = input.dst as usize % (len - size + 1);

    // A 32-byte aligned buffer, padded so fetch windows stay inside the allocation.
    let mut storage = vec![0u8; len + PAD * 2 + 32];
    let start = storage.as_ptr().align_offset(32) + PAD;
    for (x, byte) in storage.iter_mut().enumerate() {
        *byte = (x as u8).wrapping_mul(29).wrapping_add(input.seed);
    }

    let mut expected = storage.clone();
    expected.copy_within(start + src..start + src + size, start + dst);

    let mut staging = allocate_staging().expect("staging allocation should succeed");
    unsafe {
        let base = storage.as_mut_ptr().add(start);
        uncached_memmove(base.add(dst), base.add(src), size, &mut staging);
    }

    assert_eq!(
        storage, expected,
        "uncached_memmove differs for src {src}, dst {dst}, size {size}, len {len}"
    );
});
