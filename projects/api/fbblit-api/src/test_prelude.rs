//! Test prelude for the fbblit API.
//!
//! Common imports plus a reference rectangle move to compare backends against.

pub use alloc::{vec, vec::Vec};
pub use rstest::rstest;

/// `len` bytes of a pattern that does not repeat every row of any power-of-two stride.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|x| (x * 7 + x / 253) as u8).collect()
}

/// Moves a `width` x `height` pixel rectangle within `bytes` the obvious way: read every source
/// row first, then write every destination row.
pub fn reference_blit(
    bytes: &[u8],
    stride: usize,
    bytes_per_pixel: usize,
    (src_x, src_y): (i32, i32),
    (dst_x, dst_y): (i32, i32),
    (width, height): (i32, i32),
) -> Vec<u8> {
    let row_bytes = width as usize * bytes_per_pixel;
    let offset = |x: i32, y: i32, row: usize| (y as usize + row) * stride + x as usize * bytes_per_pixel;

    let rows: Vec<Vec<u8>> = (0..height as usize)
        .map(|row| {
            let start = offset(src_x, src_y, row);
            bytes[start..start + row_bytes].to_vec()
        })
        .collect();

    let mut out = bytes.to_vec();
    for (row, pixels) in rows.iter().enumerate() {
        let start = offset(dst_x, dst_y, row);
        out[start..start + row_bytes].copy_from_slice(pixels);
    }
    out
}
