//! Helpers shared by the integration tests.

#![allow(dead_code)]

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

/// Guard bytes on either side of a [`Surface`].
pub const GUARD: usize = 64;

/// A 32-byte aligned surface of `rows` rows, with guard bytes on both sides.
///
/// The guards let the uncached copier over-read without leaving the allocation, and let tests
/// check that nothing was written outside the surface.
pub struct Surface {
    storage: Vec<u8>,
    start: usize,
    pub stride: usize,
    pub rows: usize,
}

impl Surface {
    pub fn new(stride: usize, rows: usize) -> Self {
        let mut storage = vec![0xA5u8; stride * rows + GUARD * 2 + 32];
        let start = storage.as_ptr().align_offset(32) + GUARD;
        let pattern = patterned(stride * rows);
        storage[start..start + stride * rows].copy_from_slice(&pattern);
        Self {
            storage,
            start,
            stride,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.stride * self.rows
    }

    pub fn bytes(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.len()]
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let len = self.len();
        &mut self.storage[self.start..self.start + len]
    }

    /// The whole allocation, guards included.
    pub fn allocation(&self) -> &[u8] {
        &self.storage
    }

    /// Whether both guards still hold their fill byte.
    pub fn guards_intact(&self) -> bool {
        let end = self.start + self.len();
        self.storage[..self.start].iter().all(|&b| b == 0xA5)
            && self.storage[end..].iter().all(|&b| b == 0xA5)
    }
}
