//! Error types for building requests and backends.
//!
//! Declining a request is not an error: backends report it as [`crate::Outcome::NotHandled`] and
//! the cascade moves on. The types here only cover requests that could not be described safely in
//! the first place, and backends that could not be set up.

use fbblit_common::allocate::AllocateError;
use thiserror::Error;

/// Result type for the safe request constructors
pub type RequestResult<T> = Result<T, RequestError>;

/// Result type for backend construction
pub type InitResult<T> = Result<T, InitError>;

/// Reasons a safe request constructor refuses to describe a rectangle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Only 8, 16 and 32 bits per pixel can be described through the safe constructors.
    #[error("Unsupported pixel depth: {0} bits per pixel")]
    UnsupportedDepth(u8),

    /// A row of the rectangle, including its horizontal offset, does not fit in one stride.
    #[error("Stride of {stride} bytes is smaller than the {row_bytes} bytes a row reaches")]
    StrideTooSmall {
        /// Stride of the buffer, in bytes.
        stride: usize,
        /// Bytes from the start of a row to the end of the rectangle's row.
        row_bytes: usize,
    },

    /// The rectangle reaches past the end of the buffer.
    #[error("Rectangle needs {required} bytes, but the buffer only holds {actual} bytes")]
    RectangleOutOfBounds {
        /// Bytes from the start of the buffer to the end of the rectangle.
        required: usize,
        /// Length of the buffer.
        actual: usize,
    },

    /// A non-empty rectangle starts at a negative coordinate.
    #[error("Rectangle origin is negative")]
    NegativeOrigin,

    /// Box lists can only be checked against buffers laid out top to bottom.
    #[error("Cannot check boxes against a buffer with a negative stride")]
    NegativeStride,
}

/// Reasons a backend could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// The memory region ends before it begins.
    #[error("Memory region end {end:#x} lies before its begin {begin:#x}")]
    InvertedRegion {
        /// First address of the region.
        begin: usize,
        /// Address one past the end of the region.
        end: usize,
    },

    /// A size threshold was zero. Use 1 to admit every non-empty request.
    #[error("Threshold `{0}` must be non-zero")]
    ZeroThreshold(&'static str),

    /// The staging buffer used for uncached copies could not be allocated.
    #[error(transparent)]
    Allocate(#[from] AllocateError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use rstest::rstest;

    #[rstest]
    #[case::stride(
        RequestError::StrideTooSmall { stride: 16, row_bytes: 20 }.to_string(),
        "Stride of 16 bytes is smaller than the 20 bytes a row reaches"
    )]
    #[case::bounds(
        RequestError::RectangleOutOfBounds { required: 80, actual: 64 }.to_string(),
        "Rectangle needs 80 bytes, but the buffer only holds 64 bytes"
    )]
    #[case::region(
        InitError::InvertedRegion { begin: 0x2000, end: 0x1000 }.to_string(),
        "Memory region end 0x1000 lies before its begin 0x2000"
    )]
    fn messages_name_the_offending_values(#[case] message: String, #[case] expected: &str) {
        assert_eq!(message, expected);
    }
}
