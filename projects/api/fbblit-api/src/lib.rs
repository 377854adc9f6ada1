#![doc = include_str!("../README.MD")]
#![no_std]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod backend;
pub mod backends;
pub mod dispatch;
pub mod error;
pub mod request;

#[cfg(test)]
mod test_prelude;

// Re-export main functionality at crate root
pub use backend::{Backend, Operation, Outcome};
pub use backends::cpu::{CpuBackend, CpuBackendSettings};
pub use backends::generic::GenericBackend;
pub use backends::hardware::{
    EngineCapabilities, HardwareBackend, HardwareBlit, HardwareEngine, HardwareFill,
    HardwareThresholds,
};
pub use dispatch::{BlitContext, BlitContextBuilder, Rect};
pub use error::{InitError, InitResult, RequestError, RequestResult};
pub use request::{BlitRequest, CopyDirection, FillRequest, PixelBuffer};

// Types callers need to describe memory and depths.
pub use fbblit_common::bpp::BitsPerPixel;
pub use fbblit_common::region::MemoryRegion;
