//! The backends shipped with the crate.
//!
//! - [`hardware`]: forwards large framebuffer requests to a host 2D engine
//! - [`cpu`]: CPU kernels for uncached sources and cached fast path copies
//! - [`generic`]: the always-succeeding software fallback

pub mod cpu;
pub mod generic;
pub mod hardware;
