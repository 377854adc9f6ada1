#![doc = include_str!(concat!("../", core::env!("CARGO_PKG_README")))]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod allocate;
pub mod bpp;
pub mod primitive;
pub mod region;
