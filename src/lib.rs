//! Fractal tree node model, a pin-counting node cache, and an offline
//! consistency verifier.

#![warn(missing_docs)]

pub mod admin;
pub mod primitives;
pub mod storage;
pub mod types;
