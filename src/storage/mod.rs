//! Tree storage structures.

/// Fractal tree nodes, message buffers, basements, and tree images.
pub mod ftree;
