//! Low-level primitives shared by the tree and its tools.

/// Pin-counting cache of decoded tree nodes.
///
/// Hands out pinned node views and keeps pinned frames resident until released.
pub mod cache;
