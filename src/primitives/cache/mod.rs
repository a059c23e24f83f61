#![forbid(unsafe_code)]

mod cache;
mod frame;

pub use cache::{CacheOptions, CacheStats, NodeCache, NodeStore, PinnedNode};
