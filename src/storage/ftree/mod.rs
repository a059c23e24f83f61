#![forbid(unsafe_code)]

//! Fractal tree data model.
//!
//! Internal nodes buffer pending messages per child instead of applying them;
//! only leaf basements hold materialized entries.

mod basement;
mod builder;
mod image;
mod key;
mod message;
mod node;
mod tree;

pub use basement::{Basement, LeafEntry};
pub use builder::TreeBuilder;
pub use image::{MemStore, TreeImage};
pub use key::{Bytewise, CompareFn, Key, KeyComparator, KeyDisplay};
pub use message::{Message, MessageBuffer, MessageKind};
pub use node::{ChildBuffer, FtNode, NodeBody};
pub use tree::FtTree;
