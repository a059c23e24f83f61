#![forbid(unsafe_code)]

//! Tree administration utilities.
//!
//! This module provides the verifier, a shape summary, and helpers for opening
//! tree images from disk.

mod error;
mod options;
mod stats;
mod util;

/// Tree consistency verification.
pub mod verify;

/// Error types for administrative operations.
pub use error::{AdminError, Result};

/// Configuration options for opening a tree in admin mode.
pub use options::AdminOpenOptions;

/// Shape summary of a tree.
pub use stats::{stats, TreeStats};

/// Consistency verification entry points and report types.
pub use verify::{
    verify, verify_tree, VerifyCheck, VerifyCounts, VerifyFinding, VerifyOptions, VerifyReport,
    VerifyStatus,
};

/// Utility functions for loading tree images.
pub use util::{load_image, open_tree};
