#![forbid(unsafe_code)]

//! Shared identifiers and the crate-wide error type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Block checksum helpers.
pub mod checksum;

pub use checksum::block_fullhash;

/// On-disk identifier of a tree node.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockNum(pub u64);

/// Monotonic sequence number stamped on every buffered message.
#[derive(
    Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Msn(pub u64);

/// Content hash the cache uses to address a block.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FullHash(pub u32);

/// Transaction identifier carried by buffered messages.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(pub u64);

impl Msn {
    /// Reserved sentinel; no real message is ever stamped with it.
    pub const ZERO: Msn = Msn(0);

    /// Returns true when this is the reserved zero sentinel.
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl fmt::Display for BlockNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Msn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for FullHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u64> for Msn {
    fn from(value: u64) -> Self {
        Msn(value)
    }
}

impl From<u64> for BlockNum {
    fn from(value: u64) -> Self {
        BlockNum(value)
    }
}

/// Errors raised by the tree, its cache, and the verifier.
#[derive(thiserror::Error, Debug)]
pub enum FtError {
    /// Underlying I/O failure.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// Decoded node data is malformed.
    #[error("corruption: {0}")]
    Corruption(&'static str),
    /// Caller supplied an invalid argument.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
    /// The block is not known to the node store.
    #[error("block {0} not found")]
    NotFound(BlockNum),
    /// A precondition the verifier relies on is broken; not repairable data.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl FtError {
    pub(crate) fn fatal(message: impl Into<String>) -> Self {
        FtError::Fatal(message.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FtError>;
