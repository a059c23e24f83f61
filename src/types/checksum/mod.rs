#![forbid(unsafe_code)]

use super::{BlockNum, FullHash};

/// Hash a block identifier within one tree file.
///
/// The cache addresses nodes by `(block, fullhash)`; the node keeps a copy of the
/// value computed when it was written so the two can be compared on fetch.
pub fn block_fullhash(file_id: u32, block: BlockNum) -> FullHash {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&file_id.to_be_bytes());
    hasher.update(&block.0.to_be_bytes());
    FullHash(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullhash_changes_with_components() {
        let a = block_fullhash(1, BlockNum(2));
        assert_eq!(a, block_fullhash(1, BlockNum(2)));
        assert_ne!(a, block_fullhash(1, BlockNum(3)));
        assert_ne!(a, block_fullhash(7, BlockNum(2)));
    }
}
