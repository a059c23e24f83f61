use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::storage::ftree::{FtTree, TreeImage};

use crate::admin::error::{AdminError, Result};
use crate::admin::options::AdminOpenOptions;

/// Reads a JSON tree image from `path`.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or not a valid image.
pub fn load_image(path: &Path) -> Result<TreeImage> {
    if !path.exists() {
        return Err(AdminError::missing_image(path));
    }
    let file = File::open(path)?;
    Ok(TreeImage::read_from(BufReader::new(file))?)
}

/// Opens the tree stored as an image at `path`.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded or contains malformed nodes.
pub fn open_tree(path: &Path, opts: &AdminOpenOptions) -> Result<FtTree> {
    let image = load_image(path)?;
    let tree = FtTree::from_image(image, opts.comparator.clone(), opts.cache.clone())?;
    Ok(tree)
}
