/*!
# Virtual Runtime-Image Filesystem

A read-only view over the packed module image of a Java runtime, so
standard-library types resolve without unpacking the image to disk.

Virtual paths follow the convention `<runtimeHome>!<pathInsideImage>`,
with `!` as the fixed separator. Lookups are soft: malformed paths and
unreadable homes answer `None`, because callers routinely try paths
that may legitimately not exist.
*/

pub mod image;
pub mod node;

use std::cell::RefCell;
use std::collections::HashMap;

pub use image::{ImageHandle, IMAGE_PATH};
pub use node::JrtVirtualFile;

/// The separator between the runtime home and the path inside the image.
pub const PATH_SEPARATOR: char = '!';

/// Splits a virtual path on the first separator into
/// `(runtimeHome, pathInsideImage)`.
///
/// Returns `None`, the caller-visible "not found", when the path
/// carries no separator.
pub fn split_path(path: &str) -> Option<(&str, &str)> {
    let separator = path.find(PATH_SEPARATOR)?;
    Some((&path[..separator], &path[separator + 1..]))
}

/// The virtual filesystem over packed runtime images.
///
/// Root nodes are cached per runtime home, including negative results,
/// so repeated lookups against the same home stay cheap.
#[derive(Default)]
pub struct JrtFileSystem {
    roots: RefCell<HashMap<String, Option<JrtVirtualFile>>>,
}

impl JrtFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// The protocol this filesystem serves.
    pub fn protocol(&self) -> &'static str {
        "jrt"
    }

    /// Resolves a virtual path to a node.
    ///
    /// Returns `None` for paths without a separator, for homes without
    /// a readable packed image, and for entries missing from the image.
    pub fn find_file_by_path(&self, path: &str) -> Option<JrtVirtualFile> {
        let (home, inside) = split_path(path)?;
        let root = self.root_for(home)?;
        if inside.is_empty() {
            return Some(root);
        }
        root.find_file_by_relative_path(inside)
    }

    /// Refreshing is a no-op: the image is immutable for the process
    /// lifetime.
    pub fn refresh(&self, _asynchronous: bool) {}

    /// Same as [`find_file_by_path`][Self::find_file_by_path]; there is
    /// nothing to refresh.
    pub fn refresh_and_find_file_by_path(&self, path: &str) -> Option<JrtVirtualFile> {
        self.find_file_by_path(path)
    }

    fn root_for(&self, home: &str) -> Option<JrtVirtualFile> {
        if let Some(cached) = self.roots.borrow().get(home) {
            return cached.clone();
        }
        let root = image::handle_for(home).map(JrtVirtualFile::root);
        self.roots
            .borrow_mut()
            .insert(home.to_owned(), root.clone());
        root
    }
}
