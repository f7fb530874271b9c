/*!
# Virtual Files

Read-only nodes over a packed runtime image.

A node represents one path inside an image and renders its full virtual
path as `<runtimeHome>!<pathInsideImage>`. Children are computed once
and memoized; the parent link is a back-reference, not an ownership
edge. The image never changes during the process lifetime, so nodes are
immutable after creation.
*/

use std::io;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use once_cell::unsync::OnceCell;

use crate::core::{PsiError, Result};

use super::image::ImageHandle;
use super::PATH_SEPARATOR;

struct NodeData {
    handle: Arc<ImageHandle>,
    /// Path inside the image; empty for the root.
    inner: String,
    parent: Weak<NodeData>,
    children: OnceCell<Vec<JrtVirtualFile>>,
}

/// A file or directory inside a packed runtime image.
#[derive(Clone)]
pub struct JrtVirtualFile(Rc<NodeData>);

impl PartialEq for JrtVirtualFile {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0.handle, &other.0.handle) && self.0.inner == other.0.inner
    }
}

impl Eq for JrtVirtualFile {}

impl JrtVirtualFile {
    /// The root node of an opened image.
    pub(crate) fn root(handle: Arc<ImageHandle>) -> Self {
        Self(Rc::new(NodeData {
            handle,
            inner: String::new(),
            parent: Weak::new(),
            children: OnceCell::new(),
        }))
    }

    fn child_of(&self, name: &str) -> Self {
        let inner = if self.0.inner.is_empty() {
            name.to_owned()
        } else {
            format!("{}/{name}", self.0.inner)
        };
        Self(Rc::new(NodeData {
            handle: self.0.handle.clone(),
            inner,
            parent: Rc::downgrade(&self.0),
            children: OnceCell::new(),
        }))
    }

    /// The last segment of the path; empty for the image root.
    pub fn name(&self) -> &str {
        self.0
            .inner
            .rsplit('/')
            .next()
            .unwrap_or(self.0.inner.as_str())
    }

    /// The full virtual path, `<home>!<innerPath>`, system-independent.
    pub fn path(&self) -> String {
        format!(
            "{}{PATH_SEPARATOR}{}",
            self.0.handle.home().display(),
            self.0.inner
        )
        .replace('\\', "/")
    }

    /// Recomputed from the image attributes on every call; never stale
    /// because the image is immutable.
    pub fn is_directory(&self) -> bool {
        self.0
            .handle
            .lookup(&self.0.inner)
            .map_or(false, |info| info.is_dir)
    }

    /// The image is read-only for the process lifetime.
    pub fn is_writable(&self) -> bool {
        false
    }

    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn parent(&self) -> Option<JrtVirtualFile> {
        self.0.parent.upgrade().map(JrtVirtualFile)
    }

    /// The children of this directory, computed once and memoized.
    /// Files and unknown paths list as the empty sentinel.
    pub fn children(&self) -> &[JrtVirtualFile] {
        self.0.children.get_or_init(|| {
            let names = self.0.handle.children_of(&self.0.inner);
            if names.is_empty() {
                tracing::debug!(path = %self.path(), "no children listed for the virtual path");
            }
            names.iter().map(|name| self.child_of(name)).collect()
        })
    }

    /// Walks `relative` (slash-separated) down from this node.
    pub fn find_file_by_relative_path(&self, relative: &str) -> Option<JrtVirtualFile> {
        let mut current = self.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            let next = current
                .children()
                .iter()
                .find(|child| child.name() == segment)?
                .clone();
            current = next;
        }
        Some(current)
    }

    /// The full contents of this file.
    pub fn contents_to_byte_array(&self) -> Result<Vec<u8>> {
        if self.is_directory() {
            return Err(PsiError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{}` is a directory", self.path()),
            )));
        }
        Ok(self.0.handle.read_bytes(&self.0.inner)?)
    }

    /// The size of this entry in bytes.
    pub fn length(&self) -> u64 {
        self.0
            .handle
            .lookup(&self.0.inner)
            .map_or(0, |info| info.size)
    }

    /// Modification time in milliseconds since the epoch, taken from
    /// the immutable image file.
    pub fn timestamp(&self) -> u64 {
        self.0.handle.mtime_millis()
    }

    pub fn modification_stamp(&self) -> u64 {
        0
    }

    /// A no-op: the image cannot change while the process runs.
    pub fn refresh(&self, _asynchronous: bool, _recursive: bool) {}

    /// Writing into the image is not supported and fails loudly.
    pub fn output_stream(&self) -> Result<Box<dyn io::Write>> {
        Err(PsiError::unsupported(format!(
            "cannot open an output stream for the read-only virtual file `{}`",
            self.path()
        )))
    }
}

impl std::fmt::Debug for JrtVirtualFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JrtVirtualFile({})", self.path())
    }
}
