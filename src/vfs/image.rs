/*!
# Packed Runtime Images

Opens the packed module image of a Java runtime
(`<runtimeHome>/lib/modules`, read as a zip archive) and serves entry
metadata and contents without extracting anything to disk.

Opening an image is expensive, so handles are kept in a process-scoped
cache keyed by the runtime home. The cache never evicts; it also keeps
negative results, so a lookup against a bogus home pays the I/O cost
only once.
*/

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::UNIX_EPOCH;

use once_cell::sync::Lazy;
use regex::Regex;
use zip::ZipArchive;

use crate::core::{PsiError, Result};

/// Location of the packed module image inside a runtime home.
pub const IMAGE_PATH: &str = "lib/modules";

/// The first runtime version whose image can be opened in place.
const DIRECT_OPEN_VERSION: u32 = 9;

trait ImageSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> ImageSource for T {}

/// Metadata of one entry inside a packed image.
#[derive(Debug, Clone, Copy)]
pub struct EntryInfo {
    pub is_dir: bool,
    pub size: u64,
}

/// An opened packed runtime image.
///
/// The directory structure is read once at open time; entry contents
/// are read on demand through the underlying archive.
pub struct ImageHandle {
    home: PathBuf,
    mtime_millis: u64,
    /// Inner paths without leading or trailing slashes; the empty path
    /// (the root) is implicit.
    entries: BTreeMap<String, EntryInfo>,
    archive: Mutex<ZipArchive<Box<dyn ImageSource>>>,
}

impl ImageHandle {
    /// Opens the packed image of the given runtime home.
    ///
    /// Runtimes of version [`DIRECT_OPEN_VERSION`] and later are read
    /// directly from the image file. Older runtimes are loaded into an
    /// isolated in-memory buffer first, which sidesteps the handle
    /// leakage the legacy image provider is known for.
    fn open(home: &Path) -> Result<Self> {
        let image = home.join(IMAGE_PATH);
        let metadata = fs::metadata(&image)?;
        if !metadata.is_file() {
            return Err(PsiError::invalid_argument(format!(
                "`{}` is not a packed runtime image",
                image.display()
            )));
        }
        let mtime_millis = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis() as u64);

        let direct = runtime_major_version(home).map_or(false, |v| v >= DIRECT_OPEN_VERSION);
        let source: Box<dyn ImageSource> = if direct {
            tracing::debug!(home = %home.display(), "opening runtime image in place");
            Box::new(File::open(&image)?)
        } else {
            tracing::debug!(home = %home.display(), "loading legacy runtime image into memory");
            Box::new(Cursor::new(fs::read(&image)?))
        };
        let mut archive = ZipArchive::new(source)
            .map_err(|e| PsiError::Parse(format!("unreadable runtime image: {e}")))?;

        let mut entries = BTreeMap::new();
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|e| PsiError::Parse(format!("corrupted runtime image entry: {e}")))?;
            let name = entry.name().trim_matches('/').to_owned();
            if name.is_empty() {
                continue;
            }
            let info = EntryInfo {
                is_dir: entry.is_dir(),
                size: entry.size(),
            };
            insert_with_ancestors(&mut entries, name, info);
        }

        Ok(Self {
            home: home.to_path_buf(),
            mtime_millis,
            entries,
            archive: Mutex::new(archive),
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The modification time of the image file, applied to every entry
    /// since the image is immutable.
    pub fn mtime_millis(&self) -> u64 {
        self.mtime_millis
    }

    /// Looks up the metadata of an inner path. The empty path is the
    /// image root, which always exists as a directory.
    pub fn lookup(&self, inner: &str) -> Option<EntryInfo> {
        if inner.is_empty() {
            return Some(EntryInfo {
                is_dir: true,
                size: 0,
            });
        }
        self.entries.get(inner).copied()
    }

    /// Names of the direct children of the given directory, in order.
    /// Non-directories and unknown paths list as empty.
    pub fn children_of(&self, inner: &str) -> Vec<String> {
        let prefix = if inner.is_empty() {
            String::new()
        } else {
            format!("{inner}/")
        };
        let mut names = Vec::new();
        for key in self.entries.range(prefix.clone()..) {
            let (path, _) = key;
            if !path.starts_with(&prefix) {
                break;
            }
            let rest = &path[prefix.len()..];
            if !rest.is_empty() && !rest.contains('/') {
                names.push(rest.to_owned());
            }
        }
        names
    }

    /// Reads the full contents of a file entry.
    pub fn read_bytes(&self, inner: &str) -> io::Result<Vec<u8>> {
        let mut archive = lock(&self.archive);
        let mut entry = archive
            .by_name(inner)
            .map_err(|e| io::Error::new(io::ErrorKind::NotFound, e.to_string()))?;
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

fn insert_with_ancestors(entries: &mut BTreeMap<String, EntryInfo>, name: String, info: EntryInfo) {
    // Zip archives often omit explicit directory entries.
    let mut ancestor = name.as_str();
    while let Some(slash) = ancestor.rfind('/') {
        ancestor = &ancestor[..slash];
        entries
            .entry(ancestor.to_owned())
            .or_insert(EntryInfo { is_dir: true, size: 0 });
    }
    entries.insert(name, info);
}

static IMAGE_CACHE: Lazy<Mutex<HashMap<PathBuf, Option<Arc<ImageHandle>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Resolves or opens the cached image handle for a runtime home.
///
/// Returns `None`, and caches the outcome, when the home has no
/// readable packed image. The cache lock serializes population, so each
/// distinct home is opened at most once per process.
pub fn handle_for(home: &str) -> Option<Arc<ImageHandle>> {
    let key = PathBuf::from(home);
    let mut cache = lock(&IMAGE_CACHE);
    if let Some(cached) = cache.get(&key) {
        return cached.clone();
    }
    let opened = match ImageHandle::open(&key) {
        Ok(handle) => Some(Arc::new(handle)),
        Err(error) => {
            tracing::warn!(
                home = %key.display(),
                %error,
                "cannot open a packed runtime image for the home"
            );
            None
        }
    };
    cache.insert(key, opened.clone());
    opened
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// The major version of the runtime installed at `home`, parsed from
/// its `release` file. Legacy `1.x` version strings report `x`.
fn runtime_major_version(home: &Path) -> Option<u32> {
    static VERSION: Lazy<Regex> =
        Lazy::new(|| Regex::new(r#"JAVA_VERSION="([0-9][0-9._+-]*)""#).expect("a valid regex"));
    let release = fs::read_to_string(home.join("release")).ok()?;
    let captures = VERSION.captures(&release)?;
    let mut parts = captures[1].split('.');
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}
