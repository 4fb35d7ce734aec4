//! Model persistence.
//!
//! A [`ModelSource`] names a snapshot file by its canonical location and records
//! whether it may be written. A [`ModelAccess`] reads a model from a source and
//! writes one back; [`FileModelAccess`] does so with the binary format of
//! [`snapshot`]. [`AutoSave`] plugs an access into a model as a
//! [`CommitHook`] so that every committed change is persisted.
//!
//! # Key Components
//!
//! - [`ModelSource`] / [`SourceCache`] - deduplicated snapshot locations
//! - [`ModelAccess`] / [`FileModelAccess`] - reading and writing models
//! - [`AutoSave`] - persistence after each commit
//! - [`snapshot`] - the stream codec, usable with any `Read` / `Write`
//! - [`io`] / [`parser`] - primitive encoding underneath the codec
//!
//! # Examples
//!
//! ```rust,no_run
//! use edgeloom::file::SourceCache;
//! use edgeloom::model::{DefaultModelFactory, ModelFactory};
//!
//! let factory = DefaultModelFactory::new();
//! let cache = SourceCache::new();
//! let source = cache.source("graph.elgm", true)?;
//! let access = factory.create_access(source);
//!
//! let model = factory.create_model();
//! model.start_transaction()?;
//! model.add_vertex(factory.create_vertex(10, 10, 0, 1.0))?;
//! model.end_transaction()?;
//! access.write(&model)?;
//!
//! let restored = access.read()?;
//! assert_eq!(restored.vertex_count(), 1);
//! # Ok::<(), edgeloom::Error>(())
//! ```

pub mod io;
pub mod parser;
pub mod snapshot;

use std::fmt;
use std::fs;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use dashmap::DashMap;
use tracing::{debug, info};

use crate::{
    model::{CommitHook, GraphModel},
    Error, ModelConfig, Result,
};

/// The location of a model snapshot.
#[derive(Debug, PartialEq, Eq)]
pub struct ModelSource {
    path: PathBuf,
    writable: bool,
}

impl ModelSource {
    /// Creates a source for `path`, resolved to its canonical location.
    ///
    /// The file itself need not exist yet, but its directory must.
    ///
    /// # Errors
    ///
    /// * [`Error::FileError`] if the location cannot be resolved
    /// * [`Error::IllegalArgument`] if `path` does not name a file
    pub fn new(path: impl AsRef<Path>, writable: bool) -> Result<Self> {
        Ok(ModelSource {
            path: canonical_location(path.as_ref())?,
            writable,
        })
    }

    /// Returns the canonical path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if models may be written to this source.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

impl fmt::Display for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if !self.writable {
            f.write_str(" (read-only)")?;
        }
        Ok(())
    }
}

fn canonical_location(path: &Path) -> Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(canonical) => Ok(canonical),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            let name = path
                .file_name()
                .ok_or_else(|| argument_error!("{} does not name a file", path.display()))?;
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            Ok(fs::canonicalize(parent)?.join(name))
        }
        Err(error) => Err(Error::FileError(error)),
    }
}

/// Hands out one shared [`ModelSource`] per canonical location.
///
/// Entries are held weakly: once every handle to a source is dropped, the next
/// request creates a fresh one. A live source is returned as is, whatever
/// `writable` flag the later request carries. Entries whose source has been
/// dropped are pruned whenever a new source is created.
#[derive(Debug, Default)]
pub struct SourceCache {
    sources: DashMap<PathBuf, Weak<ModelSource>>,
}

impl SourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the source for `path`, creating it if no live source exists.
    ///
    /// # Errors
    ///
    /// As [`ModelSource::new`].
    pub fn source(&self, path: impl AsRef<Path>, writable: bool) -> Result<Arc<ModelSource>> {
        let canonical = canonical_location(path.as_ref())?;
        let source = {
            let mut slot = self.sources.entry(canonical.clone()).or_default();
            if let Some(source) = slot.upgrade() {
                return Ok(source);
            }
            let source = Arc::new(ModelSource {
                path: canonical,
                writable,
            });
            *slot = Arc::downgrade(&source);
            source
        };

        // The entry guard is released above; retain locks every shard
        self.sources.retain(|_, cached| cached.strong_count() > 0);
        Ok(source)
    }

    /// Forgets the source cached for `path`.
    ///
    /// Returns `true` if an entry was removed. Handles already given out stay valid.
    pub fn evict(&self, path: impl AsRef<Path>) -> bool {
        let key = canonical_location(path.as_ref()).unwrap_or_else(|_| path.as_ref().to_path_buf());
        let removed = self.sources.remove(&key).is_some();
        if removed {
            info!(path = %key.display(), "evicted model source");
        }
        removed
    }

    /// Forgets every cached source.
    pub fn clear(&self) {
        let count = self.sources.len();
        self.sources.clear();
        info!(count, "cleared model source cache");
    }

    /// Returns the number of cached entries, including dead ones not yet pruned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Reads and writes the model stored at a [`ModelSource`].
pub trait ModelAccess: Send + Sync {
    /// Returns the source this access reads from and writes to.
    fn source(&self) -> &Arc<ModelSource>;

    /// Reads the stored model.
    ///
    /// Every vertex and edge of the result is owned by the returned model.
    ///
    /// # Errors
    ///
    /// I/O and format errors, see [`snapshot::read_model`].
    fn read(&self) -> Result<Arc<GraphModel>>;

    /// Replaces the stored model with `model`.
    ///
    /// # Errors
    ///
    /// [`Error::ReadOnlySource`] if the source is not writable, otherwise I/O errors.
    fn write(&self, model: &GraphModel) -> Result<()>;
}

/// [`ModelAccess`] for snapshot files on the local filesystem.
///
/// Reads and writes through one access are serialized.
#[derive(Debug)]
pub struct FileModelAccess {
    source: Arc<ModelSource>,
    config: ModelConfig,
    guard: Mutex<()>,
}

impl FileModelAccess {
    /// Creates an access using the default configuration.
    #[must_use]
    pub fn new(source: Arc<ModelSource>) -> Self {
        Self::with_config(source, ModelConfig::default())
    }

    /// Creates an access; `config.verify_checksum` controls digest checks on read.
    #[must_use]
    pub fn with_config(source: Arc<ModelSource>, config: ModelConfig) -> Self {
        FileModelAccess {
            source,
            config,
            guard: Mutex::new(()),
        }
    }
}

impl ModelAccess for FileModelAccess {
    fn source(&self) -> &Arc<ModelSource> {
        &self.source
    }

    fn read(&self) -> Result<Arc<GraphModel>> {
        let _guard = lock!(self.guard)?;
        let file = fs::File::open(self.source.path())?;
        let model = snapshot::read_model(&mut BufReader::new(file), self.config.verify_checksum)?;
        debug!(source = %self.source, vertices = model.vertex_count(), "read model");
        Ok(model)
    }

    fn write(&self, model: &GraphModel) -> Result<()> {
        if !self.source.is_writable() {
            return Err(Error::ReadOnlySource(self.source.path().to_path_buf()));
        }

        let _guard = lock!(self.guard)?;
        replace_contents(self.source.path(), || snapshot::encode_model(model))?;
        debug!(source = %self.source, vertices = model.vertex_count(), "wrote model");
        Ok(())
    }
}

/// Overwrites `path` with the output of `encode`; the file is untouched if encoding fails.
fn replace_contents(path: &Path, encode: impl FnOnce() -> Result<Vec<u8>>) -> Result<()> {
    let bytes = encode()?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Writes the model through a [`ModelAccess`] after every committed change.
///
/// ```rust,no_run
/// use edgeloom::file::{AutoSave, FileModelAccess, ModelSource};
/// use edgeloom::model::GraphModel;
/// use std::sync::Arc;
///
/// let source = Arc::new(ModelSource::new("graph.elgm", true)?);
/// let model = GraphModel::new();
/// model.set_commit_hook(Some(Arc::new(AutoSave::new(FileModelAccess::new(source)))));
/// # Ok::<(), edgeloom::Error>(())
/// ```
pub struct AutoSave {
    access: Box<dyn ModelAccess>,
}

impl AutoSave {
    /// Creates the hook around `access`.
    pub fn new(access: impl ModelAccess + 'static) -> Self {
        AutoSave {
            access: Box::new(access),
        }
    }

    /// Creates the hook around an already boxed access.
    #[must_use]
    pub fn from_boxed(access: Box<dyn ModelAccess>) -> Self {
        AutoSave { access }
    }

    /// Returns the wrapped access.
    #[must_use]
    pub fn access(&self) -> &dyn ModelAccess {
        self.access.as_ref()
    }
}

impl CommitHook for AutoSave {
    fn committed(&self, model: &GraphModel) -> Result<()> {
        self.access.write(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vertex;

    fn one_vertex_model() -> Arc<GraphModel> {
        let model = GraphModel::new();
        model.start_transaction().unwrap();
        model.add_vertex(Arc::new(Vertex::new(3, 4, 5))).unwrap();
        model.end_transaction().unwrap();
        model
    }

    #[test]
    fn test_source_canonicalization() {
        let dir = tempfile::tempdir().unwrap();
        let direct = ModelSource::new(dir.path().join("a.elgm"), true).unwrap();
        let dotted = ModelSource::new(dir.path().join(".").join("a.elgm"), true).unwrap();
        assert_eq!(direct.path(), dotted.path());
        assert!(direct.path().is_absolute());

        let missing_dir = ModelSource::new(dir.path().join("nope").join("a.elgm"), true);
        assert!(missing_dir.unwrap_err().is_io_error());
    }

    #[test]
    fn test_cache_deduplicates_and_evicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.elgm");
        let cache = SourceCache::new();

        let first = cache.source(&path, true).unwrap();
        let second = cache.source(dir.path().join(".").join("graph.elgm"), false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.is_writable());
        assert_eq!(cache.len(), 1);

        assert!(cache.evict(&path));
        assert!(!cache.evict(&path));
        let third = cache.source(&path, false).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));

        drop(third);
        let fourth = cache.source(&path, true).unwrap();
        assert!(fourth.is_writable());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_prunes_dropped_sources() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SourceCache::new();
        for name in ["a.elgm", "b.elgm", "c.elgm"] {
            drop(cache.source(dir.path().join(name), true).unwrap());
        }
        let kept = cache.source(dir.path().join("d.elgm"), true).unwrap();
        assert_eq!(cache.len(), 1);

        let again = cache.source(dir.path().join("d.elgm"), false).unwrap();
        assert!(Arc::ptr_eq(&kept, &again));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_encoding_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.elgm");
        let access = FileModelAccess::new(Arc::new(ModelSource::new(&path, true).unwrap()));
        access.write(&one_vertex_model()).unwrap();
        let before = fs::read(&path).unwrap();

        let result = replace_contents(&path, || Err(argument_error!("too many vertices")));
        assert!(result.unwrap_err().is_argument_error());
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(access.read().unwrap().vertex_count(), 1);
    }

    #[test]
    fn test_read_only_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(ModelSource::new(dir.path().join("ro.elgm"), false).unwrap());
        let access = FileModelAccess::new(source);
        let result = access.write(&one_vertex_model());
        assert!(matches!(result, Err(Error::ReadOnlySource(_))));
        assert!(!dir.path().join("ro.elgm").exists());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(ModelSource::new(dir.path().join("rw.elgm"), true).unwrap());
        let access = FileModelAccess::new(Arc::clone(&source));
        access.write(&one_vertex_model()).unwrap();

        let model = access.read().unwrap();
        assert_eq!(model.vertices()[0].position(), (3, 4, 5));
        assert!(Arc::ptr_eq(access.source(), &source));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = Arc::new(ModelSource::new(dir.path().join("absent.elgm"), true).unwrap());
        let result = FileModelAccess::new(source).read();
        assert!(matches!(result, Err(Error::FileError(_))));
    }

    #[test]
    fn test_autosave_hook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto.elgm");
        let source = Arc::new(ModelSource::new(&path, true).unwrap());
        let model = GraphModel::new();
        model.set_commit_hook(Some(Arc::new(AutoSave::new(FileModelAccess::new(source)))));

        model.start_transaction().unwrap();
        model.add_vertex(Arc::new(Vertex::new(1, 1, 1))).unwrap();
        model.end_transaction().unwrap();

        let file = fs::File::open(&path).unwrap();
        let restored = snapshot::read_model(&mut BufReader::new(file), true).unwrap();
        assert_eq!(restored.vertex_count(), 1);
    }
}
