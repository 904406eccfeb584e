//! View modules and the sources that produce them.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::LoadFailure;

/// A loaded view module. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModule {
    /// Name of the route this module belongs to.
    pub route: String,
    /// Module source text.
    pub source: Arc<str>,
}

/// Future returned by a [`ModuleSource`].
pub type SourceFuture = BoxFuture<'static, Result<String, LoadFailure>>;

/// A deferred factory for a view module's code.
///
/// Calling `fetch` starts the retrieval; the loader guarantees it is called
/// at most once per in-flight load.
pub trait ModuleSource: Send + Sync + fmt::Debug {
    fn fetch(&self) -> SourceFuture;
}

/// Reads a module from disk on first activation.
#[derive(Debug, Clone)]
pub struct FileModule {
    path: PathBuf,
}

impl FileModule {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ModuleSource for FileModule {
    fn fetch(&self) -> SourceFuture {
        let path = self.path.clone();
        async move {
            let bytes = tokio::fs::read(&path).await?;
            let source = String::from_utf8(bytes)
                .map_err(|e| LoadFailure::Malformed(format!("{}: {}", path.display(), e)))?;
            if source.trim().is_empty() {
                return Err(LoadFailure::Malformed(format!("{} is empty", path.display())));
            }
            Ok(source)
        }
        .boxed()
    }
}

/// Adapts an async closure into a [`ModuleSource`].
pub struct FnModule<F> {
    label: &'static str,
    factory: F,
}

impl<F, Fut> FnModule<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, LoadFailure>> + Send + 'static,
{
    pub fn new(label: &'static str, factory: F) -> Self {
        Self { label, factory }
    }
}

impl<F> fmt::Debug for FnModule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModule").field("label", &self.label).finish()
    }
}

impl<F, Fut> ModuleSource for FnModule<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, LoadFailure>> + Send + 'static,
{
    fn fetch(&self) -> SourceFuture {
        (self.factory)().boxed()
    }
}

/// Shorthand for an `Arc`'d closure-backed source.
pub fn from_fn<F, Fut>(label: &'static str, factory: F) -> Arc<dyn ModuleSource>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, LoadFailure>> + Send + 'static,
{
    Arc::new(FnModule::new(label, factory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_module_reads_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<template><div>home</div></template>").unwrap();

        let source = FileModule::new(file.path()).fetch().await.unwrap();
        assert!(source.contains("home"));
    }

    #[tokio::test]
    async fn test_file_module_missing() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileModule::new(dir.path().join("Nope.vue")).fetch().await;
        assert!(matches!(result, Err(LoadFailure::Missing)));
    }

    #[tokio::test]
    async fn test_file_module_rejects_binary_and_empty() {
        let mut binary = tempfile::NamedTempFile::new().unwrap();
        binary.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        let result = FileModule::new(binary.path()).fetch().await;
        assert!(matches!(result, Err(LoadFailure::Malformed(_))));

        let empty = tempfile::NamedTempFile::new().unwrap();
        let result = FileModule::new(empty.path()).fetch().await;
        assert!(matches!(result, Err(LoadFailure::Malformed(_))));
    }
}
