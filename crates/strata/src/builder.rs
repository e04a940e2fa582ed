//! Fluent assembly of a [`StoreFile`].

use std::path::PathBuf;
use std::sync::Arc;

use strata_file::{
    ErrorPolicy, FileError, FormatCodec, ReloadPolicy, StoreFile, StoreOptions,
};
use strata_formats::{JsonCodec, TomlCodec};
use strata_serialize::SerializerRegistry;
use strata_tree::MapKind;

/// Builder collecting a store's path, format, separator, policies, ordering
/// mode, hooks, and serializer registry before opening it.
pub struct StoreBuilder {
    path: PathBuf,
    codec: Arc<dyn FormatCodec>,
    options: StoreOptions,
}

impl StoreBuilder {
    /// Start a builder over an explicit codec.
    pub fn new(path: impl Into<PathBuf>, codec: impl FormatCodec + 'static) -> Self {
        Self {
            path: path.into(),
            codec: Arc::new(codec),
            options: StoreOptions::default(),
        }
    }

    /// A JSON-backed store at `path`.
    pub fn json(path: impl Into<PathBuf>) -> Self {
        Self::new(path, JsonCodec)
    }

    /// A TOML-backed store at `path`.
    pub fn toml(path: impl Into<PathBuf>) -> Self {
        Self::new(path, TomlCodec)
    }

    /// Key-path separator (default `"."`).
    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.options.separator = separator.into();
        self
    }

    /// Branch ordering mode (default [`MapKind::Unordered`]).
    pub fn map_kind(mut self, kind: MapKind) -> Self {
        self.options.kind = kind;
        self
    }

    /// When to reload from disk (default [`ReloadPolicy::Intelligent`]).
    pub fn reload_policy(mut self, policy: ReloadPolicy) -> Self {
        self.options.reload_policy = policy;
        self
    }

    /// What a failed reload does (default [`ErrorPolicy::Clear`]).
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.options.error_policy = policy;
        self
    }

    /// Serializer registry for the serializable accessors (default: the
    /// process-wide shared registry).
    pub fn registry(mut self, registry: Arc<SerializerRegistry>) -> Self {
        self.options.registry = registry;
        self
    }

    /// Callback after every successful reload.
    pub fn on_reload(mut self, hook: impl Fn(&StoreFile) + Send + Sync + 'static) -> Self {
        self.options.reload_hook = Some(Box::new(hook));
        self
    }

    /// Callback when the error-lock transitions to set.
    pub fn on_error(mut self, hook: impl Fn(&StoreFile) + Send + Sync + 'static) -> Self {
        self.options.error_hook = Some(Box::new(hook));
        self
    }

    /// Create the backing file if needed, perform the initial load, and
    /// return the store.
    pub fn open(self) -> Result<StoreFile, FileError> {
        StoreFile::open(self.path, self.codec, self.options)
    }
}
