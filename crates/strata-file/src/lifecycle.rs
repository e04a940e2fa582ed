//! The per-file lifecycle state machine: reload triggering, error recovery,
//! and synchronous persistence.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use strata_serialize::SerializerRegistry;
use strata_tree::{Branch, MapKind, TreeData, Value};
use tracing::{debug, error, warn};

use crate::codec::FormatCodec;
use crate::error::{FileError, Result};
use crate::section::Section;
use crate::settings::{ErrorPolicy, ReloadPolicy};
use crate::storage::DataStorage;

/// Callback invoked with the owning store file, outside the lifecycle lock.
pub type FileHook = Box<dyn Fn(&StoreFile) + Send + Sync>;

/// Construction-time configuration for a [`StoreFile`].
pub struct StoreOptions {
    pub kind: MapKind,
    pub separator: String,
    pub reload_policy: ReloadPolicy,
    pub error_policy: ErrorPolicy,
    pub registry: Arc<SerializerRegistry>,
    /// Invoked after every successful reload.
    pub reload_hook: Option<FileHook>,
    /// Invoked when the error-lock transitions to set.
    pub error_hook: Option<FileHook>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            kind: MapKind::default(),
            separator: ".".to_string(),
            reload_policy: ReloadPolicy::default(),
            error_policy: ErrorPolicy::default(),
            registry: SerializerRegistry::shared_global(),
            reload_hook: None,
            error_hook: None,
        }
    }
}

struct LifecycleState {
    // Sticky until the next successful reload; recovery under
    // Rollback/Clear clears it immediately, so a set lock always means
    // reads and writes are suppressed.
    error_locked: bool,
    last_loaded: Option<SystemTime>,
    last_good: Arc<Branch>,
}

/// Hook firings decided inside the critical section, executed after the
/// lock is released so hooks may re-enter the store.
#[derive(Clone, Copy, Default)]
struct HookSignals {
    reload: bool,
    error: bool,
}

/// One backing file plus its in-memory tree, reload policy, and error
/// policy.
///
/// Every facade-visible operation runs the reload check, the error-lock
/// check, the tree operation, and any disk I/O as a single critical
/// section per file.
pub struct StoreFile {
    path: PathBuf,
    codec: Arc<dyn FormatCodec>,
    reload_policy: ReloadPolicy,
    error_policy: ErrorPolicy,
    registry: Arc<SerializerRegistry>,
    reload_hook: Option<FileHook>,
    error_hook: Option<FileHook>,
    data: TreeData,
    state: Mutex<LifecycleState>,
}

impl StoreFile {
    /// Open a store over `path`, creating the file (and missing parent
    /// directories) if absent, then perform the initial load.
    pub fn open(
        path: impl Into<PathBuf>,
        codec: Arc<dyn FormatCodec>,
        options: StoreOptions,
    ) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| FileError::Create {
                    path: path.clone(),
                    source,
                })?;
            }
            fs::File::create(&path).map_err(|source| FileError::Create {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "created backing file");
        }

        let file = Self {
            data: TreeData::new(options.kind, options.separator),
            state: Mutex::new(LifecycleState {
                error_locked: false,
                last_loaded: None,
                last_good: Arc::new(Branch::new(options.kind)),
            }),
            path,
            codec,
            reload_policy: options.reload_policy,
            error_policy: options.error_policy,
            registry: options.registry,
            reload_hook: options.reload_hook,
            error_hook: options.error_hook,
        };
        file.force_reload();
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MapKind {
        self.data.kind()
    }

    pub fn reload_policy(&self) -> ReloadPolicy {
        self.reload_policy
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Returns `true` while reads and writes are suppressed after a failed
    /// reload.
    pub fn is_error_locked(&self) -> bool {
        self.state.lock().expect("lifecycle lock poisoned").error_locked
    }

    /// Reload from disk right now, regardless of the reload policy.
    pub fn force_reload(&self) {
        let signals = {
            let mut state = self.state.lock().expect("lifecycle lock poisoned");
            self.reload_locked(&mut state)
        };
        self.fire(signals);
    }

    /// A copy of the whole current tree (empty while error-locked).
    pub fn data(&self) -> Branch {
        let kind = self.data.kind();
        self.read_op(Branch::new(kind), |data| data.snapshot().as_ref().clone())
    }

    /// Empty the tree and persist the empty structure.
    pub fn clear(&self) {
        self.write_op(|data| {
            data.clear();
            true
        });
    }

    /// A view of this store scoped under a path prefix.
    pub fn section(&self, path: &str) -> Section<'_> {
        Section::new(self, self.split(path))
    }

    // -- internals ---------------------------------------------------------

    fn reload_locked(&self, state: &mut LifecycleState) -> HookSignals {
        let mut signals = HookSignals::default();
        match self.codec.decode(&self.path, self.data.kind()) {
            Ok(root) => {
                let root = Arc::new(root);
                self.data.load_snapshot(Arc::clone(&root));
                state.last_good = root;
                state.error_locked = false;
                state.last_loaded = Some(SystemTime::now());
                signals.reload = true;
                debug!(path = %self.path.display(), "reloaded from disk");
            }
            Err(err) => {
                error!(path = %self.path.display(), %err, policy = ?self.error_policy, "reload failed");
                if !state.error_locked {
                    signals.error = true;
                }
                state.error_locked = true;
                match self.error_policy {
                    // Stay locked: reads go empty, writes are suppressed,
                    // disk is untouched.
                    ErrorPolicy::Empty | ErrorPolicy::Keep => {}
                    ErrorPolicy::Rollback => {
                        self.data.load_snapshot(Arc::clone(&state.last_good));
                        state.error_locked = false;
                    }
                    ErrorPolicy::Clear => {
                        let empty = Arc::new(Branch::new(self.data.kind()));
                        self.data.load_snapshot(Arc::clone(&empty));
                        state.last_good = empty;
                        state.error_locked = false;
                        self.persist_locked(state);
                    }
                }
            }
        }
        signals
    }

    fn reload_if_needed_locked(&self, state: &mut LifecycleState) -> HookSignals {
        let due = match self.reload_policy {
            ReloadPolicy::Always => true,
            ReloadPolicy::Manual => false,
            ReloadPolicy::Intelligent => match state.last_loaded {
                None => true,
                Some(loaded) => fs::metadata(&self.path)
                    .and_then(|meta| meta.modified())
                    .map(|mtime| mtime > loaded)
                    .unwrap_or(true),
            },
        };
        if due {
            self.reload_locked(state)
        } else {
            HookSignals::default()
        }
    }

    fn persist_locked(&self, state: &mut LifecycleState) {
        let snapshot = self.data.snapshot();
        match self.codec.encode(&snapshot, &self.path) {
            Ok(()) => {
                state.last_good = snapshot;
                state.last_loaded = Some(SystemTime::now());
            }
            Err(err) => {
                // Best effort: the in-memory mutation stands even though
                // the write failed.
                error!(path = %self.path.display(), %err, "persist failed");
            }
        }
    }

    fn read_op<R>(&self, locked_result: R, op: impl FnOnce(&TreeData) -> R) -> R {
        let (result, signals) = {
            let mut state = self.state.lock().expect("lifecycle lock poisoned");
            let signals = self.reload_if_needed_locked(&mut state);
            let result = if state.error_locked {
                locked_result
            } else {
                op(&self.data)
            };
            (result, signals)
        };
        self.fire(signals);
        result
    }

    fn write_op(&self, op: impl FnOnce(&TreeData) -> bool) {
        let signals = {
            let mut state = self.state.lock().expect("lifecycle lock poisoned");
            let signals = self.reload_if_needed_locked(&mut state);
            if state.error_locked {
                warn!(path = %self.path.display(), "mutation suppressed by error lock");
            } else if op(&self.data) {
                self.persist_locked(&mut state);
            }
            signals
        };
        self.fire(signals);
    }

    fn fire(&self, signals: HookSignals) {
        if signals.reload {
            if let Some(hook) = &self.reload_hook {
                hook(self);
            }
        }
        if signals.error {
            if let Some(hook) = &self.error_hook {
                hook(self);
            }
        }
    }
}

impl DataStorage for StoreFile {
    fn separator(&self) -> &str {
        self.data.separator()
    }

    fn registry(&self) -> Arc<SerializerRegistry> {
        Arc::clone(&self.registry)
    }

    fn get_raw(&self, segments: &[String]) -> Option<Value> {
        self.read_op(None, |data| data.get(segments))
    }

    fn contains_raw(&self, segments: &[String]) -> bool {
        self.read_op(false, |data| data.contains(segments))
    }

    fn set_raw(&self, segments: &[String], value: Value) {
        self.write_op(|data| {
            data.insert(segments, value);
            true
        });
    }

    fn remove_raw(&self, segments: &[String]) {
        self.write_op(|data| {
            data.remove(segments);
            true
        });
    }

    fn single_layer_keys_raw(&self, segments: &[String]) -> BTreeSet<String> {
        self.read_op(BTreeSet::new(), |data| data.single_layer_keys(segments))
    }

    fn keys_raw(&self, segments: &[String]) -> BTreeSet<String> {
        self.read_op(BTreeSet::new(), |data| data.keys(segments))
    }

    fn put_all_raw(&self, entries: Vec<(Vec<String>, Value)>) {
        self.write_op(|data| {
            data.insert_all(entries);
            true
        });
    }

    fn remove_all_raw(&self, paths: Vec<Vec<String>>) {
        self.write_op(|data| {
            for path in &paths {
                data.remove(path);
            }
            true
        });
    }

    fn add_defaults_raw(&self, entries: Vec<(Vec<String>, Value)>) {
        self.write_op(|data| {
            let mut changed = false;
            for (segments, value) in entries {
                if !data.contains(&segments) {
                    data.insert(&segments, value);
                    changed = true;
                }
            }
            changed
        });
    }
}

impl fmt::Debug for StoreFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFile")
            .field("path", &self.path)
            .field("format", &self.codec.format_name())
            .field("reload_policy", &self.reload_policy)
            .field("error_policy", &self.error_policy)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
