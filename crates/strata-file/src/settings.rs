//! Per-file reload and error-recovery policies.

/// When a facade operation triggers a reload from disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReloadPolicy {
    /// Reload unconditionally before every facade operation.
    Always,
    /// Reload only when the file's modification time is newer than the last
    /// successful load or save.
    #[default]
    Intelligent,
    /// Never reload automatically; the caller invokes reload explicitly.
    Manual,
}

/// What happens to in-memory data and on-disk content when a reload fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stay error-locked: reads return empty results and writes are
    /// suppressed until the next successful reload. Disk is left untouched.
    Empty,
    /// Same suppression mechanics as [`Empty`](ErrorPolicy::Empty); in-memory
    /// data keeps the last good state for inspection.
    Keep,
    /// Restore the last good snapshot and resume normal operation; the file
    /// is left untouched until the next successful reload or write.
    Rollback,
    /// Reset the in-memory tree to empty, immediately overwrite the corrupt
    /// file with the empty structure, and resume normal operation.
    #[default]
    Clear,
}
