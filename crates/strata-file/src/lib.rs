//! File lifecycle and typed access for the Strata configuration store.
//!
//! This crate ties one on-disk file to one in-memory tree and mediates every
//! read and write between them:
//!
//! - [`FormatCodec`] -- the two-operation interface concrete formats
//!   implement (`decode`/`encode`)
//! - [`ReloadPolicy`] / [`ErrorPolicy`] -- when to reload from disk, and
//!   what happens to memory and disk when a reload fails
//! - [`StoreFile`] -- the lifecycle state machine owning the tree, the
//!   error-lock, and synchronous persistence after every mutation
//! - [`DataStorage`] -- the typed facade trait (defaults, lists, maps,
//!   enums, serializable objects) shared by files and sections
//! - [`Section`] -- a path-prefix scoped view behaving like an independent
//!   store rooted at a subtree
//!
//! # Design Rules
//!
//! 1. Decode failures never reach the caller; they become error-lock state
//!    transitions handled by the configured [`ErrorPolicy`].
//! 2. Encode failures are logged and absorbed; the in-memory mutation that
//!    triggered the write stands.
//! 3. Each facade operation is one critical section per file: reload check,
//!    error-lock check, tree operation, and disk I/O together.
//! 4. Hooks run outside that critical section so they may re-enter the
//!    store.

pub mod codec;
pub mod error;
pub mod lifecycle;
pub mod section;
pub mod settings;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use codec::{DecodeError, EncodeError, FormatCodec};
pub use error::FileError;
pub use lifecycle::{FileHook, StoreFile, StoreOptions};
pub use section::Section;
pub use settings::{ErrorPolicy, ReloadPolicy};
pub use storage::DataStorage;
