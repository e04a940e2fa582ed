//! Hierarchical key-path value tree for the Strata configuration store.
//!
//! This crate owns the in-memory data model shared by every other Strata
//! crate:
//!
//! - [`Value`] -- a decoded configuration value: scalar, list, or [`Branch`]
//! - [`Branch`] -- a string-keyed mapping of child values, with an ordering
//!   mode ([`MapKind`]) fixed at construction
//! - [`TreeData`] -- the hierarchical store itself: get/insert/remove/key
//!   enumeration addressed by segment paths, with copy-on-write mutation and
//!   lock-free snapshot reads
//! - [`path`] -- splitting and joining key paths on a per-store separator
//!
//! Persistence, typing, and policies live in the `strata-file` and
//! `strata-coerce` crates; this crate never performs I/O and never coerces.
//!
//! # Design Rules
//!
//! 1. "Not found" is always `None`/`false`/empty, never an error.
//! 2. Mutation publishes a new root reference only after the rebuild
//!    completes; a reader holding an old snapshot sees a stable tree.
//! 3. Insert creates intermediate branches as needed and overwrites any
//!    non-branch obstruction.
//! 4. Removing the last child of a branch prunes the branch itself, up to
//!    but excluding the root.

pub mod data;
pub mod de;
pub mod path;
pub mod value;

pub use data::TreeData;
pub use de::{BranchSeed, ValueSeed};
pub use value::{Branch, MapKind, Value};
