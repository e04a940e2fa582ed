//! The hierarchical store over a copy-on-write branch tree.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, RwLock};

use crate::path;
use crate::value::{Branch, MapKind, Value};

/// In-memory hierarchical store addressed by segment paths.
///
/// Reads clone the current root `Arc` and walk it without holding any lock;
/// mutation rebuilds the path from the changed node up to the root and
/// publishes the new root in one swap. A reader holding an old snapshot keeps
/// a stable, fully consistent pre-mutation view.
#[derive(Debug)]
pub struct TreeData {
    root: RwLock<Arc<Branch>>,
    // Serializes read-modify-publish cycles so concurrent writers cannot
    // lose each other's updates.
    write_lock: Mutex<()>,
    kind: MapKind,
    separator: String,
}

impl TreeData {
    /// Create an empty store with the given ordering mode and separator.
    pub fn new(kind: MapKind, separator: impl Into<String>) -> Self {
        Self {
            root: RwLock::new(Arc::new(Branch::new(kind))),
            write_lock: Mutex::new(()),
            kind,
            separator: separator.into(),
        }
    }

    /// The ordering mode every branch in this store uses.
    pub fn kind(&self) -> MapKind {
        self.kind
    }

    /// The separator used when joining enumerated key paths.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// A stable snapshot of the current root.
    pub fn snapshot(&self) -> Arc<Branch> {
        self.root.read().expect("tree lock poisoned").clone()
    }

    fn publish(&self, root: Arc<Branch>) {
        *self.root.write().expect("tree lock poisoned") = root;
    }

    /// Look up the value at a segment path. An empty path addresses the root
    /// branch itself. Returns `None` for any missing or obstructed path.
    pub fn get(&self, segments: &[String]) -> Option<Value> {
        let root = self.snapshot();
        if segments.is_empty() {
            return Some(Value::Branch(root.as_ref().clone()));
        }
        lookup(&root, segments).map(|v| v.as_ref().clone())
    }

    /// Returns `true` if a value (leaf or branch) exists at the path.
    pub fn contains(&self, segments: &[String]) -> bool {
        if segments.is_empty() {
            return true;
        }
        lookup(&self.snapshot(), segments).is_some()
    }

    /// Insert or replace the value at a segment path, creating intermediate
    /// branches as needed and overwriting any non-branch obstruction. An
    /// empty path is a no-op.
    pub fn insert(&self, segments: &[String], value: Value) {
        if segments.is_empty() {
            return;
        }
        let _guard = self.write_lock.lock().expect("tree lock poisoned");
        let root = self.snapshot();
        let rebuilt = insert_at(&root, segments, value, self.kind);
        self.publish(Arc::new(rebuilt));
    }

    /// Insert many path/value pairs under a single publish.
    pub fn insert_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (Vec<String>, Value)>,
    {
        let _guard = self.write_lock.lock().expect("tree lock poisoned");
        let mut root = self.snapshot().as_ref().clone();
        for (segments, value) in entries {
            if segments.is_empty() {
                continue;
            }
            root = insert_at(&root, &segments, value, self.kind);
        }
        self.publish(Arc::new(root));
    }

    /// Remove the value at a segment path, subtree included. Ancestor
    /// branches left empty by the removal are pruned, up to but excluding
    /// the root. Removing a missing path is a no-op.
    pub fn remove(&self, segments: &[String]) {
        if segments.is_empty() {
            return;
        }
        let _guard = self.write_lock.lock().expect("tree lock poisoned");
        let root = self.snapshot();
        if lookup(&root, segments).is_none() {
            return;
        }
        let rebuilt = remove_at(&root, segments);
        self.publish(Arc::new(rebuilt));
    }

    /// Direct child keys of the branch at a path; the empty path enumerates
    /// the root. Missing or non-branch paths yield the empty set.
    pub fn single_layer_keys(&self, segments: &[String]) -> BTreeSet<String> {
        let root = self.snapshot();
        let branch = if segments.is_empty() {
            Some(root.as_ref())
        } else {
            lookup(&root, segments).and_then(|v| v.as_branch())
        };
        branch
            .map(|b| b.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Fully qualified leaf paths (joined with the separator) under a path;
    /// the empty path enumerates the whole store. Branches themselves are
    /// not listed, so an empty branch contributes nothing.
    pub fn keys(&self, segments: &[String]) -> BTreeSet<String> {
        let root = self.snapshot();
        let branch = if segments.is_empty() {
            Some(root.as_ref())
        } else {
            lookup(&root, segments).and_then(|v| v.as_branch())
        };
        let mut out = BTreeSet::new();
        if let Some(branch) = branch {
            let mut trail = Vec::new();
            flatten(branch, &mut trail, &self.separator, &mut out);
        }
        out
    }

    /// Number of leaves in the whole store.
    pub fn leaf_count(&self) -> usize {
        count_leaves(&self.snapshot())
    }

    /// Returns `true` if the root branch has no children.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Reset the store to an empty root.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock().expect("tree lock poisoned");
        self.publish(Arc::new(Branch::new(self.kind)));
    }

    /// Replace the whole tree with a freshly decoded root.
    pub fn load(&self, root: Branch) {
        self.load_snapshot(Arc::new(root));
    }

    /// Replace the whole tree with a shared snapshot (used when restoring a
    /// previously captured root without copying it).
    pub fn load_snapshot(&self, root: Arc<Branch>) {
        let _guard = self.write_lock.lock().expect("tree lock poisoned");
        self.publish(root);
    }
}

fn lookup<'a>(branch: &'a Branch, segments: &[String]) -> Option<&'a Arc<Value>> {
    let (head, rest) = segments.split_first()?;
    let child = branch.get(head)?;
    if rest.is_empty() {
        Some(child)
    } else {
        lookup(child.as_branch()?, rest)
    }
}

fn insert_at(branch: &Branch, segments: &[String], value: Value, kind: MapKind) -> Branch {
    let mut rebuilt = branch.clone();
    let (head, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return rebuilt,
    };
    if rest.is_empty() {
        rebuilt.insert(head.clone(), Arc::new(value));
    } else {
        // Descend into an existing branch child; anything else (missing,
        // or a leaf obstructing the path) is replaced by a fresh branch.
        let child = match branch.get(head).map(Arc::as_ref) {
            Some(Value::Branch(b)) => b.clone(),
            _ => Branch::new(kind),
        };
        let child = insert_at(&child, rest, value, kind);
        rebuilt.insert(head.clone(), Arc::new(Value::Branch(child)));
    }
    rebuilt
}

fn remove_at(branch: &Branch, segments: &[String]) -> Branch {
    let mut rebuilt = branch.clone();
    let (head, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return rebuilt,
    };
    if rest.is_empty() {
        rebuilt.remove(head);
    } else if let Some(Value::Branch(child)) = branch.get(head).map(Arc::as_ref) {
        let child = remove_at(child, rest);
        if child.is_empty() {
            rebuilt.remove(head);
        } else {
            rebuilt.insert(head.clone(), Arc::new(Value::Branch(child)));
        }
    }
    rebuilt
}

fn flatten(branch: &Branch, trail: &mut Vec<String>, separator: &str, out: &mut BTreeSet<String>) {
    for (key, value) in branch.iter() {
        trail.push(key.to_string());
        match value.as_ref() {
            Value::Branch(child) => flatten(child, trail, separator, out),
            _ => {
                out.insert(path::join(trail, separator));
            }
        }
        trail.pop();
    }
}

fn count_leaves(branch: &Branch) -> usize {
    branch
        .iter()
        .map(|(_, value)| match value.as_ref() {
            Value::Branch(child) => count_leaves(child),
            _ => 1,
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
