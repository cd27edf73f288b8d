//! Structural diff between two independently opened namespaces.
//!
//! Both trees are walked in lockstep by matching child names. Counts are
//! aggregated per top-level directory name only; nested detail is summed
//! into its top-level ancestor, not reported per subpath. A file counts as
//! changed when it exists at the same path in both trees with a different
//! size or content hash. Unchanged files are not reported.

use std::collections::BTreeMap;

use crate::node::{Directory, Node};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    pub removed: u64,
    pub added: u64,
    pub changed: u64,
}

impl DiffCounts {
    pub fn is_zero(&self) -> bool {
        self.removed == 0 && self.added == 0 && self.changed == 0
    }
}

impl std::fmt::Display for DiffCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} removed, {} added, {} changed",
            self.removed, self.added, self.changed
        )
    }
}

/// Per-top-level-name counts, sorted by name. Produced fresh by each
/// [`diff`] call.
#[derive(Debug, Default)]
pub struct DiffReport {
    pub entries: BTreeMap<String, DiffCounts>,
}

impl DiffReport {
    pub fn is_unchanged(&self) -> bool {
        self.entries.values().all(DiffCounts::is_zero)
    }
}

/// Diff two comparable nodes, reporting one count triple per immediate
/// child name present in either. A name present in only one side reports
/// its whole descendant file count as removed or added. Diffing two files
/// (or a file against a directory) reports a single triple under the
/// node's own name.
pub fn diff(ours: &Node, theirs: &Node) -> DiffReport {
    let mut report = DiffReport::default();
    match (ours, theirs) {
        (Node::Directory(a), Node::Directory(b)) => {
            for (name, a, b) in matched_children(a, b) {
                let mut counts = DiffCounts::default();
                match (a, b) {
                    (Some(a), None) => counts.removed += a.file_count(),
                    (None, Some(b)) => counts.added += b.file_count(),
                    (Some(a), Some(b)) => walk(a, b, &mut counts),
                    (None, None) => {}
                }
                report.entries.insert(name.to_string(), counts);
            }
        }
        (a, b) => {
            let mut counts = DiffCounts::default();
            walk(a, b, &mut counts);
            report.entries.insert(a.name().to_string(), counts);
        }
    }
    report
}

fn walk(a: &Node, b: &Node, counts: &mut DiffCounts) {
    match (a, b) {
        (Node::File(fa), Node::File(fb)) => {
            if fa.uncompressed_size != fb.uncompressed_size || fa.hash != fb.hash {
                counts.changed += 1;
            }
        }
        (Node::Directory(da), Node::Directory(db)) => {
            for (_, ca, cb) in matched_children(da, db) {
                match (ca, cb) {
                    (Some(ca), None) => counts.removed += ca.file_count(),
                    (None, Some(cb)) => counts.added += cb.file_count(),
                    (Some(ca), Some(cb)) => walk(ca, cb, counts),
                    (None, None) => {}
                }
            }
        }
        // Structural type change: everything on the old side goes away,
        // everything on the new side arrives.
        (a, b) => {
            counts.removed += a.file_count();
            counts.added += b.file_count();
        }
    }
}

fn matched_children<'a>(
    a: &'a Directory,
    b: &'a Directory,
) -> Vec<(&'a str, Option<&'a Node>, Option<&'a Node>)> {
    let mut names: BTreeMap<&str, (Option<&Node>, Option<&Node>)> = BTreeMap::new();
    for child in &a.children {
        names.entry(child.name()).or_default().0 = Some(child);
    }
    for child in &b.children {
        names.entry(child.name()).or_default().1 = Some(child);
    }
    names
        .into_iter()
        .map(|(name, (a, b))| (name, a, b))
        .collect()
}
