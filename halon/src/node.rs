//! The in-memory namespace: a rooted tree of directories and files.
//!
//! The flat entry table from `crate::index` is linked into an owned tree in
//! two passes: child ids are first grouped by parent id, then the tree is
//! assembled root-down. Each node caches its full slash-joined path during
//! assembly, so no upward traversal (and no parent back-reference) is ever
//! needed at query time.

use std::collections::HashSet;

use crate::archive::ArchiveIndex;
use crate::compression::CompressionType;
use crate::error::{Error, Result};
use crate::index::{Entry, EntryKind};

/// An entry in the namespace, either a directory or a file.
#[derive(Debug, Clone)]
pub enum Node {
    Directory(Directory),
    File(File),
}

#[derive(Debug, Clone)]
pub struct Directory {
    pub name: String,
    pub path: String,
    /// Immediate children in index declaration order: subdirectories
    /// first, then files, each in the order their block lists them.
    pub children: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct File {
    pub name: String,
    pub path: String,
    pub compression: CompressionType,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    /// SHA-1 of the uncompressed contents, as stored in the index.
    pub hash: [u8; 20],
    /// Byte offset of the payload inside the paired `.archive` file,
    /// resolved once when the pair is opened.
    pub archive_offset: u64,
}

impl Node {
    pub fn name(&self) -> &str {
        match *self {
            Node::Directory(ref dir) => &dir.name,
            Node::File(ref file) => &file.name,
        }
    }

    pub fn path(&self) -> &str {
        match *self {
            Node::Directory(ref dir) => &dir.path,
            Node::File(ref file) => &file.path,
        }
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match *self {
            Node::Directory(ref dir) => Some(dir),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&File> {
        match *self {
            Node::Directory(_) => None,
            Node::File(ref file) => Some(file),
        }
    }

    /// Number of files in the subtree rooted here. A file counts as 1.
    pub fn file_count(&self) -> u64 {
        match *self {
            Node::File(_) => 1,
            Node::Directory(ref dir) => dir.children.iter().map(Node::file_count).sum(),
        }
    }

    /// Walk a slash-separated path down from this node. Empty segments are
    /// ignored, so `UI/FloatText` and `/UI/FloatText/` resolve identically;
    /// an empty path resolves to this node itself. Matching is
    /// case-sensitive, as in the game's own lookups.
    pub fn resolve(&self, path: &str) -> Result<&Node> {
        let mut current = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let dir = match *current {
                Node::Directory(ref dir) => dir,
                // Cannot descend into a file.
                Node::File(_) => {
                    return Err(Error::NotFound(format!("{} in path {}", segment, path)))
                }
            };
            current = dir.child(segment).ok_or_else(|| {
                if segment == path {
                    Error::NotFound(segment.to_string())
                } else {
                    Error::NotFound(format!("{} in path {}", segment, path))
                }
            })?;
        }
        Ok(current)
    }

    /// Lazy pre-order traversal of the subtree below this node, yielding
    /// every descendant whose full path contains `pattern` as a literal
    /// substring. `find("")` yields every descendant exactly once.
    pub fn find<'a>(&'a self, pattern: &str) -> Find<'a> {
        let stack = match *self {
            Node::Directory(ref dir) => vec![dir.children.iter()],
            Node::File(_) => Vec::new(),
        };
        Find {
            stack,
            pattern: pattern.to_string(),
        }
    }

    /// Pre-order traversal of every descendant.
    pub fn walk(&self) -> Find<'_> {
        self.find("")
    }
}

impl Directory {
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|child| child.name() == name)
    }
}

/// Iterator returned by [`Node::find`]. Each call to `find` starts a fresh
/// traversal; nothing is cached, so a matching directory and its matching
/// descendants are all yielded independently.
pub struct Find<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
    pattern: String,
}

impl<'a> Iterator for Find<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        while let Some(iter) = self.stack.last_mut() {
            match iter.next() {
                Some(node) => {
                    if let Node::Directory(ref dir) = *node {
                        self.stack.push(dir.children.iter());
                    }
                    if node.path().contains(&self.pattern) {
                        return Some(node);
                    }
                }
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// Link the flat entry table into an owned tree rooted at a synthetic,
/// nameless directory. File archive offsets are resolved against the
/// paired archive's hash map here, so the finished tree never needs the
/// index again.
pub fn build_tree(entries: &[Entry], archive: &ArchiveIndex) -> Result<Node> {
    // Pass 1: group child ids by parent id. Slot 0 is the root; entry id
    // `i` owns slot `i + 1`.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len() + 1];
    for (id, entry) in entries.iter().enumerate() {
        let slot = match entry.parent {
            None => 0,
            Some(parent) => {
                let parent = parent as usize;
                if parent >= entries.len() {
                    return Err(Error::CorruptIndex(format!(
                        "{}: parent id {} does not exist",
                        entry.name, parent
                    )));
                }
                if !matches!(entries[parent].kind, EntryKind::Directory { .. }) {
                    return Err(Error::CorruptIndex(format!(
                        "{}: parent {} is a file",
                        entry.name, entries[parent].name
                    )));
                }
                parent + 1
            }
        };
        children[slot].push(id);
    }

    // Pass 2: assemble the owned tree root-down.
    let root = assemble_directory(String::new(), String::new(), &children[0], entries, &children, archive)?;
    Ok(Node::Directory(root))
}

fn assemble_directory(
    name: String,
    path: String,
    child_ids: &[usize],
    entries: &[Entry],
    children: &[Vec<usize>],
    archive: &ArchiveIndex,
) -> Result<Directory> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(child_ids.len());
    for &id in child_ids {
        let entry = &entries[id];
        if !seen.insert(entry.name.as_str()) {
            return Err(Error::CorruptIndex(format!(
                "duplicate name {} under /{}",
                entry.name, path
            )));
        }
        let child_path = if path.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", path, entry.name)
        };
        match entry.kind {
            EntryKind::Directory { .. } => {
                let dir = assemble_directory(
                    entry.name.clone(),
                    child_path,
                    &children[id + 1],
                    entries,
                    children,
                    archive,
                )?;
                nodes.push(Node::Directory(dir));
            }
            EntryKind::File(ref meta) => {
                let location = archive.locate(&meta.hash).ok_or_else(|| {
                    Error::CorruptIndex(format!(
                        "{}: no archive block for hash {}",
                        child_path,
                        hex::encode(meta.hash)
                    ))
                })?;
                if meta.compressed_size > location.stored_size {
                    return Err(Error::CorruptIndex(format!(
                        "{}: entry claims {} bytes, archive block holds {}",
                        child_path, meta.compressed_size, location.stored_size
                    )));
                }
                nodes.push(Node::File(File {
                    name: entry.name.clone(),
                    path: child_path,
                    compression: meta.compression,
                    uncompressed_size: meta.uncompressed_size,
                    compressed_size: meta.compressed_size,
                    hash: meta.hash,
                    archive_offset: location.offset,
                }));
            }
        }
    }
    Ok(Directory {
        name,
        path,
        children: nodes,
    })
}
