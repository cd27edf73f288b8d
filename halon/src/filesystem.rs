//! Opening a pair and querying the resulting namespace.

use std::fs;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::archive::ArchiveIndex;
use crate::compression::CompressionType;
use crate::diff::{self, DiffReport};
use crate::error::{Error, Result};
use crate::index::PackHeader;
use crate::node::{self, File, Find, Node};

/// A fully decoded `.index`/`.archive` pair.
///
/// Built once by [`Filesystem::open`] and immutable afterwards: queries
/// never add, remove, or mutate nodes, so two instances can be treated as
/// value snapshots when diffing. The archive file handle is held open for
/// on-demand payload reads and closed when the `Filesystem` is dropped.
#[derive(Debug)]
pub struct Filesystem {
    base: PathBuf,
    header: PackHeader,
    entry_count: usize,
    root: Node,
    archive: ArchiveIndex,
}

impl Filesystem {
    /// Open the pair at `base`, with or without an extension: both
    /// `Patch/ClientData` and `Patch/ClientData.index` open
    /// `Patch/ClientData.index` + `Patch/ClientData.archive`.
    ///
    /// Both halves must exist before anything is parsed. Any decode error
    /// aborts the whole open; no partial filesystem is ever returned.
    pub fn open<P: AsRef<Path>>(base: P) -> Result<Filesystem> {
        let base = base.as_ref().with_extension("");
        let index_path = base.with_extension("index");
        let archive_path = base.with_extension("archive");
        if !index_path.is_file() || !archive_path.is_file() {
            return Err(Error::MissingPair(base));
        }

        let archive = ArchiveIndex::open(&archive_path)?;
        let index_bytes = fs::read(&index_path)?;
        let decoded = crate::index::decode(&index_bytes)?;
        let root = node::build_tree(&decoded.entries, &archive)?;

        Ok(Filesystem {
            base,
            header: decoded.header,
            entry_count: decoded.entries.len(),
            root,
            archive,
        })
    }

    /// Base path of the pair, without extension.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Header of the `.index` half.
    pub fn index_header(&self) -> &PackHeader {
        &self.header
    }

    /// Header of the `.archive` half.
    pub fn archive_header(&self) -> &PackHeader {
        &self.archive.header
    }

    /// Number of entries the index declared.
    pub fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// The synthetic root directory. Its name and path are empty.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// See [`Node::resolve`].
    pub fn resolve(&self, path: &str) -> Result<&Node> {
        self.root.resolve(path)
    }

    /// See [`Node::find`].
    pub fn find<'a>(&'a self, pattern: &str) -> Find<'a> {
        self.root.find(pattern)
    }

    /// Read and decompress a file's payload from the archive.
    pub fn read(&self, file: &File) -> Result<Vec<u8>> {
        let compressed = self
            .archive
            .read_range(file.archive_offset, file.compressed_size as usize)?;
        CompressionType::decompress(&compressed, file.compression, file.uncompressed_size)
    }

    /// Read a file's payload and check it against the SHA-1 stored in the
    /// index. Reads never verify implicitly; this is the opt-in check.
    pub fn verify(&self, file: &File) -> Result<()> {
        let contents = self.read(file)?;
        let digest: [u8; 20] = Sha1::digest(&contents).into();
        if digest != file.hash {
            return Err(Error::CorruptArchive(format!(
                "{}: contents hash {}, index says {}",
                file.path,
                hex::encode(digest),
                hex::encode(file.hash)
            )));
        }
        Ok(())
    }

    /// Materialize the subtree rooted at `node` under `destination`. The
    /// node's own name becomes the top-level entry there, so extracting
    /// `UI/FloatText` into `out/` produces `out/FloatText/...`.
    ///
    /// Missing destination directories are created; directory creation is
    /// idempotent. Extraction is not transactional:
    /// a failure partway leaves whatever was already written.
    pub fn extract(&self, node: &Node, destination: &Path) -> Result<()> {
        match *node {
            Node::File(ref file) => {
                fs::create_dir_all(destination)?;
                fs::write(destination.join(&file.name), self.read(file)?)?;
            }
            Node::Directory(ref dir) => {
                let subdir = destination.join(&dir.name);
                fs::create_dir_all(&subdir)?;
                for child in &dir.children {
                    self.extract(child, &subdir)?;
                }
            }
        }
        Ok(())
    }

    /// Structural diff against another pair's namespace. See `crate::diff`.
    pub fn diff(&self, other: &Filesystem) -> DiffReport {
        diff::diff(&self.root, &other.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_pair() {
        let tmp = tempfile::tempdir().unwrap();
        match Filesystem::open(tmp.path().join("NoSuch")) {
            Err(Error::MissingPair(base)) => {
                assert_eq!(base.file_name().unwrap(), "NoSuch");
            }
            other => panic!("expected MissingPair, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_archive_half_fails_before_parsing() {
        let tmp = tempfile::tempdir().unwrap();
        // A garbage .index alone must fail with MissingPair, not a decode
        // error, because the pair is checked before any parsing.
        fs::write(tmp.path().join("Lone.index"), b"not a pack file").unwrap();
        match Filesystem::open(tmp.path().join("Lone.index")) {
            Err(Error::MissingPair(_)) => {}
            other => panic!("expected MissingPair, got {:?}", other),
        }
    }
}
