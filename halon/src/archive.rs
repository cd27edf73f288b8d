//! The `.archive` half of a pair: payload blocks addressed by content hash.
//!
//! The archive shares the PACK container layout (see `crate::index`). Its
//! root block holds an AARC record:
//!
//! ```ascii
//!     43 52 41 41                     "CRAA" /* fourcc "AARC", stored reversed */
//!     [UInt32:version]
//!     [UInt32:block_count]
//!     [UInt32:block_table_index]
//! ```
//!
//! The block at `block_table_index` maps content hashes to payload blocks,
//! `block_count` records of:
//!
//! ```ascii
//!     [UInt32:block_index]
//!     [20 bytes:sha1]
//!     [UInt64:size]
//! ```
//!
//! Only this metadata is materialized when the pair is opened; payload
//! bytes are read on demand through [`ArchiveIndex::read_range`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};
use crate::index::{BlockTable, PackHeader, AARC_MAGIC};
use crate::reader::PackCursor;

/// Resolved location of one content hash inside the archive file.
#[derive(Debug, Clone, Copy)]
pub struct BlockLocation {
    pub offset: u64,
    /// Capacity of the on-disk block holding the payload.
    pub stored_size: u64,
}

#[derive(Debug)]
pub struct ArchiveIndex {
    pub header: PackHeader,
    file: RefCell<fs::File>,
    blocks: HashMap<[u8; 20], BlockLocation>,
}

impl ArchiveIndex {
    pub fn open(path: &Path) -> Result<ArchiveIndex> {
        let mut file = fs::File::open(path)?;

        let header_bytes = read_at(&mut file, 0, crate::index::HEADER_SIZE)?;
        let header = PackHeader::read(&mut PackCursor::new(&header_bytes))?;

        let table_bytes = read_at(
            &mut file,
            header.block_table_offset,
            header.block_table_count as usize * 16,
        )?;
        let table = BlockTable::from_bytes(&table_bytes, header.block_table_count)?;

        let root = table.get(header.root_block_index)?;
        let root_bytes = read_at(&mut file, root.offset, root.size as usize)?;
        let mut cursor = PackCursor::new(&root_bytes);
        let magic = cursor.read_bytes(4)?;
        if magic != AARC_MAGIC {
            return Err(Error::UnrecognizedFormat(format!(
                "archive root block magic {:?} is not AARC",
                magic
            )));
        }
        let _aarc_version = cursor.read_u32()?;
        let block_count = cursor.read_u32()?;
        let map_index = cursor.read_u32()?;

        let map_ref = table.get(map_index)?;
        let map_bytes = read_at(&mut file, map_ref.offset, map_ref.size as usize)?;
        let mut cursor = PackCursor::new(&map_bytes);
        let mut blocks = HashMap::with_capacity(block_count as usize);
        for _ in 0..block_count {
            let block_index = cursor.read_u32()?;
            let mut hash = [0u8; 20];
            hash.copy_from_slice(cursor.read_bytes(20)?);
            let _size = cursor.read_u64()?;
            let block = table.get(block_index).map_err(|_| {
                Error::CorruptArchive(format!(
                    "hash {} maps to missing block {}",
                    hex::encode(hash),
                    block_index
                ))
            })?;
            blocks.insert(
                hash,
                BlockLocation {
                    offset: block.offset,
                    stored_size: block.size,
                },
            );
        }

        Ok(ArchiveIndex {
            header,
            file: RefCell::new(file),
            blocks,
        })
    }

    /// Number of distinct content hashes the archive holds.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn locate(&self, hash: &[u8; 20]) -> Option<BlockLocation> {
        self.blocks.get(hash).copied()
    }

    /// Read exactly `length` bytes starting at `offset`. A short read means
    /// the archive file does not match its index.
    pub fn read_range(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))?;
        let mut contents = vec![0u8; length];
        file.read_exact(&mut contents)?;
        Ok(contents)
    }
}

fn read_at(file: &mut fs::File, offset: u64, length: usize) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; length];
    file.read_exact(&mut buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::CorruptArchive(format!("{} bytes missing at offset {}", length, offset))
        } else {
            Error::IoError(err)
        }
    })?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::CompressionType;
    use crate::test_utils::PackBuilder;
    use sha1::{Digest, Sha1};

    fn write_sample(dir: &Path) -> std::path::PathBuf {
        let mut builder = PackBuilder::new();
        builder.add_file("a.txt", b"alpha", CompressionType::None);
        builder.add_file("b.txt", b"beta", CompressionType::None);
        builder.write_to(&dir.join("Sample")).unwrap()
    }

    #[test]
    fn test_open_and_locate() {
        let tmp = tempfile::tempdir().unwrap();
        let base = write_sample(tmp.path());
        let archive = ArchiveIndex::open(&base.with_extension("archive")).unwrap();

        assert_eq!(archive.block_count(), 2);

        let hash: [u8; 20] = Sha1::digest(b"alpha").into();
        let location = archive.locate(&hash).unwrap();
        let contents = archive.read_range(location.offset, 5).unwrap();
        assert_eq!(contents, b"alpha");

        assert!(archive.locate(&[0u8; 20]).is_none());
    }

    #[test]
    fn test_read_range_past_end() {
        let tmp = tempfile::tempdir().unwrap();
        let base = write_sample(tmp.path());
        let archive = ArchiveIndex::open(&base.with_extension("archive")).unwrap();

        match archive.read_range(1 << 32, 16) {
            Err(Error::IoError(_)) => {}
            other => panic!("expected IoError, got {:?}", other),
        }
    }

    #[test]
    fn test_index_half_is_not_an_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let base = write_sample(tmp.path());
        match ArchiveIndex::open(&base.with_extension("index")) {
            Err(Error::UnrecognizedFormat(_)) => {}
            other => panic!("expected UnrecognizedFormat, got {:?}", other),
        }
    }
}
