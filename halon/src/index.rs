//! PACK container and index decoding.
//!
//! Both halves of a pair (`.index` and `.archive`) share the same outer
//! container: a fixed header, then a table of blocks, with every other
//! structure addressed as an index into that table.
//!
//! The container header is 556 bytes:
//!
//! ```ascii
//!     4b 43 41 50                     "KCAP" /* fourcc "PACK", stored reversed */
//!     [UInt32:version]
//!     [512 bytes:reserved]
//!     [UInt64:file_size]
//!     [UInt64:unknown]
//!     [UInt64:block_table_offset]
//!     [UInt32:block_table_count]
//!     [UInt32:unknown]
//!     [UInt32:root_block_index]
//! ```
//!
//! The block table is `block_table_count` records of
//! `{ [UInt64:offset] [UInt64:size] }`.
//!
//! In an index file the root block holds an AIDX record pointing at the
//! root directory block:
//!
//! ```ascii
//!     58 44 49 41                     "XDIA" /* fourcc "AIDX", stored reversed */
//!     [UInt32:version]
//!     [UInt32:unknown]
//!     [UInt32:root_dir_block]
//! ```
//!
//! Each directory block lists its immediate children:
//!
//! ```ascii
//!     [UInt32:ndirs]
//!     [UInt32:nfiles]
//!     (
//!         [UInt32:name_offset]
//!         [UInt32:dir_block_index]
//!     )   /* repeat <ndirs> times */
//!     (
//!         [UInt32:name_offset]
//!         [UInt32:flags]              /* compression scheme, see crate::compression */
//!         [8 bytes:unknown]
//!         [UInt64:uncompressed_size]
//!         [UInt64:compressed_size]
//!         [20 bytes:sha1]
//!         [4 bytes:padding]
//!     )   /* repeat <nfiles> times */
//!     [name table: NUL-terminated strings, rest of the block]
//! ```
//!
//! Decoding flattens the block hierarchy into one [`Entry`] sequence in
//! which a parent always precedes its children; the tree itself is built
//! afterwards by `crate::node::build_tree`.

use std::collections::{HashSet, VecDeque};

use crate::compression::CompressionType;
use crate::error::{Error, Result};
use crate::reader::PackCursor;

pub const PACK_MAGIC: &[u8; 4] = b"KCAP";
pub const AIDX_MAGIC: &[u8; 4] = b"XDIA";
pub const AARC_MAGIC: &[u8; 4] = b"CRAA";

/// Size of the container header in bytes.
pub const HEADER_SIZE: usize = 556;

#[derive(Debug)]
pub struct PackHeader {
    pub version: u32,
    pub file_size: u64,
    pub block_table_offset: u64,
    pub block_table_count: u32,
    pub root_block_index: u32,
}

impl PackHeader {
    pub fn read(cursor: &mut PackCursor) -> Result<PackHeader> {
        let magic = cursor.read_bytes(4)?;
        if magic != PACK_MAGIC {
            return Err(Error::UnrecognizedFormat(format!(
                "bad container magic {:?}",
                magic
            )));
        }
        let version = cursor.read_u32()?;
        cursor.skip(512)?;
        let file_size = cursor.read_u64()?;
        cursor.skip(8)?;
        let block_table_offset = cursor.read_u64()?;
        let block_table_count = cursor.read_u32()?;
        cursor.skip(4)?;
        let root_block_index = cursor.read_u32()?;

        Ok(PackHeader {
            version,
            file_size,
            block_table_offset,
            block_table_count,
            root_block_index,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BlockRef {
    pub offset: u64,
    pub size: u64,
}

/// The container's table of `{offset, size}` block records.
pub struct BlockTable {
    blocks: Vec<BlockRef>,
}

impl BlockTable {
    /// Parse `count` records from the raw table bytes.
    pub fn from_bytes(bytes: &[u8], count: u32) -> Result<BlockTable> {
        let mut cursor = PackCursor::new(bytes);
        let mut blocks = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let offset = cursor.read_u64()?;
            let size = cursor.read_u64()?;
            blocks.push(BlockRef { offset, size });
        }
        Ok(BlockTable { blocks })
    }

    /// Locate and parse the table inside a fully loaded container file.
    pub fn read(buf: &[u8], header: &PackHeader) -> Result<BlockTable> {
        let offset = header.block_table_offset as usize;
        if offset > buf.len() {
            return Err(Error::CorruptIndex(format!(
                "block table offset {} outside file of {} bytes",
                offset,
                buf.len()
            )));
        }
        BlockTable::from_bytes(&buf[offset..], header.block_table_count)
    }

    pub fn get(&self, index: u32) -> Result<BlockRef> {
        self.blocks.get(index as usize).copied().ok_or_else(|| {
            Error::CorruptIndex(format!(
                "block index {} out of range ({} blocks)",
                index,
                self.blocks.len()
            ))
        })
    }

    /// Slice a block out of a fully loaded container file.
    pub fn block_bytes<'a>(&self, buf: &'a [u8], index: u32) -> Result<&'a [u8]> {
        let block = self.get(index)?;
        let start = block.offset as usize;
        let end = start.checked_add(block.size as usize).ok_or_else(|| {
            Error::CorruptIndex(format!("block {} size overflows", index))
        })?;
        if end > buf.len() {
            return Err(Error::CorruptIndex(format!(
                "block {} ({}..{}) outside file of {} bytes",
                index,
                start,
                end,
                buf.len()
            )));
        }
        Ok(&buf[start..end])
    }
}

/// Per-file metadata carried by a directory block's file records.
#[derive(Debug, Clone)]
pub struct FileMeta {
    pub compression: CompressionType,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub hash: [u8; 20],
}

#[derive(Debug, Clone)]
pub enum EntryKind {
    Directory { block_index: u32 },
    File(FileMeta),
}

/// One flat record of the decoded index. `parent` is the id (position in
/// the entry sequence) of the containing directory, or `None` for children
/// of the root. Parents always precede their children.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub parent: Option<u32>,
    pub kind: EntryKind,
}

#[derive(Debug)]
pub struct IndexFile {
    pub header: PackHeader,
    pub entries: Vec<Entry>,
}

/// Decode a fully loaded `.index` file into its flat entry table.
pub fn decode(buf: &[u8]) -> Result<IndexFile> {
    let mut cursor = PackCursor::new(buf);
    let header = PackHeader::read(&mut cursor)?;
    let table = BlockTable::read(buf, &header)?;

    let root = table.block_bytes(buf, header.root_block_index)?;
    let mut cursor = PackCursor::new(root);
    let magic = cursor.read_bytes(4)?;
    if magic != AIDX_MAGIC {
        return Err(Error::UnrecognizedFormat(format!(
            "index root block magic {:?} is not AIDX",
            magic
        )));
    }
    let _aidx_version = cursor.read_u32()?;
    cursor.skip(4)?;
    let root_dir_block = cursor.read_u32()?;

    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut pending: VecDeque<(u32, Option<u32>)> = VecDeque::new();
    pending.push_back((root_dir_block, None));

    while let Some((block_index, parent)) = pending.pop_front() {
        if !seen.insert(block_index) {
            return Err(Error::CorruptIndex(format!(
                "directory block {} referenced twice",
                block_index
            )));
        }
        let block = table.block_bytes(buf, block_index)?;
        decode_directory_block(block, parent, &mut entries, &mut pending)?;
    }

    Ok(IndexFile { header, entries })
}

fn decode_directory_block(
    block: &[u8],
    parent: Option<u32>,
    entries: &mut Vec<Entry>,
    pending: &mut VecDeque<(u32, Option<u32>)>,
) -> Result<()> {
    let mut cursor = PackCursor::new(block);
    let ndirs = cursor.read_u32()?;
    let nfiles = cursor.read_u32()?;

    let mut dirs = Vec::with_capacity(ndirs as usize);
    for _ in 0..ndirs {
        let name_offset = cursor.read_u32()?;
        let dir_block = cursor.read_u32()?;
        dirs.push((name_offset, dir_block));
    }

    let mut files = Vec::with_capacity(nfiles as usize);
    for _ in 0..nfiles {
        let name_offset = cursor.read_u32()?;
        let flags = cursor.read_u32()?;
        cursor.skip(8)?;
        let uncompressed_size = cursor.read_u64()?;
        let compressed_size = cursor.read_u64()?;
        let mut hash = [0u8; 20];
        hash.copy_from_slice(cursor.read_bytes(20)?);
        cursor.skip(4)?;
        files.push((
            name_offset,
            FileMeta {
                compression: CompressionType::from_flags(flags)?,
                uncompressed_size,
                compressed_size,
                hash,
            },
        ));
    }

    // Whatever remains in the block is the name table.
    let names = cursor.read_bytes(cursor.remaining())?;

    for (name_offset, dir_block) in dirs {
        let id = entries.len() as u32;
        entries.push(Entry {
            name: name_at(names, name_offset)?,
            parent,
            kind: EntryKind::Directory {
                block_index: dir_block,
            },
        });
        pending.push_back((dir_block, Some(id)));
    }

    for (name_offset, meta) in files {
        entries.push(Entry {
            name: name_at(names, name_offset)?,
            parent,
            kind: EntryKind::File(meta),
        });
    }

    Ok(())
}

fn name_at(names: &[u8], offset: u32) -> Result<String> {
    let offset = offset as usize;
    if offset >= names.len() {
        return Err(Error::CorruptIndex(format!(
            "name offset {} outside name table of {} bytes",
            offset,
            names.len()
        )));
    }
    let terminator = names[offset..]
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| Error::CorruptIndex(format!("unterminated name at offset {}", offset)))?;
    Ok(std::str::from_utf8(&names[offset..offset + terminator])?.to_string())
}
