//! Test utilities for PACK pairs.
//!
//! [`PackBuilder`] assembles a valid `.index`/`.archive` pair in memory so
//! tests do not depend on checked-in game data. It exists for tests and
//! tooling only; the production surface of this crate stays read-only.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};

use crate::compression::CompressionType;
use crate::index::HEADER_SIZE;

#[derive(Default)]
struct BuilderDir {
    dirs: Vec<(String, BuilderDir)>,
    files: Vec<BuilderFile>,
}

struct BuilderFile {
    name: String,
    hash: [u8; 20],
    uncompressed_size: u64,
    compressed_size: u64,
    compression: CompressionType,
}

/// Builds a `.index`/`.archive` pair from `(path, contents, compression)`
/// triples. Directories are created implicitly and children keep insertion
/// order, which is the declaration order the index will carry.
#[derive(Default)]
pub struct PackBuilder {
    root: BuilderDir,
    // (hash, stored bytes, uncompressed size), deduplicated by hash the
    // way the real archives are.
    payloads: Vec<([u8; 20], Vec<u8>, u64)>,
    seen: HashSet<[u8; 20]>,
}

impl PackBuilder {
    pub fn new() -> PackBuilder {
        PackBuilder::default()
    }

    pub fn add_file(
        &mut self,
        path: &str,
        contents: &[u8],
        compression: CompressionType,
    ) -> &mut PackBuilder {
        let stored = match compression {
            CompressionType::None => contents.to_vec(),
            CompressionType::Deflate => deflate(contents),
            CompressionType::Lzma => lzma(contents),
        };
        let hash: [u8; 20] = Sha1::digest(contents).into();
        if self.seen.insert(hash) {
            self.payloads
                .push((hash, stored.clone(), contents.len() as u64));
        }

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (name, parents) = segments.split_last().expect("empty file path");
        let mut dir = &mut self.root;
        for segment in parents {
            let position = match dir.dirs.iter().position(|(n, _)| n == segment) {
                Some(position) => position,
                None => {
                    dir.dirs.push((segment.to_string(), BuilderDir::default()));
                    dir.dirs.len() - 1
                }
            };
            dir = &mut dir.dirs[position].1;
        }
        dir.files.push(BuilderFile {
            name: name.to_string(),
            hash,
            uncompressed_size: contents.len() as u64,
            compressed_size: stored.len() as u64,
            compression,
        });
        self
    }

    /// Serialize to `(index bytes, archive bytes)`.
    pub fn build(&self) -> (Vec<u8>, Vec<u8>) {
        // Index: directory blocks bottom-up, then the AIDX root block.
        let mut blocks: Vec<Vec<u8>> = Vec::new();
        let root_dir_block = write_dir_block(&self.root, &mut blocks);
        let mut aidx = Vec::new();
        aidx.extend_from_slice(b"XDIA");
        push_u32(&mut aidx, 1);
        push_u32(&mut aidx, 0);
        push_u32(&mut aidx, root_dir_block);
        blocks.push(aidx);
        let index = serialize_container(&blocks, blocks.len() as u32 - 1);

        // Archive: payload blocks, the hash map block, the AARC root block.
        let mut blocks: Vec<Vec<u8>> = Vec::new();
        let mut map = Vec::new();
        for (hash, stored, uncompressed_size) in &self.payloads {
            blocks.push(stored.clone());
            push_u32(&mut map, blocks.len() as u32 - 1);
            map.extend_from_slice(hash);
            push_u64(&mut map, *uncompressed_size);
        }
        blocks.push(map);
        let map_index = blocks.len() as u32 - 1;
        let mut aarc = Vec::new();
        aarc.extend_from_slice(b"CRAA");
        push_u32(&mut aarc, 1);
        push_u32(&mut aarc, self.payloads.len() as u32);
        push_u32(&mut aarc, map_index);
        blocks.push(aarc);
        let archive = serialize_container(&blocks, blocks.len() as u32 - 1);

        (index, archive)
    }

    /// Write `<base>.index` and `<base>.archive`, returning the base path
    /// without extension.
    pub fn write_to(&self, base: &Path) -> std::io::Result<PathBuf> {
        let base = base.with_extension("");
        let (index, archive) = self.build();
        fs::write(base.with_extension("index"), index)?;
        fs::write(base.with_extension("archive"), archive)?;
        Ok(base)
    }
}

fn write_dir_block(dir: &BuilderDir, blocks: &mut Vec<Vec<u8>>) -> u32 {
    let child_blocks: Vec<u32> = dir
        .dirs
        .iter()
        .map(|(_, child)| write_dir_block(child, blocks))
        .collect();

    let mut names = Vec::new();
    let dir_name_offsets: Vec<u32> = dir
        .dirs
        .iter()
        .map(|(name, _)| append_name(&mut names, name))
        .collect();
    let file_name_offsets: Vec<u32> = dir
        .files
        .iter()
        .map(|file| append_name(&mut names, &file.name))
        .collect();

    let mut block = Vec::new();
    push_u32(&mut block, dir.dirs.len() as u32);
    push_u32(&mut block, dir.files.len() as u32);
    for (offset, block_index) in dir_name_offsets.iter().zip(child_blocks.iter()) {
        push_u32(&mut block, *offset);
        push_u32(&mut block, *block_index);
    }
    for (offset, file) in file_name_offsets.iter().zip(dir.files.iter()) {
        push_u32(&mut block, *offset);
        push_u32(&mut block, file.compression.flags());
        block.extend_from_slice(&[0u8; 8]);
        push_u64(&mut block, file.uncompressed_size);
        push_u64(&mut block, file.compressed_size);
        block.extend_from_slice(&file.hash);
        block.extend_from_slice(&[0u8; 4]);
    }
    block.extend_from_slice(&names);

    blocks.push(block);
    blocks.len() as u32 - 1
}

fn serialize_container(blocks: &[Vec<u8>], root_block_index: u32) -> Vec<u8> {
    let mut refs = Vec::with_capacity(blocks.len());
    let mut offset = HEADER_SIZE as u64;
    for block in blocks {
        refs.push((offset, block.len() as u64));
        offset += block.len() as u64;
    }
    let block_table_offset = offset;
    let file_size = block_table_offset + blocks.len() as u64 * 16;

    let mut out = Vec::with_capacity(file_size as usize);
    out.extend_from_slice(b"KCAP");
    push_u32(&mut out, 1);
    out.extend_from_slice(&[0u8; 512]);
    push_u64(&mut out, file_size);
    push_u64(&mut out, 0);
    push_u64(&mut out, block_table_offset);
    push_u32(&mut out, blocks.len() as u32);
    push_u32(&mut out, 0);
    push_u32(&mut out, root_block_index);
    debug_assert_eq!(out.len(), HEADER_SIZE);

    for block in blocks {
        out.extend_from_slice(block);
    }
    for (offset, size) in refs {
        push_u64(&mut out, offset);
        push_u64(&mut out, size);
    }
    out
}

fn append_name(names: &mut Vec<u8>, name: &str) -> u32 {
    let offset = names.len() as u32;
    names.extend_from_slice(name.as_bytes());
    names.push(0);
    offset
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).expect("deflate test payload");
    encoder.finish().expect("deflate test payload")
}

// lzma_rs writes a 13-byte header (5 properties + 8 size); PACK streams
// drop the size field.
fn lzma(data: &[u8]) -> Vec<u8> {
    let mut compressed = Vec::new();
    lzma_rs::lzma_compress(&mut std::io::Cursor::new(data), &mut compressed)
        .expect("lzma test payload");
    let mut stream = compressed[..5].to_vec();
    stream.extend_from_slice(&compressed[13..]);
    stream
}
