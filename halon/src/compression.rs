//! Payload compression schemes used by `.archive` blocks.
//!
//! The file entry's flags field selects the scheme: 1 is stored
//! uncompressed, 3 is zlib deflate, 5 is LZMA. The LZMA streams carry only
//! the 5-byte properties header; the uncompressed size is taken from the
//! index entry instead of the stream.

use std::io::Read;

use crate::error::{Error, Result};

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CompressionType {
    None,
    Deflate,
    Lzma,
}

impl CompressionType {
    pub fn from_flags(flags: u32) -> Result<CompressionType> {
        match flags {
            1 => Ok(CompressionType::None),
            3 => Ok(CompressionType::Deflate),
            5 => Ok(CompressionType::Lzma),
            _ => Err(Error::CorruptIndex(format!(
                "unknown compression flags {:#x}",
                flags
            ))),
        }
    }

    pub fn flags(&self) -> u32 {
        match *self {
            CompressionType::None => 1,
            CompressionType::Deflate => 3,
            CompressionType::Lzma => 5,
        }
    }

    /// Decompress `compressed` to exactly `uncompressed_size` bytes. A
    /// stored payload is returned as-is; for the other schemes a length
    /// mismatch after decompression means the pair is corrupt.
    pub fn decompress(
        compressed: &[u8],
        compression_type: CompressionType,
        uncompressed_size: u64,
    ) -> Result<Vec<u8>> {
        let contents = match compression_type {
            CompressionType::None => return Ok(compressed.to_owned()),
            CompressionType::Deflate => {
                let mut contents = Vec::with_capacity(uncompressed_size as usize);
                let mut decoder = flate2::read::ZlibDecoder::new(compressed);
                decoder
                    .read_to_end(&mut contents)
                    .map_err(|err| Error::CorruptArchive(format!("deflate: {}", err)))?;
                contents
            }
            CompressionType::Lzma => {
                let mut contents = Vec::with_capacity(uncompressed_size as usize);
                let options = lzma_rs::decompress::Options {
                    unpacked_size: lzma_rs::decompress::UnpackedSize::UseProvided(Some(
                        uncompressed_size,
                    )),
                    ..Default::default()
                };
                let mut input = std::io::Cursor::new(compressed);
                lzma_rs::lzma_decompress_with_options(&mut input, &mut contents, &options)
                    .map_err(|err| Error::CorruptArchive(format!("lzma: {:?}", err)))?;
                contents
            }
        };

        if contents.len() as u64 != uncompressed_size {
            return Err(Error::CorruptArchive(format!(
                "decompressed to {} bytes, index says {}",
                contents.len(),
                uncompressed_size
            )));
        }
        Ok(contents)
    }
}
