//! Read-only access to WildStar PACK archive pairs.
//!
//! The game's patch data ships as pairs of files sharing a base name: an
//! `.index` describing a hierarchical namespace of directories and files,
//! and an `.archive` holding the raw bytes each file entry refers to.
//! This crate decodes the index into an immutable in-memory tree, resolves
//! paths and substring searches against it, streams payload bytes out of
//! the archive on demand, and computes structural diffs between two
//! independently opened pairs.
//!
//! ```no_run
//! use halon::Filesystem;
//!
//! # fn main() -> halon::Result<()> {
//! let fs = Filesystem::open("Patch/ClientData")?;
//! for node in fs.find("FloatText") {
//!     println!("{}", node.path());
//! }
//! let file = fs.resolve("UI/FloatText/toc.xml")?.as_file().unwrap();
//! let contents = fs.read(file)?;
//! # let _ = contents;
//! # Ok(())
//! # }
//! ```
//!
//! The crate only reads; it never writes or mutates archives. The index is
//! small enough to materialize fully, while archive payloads are fetched
//! per read. A [`Filesystem`] is immutable after `open`, so it can be
//! queried by any number of independent traversals and treated as a value
//! snapshot by [`Filesystem::diff`].

pub mod archive;
pub mod compression;
pub mod diff;
pub mod error;
pub mod filesystem;
pub mod index;
pub mod node;
pub mod reader;
pub mod test_utils;

pub use compression::CompressionType;
pub use diff::{DiffCounts, DiffReport};
pub use error::{Error, Result};
pub use filesystem::Filesystem;
pub use node::{Directory, File, Find, Node};
