//! Subcommand implementations on top of the `halon` query surface.

use std::path::Path;

use halon::{diff, Filesystem, Node};

use crate::debug_eprintln;
use crate::error::Result;

pub fn find(base: &str, pattern: &str) -> Result<()> {
    let fs = Filesystem::open(base)?;
    print_archive_debug(&fs);
    for node in fs.find(pattern) {
        print_node(node);
    }
    Ok(())
}

pub fn list(base: &str, path: &str, recursive: bool) -> Result<()> {
    let fs = Filesystem::open(base)?;
    print_archive_debug(&fs);
    let node = fs.resolve(path)?;
    match node {
        Node::File(_) => print_node(node),
        Node::Directory(dir) => {
            if recursive {
                for item in node.walk() {
                    print_node(item);
                }
            } else {
                for child in &dir.children {
                    print_node(child);
                }
            }
        }
    }
    Ok(())
}

pub fn extract(base: &str, path: &str, destination: &str) -> Result<()> {
    let fs = Filesystem::open(base)?;
    print_archive_debug(&fs);
    let node = fs.resolve(path)?;
    fs.extract(node, Path::new(destination))?;
    Ok(())
}

pub fn diff(base: &str, other: &str, path: &str) -> Result<()> {
    let ours = Filesystem::open(base)?;
    let theirs = Filesystem::open(other)?;
    print_archive_debug(&ours);
    print_archive_debug(&theirs);

    let report = if path.is_empty() {
        ours.diff(&theirs)
    } else {
        diff::diff(ours.resolve(path)?, theirs.resolve(path)?)
    };

    for (name, counts) in &report.entries {
        println!("{}: {}", name, counts);
    }
    if report.is_unchanged() {
        println!("No differences.");
    }
    Ok(())
}

fn print_node(node: &Node) {
    println!("{}", node.path());
    if let Node::File(file) = node {
        debug_eprintln!("\tcompression: {:?}", file.compression);
        debug_eprintln!("\tuncompressed: {} bytes", file.uncompressed_size);
        debug_eprintln!("\tcompressed: {} bytes", file.compressed_size);
        debug_eprintln!("\tsha1: {}", hex::encode(file.hash));
        debug_eprintln!("\toffset: {}", file.archive_offset);
    }
}

fn print_archive_debug(fs: &Filesystem) {
    debug_eprintln!("Archive {}:", fs.base().display());
    debug_eprintln!("\tindex version: {}", fs.index_header().version);
    debug_eprintln!("\tindex size: {} bytes", fs.index_header().file_size);
    debug_eprintln!("\tarchive size: {} bytes", fs.archive_header().file_size);
    debug_eprintln!("\tentries: {}", fs.entry_count());
}
