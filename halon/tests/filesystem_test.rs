//! End-to-end tests over synthetic `.index`/`.archive` pairs.

use std::path::{Path, PathBuf};

use halon::test_utils::PackBuilder;
use halon::{CompressionType, Error, Filesystem, Node};

const TOC_XML: &[u8] = b"<toc><addon>FloatText</addon></toc>";
const FLOAT_TEXT_LUA: &[u8] =
    b"local FloatText = {}\nfunction FloatText:OnLoad()\nend\nreturn FloatText\n";

fn sample_builder() -> PackBuilder {
    let mut builder = PackBuilder::new();
    builder.add_file("UI/FloatText/FloatText.lua", FLOAT_TEXT_LUA, CompressionType::Lzma);
    builder.add_file(
        "UI/FloatText/FloatTextPanel.lua",
        b"-- panel logic\n",
        CompressionType::None,
    );
    builder.add_file(
        "UI/FloatText/FloatTextPanel.xml",
        b"<Forms/>",
        CompressionType::Deflate,
    );
    builder.add_file(
        "UI/FloatText/TestFloatTextForms.xml",
        b"<TestForms/>",
        CompressionType::None,
    );
    builder.add_file("UI/FloatText/toc.xml", TOC_XML, CompressionType::Deflate);
    builder.add_file("UI/art.tex", b"\x00\x01\x02\x03pixels", CompressionType::None);
    builder.add_file("Sound/login.wav", b"RIFFwav-data", CompressionType::None);
    builder
}

fn write_sample(dir: &Path) -> PathBuf {
    sample_builder().write_to(&dir.join("ClientData")).unwrap()
}

#[test]
fn test_open_with_or_without_extension() {
    let tmp = tempfile::tempdir().unwrap();
    let base = write_sample(tmp.path());

    let a = Filesystem::open(&base).unwrap();
    let b = Filesystem::open(base.with_extension("index")).unwrap();
    assert_eq!(a.entry_count(), b.entry_count());
}

#[test]
fn test_decode_is_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    let base = write_sample(tmp.path());

    let a = Filesystem::open(&base).unwrap();
    let b = Filesystem::open(&base).unwrap();
    let paths_a: Vec<String> = a.find("").map(|n| n.path().to_string()).collect();
    let paths_b: Vec<String> = b.find("").map(|n| n.path().to_string()).collect();
    assert_eq!(paths_a, paths_b);
}

#[test]
fn test_find_empty_pattern_yields_every_node_preorder() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = Filesystem::open(write_sample(tmp.path())).unwrap();

    let paths: Vec<&str> = fs.find("").map(Node::path).collect();
    assert_eq!(
        paths,
        [
            "UI",
            "UI/FloatText",
            "UI/FloatText/FloatText.lua",
            "UI/FloatText/FloatTextPanel.lua",
            "UI/FloatText/FloatTextPanel.xml",
            "UI/FloatText/TestFloatTextForms.xml",
            "UI/FloatText/toc.xml",
            "UI/art.tex",
            "Sound",
            "Sound/login.wav",
        ]
    );
    assert_eq!(paths.len(), fs.entry_count());
}

#[test]
fn test_resolve_roundtrips_every_cached_path() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = Filesystem::open(write_sample(tmp.path())).unwrap();

    for node in fs.find("") {
        let resolved = fs.resolve(node.path()).unwrap();
        assert_eq!(resolved.path(), node.path());
    }
}

#[test]
fn test_list_children_in_declared_order() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = Filesystem::open(write_sample(tmp.path())).unwrap();

    let dir = fs.resolve("UI/FloatText").unwrap().as_directory().unwrap();
    let names: Vec<&str> = dir.children.iter().map(Node::name).collect();
    assert_eq!(
        names,
        [
            "FloatText.lua",
            "FloatTextPanel.lua",
            "FloatTextPanel.xml",
            "TestFloatTextForms.xml",
            "toc.xml",
        ]
    );
}

#[test]
fn test_read_every_compression_scheme() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = Filesystem::open(write_sample(tmp.path())).unwrap();

    for (path, contents) in [
        ("UI/FloatText/FloatText.lua", FLOAT_TEXT_LUA),
        ("UI/FloatText/toc.xml", TOC_XML),
        ("UI/art.tex", b"\x00\x01\x02\x03pixels".as_slice()),
    ] {
        let file = fs.resolve(path).unwrap().as_file().unwrap();
        assert_eq!(fs.read(file).unwrap(), contents, "{}", path);
        fs.verify(file).unwrap();
    }
}

#[test]
fn test_extract_subtree_keeps_folder_name_and_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = Filesystem::open(write_sample(tmp.path())).unwrap();

    let out = tmp.path().join("out");
    let node = fs.resolve("UI/FloatText").unwrap();
    fs.extract(node, &out).unwrap();

    let extracted = std::fs::read(out.join("FloatText").join("toc.xml")).unwrap();
    let file = fs.resolve("UI/FloatText/toc.xml").unwrap().as_file().unwrap();
    assert_eq!(extracted, fs.read(file).unwrap());

    // Idempotent directory creation: extracting again succeeds.
    fs.extract(node, &out).unwrap();
}

#[test]
fn test_extract_single_file_creates_destination() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = Filesystem::open(write_sample(tmp.path())).unwrap();

    let node = fs.resolve("UI/art.tex").unwrap();
    let out = tmp.path().join("solo").join("deep");
    fs.extract(node, &out).unwrap();
    assert_eq!(
        std::fs::read(out.join("art.tex")).unwrap(),
        b"\x00\x01\x02\x03pixels"
    );
}

#[test]
fn test_extract_root_recreates_whole_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = Filesystem::open(write_sample(tmp.path())).unwrap();

    let out = tmp.path().join("all");
    fs.extract(fs.root(), &out).unwrap();
    assert!(out.join("UI/FloatText/FloatText.lua").is_file());
    assert!(out.join("Sound/login.wav").is_file());
}

#[test]
fn test_self_diff_is_all_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let base = write_sample(tmp.path());
    let a = Filesystem::open(&base).unwrap();
    let b = Filesystem::open(&base).unwrap();

    let report = a.diff(&b);
    assert!(report.is_unchanged());
    assert!(report.entries.contains_key("UI"));
    assert!(report.entries.contains_key("Sound"));
}

#[test]
fn test_diff_reports_single_changed_file() {
    let tmp = tempfile::tempdir().unwrap();
    let old = Filesystem::open(write_sample(tmp.path())).unwrap();

    let mut patched = PackBuilder::new();
    patched.add_file("UI/FloatText/FloatText.lua", FLOAT_TEXT_LUA, CompressionType::Lzma);
    patched.add_file(
        "UI/FloatText/FloatTextPanel.lua",
        b"-- panel logic, patched with more of it\n",
        CompressionType::None,
    );
    patched.add_file(
        "UI/FloatText/FloatTextPanel.xml",
        b"<Forms/>",
        CompressionType::Deflate,
    );
    patched.add_file(
        "UI/FloatText/TestFloatTextForms.xml",
        b"<TestForms/>",
        CompressionType::None,
    );
    patched.add_file("UI/FloatText/toc.xml", TOC_XML, CompressionType::Deflate);
    patched.add_file("UI/art.tex", b"\x00\x01\x02\x03pixels", CompressionType::None);
    patched.add_file("Sound/login.wav", b"RIFFwav-data", CompressionType::None);
    let new_base = patched.write_to(&tmp.path().join("ClientDataNew")).unwrap();
    let new = Filesystem::open(&new_base).unwrap();

    let report = old.diff(&new);
    let ui = &report.entries["UI"];
    assert_eq!((ui.removed, ui.added, ui.changed), (0, 0, 1));
    assert!(report.entries["Sound"].is_zero());
}

#[test]
fn test_resolve_through_file_segment_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let fs = Filesystem::open(write_sample(tmp.path())).unwrap();

    match fs.resolve("UI/FloatText/toc.xml/extra") {
        Err(Error::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_missing_archive_half_is_missing_pair() {
    let tmp = tempfile::tempdir().unwrap();
    let base = write_sample(tmp.path());
    std::fs::remove_file(base.with_extension("archive")).unwrap();

    match Filesystem::open(&base) {
        Err(Error::MissingPair(_)) => {}
        other => panic!("expected MissingPair, got {:?}", other),
    }
}

#[test]
fn test_corrupt_index_magic_is_unrecognized() {
    let tmp = tempfile::tempdir().unwrap();
    let base = write_sample(tmp.path());
    let index_path = base.with_extension("index");
    let mut bytes = std::fs::read(&index_path).unwrap();
    bytes[0] = b'!';
    std::fs::write(&index_path, bytes).unwrap();

    match Filesystem::open(&base) {
        Err(Error::UnrecognizedFormat(_)) => {}
        other => panic!("expected UnrecognizedFormat, got {:?}", other),
    }
}

#[test]
fn test_flipped_payload_byte_fails_verify_but_not_read() {
    let tmp = tempfile::tempdir().unwrap();
    let base = write_sample(tmp.path());

    // The stored payload of an uncompressed entry appears verbatim in the
    // archive; flip one byte of it.
    let archive_path = base.with_extension("archive");
    let mut bytes = std::fs::read(&archive_path).unwrap();
    let marker = b"RIFFwav-data";
    let position = bytes
        .windows(marker.len())
        .position(|window| window == marker)
        .unwrap();
    bytes[position] ^= 0xff;
    std::fs::write(&archive_path, bytes).unwrap();

    let fs = Filesystem::open(&base).unwrap();
    let file = fs.resolve("Sound/login.wav").unwrap().as_file().unwrap();

    // Reads do not verify implicitly.
    assert_eq!(fs.read(file).unwrap().len(), marker.len());
    match fs.verify(file) {
        Err(Error::CorruptArchive(_)) => {}
        other => panic!("expected CorruptArchive, got {:?}", other),
    }

    // The filesystem stays usable after a failed verification.
    assert!(fs.resolve("UI/FloatText/toc.xml").is_ok());
}
