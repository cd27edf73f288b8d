use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The `.index` or `.archive` half of the pair does not exist.
    MissingPair(PathBuf),
    /// A header or block magic did not match the PACK format.
    UnrecognizedFormat(String),
    /// A read ran past the end of the buffer being decoded.
    TruncatedData { offset: usize, needed: usize },
    /// The index decoded but its structure is inconsistent.
    CorruptIndex(String),
    /// Archive payload bytes do not match what the index promised.
    CorruptArchive(String),
    /// Path resolution miss. Recoverable; the filesystem stays usable.
    NotFound(String),
    IoError(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::MissingPair(ref base) => write!(
                f,
                "No {}.index/{}.archive pair",
                base.display(),
                base.display()
            ),
            Error::UnrecognizedFormat(ref msg) => write!(f, "Unrecognized format: {}", msg),
            Error::TruncatedData { offset, needed } => write!(
                f,
                "Truncated data: {} bytes wanted at offset {}",
                needed, offset
            ),
            Error::CorruptIndex(ref msg) => write!(f, "Corrupt index: {}", msg),
            Error::CorruptArchive(ref msg) => write!(f, "Corrupt archive: {}", msg),
            Error::NotFound(ref path) => write!(f, "Could not find {}", path),
            Error::IoError(ref err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::IoError(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Error {
        Error::IoError(error)
    }
}

impl std::convert::From<std::str::Utf8Error> for Error {
    fn from(error: std::str::Utf8Error) -> Error {
        Error::CorruptIndex(format!("name is not valid UTF-8: {}", error))
    }
}
