use std::io;

use thiserror::Error;

use crate::ctype::CompressionType;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while reading a cabinet.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The byte source is not a cabinet, or its header or structure tables
    /// are malformed or truncated.  Opening the archive fails as a whole;
    /// no partially parsed cabinet is ever returned.
    #[error("invalid cabinet: {0}")]
    InvalidFormat(String),

    /// A folder declares a compression scheme this crate cannot decompress
    /// (Quantum, LZX, or a reserved value).
    #[error("unsupported compression: {0}")]
    UnsupportedCompression(CompressionType),

    /// A data block's payload could not be decompressed to its declared
    /// uncompressed length.
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// No file with the requested name exists in the cabinet.
    #[error("no such file in cabinet: {0:?}")]
    NotFound(String),

    /// The stream was closed; no further operations are possible on it.
    #[error("stream closed")]
    StreamClosed,

    /// An error from the underlying byte source, propagated immediately.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<Error> for io::Error {
    fn from(error: Error) -> io::Error {
        match error {
            Error::Io(error) => error,
            Error::NotFound(_) => {
                io::Error::new(io::ErrorKind::NotFound, error)
            }
            Error::UnsupportedCompression(_) => {
                io::Error::new(io::ErrorKind::Unsupported, error)
            }
            Error::InvalidFormat(_) | Error::CorruptData(_) => {
                io::Error::new(io::ErrorKind::InvalidData, error)
            }
            Error::StreamClosed => {
                io::Error::new(io::ErrorKind::Other, error)
            }
        }
    }
}
