//! A library for reading [Windows
//! cabinet](https://en.wikipedia.org/wiki/Cabinet_(file_format)) (CAB) files
//! as lazy byte streams.
//!
//! The whole archive structure (header, folders, files, data-block
//! descriptors) is decoded in one pass when the cabinet is opened, but
//! compressed payload bytes are only fetched and decompressed once a file
//! stream actually needs them.  A [`FileReader`] serves one archived file's
//! bytes, transparently crossing data-block boundaries within its folder.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::Read;
//!
//! let cabinet = cab_stream::Cabinet::new(File::open("archive.cab")?)?;
//! for name in cabinet.file_names() {
//!     println!("{}", name);
//! }
//! let mut reader = cabinet.read_file("setup.inf")?;
//! let mut data = Vec::new();
//! reader.read_to_end(&mut data)?;
//! # Ok::<(), cab_stream::Error>(())
//! ```
//!
//! Only uncompressed and MSZIP folders can be decompressed; folders
//! declaring Quantum or LZX are listed but rejected with
//! [`Error::UnsupportedCompression`] when read.  Multi-cabinet sets are
//! recognized but never followed, and per-block checksums are not verified
//! unless [`CabinetOptions::verify_checksums`] is set.

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod cabinet;
mod consts;
mod ctype;
mod datetime;
mod error;
mod file;
mod folder;
mod mszip;
mod reader;
mod store;
mod string;

pub use crate::cabinet::{Cabinet, CabinetLink, CabinetOptions};
pub use crate::ctype::CompressionType;
pub use crate::error::{Error, Result};
pub use crate::file::{FileEntries, FileEntry};
pub use crate::folder::{FolderEntries, FolderEntry};
pub use crate::reader::FileReader;
