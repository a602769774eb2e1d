use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::consts;
use crate::ctype::CompressionType;
use crate::file::{parse_file_entry, FileEntries, FileEntry};
use crate::folder::{
    parse_block_entry, parse_folder_entry, FolderEntries, FolderEntry,
};
use crate::mszip;
use crate::reader::FileReader;
use crate::store::BlockStore;
use crate::string::read_null_terminated_string;
use crate::{Error, Result};

/// Policies for opening a cabinet, passed explicitly to [`Cabinet::open`].
/// There is no process-wide default to mutate; each archive carries the
/// options it was opened with.
#[derive(Clone, Copy, Debug, Default)]
pub struct CabinetOptions {
    /// Keep each data block's raw compressed bytes in memory once fetched,
    /// for the life of the archive, instead of re-reading them from the
    /// byte source on every access.  Trades memory for repeat I/O.  Off by
    /// default.
    pub retain_raw_blocks: bool,
    /// Verify each data block's checksum when its payload is read.  The
    /// format leaves checksums optional (a stored value of zero means
    /// unchecksummed), and this crate does not verify them unless asked.
    /// Off by default.
    pub verify_checksums: bool,
}

/// The name of a neighboring cabinet in a multi-cabinet set, and the disk
/// it lives on.  The linkage is parsed from the header but never followed.
#[derive(Clone, Debug)]
pub struct CabinetLink {
    name: String,
    disk_name: String,
}

impl CabinetLink {
    /// Returns the neighboring cabinet's file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the application-defined name of the disk holding the
    /// neighboring cabinet.
    pub fn disk_name(&self) -> &str {
        &self.disk_name
    }
}

/// A structure for reading a cabinet file.
///
/// Opening a cabinet decodes the entire archive structure in one pass, but
/// no compressed payload bytes are read until a [`FileReader`] needs them.
/// The structure is immutable once built, so any number of readers may be
/// open over one cabinet at a time.
pub struct Cabinet<R> {
    cabinet_set_id: u16,
    cabinet_set_index: u16,
    reserve_data: Vec<u8>,
    prev_cabinet: Option<CabinetLink>,
    next_cabinet: Option<CabinetLink>,
    folders: Vec<FolderEntry>,
    files: Vec<FileEntry>,
    store: BlockStore<R>,
}

impl<R: Read + Seek> Cabinet<R> {
    /// Opens an existing cabinet file with default options.
    pub fn new(reader: R) -> Result<Cabinet<R>> {
        Cabinet::open(reader, CabinetOptions::default())
    }

    /// Opens an existing cabinet file.
    ///
    /// This performs the full structural scan: header, folder table, file
    /// table, and every folder's data-block descriptors (whose payloads are
    /// skipped, not read).  Any malformation, including a byte source that
    /// ends mid-structure, aborts with [`Error::InvalidFormat`] and no
    /// cabinet is returned.
    pub fn open(reader: R, options: CabinetOptions) -> Result<Cabinet<R>> {
        match Cabinet::parse(reader, options) {
            Err(Error::Io(error))
                if error.kind() == io::ErrorKind::UnexpectedEof =>
            {
                Err(Error::InvalidFormat(
                    "cabinet file is truncated".to_string(),
                ))
            }
            result => result,
        }
    }

    fn parse(mut reader: R, options: CabinetOptions) -> Result<Cabinet<R>> {
        let signature = reader.read_u32::<LittleEndian>()?;
        if signature != consts::FILE_SIGNATURE {
            invalid_format!("not a cabinet file (invalid file signature)");
        }
        let _reserved1 = reader.read_u32::<LittleEndian>()?;
        let total_size = reader.read_u32::<LittleEndian>()?;
        if total_size > consts::MAX_TOTAL_CAB_SIZE {
            invalid_format!(
                "cabinet total size field is too large \
                 ({} bytes; max is {} bytes)",
                total_size,
                consts::MAX_TOTAL_CAB_SIZE
            );
        }
        let _reserved2 = reader.read_u32::<LittleEndian>()?;
        let first_file_offset = reader.read_u32::<LittleEndian>()?;
        let _reserved3 = reader.read_u32::<LittleEndian>()?;
        let minor_version = reader.read_u8()?;
        let major_version = reader.read_u8()?;
        if major_version > consts::VERSION_MAJOR
            || major_version == consts::VERSION_MAJOR
                && minor_version > consts::VERSION_MINOR
        {
            invalid_format!(
                "version {}.{} cabinet files are not supported",
                major_version,
                minor_version
            );
        }
        let num_folders = reader.read_u16::<LittleEndian>()? as usize;
        let num_files = reader.read_u16::<LittleEndian>()? as usize;
        let flags = reader.read_u16::<LittleEndian>()?;
        let cabinet_set_id = reader.read_u16::<LittleEndian>()?;
        let cabinet_set_index = reader.read_u16::<LittleEndian>()?;
        let mut header_reserve_size = 0u16;
        let mut folder_reserve_size = 0u8;
        let mut data_reserve_size = 0u8;
        if (flags & consts::FLAG_RESERVE_PRESENT) != 0 {
            header_reserve_size = reader.read_u16::<LittleEndian>()?;
            folder_reserve_size = reader.read_u8()?;
            data_reserve_size = reader.read_u8()?;
        }
        let mut reserve_data = vec![0u8; header_reserve_size as usize];
        if header_reserve_size > 0 {
            reader.read_exact(&mut reserve_data)?;
        }
        let prev_cabinet = if (flags & consts::FLAG_PREV_CABINET) != 0 {
            Some(parse_cabinet_link(&mut reader)?)
        } else {
            None
        };
        let next_cabinet = if (flags & consts::FLAG_NEXT_CABINET) != 0 {
            Some(parse_cabinet_link(&mut reader)?)
        } else {
            None
        };
        let mut folders = Vec::with_capacity(num_folders);
        for _ in 0..num_folders {
            let entry = parse_folder_entry(
                &mut reader,
                folder_reserve_size as usize,
            )?;
            folders.push(entry);
        }
        // A gap between the folder table and the file table is legal.
        reader.seek(SeekFrom::Start(first_file_offset as u64))?;
        let mut files = Vec::with_capacity(num_files);
        for _ in 0..num_files {
            let entry = parse_file_entry(&mut reader)?;
            if entry.folder_index as usize >= folders.len() {
                invalid_format!(
                    "file {:?} has folder index {} out of bounds \
                     (cabinet has {} folders)",
                    entry.name(),
                    entry.folder_index,
                    folders.len()
                );
            }
            files.push(entry);
        }
        for folder in folders.iter_mut() {
            reader
                .seek(SeekFrom::Start(folder.first_data_block_offset as u64))?;
            let mut total_uncompressed_size = 0u64;
            for _ in 0..folder.num_data_blocks() {
                let block =
                    parse_block_entry(&mut reader, data_reserve_size as usize)?;
                total_uncompressed_size += block.uncompressed_size as u64;
                folder.blocks.push(block);
            }
            folder.total_uncompressed_size = total_uncompressed_size;
        }
        for file in files.iter() {
            let folder = &folders[file.folder_index as usize];
            let end = file.uncompressed_offset as u64
                + file.uncompressed_size() as u64;
            if end > folder.total_uncompressed_size {
                invalid_format!(
                    "file {:?} extends past the end of its folder \
                     (offset {} + size {} > folder size {})",
                    file.name(),
                    file.uncompressed_offset,
                    file.uncompressed_size(),
                    folder.total_uncompressed_size
                );
            }
        }
        Ok(Cabinet {
            cabinet_set_id,
            cabinet_set_index,
            reserve_data,
            prev_cabinet,
            next_cabinet,
            folders,
            files,
            store: BlockStore::new(reader, options),
        })
    }

    /// Returns the cabinet set ID for this cabinet (an arbitrary number
    /// used to group together a set of cabinets).
    pub fn cabinet_set_id(&self) -> u16 {
        self.cabinet_set_id
    }

    /// Returns this cabinet's (zero-based) index within its cabinet set.
    pub fn cabinet_set_index(&self) -> u16 {
        self.cabinet_set_index
    }

    /// Returns the application-defined reserve data stored in the cabinet
    /// header.
    pub fn reserve_data(&self) -> &[u8] {
        &self.reserve_data
    }

    /// Returns the previous cabinet in this cabinet's set, if the header
    /// declares one.  Continuation across cabinets is never followed.
    pub fn prev_cabinet(&self) -> Option<&CabinetLink> {
        self.prev_cabinet.as_ref()
    }

    /// Returns the next cabinet in this cabinet's set, if the header
    /// declares one.  Continuation across cabinets is never followed.
    pub fn next_cabinet(&self) -> Option<&CabinetLink> {
        self.next_cabinet.as_ref()
    }

    /// Returns an iterator over the folder entries in this cabinet.
    pub fn folder_entries(&self) -> FolderEntries {
        FolderEntries { iter: self.folders.iter() }
    }

    /// Returns an iterator over the file entries in this cabinet, in file
    /// table order.
    pub fn file_entries(&self) -> FileEntries {
        FileEntries { iter: self.files.iter() }
    }

    /// Returns the names of the files in this cabinet, in file table order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(FileEntry::name)
    }

    /// Returns the entry for the file with the given name, if any.
    pub fn get_file_entry(&self, name: &str) -> Option<&FileEntry> {
        self.files.iter().find(|file| file.name() == name)
    }

    /// Returns a reader over the decompressed data for the file in the
    /// cabinet with the given name.  Fails with [`Error::NotFound`] if no
    /// such file exists.
    ///
    /// Multiple readers may be open over the same cabinet at once; a
    /// failure within one reader does not affect the others.
    pub fn read_file(&self, name: &str) -> Result<FileReader<R>> {
        match self.get_file_entry(name) {
            Some(entry) => {
                let folder = &self.folders[entry.folder_index as usize];
                Ok(FileReader::new(self, folder, entry))
            }
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    /// Closes the cabinet, releasing any retained raw blocks, and returns
    /// the underlying byte source.
    pub fn close(self) -> R {
        self.store.into_inner()
    }

    /// Produces the decompressed bytes of one data block, of exactly the
    /// block's declared uncompressed length.
    ///
    /// Folders declaring a compression scheme this crate cannot decompress
    /// are rejected here, before any payload bytes are fetched.
    pub(crate) fn decompress_block(
        &self,
        folder: &FolderEntry,
        block_index: usize,
    ) -> Result<Vec<u8>> {
        let compression_type = folder.compression_type();
        if !compression_type.is_supported() {
            return Err(Error::UnsupportedCompression(compression_type));
        }
        let block = &folder.blocks[block_index];
        let raw = self.store.raw_bytes(block)?;
        let uncompressed_size = block.uncompressed_size as usize;
        match compression_type {
            CompressionType::None => {
                // By format convention an uncompressed block's two size
                // fields must agree.
                if raw.len() != uncompressed_size {
                    corrupt_data!(
                        "uncompressed block size mismatch \
                         (compressed length {}, uncompressed length {})",
                        raw.len(),
                        uncompressed_size
                    );
                }
                Ok(raw)
            }
            CompressionType::MsZip => {
                mszip::decompress_block(&raw, uncompressed_size)
            }
            _ => unreachable!(),
        }
    }
}

impl<R> fmt::Debug for Cabinet<R> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("Cabinet")
            .field("cabinet_set_id", &self.cabinet_set_id)
            .field("cabinet_set_index", &self.cabinet_set_index)
            .field("num_folders", &self.folders.len())
            .field("num_files", &self.files.len())
            .finish_non_exhaustive()
    }
}

fn parse_cabinet_link<R: Read>(reader: &mut R) -> Result<CabinetLink> {
    let name = read_null_terminated_string(reader, false)?;
    let disk_name = read_null_terminated_string(reader, false)?;
    Ok(CabinetLink { name, disk_name })
}
