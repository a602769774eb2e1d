use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom};
use std::slice;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::ctype::CompressionType;
use crate::Result;

/// An iterator over the folder entries in a cabinet.
#[derive(Clone)]
pub struct FolderEntries<'a> {
    pub(crate) iter: slice::Iter<'a, FolderEntry>,
}

impl<'a> Iterator for FolderEntries<'a> {
    type Item = &'a FolderEntry;

    fn next(&mut self) -> Option<&'a FolderEntry> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a> ExactSizeIterator for FolderEntries<'a> {}

/// Metadata about one folder (compression unit) in a cabinet.
pub struct FolderEntry {
    pub(crate) first_data_block_offset: u32,
    num_data_blocks: u16,
    compression_type: CompressionType,
    reserve_data: Vec<u8>,
    pub(crate) blocks: Vec<BlockEntry>,
    pub(crate) total_uncompressed_size: u64,
}

impl FolderEntry {
    /// Returns the scheme used to compress this folder's data.
    pub fn compression_type(&self) -> CompressionType {
        self.compression_type
    }

    /// Returns the number of data blocks used to store this folder's data.
    pub fn num_data_blocks(&self) -> u16 {
        self.num_data_blocks
    }

    /// Returns the application-defined reserve data for this folder.
    pub fn reserve_data(&self) -> &[u8] {
        &self.reserve_data
    }

    /// Returns the sum of the declared uncompressed lengths of this
    /// folder's data blocks, which is the length of the folder's
    /// uncompressed byte stream.
    pub fn uncompressed_size(&self) -> u64 {
        self.total_uncompressed_size
    }
}

/// One compressed chunk within a folder.  Payload bytes are not read during
/// the structural scan; only their location in the byte source is recorded,
/// and `raw` stays empty until the block store first fetches them under the
/// retain policy.
pub(crate) struct BlockEntry {
    pub(crate) checksum: u32,
    pub(crate) compressed_size: u16,
    pub(crate) uncompressed_size: u16,
    pub(crate) reserve_data: Vec<u8>,
    pub(crate) data_offset: u64,
    pub(crate) raw: RefCell<Option<Vec<u8>>>,
}

pub(crate) fn parse_folder_entry<R: Read>(
    reader: &mut R,
    reserve_size: usize,
) -> Result<FolderEntry> {
    let first_data_block_offset = reader.read_u32::<LittleEndian>()?;
    let num_data_blocks = reader.read_u16::<LittleEndian>()?;
    let compression_bits = reader.read_u16::<LittleEndian>()?;
    let compression_type = CompressionType::from_bitfield(compression_bits);
    let mut reserve_data = vec![0u8; reserve_size];
    if reserve_size > 0 {
        reader.read_exact(&mut reserve_data)?;
    }
    Ok(FolderEntry {
        first_data_block_offset,
        num_data_blocks,
        compression_type,
        reserve_data,
        blocks: Vec::with_capacity(num_data_blocks as usize),
        total_uncompressed_size: 0,
    })
}

/// Parses one data-block descriptor, records where its payload starts, and
/// skips forward over the payload without reading it.
pub(crate) fn parse_block_entry<R: Read + Seek>(
    reader: &mut R,
    reserve_size: usize,
) -> Result<BlockEntry> {
    let checksum = reader.read_u32::<LittleEndian>()?;
    let compressed_size = reader.read_u16::<LittleEndian>()?;
    let uncompressed_size = reader.read_u16::<LittleEndian>()?;
    let mut reserve_data = vec![0u8; reserve_size];
    if reserve_size > 0 {
        reader.read_exact(&mut reserve_data)?;
    }
    let data_offset = reader.stream_position()?;
    reader.seek(SeekFrom::Current(compressed_size as i64))?;
    Ok(BlockEntry {
        checksum,
        compressed_size,
        uncompressed_size,
        reserve_data,
        data_offset,
        raw: RefCell::new(None),
    })
}
