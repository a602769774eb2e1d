use std::fmt;
use std::io::{self, Read, Seek};

use crate::cabinet::Cabinet;
use crate::file::FileEntry;
use crate::folder::FolderEntry;
use crate::{Error, Result};

/// A forward-only reader over the decompressed bytes of one file in a
/// cabinet.
///
/// The file's bytes live somewhere inside its folder's uncompressed byte
/// stream, which is stored as a sequence of independently compressed data
/// blocks; this reader crosses block boundaries transparently.  Only the
/// block under the cursor is ever held decompressed (a single-slot cache,
/// reloaded when the cursor moves to a different block), and [`skip`]
/// advances by block-length bookkeeping alone, so blocks that are skipped
/// in full are never fetched or decompressed.
///
/// Reaching end-of-stream is not terminal: further [`read`] calls simply
/// keep reporting zero bytes.  [`close`] is terminal, and every later
/// operation fails with [`Error::StreamClosed`].
///
/// [`read`]: FileReader::read
/// [`skip`]: FileReader::skip
/// [`close`]: FileReader::close
pub struct FileReader<'a, R> {
    cabinet: &'a Cabinet<R>,
    folder: &'a FolderEntry,
    entry: &'a FileEntry,
    delivered: u64,
    block_index: usize,
    offset_in_block: u64,
    decompressed: Option<(usize, Vec<u8>)>,
    closed: bool,
}

impl<'a, R: Read + Seek> FileReader<'a, R> {
    /// Positions a new reader at the file's starting offset within its
    /// folder.  A start offset beyond the folder's blocks leaves the reader
    /// at end-of-stream; construction itself cannot fail.
    pub(crate) fn new(
        cabinet: &'a Cabinet<R>,
        folder: &'a FolderEntry,
        entry: &'a FileEntry,
    ) -> FileReader<'a, R> {
        let start = entry.uncompressed_offset as u64;
        let mut block_index = 0;
        let mut block_start = 0u64;
        for block in &folder.blocks {
            let block_len = block.uncompressed_size as u64;
            if start < block_start + block_len {
                break;
            }
            block_start += block_len;
            block_index += 1;
        }
        FileReader {
            cabinet,
            folder,
            entry,
            delivered: 0,
            block_index,
            offset_in_block: start - block_start,
            decompressed: None,
            closed: false,
        }
    }

    /// Returns the number of bytes of this file not yet delivered.
    pub fn remaining(&self) -> u64 {
        self.entry.uncompressed_size() as u64 - self.delivered
    }

    /// Reads up to `buf.len()` decompressed bytes of the file, crossing
    /// data-block boundaries as needed.  Returns the number of bytes
    /// copied; `Ok(0)` for a non-empty `buf` signals end-of-stream.  A
    /// zero-length `buf` returns `Ok(0)` without side effects.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        if buf.is_empty() {
            return Ok(0);
        }
        let num_blocks = self.folder.blocks.len();
        let mut copied = 0;
        while copied < buf.len() {
            if self.remaining() == 0 || self.block_index >= num_blocks {
                break;
            }
            let block_len = self.folder.blocks[self.block_index]
                .uncompressed_size as u64;
            if self.offset_in_block >= block_len {
                self.block_index += 1;
                self.offset_in_block = 0;
                continue;
            }
            let count = ((buf.len() - copied) as u64)
                .min(block_len - self.offset_in_block)
                .min(self.remaining()) as usize;
            let offset = self.offset_in_block as usize;
            let data = self.current_block_data()?;
            buf[copied..copied + count]
                .copy_from_slice(&data[offset..offset + count]);
            self.offset_in_block += count as u64;
            self.delivered += count as u64;
            copied += count;
        }
        Ok(copied)
    }

    /// Discards up to `count` bytes, as if they had been read, using only
    /// the blocks' declared lengths; no block that is passed over in full
    /// is fetched or decompressed.  Returns the number of bytes skipped,
    /// which is smaller than `count` only at end-of-stream.
    pub fn skip(&mut self, count: u64) -> Result<u64> {
        self.ensure_open()?;
        let num_blocks = self.folder.blocks.len();
        let mut skipped = 0u64;
        while skipped < count {
            if self.remaining() == 0 || self.block_index >= num_blocks {
                break;
            }
            let block_len = self.folder.blocks[self.block_index]
                .uncompressed_size as u64;
            if self.offset_in_block >= block_len {
                self.block_index += 1;
                self.offset_in_block = 0;
                continue;
            }
            let step = (count - skipped)
                .min(block_len - self.offset_in_block)
                .min(self.remaining());
            self.offset_in_block += step;
            self.delivered += step;
            skipped += step;
        }
        Ok(skipped)
    }

    /// Closes the reader.  Every subsequent operation fails with
    /// [`Error::StreamClosed`].  Other readers over the same cabinet are
    /// unaffected.
    pub fn close(&mut self) {
        self.closed = true;
        self.decompressed = None;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::StreamClosed)
        } else {
            Ok(())
        }
    }

    /// Decompresses the block under the cursor, reusing the cached copy
    /// while the cursor stays within one block.
    fn current_block_data(&mut self) -> Result<&[u8]> {
        let stale = match &self.decompressed {
            Some((index, _)) => *index != self.block_index,
            None => true,
        };
        if stale {
            let data = self
                .cabinet
                .decompress_block(self.folder, self.block_index)?;
            self.decompressed = Some((self.block_index, data));
        }
        match &self.decompressed {
            Some((_, data)) => Ok(data),
            None => unreachable!(),
        }
    }
}

impl<'a, R> fmt::Debug for FileReader<'a, R> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("FileReader")
            .field("name", &self.entry.name())
            .field("delivered", &self.delivered)
            .field("block_index", &self.block_index)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<'a, R: Read + Seek> io::Read for FileReader<'a, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileReader::read(self, buf).map_err(io::Error::from)
    }
}
