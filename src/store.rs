use std::cell::RefCell;
use std::io::{Read, Seek, SeekFrom};

use crate::cabinet::CabinetOptions;
use crate::folder::BlockEntry;
use crate::Result;

/// Lazy accessor for raw, still-compressed block payloads.
///
/// The byte source has a single seek cursor, so every positioned read goes
/// through one `RefCell`; open readers over the same cabinet therefore
/// serialize their I/O.  Under the retain policy the fetched bytes are kept
/// in the block's cache slot for the life of the archive; otherwise each
/// call re-reads from the byte source.
pub(crate) struct BlockStore<R> {
    reader: RefCell<R>,
    retain_raw_blocks: bool,
    verify_checksums: bool,
}

impl<R: Read + Seek> BlockStore<R> {
    pub(crate) fn new(reader: R, options: CabinetOptions) -> BlockStore<R> {
        BlockStore {
            reader: RefCell::new(reader),
            retain_raw_blocks: options.retain_raw_blocks,
            verify_checksums: options.verify_checksums,
        }
    }

    /// Returns exactly `compressed_size` payload bytes for the given block,
    /// read from the recorded offset on first access.
    pub(crate) fn raw_bytes(&self, block: &BlockEntry) -> Result<Vec<u8>> {
        if self.retain_raw_blocks {
            if let Some(raw) = block.raw.borrow().as_ref() {
                return Ok(raw.clone());
            }
        }
        let mut raw = vec![0u8; block.compressed_size as usize];
        {
            let mut reader = self.reader.borrow_mut();
            reader.seek(SeekFrom::Start(block.data_offset))?;
            reader.read_exact(&mut raw)?;
        }
        if self.verify_checksums && block.checksum != 0 {
            let mut checksum = Checksum::new();
            checksum.update(&block.reserve_data);
            checksum.update(&raw);
            let actual = checksum.value()
                ^ ((block.compressed_size as u32)
                    | ((block.uncompressed_size as u32) << 16));
            if actual != block.checksum {
                corrupt_data!(
                    "checksum mismatch in data block \
                     (expected {:08x}, actual {:08x})",
                    block.checksum,
                    actual
                );
            }
        }
        if self.retain_raw_blocks {
            *block.raw.borrow_mut() = Some(raw.clone());
        }
        Ok(raw)
    }

    pub(crate) fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

/// The cabinet format's per-block checksum: the payload folded into 32-bit
/// words by XOR, with a byte-swizzled tail for lengths that are not a
/// multiple of four.
struct Checksum {
    value: u32,
    remainder: u32,
    remainder_shift: u32,
}

impl Checksum {
    fn new() -> Checksum {
        Checksum { value: 0, remainder: 0, remainder_shift: 0 }
    }

    fn value(&self) -> u32 {
        match self.remainder_shift {
            0 => self.value,
            8 => self.value ^ self.remainder,
            16 => {
                self.value
                    ^ (self.remainder >> 8)
                    ^ ((self.remainder & 0xff) << 8)
            }
            24 => {
                self.value
                    ^ (self.remainder >> 16)
                    ^ (self.remainder & 0xff00)
                    ^ ((self.remainder & 0xff) << 16)
            }
            _ => unreachable!(),
        }
    }

    fn update(&mut self, buf: &[u8]) {
        for &byte in buf {
            self.remainder |= (byte as u32) << self.remainder_shift;
            if self.remainder_shift == 24 {
                self.value ^= self.remainder;
                self.remainder = 0;
                self.remainder_shift = 0;
            } else {
                self.remainder_shift += 8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Checksum;

    #[test]
    fn empty_checksum() {
        assert_eq!(Checksum::new().value(), 0);
    }

    #[test]
    fn block_checksums() {
        // The stored checksum also covers the descriptor's two size words;
        // folding them in up front is equivalent to the XOR in raw_bytes.
        let mut checksum = Checksum::new();
        checksum.update(b"\x0e\0\x0e\0Hello, world!\n");
        assert_eq!(checksum.value(), 0x7f2e1a4c);

        let mut checksum = Checksum::new();
        checksum.update(b"\x1d\0\x1d\0Hello, world!\nSee you later!\n");
        assert_eq!(checksum.value(), 0x3509541a);
    }

    #[test]
    fn checksum_from_cab_spec() {
        // This comes from the example cabinet file found in the CAB spec.
        let mut checksum = Checksum::new();
        checksum.update(
            b"\x97\0\x97\0#include <stdio.h>\r\n\r\n\
              void main(void)\r\n{\r\n    \
              printf(\"Hello, world!\\n\");\r\n}\r\n\
              #include <stdio.h>\r\n\r\n\
              void main(void)\r\n{\r\n    \
              printf(\"Welcome!\\n\");\r\n}\r\n\r\n",
        );
        assert_eq!(checksum.value(), 0x30a65abd);
    }
}
