use std::fmt;

const CTYPE_NONE: u16 = 0;
const CTYPE_MSZIP: u16 = 1;
const CTYPE_QUANTUM: u16 = 2;
const CTYPE_LZX: u16 = 3;

/// A scheme for compressing data within the cabinet.
///
/// Every kind that the format can declare is representable, but only
/// [`None`](CompressionType::None) and [`MsZip`](CompressionType::MsZip)
/// folders can actually be decompressed; the others are accepted during the
/// structural parse and rejected on the first decompression attempt.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompressionType {
    /// No compression.
    None,
    /// MSZIP compression.  MSZIP is described further in
    /// [MS-MCI](https://msdn.microsoft.com/en-us/library/cc483131.aspx).
    MsZip,
    /// Quantum compression with the given level and memory.
    Quantum {
        /// Compression level (1-7 for well-formed cabinets).
        level: u16,
        /// Window memory exponent (10-21 for well-formed cabinets).
        memory: u16,
    },
    /// LZX compression with the given window-size exponent.  The LZX scheme
    /// is described further in
    /// [MS-PATCH](https://msdn.microsoft.com/en-us/library/cc483133.aspx).
    Lzx {
        /// Window-size exponent (15-25 for well-formed cabinets).
        window: u16,
    },
    /// A kind outside the format's defined set, including the reserved
    /// `0xf` value.
    Reserved(u16),
}

impl CompressionType {
    pub(crate) fn from_bitfield(bits: u16) -> CompressionType {
        match bits & 0x000f {
            CTYPE_NONE => CompressionType::None,
            CTYPE_MSZIP => CompressionType::MsZip,
            CTYPE_QUANTUM => CompressionType::Quantum {
                level: (bits & 0x00f0) >> 4,
                memory: (bits & 0x1f00) >> 8,
            },
            CTYPE_LZX => {
                CompressionType::Lzx { window: (bits & 0x1f00) >> 8 }
            }
            other => CompressionType::Reserved(other),
        }
    }

    /// Returns true if this crate can decompress folders using this scheme.
    pub fn is_supported(self) -> bool {
        matches!(self, CompressionType::None | CompressionType::MsZip)
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            CompressionType::None => write!(fmt, "none"),
            CompressionType::MsZip => write!(fmt, "MSZIP"),
            CompressionType::Quantum { level, memory } => {
                write!(fmt, "Quantum (level {}, memory {})", level, memory)
            }
            CompressionType::Lzx { window } => {
                write!(fmt, "LZX (window {})", window)
            }
            CompressionType::Reserved(kind) => {
                write!(fmt, "reserved kind 0x{:x}", kind)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CompressionType;

    #[test]
    fn compression_type_from_bitfield() {
        assert_eq!(
            CompressionType::from_bitfield(0x0),
            CompressionType::None
        );
        assert_eq!(
            CompressionType::from_bitfield(0x1),
            CompressionType::MsZip
        );
        assert_eq!(
            CompressionType::from_bitfield(0x1472),
            CompressionType::Quantum { level: 7, memory: 20 }
        );
        assert_eq!(
            CompressionType::from_bitfield(0x1503),
            CompressionType::Lzx { window: 21 }
        );
        assert_eq!(
            CompressionType::from_bitfield(0x000f),
            CompressionType::Reserved(0xf)
        );
    }

    #[test]
    fn high_bits_do_not_change_the_kind() {
        assert_eq!(
            CompressionType::from_bitfield(0xfff0),
            CompressionType::None
        );
        assert_eq!(
            CompressionType::from_bitfield(0x0ff1),
            CompressionType::MsZip
        );
    }

    #[test]
    fn only_none_and_mszip_are_supported() {
        assert!(CompressionType::None.is_supported());
        assert!(CompressionType::MsZip.is_supported());
        assert!(!CompressionType::Quantum { level: 1, memory: 16 }
            .is_supported());
        assert!(!CompressionType::Lzx { window: 21 }.is_supported());
        assert!(!CompressionType::Reserved(0xf).is_supported());
    }
}
