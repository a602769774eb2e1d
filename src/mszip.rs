use crate::Result;

const MSZIP_SIGNATURE: u16 = 0x4b43; // "CK" stored little-endian
const MSZIP_SIGNATURE_LEN: usize = 2;

/// Decompresses one MSZIP data block: a 2-byte `CK` signature followed by a
/// raw DEFLATE stream (no zlib header or trailer).
///
/// Each block is inflated independently; the DEFLATE dictionary is not
/// carried across blocks, so that blocks can be skipped without being
/// decompressed.
pub(crate) fn decompress_block(
    data: &[u8],
    uncompressed_size: usize,
) -> Result<Vec<u8>> {
    if data.len() < MSZIP_SIGNATURE_LEN
        || u16::from_le_bytes([data[0], data[1]]) != MSZIP_SIGNATURE
    {
        corrupt_data!("MSZIP decompression failed: invalid block signature");
    }
    let data = &data[MSZIP_SIGNATURE_LEN..];
    let mut decompressor = flate2::Decompress::new(false);
    // One spare byte so that an overlong stream fails the length check
    // below instead of being silently truncated.
    let mut out = Vec::with_capacity(uncompressed_size + 1);
    match decompressor.decompress_vec(
        data,
        &mut out,
        flate2::FlushDecompress::Finish,
    ) {
        Ok(flate2::Status::StreamEnd) => {}
        Ok(_) => corrupt_data!(
            "MSZIP decompression failed: truncated or overlong stream"
        ),
        Err(error) => {
            corrupt_data!("MSZIP decompression failed: {}", error)
        }
    }
    if out.len() != uncompressed_size {
        corrupt_data!(
            "MSZIP decompression failed: incorrect uncompressed size \
             (expected {}, was actually {})",
            uncompressed_size,
            out.len()
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::decompress_block;
    use crate::Error;

    const LOREM_BLOCK: &[u8] =
        b"CK%\xcc\xd1\t\x031\x0c\x04\xd1V\xb6\x80#\x95\xa4\
          \t\xc5\x12\xc7\x82e\xfb,\xa9\xff\x18\xee{x\xf3\x9d\xdb\x1c\\Q\
          \x0e\x9d}n\x04\x13\xe2\x96\x17\xda\x1ca--kC\x94\x8b\xd18nX\xe7\
          \x89az\x00\x8c\x15>\x15i\xbe\x0e\xe6hTj\x8dD%\xba\xfc\xce\x1e\
          \x96\xef\xda\xe0r\x0f\x81t>%\x9f?\x12]-\x87";
    const LOREM_TEXT: &[u8] =
        b"Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed \
          do eiusmod tempor incididunt ut labore et dolore magna aliqua.";

    #[test]
    fn decompress_valid_block() {
        assert!(LOREM_BLOCK.len() < LOREM_TEXT.len());
        let output = decompress_block(LOREM_BLOCK, LOREM_TEXT.len()).unwrap();
        assert_eq!(output, LOREM_TEXT);
    }

    #[test]
    fn missing_signature_is_corrupt_data() {
        let mut block = LOREM_BLOCK.to_vec();
        block[0] = b'X';
        let error = decompress_block(&block, LOREM_TEXT.len()).unwrap_err();
        assert!(matches!(error, Error::CorruptData(_)));

        let error = decompress_block(b"C", 10).unwrap_err();
        assert!(matches!(error, Error::CorruptData(_)));
    }

    #[test]
    fn truncated_stream_is_corrupt_data() {
        let block = &LOREM_BLOCK[..LOREM_BLOCK.len() / 2];
        let error = decompress_block(block, LOREM_TEXT.len()).unwrap_err();
        assert!(matches!(error, Error::CorruptData(_)));
    }

    #[test]
    fn garbled_stream_is_corrupt_data() {
        let mut block = LOREM_BLOCK.to_vec();
        for byte in block[10..30].iter_mut() {
            *byte = !*byte;
        }
        let result = decompress_block(&block, LOREM_TEXT.len());
        assert!(matches!(result, Err(Error::CorruptData(_))));
    }

    #[test]
    fn declared_size_mismatch_is_corrupt_data() {
        let error =
            decompress_block(LOREM_BLOCK, LOREM_TEXT.len() + 1).unwrap_err();
        assert!(matches!(error, Error::CorruptData(_)));
        let error =
            decompress_block(LOREM_BLOCK, LOREM_TEXT.len() - 1).unwrap_err();
        assert!(matches!(error, Error::CorruptData(_)));
    }
}
