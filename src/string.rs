use std::io::{self, Read};

use byteorder::ReadBytesExt;

use crate::consts;
use crate::Result;

/// Reads a null-terminated name of at most [`consts::MAX_STRING_SIZE`] bytes
/// before the terminator.
///
/// Names with the UTF attribute are decoded as UTF-8 (what real cabinet
/// producers emit for that flag), lossily, so that one mangled name cannot
/// abort the whole structural parse.  Names without it are decoded as
/// Latin-1, mapping each byte to the corresponding code point.
pub(crate) fn read_null_terminated_string<R: Read>(
    reader: &mut R,
    is_utf: bool,
) -> Result<String> {
    let mut bytes = Vec::<u8>::with_capacity(consts::MAX_STRING_SIZE);
    loop {
        let byte = match reader.read_u8() {
            Ok(byte) => byte,
            Err(error)
                if error.kind() == io::ErrorKind::UnexpectedEof =>
            {
                invalid_format!("string is missing its null terminator");
            }
            Err(error) => return Err(error.into()),
        };
        if byte == 0 {
            break;
        } else if bytes.len() == consts::MAX_STRING_SIZE {
            invalid_format!(
                "string longer than maximum of {} bytes",
                consts::MAX_STRING_SIZE
            );
        }
        bytes.push(byte);
    }
    if is_utf {
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    } else {
        Ok(bytes.iter().map(|&byte| byte as char).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::read_null_terminated_string;
    use crate::Error;

    #[test]
    fn utf_name() {
        let mut input: &[u8] = b"\xe2\x98\x83.txt\0trailing";
        let name = read_null_terminated_string(&mut input, true).unwrap();
        assert_eq!(name, "\u{2603}.txt");
        assert_eq!(input, b"trailing");
    }

    #[test]
    fn latin1_name() {
        let mut input: &[u8] = b"caf\xe9.txt\0";
        let name = read_null_terminated_string(&mut input, false).unwrap();
        assert_eq!(name, "caf\u{e9}.txt");
    }

    #[test]
    fn overlong_name_is_invalid() {
        let mut input = vec![b'a'; 300];
        input.push(0);
        let error = read_null_terminated_string(&mut input.as_slice(), false)
            .unwrap_err();
        assert!(matches!(error, Error::InvalidFormat(_)));
    }

    #[test]
    fn missing_terminator_is_invalid() {
        let mut input: &[u8] = b"name";
        let error = read_null_terminated_string(&mut input, false)
            .unwrap_err();
        assert!(matches!(error, Error::InvalidFormat(_)));
    }
}
