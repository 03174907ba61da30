// GSM 03.38 Codec - Maps text to and from the modem's 7-bit default alphabet
//
// The modem is configured with AT+CSCS="GSM", so every command we write and
// every line it sends back is expressed in the unpacked GSM 7-bit alphabet
// (one septet per byte). Characters outside the basic table are reached
// through the 0x1B escape into the extension table.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;
use tracing::warn;

/// Escape byte that switches to the extension table for the next septet
pub const ESCAPE: u8 = 0x1B;

/// Placeholder written over bytes that fall outside the 7-bit range
pub const PLACEHOLDER: u8 = b'#';

/// GSM 03.38 basic character table, indexed by septet value.
///
/// Position 0x1B is the escape marker and never decodes on its own.
const BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1B}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

/// GSM 03.38 extension table (septet following an escape, character)
const EXTENSION: [(u8, char); 10] = [
    (0x0A, '\u{0C}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

/// Errors raised while converting between text and the GSM alphabet
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("character {0:?} has no GSM 03.38 representation")]
    Unencodable(char),

    #[error("byte 0x{byte:02X} at offset {offset} is outside the GSM 7-bit range")]
    InvalidByte { byte: u8, offset: usize },

    #[error("escape at offset {offset} is not followed by an extension character")]
    InvalidEscape { offset: usize },
}

/// Encode `text` into unpacked GSM 03.38 septets, appending them to `buf`
pub fn encode_into(text: &str, buf: &mut BytesMut) -> Result<(), CodecError> {
    buf.reserve(text.len());
    for ch in text.chars() {
        if let Some(septet) = basic_septet(ch) {
            buf.put_u8(septet);
        } else if let Some(septet) = extension_septet(ch) {
            buf.put_u8(ESCAPE);
            buf.put_u8(septet);
        } else {
            return Err(CodecError::Unencodable(ch));
        }
    }
    Ok(())
}

/// Encode `text` into unpacked GSM 03.38 septets
pub fn encode(text: &str) -> Result<Bytes, CodecError> {
    let mut buf = BytesMut::with_capacity(text.len());
    encode_into(text, &mut buf)?;
    Ok(buf.freeze())
}

/// Decode GSM 03.38 septets into text, stripping trailing whitespace.
///
/// Line noise on the serial link occasionally produces bytes above 0x7F.
/// When the first pass fails, every such byte is replaced with `#` and the
/// decode is attempted once more. A failure on that second pass means the
/// line itself is malformed and the error is returned.
pub fn decode(bytes: &[u8]) -> Result<String, CodecError> {
    match decode_strict(bytes) {
        Ok(text) => Ok(text),
        Err(first) => {
            warn!("Undecodable modem data ({}), substituting high bytes", first);
            let substituted: Vec<u8> = bytes
                .iter()
                .map(|&b| if b > 0x7F { PLACEHOLDER } else { b })
                .collect();
            decode_strict(&substituted)
        }
    }
}

fn decode_strict(bytes: &[u8]) -> Result<String, CodecError> {
    let mut text = String::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().enumerate();

    while let Some((offset, byte)) = iter.next() {
        if byte > 0x7F {
            return Err(CodecError::InvalidByte { byte, offset });
        }
        if byte == ESCAPE {
            let ch = iter
                .next()
                .and_then(|(_, next)| extension_char(next))
                .ok_or(CodecError::InvalidEscape { offset })?;
            text.push(ch);
            continue;
        }
        text.push(BASIC[byte as usize]);
    }

    text.truncate(text.trim_end().len());
    Ok(text)
}

fn basic_septet(ch: char) -> Option<u8> {
    if ch == '\u{1B}' {
        return None;
    }
    // Printable ASCII mostly sits at its own code point, so try that first
    if ch.is_ascii() && BASIC[ch as usize] == ch {
        return Some(ch as u8);
    }
    BASIC.iter().position(|&c| c == ch).map(|pos| pos as u8)
}

fn extension_septet(ch: char) -> Option<u8> {
    EXTENSION
        .iter()
        .find(|(_, c)| *c == ch)
        .map(|(septet, _)| *septet)
}

fn extension_char(septet: u8) -> Option<char> {
    EXTENSION
        .iter()
        .find(|(s, _)| *s == septet)
        .map(|(_, ch)| *ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_command_is_unchanged() {
        let bytes = encode("AT+CMGS=\"+391234567890\"").unwrap();
        assert_eq!(&bytes[..], b"AT+CMGS=\"+391234567890\"");
    }

    #[test]
    fn test_characters_with_moved_code_points() {
        assert_eq!(&encode("@").unwrap()[..], &[0x00u8]);
        assert_eq!(&encode("$").unwrap()[..], &[0x02u8]);
        assert_eq!(&encode("_").unwrap()[..], &[0x11u8]);
        assert_eq!(&encode("è").unwrap()[..], &[0x04u8]);
    }

    #[test]
    fn test_extension_characters_are_escaped() {
        assert_eq!(&encode("€").unwrap()[..], &[ESCAPE, 0x65]);
        assert_eq!(&encode("{x}").unwrap()[..], &[ESCAPE, 0x28, b'x', ESCAPE, 0x29]);
    }

    #[test]
    fn test_unencodable_character() {
        assert_eq!(encode("ok ✓"), Err(CodecError::Unencodable('✓')));
        assert_eq!(encode("\u{1B}"), Err(CodecError::Unencodable('\u{1B}')));
    }

    #[test]
    fn test_round_trip_supported_text() {
        let samples = [
            "Hello, World!",
            "Prezzo: 5€ [sconto] {oggi}",
            "Ærøskøbing på Ø",
            "@home_now ¿qué? ¡hola!",
            "ΔΦΓΛΩΠΨΣΘΞ",
            "line one\nline two",
        ];
        for text in samples {
            let bytes = encode(text).unwrap();
            assert_eq!(decode(&bytes).unwrap(), text);
        }
    }

    #[test]
    fn test_decode_strips_trailing_line_terminators() {
        assert_eq!(decode(b"+CSQ: 20,0\r\n").unwrap(), "+CSQ: 20,0");
        assert_eq!(decode(b"\r\n").unwrap(), "");
    }

    #[test]
    fn test_decode_substitutes_high_bytes() {
        assert_eq!(decode(b"RI\xffNG\x80\r\n").unwrap(), "RI#NG#");
    }

    #[test]
    fn test_decode_high_byte_after_escape_is_substituted_then_rejected() {
        // '#' is not an extension character, so the second pass fails too
        assert_eq!(
            decode(&[b'a', ESCAPE, 0xC3]),
            Err(CodecError::InvalidEscape { offset: 1 })
        );
    }

    #[test]
    fn test_decode_trailing_escape_is_fatal() {
        assert_eq!(
            decode(&[b'o', b'k', ESCAPE]),
            Err(CodecError::InvalidEscape { offset: 2 })
        );
    }
}
