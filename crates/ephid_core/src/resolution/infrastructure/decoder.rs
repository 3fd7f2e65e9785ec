//! Noise-tolerant base64 and base64url decoding.
//!
//! Identifiers of decode namespaces carry an embedded payload encoded with one of
//! the two RFC 4648 alphabets. The payload arrives from an untrusted client, so the
//! decoder never fails: every byte outside the selected alphabet is skipped, padding
//! is treated as a placeholder rather than data, and truncated input simply yields
//! fewer output bytes.
//!
//! ## Decoding Rules
//!
//! Valid symbols are collected in groups of four. A complete group produces three
//! bytes, a trailing group of `n` symbols produces `n - 1` bytes:
//!
//! ```text
//! b0 = s0 << 2 | s1 >> 4
//! b1 = s1 << 4 | s2 >> 2
//! b2 = s2 << 6 | s3
//! ```
//!
//! Line breaks, spaces and any other noise interleaved with the symbols do not
//! change the result.

use serde::{Deserialize, Serialize};

/// Base64 alphabet variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alphabet {
    /// RFC 4648 §4, using `+` and `/`
    #[default]
    Standard,
    /// RFC 4648 §5, using `-` and `_`
    UrlSafe,
}

/// Class of a single input byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Alphabet member carrying six bits
    Value(u8),
    /// The `=` padding marker
    Padding,
    /// Anything else: line breaks, whitespace, foreign alphabet characters
    Ignore,
}

const fn build_table(sixty_two: u8, sixty_three: u8) -> [Symbol; 256] {
    let mut table = [Symbol::Ignore; 256];
    let mut i = 0;
    while i < 26 {
        table[b'A' as usize + i] = Symbol::Value(i as u8);
        table[b'a' as usize + i] = Symbol::Value(26 + i as u8);
        i += 1;
    }
    let mut d = 0;
    while d < 10 {
        table[b'0' as usize + d] = Symbol::Value(52 + d as u8);
        d += 1;
    }
    table[sixty_two as usize] = Symbol::Value(62);
    table[sixty_three as usize] = Symbol::Value(63);
    table[b'=' as usize] = Symbol::Padding;
    table
}

static STANDARD_TABLE: [Symbol; 256] = build_table(b'+', b'/');
static URL_SAFE_TABLE: [Symbol; 256] = build_table(b'-', b'_');

impl Alphabet {
    /// Returns the lookup table for this alphabet.
    pub fn table(self) -> &'static [Symbol; 256] {
        match self {
            Alphabet::Standard => &STANDARD_TABLE,
            Alphabet::UrlSafe => &URL_SAFE_TABLE,
        }
    }

    /// Classifies a single input byte.
    pub fn symbol(self, byte: u8) -> Symbol {
        self.table()[byte as usize]
    }

    /// Returns true if the byte is an alphabet member or the padding marker.
    pub fn is_encoding_byte(self, byte: u8) -> bool {
        !matches!(self.symbol(byte), Symbol::Ignore)
    }
}

/// Estimates the decoded size of `encoded_len` input bytes.
///
/// Sizing hint only, computed as `(encoded_len / 4) * 3`. It over-estimates when the
/// input carries noise and under-estimates unpadded tails, so the length of the
/// vector returned by [`decode`] is the only authoritative size.
pub fn estimated_decoded_len(encoded_len: usize) -> usize {
    (encoded_len / 4) * 3
}

/// Decodes `input` with the given alphabet, skipping every byte that is not a symbol.
pub fn decode(alphabet: Alphabet, input: &[u8]) -> Vec<u8> {
    let table = alphabet.table();
    let mut output = Vec::with_capacity(estimated_decoded_len(input.len()));
    let mut group = [0u8; 4];
    let mut collected = 0;

    for &byte in input {
        match table[byte as usize] {
            Symbol::Value(value) => {
                group[collected] = value;
                collected += 1;
                if collected == 4 {
                    emit_group(&group, collected, &mut output);
                    collected = 0;
                }
            }
            Symbol::Padding | Symbol::Ignore => {}
        }
    }
    if collected > 0 {
        emit_group(&group, collected, &mut output);
    }
    output
}

/// Packs `symbols` six-bit values into `symbols - 1` bytes.
fn emit_group(group: &[u8; 4], symbols: usize, output: &mut Vec<u8>) {
    let bytes = [
        group[0] << 2 | group[1] >> 4,
        group[1] << 4 | group[2] >> 2,
        group[2] << 6 | group[3],
    ];
    output.extend_from_slice(&bytes[..symbols - 1]);
}

/// Bytes recovered from the encoded part of an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DecodedPayload {
    bytes: Vec<u8>,
}

impl DecodedPayload {
    /// Decodes `input` into a payload.
    pub fn decode(alphabet: Alphabet, input: &[u8]) -> Self {
        Self { bytes: decode(alphabet, input) }
    }

    /// Number of decoded bytes.
    pub fn byte_length(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use base64::{
        Engine as _,
        engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD},
    };
    use proptest::prelude::*;

    use super::*;

    const ALPHABETS: [Alphabet; 2] = [Alphabet::Standard, Alphabet::UrlSafe];

    #[test]
    fn unit_decoder_reference_vectors() {
        for alphabet in ALPHABETS {
            assert_eq!(decode(alphabet, b"QUJD"), b"ABC");
            assert_eq!(decode(alphabet, b"QQ=="), b"A");
            assert_eq!(decode(alphabet, b""), b"");
            assert_eq!(decode(alphabet, b"QUI="), b"AB");
            assert_eq!(decode(alphabet, b"QUJDRA=="), b"ABCD");
        }
    }

    #[test]
    fn unit_decoder_unpadded_tail() {
        for alphabet in ALPHABETS {
            assert_eq!(decode(alphabet, b"QQ"), b"A");
            assert_eq!(decode(alphabet, b"QUI"), b"AB");
            assert_eq!(decode(alphabet, b"QUJDRA"), b"ABCD");
        }
    }

    #[test]
    fn unit_decoder_alphabet_specific_symbols() {
        // 0xfb 0xff encodes as "+/8" in the standard alphabet and "-_8" in the url one
        assert_eq!(decode(Alphabet::Standard, b"+/8="), [0xfb, 0xff]);
        assert_eq!(decode(Alphabet::UrlSafe, b"-_8="), [0xfb, 0xff]);

        // Foreign symbols are noise, leaving a single symbol and therefore no output
        assert_eq!(decode(Alphabet::Standard, b"-_8="), b"");
        assert_eq!(decode(Alphabet::UrlSafe, b"+/8="), b"");
    }

    #[test]
    fn unit_decoder_all_noise() {
        for alphabet in ALPHABETS {
            assert_eq!(decode(alphabet, b"\r\n\t .:;!*"), b"");
            assert_eq!(decode(alphabet, b"===="), b"");
            assert_eq!(decode(alphabet, &[0x00, 0x80, 0xff, 0x7f]), b"");
        }
    }

    #[test]
    fn unit_decoder_noise_anywhere() {
        assert_eq!(decode(Alphabet::Standard, b"Q\nU\r\nJ D"), b"ABC");
        assert_eq!(decode(Alphabet::Standard, b"*QUJD*"), b"ABC");
        assert_eq!(decode(Alphabet::UrlSafe, b"Q.Q.=.="), b"A");
    }

    #[test]
    fn unit_decoder_full_byte_range_wrapped() {
        let expected: Vec<u8> = (0..=255).collect();
        let wrapped = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8gISIj\n\
                       JCUmJygpKissLS4vMDEyMzQ1Njc4OTo7PD0+P0BBQkNERUZH\n\
                       SElKS0xNTk9QUVJTVFVWV1hZWltcXV5fYGFiY2RlZmdoaWpr\n\
                       bG1ub3BxcnN0dXZ3eHl6e3x9fn+AgYKDhIWGh4iJiouMjY6P\n\
                       kJGSk5SVlpeYmZqbnJ2en6ChoqOkpaanqKmqq6ytrq+wsbKz\n\
                       tLW2t7i5uru8vb6/wMHCw8TFxsfIycrLzM3Oz9DR0tPU1dbX\n\
                       2Nna29zd3t/g4eLj5OXm5+jp6uvs7e7v8PHy8/T19vf4+fr7\n\
                       /P3+/w==";
        assert_eq!(decode(Alphabet::Standard, wrapped.as_bytes()), expected);
    }

    #[test]
    fn unit_decoder_estimate() {
        assert_eq!(estimated_decoded_len(0), 0);
        assert_eq!(estimated_decoded_len(3), 0);
        assert_eq!(estimated_decoded_len(4), 3);
        assert_eq!(estimated_decoded_len(8), 6);
        assert_eq!(estimated_decoded_len(11), 6);
        // Noise makes the estimate larger than the real output
        assert_eq!(decode(Alphabet::Standard, b"QQ==\n\n\n\n").len(), 1);
    }

    #[test]
    fn unit_decoder_payload_length_ignores_padding() {
        let padded = DecodedPayload::decode(Alphabet::UrlSafe, b"YWxpY2U=");
        let unpadded = DecodedPayload::decode(Alphabet::UrlSafe, b"YWxpY2U");
        assert_eq!(padded.byte_length(), 5);
        assert_eq!(padded, unpadded);
        assert_eq!(padded.as_bytes(), b"alice");
        assert!(DecodedPayload::decode(Alphabet::UrlSafe, b"Y").is_empty());
    }

    #[test]
    fn unit_decoder_symbol_table() {
        assert_eq!(Alphabet::Standard.symbol(b'A'), Symbol::Value(0));
        assert_eq!(Alphabet::Standard.symbol(b'z'), Symbol::Value(51));
        assert_eq!(Alphabet::Standard.symbol(b'9'), Symbol::Value(61));
        assert_eq!(Alphabet::Standard.symbol(b'/'), Symbol::Value(63));
        assert_eq!(Alphabet::UrlSafe.symbol(b'_'), Symbol::Value(63));
        assert_eq!(Alphabet::UrlSafe.symbol(b'='), Symbol::Padding);
        assert_eq!(Alphabet::UrlSafe.symbol(b'/'), Symbol::Ignore);
        assert!(Alphabet::Standard.is_encoding_byte(b'='));
        assert!(!Alphabet::Standard.is_encoding_byte(b'\n'));
    }

    fn with_noise(encoded: &str, noise: u8, every: usize) -> Vec<u8> {
        encoded
            .as_bytes()
            .chunks(every)
            .flat_map(|chunk| chunk.iter().copied().chain(std::iter::once(noise)))
            .collect()
    }

    proptest! {
        #[test]
        fn prop_decoder_standard_matches_reference(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let encoded = STANDARD.encode(&data);
            prop_assert_eq!(decode(Alphabet::Standard, encoded.as_bytes()), data);
        }

        #[test]
        fn prop_decoder_url_safe_matches_reference(data in prop::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(decode(Alphabet::UrlSafe, URL_SAFE.encode(&data).as_bytes()), data.clone());
            prop_assert_eq!(decode(Alphabet::UrlSafe, URL_SAFE_NO_PAD.encode(&data).as_bytes()), data);
        }

        #[test]
        fn prop_decoder_noise_is_transparent(
            data in prop::collection::vec(any::<u8>(), 0..192),
            noise in prop::sample::select(vec![b'\n', b'\r', b' ', b'\t', b'*', b'.', 0u8, 0xffu8]),
            every in 1usize..8,
        ) {
            let encoded = STANDARD.encode(&data);
            prop_assert_eq!(
                decode(Alphabet::Standard, &with_noise(&encoded, noise, every)),
                decode(Alphabet::Standard, encoded.as_bytes())
            );
            let encoded = URL_SAFE.encode(&data);
            prop_assert_eq!(
                decode(Alphabet::UrlSafe, &with_noise(&encoded, noise, every)),
                decode(Alphabet::UrlSafe, encoded.as_bytes())
            );
        }

        #[test]
        fn prop_decoder_short_input_length(symbols in prop::collection::vec(0u8..64, 0..4)) {
            const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
            let input: Vec<u8> = symbols.iter().map(|&s| CHARS[s as usize]).collect();
            prop_assert_eq!(
                decode(Alphabet::Standard, &input).len(),
                symbols.len().saturating_sub(1)
            );
        }

        #[test]
        fn prop_decoder_never_longer_than_symbols(input in prop::collection::vec(any::<u8>(), 0..256)) {
            let symbols = input.iter().filter(|&&b| matches!(Alphabet::Standard.symbol(b), Symbol::Value(_))).count();
            let decoded = decode(Alphabet::Standard, &input);
            prop_assert_eq!(decoded.len(), symbols / 4 * 3 + (symbols % 4).saturating_sub(1));
        }
    }
}
