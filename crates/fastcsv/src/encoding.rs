//! Source encodings and the streaming decoder that normalizes them to UTF-8.
//!
//! The tokenizer only ever sees UTF-8 bytes. Every structural character it
//! cares about (`,` `"` CR LF) is ASCII, so once input is UTF-8 it can be
//! scanned byte by byte without decoding.
//!
//! Decoding happens one refill chunk at a time. Code units that straddle a
//! chunk boundary are carried to the next call; whatever is still carried when
//! the source ends is flushed as U+FFFD.

use std::mem;

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// A source character encoding the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// UTF-8 (also used for US-ASCII).
    Utf8,
    /// ISO-8859-1.
    Latin1,
    /// UTF-16, little endian.
    Utf16Le,
    /// UTF-16, big endian.
    Utf16Be,
    /// UTF-32, little endian.
    Utf32Le,
    /// UTF-32, big endian.
    Utf32Be,
}

impl Encoding {
    /// Looks up an encoding by one of its (case-insensitive) labels.
    #[must_use]
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim().to_ascii_lowercase();
        let encoding = match label.as_str() {
            "utf-8" | "utf8" | "us-ascii" | "ascii" => Encoding::Utf8,
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Encoding::Latin1,
            "utf-16le" | "utf16le" => Encoding::Utf16Le,
            "utf-16be" | "utf16be" => Encoding::Utf16Be,
            "utf-32le" | "utf32le" => Encoding::Utf32Le,
            "utf-32be" | "utf32be" => Encoding::Utf32Be,
            _ => return None,
        };
        Some(encoding)
    }

    /// Canonical label.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Utf32Le => "UTF-32LE",
            Encoding::Utf32Be => "UTF-32BE",
        }
    }

    fn bom(self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => b"\xEF\xBB\xBF",
            Encoding::Latin1 => b"",
            Encoding::Utf16Le => b"\xFF\xFE",
            Encoding::Utf16Be => b"\xFE\xFF",
            Encoding::Utf32Le => b"\xFF\xFE\x00\x00",
            Encoding::Utf32Be => b"\x00\x00\xFE\xFF",
        }
    }
}

/// The `(external, internal)` encoding pair of a parse.
///
/// Parsed from `"ext"`, `"ext:int"` or `"bom|ext[:int]"`. An empty external
/// name or `-` as internal name means "not given". Names that are not
/// recognized degrade to passthrough instead of failing.
///
/// Rows are always produced as UTF-8, so the internal encoding only records
/// what was asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodingContext {
    external: Option<Encoding>,
    internal: Option<Encoding>,
    strip_bom: bool,
}

impl EncodingContext {
    /// The passthrough context: bytes are taken to be UTF-8 already.
    #[must_use]
    pub fn passthrough() -> Self {
        Self::default()
    }

    /// Parses an encoding specification, degrading unknown names.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let (strip_bom, spec) = match spec.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("bom|") => (true, &spec[4..]),
            _ => (false, spec),
        };
        let (external, internal) = spec.split_once(':').unwrap_or((spec, ""));

        Self {
            external: lookup(external, "external"),
            internal: if internal == "-" {
                None
            } else {
                lookup(internal, "internal")
            },
            strip_bom,
        }
    }

    /// The encoding the source bytes are decoded from, if any.
    #[must_use]
    pub fn external(&self) -> Option<Encoding> {
        self.external
    }

    /// The requested internal encoding, if any.
    #[must_use]
    pub fn internal(&self) -> Option<Encoding> {
        self.internal
    }

    /// Whether a leading byte-order mark is dropped.
    #[must_use]
    pub fn strip_bom(&self) -> bool {
        self.strip_bom
    }

    pub(crate) fn decoder(&self) -> Decoder {
        Decoder {
            encoding: self.external.unwrap_or(Encoding::Utf8),
            awaiting_bom: self.strip_bom,
            carry: Vec::new(),
        }
    }
}

fn lookup(name: &str, side: &str) -> Option<Encoding> {
    if name.is_empty() {
        return None;
    }
    let found = Encoding::for_label(name);
    if found.is_none() {
        log::warn!("unknown {side} encoding {name:?}, falling back to passthrough");
    }
    found
}

/// Incremental transcoder from a source encoding to UTF-8.
#[derive(Debug, Clone)]
pub(crate) struct Decoder {
    encoding: Encoding,
    awaiting_bom: bool,
    carry: Vec<u8>,
}

impl Decoder {
    /// Decodes `input`, appending UTF-8 to `out`. Incomplete trailing code
    /// units are held back for the next call.
    pub(crate) fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        if self.awaiting_bom {
            self.carry.extend_from_slice(input);
            let bom = self.encoding.bom();
            if self.carry.len() < bom.len() && bom.starts_with(&self.carry) {
                return;
            }
            self.awaiting_bom = false;
            if self.carry.starts_with(bom) {
                self.carry.drain(..bom.len());
            }
            let pending = mem::take(&mut self.carry);
            self.decode_units(&pending, out);
            return;
        }

        if self.carry.is_empty() {
            self.decode_units(input, out);
        } else {
            let mut pending = mem::take(&mut self.carry);
            pending.extend_from_slice(input);
            self.decode_units(&pending, out);
        }
    }

    /// Flushes anything still carried once the source is exhausted.
    pub(crate) fn finish(&mut self, out: &mut Vec<u8>) {
        if self.awaiting_bom {
            self.awaiting_bom = false;
            let pending = mem::take(&mut self.carry);
            self.decode_units(&pending, out);
        }
        if self.carry.is_empty() {
            return;
        }
        let pending = mem::take(&mut self.carry);
        if self.encoding == Encoding::Utf16Le || self.encoding == Encoding::Utf16Be {
            // A held-back high surrogate and/or a dangling odd byte.
            let units = pending.len() / 2;
            push_char(out, REPLACEMENT);
            if units == 1 && pending.len() == 3 {
                push_char(out, REPLACEMENT);
            }
        } else {
            push_char(out, REPLACEMENT);
        }
    }

    pub(crate) fn reset(&mut self, context: &EncodingContext) {
        *self = context.decoder();
    }

    fn decode_units(&mut self, input: &[u8], out: &mut Vec<u8>) {
        match self.encoding {
            Encoding::Utf8 => out.extend_from_slice(input),
            Encoding::Latin1 => {
                out.reserve(input.len());
                for &byte in input {
                    if byte.is_ascii() {
                        out.push(byte);
                    } else {
                        push_char(out, char::from(byte));
                    }
                }
            }
            Encoding::Utf16Le | Encoding::Utf16Be => {
                let big_endian = self.encoding == Encoding::Utf16Be;
                let mut complete = input.len() - input.len() % 2;
                if complete >= 2 {
                    let last = unit16(&input[complete - 2..complete], big_endian);
                    if (0xD800..0xDC00).contains(&last) {
                        complete -= 2;
                    }
                }
                let units = input[..complete]
                    .chunks_exact(2)
                    .map(|pair| unit16(pair, big_endian));
                for ch in char::decode_utf16(units) {
                    push_char(out, ch.unwrap_or(REPLACEMENT));
                }
                self.carry.extend_from_slice(&input[complete..]);
            }
            Encoding::Utf32Le | Encoding::Utf32Be => {
                let big_endian = self.encoding == Encoding::Utf32Be;
                let mut quads = input.chunks_exact(4);
                for quad in quads.by_ref() {
                    let bytes = [quad[0], quad[1], quad[2], quad[3]];
                    let value = if big_endian {
                        u32::from_be_bytes(bytes)
                    } else {
                        u32::from_le_bytes(bytes)
                    };
                    push_char(out, char::from_u32(value).unwrap_or(REPLACEMENT));
                }
                self.carry.extend_from_slice(quads.remainder());
            }
        }
    }
}

fn unit16(pair: &[u8], big_endian: bool) -> u16 {
    let bytes = [pair[0], pair[1]];
    if big_endian {
        u16::from_be_bytes(bytes)
    } else {
        u16::from_le_bytes(bytes)
    }
}

fn push_char(out: &mut Vec<u8>, ch: char) {
    let mut tmp = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn decode_in_chunks(context: &EncodingContext, input: &[u8], chunk: usize) -> String {
        let mut decoder = context.decoder();
        let mut out = Vec::new();
        for piece in input.chunks(chunk) {
            decoder.decode(piece, &mut out);
        }
        decoder.finish(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    #[rstest]
    #[case("iso-8859-1", Some(Encoding::Latin1), None)]
    #[case("iso-8859-1:-", Some(Encoding::Latin1), None)]
    #[case("ISO-8859-1:utf-8", Some(Encoding::Latin1), Some(Encoding::Utf8))]
    #[case(":utf-8", None, Some(Encoding::Utf8))]
    #[case("invalid", None, None)]
    #[case("utf-8:invalid", Some(Encoding::Utf8), None)]
    #[case("invalid:-", None, None)]
    #[case("invalid:utf-8", None, Some(Encoding::Utf8))]
    #[case("invalid:invalid", None, None)]
    fn context_parsing_degrades(
        #[case] spec: &str,
        #[case] external: Option<Encoding>,
        #[case] internal: Option<Encoding>,
    ) {
        let context = EncodingContext::parse(spec);
        assert_eq!(context.external(), external);
        assert_eq!(context.internal(), internal);
        assert!(!context.strip_bom());
    }

    #[test]
    fn bom_prefix_is_recognized() {
        let context = EncodingContext::parse("BOM|utf-8");
        assert!(context.strip_bom());
        assert_eq!(context.external(), Some(Encoding::Utf8));
        assert_eq!(decode_in_chunks(&context, b"\xEF\xBB\xBFa,b", 1), "a,b");
        // Not a BOM after all.
        assert_eq!(decode_in_chunks(&context, b"\xEF", 1), "\u{FFFD}");
        assert_eq!(decode_in_chunks(&context, b"x", 2), "x");
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(64)]
    fn latin1_transcodes_at_any_chunking(#[case] chunk: usize) {
        let context = EncodingContext::parse("iso-8859-1");
        assert_eq!(decode_in_chunks(&context, b"caf\xE9,\xDF", chunk), "café,ß");
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(5)]
    fn utf16_carries_split_units_and_surrogates(#[case] chunk: usize) {
        let text = "a,😀\n";
        let le: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let be: Vec<u8> = text.encode_utf16().flat_map(u16::to_be_bytes).collect();
        assert_eq!(decode_in_chunks(&EncodingContext::parse("utf-16le"), &le, chunk), text);
        assert_eq!(decode_in_chunks(&EncodingContext::parse("utf-16be"), &be, chunk), text);
    }

    #[test]
    fn utf16_dangling_input_becomes_replacement() {
        let context = EncodingContext::parse("utf-16le");
        assert_eq!(decode_in_chunks(&context, b"a\x00b", 8), "a\u{FFFD}");
        // Lone high surrogate at end of input.
        assert_eq!(decode_in_chunks(&context, b"\x3D\xD8", 8), "\u{FFFD}");
    }

    #[rstest]
    #[case(1)]
    #[case(6)]
    fn utf32_round_trips(#[case] chunk: usize) {
        let text = "x,\"ü\"";
        let le: Vec<u8> = text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect();
        let be: Vec<u8> = text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect();
        assert_eq!(decode_in_chunks(&EncodingContext::parse("utf-32le"), &le, chunk), text);
        assert_eq!(decode_in_chunks(&EncodingContext::parse("utf-32be"), &be, chunk), text);
    }

    #[test]
    fn passthrough_copies_bytes() {
        let context = EncodingContext::passthrough();
        assert_eq!(decode_in_chunks(&context, "ÃŸ".as_bytes(), 1), "ÃŸ");
    }
}
