//! Decoding of the "modified UTF-8" used by `CONSTANT_Utf8` entries: NUL is written as the
//! two-byte form `C0 80` and supplementary characters are written as a surrogate pair whose halves
//! are each encoded in three bytes.

use nom::{branch, bytes::complete as bytes, combinator as comb, multi, IResult};

fn is_jvm8_single_start(c: u8) -> bool {
    c & 0x80 == 0 && c != 0
}

fn is_jvm8_continuation_byte(c: u8) -> bool {
    c & 0xC0 == 0x80
}

fn is_jvm8_double_start(c: u8) -> bool {
    c & 0xE0 == 0xC0
}

fn is_jvm8_triple_start(c: u8) -> bool {
    c & 0xF0 == 0xE0
}

fn is_jvm8_surrogate_start(c: u8) -> bool {
    c == 0xED
}

fn is_jvm8_lead_surr_second(c: u8) -> bool {
    c & 0xF0 == 0xA0
}

fn is_jvm8_trail_surr_second(c: u8) -> bool {
    c & 0xF0 == 0xB0
}

fn is_jvm8_single_byte(cs: &[u8]) -> bool {
    cs.len() == 1 && is_jvm8_single_start(cs[0])
}

fn is_jvm8_double_byte(cs: &[u8]) -> bool {
    cs.len() == 2 && is_jvm8_double_start(cs[0]) && is_jvm8_continuation_byte(cs[1])
}

fn is_jvm8_triple_byte(cs: &[u8]) -> bool {
    cs.len() == 3
        && is_jvm8_triple_start(cs[0])
        && is_jvm8_continuation_byte(cs[1])
        && is_jvm8_continuation_byte(cs[2])
        && (!is_jvm8_surrogate_start(cs[0])
            || !is_jvm8_lead_surr_second(cs[1]) && !is_jvm8_trail_surr_second(cs[1]))
}

fn is_jvm8_sextuple_byte(cs: &[u8]) -> bool {
    cs.len() == 6
        && is_jvm8_surrogate_start(cs[0])
        && is_jvm8_lead_surr_second(cs[1])
        && is_jvm8_continuation_byte(cs[2])
        && is_jvm8_surrogate_start(cs[3])
        && is_jvm8_trail_surr_second(cs[4])
        && is_jvm8_continuation_byte(cs[5])
}

fn parse_one_byte_point(bytes: &[u8]) -> IResult<&[u8], char> {
    comb::map(
        comb::verify(bytes::take(1usize), is_jvm8_single_byte),
        |bytes: &[u8]| char::from(bytes[0]),
    )(bytes)
}

fn parse_two_byte_point(bytes: &[u8]) -> IResult<&[u8], char> {
    comb::map_opt(
        comb::verify(bytes::take(2usize), is_jvm8_double_byte),
        |bytes: &[u8]| {
            let high_bits = bytes[0] as u32 & 0x1F;
            let low_bits = bytes[1] as u32 & 0x3F;
            char::from_u32((high_bits << 6) | low_bits)
        },
    )(bytes)
}

fn parse_three_byte_point(bytes: &[u8]) -> IResult<&[u8], char> {
    comb::map_opt(
        comb::verify(bytes::take(3usize), is_jvm8_triple_byte),
        |bytes: &[u8]| {
            let high_bits = bytes[0] as u32 & 0xF;
            let mid_bits = bytes[1] as u32 & 0x3F;
            let low_bits = bytes[2] as u32 & 0x3F;
            char::from_u32((high_bits << 12) | (mid_bits << 6) | low_bits)
        },
    )(bytes)
}

fn parse_six_byte_point(bytes: &[u8]) -> IResult<&[u8], char> {
    comb::map_opt(
        comb::verify(bytes::take(6usize), is_jvm8_sextuple_byte),
        |bytes: &[u8]| {
            let high_high_bits = (bytes[1] as u32 & 0xF) + 1;
            let low_high_bits = bytes[2] as u32 & 0x3F;
            let high_low_bits = bytes[4] as u32 & 0xF;
            let low_low_bits = bytes[5] as u32 & 0x3F;
            let high_bits = (high_high_bits << 6) | low_high_bits;
            let low_bits = (high_low_bits << 6) | low_low_bits;
            char::from_u32((high_bits << 10) | low_bits)
        },
    )(bytes)
}

fn parse_jvm8_code_point(bytes: &[u8]) -> IResult<&[u8], char> {
    branch::alt((
        parse_one_byte_point,
        parse_two_byte_point,
        parse_six_byte_point,
        parse_three_byte_point,
    ))(bytes)
}

/// Parse the whole of `bytes` as modified UTF-8.
pub fn parse_jvm8(bytes: &[u8]) -> IResult<&[u8], String> {
    comb::all_consuming(multi::fold_many0(
        parse_jvm8_code_point,
        String::new,
        |mut acc, c| {
            acc.push(c);
            acc
        },
    ))(bytes)
}

/// Decode `bytes` as modified UTF-8, or `None` if they are not well-formed.
///
/// The result is a Rust `String`, so an unpaired surrogate such as `ED A0 80` cannot be
/// represented and is rejected, even though class files may contain one (javac writes it for a
/// literal like `"\uD800"`).
pub fn decode(bytes: &[u8]) -> Option<String> {
    parse_jvm8(bytes).ok().map(|(_, s)| s)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_ascii() {
        assert_eq!(Some("java/lang/Object".to_string()), decode(b"java/lang/Object"));
    }

    #[test]
    fn decodes_empty() {
        assert_eq!(Some(String::new()), decode(b""));
    }

    #[test]
    fn decodes_encoded_nul() {
        assert_eq!(Some("a\0b".to_string()), decode(&[b'a', 0xC0, 0x80, b'b']));
    }

    #[test]
    fn decodes_bmp_characters() {
        // "é€"
        assert_eq!(
            Some("\u{E9}\u{20AC}".to_string()),
            decode(&[0xC3, 0xA9, 0xE2, 0x82, 0xAC])
        );
    }

    #[test]
    fn decodes_surrogate_pair() {
        // U+1F600 as the surrogate pair D83D DE00, each half in three bytes.
        let bytes = [0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        assert_eq!(Some("\u{1F600}".to_string()), decode(&bytes));
    }

    #[test]
    fn rejects_raw_nul() {
        assert_eq!(None, decode(&[b'a', 0x00]));
    }

    #[test]
    fn rejects_unpaired_surrogate() {
        assert_eq!(None, decode(&[0xED, 0xA0, 0x80]));
        assert_eq!(None, decode(&[b'a', 0xED, 0xB0, 0x80]));
    }

    #[test]
    fn rejects_four_byte_utf8() {
        assert_eq!(None, decode("\u{1F600}".as_bytes()));
    }

    #[test]
    fn rejects_dangling_continuation() {
        assert_eq!(None, decode(&[0x80]));
    }
}
