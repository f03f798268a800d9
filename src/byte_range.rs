//! `/ByteRange` and `/Contents` placeholder rewriting.
//!
//! The signature value dictionary is first written with well-known
//! placeholder values. After serialization the placeholders are patched in
//! place with splices of identical length, so every xref offset in the file
//! stays valid.

use crate::Error;
use std::ops::Range;

/// Number of zero bytes in the `/Contents` placeholder string. The DER
/// signature must fit in its hex form, signature dictionary included.
pub(crate) const CONTENTS_PLACEHOLDER_BYTES: usize = 9000;

/// The `/ByteRange` array value the dictionary is first written with.
pub(crate) const BYTE_RANGE_PLACEHOLDER: [i64; 4] = [0, 10000, 20000, 10000];

// The byte-range array is re-written left-aligned in this many characters.
const BYTE_RANGE_PAD: usize = 25;

const BYTE_RANGE_PATTERN: &[u8] = b"/ByteRange[0 10000 20000 10000]/Contents<";
const CONTENTS_PATTERN: &[u8] = b"/Contents<";
// Enough placeholder zeros to not match a real signature by accident.
const ZERO_RUN: usize = 40;

/// The two byte spans of the file covered by the signature: everything
/// except the hex string between `<` and `>` of `/Contents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ByteRange {
    pub parts: [usize; 4],
}

impl ByteRange {
    pub(crate) fn first(&self) -> Range<usize> {
        self.parts[0]..self.parts[0] + self.parts[1]
    }

    pub(crate) fn second(&self) -> Range<usize> {
        self.parts[2]..self.parts[2] + self.parts[3]
    }

    pub(crate) fn signed_len(&self) -> usize {
        self.parts[1] + self.parts[3]
    }

    fn to_padded_list(&self) -> Result<String, Error> {
        let list = self
            .parts
            .iter()
            .map(|value| value.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        if list.len() > BYTE_RANGE_PAD {
            return Err(Error::Other(format!(
                "byte range `{}` does not fit in {} characters",
                list, BYTE_RANGE_PAD
            )));
        }
        Ok(format!("{:<width$}", list, width = BYTE_RANGE_PAD))
    }
}

fn find_pattern(haystack: &[u8], pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return None;
    }
    haystack
        .windows(pattern.len())
        .position(|window| window == pattern)
}

fn placeholder_pattern(prefix: &[u8]) -> Vec<u8> {
    let mut pattern = prefix.to_vec();
    pattern.extend(std::iter::repeat(b'0').take(ZERO_RUN));
    pattern
}

/// Find the placeholder signature dictionary in the serialized file, rewrite
/// its `/ByteRange` with the real offsets, and return them.
pub(crate) fn fill_byte_range(pdf_data: &mut Vec<u8>) -> Result<ByteRange, Error> {
    let found_at = find_pattern(pdf_data, &placeholder_pattern(BYTE_RANGE_PATTERN))
        .ok_or_else(|| Error::Other("signature placeholder not found in output".to_owned()))?;

    // Layout after the rewrite:
    //   /ByteRange[<pad>]/Contents<  ...hex zeros...  >
    // `<` sits at a fixed offset because the pad width is fixed.
    let lt_offset = found_at + b"/ByteRange[".len() + BYTE_RANGE_PAD + b"]/Contents<".len() - 1;
    // Widening the array shrinks the hex region by the same amount.
    let hex_len = CONTENTS_PLACEHOLDER_BYTES * 2 + b"0 10000 20000 10000".len() - BYTE_RANGE_PAD;
    let second_start = lt_offset + hex_len + 2;

    let byte_range = ByteRange {
        parts: [
            0,
            lt_offset,
            second_start,
            pdf_data
                .len()
                .checked_sub(second_start)
                .ok_or_else(|| Error::Other("signature placeholder is truncated".to_owned()))?,
        ],
    };

    let mut replacement = format!(
        "/ByteRange[{}]/Contents<",
        byte_range.to_padded_list()?
    )
    .into_bytes();
    // Trailing zeros so any leftover array characters are overwritten too.
    replacement.extend(std::iter::repeat(b'0').take(ZERO_RUN / 2));
    pdf_data.splice(found_at..found_at + replacement.len(), replacement);

    Ok(byte_range)
}

/// Write the DER signature, hex encoded, into the `/Contents` placeholder.
pub(crate) fn fill_contents(pdf_data: &mut Vec<u8>, signature: &[u8]) -> Result<(), Error> {
    let hex_len = CONTENTS_PLACEHOLDER_BYTES * 2 + b"0 10000 20000 10000".len() - BYTE_RANGE_PAD;
    if signature.len() * 2 > hex_len {
        return Err(Error::Other(format!(
            "signature of {} bytes does not fit the {} character placeholder",
            signature.len(),
            hex_len
        )));
    }

    let found_at = find_pattern(pdf_data, &placeholder_pattern(CONTENTS_PATTERN))
        .ok_or_else(|| Error::Other("contents placeholder not found in output".to_owned()))?;

    let mut replacement = CONTENTS_PATTERN.to_vec();
    for byte in signature {
        replacement.extend(format!("{:02x}", byte).into_bytes());
    }
    pdf_data.splice(found_at..found_at + replacement.len(), replacement);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder_file() -> Vec<u8> {
        let mut data = b"%PDF-1.5 header /ByteRange[0 10000 20000 10000]/Contents<".to_vec();
        data.extend(std::iter::repeat(b'0').take(CONTENTS_PLACEHOLDER_BYTES * 2));
        data.extend_from_slice(b">/M(D:20250101000000+00'00')\n%%EOF");
        data
    }

    #[test]
    fn fill_byte_range_keeps_length_and_covers_file() {
        let mut data = placeholder_file();
        let original_len = data.len();
        let byte_range = fill_byte_range(&mut data).unwrap();

        assert_eq!(data.len(), original_len);
        assert_eq!(byte_range.parts[0], 0);
        assert_eq!(
            byte_range.parts[2] + byte_range.parts[3],
            data.len(),
            "second range must run to the end of the file"
        );
        // The gap between the two ranges is exactly the `<...>` hex string.
        assert_eq!(data[byte_range.parts[1]], b'<');
        assert_eq!(data[byte_range.parts[2] - 1], b'>');
        // The rewritten array is really in the file.
        let rewritten = String::from_utf8_lossy(&data);
        assert!(rewritten.contains(&format!(
            "/ByteRange[{} {} {} {}",
            byte_range.parts[0], byte_range.parts[1], byte_range.parts[2], byte_range.parts[3]
        )));
    }

    #[test]
    fn fill_contents_writes_hex_signature() {
        let mut data = placeholder_file();
        let original_len = data.len();
        fill_byte_range(&mut data).unwrap();
        fill_contents(&mut data, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();

        assert_eq!(data.len(), original_len);
        assert!(String::from_utf8_lossy(&data).contains("/Contents<deadbeef0"));
    }

    #[test]
    fn fill_contents_rejects_oversized_signature() {
        let mut data = placeholder_file();
        fill_byte_range(&mut data).unwrap();
        let oversized = vec![0xAB; CONTENTS_PLACEHOLDER_BYTES + 1];
        assert!(fill_contents(&mut data, &oversized).is_err());
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let mut data = b"%PDF-1.5 no placeholder here".to_vec();
        assert!(fill_byte_range(&mut data).is_err());
    }
}
