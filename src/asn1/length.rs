use crate::error::*;
use log::trace;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;
use rusticata_macros::custom_check;

/// Content lengths at or above this value are refused by the canonical header reader
pub const MAX_TAG_CONTENT: usize = 0x4000_0000;

/// Decoded length field
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Length {
    /// Definite form: number of content bytes
    Definite(usize),
    /// Indefinite form: holds the number of bytes remaining after the length octet, as a
    /// placeholder until the end-of-contents marker is found
    Indefinite(usize),
}

impl Length {
    /// Return the content length if it is definite
    #[inline]
    pub fn definite(&self) -> Option<usize> {
        match *self {
            Length::Definite(l) => Some(l),
            Length::Indefinite(_) => None,
        }
    }

    #[inline]
    pub fn is_indefinite(&self) -> bool {
        matches!(self, Length::Indefinite(_))
    }
}

/// Read a length field, short or long form, with at most 4 length octets
///
/// `indefinite` allows the `0x80` form. When it is not set, the announced content must also
/// fit in the remaining input if `check_content` is set.
pub(crate) fn parse_length(
    i: &[u8],
    indefinite: bool,
    check_content: bool,
) -> Asn1Result<'_, Length> {
    let (rem, first) = be_u8::<_, Asn1Error>(i).map_err(|_| {
        trace!("length: empty input");
        nom::Err::Error(Asn1Error::LimitFail)
    })?;
    let (rem, len) = if first & 0x80 == 0 {
        (rem, usize::from(first))
    } else {
        let n = usize::from(first & 0x7f);
        custom_check!(rem, rem.len() < n, Asn1Error::LimitFail)?;
        match n {
            0 if indefinite => return Ok((rem, Length::Indefinite(rem.len()))),
            1..=4 => {
                let (rem, bytes) = take::<_, _, Asn1Error>(n)(rem)?;
                let len = bytes
                    .iter()
                    .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
                (rem, len)
            }
            _ => {
                trace!("length: unsupported length form 0x{:02x}", first);
                return Err(nom::Err::Error(Asn1Error::LimitFail));
            }
        }
    };
    if check_content && !indefinite && rem.len() < len {
        trace!("length: {} content bytes announced, {} available", len, rem.len());
        return Err(nom::Err::Error(Asn1Error::LimitFail));
    }
    Ok((rem, Length::Definite(len)))
}

/// Read a definite length field
///
/// Fails with `LimitFail` if the input is empty, if more than 4 length octets are used, for
/// the indefinite form, or if fewer bytes than announced remain.
///
/// ```rust
/// use tlvbuf::asn1::get_asn_length;
///
/// let (rem, len) = get_asn_length(&[0x82, 0x01, 0x00, 0xff]).expect("parsing failed");
/// assert_eq!(len, 256);
/// assert_eq!(rem, &[0xff]);
/// ```
pub fn get_asn_length(i: &[u8]) -> Asn1Result<'_, usize> {
    let (rem, len) = parse_length(i, false, true)?;
    match len {
        Length::Definite(l) => Ok((rem, l)),
        Length::Indefinite(_) => Err(nom::Err::Error(Asn1Error::LimitFail)),
    }
}

/// Read a length field, accepting the indefinite form if `indefinite` is set
///
/// With `indefinite` set, definite lengths are not checked against the remaining input:
/// stream parsers do not require the entire content to be present.
pub fn get_asn_length_with(i: &[u8], indefinite: bool) -> Asn1Result<'_, Length> {
    parse_length(i, indefinite, true)
}

/// Number of bytes taken by a DER length field for `len` content bytes
pub fn der_length_size(len: usize) -> Option<usize> {
    match len {
        0..=0x7f => Some(1),
        0x80..=0xff => Some(2),
        0x100..=0xffff => Some(3),
        0x1_0000..=0xff_ffff => Some(4),
        _ if len as u64 <= u64::from(u32::MAX) => Some(5),
        _ => None,
    }
}

/// An encoded identifier octet and length field
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DerHeader {
    bytes: [u8; 6],
    len: usize,
}

impl DerHeader {
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for DerHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DerHeader").field(&self.as_slice()).finish()
    }
}

/// Encode the header of a TLV with `len` content bytes, using the minimal length form
///
/// Returns `None` if the length does not fit in 4 length octets.
pub fn der_header(tag: u8, len: usize) -> Option<DerHeader> {
    let size = der_length_size(len)?;
    let mut bytes = [0u8; 6];
    bytes[0] = tag;
    if size == 1 {
        bytes[1] = len as u8;
    } else {
        let n = size - 1;
        bytes[1] = 0x80 | n as u8;
        let be = (len as u32).to_be_bytes();
        bytes[2..2 + n].copy_from_slice(&be[4 - n..]);
    }
    Some(DerHeader {
        bytes,
        len: 1 + size,
    })
}

/// Extent of the TLV at the start of some input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    /// Identifier and length octets
    pub header_len: usize,
    /// Header and content
    pub total_len: usize,
}

impl TagSpan {
    #[inline]
    pub fn content_len(&self) -> usize {
        self.total_len - self.header_len
    }
}

/// Read a canonical DER header, without consuming anything
///
/// A `tag` of 0 matches any identifier octet. Non-minimal long forms (`0x81` followed by a
/// value below `0x80`, or a leading zero length octet) are refused, as are the indefinite
/// form, more than 4 length octets, contents of [`MAX_TAG_CONTENT`] bytes or more, and a TLV
/// larger than the input.
pub fn der_tag_span(i: &[u8], tag: u8) -> Result<TagSpan, Asn1Error> {
    if i.len() < 2 {
        return Err(Asn1Error::LimitFail);
    }
    if tag != 0 && i[0] != tag {
        return Err(Asn1Error::ParseFail);
    }
    let first = i[1];
    let (header_len, content_len) = if first < 0x80 {
        (2, usize::from(first))
    } else {
        let n = usize::from(first & 0x7f);
        if n == 0 || n > 4 {
            return Err(Asn1Error::ParseFail);
        }
        let bytes = i.get(2..2 + n).ok_or(Asn1Error::LimitFail)?;
        if (n == 1 && bytes[0] < 0x80) || (n > 1 && bytes[0] == 0) {
            return Err(Asn1Error::ParseFail);
        }
        let len = bytes
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        (2 + n, len)
    };
    if content_len >= MAX_TAG_CONTENT {
        return Err(Asn1Error::LimitFail);
    }
    let total_len = header_len + content_len;
    if total_len > i.len() {
        return Err(Asn1Error::LimitFail);
    }
    Ok(TagSpan {
        header_len,
        total_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_length_short() {
        let data = hex!("03 01 02 03 04");
        let (rem, len) = get_asn_length(&data).expect("parsing failed");
        assert_eq!(len, 3);
        assert_eq!(rem, &hex!("01 02 03 04"));
    }

    #[test]
    fn test_length_errors() {
        let e = |r: Asn1Result<usize>| r.map_err(error_code).err();
        assert_eq!(e(get_asn_length(&[])), Some(Asn1Error::LimitFail));
        // too many length octets
        assert_eq!(
            e(get_asn_length(&hex!("85 00 00 00 00 01 00"))),
            Some(Asn1Error::LimitFail)
        );
        // length octets missing
        assert_eq!(e(get_asn_length(&hex!("82 01"))), Some(Asn1Error::LimitFail));
        // content missing
        assert_eq!(e(get_asn_length(&hex!("05 00 00"))), Some(Asn1Error::LimitFail));
        // indefinite not allowed
        assert_eq!(e(get_asn_length(&hex!("80 00 00"))), Some(Asn1Error::LimitFail));
    }

    #[test]
    fn test_length_indefinite() {
        let data = hex!("80 01 02 00 00");
        let (rem, len) = get_asn_length_with(&data, true).expect("parsing failed");
        assert_eq!(len, Length::Indefinite(4));
        assert_eq!(rem.len(), 4);
        // stream mode does not require the content
        let (_, len) = get_asn_length_with(&hex!("10 01"), true).expect("parsing failed");
        assert_eq!(len, Length::Definite(16));
        assert!(get_asn_length_with(&hex!("10 01"), false).is_err());
    }

    #[test]
    fn test_der_header() {
        let h = |tag, len| der_header(tag, len).map(|h| h.as_slice().to_vec());
        assert_eq!(h(0x04, 0), Some(vec![0x04, 0x00]));
        assert_eq!(h(0x04, 127), Some(vec![0x04, 0x7f]));
        assert_eq!(h(0x04, 128), Some(vec![0x04, 0x81, 0x80]));
        assert_eq!(h(0x30, 256), Some(vec![0x30, 0x82, 0x01, 0x00]));
        assert_eq!(h(0x30, 70010), Some(vec![0x30, 0x83, 0x01, 0x11, 0x7a]));
        assert_eq!(h(0x30, 0x0100_0000), Some(vec![0x30, 0x84, 0x01, 0x00, 0x00, 0x00]));
    }

    #[test]
    fn test_tag_span() {
        let data = hex!("30 03 02 01 05 ff");
        assert_eq!(
            der_tag_span(&data, 0x30),
            Ok(TagSpan {
                header_len: 2,
                total_len: 5
            })
        );
        assert_eq!(der_tag_span(&data, 0).map(|s| s.content_len()), Ok(3));
        assert_eq!(der_tag_span(&data, 0x31), Err(Asn1Error::ParseFail));
        assert_eq!(der_tag_span(&data[..1], 0), Err(Asn1Error::LimitFail));
        assert_eq!(der_tag_span(&data[..4], 0x30), Err(Asn1Error::LimitFail));
    }

    #[test]
    fn test_tag_span_non_canonical() {
        let mut data = vec![0x04, 0x81, 0x05];
        data.extend_from_slice(&[0u8; 5]);
        assert_eq!(der_tag_span(&data, 0x04), Err(Asn1Error::ParseFail));
        let mut data = vec![0x04, 0x82, 0x00, 0x90];
        data.extend_from_slice(&[0u8; 0x90]);
        assert_eq!(der_tag_span(&data, 0x04), Err(Asn1Error::ParseFail));
        assert_eq!(der_tag_span(&hex!("04 80 00 00"), 0x04), Err(Asn1Error::ParseFail));
        assert_eq!(
            der_tag_span(&hex!("04 85 00 00 00 00 01 00"), 0x04),
            Err(Asn1Error::ParseFail)
        );
        // canonical long form
        let mut data = vec![0x04, 0x81, 0x80];
        data.extend_from_slice(&[0u8; 0x80]);
        assert_eq!(der_tag_span(&data, 0x04).map(|s| s.total_len), Ok(0x83));
    }

    #[test]
    fn test_tag_span_content_ceiling() {
        assert_eq!(
            der_tag_span(&hex!("04 84 40 00 00 00"), 0),
            Err(Asn1Error::LimitFail)
        );
    }
}
