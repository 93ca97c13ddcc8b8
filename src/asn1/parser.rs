use crate::asn1::length::{parse_length, Length};
use crate::asn1::tag::*;
use crate::config::DecodeConfig;
use crate::error::*;
use crate::oid::{default_database, fingerprint, resolve, OidDatabase, OidId};
use log::trace;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;
use rusticata_macros::custom_check;

/// An AlgorithmIdentifier: the algorithm, and the length of its parameters
///
/// The parameters are left in the input, right after the value returned with this header.
/// An explicit NULL parameter is skipped and not counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmIdentifier {
    pub oid: OidId,
    pub param_len: usize,
}

#[inline]
fn fail<T>(e: Asn1Error) -> Asn1Result<'static, T> {
    Err(nom::Err::Error(e))
}

/// Read the identifier octet, which must be `tag`
fn expect_tag(i: &[u8], tag: u8) -> Asn1Result<'_, ()> {
    let (rem, t) = be_u8::<_, Asn1Error>(i).map_err(|_| nom::Err::Error(Asn1Error::ParseFail))?;
    if t != tag {
        trace!("expected tag 0x{:02x}, found 0x{:02x}", tag, t);
        return fail(Asn1Error::ParseFail);
    }
    Ok((rem, ()))
}

fn get_constructed_header<'a>(i: &'a [u8], tag: u8, cfg: &DecodeConfig) -> Asn1Result<'a, Length> {
    let (rem, _) = expect_tag(i, tag)?;
    parse_length(rem, cfg.indefinite, cfg.checks_content())
}

/// Read a SEQUENCE header, returning the content length
///
/// The input is left at the first content byte. Definite lengths only, and the content must
/// be present in the input.
///
/// ```rust
/// use tlvbuf::asn1::get_asn_sequence;
///
/// let data = [0x30, 0x03, 0x02, 0x01, 0x05];
/// let (rem, len) = get_asn_sequence(&data).expect("parsing failed");
/// assert_eq!(len, 3);
/// assert_eq!(rem, &data[2..]);
/// ```
pub fn get_asn_sequence(i: &[u8]) -> Asn1Result<'_, usize> {
    definite(get_asn_sequence_with(i, &DecodeConfig::default()))
}

/// Read a SEQUENCE header with explicit options
pub fn get_asn_sequence_with<'a>(i: &'a [u8], cfg: &DecodeConfig) -> Asn1Result<'a, Length> {
    get_constructed_header(i, SEQUENCE, cfg)
}

/// Read a SET header, returning the content length
pub fn get_asn_set(i: &[u8]) -> Asn1Result<'_, usize> {
    definite(get_asn_set_with(i, &DecodeConfig::default()))
}

/// Read a SET header with explicit options
pub fn get_asn_set_with<'a>(i: &'a [u8], cfg: &DecodeConfig) -> Asn1Result<'a, Length> {
    get_constructed_header(i, SET, cfg)
}

fn definite<'a>(r: Asn1Result<'a, Length>) -> Asn1Result<'a, usize> {
    let (rem, len) = r?;
    match len.definite() {
        Some(l) => Ok((rem, l)),
        None => fail(Asn1Error::LimitFail),
    }
}

/// Decode 1 to 4 big-endian two's complement bytes
fn decode_int4(bytes: &[u8]) -> i32 {
    if bytes[0] & 0x80 != 0 {
        let ui = bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(!b));
        (ui.wrapping_add(1) as i32).wrapping_neg()
    } else {
        bytes
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b)) as i32
    }
}

fn get_asn_int4(i: &[u8], tag: u8) -> Asn1Result<'_, i32> {
    let (rem, _) = expect_tag(i, tag)?;
    let (rem, len) = parse_length(rem, false, false)?;
    let len = len.definite().unwrap_or(0);
    custom_check!(rem, len > 4 || rem.len() < len, Asn1Error::LimitFail)?;
    custom_check!(rem, len == 0, Asn1Error::ParseFail)?;
    let (rem, bytes) = take::<_, _, Asn1Error>(len)(rem)?;
    Ok((rem, decode_int4(bytes)))
}

/// Read an INTEGER of at most 4 content bytes as a signed 32-bit value
///
/// Larger values fail with `LimitFail`, as does content missing from the input. An empty
/// content fails with `ParseFail`.
///
/// ```rust
/// use tlvbuf::asn1::get_asn_integer;
///
/// let (_, v) = get_asn_integer(&[0x02, 0x01, 0xfa]).expect("parsing failed");
/// assert_eq!(v, -6);
/// ```
pub fn get_asn_integer(i: &[u8]) -> Asn1Result<'_, i32> {
    get_asn_int4(i, Tag::Integer.byte())
}

/// Read an ENUMERATED of at most 4 content bytes
pub fn get_asn_enumerated(i: &[u8]) -> Asn1Result<'_, i32> {
    get_asn_int4(i, Tag::Enumerated.byte())
}

/// Read an OBJECT IDENTIFIER and return its content octets
pub fn get_asn_oid_raw(i: &[u8]) -> Asn1Result<'_, &[u8]> {
    let (rem, _) = expect_tag(i, Tag::Oid.byte())?;
    let (rem, len) = parse_length(rem, false, false)?;
    let len = len.definite().unwrap_or(0);
    custom_check!(rem, rem.len() < 2 || rem.len() < len, Asn1Error::LimitFail)?;
    take::<_, _, Asn1Error>(len)(rem)
}

/// Read an OBJECT IDENTIFIER, resolved against the built-in database
///
/// Without the `oid-database` feature, the result is the unresolved fingerprint.
pub fn get_asn_oid(i: &[u8]) -> Asn1Result<'_, OidId> {
    get_asn_oid_with(i, default_database())
}

/// Read an OBJECT IDENTIFIER, resolved against `db` if any
pub fn get_asn_oid_with<'a>(i: &'a [u8], db: Option<&dyn OidDatabase>) -> Asn1Result<'a, OidId> {
    let (rem, raw) = get_asn_oid_raw(i)?;
    let id = match db {
        Some(db) => resolve(raw, db),
        None => OidId(fingerprint(raw)),
    };
    Ok((rem, id))
}

/// Read an OBJECT IDENTIFIER followed by its parameters, within `i`
///
/// `i` is the rest of the enclosing structure: the parameter length is what follows the
/// identifier in it. An explicit NULL is skipped.
pub fn get_asn_oid_params<'a>(
    i: &'a [u8],
    db: Option<&dyn OidDatabase>,
) -> Asn1Result<'a, AlgorithmIdentifier> {
    let (rem, oid) = get_asn_oid_with(i, db)?;
    if rem.first() != Some(&Tag::Null.byte()) {
        return Ok((
            rem,
            AlgorithmIdentifier {
                oid,
                param_len: rem.len(),
            },
        ));
    }
    custom_check!(rem, rem.len() < 2, Asn1Error::LimitFail)?;
    custom_check!(rem, rem[1] != 0, Asn1Error::ParseFail)?;
    Ok((
        &rem[2..],
        AlgorithmIdentifier {
            oid,
            param_len: rem.len() - 2,
        },
    ))
}

/// Read an AlgorithmIdentifier: a SEQUENCE holding an OID and optional parameters
///
/// The input is left at the start of the parameters, of which there are `param_len` bytes.
///
/// ```rust
/// use tlvbuf::asn1::get_asn_algorithm_identifier;
/// use tlvbuf::oid::OidId;
///
/// // sha256WithRSAEncryption, NULL parameters
/// let data = [
///     0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0b, 0x05,
///     0x00,
/// ];
/// let (rem, alg) = get_asn_algorithm_identifier(&data).expect("parsing failed");
/// assert_eq!(alg.oid, OidId::Sha256RsaSig);
/// assert_eq!(alg.param_len, 0);
/// assert!(rem.is_empty());
/// ```
pub fn get_asn_algorithm_identifier(i: &[u8]) -> Asn1Result<'_, AlgorithmIdentifier> {
    get_asn_algorithm_identifier_with(i, default_database())
}

/// Read an AlgorithmIdentifier, resolving the OID against `db` if any
pub fn get_asn_algorithm_identifier_with<'a>(
    i: &'a [u8],
    db: Option<&dyn OidDatabase>,
) -> Asn1Result<'a, AlgorithmIdentifier> {
    let (content, len) = get_asn_sequence(i)?;
    custom_check!(content, len < 1, Asn1Error::LimitFail)?;
    let (rest, alg) = get_asn_oid_params(&content[..len], db)?;
    let consumed = len - rest.len();
    Ok((&content[consumed..], alg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decode_int4() {
        assert_eq!(decode_int4(&hex!("00")), 0);
        assert_eq!(decode_int4(&hex!("ff")), -1);
        assert_eq!(decode_int4(&hex!("80")), -128);
        assert_eq!(decode_int4(&hex!("00 80")), 128);
        assert_eq!(decode_int4(&hex!("7f ff ff ff")), i32::MAX);
        assert_eq!(decode_int4(&hex!("80 00 00 00")), i32::MIN);
    }

    #[test]
    fn test_sequence_non_strict() {
        let cfg = DecodeConfig::default().with_strict_length(false);
        let data = hex!("30 05 02 01");
        let (rem, len) = get_asn_sequence_with(&data, &cfg).expect("parsing failed");
        assert_eq!(len, Length::Definite(5));
        assert_eq!(rem.len(), 2);
        assert_eq!(
            get_asn_sequence(&hex!("30 05 02 01")).map_err(error_code),
            Err(Asn1Error::LimitFail)
        );
    }

    #[test]
    fn test_oid_params_null() {
        let data = hex!("06 03 2a 03 04 05 00 ff");
        let (rem, alg) = get_asn_oid_params(&data, None).expect("parsing failed");
        assert_eq!(alg.oid, OidId(49));
        assert_eq!(alg.param_len, 1);
        assert_eq!(rem, &hex!("ff"));
        // a NULL with content
        assert_eq!(
            get_asn_oid_params(&hex!("06 03 2a 03 04 05 01 00"), None).map_err(error_code),
            Err(Asn1Error::ParseFail)
        );
        assert_eq!(
            get_asn_oid_params(&hex!("06 03 2a 03 04 05"), None).map_err(error_code),
            Err(Asn1Error::LimitFail)
        );
    }
}
