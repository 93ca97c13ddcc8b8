//! Error codes and result types
use nom::error::{ErrorKind, ParseError};
use nom::IResult;
use thiserror::Error;

/// Result codes of the ASN.1 decoders and buffer operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Asn1Error {
    /// Malformed tag or structure
    #[error("parse failure")]
    ParseFail,
    /// Not enough bytes, declared length too large, or too many length bytes
    #[error("limit failure")]
    LimitFail,
    /// A required input was absent
    #[error("argument failure")]
    ArgFail,
    /// Allocation failed
    #[error("memory allocation failure")]
    MemFail,
    /// The target is too small (or absent). Holds the required length.
    #[error("output buffer too small: {0} bytes required")]
    OutputLength(usize),

    #[error("nom error: {0:?}")]
    NomError(ErrorKind),
}

impl<I> ParseError<I> for Asn1Error {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        Asn1Error::NomError(kind)
    }
    fn append(_input: I, kind: ErrorKind, _other: Self) -> Self {
        Asn1Error::NomError(kind)
    }
}

/// Holds the result of the decoding functions
///
/// On success, the remaining input starts right after what was consumed.
pub type Asn1Result<'a, T> = IResult<&'a [u8], T, Asn1Error>;

/// Unwrap a decoder error into its result code
///
/// The decoders never return `Incomplete`, it is mapped to `LimitFail` anyway.
pub fn error_code(e: nom::Err<Asn1Error>) -> Asn1Error {
    match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => Asn1Error::LimitFail,
    }
}
