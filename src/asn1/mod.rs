//! ASN.1 tags, lengths and primitive decoders
//!
//! The decoders work on raw byte slices and return the remaining input on success, in the
//! usual [nom](https://github.com/Geal/nom) style. They implement the small subset of DER
//! needed to read keys and certificates: lengths, SEQUENCE and SET headers, INTEGER and
//! ENUMERATED values fitting in 32 bits, object identifiers and AlgorithmIdentifiers.

mod length;
mod parser;
mod tag;

pub use crate::asn1::length::*;
pub use crate::asn1::parser::*;
pub use crate::asn1::tag::*;
