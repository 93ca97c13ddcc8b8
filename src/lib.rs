//! # TLV buffers and ASN.1 primitives
//!
//! Buffers to build and read nested tag-length-value (TLV) structures, and the primitive
//! decoders of Distinguished Encoding Rules (DER [[X.690]]) needed to read keys and
//! certificates, implemented with the [nom](https://github.com/Geal/nom) parser combinator
//! framework.
//!
//! # Writing
//!
//! A [`DynBuf`] grows at both ends. Nested TLVs are written outside-in: open a sub-buffer in
//! the parent, write the content, then prepend the header once the content length is known.
//! Finishing the sub-buffer closes the gap left by unused reserved space.
//!
//! ```rust
//! use tlvbuf::{DynBuf, HeapPool};
//!
//! let pool = HeapPool;
//! let mut db = DynBuf::new(&pool, 16);
//! let mut seq = db.begin_constructed_tag();
//! seq.append_asn1_tag(0x02, &[0x05]);
//! seq.append_asn1_tag(0x02, &[0xfa]);
//! assert_eq!(seq.end_constructed_tag(0x30), Ok(8));
//! assert_eq!(db.as_slice(), &[0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0xfa]);
//! ```
//!
//! # Reading
//!
//! A [`ParseBuf`] reads borrowed memory. Descending into a TLV opens a child cursor over its
//! content; finishing the child moves the parent past the whole TLV.
//!
//! ```rust
//! use tlvbuf::ParseBuf;
//!
//! let data = [0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0xfa];
//! let mut pb = ParseBuf::from_static_bytes(&data);
//! let mut seq = pb.read_tag_sub(0x30);
//! let a = seq.read_integer();
//! let b = seq.read_integer();
//! assert_eq!((a, b), (Ok(5), Ok(-6)));
//! assert!(seq.finish().is_ok());
//! assert!(pb.is_empty());
//! ```
//!
//! The decoders of the [`asn1`] module can also be used directly on byte slices. They return
//! an [`Asn1Result`](error/type.Asn1Result.html): the remaining input and the value, or an
//! error code.
//!
//! # Errors
//!
//! Decoders return their error immediately. Buffers also keep an error counter: once an
//! operation failed, further operations on the same buffer fail without doing anything, and
//! finishing a child folds its errors into its parent.
//!
//! # References
//!
//! - [[X.690]] ASN.1 encoding rules: Specification of Basic Encoding Rules (BER), Canonical
//!   Encoding Rules (CER) and Distinguished Encoding Rules (DER).
//!
//! [X.690]: https://www.itu.int/rec/T-REC-X.690/en "ASN.1 encoding rules: Specification of
//!   Basic Encoding Rules (BER), Canonical Encoding Rules (CER) and Distinguished Encoding Rules
//!   (DER)."

#![deny(/*missing_docs,*/unsafe_code,
        unstable_features,
        unused_import_braces, unused_qualifications)]

pub mod asn1;
pub mod buf;
pub mod config;
pub mod error;
pub mod oid;
pub mod pool;

pub use crate::buf::{DynBuf, FixedBuf, ParseBuf};
pub use crate::config::DecodeConfig;
pub use crate::error::{Asn1Error, Asn1Result};
pub use crate::pool::{CountingPool, HeapPool, Pool};
