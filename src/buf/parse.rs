//! Read side: cursors over borrowed DER data, with nested sub-cursors
//!
//! A [`ParseBuf`] reads a region of borrowed memory. Descending into a TLV opens a child over
//! its content; finishing the child moves the parent past the whole TLV (header and content),
//! whatever the child actually read. The child borrows the parent mutably, so only one child
//! can be open at a time, and the parent is usable again once the child is finished,
//! cancelled or dropped.
//!
//! ```rust
//! use tlvbuf::ParseBuf;
//!
//! let data = [0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0xfa];
//! let mut pb = ParseBuf::from_static_bytes(&data);
//! let mut seq = pb.read_tag_sub(0x30);
//! assert_eq!(seq.read_integer(), Ok(5));
//! assert_eq!(seq.read_integer(), Ok(-6));
//! assert!(seq.finish().is_ok());
//! assert_eq!(pb.position(), 8);
//! ```
use crate::asn1::*;
use crate::buf::fixed::FixedBuf;
use crate::error::*;
use crate::oid::{default_database, OidId};
use log::trace;
use std::fmt;

struct Cursor<'a> {
    buf: FixedBuf<'a>,
    err: u32,
}

/// A read-only cursor over borrowed memory, optionally nested in a parent cursor
pub struct ParseBuf<'a, 'm> {
    cur: Cursor<'a>,
    master: Option<&'m mut Cursor<'a>>,
    /// Parent read position past the full TLV this buffer was opened on
    resume_at: usize,
    /// Header and content length of that TLV
    span_len: usize,
}

impl<'a> ParseBuf<'a, 'a> {
    /// Read `data`, which is borrowed and never released
    pub fn from_static_bytes(data: &'a [u8]) -> Self {
        ParseBuf {
            cur: Cursor {
                buf: FixedBuf::from_static_bytes(data),
                err: 0,
            },
            master: None,
            resume_at: 0,
            span_len: data.len(),
        }
    }
}

impl<'a, 'm> ParseBuf<'a, 'm> {
    #[inline]
    pub fn error_count(&self) -> u32 {
        self.cur.err
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.cur.err == 0
    }

    /// `Ok` if no error was recorded in this buffer
    pub fn check_state(&self) -> Result<(), Asn1Error> {
        if self.cur.err == 0 {
            Ok(())
        } else {
            Err(Asn1Error::ParseFail)
        }
    }

    #[inline]
    pub fn is_sub(&self) -> bool {
        self.master.is_some()
    }

    /// The unread bytes
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        self.cur.buf.view_slice()
    }

    /// Number of unread bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.cur.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cur.buf.is_empty()
    }

    /// Read position, from the start of this buffer's region
    #[inline]
    pub fn position(&self) -> usize {
        self.cur.buf.window().start
    }

    /// True if no error was recorded and at least `n` bytes are left
    pub fn can_read(&self, n: usize) -> bool {
        self.is_ok() && self.len() >= n
    }

    fn raise(&mut self) {
        self.cur.err = self.cur.err.saturating_add(1);
    }

    /// Header and total length of the TLV at the read position, without consuming it
    ///
    /// A `tag` of 0 matches any tag. Only canonical DER headers are accepted: see
    /// [`der_tag_span`].
    pub fn get_tag_length(&self, tag: u8) -> Option<TagSpan> {
        der_tag_span(self.remaining(), tag).ok()
    }

    pub fn can_get_tag(&self, tag: u8) -> bool {
        self.get_tag_length(tag).is_some()
    }

    /// Consume `bytes` if the unread content starts with them. Returns the number of bytes
    /// consumed, 0 if they do not match.
    pub fn try_skip_bytes(&mut self, bytes: &[u8]) -> usize {
        if bytes.is_empty() || !self.remaining().starts_with(bytes) {
            return 0;
        }
        self.cur.buf.advance(bytes.len());
        bytes.len()
    }

    /// Like [`try_skip_bytes`](Self::try_skip_bytes), recording an error on mismatch
    pub fn skip_bytes(&mut self, bytes: &[u8]) -> usize {
        let n = self.try_skip_bytes(bytes);
        if n == 0 {
            self.raise();
        }
        n
    }

    fn open(&mut self, span: TagSpan) -> ParseBuf<'a, '_> {
        let rest = self.remaining();
        let content = &rest[span.header_len..span.total_len];
        let resume_at = self.position() + span.total_len;
        ParseBuf {
            cur: Cursor {
                buf: FixedBuf::from_static_bytes(content),
                err: 0,
            },
            master: Some(&mut self.cur),
            resume_at,
            span_len: span.total_len,
        }
    }

    /// Open a child over the content of the next TLV, if it has tag `tag` (0 for any)
    ///
    /// The read position does not move until the child is finished.
    pub fn try_read_tag_sub(&mut self, tag: u8) -> Option<ParseBuf<'a, '_>> {
        let span = self.get_tag_length(tag)?;
        Some(self.open(span))
    }

    /// Open a child over the content of the next TLV
    ///
    /// On failure, an error is recorded in this buffer, and the returned child is already in
    /// error. It covers the unread content of this buffer, so that reading from it stays in
    /// bounds.
    pub fn read_tag_sub(&mut self, tag: u8) -> ParseBuf<'a, '_> {
        match self.get_tag_length(tag) {
            Some(span) => self.open(span),
            None => {
                trace!("read_tag_sub: no TLV with tag 0x{:02x}", tag);
                self.raise();
                let rest = self.remaining();
                let resume_at = self.position();
                ParseBuf {
                    cur: Cursor {
                        buf: FixedBuf::from_static_bytes(rest),
                        err: 1,
                    },
                    master: Some(&mut self.cur),
                    resume_at,
                    span_len: 0,
                }
            }
        }
    }

    /// Consume the next TLV, returning a view over its content
    pub fn read_tag_ref(&mut self, tag: u8) -> Option<FixedBuf<'a>> {
        match self.get_tag_length(tag) {
            Some(span) => {
                let content = &self.remaining()[span.header_len..span.total_len];
                self.cur.buf.advance(span.total_len);
                Some(FixedBuf::from_static_bytes(content))
            }
            None => {
                trace!("read_tag_ref: no TLV with tag 0x{:02x}", tag);
                self.raise();
                None
            }
        }
    }

    /// Consume the next TLV if it has tag `tag`. Returns its full length, 0 if absent.
    pub fn try_skip_tag(&mut self, tag: u8) -> usize {
        match self.try_read_tag_sub(tag) {
            Some(sub) => {
                let n = sub.span_len;
                match sub.finish() {
                    Ok(()) => n,
                    Err(_) => 0,
                }
            }
            None => 0,
        }
    }

    /// Like [`try_skip_tag`](Self::try_skip_tag), recording an error if the TLV is absent
    pub fn skip_tag(&mut self, tag: u8) -> usize {
        let n = self.try_skip_tag(tag);
        if n == 0 {
            self.raise();
        }
        n
    }

    /// Copy the unread content into `target`
    ///
    /// Without a target, or if it is too small, nothing is copied and
    /// `Err(OutputLength(n))` gives the size needed.
    pub fn copy_all(&self, target: Option<&mut [u8]>) -> Result<usize, Asn1Error> {
        self.check_state()?;
        let src = self.remaining();
        match target {
            Some(out) if out.len() >= src.len() => {
                out[..src.len()].copy_from_slice(src);
                Ok(src.len())
            }
            _ => Err(Asn1Error::OutputLength(src.len())),
        }
    }

    /// Close this buffer
    ///
    /// A child without errors moves its parent past the whole TLV it was opened on, even if
    /// some content was left unread. A child in error records an error in its parent instead,
    /// whose position does not change.
    pub fn finish(self) -> Result<(), Asn1Error> {
        let rc = self.check_state();
        if let Some(master) = self.master {
            if self.cur.err == 0 {
                let win = master.buf.window_mut();
                debug_assert!(self.resume_at <= win.end);
                win.start = self.resume_at.min(win.end);
            } else {
                master.err = master.err.saturating_add(1);
            }
        }
        rc
    }

    /// Close this buffer, leaving the parent untouched
    ///
    /// Dropping the buffer has the same effect.
    pub fn cancel(self) {}

    /// Run a decoder at the read position, and consume what it read
    ///
    /// Does nothing if an error was already recorded. A decoder failure is recorded.
    pub fn parse_with<T, F>(&mut self, f: F) -> Result<T, Asn1Error>
    where
        F: FnOnce(&'a [u8]) -> Asn1Result<'a, T>,
    {
        self.check_state()?;
        let input = self.remaining();
        match f(input) {
            Ok((rem, v)) => {
                self.cur.buf.advance(input.len() - rem.len());
                Ok(v)
            }
            Err(e) => {
                self.raise();
                Err(error_code(e))
            }
        }
    }

    /// Read an INTEGER of at most 4 content bytes
    pub fn read_integer(&mut self) -> Result<i32, Asn1Error> {
        self.parse_with(get_asn_integer)
    }

    pub fn read_enumerated(&mut self) -> Result<i32, Asn1Error> {
        self.parse_with(get_asn_enumerated)
    }

    pub fn read_oid(&mut self) -> Result<OidId, Asn1Error> {
        self.parse_with(get_asn_oid)
    }

    /// Read an AlgorithmIdentifier. The read position is left at the start of the parameters.
    pub fn read_algorithm_identifier(&mut self) -> Result<AlgorithmIdentifier, Asn1Error> {
        self.parse_with(|i| get_asn_algorithm_identifier_with(i, default_database()))
    }
}

/// Equal if both buffers are free of errors and have the same unread content
impl<'a, 'm, 'b, 'n> PartialEq<ParseBuf<'b, 'n>> for ParseBuf<'a, 'm> {
    fn eq(&self, other: &ParseBuf<'b, 'n>) -> bool {
        self.is_ok() && other.is_ok() && self.remaining() == other.remaining()
    }
}

impl<'a, 'm> fmt::Debug for ParseBuf<'a, 'm> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseBuf")
            .field("position", &self.position())
            .field("remaining", &self.len())
            .field("err", &self.cur.err)
            .field("sub", &self.is_sub())
            .finish()
    }
}
