use crate::asn1::der_header;
use crate::buf::fixed::{Detached, FixedBuf, Window};
use crate::error::Asn1Error;
use crate::pool::Pool;
use log::{debug, trace};
use std::fmt;

/// Minimum amount of head or tail room added when an owned buffer has to grow
pub const DYNBUF_GROW: usize = 256;

/// Initial capacity of the sub-buffer opened by `begin_constructed_tag`
pub const CONSTRUCTED_TAG_SLACK: usize = 20;

/// Head room reserved by `begin_constructed_tag` for the header written at the end
pub const CONSTRUCTED_TAG_HEADROOM: usize = 4;

/// Largest code point `append_utf8` accepts
pub const MAX_UTF8_CODEPOINT: u32 = 0x1_FFFF;

struct SubFrame {
    win: Window,
    err: u32,
}

/// Storage of a whole buffer tree
///
/// The root window is the one of the owned `FixedBuf`; open sub-buffers are windows into the
/// same storage, one per nesting level. Only the chain of currently open sub-buffers exists,
/// since a parent cannot be touched while its child is alive.
struct Arena<'p> {
    root: FixedBuf<'p>,
    pool: &'p dyn Pool,
    err: u32,
    subs: Vec<SubFrame>,
}

impl<'p> Arena<'p> {
    fn window(&self, level: usize) -> Window {
        if level == 0 {
            self.root.window()
        } else {
            self.subs[level - 1].win
        }
    }

    fn window_mut(&mut self, level: usize) -> &mut Window {
        if level == 0 {
            self.root.window_mut()
        } else {
            &mut self.subs[level - 1].win
        }
    }

    fn err(&self, level: usize) -> u32 {
        if level == 0 {
            self.err
        } else {
            self.subs[level - 1].err
        }
    }

    fn raise(&mut self, level: usize, n: u32) {
        let err = if level == 0 {
            &mut self.err
        } else {
            &mut self.subs[level - 1].err
        };
        *err = err.saturating_add(n);
    }

    fn mem(&mut self) -> &mut [u8] {
        match self.root.storage_mut() {
            Some(mem) => mem,
            None => &mut [],
        }
    }

    fn slice(&self, level: usize) -> &[u8] {
        let w = self.window(level);
        &self.root.storage()[w.start..w.end]
    }

    /// Reallocate the root with (at least) the requested extra head and tail room
    fn grow_root(&mut self, head: usize, filled: usize, tail: usize) -> bool {
        let total = head.checked_add(filled).and_then(|t| t.checked_add(tail));
        let new = total.and_then(|total| FixedBuf::new(self.pool, total).ok());
        let mut new = match new {
            Some(new) => new,
            None => {
                debug!("grow: cannot allocate {}+{}+{} bytes", head, filled, tail);
                self.raise(0, 1);
                return false;
            }
        };
        new.prepend_reserve(head);
        match new.append_reserve(filled) {
            Some(dst) => dst.copy_from_slice(self.root.as_slice()),
            None => {
                debug_assert!(false, "fresh allocation too small");
                self.raise(0, 1);
                return false;
            }
        }
        // the old region goes back to the pool here
        self.root = new;
        true
    }

    fn grow(&mut self, level: usize, head_sz: usize, tail_sz: usize) -> bool {
        if self.err(level) != 0 {
            return false;
        }
        let head_sz = if head_sz != 0 && head_sz < DYNBUF_GROW {
            DYNBUF_GROW
        } else {
            head_sz
        };
        let tail_sz = tail_sz.max(DYNBUF_GROW);

        let w = self.window(level);
        let headroom = w.head_room();
        let filled = w.filled();
        let tailroom = w.tail_room();

        if level == 0 {
            debug!(
                "grow: {}+{}+{} => {}+{}+{}",
                headroom,
                filled,
                tailroom,
                headroom.saturating_add(head_sz),
                filled,
                tailroom.saturating_add(tail_sz)
            );
            return match (headroom.checked_add(head_sz), tailroom.checked_add(tail_sz)) {
                (Some(head), Some(tail)) => self.grow_root(head, filled, tail),
                _ => {
                    self.raise(0, 1);
                    false
                }
            };
        }

        let extra = match head_sz.checked_add(tail_sz) {
            Some(extra) => extra,
            None => {
                self.raise(level, 1);
                return false;
            }
        };
        let m = self.window(level - 1);
        let offset = w.origin - m.start;
        let offset_tail = m.end - w.limit();
        debug!(
            "sub grow (level {}): {}+{}+{} => {}+{}+{}; sub at {}..-{}",
            level,
            headroom,
            filled,
            tailroom,
            headroom.saturating_add(head_sz),
            filled,
            tailroom.saturating_add(tail_sz),
            offset,
            offset_tail
        );

        if m.tail_room() < extra && !self.grow(level - 1, 0, extra) {
            self.raise(level, 1);
            return false;
        }
        let m = {
            let m = self.window_mut(level - 1);
            m.end += extra;
            *m
        };
        let mem = self.mem();
        if offset_tail > 0 {
            let from = m.end - offset_tail - extra;
            mem.copy_within(from..from + offset_tail, m.end - offset_tail);
        }
        let origin = m.start + offset;
        let start = origin + headroom + head_sz;
        if head_sz > 0 && filled > 0 {
            mem.copy_within(start - head_sz..start - head_sz + filled, start);
        }
        let win = Window {
            origin,
            start,
            end: start + filled,
            size: headroom + head_sz + filled + tailroom + tail_sz,
        };
        win.check();
        debug_assert!(win.origin >= m.start && win.limit() <= m.end);
        *self.window_mut(level) = win;
        true
    }

    fn append_size(&mut self, level: usize, sz: usize) -> Option<usize> {
        if self.err(level) != 0 {
            return None;
        }
        if let Some(at) = self.window_mut(level).append_size(sz) {
            return Some(at);
        }
        if !self.grow(level, 0, sz) {
            return None;
        }
        let at = self.window_mut(level).append_size(sz);
        debug_assert!(at.is_some());
        at
    }

    fn prepend_size(&mut self, level: usize, sz: usize) -> Option<usize> {
        if self.err(level) != 0 {
            return None;
        }
        if let Some(at) = self.window_mut(level).prepend_size(sz) {
            return Some(at);
        }
        if !self.grow(level, sz, 0) {
            return None;
        }
        let at = self.window_mut(level).prepend_size(sz);
        debug_assert!(at.is_some());
        at
    }

    /// Open the window of a new child of `level`
    fn open(&mut self, level: usize, win: Option<Window>) {
        self.subs.truncate(level);
        let frame = match win {
            Some(win) => SubFrame { win, err: 0 },
            None => {
                self.raise(level, 1);
                SubFrame {
                    win: Window::default(),
                    err: 1,
                }
            }
        };
        self.subs.push(frame);
    }

    /// Fold the child at `level` into its master, closing the gap left by unused capacity
    fn close(&mut self, level: usize) -> Result<usize, Asn1Error> {
        let sub_err = self.err(level);
        let res = if sub_err != 0 {
            self.raise(level - 1, sub_err);
            Err(Asn1Error::ParseFail)
        } else {
            let w = self.window(level);
            let m = self.window(level - 1);
            let total = w.size;
            let filled = w.filled();
            let offset_tail = m.end - w.limit();
            let mem = self.mem();
            if w.origin != w.start && filled > 0 {
                mem.copy_within(w.start..w.end, w.origin);
            }
            if offset_tail > 0 {
                mem.copy_within(m.end - offset_tail..m.end, w.origin + filled);
            }
            self.window_mut(level - 1).end = m.end - total + filled;
            Ok(filled)
        };
        self.subs.truncate(level - 1);
        res
    }
}

enum ArenaRef<'b, 'p> {
    Owned(Arena<'p>),
    Borrowed(&'b mut Arena<'p>),
}

/// Growable buffer, extensible at both ends
///
/// A `DynBuf` either owns its memory (created with [`DynBuf::new`]) or is a sub-buffer whose
/// span was claimed inside its master (created with [`DynBuf::sub_init`] and friends). A
/// sub-buffer borrows its master mutably, so each buffer has at most one open child. Growing a
/// sub-buffer grows every ancestor, shifting the bytes that follow it.
///
/// Errors are sticky: once a write fails, every following write on the same buffer fails too.
/// A child's error count is added to its master's on `sub_finish`.
///
/// ```rust
/// use tlvbuf::buf::DynBuf;
/// use tlvbuf::pool::HeapPool;
///
/// let mut db = DynBuf::new(&HeapPool, 16);
/// let mut seq = db.begin_constructed_tag();
/// seq.append_asn1_tag(0x02, &[0x05]);
/// seq.end_constructed_tag(0x30).expect("encoding failed");
/// assert_eq!(db.as_slice(), &[0x30, 0x03, 0x02, 0x01, 0x05]);
/// ```
pub struct DynBuf<'b, 'p> {
    arena: ArenaRef<'b, 'p>,
    level: usize,
    done: bool,
}

impl<'p> DynBuf<'p, 'p> {
    /// Allocate a buffer of `capacity` bytes from `pool`
    ///
    /// An allocation failure is recorded in the error count.
    pub fn new(pool: &'p dyn Pool, capacity: usize) -> Self {
        let (root, err) = match FixedBuf::new(pool, capacity) {
            Ok(root) => (root, 0),
            Err(_) => (FixedBuf::empty(), 1),
        };
        DynBuf {
            arena: ArenaRef::Owned(Arena {
                root,
                pool,
                err,
                subs: Vec::new(),
            }),
            level: 0,
            done: false,
        }
    }
}

impl<'b, 'p> DynBuf<'b, 'p> {
    fn arena(&self) -> &Arena<'p> {
        match &self.arena {
            ArenaRef::Owned(a) => a,
            ArenaRef::Borrowed(a) => &**a,
        }
    }

    fn arena_mut(&mut self) -> &mut Arena<'p> {
        match &mut self.arena {
            ArenaRef::Owned(a) => a,
            ArenaRef::Borrowed(a) => &mut **a,
        }
    }

    /// Number of failures recorded so far (0 if the buffer is usable)
    pub fn error_count(&self) -> u32 {
        self.arena().err(self.level)
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    pub fn check_state(&self) -> Result<(), Asn1Error> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Asn1Error::ParseFail)
        }
    }

    /// True for buffers created by `sub_init` and friends
    pub fn is_sub(&self) -> bool {
        self.level > 0
    }

    /// The content written so far
    pub fn as_slice(&self) -> &[u8] {
        self.arena().slice(self.level)
    }

    pub fn len(&self) -> usize {
        self.arena().window(self.level).filled()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn head_room(&self) -> usize {
        self.arena().window(self.level).head_room()
    }

    pub fn tail_room(&self) -> usize {
        self.arena().window(self.level).tail_room()
    }

    /// Reserve `sz` bytes after the content, growing if needed
    pub fn append_size(&mut self, sz: usize) -> Option<&mut [u8]> {
        let level = self.level;
        let arena = self.arena_mut();
        let at = arena.append_size(level, sz)?;
        Some(&mut arena.mem()[at..at + sz])
    }

    pub fn append_bytes(&mut self, data: &[u8]) -> Option<&mut [u8]> {
        let target = self.append_size(data.len())?;
        target.copy_from_slice(data);
        Some(target)
    }

    pub fn append_byte(&mut self, b: u8) -> Option<&mut [u8]> {
        self.append_bytes(&[b])
    }

    pub fn append_str(&mut self, s: &str) -> Option<&mut [u8]> {
        self.append_bytes(s.as_bytes())
    }

    /// Append the UTF-8 encoding of `chr`
    ///
    /// Only code points up to `MAX_UTF8_CODEPOINT` are accepted; anything above is an error.
    pub fn append_utf8(&mut self, chr: u32) -> Option<&mut [u8]> {
        if chr > MAX_UTF8_CODEPOINT {
            trace!("append_utf8: code point {:#x} out of range", chr);
            let level = self.level;
            self.arena_mut().raise(level, 1);
            return None;
        }
        let mut enc = [0u8; 4];
        let n = if chr < 0x80 {
            enc[0] = chr as u8;
            1
        } else if chr <= 0x7FF {
            enc[0] = 0xC0 | (chr >> 6) as u8;
            enc[1] = 0x80 | (chr & 0x3F) as u8;
            2
        } else if chr <= 0xFFFF {
            enc[0] = 0xE0 | (chr >> 12) as u8;
            enc[1] = 0x80 | ((chr >> 6) & 0x3F) as u8;
            enc[2] = 0x80 | (chr & 0x3F) as u8;
            3
        } else {
            enc[0] = 0xF0 | (chr >> 18) as u8;
            enc[1] = 0x80 | ((chr >> 12) & 0x3F) as u8;
            enc[2] = 0x80 | ((chr >> 6) & 0x3F) as u8;
            enc[3] = 0x80 | (chr & 0x3F) as u8;
            4
        };
        self.append_bytes(&enc[..n])
    }

    /// Keep `sz` bytes of head room for a later `prepend_size`
    ///
    /// Only acts while nothing was written, and silently does nothing if the current capacity
    /// cannot hold it (prepending still works, by growing).
    pub fn reserve_prepend(&mut self, sz: usize) {
        let level = self.level;
        let arena = self.arena_mut();
        let w = arena.window(level);
        if arena.err(level) == 0 && w.start == w.end {
            arena.window_mut(level).reserve_prepend(sz);
        }
    }

    /// Reserve `sz` bytes before the content, growing if needed
    pub fn prepend_size(&mut self, sz: usize) -> Option<&mut [u8]> {
        let level = self.level;
        let arena = self.arena_mut();
        let at = arena.prepend_size(level, sz)?;
        Some(&mut arena.mem()[at..at + sz])
    }

    /// Claim `capacity` bytes at the end of this buffer and hand them to a new, empty
    /// sub-buffer
    ///
    /// On failure, the sub-buffer is created in error state and this buffer's error count is
    /// raised.
    pub fn sub_init(&mut self, capacity: usize) -> DynBuf<'_, 'p> {
        let level = self.level;
        let arena = self.arena_mut();
        let win = arena
            .append_size(level, capacity)
            .map(|at| Window::new(at, capacity));
        arena.open(level, win);
        DynBuf {
            arena: ArenaRef::Borrowed(arena),
            level: level + 1,
            done: false,
        }
    }

    /// Hand `length` bytes of existing content, starting `at` bytes into it, to a new empty
    /// sub-buffer that rewrites them
    pub fn sub_init_at(&mut self, at: usize, length: usize) -> DynBuf<'_, 'p> {
        let level = self.level;
        let arena = self.arena_mut();
        let w = arena.window(level);
        let in_range = at
            .checked_add(length)
            .map_or(false, |end| end <= w.filled());
        let win = if arena.err(level) == 0 && in_range {
            Some(Window::new(w.start + at, length))
        } else {
            None
        };
        arena.open(level, win);
        DynBuf {
            arena: ArenaRef::Borrowed(arena),
            level: level + 1,
            done: false,
        }
    }

    /// Finish a sub-buffer: the master now holds exactly what was written, without gaps
    ///
    /// Returns the number of bytes the sub-buffer contributed. On error, the sub-buffer's error
    /// count is added to the master's. Called on an owning buffer, only checks its state.
    pub fn sub_finish(mut self) -> Result<usize, Asn1Error> {
        if self.level == 0 {
            return self.check_state().map(|_| self.len());
        }
        self.done = true;
        let level = self.level;
        self.arena_mut().close(level)
    }

    /// Append a complete TLV: `tag`, DER length of `bytes`, then `bytes`
    pub fn append_asn1_tag(&mut self, tag: u8, bytes: &[u8]) -> Option<&mut [u8]> {
        let hdr = match der_header(tag, bytes.len()) {
            Some(hdr) => hdr,
            None => {
                let level = self.level;
                self.arena_mut().raise(level, 1);
                return None;
            }
        };
        let target = self.append_size(hdr.len() + bytes.len())?;
        target[..hdr.len()].copy_from_slice(hdr.as_slice());
        target[hdr.len()..].copy_from_slice(bytes);
        Some(target)
    }

    /// Open a sub-buffer for the content of a constructed tag
    ///
    /// The header is written by `end_constructed_tag`, once the content length is known.
    pub fn begin_constructed_tag(&mut self) -> DynBuf<'_, 'p> {
        let mut sub = self.sub_init(CONSTRUCTED_TAG_SLACK);
        sub.reserve_prepend(CONSTRUCTED_TAG_HEADROOM);
        sub
    }

    /// Prepend the `tag` and length header to the content, and finish the sub-buffer
    pub fn end_constructed_tag(mut self, tag: u8) -> Result<usize, Asn1Error> {
        match der_header(tag, self.len()) {
            Some(hdr) => {
                if let Some(target) = self.prepend_size(hdr.len()) {
                    target.copy_from_slice(hdr.as_slice());
                }
            }
            None => {
                let level = self.level;
                self.arena_mut().raise(level, 1);
            }
        }
        self.sub_finish()
    }

    /// Take the content out as a minimal allocation, tearing down the buffer
    ///
    /// Fails if the buffer is in error state, or is a sub-buffer.
    pub fn detach(mut self) -> Result<Detached<'p>, Asn1Error> {
        if self.level != 0 {
            return Err(Asn1Error::ArgFail);
        }
        self.check_state()?;
        let root = std::mem::replace(&mut self.arena_mut().root, FixedBuf::empty());
        root.detach()
    }
}

impl<'b, 'p> Drop for DynBuf<'b, 'p> {
    fn drop(&mut self) {
        if self.level == 0 || self.done {
            return;
        }
        // an unfinished sub-buffer leaves its claimed span unfinalised
        let level = self.level;
        let arena = self.arena_mut();
        let err = arena.err(level).max(1);
        arena.raise(level - 1, err);
        arena.subs.truncate(level - 1);
    }
}

impl<'b, 'p> fmt::Debug for DynBuf<'b, 'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynBuf")
            .field("level", &self.level)
            .field("err", &self.error_count())
            .field("head_room", &self.head_room())
            .field("content", &self.as_slice())
            .field("tail_room", &self.tail_room())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{CountingPool, HeapPool};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_append_grows() {
        let pool = CountingPool::unlimited();
        let mut db = DynBuf::new(&pool, 2);
        for i in 0..100u8 {
            assert!(db.append_byte(i).is_some());
        }
        assert_eq!(db.len(), 100);
        assert_eq!(db.as_slice()[99], 99);
        assert!(db.tail_room() >= DYNBUF_GROW - 98);
        drop(db);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.allocations(), pool.releases());
    }

    #[test]
    fn test_prepend_grows_head() {
        let mut db = DynBuf::new(&HeapPool, 4);
        db.append_bytes(b"tail").expect("append failed");
        db.prepend_size(2)
            .expect("prepend failed")
            .copy_from_slice(b"he");
        assert_eq!(db.as_slice(), b"hetail");
        assert!(db.head_room() >= DYNBUF_GROW - 2);
    }

    #[test]
    fn test_reserve_prepend_only_when_empty() {
        let mut db = DynBuf::new(&HeapPool, 8);
        db.reserve_prepend(3);
        assert_eq!(db.head_room(), 3);
        db.append_byte(1);
        db.reserve_prepend(2);
        assert_eq!(db.head_room(), 3);
    }

    #[test]
    fn test_init_failure_is_sticky() {
        let pool = CountingPool::new(4);
        let mut db = DynBuf::new(&pool, 8);
        assert_eq!(db.error_count(), 1);
        assert!(db.append_byte(0).is_none());
        assert!(db.prepend_size(1).is_none());
        assert_eq!(db.detach().err(), Some(Asn1Error::ParseFail));
    }

    #[test]
    fn test_grow_failure_keeps_content() {
        let pool = CountingPool::new(100);
        let mut db = DynBuf::new(&pool, 8);
        db.append_bytes(b"abc").expect("append failed");
        assert!(db.append_size(100).is_none());
        assert_eq!(db.error_count(), 1);
        assert_eq!(db.as_slice(), b"abc");
        // sticky: even a write that fits fails now
        assert!(db.append_byte(b'd').is_none());
        assert_eq!(db.as_slice(), b"abc");
    }

    #[test]
    fn test_utf8() {
        let mut db = DynBuf::new(&HeapPool, 0);
        for &c in &[0x41u32, 0xE9, 0x20AC, 0x1F600] {
            db.append_utf8(c).expect("encoding failed");
        }
        assert_eq!(db.as_slice(), "Aé€😀".as_bytes());
        assert!(db.append_utf8(0x2_0000).is_none());
        assert_eq!(db.error_count(), 1);
    }

    #[test]
    fn test_sub_finish_closes_gap() {
        let mut db = DynBuf::new(&HeapPool, 64);
        db.append_bytes(b"<").expect("append failed");
        let mut sub = db.sub_init(30);
        sub.append_bytes(b"abc").expect("append failed");
        assert_eq!(sub.sub_finish(), Ok(3));
        db.append_bytes(b">").expect("append failed");
        assert_eq!(db.as_slice(), b"<abc>");
    }

    #[test]
    fn test_sub_prepend_into_reserved_head() {
        let mut db = DynBuf::new(&HeapPool, 64);
        let mut sub = db.sub_init(16);
        sub.reserve_prepend(4);
        sub.append_bytes(b"body").expect("append failed");
        sub.prepend_size(2)
            .expect("prepend failed")
            .copy_from_slice(b"hd");
        assert_eq!(sub.sub_finish(), Ok(6));
        assert_eq!(db.as_slice(), b"hdbody");
    }

    #[test]
    fn test_sub_grow_beyond_slack() {
        let pool = CountingPool::unlimited();
        let mut db = DynBuf::new(&pool, 4);
        db.append_bytes(b"AB").expect("append failed");
        {
            let mut sub = db.sub_init(2);
            let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
            sub.append_bytes(&data).expect("append failed");
            assert_eq!(sub.as_slice(), &data[..]);
            assert_eq!(sub.sub_finish(), Ok(1000));
        }
        db.append_bytes(b"YZ").expect("append failed");
        assert_eq!(db.len(), 1004);
        assert_eq!(&db.as_slice()[..3], &[b'A', b'B', 0]);
        assert_eq!(&db.as_slice()[1002..], b"YZ");
        drop(db);
        assert_eq!(pool.outstanding(), 0);
    }

    #[test]
    fn test_nested_sub_init_overflow() {
        let mut db = DynBuf::new(&HeapPool, 16);
        {
            let mut outer = db.sub_init(4);
            {
                let inner = outer.sub_init(usize::MAX);
                assert_eq!(inner.error_count(), 1);
            }
            assert!(outer.error_count() >= 1);
        }
        assert!(db.error_count() >= 1);
    }

    #[test]
    fn test_sub_init_at_rewrites_region() {
        let mut db = DynBuf::new(&HeapPool, 10);
        db.append_bytes(b"0123456789").expect("append failed");
        let mut sub = db.sub_init_at(2, 3);
        sub.append_bytes(b"abcdefghijklmnopqrst")
            .expect("append failed");
        assert_eq!(sub.sub_finish(), Ok(20));
        assert_eq!(db.as_slice(), b"01abcdefghijklmnopqrst56789");
    }

    #[test]
    fn test_sub_init_at_out_of_range() {
        let mut db = DynBuf::new(&HeapPool, 10);
        db.append_bytes(b"0123").expect("append failed");
        let sub = db.sub_init_at(2, 3);
        assert_eq!(sub.error_count(), 1);
        assert_eq!(sub.sub_finish(), Err(Asn1Error::ParseFail));
        // one for the failed open, one folded in by the finish
        assert_eq!(db.error_count(), 2);
    }

    #[test]
    fn test_sub_error_propagates() {
        let mut db = DynBuf::new(&HeapPool, 64);
        {
            let mut outer = db.sub_init(8);
            {
                let mut inner = outer.sub_init(4);
                assert!(inner.append_utf8(0x11_0000).is_none());
                assert_eq!(inner.sub_finish(), Err(Asn1Error::ParseFail));
            }
            assert_eq!(outer.error_count(), 1);
            assert!(outer.sub_finish().is_err());
        }
        assert_eq!(db.error_count(), 1);
        assert!(db.detach().is_err());
    }

    #[test]
    fn test_dropped_sub_raises_master() {
        let mut db = DynBuf::new(&HeapPool, 64);
        {
            let mut sub = db.sub_init(8);
            sub.append_byte(1);
        }
        assert_eq!(db.error_count(), 1);
    }

    #[test]
    fn test_asn1_tag_header_sizes() {
        let mut db = DynBuf::new(&HeapPool, 0);
        let content = vec![0xAAu8; 130];
        db.append_asn1_tag(0x04, &content)
            .expect("append failed");
        assert_eq!(db.len(), 133);
        assert_eq!(&db.as_slice()[..3], &[0x04, 0x81, 0x82]);
        assert_eq!(&db.as_slice()[3..], &content[..]);
    }

    #[test]
    fn test_constructed_tag() {
        let mut db = DynBuf::new(&HeapPool, 8);
        {
            let mut seq = db.begin_constructed_tag();
            seq.append_asn1_tag(0x02, &[0x05]).expect("append failed");
            seq.append_asn1_tag(0x02, &[0xFA]).expect("append failed");
            assert_eq!(seq.end_constructed_tag(0x30), Ok(8));
        }
        assert_eq!(db.as_slice(), &[0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0xFA]);
    }

    #[test]
    fn test_constructed_tag_long_content() {
        let mut db = DynBuf::new(&HeapPool, 8);
        let content = vec![0x11u8; 70000];
        {
            let mut seq = db.begin_constructed_tag();
            seq.append_asn1_tag(0x04, &content).expect("append failed");
            assert_eq!(seq.end_constructed_tag(0x30), Ok(70010));
        }
        let out = db.as_slice();
        assert_eq!(&out[..5], &[0x30, 0x83, 0x01, 0x11, 0x75]);
        assert_eq!(&out[5..10], &[0x04, 0x83, 0x01, 0x11, 0x70]);
        assert_eq!(out.len(), 70010);
    }

    #[test]
    fn test_detach() {
        let pool = CountingPool::unlimited();
        let mut db = DynBuf::new(&pool, 32);
        db.append_str("hello").expect("append failed");
        let d = db.detach().expect("detach failed");
        assert_eq!(d.as_slice(), b"hello");
        assert_eq!(pool.outstanding(), 5);
        drop(d);
        assert_eq!(pool.outstanding(), 0);
    }
}
