use crate::error::Asn1Error;
use crate::pool::Pool;
use std::fmt;
use std::fmt::Write;

/// Cursor layout of a region: `origin <= start <= end <= origin + size`
///
/// Offsets are absolute positions in the backing storage, so the same type describes both
/// an owning buffer (origin 0) and a sub-buffer living inside its master.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Window {
    pub origin: usize,
    pub start: usize,
    pub end: usize,
    pub size: usize,
}

impl Window {
    pub fn new(origin: usize, size: usize) -> Self {
        Window {
            origin,
            start: origin,
            end: origin,
            size,
        }
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.origin + self.size
    }

    #[inline]
    pub fn head_room(&self) -> usize {
        self.start - self.origin
    }

    #[inline]
    pub fn tail_room(&self) -> usize {
        self.limit() - self.end
    }

    #[inline]
    pub fn filled(&self) -> usize {
        self.end - self.start
    }

    /// Extend `end` by `sz`, returning the old `end`, if capacity allows
    pub fn append_size(&mut self, sz: usize) -> Option<usize> {
        let new_end = self.end.checked_add(sz)?;
        if new_end > self.limit() {
            return None;
        }
        let loc = self.end;
        self.end = new_end;
        Some(loc)
    }

    /// Carve head room while the window is still empty. Silently does nothing without room.
    pub fn reserve_prepend(&mut self, sz: usize) {
        if self.start != self.end {
            return;
        }
        if let Some(new_end) = self.end.checked_add(sz) {
            if new_end <= self.limit() {
                self.start += sz;
                self.end += sz;
            }
        }
    }

    /// Move `start` back by `sz`, returning the new `start`, if head room allows
    pub fn prepend_size(&mut self, sz: usize) -> Option<usize> {
        if self.head_room() < sz {
            return None;
        }
        self.start -= sz;
        Some(self.start)
    }

    pub fn check(&self) {
        debug_assert!(self.origin <= self.start);
        debug_assert!(self.start <= self.end);
        debug_assert!(self.end <= self.limit());
    }
}

enum Storage<'a> {
    Empty,
    Pooled { mem: Box<[u8]>, pool: &'a dyn Pool },
    Static(&'a [u8]),
}

/// A flat region with independent read (`start`) and write (`end`) cursors
///
/// The region is either allocated from a [`Pool`] (and released to it on drop) or a view
/// over borrowed memory, which is read-only and never released.
pub struct FixedBuf<'a> {
    storage: Storage<'a>,
    win: Window,
}

impl<'a> FixedBuf<'a> {
    /// A buffer without memory (capacity 0)
    pub fn empty() -> Self {
        FixedBuf {
            storage: Storage::Empty,
            win: Window::default(),
        }
    }

    /// Allocate `capacity` bytes, with both cursors at the origin
    pub fn new(pool: &'a dyn Pool, capacity: usize) -> Result<Self, Asn1Error> {
        let mem = pool.allocate(capacity).ok_or(Asn1Error::MemFail)?;
        Ok(FixedBuf {
            storage: Storage::Pooled { mem, pool },
            win: Window::new(0, capacity),
        })
    }

    /// Copy `data` into a newly allocated buffer, the whole copy being unread content
    pub fn from_bytes(pool: &'a dyn Pool, data: &[u8]) -> Result<Self, Asn1Error> {
        // at least one byte, so an empty copy is still a real allocation
        let mut mem = pool
            .allocate(data.len().max(1))
            .ok_or(Asn1Error::MemFail)?;
        mem[..data.len()].copy_from_slice(data);
        let mut win = Window::new(0, data.len());
        win.end = data.len();
        Ok(FixedBuf {
            storage: Storage::Pooled { mem, pool },
            win,
        })
    }

    /// Wrap borrowed memory as a read-only view, the whole of `data` being unread content
    pub fn from_static_bytes(data: &'a [u8]) -> Self {
        let mut win = Window::new(0, data.len());
        win.end = data.len();
        FixedBuf {
            storage: Storage::Static(data),
            win,
        }
    }

    /// Release the memory (if owned) and reset to an empty buffer
    pub fn uninit(&mut self) {
        if let Storage::Pooled { mem, pool } = std::mem::replace(&mut self.storage, Storage::Empty)
        {
            pool.release(mem);
        }
        self.win = Window::default();
    }

    /// Move the unread content to a fresh minimal allocation, and tear down this buffer
    ///
    /// Borrowed views have no pool to allocate from, and fail with `ArgFail`.
    pub fn detach(mut self) -> Result<Detached<'a>, Asn1Error> {
        let pool = match self.storage {
            Storage::Pooled { pool, .. } => pool,
            _ => return Err(Asn1Error::ArgFail),
        };
        let len = self.len();
        let res = match pool.allocate(len.max(1)) {
            Some(mut mem) => {
                mem[..len].copy_from_slice(self.as_slice());
                Ok(Detached {
                    mem: Some(mem),
                    len,
                    pool,
                })
            }
            None => Err(Asn1Error::MemFail),
        };
        self.uninit();
        res
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.win.size
    }

    /// Length of the unread content
    #[inline]
    pub fn len(&self) -> usize {
        self.win.filled()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.win.start == self.win.end
    }

    #[inline]
    pub fn head_room(&self) -> usize {
        self.win.head_room()
    }

    #[inline]
    pub fn tail_room(&self) -> usize {
        self.win.tail_room()
    }

    pub fn is_static(&self) -> bool {
        matches!(self.storage, Storage::Static(_))
    }

    pub(crate) fn storage(&self) -> &[u8] {
        match &self.storage {
            Storage::Empty => &[],
            Storage::Pooled { mem, .. } => &mem[..],
            Storage::Static(data) => *data,
        }
    }

    /// Writable storage; borrowed views have none
    pub(crate) fn storage_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.storage {
            Storage::Pooled { mem, .. } => Some(&mut mem[..]),
            Storage::Empty => {
                let empty: &mut [u8] = &mut [];
                Some(empty)
            }
            Storage::Static(_) => None,
        }
    }

    pub(crate) fn window(&self) -> Window {
        self.win
    }

    pub(crate) fn window_mut(&mut self) -> &mut Window {
        &mut self.win
    }

    /// The unread content `[start, end)`
    pub fn as_slice(&self) -> &[u8] {
        &self.storage()[self.win.start..self.win.end]
    }

    /// Reserve `size` bytes after the content, without growing
    pub fn append_reserve(&mut self, size: usize) -> Option<&mut [u8]> {
        if self.is_static() {
            return None;
        }
        let mut win = self.win;
        let at = win.append_size(size)?;
        self.win = win;
        self.storage_mut().map(|mem| &mut mem[at..at + size])
    }

    /// Move both cursors forward by `size` while the buffer is empty, keeping head room
    /// for a later `prepend_size`. Does nothing if the capacity does not allow it.
    pub fn prepend_reserve(&mut self, size: usize) {
        self.win.reserve_prepend(size);
    }

    /// Reserve `size` bytes in the head room, just before the content
    pub fn prepend_size(&mut self, size: usize) -> Option<&mut [u8]> {
        if self.is_static() {
            return None;
        }
        let mut win = self.win;
        let at = win.prepend_size(size)?;
        self.win = win;
        self.storage_mut().map(|mem| &mut mem[at..at + size])
    }

    /// Consume `n` bytes of content from the front
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.len());
        self.win.start += n.min(self.len());
    }

    /// The unread content of a borrowed view, with the lifetime of the borrowed memory.
    /// Empty for owned buffers.
    pub(crate) fn view_slice(&self) -> &'a [u8] {
        match self.storage {
            Storage::Static(data) => &data[self.win.start..self.win.end],
            _ => &[],
        }
    }

    /// Hexadecimal dump of the unread content
    pub fn as_hex(&self) -> String {
        let mut s = String::with_capacity(self.len() * 2);
        for b in self.as_slice() {
            let _ = write!(s, "{:02x}", b);
        }
        s
    }
}

impl<'a> Drop for FixedBuf<'a> {
    fn drop(&mut self) {
        self.uninit();
    }
}

impl<'a> PartialEq for FixedBuf<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a> fmt::Debug for FixedBuf<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBuf")
            .field("head_room", &self.head_room())
            .field("content", &self.as_hex())
            .field("tail_room", &self.tail_room())
            .field("static", &self.is_static())
            .finish()
    }
}

/// Content taken out of a buffer by `detach`, released to its pool on drop
pub struct Detached<'a> {
    mem: Option<Box<[u8]>>,
    len: usize,
    pool: &'a dyn Pool,
}

impl<'a> Detached<'a> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.mem {
            Some(mem) => &mem[..self.len],
            None => &[],
        }
    }

    /// Copy out to a `Vec`, giving the memory back to the pool
    pub fn into_vec(self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

impl<'a> Drop for Detached<'a> {
    fn drop(&mut self) {
        if let Some(mem) = self.mem.take() {
            self.pool.release(mem);
        }
    }
}

impl<'a> fmt::Debug for Detached<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Detached").field(&self.as_slice()).finish()
    }
}
