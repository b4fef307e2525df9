use memchr::memchr;

use crate::error::DecodeError;

/// Where the bytes come from.
///
/// `Raw` exists for the unknown-extent mode: the caller hands us a bare
/// address and accepts responsibility for every read the program
/// performs. The pointer never leaves this module; decode routines only
/// ever see slices produced here.
#[derive(Clone, Copy)]
enum Source<'b> {
    Slice(&'b [u8]),
    Raw(*const u8),
}

/// The buffer cursor: a byte source plus the current read position.
///
/// With a known extent every move and read is validated against
/// `[0, len]`; with a raw address nothing is validated and the position
/// may even go negative.
pub struct Cursor<'b> {
    source: Source<'b>,
    pos: i64,
    warned_unbounded: bool,
}

impl<'b> Cursor<'b> {
    pub fn new(bytes: &'b [u8]) -> Self {
        Self {
            source: Source::Slice(bytes),
            pos: 0,
            warned_unbounded: false,
        }
    }

    /// Builds a cursor over a raw address with unknown extent.
    ///
    /// # Safety
    ///
    /// `addr` must stay valid for every read and move the decode program
    /// performs; no bounds checking of any kind happens in this mode.
    pub unsafe fn from_raw(addr: *const u8) -> Cursor<'static> {
        Cursor {
            source: Source::Raw(addr),
            pos: 0,
            warned_unbounded: false,
        }
    }

    /// Current position relative to the buffer start.
    #[inline]
    pub fn offset(&self) -> i64 {
        self.pos
    }

    /// Known extent in bytes, if there is one.
    #[inline]
    pub fn extent(&self) -> Option<usize> {
        match self.source {
            Source::Slice(s) => Some(s.len()),
            Source::Raw(_) => None,
        }
    }

    /// Moves the cursor by `delta` bytes (negative retreats). The
    /// resulting position must stay within `[0, len]` when the extent is
    /// known; one-past-the-end is a legal resting position.
    pub fn move_by(&mut self, delta: i64) -> Result<(), DecodeError> {
        let next = self.pos.checked_add(delta).ok_or(DecodeError::OutOfBuffer {
            offset: self.pos,
            len: 0,
            end: self.extent().unwrap_or(0),
        })?;
        if let Source::Slice(s) = self.source {
            if next < 0 || next as u64 > s.len() as u64 {
                return Err(DecodeError::OutOfBuffer {
                    offset: next,
                    len: 0,
                    end: s.len(),
                });
            }
        }
        self.pos = next;
        Ok(())
    }

    /// Returns a read-only view of the next `len` bytes without moving.
    pub fn peek(&self, len: usize) -> Result<&'b [u8], DecodeError> {
        match self.source {
            Source::Slice(s) => {
                let start = self.pos;
                if start < 0
                    || len as u64 > s.len() as u64
                    || start as u64 > (s.len() - len) as u64
                {
                    return Err(DecodeError::OutOfBuffer {
                        offset: start,
                        len,
                        end: s.len(),
                    });
                }
                let start = start as usize;
                Ok(&s[start..start + len])
            }
            Source::Raw(addr) => {
                // Upheld by the `from_raw` contract.
                Ok(unsafe { std::slice::from_raw_parts(addr.offset(self.pos as isize), len) })
            }
        }
    }

    /// `peek` + advance past the returned bytes.
    pub fn take(&mut self, len: usize) -> Result<&'b [u8], DecodeError> {
        let bytes = self.peek(len)?;
        self.pos += len as i64;
        Ok(bytes)
    }

    /// Distance from the current position to the next NUL byte
    /// (exclusive). With a known extent a missing terminator is
    /// `OutOfBuffer`; with a raw address the scan is unbounded.
    pub fn find_nul(&mut self) -> Result<usize, DecodeError> {
        match self.source {
            Source::Slice(s) => {
                let start = self.pos;
                if start < 0 || start as u64 > s.len() as u64 {
                    return Err(DecodeError::OutOfBuffer {
                        offset: start,
                        len: 1,
                        end: s.len(),
                    });
                }
                let tail = &s[start as usize..];
                memchr(0, tail).ok_or(DecodeError::OutOfBuffer {
                    offset: start,
                    len: tail.len() + 1,
                    end: s.len(),
                })
            }
            Source::Raw(addr) => {
                if !self.warned_unbounded {
                    log::warn!("unbounded NUL scan over an unknown-extent buffer");
                    self.warned_unbounded = true;
                }
                let mut n = 0usize;
                // Upheld by the `from_raw` contract.
                unsafe {
                    let base = addr.offset(self.pos as isize);
                    while *base.add(n) != 0 {
                        n += 1;
                    }
                }
                Ok(n)
            }
        }
    }
}
