use crate::error::DecodeError;

/// Greedy decimal parse stops before a digit that would push the
/// accumulator past this bound, mirroring the original reader.
const DIGIT_CONTINUE_MAX: u64 = (u64::MAX - 9) / 10;

/// Token scanner over the instruction string.
///
/// Advances its own position independently of the buffer cursor. Opcodes
/// are single ASCII bytes; numeric arguments must be attached directly to
/// their opcode (whitespace is only skipped *between* tokens).
pub struct Scanner<'p> {
    src: &'p str,
    pos: usize,
}

impl<'p> Scanner<'p> {
    pub fn new(program: &'p str) -> Self {
        Self { src: program, pos: 0 }
    }

    #[inline]
    fn bytes(&self) -> &'p [u8] {
        self.src.as_bytes()
    }

    /// Current byte position within the program.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    #[inline]
    pub fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                _ => break,
            }
        }
    }

    /// Returns and consumes the next opcode byte together with its
    /// position in the program, or `None` at end of program.
    pub fn next_opcode(&mut self) -> Option<(usize, u8)> {
        self.skip_whitespace();
        let pos = self.pos;
        let c = self.peek()?;
        self.pos += 1;
        Some((pos, c))
    }

    /// Consumes an attached decimal digit run, if any.
    pub fn try_digits(&mut self) -> Option<u64> {
        let mut seen = false;
        let mut a: u64 = 0;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            seen = true;
            a = a * 10 + (c - b'0') as u64;
            self.pos += 1;
            if a > DIGIT_CONTINUE_MAX {
                break;
            }
        }
        seen.then_some(a)
    }

    /// Like `try_digits`, with a caller default when no digits follow.
    #[inline]
    pub fn digits(&mut self, default: u64) -> u64 {
        self.try_digits().unwrap_or(default)
    }

    /// Consumes a `[...]` group if one starts here, returning the bracket
    /// contents verbatim (not including the brackets).
    pub fn try_bracket(&mut self) -> Result<Option<&'p str>, DecodeError> {
        if self.peek() != Some(b'[') {
            return Ok(None);
        }
        let open = self.pos;
        self.pos += 1;
        match self.bytes()[self.pos..].iter().position(|&c| c == b']') {
            Some(n) => {
                let inner = &self.src[self.pos..self.pos + n];
                self.pos += n + 1;
                Ok(Some(inner))
            }
            None => Err(DecodeError::MissingBracket { pos: open }),
        }
    }
}
