use crate::cursor::Cursor;
use crate::decode::{
    read_fixed, read_lstring, read_zstring, unpack_f32, unpack_f64, unpack_int, MAX_INT_SIZE,
};
use crate::error::DecodeError;
use crate::eval::{Evaluator, NullEvaluator};
use crate::expr;
use crate::scanner::Scanner;
use crate::value::{Item, Output, Value};
use crate::vars::VariableStack;

/// Repeat ceiling outside an open array capture. Inside one the count is
/// unbounded; the asymmetry is inherited from the original interpreter.
const REPEAT_LIMIT: u64 = 127;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VarMode {
    /// `$`: store the first decoded value in a new slot, do not emit it.
    Create,
    /// `&`: store the first decoded value in a new slot and emit it too.
    CreateEmit,
}

/// The single mutable state threaded through one decode call.
///
/// Created fresh per call and consumed by `run`; nothing survives a
/// failure.
struct ExecutionState<'b, 'p, E> {
    cursor: Cursor<'b>,
    scanner: Scanner<'p>,
    vars: VariableStack,
    eval: E,
    output: Output,

    /// Little-endian reads (the default).
    little: bool,
    /// One-shot: the next read's first element does not advance.
    hold: bool,
    /// Pending repeat count, consumed as a multiplier by moves and reset
    /// to 1 by the next read opcode.
    repeat: u64,
    /// Set between `*` and the read that consumes it; a second `*` in
    /// that window is an error.
    repeat_armed: bool,
}

impl<'b, 'p, E: Evaluator> ExecutionState<'b, 'p, E> {
    fn new(cursor: Cursor<'b>, program: &'p str, eval: E) -> Self {
        Self {
            cursor,
            scanner: Scanner::new(program),
            vars: VariableStack::new(),
            eval,
            output: Output::new(),
            little: true,
            hold: false,
            repeat: 1,
            repeat_armed: false,
        }
    }

    fn run(mut self) -> Result<Vec<Item>, DecodeError> {
        while let Some((pos, op)) = self.scanner.next_opcode() {
            self.dispatch(pos, op)?;
        }
        self.output.finish()
    }

    fn dispatch(&mut self, pos: usize, op: u8) -> Result<(), DecodeError> {
        match op {
            b'>' => self.little = false,
            b'<' => self.little = true,
            b'=' => self.hold = true,

            b'{' => self.output.open_array(pos)?,
            b'}' => self.output.close_array(pos)?,

            b'+' => self.op_move(1)?,
            b'-' => self.op_move(-1)?,
            b'*' => self.op_repeat(pos)?,

            b'@' | b'^' => self.output.push(Value::Int(self.cursor.offset())),

            b'$' => self.op_create_var(VarMode::Create)?,
            b'&' => self.op_create_var(VarMode::CreateEmit)?,

            b'b' => self.op_read_bool()?,
            b'i' => self.op_read_int(true, None)?,
            b'u' => self.op_read_int(false, None)?,
            b'f' => self.op_read_float(false)?,
            b'd' => self.op_read_float(true)?,
            b's' => self.op_read_string()?,
            b'c' => self.op_read_fixed()?,

            other => {
                return Err(DecodeError::UnknownOpcode {
                    opcode: other as char,
                    pos,
                })
            }
        }
        Ok(())
    }

    // ---- operand helpers --------------------------------------------------

    fn resolve_operand(&mut self, default: i64) -> Result<i64, DecodeError> {
        expr::resolve(&mut self.scanner, &self.vars, &mut self.eval, default)
    }

    /// Attached integer size argument, validated against 1..=16.
    fn int_size(&mut self, opcode: char, default: u64) -> Result<usize, DecodeError> {
        let size = self.scanner.digits(default);
        if size < 1 || size > MAX_INT_SIZE as u64 {
            return Err(DecodeError::InvalidSize {
                opcode,
                size: i64::try_from(size).unwrap_or(i64::MAX),
            });
        }
        Ok(size as usize)
    }

    /// Consumes the pending repeat count for a read opcode.
    fn take_repeat(&mut self) -> u64 {
        self.repeat_armed = false;
        std::mem::replace(&mut self.repeat, 1)
    }

    /// Whether element `k` of a read advances the cursor. The hold flag
    /// is consumed by the first element only; later repeats advance as
    /// usual (from the position the held element left untouched).
    fn element_advances(&mut self, k: u64) -> bool {
        if k == 0 {
            !std::mem::take(&mut self.hold)
        } else {
            true
        }
    }

    // ---- opcode handlers --------------------------------------------------

    fn op_move(&mut self, sign: i64) -> Result<(), DecodeError> {
        let n = self.resolve_operand(1)?;
        let total = n
            .checked_mul(self.repeat as i64)
            .and_then(|t| t.checked_mul(sign))
            .ok_or(DecodeError::OutOfBuffer {
                offset: self.cursor.offset(),
                len: 0,
                end: self.cursor.extent().unwrap_or(0),
            })?;
        self.cursor.move_by(total)
    }

    fn op_repeat(&mut self, pos: usize) -> Result<(), DecodeError> {
        if self.repeat_armed {
            return Err(DecodeError::RepeatAlreadySet { pos });
        }
        let count = self.resolve_operand(1)?;
        let limit = if self.output.in_array() {
            u64::MAX
        } else {
            REPEAT_LIMIT
        };
        if count < 1 || count as u64 > limit {
            return Err(DecodeError::InvalidRepeat { count, limit });
        }
        self.repeat = count as u64;
        self.repeat_armed = true;
        Ok(())
    }

    fn op_create_var(&mut self, mode: VarMode) -> Result<(), DecodeError> {
        match self.scanner.next_opcode() {
            Some((_, b'i')) => self.op_read_int(true, Some(mode)),
            Some((_, b'u')) => self.op_read_int(false, Some(mode)),
            Some((pos, other)) => Err(DecodeError::ExpectedIntegerRead {
                found: format!("'{}'", other as char),
                pos,
            }),
            None => Err(DecodeError::ExpectedIntegerRead {
                found: "end of program".to_owned(),
                pos: self.scanner.position(),
            }),
        }
    }

    fn op_read_int(&mut self, signed: bool, mut var: Option<VarMode>) -> Result<(), DecodeError> {
        let opcode = if signed { 'i' } else { 'u' };
        let size = self.int_size(opcode, 4)?;
        let count = self.take_repeat();
        for k in 0..count {
            let advance = self.element_advances(k);
            let v = unpack_int(&mut self.cursor, self.little, size, signed, advance)?;
            if k == 0 {
                if let Some(mode) = var.take() {
                    self.vars.create(v);
                    if mode == VarMode::CreateEmit {
                        self.output.push(Value::Int(v));
                    }
                    continue;
                }
            }
            self.output.push(Value::Int(v));
        }
        Ok(())
    }

    fn op_read_bool(&mut self) -> Result<(), DecodeError> {
        let size = self.int_size('b', 1)?;
        let count = self.take_repeat();
        for k in 0..count {
            let advance = self.element_advances(k);
            let v = unpack_int(&mut self.cursor, self.little, size, false, advance)?;
            self.output.push(Value::Bool(v != 0));
        }
        Ok(())
    }

    fn op_read_float(&mut self, double: bool) -> Result<(), DecodeError> {
        let (opcode, width) = if double { ('d', 8u64) } else { ('f', 4u64) };
        if let Some(size) = self.scanner.try_digits() {
            if size != width {
                return Err(DecodeError::InvalidSize {
                    opcode,
                    size: i64::try_from(size).unwrap_or(i64::MAX),
                });
            }
        }
        let count = self.take_repeat();
        for k in 0..count {
            let advance = self.element_advances(k);
            let v = if double {
                unpack_f64(&mut self.cursor, self.little, advance)?
            } else {
                unpack_f32(&mut self.cursor, self.little, advance)?
            };
            self.output.push(Value::Float(v));
        }
        Ok(())
    }

    fn op_read_string(&mut self) -> Result<(), DecodeError> {
        let size = self.scanner.digits(0);
        if !matches!(size, 0 | 1 | 2 | 4) {
            return Err(DecodeError::InvalidSize {
                opcode: 's',
                size: i64::try_from(size).unwrap_or(i64::MAX),
            });
        }
        let count = self.take_repeat();
        for k in 0..count {
            let advance = self.element_advances(k);
            let bytes = if size == 0 {
                read_zstring(&mut self.cursor, advance)?
            } else {
                read_lstring(&mut self.cursor, self.little, size as usize, advance)?
            };
            self.output.push(Value::Bytes(bytes));
        }
        Ok(())
    }

    fn op_read_fixed(&mut self) -> Result<(), DecodeError> {
        let len = self.resolve_operand(0)?;
        if len < 1 {
            return Err(DecodeError::InvalidSize {
                opcode: 'c',
                size: len,
            });
        }
        let count = self.take_repeat();
        for k in 0..count {
            let advance = self.element_advances(k);
            let bytes = read_fixed(&mut self.cursor, len as usize, advance)?;
            self.output.push(Value::Bytes(bytes));
        }
        Ok(())
    }
}

/// Decodes `buffer` by running `program` against it. Programs that use
/// `[...]` operands need [`decode_with`] and a real evaluator.
pub fn decode(buffer: &[u8], program: &str) -> Result<Vec<Item>, DecodeError> {
    decode_with(buffer, program, &mut NullEvaluator)
}

/// Decodes `buffer` with an explicit expression-evaluator collaborator.
pub fn decode_with<E: Evaluator>(
    buffer: &[u8],
    program: &str,
    eval: &mut E,
) -> Result<Vec<Item>, DecodeError> {
    log::trace!(
        "decode: program of {} bytes over buffer of {} bytes",
        program.len(),
        buffer.len()
    );
    ExecutionState::new(Cursor::new(buffer), program, eval).run()
}

/// Decodes from a raw address with unknown extent. No bounds checks of
/// any kind are performed.
///
/// # Safety
///
/// `addr` must stay valid for every read and cursor move the program
/// performs, including the full span of any zero-terminated scan.
pub unsafe fn decode_raw<E: Evaluator>(
    addr: *const u8,
    program: &str,
    eval: &mut E,
) -> Result<Vec<Item>, DecodeError> {
    ExecutionState::new(Cursor::from_raw(addr), program, eval).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ints(items: &[Item]) -> Vec<i64> {
        items
            .iter()
            .map(|i| i.as_value().and_then(Value::as_int).unwrap())
            .collect()
    }

    #[test]
    fn default_endianness_is_little() {
        let out = decode(&[0x01, 0x00, 0x00, 0x00], "u4").unwrap();
        assert_eq!(ints(&out), vec![1]);
    }

    #[test]
    fn hold_applies_to_first_element_only() {
        // `=` keeps the cursor in place, so u2 reads offset 0 twice:
        // once held, once advancing.
        let out = decode(&[0x01, 0x00, 0x02, 0x00], "*2 = u2 u2").unwrap();
        assert_eq!(ints(&out), vec![1, 1, 2]);
    }

    #[test]
    fn repeat_multiplies_moves_and_is_reset_by_reads() {
        // *3 doubles up: the +1 move advances 3, then u1 reads 3 bytes,
        // then a bare u1 reads one (repeat was reset).
        let data = [9, 9, 9, 1, 2, 3, 4];
        let out = decode(&data, "*3 +1 u1 u1").unwrap();
        assert_eq!(ints(&out), vec![1, 2, 3, 4]);
    }

    #[test]
    fn double_arm_is_rejected() {
        let err = decode(&[0u8; 8], "*2 *3 u1").unwrap_err();
        assert!(matches!(err, DecodeError::RepeatAlreadySet { .. }));
    }

    #[test]
    fn offset_opcodes_do_not_touch_repeat() {
        let out = decode(&[5, 6], "*2 @ u1").unwrap();
        assert_eq!(ints(&out), vec![0, 5, 6]);
    }

    #[test]
    fn unknown_opcode() {
        let err = decode(&[0u8; 4], "u4 q").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::UnknownOpcode { opcode: 'q', pos: 3 }
        ));
    }

    #[test]
    fn raw_decode_matches_sized_decode() {
        let data = [0x2A, 0x00, 0x01, b'h', b'i', 0x00];
        let sized = decode(&data, "u2 b1 s").unwrap();
        let raw = unsafe { decode_raw(data.as_ptr(), "u2 b1 s", &mut NullEvaluator) }.unwrap();
        assert_eq!(sized, raw);
    }
}
