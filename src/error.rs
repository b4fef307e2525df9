/// Everything that can abort a decode.
///
/// A decode stops at the first failure; no partial output survives. The
/// variants carry enough context for the embedding layer to produce a
/// useful message without re-running the program.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// A read or cursor move would leave the known extent.
    /// `offset` is the attempted position (relative to buffer start,
    /// possibly negative for retreats), `len` the requested read length.
    #[error("read of {len} bytes at offset {offset} exceeds buffer of {end} bytes")]
    OutOfBuffer { offset: i64, len: usize, end: usize },

    #[error("invalid size {size} for opcode '{opcode}'")]
    InvalidSize { opcode: char, size: i64 },

    #[error("repeat count {count} out of range [1, {limit}]")]
    InvalidRepeat { count: i64, limit: u64 },

    #[error("variable ${index} referenced but only {created} variable(s) exist")]
    BadVariableIndex { index: u64, created: usize },

    #[error("unknown opcode '{opcode}' at byte {pos} of the program")]
    UnknownOpcode { opcode: char, pos: usize },

    #[error("array capture opened at byte {pos} while another is still open")]
    NestedArray { pos: usize },

    #[error("'}}' at byte {pos} without an open array capture")]
    UnmatchedClose { pos: usize },

    #[error("program ended with an open array capture")]
    UnclosedArray,

    /// `$`/`&` must be followed by an `i` or `u` read.
    #[error("expected an integer read after a variable-creation token, found {found} at byte {pos}")]
    ExpectedIntegerRead { found: String, pos: usize },

    #[error("'*' at byte {pos} but a repeat count is already armed")]
    RepeatAlreadySet { pos: usize },

    #[error("unterminated '[' expression at byte {pos}")]
    MissingBracket { pos: usize },

    #[error("{size}-byte integer does not fit into 64 bits")]
    IntegerOverflow { size: usize },

    #[error("expression `{expr}` failed to evaluate: {msg}")]
    Eval { expr: String, msg: String },
}
