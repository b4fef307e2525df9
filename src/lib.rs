//! bufscript
//!
//! A small interpreter for pulling typed values out of raw byte buffers.
//! A decode call takes a buffer (or a bare address with unknown extent)
//! and a short instruction string — `"< u4 b1"` reads a little-endian
//! u32 followed by a one-byte boolean — and returns the decoded values
//! in program order.
//!
//! The instruction set covers endianness selection, cursor movement,
//! repetition, scratch variables usable in later address arithmetic, and
//! grouping repeated reads into one array entry. Bracketed `[...]`
//! operands are delegated verbatim to an injected [`Evaluator`]; the
//! core owns no expression syntax of its own.
//!
//! ```
//! use bufscript::{decode, Item, Value};
//!
//! let buffer = [0x01, 0x00, 0x00, 0x00, 0x2A];
//! let out = decode(&buffer, "< u4 b1").unwrap();
//! assert_eq!(
//!     out,
//!     vec![
//!         Item::Value(Value::Int(1)),
//!         Item::Value(Value::Bool(true)),
//!     ]
//! );
//! ```

pub mod cursor;
pub mod error;
pub mod eval;
pub mod value;
pub mod vars;

mod decode;
mod engine;
mod expr;
mod scanner;

pub use crate::cursor::Cursor;
pub use crate::engine::{decode, decode_raw, decode_with};
pub use crate::error::DecodeError;
pub use crate::eval::{Evaluator, NullEvaluator};
pub use crate::value::{Item, Value};
pub use crate::vars::VariableStack;
