use std::fmt;

use crate::error::DecodeError;

/// A single decoded value.
///
/// Strings come out as raw bytes: the buffer's text encoding is
/// source-dependent, so we keep bytes to avoid guessing. Converting them
/// to host strings is the embedding layer's job.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
}

impl Value {
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "{s:?}"),
                Err(_) => write!(f, "bytes(len={})", b.len()),
            },
        }
    }
}

/// One entry of the decode output: a scalar, or one closed capture array.
///
/// Arrays cannot nest, so the payload of `Array` is a flat `Vec<Value>`.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Value(Value),
    Array(Vec<Value>),
}

impl Item {
    #[inline]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Item::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for Item {
    fn from(v: Value) -> Self {
        Item::Value(v)
    }
}

/// Append-only output sink.
///
/// While an array capture is open, emitted values land in the pending
/// array instead of the flat sequence; the array becomes one `Item` when
/// it is closed. Nothing already appended is ever mutated.
#[derive(Debug, Default)]
pub(crate) struct Output {
    items: Vec<Item>,
    pending: Option<Vec<Value>>,
}

impl Output {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn in_array(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub(crate) fn push(&mut self, value: Value) {
        match &mut self.pending {
            Some(arr) => arr.push(value),
            None => self.items.push(Item::Value(value)),
        }
    }

    pub(crate) fn open_array(&mut self, pos: usize) -> Result<(), DecodeError> {
        if self.pending.is_some() {
            return Err(DecodeError::NestedArray { pos });
        }
        self.pending = Some(Vec::new());
        Ok(())
    }

    pub(crate) fn close_array(&mut self, pos: usize) -> Result<(), DecodeError> {
        match self.pending.take() {
            Some(arr) => {
                self.items.push(Item::Array(arr));
                Ok(())
            }
            None => Err(DecodeError::UnmatchedClose { pos }),
        }
    }

    /// Consumes the sink at end of program.
    pub(crate) fn finish(self) -> Result<Vec<Item>, DecodeError> {
        if self.pending.is_some() {
            return Err(DecodeError::UnclosedArray);
        }
        Ok(self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_outside_and_inside_array() {
        let mut out = Output::new();
        out.push(Value::Int(1));
        out.open_array(0).unwrap();
        out.push(Value::Int(2));
        out.push(Value::Int(3));
        out.close_array(4).unwrap();
        let items = out.finish().unwrap();
        assert_eq!(
            items,
            vec![
                Item::Value(Value::Int(1)),
                Item::Array(vec![Value::Int(2), Value::Int(3)]),
            ]
        );
    }

    #[test]
    fn nested_open_is_rejected() {
        let mut out = Output::new();
        out.open_array(0).unwrap();
        assert!(matches!(
            out.open_array(1),
            Err(DecodeError::NestedArray { pos: 1 })
        ));
    }

    #[test]
    fn stray_close_is_rejected() {
        let mut out = Output::new();
        assert!(matches!(
            out.close_array(7),
            Err(DecodeError::UnmatchedClose { pos: 7 })
        ));
    }

    #[test]
    fn open_at_end_is_rejected() {
        let mut out = Output::new();
        out.open_array(0).unwrap();
        assert!(matches!(out.finish(), Err(DecodeError::UnclosedArray)));
    }
}
