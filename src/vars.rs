use crate::error::DecodeError;

/// Interpreter-internal scratch variables.
///
/// Slots are signed 64-bit, created in program order and addressed by
/// 1-based index (the original reserved index 0 for capacity
/// bookkeeping, which a `Vec` makes unnecessary). A slot is written once
/// at creation and is read-only input to later expressions.
#[derive(Debug, Default)]
pub struct VariableStack {
    slots: Vec<i64>,
}

impl VariableStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` in a fresh slot and returns its 1-based index.
    pub fn create(&mut self, value: i64) -> u64 {
        self.slots.push(value);
        self.slots.len() as u64
    }

    /// Looks up a slot by 1-based index.
    pub fn get(&self, index: u64) -> Result<i64, DecodeError> {
        if index == 0 || index > self.slots.len() as u64 {
            return Err(DecodeError::BadVariableIndex {
                index,
                created: self.slots.len(),
            });
        }
        Ok(self.slots[index as usize - 1])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Current bindings for the expression evaluator; `bindings()[0]` is
    /// variable `$1`.
    #[inline]
    pub fn bindings(&self) -> &[i64] {
        &self.slots
    }
}
