use crate::num::{NumError, ScriptNum};
use std::fmt;
use std::ops::Deref;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum StackError {
    #[error("attempt to read from an empty stack")]
    EmptyStack,
    #[error("operation requires {required} stack items, but only {depth} are present")]
    InvalidIndex { required: usize, depth: usize },
    #[error("negative stack index {0}")]
    NegativeIndex(i64),
    #[error(transparent)]
    Num(#[from] NumError),
}

type Result<T> = std::result::Result<T, StackError>;

/// Byte sequence stack used for both the data and the alt stack.
///
/// Items are indexed from the top, `peek(0)` being the last pushed item.
/// Numbers read from the stack honor the minimal encoding setting the stack
/// was created with.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stack {
    items: Vec<Vec<u8>>,
    minimal_data: bool,
}

impl From<Vec<Vec<u8>>> for Stack {
    fn from(items: Vec<Vec<u8>>) -> Self {
        Self {
            items,
            minimal_data: false,
        }
    }
}

impl Deref for Stack {
    type Target = [Vec<u8>];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items = self
            .items
            .iter()
            .map(|item| {
                if item.is_empty() {
                    "<empty>".to_string()
                } else {
                    hex::encode(item)
                }
            })
            .collect::<Vec<_>>();
        write!(f, "[{}]", items.join(", "))
    }
}

impl Stack {
    pub fn new(minimal_data: bool) -> Self {
        Self {
            items: Vec::new(),
            minimal_data,
        }
    }

    pub fn depth(&self) -> usize {
        self.items.len()
    }

    pub fn set(&mut self, items: Vec<Vec<u8>>) {
        self.items = items;
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn check_depth(&self, required: usize) -> Result<()> {
        if self.items.len() < required {
            return Err(StackError::InvalidIndex {
                required,
                depth: self.items.len(),
            });
        }
        Ok(())
    }

    // Position in `items` of the item `idx` places below the top.
    fn position(&self, idx: usize) -> Result<usize> {
        self.check_depth(idx + 1)?;
        Ok(self.items.len() - idx - 1)
    }

    pub fn push(&mut self, item: Vec<u8>) {
        self.items.push(item);
    }

    pub fn push_num(&mut self, num: impl Into<ScriptNum>) {
        self.items.push(num.into().to_bytes());
    }

    pub fn push_bool(&mut self, value: bool) {
        self.items.push(if value { vec![1] } else { Vec::new() });
    }

    pub fn pop(&mut self) -> Result<Vec<u8>> {
        self.items.pop().ok_or(StackError::EmptyStack)
    }

    pub fn pop_bool(&mut self) -> Result<bool> {
        self.pop().map(|item| as_bool(&item))
    }

    /// Pops a number of at most [`ScriptNum::MAX_NUM_SIZE`] bytes.
    pub fn pop_num(&mut self) -> Result<ScriptNum> {
        let item = self.pop()?;
        Ok(ScriptNum::from_bytes(
            &item,
            self.minimal_data,
            ScriptNum::MAX_NUM_SIZE,
        )?)
    }

    /// Returns the item `idx` places below the top.
    pub fn peek(&self, idx: usize) -> Result<&[u8]> {
        if self.items.is_empty() {
            return Err(StackError::EmptyStack);
        }
        let pos = self.position(idx)?;
        Ok(&self.items[pos])
    }

    pub fn peek_bool(&self) -> Result<bool> {
        self.peek(0).map(as_bool)
    }

    /// Reads the top item as a number of at most `max_size` bytes, leaving it
    /// on the stack.
    pub fn peek_num(&self, max_size: usize) -> Result<ScriptNum> {
        Ok(ScriptNum::from_bytes(
            self.peek(0)?,
            self.minimal_data,
            max_size,
        )?)
    }

    /// `[... x1 x2] -> [...]` for `n = 2`.
    pub fn drop_n(&mut self, n: usize) -> Result<()> {
        self.check_depth(n)?;
        self.items.truncate(self.items.len() - n);
        Ok(())
    }

    /// `[x1 x2] -> [x1 x2 x1 x2]` for `n = 2`.
    pub fn dup_n(&mut self, n: usize) -> Result<()> {
        self.check_depth(n)?;
        let start = self.items.len() - n;
        self.items.extend_from_within(start..);
        Ok(())
    }

    /// `[x1 x2 x3 x4] -> [x1 x2 x3 x4 x1 x2]` for `n = 2`.
    pub fn over_n(&mut self, n: usize) -> Result<()> {
        self.check_depth(2 * n)?;
        let start = self.items.len() - 2 * n;
        self.items.extend_from_within(start..start + n);
        Ok(())
    }

    /// `[x1 x2 x3 x4 x5 x6] -> [x3 x4 x5 x6 x1 x2]` for `n = 2`.
    pub fn rot_n(&mut self, n: usize) -> Result<()> {
        self.check_depth(3 * n)?;
        let start = self.items.len() - 3 * n;
        self.items[start..].rotate_left(n);
        Ok(())
    }

    /// `[x1 x2 x3 x4] -> [x3 x4 x1 x2]` for `n = 2`.
    pub fn swap_n(&mut self, n: usize) -> Result<()> {
        self.check_depth(2 * n)?;
        let start = self.items.len() - 2 * n;
        self.items[start..].rotate_left(n);
        Ok(())
    }

    /// Removes and returns the item `idx` places below the top.
    pub fn nip_n(&mut self, idx: usize) -> Result<Vec<u8>> {
        let pos = self.position(idx)?;
        Ok(self.items.remove(pos))
    }

    /// Copies the item `idx` places below the top onto the top.
    pub fn pick_n(&mut self, idx: i64) -> Result<()> {
        let pos = self.position(non_negative(idx)?)?;
        self.items.extend_from_within(pos..=pos);
        Ok(())
    }

    /// Moves the item `idx` places below the top onto the top.
    pub fn roll_n(&mut self, idx: i64) -> Result<()> {
        let item = self.nip_n(non_negative(idx)?)?;
        self.items.push(item);
        Ok(())
    }

    /// `[x1 x2] -> [x2 x1 x2]`
    pub fn tuck(&mut self) -> Result<()> {
        self.check_depth(2)?;
        let len = self.items.len();
        let top = self.items[len - 1].clone();
        self.items.insert(len - 2, top);
        Ok(())
    }
}

fn non_negative(idx: i64) -> Result<usize> {
    usize::try_from(idx).map_err(|_| StackError::NegativeIndex(idx))
}

/// Interprets a stack item as a boolean.
///
/// Empty items, zeros of any length and negative zero are false.
pub fn as_bool(item: &[u8]) -> bool {
    match item.split_last() {
        Some((&last, rest)) => rest.iter().any(|&b| b != 0) || last & 0x7f != 0,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack(items: &[u8]) -> Stack {
        items.iter().map(|&b| vec![b]).collect::<Vec<_>>().into()
    }

    fn items(stack: &Stack) -> Vec<u8> {
        stack.iter().map(|item| item[0]).collect()
    }

    fn underflow(required: usize, depth: usize) -> StackError {
        StackError::InvalidIndex { required, depth }
    }

    #[test]
    fn test_as_bool() {
        assert!(!as_bool(&[]));
        assert!(!as_bool(&[0]));
        assert!(!as_bool(&[0, 0, 0]));
        assert!(!as_bool(&[0x80]));
        assert!(!as_bool(&[0, 0, 0x80]));
        assert!(as_bool(&[1]));
        assert!(as_bool(&[0x81]));
        assert!(as_bool(&[0, 1, 0]));
        assert!(as_bool(&[0x80, 0]));
    }

    #[test]
    fn test_pop_and_peek() {
        let mut s = Stack::default();
        assert_eq!(s.pop(), Err(StackError::EmptyStack));
        assert_eq!(s.peek(0), Err(StackError::EmptyStack));
        assert_eq!(s.pop_bool(), Err(StackError::EmptyStack));

        let mut s = stack(&[3, 4, 5]);
        assert_eq!(s.peek(0), Ok(&[5][..]));
        assert_eq!(s.peek(2), Ok(&[3][..]));
        assert_eq!(s.peek(3), Err(underflow(4, 3)));
        assert_eq!(s.pop(), Ok(vec![5]));
        assert_eq!(s.depth(), 2);

        s.push(vec![0, 0x80]);
        assert_eq!(s.peek_bool(), Ok(false));
        assert_eq!(s.pop_bool(), Ok(false));
        assert_eq!(s.pop_bool(), Ok(true));
    }

    #[test]
    fn test_drop_dup_over() {
        let mut s = stack(&[1, 2]);
        assert_eq!(s.drop_n(3), Err(underflow(3, 2)));
        assert_eq!(s.dup_n(2), Ok(()));
        assert_eq!(items(&s), [1, 2, 1, 2]);
        assert_eq!(s.dup_n(5), Err(underflow(5, 4)));
        assert_eq!(s.drop_n(1), Ok(()));
        assert_eq!(items(&s), [1, 2, 1]);

        let mut s = stack(&[1, 2, 3, 4]);
        assert_eq!(s.over_n(2), Ok(()));
        assert_eq!(items(&s), [1, 2, 3, 4, 1, 2]);
        assert_eq!(s.over_n(1), Ok(()));
        assert_eq!(items(&s), [1, 2, 3, 4, 1, 2, 1]);
    }

    #[test]
    fn test_rot_swap() {
        let mut s = stack(&[0, 1, 2, 3]);
        assert_eq!(s.rot_n(1), Ok(()));
        assert_eq!(items(&s), [0, 2, 3, 1]);

        let mut s = stack(&[0, 1, 2, 3, 4, 5]);
        assert_eq!(s.rot_n(2), Ok(()));
        assert_eq!(items(&s), [2, 3, 4, 5, 0, 1]);

        let mut s = stack(&[0, 1, 2, 3]);
        assert_eq!(s.swap_n(1), Ok(()));
        assert_eq!(items(&s), [0, 1, 3, 2]);
        assert_eq!(s.swap_n(2), Ok(()));
        assert_eq!(items(&s), [3, 2, 0, 1]);
        assert_eq!(s.swap_n(3), Err(underflow(6, 4)));
    }

    #[test]
    fn test_nip_pick_roll_tuck() {
        let mut s = stack(&[0, 1, 2, 3]);
        assert_eq!(s.nip_n(1), Ok(vec![2]));
        assert_eq!(items(&s), [0, 1, 3]);
        assert_eq!(s.tuck(), Ok(()));
        assert_eq!(items(&s), [0, 3, 1, 3]);
        assert_eq!(s.pick_n(3), Ok(()));
        assert_eq!(items(&s), [0, 3, 1, 3, 0]);
        assert_eq!(s.roll_n(2), Ok(()));
        assert_eq!(items(&s), [0, 3, 3, 0, 1]);
        assert_eq!(s.pick_n(-1), Err(StackError::NegativeIndex(-1)));
        assert_eq!(s.roll_n(5), Err(underflow(6, 5)));

        let mut s = stack(&[0]);
        assert_eq!(s.tuck(), Err(underflow(2, 1)));
    }

    #[test]
    fn test_minimal_numbers() {
        let mut s = Stack::new(true);
        s.push(vec![0x01, 0x00]);
        assert_eq!(
            s.pop_num(),
            Err(StackError::Num(NumError::NotMinimallyEncoded))
        );

        let mut s = Stack::new(false);
        s.push(vec![0x01, 0x00]);
        assert_eq!(s.peek_num(ScriptNum::MAX_NUM_SIZE).map(|n| n.value()), Ok(1));
        assert_eq!(s.pop_num().map(|n| n.value()), Ok(1));
    }

    #[test]
    fn test_display() {
        let mut s = stack(&[0xab]);
        s.push(Vec::new());
        assert_eq!(s.to_string(), "[ab, <empty>]");
    }
}
