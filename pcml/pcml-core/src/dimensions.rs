use std::{fmt, ops::Deref};

/// Index tuple selecting one element across nested array levels.
///
/// The outermost array comes first. An empty tuple addresses a scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Dimensions(Vec<usize>);

impl Dimensions {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.0.pop()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// The first `len` indices (or all of them when fewer are present).
    pub fn prefix(&self, len: usize) -> &[usize] {
        &self.0[..len.min(self.0.len())]
    }
}

impl Deref for Dimensions {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<usize>> for Dimensions {
    fn from(value: Vec<usize>) -> Self {
        Self(value)
    }
}

impl From<&[usize]> for Dimensions {
    fn from(value: &[usize]) -> Self {
        Self(value.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Dimensions {
    fn from(value: [usize; N]) -> Self {
        Self(value.to_vec())
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{index}")?;
        }
        f.write_str("]")
    }
}
