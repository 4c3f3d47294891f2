use core::fmt;

/// Ordered set of active column indices into a dictionary `A`.
///
/// Indices are zero-based, unique and `< ncols`. Order is insertion order,
/// which for OMP is the order atoms were selected in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Support {
    ncols: usize,
    indices: Vec<usize>,
}

/// Validation errors for a Support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupportError {
    /// An index is >= ncols.
    IndexOutOfBounds { index: usize, ncols: usize },
    /// An index appears more than once.
    DuplicateIndex { index: usize },
}

impl fmt::Display for SupportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, ncols } => {
                write!(f, "support index {index} exceeds ncols {ncols}")
            }
            Self::DuplicateIndex { index } => {
                write!(f, "support index {index} appears more than once")
            }
        }
    }
}

impl std::error::Error for SupportError {}

impl Support {
    /// Creates an empty support over a dictionary with `ncols` atoms.
    pub fn empty(ncols: usize) -> Self {
        Self {
            ncols,
            indices: Vec::new(),
        }
    }

    /// Creates a validated support.
    ///
    /// Requirements:
    /// - every index is `< ncols`
    /// - no index repeats
    pub fn new(ncols: usize, indices: Vec<usize>) -> Result<Self, SupportError> {
        let mut seen = vec![false; ncols];
        for &index in &indices {
            if index >= ncols {
                return Err(SupportError::IndexOutOfBounds { index, ncols });
            }
            if seen[index] {
                return Err(SupportError::DuplicateIndex { index });
            }
            seen[index] = true;
        }
        Ok(Self { ncols, indices })
    }

    /// Number of atoms in the dictionary this support indexes.
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of active indices.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Active indices in insertion order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// Active indices in ascending order.
    pub fn sorted(&self) -> Vec<usize> {
        let mut indices = self.indices.clone();
        indices.sort_unstable();
        indices
    }

    /// Appends an index; a no-op when it is already active.
    ///
    /// Callers guarantee `index < ncols`.
    pub(crate) fn insert(&mut self, index: usize) -> bool {
        debug_assert!(index < self.ncols);
        if self.contains(index) {
            return false;
        }
        self.indices.push(index);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_bounds_and_duplicates() {
        assert_eq!(
            Support::new(4, vec![0, 4]),
            Err(SupportError::IndexOutOfBounds { index: 4, ncols: 4 })
        );
        assert_eq!(
            Support::new(4, vec![2, 1, 2]),
            Err(SupportError::DuplicateIndex { index: 2 })
        );
        let support = Support::new(4, vec![3, 0]).unwrap();
        assert_eq!(support.indices(), &[3, 0]);
        assert_eq!(support.sorted(), vec![0, 3]);
    }

    #[test]
    fn insert_is_idempotent() {
        let mut support = Support::empty(3);
        assert!(support.insert(2));
        assert!(!support.insert(2));
        assert!(support.insert(0));
        assert_eq!(support.indices(), &[2, 0]);
        assert!(support.contains(0));
        assert!(!support.contains(1));
    }
}
