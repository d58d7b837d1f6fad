//! Shape primitives.
//!
//! Shapes and indices are plain vectors of `u64`, one entry per dimension.
//! A rank 0 (scalar) shape is the empty vector.

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// Return the number of elements of an array with `shape`.
///
/// The empty (scalar) shape has one element.
#[must_use]
pub fn num_elements(shape: &[u64]) -> u64 {
    shape.iter().product()
}

/// Unravel a linearised index to ND indices.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Ravel ND indices to a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        index += i * count;
        count *= s;
    }
    index
}

/// Normalise a possibly negative index against an axis of length `len`.
///
/// Negative indices count back from the end of the axis.
/// Returns [`None`] if the index is out of bounds.
#[must_use]
pub fn normalise_index(index: i64, len: u64) -> Option<u64> {
    let len_i = i128::from(len);
    let index = i128::from(index);
    let index = if index < 0 { index + len_i } else { index };
    if (0..len_i).contains(&index) {
        u64::try_from(index).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_ravel_unravel() {
        let shape = [2, 3, 4];
        assert_eq!(unravel_index(0, &shape), vec![0, 0, 0]);
        assert_eq!(unravel_index(23, &shape), vec![1, 2, 3]);
        assert_eq!(unravel_index(5, &shape), vec![0, 1, 1]);
        assert_eq!(ravel_indices(&[0, 1, 1], &shape), 5);
        assert_eq!(ravel_indices(&[1, 2, 3], &shape), 23);
        assert!(unravel_index(0, &[]).is_empty());
    }

    #[test]
    fn shape_num_elements() {
        assert_eq!(num_elements(&[]), 1);
        assert_eq!(num_elements(&[10, 100]), 1000);
        assert_eq!(num_elements(&[10, 0]), 0);
    }

    #[test]
    fn shape_normalise_index() {
        assert_eq!(normalise_index(0, 10), Some(0));
        assert_eq!(normalise_index(9, 10), Some(9));
        assert_eq!(normalise_index(10, 10), None);
        assert_eq!(normalise_index(-1, 10), Some(9));
        assert_eq!(normalise_index(-10, 10), Some(0));
        assert_eq!(normalise_index(-11, 10), None);
        assert_eq!(normalise_index(0, 0), None);
    }
}
