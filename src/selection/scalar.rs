use serde::{Deserialize, Serialize};

use crate::{dataset::Dataset, shape::ArrayShape};

use super::{Index, IndexExpression, Selection, SelectionError};

/// The selection of the single element of a rank 0 array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarSelection;

/// Apply the index rules for a rank 0 array.
///
/// Only the empty index and a sole ellipsis are permitted.
/// The empty index has no output shape, the ellipsis has the rank 0 output shape.
pub(crate) fn scalar_rules(
    indices: &[Index],
) -> Result<(Option<ArrayShape>, Selection), SelectionError> {
    match indices {
        [] => Ok((None, Selection::new_scalar())),
        [Index::Ellipsis] => Ok((Some(vec![]), Selection::new_scalar())),
        _ => Err(SelectionError::IllegalScalarIndex(
            IndexExpression::Tuple(indices.to_vec()).to_string(),
        )),
    }
}

/// Resolve an index tuple against a rank 0 `dataset`.
///
/// Returns the output shape and the selection:
///  - `[]` returns no output shape ([`None`]), and
///  - `[Index::Ellipsis]` returns the rank 0 output shape `Some(vec![])`.
///
/// Both select the single element of the dataset.
///
/// # Errors
///
/// Returns [`SelectionError::NotScalar`] if `dataset` is not rank 0.
/// This is a [runtime](crate::ErrorKind::Runtime) error: callers must check the rank of a dataset before applying the scalar rules.
///
/// Returns [`SelectionError::IllegalScalarIndex`] for any other index tuple.
pub fn resolve_scalar(
    dataset: &dyn Dataset,
    indices: &[Index],
) -> Result<(Option<ArrayShape>, Selection), SelectionError> {
    if !dataset.shape().is_empty() {
        return Err(SelectionError::NotScalar(dataset.shape().to_vec()));
    }
    scalar_rules(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dataset::MemoryDataset, data_type::DataType, ErrorKind};

    #[test]
    fn scalar_args() {
        let dataset = MemoryDataset::new(vec![], DataType::Float32);

        let (shape, selection) = resolve_scalar(&dataset, &[]).unwrap();
        assert_eq!(shape, None);
        assert_eq!(selection.npoints(), 1);

        let (shape, selection) = resolve_scalar(&dataset, &[Index::Ellipsis]).unwrap();
        assert_eq!(shape, Some(vec![]));
        assert_eq!(selection.npoints(), 1);
        assert_eq!(selection.shape(), &[] as &[u64]);

        let err = resolve_scalar(&dataset, &[Index::Integer(1)]).unwrap_err();
        assert!(matches!(err, SelectionError::IllegalScalarIndex(_)));
        assert_eq!(err.kind(), ErrorKind::Value);
        assert_eq!(err.to_string(), "illegal index (1) for scalar data");

        assert!(resolve_scalar(&dataset, &[Index::Ellipsis, Index::Ellipsis]).is_err());
        assert!(resolve_scalar(&dataset, &[Index::from(..)]).is_err());
    }

    #[test]
    fn scalar_not_scalar() {
        let dataset = MemoryDataset::new(vec![10], DataType::Float32);
        let err = resolve_scalar(&dataset, &[Index::Integer(1)]).unwrap_err();
        assert!(matches!(err, SelectionError::NotScalar(_)));
        assert_eq!(err.kind(), ErrorKind::Runtime);
    }
}
