use itertools::Itertools;

use crate::{
    config::global_config,
    dataset::Dataset,
    shape::{normalise_index, ArrayShape},
};

use super::{
    scalar::scalar_rules, AxisSelection, BooleanMask, FancySelection, Index, IndexExpression,
    PointSelection, RegionReference, Selection, SelectionError, SimpleSelection, StorageSelection,
};

/// Resolve `expression` against an array with `shape`.
///
/// `dataset` is the dataset being indexed, if any. It is required to apply a [`RegionReference`].
///
/// The expression is classified in priority order:
///  1. a region reference returns the referenced selection, provided `dataset` is present and both it and the reference have shape `shape`,
///  2. an existing selection with shape `shape` returns a new [`FancySelection`](super::FancySelection) derived from it,
///  3. a whole-array boolean mask or a point list returns a [`PointSelection`](super::PointSelection),
///  4. an index tuple with any integer array or per-axis boolean mask returns a [`FancySelection`](super::FancySelection), and
///  5. any other index tuple returns a [`SimpleSelection`].
///
/// If `dataset` is present, rules 3 to 5 resolve against the shape of `dataset` rather than `shape`.
/// For example, `[1, 2, 3]` against `shape` `[10]` with a dataset of shape `[10, 100]` has memory shape `[3, 100]`.
///
/// Index tuples against a rank 0 shape follow the scalar rules of [`resolve_scalar`](super::resolve_scalar).
///
/// # Errors
///
/// Returns a [`SelectionError`] if the expression is invalid for `shape` or `dataset`.
pub fn select(
    shape: &[u64],
    expression: impl Into<IndexExpression>,
    dataset: Option<&dyn Dataset>,
) -> Result<Selection, SelectionError> {
    let indexed_shape = dataset.map_or(shape, |dataset| dataset.shape());
    match expression.into() {
        IndexExpression::RegionReference(region_reference) => {
            select_region_reference(shape, region_reference, dataset)
        }
        IndexExpression::Selection(selection) => {
            if selection.shape() != shape {
                return Err(SelectionError::SelectionShapeMismatch(
                    selection.shape().to_vec(),
                    shape.to_vec(),
                ));
            }
            tracing::trace!(%selection, "deriving fancy selection");
            Ok(Selection::derive_fancy(&selection))
        }
        IndexExpression::Mask(mask) => select_mask(indexed_shape, &mask),
        IndexExpression::Points(points) => Selection::new_points(indexed_shape.to_vec(), points),
        IndexExpression::Tuple(indices) => select_tuple(indexed_shape, &indices),
    }
}

fn select_region_reference(
    shape: &[u64],
    region_reference: RegionReference,
    dataset: Option<&dyn Dataset>,
) -> Result<Selection, SelectionError> {
    let dataset = dataset.ok_or(SelectionError::MissingDataset)?;
    if region_reference.shape() != shape || dataset.shape() != shape {
        return Err(SelectionError::RegionReferenceShapeMismatch(
            region_reference.shape().to_vec(),
            shape.to_vec(),
        ));
    }
    Ok(region_reference.selection().clone())
}

fn select_mask(shape: &[u64], mask: &BooleanMask) -> Result<Selection, SelectionError> {
    if mask.shape() != shape {
        return Err(SelectionError::MaskShapeMismatch(
            mask.shape().to_vec(),
            shape.to_vec(),
        ));
    }
    let points = PointSelection::from_mask(mask);
    tracing::trace!(npoints = points.len(), "point selection from boolean mask");
    Selection::new_points(shape.to_vec(), points.points().to_vec())
}

fn select_tuple(shape: &[u64], indices: &[Index]) -> Result<Selection, SelectionError> {
    if shape.is_empty() {
        return scalar_rules(indices).map(|(_, selection)| selection);
    }

    let indices = expand_ellipsis(indices, shape.len())?;
    let num_arrays = indices.iter().filter(|index| index.is_array()).count();
    let index_array_limit = global_config().index_array_limit();
    if index_array_limit != 0 && num_arrays > index_array_limit {
        return Err(SelectionError::TooManyIndexArrays(
            num_arrays,
            index_array_limit,
        ));
    }

    let axes = std::iter::zip(&indices, shape)
        .enumerate()
        .map(|(axis, (index, &len))| resolve_axis(index, axis, len))
        .collect::<Result<Vec<_>, _>>()?;

    // Only array-valued indices produce coordinate lists
    match SimpleSelection::from_axes(axes) {
        Ok(simple) => {
            tracing::trace!("simple selection");
            Ok(Selection::new_simple(shape.to_vec(), simple))
        }
        Err(axes) => {
            tracing::trace!(num_arrays, "fancy selection");
            Ok(Selection::new_fancy(
                shape.to_vec(),
                FancySelection::new(StorageSelection::Axes(axes)),
            ))
        }
    }
}

/// Replace the ellipsis (or the absence of one) with full slices so that there is one index per axis.
fn expand_ellipsis(indices: &[Index], rank: usize) -> Result<Vec<Index>, SelectionError> {
    let ellipses = indices
        .iter()
        .positions(|index| matches!(index, Index::Ellipsis))
        .collect_vec();
    let num_indices = indices.len() - ellipses.len();
    if ellipses.len() > 1 {
        return Err(SelectionError::MultipleEllipsis);
    }
    if num_indices > rank {
        return Err(SelectionError::TooManyIndices(num_indices, rank));
    }
    let fill = std::iter::repeat(Index::from(..)).take(rank - num_indices);
    let (before, after) = match ellipses.first() {
        Some(&position) => (&indices[..position], &indices[position + 1..]),
        None => (indices, &[] as &[Index]),
    };
    Ok(before
        .iter()
        .cloned()
        .chain(fill)
        .chain(after.iter().cloned())
        .collect())
}

fn resolve_axis(index: &Index, axis: usize, len: u64) -> Result<AxisSelection, SelectionError> {
    let out_of_bounds = |index: i64| SelectionError::IndexOutOfBounds {
        index,
        axis,
        size: len,
    };
    match index {
        Index::Integer(index) => normalise_index(*index, len)
            .map(AxisSelection::Index)
            .ok_or_else(|| out_of_bounds(*index)),
        Index::Slice(slice) => {
            let (start, count, step) = slice.resolve(len)?;
            Ok(AxisSelection::Range { start, step, count })
        }
        Index::Ellipsis => Ok(AxisSelection::full(len)),
        Index::Array(indices) => {
            let coordinates = indices
                .iter()
                .map(|&index| normalise_index(index, len).ok_or_else(|| out_of_bounds(index)))
                .collect::<Result<Vec<_>, _>>()?;
            if global_config().require_increasing_indices()
                && !coordinates.iter().tuple_windows().all(|(a, b)| a < b)
            {
                return Err(SelectionError::IndicesNotIncreasing(indices.clone()));
            }
            Ok(AxisSelection::Coordinates(coordinates))
        }
        Index::Mask(mask) => {
            if mask.len() as u64 != len {
                return Err(SelectionError::MaskShapeMismatch(
                    ArrayShape::from([mask.len() as u64]),
                    vec![len],
                ));
            }
            Ok(AxisSelection::Coordinates(
                mask.iter().positions(|&value| value).map(|i| i as u64).collect(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_type::DataType,
        dataset::MemoryDataset,
        selection::{SelectionVariant, Slice},
        ErrorKind,
    };

    #[test]
    fn select_fancy_list() {
        let selection = select(&[10, 100], vec![1i64, 2, 3], None).unwrap();
        assert!(matches!(selection.variant(), SelectionVariant::Fancy(_)));
        assert_eq!(selection.mshape(), &[3, 100]);
        assert_eq!(selection.array_shape(), &[3, 100]);
        assert_eq!(selection.npoints(), 300);
    }

    #[test]
    fn select_fancy_integer_axis() {
        let selection = select(
            &[10, 100, 5],
            vec![Index::Integer(2), Index::Array(vec![0, 50, -1]), Index::from(1..3)],
            None,
        )
        .unwrap();
        assert_eq!(selection.mshape(), &[3, 2]);
        let storage = selection.storage();
        assert_eq!(
            storage.iter_indices().collect_vec(),
            vec![
                vec![2, 0, 1],
                vec![2, 0, 2],
                vec![2, 50, 1],
                vec![2, 50, 2],
                vec![2, 99, 1],
                vec![2, 99, 2],
            ]
        );
    }

    #[test]
    fn select_fancy_mask_axis() {
        let selection = select(
            &[4, 3],
            vec![Index::from(..), Index::Mask(vec![true, false, true])],
            None,
        )
        .unwrap();
        assert_eq!(selection.mshape(), &[4, 2]);
        assert_eq!(
            selection.storage(),
            StorageSelection::Axes(vec![
                AxisSelection::full(4),
                AxisSelection::Coordinates(vec![0, 2])
            ])
        );
        let err = select(&[4, 3], vec![Index::Mask(vec![true])], None).unwrap_err();
        assert!(matches!(err, SelectionError::MaskShapeMismatch(..)));
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn select_fancy_invalid() {
        let err = select(&[10], vec![3i64, 1], None).unwrap_err();
        assert!(matches!(err, SelectionError::IndicesNotIncreasing(_)));
        let err = select(&[10], vec![1i64, 1], None).unwrap_err();
        assert!(matches!(err, SelectionError::IndicesNotIncreasing(_)));
        let err = select(&[10], vec![1i64, 10], None).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::IndexOutOfBounds {
                index: 10,
                axis: 0,
                size: 10
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn select_simple_integer() {
        let selection = select(&[10, 100], 1i64, None).unwrap();
        assert!(matches!(selection.variant(), SelectionVariant::Simple(_)));
        assert_eq!(selection.mshape(), &[1, 100]);
        assert_eq!(selection.array_shape(), &[100]);
        assert_eq!(selection.expand_shape(&[]).unwrap(), vec![1, 1]);
        let err = selection.expand_shape(&[4, 100]).unwrap_err();
        assert!(matches!(err, SelectionError::IncompatibleBroadcast(..)));
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn select_dataset_shape() {
        let dataset = MemoryDataset::new(vec![10, 100], DataType::Int8);

        let selection = select(&[10], vec![1i64, 2, 3], Some(&dataset)).unwrap();
        assert!(matches!(selection.variant(), SelectionVariant::Fancy(_)));
        assert_eq!(selection.shape(), &[10, 100]);
        assert_eq!(selection.mshape(), &[3, 100]);
        assert_eq!(selection.array_shape(), &[3, 100]);

        let selection = select(&[10], 1i64, Some(&dataset)).unwrap();
        assert!(matches!(selection.variant(), SelectionVariant::Simple(_)));
        assert_eq!(selection.mshape(), &[1, 100]);
        assert_eq!(selection.array_shape(), &[100]);
        assert_eq!(selection.expand_shape(&[]).unwrap(), vec![1, 1]);
        let err = selection.expand_shape(&[4, 100]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let selection = select(&[10], vec![vec![9u64, 99]], Some(&dataset)).unwrap();
        assert_eq!(selection.npoints(), 1);
        let mask = BooleanMask::new(vec![10, 100], vec![false; 1000]).unwrap();
        assert_eq!(select(&[10], mask, Some(&dataset)).unwrap().npoints(), 0);

        // Existing selections are still checked against the given shape
        let fancy = select(&[10], vec![1i64, 2, 3], None).unwrap();
        assert!(select(&[10], &fancy, Some(&dataset)).is_ok());
    }

    #[test]
    fn select_simple_slices() {
        let selection = select(
            &[10, 20, 30],
            vec![
                Index::Integer(-1),
                Index::Ellipsis,
                Index::Slice(Slice::new(None, None, Some(10))),
            ],
            None,
        )
        .unwrap();
        assert_eq!(selection.mshape(), &[1, 20, 3]);
        assert_eq!(selection.array_shape(), &[20, 3]);
        let SelectionVariant::Simple(simple) = selection.variant() else {
            panic!("expected a simple selection");
        };
        assert_eq!(simple.start(), vec![9, 0, 0]);
        assert_eq!(simple.step(), vec![1, 1, 10]);
        assert_eq!(simple.scalar(), vec![true, false, false]);

        let selection = select(&[10, 20], IndexExpression::empty(), None).unwrap();
        assert_eq!(selection.mshape(), &[10, 20]);
        let selection = select(&[10, 20], Index::Ellipsis, None).unwrap();
        assert_eq!(selection.mshape(), &[10, 20]);
    }

    #[test]
    fn select_tuple_invalid() {
        let err = select(&[10], vec![Index::Integer(0), Index::Integer(0)], None).unwrap_err();
        assert!(matches!(err, SelectionError::TooManyIndices(2, 1)));
        let err = select(&[10], vec![Index::Ellipsis, Index::Ellipsis], None).unwrap_err();
        assert!(matches!(err, SelectionError::MultipleEllipsis));
        let err = select(&[10], Index::Slice(Slice::full().with_step(0)), None).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidStep(0)));
        let err = select(&[10], -11i64, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn select_scalar_shape() {
        let selection = select(&[], IndexExpression::empty(), None).unwrap();
        assert!(matches!(selection.variant(), SelectionVariant::Scalar(_)));
        assert_eq!(selection.npoints(), 1);
        assert!(select(&[], Index::Ellipsis, None).is_ok());
        let err = select(&[], 0i64, None).unwrap_err();
        assert!(matches!(err, SelectionError::IllegalScalarIndex(_)));
    }

    #[test]
    fn select_mask() {
        let mask = BooleanMask::new(vec![5], vec![true, false, false, false, true]).unwrap();
        let selection = select(&[5], mask.clone(), None).unwrap();
        assert!(matches!(selection.variant(), SelectionVariant::Point(_)));
        assert_eq!(selection.mshape(), &[2]);
        assert_eq!(
            selection.storage(),
            StorageSelection::Points(vec![vec![0], vec![4]])
        );
        let err = select(&[6], mask, None).unwrap_err();
        assert!(matches!(err, SelectionError::MaskShapeMismatch(..)));
    }

    #[test]
    fn select_points() {
        let selection = select(&[3, 3], vec![vec![2u64, 0], vec![0, 2]], None).unwrap();
        assert!(matches!(selection.variant(), SelectionVariant::Point(_)));
        assert_eq!(selection.npoints(), 2);
        assert!(select(&[3, 3], vec![vec![3u64, 0]], None).is_err());
    }

    #[test]
    fn select_region_reference() {
        let dataset = MemoryDataset::new(vec![100, 100], DataType::Float32);
        let region_reference =
            RegionReference::new(&dataset, vec![Index::from(0..100), Index::from(0..100)])
                .unwrap();

        let selection = select(&[100, 100], &region_reference, Some(&dataset)).unwrap();
        assert_eq!(&selection, region_reference.selection());

        let err = select(&[100, 100], &region_reference, None).unwrap_err();
        assert!(matches!(err, SelectionError::MissingDataset));
        assert_eq!(err.kind(), ErrorKind::Type);

        let err = select(&[100], &region_reference, Some(&dataset)).unwrap_err();
        assert!(matches!(
            err,
            SelectionError::RegionReferenceShapeMismatch(..)
        ));
        assert_eq!(err.kind(), ErrorKind::Type);

        let other = MemoryDataset::new(vec![10, 10], DataType::Float32);
        let err = select(&[100, 100], &region_reference, Some(&other)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn select_selection() {
        let fancy = select(&[10], vec![1i64, 2, 3], None).unwrap();
        assert!(matches!(fancy.variant(), SelectionVariant::Fancy(_)));

        let err = select(&[100, 100], &fancy, None).unwrap_err();
        assert!(matches!(err, SelectionError::SelectionShapeMismatch(..)));
        assert_eq!(err.kind(), ErrorKind::Type);

        let derived = select(&[10], &fancy, None).unwrap();
        assert!(matches!(derived.variant(), SelectionVariant::Fancy(_)));
        assert_eq!(derived.storage(), fancy.storage());
        assert_eq!(derived.mshape(), fancy.mshape());
    }

    #[test]
    fn select_selection_simple() {
        let simple = select(&[10, 100], 1i64, None).unwrap();
        let broadcast = simple.broadcast(&[100]).unwrap();
        let derived = select(&[10, 100], broadcast, None).unwrap();
        assert!(matches!(derived.variant(), SelectionVariant::Fancy(_)));
        assert!(!derived.is_broadcast());
        assert_eq!(derived.mshape(), &[100]);
        assert_eq!(derived.npoints(), simple.npoints());
    }
}
