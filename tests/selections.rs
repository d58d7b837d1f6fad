use h5select::{
    data_type::{CompoundDataType, DataType},
    dataset::{Dataset, MemoryDataset},
    projection::{project, ProjectionError},
    selection::{
        resolve_scalar, select, Index, IndexExpression, RegionReference, SelectionError,
        SelectionVariant, Slice,
    },
    ErrorKind,
};

fn compound() -> DataType {
    DataType::Compound(
        CompoundDataType::new([
            ("a", DataType::Int32),
            ("b", DataType::Float32),
            ("c", DataType::FixedString(10)),
        ])
        .unwrap(),
    )
}

#[test]
fn type_projection() -> Result<(), Box<dyn std::error::Error>> {
    let data_type = compound();

    let projection = project(&data_type, &[] as &[&str])?;
    assert!(projection.is_identity());
    assert_eq!(projection.memory(), &data_type);

    let projection = project(&data_type, &["a"])?;
    assert_eq!(projection.memory(), &DataType::Int32);
    let storage = projection.storage().as_compound().unwrap();
    assert_eq!(storage.field_names().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(storage.size(), data_type.size());

    let projection = project(&data_type, &["c", "a"])?;
    let storage = projection.storage().as_compound().unwrap();
    assert_eq!(storage.field_names().collect::<Vec<_>>(), vec!["a", "c"]);
    assert_eq!(projection.memory(), projection.storage());

    let err = project(&data_type, &["missing"]).unwrap_err();
    assert!(matches!(err, ProjectionError::UnknownFields(_)));
    assert_eq!(err.kind(), ErrorKind::Value);

    let err = project(&DataType::Int32, &["a"]).unwrap_err();
    assert!(matches!(err, ProjectionError::FieldsOnNonCompound(..)));
    assert_eq!(err.kind(), ErrorKind::Value);
    Ok(())
}

#[test]
fn scalar_selection() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = MemoryDataset::new(vec![], DataType::Float32);

    let (shape, selection) = resolve_scalar(&dataset, &[])?;
    assert_eq!(shape, None);
    assert!(matches!(selection.variant(), SelectionVariant::Scalar(_)));

    let (shape, _) = resolve_scalar(&dataset, &[Index::Ellipsis])?;
    assert_eq!(shape, Some(vec![]));

    let err = resolve_scalar(&dataset, &[Index::Integer(1)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Value);
    Ok(())
}

#[test]
fn region_reference_requires_dataset() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = MemoryDataset::new(vec![100, 100], DataType::Float32);
    let region_reference = RegionReference::new(&dataset, Index::from(..))?;

    let err = select(&[100, 100], &region_reference, None).unwrap_err();
    assert!(matches!(err, SelectionError::MissingDataset));
    assert_eq!(err.kind(), ErrorKind::Type);
    Ok(())
}

#[test]
fn region_reference_shape() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = MemoryDataset::new(vec![100, 100], DataType::Float32);
    let region_reference = RegionReference::new(&dataset, Index::from(..))?;

    let err = select(&[100], &region_reference, Some(&dataset)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);

    let selection = dataset.select(&region_reference)?;
    assert_eq!(selection.npoints(), 10_000);
    Ok(())
}

#[test]
fn selection_as_index() -> Result<(), Box<dyn std::error::Error>> {
    let fancy = select(&[10], vec![1i64, 2, 3], None)?;
    assert!(matches!(fancy.variant(), SelectionVariant::Fancy(_)));

    let err = select(&[100, 100], &fancy, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);

    let derived = select(&[10], &fancy, None)?;
    assert!(matches!(derived.variant(), SelectionVariant::Fancy(_)));
    Ok(())
}

#[test]
fn fancy_selection_shapes() -> Result<(), Box<dyn std::error::Error>> {
    let selection = select(&[10, 100], vec![1i64, 2, 3], None)?;
    assert_eq!(selection.mshape(), &[3, 100]);
    assert_eq!(selection.npoints(), 300);
    Ok(())
}

#[test]
fn fancy_selection_dataset_context() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = MemoryDataset::new(vec![10, 100], DataType::Int8);
    let selection = select(&[10], vec![1i64, 2, 3], Some(&dataset))?;
    assert!(matches!(selection.variant(), SelectionVariant::Fancy(_)));
    assert_eq!(selection.mshape(), &[3, 100]);
    assert_eq!(selection.array_shape(), &[3, 100]);
    Ok(())
}

#[test]
fn expand_shape_integer_dataset_context() -> Result<(), Box<dyn std::error::Error>> {
    let dataset = MemoryDataset::new(vec![10, 100], DataType::Int8);
    let selection = select(&[10], 1i64, Some(&dataset))?;
    assert!(matches!(selection.variant(), SelectionVariant::Simple(_)));
    assert_eq!(selection.mshape(), &[1, 100]);
    assert_eq!(selection.array_shape(), &[100]);
    assert_eq!(selection.expand_shape(&[])?, vec![1, 1]);

    let err = selection.expand_shape(&[4, 100]).unwrap_err();
    assert!(matches!(err, SelectionError::IncompatibleBroadcast(..)));
    assert_eq!(err.kind(), ErrorKind::Type);
    Ok(())
}

#[test]
fn expand_shape_integer() -> Result<(), Box<dyn std::error::Error>> {
    let selection = select(&[10, 100], 1i64, None)?;
    assert!(matches!(selection.variant(), SelectionVariant::Simple(_)));
    assert_eq!(selection.mshape(), &[1, 100]);
    assert_eq!(selection.array_shape(), &[100]);
    assert_eq!(selection.expand_shape(&[])?, vec![1, 1]);

    let err = selection.expand_shape(&[4, 100]).unwrap_err();
    assert!(matches!(err, SelectionError::IncompatibleBroadcast(..)));
    assert_eq!(err.kind(), ErrorKind::Type);
    Ok(())
}

#[test]
fn expand_shape_ellipsis() -> Result<(), Box<dyn std::error::Error>> {
    let selection = select(
        &[10, 5, 4, 2],
        vec![Index::Ellipsis, Index::Integer(0)],
        None,
    )?;
    assert_eq!(selection.expand_shape(&[5, 4])?, vec![1, 5, 4, 1]);

    let broadcast = selection.broadcast(&[5, 4])?;
    let tiles = broadcast.tiles();
    assert_eq!(tiles.len(), 10);
    assert!(tiles.iter().all(|tile| tile.npoints() == 20));
    Ok(())
}

#[test]
fn write_read_broadcast() -> Result<(), Box<dyn std::error::Error>> {
    let data_type = compound();
    let mut dataset = MemoryDataset::new(vec![4, 3], data_type.clone());
    let projection = dataset.project(&["a"])?;

    // Broadcast a single value down every row of column 1
    let selection = dataset.select(vec![Index::from(..), Index::Integer(1)])?;
    assert_eq!(selection.mshape(), &[4, 1]);
    let broadcast = selection.broadcast(&[])?;
    dataset.write(&broadcast, &projection, &7i32.to_ne_bytes())?;

    let column = dataset.read(&selection, &projection)?;
    assert_eq!(column, [7i32.to_ne_bytes(); 4].concat());

    let row = dataset.select(vec![Index::Integer(0)])?;
    let bytes = dataset.read(&row, &projection)?;
    assert_eq!(
        bytes,
        [0i32.to_ne_bytes(), 7i32.to_ne_bytes(), 0i32.to_ne_bytes()].concat()
    );

    // Other fields are untouched
    let b = dataset.project(&["b"])?;
    assert!(dataset.read(&selection, &b)?.iter().all(|&byte| byte == 0));
    Ok(())
}

#[test]
fn write_read_strided() -> Result<(), Box<dyn std::error::Error>> {
    let mut dataset = MemoryDataset::new(vec![20], DataType::UInt8);
    let projection = dataset.project(&[] as &[&str])?;
    let selection = dataset.select(Slice::new(Some(1), None, Some(4)))?;
    assert_eq!(selection.mshape(), &[5]);
    dataset.write(&selection, &projection, &[1, 2, 3, 4, 5])?;
    assert_eq!(dataset.bytes()[1], 1);
    assert_eq!(dataset.bytes()[17], 5);
    assert_eq!(dataset.bytes().iter().filter(|&&byte| byte != 0).count(), 5);

    let selection = dataset.select(IndexExpression::empty())?;
    assert_eq!(dataset.read(&selection, &projection)?, dataset.bytes().to_vec());
    Ok(())
}

#[cfg(feature = "ndarray")]
#[test]
fn ndarray_indices() -> Result<(), Box<dyn std::error::Error>> {
    use h5select::selection::BooleanMask;

    let dataset = MemoryDataset::new(vec![3, 3], DataType::UInt8);
    let mask = BooleanMask::from(ndarray::array![
        [true, false, false],
        [false, true, false],
        [false, false, true]
    ]);
    let selection = dataset.select(mask)?;
    assert!(matches!(selection.variant(), SelectionVariant::Point(_)));
    assert_eq!(selection.npoints(), 3);

    let selection = dataset.select(vec![
        Index::from(ndarray::array![0i64, 2]),
        Index::from(ndarray::array![true, false, true]),
    ])?;
    assert_eq!(selection.mshape(), &[2, 2]);
    Ok(())
}
