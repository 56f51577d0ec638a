//! Integration tests for the Parameter struct

use caustics_rs::parameters::{scalar_tensor, tensor_from_vec, DType, Parameter, ParameterError};
use ndarray::arr1;

#[test]
fn test_parameter_lifecycle() {
    // Dynamic with a declared shape
    let mut param = Parameter::new(None, Some(vec![3]), DType::F64).unwrap();
    assert!(param.is_dynamic());
    assert!(param.value().is_none());
    assert_eq!(param.size(), 3);

    // Wrong shape leaves the parameter untouched
    let err = param.set_value(scalar_tensor(1.0)).unwrap_err();
    assert_eq!(
        err,
        ParameterError::ShapeMismatch {
            expected: vec![3],
            got: vec![]
        }
    );
    assert!(param.is_dynamic());

    // Becoming static
    param.set_value(arr1(&[1.0, 2.0, 3.0]).into_dyn()).unwrap();
    assert!(param.is_static());
    assert_eq!(param.value().unwrap().sum(), 6.0);

    // And dynamic again, keeping the shape
    param.clear();
    assert!(param.is_dynamic());
    assert_eq!(param.shape(), &[3]);
}

#[test]
fn test_value_and_shape_must_agree() {
    let value = tensor_from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert!(Parameter::new(Some(value.clone()), Some(vec![4]), DType::F64).is_err());

    let param = Parameter::new(Some(value), None, DType::F64).unwrap();
    assert_eq!(param.shape(), &[2, 2]);

    assert!(tensor_from_vec(&[2, 2], vec![1.0]).is_err());
}

#[test]
fn test_precision() {
    assert_eq!(DType::F32.size(), 4);
    assert_eq!(DType::default(), DType::F64);

    let third = 1.0 / 3.0;
    let param = Parameter::new(Some(scalar_tensor(third)), None, DType::F32).unwrap();
    assert_eq!(param.dtype(), DType::F32);
    assert_eq!(param.value().unwrap().sum(), third as f32 as f64);

    let param = Parameter::scalar(third);
    assert_eq!(param.value().unwrap().sum(), third);
}
