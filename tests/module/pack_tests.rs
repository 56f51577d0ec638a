//! Integration tests for pack/unpack with physics modules

use caustics_rs::cosmology::{Cosmology, FlatLambdaCDM, FlatLambdaCDMParams};
use caustics_rs::error::CausticsError;
use caustics_rs::lenses::{SieParams, ThinLens, SIE};
use caustics_rs::module::{PackArgs, Parametrized};
use caustics_rs::parameters::{scalar_tensor, NamespaceDict};
use ndarray::arr1;
use std::sync::Arc;

use crate::test_helpers::{approx_eq, planck};

fn dynamic_sie() -> SIE {
    SIE::new(planck("cosmo"), SieParams::default(), 0.0, Some("sie")).unwrap()
}

#[test]
fn test_call_forms_agree() {
    let lens = dynamic_sie();
    let values = [0.5, 0.1, -0.2, 0.7, 0.4, 1.3];

    let from_sequence = lens.pack(values.to_vec().into()).unwrap();
    let from_flat = lens.pack(arr1(&values).into()).unwrap();
    let mut mapping = NamespaceDict::new();
    for (name, v) in ["z_l", "x0", "y0", "q", "phi", "b"].iter().zip(values) {
        mapping.insert(format!("sie.{}", name), scalar_tensor(v));
    }
    let from_mapping = lens.pack(mapping.into()).unwrap();

    assert_eq!(from_sequence, from_flat);
    assert_eq!(from_sequence, from_mapping);
    assert_eq!(from_sequence.module_order().to_vec(), vec!["cosmo", "sie"]);

    let unpacked = lens.unpack(&from_mapping).unwrap();
    assert_eq!(unpacked.scalar("b").unwrap(), 1.3);
}

#[test]
fn test_dynamic_cosmology_must_be_supplied() {
    let cosmo = Arc::new(
        FlatLambdaCDM::new(
            Some("cosmo"),
            FlatLambdaCDMParams {
                h0: None,
                ..Default::default()
            },
        )
        .unwrap(),
    );
    let params = SieParams {
        z_l: Some(0.5),
        x0: Some(0.0),
        y0: Some(0.0),
        q: Some(0.8),
        phi: Some(0.0),
        b: Some(1.0),
    };
    let lens = SIE::new(cosmo, params, 0.0, Some("sie")).unwrap();

    match lens.pack(PackArgs::None) {
        Err(CausticsError::UnresolvedDynamic(names)) => assert_eq!(names, vec!["cosmo.h0"]),
        other => panic!("expected unresolved h0, got {:?}", other),
    }

    let packed = lens.pack(PackArgs::from_pairs([("h0", 0.7)])).unwrap();
    let d_l = lens.cosmology().angular_diameter_distance(0.5, &packed).unwrap();
    assert!(d_l > 1000.0 && d_l < 1400.0);
}

#[test]
fn test_packed_is_shared_across_threads() {
    let lens = dynamic_sie();
    let packed = lens
        .pack(PackArgs::from_pairs([
            ("z_l", 0.5),
            ("x0", 0.0),
            ("y0", 0.0),
            ("q", 0.6),
            ("phi", 0.2),
            ("b", 1.0),
        ]))
        .unwrap();
    let x = arr1(&[0.3, -0.4, 1.2]).into_dyn();
    let y = arr1(&[0.9, 0.1, -0.5]).into_dyn();
    let (expected, _) = lens.raytrace(&x, &y, 1.5, &packed).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| lens.raytrace(&x, &y, 1.5, &packed).unwrap().0))
            .collect();
        for handle in handles {
            let got = handle.join().unwrap();
            assert!(got.iter().zip(expected.iter()).all(|(a, b)| approx_eq(*a, *b, 1e-15)));
        }
    });
}

#[test]
fn test_shape_errors_name_the_parameter() {
    let lens = dynamic_sie();
    let mut mapping = NamespaceDict::new();
    mapping.insert("b", arr1(&[1.0, 2.0]).into_dyn());
    match lens.pack(mapping.into()) {
        Err(CausticsError::ShapeMismatch { name, expected, got }) => {
            assert_eq!(name, "sie.b");
            assert!(expected.is_empty());
            assert_eq!(got, vec![2]);
        }
        other => panic!("expected shape mismatch, got {:?}", other),
    }
}
