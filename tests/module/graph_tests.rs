//! Integration tests for attachment, naming and traversal

use caustics_rs::cosmology::{FlatLambdaCDM, FlatLambdaCDMParams};
use caustics_rs::error::CausticsError;
use caustics_rs::lenses::{SieParams, SIE};
use caustics_rs::module::{traversal_order, unique_name, Module, NamingPolicy, Parametrized};
use std::collections::HashSet;
use std::sync::Arc;

use crate::test_helpers::planck;

#[test]
fn test_unique_name_depends_only_on_inputs() {
    let taken: HashSet<String> = ["lens", "lens_1", "lens_3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(unique_name("lens", &taken), "lens_2");
    assert_eq!(unique_name("lens", &taken), unique_name("lens", &taken.clone()));
    assert_eq!(unique_name("src", &taken), "src");
}

#[test]
fn test_traversal_order() {
    let sim = Module::new("Sim", Some("sim")).unwrap();
    let lens = Module::new("Lens", Some("lens")).unwrap();
    let cosmo = Module::new("Cosmo", Some("cosmo")).unwrap();
    let src = Module::new("Source", Some("src")).unwrap();
    lens.add_child(&cosmo).unwrap();
    sim.add_child(&lens).unwrap();
    sim.add_child(&src).unwrap();

    assert_eq!(traversal_order(&sim), vec!["cosmo", "src", "lens", "sim"]);
    assert_eq!(lens.traversal_order(), vec!["cosmo", "lens"]);

    let light = Module::new("Source", Some("lens_light")).unwrap();
    sim.add_child(&light).unwrap();
    assert_eq!(
        sim.traversal_order(),
        vec!["cosmo", "lens_light", "src", "lens", "sim"]
    );
}

#[test]
fn test_lenses_sharing_a_cosmology_instance() {
    let cosmo = planck("cosmo");
    let first = SIE::new(cosmo.clone(), SieParams::default(), 0.0, Some("first")).unwrap();
    assert_eq!(first.module().traversal_order(), vec!["cosmo", "first"]);

    // one parent per module
    let err = SIE::new(cosmo, SieParams::default(), 0.0, Some("second")).unwrap_err();
    assert!(matches!(err, CausticsError::AlreadyAttached(n) if n == "cosmo"));
}

#[test]
fn test_default_names_collide_and_rename() {
    let root = Module::new("Sim", None).unwrap();
    for _ in 0..2 {
        let cosmo = Arc::new(FlatLambdaCDM::new(None, FlatLambdaCDMParams::default()).unwrap());
        let lens = SIE::new(cosmo, SieParams::default(), 0.0, None).unwrap();
        root.add_child(lens.module()).unwrap();
    }
    assert_eq!(
        root.traversal_order(),
        vec!["FlatLambdaCDM_1", "FlatLambdaCDM", "SIE_1", "SIE", "Sim"]
    );
    root.validate_names().unwrap();
    assert_eq!(root.dynamic_names().len(), 12);
}

#[test]
fn test_reparenting_revalidates() {
    let a = Module::new("A", Some("a")).unwrap();
    let b = Module::new("B", Some("b")).unwrap();
    let shared = Module::new("Lens", Some("lens")).unwrap();
    a.add_child(&shared).unwrap();
    b.add_child(&Module::new("Lens", Some("lens")).unwrap()).unwrap();

    let moved = a.detach_child("lens").unwrap();
    assert!(matches!(
        b.add_child_with_policy(&moved, NamingPolicy::Reject),
        Err(CausticsError::DuplicateName(_))
    ));
    assert_eq!(b.add_child(&moved).unwrap(), "lens_1");
    assert!(moved.root().ptr_eq(&b));
}
