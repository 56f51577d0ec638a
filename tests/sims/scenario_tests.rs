//! The `Sim` scenario: a static cosmology, a lens with a dynamic Einstein
//! radius and a static source redshift on the root.

use caustics_rs::error::CausticsError;
use caustics_rs::module::{PackArgs, Parametrized};
use caustics_rs::sims::Simulator;
use ndarray::arr2;

use crate::test_helpers::ToySim;

#[test]
fn test_state_dict_holds_static_parameters_only() {
    let sim = ToySim::new();
    let state = sim.state_dict().unwrap();
    let keys: Vec<_> = state.keys().cloned().collect();
    assert_eq!(keys, vec!["cosmo.h0", "Sim.z_s"]);
    assert!(!state.keys().any(|k| k.ends_with("einstein_radius")));
}

#[test]
fn test_call_routes_dynamic_value_to_lens() {
    let sim = ToySim::new();
    let image = sim
        .call(PackArgs::from_pairs([("einstein_radius", 1.4)]))
        .unwrap();
    assert_eq!(image, arr2(&[[1.0, 1.4, 70.0]]));

    let image = sim.call(vec![1.4].into()).unwrap();
    assert_eq!(image, arr2(&[[1.0, 1.4, 70.0]]));
}

#[test]
fn test_call_without_values_fails() {
    let sim = ToySim::new();
    let err = sim.call(PackArgs::None).unwrap_err();
    assert!(matches!(&err, CausticsError::UnresolvedDynamic(names) if names == &["lens.einstein_radius"]));
    assert!(err.to_string().contains("einstein_radius"));

    // an empty mapping reaches the per-parameter check
    let err = sim.call(PackArgs::from_pairs(Vec::<(&str, f64)>::new())).unwrap_err();
    assert!(matches!(err, CausticsError::MissingParameter(n) if n == "lens.einstein_radius"));
}

#[test]
fn test_state_dict_is_idempotent() {
    let sim = ToySim::new();
    let first = sim.state_dict().unwrap();
    let second = sim.state_dict().unwrap();
    assert_eq!(first, second);

    let a = first.state_metadata().unwrap().unwrap();
    let b = second.state_metadata().unwrap().unwrap();
    assert_eq!(a.module_order, vec!["cosmo", "lens", "Sim"]);
    assert_eq!(a.module_order, b.module_order);
    assert_eq!(a.class_maps, b.class_maps);
    assert_eq!(a.class_maps["lens"], "Lens");
}

#[test]
fn test_making_a_parameter_static_changes_the_call() {
    let sim = ToySim::new();
    sim.lens
        .set_param_value("einstein_radius", caustics_rs::parameters::scalar_tensor(0.9))
        .unwrap();
    assert_eq!(sim.call(PackArgs::None).unwrap(), arr2(&[[1.0, 0.9, 70.0]]));
    assert!(sim.state_dict().unwrap().contains_key("lens.einstein_radius"));

    sim.cosmo.clear_param("h0").unwrap();
    assert_eq!(sim.call(vec![67.0].into()).unwrap(), arr2(&[[1.0, 0.9, 67.0]]));
}
