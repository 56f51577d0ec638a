//! Integration tests for StateDict with real module trees

use caustics_rs::cosmology::{FlatLambdaCDM, FlatLambdaCDMParams};
use caustics_rs::lenses::{SieParams, SIE};
use caustics_rs::module::{Module, Parametrized};
use caustics_rs::parameters::{scalar_tensor, NamespaceDict, Parameter};
use caustics_rs::sims::state_dict::{CREATED_TIME, SOFTWARE_VERSION, STATE_METADATA};
use caustics_rs::sims::StateDict;
use std::sync::Arc;

fn lens(params: SieParams) -> SIE {
    let cosmo = Arc::new(FlatLambdaCDM::new(Some("cosmo"), FlatLambdaCDMParams::default()).unwrap());
    SIE::new(cosmo, params, 0.0, Some("lens")).unwrap()
}

fn fitted() -> SieParams {
    SieParams {
        z_l: Some(0.4),
        x0: Some(0.05),
        y0: Some(-0.1),
        q: Some(0.75),
        phi: Some(1.1),
        b: Some(1.25),
    }
}

#[test]
fn test_module_snapshot_metadata() {
    let state = lens(fitted()).state_dict().unwrap();
    assert_eq!(state.len(), 9);
    for key in [SOFTWARE_VERSION, CREATED_TIME, STATE_METADATA] {
        assert!(state.metadata().contains_key(key), "missing {}", key);
    }
    assert_eq!(
        state.metadata().get(SOFTWARE_VERSION).map(String::as_str),
        Some(caustics_rs::VERSION)
    );

    let meta = state.state_metadata().unwrap().unwrap();
    assert_eq!(meta.module_order, vec!["cosmo", "lens"]);
    assert_eq!(meta.class_maps["cosmo"], "FlatLambdaCDM");
    assert_eq!(meta.class_maps["lens"], "SIE");
    assert_eq!(meta.key_maps["lens"]["q"], "lens.q");
}

#[test]
fn test_save_then_load_into_fresh_tree() {
    let dir = tempfile::tempdir().unwrap();
    let source = lens(fitted());
    let path = source
        .state_dict()
        .unwrap()
        .save(Some(dir.path().join("lens.st").as_path()))
        .unwrap();

    // a fresh tree with every lens parameter dynamic
    let target = lens(SieParams::default());
    assert_eq!(target.module().dynamic_names().len(), 6);

    let snapshot = StateDict::load(&path).unwrap();
    let loaded = target.load_state_dict(&snapshot).unwrap();
    assert_eq!(loaded, 9);
    assert!(target.module().dynamic_names().is_empty());
    assert_eq!(target.state_dict().unwrap(), source.state_dict().unwrap());
}

#[test]
fn test_unmatched_entries_are_skipped() {
    let mut flat = NamespaceDict::new();
    flat.insert("lens.b", Parameter::scalar(2.0));
    flat.insert("elsewhere.b", Parameter::scalar(3.0));
    let snapshot = StateDict::from_params(flat).unwrap();

    let target = lens(SieParams::default());
    assert_eq!(target.load_state_dict(&snapshot).unwrap(), 1);
    assert_eq!(
        target.module().param("b").unwrap().value(),
        Some(&scalar_tensor(2.0))
    );
    assert!(target.module().param("q").unwrap().is_dynamic());
}

#[test]
fn test_load_rejects_wrong_shape() {
    let mut flat = NamespaceDict::new();
    flat.insert("cosmo.h0", Parameter::scalar(0.7));
    flat.insert("lens.b", Parameter::fixed(ndarray::arr1(&[1.0, 2.0]).into_dyn()));
    let snapshot = StateDict::from_params(flat).unwrap();

    let cosmo = Arc::new(FlatLambdaCDM::new(Some("cosmo"), FlatLambdaCDMParams::dynamic()).unwrap());
    let target = SIE::new(cosmo, SieParams::default(), 0.0, Some("lens")).unwrap();
    let before = target.module().dynamic_names();

    let err = target.load_state_dict(&snapshot).unwrap_err();
    assert!(err.to_string().contains("lens.b"));
    // cosmo.h0 matched and was valid, but nothing is assigned after a failure
    assert_eq!(target.module().dynamic_names(), before);
    assert!(before.contains(&"cosmo.h0".to_string()));
}

#[test]
fn test_snapshot_of_params_view() {
    let root = Module::new("Sim", Some("sim")).unwrap();
    root.add_param("z_s", Some(scalar_tensor(1.0)), None).unwrap();
    root.add_param("noise", None, Some(&[])).unwrap();

    let state = StateDict::from_params(root.params()).unwrap();
    assert_eq!(state.keys().collect::<Vec<_>>(), vec!["sim.z_s"]);
    assert!(state.state_metadata().unwrap().is_none());
}
