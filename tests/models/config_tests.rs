//! Integration tests for building simulators from JSON configuration

use caustics_rs::error::CausticsError;
use caustics_rs::models::{build_simulator, build_simulator_from_file, Config, ModelConfig};
use caustics_rs::module::{PackArgs, Parametrized};
use caustics_rs::sims::Simulator;
use serde_json::json;
use std::f64::consts::PI;

const CONFIG: &str = r#"{
    "simulator": {
        "name": "sim",
        "kind": "LensSource",
        "params": {"z_s": 1.5},
        "init_kwargs": {
            "lens": {
                "name": "lens",
                "kind": "SIE",
                "params": {"z_l": 0.5, "x0": 0.0, "y0": 0.0, "q": "1 - 0.25", "phi": "pi / 4", "b": null},
                "init_kwargs": {"cosmology": {"name": "cosmo", "kind": "FlatLambdaCDM"}}
            },
            "source": {
                "name": "src",
                "kind": "Sersic",
                "params": {"x0": 0.1, "y0": 0.0, "q": 0.6, "phi": 0.0, "n": 1.0, "Re": 0.3, "Ie": 2.0}
            },
            "pixelscale": 0.1,
            "pixels_x": 12,
            "pixels_y": 10
        }
    }
}"#;

#[test]
fn test_build_from_json() {
    let config = Config::from_json(CONFIG).unwrap();
    let sim = build_simulator(&config).unwrap();

    assert_eq!(sim.name(), "sim");
    assert_eq!(sim.module().traversal_order(), vec!["cosmo", "src", "lens", "sim"]);
    assert_eq!(sim.module().dynamic_names(), vec!["lens.b"]);

    let lens = sim.module().find("lens").unwrap();
    let phi = lens.param("phi").unwrap();
    assert!((phi.value().unwrap().sum() - PI / 4.0).abs() < 1e-15);
    assert_eq!(lens.param("q").unwrap().value().unwrap().sum(), 0.75);

    let image = sim.call(PackArgs::from_pairs([("b", 1.0)])).unwrap();
    assert_eq!(image.dim(), (10, 12));
    assert!(image.sum() > 0.0);
}

#[test]
fn test_build_from_file_with_state() {
    let dir = tempfile::tempdir().unwrap();

    // save a snapshot of a tree whose lens is fully static
    let mut fitted: serde_json::Value = serde_json::from_str(CONFIG).unwrap();
    fitted["simulator"]["init_kwargs"]["lens"]["params"]["b"] = json!(1.3);
    let fitted: Config = serde_json::from_value(fitted).unwrap();
    let snapshot_path = build_simulator(&fitted)
        .unwrap()
        .state_dict()
        .unwrap()
        .save(Some(dir.path().join("fitted.st").as_path()))
        .unwrap();

    // the dynamic configuration picks up b from the snapshot
    let mut config = Config::from_json(CONFIG).unwrap();
    config.state = Some(caustics_rs::models::StateConfig {
        load: caustics_rs::models::FileInput { path: snapshot_path },
    });
    let config_path = dir.path().join("sim.json");
    std::fs::write(&config_path, config.to_json().unwrap()).unwrap();

    let sim = build_simulator_from_file(&config_path).unwrap();
    assert!(sim.module().dynamic_names().is_empty());
    let expected = build_simulator(&fitted).unwrap().call(PackArgs::None).unwrap();
    assert_eq!(sim.call(PackArgs::None).unwrap(), expected);
}

#[test]
fn test_missing_snapshot_file() {
    let mut config = Config::from_json(CONFIG).unwrap();
    config.state = Some(caustics_rs::models::StateConfig {
        load: caustics_rs::models::FileInput {
            path: "does/not/exist.st".into(),
        },
    });
    assert!(matches!(build_simulator(&config), Err(CausticsError::Io(_))));
}

#[test]
fn test_invalid_documents() {
    let unknown = Config {
        simulator: ModelConfig::new("Microlens"),
        state: None,
    };
    assert!(matches!(
        build_simulator(&unknown),
        Err(CausticsError::UnknownKind { ref category, ref kind }) if category == "simulators" && kind == "Microlens"
    ));

    let mut doc: serde_json::Value = serde_json::from_str(CONFIG).unwrap();
    doc["simulator"]["init_kwargs"]["lens"]["params"]["q"] = json!("q0 * 2");
    let config: Config = serde_json::from_value(doc).unwrap();
    assert!(matches!(build_simulator(&config), Err(CausticsError::Expression(_))));

    let mut doc: serde_json::Value = serde_json::from_str(CONFIG).unwrap();
    doc["simulator"]["init_kwargs"]["pixelscale"] = json!(-0.1);
    let config: Config = serde_json::from_value(doc).unwrap();
    assert!(matches!(build_simulator(&config), Err(CausticsError::InvalidConfig(_))));

    assert!(matches!(
        Config::from_json(r#"{"simulator": {"kind": "LensSource", "parameters": {}}}"#),
        Err(CausticsError::Json(_))
    ));
}
