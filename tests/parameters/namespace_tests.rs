//! Integration tests for NamespaceDict and NestedNamespaceDict

use caustics_rs::error::CausticsError;
use caustics_rs::parameters::{NamespaceDict, NestedNamespaceDict, Parameter};

fn lens_tree() -> NestedNamespaceDict<Parameter> {
    let mut cosmo = NamespaceDict::new();
    cosmo.insert("h0", Parameter::scalar(0.7));
    cosmo.insert("Om0", Parameter::scalar(0.3));

    let mut lens = NamespaceDict::new();
    lens.insert("b", Parameter::dynamic(&[]));
    lens.insert("q", Parameter::scalar(0.8));

    let mut tree = NamespaceDict::new();
    tree.insert("cosmo", cosmo);
    tree.insert("lens", lens);
    tree
}

#[test]
fn test_flatten_keeps_order() {
    let flat = lens_tree().flatten();
    let keys: Vec<_> = flat.keys().cloned().collect();
    assert_eq!(keys, vec!["cosmo.h0", "cosmo.Om0", "lens.b", "lens.q"]);
    assert!(flat.get("lens.b").unwrap().is_dynamic());
    assert_eq!(flat.unflatten().unwrap(), lens_tree());
}

#[test]
fn test_equality_is_order_sensitive() {
    let mut a = NamespaceDict::new();
    a.insert("x", 1);
    a.insert("y", 2);
    let mut b = NamespaceDict::new();
    b.insert("y", 2);
    b.insert("x", 1);
    assert_ne!(a, b);

    // replacing a value keeps the original position
    b.remove("y");
    b.insert("y", 5);
    b.insert("y", 2);
    assert_eq!(a, b);
}

#[test]
fn test_unflatten_requires_separator() {
    let mut flat = NamespaceDict::new();
    flat.insert("lens.b", 1.0);
    flat.insert("orphan", 2.0);
    assert!(matches!(flat.unflatten(), Err(CausticsError::InvalidName(k)) if k == "orphan"));
}

#[test]
fn test_map_values() {
    let binding = lens_tree().flatten().map_values(Parameter::is_static);
    let statics: Vec<_> = binding.iter().filter(|(_, s)| **s).map(|(k, _)| k.as_str()).collect();
    assert_eq!(statics, vec!["cosmo.h0", "cosmo.Om0", "lens.q"]);
}
