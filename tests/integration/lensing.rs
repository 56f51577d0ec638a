//! End-to-end lensing checks across construction paths

use caustics_rs::cosmology::{Cosmology, FlatLambdaCDM, FlatLambdaCDMParams};
use caustics_rs::lenses::{SieParams, ThinLens, SIE};
use caustics_rs::light::{Sersic, SersicParams};
use caustics_rs::models::{ModelConfig, Registry};
use caustics_rs::module::{PackArgs, Parametrized};
use caustics_rs::sims::{ImageSettings, LensSource, Simulator};
use ndarray::{arr1, Array1};
use serde_json::json;
use std::sync::Arc;

use crate::test_helpers::{approx_eq, image_approx_eq};

/// `[z_l, x0, y0, q, phi, b]`
fn sie_values(q: f64, phi: f64, b: f64) -> Array1<f64> {
    arr1(&[0.5, 0.912, -0.442, q, phi, b])
}

#[test]
fn test_sie_from_config_matches_hand_built() {
    let config = ModelConfig::new("SIE")
        .with_name("sie")
        .with_init("cosmology", json!({"name": "cosmo", "kind": "FlatLambdaCDM"}));
    let from_config = Registry::global().build_lens(&config).unwrap();

    let cosmo = Arc::new(FlatLambdaCDM::new(Some("cosmo"), FlatLambdaCDMParams::default()).unwrap());
    let by_hand = SIE::new(cosmo, SieParams::default(), 0.0, Some("sie")).unwrap();

    let x = arr1(&[-1.2, 0.3, 0.9, 2.1]).into_dyn();
    let y = arr1(&[0.4, -0.8, 1.7, -0.1]).into_dyn();
    for (q, phi, b) in [(0.4, 0.2, 1.1), (0.8, 1.3, 0.7), (0.999, -0.5, 1.5)] {
        let values = sie_values(q, phi, b);
        let p1 = from_config.pack(values.clone().into()).unwrap();
        let p2 = by_hand.pack(values.into()).unwrap();

        let (ax1, ay1) = from_config.reduced_deflection_angle(&x, &y, 1.2, &p1).unwrap();
        let (ax2, ay2) = by_hand.reduced_deflection_angle(&x, &y, 1.2, &p2).unwrap();
        assert_eq!(ax1, ax2);
        assert_eq!(ay1, ay2);

        let k1 = from_config.convergence(&x, &y, 1.2, &p1).unwrap();
        let k2 = by_hand.convergence(&x, &y, 1.2, &p2).unwrap();
        assert_eq!(k1, k2);
    }
}

#[test]
fn test_sie_deflection_at_einstein_radius() {
    let cosmo = Arc::new(FlatLambdaCDM::new(Some("cosmo"), FlatLambdaCDMParams::default()).unwrap());
    let lens = SIE::new(cosmo, SieParams::default(), 0.0, Some("sie")).unwrap();
    let packed = lens.pack(arr1(&[0.5, 0.0, 0.0, 1.0, 0.0, 1.3]).into()).unwrap();

    // a round isothermal lens deflects by b everywhere
    let x = arr1(&[1.3, 0.0, -2.0, 0.6]).into_dyn();
    let y = arr1(&[0.0, -0.7, 1.0, 0.8]).into_dyn();
    let (ax, ay) = lens.reduced_deflection_angle(&x, &y, 2.0, &packed).unwrap();
    for (a, b) in ax.iter().zip(ay.iter()) {
        assert!(approx_eq((a * a + b * b).sqrt(), 1.3, 1e-12));
    }

    // a point on the Einstein ring maps to the lens centre
    let (bx, by) = lens.raytrace(&x, &y, 2.0, &packed).unwrap();
    assert!(approx_eq(bx[[0]], 0.0, 1e-12));
    assert!(approx_eq(by[[0]], 0.0, 1e-12));
}

#[test]
fn test_dynamic_cosmology_changes_physical_quantities_only() {
    let cosmo = Arc::new(FlatLambdaCDM::new(Some("cosmo"), FlatLambdaCDMParams::dynamic()).unwrap());
    let params = SieParams {
        z_l: Some(0.5),
        x0: Some(0.0),
        y0: Some(0.0),
        q: Some(0.7),
        phi: Some(0.3),
        b: Some(1.0),
    };
    let lens: Arc<dyn ThinLens> = Arc::new(SIE::new(cosmo, params, 0.0, Some("lens")).unwrap());
    let source = Arc::new(
        Sersic::new(
            SersicParams {
                x0: Some(0.05),
                y0: Some(0.0),
                q: Some(0.9),
                phi: Some(0.0),
                n: Some(1.0),
                re: Some(0.3),
                ie: Some(1.0),
            },
            0.0,
            false,
            Some("src"),
        )
        .unwrap(),
    );
    let settings = ImageSettings {
        pixelscale: 0.1,
        pixels_x: 8,
        ..Default::default()
    };
    let sim = LensSource::new(lens, source, Some(1.0), settings, Some("sim")).unwrap();
    assert_eq!(
        sim.module().dynamic_names(),
        vec!["cosmo.h0", "cosmo.critical_density_0", "cosmo.Om0"]
    );

    let planck = sim.pack(vec![0.6766, 1.27e11, 0.30966].into()).unwrap();
    let other = sim.pack(vec![0.7, 1.27e11, 0.3].into()).unwrap();

    // images depend on reduced angles only
    let a = sim.forward(&planck).unwrap();
    let b = sim.forward(&other).unwrap();
    assert!(image_approx_eq(&a, &b, 1e-14));

    // distances do not
    let cosmology = sim.lens().cosmology();
    let d1 = cosmology.angular_diameter_distance(0.5, &planck).unwrap();
    let d2 = cosmology.angular_diameter_distance(0.5, &other).unwrap();
    assert!(approx_eq(d1 * 0.6766, d2 * 0.7, 0.05 * d1));
    assert!(d1 > d2);

    let x = arr1(&[0.8]).into_dyn();
    let y = arr1(&[0.3]).into_dyn();
    let t1 = sim.lens().time_delay(&x, &y, 1.0, &planck, true, true).unwrap();
    let t2 = sim.lens().time_delay(&x, &y, 1.0, &other, true, true).unwrap();
    assert!(t1[[0]] != t2[[0]]);

    let err = sim.call(PackArgs::None).unwrap_err();
    assert!(err.to_string().contains("cosmo.h0"));
}
