//! Integration tests for the LensSource simulator

use caustics_rs::lenses::{SieParams, SisParams, ThinLens, SIE, SIS};
use caustics_rs::light::{Sersic, SersicParams, Source};
use caustics_rs::module::{PackArgs, Parametrized};
use caustics_rs::sims::{ImageSettings, LensSource, Simulator};
use caustics_rs::utils::{batch_forward, jacobian, jacobian_parallel};
use ndarray::{arr1, Array2, Axis};
use std::sync::Arc;

use crate::test_helpers::{image_approx_eq, planck};

fn round_source() -> Arc<dyn Source> {
    let params = SersicParams {
        x0: Some(0.0),
        y0: Some(0.0),
        q: Some(1.0),
        phi: Some(0.0),
        n: Some(2.0),
        re: Some(0.4),
        ie: Some(1.0),
    };
    Arc::new(Sersic::new(params, 0.0, false, Some("src")).unwrap())
}

fn settings() -> ImageSettings {
    ImageSettings {
        pixelscale: 0.08,
        pixels_x: 16,
        pixels_y: None,
        upsample_factor: 2,
    }
}

fn simulate(lens: Arc<dyn ThinLens>) -> Array2<f64> {
    LensSource::new(lens, round_source(), Some(1.5), settings(), Some("sim"))
        .unwrap()
        .call(PackArgs::None)
        .unwrap()
}

fn sis() -> Arc<dyn ThinLens> {
    let params = SisParams {
        z_l: Some(0.5),
        x0: Some(0.0),
        y0: Some(0.0),
        th_ein: Some(0.9),
    };
    Arc::new(SIS::new(planck("cosmo"), params, 0.0, Some("lens")).unwrap())
}

#[test]
fn test_round_system_is_symmetric() {
    let image = simulate(sis());
    assert_eq!(image.dim(), (16, 16));
    assert!(image_approx_eq(&image, &image.t().to_owned(), 1e-12));

    let mut flipped = image.clone();
    flipped.invert_axis(Axis(0));
    assert!(image_approx_eq(&image, &flipped, 1e-12));
}

#[test]
fn test_round_sie_renders_like_sis() {
    let params = SieParams {
        z_l: Some(0.5),
        x0: Some(0.0),
        y0: Some(0.0),
        q: Some(1.0),
        phi: Some(0.0),
        b: Some(0.9),
    };
    let sie: Arc<dyn ThinLens> = Arc::new(SIE::new(planck("cosmo"), params, 0.0, Some("lens")).unwrap());
    assert!(image_approx_eq(&simulate(sie), &simulate(sis()), 1e-10));
}

fn dynamic_sim() -> LensSource {
    let params = SieParams {
        z_l: Some(0.5),
        y0: Some(0.0),
        q: Some(0.8),
        phi: Some(0.4),
        ..Default::default()
    };
    let lens = Arc::new(SIE::new(planck("cosmo"), params, 0.0, Some("lens")).unwrap());
    LensSource::new(lens, round_source(), Some(1.5), settings(), Some("sim")).unwrap()
}

#[test]
fn test_batch_forward_matches_calls() {
    let sim = dynamic_sim();
    assert_eq!(sim.module().dynamic_names(), vec!["lens.x0", "lens.b"]);

    let batch = ndarray::arr2(&[[0.0, 1.0], [0.1, 0.8], [-0.2, 1.3]]);
    let images = batch_forward(&sim, &batch).unwrap();
    assert_eq!(images.len(), 3);
    for (row, image) in batch.outer_iter().zip(&images) {
        let expected = sim.call(row.to_owned().into()).unwrap();
        assert_eq!(image, &expected);
    }
}

#[test]
fn test_jacobian_of_image() {
    let sim = dynamic_sim();
    let params = arr1(&[0.05, 1.1]);
    let jac = jacobian(&sim, &params, Some(1e-6)).unwrap();
    assert_eq!(jac.dim(), (2, 16, 16));
    assert!(jac.iter().all(|v| v.is_finite()));
    // moving the lens or changing its mass changes the image
    for j in 0..2 {
        assert!(jac.index_axis(Axis(0), j).iter().any(|v| v.abs() > 1e-6));
    }

    let par = jacobian_parallel(&sim, &params, Some(1e-6)).unwrap();
    assert_eq!(jac, par);
}
