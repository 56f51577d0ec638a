//! Physical constants and unit conversions.
//!
//! Distances are in Mpc, masses in solar masses, angles in arcsec unless a
//! name says otherwise.

/// Speed of light in Mpc/s.
pub const C_MPC_S: f64 = 9.715611890180196e-15;

/// G / c^2 in Mpc per solar mass.
pub const G_OVER_C2: f64 = 4.7854158415878425e-20;

/// One arcsecond in radians.
pub const ARCSEC_TO_RAD: f64 = 4.84813681109536e-6;

/// Seconds in one day.
pub const DAYS_TO_SECONDS: f64 = 86_400.0;

/// One kilometre in Mpc.
pub const KM_TO_MPC: f64 = 3.240779289444365e-20;
