//! Integration tests for the caustics-rs library
//!
//! This module organizes tests that exercise the library as a whole,
//! rather than individual components.

// Lens models built by hand and from configuration
pub mod lensing;
