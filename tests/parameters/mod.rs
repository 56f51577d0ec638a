//! Integration tests for the parameter containers
//!
//! These tests verify parameters and namespace dicts through the public API only.

// Tests for the Parameter struct
mod parameter_tests;

// Tests for NamespaceDict and its nested form
mod namespace_tests;
